use super::precompile::{run_precompiled_contract, PrecompileFrame, Precompiles};
use super::result::ExecutionResult;
use crate::backend::{Log, StateDB, EMPTY_CODE_HASH};
use crate::context::BlockContext;
use crate::gasometer::{self, Gasometer};
use crate::{
	CallInterrupt, Capture, Config, Context, Contract, CreateInterrupt, CreateScheme, ExitError,
	ExitException, ExitFatal, ExitResult, ExitSucceed, Handler, Interrupt, Opcode, Runtime, Stack,
	Transfer,
};
use alloc::borrow::Cow;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Shared flag aborting an execution from another thread. Checked before
/// every opcode.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
	/// Request the execution to stop. It exits with `ExitFatal::Cancelled`.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	/// Whether cancellation was requested.
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

#[derive(Clone, Copy, Debug)]
enum FrameKind {
	Call { code_address: H160 },
	Create { address: H160 },
}

struct Frame<'config> {
	gasometer: Gasometer<'config>,
	is_static: bool,
	kind: FrameKind,
	snapshot: usize,
}

/// How a frame ended, as seen by whoever started it.
#[derive(Debug)]
struct Outcome {
	reason: ExitResult,
	output: Vec<u8>,
	gas: u64,
}

impl Outcome {
	fn fatal(message: &'static str) -> Self {
		Self {
			reason: ExitFatal::Other(Cow::Borrowed(message)).into(),
			output: Vec::new(),
			gas: 0,
		}
	}
}

enum Entry<'config> {
	Enter(Frame<'config>, Runtime),
	Exit(Outcome),
}

/// Kardia Virtual Machine. Runs contract calls and creations against a
/// [`StateDB`], one [`Runtime`] per frame, with nested frames kept on the heap.
///
/// A `Kvm` is meant for a single transaction and must not be shared between
/// threads. The only cross-thread interaction is cancellation through a
/// [`CancelHandle`].
pub struct Kvm<'config, 'precompiles, S> {
	context: BlockContext,
	state: S,
	config: &'config Config,
	precompiles: &'precompiles Precompiles,
	frames: Vec<Frame<'config>>,
	call_gas_temp: Option<u64>,
	cancel: CancelHandle,
}

impl<'config, 'precompiles, S: StateDB> Kvm<'config, 'precompiles, S> {
	/// Create a new KVM.
	pub fn new(
		context: BlockContext,
		state: S,
		config: &'config Config,
		precompiles: &'precompiles Precompiles,
	) -> Self {
		Self {
			context,
			state,
			config,
			precompiles,
			frames: Vec::new(),
			call_gas_temp: None,
			cancel: CancelHandle::default(),
		}
	}

	/// Block context of the execution.
	pub fn context(&self) -> &BlockContext {
		&self.context
	}

	/// Chain configuration.
	pub fn config(&self) -> &'config Config {
		self.config
	}

	/// Reference to the state.
	pub fn state(&self) -> &S {
		&self.state
	}

	/// Mutable reference to the state.
	pub fn state_mut(&mut self) -> &mut S {
		&mut self.state
	}

	/// Give back the state.
	pub fn into_state(self) -> S {
		self.state
	}

	/// Abort the running execution at the next opcode.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Whether the execution was cancelled.
	pub fn cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Handle that can cancel this KVM from elsewhere.
	pub fn cancel_handle(&self) -> CancelHandle {
		self.cancel.clone()
	}

	/// Call `address` with `input`, transferring `value` from `caller`.
	/// Returns the exit reason, the output and the gas left.
	pub fn call(
		&mut self,
		caller: H160,
		address: H160,
		input: Vec<u8>,
		gas: u64,
		value: U256,
	) -> (ExitResult, Vec<u8>, u64) {
		let transfer = Transfer {
			source: caller,
			target: address,
			value,
		};
		let context = Context {
			address,
			caller,
			apparent_value: value,
		};

		self.call_inner(address, Some(transfer), input, gas, false, context)
	}

	/// Run the code of `address` against the account of `caller`. `value`
	/// moves from `caller` to itself.
	pub fn call_code(
		&mut self,
		caller: H160,
		address: H160,
		input: Vec<u8>,
		gas: u64,
		value: U256,
	) -> (ExitResult, Vec<u8>, u64) {
		let transfer = Transfer {
			source: caller,
			target: caller,
			value,
		};
		let context = Context {
			address: caller,
			caller,
			apparent_value: value,
		};

		self.call_inner(address, Some(transfer), input, gas, false, context)
	}

	/// Run the code of `address` against the account of `caller`, which
	/// also appears as the caller. No value moves; `value` is only what
	/// `CALLVALUE` reports.
	pub fn delegate_call(
		&mut self,
		caller: H160,
		address: H160,
		input: Vec<u8>,
		gas: u64,
		value: U256,
	) -> (ExitResult, Vec<u8>, u64) {
		let context = Context {
			address: caller,
			caller,
			apparent_value: value,
		};

		self.call_inner(address, None, input, gas, false, context)
	}

	/// Call `address` in a frame that may not modify state.
	pub fn static_call(
		&mut self,
		caller: H160,
		address: H160,
		input: Vec<u8>,
		gas: u64,
	) -> (ExitResult, Vec<u8>, u64) {
		let context = Context {
			address,
			caller,
			apparent_value: U256::zero(),
		};

		self.call_inner(address, None, input, gas, true, context)
	}

	/// Deploy `init_code` at the address derived from the nonce of `caller`.
	/// Returns the exit reason, the new address, the revert output if any and
	/// the gas left.
	pub fn create(
		&mut self,
		caller: H160,
		init_code: Vec<u8>,
		gas: u64,
		value: U256,
	) -> (ExitResult, H160, Vec<u8>, u64) {
		self.create_inner(caller, CreateScheme::Legacy { caller }, value, init_code, gas)
	}

	/// Deploy `init_code` at the address derived from `caller`, `salt` and
	/// the code hash.
	pub fn create2(
		&mut self,
		caller: H160,
		init_code: Vec<u8>,
		gas: u64,
		value: U256,
		salt: H256,
	) -> (ExitResult, H160, Vec<u8>, u64) {
		let code_hash = H256::from_slice(Keccak256::digest(&init_code).as_slice());
		let scheme = CreateScheme::Create2 {
			caller,
			code_hash,
			salt,
		};

		self.create_inner(caller, scheme, value, init_code, gas)
	}

	/// [`Kvm::call`] packed into an [`ExecutionResult`].
	pub fn execute_call(
		&mut self,
		caller: H160,
		address: H160,
		input: Vec<u8>,
		gas: u64,
		value: U256,
	) -> ExecutionResult {
		let (reason, return_data, leftover) = self.call(caller, address, input, gas, value);

		ExecutionResult {
			used_gas: gas.saturating_sub(leftover),
			err: reason.err(),
			return_data,
		}
	}

	/// [`Kvm::create`] packed into an [`ExecutionResult`], along with the
	/// address of the new contract.
	pub fn execute_create(
		&mut self,
		caller: H160,
		init_code: Vec<u8>,
		gas: u64,
		value: U256,
	) -> (ExecutionResult, H160) {
		let (reason, address, return_data, leftover) = self.create(caller, init_code, gas, value);

		let result = ExecutionResult {
			used_gas: gas.saturating_sub(leftover),
			err: reason.err(),
			return_data,
		};
		(result, address)
	}

	/// Address a create with `scheme` deploys to.
	pub fn create_address(&self, scheme: CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Create2 {
				caller,
				code_hash,
				salt,
			} => {
				let mut hasher = Keccak256::new();
				hasher.update([0xff]);
				hasher.update(&caller[..]);
				hasher.update(&salt[..]);
				hasher.update(&code_hash[..]);
				H256::from_slice(hasher.finalize().as_slice()).into()
			}
			CreateScheme::Legacy { caller } => {
				let nonce = self.state.get_nonce(caller);
				let mut stream = rlp::RlpStream::new_list(2);
				stream.append(&caller);
				stream.append(&nonce);
				H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
			}
		}
	}

	fn frame(&self) -> Result<&Frame<'config>, ExitError> {
		self.frames
			.last()
			.ok_or(ExitFatal::Other(Cow::Borrowed("no active frame")).into())
	}

	fn frame_mut(&mut self) -> Result<&mut Frame<'config>, ExitError> {
		self.frames
			.last_mut()
			.ok_or(ExitFatal::Other(Cow::Borrowed("no active frame")).into())
	}

	// Geth counts the calling frame, so the outermost call plus
	// `call_stack_limit` nested ones may run.
	fn depth_exceeded(&self) -> bool {
		self.frames.len() > self.config.call_stack_limit
	}

	fn call_inner(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		gas: u64,
		is_static: bool,
		context: Context,
	) -> (ExitResult, Vec<u8>, u64) {
		let entry = self.enter_call(code_address, transfer, input, gas, is_static, context);
		let outcome = match entry {
			Entry::Enter(frame, runtime) => self.execute(frame, runtime),
			Entry::Exit(outcome) => outcome,
		};

		(outcome.reason, outcome.output, outcome.gas)
	}

	fn create_inner(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		gas: u64,
	) -> (ExitResult, H160, Vec<u8>, u64) {
		let (address, entry) = self.enter_create(caller, scheme, value, init_code, gas);
		let outcome = match entry {
			Entry::Enter(frame, runtime) => self.execute(frame, runtime),
			Entry::Exit(outcome) => outcome,
		};

		(outcome.reason, address, outcome.output, outcome.gas)
	}

	/// Run `frame` and everything it calls on a heap-allocated frame stack.
	/// A frame that traps on a nested call or create is suspended until the
	/// child exits and its outcome has been fed back.
	fn execute(&mut self, frame: Frame<'config>, runtime: Runtime) -> Outcome {
		let mut runtimes = Vec::new();
		self.frames.push(frame);
		runtimes.push(runtime);

		loop {
			let capture = match runtimes.last_mut() {
				Some(runtime) => runtime.run(self),
				None => return Outcome::fatal("empty frame stack"),
			};

			match capture {
				Capture::Trap(Interrupt::Call(interrupt)) => match self.enter_nested_call(interrupt) {
					Entry::Enter(frame, runtime) => {
						self.frames.push(frame);
						runtimes.push(runtime);
					}
					Entry::Exit(outcome) => {
						if let Some(parent) = runtimes.last_mut() {
							self.feed_call(parent, outcome);
						}
					}
				},
				Capture::Trap(Interrupt::Create(interrupt)) => match self.enter_nested_create(interrupt) {
					Entry::Enter(frame, runtime) => {
						self.frames.push(frame);
						runtimes.push(runtime);
					}
					Entry::Exit(outcome) => {
						if let Some(parent) = runtimes.last_mut() {
							self.feed_create(parent, outcome, None);
						}
					}
				},
				Capture::Exit(reason) => {
					let output = runtimes
						.pop()
						.map(|runtime| runtime.machine().return_value())
						.unwrap_or_default();
					let frame = match self.frames.pop() {
						Some(frame) => frame,
						None => return Outcome::fatal("empty frame stack"),
					};
					let kind = frame.kind;
					let outcome = self.exit_frame(frame, reason, output);

					match (runtimes.last_mut(), kind) {
						(None, _) => return outcome,
						(Some(parent), FrameKind::Call { .. }) => self.feed_call(parent, outcome),
						(Some(parent), FrameKind::Create { address }) => {
							self.feed_create(parent, outcome, Some(address))
						}
					}
				}
			}
		}
	}

	/// Give the unused gas of a finished call back to the suspended caller
	/// and resume it.
	fn feed_call(&mut self, parent: &mut Runtime, outcome: Outcome) {
		let gas = outcome.gas;
		match self
			.frame_mut()
			.and_then(|frame| frame.gasometer.record_stipend(gas))
		{
			Ok(()) => parent.resolve_call(outcome.reason, outcome.output),
			Err(e) => parent.resolve_call(Err(e), Vec::new()),
		}
	}

	fn feed_create(&mut self, parent: &mut Runtime, outcome: Outcome, address: Option<H160>) {
		let gas = outcome.gas;
		match self
			.frame_mut()
			.and_then(|frame| frame.gasometer.record_stipend(gas))
		{
			Ok(()) => {
				let address = if outcome.reason.is_ok() { address } else { None };
				parent.resolve_create(outcome.reason, address, outcome.output)
			}
			Err(e) => parent.resolve_create(Err(e), None, Vec::new()),
		}
	}

	fn enter_nested_call(&mut self, interrupt: CallInterrupt) -> Entry<'config> {
		let mut gas = match self.call_gas_temp.take() {
			Some(gas) => gas,
			None => return Entry::Exit(Outcome::fatal("call gas was not settled")),
		};
		if interrupt
			.transfer
			.as_ref()
			.map_or(false, |transfer| transfer.value != U256::zero())
		{
			gas = gas.saturating_add(self.config.call_stipend);
		}
		let is_static =
			interrupt.is_static || self.frames.last().map_or(false, |frame| frame.is_static);

		self.enter_call(
			interrupt.code_address,
			interrupt.transfer,
			interrupt.input,
			gas,
			is_static,
			interrupt.context,
		)
	}

	fn enter_nested_create(&mut self, interrupt: CreateInterrupt) -> Entry<'config> {
		let gas = match self.frame_mut() {
			Ok(frame) => {
				let gas = frame.gasometer.gas();
				let gas = gas - gas / 64;
				if let Err(e) = frame.gasometer.record_cost(gas) {
					return Entry::Exit(Outcome {
						reason: Err(e),
						output: Vec::new(),
						gas: 0,
					});
				}
				gas
			}
			Err(e) => {
				return Entry::Exit(Outcome {
					reason: Err(e),
					output: Vec::new(),
					gas: 0,
				})
			}
		};

		let (_, entry) = self.enter_create(
			interrupt.caller,
			interrupt.scheme,
			interrupt.value,
			interrupt.init_code,
			gas,
		);
		entry
	}

	fn enter_call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		gas: u64,
		is_static: bool,
		context: Context,
	) -> Entry<'config> {
		if self.cancelled() {
			return Entry::Exit(Outcome {
				reason: ExitFatal::Cancelled.into(),
				output: Vec::new(),
				gas: 0,
			});
		}
		if self.depth_exceeded() {
			return Entry::Exit(Outcome {
				reason: ExitException::CallTooDeep.into(),
				output: Vec::new(),
				gas,
			});
		}
		if let Some(transfer) = &transfer {
			if !(self.context.can_transfer)(&self.state, transfer.source, transfer.value) {
				return Entry::Exit(Outcome {
					reason: ExitException::OutOfFund.into(),
					output: Vec::new(),
					gas,
				});
			}
		}

		let snapshot = self.state.snapshot();
		let precompiles = self.precompiles;
		let precompile = precompiles.get(code_address);

		if let Some(transfer) = transfer {
			// Only a plain CALL may bring its target into existence.
			if transfer.target == code_address && !self.state.exist(code_address) {
				if precompile.is_none() && transfer.value == U256::zero() {
					return Entry::Exit(Outcome {
						reason: ExitSucceed::Stopped.into(),
						output: Vec::new(),
						gas,
					});
				}
				self.state.create_account(code_address);
			}
			(self.context.transfer)(
				&mut self.state,
				transfer.source,
				transfer.target,
				transfer.value,
			);
		}

		if let Some(precompile) = precompile {
			let frame = PrecompileFrame {
				context,
				is_static,
			};
			let (reason, output, gas) = run_precompiled_contract(
				precompile,
				&input,
				gas,
				&frame,
				&self.context,
				&mut self.state,
			);
			return Entry::Exit(self.exit_call(code_address, snapshot, reason, output, gas));
		}

		let code = self.state.get_code(code_address);
		if code.is_empty() {
			return Entry::Exit(Outcome {
				reason: ExitSucceed::Stopped.into(),
				output: Vec::new(),
				gas,
			});
		}

		let contract = Contract::new(context, code_address, code, input, gas);
		let frame = Frame {
			gasometer: Gasometer::new(gas, self.config),
			is_static,
			kind: FrameKind::Call { code_address },
			snapshot,
		};
		Entry::Enter(frame, Runtime::new(&contract, self.config))
	}

	fn enter_create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		gas: u64,
	) -> (H160, Entry<'config>) {
		let address = self.create_address(scheme);

		if self.cancelled() {
			let outcome = Outcome {
				reason: ExitFatal::Cancelled.into(),
				output: Vec::new(),
				gas: 0,
			};
			return (address, Entry::Exit(outcome));
		}
		if self.depth_exceeded() {
			let outcome = Outcome {
				reason: ExitException::CallTooDeep.into(),
				output: Vec::new(),
				gas,
			};
			return (address, Entry::Exit(outcome));
		}
		if !(self.context.can_transfer)(&self.state, caller, value) {
			let outcome = Outcome {
				reason: ExitException::OutOfFund.into(),
				output: Vec::new(),
				gas,
			};
			return (address, Entry::Exit(outcome));
		}

		let nonce = self.state.get_nonce(caller);
		self.state.set_nonce(caller, nonce.wrapping_add(1));

		// The nonce bump above is taken before the snapshot and survives a
		// collision, as in geth.
		let code_hash = self.state.get_code_hash(address);
		if self.state.get_nonce(address) != 0
			|| (code_hash != H256::zero() && code_hash != EMPTY_CODE_HASH)
		{
			let outcome = Outcome {
				reason: ExitException::CreateCollision.into(),
				output: Vec::new(),
				gas: 0,
			};
			return (address, Entry::Exit(outcome));
		}

		let snapshot = self.state.snapshot();
		self.state.create_account(address);
		self.state.set_nonce(address, 1);
		(self.context.transfer)(&mut self.state, caller, address, value);

		let context = Context {
			address,
			caller,
			apparent_value: value,
		};
		let contract = Contract::new(context, address, init_code, Vec::new(), gas);
		let frame = Frame {
			gasometer: Gasometer::new(gas, self.config),
			is_static: false,
			kind: FrameKind::Create { address },
			snapshot,
		};
		(address, Entry::Enter(frame, Runtime::new(&contract, self.config)))
	}

	fn exit_frame(&mut self, frame: Frame<'config>, reason: ExitResult, output: Vec<u8>) -> Outcome {
		match frame.kind {
			FrameKind::Call { code_address } => {
				let gas = frame.gasometer.gas();
				self.exit_call(code_address, frame.snapshot, reason, output, gas)
			}
			FrameKind::Create { address } => {
				self.exit_create(address, frame.snapshot, reason, output, frame.gasometer)
			}
		}
	}

	fn exit_call(
		&mut self,
		code_address: H160,
		snapshot: usize,
		reason: ExitResult,
		output: Vec<u8>,
		gas: u64,
	) -> Outcome {
		log::debug!(target: "kvm", "Call execution using address {}: {:?}", code_address, reason);

		match reason {
			Ok(_) => Outcome {
				reason,
				output,
				gas,
			},
			Err(ExitError::Reverted) => {
				self.state.revert_to_snapshot(snapshot);
				Outcome {
					reason,
					output,
					gas,
				}
			}
			Err(_) => {
				self.state.revert_to_snapshot(snapshot);
				Outcome {
					reason,
					output: Vec::new(),
					gas: 0,
				}
			}
		}
	}

	fn exit_create(
		&mut self,
		address: H160,
		snapshot: usize,
		reason: ExitResult,
		output: Vec<u8>,
		mut gasometer: Gasometer<'config>,
	) -> Outcome {
		log::debug!(target: "kvm", "Create execution using address {}: {:?}", address, reason);

		match reason {
			Ok(_) => {
				if let Some(limit) = self.config.create_contract_limit {
					if output.len() > limit {
						self.state.revert_to_snapshot(snapshot);
						return Outcome {
							reason: ExitException::CreateContractLimit.into(),
							output: Vec::new(),
							gas: 0,
						};
					}
				}

				match gasometer.record_deposit(output.len()) {
					Ok(()) => {
						self.state.set_code(address, output);
						Outcome {
							reason,
							output: Vec::new(),
							gas: gasometer.gas(),
						}
					}
					Err(e) => {
						self.state.revert_to_snapshot(snapshot);
						Outcome {
							reason: Err(e),
							output: Vec::new(),
							gas: 0,
						}
					}
				}
			}
			Err(ExitError::Reverted) => {
				self.state.revert_to_snapshot(snapshot);
				Outcome {
					reason,
					output,
					gas: gasometer.gas(),
				}
			}
			Err(_) => {
				self.state.revert_to_snapshot(snapshot);
				Outcome {
					reason,
					output: Vec::new(),
					gas: 0,
				}
			}
		}
	}
}

impl<'config, 'precompiles, S: StateDB> Handler for Kvm<'config, 'precompiles, S> {
	fn balance(&self, address: H160) -> U256 {
		self.state.get_balance(address)
	}

	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.state.get_code_size(address))
	}

	fn code_hash(&self, address: H160) -> H256 {
		self.state.get_code_hash(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state.get_code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state.get_state(address, index)
	}

	fn gas_left(&self) -> U256 {
		self.frames
			.last()
			.map(|frame| U256::from(frame.gasometer.gas()))
			.unwrap_or_default()
	}

	fn gas_price(&self) -> U256 {
		self.context.gas_price
	}

	fn origin(&self) -> H160 {
		self.context.origin
	}

	fn block_hash(&self, number: U256) -> H256 {
		let current = U256::from(self.context.block_height);
		let oldest = current.saturating_sub(U256::from(256));

		if number >= oldest && number < current {
			(self.context.get_hash)(number.as_u64())
		} else {
			H256::zero()
		}
	}

	fn block_number(&self) -> U256 {
		U256::from(self.context.block_height)
	}

	fn block_coinbase(&self) -> H160 {
		self.context.coinbase
	}

	fn block_timestamp(&self) -> U256 {
		U256::from(self.context.time)
	}

	fn block_gas_limit(&self) -> U256 {
		U256::from(self.context.gas_limit)
	}

	fn chain_id(&self) -> U256 {
		U256::from(self.context.chain_id)
	}

	fn exists(&self, address: H160) -> bool {
		if self.config.empty_considered_exists {
			self.state.exist(address)
		} else {
			self.state.exist(address) && !self.state.empty(address)
		}
	}

	fn deleted(&self, address: H160) -> bool {
		self.state.has_suicided(address)
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.state.set_state(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		self.state.add_log(Log {
			address,
			topics,
			data,
			block_height: self.context.block_height,
		});
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.state.get_balance(address);
		self.state.add_balance(target, balance);
		self.state.suicide(address);
		Ok(())
	}

	fn preimage(&mut self, hash: H256, data: &[u8]) {
		if self.config.record_preimages {
			self.state.add_preimage(hash, data.to_vec());
		}
	}

	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError> {
		if self.cancelled() {
			log::trace!(target: "kvm", "Execution cancelled at {:?}", opcode);
			return Err(ExitFatal::Cancelled.into());
		}

		log::trace!(
			target: "kvm",
			"Running opcode {:?} at {}, gas left {}",
			opcode,
			context.address,
			self.gas_left()
		);

		if let Some(cost) = gasometer::static_opcode_cost(opcode) {
			self.frame_mut()?.gasometer.record_cost(cost)?;
		} else {
			let is_static = self.frame()?.is_static;
			let (gas_cost, memory_cost) = gasometer::dynamic_opcode_cost(
				context.address,
				opcode,
				stack,
				is_static,
				&*self,
			)?;
			let refund = gas_cost.refund(self.config);
			self.frame_mut()?
				.gasometer
				.record_dynamic_cost(gas_cost, memory_cost)?;
			if refund > 0 {
				self.state.add_refund(refund as u64);
			}
		}

		if matches!(
			opcode,
			Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL
		) {
			let requested = stack.peek(0)?;
			let gasometer = &mut self.frame_mut()?.gasometer;
			let gas = gasometer::call_gas(gasometer.gas(), requested);
			gasometer.record_cost(gas)?;
			self.call_gas_temp = Some(gas);
		}

		Ok(())
	}
}

//! Runtime layer of the Kardia Virtual Machine. Drives a core [`Machine`] and
//! resolves every opcode that needs state outside of the frame through a
//! [`Handler`]. Nested calls and creates suspend the runtime with an
//! [`Interrupt`] instead of recursing.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod context;
mod eval;
mod handler;
mod interrupt;

pub use kvm_core::*;

pub use crate::config::Config;
pub use crate::context::{CallScheme, Context, Contract, CreateScheme};
pub use crate::handler::{Handler, Transfer};
pub use crate::interrupt::{CallInterrupt, CreateInterrupt, Interrupt};

use crate::interrupt::Pending;
use alloc::vec::Vec;
use primitive_types::H160;

/// KVM runtime of one frame.
///
/// The runtime wraps a [`Machine`], checks each opcode's stack bounds, lets
/// the handler charge gas and enforce static frames, then evaluates it.
pub struct Runtime {
	machine: Machine,
	status: Result<(), ExitResult>,
	return_data_buffer: Vec<u8>,
	context: Context,
	pending: Option<Pending>,
}

impl Runtime {
	/// Create a new runtime for the given frame.
	pub fn new(contract: &Contract, config: &Config) -> Self {
		Self {
			machine: Machine::new(
				contract.code.clone(),
				contract.input.clone(),
				config.stack_limit,
				config.memory_limit,
			),
			status: Ok(()),
			return_data_buffer: Vec::new(),
			context: contract.context.clone(),
			pending: None,
		}
	}

	/// Get a reference to the machine.
	pub fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Context of the frame.
	pub fn context(&self) -> &Context {
		&self.context
	}

	/// Data returned by the last nested call or create.
	pub fn return_data_buffer(&self) -> &[u8] {
		&self.return_data_buffer
	}

	fn fail(&mut self, reason: ExitResult) -> ExitResult {
		self.machine.exit(reason.clone());
		self.status = Err(reason.clone());
		reason
	}

	/// Step the runtime by one opcode.
	///
	/// Stepping while an interrupt is still unresolved exits with
	/// `ExitFatal::UnhandledInterrupt`.
	pub fn step<H: Handler>(
		&mut self,
		handler: &mut H,
	) -> Result<(), Capture<ExitResult, Interrupt>> {
		if self.pending.is_some() {
			self.pending = None;
			return Err(Capture::Exit(self.fail(ExitFatal::UnhandledInterrupt.into())));
		}

		if let Some((opcode, stack)) = self.machine.inspect() {
			let checked = match opcode.stack_io() {
				Some((pops, pushes)) => stack.check_io(pops, pushes).map_err(ExitError::from),
				None => Err(ExitException::InvalidOpcode(opcode).into()),
			};

			if let Err(error) =
				checked.and_then(|()| handler.pre_validate(&self.context, opcode, stack))
			{
				return Err(Capture::Exit(self.fail(Err(error))));
			}
		}

		if let Err(exit) = &self.status {
			return Err(Capture::Exit(exit.clone()));
		}

		match self.machine.step() {
			Ok(()) => Ok(()),
			Err(Capture::Exit(exit)) => {
				self.status = Err(exit.clone());
				Err(Capture::Exit(exit))
			}
			Err(Capture::Trap(opcode)) => match eval::eval(self, opcode, handler) {
				eval::Control::Continue => Ok(()),
				eval::Control::Interrupt(interrupt) => Err(Capture::Trap(interrupt)),
				eval::Control::Exit(exit) => Err(Capture::Exit(self.fail(exit))),
			},
		}
	}

	/// Loop stepping the runtime until it stops or asks for a nested
	/// execution.
	pub fn run<H: Handler>(&mut self, handler: &mut H) -> Capture<ExitResult, Interrupt> {
		loop {
			if let Err(capture) = self.step(handler) {
				return capture;
			}
		}
	}

	/// Hand the outcome of a call interrupt back to the suspended frame. The
	/// output is copied to the memory range given by the opcode and the
	/// success flag is pushed.
	pub fn resolve_call(&mut self, reason: ExitResult, return_data: Vec<u8>) {
		let control = match self.pending.take() {
			Some(Pending::Call {
				out_offset,
				out_len,
			}) => eval::finish_call(self, out_offset, out_len, reason, return_data),
			_ => eval::Control::Exit(ExitFatal::UnhandledInterrupt.into()),
		};
		self.resume(control);
	}

	/// Hand the outcome of a create interrupt back to the suspended frame,
	/// pushing the new address or zero.
	pub fn resolve_create(
		&mut self,
		reason: ExitResult,
		address: Option<H160>,
		return_data: Vec<u8>,
	) {
		let control = match self.pending.take() {
			Some(Pending::Create) => eval::finish_create(self, reason, address, return_data),
			_ => eval::Control::Exit(ExitFatal::UnhandledInterrupt.into()),
		};
		self.resume(control);
	}

	fn resume(&mut self, control: eval::Control) {
		if let eval::Control::Exit(exit) = control {
			self.fail(exit);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use primitive_types::{H160, H256, U256};

	#[derive(Default)]
	struct Env {
		logs: Vec<(H160, Vec<H256>, Vec<u8>)>,
		seen: Vec<Opcode>,
	}

	impl Handler for Env {
		fn balance(&self, _address: H160) -> U256 {
			U256::from(7)
		}
		fn code_size(&self, _address: H160) -> U256 {
			U256::zero()
		}
		fn code_hash(&self, _address: H160) -> H256 {
			H256::default()
		}
		fn code(&self, _address: H160) -> Vec<u8> {
			Vec::new()
		}
		fn storage(&self, _address: H160, _index: H256) -> H256 {
			H256::default()
		}
		fn gas_left(&self) -> U256 {
			U256::zero()
		}
		fn gas_price(&self) -> U256 {
			U256::zero()
		}
		fn origin(&self) -> H160 {
			H160::default()
		}
		fn block_hash(&self, _number: U256) -> H256 {
			H256::default()
		}
		fn block_number(&self) -> U256 {
			U256::from(42)
		}
		fn block_coinbase(&self) -> H160 {
			H160::default()
		}
		fn block_timestamp(&self) -> U256 {
			U256::zero()
		}
		fn block_gas_limit(&self) -> U256 {
			U256::zero()
		}
		fn chain_id(&self) -> U256 {
			U256::zero()
		}
		fn exists(&self, _address: H160) -> bool {
			true
		}
		fn deleted(&self, _address: H160) -> bool {
			false
		}
		fn set_storage(
			&mut self,
			_address: H160,
			_index: H256,
			_value: H256,
		) -> Result<(), ExitError> {
			Ok(())
		}
		fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
			self.logs.push((address, topics, data));
			Ok(())
		}
		fn mark_delete(&mut self, _address: H160, _target: H160) -> Result<(), ExitError> {
			Ok(())
		}
		fn pre_validate(
			&mut self,
			_context: &Context,
			opcode: Opcode,
			_stack: &Stack,
		) -> Result<(), ExitError> {
			self.seen.push(opcode);
			Ok(())
		}
	}

	fn contract(code: &str) -> Contract {
		Contract::new(
			Context {
				address: H160::repeat_byte(0x11),
				caller: H160::repeat_byte(0x22),
				apparent_value: U256::zero(),
			},
			H160::repeat_byte(0x11),
			hex::decode(code).unwrap(),
			Vec::new(),
			0,
		)
	}

	#[test]
	fn external_opcodes_reach_handler() {
		// NUMBER PUSH1 0 BALANCE ADD
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("4360003101"), &Config::kardia());
		assert_eq!(runtime.run(&mut env), Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(49)));
		assert_eq!(
			env.seen,
			vec![Opcode::NUMBER, Opcode::PUSH1, Opcode::BALANCE, Opcode::ADD]
		);
	}

	#[test]
	fn undefined_opcode_fails_before_handler() {
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("0c"), &Config::kardia());
		assert_eq!(
			runtime.run(&mut env),
			Capture::Exit(Err(ExitError::Exception(ExitException::InvalidOpcode(
				Opcode(0x0c)
			))))
		);
		assert!(env.seen.is_empty());
	}

	#[test]
	fn underflow_is_checked_before_handler() {
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("01"), &Config::kardia());
		assert_eq!(
			runtime.run(&mut env),
			Capture::Exit(Err(ExitError::Exception(ExitException::StackUnderflow)))
		);
		assert!(env.seen.is_empty());
	}

	#[test]
	fn log_pops_topics_in_order() {
		// PUSH1 2 PUSH1 1 PUSH1 0 PUSH1 0 LOG2
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("6002600160006000a2"), &Config::kardia());
		assert_eq!(runtime.run(&mut env), Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(
			env.logs,
			vec![(
				H160::repeat_byte(0x11),
				vec![H256::from_low_u64_be(1), H256::from_low_u64_be(2)],
				Vec::new()
			)]
		);
	}

	#[test]
	fn call_suspends_until_resolved() {
		// PUSH1 2 PUSH1 0 PUSH1 0 PUSH1 0 PUSH1 9 PUSH1 0x33 PUSH1 0 CALL
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("6002600060006000600960336000f1"), &Config::kardia());

		let interrupt = match runtime.run(&mut env) {
			Capture::Trap(Interrupt::Call(interrupt)) => interrupt,
			other => panic!("expected a call interrupt, got {:?}", other),
		};
		assert_eq!(interrupt.code_address, H160::from_low_u64_be(0x33));
		assert_eq!(
			interrupt.transfer,
			Some(Transfer {
				source: H160::repeat_byte(0x11),
				target: H160::from_low_u64_be(0x33),
				value: U256::from(9),
			})
		);
		assert!(!interrupt.is_static);
		assert_eq!(interrupt.context.caller, H160::repeat_byte(0x11));

		runtime.resolve_call(Err(ExitError::Reverted), vec![0xde, 0xad]);
		assert_eq!(runtime.run(&mut env), Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::zero()));
		assert_eq!(runtime.machine().memory().get(0, 2), vec![0xde, 0xad]);
		assert_eq!(runtime.return_data_buffer(), &[0xde, 0xad]);
	}

	#[test]
	fn create_pushes_address_on_success() {
		// PUSH1 0 PUSH1 0 PUSH1 0 CREATE
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("600060006000f0"), &Config::kardia());

		match runtime.run(&mut env) {
			Capture::Trap(Interrupt::Create(interrupt)) => {
				assert_eq!(interrupt.caller, H160::repeat_byte(0x11));
				assert!(interrupt.init_code.is_empty());
			}
			other => panic!("expected a create interrupt, got {:?}", other),
		}

		let created = H160::repeat_byte(0x44);
		runtime.resolve_create(Ok(ExitSucceed::Stopped), Some(created), vec![0x01]);
		assert_eq!(runtime.run(&mut env), Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(runtime.machine().stack().peek_h256(0), Ok(H256::from(created)));
		assert!(runtime.return_data_buffer().is_empty());
	}

	#[test]
	fn unresolved_interrupt_is_fatal() {
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("600060006000f0"), &Config::kardia());

		assert!(matches!(runtime.run(&mut env), Capture::Trap(_)));
		assert_eq!(
			runtime.run(&mut env),
			Capture::Exit(Err(ExitError::Fatal(ExitFatal::UnhandledInterrupt)))
		);
	}

	#[test]
	fn fatal_outcome_stops_the_caller() {
		let mut env = Env::default();
		let mut runtime = Runtime::new(&contract("6000600060006000600060006000f1"), &Config::kardia());

		assert!(matches!(runtime.run(&mut env), Capture::Trap(_)));
		runtime.resolve_call(ExitFatal::Cancelled.into(), Vec::new());
		assert_eq!(
			runtime.run(&mut env),
			Capture::Exit(Err(ExitError::Fatal(ExitFatal::Cancelled)))
		);
	}
}

use crate::backend::StateDB;
use crate::context::BlockContext;
use crate::{Context, ExitError, ExitException, ExitFatal, ExitResult, ExitSucceed};
use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};
use primitive_types::H160;

/// Data returned by a precompile in case of failure.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PrecompileFailure {
	/// Reverts the state changes and consume all the gas.
	Error { exit_status: ExitException },
	/// Reverts the state changes and hands the output back to the caller.
	/// Unspent gas is returned.
	Revert { output: Vec<u8> },
	/// Mark this failure as fatal, and all KVM execution stacks must be exited.
	Fatal { exit_status: ExitFatal },
}

impl From<ExitException> for PrecompileFailure {
	fn from(error: ExitException) -> PrecompileFailure {
		PrecompileFailure::Error { exit_status: error }
	}
}

/// Frame a precompile is called in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrecompileFrame {
	/// Address, caller and value of the call.
	pub context: Context,
	/// Whether the call may not modify state.
	pub is_static: bool,
}

/// A natively implemented contract.
#[auto_impl::auto_impl(&, Box)]
pub trait Precompile {
	/// Gas charged before the contract runs. The call fails with
	/// `OutOfGas` without running if less is available.
	fn required_gas(&self, input: &[u8]) -> u64;

	/// Run the contract.
	fn run(
		&self,
		input: &[u8],
		frame: &PrecompileFrame,
		context: &BlockContext,
		state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure>;
}

/// Table of precompiled contracts, keyed by address.
#[derive(Default)]
pub struct Precompiles {
	contracts: BTreeMap<H160, Box<dyn Precompile>>,
}

impl Precompiles {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder style [`Precompiles::insert`].
	pub fn with<P: Precompile + 'static>(mut self, address: H160, precompile: P) -> Self {
		self.insert(address, precompile);
		self
	}

	/// Register a contract, replacing any contract at the same address.
	pub fn insert<P: Precompile + 'static>(&mut self, address: H160, precompile: P) {
		self.contracts.insert(address, Box::new(precompile));
	}

	/// Contract at `address`.
	pub fn get(&self, address: H160) -> Option<&dyn Precompile> {
		self.contracts.get(&address).map(|p| p.as_ref())
	}

	/// Whether a contract is registered at `address`.
	pub fn contains(&self, address: H160) -> bool {
		self.contracts.contains_key(&address)
	}

	/// Every registered address, in ascending order.
	pub fn addresses(&self) -> impl Iterator<Item = H160> + '_ {
		self.contracts.keys().copied()
	}
}

/// Charge and run a precompile. Returns the exit reason, the output and the
/// gas left over from `gas`.
pub fn run_precompiled_contract(
	precompile: &dyn Precompile,
	input: &[u8],
	gas: u64,
	frame: &PrecompileFrame,
	context: &BlockContext,
	state: &mut dyn StateDB,
) -> (ExitResult, Vec<u8>, u64) {
	let required = precompile.required_gas(input);
	if required > gas {
		return (ExitException::OutOfGas.into(), Vec::new(), 0);
	}
	let leftover = gas - required;

	match precompile.run(input, frame, context, state) {
		Ok(output) => (ExitSucceed::Returned.into(), output, leftover),
		Err(PrecompileFailure::Error { exit_status }) => (exit_status.into(), Vec::new(), 0),
		Err(PrecompileFailure::Revert { output }) => (Err(ExitError::Reverted), output, leftover),
		Err(PrecompileFailure::Fatal { exit_status }) => (exit_status.into(), Vec::new(), 0),
	}
}

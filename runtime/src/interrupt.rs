use crate::{Context, CreateScheme, Transfer};
use alloc::vec::Vec;
use primitive_types::{H160, U256};

/// Nested execution requested by a frame. The runtime stays suspended on the
/// opcode until it is resolved with [`crate::Runtime::resolve_call`] or
/// [`crate::Runtime::resolve_create`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Interrupt {
	/// `CALL`, `CALLCODE`, `DELEGATECALL` or `STATICCALL`.
	Call(CallInterrupt),
	/// `CREATE` or `CREATE2`.
	Create(CreateInterrupt),
}

/// Call interrupt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallInterrupt {
	/// Address the code is loaded from.
	pub code_address: H160,
	/// Value moved before the callee runs, if the scheme moves any.
	pub transfer: Option<Transfer>,
	/// Call data.
	pub input: Vec<u8>,
	/// Whether the opcode itself was `STATICCALL`.
	pub is_static: bool,
	/// Context the callee runs in.
	pub context: Context,
}

/// Create interrupt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateInterrupt {
	/// Account paying for the creation.
	pub caller: H160,
	/// How the new address is derived.
	pub scheme: CreateScheme,
	/// Endowment.
	pub value: U256,
	/// Init code.
	pub init_code: Vec<u8>,
}

/// What a suspended runtime does with the outcome of its interrupt.
#[derive(Clone, Debug)]
pub(crate) enum Pending {
	Call { out_offset: U256, out_len: U256 },
	Create,
}

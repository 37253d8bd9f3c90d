use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Create scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// Legacy create scheme of `CREATE`.
	Legacy {
		/// Caller of the create.
		caller: H160,
	},
	/// Create scheme of `CREATE2`.
	Create2 {
		/// Caller of the create.
		caller: H160,
		/// Code hash.
		code_hash: H256,
		/// Salt.
		salt: H256,
	},
}

/// Call scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
	/// `STATICCALL`
	StaticCall,
}

/// Context of the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
	/// Execution address.
	pub address: H160,
	/// Caller of the KVM.
	pub caller: H160,
	/// Apparent value of the KVM.
	pub apparent_value: U256,
}

/// One call frame: the code that runs, where it runs, and what it was given.
#[derive(Clone, Debug)]
pub struct Contract {
	/// Address, caller and value seen by the running code.
	pub context: Context,
	/// Address the code was loaded from. Differs from `context.address`
	/// under `CALLCODE` and `DELEGATECALL`.
	pub code_address: H160,
	/// Code bytes.
	pub code: Rc<Vec<u8>>,
	/// Keccak hash of `code`.
	pub code_hash: H256,
	/// Input data.
	pub input: Rc<Vec<u8>>,
	/// Gas given to the frame.
	pub gas: u64,
}

impl Contract {
	/// Create a new frame descriptor, hashing the code.
	pub fn new(
		context: Context,
		code_address: H160,
		code: Vec<u8>,
		input: Vec<u8>,
		gas: u64,
	) -> Self {
		let code_hash = H256::from_slice(Keccak256::digest(&code).as_slice());

		Self {
			context,
			code_address,
			code: Rc::new(code),
			code_hash,
			input: Rc::new(input),
			gas,
		}
	}

	/// Address whose storage the frame touches.
	pub fn address(&self) -> H160 {
		self.context.address
	}

	/// Caller of the frame.
	pub fn caller(&self) -> H160 {
		self.context.caller
	}

	/// Value seen by `CALLVALUE`.
	pub fn value(&self) -> U256 {
		self.context.apparent_value
	}
}

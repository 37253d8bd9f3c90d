/// Opcode enum. One-to-one corresponding to an `u8` value.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct Opcode(pub u8);

macro_rules! opcodes {
	( $( $(#[$doc:meta])* $name:ident = $value:literal, $pops:literal, $pushes:literal; )* ) => {
		impl Opcode {
			$(
				$(#[$doc])*
				pub const $name: Opcode = Opcode($value);
			)*

			/// Mnemonic of the opcode, `None` when the byte is not a defined instruction.
			pub const fn name(&self) -> Option<&'static str> {
				match self.0 {
					$( $value => Some(stringify!($name)), )*
					_ => None,
				}
			}

			/// Number of stack items popped and pushed by the opcode, `None` when the
			/// byte is not a defined instruction.
			pub const fn stack_io(&self) -> Option<(usize, usize)> {
				match self.0 {
					$( $value => Some(($pops, $pushes)), )*
					_ => None,
				}
			}
		}
	}
}

opcodes! {
	/// `STOP`
	STOP = 0x00, 0, 0;
	/// `ADD`
	ADD = 0x01, 2, 1;
	/// `MUL`
	MUL = 0x02, 2, 1;
	/// `SUB`
	SUB = 0x03, 2, 1;
	/// `DIV`
	DIV = 0x04, 2, 1;
	/// `SDIV`
	SDIV = 0x05, 2, 1;
	/// `MOD`
	MOD = 0x06, 2, 1;
	/// `SMOD`
	SMOD = 0x07, 2, 1;
	/// `ADDMOD`
	ADDMOD = 0x08, 3, 1;
	/// `MULMOD`
	MULMOD = 0x09, 3, 1;
	/// `EXP`
	EXP = 0x0a, 2, 1;
	/// `SIGNEXTEND`
	SIGNEXTEND = 0x0b, 2, 1;

	/// `LT`
	LT = 0x10, 2, 1;
	/// `GT`
	GT = 0x11, 2, 1;
	/// `SLT`
	SLT = 0x12, 2, 1;
	/// `SGT`
	SGT = 0x13, 2, 1;
	/// `EQ`
	EQ = 0x14, 2, 1;
	/// `ISZERO`
	ISZERO = 0x15, 1, 1;
	/// `AND`
	AND = 0x16, 2, 1;
	/// `OR`
	OR = 0x17, 2, 1;
	/// `XOR`
	XOR = 0x18, 2, 1;
	/// `NOT`
	NOT = 0x19, 1, 1;
	/// `BYTE`
	BYTE = 0x1a, 2, 1;
	/// `SHL`
	SHL = 0x1b, 2, 1;
	/// `SHR`
	SHR = 0x1c, 2, 1;
	/// `SAR`
	SAR = 0x1d, 2, 1;

	/// `SHA3`
	SHA3 = 0x20, 2, 1;

	/// `ADDRESS`
	ADDRESS = 0x30, 0, 1;
	/// `BALANCE`
	BALANCE = 0x31, 1, 1;
	/// `ORIGIN`
	ORIGIN = 0x32, 0, 1;
	/// `CALLER`
	CALLER = 0x33, 0, 1;
	/// `CALLVALUE`
	CALLVALUE = 0x34, 0, 1;
	/// `CALLDATALOAD`
	CALLDATALOAD = 0x35, 1, 1;
	/// `CALLDATASIZE`
	CALLDATASIZE = 0x36, 0, 1;
	/// `CALLDATACOPY`
	CALLDATACOPY = 0x37, 3, 0;
	/// `CODESIZE`
	CODESIZE = 0x38, 0, 1;
	/// `CODECOPY`
	CODECOPY = 0x39, 3, 0;
	/// `GASPRICE`
	GASPRICE = 0x3a, 0, 1;
	/// `EXTCODESIZE`
	EXTCODESIZE = 0x3b, 1, 1;
	/// `EXTCODECOPY`
	EXTCODECOPY = 0x3c, 4, 0;
	/// `RETURNDATASIZE`
	RETURNDATASIZE = 0x3d, 0, 1;
	/// `RETURNDATACOPY`
	RETURNDATACOPY = 0x3e, 3, 0;

	/// `BLOCKHASH`
	BLOCKHASH = 0x40, 1, 1;
	/// `COINBASE`
	COINBASE = 0x41, 0, 1;
	/// `TIMESTAMP`
	TIMESTAMP = 0x42, 0, 1;
	/// `NUMBER`
	NUMBER = 0x43, 0, 1;
	/// `GASLIMIT`
	GASLIMIT = 0x45, 0, 1;
	/// `CHAINID`
	CHAINID = 0x46, 0, 1;

	/// `POP`
	POP = 0x50, 1, 0;
	/// `MLOAD`
	MLOAD = 0x51, 1, 1;
	/// `MSTORE`
	MSTORE = 0x52, 2, 0;
	/// `MSTORE8`
	MSTORE8 = 0x53, 2, 0;
	/// `SLOAD`
	SLOAD = 0x54, 1, 1;
	/// `SSTORE`
	SSTORE = 0x55, 2, 0;
	/// `JUMP`
	JUMP = 0x56, 1, 0;
	/// `JUMPI`
	JUMPI = 0x57, 2, 0;
	/// `PC`
	PC = 0x58, 0, 1;
	/// `MSIZE`
	MSIZE = 0x59, 0, 1;
	/// `GAS`
	GAS = 0x5a, 0, 1;
	/// `JUMPDEST`
	JUMPDEST = 0x5b, 0, 0;

	/// `PUSH1`
	PUSH1 = 0x60, 0, 1;
	/// `PUSH2`
	PUSH2 = 0x61, 0, 1;
	/// `PUSH3`
	PUSH3 = 0x62, 0, 1;
	/// `PUSH4`
	PUSH4 = 0x63, 0, 1;
	/// `PUSH5`
	PUSH5 = 0x64, 0, 1;
	/// `PUSH6`
	PUSH6 = 0x65, 0, 1;
	/// `PUSH7`
	PUSH7 = 0x66, 0, 1;
	/// `PUSH8`
	PUSH8 = 0x67, 0, 1;
	/// `PUSH9`
	PUSH9 = 0x68, 0, 1;
	/// `PUSH10`
	PUSH10 = 0x69, 0, 1;
	/// `PUSH11`
	PUSH11 = 0x6a, 0, 1;
	/// `PUSH12`
	PUSH12 = 0x6b, 0, 1;
	/// `PUSH13`
	PUSH13 = 0x6c, 0, 1;
	/// `PUSH14`
	PUSH14 = 0x6d, 0, 1;
	/// `PUSH15`
	PUSH15 = 0x6e, 0, 1;
	/// `PUSH16`
	PUSH16 = 0x6f, 0, 1;
	/// `PUSH17`
	PUSH17 = 0x70, 0, 1;
	/// `PUSH18`
	PUSH18 = 0x71, 0, 1;
	/// `PUSH19`
	PUSH19 = 0x72, 0, 1;
	/// `PUSH20`
	PUSH20 = 0x73, 0, 1;
	/// `PUSH21`
	PUSH21 = 0x74, 0, 1;
	/// `PUSH22`
	PUSH22 = 0x75, 0, 1;
	/// `PUSH23`
	PUSH23 = 0x76, 0, 1;
	/// `PUSH24`
	PUSH24 = 0x77, 0, 1;
	/// `PUSH25`
	PUSH25 = 0x78, 0, 1;
	/// `PUSH26`
	PUSH26 = 0x79, 0, 1;
	/// `PUSH27`
	PUSH27 = 0x7a, 0, 1;
	/// `PUSH28`
	PUSH28 = 0x7b, 0, 1;
	/// `PUSH29`
	PUSH29 = 0x7c, 0, 1;
	/// `PUSH30`
	PUSH30 = 0x7d, 0, 1;
	/// `PUSH31`
	PUSH31 = 0x7e, 0, 1;
	/// `PUSH32`
	PUSH32 = 0x7f, 0, 1;

	/// `DUP1`
	DUP1 = 0x80, 1, 2;
	/// `DUP2`
	DUP2 = 0x81, 2, 3;
	/// `DUP3`
	DUP3 = 0x82, 3, 4;
	/// `DUP4`
	DUP4 = 0x83, 4, 5;
	/// `DUP5`
	DUP5 = 0x84, 5, 6;
	/// `DUP6`
	DUP6 = 0x85, 6, 7;
	/// `DUP7`
	DUP7 = 0x86, 7, 8;
	/// `DUP8`
	DUP8 = 0x87, 8, 9;
	/// `DUP9`
	DUP9 = 0x88, 9, 10;
	/// `DUP10`
	DUP10 = 0x89, 10, 11;
	/// `DUP11`
	DUP11 = 0x8a, 11, 12;
	/// `DUP12`
	DUP12 = 0x8b, 12, 13;
	/// `DUP13`
	DUP13 = 0x8c, 13, 14;
	/// `DUP14`
	DUP14 = 0x8d, 14, 15;
	/// `DUP15`
	DUP15 = 0x8e, 15, 16;
	/// `DUP16`
	DUP16 = 0x8f, 16, 17;

	/// `SWAP1`
	SWAP1 = 0x90, 2, 2;
	/// `SWAP2`
	SWAP2 = 0x91, 3, 3;
	/// `SWAP3`
	SWAP3 = 0x92, 4, 4;
	/// `SWAP4`
	SWAP4 = 0x93, 5, 5;
	/// `SWAP5`
	SWAP5 = 0x94, 6, 6;
	/// `SWAP6`
	SWAP6 = 0x95, 7, 7;
	/// `SWAP7`
	SWAP7 = 0x96, 8, 8;
	/// `SWAP8`
	SWAP8 = 0x97, 9, 9;
	/// `SWAP9`
	SWAP9 = 0x98, 10, 10;
	/// `SWAP10`
	SWAP10 = 0x99, 11, 11;
	/// `SWAP11`
	SWAP11 = 0x9a, 12, 12;
	/// `SWAP12`
	SWAP12 = 0x9b, 13, 13;
	/// `SWAP13`
	SWAP13 = 0x9c, 14, 14;
	/// `SWAP14`
	SWAP14 = 0x9d, 15, 15;
	/// `SWAP15`
	SWAP15 = 0x9e, 16, 16;
	/// `SWAP16`
	SWAP16 = 0x9f, 17, 17;

	/// `LOG0`
	LOG0 = 0xa0, 2, 0;
	/// `LOG1`
	LOG1 = 0xa1, 3, 0;
	/// `LOG2`
	LOG2 = 0xa2, 4, 0;
	/// `LOG3`
	LOG3 = 0xa3, 5, 0;
	/// `LOG4`
	LOG4 = 0xa4, 6, 0;

	/// `CREATE`
	CREATE = 0xf0, 3, 1;
	/// `CALL`
	CALL = 0xf1, 7, 1;
	/// `CALLCODE`
	CALLCODE = 0xf2, 7, 1;
	/// `RETURN`
	RETURN = 0xf3, 2, 0;
	/// `DELEGATECALL`
	DELEGATECALL = 0xf4, 6, 1;
	/// `CREATE2`
	CREATE2 = 0xf5, 4, 1;
	/// `STATICCALL`
	STATICCALL = 0xfa, 6, 1;
	/// `REVERT`
	REVERT = 0xfd, 2, 0;
	/// `INVALID`
	INVALID = 0xfe, 0, 0;
	/// `SUICIDE`, also known as `SELFDESTRUCT`
	SUICIDE = 0xff, 1, 0;
}

impl Opcode {
	/// Whether the opcode is a push opcode, returning the immediate size.
	pub fn is_push(&self) -> Option<u8> {
		let value = self.0;
		if (0x60..=0x7f).contains(&value) {
			Some(value - 0x60 + 1)
		} else {
			None
		}
	}

	/// Whether executing the opcode may modify state, and is thus forbidden
	/// inside a static call. `CALL` is only a write when it transfers value,
	/// which the caller has to check on the stack.
	pub fn is_state_write(&self) -> bool {
		matches!(
			*self,
			Opcode::SSTORE
				| Opcode::LOG0
				| Opcode::LOG1
				| Opcode::LOG2
				| Opcode::LOG3
				| Opcode::LOG4
				| Opcode::CREATE
				| Opcode::CREATE2
				| Opcode::SUICIDE
		)
	}

	#[inline]
	pub const fn as_u8(&self) -> u8 {
		self.0
	}

	#[inline]
	pub const fn as_usize(&self) -> usize {
		self.0 as usize
	}
}

impl core::fmt::Debug for Opcode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "{:#04x}", self.0)
	}
}

impl core::fmt::Display for Opcode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "UNKNOWN({:#04x})", self.0),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Opcode;

	#[test]
	fn display_is_mnemonic() {
		assert_eq!(format!("{}", Opcode::SSTORE), "SSTORE");
		assert_eq!(format!("{}", Opcode(0x0c)), "UNKNOWN(0x0c)");
		assert_eq!(format!("{:?}", Opcode::CALL), "0xf1");
	}

	#[test]
	fn undefined_bytes_have_no_stack_io() {
		assert_eq!(Opcode(0x0c).stack_io(), None);
		assert_eq!(Opcode(0x5f).stack_io(), None);
		assert_eq!(Opcode::CALL.stack_io(), Some((7, 1)));
		assert_eq!(Opcode::SWAP16.stack_io(), Some((17, 17)));
	}

	#[test]
	fn state_writes() {
		assert!(Opcode::SSTORE.is_state_write());
		assert!(Opcode::LOG4.is_state_write());
		assert!(Opcode::SUICIDE.is_state_write());
		assert!(!Opcode::CALL.is_state_write());
		assert!(!Opcode::SLOAD.is_state_write());
	}

	#[test]
	fn push_sizes() {
		assert_eq!(Opcode::PUSH1.is_push(), Some(1));
		assert_eq!(Opcode::PUSH32.is_push(), Some(32));
		assert_eq!(Opcode::DUP1.is_push(), None);
	}
}

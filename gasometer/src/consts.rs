use kvm_core::Opcode;

pub const G_ZERO: u64 = 0;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_JUMPDEST: u64 = 1;
pub const G_SHA3: u64 = 30;
pub const G_SHA3WORD: u64 = 6;
pub const G_COPY: u64 = 3;
pub const G_BLOCKHASH: u64 = 20;
pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;
pub const G_EXP: u64 = 10;
pub const G_MEMORY: u64 = 3;
pub const G_QUADCOEFF_DIV: u64 = 512;

/// Largest memory size whose word count squared still fits in 64 bits.
pub const MAX_MEMORY_SIZE: u64 = 0x1F_FFFF_FFE0;

/// Constant gas of every opcode whose cost never depends on its operands.
pub static STATIC_COST_TABLE: [Option<u64>; 256] = {
	let mut table = [None; 256];

	table[Opcode::STOP.as_usize()] = Some(G_ZERO);
	table[Opcode::INVALID.as_usize()] = Some(G_ZERO);

	table[Opcode::ADDRESS.as_usize()] = Some(G_BASE);
	table[Opcode::ORIGIN.as_usize()] = Some(G_BASE);
	table[Opcode::CALLER.as_usize()] = Some(G_BASE);
	table[Opcode::CALLVALUE.as_usize()] = Some(G_BASE);
	table[Opcode::CALLDATASIZE.as_usize()] = Some(G_BASE);
	table[Opcode::CODESIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GASPRICE.as_usize()] = Some(G_BASE);
	table[Opcode::RETURNDATASIZE.as_usize()] = Some(G_BASE);
	table[Opcode::COINBASE.as_usize()] = Some(G_BASE);
	table[Opcode::TIMESTAMP.as_usize()] = Some(G_BASE);
	table[Opcode::NUMBER.as_usize()] = Some(G_BASE);
	table[Opcode::GASLIMIT.as_usize()] = Some(G_BASE);
	table[Opcode::CHAINID.as_usize()] = Some(G_BASE);
	table[Opcode::POP.as_usize()] = Some(G_BASE);
	table[Opcode::PC.as_usize()] = Some(G_BASE);
	table[Opcode::MSIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GAS.as_usize()] = Some(G_BASE);

	table[Opcode::ADD.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SUB.as_usize()] = Some(G_VERYLOW);
	table[Opcode::NOT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::LT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::GT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SLT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SGT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::EQ.as_usize()] = Some(G_VERYLOW);
	table[Opcode::ISZERO.as_usize()] = Some(G_VERYLOW);
	table[Opcode::AND.as_usize()] = Some(G_VERYLOW);
	table[Opcode::OR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::XOR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::BYTE.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SHL.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SHR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SAR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::CALLDATALOAD.as_usize()] = Some(G_VERYLOW);

	let mut i = Opcode::PUSH1.as_usize();
	while i <= Opcode::PUSH32.as_usize() {
		table[i] = Some(G_VERYLOW);
		i += 1;
	}
	let mut i = Opcode::DUP1.as_usize();
	while i <= Opcode::SWAP16.as_usize() {
		table[i] = Some(G_VERYLOW);
		i += 1;
	}

	table[Opcode::MUL.as_usize()] = Some(G_LOW);
	table[Opcode::DIV.as_usize()] = Some(G_LOW);
	table[Opcode::SDIV.as_usize()] = Some(G_LOW);
	table[Opcode::MOD.as_usize()] = Some(G_LOW);
	table[Opcode::SMOD.as_usize()] = Some(G_LOW);
	table[Opcode::SIGNEXTEND.as_usize()] = Some(G_LOW);

	table[Opcode::ADDMOD.as_usize()] = Some(G_MID);
	table[Opcode::MULMOD.as_usize()] = Some(G_MID);
	table[Opcode::JUMP.as_usize()] = Some(G_MID);

	table[Opcode::JUMPI.as_usize()] = Some(G_HIGH);
	table[Opcode::JUMPDEST.as_usize()] = Some(G_JUMPDEST);
	table[Opcode::BLOCKHASH.as_usize()] = Some(G_BLOCKHASH);

	table
};

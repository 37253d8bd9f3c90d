/// Chain parameters of the KVM. Gas constants that change across protocol
/// upgrades live here rather than in the interpreter loop.
#[derive(Clone, Debug)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
	/// Gas paid for extcode.
	pub gas_ext_code: u64,
	/// Gas paid for BALANCE opcode.
	pub gas_balance: u64,
	/// Gas paid for SLOAD opcode.
	pub gas_sload: u64,
	/// Gas paid for SSTORE writing a non-zero value into a zero slot.
	pub gas_sstore_set: u64,
	/// Gas paid for SSTORE in every other transition.
	pub gas_sstore_reset: u64,
	/// Gas paid for SSTORE clearing a non-zero slot.
	pub gas_sstore_clear: u64,
	/// Gas refunded for SSTORE clearing a non-zero slot.
	pub refund_sstore_clears: i64,
	/// Gas paid for SUICIDE opcode.
	pub gas_suicide: u64,
	/// Gas paid for SUICIDE opcode when it hits a new account.
	pub gas_suicide_new_account: u64,
	/// Gas refunded for the first SUICIDE of an account.
	pub refund_suicide: i64,
	/// Gas paid for CALL opcode.
	pub gas_call: u64,
	/// Gas paid for transferring value with CALL or CALLCODE.
	pub gas_call_value: u64,
	/// Gas paid when a CALL with value creates a new account.
	pub gas_new_account: u64,
	/// Gas paid for every byte of the EXP exponent.
	pub gas_expbyte: u64,
	/// Gas paid for CREATE and CREATE2.
	pub gas_create: u64,
	/// Gas paid for every byte of deployed code.
	pub gas_code_deposit: u64,
	/// Gas handed to the callee on top of the forwarded gas when value is
	/// transferred.
	pub call_stipend: u64,
	/// Whether empty account is considered exists.
	pub empty_considered_exists: bool,
	/// Whether every SHA3 input is recorded as a preimage.
	pub record_preimages: bool,
	/// Stack limit.
	pub stack_limit: usize,
	/// Memory limit.
	pub memory_limit: usize,
	/// Call limit.
	pub call_stack_limit: usize,
	/// Create contract limit.
	pub create_contract_limit: Option<usize>,
}

impl Config {
	/// Kardia mainnet configuration.
	pub const fn kardia() -> Config {
		Config {
			gas_ext_code: 700,
			gas_balance: 400,
			gas_sload: 200,
			gas_sstore_set: 20000,
			gas_sstore_reset: 5000,
			gas_sstore_clear: 5000,
			refund_sstore_clears: 15000,
			gas_suicide: 5000,
			gas_suicide_new_account: 25000,
			refund_suicide: 24000,
			gas_call: 700,
			gas_call_value: 9000,
			gas_new_account: 25000,
			gas_expbyte: 50,
			gas_create: 32000,
			gas_code_deposit: 200,
			call_stipend: 2300,
			empty_considered_exists: false,
			record_preimages: false,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			create_contract_limit: Some(0x6000),
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self::kardia()
	}
}

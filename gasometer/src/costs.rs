use crate::consts::*;
use kvm_core::ExitException;
use kvm_runtime::Config;
use primitive_types::{H256, U256};

fn words(len: U256) -> Result<u64, ExitException> {
	if len > U256::from(u64::MAX) {
		return Err(ExitException::GasUintOverflow);
	}
	let len = len.as_u64();

	Ok(len / 32 + if len % 32 == 0 { 0 } else { 1 })
}

fn per_word(base: u64, word_cost: u64, len: U256) -> Result<u64, ExitException> {
	word_cost
		.checked_mul(words(len)?)
		.and_then(|cost| cost.checked_add(base))
		.ok_or(ExitException::GasUintOverflow)
}

pub fn call_cost(
	value: U256,
	is_call_or_callcode: bool,
	is_call_or_staticcall: bool,
	new_account: bool,
	config: &Config,
) -> u64 {
	let transfers_value = value != U256::zero();
	config.gas_call
		+ xfer_cost(is_call_or_callcode, transfers_value, config)
		+ new_cost(is_call_or_staticcall, new_account, transfers_value, config)
}

fn xfer_cost(is_call_or_callcode: bool, transfers_value: bool, config: &Config) -> u64 {
	if is_call_or_callcode && transfers_value {
		config.gas_call_value
	} else {
		0
	}
}

fn new_cost(
	is_call_or_staticcall: bool,
	new_account: bool,
	transfers_value: bool,
	config: &Config,
) -> u64 {
	let eip161 = !config.empty_considered_exists;
	if is_call_or_staticcall {
		if eip161 {
			if transfers_value && new_account {
				config.gas_new_account
			} else {
				0
			}
		} else if new_account {
			config.gas_new_account
		} else {
			0
		}
	} else {
		0
	}
}

pub fn suicide_cost(value: U256, target_exists: bool, config: &Config) -> u64 {
	let eip161 = !config.empty_considered_exists;
	let should_charge_topup = if eip161 {
		value != U256::zero() && !target_exists
	} else {
		!target_exists
	};

	if should_charge_topup {
		config.gas_suicide + config.gas_suicide_new_account
	} else {
		config.gas_suicide
	}
}

pub fn suicide_refund(already_removed: bool, config: &Config) -> i64 {
	if already_removed {
		0
	} else {
		config.refund_suicide
	}
}

pub fn sstore_cost(current: H256, new: H256, config: &Config) -> u64 {
	if current == H256::zero() && new != H256::zero() {
		config.gas_sstore_set
	} else if current != H256::zero() && new == H256::zero() {
		config.gas_sstore_clear
	} else {
		config.gas_sstore_reset
	}
}

pub fn sstore_refund(current: H256, new: H256, config: &Config) -> i64 {
	if current != H256::zero() && new == H256::zero() {
		config.refund_sstore_clears
	} else {
		0
	}
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitException> {
	per_word(G_SHA3, G_SHA3WORD, len)
}

pub fn create2_cost(len: U256, config: &Config) -> Result<u64, ExitException> {
	per_word(config.gas_create, G_SHA3WORD, len)
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitException> {
	per_word(G_VERYLOW, G_COPY, len)
}

pub fn extcodecopy_cost(len: U256, config: &Config) -> Result<u64, ExitException> {
	per_word(config.gas_ext_code, G_COPY, len)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitException> {
	if len > U256::from(u64::MAX) {
		return Err(ExitException::GasUintOverflow);
	}

	G_LOGDATA
		.checked_mul(len.as_u64())
		.and_then(|cost| cost.checked_add(G_LOG))
		.and_then(|cost| cost.checked_add(G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitException::GasUintOverflow)
}

pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitException> {
	if power == U256::zero() {
		Ok(G_EXP)
	} else {
		let bytes = (power.bits() as u64 + 7) / 8;
		config
			.gas_expbyte
			.checked_mul(bytes)
			.and_then(|cost| cost.checked_add(G_EXP))
			.ok_or(ExitException::GasUintOverflow)
	}
}

/// Total cost of a memory of `words` 32-byte words.
pub fn memory_gas(words: u64) -> Result<u64, ExitException> {
	G_MEMORY
		.checked_mul(words)
		.and_then(|linear| {
			words
				.checked_mul(words)
				.map(|square| square / G_QUADCOEFF_DIV)
				.and_then(|quadratic| linear.checked_add(quadratic))
		})
		.ok_or(ExitException::GasUintOverflow)
}

/// Gas handed to a callee: everything but one 64th of what is left,
/// capped at what the caller asked for.
pub fn call_gas(available: u64, requested: U256) -> u64 {
	let max_forwarded = available - available / 64;
	if requested > U256::from(max_forwarded) {
		max_forwarded
	} else {
		requested.as_u64()
	}
}

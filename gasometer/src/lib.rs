//! Gas calculator of the Kardia Virtual Machine.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "force-debug")]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => (
		log::trace!(
			target: "kvm",
			"Gasometer {} [Gas used: {}, Gas left: {}]",
			format_args!($($arg)*),
			$self.total_used_gas(),
			$self.gas(),
		);
	);
}

#[cfg(not(feature = "force-debug"))]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => {};
}

mod consts;
mod costs;

pub use crate::costs::{call_gas, memory_gas};

use core::cmp::max;
use kvm_core::{ExitError, ExitException, Opcode, Stack};
use kvm_runtime::{Config, Handler};
use primitive_types::{H160, H256, U256};

macro_rules! try_or_fail {
	( $inner:expr, $e:expr ) => {
		match $e {
			Ok(value) => value,
			Err(e) => {
				$inner = Err(e.clone());
				return Err(e);
			}
		}
	};
}

/// KVM gasometer of one frame.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	config: &'config Config,
	inner: Result<Inner, ExitError>,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	pub fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			config,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
			}),
		}
	}

	#[inline]
	fn inner_mut(&mut self) -> Result<&mut Inner, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	#[inline]
	/// Reference of the config.
	pub fn config(&self) -> &'config Config {
		self.config
	}

	#[inline]
	/// Gas limit.
	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	#[inline]
	/// Remaining gas.
	pub fn gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => self.gas_limit - inner.used_gas - inner.memory_gas,
			Err(_) => 0,
		}
	}

	#[inline]
	/// Total used gas.
	pub fn total_used_gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => inner.used_gas + inner.memory_gas,
			Err(_) => self.gas_limit,
		}
	}

	#[inline]
	/// Record an explicit cost.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		log_gas!(self, "Record cost {}", cost);

		let all_gas_cost = self.total_used_gas().checked_add(cost);
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.inner_mut()?.used_gas += cost;
				Ok(())
			}
			_ => {
				self.inner = Err(ExitException::OutOfGas.into());
				Err(ExitException::OutOfGas.into())
			}
		}
	}

	#[inline]
	/// Give back gas a nested frame did not spend.
	pub fn record_stipend(&mut self, stipend: u64) -> Result<(), ExitError> {
		log_gas!(self, "Record stipend {}", stipend);

		let inner = self.inner_mut()?;
		inner.used_gas = inner.used_gas.saturating_sub(stipend);
		Ok(())
	}

	/// Record the storage fee of `len` bytes of deployed code.
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = (len as u64)
			.checked_mul(self.config.gas_code_deposit)
			.filter(|cost| *cost <= self.gas());

		match cost {
			Some(cost) => self.record_cost(cost),
			None => {
				self.inner = Err(ExitException::CodeStoreOutOfGas.into());
				Err(ExitException::CodeStoreOutOfGas.into())
			}
		}
	}

	/// Record opcode gas cost, together with the memory it expands to.
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory: Option<MemoryCost>,
	) -> Result<(), ExitError> {
		let memory_gas = match memory {
			Some(memory) => try_or_fail!(self.inner, self.inner_mut()?.memory_gas(memory)),
			None => self.inner_mut()?.memory_gas,
		};
		let gas_cost = try_or_fail!(self.inner, cost.cost(self.config));
		let used_gas = self.inner_mut()?.used_gas;

		log_gas!(
			self,
			"Record dynamic cost {:?} - memory_gas {} - gas_cost {}",
			cost,
			memory_gas,
			gas_cost
		);

		let all_gas_cost = memory_gas
			.checked_add(used_gas)
			.and_then(|gas| gas.checked_add(gas_cost));
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => (),
			_ => {
				self.inner = Err(ExitException::OutOfGas.into());
				return Err(ExitException::OutOfGas.into());
			}
		}

		let inner = self.inner_mut()?;
		inner.used_gas += gas_cost;
		inner.memory_gas = memory_gas;

		Ok(())
	}
}

/// Constant gas of an opcode, if its cost never depends on operands.
#[inline]
pub fn static_opcode_cost(opcode: Opcode) -> Option<u64> {
	consts::STATIC_COST_TABLE[opcode.as_usize()]
}

/// Calculate the cost of an opcode whose price depends on its operands or
/// on state. State-modifying opcodes of a static frame fail here with
/// `WriteProtection`.
pub fn dynamic_opcode_cost<H: Handler>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	is_static: bool,
	handler: &H,
) -> Result<(GasCost, Option<MemoryCost>), ExitError> {
	if is_static
		&& (opcode.is_state_write() || (opcode == Opcode::CALL && stack.peek(2)? != U256::zero()))
	{
		return Err(ExitException::WriteProtection.into());
	}

	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::BALANCE => GasCost::Balance,
		Opcode::SLOAD => GasCost::SLoad,

		Opcode::CALLCODE => {
			let target = stack.peek_h256(1)?.into();
			GasCost::CallCode {
				value: stack.peek(2)?,
				target_exists: handler.exists(target),
			}
		}
		Opcode::STATICCALL => GasCost::StaticCall,
		Opcode::DELEGATECALL => GasCost::DelegateCall,

		Opcode::SHA3 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: stack.peek(3)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
			GasCost::VeryLowCopy {
				len: stack.peek(2)?,
			}
		}
		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},

		Opcode::SSTORE => {
			let index = stack.peek_h256(0)?;
			let value = stack.peek_h256(1)?;

			GasCost::SStore {
				current: handler.storage(address, index),
				new: value,
			}
		}
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => GasCost::Log {
			n: opcode.as_u8() - Opcode::LOG0.as_u8(),
			len: stack.peek(1)?,
		},
		Opcode::CREATE => GasCost::Create,
		Opcode::CREATE2 => GasCost::Create2 {
			len: stack.peek(2)?,
		},
		Opcode::SUICIDE => {
			let target = stack.peek_h256(0)?.into();
			GasCost::Suicide {
				value: handler.balance(address),
				target_exists: handler.exists(target),
				already_removed: handler.deleted(address),
			}
		}
		Opcode::CALL => {
			let target = stack.peek_h256(1)?.into();
			GasCost::Call {
				value: stack.peek(2)?,
				target_exists: handler.exists(target),
			}
		}

		_ => GasCost::Invalid(opcode),
	};

	let memory_cost = match opcode {
		Opcode::SHA3
		| Opcode::RETURN
		| Opcode::REVERT
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CODECOPY | Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(1),
		}),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}

/// Holds the gas consumption for a Gasometer instance.
#[derive(Clone, Debug)]
struct Inner {
	memory_gas: u64,
	used_gas: u64,
}

impl Inner {
	/// Total memory cost once `memory` is covered. Never below what was
	/// already charged, so that only the expansion is paid.
	fn memory_gas(&self, memory: MemoryCost) -> Result<u64, ExitError> {
		match memory.cost()? {
			Some(cost) => Ok(max(self.memory_gas, cost)),
			None => Ok(self.memory_gas),
		}
	}
}

/// Gas cost.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,
	/// Fail the gasometer.
	Invalid(Opcode),

	/// Gas cost for `EXTCODESIZE`.
	ExtCodeSize,
	/// Gas cost for `BALANCE`.
	Balance,

	/// Gas cost for `CALL`.
	Call {
		/// Call value.
		value: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `CALLCODE`.
	CallCode {
		/// Call value.
		value: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `DELEGATECALL`.
	DelegateCall,
	/// Gas cost for `STATICCALL`.
	StaticCall,
	/// Gas cost for `SUICIDE`.
	Suicide {
		/// Value.
		value: U256,
		/// Whether the target exists.
		target_exists: bool,
		/// Whether the target has already been removed.
		already_removed: bool,
	},
	/// Gas cost for `SSTORE`.
	SStore {
		/// Current value.
		current: H256,
		/// New value.
		new: H256,
	},
	/// Gas cost for `SHA3`.
	Sha3 {
		/// Length of the data.
		len: U256,
	},
	/// Gas cost for `LOG`.
	Log {
		/// Topic length.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for some copy opcodes that is documented as `VERYLOW`.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `EXP`.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// Gas cost for `CREATE`.
	Create,
	/// Gas cost for `CREATE2`.
	Create2 {
		/// Length.
		len: U256,
	},
	/// Gas cost for `SLOAD`.
	SLoad,
}

impl GasCost {
	/// Returns the gas cost numerical value.
	pub fn cost(&self, config: &Config) -> Result<u64, ExitError> {
		Ok(match *self {
			GasCost::Call {
				value,
				target_exists,
			} => costs::call_cost(value, true, true, !target_exists, config),
			GasCost::CallCode {
				value,
				target_exists,
			} => costs::call_cost(value, true, false, !target_exists, config),
			GasCost::DelegateCall => costs::call_cost(U256::zero(), false, false, false, config),
			GasCost::StaticCall => costs::call_cost(U256::zero(), false, true, false, config),

			GasCost::Suicide {
				value,
				target_exists,
				..
			} => costs::suicide_cost(value, target_exists, config),
			GasCost::SStore { current, new } => costs::sstore_cost(current, new, config),

			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::ExtCodeCopy { len } => costs::extcodecopy_cost(len, config)?,
			GasCost::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			GasCost::Exp { power } => costs::exp_cost(power, config)?,
			GasCost::Create => config.gas_create,
			GasCost::Create2 { len } => costs::create2_cost(len, config)?,
			GasCost::SLoad => config.gas_sload,

			GasCost::Zero => consts::G_ZERO,
			GasCost::VeryLow => consts::G_VERYLOW,
			GasCost::Invalid(opcode) => return Err(ExitException::InvalidOpcode(opcode).into()),

			GasCost::ExtCodeSize => config.gas_ext_code,
			GasCost::Balance => config.gas_balance,
		})
	}

	/// Gas refund scheduled by the opcode.
	pub fn refund(&self, config: &Config) -> i64 {
		match *self {
			GasCost::SStore { current, new } => costs::sstore_refund(current, new, config),
			GasCost::Suicide {
				already_removed, ..
			} => costs::suicide_refund(already_removed, config),
			_ => 0,
		}
	}
}

/// Memory cost.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MemoryCost {
	/// Affected memory offset.
	pub offset: U256,
	/// Affected length.
	pub len: U256,
}

impl MemoryCost {
	/// Join two memory cost together.
	pub fn join(self, other: MemoryCost) -> MemoryCost {
		if self.len == U256::zero() {
			return other;
		}

		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}

	/// Total cost of a memory covering this region, or `None` for an empty
	/// region.
	pub fn cost(&self) -> Result<Option<u64>, ExitError> {
		if self.len == U256::zero() {
			return Ok(None);
		}

		let end = self
			.offset
			.checked_add(self.len)
			.ok_or(ExitException::GasUintOverflow)?;

		if end > U256::from(consts::MAX_MEMORY_SIZE) {
			return Err(ExitException::GasUintOverflow.into());
		}
		let end = end.as_u64();

		let rem = end % 32;
		let new = if rem == 0 { end / 32 } else { end / 32 + 1 };

		Ok(Some(costs::memory_gas(new)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mem(offset: u64, len: u64) -> Option<MemoryCost> {
		Some(MemoryCost {
			offset: U256::from(offset),
			len: U256::from(len),
		})
	}

	#[test]
	fn memory_expansion_is_charged_once() {
		let config = Config::kardia();
		let mut gasometer = Gasometer::new(1_000, &config);

		gasometer
			.record_dynamic_cost(GasCost::VeryLow, mem(0, 32))
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), 3 + 3);

		gasometer
			.record_dynamic_cost(GasCost::VeryLow, mem(0, 32))
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), 3 + 3 + 3);

		// Growing to two words pays only the difference.
		gasometer
			.record_dynamic_cost(GasCost::VeryLow, mem(32, 1))
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), 3 * 3 + 6);
	}

	#[test]
	fn out_of_gas_consumes_everything() {
		let config = Config::kardia();
		let mut gasometer = Gasometer::new(10, &config);

		gasometer.record_cost(8).unwrap();
		assert_eq!(gasometer.gas(), 2);
		assert_eq!(
			gasometer.record_cost(3),
			Err(ExitException::OutOfGas.into())
		);
		assert_eq!(gasometer.gas(), 0);
		assert_eq!(gasometer.total_used_gas(), 10);
		assert!(gasometer.record_cost(0).is_err());
	}

	#[test]
	fn huge_memory_overflows() {
		let config = Config::kardia();
		let mut gasometer = Gasometer::new(u64::MAX, &config);

		assert_eq!(
			gasometer.record_dynamic_cost(
				GasCost::Zero,
				Some(MemoryCost {
					offset: U256::MAX,
					len: U256::one(),
				})
			),
			Err(ExitException::GasUintOverflow.into())
		);
	}

	#[test]
	fn stipend_gives_back_gas() {
		let config = Config::kardia();
		let mut gasometer = Gasometer::new(100, &config);

		gasometer.record_cost(60).unwrap();
		gasometer.record_stipend(25).unwrap();
		assert_eq!(gasometer.gas(), 65);
	}

	#[test]
	fn code_deposit() {
		let config = Config::kardia();
		let mut gasometer = Gasometer::new(1_000, &config);

		gasometer.record_deposit(4).unwrap();
		assert_eq!(gasometer.gas(), 200);
		assert_eq!(
			gasometer.record_deposit(2),
			Err(ExitException::CodeStoreOutOfGas.into())
		);
		assert_eq!(gasometer.gas(), 0);
	}

	#[test]
	fn sstore_refund_only_on_clear() {
		let config = Config::kardia();
		let clear = GasCost::SStore {
			current: H256::from_low_u64_be(1),
			new: H256::zero(),
		};
		let noop = GasCost::SStore {
			current: H256::zero(),
			new: H256::zero(),
		};

		assert_eq!(clear.cost(&config), Ok(5000));
		assert_eq!(clear.refund(&config), 15000);
		assert_eq!(noop.refund(&config), 0);
	}

	#[test]
	fn suicide_refund_once() {
		let config = Config::kardia();
		let first = GasCost::Suicide {
			value: U256::zero(),
			target_exists: true,
			already_removed: false,
		};
		let second = GasCost::Suicide {
			value: U256::zero(),
			target_exists: true,
			already_removed: true,
		};

		assert_eq!(first.cost(&config), Ok(5000));
		assert_eq!(first.refund(&config), 24000);
		assert_eq!(second.refund(&config), 0);
	}

	#[test]
	fn static_table() {
		assert_eq!(static_opcode_cost(Opcode::ADD), Some(3));
		assert_eq!(static_opcode_cost(Opcode::SWAP16), Some(3));
		assert_eq!(static_opcode_cost(Opcode::JUMPI), Some(10));
		assert_eq!(static_opcode_cost(Opcode::SSTORE), None);
		assert_eq!(static_opcode_cost(Opcode::MLOAD), None);
	}
}

use primitive_types::U256;

use crate::utils::I256;

#[inline]
pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.lt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.gt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn not(op1: U256) -> U256 {
	!op1
}

/// `op1`-th byte of `op2`, counting from the most significant byte.
#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 >= U256::from(32) {
		return U256::zero();
	}

	U256::from(op2.byte(31 - op1.as_usize()))
}

#[inline]
pub fn shl(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		let shift: u64 = shift.as_u64();
		value << shift as usize
	}
}

#[inline]
pub fn shr(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		let shift: u64 = shift.as_u64();
		value >> shift as usize
	}
}

#[inline]
pub fn sar(shift: U256, value: U256) -> U256 {
	let negative = value.bit(255);

	if shift >= U256::from(256) {
		if negative {
			U256::MAX
		} else {
			U256::zero()
		}
	} else {
		let shift = shift.as_usize();
		if negative {
			!(!value >> shift)
		} else {
			value >> shift
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signed_comparison() {
		let minus_one = U256::MAX;
		assert_eq!(slt(minus_one, U256::zero()), U256::one());
		assert_eq!(sgt(minus_one, U256::zero()), U256::zero());
		assert_eq!(sgt(U256::one(), minus_one), U256::one());
	}

	#[test]
	fn byte_indexes_from_most_significant() {
		let value = U256::from(0x1122u64);
		assert_eq!(byte(U256::from(31), value), U256::from(0x22));
		assert_eq!(byte(U256::from(30), value), U256::from(0x11));
		assert_eq!(byte(U256::from(0), value), U256::zero());
		assert_eq!(byte(U256::from(32), U256::MAX), U256::zero());
	}

	#[test]
	fn shifts() {
		assert_eq!(shl(U256::from(4), U256::one()), U256::from(16));
		assert_eq!(shl(U256::from(256), U256::one()), U256::zero());
		assert_eq!(shr(U256::from(4), U256::from(16)), U256::one());
		assert_eq!(sar(U256::from(4), U256::MAX), U256::MAX);
		assert_eq!(sar(U256::from(300), U256::MAX), U256::MAX);
		// -16 >> 2 == -4
		let minus_sixteen = U256::MAX - U256::from(15);
		let minus_four = U256::MAX - U256::from(3);
		assert_eq!(sar(U256::from(2), minus_sixteen), minus_four);
	}
}

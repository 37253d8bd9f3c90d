use core::ops::Rem;
use primitive_types::{U256, U512};

use crate::utils::I256;

#[inline]
pub fn div(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

#[inline]
pub fn sdiv(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	let ret = op1 / op2;
	ret.into()
}

#[inline]
pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1.rem(op2)
	}
}

#[inline]
pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		let op1: I256 = op1.into();
		let op2: I256 = op2.into();
		let ret = op1.rem(op2);
		ret.into()
	}
}

/// Truncate a 512-bit value that is known to be below 2^256.
#[inline]
fn low_u256(value: U512) -> U256 {
	let mut bytes = [0u8; 64];
	value.to_big_endian(&mut bytes);
	U256::from_big_endian(&bytes[32..])
}

#[inline]
pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		low_u256((op1 + op2) % op3)
	}
}

#[inline]
pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		low_u256((op1 * op2) % op3)
	}
}

#[inline]
pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r: U256 = 1.into();

	while op2 != 0.into() {
		if op2 & 1.into() != 0.into() {
			r = r.overflowing_mul(op1).0;
		}
		op2 = op2 >> 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

/// Extend the sign of the `op1`-th least significant byte of `op2` to the
/// full word. `op1 >= 31` leaves `op2` unchanged.
#[inline]
pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		let bit_index = (8 * op1.low_u32() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	} else {
		op2
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_is_zero() {
		assert_eq!(div(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(rem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(sdiv(U256::MAX, U256::zero()), U256::zero());
		assert_eq!(srem(U256::MAX, U256::zero()), U256::zero());
		assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
		assert_eq!(mulmod(U256::one(), U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn signed_division() {
		let minus_ten = U256::MAX - U256::from(9);
		let minus_five = U256::MAX - U256::from(4);
		assert_eq!(sdiv(minus_ten, U256::from(2)), minus_five);

		let minus_one = U256::MAX;
		let minus_three = U256::MAX - U256::from(2);
		// -10 % 3 == -1, sign follows the dividend
		assert_eq!(srem(minus_ten, U256::from(3)), minus_one);
		assert_eq!(srem(U256::from(10), minus_three), U256::one());
	}

	#[test]
	fn modular_arithmetic_uses_full_width() {
		assert_eq!(addmod(U256::MAX, U256::from(2), U256::from(10)), U256::from(7));
		assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
	}

	#[test]
	fn exp_wraps() {
		assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
		assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
	}

	#[test]
	fn signextend_byte() {
		assert_eq!(signextend(U256::zero(), U256::from(0xff)), U256::MAX);
		assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
		assert_eq!(signextend(U256::from(1), U256::from(0x01ff)), U256::from(0x01ff));
		assert_eq!(signextend(U256::from(40), U256::from(0xff)), U256::from(0xff));
	}
}

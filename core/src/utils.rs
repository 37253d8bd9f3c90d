use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// Precalculated `usize::MAX` for `U256`
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);

/// Two's complement word split into sign and magnitude. Zero is never
/// negative.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct I256 {
	negative: bool,
	magnitude: U256,
}

impl I256 {
	fn new(negative: bool, magnitude: U256) -> Self {
		Self {
			negative: negative && !magnitude.is_zero(),
			magnitude,
		}
	}

	/// Whether the value is below zero.
	pub fn is_negative(&self) -> bool {
		self.negative
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &I256) -> Ordering {
		match (self.negative, other.negative) {
			(false, false) => self.magnitude.cmp(&other.magnitude),
			(true, true) => other.magnitude.cmp(&self.magnitude),
			(true, false) => Ordering::Less,
			(false, true) => Ordering::Greater,
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &I256) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl From<U256> for I256 {
	fn from(val: U256) -> I256 {
		if val.bit(255) {
			I256::new(true, (!val).overflowing_add(U256::one()).0)
		} else {
			I256::new(false, val)
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> U256 {
		if value.negative {
			(!value.magnitude).overflowing_add(U256::one()).0
		} else {
			value.magnitude
		}
	}
}

impl Div for I256 {
	type Output = I256;

	/// Truncating division. Division by zero gives zero and `MIN / -1`
	/// wraps back to `MIN`.
	fn div(self, other: I256) -> I256 {
		if other.magnitude.is_zero() {
			return I256::default();
		}

		I256::new(
			self.negative != other.negative,
			self.magnitude / other.magnitude,
		)
	}
}

impl Rem for I256 {
	type Output = I256;

	/// Remainder taking the sign of the dividend. Zero divisor gives zero.
	fn rem(self, other: I256) -> I256 {
		if other.magnitude.is_zero() {
			return I256::default();
		}

		I256::new(self.negative, self.magnitude % other.magnitude)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn signed(value: i64) -> U256 {
		if value < 0 {
			(!U256::from(value.unsigned_abs())).overflowing_add(U256::one()).0
		} else {
			U256::from(value)
		}
	}

	fn div(a: U256, b: U256) -> U256 {
		(I256::from(a) / I256::from(b)).into()
	}

	fn rem(a: U256, b: U256) -> U256 {
		(I256::from(a) % I256::from(b)).into()
	}

	#[test]
	fn division_truncates_toward_zero() {
		let min = U256::one() << 255;

		assert_eq!(div(signed(100), signed(-1)), signed(-100));
		assert_eq!(div(signed(-7), signed(2)), signed(-3));
		assert_eq!(div(signed(100), signed(2)), signed(50));
		assert_eq!(div(signed(100), U256::zero()), U256::zero());
		assert_eq!(div(min, signed(-1)), min);
		assert_eq!(div(min, signed(1)), min);
	}

	#[test]
	fn remainder_follows_dividend() {
		assert_eq!(rem(signed(-7), signed(2)), signed(-1));
		assert_eq!(rem(signed(7), signed(-2)), signed(1));
		assert_eq!(rem(signed(7), U256::zero()), U256::zero());
	}

	#[test]
	fn ordering_and_round_trip() {
		assert!(I256::from(signed(-2)) < I256::from(signed(-1)));
		assert!(I256::from(signed(-1)) < I256::from(U256::zero()));
		assert!(I256::from(U256::zero()) < I256::from(signed(1)));
		assert!(I256::from(signed(-1)).is_negative());

		let minus_two = U256::MAX - U256::one();
		assert_eq!(U256::from(I256::from(minus_two)), minus_two);
	}
}

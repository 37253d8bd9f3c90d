use alloc::vec::Vec;
use core::cmp::min;
use core::ops::{BitAnd, Not};
use primitive_types::U256;

use crate::{ExitException, ExitFatal};

/// A sequencial memory. It uses Rust's `Vec` for internal
/// representation, and only ever grows in 32-byte words.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Memory limit.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Get the length of the current memory range. Always a multiple of 32
	/// unless bytes were set past the resized range.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Return true if current memory range is zero.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Return the full memory.
	pub fn data(&self) -> &Vec<u8> {
		&self.data
	}

	/// Resize the memory, making it cover the memory region of `offset..(offset + len)`,
	/// with 32 bytes as the step. If the length is zero, this function does nothing.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitException> {
		if len == U256::zero() {
			return Ok(());
		}

		if let Some(end) = offset.checked_add(len) {
			self.resize_end(end)
		} else {
			Err(ExitException::InvalidRange)
		}
	}

	/// Resize the memory, making it cover to `end`, with 32 bytes as the step.
	pub fn resize_end(&mut self, end: U256) -> Result<(), ExitException> {
		if end <= U256::from(self.data.len()) {
			return Ok(());
		}

		let new_end = next_multiple_of_32(end).ok_or(ExitException::InvalidRange)?;
		if new_end > U256::from(self.limit) {
			return Err(ExitException::InvalidRange);
		}

		self.data.resize(new_end.as_usize(), 0);
		Ok(())
	}

	/// Get memory region at given offset. Bytes beyond the current memory
	/// length read as zero.
	///
	/// ## Panics
	///
	/// Value of `size` is considered trusted. If they're too large,
	/// the program can run out of memory, or it can overflow.
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = Vec::new();
		ret.resize(size, 0);

		if offset < self.data.len() {
			let end = min(offset.saturating_add(size), self.data.len());
			ret[..(end - offset)].copy_from_slice(&self.data[offset..end]);
		}

		ret
	}

	/// Borrow a memory region without copying. Returns `None` when the region
	/// is not fully inside the current memory.
	pub fn view(&self, offset: usize, size: usize) -> Option<&[u8]> {
		let end = offset.checked_add(size)?;
		self.data.get(offset..end)
	}

	/// Set memory region at given offset. The offset and value is considered
	/// untrusted. A `target_size` larger than `value` pads with zeros.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		if offset
			.checked_add(target_size)
			.map(|pos| pos > self.limit)
			.unwrap_or(true)
		{
			return Err(ExitFatal::NotSupported);
		}

		if self.data.len() < offset + target_size {
			self.data.resize(offset + target_size, 0);
		}

		if target_size > value.len() {
			self.data[offset..((value.len()) + offset)].clone_from_slice(value);
			for index in (value.len())..target_size {
				self.data[offset + index] = 0;
			}
		} else {
			self.data[offset..(target_size + offset)].clone_from_slice(&value[..target_size]);
		}

		Ok(())
	}

	/// Store one big-endian word at the given offset.
	pub fn set_word(&mut self, offset: usize, value: U256) -> Result<(), ExitFatal> {
		let mut word = [0u8; 32];
		value.to_big_endian(&mut word);
		self.set(offset, &word, Some(32))
	}

	/// Copy `data` into the memory, of given `len`. Source bytes past the end
	/// of `data` are copied as zeros.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		// A zero-length copy is a no-op regardless of the offsets.
		if len.is_zero() {
			return Ok(());
		}

		let memory_offset = if memory_offset > U256::from(usize::MAX) {
			return Err(ExitFatal::NotSupported);
		} else {
			memory_offset.as_usize()
		};

		let ulen = if len > U256::from(usize::MAX) {
			return Err(ExitFatal::NotSupported);
		} else {
			len.as_usize()
		};

		let data = if let Some(end) = data_offset.checked_add(len) {
			if data_offset > U256::from(data.len()) {
				&[]
			} else {
				let data_offset = data_offset.as_usize();
				let end = min(end, U256::from(data.len())).as_usize();
				&data[data_offset..end]
			}
		} else {
			&[]
		};

		self.set(memory_offset, data, Some(ulen))
	}
}

/// Rounds up `x` to the closest multiple of 32. If `x % 32 == 0` then `x` is returned.
#[inline]
fn next_multiple_of_32(x: U256) -> Option<U256> {
	let r = x.low_u32().bitand(31).not().wrapping_add(1).bitand(31);
	x.checked_add(r.into())
}

#[cfg(test)]
mod tests {
	use super::{next_multiple_of_32, Memory, U256};

	#[test]
	fn test_next_multiple_of_32() {
		for i in 0..32 {
			let x = U256::from(i * 32);
			assert_eq!(Some(x), next_multiple_of_32(x));
		}

		for x in 0..1024 {
			if x % 32 == 0 {
				continue;
			}
			let next_multiple = x + 32 - (x % 32);
			assert_eq!(
				Some(U256::from(next_multiple)),
				next_multiple_of_32(x.into())
			);
		}

		assert_eq!(None, next_multiple_of_32(U256::MAX));
	}

	#[test]
	fn resize_grows_in_words() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_offset(U256::from(1), U256::from(1)).unwrap();
		assert_eq!(memory.len(), 32);

		memory.resize_offset(U256::from(30), U256::from(3)).unwrap();
		assert_eq!(memory.len(), 64);

		// Zero length never resizes, even at absurd offsets.
		memory.resize_offset(U256::MAX, U256::zero()).unwrap();
		assert_eq!(memory.len(), 64);
	}

	#[test]
	fn resize_respects_limit() {
		let mut memory = Memory::new(64);
		assert!(memory.resize_end(U256::from(65)).is_err());
		assert!(memory.resize_offset(U256::MAX, U256::one()).is_err());
		assert!(memory.resize_end(U256::from(64)).is_ok());
	}

	#[test]
	fn get_out_of_bounds_is_zero() {
		let mut memory = Memory::new(usize::MAX);
		memory.set(30, &[1, 2, 3, 4], None).unwrap();
		assert_eq!(memory.get(32, 4), vec![3, 4, 0, 0]);
		assert_eq!(memory.get(100, 2), vec![0, 0]);
	}

	#[test]
	fn view_only_inside_memory() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_end(U256::from(32)).unwrap();
		memory.set_word(0, U256::from(0xff)).unwrap();
		assert_eq!(memory.view(31, 1), Some(&[0xffu8][..]));
		assert_eq!(memory.view(31, 2), None);
	}

	#[test]
	fn copy_large_pads_with_zeros() {
		let mut memory = Memory::new(usize::MAX);
		memory.set(0, &[0xaa; 8], None).unwrap();
		memory
			.copy_large(U256::zero(), U256::from(2), U256::from(4), &[1, 2, 3])
			.unwrap();
		assert_eq!(memory.get(0, 8), vec![3, 0, 0, 0, 0xaa, 0xaa, 0xaa, 0xaa]);
	}
}

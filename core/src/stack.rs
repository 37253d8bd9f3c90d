use alloc::vec::Vec;
use primitive_types::{H256, U256};

use crate::ExitException;

/// KVM stack of 256-bit words.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<U256>,
	limit: usize,
}

impl Stack {
	/// Create a new stack with given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	#[inline]
	/// Stack limit.
	pub fn limit(&self) -> usize {
		self.limit
	}

	#[inline]
	/// Stack length.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[inline]
	/// Whether the stack is empty.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	#[inline]
	/// Stack data.
	pub fn data(&self) -> &Vec<U256> {
		&self.data
	}

	/// Check that an operation popping `pops` items and then pushing `pushes`
	/// items fits in the stack, before running it.
	pub fn check_io(&self, pops: usize, pushes: usize) -> Result<(), ExitException> {
		if self.data.len() < pops {
			return Err(ExitException::StackUnderflow);
		}
		if self.data.len() - pops + pushes > self.limit {
			return Err(ExitException::StackOverflow);
		}
		Ok(())
	}

	#[inline]
	/// Pop a value from the stack. If the stack is already empty, returns the
	/// `StackUnderflow` error.
	pub fn pop(&mut self) -> Result<U256, ExitException> {
		self.data.pop().ok_or(ExitException::StackUnderflow)
	}

	#[inline]
	pub fn pop_h256(&mut self) -> Result<H256, ExitException> {
		self.pop().map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	#[inline]
	/// Push a new value into the stack. If it will exceed the stack limit,
	/// returns `StackOverflow` error and leaves the stack unchanged.
	pub fn push(&mut self, value: U256) -> Result<(), ExitException> {
		if self.data.len() + 1 > self.limit {
			return Err(ExitException::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	#[inline]
	pub fn push_h256(&mut self, value: H256) -> Result<(), ExitException> {
		self.push(U256::from_big_endian(&value[..]))
	}

	#[inline]
	/// Peek a value at given index for the stack, where the top of
	/// the stack is at index `0`. If the index is too large,
	/// `StackUnderflow` is returned.
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExitException> {
		if self.data.len() > no_from_top {
			Ok(self.data[self.data.len() - no_from_top - 1])
		} else {
			Err(ExitException::StackUnderflow)
		}
	}

	#[inline]
	pub fn peek_h256(&self, no_from_top: usize) -> Result<H256, ExitException> {
		self.peek(no_from_top).map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	#[inline]
	/// Set a value at given index for the stack, where the top of the
	/// stack is at index `0`. If the index is too large,
	/// `StackUnderflow` is returned.
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExitException> {
		if self.data.len() > no_from_top {
			let len = self.data.len();
			self.data[len - no_from_top - 1] = val;
			Ok(())
		} else {
			Err(ExitException::StackUnderflow)
		}
	}

	/// Push a copy of the `n`-th item (1-based, `1` is the top).
	pub fn dup(&mut self, n: usize) -> Result<(), ExitException> {
		let value = self.peek(n - 1)?;
		self.push(value)
	}

	/// Exchange the top item with the `n`-th item below it.
	pub fn swap(&mut self, n: usize) -> Result<(), ExitException> {
		let len = self.data.len();
		if len <= n {
			return Err(ExitException::StackUnderflow);
		}
		self.data.swap(len - 1, len - 1 - n);
		Ok(())
	}
}

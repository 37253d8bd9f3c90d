//! Core layer of the Kardia Virtual Machine: stack, memory, opcodes and the
//! dispatch table for every instruction that needs no external state.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod eval;
mod memory;
mod opcode;
mod stack;
pub mod utils;
mod valids;

pub use crate::error::{Capture, ExitError, ExitException, ExitFatal, ExitResult, ExitSucceed};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::Stack;
pub use crate::valids::Valids;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;
use primitive_types::U256;

use crate::eval::{eval, Control};

/// Core execution layer of one frame.
pub struct Machine {
	/// Program data.
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter.
	position: Result<usize, ExitResult>,
	/// Return value.
	return_range: Range<U256>,
	/// Code validity maps.
	valids: Valids,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
}

impl Machine {
	/// Reference of machine stack.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}
	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}
	/// Reference of machine memory.
	pub fn memory(&self) -> &Memory {
		&self.memory
	}
	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}
	/// Return a reference of the program counter.
	pub fn position(&self) -> &Result<usize, ExitResult> {
		&self.position
	}
	/// Program code.
	pub fn code(&self) -> &[u8] {
		&self.code
	}
	/// Program input data.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Create a new machine with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Explicit exit of the machine. Further step will return error.
	pub fn exit(&mut self, reason: ExitResult) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack.
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	pub fn return_value(&self) -> Vec<u8> {
		let (start, end) = (self.return_range.start, self.return_range.end);
		if start >= end {
			return Vec::new();
		}
		if end > U256::from(self.memory.len()) {
			// Ranges were resized before exit, so this only happens with a
			// memory limit in place.
			return Vec::new();
		}

		let start = start.as_usize();
		self.memory.get(start, end.as_usize() - start)
	}

	/// Loop stepping the machine, until it stops or traps.
	pub fn run(&mut self) -> Capture<ExitResult, Opcode> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	#[inline]
	/// Step the machine, executing one opcode. It then returns. Opcodes that
	/// need external state are returned as a trap, with the program counter
	/// already advanced past them.
	pub fn step(&mut self) -> Result<(), Capture<ExitResult, Opcode>> {
		let position = self.position.clone().map_err(Capture::Exit)?;

		match self.code.get(position).map(|v| Opcode(*v)) {
			Some(opcode) => match eval(self, opcode, position) {
				Control::Continue(p) => {
					self.position = Ok(position + p);
					Ok(())
				}
				Control::Exit(e) => {
					self.position = Err(e.clone());
					Err(Capture::Exit(e))
				}
				Control::Jump(p) => {
					if self.valids.is_valid(p) {
						self.position = Ok(p);
						Ok(())
					} else {
						let e: ExitResult = ExitException::InvalidJump.into();
						self.position = Err(e.clone());
						Err(Capture::Exit(e))
					}
				}
				Control::Trap(opcode) => {
					self.position = Ok(position + 1);
					Err(Capture::Trap(opcode))
				}
			},
			None => {
				self.position = Err(ExitSucceed::Stopped.into());
				Err(Capture::Exit(ExitSucceed::Stopped.into()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(code: &str) -> (Capture<ExitResult, Opcode>, Machine) {
		let mut machine = Machine::new(
			Rc::new(hex::decode(code).unwrap()),
			Rc::new(Vec::new()),
			1024,
			usize::MAX,
		);
		let reason = machine.run();
		(reason, machine)
	}

	#[test]
	fn add_wraps_at_boundary() {
		// PUSH1 1 PUSH32 0xff..ff ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
		let (reason, machine) = run(
			"60017fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff0160005260206000f3",
		);
		assert_eq!(reason, Capture::Exit(Ok(ExitSucceed::Returned)));
		assert_eq!(machine.return_value(), vec![0u8; 32]);
	}

	#[test]
	fn add_then_sub_round_trips() {
		// PUSH1 5 PUSH32 0xff..ff ADD PUSH1 5 SWAP1 SUB
		let (reason, machine) = run(
			"60057fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff0160059003",
		);
		assert_eq!(reason, Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(machine.stack().peek(0), Ok(U256::MAX));
	}

	#[test]
	fn div_and_mod_by_zero_push_zero() {
		// PUSH1 0 PUSH1 7 DIV PUSH1 0 PUSH1 7 MOD
		let (reason, machine) = run("60006007046000600706");
		assert_eq!(reason, Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(machine.stack().data(), &vec![U256::zero(), U256::zero()]);
	}

	#[test]
	fn jump_into_push_data_fails() {
		// PUSH1 3 JUMP PUSH1 0x5b
		let (reason, _) = run("600356605b");
		assert_eq!(
			reason,
			Capture::Exit(Err(ExitError::Exception(ExitException::InvalidJump)))
		);
	}

	#[test]
	fn jump_to_jumpdest() {
		// PUSH1 4 JUMP INVALID JUMPDEST PUSH1 1
		let (reason, machine) = run("600456fe5b6001");
		assert_eq!(reason, Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(machine.stack().peek(0), Ok(U256::one()));
	}

	#[test]
	fn external_opcode_traps() {
		// CALLER
		let (reason, machine) = run("33");
		assert_eq!(reason, Capture::Trap(Opcode::CALLER));
		assert_eq!(machine.position(), &Ok(1));
	}

	#[test]
	fn revert_keeps_return_range() {
		// PUSH1 0xaa PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 REVERT
		let (reason, machine) = run("60aa60005360016000fd");
		assert_eq!(reason, Capture::Exit(Err(ExitError::Reverted)));
		assert_eq!(machine.return_value(), vec![0xaa]);
	}

	#[test]
	fn msize_is_word_aligned() {
		// PUSH1 1 PUSH1 33 MSTORE8 MSIZE
		let (_, machine) = run("600160215359");
		assert_eq!(machine.stack().peek(0), Ok(U256::from(64)));
	}

	#[test]
	fn truncated_push_is_zero_padded() {
		// PUSH2 0x01
		let (reason, machine) = run("6101");
		assert_eq!(reason, Capture::Exit(Ok(ExitSucceed::Stopped)));
		assert_eq!(machine.stack().peek(0), Ok(U256::from(0x0100)));
	}
}

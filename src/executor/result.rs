use crate::ExitError;
use alloc::string::String;
use alloc::vec::Vec;
use primitive_types::U256;

/// Selector of the ABI `Error(string)` revert payload.
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Outcome of a top-level execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutionResult {
	/// Gas consumed, refunds not deducted.
	pub used_gas: u64,
	/// Why execution stopped early, if it did.
	pub err: Option<ExitError>,
	/// Returned or reverted output.
	pub return_data: Vec<u8>,
}

impl ExecutionResult {
	/// Whether execution failed.
	pub fn failed(&self) -> bool {
		self.err.is_some()
	}

	/// The error execution stopped with, if any.
	pub fn error(&self) -> Option<&ExitError> {
		self.err.as_ref()
	}

	/// Output of a successful execution.
	pub fn return_data(&self) -> Option<&[u8]> {
		match self.err {
			None => Some(&self.return_data),
			Some(_) => None,
		}
	}

	/// Output of a reverted execution.
	pub fn revert(&self) -> Option<&[u8]> {
		match self.err {
			Some(ExitError::Reverted) => Some(&self.return_data),
			_ => None,
		}
	}

	/// Message carried by an `Error(string)` revert.
	pub fn unpack_revert_reason(&self) -> Option<String> {
		let data = self.revert()?;
		if data.len() < 4 || data[..4] != REVERT_SELECTOR {
			return None;
		}
		let data = &data[4..];

		let offset = read_word(data, 0)?;
		let len = read_word(data, offset)?;
		let start = offset.checked_add(32)?;
		let bytes = data.get(start..start.checked_add(len)?)?;

		String::from_utf8(bytes.to_vec()).ok()
	}
}

fn read_word(data: &[u8], at: usize) -> Option<usize> {
	let word = data.get(at..at.checked_add(32)?)?;
	let value = U256::from_big_endian(word);
	if value > U256::from(usize::MAX) {
		return None;
	}
	Some(value.as_usize())
}

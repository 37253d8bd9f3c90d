use alloc::borrow::Cow;
use core::fmt;

use crate::Opcode;

/// Capture represents the result of execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capture<E, T> {
	/// The machine has exited. It cannot be executed again.
	Exit(E),
	/// The machine has trapped. It is waiting for external information, and can
	/// be executed again.
	Trap(T),
}

impl<E, T> Capture<E, T> {
	pub fn exit(self) -> Option<E> {
		match self {
			Self::Exit(e) => Some(e),
			Self::Trap(_) => None,
		}
	}

	pub fn trap(self) -> Option<T> {
		match self {
			Self::Exit(_) => None,
			Self::Trap(t) => Some(t),
		}
	}
}

/// Exit result.
pub type ExitResult = Result<ExitSucceed, ExitError>;

/// Exit error reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum ExitError {
	/// Machine returns a normal KVM error. All remaining gas of the frame is
	/// consumed and its state changes are rolled back.
	Exception(ExitException),
	/// Machine encountered an explicit revert. State changes are rolled back,
	/// but unspent gas and the returned data are kept.
	Reverted,
	/// Machine encountered an error that is not supposed to be normal KVM
	/// errors. The whole invocation is aborted.
	Fatal(ExitFatal),
}

impl ExitError {
	/// Whether this is an explicit revert.
	pub fn is_reverted(&self) -> bool {
		matches!(self, Self::Reverted)
	}

	/// Whether this error aborts the whole invocation.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}
}

impl From<ExitError> for ExitResult {
	fn from(s: ExitError) -> Self {
		Err(s)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitError {}

impl fmt::Display for ExitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exception(e) => e.fmt(f),
			Self::Reverted => f.write_str("execution reverted"),
			Self::Fatal(e) => e.fmt(f),
		}
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop, or ran past the end of code.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
	/// Machine encountered an explicit suicide.
	Suicided,
}

impl From<ExitSucceed> for ExitResult {
	fn from(s: ExitSucceed) -> Self {
		Ok(s)
	}
}

/// Exit error reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum ExitException {
	/// Trying to pop from an empty stack.
	StackUnderflow,
	/// Trying to push into a stack over stack limit.
	StackOverflow,
	/// Jump destination is invalid.
	InvalidJump,
	/// An opcode accesses memory region, but the region is invalid.
	InvalidRange,
	/// Encountered the designated invalid opcode.
	DesignatedInvalid,
	/// Call stack is too deep (runtime).
	CallTooDeep,
	/// Create opcode encountered collision (runtime).
	CreateCollision,
	/// Create init code exceeds limit (runtime).
	CreateContractLimit,
	/// Encountered an undefined opcode.
	InvalidOpcode(Opcode),
	/// An opcode accesses external information, but the request is off offset
	/// limit (runtime).
	OutOfOffset,
	/// Execution runs out of gas (runtime).
	OutOfGas,
	/// Not enough gas left to pay for storing the code of a created contract.
	CodeStoreOutOfGas,
	/// A gas computation exceeded the 64-bit range.
	GasUintOverflow,
	/// Not enough fund to start the execution (runtime).
	OutOfFund,
	/// A state-modifying opcode was executed inside a static call.
	WriteProtection,
	/// PC underflowed (unused).
	PCUnderflow,
	/// Other normal errors.
	Other(Cow<'static, str>),
}

impl From<ExitException> for ExitResult {
	fn from(s: ExitException) -> Self {
		Err(ExitError::Exception(s))
	}
}

impl From<ExitException> for ExitError {
	fn from(s: ExitException) -> Self {
		Self::Exception(s)
	}
}

impl fmt::Display for ExitException {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::StackUnderflow => f.write_str("stack underflow"),
			Self::StackOverflow => f.write_str("stack limit reached"),
			Self::InvalidJump => f.write_str("invalid jump destination"),
			Self::InvalidRange => f.write_str("invalid memory range"),
			Self::DesignatedInvalid => f.write_str("invalid opcode: INVALID"),
			Self::CallTooDeep => f.write_str("max call depth exceeded"),
			Self::CreateCollision => f.write_str("contract address collision"),
			Self::CreateContractLimit => f.write_str("max code size exceeded"),
			Self::InvalidOpcode(opcode) => write!(f, "invalid opcode: {}", opcode),
			Self::OutOfOffset => f.write_str("return data out of bounds"),
			Self::OutOfGas => f.write_str("out of gas"),
			Self::CodeStoreOutOfGas => f.write_str("contract creation code storage out of gas"),
			Self::GasUintOverflow => f.write_str("gas uint64 overflow"),
			Self::OutOfFund => f.write_str("insufficient balance for transfer"),
			Self::WriteProtection => f.write_str("write protection"),
			Self::PCUnderflow => f.write_str("program counter underflow"),
			Self::Other(reason) => f.write_str(reason),
		}
	}
}

/// Exit fatal reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum ExitFatal {
	/// The operation is not supported.
	NotSupported,
	/// The trap (interrupt) is unhandled.
	UnhandledInterrupt,
	/// The invocation was cancelled from outside.
	Cancelled,
	/// Other fatal errors.
	Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitResult {
	fn from(s: ExitFatal) -> Self {
		Err(ExitError::Fatal(s))
	}
}

impl From<ExitFatal> for ExitError {
	fn from(s: ExitFatal) -> Self {
		Self::Fatal(s)
	}
}

impl fmt::Display for ExitFatal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotSupported => f.write_str("operation not supported"),
			Self::UnhandledInterrupt => f.write_str("unhandled interrupt"),
			Self::Cancelled => f.write_str("execution cancelled"),
			Self::Other(reason) => f.write_str(reason),
		}
	}
}

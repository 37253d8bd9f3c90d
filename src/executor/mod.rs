//! # KVM executor
//!
//! [`Kvm`] ties the runtime, the gasometer and a [`StateDB`] together. Each
//! call or create runs in its own frame with its own gasometer. Nested
//! frames are kept on a heap frame stack: a runtime that reaches a call or
//! create is suspended until its child exits, so call depth does not grow
//! the native stack. Everything else a frame needs goes through the
//! [`Handler`] implementation.
//!
//! [`StateDB`]: crate::backend::StateDB
//! [`Handler`]: crate::Handler

mod kvm;
mod precompile;
mod result;

pub use self::kvm::{CancelHandle, Kvm};
pub use self::precompile::{
	run_precompiled_contract, Precompile, PrecompileFailure, PrecompileFrame, Precompiles,
};
pub use self::result::ExecutionResult;

//! Kardia Virtual Machine.
//!
//! A gas-metered, stack-based interpreter for contract bytecode. The crate
//! is split the same way the machine is layered:
//!
//! * `kvm-core` runs opcodes that touch nothing but the stack and memory.
//! * `kvm-runtime` resolves the rest through a [`Handler`].
//! * `kvm-gasometer` prices every opcode.
//! * This crate drives frames against a [`backend::StateDB`].

#![forbid(unsafe_code, unused_variables)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use kvm_core::*;
pub use kvm_gasometer as gasometer;
pub use kvm_runtime::*;

pub mod backend;
pub mod context;
pub mod executor;

pub use crate::context::BlockContext;
pub use crate::executor::{ExecutionResult, Kvm};

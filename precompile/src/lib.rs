//! Precompiled contracts of the Kardia Virtual Machine.

#![forbid(unsafe_code, unused_variables)]
#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod simple;
mod staking;

pub use crate::simple::{ECRecover, Identity, Ripemd160, Sha256};
pub use crate::staking::{Staking, StakingRewards};

use kvm::executor::Precompiles;
use primitive_types::H160;

/// Address of the staking reward precompile.
pub const STAKING_REWARDS_ADDRESS: H160 = address(5);

/// The four standard contracts at addresses 1 to 4.
pub fn standard() -> Precompiles {
	Precompiles::new()
		.with(address(1), ECRecover)
		.with(address(2), Sha256)
		.with(address(3), Ripemd160)
		.with(address(4), Identity)
}

/// Precompile table of Kardia mainnet: the standard contracts plus staking
/// rewards backed by `staking`.
pub fn kardia<S: Staking + 'static>(staking: S) -> Precompiles {
	standard().with(STAKING_REWARDS_ADDRESS, StakingRewards::new(staking))
}

fn linear_cost(len: usize, base: u64, word: u64) -> u64 {
	let words = (len as u64).saturating_add(31) / 32;
	base.saturating_add(word.saturating_mul(words))
}

const fn address(last: u8) -> H160 {
	H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, last,
	])
}

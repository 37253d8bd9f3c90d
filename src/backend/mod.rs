//! # KVM state backends
//!
//! The KVM reads and writes world state only through [`StateDB`]. A backend
//! must support nested snapshots: the executor takes one before every call
//! or create and reverts to it when the frame fails.

mod memory;

pub use self::memory::{MemoryAccount, MemoryStateDb};

use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Keccak-256 hash of empty code.
pub const EMPTY_CODE_HASH: H256 = H256([
	0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
	0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// A log emitted by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct Log {
	/// Emitting contract.
	pub address: H160,
	/// Indexed topics, at most four.
	pub topics: Vec<H256>,
	/// Unindexed payload.
	pub data: Vec<u8>,
	/// Height of the block the log was emitted in.
	pub block_height: u64,
}

/// World state as seen by the KVM.
#[auto_impl::auto_impl(&mut, Box)]
pub trait StateDB {
	/// Balance of an account, zero if it does not exist.
	fn get_balance(&self, address: H160) -> U256;
	/// Overwrite the balance of an account, creating it if needed.
	fn set_balance(&mut self, address: H160, value: U256);
	/// Add to the balance of an account, creating it if needed.
	fn add_balance(&mut self, address: H160, value: U256);
	/// Subtract from the balance of an account.
	fn sub_balance(&mut self, address: H160, value: U256);

	/// Nonce of an account.
	fn get_nonce(&self, address: H160) -> u64;
	/// Set the nonce of an account, creating it if needed.
	fn set_nonce(&mut self, address: H160, nonce: u64);

	/// Code of an account.
	fn get_code(&self, address: H160) -> Vec<u8>;
	/// Set the code of an account, creating it if needed.
	fn set_code(&mut self, address: H160, code: Vec<u8>);
	/// Code hash of an account. Zero if the account does not exist.
	fn get_code_hash(&self, address: H160) -> H256;
	/// Code length of an account.
	fn get_code_size(&self, address: H160) -> usize;

	/// Storage value of an account.
	fn get_state(&self, address: H160, key: H256) -> H256;
	/// Set a storage value of an account.
	fn set_state(&mut self, address: H160, key: H256, value: H256);

	/// Create a fresh account, keeping the balance of any account it
	/// replaces.
	fn create_account(&mut self, address: H160);
	/// Whether the account exists. Suicided accounts exist until the end of
	/// the transaction.
	fn exist(&self, address: H160) -> bool;
	/// Whether the account is missing or has zero nonce, zero balance and no
	/// code.
	fn empty(&self, address: H160) -> bool;

	/// Take a snapshot and return its id.
	fn snapshot(&mut self) -> usize;
	/// Undo every change made since the snapshot `id` was taken.
	fn revert_to_snapshot(&mut self, id: usize);

	/// Add to the refund counter.
	fn add_refund(&mut self, gas: u64);
	/// Current refund counter.
	fn get_refund(&self) -> u64;

	/// Record a log.
	fn add_log(&mut self, log: Log);
	/// Record the preimage of a hash.
	fn add_preimage(&mut self, hash: H256, preimage: Vec<u8>);

	/// Mark an account as suicided and zero its balance. Returns `false` if
	/// the account does not exist.
	fn suicide(&mut self, address: H160) -> bool;
	/// Whether the account has been marked as suicided.
	fn has_suicided(&self, address: H160) -> bool;
}

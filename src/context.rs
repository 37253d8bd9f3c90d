//! Block and transaction environment of an execution.

use crate::backend::StateDB;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;
use primitive_types::{H160, H256, U256};

/// Whether `address` holds at least `amount`.
pub type CanTransferFn = fn(&dyn StateDB, H160, U256) -> bool;
/// Move `amount` from the first address to the second.
pub type TransferFn = fn(&mut dyn StateDB, H160, H160, U256);
/// Hash of the block at the given height.
pub type GetHashFn = Box<dyn Fn(u64) -> H256>;

/// Environment an execution runs in. Fixed for the lifetime of a [`Kvm`].
///
/// [`Kvm`]: crate::executor::Kvm
pub struct BlockContext {
	/// Balance check done before every value transfer.
	pub can_transfer: CanTransferFn,
	/// Value transfer.
	pub transfer: TransferFn,
	/// Block hash lookup for `BLOCKHASH`.
	pub get_hash: GetHashFn,

	/// Transaction origin.
	pub origin: H160,
	/// Transaction gas price.
	pub gas_price: U256,

	/// Block proposer.
	pub coinbase: H160,
	/// Block gas limit.
	pub gas_limit: u64,
	/// Block height.
	pub block_height: u64,
	/// Block time.
	pub time: u64,
	/// Chain id.
	pub chain_id: u64,
}

impl Default for BlockContext {
	fn default() -> Self {
		Self {
			can_transfer,
			transfer,
			get_hash: Box::new(|_| H256::zero()),
			origin: H160::zero(),
			gas_price: U256::zero(),
			coinbase: H160::zero(),
			gas_limit: 0,
			block_height: 0,
			time: 0,
			chain_id: 0,
		}
	}
}

/// Default balance check.
pub fn can_transfer(db: &dyn StateDB, address: H160, amount: U256) -> bool {
	db.get_balance(address) >= amount
}

/// Default value transfer.
pub fn transfer(db: &mut dyn StateDB, sender: H160, recipient: H160, amount: U256) {
	db.sub_balance(sender, amount);
	db.add_balance(recipient, amount);
}

/// What a hash lookup needs to know about a block header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderRef {
	/// Block height.
	pub height: u64,
	/// Hash of the parent block.
	pub parent_hash: H256,
}

/// Read access to the canonical chain.
#[auto_impl::auto_impl(&, Box, Rc)]
pub trait ChainReader {
	/// Header with the given hash at the given height.
	fn header(&self, hash: H256, height: u64) -> Option<HeaderRef>;
}

/// Build a block hash lookup walking back from `current`. Hashes are cached
/// as the walk goes, so repeated lookups only ever visit each header once.
///
/// Returns zero for heights at or above `current`, or when the chain runs
/// out of headers.
pub fn get_hash_fn<C: ChainReader + 'static>(current: HeaderRef, chain: C) -> GetHashFn {
	let cache: RefCell<Vec<H256>> = RefCell::new(Vec::new());

	Box::new(move |height| {
		if height >= current.height {
			return H256::zero();
		}

		let mut cache = cache.borrow_mut();
		if cache.is_empty() {
			cache.push(current.parent_hash);
		}

		// cache[i] is the hash of block `current.height - 1 - i`.
		let index = (current.height - height - 1) as usize;
		if let Some(hash) = cache.get(index) {
			return *hash;
		}

		let mut last_hash = cache[cache.len() - 1];
		let mut last_height = current.height - cache.len() as u64;
		while let Some(header) = chain.header(last_hash, last_height) {
			if last_height == 0 {
				break;
			}
			cache.push(header.parent_hash);
			last_hash = header.parent_hash;
			last_height = header.height - 1;
			if last_height == height {
				return last_hash;
			}
		}

		H256::zero()
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::MemoryStateDb;
	use alloc::collections::BTreeMap;
	use alloc::rc::Rc;
	use core::cell::Cell;

	struct Chain {
		headers: BTreeMap<(H256, u64), HeaderRef>,
		lookups: Cell<usize>,
	}

	impl ChainReader for Chain {
		fn header(&self, hash: H256, height: u64) -> Option<HeaderRef> {
			self.lookups.set(self.lookups.get() + 1);
			self.headers.get(&(hash, height)).copied()
		}
	}

	fn hash_of(height: u64) -> H256 {
		H256::from_low_u64_be(0x1000 + height)
	}

	fn chain(tip: u64) -> Rc<Chain> {
		let mut headers = BTreeMap::new();
		for height in 1..=tip {
			headers.insert(
				(hash_of(height), height),
				HeaderRef {
					height,
					parent_hash: hash_of(height - 1),
				},
			);
		}
		Rc::new(Chain {
			headers,
			lookups: Cell::new(0),
		})
	}

	#[test]
	fn walks_parents_and_caches() {
		let chain = chain(10);
		let current = HeaderRef {
			height: 11,
			parent_hash: hash_of(10),
		};
		let get_hash = get_hash_fn(current, chain.clone());

		assert_eq!(get_hash(10), hash_of(10));
		assert_eq!(chain.lookups.get(), 0);

		assert_eq!(get_hash(7), hash_of(7));
		let lookups = chain.lookups.get();
		assert_eq!(get_hash(8), hash_of(8));
		assert_eq!(get_hash(7), hash_of(7));
		assert_eq!(chain.lookups.get(), lookups);

		assert_eq!(get_hash(11), H256::zero());
		assert_eq!(get_hash(12), H256::zero());
	}

	#[test]
	fn default_transfer_moves_balance() {
		let mut state = MemoryStateDb::new();
		let from = H160::from_low_u64_be(1);
		let to = H160::from_low_u64_be(2);
		state.set_balance(from, U256::from(10));

		assert!(can_transfer(&state, from, U256::from(10)));
		assert!(!can_transfer(&state, from, U256::from(11)));

		transfer(&mut state, from, to, U256::from(4));
		assert_eq!(state.get_balance(from), U256::from(6));
		assert_eq!(state.get_balance(to), U256::from(4));
	}
}

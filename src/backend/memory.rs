use super::{Log, StateDB, EMPTY_CODE_HASH};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Account information of a memory state.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: u64,
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
	/// Marked by `SUICIDE` and removed on [`MemoryStateDb::finalise`].
	pub suicided: bool,
}

impl MemoryAccount {
	fn is_empty(&self) -> bool {
		self.nonce == 0 && self.balance == U256::zero() && self.code.is_empty()
	}
}

#[derive(Clone, Debug)]
enum JournalEntry {
	Created { address: H160 },
	Reset { address: H160, prev: MemoryAccount },
	Balance { address: H160, prev: U256 },
	Nonce { address: H160, prev: u64 },
	Code { address: H160, prev: Vec<u8> },
	Storage { address: H160, key: H256, prev: Option<H256> },
	Suicide { address: H160, prev: bool, prev_balance: U256 },
	Refund { prev: u64 },
	Log,
	Preimage { hash: H256 },
}

/// In-memory state with a journal of every change, so that nested snapshots
/// can be reverted.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateDb {
	accounts: BTreeMap<H160, MemoryAccount>,
	logs: Vec<Log>,
	preimages: BTreeMap<H256, Vec<u8>>,
	refund: u64,
	journal: Vec<JournalEntry>,
	revisions: Vec<(usize, usize)>,
	next_revision: usize,
}

impl MemoryStateDb {
	/// Create an empty state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a state holding the given accounts.
	pub fn with_accounts(accounts: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			accounts,
			..Self::default()
		}
	}

	/// All accounts.
	pub fn accounts(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.accounts
	}

	/// A single account.
	pub fn account(&self, address: H160) -> Option<&MemoryAccount> {
		self.accounts.get(&address)
	}

	/// Logs recorded so far.
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	/// Preimages recorded so far.
	pub fn preimages(&self) -> &BTreeMap<H256, Vec<u8>> {
		&self.preimages
	}

	/// End the transaction: remove suicided accounts, reset the refund
	/// counter and forget every snapshot.
	pub fn finalise(&mut self) {
		self.accounts.retain(|_, account| !account.suicided);
		self.refund = 0;
		self.journal.clear();
		self.revisions.clear();
	}

	fn account_mut(&mut self, address: H160) -> &mut MemoryAccount {
		if !self.accounts.contains_key(&address) {
			self.journal.push(JournalEntry::Created { address });
		}
		self.accounts.entry(address).or_default()
	}

	fn undo(&mut self, entry: JournalEntry) {
		match entry {
			JournalEntry::Created { address } => {
				self.accounts.remove(&address);
			}
			JournalEntry::Reset { address, prev } => {
				self.accounts.insert(address, prev);
			}
			JournalEntry::Balance { address, prev } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.balance = prev;
				}
			}
			JournalEntry::Nonce { address, prev } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.nonce = prev;
				}
			}
			JournalEntry::Code { address, prev } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.code = prev;
				}
			}
			JournalEntry::Storage { address, key, prev } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					match prev {
						Some(value) => account.storage.insert(key, value),
						None => account.storage.remove(&key),
					};
				}
			}
			JournalEntry::Suicide {
				address,
				prev,
				prev_balance,
			} => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.suicided = prev;
					account.balance = prev_balance;
				}
			}
			JournalEntry::Refund { prev } => self.refund = prev,
			JournalEntry::Log => {
				self.logs.pop();
			}
			JournalEntry::Preimage { hash } => {
				self.preimages.remove(&hash);
			}
		}
	}
}

impl StateDB for MemoryStateDb {
	fn get_balance(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| account.balance)
			.unwrap_or_default()
	}

	fn set_balance(&mut self, address: H160, value: U256) {
		let account = self.account_mut(address);
		let prev = core::mem::replace(&mut account.balance, value);
		self.journal.push(JournalEntry::Balance { address, prev });
	}

	fn add_balance(&mut self, address: H160, value: U256) {
		let balance = self.get_balance(address).saturating_add(value);
		self.set_balance(address, balance);
	}

	fn sub_balance(&mut self, address: H160, value: U256) {
		let balance = self.get_balance(address).saturating_sub(value);
		self.set_balance(address, balance);
	}

	fn get_nonce(&self, address: H160) -> u64 {
		self.accounts
			.get(&address)
			.map(|account| account.nonce)
			.unwrap_or_default()
	}

	fn set_nonce(&mut self, address: H160, nonce: u64) {
		let account = self.account_mut(address);
		let prev = core::mem::replace(&mut account.nonce, nonce);
		self.journal.push(JournalEntry::Nonce { address, prev });
	}

	fn get_code(&self, address: H160) -> Vec<u8> {
		self.accounts
			.get(&address)
			.map(|account| account.code.clone())
			.unwrap_or_default()
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		let account = self.account_mut(address);
		let prev = core::mem::replace(&mut account.code, code);
		self.journal.push(JournalEntry::Code { address, prev });
	}

	fn get_code_hash(&self, address: H160) -> H256 {
		match self.accounts.get(&address) {
			None => H256::zero(),
			Some(account) if account.code.is_empty() => EMPTY_CODE_HASH,
			Some(account) => H256::from_slice(Keccak256::digest(&account.code).as_slice()),
		}
	}

	fn get_code_size(&self, address: H160) -> usize {
		self.accounts
			.get(&address)
			.map(|account| account.code.len())
			.unwrap_or_default()
	}

	fn get_state(&self, address: H160, key: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&key).copied())
			.unwrap_or_default()
	}

	fn set_state(&mut self, address: H160, key: H256, value: H256) {
		let account = self.account_mut(address);
		let prev = if value == H256::zero() {
			account.storage.remove(&key)
		} else {
			account.storage.insert(key, value)
		};
		self.journal
			.push(JournalEntry::Storage { address, key, prev });
	}

	fn create_account(&mut self, address: H160) {
		let balance = self.get_balance(address);
		match self.accounts.insert(
			address,
			MemoryAccount {
				balance,
				..MemoryAccount::default()
			},
		) {
			Some(prev) => self.journal.push(JournalEntry::Reset { address, prev }),
			None => self.journal.push(JournalEntry::Created { address }),
		}
	}

	fn exist(&self, address: H160) -> bool {
		self.accounts.contains_key(&address)
	}

	fn empty(&self, address: H160) -> bool {
		self.accounts
			.get(&address)
			.map(MemoryAccount::is_empty)
			.unwrap_or(true)
	}

	fn snapshot(&mut self) -> usize {
		let id = self.next_revision;
		self.next_revision += 1;
		self.revisions.push((id, self.journal.len()));
		id
	}

	fn revert_to_snapshot(&mut self, id: usize) {
		let index = match self.revisions.binary_search_by_key(&id, |(id, _)| *id) {
			Ok(index) => index,
			Err(_) => {
				log::warn!(target: "kvm", "Revert to unknown snapshot {}", id);
				return;
			}
		};
		let (_, journal_len) = self.revisions[index];

		while self.journal.len() > journal_len {
			if let Some(entry) = self.journal.pop() {
				self.undo(entry);
			}
		}
		self.revisions.truncate(index);
	}

	fn add_refund(&mut self, gas: u64) {
		self.journal
			.push(JournalEntry::Refund { prev: self.refund });
		self.refund = self.refund.saturating_add(gas);
	}

	fn get_refund(&self) -> u64 {
		self.refund
	}

	fn add_log(&mut self, log: Log) {
		self.journal.push(JournalEntry::Log);
		self.logs.push(log);
	}

	fn add_preimage(&mut self, hash: H256, preimage: Vec<u8>) {
		if !self.preimages.contains_key(&hash) {
			self.journal.push(JournalEntry::Preimage { hash });
			self.preimages.insert(hash, preimage);
		}
	}

	fn suicide(&mut self, address: H160) -> bool {
		let account = match self.accounts.get_mut(&address) {
			Some(account) => account,
			None => return false,
		};
		let prev = core::mem::replace(&mut account.suicided, true);
		let prev_balance = core::mem::take(&mut account.balance);
		self.journal.push(JournalEntry::Suicide {
			address,
			prev,
			prev_balance,
		});
		true
	}

	fn has_suicided(&self, address: H160) -> bool {
		self.accounts
			.get(&address)
			.map(|account| account.suicided)
			.unwrap_or(false)
	}
}

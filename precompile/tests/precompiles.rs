use std::borrow::Cow;
use std::collections::BTreeMap;

use k256::ecdsa::SigningKey;
use kvm::backend::{MemoryStateDb, StateDB};
use kvm::executor::Kvm;
use kvm::{BlockContext, Config, ExitError, ExitException, ExitSucceed};
use kvm_precompile::{kardia, standard, Staking, STAKING_REWARDS_ADDRESS};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

const CALLER: u64 = 0xca11;

fn address(n: u64) -> H160 {
	H160::from_low_u64_be(n)
}

fn selector(signature: &str) -> Vec<u8> {
	Keccak256::digest(signature.as_bytes())[..4].to_vec()
}

fn word(address: H160) -> Vec<u8> {
	H256::from(address).as_bytes().to_vec()
}

fn signed_input(key: &SigningKey, hash: H256) -> Vec<u8> {
	let (signature, recid) = key
		.sign_prehash_recoverable(hash.as_bytes())
		.expect("signing succeeds");

	let mut input = hash.as_bytes().to_vec();
	let mut v = [0u8; 32];
	v[31] = 27 + recid.to_byte();
	input.extend_from_slice(&v);
	input.extend_from_slice(&signature.to_bytes());
	input
}

fn signer(key: &SigningKey) -> H160 {
	let point = key.verifying_key().to_encoded_point(false);
	H160::from_slice(&Keccak256::digest(&point.as_bytes()[1..])[12..])
}

#[test]
fn ecrecover_returns_signer() {
	let config = Config::kardia();
	let precompiles = standard();
	let mut kvm = Kvm::new(BlockContext::default(), MemoryStateDb::new(), &config, &precompiles);

	let key = SigningKey::from_slice(&[0x42; 32]).expect("valid key");
	let hash = H256::from_slice(Keccak256::digest(b"kardia").as_slice());
	let input = signed_input(&key, hash);

	let (reason, output, leftover) =
		kvm.call(address(CALLER), address(1), input, 10_000, U256::zero());

	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(output, word(signer(&key)));
	assert_eq!(leftover, 7_000);
}

#[test]
fn ecrecover_malformed_input_returns_zero() {
	let config = Config::kardia();
	let precompiles = standard();
	let mut kvm = Kvm::new(BlockContext::default(), MemoryStateDb::new(), &config, &precompiles);

	let key = SigningKey::from_slice(&[0x42; 32]).expect("valid key");
	let hash = H256::repeat_byte(7);

	let mut bad_v = signed_input(&key, hash);
	bad_v[63] = 29;
	let (reason, output, _) = kvm.call(address(CALLER), address(1), bad_v, 10_000, U256::zero());
	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(output, vec![0u8; 32]);

	let mut zero_r = signed_input(&key, hash);
	for byte in &mut zero_r[64..96] {
		*byte = 0;
	}
	let (reason, output, _) = kvm.call(address(CALLER), address(1), zero_r, 10_000, U256::zero());
	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(output, vec![0u8; 32]);

	let (reason, output, _) =
		kvm.call(address(CALLER), address(1), vec![1, 2, 3], 10_000, U256::zero());
	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(output, vec![0u8; 32]);
}

#[test]
fn hashes_and_identity() {
	let config = Config::kardia();
	let precompiles = standard();
	let mut kvm = Kvm::new(BlockContext::default(), MemoryStateDb::new(), &config, &precompiles);

	let (_, output, leftover) =
		kvm.call(address(CALLER), address(2), Vec::new(), 1_000, U256::zero());
	assert_eq!(
		hex::encode(output),
		"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
	);
	assert_eq!(leftover, 1_000 - 60);

	let (_, output, leftover) =
		kvm.call(address(CALLER), address(3), Vec::new(), 1_000, U256::zero());
	assert_eq!(
		hex::encode(output),
		"0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31"
	);
	assert_eq!(leftover, 1_000 - 600);

	let (_, output, leftover) =
		kvm.call(address(CALLER), address(4), vec![9; 33], 1_000, U256::zero());
	assert_eq!(output, vec![9; 33]);
	assert_eq!(leftover, 1_000 - 15 - 6);

	let (reason, _, leftover) = kvm.call(address(CALLER), address(3), vec![0; 64], 800, U256::zero());
	assert_eq!(reason, Err(ExitError::Exception(ExitException::OutOfGas)));
	assert_eq!(leftover, 0);
}

struct MockStaking {
	rewards: BTreeMap<(H160, H160), U256>,
}

impl Staking for MockStaking {
	fn pending_reward(
		&self,
		_state: &dyn StateDB,
		validator: H160,
		delegator: H160,
	) -> Result<U256, Cow<'static, str>> {
		self.rewards
			.get(&(validator, delegator))
			.copied()
			.ok_or(Cow::Borrowed("delegation not found"))
	}

	fn claim_reward(
		&self,
		state: &mut dyn StateDB,
		validator: H160,
		delegator: H160,
	) -> Result<U256, Cow<'static, str>> {
		let reward = self.pending_reward(state, validator, delegator)?;
		state.add_balance(delegator, reward);
		Ok(reward)
	}
}

fn staking_kvm_parts() -> (Config, kvm::executor::Precompiles) {
	let mut rewards = BTreeMap::new();
	rewards.insert((address(0x7a), address(CALLER)), U256::from(500));
	(Config::kardia(), kardia(MockStaking { rewards }))
}

#[test]
fn staking_pending_and_claim() {
	let (config, precompiles) = staking_kvm_parts();
	let context = BlockContext {
		block_height: 12,
		..BlockContext::default()
	};
	let mut kvm = Kvm::new(context, MemoryStateDb::new(), &config, &precompiles);

	let mut pending = selector("pendingReward(address,address)");
	pending.extend(word(address(0x7a)));
	pending.extend(word(address(CALLER)));
	let (reason, output, leftover) =
		kvm.call(address(CALLER), STAKING_REWARDS_ADDRESS, pending, 50_000, U256::zero());
	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(U256::from_big_endian(&output), U256::from(500));
	assert_eq!(leftover, 49_000);

	let mut claim = selector("claimReward(address)");
	claim.extend(word(address(0x7a)));
	let (reason, output, leftover) =
		kvm.call(address(CALLER), STAKING_REWARDS_ADDRESS, claim, 50_000, U256::zero());
	assert_eq!(reason, Ok(ExitSucceed::Returned));
	assert_eq!(U256::from_big_endian(&output), U256::from(500));
	assert_eq!(leftover, 30_000);
	assert_eq!(kvm.state().get_balance(address(CALLER)), U256::from(500));

	let logs = kvm.state().logs();
	assert_eq!(logs.len(), 1);
	assert_eq!(logs[0].address, STAKING_REWARDS_ADDRESS);
	assert_eq!(logs[0].topics.len(), 3);
	assert_eq!(logs[0].topics[1], H256::from(address(0x7a)));
	assert_eq!(logs[0].block_height, 12);
}

#[test]
fn staking_claim_is_write_protected() {
	let (config, precompiles) = staking_kvm_parts();
	let mut kvm = Kvm::new(BlockContext::default(), MemoryStateDb::new(), &config, &precompiles);

	let mut claim = selector("claimReward(address)");
	claim.extend(word(address(0x7a)));
	let (reason, _, leftover) =
		kvm.static_call(address(CALLER), STAKING_REWARDS_ADDRESS, claim, 50_000);

	assert_eq!(
		reason,
		Err(ExitError::Exception(ExitException::WriteProtection))
	);
	assert_eq!(leftover, 0);
	assert_eq!(kvm.state().get_balance(address(CALLER)), U256::zero());
}

#[test]
fn staking_errors_revert_with_reason() {
	let (config, precompiles) = staking_kvm_parts();
	let mut kvm = Kvm::new(BlockContext::default(), MemoryStateDb::new(), &config, &precompiles);

	let mut claim = selector("claimReward(address)");
	claim.extend(word(address(0x7b)));
	let result = kvm.execute_call(address(CALLER), STAKING_REWARDS_ADDRESS, claim, 50_000, U256::zero());

	assert_eq!(result.err, Some(ExitError::Reverted));
	assert_eq!(
		result.unpack_revert_reason().as_deref(),
		Some("delegation not found")
	);
	assert_eq!(result.used_gas, 20_000);

	let result = kvm.execute_call(
		address(CALLER),
		STAKING_REWARDS_ADDRESS,
		vec![0xde, 0xad, 0xbe, 0xef],
		50_000,
		U256::zero(),
	);
	assert_eq!(
		result.unpack_revert_reason().as_deref(),
		Some("staking: unknown method")
	);
}

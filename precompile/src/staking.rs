use alloc::borrow::Cow;
use alloc::vec::Vec;

use kvm::backend::{Log, StateDB};
use kvm::executor::{Precompile, PrecompileFailure, PrecompileFrame};
use kvm::{BlockContext, ExitException};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

const CLAIM_REWARD_GAS: u64 = 20000;
const PENDING_REWARD_GAS: u64 = 1000;

/// Reward bookkeeping of the staking subsystem.
pub trait Staking {
	/// Reward `delegator` may claim from `validator`.
	fn pending_reward(
		&self,
		state: &dyn StateDB,
		validator: H160,
		delegator: H160,
	) -> Result<U256, Cow<'static, str>>;

	/// Pay out the pending reward of `delegator` at `validator` and return
	/// the amount paid.
	fn claim_reward(
		&self,
		state: &mut dyn StateDB,
		validator: H160,
		delegator: H160,
	) -> Result<U256, Cow<'static, str>>;
}

enum Method {
	ClaimReward { validator: H160 },
	PendingReward { validator: H160, delegator: H160 },
}

fn selector(signature: &str) -> [u8; 4] {
	let hash = Keccak256::digest(signature.as_bytes());
	[hash[0], hash[1], hash[2], hash[3]]
}

fn read_address(data: &[u8], index: usize) -> Option<H160> {
	let word = data.get(index * 32..(index + 1) * 32)?;
	if word[..12].iter().any(|b| *b != 0) {
		return None;
	}
	Some(H160::from_slice(&word[12..]))
}

impl Method {
	fn decode(input: &[u8]) -> Result<Self, &'static str> {
		if input.len() < 4 {
			return Err("staking: missing method selector");
		}
		let (sel, args) = input.split_at(4);

		if sel == selector("claimReward(address)") {
			let validator = read_address(args, 0).ok_or("staking: invalid arguments")?;
			Ok(Method::ClaimReward { validator })
		} else if sel == selector("pendingReward(address,address)") {
			let validator = read_address(args, 0).ok_or("staking: invalid arguments")?;
			let delegator = read_address(args, 1).ok_or("staking: invalid arguments")?;
			Ok(Method::PendingReward {
				validator,
				delegator,
			})
		} else {
			Err("staking: unknown method")
		}
	}
}

/// ABI `Error(string)` payload carrying `message`.
fn revert_reason(message: &str) -> Vec<u8> {
	let mut data = Vec::with_capacity(4 + 96);
	data.extend_from_slice(&selector("Error(string)"));

	let mut word = [0u8; 32];
	U256::from(32).to_big_endian(&mut word);
	data.extend_from_slice(&word);
	U256::from(message.len()).to_big_endian(&mut word);
	data.extend_from_slice(&word);

	data.extend_from_slice(message.as_bytes());
	let padded = 4 + 64 + (message.len() + 31) / 32 * 32;
	data.resize(padded, 0);
	data
}

fn revert(message: &str) -> PrecompileFailure {
	PrecompileFailure::Revert {
		output: revert_reason(message),
	}
}

fn encode_u256(value: U256) -> Vec<u8> {
	let mut word = [0u8; 32];
	value.to_big_endian(&mut word);
	word.to_vec()
}

/// Staking reward precompile. Dispatches `claimReward(address)` and
/// `pendingReward(address,address)` to a [`Staking`] backend.
pub struct StakingRewards<S> {
	staking: S,
}

impl<S: Staking> StakingRewards<S> {
	/// Wrap a staking backend.
	pub fn new(staking: S) -> Self {
		Self { staking }
	}
}

impl<S: Staking> Precompile for StakingRewards<S> {
	fn required_gas(&self, input: &[u8]) -> u64 {
		match Method::decode(input) {
			Ok(Method::ClaimReward { .. }) => CLAIM_REWARD_GAS,
			Ok(Method::PendingReward { .. }) => PENDING_REWARD_GAS,
			Err(_) => 0,
		}
	}

	fn run(
		&self,
		input: &[u8],
		frame: &PrecompileFrame,
		context: &BlockContext,
		state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure> {
		match Method::decode(input).map_err(revert)? {
			Method::PendingReward {
				validator,
				delegator,
			} => {
				let reward = self
					.staking
					.pending_reward(state, validator, delegator)
					.map_err(|e| revert(&e))?;
				Ok(encode_u256(reward))
			}
			Method::ClaimReward { validator } => {
				if frame.is_static {
					return Err(ExitException::WriteProtection.into());
				}

				let delegator = frame.context.caller;
				let reward = self
					.staking
					.claim_reward(state, validator, delegator)
					.map_err(|e| revert(&e))?;

				log::debug!(
					target: "kvm",
					"Claimed reward {} of validator {:?} for {:?}",
					reward,
					validator,
					delegator
				);

				let event = H256::from_slice(
					Keccak256::digest(b"RewardClaimed(address,address,uint256)").as_slice(),
				);
				state.add_log(Log {
					address: frame.context.address,
					topics: [event, validator.into(), delegator.into()].to_vec(),
					data: encode_u256(reward),
					block_height: context.block_height,
				});

				Ok(encode_u256(reward))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn revert_reason_is_abi_encoded() {
		let data = revert_reason("nope");
		assert_eq!(&data[..4], &[0x08, 0xc3, 0x79, 0xa0]);
		assert_eq!(data.len(), 4 + 96);
		assert_eq!(data[4 + 31], 0x20);
		assert_eq!(data[4 + 63], 4);
		assert_eq!(&data[68..72], b"nope");
	}

	#[test]
	fn decodes_methods() {
		let mut input = selector("pendingReward(address,address)").to_vec();
		input.extend_from_slice(H256::from(H160::repeat_byte(1)).as_bytes());
		input.extend_from_slice(H256::from(H160::repeat_byte(2)).as_bytes());
		match Method::decode(&input) {
			Ok(Method::PendingReward {
				validator,
				delegator,
			}) => {
				assert_eq!(validator, H160::repeat_byte(1));
				assert_eq!(delegator, H160::repeat_byte(2));
			}
			_ => panic!("expected pendingReward"),
		}

		input.truncate(4 + 32);
		assert!(Method::decode(&input).is_err());
		assert!(Method::decode(&[0, 1]).is_err());

		let mut dirty = selector("claimReward(address)").to_vec();
		dirty.extend_from_slice(&[0xff; 32]);
		assert!(Method::decode(&dirty).is_err());
	}
}

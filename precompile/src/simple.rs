use alloc::vec::Vec;
use core::cmp::min;

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use kvm::backend::StateDB;
use kvm::executor::{Precompile, PrecompileFailure, PrecompileFrame};
use kvm::BlockContext;
use primitive_types::{H160, H256};
use sha2::Digest;
use sha3::Keccak256;

use crate::linear_cost;

/// Signer address recovery, at address 1.
pub struct ECRecover;

impl ECRecover {
	fn recover(input: &[u8; 128]) -> Option<H160> {
		let mut sig = Signature::from_slice(&input[64..128]).ok()?;
		let mut recid = RecoveryId::from_byte(input[63] - 27)?;
		// High s values are accepted and recover the same key once flipped.
		if let Some(normalized) = sig.normalize_s() {
			sig = normalized;
			recid = RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced());
		}

		let pubkey = VerifyingKey::recover_from_prehash(&input[0..32], &sig, recid).ok()?;
		let point = pubkey.to_encoded_point(false);
		let hash = Keccak256::digest(&point.as_bytes()[1..]);
		Some(H160::from_slice(&hash[12..]))
	}
}

impl Precompile for ECRecover {
	fn required_gas(&self, input: &[u8]) -> u64 {
		linear_cost(input.len(), 3000, 0)
	}

	fn run(
		&self,
		i: &[u8],
		_frame: &PrecompileFrame,
		_context: &BlockContext,
		_state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure> {
		let mut input = [0u8; 128];
		input[..min(i.len(), 128)].copy_from_slice(&i[..min(i.len(), 128)]);

		// v can only be 27 or 28 on the full 32 bytes value.
		if input[32..63] != [0u8; 31] || ![27, 28].contains(&input[63]) {
			return Ok(H256::zero().0.to_vec());
		}

		let address = Self::recover(&input).unwrap_or_default();
		Ok(H256::from(address).0.to_vec())
	}
}

/// SHA-256 hash, at address 2.
pub struct Sha256;

impl Precompile for Sha256 {
	fn required_gas(&self, input: &[u8]) -> u64 {
		linear_cost(input.len(), 60, 12)
	}

	fn run(
		&self,
		input: &[u8],
		_frame: &PrecompileFrame,
		_context: &BlockContext,
		_state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure> {
		Ok(sha2::Sha256::digest(input).to_vec())
	}
}

/// RIPEMD-160 hash left-padded to a word, at address 3.
pub struct Ripemd160;

impl Precompile for Ripemd160 {
	fn required_gas(&self, input: &[u8]) -> u64 {
		linear_cost(input.len(), 600, 120)
	}

	fn run(
		&self,
		input: &[u8],
		_frame: &PrecompileFrame,
		_context: &BlockContext,
		_state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure> {
		let mut ret = [0u8; 32];
		let hash = ripemd::Ripemd160::digest(input);
		ret[12..32].copy_from_slice(&hash);

		Ok(ret.to_vec())
	}
}

/// Data copy, at address 4.
pub struct Identity;

impl Precompile for Identity {
	fn required_gas(&self, input: &[u8]) -> u64 {
		linear_cost(input.len(), 15, 3)
	}

	fn run(
		&self,
		input: &[u8],
		_frame: &PrecompileFrame,
		_context: &BlockContext,
		_state: &mut dyn StateDB,
	) -> Result<Vec<u8>, PrecompileFailure> {
		Ok(input.to_vec())
	}
}

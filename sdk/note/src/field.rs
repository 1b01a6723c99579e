//! Field and hash helpers
//!
//! Everything hashed by the circuit lives in the BN254 scalar field. Amounts are
//! 256-bit integers and are folded into the field before hashing.
//!
//! ```text
//! wire / hash encoding:  32 bytes, big-endian
//! address encoding:      spending key as 32 bytes, little-endian
//! ```

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInt, BigInteger, PrimeField};
use primitive_types::U256;
use sha3::{Digest, Keccak256};

static POSEIDON: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// Poseidon configuration shared by every hash in the wallet
///
/// Field: BN254 Fr (254 bits)
/// Rate: 2
/// Capacity: 1
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    POSEIDON.get_or_init(|| {
        let prime_bits: u64 = 254;
        let rate: usize = 2;
        let capacity: usize = 1;
        let full_rounds: u64 = 8;
        let partial_rounds: u64 = 57;
        let alpha: u64 = 5;
        let skip_matrices: u64 = 0;

        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            prime_bits,
            rate,
            full_rounds,
            partial_rounds,
            skip_matrices,
        );

        PoseidonConfig::new(
            full_rounds as usize,
            partial_rounds as usize,
            alpha,
            mds,
            ark,
            rate,
            capacity,
        )
    })
}

/// Absorb `inputs` in order and squeeze a single element
pub fn poseidon(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_field_elements::<Fr>(1)[0]
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

pub fn fr_to_be_bytes(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

pub fn fr_to_le_bytes(value: &Fr) -> [u8; 32] {
    let mut out = fr_to_be_bytes(value);
    out.reverse();
    out
}

/// Canonical decoding; values at or above the modulus are rejected
pub fn fr_from_be_bytes(bytes: &[u8; 32]) -> Option<Fr> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.rchunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(word);
    }
    Fr::from_bigint(BigInt::new(limbs))
}

pub fn fr_from_le_bytes(bytes: &[u8; 32]) -> Option<Fr> {
    let mut be = *bytes;
    be.reverse();
    fr_from_be_bytes(&be)
}

pub fn fr_to_u256(value: &Fr) -> U256 {
    U256::from_big_endian(&fr_to_be_bytes(value))
}

/// Amounts wider than the field wrap around the modulus
pub fn u256_to_fr(value: &U256) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_big_endian())
}

/// Decimal rendering used for witness signals
pub fn fr_to_decimal(value: &Fr) -> String {
    fr_to_u256(value).to_string()
}

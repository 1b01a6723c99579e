//! Wallet accounts
//!
//! ```text
//! private key  ──► a   (EdDSA signing scalar)      A = a·G
//!              └─► v   (viewing key / nullifier seed) P = v·G
//!
//! spending_pub_key S = Poseidon(A.x, A.y, v)
//! ZkAddress        = (S, P)
//! ```

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};

use crate::address::ZkAddress;
use crate::curve::{self, Point, Scalar};
use crate::field::{fr_to_be_bytes, poseidon};

const VIEWING_KEY_CONTEXT: &str = "veil 2024 viewing key derivation";
const SIGNING_NONCE_CONTEXT: &str = "veil 2024 eddsa nonce";

/// EdDSA signature over a field element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdDsaSignature {
    pub r8: Point,
    pub s: Scalar,
}

impl EdDsaSignature {
    /// Check `s·G == R8 + h·A`
    pub fn verify(&self, msg: &Fr, pub_key: &Point) -> bool {
        let h = challenge(&self.r8, pub_key, msg);
        let lhs = curve::mul_base(&self.s);
        let rhs = (self.r8.into_group() + *pub_key * h).into_affine();
        lhs == rhs
    }
}

fn challenge(r8: &Point, pub_key: &Point, msg: &Fr) -> Scalar {
    let h = poseidon(&[r8.x, r8.y, pub_key.x, pub_key.y, *msg]);
    curve::fr_to_scalar(&h)
}

/// Read-only half of an account: finds and decrypts incoming notes, derives nullifiers
#[derive(Debug, Clone)]
pub struct ZkViewer {
    viewing_key: Scalar,
    eddsa_pub_key: Point,
    address: ZkAddress,
}

impl ZkViewer {
    pub fn new(viewing_key: Scalar, eddsa_pub_key: Point) -> Self {
        let spending_pub_key = poseidon(&[
            eddsa_pub_key.x,
            eddsa_pub_key.y,
            curve::scalar_to_fr(&viewing_key),
        ]);
        let address = ZkAddress::new(spending_pub_key, curve::mul_base(&viewing_key));
        Self {
            viewing_key,
            eddsa_pub_key,
            address,
        }
    }

    pub fn address(&self) -> ZkAddress {
        self.address
    }

    pub fn eddsa_pub_key(&self) -> &Point {
        &self.eddsa_pub_key
    }

    /// The viewing scalar doubles as the nullifier seed
    pub fn nullifier_seed(&self) -> Scalar {
        self.viewing_key
    }

    pub(crate) fn viewing_key(&self) -> &Scalar {
        &self.viewing_key
    }
}

/// Full spending account
#[derive(Debug, Clone)]
pub struct ZkAccount {
    private_key: [u8; 32],
    signing_key: Scalar,
    viewer: ZkViewer,
}

impl ZkAccount {
    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        let signing_key = curve::scalar_from_bytes(&private_key);
        let eddsa_pub_key = curve::mul_base(&signing_key);
        let viewing_bytes = blake3::derive_key(VIEWING_KEY_CONTEXT, &private_key);
        let viewing_key = curve::scalar_from_bytes(&viewing_bytes);

        Self {
            private_key,
            signing_key,
            viewer: ZkViewer::new(viewing_key, eddsa_pub_key),
        }
    }

    /// Generate a fresh random account
    pub fn random<R: rand::RngCore>(rng: &mut R) -> Self {
        let mut private_key = [0u8; 32];
        rng.fill_bytes(&mut private_key);
        Self::from_private_key(private_key)
    }

    pub fn address(&self) -> ZkAddress {
        self.viewer.address()
    }

    pub fn viewer(&self) -> &ZkViewer {
        &self.viewer
    }

    pub fn eddsa_pub_key(&self) -> &Point {
        self.viewer.eddsa_pub_key()
    }

    pub fn nullifier_seed(&self) -> Scalar {
        self.viewer.nullifier_seed()
    }

    /// Deterministic EdDSA signature (nonce derived from the key and message)
    pub fn sign(&self, msg: &Fr) -> EdDsaSignature {
        let mut hasher = blake3::Hasher::new_derive_key(SIGNING_NONCE_CONTEXT);
        hasher.update(&self.private_key);
        hasher.update(&fr_to_be_bytes(msg));
        let mut nonce_bytes = [0u8; 64];
        hasher.finalize_xof().fill(&mut nonce_bytes);

        let r = curve::scalar_from_bytes(&nonce_bytes);
        let r8 = curve::mul_base(&r);
        let h = challenge(&r8, self.eddsa_pub_key(), msg);

        EdDsaSignature {
            r8,
            s: r + h * self.signing_key,
        }
    }
}

impl PartialEq for ZkAccount {
    fn eq(&self, other: &Self) -> bool {
        self.private_key == other.private_key
    }
}

impl Eq for ZkAccount {}

//! Merkle inclusion proofs for spent notes

use std::collections::HashMap;
use std::future::Future;

use ark_bn254::Fr;
use veil_note::field::fr_to_decimal;

use crate::error::MerkleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub root: Fr,
    pub siblings: Vec<Fr>,
    pub index: u64,
}

/// Anything that can prove a note hash is in the note tree
///
/// Queried once per transaction input, all inputs concurrently.
pub trait MerkleProofSource: Send + Sync {
    fn merkle_proof(&self, leaf: Fr) -> impl Future<Output = Result<MerkleProof, MerkleError>> + Send;
}

/// Fixed map of leaf -> proof
#[derive(Debug, Clone, Default)]
pub struct StaticProofSource {
    proofs: HashMap<Fr, MerkleProof>,
}

impl StaticProofSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, leaf: Fr, proof: MerkleProof) -> &mut Self {
        self.proofs.insert(leaf, proof);
        self
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }
}

impl MerkleProofSource for StaticProofSource {
    fn merkle_proof(&self, leaf: Fr) -> impl Future<Output = Result<MerkleProof, MerkleError>> + Send {
        let found = self
            .proofs
            .get(&leaf)
            .cloned()
            .ok_or_else(|| MerkleError::NotFound(fr_to_decimal(&leaf)));
        async move { found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_lookup() {
        let mut source = StaticProofSource::new();
        source.insert(
            Fr::from(7u64),
            MerkleProof {
                root: Fr::from(1u64),
                siblings: vec![Fr::from(2u64)],
                index: 3,
            },
        );

        let proof = source.merkle_proof(Fr::from(7u64)).await.unwrap();
        assert_eq!(proof.index, 3);
        assert_eq!(
            source.merkle_proof(Fr::from(8u64)).await,
            Err(MerkleError::NotFound("8".into()))
        );
    }
}

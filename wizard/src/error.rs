use std::path::PathBuf;

use thiserror::Error;
use veil_note::NoteError;
use veil_zktx::EncodeError;

/// Errors from a Merkle proof source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// No inclusion proof for the leaf (decimal note hash)
    #[error("No inclusion proof for leaf {0}")]
    NotFound(String),

    #[error("Merkle source error: {0}")]
    Source(String),
}

/// Errors resolving proving-key material
#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("Circuit {circuit} is missing {path}")]
    Missing { circuit: String, path: PathBuf },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Circuit cache IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error("Prover failed: {0}")]
    Prover(String),

    #[error("Public signal {index} mismatch: expected {expected}, prover returned {got}")]
    SignalMismatch {
        index: usize,
        expected: String,
        got: String,
    },

    #[error("Output {0} does not exist")]
    NoSuchOutput(usize),

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

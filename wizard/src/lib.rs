//! Veil ZkWizard
//!
//! Proves balanced transactions built by `veil-txbuilder`.
//!
//! ```text
//!             ┌──────────────────────┐
//! RawTx ─────►│       ZkWizard       │─────► ZkTx
//!             └──┬─────────┬──────┬──┘
//!                │         │      │
//!     MerkleProofSource  CircuitKeyCache  ProvingBackend (blocking pool)
//!        (async)         local / remote    snarkjs process | mock
//! ```

pub mod backend;
pub mod error;
pub mod keys;
pub mod merkle;
pub mod task;
pub mod witness;
pub mod wizard;

pub use backend::{CommandBackend, MockBackend, ProvedSignals, ProvingBackend, backend_from_config};
pub use error::{CircuitError, MerkleError, WizardError};
pub use keys::{CircuitKeyCache, KeyPaths, circuit_name};
pub use merkle::{MerkleProof, MerkleProofSource, StaticProofSource};
pub use task::{ProofOutcome, ProofTask};
pub use witness::Witness;
pub use wizard::ZkWizard;

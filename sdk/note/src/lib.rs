//! Veil Note SDK
//!
//! Confidential note model for the Veil rollup wallet.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          ZkAccount                            │
//! │   private key ──► EdDSA key (A)   viewing key / seed (v, P)   │
//! │                         │                  │                  │
//! │                         ▼                  ▼                  │
//! │              ZkAddress(S = Poseidon(A, v), P)                 │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │ owner
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Note { owner, salt, asset }  ──► hash (two-stage Poseidon)   │
//! │     ├── Utxo        (status, nullifier)                       │
//! │     ├── Withdrawal  (to, fee, withdrawal hash)                │
//! │     └── Migration   (to, fee)                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod account;
pub mod address;
pub mod asset;
pub mod curve;
pub mod encryption;
pub mod error;
pub mod field;
pub mod note;
pub mod sum;

pub use account::{EdDsaSignature, ZkAccount, ZkViewer};
pub use address::{Address, ZkAddress};
pub use asset::Asset;
pub use curve::{Point, Scalar};
pub use encryption::{
    ENCRYPTED_NOTE_LEN, EncryptedNote, decrypt_note, encrypt_note_for, try_decrypt_note,
};
pub use error::{AddressError, NoteError};
pub use note::{Migration, Note, NoteStatus, Outflow, OutflowType, PublicData, Utxo, Withdrawal};
pub use sum::Sum;

pub use ark_bn254::Fr;
pub use primitive_types::U256;

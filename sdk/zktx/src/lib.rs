//! Veil transaction wire format
//!
//! A [`ZkTx`] is the proved form of a transaction: nullifiers and roots for its inputs,
//! the public view of its outputs, the fee, a Groth16 proof and optional swap and memo.
//! Its byte layout is consumed by the network and the L1 contract, so encoding is
//! exact and decoding rejects anything it does not fully consume.

mod codec;
pub mod error;
pub mod memo;
pub mod proof;
pub mod tx;

pub use error::{DecodeError, EncodeError, MemoError};
pub use memo::{Memo, MemoV2, ParsedMemo, Prepayment, notes_selector, prepayment_selector};
pub use proof::{PROOF_LEN, SnarkProof};
pub use tx::{PUBLIC_DATA_LEN, PublicOutflowData, ZkInflow, ZkOutflow, ZkTx, estimate_size};

use thiserror::Error;

use crate::address::Address;

/// Errors decoding a [`ZkAddress`](crate::ZkAddress) or an L1 [`Address`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 payload: {0}")]
    Base58(String),

    #[error("Invalid address length: expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("Address checksum mismatch")]
    Checksum,

    #[error("Spending key is not a canonical field element")]
    SpendingKey,

    #[error("Viewing key is not a valid curve point")]
    ViewingKey,

    #[error("Invalid hex address: {0}")]
    Hex(String),
}

/// Errors raised by the note model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// The nullifier seed does not belong to the note owner
    #[error("Nullifier seed does not match the note owner's viewing key")]
    NotOwner,

    #[error("ERC20 note amount must be non-zero")]
    ZeroErc20Amount,

    #[error("NFT id must be non-zero")]
    ZeroNftId,

    /// Token missing from the well-known list used for note encryption
    #[error("Token {0} is not in the note encryption token list")]
    UnknownToken(Address),

    #[error("Note cannot be encrypted into a fixed-width memo: {0}")]
    Unencryptable(&'static str),

    #[error("Total {0} of the notes exceeds 256 bits")]
    Overflow(&'static str),
}

use primitive_types::U256;
use thiserror::Error;
use veil_note::{Address, NoteError};

use crate::units::Ether;

/// Coin selection failures
///
/// Every variant names the asset and how far the spendables fall short.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Insufficient ether: required {required}, available {available}, short by {deficit}")]
    InsufficientEther {
        required: Ether,
        available: Ether,
        deficit: Ether,
    },

    #[error(
        "Insufficient balance of token {token}: required {required}, available {available}, short by {deficit}"
    )]
    InsufficientErc20 {
        token: Address,
        required: U256,
        available: U256,
        deficit: U256,
    },

    #[error("Not enough NFTs of {token}: required {required}, available {available}")]
    NotEnoughNfts {
        token: Address,
        required: usize,
        available: usize,
    },

    #[error("NFT {id} of {token} is not among the spendable notes")]
    NftNotFound { token: Address, id: U256 },

    #[error("Total {0} exceeds 256 bits")]
    Overflow(&'static str),

    #[error(transparent)]
    Note(#[from] NoteError),
}

/// A transaction whose inputs and outputs do not add up
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Ether mismatch: inflow {inflow}, outflow {outflow}, fee {fee}, l1 fee {l1_fee}")]
    Ether {
        inflow: Ether,
        outflow: Ether,
        fee: Ether,
        l1_fee: Ether,
    },

    #[error("Token {token} mismatch: inflow {inflow}, outflow {outflow}")]
    Erc20 {
        token: Address,
        inflow: U256,
        outflow: U256,
    },

    #[error("NFT ids of {token} differ between inflow and outflow")]
    Erc721 { token: Address },

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error("Ether spent by the outflow exceeds 256 bits")]
    Overflow,
}

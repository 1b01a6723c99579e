use primitive_types::U256;

use crate::address::Address;
use crate::error::NoteError;

/// Value carried by a note
///
/// A note holds ether plus at most one token position: either an ERC20 amount or an
/// NFT id for `token_addr`. The constructors below are the only place that rule is
/// checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Asset {
    pub eth: U256,
    pub token_addr: Address,
    pub erc20_amount: U256,
    pub nft: U256,
}

impl Asset {
    pub fn ether(eth: U256) -> Self {
        Self {
            eth,
            ..Self::default()
        }
    }

    pub fn erc20(token_addr: Address, amount: U256, eth: U256) -> Result<Self, NoteError> {
        if amount.is_zero() {
            return Err(NoteError::ZeroErc20Amount);
        }
        Ok(Self {
            eth,
            token_addr,
            erc20_amount: amount,
            nft: U256::zero(),
        })
    }

    pub fn nft(token_addr: Address, id: U256, eth: U256) -> Result<Self, NoteError> {
        if id.is_zero() {
            return Err(NoteError::ZeroNftId);
        }
        Ok(Self {
            eth,
            token_addr,
            erc20_amount: U256::zero(),
            nft: id,
        })
    }

    pub fn is_erc20(&self) -> bool {
        !self.erc20_amount.is_zero() && self.nft.is_zero()
    }

    pub fn is_nft(&self) -> bool {
        self.erc20_amount.is_zero() && !self.nft.is_zero()
    }

    /// True when the note carries nothing but ether
    pub fn is_ether_only(&self) -> bool {
        self.token_addr.is_zero() && self.erc20_amount.is_zero() && self.nft.is_zero()
    }
}

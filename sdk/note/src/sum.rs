//! Balance aggregation
//!
//! Totals ether, per-token ERC20 amounts and per-token NFT ids over a list of notes.
//! A note counts toward `erc20` when only its amount is set, toward `erc721` when only
//! its NFT id is set; ether is always counted. Totals that do not fit a `U256` are an
//! error.

use std::collections::{BTreeMap, BTreeSet};

use primitive_types::U256;

use crate::address::Address;
use crate::error::NoteError;
use crate::note::Note;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sum {
    pub eth: U256,
    pub erc20: BTreeMap<Address, U256>,
    pub erc721: BTreeMap<Address, Vec<U256>>,
}

impl Sum {
    pub fn from_notes<'a, I>(notes: I) -> Result<Self, NoteError>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let mut sum = Self::default();
        for note in notes {
            let asset = note.asset();
            sum.eth = sum
                .eth
                .checked_add(asset.eth)
                .ok_or(NoteError::Overflow("ether"))?;
            if asset.is_erc20() {
                let entry = sum.erc20.entry(asset.token_addr).or_default();
                *entry = entry
                    .checked_add(asset.erc20_amount)
                    .ok_or(NoteError::Overflow("erc20"))?;
            } else if asset.is_nft() {
                sum.erc721
                    .entry(asset.token_addr)
                    .or_default()
                    .push(asset.nft);
            }
        }
        Ok(sum)
    }

    pub fn erc20_amount(&self, token: &Address) -> U256 {
        self.erc20.get(token).copied().unwrap_or_default()
    }

    /// NFT ids held for `token`, as a set
    pub fn nft_ids(&self, token: &Address) -> BTreeSet<U256> {
        self.erc721
            .get(token)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every token address that appears in either map
    pub fn tokens(&self) -> BTreeSet<Address> {
        self.erc20
            .keys()
            .chain(self.erc721.keys())
            .copied()
            .collect()
    }
}

//! Coin selection
//!
//! ```text
//! build():
//!   1. ERC20   smallest notes first until each requested amount is covered
//!   2. ERC721  exactly the requested ids, no substitution
//!   3. change  one note per token surplus, one per unsent NFT
//!   4. fee     fee_per_byte * size(inputs, outputs + 1, public, swap)
//!   5. ether   largest ether-only notes first, fee re-priced per added input
//!   6. change  ether surplus back to `change_to`
//!   7. check   inflow == outflow + fee + l1 fee, per asset
//! ```
//!
//! `build()` works on a copy of the provided notes, so a failed call leaves nothing
//! half-selected behind.

use std::ops::{Deref, DerefMut};

use ark_bn254::Fr;
use primitive_types::U256;
use tracing::{debug, info};
use veil_config::FeesConfig;
use veil_note::{
    Address, Asset, Migration, Note, Outflow, OutflowType, PublicData, Sum, Utxo, Withdrawal,
    ZkAddress,
};

use crate::error::BuildError;
use crate::estimator::{SizeEstimator, WireSize};
use crate::raw::{RawTx, checked_l1_fee};
use crate::units::Ether;

/// Builds a balanced [`RawTx`] from spendable notes and requested outputs
#[derive(Debug, Clone)]
pub struct TxBuilder<E = WireSize> {
    change_to: ZkAddress,
    fee_per_byte: U256,
    spendables: Vec<Utxo>,
    sendings: Vec<Outflow>,
    estimator: E,
}

impl TxBuilder<WireSize> {
    pub fn new(change_to: ZkAddress) -> Self {
        Self::with_estimator(change_to, WireSize)
    }

    /// Builder priced at the configured `[fees]` rate
    pub fn from_config(change_to: ZkAddress, fees: &FeesConfig) -> Self {
        let mut builder = Self::new(change_to);
        builder.weight(U256::from(fees.fee_per_byte));
        builder
    }
}

impl<E: SizeEstimator> TxBuilder<E> {
    pub fn with_estimator(change_to: ZkAddress, estimator: E) -> Self {
        Self {
            change_to,
            fee_per_byte: U256::zero(),
            spendables: Vec::new(),
            sendings: Vec::new(),
            estimator,
        }
    }

    /// Fee rate in wei per byte
    pub fn weight(&mut self, fee_per_byte: U256) -> &mut Self {
        self.fee_per_byte = fee_per_byte;
        self
    }

    pub fn provide(&mut self, utxo: Utxo) -> &mut Self {
        self.spendables.push(utxo);
        self
    }

    pub fn send_ether(&mut self, eth: U256, to: ZkAddress) -> &mut Self {
        self.send(Utxo::new(Note::new(to, Asset::ether(eth))).into())
    }

    pub fn send_erc20(
        &mut self,
        token: Address,
        amount: U256,
        to: ZkAddress,
    ) -> Result<&mut Self, BuildError> {
        let asset = Asset::erc20(token, amount, U256::zero())?;
        Ok(self.send(Utxo::new(Note::new(to, asset)).into()))
    }

    pub fn send_nft(
        &mut self,
        token: Address,
        id: U256,
        to: ZkAddress,
    ) -> Result<&mut Self, BuildError> {
        let asset = Asset::nft(token, id, U256::zero())?;
        Ok(self.send(Utxo::new(Note::new(to, asset)).into()))
    }

    /// Exit `asset` to `to` on L1; `fee` is paid on top of the byte fee
    pub fn withdraw(&mut self, asset: Asset, to: Address, fee: U256) -> &mut Self {
        self.send(Withdrawal::new(asset, PublicData { to, fee }).into())
    }

    pub fn migrate(&mut self, asset: Asset, to: Address, fee: U256) -> &mut Self {
        self.send(Migration::new(asset, PublicData { to, fee }).into())
    }

    /// Add an arbitrary output
    pub fn send(&mut self, outflow: Outflow) -> &mut Self {
        self.sendings.push(outflow);
        self
    }

    pub fn spendables(&self) -> &[Utxo] {
        &self.spendables
    }

    pub fn sendings(&self) -> &[Outflow] {
        &self.sendings
    }

    /// Select inputs and produce a balanced transaction
    ///
    /// # Panics
    ///
    /// If the selected transaction fails its own balance check. That is a bug in the
    /// selection logic, never a user error.
    pub fn build(&self) -> Result<RawTx, BuildError> {
        self.build_with_swap(None)
    }

    fn build_with_swap(&self, swap: Option<Fr>) -> Result<RawTx, BuildError> {
        let mut available = self.spendables.clone();
        let mut selected: Vec<Utxo> = Vec::new();
        let sending = Sum::from_notes(self.sendings.iter().map(Outflow::note))?;

        for (token, amount) in &sending.erc20 {
            select_erc20(&mut available, &mut selected, *token, *amount)?;
        }
        for (token, ids) in &sending.erc721 {
            select_nfts(&mut available, &mut selected, *token, ids)?;
        }

        let mut outflow = self.sendings.clone();
        outflow.extend(self.token_changes(&selected, &sending)?);

        let l1_fee = checked_l1_fee(&outflow).ok_or(BuildError::Overflow("l1 fee"))?;
        let n_public = outflow
            .iter()
            .filter(|o| o.outflow_type() != OutflowType::Utxo)
            .count();
        // one extra output is reserved for ether change
        let n_outputs = outflow.len() + 1;
        let byte_fee = |n_inputs: usize| {
            let size = self
                .estimator
                .estimate(n_inputs, n_outputs, n_public, swap.is_some(), false);
            self.fee_per_byte
                .checked_mul(U256::from(size))
                .ok_or(BuildError::Overflow("fee"))
        };
        let required_eth = |fee: U256| {
            sending
                .eth
                .checked_add(fee)
                .and_then(|v| v.checked_add(l1_fee))
                .ok_or(BuildError::Overflow("required ether"))
        };

        // ether pool: notes carrying nothing but ether, richest popped first
        let mut pool: Vec<Utxo> = Vec::new();
        available.retain(|utxo| {
            if utxo.asset().is_ether_only() {
                pool.push(utxo.clone());
                false
            } else {
                true
            }
        });
        pool.sort_by(|a, b| a.asset().eth.cmp(&b.asset().eth));

        let mut selected_eth = selected
            .iter()
            .try_fold(U256::zero(), |acc, u| acc.checked_add(u.asset().eth))
            .ok_or(BuildError::Overflow("selected ether"))?;
        let mut fee = byte_fee(selected.len())?;
        let mut required = required_eth(fee)?;

        while selected_eth < required {
            let Some(utxo) = pool.pop() else {
                return Err(BuildError::InsufficientEther {
                    required: Ether(required),
                    available: Ether(selected_eth),
                    deficit: Ether(required - selected_eth),
                });
            };
            selected_eth = selected_eth
                .checked_add(utxo.asset().eth)
                .ok_or(BuildError::Overflow("selected ether"))?;
            selected.push(utxo);
            fee = byte_fee(selected.len())?;
            required = required_eth(fee)?;
        }

        let change_eth = selected_eth - required;
        if !change_eth.is_zero() {
            outflow.push(Utxo::new(Note::new(self.change_to, Asset::ether(change_eth))).into());
        }

        info!(
            inputs = selected.len(),
            outputs = outflow.len(),
            fee = %Ether(fee),
            l1_fee = %Ether(l1_fee),
            change = %Ether(change_eth),
            "built transaction"
        );

        let tx = RawTx {
            inflow: selected,
            outflow,
            swap,
            fee,
        };
        if let Err(err) = tx.verify_balance() {
            panic!("coin selection produced an unbalanced transaction: {err}");
        }
        Ok(tx)
    }

    /// Surplus of the selected token notes, returned to `change_to`
    fn token_changes(&self, selected: &[Utxo], sending: &Sum) -> Result<Vec<Outflow>, BuildError> {
        let picked = Sum::from_notes(selected.iter().map(Utxo::note))?;
        let mut changes = Vec::new();

        for (token, amount) in &picked.erc20 {
            let surplus = amount.saturating_sub(sending.erc20_amount(token));
            if let Ok(asset) = Asset::erc20(*token, surplus, U256::zero()) {
                debug!(%token, %surplus, "erc20 change");
                changes.push(Utxo::new(Note::new(self.change_to, asset)).into());
            }
        }

        for (token, ids) in &picked.erc721 {
            let sent = sending.nft_ids(token);
            for id in ids.iter().filter(|id| !sent.contains(*id)) {
                if let Ok(asset) = Asset::nft(*token, *id, U256::zero()) {
                    debug!(%token, %id, "nft change");
                    changes.push(Utxo::new(Note::new(self.change_to, asset)).into());
                }
            }
        }
        Ok(changes)
    }
}

fn select_erc20(
    available: &mut Vec<Utxo>,
    selected: &mut Vec<Utxo>,
    token: Address,
    amount: U256,
) -> Result<(), BuildError> {
    let (mut candidates, rest): (Vec<Utxo>, Vec<Utxo>) = available
        .drain(..)
        .partition(|u| u.asset().is_erc20() && u.asset().token_addr == token);
    *available = rest;
    candidates.sort_by(|a, b| a.asset().erc20_amount.cmp(&b.asset().erc20_amount));

    let mut acc = U256::zero();
    for utxo in candidates {
        if acc >= amount {
            available.push(utxo);
        } else {
            acc = acc
                .checked_add(utxo.asset().erc20_amount)
                .ok_or(BuildError::Overflow("erc20"))?;
            selected.push(utxo);
        }
    }

    if acc < amount {
        return Err(BuildError::InsufficientErc20 {
            token,
            required: amount,
            available: acc,
            deficit: amount - acc,
        });
    }
    debug!(%token, %amount, selected = %acc, "erc20 selected");
    Ok(())
}

fn select_nfts(
    available: &mut Vec<Utxo>,
    selected: &mut Vec<Utxo>,
    token: Address,
    ids: &[U256],
) -> Result<(), BuildError> {
    let held = available
        .iter()
        .filter(|u| u.asset().is_nft() && u.asset().token_addr == token)
        .count();
    if held < ids.len() {
        return Err(BuildError::NotEnoughNfts {
            token,
            required: ids.len(),
            available: held,
        });
    }

    for id in ids {
        let position = available
            .iter()
            .position(|u| {
                let asset = u.asset();
                asset.is_nft() && asset.token_addr == token && asset.nft == *id
            })
            .ok_or(BuildError::NftNotFound { token, id: *id })?;
        selected.push(available.swap_remove(position));
    }
    Ok(())
}

/// A builder whose transaction also commits to a counterparty note
///
/// The swap value is priced into the fee and carried on the wire, but the asset it
/// refers to is created by the other side and does not enter the local balance.
#[derive(Debug, Clone)]
pub struct SwapTxBuilder<E = WireSize> {
    inner: TxBuilder<E>,
    swap: Fr,
}

impl SwapTxBuilder<WireSize> {
    pub fn new(change_to: ZkAddress, swap: Fr) -> Self {
        Self::with_estimator(change_to, swap, WireSize)
    }
}

impl<E: SizeEstimator> SwapTxBuilder<E> {
    pub fn with_estimator(change_to: ZkAddress, swap: Fr, estimator: E) -> Self {
        Self {
            inner: TxBuilder::with_estimator(change_to, estimator),
            swap,
        }
    }

    pub fn swap(&self) -> Fr {
        self.swap
    }

    pub fn build(&self) -> Result<RawTx, BuildError> {
        self.inner.build_with_swap(Some(self.swap))
    }
}

impl<E> Deref for SwapTxBuilder<E> {
    type Target = TxBuilder<E>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<E> DerefMut for SwapTxBuilder<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

//! Shielded Notes
//!
//! A Note is a confidential unit of value owned by a [`ZkAddress`].
//!
//! ```text
//! first = Poseidon(eth, spending_pub_key, salt, viewing.x, viewing.y)
//! hash  = Poseidon(first, token_addr, erc20_amount, nft)
//! ```
//!
//! Outputs of a transaction come in three kinds. Withdrawals and migrations leave the
//! shielded pool and expose their asset and an L1 destination publicly.

use ark_bn254::Fr;
use primitive_types::U256;
use rand::Rng;

use crate::address::{Address, ZkAddress};
use crate::asset::Asset;
use crate::curve::{self, Scalar};
use crate::error::NoteError;
use crate::field::{fr_to_be_bytes, keccak256, poseidon, u256_to_fr};

/// A shielded note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    owner: ZkAddress,
    salt: Fr,
    asset: Asset,
}

impl Note {
    /// Create a note with a random 128-bit salt
    pub fn new(owner: ZkAddress, asset: Asset) -> Self {
        let salt: u128 = rand::thread_rng().r#gen();
        Self::with_salt(owner, Fr::from(salt), asset)
    }

    /// Create a note with a pinned salt, so two parties can agree on its hash in advance
    pub fn with_salt(owner: ZkAddress, salt: Fr, asset: Asset) -> Self {
        Self { owner, salt, asset }
    }

    pub fn owner(&self) -> &ZkAddress {
        &self.owner
    }

    pub fn salt(&self) -> Fr {
        self.salt
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn eth(&self) -> U256 {
        self.asset.eth
    }

    pub fn hash(&self) -> Fr {
        let viewing = self.owner.viewing_key();
        let first = poseidon(&[
            u256_to_fr(&self.asset.eth),
            self.owner.spending_pub_key(),
            self.salt,
            viewing.x,
            viewing.y,
        ]);
        poseidon(&[
            first,
            self.asset.token_addr.to_fr(),
            u256_to_fr(&self.asset.erc20_amount),
            u256_to_fr(&self.asset.nft),
        ])
    }
}

/// Lifecycle tag; the storage layer owns transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum NoteStatus {
    #[default]
    NonIncluded = 0,
    Unspent = 1,
    Spending = 2,
    Spent = 3,
    WaitingFinalization = 4,
    Withdrawable = 5,
    Transferred = 6,
    Withdrawn = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OutflowType {
    Utxo = 0,
    Withdrawal = 1,
    Migration = 2,
}

impl OutflowType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OutflowType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Utxo),
            1 => Ok(Self::Withdrawal),
            2 => Ok(Self::Migration),
            other => Err(other),
        }
    }
}

/// A spendable (or soon spendable) shielded note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    note: Note,
    status: NoteStatus,
}

impl Utxo {
    pub fn new(note: Note) -> Self {
        Self {
            note,
            status: NoteStatus::NonIncluded,
        }
    }

    pub fn with_status(mut self, status: NoteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    pub fn hash(&self) -> Fr {
        self.note.hash()
    }

    pub fn asset(&self) -> &Asset {
        self.note.asset()
    }

    pub fn owner(&self) -> &ZkAddress {
        self.note.owner()
    }

    /// Nullifier = Poseidon(seed, leaf_index)
    ///
    /// The seed must be the owner's viewing scalar.
    pub fn nullifier(&self, nullifier_seed: &Scalar, leaf_index: u64) -> Result<Fr, NoteError> {
        if curve::mul_base(nullifier_seed) != *self.note.owner.viewing_key() {
            return Err(NoteError::NotOwner);
        }
        Ok(poseidon(&[
            curve::scalar_to_fr(nullifier_seed),
            Fr::from(leaf_index),
        ]))
    }
}

/// Public part of a withdrawal or migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PublicData {
    pub to: Address,
    pub fee: U256,
}

/// A note exiting to L1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    note: Note,
    public_data: PublicData,
    status: NoteStatus,
}

impl Withdrawal {
    pub fn new(asset: Asset, public_data: PublicData) -> Self {
        Self::from_note(Note::new(ZkAddress::null(), asset), public_data)
    }

    pub fn from_note(note: Note, public_data: PublicData) -> Self {
        Self {
            note,
            public_data,
            status: NoteStatus::NonIncluded,
        }
    }

    pub fn with_status(mut self, status: NoteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn public_data(&self) -> &PublicData {
        &self.public_data
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    pub fn hash(&self) -> Fr {
        self.note.hash()
    }

    /// Keccak256 over the packed claim the L1 contract parses
    ///
    /// `note_hash(32) ‖ to(20) ‖ eth(32) ‖ token(20) ‖ erc20_amount(32) ‖ nft(32) ‖ fee(32)`
    pub fn withdrawal_hash(&self) -> [u8; 32] {
        let asset = self.note.asset();
        let mut packed = Vec::with_capacity(200);
        packed.extend_from_slice(&fr_to_be_bytes(&self.note.hash()));
        packed.extend_from_slice(self.public_data.to.as_bytes());
        packed.extend_from_slice(&asset.eth.to_big_endian());
        packed.extend_from_slice(asset.token_addr.as_bytes());
        packed.extend_from_slice(&asset.erc20_amount.to_big_endian());
        packed.extend_from_slice(&asset.nft.to_big_endian());
        packed.extend_from_slice(&self.public_data.fee.to_big_endian());
        keccak256(&packed)
    }
}

/// A note moving to another rollup instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    note: Note,
    public_data: PublicData,
    status: NoteStatus,
}

impl Migration {
    pub fn new(asset: Asset, public_data: PublicData) -> Self {
        Self::from_note(Note::new(ZkAddress::null(), asset), public_data)
    }

    pub fn from_note(note: Note, public_data: PublicData) -> Self {
        Self {
            note,
            public_data,
            status: NoteStatus::NonIncluded,
        }
    }

    pub fn with_status(mut self, status: NoteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn public_data(&self) -> &PublicData {
        &self.public_data
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    pub fn hash(&self) -> Fr {
        self.note.hash()
    }
}

/// A transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outflow {
    Utxo(Utxo),
    Withdrawal(Withdrawal),
    Migration(Migration),
}

impl Outflow {
    pub fn note(&self) -> &Note {
        match self {
            Self::Utxo(utxo) => utxo.note(),
            Self::Withdrawal(withdrawal) => withdrawal.note(),
            Self::Migration(migration) => migration.note(),
        }
    }

    pub fn hash(&self) -> Fr {
        self.note().hash()
    }

    pub fn outflow_type(&self) -> OutflowType {
        match self {
            Self::Utxo(_) => OutflowType::Utxo,
            Self::Withdrawal(_) => OutflowType::Withdrawal,
            Self::Migration(_) => OutflowType::Migration,
        }
    }

    /// Destination and external fee, present only when the note leaves the pool
    pub fn public_data(&self) -> Option<&PublicData> {
        match self {
            Self::Utxo(_) => None,
            Self::Withdrawal(withdrawal) => Some(withdrawal.public_data()),
            Self::Migration(migration) => Some(migration.public_data()),
        }
    }

    /// External fee paid on L1; zero for plain outputs
    pub fn external_fee(&self) -> U256 {
        self.public_data()
            .map(|data| data.fee)
            .unwrap_or_default()
    }
}

impl From<Utxo> for Outflow {
    fn from(utxo: Utxo) -> Self {
        Self::Utxo(utxo)
    }
}

impl From<Withdrawal> for Outflow {
    fn from(withdrawal: Withdrawal) -> Self {
        Self::Withdrawal(withdrawal)
    }
}

impl From<Migration> for Outflow {
    fn from(migration: Migration) -> Self {
        Self::Migration(migration)
    }
}

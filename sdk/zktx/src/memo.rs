//! Transaction memos
//!
//! ```text
//! v1:  encrypted note (81)
//! v2:  selector(4) ‖ body
//!      notes:       chunk(81) ‖ chunk(81) ‖ ...
//!      prepayment:  fee_eth(32) ‖ fee_token(32) ‖ expiration(8) ‖ sig_len(2)
//!                   ‖ signature (zero padded to a multiple of 81) ‖ chunk(81) ‖ ...
//! ```
//!
//! Both v2 kinds accept two selectors: the ABI-style one and a short legacy form.

use primitive_types::U256;
use veil_note::field::keccak256;
use veil_note::{ENCRYPTED_NOTE_LEN, EncryptedNote};

use crate::error::MemoError;

pub const SELECTOR_LEN: usize = 4;

const NOTES_SIGNATURE: &str = "notes(bytes)";
const PREPAY_SIGNATURE: &str = "prepayWithdrawal(uint256,uint256,uint64,bytes)";
const NOTES_LEGACY_SELECTOR: [u8; 4] = [0, 0, 0, 0];
const PREPAY_LEGACY_SELECTOR: [u8; 4] = [0, 0, 0, 1];

fn abi_selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// ABI selector for a plain note batch
pub fn notes_selector() -> [u8; 4] {
    abi_selector(NOTES_SIGNATURE)
}

/// ABI selector for a withdrawal prepayment
pub fn prepayment_selector() -> [u8; 4] {
    abi_selector(PREPAY_SIGNATURE)
}

/// Memo attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Memo {
    V1(EncryptedNote),
    V2(MemoV2),
}

impl Memo {
    /// Bytes the memo occupies on the wire, excluding the switch byte
    pub fn wire_len(&self) -> usize {
        match self {
            Self::V1(_) => ENCRYPTED_NOTE_LEN,
            Self::V2(memo) => 2 + memo.len(),
        }
    }

    pub fn parse(&self) -> Result<ParsedMemo, MemoError> {
        match self {
            Self::V1(note) => Ok(ParsedMemo::Note(*note)),
            Self::V2(memo) => memo.parse(),
        }
    }
}

/// Variable-length memo payload (at most `u16::MAX` bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoV2(Vec<u8>);

impl MemoV2 {
    pub fn new(bytes: Vec<u8>) -> Result<Self, MemoError> {
        if bytes.len() > usize::from(u16::MAX) {
            return Err(MemoError::TooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Payload read behind a u16 length prefix
    pub(crate) fn from_wire(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Plain batch of encrypted notes
    pub fn notes(chunks: &[EncryptedNote]) -> Result<Self, MemoError> {
        let mut bytes = Vec::with_capacity(SELECTOR_LEN + chunks.len() * ENCRYPTED_NOTE_LEN);
        bytes.extend_from_slice(&notes_selector());
        for chunk in chunks {
            bytes.extend_from_slice(chunk);
        }
        Self::new(bytes)
    }

    pub fn prepayment(record: &Prepayment) -> Result<Self, MemoError> {
        let sig_len = u16::try_from(record.signature.len())
            .map_err(|_| MemoError::SignatureTooLong(record.signature.len()))?;
        let padded = padded_len(record.signature.len());

        let mut bytes = Vec::with_capacity(
            SELECTOR_LEN + 74 + padded + record.notes.len() * ENCRYPTED_NOTE_LEN,
        );
        bytes.extend_from_slice(&prepayment_selector());
        bytes.extend_from_slice(&record.prepay_fee_in_eth.to_big_endian());
        bytes.extend_from_slice(&record.prepay_fee_in_token.to_big_endian());
        bytes.extend_from_slice(&record.expiration.to_be_bytes());
        bytes.extend_from_slice(&sig_len.to_be_bytes());
        bytes.extend_from_slice(&record.signature);
        bytes.resize(bytes.len() + padded - record.signature.len(), 0);
        for chunk in &record.notes {
            bytes.extend_from_slice(chunk);
        }
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parse(&self) -> Result<ParsedMemo, MemoError> {
        if self.0.len() < SELECTOR_LEN {
            return Err(MemoError::TooShort(self.0.len()));
        }
        let (head, body) = self.0.split_at(SELECTOR_LEN);
        let selector = [head[0], head[1], head[2], head[3]];

        if selector == notes_selector() || selector == NOTES_LEGACY_SELECTOR {
            Ok(ParsedMemo::Notes(split_chunks(body)?))
        } else if selector == prepayment_selector() || selector == PREPAY_LEGACY_SELECTOR {
            parse_prepayment(body).map(ParsedMemo::Prepayment)
        } else {
            Err(MemoError::UnknownSelector(selector))
        }
    }
}

/// Decoded memo contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMemo {
    /// v1: one encrypted note
    Note(EncryptedNote),
    Notes(Vec<EncryptedNote>),
    Prepayment(Prepayment),
}

impl ParsedMemo {
    /// Every encrypted note carried by the memo
    pub fn encrypted_notes(&self) -> Vec<EncryptedNote> {
        match self {
            Self::Note(note) => vec![*note],
            Self::Notes(notes) => notes.clone(),
            Self::Prepayment(record) => record.notes.clone(),
        }
    }
}

/// Offer to a relayer to front a withdrawal before it finalizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepayment {
    pub prepay_fee_in_eth: U256,
    pub prepay_fee_in_token: U256,
    /// Unix seconds
    pub expiration: u64,
    pub signature: Vec<u8>,
    pub notes: Vec<EncryptedNote>,
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(ENCRYPTED_NOTE_LEN) * ENCRYPTED_NOTE_LEN
}

fn split_chunks(body: &[u8]) -> Result<Vec<EncryptedNote>, MemoError> {
    if body.len() % ENCRYPTED_NOTE_LEN != 0 {
        return Err(MemoError::ChunkLength(body.len()));
    }
    Ok(body
        .chunks_exact(ENCRYPTED_NOTE_LEN)
        .map(|chunk| {
            let mut note = [0u8; ENCRYPTED_NOTE_LEN];
            note.copy_from_slice(chunk);
            note
        })
        .collect())
}

fn parse_prepayment(body: &[u8]) -> Result<Prepayment, MemoError> {
    const FIXED: usize = 32 + 32 + 8 + 2;
    if body.len() < FIXED {
        return Err(MemoError::TooShort(SELECTOR_LEN + body.len()));
    }

    let prepay_fee_in_eth = U256::from_big_endian(&body[..32]);
    let prepay_fee_in_token = U256::from_big_endian(&body[32..64]);
    let mut expiration = [0u8; 8];
    expiration.copy_from_slice(&body[64..72]);
    let sig_len = usize::from(u16::from_be_bytes([body[72], body[73]]));

    let rest = &body[FIXED..];
    let padded = padded_len(sig_len);
    if rest.len() < padded {
        return Err(MemoError::TooShort(SELECTOR_LEN + body.len()));
    }
    let (sig_field, notes) = rest.split_at(padded);
    if sig_field[sig_len..].iter().any(|b| *b != 0) {
        return Err(MemoError::Padding);
    }

    Ok(Prepayment {
        prepay_fee_in_eth,
        prepay_fee_in_token,
        expiration: u64::from_be_bytes(expiration),
        signature: sig_field[..sig_len].to_vec(),
        notes: split_chunks(notes)?,
    })
}

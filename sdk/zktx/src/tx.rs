//! Proved transaction
//!
//! ```text
//! inflow_count(1)  { root(32) nullifier(32) }*
//! outflow_count(1) { note(32) type(1) [to(20) eth(32) token(20) amount(32) nft(32) fee(32)] }*
//! fee(32)  proof(256)  switch(1)  [swap(32)]  [memo v1(81) | len(2) memo v2]
//! ```

use std::sync::OnceLock;

use ark_bn254::Fr;
use primitive_types::U256;
use veil_note::field::keccak256;
use veil_note::{
    Address, ENCRYPTED_NOTE_LEN, Note, Outflow, OutflowType, ZkViewer, try_decrypt_note,
};

use crate::codec::{Reader, put_fr, put_u256};
use crate::error::{DecodeError, EncodeError, MemoError};
use crate::memo::{Memo, MemoV2, ParsedMemo};
use crate::proof::{PROOF_LEN, SnarkProof};

const SWITCH_SWAP: u8 = 0b001;
const SWITCH_MEMO_V1: u8 = 0b010;
const SWITCH_MEMO_V2: u8 = 0b100;

/// Bytes of public data attached to a withdrawal or migration outflow
pub const PUBLIC_DATA_LEN: usize = 20 + 32 + 20 + 32 + 32 + 32;

/// Encoded size of a transaction with the given shape and a v1 memo when `has_memo`
pub fn estimate_size(
    n_inputs: usize,
    n_outputs: usize,
    n_public_outflows: usize,
    has_swap: bool,
    has_memo: bool,
) -> usize {
    let mut size = 1 + n_inputs * 64 + 1 + n_outputs * 33 + n_public_outflows * PUBLIC_DATA_LEN;
    size += 32 + PROOF_LEN + 1;
    if has_swap {
        size += 32;
    }
    if has_memo {
        size += ENCRYPTED_NOTE_LEN;
    }
    size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZkInflow {
    pub nullifier: Fr,
    pub root: Fr,
}

/// Asset and destination exposed by an outflow leaving the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicOutflowData {
    pub to: Address,
    pub eth: U256,
    pub token_addr: Address,
    pub erc20_amount: U256,
    pub nft: U256,
    pub fee: U256,
}

impl PublicOutflowData {
    /// Public view of an outflow; `None` for plain outputs
    pub fn from_outflow(outflow: &Outflow) -> Option<Self> {
        let data = outflow.public_data()?;
        let asset = outflow.note().asset();
        Some(Self {
            to: data.to,
            eth: asset.eth,
            token_addr: asset.token_addr,
            erc20_amount: asset.erc20_amount,
            nft: asset.nft,
            fee: data.fee,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.to.as_bytes());
        put_u256(out, &self.eth);
        out.extend_from_slice(self.token_addr.as_bytes());
        put_u256(out, &self.erc20_amount);
        put_u256(out, &self.nft);
        put_u256(out, &self.fee);
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            to: reader.address()?,
            eth: reader.u256()?,
            token_addr: reader.address()?,
            erc20_amount: reader.u256()?,
            nft: reader.u256()?,
            fee: reader.u256()?,
        })
    }
}

/// Public view of an output
///
/// `data` is present exactly when `outflow_type` is not [`OutflowType::Utxo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZkOutflow {
    pub note: Fr,
    pub outflow_type: OutflowType,
    pub data: Option<PublicOutflowData>,
}

impl ZkOutflow {
    fn is_consistent(&self) -> bool {
        (self.outflow_type == OutflowType::Utxo) == self.data.is_none()
    }
}

impl From<&Outflow> for ZkOutflow {
    fn from(outflow: &Outflow) -> Self {
        Self {
            note: outflow.hash(),
            outflow_type: outflow.outflow_type(),
            data: PublicOutflowData::from_outflow(outflow),
        }
    }
}

/// A proved, wire-ready transaction
#[derive(Debug, Clone)]
pub struct ZkTx {
    inflow: Vec<ZkInflow>,
    outflow: Vec<ZkOutflow>,
    fee: U256,
    proof: SnarkProof,
    swap: Option<Fr>,
    memo: Option<Memo>,
    size: OnceLock<usize>,
    hash: OnceLock<[u8; 32]>,
}

impl ZkTx {
    pub fn new(
        inflow: Vec<ZkInflow>,
        outflow: Vec<ZkOutflow>,
        fee: U256,
        proof: SnarkProof,
        swap: Option<Fr>,
        memo: Option<Memo>,
    ) -> Result<Self, EncodeError> {
        if inflow.len() > usize::from(u8::MAX) {
            return Err(EncodeError::TooManyInflows(inflow.len()));
        }
        if outflow.len() > usize::from(u8::MAX) {
            return Err(EncodeError::TooManyOutflows(outflow.len()));
        }
        if let Some(index) = outflow.iter().position(|o| !o.is_consistent()) {
            return Err(EncodeError::OutflowData(index));
        }
        Ok(Self {
            inflow,
            outflow,
            fee,
            proof,
            swap,
            memo,
            size: OnceLock::new(),
            hash: OnceLock::new(),
        })
    }

    pub fn inflow(&self) -> &[ZkInflow] {
        &self.inflow
    }

    pub fn outflow(&self) -> &[ZkOutflow] {
        &self.outflow
    }

    pub fn fee(&self) -> U256 {
        self.fee
    }

    pub fn proof(&self) -> &SnarkProof {
        &self.proof
    }

    pub fn swap(&self) -> Option<Fr> {
        self.swap
    }

    pub fn memo(&self) -> Option<&Memo> {
        self.memo.as_ref()
    }

    fn switch(&self) -> u8 {
        let mut switch = 0;
        if self.swap.is_some() {
            switch |= SWITCH_SWAP;
        }
        match self.memo {
            Some(Memo::V1(_)) => switch |= SWITCH_MEMO_V1,
            Some(Memo::V2(_)) => switch |= SWITCH_MEMO_V2,
            None => {}
        }
        switch
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());

        // counts are bounded by the constructor
        out.push(self.inflow.len() as u8);
        for inflow in &self.inflow {
            put_fr(&mut out, &inflow.root);
            put_fr(&mut out, &inflow.nullifier);
        }

        out.push(self.outflow.len() as u8);
        for outflow in &self.outflow {
            put_fr(&mut out, &outflow.note);
            out.push(outflow.outflow_type.as_u8());
            if let Some(data) = &outflow.data {
                data.write(&mut out);
            }
        }

        put_u256(&mut out, &self.fee);
        self.proof.write(&mut out);
        out.push(self.switch());

        if let Some(swap) = &self.swap {
            put_fr(&mut out, swap);
        }
        match &self.memo {
            Some(Memo::V1(note)) => out.extend_from_slice(note),
            Some(Memo::V2(memo)) => {
                // MemoV2 length fits in u16
                out.extend_from_slice(&(memo.len() as u16).to_be_bytes());
                out.extend_from_slice(memo.as_bytes());
            }
            None => {}
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        let n_inflow = reader.u8()?;
        let mut inflow = Vec::with_capacity(usize::from(n_inflow));
        for _ in 0..n_inflow {
            let root = reader.fr()?;
            let nullifier = reader.fr()?;
            inflow.push(ZkInflow { nullifier, root });
        }

        let n_outflow = reader.u8()?;
        let mut outflow = Vec::with_capacity(usize::from(n_outflow));
        for _ in 0..n_outflow {
            let note = reader.fr()?;
            let offset = reader.offset();
            let raw_type = reader.u8()?;
            let outflow_type = OutflowType::try_from(raw_type).map_err(|value| {
                DecodeError::UnknownOutflowType { offset, value }
            })?;
            let data = match outflow_type {
                OutflowType::Utxo => None,
                OutflowType::Withdrawal | OutflowType::Migration => {
                    Some(PublicOutflowData::read(&mut reader)?)
                }
            };
            outflow.push(ZkOutflow {
                note,
                outflow_type,
                data,
            });
        }

        let fee = reader.u256()?;
        let proof = SnarkProof::read(&mut reader)?;

        let switch = reader.u8()?;
        if switch & !(SWITCH_SWAP | SWITCH_MEMO_V1 | SWITCH_MEMO_V2) != 0
            || switch & (SWITCH_MEMO_V1 | SWITCH_MEMO_V2) == (SWITCH_MEMO_V1 | SWITCH_MEMO_V2)
        {
            return Err(DecodeError::UnknownSwitchBits(switch));
        }

        let swap = if switch & SWITCH_SWAP != 0 {
            Some(reader.fr()?)
        } else {
            None
        };

        let memo = if switch & SWITCH_MEMO_V1 != 0 {
            Some(Memo::V1(reader.array::<ENCRYPTED_NOTE_LEN>()?))
        } else if switch & SWITCH_MEMO_V2 != 0 {
            let len = reader.u16()?;
            Some(Memo::V2(MemoV2::from_wire(reader.vec(usize::from(len))?)))
        } else {
            None
        };

        reader.finish()?;

        Ok(Self {
            inflow,
            outflow,
            fee,
            proof,
            swap,
            memo,
            size: OnceLock::new(),
            hash: OnceLock::new(),
        })
    }

    /// Encoded length in bytes (cached)
    pub fn size(&self) -> usize {
        *self.size.get_or_init(|| {
            let n_public = self
                .outflow
                .iter()
                .filter(|o| o.outflow_type != OutflowType::Utxo)
                .count();
            let base = estimate_size(
                self.inflow.len(),
                self.outflow.len(),
                n_public,
                self.swap.is_some(),
                false,
            );
            base + self.memo.as_ref().map(Memo::wire_len).unwrap_or(0)
        })
    }

    /// Keccak256 identity of the transaction (cached)
    ///
    /// Memo bytes are not covered.
    pub fn hash(&self) -> [u8; 32] {
        *self.hash.get_or_init(|| {
            let mut packed = Vec::with_capacity(self.size());
            for inflow in &self.inflow {
                put_fr(&mut packed, &inflow.root);
                put_fr(&mut packed, &inflow.nullifier);
            }
            for outflow in &self.outflow {
                put_fr(&mut packed, &outflow.note);
                if let Some(data) = &outflow.data {
                    data.write(&mut packed);
                }
            }
            put_fr(&mut packed, &self.swap.unwrap_or_default());
            for coordinate in self.proof.coordinates() {
                put_u256(&mut packed, &coordinate);
            }
            put_u256(&mut packed, &self.fee);
            keccak256(&packed)
        })
    }

    pub fn parse_memo(&self) -> Result<Option<ParsedMemo>, MemoError> {
        self.memo.as_ref().map(Memo::parse).transpose()
    }

    /// Notes in the memo that `viewer` can open and that match one of this transaction's
    /// outputs
    pub fn decrypt_notes(&self, viewer: &ZkViewer, tokens: &[Address]) -> Vec<Note> {
        let Ok(Some(parsed)) = self.parse_memo() else {
            return Vec::new();
        };
        let expected: Vec<Fr> = self.outflow.iter().map(|o| o.note).collect();
        parsed
            .encrypted_notes()
            .iter()
            .filter_map(|cipher| try_decrypt_note(cipher, viewer, tokens, &expected))
            .collect()
    }
}

impl PartialEq for ZkTx {
    fn eq(&self, other: &Self) -> bool {
        self.inflow == other.inflow
            && self.outflow == other.outflow
            && self.fee == other.fee
            && self.proof == other.proof
            && self.swap == other.swap
            && self.memo == other.memo
    }
}

impl Eq for ZkTx {}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> SnarkProof {
        SnarkProof {
            pi_a: [U256::from(1u64), U256::from(2u64)],
            pi_b: [
                [U256::from(3u64), U256::from(4u64)],
                [U256::from(5u64), U256::from(6u64)],
            ],
            pi_c: [U256::from(7u64), U256::from(8u64)],
        }
    }

    fn sample(swap: Option<Fr>, memo: Option<Memo>) -> ZkTx {
        ZkTx::new(
            vec![ZkInflow {
                nullifier: Fr::from(11u64),
                root: Fr::from(12u64),
            }],
            vec![
                ZkOutflow {
                    note: Fr::from(21u64),
                    outflow_type: OutflowType::Utxo,
                    data: None,
                },
                ZkOutflow {
                    note: Fr::from(22u64),
                    outflow_type: OutflowType::Withdrawal,
                    data: Some(PublicOutflowData {
                        to: Address([7; 20]),
                        eth: U256::from(100u64),
                        fee: U256::from(3u64),
                        ..Default::default()
                    }),
                },
            ],
            U256::from(1_000u64),
            proof(),
            swap,
            memo,
        )
        .unwrap()
    }

    #[test]
    fn test_size_matches_encoding() {
        let cases = [
            sample(None, None),
            sample(Some(Fr::from(5u64)), None),
            sample(None, Some(Memo::V1([9u8; ENCRYPTED_NOTE_LEN]))),
            sample(
                Some(Fr::from(5u64)),
                Some(Memo::V2(MemoV2::notes(&[[1u8; 81]]).unwrap())),
            ),
        ];
        for tx in cases {
            assert_eq!(tx.size(), tx.encode().len());
        }
    }

    #[test]
    fn test_estimate_size_shape() {
        assert_eq!(estimate_size(0, 0, 0, false, false), 1 + 1 + 32 + 256 + 1);
        assert_eq!(
            estimate_size(2, 3, 1, true, true),
            1 + 128 + 1 + 99 + 168 + 32 + 256 + 1 + 32 + 81
        );
    }

    #[test]
    fn test_switch_bits() {
        let tx = sample(Some(Fr::from(1u64)), Some(Memo::V1([0u8; 81])));
        let bytes = tx.encode();
        let switch_offset = 1 + 64 + 1 + 33 + 33 + PUBLIC_DATA_LEN + 32 + PROOF_LEN;
        assert_eq!(bytes[switch_offset], SWITCH_SWAP | SWITCH_MEMO_V1);
    }

    #[test]
    fn test_rejects_both_memo_versions() {
        let mut bytes = sample(None, None).encode();
        let last = bytes.len() - 1;
        bytes[last] = SWITCH_MEMO_V1 | SWITCH_MEMO_V2;
        assert_eq!(
            ZkTx::decode(&bytes),
            Err(DecodeError::UnknownSwitchBits(0b110))
        );
    }

    #[test]
    fn test_rejects_unknown_outflow_type() {
        let mut bytes = sample(None, None).encode();
        let type_offset = 1 + 64 + 1 + 32;
        bytes[type_offset] = 3;
        assert_eq!(
            ZkTx::decode(&bytes),
            Err(DecodeError::UnknownOutflowType {
                offset: type_offset,
                value: 3
            })
        );
    }

    #[test]
    fn test_hash_cached_and_ignores_memo() {
        let plain = sample(None, None);
        let with_memo = sample(None, Some(Memo::V1([4u8; 81])));
        assert_eq!(plain.hash(), plain.hash());
        assert_eq!(plain.hash(), with_memo.hash());
        assert_ne!(plain.hash(), sample(Some(Fr::from(1u64)), None).hash());
    }

    #[test]
    fn test_hash_depends_on_public_data() {
        let a = sample(None, None);
        let mut outflow = a.outflow().to_vec();
        if let Some(data) = outflow[1].data.as_mut() {
            data.fee = U256::from(4u64);
        }
        let b = ZkTx::new(a.inflow().to_vec(), outflow, a.fee(), proof(), None, None).unwrap();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_rejects_mismatched_public_data() {
        let a = sample(None, None);
        let data = a.outflow()[1].data;

        // plain output carrying withdrawal data
        let mut outflow = a.outflow().to_vec();
        outflow[0].data = data;
        assert_eq!(
            ZkTx::new(a.inflow().to_vec(), outflow, a.fee(), proof(), None, None).unwrap_err(),
            EncodeError::OutflowData(0)
        );

        // withdrawal without its public data
        let mut outflow = a.outflow().to_vec();
        outflow[1].data = None;
        assert_eq!(
            ZkTx::new(a.inflow().to_vec(), outflow, a.fee(), proof(), None, None).unwrap_err(),
            EncodeError::OutflowData(1)
        );

        // migration carries data just like a withdrawal
        let mut outflow = a.outflow().to_vec();
        outflow[1].outflow_type = OutflowType::Migration;
        let tx = ZkTx::new(a.inflow().to_vec(), outflow, a.fee(), proof(), None, None).unwrap();
        assert_eq!(ZkTx::decode(&tx.encode()).unwrap(), tx);
    }

    #[test]
    fn test_rejects_too_many_inflows() {
        let inflow = vec![
            ZkInflow {
                nullifier: Fr::from(1u64),
                root: Fr::from(1u64),
            };
            256
        ];
        assert_eq!(
            ZkTx::new(inflow, vec![], U256::zero(), proof(), None, None).err(),
            Some(EncodeError::TooManyInflows(256))
        );
    }
}

//! Circuit witness
//!
//! Every signal is a decimal string, the format snarkjs reads from `input.json`.
//! Per-input and per-output signals are parallel arrays indexed by position.

use ark_bn254::Fr;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use veil_note::curve::scalar_to_fr;
use veil_note::field::fr_to_decimal;
use veil_note::{Address, Asset, NoteError, Outflow, Utxo, ZkAccount};
use veil_txbuilder::RawTx;
use veil_zktx::{PublicOutflowData, ZkInflow};

use crate::merkle::MerkleProof;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Witness {
    // spent notes (private)
    pub spending_note_eddsa_point: Vec<[String; 2]>,
    pub spending_note_eddsa_sig: Vec<[String; 3]>,
    pub spending_note_nullifier_seed: Vec<String>,
    pub spending_note_salt: Vec<String>,
    pub spending_note_eth: Vec<String>,
    pub spending_note_token_addr: Vec<String>,
    pub spending_note_erc20: Vec<String>,
    pub spending_note_erc721: Vec<String>,
    pub note_index: Vec<String>,
    pub siblings: Vec<Vec<String>>,
    // spent notes (public)
    pub inclusion_references: Vec<String>,
    pub nullifiers: Vec<String>,

    // new notes (private)
    pub new_note_spending_pub_key: Vec<String>,
    pub new_note_viewing_key: Vec<[String; 2]>,
    pub new_note_salt: Vec<String>,
    pub new_note_eth: Vec<String>,
    pub new_note_token_addr: Vec<String>,
    pub new_note_erc20: Vec<String>,
    pub new_note_erc721: Vec<String>,
    // new notes (public)
    pub new_note_hash: Vec<String>,
    pub typeof_new_note: Vec<String>,
    pub public_data_to: Vec<String>,
    pub public_data_eth: Vec<String>,
    pub public_data_token_addr: Vec<String>,
    pub public_data_erc20: Vec<String>,
    pub public_data_erc721: Vec<String>,
    pub public_data_fee: Vec<String>,

    pub fee: String,
    pub swap: String,
}

fn address(addr: &Address) -> String {
    fr_to_decimal(&addr.to_fr())
}

fn amount(value: &U256) -> String {
    value.to_string()
}

impl Witness {
    /// Build the witness for `raw` signed by `account`
    ///
    /// `proofs[i]` must be the inclusion proof of `raw.inflow[i]`. Also returns the public
    /// view of each input, in the same order. Fails with [`NoteError::NotOwner`] if an
    /// input does not belong to `account`.
    pub fn build(
        account: &ZkAccount,
        raw: &RawTx,
        proofs: &[MerkleProof],
    ) -> Result<(Self, Vec<ZkInflow>), NoteError> {
        let mut witness = Self {
            fee: amount(&raw.fee),
            swap: fr_to_decimal(&raw.swap.unwrap_or_default()),
            ..Self::default()
        };
        let mut inflow = Vec::with_capacity(raw.inflow.len());

        for (utxo, proof) in raw.inflow.iter().zip(proofs) {
            let nullifier = utxo.nullifier(&account.nullifier_seed(), proof.index)?;
            witness.push_input(account, utxo, proof, nullifier);
            inflow.push(ZkInflow {
                nullifier,
                root: proof.root,
            });
        }

        for outflow in &raw.outflow {
            witness.push_output(outflow);
        }

        Ok((witness, inflow))
    }

    fn push_input(&mut self, account: &ZkAccount, utxo: &Utxo, proof: &MerkleProof, nullifier: Fr) {
        let pub_key = account.eddsa_pub_key();
        self.spending_note_eddsa_point
            .push([fr_to_decimal(&pub_key.x), fr_to_decimal(&pub_key.y)]);
        self.spending_note_nullifier_seed
            .push(fr_to_decimal(&scalar_to_fr(&account.nullifier_seed())));

        let note = utxo.note();
        let sig = account.sign(&note.hash());
        self.spending_note_eddsa_sig.push([
            fr_to_decimal(&sig.r8.x),
            fr_to_decimal(&sig.r8.y),
            fr_to_decimal(&scalar_to_fr(&sig.s)),
        ]);
        self.spending_note_salt.push(fr_to_decimal(&note.salt()));

        let asset = note.asset();
        self.spending_note_eth.push(amount(&asset.eth));
        self.spending_note_token_addr.push(address(&asset.token_addr));
        self.spending_note_erc20.push(amount(&asset.erc20_amount));
        self.spending_note_erc721.push(amount(&asset.nft));

        self.note_index.push(proof.index.to_string());
        self.siblings.push(proof.siblings.iter().map(fr_to_decimal).collect());
        self.inclusion_references.push(fr_to_decimal(&proof.root));
        self.nullifiers.push(fr_to_decimal(&nullifier));
    }

    fn push_output(&mut self, outflow: &Outflow) {
        let note = outflow.note();
        let owner = note.owner();
        self.new_note_spending_pub_key.push(fr_to_decimal(&owner.spending_pub_key()));
        let viewing_key = owner.viewing_key();
        self.new_note_viewing_key
            .push([fr_to_decimal(&viewing_key.x), fr_to_decimal(&viewing_key.y)]);
        self.new_note_salt.push(fr_to_decimal(&note.salt()));

        let Asset {
            eth,
            token_addr,
            erc20_amount,
            nft,
        } = note.asset();
        self.new_note_eth.push(amount(eth));
        self.new_note_token_addr.push(address(token_addr));
        self.new_note_erc20.push(amount(erc20_amount));
        self.new_note_erc721.push(amount(nft));

        self.new_note_hash.push(fr_to_decimal(&outflow.hash()));
        self.typeof_new_note
            .push(outflow.outflow_type().as_u8().to_string());

        // Plain outputs expose nothing: all public fields are zero
        let data = PublicOutflowData::from_outflow(outflow).unwrap_or_default();
        self.public_data_to.push(address(&data.to));
        self.public_data_eth.push(amount(&data.eth));
        self.public_data_token_addr.push(address(&data.token_addr));
        self.public_data_erc20.push(amount(&data.erc20_amount));
        self.public_data_erc721.push(amount(&data.nft));
        self.public_data_fee.push(amount(&data.fee));
    }

    pub fn n_inputs(&self) -> usize {
        self.nullifiers.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.new_note_hash.len()
    }

    /// Public inputs in the order the circuit declares them
    pub fn public_signals(&self) -> Vec<String> {
        let groups: [&[String]; 10] = [
            &self.inclusion_references,
            &self.nullifiers,
            &self.new_note_hash,
            &self.typeof_new_note,
            &self.public_data_to,
            &self.public_data_eth,
            &self.public_data_token_addr,
            &self.public_data_erc20,
            &self.public_data_erc721,
            &self.public_data_fee,
        ];
        let mut signals: Vec<String> = groups.iter().flat_map(|g| g.iter().cloned()).collect();
        signals.push(self.fee.clone());
        signals.push(self.swap.clone());
        signals
    }
}

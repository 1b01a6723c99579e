use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use veil_config::VeilConfig;
use veil_note::{Address, ZkAccount, encrypt_note_for};
use veil_txbuilder::RawTx;
use veil_zktx::{Memo, ZkOutflow, ZkTx};

use crate::backend::{ProvingBackend, backend_from_config};
use crate::error::WizardError;
use crate::keys::CircuitKeyCache;
use crate::merkle::MerkleProofSource;
use crate::task::{ProofOutcome, ProofTask};
use crate::witness::Witness;

/// Turns a balanced [`RawTx`] into a proved [`ZkTx`]
///
/// ```text
/// RawTx ──► merkle proofs (concurrent) ──► witness ──► keys ──► ProofTask ──► ZkTx
/// ```
pub struct ZkWizard<M> {
    merkle: M,
    keys: CircuitKeyCache,
    backend: Arc<dyn ProvingBackend>,
    account: ZkAccount,
    tokens: Vec<Address>,
}

impl<M: MerkleProofSource> ZkWizard<M> {
    pub fn new(
        merkle: M,
        keys: CircuitKeyCache,
        backend: Arc<dyn ProvingBackend>,
        account: ZkAccount,
    ) -> Self {
        Self {
            merkle,
            keys,
            backend,
            account,
            tokens: Vec::new(),
        }
    }

    /// Key cache and backend from `[circuits]` and `[prover]`
    pub fn from_config(merkle: M, account: ZkAccount, config: &VeilConfig) -> Result<Self, WizardError> {
        let keys = CircuitKeyCache::from_config(&config.circuits)?;
        Ok(Self::new(merkle, keys, backend_from_config(&config.prover), account))
    }

    /// Tokens that memo encryption can refer to
    pub fn with_tokens(mut self, tokens: Vec<Address>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn account(&self) -> &ZkAccount {
        &self.account
    }

    pub fn merkle(&self) -> &M {
        &self.merkle
    }

    /// Prove `raw`, optionally attaching output `encrypt_to` as an encrypted memo
    ///
    /// Any failure aborts the whole call; nothing is returned for a partially proved tx.
    pub async fn shield(&self, raw: &RawTx, encrypt_to: Option<usize>) -> Result<ZkTx, WizardError> {
        let n_in = raw.inflow.len();
        let n_out = raw.outflow.len();
        info!(inputs = n_in, outputs = n_out, fee = %raw.fee, "Shielding transaction");

        let proofs = try_join_all(raw.inflow.iter().map(|utxo| self.merkle.merkle_proof(utxo.hash()))).await?;
        debug!("Fetched {} inclusion proofs", proofs.len());

        let (witness, inflow) = Witness::build(&self.account, raw, &proofs)?;

        let memo = match encrypt_to {
            Some(index) => {
                let outflow = raw.outflow.get(index).ok_or(WizardError::NoSuchOutput(index))?;
                Some(Memo::V1(encrypt_note_for(outflow.note(), &self.tokens)?))
            }
            None => None,
        };

        let keys = self.keys.key_paths(n_in, n_out).await?;
        let expected = witness.public_signals();

        let proved = match ProofTask::submit(self.backend.clone(), witness, keys).join().await {
            ProofOutcome::Proved(proved) => proved,
            ProofOutcome::Failed(e) => {
                warn!(error = %e, "Proof generation failed");
                return Err(WizardError::Prover(e));
            }
        };
        check_signals(&expected, &proved.public_signals)?;

        let outflow = raw.outflow.iter().map(ZkOutflow::from).collect();
        let tx = ZkTx::new(inflow, outflow, raw.fee, proved.proof, raw.swap, memo)?;
        info!(size = tx.size(), hash = %hex::encode(tx.hash()), "Transaction shielded");
        Ok(tx)
    }

    /// Release the key cache's scratch directory
    pub fn teardown(self) -> Result<(), WizardError> {
        Ok(self.keys.teardown()?)
    }
}

fn check_signals(expected: &[String], got: &[String]) -> Result<(), WizardError> {
    const MISSING: &str = "<missing>";
    for index in 0..expected.len().max(got.len()) {
        let (e, g) = (expected.get(index), got.get(index));
        if e != g {
            return Err(WizardError::SignalMismatch {
                index,
                expected: e.map_or(MISSING, String::as_str).to_string(),
                got: g.map_or(MISSING, String::as_str).to_string(),
            });
        }
    }
    Ok(())
}

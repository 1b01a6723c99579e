use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use crate::backend::{ProvedSignals, ProvingBackend};
use crate::keys::KeyPaths;
use crate::witness::Witness;

/// Result of a single proving job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    Proved(ProvedSignals),
    Failed(String),
}

/// One proving job on the blocking pool
///
/// There is no cancellation: once submitted, the job runs until the backend returns.
pub struct ProofTask {
    handle: JoinHandle<Result<ProvedSignals, String>>,
}

impl ProofTask {
    pub fn submit(backend: Arc<dyn ProvingBackend>, witness: Witness, keys: KeyPaths) -> Self {
        let handle = tokio::task::spawn_blocking(move || backend.prove(&witness, &keys));
        Self { handle }
    }

    /// Wait for the single outcome. A panicking backend reports `Failed`.
    pub async fn join(self) -> ProofOutcome {
        match self.handle.await {
            Ok(Ok(proved)) => ProofOutcome::Proved(proved),
            Ok(Err(e)) => ProofOutcome::Failed(e),
            Err(e) => {
                error!(error = %e, "prover task panicked");
                ProofOutcome::Failed(format!("prover task panicked: {e}"))
            }
        }
    }
}

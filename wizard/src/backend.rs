//! Proving backends
//!
//! Backends are synchronous; [`ProofTask`](crate::ProofTask) moves them off the async
//! runtime. The command backend runs the prover as a separate OS process.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use primitive_types::U256;
use serde::Deserialize;
use tracing::{debug, error, info};
use veil_config::{ProverConfig, ProverMode};
use veil_zktx::SnarkProof;

use crate::keys::KeyPaths;
use crate::witness::Witness;

/// A proof plus the public signals the prover committed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvedSignals {
    pub proof: SnarkProof,
    pub public_signals: Vec<String>,
}

pub trait ProvingBackend: Send + Sync {
    /// Prove `witness` with the given key material. The proof must already be verified.
    fn prove(&self, witness: &Witness, keys: &KeyPaths) -> Result<ProvedSignals, String>;
}

/// Select a backend from `[prover]` settings
pub fn backend_from_config(config: &ProverConfig) -> Arc<dyn ProvingBackend> {
    match config.mode {
        ProverMode::Mock => Arc::new(MockBackend),
        ProverMode::Command => Arc::new(CommandBackend {
            binary: PathBuf::from(&config.binary),
            timeout: config.proof_timeout_secs.map(Duration::from_secs),
        }),
    }
}

// ============================================================================
// snarkjs
// ============================================================================

/// Runs a snarkjs-compatible CLI: `groth16 fullprove`, then `groth16 verify`
#[derive(Debug, Clone)]
pub struct CommandBackend {
    pub binary: PathBuf,
    pub timeout: Option<Duration>,
}

#[derive(Deserialize)]
struct SnarkjsProof {
    pi_a: Vec<String>,
    pi_b: Vec<Vec<String>>,
    pi_c: Vec<String>,
}

impl SnarkjsProof {
    fn into_proof(self) -> Result<SnarkProof, String> {
        let coord = |v: Option<&String>| -> Result<U256, String> {
            let s = v.ok_or("proof.json is missing a coordinate")?;
            U256::from_dec_str(s).map_err(|e| format!("bad proof coordinate {s}: {e:?}"))
        };
        let pair = |v: &[String]| -> Result<[U256; 2], String> { Ok([coord(v.first())?, coord(v.get(1))?]) };
        let row = |i: usize| -> Result<[U256; 2], String> {
            pair(&self.pi_b.get(i).ok_or("proof.json is missing a pi_b row")?[..])
        };
        Ok(SnarkProof {
            pi_a: pair(&self.pi_a[..])?,
            pi_b: [row(0)?, row(1)?],
            pi_c: pair(&self.pi_c[..])?,
        })
    }
}

impl CommandBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    fn run(&self, args: &[&Path]) -> Result<(), String> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", self.binary.display()))?;

        // Pipes are read while waiting so a chatty prover never blocks on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => {
                let started = Instant::now();
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break status,
                        Ok(None) if started.elapsed() >= timeout => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(format!("prover timed out after {}s", timeout.as_secs()));
                        }
                        Ok(None) => thread::sleep(Duration::from_millis(100)),
                        Err(e) => return Err(e.to_string()),
                    }
                }
            }
            None => child.wait().map_err(|e| e.to_string())?,
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            error!("{} failed ({}): {}", self.binary.display(), status, stderr);
            return Err(stderr.into_owned());
        }
        debug!("prover output: {} bytes", stdout.len());
        Ok(())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl ProvingBackend for CommandBackend {
    fn prove(&self, witness: &Witness, keys: &KeyPaths) -> Result<ProvedSignals, String> {
        let work = tempfile::tempdir().map_err(|e| e.to_string())?;
        let input = work.path().join("input.json");
        let proof_path = work.path().join("proof.json");
        let public_path = work.path().join("public.json");

        let json = serde_json::to_vec(witness).map_err(|e| e.to_string())?;
        fs::write(&input, json).map_err(|e| e.to_string())?;

        info!(
            inputs = witness.n_inputs(),
            outputs = witness.n_outputs(),
            "Executing groth16 fullprove..."
        );
        self.run(&[
            Path::new("groth16"),
            Path::new("fullprove"),
            &input,
            &keys.wasm,
            &keys.zkey,
            &proof_path,
            &public_path,
        ])?;

        info!("Executing groth16 verify...");
        self.run(&[
            Path::new("groth16"),
            Path::new("verify"),
            &keys.vk,
            &public_path,
            &proof_path,
        ])?;

        let read = |p: &Path| fs::read(p).map_err(|e| format!("{}: {e}", p.display()));
        let proof: SnarkjsProof = serde_json::from_slice(&read(&proof_path)?).map_err(|e| e.to_string())?;
        let public_signals: Vec<String> =
            serde_json::from_slice(&read(&public_path)?).map_err(|e| e.to_string())?;

        Ok(ProvedSignals {
            proof: proof.into_proof()?,
            public_signals,
        })
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Deterministic fake prover for development
///
/// The proof is a blake3 digest of the witness; it verifies against nothing. Public
/// signals are echoed from the witness.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackend;

const MOCK_CONTEXT: &str = "veil 2024 mock groth16 proof";

impl ProvingBackend for MockBackend {
    fn prove(&self, witness: &Witness, _keys: &KeyPaths) -> Result<ProvedSignals, String> {
        let json = serde_json::to_vec(witness).map_err(|e| e.to_string())?;
        let mut hasher = blake3::Hasher::new_derive_key(MOCK_CONTEXT);
        hasher.update(&json);
        let mut reader = hasher.finalize_xof();

        // 31 bytes keeps every coordinate below the base field modulus
        let mut next = || {
            let mut buf = [0u8; 32];
            reader.fill(&mut buf[1..]);
            U256::from_big_endian(&buf)
        };
        let proof = SnarkProof {
            pi_a: [next(), next()],
            pi_b: [[next(), next()], [next(), next()]],
            pi_c: [next(), next()],
        };

        Ok(ProvedSignals {
            proof,
            public_signals: witness.public_signals(),
        })
    }
}

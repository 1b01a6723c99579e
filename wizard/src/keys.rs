//! Proving-key resolution
//!
//! ```text
//! <root>/circuits/zk_transaction_{n}_{m}.wasm
//! <root>/zkeys/zk_transaction_{n}_{m}.zkey
//! <root>/vks/zk_transaction_{n}_{m}.vk.json
//! ```
//!
//! The local directory is checked first. Otherwise files are fetched from the remote root,
//! which uses the same relative layout, into a scratch directory owned by the cache.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};
use veil_config::CircuitsConfig;

use crate::error::CircuitError;

/// Circuit name for a transaction shape
pub fn circuit_name(n_inputs: usize, n_outputs: usize) -> String {
    format!("zk_transaction_{n_inputs}_{n_outputs}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub wasm: PathBuf,
    pub zkey: PathBuf,
    pub vk: PathBuf,
}

impl KeyPaths {
    fn relative(circuit: &str) -> Self {
        Self {
            wasm: Path::new("circuits").join(format!("{circuit}.wasm")),
            zkey: Path::new("zkeys").join(format!("{circuit}.zkey")),
            vk: Path::new("vks").join(format!("{circuit}.vk.json")),
        }
    }

    fn under(&self, root: &Path) -> Self {
        Self {
            wasm: root.join(&self.wasm),
            zkey: root.join(&self.zkey),
            vk: root.join(&self.vk),
        }
    }

    fn iter(&self) -> [&PathBuf; 3] {
        [&self.wasm, &self.zkey, &self.vk]
    }

    fn first_missing(&self) -> Option<&PathBuf> {
        self.iter().into_iter().find(|p| !p.exists())
    }
}

/// Owns the scratch directory for downloaded keys
///
/// Lifecycle: [`init`](Self::init), any number of [`key_paths`](Self::key_paths),
/// then [`teardown`](Self::teardown). Dropping the cache also removes the scratch dir.
#[derive(Debug)]
pub struct CircuitKeyCache {
    local_dir: Option<PathBuf>,
    remote_root: Option<String>,
    scratch: Option<TempDir>,
    client: reqwest::Client,
}

impl CircuitKeyCache {
    /// A scratch directory is created only when a remote root is given
    pub fn init(local_dir: Option<PathBuf>, remote_root: Option<String>) -> Result<Self, CircuitError> {
        let scratch = match &remote_root {
            Some(_) => Some(tempfile::Builder::new().prefix("veil-circuits-").tempdir()?),
            None => None,
        };
        if let Some(dir) = &scratch {
            debug!("Circuit scratch dir: {}", dir.path().display());
        }
        Ok(Self {
            local_dir,
            remote_root: remote_root.map(|r| r.trim_end_matches('/').to_string()),
            scratch,
            client: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &CircuitsConfig) -> Result<Self, CircuitError> {
        Self::init(
            config.local_dir.as_ref().map(PathBuf::from),
            config.remote_root.clone(),
        )
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Resolve key material for `(n_inputs, n_outputs)`, downloading what is missing
    pub async fn key_paths(&self, n_inputs: usize, n_outputs: usize) -> Result<KeyPaths, CircuitError> {
        let circuit = circuit_name(n_inputs, n_outputs);
        let relative = KeyPaths::relative(&circuit);

        let local = self.local_dir.as_deref().map(|dir| relative.under(dir));
        if let Some(paths) = &local {
            if paths.first_missing().is_none() {
                return Ok(paths.clone());
            }
        }

        let (Some(remote), Some(scratch)) = (&self.remote_root, &self.scratch) else {
            let missing = local
                .as_ref()
                .and_then(KeyPaths::first_missing)
                .cloned()
                .unwrap_or_else(|| relative.wasm.clone());
            return Err(CircuitError::Missing { circuit, path: missing });
        };

        let cached = relative.under(scratch.path());
        for (rel, target) in relative.iter().into_iter().zip(cached.iter()) {
            if target.exists() {
                continue;
            }
            let url = format!("{remote}/{}", rel.to_string_lossy().replace('\\', "/"));
            self.download(&url, target).await?;
        }

        match cached.first_missing() {
            Some(path) => Err(CircuitError::Missing {
                circuit,
                path: path.clone(),
            }),
            None => Ok(cached),
        }
    }

    async fn download(&self, url: &str, target: &Path) -> Result<(), CircuitError> {
        info!("Downloading {}", url);
        let fail = |e: reqwest::Error| CircuitError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?
            .bytes()
            .await
            .map_err(fail)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, &bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }

    /// Remove the scratch directory and everything downloaded into it
    pub fn teardown(self) -> Result<(), CircuitError> {
        if let Some(dir) = self.scratch {
            dir.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lay_out(root: &Path, n_in: usize, n_out: usize) -> KeyPaths {
        let paths = KeyPaths::relative(&circuit_name(n_in, n_out)).under(root);
        for p in paths.iter() {
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, b"key").unwrap();
        }
        paths
    }

    #[test]
    fn test_circuit_name() {
        assert_eq!(circuit_name(2, 3), "zk_transaction_2_3");
    }

    #[tokio::test]
    async fn test_flat_store_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "circuits/zk_transaction_1_2.wasm",
            "zkeys/zk_transaction_1_2.zkey",
            "vks/zk_transaction_1_2.vk.json",
        ] {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"key").unwrap();
        }

        let cache = CircuitKeyCache::init(Some(root.to_path_buf()), None).unwrap();
        let paths = cache.key_paths(1, 2).await.unwrap();
        assert_eq!(paths.wasm, root.join("circuits/zk_transaction_1_2.wasm"));
        assert_eq!(paths.zkey, root.join("zkeys/zk_transaction_1_2.zkey"));
        assert_eq!(paths.vk, root.join("vks/zk_transaction_1_2.vk.json"));
    }

    #[tokio::test]
    async fn test_local_hit() {
        let dir = tempfile::tempdir().unwrap();
        let expected = lay_out(dir.path(), 1, 2);

        let cache = CircuitKeyCache::init(Some(dir.path().to_path_buf()), None).unwrap();
        assert!(cache.scratch_dir().is_none());
        assert_eq!(cache.key_paths(1, 2).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_missing_shape_without_remote() {
        let dir = tempfile::tempdir().unwrap();
        lay_out(dir.path(), 1, 2);

        let cache = CircuitKeyCache::init(Some(dir.path().to_path_buf()), None).unwrap();
        match cache.key_paths(4, 4).await {
            Err(CircuitError::Missing { circuit, .. }) => assert_eq!(circuit, "zk_transaction_4_4"),
            other => panic!("expected missing circuit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scratch_cache_skips_download() {
        let cache = CircuitKeyCache::init(None, Some("http://127.0.0.1:9/".into())).unwrap();
        let scratch = cache.scratch_dir().unwrap().to_path_buf();
        let expected = lay_out(&scratch, 2, 2);

        // Already cached, so the unreachable remote is never contacted
        assert_eq!(cache.key_paths(2, 2).await.unwrap(), expected);

        cache.teardown().unwrap();
        assert!(!scratch.exists());
    }
}

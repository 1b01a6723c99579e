//! Veil Configuration
//!
//! Shared configuration crate for the Veil wallet core.
//!
//! Handles loading configuration from:
//! 1. VEIL_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.veil/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".veil";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_FEE_PER_BYTE: u64 = 1_000_000_000;
const DEFAULT_CIRCUIT_DIR: &str = "./circuits";
const DEFAULT_PROVER_BIN: &str = "snarkjs";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VeilConfig {
    #[serde(default)]
    pub fees: FeesConfig,
    #[serde(default)]
    pub circuits: CircuitsConfig,
    #[serde(default)]
    pub prover: ProverConfig,
}

/// Fee pricing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeesConfig {
    /// Wei charged per encoded transaction byte
    #[serde(default = "default_fee_per_byte")]
    pub fee_per_byte: u64,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            fee_per_byte: DEFAULT_FEE_PER_BYTE,
        }
    }
}

fn default_fee_per_byte() -> u64 {
    DEFAULT_FEE_PER_BYTE
}

/// Where proving keys are found
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CircuitsConfig {
    /// Local layout root holding `circuits/`, `zkeys/` and `vks/`
    #[serde(default = "default_circuit_dir")]
    pub local_dir: Option<String>,
    /// Remote root with the same relative layout, fetched on demand
    #[serde(default)]
    pub remote_root: Option<String>,
}

impl Default for CircuitsConfig {
    fn default() -> Self {
        Self {
            local_dir: default_circuit_dir(),
            remote_root: None,
        }
    }
}

fn default_circuit_dir() -> Option<String> {
    Some(DEFAULT_CIRCUIT_DIR.into())
}

/// Proving backend selection
///
/// `Mock` produces unverifiable proofs and must be chosen explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProverMode {
    #[default]
    Command,
    Mock,
}

impl FromStr for ProverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "command" | "snarkjs" => Ok(Self::Command),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown prover mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProverConfig {
    #[serde(default)]
    pub mode: ProverMode,
    /// snarkjs-compatible binary used by the command backend
    #[serde(default = "default_prover_bin")]
    pub binary: String,
    #[serde(default)]
    pub proof_timeout_secs: Option<u64>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            mode: ProverMode::Command,
            binary: DEFAULT_PROVER_BIN.into(),
            proof_timeout_secs: None,
        }
    }
}

fn default_prover_bin() -> String {
    DEFAULT_PROVER_BIN.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        parse_or_keep(key, &v, field);
    }
}

/// Unparseable values leave `field` untouched
fn parse_or_keep<T: FromStr>(key: &str, value: &str, field: &mut T) {
    match value.parse() {
        Ok(parsed) => *field = parsed,
        Err(_) => tracing::warn!("Ignoring {}={}: invalid value", key, value),
    }
}

/// Set Option<T> from env var if present and parseable; unparseable values are ignored
fn env_parse_option<T: FromStr>(key: &str, field: &mut Option<T>) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => tracing::warn!("Ignoring {}={}: invalid value", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl VeilConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                tracing::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check VEIL_CONFIG env var
        if let Ok(path) = env::var("VEIL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./config.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.veil/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Fees
        env_parse("VEIL_FEE_PER_BYTE", &mut self.fees.fee_per_byte);

        // Circuits
        env_option_string("VEIL_CIRCUIT_DIR", &mut self.circuits.local_dir);
        env_option_string("VEIL_CIRCUIT_REMOTE", &mut self.circuits.remote_root);

        // Prover
        env_parse("VEIL_PROVER_MODE", &mut self.prover.mode);
        env_string("VEIL_PROVER_BIN", &mut self.prover.binary);
        env_parse_option(
            "VEIL_PROOF_TIMEOUT_SECS",
            &mut self.prover.proof_timeout_secs,
        );
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.circuits.remote_root = Some("https://circuits.example.org/v1".into());
        sample.prover.proof_timeout_secs = Some(600);
        toml::to_string_pretty(&sample).unwrap_or_default()
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================

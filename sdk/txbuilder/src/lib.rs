//! Veil transaction builder
//!
//! Turns spend intents into a balanced [`RawTx`]: picks inputs per asset, adds change,
//! and prices the fee from the byte size the proved transaction will have.

pub mod builder;
pub mod error;
pub mod estimator;
pub mod raw;
pub mod units;

pub use builder::{SwapTxBuilder, TxBuilder};
pub use error::{BalanceError, BuildError};
pub use estimator::{FixedSize, SizeEstimator, WireSize};
pub use raw::RawTx;
pub use units::{Ether, format_ether};

use thiserror::Error;

/// Errors decoding a transaction from the wire
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated input: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("{0} trailing bytes after the transaction")]
    TrailingBytes(usize),

    #[error("Unknown outflow type {value} at offset {offset}")]
    UnknownOutflowType { offset: usize, value: u8 },

    #[error("Unknown switch bits: {0:#010b}")]
    UnknownSwitchBits(u8),

    #[error("Value at offset {offset} is not a canonical field element")]
    NonCanonicalField { offset: usize },
}

/// Errors building a transaction whose shape cannot be encoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Too many inflows: {0} (max 255)")]
    TooManyInflows(usize),

    #[error("Too many outflows: {0} (max 255)")]
    TooManyOutflows(usize),

    #[error("Outflow {0}: public data must be present exactly for withdrawals and migrations")]
    OutflowData(usize),
}

/// Errors building or parsing a memo
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoError {
    #[error("Memo is {0} bytes, v2 memos are limited to 65535")]
    TooLong(usize),

    #[error("Memo too short: {0} bytes")]
    TooShort(usize),

    #[error("Unknown memo selector 0x{}", hex_selector(.0))]
    UnknownSelector([u8; 4]),

    #[error("Note payload of {0} bytes is not a whole number of encrypted notes")]
    ChunkLength(usize),

    #[error("Signature padding contains non-zero bytes")]
    Padding,

    #[error("Signature of {0} bytes does not fit a u16 length prefix")]
    SignatureTooLong(usize),
}

fn hex_selector(selector: &[u8; 4]) -> String {
    selector.iter().map(|b| format!("{b:02x}")).collect()
}

//! Addresses
//!
//! ```text
//! ZkAddress (68 bytes, base58):
//!   spending_pub_key  32  little-endian field element
//!   viewing_key       32  compressed Baby Jubjub point
//!   checksum           4  keccak256(first 64 bytes)[..4]
//! ```

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::curve::{self, Point};
use crate::error::AddressError;
use crate::field::{fr_from_le_bytes, fr_to_le_bytes, keccak256};

/// A 160-bit L1 address (token contract or withdrawal recipient)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_fr(&self) -> Fr {
        use ark_ff::PrimeField;
        Fr::from_be_bytes_mod_order(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| AddressError::Hex(e.to_string()))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| AddressError::Length {
            expected: 20,
            got: b.len(),
        })?;
        Ok(Self(arr))
    }
}

/// Shielded address: spending public key plus viewing public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ZkAddress {
    spending_pub_key: Fr,
    viewing_key: Point,
}

impl ZkAddress {
    /// Raw payload length including the checksum
    pub const PAYLOAD_LEN: usize = 68;

    pub fn new(spending_pub_key: Fr, viewing_key: Point) -> Self {
        Self {
            spending_pub_key,
            viewing_key,
        }
    }

    /// Recipient of outputs that leave the shielded pool
    pub fn null() -> Self {
        Self {
            spending_pub_key: Fr::from(0u64),
            viewing_key: curve::identity(),
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }

    pub fn spending_pub_key(&self) -> Fr {
        self.spending_pub_key
    }

    pub fn viewing_key(&self) -> &Point {
        &self.viewing_key
    }

    pub fn to_bytes(&self) -> [u8; Self::PAYLOAD_LEN] {
        let mut out = [0u8; Self::PAYLOAD_LEN];
        out[..32].copy_from_slice(&fr_to_le_bytes(&self.spending_pub_key));
        out[32..64].copy_from_slice(&curve::point_to_bytes(&self.viewing_key));
        let checksum = keccak256(&out[..64]);
        out[64..].copy_from_slice(&checksum[..4]);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != Self::PAYLOAD_LEN {
            return Err(AddressError::Length {
                expected: Self::PAYLOAD_LEN,
                got: bytes.len(),
            });
        }

        let checksum = keccak256(&bytes[..64]);
        if checksum[..4] != bytes[64..] {
            return Err(AddressError::Checksum);
        }

        let mut spending = [0u8; 32];
        spending.copy_from_slice(&bytes[..32]);
        let mut viewing = [0u8; 32];
        viewing.copy_from_slice(&bytes[32..64]);

        let spending_pub_key = fr_from_le_bytes(&spending).ok_or(AddressError::SpendingKey)?;
        let viewing_key = curve::point_from_bytes(&viewing).ok_or(AddressError::ViewingKey)?;

        Ok(Self {
            spending_pub_key,
            viewing_key,
        })
    }
}

impl fmt::Display for ZkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.to_bytes()).into_string())
    }
}

impl fmt::Debug for ZkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZkAddress({self})")
    }
}

impl FromStr for ZkAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Scalar, mul_base};

    fn sample() -> ZkAddress {
        ZkAddress::new(Fr::from(987_654_321u64), mul_base(&Scalar::from(5u64)))
    }

    #[test]
    fn test_text_roundtrip() {
        let address = sample();
        let text = address.to_string();
        let decoded: ZkAddress = text.parse().unwrap();
        assert_eq!(decoded, address);
        assert_eq!(decoded.spending_pub_key(), Fr::from(987_654_321u64));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut bytes = sample().to_bytes();
        bytes[67] ^= 0x01;
        assert_eq!(ZkAddress::from_bytes(&bytes), Err(AddressError::Checksum));
    }

    #[test]
    fn test_rejects_bad_length() {
        let bytes = sample().to_bytes();
        assert_eq!(
            ZkAddress::from_bytes(&bytes[..67]),
            Err(AddressError::Length {
                expected: 68,
                got: 67
            })
        );
        let text = bs58::encode(&bytes[..60]).into_string();
        assert!(matches!(
            text.parse::<ZkAddress>(),
            Err(AddressError::Length { got: 60, .. })
        ));
    }

    #[test]
    fn test_null_address() {
        let null = ZkAddress::null();
        assert!(null.is_null());
        assert!(!sample().is_null());
        let decoded: ZkAddress = null.to_string().parse().unwrap();
        assert!(decoded.is_null());
    }

    #[test]
    fn test_l1_address_parse() {
        let address: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        assert_eq!(address.0[19], 0xaa);
        assert_eq!(address.to_string(), "0x00000000000000000000000000000000000000aa");
        assert!("0x1234".parse::<Address>().is_err());
    }
}

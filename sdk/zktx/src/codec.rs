//! Big-endian reader over a borrowed byte slice

use std::io::{Cursor, Read};

use ark_bn254::Fr;
use byteorder::{BigEndian, ReadBytesExt};
use primitive_types::U256;
use veil_note::Address;
use veil_note::field::{fr_from_be_bytes, fr_to_be_bytes};

use crate::error::DecodeError;

pub(crate) struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed,
            });
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        self.cursor.read_u8().map_err(|_| DecodeError::Truncated {
            offset: self.offset(),
            needed: 1,
        })
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| DecodeError::Truncated {
                offset: self.offset(),
                needed: 2,
            })
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| DecodeError::Truncated {
                offset: self.offset(),
                needed: N,
            })?;
        Ok(out)
    }

    pub(crate) fn vec(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(len)?;
        let mut out = vec![0u8; len];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| DecodeError::Truncated {
                offset: self.offset(),
                needed: len,
            })?;
        Ok(out)
    }

    pub(crate) fn fr(&mut self) -> Result<Fr, DecodeError> {
        let offset = self.offset();
        let bytes = self.array::<32>()?;
        fr_from_be_bytes(&bytes).ok_or(DecodeError::NonCanonicalField { offset })
    }

    pub(crate) fn u256(&mut self) -> Result<U256, DecodeError> {
        Ok(U256::from_big_endian(&self.array::<32>()?))
    }

    pub(crate) fn address(&mut self) -> Result<Address, DecodeError> {
        Ok(Address(self.array::<20>()?))
    }

    /// Fails if anything is left unread
    pub(crate) fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

pub(crate) fn put_fr(out: &mut Vec<u8>, value: &Fr) {
    out.extend_from_slice(&fr_to_be_bytes(value));
}

pub(crate) fn put_u256(out: &mut Vec<u8>, value: &U256) {
    out.extend_from_slice(&value.to_big_endian());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_order() {
        let mut bytes = vec![7u8, 0x01, 0x02];
        bytes.extend_from_slice(&[0u8; 31]);
        bytes.push(9);
        let mut reader = Reader::new(&bytes);

        assert_eq!(reader.u8().unwrap(), 7);
        assert_eq!(reader.u16().unwrap(), 0x0102);
        assert_eq!(reader.fr().unwrap(), Fr::from(9u64));
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_truncation_reports_offset() {
        let bytes = [0u8; 10];
        let mut reader = Reader::new(&bytes);
        reader.u8().unwrap();
        assert_eq!(
            reader.u256(),
            Err(DecodeError::Truncated {
                offset: 1,
                needed: 32
            })
        );
    }

    #[test]
    fn test_non_canonical_field() {
        let bytes = [0xffu8; 32];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.fr(), Err(DecodeError::NonCanonicalField { offset: 0 }));
    }

    #[test]
    fn test_trailing_bytes() {
        let bytes = [1u8, 2, 3];
        let mut reader = Reader::new(&bytes);
        reader.u8().unwrap();
        assert_eq!(reader.finish(), Err(DecodeError::TrailingBytes(2)));
    }
}

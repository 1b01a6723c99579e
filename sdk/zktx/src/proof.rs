use primitive_types::U256;

use crate::codec::{Reader, put_u256};
use crate::error::DecodeError;

/// Encoded proof length: eight 32-byte coordinates
pub const PROOF_LEN: usize = 256;

/// Groth16 proof over BN254
///
/// Coordinates live in the base field, which is wider than the scalar field, so they are
/// kept as plain 256-bit integers. `pi_b` is stored in the prover's row order; the wire
/// format writes each row reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SnarkProof {
    pub pi_a: [U256; 2],
    pub pi_b: [[U256; 2]; 2],
    pub pi_c: [U256; 2],
}

impl SnarkProof {
    /// Coordinates in prover order: `a.x, a.y, b00, b01, b10, b11, c.x, c.y`
    pub fn coordinates(&self) -> [U256; 8] {
        [
            self.pi_a[0],
            self.pi_a[1],
            self.pi_b[0][0],
            self.pi_b[0][1],
            self.pi_b[1][0],
            self.pi_b[1][1],
            self.pi_c[0],
            self.pi_c[1],
        ]
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        put_u256(out, &self.pi_a[0]);
        put_u256(out, &self.pi_a[1]);
        for row in &self.pi_b {
            put_u256(out, &row[1]);
            put_u256(out, &row[0]);
        }
        put_u256(out, &self.pi_c[0]);
        put_u256(out, &self.pi_c[1]);
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let pi_a = [reader.u256()?, reader.u256()?];
        let mut pi_b = [[U256::zero(); 2]; 2];
        for row in &mut pi_b {
            let swapped = [reader.u256()?, reader.u256()?];
            *row = [swapped[1], swapped[0]];
        }
        let pi_c = [reader.u256()?, reader.u256()?];
        Ok(Self { pi_a, pi_b, pi_c })
    }
}

//! Baby Jubjub helpers
//!
//! The curve is defined over the BN254 scalar field, so point coordinates feed the
//! circuit hashes directly.

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr as JubjubScalar};
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

pub type Point = EdwardsAffine;
pub type Scalar = JubjubScalar;

pub fn generator() -> Point {
    Point::generator()
}

pub fn mul_base(scalar: &Scalar) -> Point {
    (Point::generator() * scalar).into_affine()
}

pub fn identity() -> Point {
    Point::zero()
}

/// Compressed 32-byte encoding
pub fn point_to_bytes(point: &Point) -> [u8; 32] {
    let mut buf = Vec::with_capacity(32);
    // writing into a Vec cannot fail
    let _ = point.serialize_compressed(&mut buf);
    let mut out = [0u8; 32];
    out.copy_from_slice(&buf[..32]);
    out
}

pub fn point_from_bytes(bytes: &[u8; 32]) -> Option<Point> {
    Point::deserialize_compressed(&bytes[..]).ok()
}

pub fn scalar_from_bytes(bytes: &[u8]) -> Scalar {
    Scalar::from_le_bytes_mod_order(bytes)
}

/// Lift a curve scalar into the circuit field (the curve order is below the field modulus)
pub fn scalar_to_fr(scalar: &Scalar) -> Fr {
    Fr::from_le_bytes_mod_order(&scalar.into_bigint().to_bytes_le())
}

pub fn fr_to_scalar(value: &Fr) -> Scalar {
    Scalar::from_le_bytes_mod_order(&value.into_bigint().to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_roundtrip() {
        let point = mul_base(&Scalar::from(7u64));
        let bytes = point_to_bytes(&point);
        assert_eq!(point_from_bytes(&bytes), Some(point));
    }

    #[test]
    fn test_identity_roundtrip() {
        let bytes = point_to_bytes(&identity());
        assert_eq!(point_from_bytes(&bytes), Some(identity()));
    }

    #[test]
    fn test_scalar_lift_preserves_value() {
        let scalar = Scalar::from(123_456u64);
        assert_eq!(scalar_to_fr(&scalar), Fr::from(123_456u64));
        assert_eq!(fr_to_scalar(&Fr::from(123_456u64)), scalar);
    }
}

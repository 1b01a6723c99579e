//! Note Encryption
//!
//! Fixed-width encryption of a note for its recipient's viewing key.
//!
//! ```text
//! Flow:
//! 1. Sender picks ephemeral scalar e, E = e·G
//! 2. Shared point = e·P (P = recipient viewing key)
//! 3. Keystream = blake3 XOF keyed from (shared, E)
//! 4. Output = E(32) ‖ (salt(16) ‖ token_id(1) ‖ value(32)) XOR keystream
//! ```
//!
//! `token_id` is 0 for pure-ether notes, otherwise one plus the token's index in a
//! well-known token list, with the high bit set for NFTs. There is no tag; callers
//! confirm a decryption by matching the note hash.

use ark_bn254::Fr;
use ark_ec::CurveGroup;
use primitive_types::U256;

use crate::account::ZkViewer;
use crate::address::Address;
use crate::asset::Asset;
use crate::curve::{self, Scalar};
use crate::error::NoteError;
use crate::field::{fr_to_u256, u256_to_fr};
use crate::note::Note;

/// Encrypted note length
pub const ENCRYPTED_NOTE_LEN: usize = 81;

const PLAINTEXT_LEN: usize = 49;
const NFT_FLAG: u8 = 0x80;
const MAX_TOKENS: usize = 0x7f;
const KEY_CONTEXT: &str = "veil 2024 note encryption v1";

pub type EncryptedNote = [u8; ENCRYPTED_NOTE_LEN];

/// Encrypt `note` for its owner
pub fn encrypt_note_for(note: &Note, tokens: &[Address]) -> Result<EncryptedNote, NoteError> {
    let mut seed = [0u8; 64];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut seed);
    encrypt_with_ephemeral(note, tokens, &curve::scalar_from_bytes(&seed))
}

fn encrypt_with_ephemeral(
    note: &Note,
    tokens: &[Address],
    ephemeral: &Scalar,
) -> Result<EncryptedNote, NoteError> {
    let plaintext = encode_plaintext(note, tokens)?;

    let ephemeral_pk = curve::point_to_bytes(&curve::mul_base(ephemeral));
    let shared = (*note.owner().viewing_key() * ephemeral).into_affine();
    let keystream = derive_keystream(&curve::point_to_bytes(&shared), &ephemeral_pk);

    let mut out = [0u8; ENCRYPTED_NOTE_LEN];
    out[..32].copy_from_slice(&ephemeral_pk);
    for (i, (p, k)) in plaintext.iter().zip(keystream.iter()).enumerate() {
        out[32 + i] = p ^ k;
    }
    Ok(out)
}

/// Try to decrypt with `viewer`'s key
///
/// Returns `None` when the ephemeral key is malformed or the token id is unknown. A
/// `Some` result is only a candidate until its hash is matched against an output.
pub fn decrypt_note(cipher: &EncryptedNote, viewer: &ZkViewer, tokens: &[Address]) -> Option<Note> {
    let mut ephemeral_pk = [0u8; 32];
    ephemeral_pk.copy_from_slice(&cipher[..32]);
    let ephemeral = curve::point_from_bytes(&ephemeral_pk)?;

    let shared = (ephemeral * viewer.viewing_key()).into_affine();
    let keystream = derive_keystream(&curve::point_to_bytes(&shared), &ephemeral_pk);

    let mut plaintext = [0u8; PLAINTEXT_LEN];
    for (i, (c, k)) in cipher[32..].iter().zip(keystream.iter()).enumerate() {
        plaintext[i] = c ^ k;
    }

    let salt = U256::from_big_endian(&plaintext[..16]);
    let token_id = plaintext[16];
    let value = U256::from_big_endian(&plaintext[17..]);

    let asset = if token_id == 0 {
        Asset::ether(value)
    } else {
        let index = usize::from(token_id & !NFT_FLAG).checked_sub(1)?;
        let token = *tokens.get(index)?;
        if token_id & NFT_FLAG == 0 {
            Asset::erc20(token, value, U256::zero()).ok()?
        } else {
            Asset::nft(token, value, U256::zero()).ok()?
        }
    };

    Some(Note::with_salt(viewer.address(), u256_to_fr(&salt), asset))
}

fn encode_plaintext(note: &Note, tokens: &[Address]) -> Result<[u8; PLAINTEXT_LEN], NoteError> {
    let salt = fr_to_u256(&note.salt());
    if salt.bits() > 128 {
        return Err(NoteError::Unencryptable("salt wider than 128 bits"));
    }

    let asset = note.asset();
    let (token_id, value) = if asset.is_ether_only() {
        (0u8, asset.eth)
    } else {
        if !asset.eth.is_zero() {
            return Err(NoteError::Unencryptable("note carries both ether and a token"));
        }
        let index = tokens
            .iter()
            .take(MAX_TOKENS)
            .position(|t| *t == asset.token_addr)
            .ok_or(NoteError::UnknownToken(asset.token_addr))?;
        // index < MAX_TOKENS, so it fits the low seven bits
        let id = (index + 1) as u8;
        if asset.is_erc20() {
            (id, asset.erc20_amount)
        } else if asset.is_nft() {
            (id | NFT_FLAG, asset.nft)
        } else {
            return Err(NoteError::Unencryptable("token note without amount or id"));
        }
    };

    let mut out = [0u8; PLAINTEXT_LEN];
    out[..16].copy_from_slice(&salt.to_big_endian()[16..]);
    out[16] = token_id;
    out[17..].copy_from_slice(&value.to_big_endian());
    Ok(out)
}

fn derive_keystream(shared: &[u8; 32], ephemeral_pk: &[u8; 32]) -> [u8; PLAINTEXT_LEN] {
    let mut hasher = blake3::Hasher::new_derive_key(KEY_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral_pk);
    let mut out = [0u8; PLAINTEXT_LEN];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// Hash-checked decryption: keep the note only if it is one of `expected` outputs
pub fn try_decrypt_note(
    cipher: &EncryptedNote,
    viewer: &ZkViewer,
    tokens: &[Address],
    expected: &[Fr],
) -> Option<Note> {
    let note = decrypt_note(cipher, viewer, tokens)?;
    expected.contains(&note.hash()).then_some(note)
}

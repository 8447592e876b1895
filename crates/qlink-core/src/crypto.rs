//! AES-128-CBC Encryption Envelope
//!
//! Wraps a payload in a symmetric envelope before framing: a fresh random
//! 16-byte IV followed by the CBC ciphertext. The 16-byte key is generated at
//! encrypt time and handed back to the caller; it is never part of the
//! envelope, and this module performs no storage — key persistence belongs to
//! the orchestrator.
//!
//! ```text
//! Envelope: ┌──────────────┬────────────────────────────┐
//!           │ IV (16 bytes)│ Ciphertext (n × 16 bytes)  │
//!           └──────────────┴────────────────────────────┘
//! ```
//!
//! The block primitive comes from the RustCrypto `aes` crate; the CBC
//! chaining and the padding rule live here. Padding is PKCS#7-style with one
//! deliberate property: a plaintext already aligned to the block size still
//! grows by a full extra block, so the pad byte is always in `1..=16`.
//!
//! ## Example
//!
//! ```rust
//! use qlink_core::crypto;
//!
//! let key = crypto::generate_key();
//! let envelope = crypto::encrypt(b"HELLO", &key);
//! assert_eq!(envelope.len(), 16 + 16); // IV + one padded block
//! assert_eq!(crypto::decrypt(&envelope, &key).unwrap(), b"HELLO");
//! ```

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{FrameError, FrameResult};

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;
/// Cipher block length in bytes.
pub const BLOCK_LEN: usize = 16;
/// Initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Generate a fresh random AES-128 key from the OS entropy source.
pub fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

/// Coerce key material read from a key file into a fixed-size key.
pub fn key_from_slice(bytes: &[u8]) -> FrameResult<[u8; KEY_LEN]> {
    bytes.try_into().map_err(|_| {
        FrameError::InvalidConfig(format!(
            "key must hold exactly {KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Encrypt `plaintext` with a freshly generated random IV.
///
/// Every call draws a new IV, so two encryptions of the same plaintext under
/// the same key produce different envelopes.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Vec<u8> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(plaintext, key, &iv)
}

/// Encrypt with a caller-chosen IV. Exposed for deterministic testing and
/// interop checks; production paths use [`encrypt`].
pub fn encrypt_with_iv(plaintext: &[u8], key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) -> Vec<u8> {
    let padded = pad_block(plaintext);
    let mut out = Vec::with_capacity(IV_LEN + padded.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&cbc_encrypt_blocks(key, iv, &padded));
    out
}

/// Decrypt an `IV ‖ ciphertext` envelope and remove the padding.
///
/// The padding check is mandatory: a pad byte of 0, above the block size, or
/// larger than the recovered plaintext means a corrupted envelope or the
/// wrong key, and raises [`FrameError::Padding`].
pub fn decrypt(envelope: &[u8], key: &[u8; KEY_LEN]) -> FrameResult<Vec<u8>> {
    let needed = IV_LEN + BLOCK_LEN;
    if envelope.len() < needed {
        return Err(FrameError::UndersizedFrame {
            needed,
            got: envelope.len(),
        });
    }
    let (iv, ciphertext) = envelope.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(FrameError::Padding(format!(
            "ciphertext length {} is not a multiple of the {BLOCK_LEN}-byte block size",
            ciphertext.len()
        )));
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev = [0u8; BLOCK_LEN];
    prev.copy_from_slice(iv);
    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut block = GenericArray::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        prev.copy_from_slice(chunk);
        plaintext.extend_from_slice(&block);
    }

    unpad_block(plaintext)
}

/// Pad to a multiple of the block size. The pad value equals the pad length
/// and is always in `1..=BLOCK_LEN`: an already-aligned input gains a full
/// extra block.
pub fn pad_block(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_LEN - (data.len() % BLOCK_LEN);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    padded
}

/// Remove padding, validating the pad byte against the allowed range and the
/// buffer length.
fn unpad_block(mut data: Vec<u8>) -> FrameResult<Vec<u8>> {
    let pad = match data.last() {
        Some(&b) => b as usize,
        None => return Err(FrameError::Padding("empty plaintext".to_string())),
    };
    if pad == 0 || pad > BLOCK_LEN {
        return Err(FrameError::Padding(format!(
            "pad byte {pad} outside 1..={BLOCK_LEN}"
        )));
    }
    if pad > data.len() {
        return Err(FrameError::Padding(format!(
            "pad length {pad} exceeds plaintext length {}",
            data.len()
        )));
    }
    data.truncate(data.len() - pad);
    Ok(data)
}

/// CBC-chain `padded` (already a block multiple) over the AES-128 primitive.
fn cbc_encrypt_blocks(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], padded: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut out = Vec::with_capacity(padded.len());
    let mut prev = *iv;
    for chunk in padded.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        for (i, (c, p)) in chunk.iter().zip(prev.iter()).enumerate() {
            block[i] = c ^ p;
        }
        let mut ga = GenericArray::clone_from_slice(&block);
        cipher.encrypt_block(&mut ga);
        prev.copy_from_slice(&ga);
        out.extend_from_slice(&ga);
    }
    out
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! PIN server handshake payloads and session key schedule
//!
//! 1. The server issues an ephemeral key (`ske`) signed with its static
//!    identity key, passed to the device via `handshake_init`
//! 2. The device generates its own ephemeral key (`cke`), computes the ECDH
//!    shared secret and derives [SessionKeys], returning the encrypted
//!    PIN payload for the server
//! 3. The server replies with the encrypted AES key, passed to
//!    the device via `handshake_complete`
//!
//! Payloads are AES-256-CBC (PKCS#7) with a random IV prefix, authenticated
//! with HMAC-SHA256. Request MACs cover `cke || encrypted_data`, response
//! MACs cover `encrypted_key`.

use aes::Aes256;
use block_modes::{block_padding::Pkcs7, BlockMode, Cbc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

type HmacSha256 = Hmac<Sha256>;

/// Length of compressed secp256k1 public keys
pub const PUBKEY_LEN: usize = 33;

/// Length of compact ECDSA signatures
pub const SIG_LEN: usize = 64;

/// Length of AES IV prefixes
pub const IV_LEN: usize = 16;

/// Length of PIN secret / entropy / AES keys
pub const KEY_LEN: usize = 32;

/// Length of the PIN payload plaintext,
/// `pin_pubkey || pin_secret || entropy || sig`
pub const PIN_PAYLOAD_LEN: usize = PUBKEY_LEN + KEY_LEN + KEY_LEN + SIG_LEN;

const REQUEST_ENCRYPTION_KEY: &[u8] = b"request_encryption_key";
const REQUEST_HMAC_KEY: &[u8] = b"request_hmac_key";
const RESPONSE_ENCRYPTION_KEY: &[u8] = b"response_encryption_key";
const RESPONSE_HMAC_KEY: &[u8] = b"response_hmac_key";

/// `handshake_init` parameters (server ephemeral key and signature, hex)
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HandshakeInit {
    pub ske: String,
    pub sig: String,
}

/// Device PIN request, forwarded to the PIN server (hex)
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HandshakeData {
    pub cke: String,
    pub encrypted_data: String,
    pub hmac_encrypted_data: String,
    pub ske: String,
}

/// `handshake_complete` parameters (encrypted AES key and hmac, hex)
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HandshakeComplete {
    pub encrypted_key: String,
    pub hmac: String,
}

/// Symmetric keys derived from the ECDH shared secret
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub request_encryption: [u8; KEY_LEN],
    pub request_hmac: [u8; KEY_LEN],
    pub response_encryption: [u8; KEY_LEN],
    pub response_hmac: [u8; KEY_LEN],
}

impl SessionKeys {
    /// Derive session keys from an ECDH shared secret
    pub fn derive(shared_secret: &[u8]) -> Result<Self, Error> {
        let hk = Hkdf::<Sha256>::new(None, shared_secret);

        let mut k = Self {
            request_encryption: [0u8; KEY_LEN],
            request_hmac: [0u8; KEY_LEN],
            response_encryption: [0u8; KEY_LEN],
            response_hmac: [0u8; KEY_LEN],
        };

        for (label, key) in [
            (REQUEST_ENCRYPTION_KEY, &mut k.request_encryption),
            (REQUEST_HMAC_KEY, &mut k.request_hmac),
            (RESPONSE_ENCRYPTION_KEY, &mut k.response_encryption),
            (RESPONSE_HMAC_KEY, &mut k.response_hmac),
        ] {
            hk.expand(label, key).map_err(|_| Error::Cipher)?;
        }

        Ok(k)
    }
}

impl core::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionKeys(..)")
    }
}

/// Encrypt with AES-256-CBC, returning `iv || ciphertext`
pub fn encrypt(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let c = Aes256Cbc::new_from_slices(key, iv).map_err(|_| Error::Cipher)?;

    let mut b = iv.to_vec();
    b.extend(c.encrypt_vec(plaintext));

    Ok(b)
}

/// Decrypt `iv || ciphertext` with AES-256-CBC
pub fn decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    if data.len() < 2 * IV_LEN {
        return Err(Error::Cipher);
    }

    let (iv, ct) = data.split_at(IV_LEN);
    let c = Aes256Cbc::new_from_slices(key, iv).map_err(|_| Error::Cipher)?;

    c.decrypt_vec(ct).map_err(|_| Error::Cipher)
}

/// Compute HMAC-SHA256 over the concatenation of `parts`
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], Error> {
    let mut m = HmacSha256::new_from_slice(key).map_err(|_| Error::Cipher)?;
    for p in parts {
        m.update(p);
    }

    Ok(m.finalize().into_bytes().into())
}

/// Verify HMAC-SHA256 over the concatenation of `parts` (constant time)
pub fn verify_hmac(key: &[u8], parts: &[&[u8]], tag: &[u8]) -> Result<(), Error> {
    let mut m = HmacSha256::new_from_slice(key).map_err(|_| Error::Cipher)?;
    for p in parts {
        m.update(p);
    }

    m.verify_slice(tag).map_err(|_| Error::HmacMismatch)
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Engine helpers

use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use jade_proto::{
    frame::{encode_frame, FrameDecoder},
    handshake::{self, SessionKeys},
    RpcRequest, Value,
};

/// Entropy pool, mixing caller-provided entropy (`add_entropy`)
/// with RNG output for key generation
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct EntropyPool {
    state: [u8; 32],
}

impl EntropyPool {
    /// Mix additional entropy into the pool
    pub fn add(&mut self, entropy: &[u8]) {
        let mut h = Sha256::new();
        h.update(self.state);
        h.update(entropy);
        self.state = h.finalize().into();
    }

    /// Fill a 32 byte buffer from the RNG mixed with the pool,
    /// ratcheting pool state
    pub fn fill(&mut self, rng: &mut impl CryptoRngCore) -> [u8; 32] {
        let mut r = [0u8; 32];
        rng.fill_bytes(&mut r);

        let out: [u8; 32] = Sha256::new()
            .chain_update(self.state)
            .chain_update(r)
            .finalize()
            .into();
        r.zeroize();

        self.add(&out);

        out
    }
}

/// Run internal self checks (frame codec loopback and handshake crypto)
pub fn selfcheck(rng: &mut impl CryptoRngCore) -> bool {
    frame_loopback() && crypto_loopback(rng)
}

fn frame_loopback() -> bool {
    // Payload including reserved bytes, split across feeds
    let req = RpcRequest::new(
        "selfcheck",
        "debug_selfcheck",
        Some(Value::Bytes(vec![0x0a, 0xdb, 0x00, 0xdb, 0x0a])),
    );

    let b = match encode_frame(&req) {
        Ok(v) => v,
        Err(_) => return false,
    };

    let mut d = FrameDecoder::new(b.len());
    let mut frames = d.feed(&b[..b.len() / 2]);
    frames.extend(d.feed(&b[b.len() / 2..]));

    match frames.as_slice() {
        [f] => f.decode::<RpcRequest>().map(|r| r == req).unwrap_or(false),
        _ => false,
    }
}

fn crypto_loopback(rng: &mut impl CryptoRngCore) -> bool {
    let mut secret = [0u8; 32];
    let mut iv = [0u8; handshake::IV_LEN];
    rng.fill_bytes(&mut secret);
    rng.fill_bytes(&mut iv);

    let keys = match SessionKeys::derive(&secret) {
        Ok(v) => v,
        Err(_) => return false,
    };
    secret.zeroize();

    let msg = [0x5au8; handshake::PIN_PAYLOAD_LEN];
    let enc = match handshake::encrypt(&keys.request_encryption, &iv, &msg) {
        Ok(v) => v,
        Err(_) => return false,
    };

    let tag = match handshake::hmac_sha256(&keys.request_hmac, &[&enc]) {
        Ok(v) => v,
        Err(_) => return false,
    };

    handshake::verify_hmac(&keys.request_hmac, &[&enc], &tag).is_ok()
        && handshake::decrypt(&keys.request_encryption, &enc)
            .map(|d| d == msg)
            .unwrap_or(false)
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / wire definitions for Jade device communication
//!
//! This crate provides the message types and encodings shared between
//! the device [engine](https://docs.rs/jade-core) and client libraries.
//!
//! Messages are CBOR maps carried over a byte stream, each message escaped
//! and terminated as described in [frame]. Requests carry an `id`, `method`
//! and optional `params`, responses echo the `id` with exactly one of
//! `result` or `error` (see [rpc]).
//!
//! Multi-step exchanges with the PIN server are driven through
//! [http] instructions returned by the device, with payloads and
//! session key derivation defined in [handshake].
//!

use core::fmt::Debug;

pub use serde_bytes::ByteBuf;
pub use serde_cbor::Value;

pub mod frame;
pub use frame::{encode_frame, Frame, FrameDecoder, MAX_FRAME_LEN};

pub mod handshake;

pub mod http;
pub use http::HttpRequest;

pub mod liquid;

mod network;
pub use network::{Network, NetworkType};

pub mod rpc;
pub use rpc::{ErrorCode, RpcError, RpcRequest, RpcResponse};

pub mod txn;

mod version;
pub use version::{VersionInfo, NUM_VALUES_VERINFO};

/// Maximum length of a request id (exclusive)
pub const MAX_ID_LEN: usize = 32;

/// Maximum length of a method name
pub const MAX_METHOD_LEN: usize = 32;

/// Maximum size of an `ota_data` chunk
pub const OTA_MAX_CHUNK: usize = 4096;

/// Protocol encoding / decoding errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CBOR encoding or decoding failed
    #[error("cbor: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// Invalid escape sequence in frame
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    /// Response with both (or neither) of `result` and `error`
    #[error("malformed response")]
    MalformedResponse,

    /// Hex decoding failed
    #[error("invalid hex encoding")]
    InvalidHex,

    /// Field length mismatch
    #[error("invalid length (expected {expected}, actual {actual})")]
    InvalidLength { expected: usize, actual: usize },

    /// Encryption or decryption failed
    #[error("cipher failure")]
    Cipher,

    /// HMAC check failed
    #[error("hmac mismatch")]
    HmacMismatch,
}

impl From<hex::FromHexError> for Error {
    fn from(_: hex::FromHexError) -> Self {
        Error::InvalidHex
    }
}

/// Helper to decode a fixed length hex field
pub fn hex_array<const N: usize>(s: &str) -> Result<[u8; N], Error> {
    let mut b = [0u8; N];

    let v = hex::decode(s)?;
    if v.len() != N {
        return Err(Error::InvalidLength {
            expected: N,
            actual: v.len(),
        });
    }

    b.copy_from_slice(&v);
    Ok(b)
}

/// Helper to log and pass through encode / decode errors
pub(crate) fn trace_err<E: Debug>(e: E) -> E {
    #[cfg(feature = "log")]
    log::trace!("proto error: {:?}", e);

    e
}

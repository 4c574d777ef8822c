// Copyright (c) 2022-2023 The MobileCoin Foundation

use jade_proto::{ErrorCode, RpcError};
use tokio::time::error::Elapsed;

/// Jade API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport I/O error
    #[error("Transport error {0}")]
    Io(#[from] std::io::Error),

    /// Transport closed by the device
    #[error("Transport closed")]
    Closed,

    /// Message encoding / decoding error
    #[error("Codec error {0}")]
    Codec(#[from] jade_proto::Error),

    /// Error returned by the device
    #[error("Device error: {0}")]
    Rpc(RpcError),

    /// Response id did not match request
    #[error("Unexpected response id (expected: {0}, actual: {1})")]
    UnexpectedId(String, String),

    /// Unexpected response contents
    #[error("Unexpected response")]
    UnexpectedResponse,

    /// Timeout waiting for user
    #[error("Timeout waiting for user interaction")]
    UserTimeout,

    /// Request timeout
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// No PIN server url succeeded
    #[error("PIN server request failed: {0}")]
    PinServer(String),
}

impl Error {
    /// Fetch the device error, if this is an RPC error
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Error::Rpc(e) => Some(e),
            _ => None,
        }
    }

    /// Fetch the device error code, if known
    pub fn code(&self) -> Option<ErrorCode> {
        self.rpc().and_then(|e| e.error_code())
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::RequestTimeout
    }
}

impl From<serde_cbor::Error> for Error {
    fn from(e: serde_cbor::Error) -> Self {
        Error::Codec(jade_proto::Error::Cbor(e))
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Error::Rpc(e)
    }
}

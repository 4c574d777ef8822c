// Copyright (c) 2022-2023 The MobileCoin Foundation

use serde::Serialize;

use jade_proto::{
    handshake::HandshakeData, liquid::Commitments, ByteBuf, HttpRequest, Value, VersionInfo,
};

/// [`Engine`][super::Engine] outputs (in response to events), encoded as response `result` values
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    /// Boolean acknowledgement / status
    Bool(bool),

    /// String result (xpubs, addresses, signatures)
    Text(String),

    /// Binary result (keys, nonces, blinding factors)
    Bytes(ByteBuf),

    /// Per-input signatures from a completed signing exchange,
    /// empty for inputs not signed by this device
    Signatures(Vec<ByteBuf>),

    /// Version / status information
    VersionInfo(VersionInfo),

    /// Instruct the caller to start a PIN server handshake
    StartHandshake(HttpRequest<String>),

    /// Instruct the caller to forward a PIN request to the PIN server
    PinRequest(HttpRequest<HandshakeData>),

    /// Output commitments
    Commitments(Commitments),
}

impl Output {
    /// Encode an [`Output`] to a CBOR value for inclusion in a response
    pub fn to_value(&self) -> Result<Value, serde_cbor::Error> {
        serde_cbor::value::to_value(self)
    }

    /// Helper to construct byte outputs
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Output::Bytes(ByteBuf::from(b.into()))
    }
}

impl From<bool> for Output {
    fn from(v: bool) -> Self {
        Output::Bool(v)
    }
}

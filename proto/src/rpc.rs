// Copyright (c) 2022-2023 The MobileCoin Foundation

//! RPC request / response envelopes
//!

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use serde_cbor::Value;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::Error;

/// Response id used where the request id could not be trusted
pub const DEFAULT_ID: &str = "00";

/// RPC error codes, stable over the wire
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumVariantNames, EnumIter,
)]
#[repr(i32)]
pub enum ErrorCode {
    /// Malformed envelope or undecodable message
    InvalidRequest = -32600,
    /// Method not in registry
    UnknownMethod = -32601,
    /// Parameter extraction or validation failed
    BadParams = -32602,
    /// Method not expected in the current exchange state
    UnexpectedMethod = -32001,
    /// Hardware locked by (or not yet authenticated to) another source
    HwLocked = -32002,
}

impl TryFrom<i64> for ErrorCode {
    type Error = i64;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        let c = match v {
            -32600 => Self::InvalidRequest,
            -32601 => Self::UnknownMethod,
            -32602 => Self::BadParams,
            -32001 => Self::UnexpectedMethod,
            -32002 => Self::HwLocked,
            _ => return Err(v),
        };
        Ok(c)
    }
}

/// RPC request envelope, generic over parameter types
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RpcRequest<P = Value> {
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

impl<P> RpcRequest<P> {
    /// Create a new request
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Option<P>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// RPC error object
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ByteBuf>,
}

impl RpcError {
    /// Create a new error object
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    /// Attach opaque error data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(ByteBuf::from(data));
        self
    }

    /// Resolve error code, if known
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::try_from(self.code as i64).ok()
    }
}

impl core::fmt::Display for RpcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// RPC response envelope, carrying exactly one of `result` or `error`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RpcResponse<T = Value> {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl<T> RpcResponse<T> {
    /// Create a successful response
    pub fn ok(id: impl Into<String>, result: T) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(id: impl Into<String>, error: RpcError) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// Fetch response result, if successful
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Fetch response error, if failed
    pub fn error(&self) -> Option<&RpcError> {
        self.error.as_ref()
    }

    /// Split a decoded response into id and outcome,
    /// rejecting responses carrying both or neither fields
    pub fn into_parts(self) -> Result<(String, Result<T, RpcError>), Error> {
        match (self.result, self.error) {
            (Some(r), None) => Ok((self.id, Ok(r))),
            (None, Some(e)) => Ok((self.id, Err(e))),
            _ => Err(Error::MalformedResponse),
        }
    }

    /// Map result type (used for typed succesful responses)
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RpcResponse<U> {
        RpcResponse {
            id: self.id,
            result: self.result.map(f),
            error: self.error,
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use jade_proto::{ErrorCode, RpcError};

use super::DriverError;

/// [Engine][super::Engine] errors, [Display][core::fmt::Display]
/// output is the message returned on the wire
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request envelope
    #[error("Invalid RPC Request message")]
    InvalidRequest,

    /// Method not found in registry
    #[error("Unknown method")]
    UnknownMethod,

    /// Method not valid in the current exchange state
    #[error("Unexpected method")]
    UnexpectedMethod,

    /// Sensitive method from a source not holding the session lock
    #[error("Cannot process: Hardware locked or uninitialised")]
    Locked,

    /// Parameters missing or not a map
    #[error("Expecting parameters map")]
    ExpectingParams,

    /// Failed to extract a parameter field
    #[error("Failed to extract {0} from parameters")]
    Extract(&'static str),

    /// Parameters rejected
    #[error("{0}")]
    BadParams(&'static str),

    /// Driver operation failed
    #[error("{0}")]
    Driver(DriverError),
}

impl Error {
    /// Fetch wire error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidRequest => ErrorCode::InvalidRequest,
            Error::UnknownMethod => ErrorCode::UnknownMethod,
            Error::UnexpectedMethod => ErrorCode::UnexpectedMethod,
            Error::Locked => ErrorCode::HwLocked,
            Error::ExpectingParams
            | Error::Extract(_)
            | Error::BadParams(_)
            | Error::Driver(_) => ErrorCode::BadParams,
        }
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

impl From<Error> for RpcError {
    fn from(e: Error) -> Self {
        RpcError::new(e.code(), e.to_string())
    }
}

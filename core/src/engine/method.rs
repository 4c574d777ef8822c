// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Method registry

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// RPC methods supported by the [Engine][super::Engine]
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumVariantNames, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Method {
    GetVersionInfo,
    AddEntropy,
    SetMnemonic,
    SetSeed,
    GetXpub,
    GetReceiveAddress,
    SignMessage,
    GetBlindingKey,
    GetSharedNonce,
    GetBlindingFactor,
    GetCommitments,
    DebugSelfcheck,
    Logout,

    AuthUser,
    DebugHandshake,
    HandshakeInit,
    HandshakeComplete,

    SignTx,
    SignLiquidTx,
    TxInput,

    Ota,
    OtaData,
    OtaComplete,
}

/// Multi-message exchange families
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Family {
    Handshake,
    Signing,
    Ota,
}

/// Method sequencing classes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Class {
    /// Valid at any time, never disturbs a pending exchange
    Standalone,
    /// Starts (or restarts) an exchange of the provided family
    Initiating(Family),
    /// Valid only where the pending exchange expects it
    Continuation(Family),
}

impl Method {
    /// Fetch method sequencing class
    pub fn class(&self) -> Class {
        use Method::*;

        match self {
            AuthUser | DebugHandshake => Class::Initiating(Family::Handshake),
            HandshakeInit | HandshakeComplete => Class::Continuation(Family::Handshake),

            SignTx | SignLiquidTx => Class::Initiating(Family::Signing),
            TxInput => Class::Continuation(Family::Signing),

            Ota => Class::Initiating(Family::Ota),
            OtaData | OtaComplete => Class::Continuation(Family::Ota),

            _ => Class::Standalone,
        }
    }

    /// Check whether a method requires the caller to hold the session lock
    pub fn is_sensitive(&self) -> bool {
        use Method::*;

        matches!(
            self,
            GetXpub
                | GetReceiveAddress
                | SignMessage
                | SignTx
                | SignLiquidTx
                | TxInput
                | GetBlindingKey
                | GetSharedNonce
                | GetBlindingFactor
                | GetCommitments
        )
    }
}

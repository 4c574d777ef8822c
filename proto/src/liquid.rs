// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Confidential transaction (liquid) wire objects

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

/// Blinding factor kinds for `get_blinding_factor`
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    strum::Display,
    strum::EnumString,
    strum::EnumVariantNames,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BlindingFactorKind {
    /// Asset blinding factor (abf)
    Asset,
    /// Value blinding factor (vbf)
    Value,
}

/// Maximum encoded length of a [BlindingFactorKind]
pub const MAX_BF_KIND_LEN: usize = 8;

/// Output commitments, as returned by `get_commitments`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Commitments {
    pub abf: ByteBuf,
    pub vbf: ByteBuf,
    pub asset_generator: ByteBuf,
    pub value_commitment: ByteBuf,
    pub hmac: ByteBuf,
    pub asset_id: ByteBuf,
    pub value: u64,
}

/// Trusted commitment supplied for each blinded output of a `sign_liquid_tx`,
/// unblinded outputs are sent as `null` (or an empty map)
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TrustedCommitment {
    pub asset_id: ByteBuf,
    pub value: u64,
    pub asset_generator: ByteBuf,
    pub value_commitment: ByteBuf,
    pub blinding_key: ByteBuf,
    pub hmac: ByteBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abf: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vbf: Option<ByteBuf>,
}

impl Commitments {
    /// Build the trusted commitment form for a `sign_liquid_tx` request,
    /// attaching the output blinding key
    pub fn trusted(&self, blinding_key: &[u8]) -> TrustedCommitment {
        TrustedCommitment {
            asset_id: self.asset_id.clone(),
            value: self.value,
            asset_generator: self.asset_generator.clone(),
            value_commitment: self.value_commitment.clone(),
            blinding_key: ByteBuf::from(blinding_key.to_vec()),
            hmac: self.hmac.clone(),
            abf: Some(self.abf.clone()),
            vbf: Some(self.vbf.clone()),
        }
    }
}

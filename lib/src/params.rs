// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Typed request parameters
//!
//! Optional fields are omitted from the encoded map where unset.

use serde::Serialize;

use jade_proto::{liquid::TrustedCommitment, ByteBuf, Network};

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct EntropyParams {
    pub entropy: ByteBuf,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct MnemonicParams {
    pub mnemonic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SeedParams {
    pub seed: ByteBuf,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct NetworkParams {
    pub network: Network,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct XpubParams {
    pub network: Network,
    pub path: Vec<u32>,
}

/// Receive address request, single-sig (with variant) or green multisig
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum ReceiveAddress {
    SingleSig {
        network: Network,
        variant: String,
        path: Vec<u32>,
    },
    Green {
        network: Network,
        subaccount: u32,
        branch: u32,
        pointer: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        recovery_xpub: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        csv_blocks: Option<u32>,
    },
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SignMessageParams {
    pub path: Vec<u32>,
    pub message: String,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BlindingKeyParams {
    pub script: ByteBuf,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SharedNonceParams {
    pub script: ByteBuf,
    pub their_pubkey: ByteBuf,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BlindingFactorParams {
    pub hash_prevouts: ByteBuf,
    pub output_index: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct CommitmentsParams {
    pub asset_id: ByteBuf,
    pub value: u64,
    pub hash_prevouts: ByteBuf,
    pub output_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbf: Option<ByteBuf>,
}

/// Change output path
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ChangePath {
    pub path: Vec<u32>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SignTxParams {
    pub network: Network,
    pub txn: ByteBuf,
    pub num_inputs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Vec<Option<ChangePath>>>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SignLiquidTxParams {
    pub network: Network,
    pub txn: ByteBuf,
    pub num_inputs: u32,
    pub trusted_commitments: Vec<Option<TrustedCommitment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Vec<Option<ChangePath>>>,
}

/// Transaction input, inputs without a path are not signed
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct TxInputParams {
    pub is_witness: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tx: Option<ByteBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satoshi: Option<u64>,
    pub script: ByteBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_commitment: Option<ByteBuf>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct OtaParams {
    pub fwsize: u32,
    pub cmpsize: u32,
}

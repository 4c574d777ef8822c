// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::str::FromStr;

use zeroize::Zeroizing;

use jade_proto::{
    liquid::{BlindingFactorKind, MAX_BF_KIND_LEN},
    txn, Network, Value, OTA_MAX_CHUNK,
};

use super::{
    params::{self, Params},
    AddressKind, Commitment, Error, Method, ScriptVariant, TxInput,
};

/// Seed length bounds for `set_seed`
const SEED_LEN: core::ops::RangeInclusive<usize> = 16..=64;

/// [`Engine`][super::Engine] input events, parsed from request methods and parameters
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    /// Fetch version / status information
    GetVersionInfo,

    /// Mix caller entropy
    AddEntropy { entropy: Vec<u8> },

    /// Set a temporary keychain from a mnemonic (test use)
    SetMnemonic {
        mnemonic: Zeroizing<String>,
        passphrase: Option<Zeroizing<String>>,
    },

    /// Set a temporary keychain from a seed (test use)
    SetSeed { seed: Zeroizing<Vec<u8>> },

    /// Fetch an xpub
    GetXpub { network: Network, path: Vec<u32> },

    /// Fetch a receive address
    GetReceiveAddress { network: Network, kind: AddressKind },

    /// Sign a message
    SignMessage { path: Vec<u32>, message: String },

    /// Fetch a script blinding key
    GetBlindingKey { script: Vec<u8> },

    /// Compute a shared nonce
    GetSharedNonce {
        script: Vec<u8>,
        their_pubkey: [u8; 33],
    },

    /// Fetch an output blinding factor
    GetBlindingFactor {
        hash_prevouts: [u8; 32],
        output_index: u32,
        kind: BlindingFactorKind,
    },

    /// Compute output commitments
    GetCommitments {
        asset_id: [u8; 32],
        value: u64,
        hash_prevouts: [u8; 32],
        output_index: u32,
        vbf: Option<[u8; 32]>,
    },

    /// Run internal self checks
    DebugSelfcheck,

    /// Release the session lock
    Logout,

    /// Start user authentication against the PIN server
    AuthUser { network: Network },

    /// Start a test handshake against the PIN server
    DebugHandshake,

    /// Server key exchange
    HandshakeInit { ske: [u8; 33], sig: [u8; 64] },

    /// Server (encrypted) key
    HandshakeComplete {
        encrypted_key: Vec<u8>,
        hmac: [u8; 32],
    },

    /// Declare a bitcoin transaction for signing
    SignTx {
        network: Network,
        txn: Vec<u8>,
        layout: txn::TxLayout,
        change: Option<Vec<Option<Vec<u32>>>>,
    },

    /// Declare a liquid transaction for signing
    SignLiquidTx {
        network: Network,
        txn: Vec<u8>,
        layout: txn::TxLayout,
        commitments: Vec<Option<Commitment>>,
        change: Option<Vec<Option<Vec<u32>>>>,
    },

    /// Transaction input
    TxInput(TxInput),

    /// Start a firmware update
    Ota { fwsize: usize, cmpsize: usize },

    /// Firmware chunk
    OtaData(Vec<u8>),

    /// Finalise firmware update
    OtaComplete,
}

impl Event {
    /// Parse an event from method and parameters,
    /// `tx_network` is the network of a pending signing exchange.
    pub fn parse(
        method: Method,
        params: Option<&Value>,
        tx_network: Option<Network>,
    ) -> Result<Self, Error> {
        use Method as M;

        // Methods without parameters
        let p = match method {
            M::GetVersionInfo => return Ok(Event::GetVersionInfo),
            M::DebugSelfcheck => return Ok(Event::DebugSelfcheck),
            M::Logout => return Ok(Event::Logout),
            M::DebugHandshake => return Ok(Event::DebugHandshake),
            M::OtaComplete => return Ok(Event::OtaComplete),
            M::OtaData => return parse_ota_data(params),
            _ => Params::new(params)?,
        };

        let evt = match method {
            M::AddEntropy => Event::AddEntropy {
                entropy: p.bytes("entropy", "valid entropy bytes")?.to_vec(),
            },
            M::SetMnemonic => Event::SetMnemonic {
                mnemonic: Zeroizing::new(p.string("mnemonic", "valid mnemonic")?.to_string()),
                passphrase: p
                    .opt_string("passphrase", "valid passphrase")?
                    .map(|s| Zeroizing::new(s.to_string())),
            },
            M::SetSeed => {
                let seed = p.bytes("seed", "valid seed")?;
                if !SEED_LEN.contains(&seed.len()) {
                    return Err(Error::Extract("valid seed"));
                }
                Event::SetSeed {
                    seed: Zeroizing::new(seed.to_vec()),
                }
            }
            M::GetXpub => Event::GetXpub {
                network: p.network()?,
                path: p.path("path", true)?,
            },
            M::GetReceiveAddress => Event::GetReceiveAddress {
                network: p.network()?,
                kind: parse_address(&p)?,
            },
            M::SignMessage => Event::SignMessage {
                path: p.path("path", false)?,
                message: p.string("message", "message")?.to_string(),
            },
            M::GetBlindingKey => Event::GetBlindingKey {
                script: p.bytes("script", "script")?.to_vec(),
            },
            M::GetSharedNonce => Event::GetSharedNonce {
                script: p.bytes("script", "script")?.to_vec(),
                their_pubkey: p.array("their_pubkey", "their_pubkey")?,
            },
            M::GetBlindingFactor => {
                let hash_prevouts = p.array("hash_prevouts", "hash_prevouts")?;
                let output_index = p.u32("output_index", "output index")?;

                let kind = p.string("type", "blinding factor type")?;
                if kind.len() > MAX_BF_KIND_LEN {
                    return Err(Error::Extract("blinding factor type"));
                }
                let kind = BlindingFactorKind::from_str(kind)
                    .map_err(|_| Error::BadParams("Invalid blinding factor type"))?;

                Event::GetBlindingFactor {
                    hash_prevouts,
                    output_index,
                    kind,
                }
            }
            M::GetCommitments => Event::GetCommitments {
                asset_id: p.array("asset_id", "asset_id")?,
                value: p.u64("value", "value")?,
                hash_prevouts: p.array("hash_prevouts", "hash_prevouts")?,
                output_index: p.u32("output_index", "output index")?,
                vbf: p.opt_array("vbf", "vbf")?,
            },
            M::AuthUser => Event::AuthUser {
                network: p.network()?,
            },
            M::HandshakeInit => Event::HandshakeInit {
                ske: hex_field(&p, "ske")?,
                sig: hex_field(&p, "sig")?,
            },
            M::HandshakeComplete => {
                let encrypted_key = match p.get("encrypted_key") {
                    Some(Value::Text(s)) => hex::decode(s).ok().filter(|v| !v.is_empty()),
                    _ => None,
                };

                Event::HandshakeComplete {
                    encrypted_key: encrypted_key.ok_or(Error::Extract("encrypted_key"))?,
                    hmac: hex_field(&p, "hmac")?,
                }
            }
            M::SignTx => {
                let network = p.network()?;
                if network.is_liquid() {
                    return Err(Error::BadParams(
                        "sign_tx call not appropriate for liquid network",
                    ));
                }

                let (txn, layout) = parse_txn(&p, "tx", false)?;
                let change = parse_change(&p, layout.num_outputs)?;

                Event::SignTx {
                    network,
                    txn,
                    layout,
                    change,
                }
            }
            M::SignLiquidTx => {
                let network = p.network()?;
                if !network.is_liquid() {
                    return Err(Error::BadParams(
                        "sign_liquid_tx call only appropriate for liquid network",
                    ));
                }

                let (txn, layout) = parse_txn(&p, "txn", true)?;

                let commitments = p.list("trusted_commitments", "trusted commitments")?;
                if commitments.len() != layout.num_outputs {
                    return Err(Error::BadParams("Unexpected number of trusted commitments"));
                }
                let commitments = commitments
                    .iter()
                    .map(parse_commitment)
                    .collect::<Result<Vec<_>, _>>()?;

                let change = parse_change(&p, layout.num_outputs)?;

                Event::SignLiquidTx {
                    network,
                    txn,
                    layout,
                    commitments,
                    change,
                }
            }
            M::TxInput => Event::TxInput(parse_tx_input(&p, tx_network)?),
            M::Ota => {
                let fwsize = p.u32("fwsize", "fwsize");
                let cmpsize = p.u32("cmpsize", "cmpsize");

                match (fwsize, cmpsize) {
                    (Ok(f), Ok(c)) if c > 0 && c < f => Event::Ota {
                        fwsize: f as usize,
                        cmpsize: c as usize,
                    },
                    _ => return Err(Error::BadParams("Bad parameters")),
                }
            }
            // Parameterless methods returned above
            M::GetVersionInfo
            | M::DebugSelfcheck
            | M::Logout
            | M::DebugHandshake
            | M::OtaData
            | M::OtaComplete => return Err(Error::UnexpectedMethod),
        };

        Ok(evt)
    }
}

fn parse_ota_data(params: Option<&Value>) -> Result<Event, Error> {
    match params {
        Some(Value::Bytes(b)) if !b.is_empty() && b.len() <= OTA_MAX_CHUNK => {
            Ok(Event::OtaData(b.clone()))
        }
        _ => Err(Error::Extract("ota data")),
    }
}

fn hex_field<const N: usize>(p: &Params, key: &'static str) -> Result<[u8; N], Error> {
    match p.get(key) {
        Some(Value::Text(s)) => jade_proto::hex_array(s).map_err(|_| Error::Extract(key)),
        _ => Err(Error::Extract(key)),
    }
}

fn parse_address(p: &Params) -> Result<AddressKind, Error> {
    // Single-sig variant with explicit path
    if let Some(v) = p.get("variant") {
        let variant = match v {
            Value::Text(s) => ScriptVariant::from_str(s).ok(),
            _ => None,
        }
        .ok_or(Error::BadParams("Invalid script variant parameter"))?;

        return Ok(AddressKind::SingleSig {
            variant,
            path: p.path("path", false)?,
        });
    }

    // Otherwise green multisig
    let subaccount = p.u32("subaccount", "path elements")?;
    let branch = p.u32("branch", "path elements")?;
    let pointer = p.u32("pointer", "path elements")?;

    Ok(AddressKind::Green {
        subaccount,
        branch,
        pointer,
        recovery_xpub: p
            .opt_string("recovery_xpub", "recovery xpub")?
            .map(|s| s.to_string()),
        csv_blocks: p.opt_u32("csv_blocks", "csv blocks")?,
    })
}

fn parse_txn(
    p: &Params,
    what: &'static str,
    liquid: bool,
) -> Result<(Vec<u8>, txn::TxLayout), Error> {
    let txn = p.bytes("txn", what)?;
    let layout = txn::scan(txn, liquid).map_err(|_e| {
        #[cfg(feature = "log")]
        log::debug!("transaction scan failed: {:?}", _e);

        Error::Extract(what)
    })?;

    match p.u32("num_inputs", "valid number of inputs")? {
        0 => return Err(Error::Extract("valid number of inputs")),
        n if n as usize != layout.num_inputs => {
            return Err(Error::BadParams("Unexpected number of inputs"))
        }
        _ => (),
    }

    Ok((txn.to_vec(), layout))
}

fn parse_change(p: &Params, num_outputs: usize) -> Result<Option<Vec<Option<Vec<u32>>>>, Error> {
    let change = match p.opt_list("change", "valid change path")? {
        Some(v) => v,
        None => return Ok(None),
    };

    if change.len() != num_outputs {
        return Err(Error::BadParams(
            "Unexpected number of output (change) entries",
        ));
    }

    change
        .iter()
        .map(|c| match c {
            Value::Null => Ok(None),
            Value::Map(m) => m
                .get(&Value::Text("path".to_string()))
                .and_then(|v| params::path(v, false))
                .map(Some)
                .ok_or(Error::Extract("valid change path")),
            _ => Err(Error::Extract("valid change path")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_commitment(v: &Value) -> Result<Option<Commitment>, Error> {
    const WHAT: &str = "trusted commitments";

    let p = match v {
        Value::Null => return Ok(None),
        Value::Map(m) if m.is_empty() => return Ok(None),
        Value::Map(_) => Params::new(Some(v))?,
        _ => return Err(Error::Extract(WHAT)),
    };

    Ok(Some(Commitment {
        asset_id: p.array("asset_id", WHAT)?,
        value: p.u64("value", WHAT)?,
        asset_generator: p.array("asset_generator", WHAT)?,
        value_commitment: p.array("value_commitment", WHAT)?,
        blinding_key: p.array("blinding_key", WHAT)?,
        hmac: p.array("hmac", WHAT)?,
        abf: p.opt_array("abf", WHAT)?,
        vbf: p.opt_array("vbf", WHAT)?,
    }))
}

fn parse_tx_input(p: &Params, tx_network: Option<Network>) -> Result<TxInput, Error> {
    let liquid = tx_network.map(|n| n.is_liquid()).unwrap_or(false);

    let is_witness = p.bool("is_witness", "is_witness")?;

    let input_tx = match !liquid && !is_witness {
        true => Some(p.bytes("input_tx", "input_tx")?.to_vec()),
        false => None,
    };

    let path = p.opt_path("path")?;

    let satoshi = match !liquid && is_witness {
        true => Some(p.u64("satoshi", "satoshi")?),
        false => None,
    };

    let script = p.bytes("script", "script")?.to_vec();

    let value_commitment = match liquid && is_witness {
        true => Some(p.array("value_commitment", "value commitment")?),
        false => None,
    };

    Ok(TxInput {
        is_witness,
        input_tx,
        path,
        satoshi,
        script,
        value_commitment,
    })
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for interacting with Jade devices

use std::path::Path;

use clap::Parser;
use log::{debug, error, info, LevelFilter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use jade::{
    params::{ChangePath, ReceiveAddress, TxInputParams},
    proto::{liquid::BlindingFactorKind, ByteBuf, Network},
    transport::{GenericTransport, TcpOptions},
    Connect, DeviceHandle, HttpPinServer, JadeProvider,
};

mod helpers;
use helpers::*;

/// Jade command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Device connection
    #[clap(flatten)]
    tcp: TcpOptions,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info", env)]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// Fetch device version info
    Info,

    /// Mix random entropy into the device pool
    AddEntropy {
        /// hex-encoded entropy
        entropy: HexBytes,
    },

    /// Unlock the device via the PIN server
    Auth {
        /// Network for the session
        #[clap(long, default_value = "testnet")]
        network: Network,
    },

    /// Exercise the PIN server handshake
    DebugHandshake,

    /// Fetch an xpub
    Xpub {
        #[clap(long, default_value = "testnet")]
        network: Network,

        /// BIP-32 derivation path
        #[clap(long, default_value = "m")]
        path: Bip32Path,
    },

    /// Fetch a single-sig receive address
    Address {
        #[clap(long, default_value = "testnet")]
        network: Network,

        /// Script variant (eg. `sh(wpkh(k))`)
        #[clap(long, default_value = "wpkh(k)")]
        variant: String,

        /// BIP-32 derivation path
        #[clap(long)]
        path: Bip32Path,
    },

    /// Fetch a green multisig receive address
    GreenAddress {
        #[clap(long, default_value = "testnet")]
        network: Network,

        #[clap(long, default_value = "0")]
        subaccount: u32,

        #[clap(long, default_value = "1")]
        branch: u32,

        #[clap(long)]
        pointer: u32,

        /// Recovery xpub (2of3 subaccounts)
        #[clap(long)]
        recovery_xpub: Option<String>,

        /// CSV blocks (csv subaccounts)
        #[clap(long)]
        csv_blocks: Option<u32>,
    },

    /// Sign a message
    SignMessage {
        #[clap(long)]
        path: Bip32Path,

        message: String,
    },

    /// Fetch a script blinding key
    BlindingKey {
        /// hex-encoded script
        script: HexBytes,
    },

    /// Fetch an output blinding factor
    BlindingFactor {
        #[clap(long)]
        hash_prevouts: HexData<32>,

        #[clap(long)]
        output_index: u32,

        /// Factor type (ASSET / VALUE)
        #[clap(long, default_value = "ASSET")]
        kind: BlindingFactorKind,
    },

    /// Sign a transaction described by a JSON file
    SignTx {
        /// Input file (`.json`)
        #[clap(long)]
        input: String,

        /// Output file for signatures (`.json`)
        #[clap(long)]
        output: String,
    },

    /// Upload a compressed firmware image
    Ota {
        /// Compressed firmware file
        #[clap(long)]
        file: String,

        /// Uncompressed firmware size
        #[clap(long)]
        fwsize: usize,

        /// Chunk size (defaults to device maximum)
        #[clap(long)]
        chunk: Option<usize>,
    },

    /// Run device self checks
    Selfcheck,

    /// Release the device session lock
    Logout,
}

/// Transaction signing request file
#[derive(Clone, PartialEq, Debug, Deserialize)]
struct TxFile {
    network: Network,
    /// hex-encoded transaction
    txn: String,
    inputs: Vec<TxFileInput>,
    #[serde(default)]
    change: Option<Vec<Option<Vec<u32>>>>,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct TxFileInput {
    is_witness: bool,
    #[serde(default)]
    input_tx: Option<String>,
    #[serde(default)]
    path: Option<Vec<u32>>,
    #[serde(default)]
    satoshi: Option<u64>,
    script: String,
}

/// Signature output file
#[derive(Clone, PartialEq, Debug, Serialize)]
struct SigFile {
    signatures: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default());

    // Connect to device
    let p = JadeProvider::new();

    debug!("Connecting to: {}", args.tcp.addr);

    let t = match Connect::<GenericTransport>::connect(&p, &args.tcp).await {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to connect to device: {}", args.tcp.addr);
            return Err(e.into());
        }
    };

    // Execute command
    execute(t, args.cmd).await?;

    Ok(())
}

/// Execute a command with the provided transport
async fn execute<T>(t: DeviceHandle<T>, cmd: Actions) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    debug!("Executing command: {:?}", cmd);

    match cmd {
        Actions::Info => {
            let i = t.version_info().await?;

            info!("version info: {:#?}", i);
        }
        Actions::AddEntropy { entropy } => {
            t.add_entropy(entropy.as_ref()).await?;
        }
        Actions::Auth { network } => {
            info!("authenticating for {}", network);

            let ok = t.auth_user(network, &HttpPinServer::new()).await?;

            info!("authenticated: {}", ok);
        }
        Actions::DebugHandshake => {
            let ok = t.debug_handshake(&HttpPinServer::new()).await?;

            info!("handshake complete: {}", ok);
        }
        Actions::Xpub { network, path } => {
            let x = t.get_xpub(network, path.as_ref()).await?;

            info!("xpub: {}", x);
        }
        Actions::Address {
            network,
            variant,
            path,
        } => {
            let a = t
                .get_receive_address(&ReceiveAddress::SingleSig {
                    network,
                    variant,
                    path: path.0,
                })
                .await?;

            info!("address: {}", a);
        }
        Actions::GreenAddress {
            network,
            subaccount,
            branch,
            pointer,
            recovery_xpub,
            csv_blocks,
        } => {
            let a = t
                .get_receive_address(&ReceiveAddress::Green {
                    network,
                    subaccount,
                    branch,
                    pointer,
                    recovery_xpub,
                    csv_blocks,
                })
                .await?;

            info!("address: {}", a);
        }
        Actions::SignMessage { path, message } => {
            let s = t.sign_message(path.as_ref(), &message).await?;

            info!("signature: {}", s);
        }
        Actions::BlindingKey { script } => {
            let k = t.get_blinding_key(script.as_ref()).await?;

            info!("blinding key: {}", hex::encode(k));
        }
        Actions::BlindingFactor {
            hash_prevouts,
            output_index,
            kind,
        } => {
            let f = t
                .get_blinding_factor(hash_prevouts.as_ref(), output_index, kind)
                .await?;

            info!("{} blinding factor: {}", kind, hex::encode(f));
        }
        Actions::SignTx { input, output } => {
            let req: TxFile = read_input(&input).await?;

            let txn = hex::decode(&req.txn)?;
            let inputs = req
                .inputs
                .iter()
                .map(|i| {
                    Ok(TxInputParams {
                        is_witness: i.is_witness,
                        input_tx: i
                            .input_tx
                            .as_ref()
                            .map(hex::decode)
                            .transpose()?
                            .map(ByteBuf::from),
                        path: i.path.clone(),
                        satoshi: i.satoshi,
                        script: ByteBuf::from(hex::decode(&i.script)?),
                        value_commitment: None,
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let change = req.change.map(|c| {
                c.into_iter()
                    .map(|p| p.map(|path| ChangePath { path }))
                    .collect()
            });

            debug!("Signing {} inputs", inputs.len());

            let sigs = t.sign_tx(req.network, &txn, &inputs, change).await?;

            let resp = SigFile {
                signatures: sigs.iter().map(hex::encode).collect(),
            };
            write_output(&output, &resp).await?;
        }
        Actions::Ota {
            file,
            fwsize,
            chunk,
        } => {
            let fw = tokio::fs::read(&file).await?;

            let chunk = match chunk {
                Some(c) => c,
                None => t.version_info().await?.jade_ota_max_chunk as usize,
            };

            info!("uploading {} ({} bytes, chunk: {})", file, fw.len(), chunk);

            let ok = t.ota(&fw, fwsize, chunk).await?;

            info!("ota complete: {}", ok);
        }
        Actions::Selfcheck => {
            let ok = t.debug_selfcheck().await?;

            info!("selfcheck: {}", ok);
        }
        Actions::Logout => {
            t.logout().await?;
        }
    }

    Ok(())
}

/// Helper to read input files where required
async fn read_input<T: DeserializeOwned>(file_name: &str) -> anyhow::Result<T> {
    debug!("Reading input from '{}'", file_name);

    let s = tokio::fs::read_to_string(file_name).await?;

    // Determine format from file name
    let p = Path::new(file_name);

    // Decode based on input extension
    let v = match p.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&s)?,
        _ => return Err(anyhow::anyhow!("unsupported input file format")),
    };

    Ok(v)
}

/// Helper to write output files
async fn write_output(file_name: &str, value: &impl Serialize) -> anyhow::Result<()> {
    debug!("Writing output to '{}'", file_name);

    // Determine format from file name
    let p = Path::new(file_name);
    match p.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let s = serde_json::to_string(value)?;
            tokio::fs::write(p, s).await?;
        }
        _ => return Err(anyhow::anyhow!("unsupported output file format")),
    }

    Ok(())
}

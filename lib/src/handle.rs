// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for connected Jade devices
//!
//! This provides methods for interacting with the device
//! and is generic over byte stream transports

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, trace};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use jade_proto::{
    encode_frame,
    liquid::{BlindingFactorKind, Commitments, TrustedCommitment},
    ByteBuf, Frame, FrameDecoder, HttpRequest, Network, RpcRequest, RpcResponse, Value, VersionInfo,
};

use crate::{params::*, pinserver::PinServer, Error};

/// Read buffer size
const READ_BUFF_LEN: usize = 4096;

/// Stream and response reassembly state
struct Channel<T> {
    t: T,
    decoder: FrameDecoder,
    pending: VecDeque<Frame>,
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Channel<T> {
    /// Read until a complete frame is available
    async fn next_frame(&mut self) -> Result<Frame, Error> {
        let mut buff = [0u8; READ_BUFF_LEN];

        loop {
            if let Some(f) = self.pending.pop_front() {
                return Ok(f);
            }

            let n = self.t.read(&mut buff).await?;
            if n == 0 {
                return Err(Error::Closed);
            }

            self.pending.extend(self.decoder.feed(&buff[..n]));
        }
    }
}

/// Handle for a connected Jade device.
///
/// This is generic over transports to support serial / BLE bridges,
/// TCP simulators and in-process connections
#[derive(Clone)]
pub struct DeviceHandle<T> {
    /// Transport for communication
    t: Arc<Mutex<Channel<T>>>,
    /// Request id counter
    next_id: Arc<AtomicU32>,
    /// Timeout for user interaction / PIN server exchanges
    user_timeout_s: usize,
    /// Timeout for plain requests
    request_timeout_s: usize,
}

/// Create a [DeviceHandle] wrapper from a byte stream transport
impl<T: AsyncRead + AsyncWrite + Unpin + Send> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self {
            t: Arc::new(Mutex::new(Channel {
                t,
                decoder: FrameDecoder::default(),
                pending: VecDeque::new(),
            })),
            next_id: Arc::new(AtomicU32::new(1)),
            user_timeout_s: 120,
            request_timeout_s: 2,
        }
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DeviceHandle<T> {
    /// Override request and user interaction timeouts
    pub fn with_timeouts(mut self, request_timeout_s: usize, user_timeout_s: usize) -> Self {
        self.request_timeout_s = request_timeout_s;
        self.user_timeout_s = user_timeout_s;
        self
    }

    /// Helper to fetch user interaction timeout
    pub fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_s as u64)
    }

    /// Helper to fetch request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s as u64)
    }

    /// Fetch device version / status information
    pub async fn version_info(&self) -> Result<VersionInfo, Error> {
        debug!("Requesting version info");

        self.request::<(), _>("get_version_info", None, self.request_timeout())
            .await
    }

    /// Mix caller entropy into the device pool
    pub async fn add_entropy(&self, entropy: &[u8]) -> Result<bool, Error> {
        let p = EntropyParams {
            entropy: ByteBuf::from(entropy.to_vec()),
        };
        self.request("add_entropy", Some(p), self.request_timeout())
            .await
    }

    /// Set a temporary wallet from a mnemonic (unlocks this connection)
    pub async fn set_mnemonic(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
    ) -> Result<bool, Error> {
        let p = MnemonicParams {
            mnemonic: mnemonic.to_string(),
            passphrase: passphrase.map(|s| s.to_string()),
        };
        self.request("set_mnemonic", Some(p), self.request_timeout())
            .await
    }

    /// Set a temporary wallet from a bip39 seed (unlocks this connection)
    pub async fn set_seed(&self, seed: &[u8]) -> Result<bool, Error> {
        let p = SeedParams {
            seed: ByteBuf::from(seed.to_vec()),
        };
        self.request("set_seed", Some(p), self.request_timeout())
            .await
    }

    /// Fetch the xpub for the provided path
    pub async fn get_xpub(&self, network: Network, path: &[u32]) -> Result<String, Error> {
        debug!("Requesting xpub for {} {:?}", network, path);

        let p = XpubParams {
            network,
            path: path.to_vec(),
        };
        self.request("get_xpub", Some(p), self.request_timeout())
            .await
    }

    /// Fetch a receive address
    pub async fn get_receive_address(&self, addr: &ReceiveAddress) -> Result<String, Error> {
        debug!("Requesting receive address {:?}", addr);

        self.request("get_receive_address", Some(addr), self.user_timeout())
            .await
    }

    /// Sign a message, returning the base64 recoverable signature
    pub async fn sign_message(&self, path: &[u32], message: &str) -> Result<String, Error> {
        let p = SignMessageParams {
            path: path.to_vec(),
            message: message.to_string(),
        };
        self.request("sign_message", Some(p), self.user_timeout())
            .await
    }

    /// Fetch the blinding key for a script
    pub async fn get_blinding_key(&self, script: &[u8]) -> Result<Vec<u8>, Error> {
        let p = BlindingKeyParams {
            script: ByteBuf::from(script.to_vec()),
        };
        let r: ByteBuf = self
            .request("get_blinding_key", Some(p), self.request_timeout())
            .await?;
        Ok(r.into_vec())
    }

    /// Compute the shared nonce for a script and counterparty key
    pub async fn get_shared_nonce(
        &self,
        script: &[u8],
        their_pubkey: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let p = SharedNonceParams {
            script: ByteBuf::from(script.to_vec()),
            their_pubkey: ByteBuf::from(their_pubkey.to_vec()),
        };
        let r: ByteBuf = self
            .request("get_shared_nonce", Some(p), self.request_timeout())
            .await?;
        Ok(r.into_vec())
    }

    /// Fetch an output blinding factor
    pub async fn get_blinding_factor(
        &self,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        kind: BlindingFactorKind,
    ) -> Result<Vec<u8>, Error> {
        let p = BlindingFactorParams {
            hash_prevouts: ByteBuf::from(hash_prevouts.to_vec()),
            output_index,
            kind: kind.to_string(),
        };
        let r: ByteBuf = self
            .request("get_blinding_factor", Some(p), self.request_timeout())
            .await?;
        Ok(r.into_vec())
    }

    /// Compute output commitments
    pub async fn get_commitments(
        &self,
        asset_id: &[u8; 32],
        value: u64,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        vbf: Option<&[u8; 32]>,
    ) -> Result<Commitments, Error> {
        let p = CommitmentsParams {
            asset_id: ByteBuf::from(asset_id.to_vec()),
            value,
            hash_prevouts: ByteBuf::from(hash_prevouts.to_vec()),
            output_index,
            vbf: vbf.map(|v| ByteBuf::from(v.to_vec())),
        };
        self.request("get_commitments", Some(p), self.request_timeout())
            .await
    }

    /// Run device self checks
    pub async fn debug_selfcheck(&self) -> Result<bool, Error> {
        self.request::<(), _>("debug_selfcheck", None, self.user_timeout())
            .await
    }

    /// Release the session lock
    pub async fn logout(&self) -> Result<bool, Error> {
        self.request::<(), _>("logout", None, self.request_timeout())
            .await
    }

    /// Authenticate the user, driving PIN server exchanges via `server`
    pub async fn auth_user<S: PinServer + ?Sized>(
        &self,
        network: Network,
        server: &S,
    ) -> Result<bool, Error> {
        debug!("Authenticating for {}", network);

        let v: Value = self
            .request("auth_user", Some(NetworkParams { network }), self.user_timeout())
            .await?;

        self.http_exchange(v, server).await
    }

    /// Exercise the PIN server handshake without unlocking
    pub async fn debug_handshake<S: PinServer + ?Sized>(&self, server: &S) -> Result<bool, Error> {
        let v: Value = self
            .request::<(), _>("debug_handshake", None, self.user_timeout())
            .await?;

        self.http_exchange(v, server).await
    }

    /// Execute http instructions returned by the device until a boolean result
    pub async fn http_exchange<S: PinServer + ?Sized>(
        &self,
        mut v: Value,
        server: &S,
    ) -> Result<bool, Error> {
        loop {
            let req: HttpRequest<serde_json::Value> = match v {
                Value::Bool(b) => return Ok(b),
                Value::Map(_) => serde_cbor::value::from_value(v)?,
                _ => return Err(Error::UnexpectedResponse),
            };

            let reply = crate::pinserver::execute(server, &req).await?;
            let params = serde_cbor::value::to_value(&reply)?;

            v = self
                .request(req.on_reply(), Some(params), self.user_timeout())
                .await?;
        }
    }

    /// Sign a bitcoin transaction, returning per-input signatures
    /// (empty for inputs without a path)
    pub async fn sign_tx(
        &self,
        network: Network,
        txn: &[u8],
        inputs: &[TxInputParams],
        change: Option<Vec<Option<ChangePath>>>,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let p = SignTxParams {
            network,
            txn: ByteBuf::from(txn.to_vec()),
            num_inputs: inputs.len() as u32,
            change,
        };
        self.sign("sign_tx", p, inputs).await
    }

    /// Sign a liquid transaction with trusted commitments per output
    pub async fn sign_liquid_tx(
        &self,
        network: Network,
        txn: &[u8],
        inputs: &[TxInputParams],
        trusted_commitments: Vec<Option<TrustedCommitment>>,
        change: Option<Vec<Option<ChangePath>>>,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let p = SignLiquidTxParams {
            network,
            txn: ByteBuf::from(txn.to_vec()),
            num_inputs: inputs.len() as u32,
            trusted_commitments,
            change,
        };
        self.sign("sign_liquid_tx", p, inputs).await
    }

    async fn sign<P: Serialize + Send>(
        &self,
        method: &str,
        params: P,
        inputs: &[TxInputParams],
    ) -> Result<Vec<Vec<u8>>, Error> {
        debug!("Starting {} with {} inputs", method, inputs.len());

        let ok: bool = self
            .request(method, Some(params), self.user_timeout())
            .await?;
        if !ok {
            return Err(Error::UnexpectedResponse);
        }

        let (last, rest) = inputs.split_last().ok_or(Error::UnexpectedResponse)?;

        for i in rest {
            let ok: bool = self
                .request("tx_input", Some(i), self.request_timeout())
                .await?;
            if !ok {
                return Err(Error::UnexpectedResponse);
            }
        }

        // Final input returns signatures
        let sigs: Vec<ByteBuf> = self
            .request("tx_input", Some(last), self.user_timeout())
            .await?;
        if sigs.len() != inputs.len() {
            return Err(Error::UnexpectedResponse);
        }

        Ok(sigs.into_iter().map(|s| s.into_vec()).collect())
    }

    /// Upload a (compressed) firmware image in chunks
    pub async fn ota(&self, cmp: &[u8], fwsize: usize, chunk_len: usize) -> Result<bool, Error> {
        debug!("Starting OTA ({} bytes, fwsize: {})", cmp.len(), fwsize);

        let p = OtaParams {
            fwsize: fwsize as u32,
            cmpsize: cmp.len() as u32,
        };
        let ok: bool = self
            .request("ota", Some(p), self.user_timeout())
            .await?;
        if !ok {
            return Err(Error::UnexpectedResponse);
        }

        for (i, c) in cmp.chunks(chunk_len.max(1)).enumerate() {
            trace!("OTA chunk {} ({} bytes)", i, c.len());

            let ok: bool = self
                .request("ota_data", Some(ByteBuf::from(c.to_vec())), self.request_timeout())
                .await?;
            if !ok {
                return Err(Error::UnexpectedResponse);
            }
        }

        self.request::<(), _>("ota_complete", None, self.user_timeout())
            .await
    }

    /// Issue an untyped request, returning the result value
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        self.request(method, params, self.request_timeout()).await
    }

    /// Issue a typed request, decoding the result
    pub async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
        timeout: Duration,
    ) -> Result<R, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let req = RpcRequest::new(id.as_str(), method, params);

        let resp = self.call_raw(&req, timeout).await?;

        let (resp_id, r) = resp.into_parts()?;
        if resp_id != id {
            return Err(Error::UnexpectedId(id, resp_id));
        }

        let v = r?;
        let r = serde_cbor::value::from_value(v)?;

        Ok(r)
    }

    /// Issue an encoded request and await the next response
    pub async fn call_raw<P: Serialize>(
        &self,
        req: &RpcRequest<P>,
        timeout: Duration,
    ) -> Result<RpcResponse, Error> {
        let b = encode_frame(req)?;

        trace!("Sending {} (id: {}, {} bytes)", req.method, req.id, b.len());

        let mut resp = self.exchange_raw(&b, 1, timeout).await?;
        resp.pop().ok_or(Error::UnexpectedResponse)
    }

    /// Write raw bytes and await `n` responses, for exercising framing
    pub async fn exchange_raw(
        &self,
        raw: &[u8],
        n: usize,
        timeout: Duration,
    ) -> Result<Vec<RpcResponse>, Error> {
        let mut ch = self.t.lock().await;

        ch.t.write_all(raw).await?;
        ch.t.flush().await?;

        tokio::time::timeout(timeout, async {
            let mut responses = Vec::with_capacity(n);
            while responses.len() < n {
                let f = ch.next_frame().await?;
                responses.push(f.decode::<RpcResponse>()?);
            }
            Ok::<_, Error>(responses)
        })
        .await?
    }
}

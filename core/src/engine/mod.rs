// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] implements the device side of the RPC protocol.
//!
//! Framed requests are fed in via [Engine::feed], validated, sequenced
//! against the pending exchange, parsed to [Event]s and handled by
//! [Engine::update], with [Output]s returned as encoded response frames.

use core::str::FromStr;

use rand_core::{CryptoRngCore, OsRng};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroizing;

use jade_proto::{
    Frame, FrameDecoder, Network, NetworkType, RpcError, RpcRequest, RpcResponse, Value,
    VersionInfo,
};

use crate::{helpers::EntropyPool, Config};

mod driver;
pub use driver::{
    AddressKind, Driver, DriverError, Keychain, PinRecord, PlatformInfo, ScriptVariant,
    KEYCHAIN_LEN, PIN_ATTEMPTS,
};

mod error;
pub use error::Error;

mod event;
pub use event::Event;

mod handshake;
pub use handshake::{debug_keychain, HandshakeState, DEBUG_PIN};
use handshake::{HandshakeSession, PinMode, Purpose};

mod lock;
pub use lock::{SessionLock, Source};

mod method;
pub use method::{Class, Family, Method};

mod ota;
pub use ota::OtaState;

mod output;
pub use output::Output;

pub mod params;

mod request;
pub use request::{validate, validate_value};

mod signing;
pub use signing::{Commitment, SigningState, TxContext, TxInput};
use signing::SignContext;

/// Engine exchange state enumeration
#[derive(
    Copy, Clone, PartialEq, Debug, Default, EnumString, Display, EnumVariantNames, EnumIter,
)]
pub enum State {
    /// No exchange pending
    #[default]
    Idle,
    /// PIN server handshake in progress
    Handshake(HandshakeState),
    /// Collecting transaction inputs
    Signing(SigningState),
    /// Receiving firmware
    Ota(OtaState),
}

impl State {
    /// Family of the pending exchange, if any
    pub fn family(&self) -> Option<Family> {
        match self {
            State::Idle => None,
            State::Handshake(_) => Some(Family::Handshake),
            State::Signing(_) => Some(Family::Signing),
            State::Ota(_) => Some(Family::Ota),
        }
    }

    /// Check whether the state expects the provided continuation
    pub fn expects(&self, method: Method) -> bool {
        match (self, method) {
            (State::Handshake(HandshakeState::AwaitingInit), Method::HandshakeInit) => true,
            (State::Handshake(HandshakeState::AwaitingComplete), Method::HandshakeComplete) => {
                true
            }
            (State::Signing(s), Method::TxInput) => s.received < s.num_inputs,
            (State::Ota(s), Method::OtaData) => !s.is_complete(),
            (State::Ota(s), Method::OtaComplete) => s.is_complete(),
            _ => false,
        }
    }
}

/// Exchange context, holding secrets / collected inputs
/// not stored in the (copyable) [State]
#[derive(Debug, Default)]
pub(crate) enum Exchange {
    #[default]
    None,
    Handshake(HandshakeSession),
    Signing(SignContext),
}

/// [Engine] provides hardware-independent support for the device RPC protocol,
/// one instance per connection [Source], sharing a [SessionLock]
pub struct Engine<DRV: Driver, RNG: CryptoRngCore = OsRng> {
    state: State,
    exchange: Exchange,

    source: Source,
    lock: SessionLock,
    config: Config,

    decoder: FrameDecoder,
    entropy: EntropyPool,

    /// PIN record used by `debug_handshake`, never persisted
    debug_pin: Option<PinRecord>,

    drv: DRV,
    rng: RNG,
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance for the provided source and driver,
    /// using the default [OsRng]
    pub fn new(drv: DRV, source: Source, lock: SessionLock, config: Config) -> Self {
        Self::new_with_rng(drv, source, lock, config, OsRng {})
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Create a new engine instance with the provided driver and rng
    pub fn new_with_rng(
        drv: DRV,
        source: Source,
        lock: SessionLock,
        config: Config,
        rng: RNG,
    ) -> Self {
        Self {
            state: State::Idle,
            exchange: Exchange::None,
            source,
            lock,
            decoder: FrameDecoder::new(config.frame_capacity),
            config,
            entropy: EntropyPool::default(),
            debug_pin: None,
            drv,
            rng,
        }
    }

    /// Feed received bytes, returning encoded response frames in order
    pub fn feed(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let frames = self.decoder.feed(data);

        frames
            .iter()
            .filter_map(|f| {
                let resp = self.handle_frame(f);
                match jade_proto::encode_frame(&resp) {
                    Ok(b) => Some(b),
                    Err(_e) => {
                        #[cfg(feature = "log")]
                        log::error!("failed to encode response: {:?}", _e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Handle a single received frame
    pub fn handle_frame(&mut self, frame: &Frame) -> RpcResponse<Output> {
        // Overflowed frames are reported with the retained tail
        if frame.discarded() > 0 {
            return RpcResponse::err(
                jade_proto::rpc::DEFAULT_ID,
                RpcError::from(Error::InvalidRequest).with_data(frame.raw().to_vec()),
            );
        }

        match validate(frame) {
            Ok(req) => self.handle(&req),
            Err(id) => {
                #[cfg(feature = "log")]
                log::debug!("malformed request (id: {})", id);

                RpcResponse::err(id, Error::InvalidRequest.into())
            }
        }
    }

    /// Handle a validated request, outputs retain struct field order on the wire
    pub fn handle(&mut self, req: &RpcRequest) -> RpcResponse<Output> {
        match self.dispatch(&req.method, req.params.as_ref()) {
            Ok(v) => RpcResponse::ok(req.id.as_str(), v),
            Err(e) => {
                #[cfg(feature = "log")]
                log::debug!("{} failed: {}", req.method, e);

                RpcResponse::err(req.id.as_str(), e.into())
            }
        }
    }

    /// Dispatch a method call, applying registry, sequencing,
    /// lock and parameter checks (in that order)
    pub fn dispatch(&mut self, method: &str, params: Option<&Value>) -> Result<Output, Error> {
        self.lock.register_activity(self.source);

        // Resolve method
        let method = Method::from_str(method).map_err(|_| Error::UnknownMethod)?;

        #[cfg(feature = "log")]
        log::debug!("{}: {} (state: {:?})", self.source, method, self.state);

        // Check sequencing against the pending exchange
        match (method.class(), self.state.family()) {
            (Class::Standalone, _) => (),
            (Class::Initiating(_), None) => (),
            (Class::Initiating(f), Some(p)) if f == p => (),
            (Class::Continuation(_), _) if self.state.expects(method) => (),
            _ => return Err(Error::UnexpectedMethod),
        }

        // Check for unlock state
        if method.is_sensitive() {
            self.lock.check(self.source)?;
        }

        // Parse parameters
        let tx_network = match &self.exchange {
            Exchange::Signing(ctx) => Some(ctx.tx.network),
            _ => None,
        };
        let evt = Event::parse(method, params, tx_network)?;

        self.update(&evt)
    }

    /// Handle incoming events
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        let r = match (self.state, evt) {
            // Version / status info
            (_, Event::GetVersionInfo) => Output::VersionInfo(self.version_info()),

            // Mix caller entropy
            (_, Event::AddEntropy { entropy }) => {
                self.entropy.add(entropy);
                Output::Bool(true)
            }

            // Test keychain injection
            (
                _,
                Event::SetMnemonic {
                    mnemonic,
                    passphrase,
                },
            ) => {
                let k = self
                    .drv
                    .keychain_from_mnemonic(mnemonic, passphrase.as_ref().map(|p| p.as_str()))?;
                self.lock.authenticate(self.source, k, None);
                Output::Bool(true)
            }
            (_, Event::SetSeed { seed }) => {
                let k = self.drv.keychain_from_seed(seed)?;
                self.lock.authenticate(self.source, k, None);
                Output::Bool(true)
            }

            // Wallet operations
            (_, Event::GetXpub { network, path }) => Output::Text(
                self.with_keychain(Some(*network), |d, k| d.get_xpub(k, *network, path))?,
            ),
            (_, Event::GetReceiveAddress { network, kind }) => {
                Output::Text(self.with_keychain(Some(*network), |d, k| {
                    d.get_receive_address(k, *network, kind)
                })?)
            }
            (_, Event::SignMessage { path, message }) => Output::Text(
                self.with_keychain(None, |d, k| d.sign_message(k, path, message))?,
            ),

            // Liquid blinding
            (_, Event::GetBlindingKey { script }) => Output::bytes(
                self.with_keychain(None, |d, k| d.get_blinding_key(k, script))?,
            ),
            (
                _,
                Event::GetSharedNonce {
                    script,
                    their_pubkey,
                },
            ) => Output::bytes(self.with_keychain(None, |d, k| {
                d.get_shared_nonce(k, script, their_pubkey)
            })?),
            (
                _,
                Event::GetBlindingFactor {
                    hash_prevouts,
                    output_index,
                    kind,
                },
            ) => Output::bytes(self.with_keychain(None, |d, k| {
                d.get_blinding_factor(k, hash_prevouts, *output_index, *kind)
            })?),
            (
                _,
                Event::GetCommitments {
                    asset_id,
                    value,
                    hash_prevouts,
                    output_index,
                    vbf,
                },
            ) => Output::Commitments(self.with_keychain(None, |d, k| {
                d.get_commitments(k, asset_id, *value, hash_prevouts, *output_index, vbf.as_ref())
            })?),

            (_, Event::DebugSelfcheck) => Output::Bool(crate::helpers::selfcheck(&mut self.rng)),

            (_, Event::Logout) => {
                if self.lock.release(self.source) && matches!(self.state, State::Signing(_)) {
                    self.reset();
                }
                Output::Bool(true)
            }

            // User authentication, restarting any pending handshake
            (State::Idle | State::Handshake(_), Event::AuthUser { network }) => {
                return self.auth_user(*network);
            }
            (State::Idle | State::Handshake(_), Event::DebugHandshake) => {
                let mode = match self.debug_pin.clone() {
                    Some(record) => PinMode::Get { record },
                    None => PinMode::Set {
                        keychain: debug_keychain(),
                    },
                };
                let pin = Zeroizing::new(DEBUG_PIN.to_string());

                return self.handshake_start(Purpose::Debug, pin, mode);
            }
            (State::Handshake(HandshakeState::AwaitingInit), Event::HandshakeInit { ske, sig }) => {
                return self.handshake_init(ske, sig);
            }
            (
                State::Handshake(HandshakeState::AwaitingComplete),
                Event::HandshakeComplete {
                    encrypted_key,
                    hmac,
                },
            ) => {
                return self.handshake_complete(encrypted_key, hmac);
            }

            // Transaction declaration, replacing any pending signing exchange
            (
                State::Idle | State::Signing(_),
                Event::SignTx {
                    network,
                    txn,
                    layout,
                    change,
                },
            ) => {
                self.with_keychain(Some(*network), |_, _| Ok(()))?;

                let tx = TxContext {
                    network: *network,
                    txn: txn.clone(),
                    layout: layout.clone(),
                    change: change.clone(),
                };
                return self.sign_begin(tx, vec![]);
            }
            (
                State::Idle | State::Signing(_),
                Event::SignLiquidTx {
                    network,
                    txn,
                    layout,
                    commitments,
                    change,
                },
            ) => {
                self.with_keychain(Some(*network), |_, _| Ok(()))?;

                let tx = TxContext {
                    network: *network,
                    txn: txn.clone(),
                    layout: layout.clone(),
                    change: change.clone(),
                };
                return self.sign_begin(tx, commitments.clone());
            }
            (State::Signing(s), Event::TxInput(input)) if s.received < s.num_inputs => {
                return self.sign_input(input);
            }

            // Firmware update
            (State::Idle | State::Ota(_), Event::Ota { fwsize, cmpsize }) => {
                return self.ota_begin(*fwsize, *cmpsize);
            }
            (State::Ota(s), Event::OtaData(chunk)) if !s.is_complete() => {
                return self.ota_data(s, chunk);
            }
            (State::Ota(s), Event::OtaComplete) if s.is_complete() => {
                return self.ota_complete(s);
            }

            _e => {
                #[cfg(feature = "log")]
                log::error!("Unexpected event in state {:?}: {:02x?}", self.state, _e);

                return Err(Error::UnexpectedMethod);
            }
        };

        Ok(r)
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch connection source
    pub fn source(&self) -> Source {
        self.source
    }

    /// Fetch engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch shared session lock
    pub fn lock(&self) -> &SessionLock {
        &self.lock
    }

    /// Fetch driver
    pub fn driver(&self) -> &DRV {
        &self.drv
    }

    /// Reset any pending exchange
    pub fn reset(&mut self) {
        self.exchange = Exchange::None;
        self.state = State::Idle;
    }

    /// Reset exchange and framing state on connection close
    pub fn close(&mut self) {
        self.reset();
        self.decoder.reset();
    }

    fn auth_user(&mut self, network: Network) -> Result<Output, Error> {
        // Already unlocked by this source
        if self.lock.check(self.source).is_ok() {
            self.lock.check_network(network)?;
            return Ok(Output::Bool(true));
        }

        let record = self.drv.pin_record();

        // Apply stored network restriction
        if let Some(t) = record.as_ref().and_then(|r| r.network_type) {
            if t != network.network_type() {
                return Err(Error::BadParams("Network type inconsistent with prior usage"));
            }
        }

        let (pin, mode) = match record {
            Some(record) => (self.drv.user_pin()?, PinMode::Get { record }),
            None => {
                let keychain = self.drv.setup_keychain()?;
                (self.drv.user_pin()?, PinMode::Set { keychain })
            }
        };

        self.handshake_start(Purpose::Auth { network }, pin, mode)
    }

    /// Execute a driver operation with the unlocked keychain,
    /// applying the network restriction where provided
    fn with_keychain<R>(
        &self,
        network: Option<Network>,
        f: impl FnOnce(&DRV, &Keychain) -> Result<R, DriverError>,
    ) -> Result<R, Error> {
        self.lock.check(self.source)?;

        if let Some(n) = network {
            self.lock.check_network(n)?;
        }

        let drv = &self.drv;
        self.lock
            .with_keychain(self.source, |k| f(drv, k))?
            .map_err(Error::from)
    }

    fn version_info(&self) -> VersionInfo {
        let p = self.drv.platform_info();
        let record = self.drv.pin_record();

        let networks = match self
            .lock
            .network_type()
            .or(record.as_ref().and_then(|r| r.network_type))
        {
            None => "ALL".to_string(),
            Some(NetworkType::Main) => "MAIN".to_string(),
            Some(NetworkType::Test) => "TEST".to_string(),
        };

        VersionInfo {
            jade_version: self.config.version.clone(),
            jade_ota_max_chunk: self.config.ota_max_chunk as u32,
            jade_config: self.config.radio.clone(),
            idf_version: p.idf_version,
            chip_features: p.chip_features,
            efusemac: p.efusemac,
            battery_status: p.battery_status,
            jade_networks: networks,
            jade_has_pin: record.is_some(),
            jade_free_heap: p.free_heap,
            jade_free_dram: p.free_dram,
            jade_largest_dram: p.largest_dram,
            jade_free_spiram: p.free_spiram,
            jade_largest_spiram: p.largest_spiram,
        }
    }
}

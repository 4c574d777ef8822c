// Copyright (c) 2022-2023 The MobileCoin Foundation

//! PIN server handshake
//!
//! Two HTTP round trips are delegated to the caller: `start_handshake`
//! returns the server ephemeral key (`handshake_init`), then `set_pin` /
//! `get_pin` returns the PIN-bound AES key (`handshake_complete`), which
//! seals or unseals the keychain stored in the [PinRecord].

use rand_core::CryptoRngCore;
use secp256k1::{
    ecdh::SharedSecret, ecdsa::Signature, Message, PublicKey, SecretKey, SECP256K1,
};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use jade_proto::{
    handshake::{self, HandshakeData, SessionKeys, KEY_LEN},
    http, HttpRequest, Network,
};

use super::{
    Driver, Engine, Error, Exchange, Keychain, Output, PinRecord, State, PIN_ATTEMPTS,
};

/// PIN used by `debug_handshake`
pub const DEBUG_PIN: &str = "123456";

const VERIFY_FAILED: Error = Error::BadParams("Failed to verify server signature");
const HANDSHAKE_FAILED: Error = Error::BadParams("Failed to complete handshake");
const TOO_MANY_ATTEMPTS: Error = Error::BadParams("Too many PIN attempts, device reset");

/// Handshake exchange state
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum HandshakeState {
    /// Waiting for server ephemeral key via `handshake_init`
    #[default]
    AwaitingInit,
    /// Waiting for server key via `handshake_complete`
    AwaitingComplete,
}

/// Handshake entry point
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) enum Purpose {
    /// `auth_user`, unlocks the calling source on success
    Auth { network: Network },
    /// `debug_handshake`, exercises the PIN server without unlocking
    Debug,
}

pub(crate) enum PinMode {
    /// Protect a new keychain, creating a [PinRecord]
    Set { keychain: Keychain },
    /// Recover the keychain from an existing [PinRecord]
    Get { record: PinRecord },
}

impl PinMode {
    fn endpoint(&self) -> &'static str {
        match self {
            PinMode::Set { .. } => http::SET_PIN,
            PinMode::Get { .. } => http::GET_PIN,
        }
    }
}

pub(crate) struct HandshakeSession {
    purpose: Purpose,
    mode: PinMode,
    pin: Zeroizing<String>,
    pin_sk: Zeroizing<[u8; 32]>,
    keys: Option<SessionKeys>,
}

impl core::fmt::Debug for HandshakeSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandshakeSession")
            .field("purpose", &self.purpose)
            .field("endpoint", &self.mode.endpoint())
            .finish_non_exhaustive()
    }
}

/// Fixed keychain protected by `debug_handshake`
pub fn debug_keychain() -> Keychain {
    let mut k = [0u8; 64];
    k.copy_from_slice(&Sha512::digest(b"debug_handshake"));
    Keychain::from_bytes(k)
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Start a handshake, returning the `start_handshake` instruction
    pub(crate) fn handshake_start(
        &mut self,
        purpose: Purpose,
        pin: Zeroizing<String>,
        mode: PinMode,
    ) -> Result<Output, Error> {
        // Setup PIN key, fresh for new records
        let pin_sk = match &mode {
            PinMode::Set { .. } => Zeroizing::new(self.secret_key()?.secret_bytes()),
            PinMode::Get { record } => Zeroizing::new(record.pin_privkey),
        };

        #[cfg(feature = "log")]
        log::debug!("handshake start ({:?}, {})", purpose, mode.endpoint());

        self.exchange = Exchange::Handshake(HandshakeSession {
            purpose,
            mode,
            pin,
            pin_sk,
            keys: None,
        });
        self.state = State::Handshake(HandshakeState::AwaitingInit);

        Ok(Output::StartHandshake(HttpRequest::post(
            &self.config.pinserver_urls,
            http::START_HANDSHAKE,
            &self.config.root_certificates,
            String::new(),
            "handshake_init",
        )))
    }

    /// Handle server key exchange, any failure is fatal to the exchange
    pub(crate) fn handshake_init(
        &mut self,
        ske: &[u8; 33],
        sig: &[u8; 64],
    ) -> Result<Output, Error> {
        let r = self.handshake_init_inner(ske, sig);
        if r.is_err() {
            self.reset();
        }
        r
    }

    fn handshake_init_inner(&mut self, ske: &[u8; 33], sig: &[u8; 64]) -> Result<Output, Error> {
        // Verify server signature against the configured identity
        let server_pk =
            PublicKey::from_slice(&self.config.pinserver_pubkey).map_err(|_| VERIFY_FAILED)?;
        let sig = Signature::from_compact(sig).map_err(|_| VERIFY_FAILED)?;
        let digest = Message::from_digest(Sha256::digest(ske).into());
        SECP256K1
            .verify_ecdsa(&digest, &sig, &server_pk)
            .map_err(|_| VERIFY_FAILED)?;

        let ske_pk = PublicKey::from_slice(ske).map_err(|_| VERIFY_FAILED)?;

        // Generate ephemeral key and derive session keys
        let esk = self.secret_key()?;
        let cke = PublicKey::from_secret_key(SECP256K1, &esk).serialize();
        let shared = Zeroizing::new(SharedSecret::new(&ske_pk, &esk).secret_bytes());
        let keys = SessionKeys::derive(&shared[..]).map_err(|_| HANDSHAKE_FAILED)?;

        let entropy = Zeroizing::new(self.entropy.fill(&mut self.rng));
        let mut iv = [0u8; handshake::IV_LEN];
        self.rng.fill_bytes(&mut iv);

        let session = match &mut self.exchange {
            Exchange::Handshake(s) => s,
            _ => return Err(Error::UnexpectedMethod),
        };

        // Build PIN payload
        let pin_sk = SecretKey::from_slice(&session.pin_sk[..]).map_err(|_| HANDSHAKE_FAILED)?;
        let pin_pk = PublicKey::from_secret_key(SECP256K1, &pin_sk).serialize();
        let pin_secret = Zeroizing::new(
            handshake::hmac_sha256(&session.pin_sk[..], &[session.pin.as_bytes()])
                .map_err(|_| HANDSHAKE_FAILED)?,
        );

        let digest: [u8; 32] = Sha256::new()
            .chain_update(cke)
            .chain_update(&pin_secret[..])
            .chain_update(&entropy[..])
            .finalize()
            .into();
        let pin_sig = SECP256K1
            .sign_ecdsa(&Message::from_digest(digest), &pin_sk)
            .serialize_compact();

        let mut payload = Zeroizing::new(Vec::with_capacity(handshake::PIN_PAYLOAD_LEN));
        payload.extend_from_slice(&pin_pk);
        payload.extend_from_slice(&pin_secret[..]);
        payload.extend_from_slice(&entropy[..]);
        payload.extend_from_slice(&pin_sig);

        // Encrypt and authenticate for the PIN server
        let encrypted = handshake::encrypt(&keys.request_encryption, &iv, &payload)
            .map_err(|_| HANDSHAKE_FAILED)?;
        let hmac = handshake::hmac_sha256(&keys.request_hmac, &[&cke, &encrypted])
            .map_err(|_| HANDSHAKE_FAILED)?;

        let data = HandshakeData {
            cke: hex::encode(cke),
            encrypted_data: hex::encode(&encrypted),
            hmac_encrypted_data: hex::encode(hmac),
            ske: hex::encode(ske),
        };
        let endpoint = session.mode.endpoint();
        session.keys = Some(keys);

        self.state = State::Handshake(HandshakeState::AwaitingComplete);

        Ok(Output::PinRequest(HttpRequest::post(
            &self.config.pinserver_urls,
            endpoint,
            &self.config.root_certificates,
            data,
            "handshake_complete",
        )))
    }

    /// Handle server key, always completing the exchange
    pub(crate) fn handshake_complete(
        &mut self,
        encrypted_key: &[u8],
        hmac: &[u8; 32],
    ) -> Result<Output, Error> {
        let session = match core::mem::take(&mut self.exchange) {
            Exchange::Handshake(s) => s,
            _ => {
                self.reset();
                return Err(Error::UnexpectedMethod);
            }
        };
        self.state = State::Idle;

        let HandshakeSession {
            purpose,
            mode,
            pin_sk,
            keys,
            ..
        } = session;

        // Recover PIN server key
        let aes_key = keys
            .ok_or(HANDSHAKE_FAILED)
            .and_then(|k| open_server_key(&k, encrypted_key, hmac));

        match mode {
            PinMode::Set { keychain } => {
                let aes_key = aes_key?;

                let mut iv = [0u8; handshake::IV_LEN];
                self.rng.fill_bytes(&mut iv);
                let encrypted_keychain = seal_keychain(&aes_key, &iv, &keychain)?;

                let network_type = match purpose {
                    Purpose::Auth { network } => Some(network.network_type()),
                    Purpose::Debug => None,
                };
                let record = PinRecord {
                    pin_privkey: *pin_sk,
                    encrypted_keychain,
                    attempts_remaining: PIN_ATTEMPTS,
                    network_type,
                };

                #[cfg(feature = "log")]
                log::info!("PIN set ({:?})", purpose);

                match purpose {
                    Purpose::Auth { network } => {
                        self.drv.store_pin_record(Some(record));
                        self.lock
                            .authenticate(self.source, keychain, Some(network.network_type()));
                    }
                    Purpose::Debug => self.debug_pin = Some(record),
                }
            }
            PinMode::Get { mut record } => {
                let keychain = aes_key.and_then(|k| open_keychain(&k, &record.encrypted_keychain));

                let keychain = match (purpose, keychain) {
                    (Purpose::Debug, Ok(k)) if k != debug_keychain() => Err(HANDSHAKE_FAILED),
                    (_, r) => r,
                };

                match keychain {
                    Ok(k) => {
                        #[cfg(feature = "log")]
                        log::info!("PIN verified ({:?})", purpose);

                        record.attempts_remaining = PIN_ATTEMPTS;

                        match purpose {
                            Purpose::Auth { network } => {
                                self.drv.store_pin_record(Some(record));
                                self.lock
                                    .authenticate(self.source, k, Some(network.network_type()));
                            }
                            // Alternate back to set_pin
                            Purpose::Debug => self.debug_pin = None,
                        }
                    }
                    Err(e) => {
                        record.attempts_remaining = record.attempts_remaining.saturating_sub(1);

                        #[cfg(feature = "log")]
                        log::warn!(
                            "PIN verification failed, {} attempts remaining",
                            record.attempts_remaining
                        );

                        let exhausted = record.attempts_remaining == 0;
                        let record = match exhausted {
                            true => None,
                            false => Some(record),
                        };

                        match purpose {
                            Purpose::Auth { .. } => self.drv.store_pin_record(record),
                            Purpose::Debug => self.debug_pin = record,
                        }

                        return Err(match exhausted {
                            true => TOO_MANY_ATTEMPTS,
                            false => e,
                        });
                    }
                }
            }
        }

        Ok(Output::Bool(true))
    }

    /// Generate a secret key from the RNG mixed with the entropy pool
    fn secret_key(&mut self) -> Result<SecretKey, Error> {
        let b = Zeroizing::new(self.entropy.fill(&mut self.rng));
        SecretKey::from_slice(&b[..]).map_err(|_| HANDSHAKE_FAILED)
    }
}

/// Authenticate and decrypt the PIN server issued key
fn open_server_key(
    keys: &SessionKeys,
    encrypted_key: &[u8],
    hmac: &[u8; 32],
) -> Result<Zeroizing<[u8; KEY_LEN]>, Error> {
    handshake::verify_hmac(&keys.response_hmac, &[encrypted_key], hmac)
        .map_err(|_| HANDSHAKE_FAILED)?;

    let k = Zeroizing::new(
        handshake::decrypt(&keys.response_encryption, encrypted_key)
            .map_err(|_| HANDSHAKE_FAILED)?,
    );

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    if k.len() != KEY_LEN {
        return Err(HANDSHAKE_FAILED);
    }
    key.copy_from_slice(&k);

    Ok(key)
}

/// Seal a keychain under the PIN server key: `iv || ciphertext || hmac`
fn seal_keychain(
    aes_key: &[u8; KEY_LEN],
    iv: &[u8; handshake::IV_LEN],
    keychain: &Keychain,
) -> Result<Vec<u8>, Error> {
    let mut b = handshake::encrypt(aes_key, iv, keychain.as_bytes())
        .map_err(|_| HANDSHAKE_FAILED)?;
    let tag = handshake::hmac_sha256(aes_key, &[&b]).map_err(|_| HANDSHAKE_FAILED)?;
    b.extend_from_slice(&tag);
    Ok(b)
}

/// Unseal a keychain, failing where the PIN (and thus key) was wrong
fn open_keychain(aes_key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Keychain, Error> {
    let n = sealed.len().checked_sub(32).ok_or(HANDSHAKE_FAILED)?;
    let (data, tag) = sealed.split_at(n);

    handshake::verify_hmac(aes_key, &[data], tag).map_err(|_| HANDSHAKE_FAILED)?;

    let k = Zeroizing::new(handshake::decrypt(aes_key, data).map_err(|_| HANDSHAKE_FAILED)?);
    Keychain::from_slice(&k).ok_or(HANDSHAKE_FAILED)
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Software wallet [Driver] for simulated devices
//!
//! Keys follow BIP-0032 from the injected or configured seed, and single-sig
//! addresses use the standard HASH160 / base58check / bech32 encodings.
//! Green scripts, liquid blinding values and input sighashes are deterministic
//! simulator encodings, stable for a given keychain but not consensus compatible.

use std::sync::{Mutex, MutexGuard};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bech32::{u5, ToBase32, Variant};
use bip32::{ChildNumber, ExtendedKey, ExtendedKeyAttrs, Prefix, XPrv};
use bip39::{Language, Mnemonic, Seed};
use hmac::{Hmac, Mac};
use log::{debug, info, warn};
use rand_core::{OsRng, RngCore};
use ripemd::Ripemd160;
use secp256k1::{ecdh::SharedSecret, Message, PublicKey, SecretKey, SECP256K1};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use jade_core::{
    engine::{
        AddressKind, Commitment, Driver, DriverError, Keychain, PinRecord, PlatformInfo,
        ScriptVariant, TxContext, TxInput, KEYCHAIN_LEN,
    },
    proto::{
        liquid::{BlindingFactorKind, Commitments},
        ByteBuf, Network, NetworkType,
    },
};

type HmacSha256 = Hmac<Sha256>;

/// Default PIN returned by [SoftDriver::user_pin]
pub const DEFAULT_PIN: &str = "123456";

/// Default maximum firmware image size
pub const DEFAULT_OTA_MAX_SIZE: usize = 0x1c0000;

/// Green multisig pointer limit (exclusive)
const GREEN_MAX_POINTER: u32 = 1_000_000;

const INVALID_KEYCHAIN: DriverError = DriverError("Invalid keychain");
const DERIVE_FAILED: DriverError = DriverError("Failed to derive key");
const GREEN_FAILED: DriverError = DriverError("Failed to generate valid green address script");
const ADDRESS_FAILED: DriverError = DriverError("Failed to encode address");

/// [SoftDriver] options
#[derive(Clone, PartialEq, Debug)]
pub struct SoftOptions {
    /// Mnemonic used on wallet setup, a random seed is generated otherwise
    pub mnemonic: Option<String>,
    /// PIN "entered" by the user
    pub pin: String,
    /// Maximum (compressed) firmware size
    pub ota_max_size: usize,
    /// Reported platform information
    pub platform: PlatformInfo,
}

impl Default for SoftOptions {
    fn default() -> Self {
        Self {
            mnemonic: None,
            pin: DEFAULT_PIN.to_string(),
            ota_max_size: DEFAULT_OTA_MAX_SIZE,
            platform: PlatformInfo {
                idf_version: "v4.4.4-sim".to_string(),
                chip_features: "32000000".to_string(),
                efusemac: "000000000000".to_string(),
                battery_status: 5,
                free_heap: 196_608,
                free_dram: 131_072,
                largest_dram: 65_536,
                free_spiram: 4_194_304,
                largest_spiram: 4_128_768,
            },
        }
    }
}

#[derive(Debug)]
struct OtaSink {
    cmpsize: usize,
    written: usize,
    digest: Sha256,
}

#[derive(Debug, Default)]
struct SoftState {
    pin: Option<String>,
    pin_record: Option<PinRecord>,
    ota: Option<OtaSink>,
    firmware: Option<(usize, [u8; 32])>,
}

/// Software [Driver] implementation, shared between connections
#[derive(Debug)]
pub struct SoftDriver {
    opts: SoftOptions,
    state: Mutex<SoftState>,
}

impl Default for SoftDriver {
    fn default() -> Self {
        Self::new(SoftOptions::default())
    }
}

impl SoftDriver {
    /// Create a new driver with the provided options
    pub fn new(opts: SoftOptions) -> Self {
        Self {
            opts,
            state: Mutex::new(SoftState::default()),
        }
    }

    /// Override the PIN returned on subsequent entry
    pub fn set_user_pin(&self, pin: &str) {
        self.state().pin = Some(pin.to_string());
    }

    /// Size and SHA-256 digest of the last completed firmware update
    pub fn firmware(&self) -> Option<(usize, [u8; 32])> {
        self.state().firmware
    }

    fn state(&self) -> MutexGuard<'_, SoftState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Driver for SoftDriver {
    fn platform_info(&self) -> PlatformInfo {
        self.opts.platform.clone()
    }

    fn keychain_from_mnemonic(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
    ) -> Result<Keychain, DriverError> {
        let m = Mnemonic::from_phrase(mnemonic, Language::English)
            .map_err(|_| DriverError("Invalid mnemonic"))?;
        let seed = Seed::new(&m, passphrase.unwrap_or(""));

        self.keychain_from_seed(seed.as_bytes())
    }

    fn keychain_from_seed(&self, seed: &[u8]) -> Result<Keychain, DriverError> {
        let x = XPrv::new(seed).map_err(|_| DriverError("Invalid seed"))?;

        let mut b = Zeroizing::new([0u8; KEYCHAIN_LEN]);
        b[..32].copy_from_slice(&x.attrs().chain_code);
        b[32..].copy_from_slice(&x.to_bytes());

        Ok(Keychain::from_bytes(*b))
    }

    fn setup_keychain(&self) -> Result<Keychain, DriverError> {
        match &self.opts.mnemonic {
            Some(m) => {
                info!("Restoring wallet from configured mnemonic");
                self.keychain_from_mnemonic(m, None)
            }
            None => {
                info!("Generating new wallet");
                let mut seed = Zeroizing::new([0u8; 32]);
                OsRng.fill_bytes(&mut seed[..]);
                self.keychain_from_seed(&seed[..])
            }
        }
    }

    fn user_pin(&self) -> Result<Zeroizing<String>, DriverError> {
        let pin = self.state().pin.clone();
        Ok(Zeroizing::new(pin.unwrap_or_else(|| self.opts.pin.clone())))
    }

    fn pin_record(&self) -> Option<PinRecord> {
        self.state().pin_record.clone()
    }

    fn store_pin_record(&self, record: Option<PinRecord>) {
        if record.is_none() {
            warn!("Erasing PIN record");
        }
        self.state().pin_record = record;
    }

    fn get_xpub(
        &self,
        k: &Keychain,
        network: Network,
        path: &[u32],
    ) -> Result<String, DriverError> {
        let prefix = match network.network_type() {
            NetworkType::Main => Prefix::XPUB,
            NetworkType::Test => Prefix::TPUB,
        };

        Ok(derive(k, path)?.public_key().to_string(prefix))
    }

    fn get_receive_address(
        &self,
        k: &Keychain,
        network: Network,
        kind: &AddressKind,
    ) -> Result<String, DriverError> {
        match kind {
            AddressKind::SingleSig { variant, path } => {
                let pk = public_key(k, path)?;
                let h = hash160(&pk.serialize());

                let a = match variant {
                    ScriptVariant::Pkh => base58_address(pkh_version(network), &h),
                    ScriptVariant::ShWpkh => {
                        let redeem = [&[0x00, 0x14][..], &h[..]].concat();
                        base58_address(sh_version(network), &hash160(&redeem))
                    }
                    ScriptVariant::Wpkh => segwit_address(network, &h)?,
                };
                Ok(a)
            }
            AddressKind::Green {
                subaccount,
                branch,
                pointer,
                recovery_xpub,
                csv_blocks,
            } => {
                if *branch != 1 || *pointer >= GREEN_MAX_POINTER {
                    return Err(GREEN_FAILED);
                }

                let recovery = match recovery_xpub {
                    Some(x) => Some(decode_xpub(x).ok_or(GREEN_FAILED)?),
                    None => None,
                };

                // CSV scripts are 2of2 only
                if let Some(c) = csv_blocks {
                    if *c > u16::MAX as u32 || recovery.is_some() {
                        return Err(GREEN_FAILED);
                    }
                }

                let path = [3 | (1 << 31), *subaccount | (1 << 31), *branch, *pointer];
                let user = public_key(k, &path)?;

                let mut h = Sha256::new();
                h.update(b"green");
                h.update(user.serialize());
                if let Some(r) = &recovery {
                    h.update(r);
                }
                h.update(csv_blocks.unwrap_or(0).to_le_bytes());
                let script_hash = hash160(&h.finalize());

                Ok(base58_address(sh_version(network), &script_hash))
            }
        }
    }

    fn sign_message(
        &self,
        k: &Keychain,
        path: &[u32],
        message: &str,
    ) -> Result<String, DriverError> {
        let sk = secret_key(k, path)?;

        let digest = message_hash(message.as_bytes());
        let sig = SECP256K1.sign_ecdsa_recoverable(&Message::from_digest(digest), &sk);
        let (recid, compact) = sig.serialize_compact();

        // Compressed key header
        let mut b = Vec::with_capacity(65);
        b.push(31 + recid.to_i32() as u8);
        b.extend_from_slice(&compact);

        Ok(BASE64.encode(b))
    }

    fn get_blinding_key(&self, k: &Keychain, script: &[u8]) -> Result<[u8; 33], DriverError> {
        let sk = blinding_secret(k, script)?;
        Ok(PublicKey::from_secret_key(SECP256K1, &sk).serialize())
    }

    fn get_shared_nonce(
        &self,
        k: &Keychain,
        script: &[u8],
        their_pubkey: &[u8; 33],
    ) -> Result<[u8; 32], DriverError> {
        let sk = blinding_secret(k, script)?;
        let pk = PublicKey::from_slice(their_pubkey)
            .map_err(|_| DriverError("Invalid public key"))?;

        let shared = Zeroizing::new(SharedSecret::new(&pk, &sk).secret_bytes());
        Ok(Sha256::digest(&shared[..]).into())
    }

    fn get_blinding_factor(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        kind: BlindingFactorKind,
    ) -> Result<[u8; 32], DriverError> {
        let kind = kind.to_string();
        keyed_hash(
            k,
            b"blinding_factor",
            &[kind.as_bytes(), hash_prevouts, &output_index.to_le_bytes()],
        )
    }

    fn get_commitments(
        &self,
        k: &Keychain,
        asset_id: &[u8; 32],
        value: u64,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        vbf: Option<&[u8; 32]>,
    ) -> Result<Commitments, DriverError> {
        let abf =
            self.get_blinding_factor(k, hash_prevouts, output_index, BlindingFactorKind::Asset)?;
        let vbf = match vbf {
            Some(v) => *v,
            None => self.get_blinding_factor(
                k,
                hash_prevouts,
                output_index,
                BlindingFactorKind::Value,
            )?,
        };

        let generator = asset_generator(asset_id, &abf);
        let value_commitment = value_commitment(&generator, value, &vbf);
        let hmac = commitment_hmac(
            k,
            hash_prevouts,
            output_index,
            asset_id,
            value,
            &generator,
            &value_commitment,
        )?;

        debug!("Commitments for output {}: {}", output_index, hex::encode(value_commitment));

        Ok(Commitments {
            abf: ByteBuf::from(abf.to_vec()),
            vbf: ByteBuf::from(vbf.to_vec()),
            asset_generator: ByteBuf::from(generator.to_vec()),
            value_commitment: ByteBuf::from(value_commitment.to_vec()),
            hmac: ByteBuf::from(hmac.to_vec()),
            asset_id: ByteBuf::from(asset_id.to_vec()),
            value,
        })
    }

    fn verify_commitment(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        c: &Commitment,
    ) -> Result<(), DriverError> {
        const INVALID: DriverError = DriverError("Invalid commitment");

        let expected = commitment_hmac(
            k,
            hash_prevouts,
            output_index,
            &c.asset_id,
            c.value,
            &c.asset_generator,
            &c.value_commitment,
        )?;
        if !constant_eq(&expected, &c.hmac) {
            return Err(INVALID);
        }

        // Blinding factors, where provided, must reproduce the commitments
        if let Some(abf) = &c.abf {
            let generator = asset_generator(&c.asset_id, abf);
            if generator != c.asset_generator {
                return Err(INVALID);
            }
            if let Some(vbf) = &c.vbf {
                if value_commitment(&generator, c.value, vbf) != c.value_commitment {
                    return Err(INVALID);
                }
            }
        }

        if PublicKey::from_slice(&c.blinding_key).is_err() {
            return Err(INVALID);
        }

        Ok(())
    }

    fn sign_input(
        &self,
        k: &Keychain,
        tx: &TxContext,
        index: usize,
        input: &TxInput,
    ) -> Result<Vec<u8>, DriverError> {
        let path = input.path.as_deref().ok_or(DERIVE_FAILED)?;
        let sk = secret_key(k, path)?;

        // Simulated sighash, committing to the transaction and input data
        let mut h = Sha256::new();
        h.update(&tx.txn);
        h.update((index as u32).to_le_bytes());
        h.update(&input.script);
        if let Some(s) = input.satoshi {
            h.update(s.to_le_bytes());
        }
        if let Some(c) = &input.value_commitment {
            h.update(c);
        }
        if let Some(t) = &input.input_tx {
            h.update(Sha256::digest(t));
        }
        let sighash: [u8; 32] = Sha256::digest(h.finalize()).into();

        let sig = SECP256K1.sign_ecdsa(&Message::from_digest(sighash), &sk);

        // DER with SIGHASH_ALL
        let mut b = sig.serialize_der().to_vec();
        b.push(0x01);

        Ok(b)
    }

    fn ota_max_size(&self) -> usize {
        self.opts.ota_max_size
    }

    fn ota_begin(&self, fwsize: usize, cmpsize: usize) -> Result<(), DriverError> {
        info!("OTA begin ({} bytes, {} compressed)", fwsize, cmpsize);

        self.state().ota = Some(OtaSink {
            cmpsize,
            written: 0,
            digest: Sha256::new(),
        });
        Ok(())
    }

    fn ota_write(&self, chunk: &[u8]) -> Result<(), DriverError> {
        let mut s = self.state();
        let sink = s.ota.as_mut().ok_or(DriverError("OTA not started"))?;

        if sink.written + chunk.len() > sink.cmpsize {
            return Err(DriverError("OTA data exceeds image size"));
        }

        sink.digest.update(chunk);
        sink.written += chunk.len();
        Ok(())
    }

    fn ota_finalize(&self, fwsize: usize) -> Result<(), DriverError> {
        let mut s = self.state();
        let sink = s.ota.take().ok_or(DriverError("OTA not started"))?;

        if sink.written != sink.cmpsize {
            return Err(DriverError("OTA image incomplete"));
        }

        let digest: [u8; 32] = sink.digest.finalize().into();
        info!("OTA complete, image digest {}", hex::encode(digest));

        s.firmware = Some((fwsize, digest));
        Ok(())
    }
}

/// Rebuild the master key from keychain material (`chain_code || key`)
fn master(k: &Keychain) -> Result<XPrv, DriverError> {
    let b = k.as_bytes();

    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&b[..32]);
    let mut key_bytes = [0u8; 33];
    key_bytes[1..].copy_from_slice(&b[32..]);

    let ek = ExtendedKey {
        prefix: Prefix::XPRV,
        attrs: ExtendedKeyAttrs {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber(0),
            chain_code,
        },
        key_bytes,
    };

    XPrv::try_from(ek).map_err(|_| INVALID_KEYCHAIN)
}

fn derive(k: &Keychain, path: &[u32]) -> Result<XPrv, DriverError> {
    path.iter()
        .try_fold(master(k)?, |x, i| x.derive_child(ChildNumber(*i)))
        .map_err(|_| DERIVE_FAILED)
}

fn secret_key(k: &Keychain, path: &[u32]) -> Result<SecretKey, DriverError> {
    let x = derive(k, path)?;
    let b = Zeroizing::new(x.to_bytes());
    SecretKey::from_slice(&b[..]).map_err(|_| DERIVE_FAILED)
}

fn public_key(k: &Keychain, path: &[u32]) -> Result<PublicKey, DriverError> {
    secret_key(k, path).map(|sk| PublicKey::from_secret_key(SECP256K1, &sk))
}

/// HMAC keyed by the keychain, domain separated by `label`
fn keyed_hash(k: &Keychain, label: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], DriverError> {
    let mut m = HmacSha256::new_from_slice(k.as_bytes()).map_err(|_| INVALID_KEYCHAIN)?;
    m.update(label);
    for p in parts {
        m.update(p);
    }
    Ok(m.finalize().into_bytes().into())
}

fn blinding_secret(k: &Keychain, script: &[u8]) -> Result<SecretKey, DriverError> {
    let b = Zeroizing::new(keyed_hash(k, b"blinding_key", &[script])?);
    SecretKey::from_slice(&b[..]).map_err(|_| DERIVE_FAILED)
}

fn asset_generator(asset_id: &[u8; 32], abf: &[u8; 32]) -> [u8; 33] {
    let mut g = [0x0a; 33];
    let h = Sha256::new()
        .chain_update(b"generator")
        .chain_update(asset_id)
        .chain_update(abf)
        .finalize();
    g[1..].copy_from_slice(&h);
    g
}

fn value_commitment(generator: &[u8; 33], value: u64, vbf: &[u8; 32]) -> [u8; 33] {
    let mut c = [0x08; 33];
    let h = Sha256::new()
        .chain_update(generator)
        .chain_update(value.to_le_bytes())
        .chain_update(vbf)
        .finalize();
    c[1..].copy_from_slice(&h);
    c
}

fn commitment_hmac(
    k: &Keychain,
    hash_prevouts: &[u8; 32],
    output_index: u32,
    asset_id: &[u8; 32],
    value: u64,
    generator: &[u8; 33],
    value_commitment: &[u8; 33],
) -> Result<[u8; 32], DriverError> {
    keyed_hash(
        k,
        b"commitments",
        &[
            hash_prevouts,
            &output_index.to_le_bytes(),
            asset_id,
            &value.to_le_bytes(),
            generator,
            value_commitment,
        ],
    )
}

fn constant_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Bitcoin signed message digest
fn message_hash(message: &[u8]) -> [u8; 32] {
    const PREFIX: &[u8] = b"\x18Bitcoin Signed Message:\n";

    let mut h = Sha256::new();
    h.update(PREFIX);
    h.update(varint(message.len()));
    h.update(message);

    Sha256::digest(h.finalize()).into()
}

fn varint(n: usize) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => [&[0xfd][..], &(n as u16).to_le_bytes()].concat(),
        _ => [&[0xfe][..], &(n as u32).to_le_bytes()].concat(),
    }
}

/// RIPEMD160(SHA256(b))
fn hash160(b: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(b)).into()
}

fn base58_address(version: u8, h: &[u8; 20]) -> String {
    bs58::encode([&[version][..], &h[..]].concat())
        .with_check()
        .into_string()
}

/// Version 0 witness program address
fn segwit_address(network: Network, program: &[u8; 20]) -> Result<String, DriverError> {
    let mut data = vec![u5::try_from_u8(0).map_err(|_| ADDRESS_FAILED)?];
    data.extend(program.to_base32());

    bech32::encode(hrp(network), data, Variant::Bech32).map_err(|_| ADDRESS_FAILED)
}

fn decode_xpub(s: &str) -> Option<Vec<u8>> {
    bs58::decode(s)
        .with_check(None)
        .into_vec()
        .ok()
        .filter(|b| b.len() == 78)
}

fn pkh_version(network: Network) -> u8 {
    match network {
        Network::Mainnet => 0x00,
        Network::Liquid => 0x39,
        Network::LocaltestLiquid => 0xeb,
        _ => 0x6f,
    }
}

fn sh_version(network: Network) -> u8 {
    match network {
        Network::Mainnet => 0x05,
        Network::Liquid => 0x27,
        Network::LocaltestLiquid => 0x4b,
        _ => 0xc4,
    }
}

fn hrp(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "bc",
        Network::Testnet => "tb",
        Network::Regtest | Network::Localtest => "bcrt",
        Network::Liquid => "ex",
        Network::LocaltestLiquid => "ert",
    }
}

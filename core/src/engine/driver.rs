// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Platform / wallet support for [Engine][super::Engine] instances

use strum::{Display, EnumString, EnumVariantNames};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use jade_proto::{
    liquid::{BlindingFactorKind, Commitments},
    Network,
};

use super::{Commitment, TxContext, TxInput};

/// Keychain (master key) length
pub const KEYCHAIN_LEN: usize = 64;

/// Number of PIN attempts before the stored keychain is erased
pub const PIN_ATTEMPTS: u8 = 3;

/// Driver error, carrying the message returned on the wire
#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("{0}")]
pub struct DriverError(pub &'static str);

/// Master secret material, unlocked by the PIN handshake or test injection
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct Keychain([u8; KEYCHAIN_LEN]);

impl Keychain {
    /// Create a keychain from raw key material
    pub fn from_bytes(b: [u8; KEYCHAIN_LEN]) -> Self {
        Self(b)
    }

    /// Create a keychain from a slice, returning `None` on length mismatch
    pub fn from_slice(b: &[u8]) -> Option<Self> {
        let mut k = [0u8; KEYCHAIN_LEN];
        if b.len() != KEYCHAIN_LEN {
            return None;
        }
        k.copy_from_slice(b);
        Some(Self(k))
    }

    /// Access raw key material
    pub fn as_bytes(&self) -> &[u8; KEYCHAIN_LEN] {
        &self.0
    }
}

impl core::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Keychain(..)")
    }
}

/// Stored PIN record, protecting the keychain with the PIN server issued key
#[derive(Clone, PartialEq, Debug, Zeroize, ZeroizeOnDrop)]
pub struct PinRecord {
    /// PIN private key, identifying the device to the PIN server
    pub pin_privkey: [u8; 32],
    /// Keychain encrypted with the PIN server key (IV prefixed)
    pub encrypted_keychain: Vec<u8>,
    /// Attempts remaining before the record is erased
    pub attempts_remaining: u8,
    /// Network class restriction, set on first use
    #[zeroize(skip)]
    pub network_type: Option<jade_proto::NetworkType>,
}

/// Platform information for `get_version_info`
#[derive(Clone, PartialEq, Debug, Default)]
pub struct PlatformInfo {
    pub idf_version: String,
    pub chip_features: String,
    pub efusemac: String,
    pub battery_status: u8,
    pub free_heap: u32,
    pub free_dram: u32,
    pub largest_dram: u32,
    pub free_spiram: u32,
    pub largest_spiram: u32,
}

/// Single-sig script variants for `get_receive_address`
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumVariantNames)]
pub enum ScriptVariant {
    #[strum(serialize = "pkh(k)")]
    Pkh,
    #[strum(serialize = "wpkh(k)")]
    Wpkh,
    #[strum(serialize = "sh(wpkh(k))")]
    ShWpkh,
}

/// Receive address descriptor
#[derive(Clone, PartialEq, Debug)]
pub enum AddressKind {
    /// Single-sig address at the provided path
    SingleSig {
        variant: ScriptVariant,
        path: Vec<u32>,
    },
    /// Green multisig address
    Green {
        subaccount: u32,
        branch: u32,
        pointer: u32,
        recovery_xpub: Option<String>,
        csv_blocks: Option<u32>,
    },
}

/// [`Driver`] trait provides platform and wallet support for [`Engine`][super::Engine] instances
///
/// Drivers are shared between connections, so operations take `&self`
/// with any mutable state behind interior mutability.
pub trait Driver {
    /// Fetch platform information
    fn platform_info(&self) -> PlatformInfo;

    /// Derive a keychain from a BIP-0039 mnemonic and optional passphrase
    fn keychain_from_mnemonic(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
    ) -> Result<Keychain, DriverError>;

    /// Derive a keychain from a raw seed
    fn keychain_from_seed(&self, seed: &[u8]) -> Result<Keychain, DriverError>;

    /// On-device keychain setup (new wallet / recovery), prior to setting a PIN
    fn setup_keychain(&self) -> Result<Keychain, DriverError>;

    /// Request PIN entry from the user
    fn user_pin(&self) -> Result<Zeroizing<String>, DriverError>;

    /// Fetch the stored PIN record, if any
    fn pin_record(&self) -> Option<PinRecord>;

    /// Store (or erase, with `None`) the PIN record
    fn store_pin_record(&self, record: Option<PinRecord>);

    /// Fetch an xpub for the provided path
    fn get_xpub(&self, k: &Keychain, network: Network, path: &[u32])
        -> Result<String, DriverError>;

    /// Fetch a receive address
    fn get_receive_address(
        &self,
        k: &Keychain,
        network: Network,
        kind: &AddressKind,
    ) -> Result<String, DriverError>;

    /// Sign a message with the key at the provided path, returning a base64 signature
    fn sign_message(&self, k: &Keychain, path: &[u32], message: &str)
        -> Result<String, DriverError>;

    /// Fetch the confidential blinding public key for a script
    fn get_blinding_key(&self, k: &Keychain, script: &[u8]) -> Result<[u8; 33], DriverError>;

    /// Compute the ECDH shared nonce for a script and counterparty key
    fn get_shared_nonce(
        &self,
        k: &Keychain,
        script: &[u8],
        their_pubkey: &[u8; 33],
    ) -> Result<[u8; 32], DriverError>;

    /// Derive an asset or value blinding factor for an output
    fn get_blinding_factor(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        kind: BlindingFactorKind,
    ) -> Result<[u8; 32], DriverError>;

    /// Compute output commitments
    fn get_commitments(
        &self,
        k: &Keychain,
        asset_id: &[u8; 32],
        value: u64,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        vbf: Option<&[u8; 32]>,
    ) -> Result<Commitments, DriverError>;

    /// Verify a trusted commitment against device-derived values
    fn verify_commitment(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        commitment: &Commitment,
    ) -> Result<(), DriverError>;

    /// Sign a transaction input, returning a DER encoded signature
    fn sign_input(
        &self,
        k: &Keychain,
        tx: &TxContext,
        index: usize,
        input: &TxInput,
    ) -> Result<Vec<u8>, DriverError>;

    /// Maximum (compressed) firmware size accepted for OTA
    fn ota_max_size(&self) -> usize;

    /// Start a firmware update
    fn ota_begin(&self, fwsize: usize, cmpsize: usize) -> Result<(), DriverError>;

    /// Write a chunk of (compressed) firmware
    fn ota_write(&self, chunk: &[u8]) -> Result<(), DriverError>;

    /// Finalise a firmware update
    fn ota_finalize(&self, fwsize: usize) -> Result<(), DriverError>;
}

impl<T: Driver + ?Sized> Driver for std::sync::Arc<T> {
    fn platform_info(&self) -> PlatformInfo {
        T::platform_info(self)
    }

    fn keychain_from_mnemonic(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
    ) -> Result<Keychain, DriverError> {
        T::keychain_from_mnemonic(self, mnemonic, passphrase)
    }

    fn keychain_from_seed(&self, seed: &[u8]) -> Result<Keychain, DriverError> {
        T::keychain_from_seed(self, seed)
    }

    fn setup_keychain(&self) -> Result<Keychain, DriverError> {
        T::setup_keychain(self)
    }

    fn user_pin(&self) -> Result<Zeroizing<String>, DriverError> {
        T::user_pin(self)
    }

    fn pin_record(&self) -> Option<PinRecord> {
        T::pin_record(self)
    }

    fn store_pin_record(&self, record: Option<PinRecord>) {
        T::store_pin_record(self, record)
    }

    fn get_xpub(
        &self,
        k: &Keychain,
        network: Network,
        path: &[u32],
    ) -> Result<String, DriverError> {
        T::get_xpub(self, k, network, path)
    }

    fn get_receive_address(
        &self,
        k: &Keychain,
        network: Network,
        kind: &AddressKind,
    ) -> Result<String, DriverError> {
        T::get_receive_address(self, k, network, kind)
    }

    fn sign_message(
        &self,
        k: &Keychain,
        path: &[u32],
        message: &str,
    ) -> Result<String, DriverError> {
        T::sign_message(self, k, path, message)
    }

    fn get_blinding_key(&self, k: &Keychain, script: &[u8]) -> Result<[u8; 33], DriverError> {
        T::get_blinding_key(self, k, script)
    }

    fn get_shared_nonce(
        &self,
        k: &Keychain,
        script: &[u8],
        their_pubkey: &[u8; 33],
    ) -> Result<[u8; 32], DriverError> {
        T::get_shared_nonce(self, k, script, their_pubkey)
    }

    fn get_blinding_factor(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        kind: BlindingFactorKind,
    ) -> Result<[u8; 32], DriverError> {
        T::get_blinding_factor(self, k, hash_prevouts, output_index, kind)
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
        T::get_commitments(self, k, asset_id, value, hash_prevouts, output_index, vbf)
    }

    fn verify_commitment(
        &self,
        k: &Keychain,
        hash_prevouts: &[u8; 32],
        output_index: u32,
        commitment: &Commitment,
    ) -> Result<(), DriverError> {
        T::verify_commitment(self, k, hash_prevouts, output_index, commitment)
    }

    fn sign_input(
        &self,
        k: &Keychain,
        tx: &TxContext,
        index: usize,
        input: &TxInput,
    ) -> Result<Vec<u8>, DriverError> {
        T::sign_input(self, k, tx, index, input)
    }

    fn ota_max_size(&self) -> usize {
        T::ota_max_size(self)
    }

    fn ota_begin(&self, fwsize: usize, cmpsize: usize) -> Result<(), DriverError> {
        T::ota_begin(self, fwsize, cmpsize)
    }

    fn ota_write(&self, chunk: &[u8]) -> Result<(), DriverError> {
        T::ota_write(self, chunk)
    }

    fn ota_finalize(&self, fwsize: usize) -> Result<(), DriverError> {
        T::ota_finalize(self, fwsize)
    }
}

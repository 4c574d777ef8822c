// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Engine configuration

use std::time::Duration;

use jade_proto::{MAX_FRAME_LEN, OTA_MAX_CHUNK};

/// Default PIN server mirrors
pub const DEFAULT_PINSERVER_URLS: &[&str] = &[
    "https://jadepin.blockstream.com",
    "http://mrrxtq6tjpbnbm7vh5jt6mpjctn7ggyfy5wegvbeff3x7jrznqawlmid.onion",
];

/// Default PIN server identity key
pub const DEFAULT_PINSERVER_PUBKEY: [u8; 33] = [
    0x03, 0xfe, 0x7e, 0xc4, 0xd8, 0x26, 0x1e, 0x9c, 0x4b, 0x48, 0x79, 0x81, 0x3e, 0x6f, 0x35, 0xac,
    0x31, 0x2c, 0x11, 0x7a, 0x6b, 0xde, 0x7b, 0xff, 0x8b, 0xf0, 0x40, 0x76, 0x8a, 0x00, 0x92, 0xfe,
    0x52,
];

/// Default idle timeout, after which the session lock is cleared
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// [Engine][crate::engine::Engine] configuration
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// Frame reassembly buffer capacity
    pub frame_capacity: usize,

    /// PIN server base URLs (tried in order by the caller)
    pub pinserver_urls: Vec<String>,

    /// Root certificates for PIN server connections
    pub root_certificates: Vec<String>,

    /// PIN server identity key (compressed), used to verify handshake signatures
    pub pinserver_pubkey: [u8; 33],

    /// Idle timeout, after which the session lock is released
    pub idle_timeout: Duration,

    /// Firmware version string
    pub version: String,

    /// Radio configuration (`BLE` / `NORADIO`)
    pub radio: String,

    /// Maximum `ota_data` chunk size
    pub ota_max_chunk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_capacity: MAX_FRAME_LEN,
            pinserver_urls: DEFAULT_PINSERVER_URLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            root_certificates: vec![],
            pinserver_pubkey: DEFAULT_PINSERVER_PUBKEY,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            version: env!("CARGO_PKG_VERSION").to_string(),
            radio: "BLE".to_string(),
            ota_max_chunk: OTA_MAX_CHUNK,
        }
    }
}

impl Config {
    /// Override the PIN server mirrors (eg. for a local PIN server)
    pub fn with_pinserver(mut self, urls: &[&str], pubkey: [u8; 33]) -> Self {
        self.pinserver_urls = urls.iter().map(|s| s.to_string()).collect();
        self.pinserver_pubkey = pubkey;
        self
    }
}

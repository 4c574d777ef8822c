// Copyright (c) 2022-2023 The MobileCoin Foundation

use serde::{Deserialize, Serialize};

/// Device version / status information, returned by `get_version_info`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VersionInfo {
    pub jade_version: String,
    pub jade_ota_max_chunk: u32,
    pub jade_config: String,
    pub idf_version: String,
    pub chip_features: String,
    pub efusemac: String,
    pub battery_status: u8,
    pub jade_networks: String,
    pub jade_has_pin: bool,
    pub jade_free_heap: u32,
    pub jade_free_dram: u32,
    pub jade_largest_dram: u32,
    pub jade_free_spiram: u32,
    pub jade_largest_spiram: u32,
}

/// Number of fields in [VersionInfo]
pub const NUM_VALUES_VERINFO: usize = 14;

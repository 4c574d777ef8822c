// Copyright (c) 2022-2023 The MobileCoin Foundation

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Supported networks
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Display,
    EnumString,
    EnumVariantNames,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Liquid,
    LocaltestLiquid,
    Localtest,
}

/// Network class, devices are restricted to one class once used
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum NetworkType {
    Main,
    Test,
}

impl Network {
    /// Check whether this is a liquid (elements) network
    pub fn is_liquid(&self) -> bool {
        matches!(self, Network::Liquid | Network::LocaltestLiquid)
    }

    /// Fetch network class
    pub fn network_type(&self) -> NetworkType {
        match self {
            Network::Mainnet | Network::Liquid => NetworkType::Main,
            _ => NetworkType::Test,
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Jade hardware wallet API Library (and CLI)
//!

use std::fmt::Debug;

use async_trait::async_trait;

/// Re-export `jade-proto` for consumers
pub use jade_proto::{self as proto};

/// Re-export transports for consumer use
pub mod transport;
use transport::*;

mod handle;
pub use handle::DeviceHandle;

mod error;
pub use error::Error;

pub mod params;

mod pinserver;
#[cfg(feature = "http")]
pub use pinserver::HttpPinServer;
pub use pinserver::{execute, PinServer};

/// Generic device handle (abstract over transport types)
pub type GenericHandle = DeviceHandle<GenericTransport>;

impl GenericHandle {
    /// Create a new generic device handle
    pub fn new(d: impl Into<GenericTransport>) -> Self {
        Self::from(d.into())
    }
}

/// Connect trait for supported transports
#[async_trait]
pub trait Connect<T> {
    type Options: Debug;

    /// Connect to the specified device
    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<T>, Error>;
}

/// Device provider, connecting to devices over supported transports
#[derive(Clone, Debug, Default)]
pub struct JadeProvider;

impl JadeProvider {
    /// Create a new provider
    pub fn new() -> Self {
        Self
    }
}

/// Connect implementation for TCP devices (simulators / serial bridges)
#[async_trait]
impl Connect<GenericTransport> for JadeProvider {
    type Options = TcpOptions;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<GenericTransport>, Error> {
        log::debug!("Connecting to {}", opts.addr);

        // Connect to device
        let t = opts.connect().await?;

        Ok(DeviceHandle::from(GenericTransport::Tcp(t)))
    }
}

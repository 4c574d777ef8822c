// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Session lock, shared between connections
//!
//! At most one [Source] holds the unlocked [Keychain] at a time, a
//! successful authentication from another source supersedes the holder.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use jade_proto::{Network, NetworkType};

use super::{Error, Keychain};

/// Message sources (connection origins)
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Display, EnumString, EnumVariantNames, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Serial,
    Ble,
}

struct LockState {
    holder: Option<(Source, Keychain)>,
    network_type: Option<NetworkType>,
    last_activity: Instant,
}

/// Process-wide session lock
#[derive(Clone)]
pub struct SessionLock {
    inner: Arc<Mutex<LockState>>,
}

impl Default for SessionLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLock {
    /// Create a new (unlocked, uninitialised) session lock
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LockState {
                holder: None,
                network_type: None,
                last_activity: Instant::now(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Authenticate a source with the unlocked keychain,
    /// superseding any previous holder
    pub fn authenticate(
        &self,
        source: Source,
        keychain: Keychain,
        network_type: Option<NetworkType>,
    ) {
        let mut s = self.state();

        #[cfg(feature = "log")]
        match &s.holder {
            Some((prev, _)) if *prev != source => {
                log::info!("session lock moving from {} to {}", prev, source)
            }
            _ => log::debug!("session lock held by {}", source),
        }

        s.holder = Some((source, keychain));
        s.network_type = network_type;
        s.last_activity = Instant::now();
    }

    /// Check whether the provided source holds the lock
    pub fn check(&self, source: Source) -> Result<(), Error> {
        match &self.state().holder {
            Some((h, _)) if *h == source => Ok(()),
            _ => Err(Error::Locked),
        }
    }

    /// Fetch the current holder
    pub fn holder(&self) -> Option<Source> {
        self.state().holder.as_ref().map(|(h, _)| *h)
    }

    /// Execute a function with the unlocked keychain, if held by `source`
    pub fn with_keychain<R>(
        &self,
        source: Source,
        f: impl FnOnce(&Keychain) -> R,
    ) -> Result<R, Error> {
        match &self.state().holder {
            Some((h, k)) if *h == source => Ok(f(k)),
            _ => Err(Error::Locked),
        }
    }

    /// Apply the network class restriction, set on first use
    pub fn check_network(&self, network: Network) -> Result<(), Error> {
        let mut s = self.state();

        match s.network_type {
            Some(t) if t != network.network_type() => {
                Err(Error::BadParams("Network type inconsistent with prior usage"))
            }
            Some(_) => Ok(()),
            None => {
                s.network_type = Some(network.network_type());
                Ok(())
            }
        }
    }

    /// Fetch the current network class restriction
    pub fn network_type(&self) -> Option<NetworkType> {
        self.state().network_type
    }

    /// Release the lock if held by `source`, returning true if released
    pub fn release(&self, source: Source) -> bool {
        let mut s = self.state();
        match &s.holder {
            Some((h, _)) if *h == source => {
                s.holder = None;
                s.network_type = None;
                true
            }
            _ => false,
        }
    }

    /// Clear the lock (explicit reset)
    pub fn clear(&self) {
        let mut s = self.state();
        s.holder = None;
        s.network_type = None;
    }

    /// Register activity from `source`, resetting the idle timer while it holds the lock
    pub fn register_activity(&self, source: Source) {
        let mut s = self.state();
        if matches!(&s.holder, Some((h, _)) if *h == source) {
            s.last_activity = Instant::now();
        }
    }

    /// Time since last registered activity
    pub fn idle_for(&self) -> Duration {
        self.state().last_activity.elapsed()
    }

    /// Clear the lock if idle for at least `timeout`, returning true if cleared
    pub fn expire_idle(&self, timeout: Duration) -> bool {
        let mut s = self.state();
        if s.holder.is_none() || s.last_activity.elapsed() < timeout {
            return false;
        }

        #[cfg(feature = "log")]
        log::warn!("idle timeout elapsed, clearing session lock");

        s.holder = None;
        s.network_type = None;
        true
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Firmware update exchange

use rand_core::CryptoRngCore;

use super::{Driver, Engine, Error, Output, State};

/// OTA exchange state
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct OtaState {
    /// Uncompressed firmware size
    pub fwsize: usize,
    /// Compressed (transferred) size
    pub cmpsize: usize,
    /// Compressed bytes received
    pub received: usize,
}

impl OtaState {
    /// All declared data has been received
    pub fn is_complete(&self) -> bool {
        self.received == self.cmpsize
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    pub(crate) fn ota_begin(&mut self, fwsize: usize, cmpsize: usize) -> Result<Output, Error> {
        if cmpsize > self.drv.ota_max_size() {
            return Err(Error::BadParams("Bad parameters"));
        }

        self.drv.ota_begin(fwsize, cmpsize)?;

        #[cfg(feature = "log")]
        log::info!("ota start (fwsize: {}, cmpsize: {})", fwsize, cmpsize);

        self.state = State::Ota(OtaState {
            fwsize,
            cmpsize,
            received: 0,
        });

        Ok(Output::Bool(true))
    }

    pub(crate) fn ota_data(&mut self, mut s: OtaState, chunk: &[u8]) -> Result<Output, Error> {
        // Reject overruns, leaving the exchange open
        if s.received + chunk.len() > s.cmpsize {
            return Err(Error::BadParams("Data exceeds declared size"));
        }

        if let Err(e) = self.drv.ota_write(chunk) {
            self.reset();
            return Err(e.into());
        }

        s.received += chunk.len();
        self.state = State::Ota(s);

        #[cfg(feature = "log")]
        log::trace!("ota received {}/{}", s.received, s.cmpsize);

        Ok(Output::Bool(true))
    }

    pub(crate) fn ota_complete(&mut self, s: OtaState) -> Result<Output, Error> {
        self.reset();

        self.drv.ota_finalize(s.fwsize)?;

        #[cfg(feature = "log")]
        log::info!("ota complete");

        Ok(Output::Bool(true))
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Message framing
//!
//! Each CBOR message is escaped and followed by a single [FRAME_END] byte,
//! so frames can be delimited on a raw byte stream without length prefixes.
//!
//! ```text
//! 0x0a (FRAME_END) -> 0xdb 0xdc
//! 0xdb (FRAME_ESC) -> 0xdb 0xdd
//! ```
//!
//! The [FrameDecoder] accumulates inbound bytes in a bounded buffer of
//! [MAX_FRAME_LEN] bytes. When the buffer fills without a terminator the
//! buffered block is discarded and the count of dropped bytes is attached
//! to the next completed [Frame], along with the retained (raw) tail.

use serde::{de::DeserializeOwned, Serialize};

use crate::{trace_err, Error};

/// Frame terminator
pub const FRAME_END: u8 = 0x0a;

/// Escape marker
pub const FRAME_ESC: u8 = 0xdb;

/// Escaped [FRAME_END]
pub const ESC_END: u8 = 0xdc;

/// Escaped [FRAME_ESC]
pub const ESC_ESC: u8 = 0xdd;

/// Reassembly buffer capacity, sized to hold a 400k transaction plus slack
pub const MAX_FRAME_LEN: usize = 401 * 1024;

/// Encode a message to a terminated frame
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, Error> {
    let payload = serde_cbor::to_vec(msg)?;
    Ok(escape(&payload))
}

/// Escape a payload and append the frame terminator
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut b = Vec::with_capacity(payload.len() + payload.len() / 64 + 1);

    for v in payload {
        match *v {
            FRAME_END => b.extend_from_slice(&[FRAME_ESC, ESC_END]),
            FRAME_ESC => b.extend_from_slice(&[FRAME_ESC, ESC_ESC]),
            _ => b.push(*v),
        }
    }

    b.push(FRAME_END);
    b
}

/// Unescape a raw frame (with or without the trailing terminator)
pub fn unescape(raw: &[u8]) -> Result<Vec<u8>, Error> {
    let raw = raw.strip_suffix(&[FRAME_END]).unwrap_or(raw);
    let mut b = Vec::with_capacity(raw.len());

    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            FRAME_ESC => {
                match raw.get(i + 1) {
                    Some(&ESC_END) => b.push(FRAME_END),
                    Some(&ESC_ESC) => b.push(FRAME_ESC),
                    _ => return Err(Error::InvalidEscape(i)),
                }
                i += 2;
            }
            // Bare terminators cannot appear within a frame
            FRAME_END => return Err(Error::InvalidEscape(i)),
            v => {
                b.push(v);
                i += 1;
            }
        }
    }

    Ok(b)
}

/// Terminated frame as received from the wire
#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    raw: Vec<u8>,
    discarded: usize,
}

impl Frame {
    /// Raw (escaped) frame bytes, including the terminator
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Number of bytes discarded due to overflow prior to this frame
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Unescaped frame payload
    pub fn payload(&self) -> Result<Vec<u8>, Error> {
        unescape(&self.raw).map_err(trace_err)
    }

    /// Decode frame payload to the provided type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let p = self.payload()?;
        let v = serde_cbor::from_slice(&p).map_err(trace_err)?;
        Ok(v)
    }
}

/// Bounded frame reassembly buffer
#[derive(Clone, Debug)]
pub struct FrameDecoder {
    buff: Vec<u8>,
    capacity: usize,
    discarded: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    /// Create a new decoder with the provided buffer capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buff: Vec::new(),
            capacity: capacity.max(1),
            discarded: 0,
        }
    }

    /// Feed received bytes, returning any completed frames in order
    pub fn feed(&mut self, mut data: &[u8]) -> Vec<Frame> {
        let mut frames = vec![];

        while !data.is_empty() {
            let (chunk, terminated) = match data.iter().position(|v| *v == FRAME_END) {
                Some(n) => (&data[..=n], true),
                None => (data, false),
            };
            data = &data[chunk.len()..];

            self.push(chunk);

            if terminated {
                frames.push(self.take());
            }
        }

        frames
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.buff.len()
    }

    /// Check whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buff.is_empty()
    }

    /// Bytes discarded since the last completed frame
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Clear buffer and discard counter
    pub fn reset(&mut self) {
        self.buff.clear();
        self.discarded = 0;
    }

    fn push(&mut self, mut chunk: &[u8]) {
        while !chunk.is_empty() {
            let n = usize::min(self.capacity - self.buff.len(), chunk.len());
            self.buff.extend_from_slice(&chunk[..n]);
            chunk = &chunk[n..];

            // Buffer full with no terminator, drop the block and restart
            if self.buff.len() == self.capacity && self.buff.last() != Some(&FRAME_END) {
                #[cfg(feature = "log")]
                log::warn!("frame buffer overflow, discarding {} bytes", self.buff.len());

                self.discarded += self.buff.len();
                self.buff.clear();
            }
        }
    }

    fn take(&mut self) -> Frame {
        let f = Frame {
            raw: core::mem::take(&mut self.buff),
            discarded: self.discarded,
        };

        if f.discarded > 0 {
            #[cfg(feature = "log")]
            log::warn!(
                "frame complete after {} discarded bytes ({} retained)",
                f.discarded,
                f.raw.len()
            );
        }

        self.discarded = 0;
        f
    }
}

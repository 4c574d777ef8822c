// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Minimal transaction layout scanner
//!
//! This walks serialised Bitcoin (optionally segwit) and Elements
//! transactions to recover input / output counts and the BIP-143 style
//! `hash_prevouts` (sha256d over all input outpoints), sufficient for
//! staged signing to check declared counts against the provided
//! transaction. Scripts and amounts are skipped, not interpreted.

use byteorder::{ByteOrder, LittleEndian};
use sha2::{Digest, Sha256};

/// Transaction scan errors
#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TxError {
    /// Transaction truncated at the provided offset
    #[error("transaction truncated at offset {0}")]
    Truncated(usize),
    /// Unrecognised confidential value / asset / nonce prefix
    #[error("invalid confidential prefix 0x{0:02x}")]
    InvalidPrefix(u8),
    /// Bytes remaining following locktime / witness data
    #[error("trailing data ({0} bytes)")]
    TrailingData(usize),
}

/// Transaction layout, as recovered by [scan]
#[derive(Clone, PartialEq, Debug)]
pub struct TxLayout {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub hash_prevouts: [u8; 32],
}

const OUTPOINT_LEN: usize = 36;

const ISSUANCE_FLAG: u32 = 1 << 31;

/// Scan a serialised transaction, `liquid` selecting elements encoding
pub fn scan(txn: &[u8], liquid: bool) -> Result<TxLayout, TxError> {
    let mut r = Reader { b: txn, i: 0 };

    // Version
    r.take(4)?;

    // Segwit marker (bitcoin) or witness flag (elements)
    let has_witness = match liquid {
        true => r.byte()? != 0,
        false if r.peek(2) == Some(&[0x00, 0x01]) => {
            r.take(2)?;
            true
        }
        false => false,
    };

    // Inputs
    let num_inputs = r.varint()?;
    let mut outpoints = Sha256::new();

    for _ in 0..num_inputs {
        let op = r.take(OUTPOINT_LEN)?;
        outpoints.update(op);

        let idx = LittleEndian::read_u32(&op[32..]);

        r.var_bytes()?;
        r.take(4)?;

        // Elements asset issuance (nonce, entropy, amount, inflation keys)
        if liquid && idx != u32::MAX && idx & ISSUANCE_FLAG != 0 {
            r.take(64)?;
            r.conf_value()?;
            r.conf_value()?;
        }
    }

    // Outputs
    let num_outputs = r.varint()?;
    for _ in 0..num_outputs {
        if liquid {
            r.conf_asset()?;
            r.conf_value()?;
            r.conf_nonce()?;
        } else {
            r.take(8)?;
        }
        r.var_bytes()?;
    }

    // Bitcoin witnesses precede locktime
    if has_witness && !liquid {
        for _ in 0..num_inputs {
            r.witness_stack()?;
        }
    }

    // Locktime
    r.take(4)?;

    // Elements witnesses follow locktime
    if has_witness && liquid {
        for _ in 0..num_inputs {
            // Issuance and inflation range proofs
            r.var_bytes()?;
            r.var_bytes()?;
            // Script witness and pegin witness
            r.witness_stack()?;
            r.witness_stack()?;
        }
        for _ in 0..num_outputs {
            // Surjection and range proofs
            r.var_bytes()?;
            r.var_bytes()?;
        }
    }

    if r.i != txn.len() {
        return Err(TxError::TrailingData(txn.len() - r.i));
    }

    #[cfg(feature = "log")]
    log::trace!("scanned txn: {} inputs, {} outputs", num_inputs, num_outputs);

    let hash_prevouts = Sha256::digest(outpoints.finalize()).into();

    Ok(TxLayout {
        num_inputs,
        num_outputs,
        hash_prevouts,
    })
}

struct Reader<'a> {
    b: &'a [u8],
    i: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TxError> {
        let end = self.i.checked_add(n).ok_or(TxError::Truncated(self.i))?;
        let v = self.b.get(self.i..end).ok_or(TxError::Truncated(self.i))?;
        self.i = end;
        Ok(v)
    }

    fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.b.get(self.i..self.i + n)
    }

    fn byte(&mut self) -> Result<u8, TxError> {
        Ok(self.take(1)?[0])
    }

    fn varint(&mut self) -> Result<usize, TxError> {
        let v = match self.byte()? {
            0xfd => LittleEndian::read_u16(self.take(2)?) as u64,
            0xfe => LittleEndian::read_u32(self.take(4)?) as u64,
            0xff => LittleEndian::read_u64(self.take(8)?),
            v => return Ok(v as usize),
        };

        usize::try_from(v).map_err(|_| TxError::Truncated(self.i))
    }

    fn var_bytes(&mut self) -> Result<&'a [u8], TxError> {
        let n = self.varint()?;
        self.take(n)
    }

    fn witness_stack(&mut self) -> Result<(), TxError> {
        for _ in 0..self.varint()? {
            self.var_bytes()?;
        }
        Ok(())
    }

    fn conf_value(&mut self) -> Result<(), TxError> {
        match self.byte()? {
            0x00 => Ok(()),
            0x01 => self.take(8).map(|_| ()),
            0x08 | 0x09 => self.take(32).map(|_| ()),
            v => Err(TxError::InvalidPrefix(v)),
        }
    }

    fn conf_asset(&mut self) -> Result<(), TxError> {
        match self.byte()? {
            0x00 => Ok(()),
            0x01 | 0x0a | 0x0b => self.take(32).map(|_| ()),
            v => Err(TxError::InvalidPrefix(v)),
        }
    }

    fn conf_nonce(&mut self) -> Result<(), TxError> {
        match self.byte()? {
            0x00 => Ok(()),
            0x01..=0x03 => self.take(32).map(|_| ()),
            v => Err(TxError::InvalidPrefix(v)),
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::str::FromStr;

/// Hardened derivation flag
const HARDENED: u32 = 1 << 31;

#[derive(Clone, PartialEq, Debug)]
pub struct HexData<const N: usize = 32>(pub [u8; N]);

impl<const N: usize> FromStr for HexData<N> {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut b = [0u8; N];

        hex::decode_to_slice(s, &mut b)?;

        Ok(HexData(b))
    }
}

impl<const N: usize> AsRef<[u8; N]> for HexData<N> {
    fn as_ref(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> std::fmt::Display for HexData<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Variable length hex data
#[derive(Clone, PartialEq, Debug)]
pub struct HexBytes(pub Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map(HexBytes)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// BIP-32 derivation path, `m/44'/0'/0'/0/1` (`h` or `'` for hardened)
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Bip32Path(pub Vec<u32>);

impl FromStr for Bip32Path {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches('m').trim_start_matches('/');
        if s.is_empty() {
            return Ok(Self::default());
        }

        s.split('/')
            .map(|e| {
                let (n, hardened) = match e.strip_suffix(['\'', 'h']) {
                    Some(n) => (n, true),
                    None => (e, false),
                };

                let n = u32::from_str(n)
                    .map_err(|_| anyhow::anyhow!("invalid path element '{}'", e))?;
                if n >= HARDENED {
                    return Err(anyhow::anyhow!("path element out of range '{}'", e));
                }

                Ok(match hardened {
                    true => n | HARDENED,
                    false => n,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Bip32Path)
    }
}

impl AsRef<[u32]> for Bip32Path {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

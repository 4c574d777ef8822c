// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Parameter extraction
//!
//! Fields are extracted in declaration order by [Event::parse][super::Event::parse],
//! the first failing field determining the returned error.

use std::{collections::BTreeMap, str::FromStr};

use jade_proto::{Network, Value};

use super::Error;

/// Maximum BIP-0032 path depth
pub const MAX_PATH_LEN: usize = 16;

/// Parameter map accessor
#[derive(Clone, Copy, Debug)]
pub struct Params<'a> {
    map: &'a BTreeMap<Value, Value>,
}

impl<'a> Params<'a> {
    /// Access request parameters, which must be a map
    pub fn new(params: Option<&'a Value>) -> Result<Self, Error> {
        match params {
            Some(Value::Map(map)) => Ok(Self { map }),
            _ => Err(Error::ExpectingParams),
        }
    }

    /// Fetch a raw field, `null` values are treated as absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        match self.map.get(&Value::Text(key.to_string())) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    /// Check whether a (non-null) field is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Extract the `network` field
    pub fn network(&self) -> Result<Network, Error> {
        match self.get("network") {
            Some(Value::Text(s)) => Network::from_str(s).map_err(|_| Error::Extract("valid network")),
            _ => Err(Error::Extract("valid network")),
        }
    }

    /// Extract a non-empty string
    pub fn string(&self, key: &str, what: &'static str) -> Result<&'a str, Error> {
        self.opt_string(key, what)?.ok_or(Error::Extract(what))
    }

    /// Extract an optional non-empty string
    pub fn opt_string(&self, key: &str, what: &'static str) -> Result<Option<&'a str>, Error> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Text(s)) if !s.is_empty() => Ok(Some(s.as_str())),
            _ => Err(Error::Extract(what)),
        }
    }

    /// Extract non-empty bytes
    pub fn bytes(&self, key: &str, what: &'static str) -> Result<&'a [u8], Error> {
        match self.get(key) {
            Some(Value::Bytes(b)) if !b.is_empty() => Ok(b.as_slice()),
            _ => Err(Error::Extract(what)),
        }
    }

    /// Extract fixed length bytes
    pub fn array<const N: usize>(&self, key: &str, what: &'static str) -> Result<[u8; N], Error> {
        self.opt_array(key, what)?.ok_or(Error::Extract(what))
    }

    /// Extract optional fixed length bytes
    pub fn opt_array<const N: usize>(
        &self,
        key: &str,
        what: &'static str,
    ) -> Result<Option<[u8; N]>, Error> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bytes(b)) => b
                .as_slice()
                .try_into()
                .map(Some)
                .map_err(|_| Error::Extract(what)),
            _ => Err(Error::Extract(what)),
        }
    }

    /// Extract a boolean
    pub fn bool(&self, key: &str, what: &'static str) -> Result<bool, Error> {
        match self.get(key) {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(Error::Extract(what)),
        }
    }

    /// Extract a u32
    pub fn u32(&self, key: &str, what: &'static str) -> Result<u32, Error> {
        self.opt_u32(key, what)?.ok_or(Error::Extract(what))
    }

    /// Extract an optional u32
    pub fn opt_u32(&self, key: &str, what: &'static str) -> Result<Option<u32>, Error> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => integer(v).map(Some).ok_or(Error::Extract(what)),
        }
    }

    /// Extract a u64
    pub fn u64(&self, key: &str, what: &'static str) -> Result<u64, Error> {
        match self.get(key) {
            Some(v) => integer(v).ok_or(Error::Extract(what)),
            None => Err(Error::Extract(what)),
        }
    }

    /// Extract a BIP-0032 path, `[]` allowed only where `allow_empty` is set
    pub fn path(&self, key: &str, allow_empty: bool) -> Result<Vec<u32>, Error> {
        self.get(key)
            .and_then(|v| path(v, allow_empty))
            .ok_or(Error::Extract("valid path"))
    }

    /// Extract an optional (non-empty) BIP-0032 path
    pub fn opt_path(&self, key: &str) -> Result<Option<Vec<u32>>, Error> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => path(v, false).map(Some).ok_or(Error::Extract("valid path")),
        }
    }

    /// Extract an array, `null` entries preserved
    pub fn list(&self, key: &str, what: &'static str) -> Result<&'a [Value], Error> {
        self.opt_list(key, what)?.ok_or(Error::Extract(what))
    }

    /// Extract an optional array
    pub fn opt_list(&self, key: &str, what: &'static str) -> Result<Option<&'a [Value]>, Error> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(a)) => Ok(Some(a.as_slice())),
            _ => Err(Error::Extract(what)),
        }
    }
}

/// Decode an unsigned integer bounded by the target type
pub fn integer<T: TryFrom<i128>>(v: &Value) -> Option<T> {
    match v {
        Value::Integer(i) if *i >= 0 => T::try_from(*i).ok(),
        _ => None,
    }
}

/// Decode a BIP-0032 path
pub fn path(v: &Value, allow_empty: bool) -> Option<Vec<u32>> {
    let a = match v {
        Value::Array(a) => a,
        _ => return None,
    };

    if a.len() > MAX_PATH_LEN || (a.is_empty() && !allow_empty) {
        return None;
    }

    a.iter().map(integer::<u32>).collect()
}

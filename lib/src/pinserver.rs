// Copyright (c) 2022-2023 The MobileCoin Foundation

//! PIN server access for device-issued http instructions
//!
//! The device returns [HttpRequest] instructions during `auth_user` /
//! `debug_handshake`, these are executed against a [PinServer] with the
//! reply passed back to the device.

use async_trait::async_trait;
use log::{debug, warn};

use jade_proto::HttpRequest;

use crate::Error;

/// PIN server connector, implemented over HTTP or by in-process emulators
#[async_trait]
pub trait PinServer: Send + Sync {
    /// POST JSON `data` to `url`, returning the JSON reply
    async fn post(&self, url: &str, data: &serde_json::Value)
        -> Result<serde_json::Value, Error>;
}

/// Execute an http instruction, trying each url in order
pub async fn execute<S: PinServer + ?Sized>(
    server: &S,
    req: &HttpRequest<serde_json::Value>,
) -> Result<serde_json::Value, Error> {
    let mut last = String::from("no urls provided");

    for url in req.urls() {
        debug!("POST {}", url);

        match server.post(url, req.data()).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!("PIN server request to {} failed: {:?}", url, e);
                last = e.to_string();
            }
        }
    }

    Err(Error::PinServer(last))
}

/// HTTP PIN server connector
#[cfg(feature = "http")]
#[derive(Clone, Debug, Default)]
pub struct HttpPinServer {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpPinServer {
    /// Create a new connector using the default client
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl PinServer for HttpPinServer {
    async fn post(
        &self,
        url: &str,
        data: &serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let map = |e: reqwest::Error| Error::PinServer(e.to_string());

        // Empty payloads are sent without a body
        let req = match data {
            serde_json::Value::String(s) if s.is_empty() => self.client.post(url),
            _ => self.client.post(url).json(data),
        };

        let resp = req.send().await.map_err(map)?;
        let resp = resp.error_for_status().map_err(map)?;

        resp.json().await.map_err(map)
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! HTTP indirection instructions
//!
//! The device never speaks HTTP itself, instead returning an [HttpRequest]
//! the caller must execute (trying each url in turn), feeding the reply
//! back as the parameters of the named `on-reply` method.
//!

use serde::{Deserialize, Serialize};
use serde_cbor::Value;

/// PIN server endpoint to start a handshake
pub const START_HANDSHAKE: &str = "start_handshake";

/// PIN server endpoint to set a new PIN
pub const SET_PIN: &str = "set_pin";

/// PIN server endpoint to fetch the key for an existing PIN
pub const GET_PIN: &str = "get_pin";

/// HTTP request instruction, `{http_request: {params, on-reply}}`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HttpRequest<D = Value> {
    pub http_request: HttpRequestBody<D>,
}

/// HTTP request body, `params` is executed and the reply sent to `on-reply`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HttpRequestBody<D = Value> {
    pub params: HttpParams<D>,
    #[serde(rename = "on-reply")]
    pub on_reply: String,
}

/// HTTP request parameters
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct HttpParams<D = Value> {
    pub urls: Vec<String>,
    pub root_certificates: Vec<String>,
    pub method: String,
    pub accept: String,
    pub data: D,
}

impl<D> HttpRequest<D> {
    /// Build a JSON POST instruction against the provided server mirrors
    pub fn post<S: AsRef<str>>(
        servers: &[S],
        endpoint: &str,
        root_certificates: &[S],
        data: D,
        on_reply: &str,
    ) -> Self {
        let urls = servers
            .iter()
            .map(|s| format!("{}/{}", s.as_ref().trim_end_matches('/'), endpoint))
            .collect();

        Self {
            http_request: HttpRequestBody {
                params: HttpParams {
                    urls,
                    root_certificates: root_certificates
                        .iter()
                        .map(|c| c.as_ref().to_string())
                        .collect(),
                    method: "POST".to_string(),
                    accept: "json".to_string(),
                    data,
                },
                on_reply: on_reply.to_string(),
            },
        }
    }

    /// Method to be called with the HTTP reply
    pub fn on_reply(&self) -> &str {
        &self.http_request.on_reply
    }

    /// URLs to try, in order
    pub fn urls(&self) -> &[String] {
        &self.http_request.params.urls
    }

    /// Request payload
    pub fn data(&self) -> &D {
        &self.http_request.params.data
    }
}

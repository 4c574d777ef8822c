// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Request envelope validation

use jade_proto::{rpc::DEFAULT_ID, Frame, RpcRequest, Value, MAX_ID_LEN, MAX_METHOD_LEN};

/// Validate a received frame, returning the typed request or
/// the response id to be used for the malformed-request error
pub fn validate(frame: &Frame) -> Result<RpcRequest, String> {
    let v: Value = frame.decode().map_err(|_| DEFAULT_ID.to_string())?;
    validate_value(v)
}

/// Validate a decoded message
pub fn validate_value(v: Value) -> Result<RpcRequest, String> {
    let mut m = match v {
        Value::Map(m) => m,
        _ => return Err(DEFAULT_ID.to_string()),
    };

    // id and method are judged independently
    let id = match m.remove(&Value::Text("id".to_string())) {
        Some(Value::Text(s)) if s.chars().count() < MAX_ID_LEN => Some(s),
        _ => None,
    };

    let method = match m.remove(&Value::Text("method".to_string())) {
        Some(Value::Text(s)) if !s.is_empty() && s.chars().count() < MAX_METHOD_LEN => Some(s),
        _ => None,
    };

    let params = match m.remove(&Value::Text("params".to_string())) {
        None | Some(Value::Null) => None,
        Some(p) => Some(p),
    };

    match (id, method) {
        (Some(id), Some(method)) => Ok(RpcRequest::new(id, method, params)),
        (Some(id), None) => Err(id),
        (None, _) => Err(DEFAULT_ID.to_string()),
    }
}

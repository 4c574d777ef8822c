// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Framing, envelope validation and method dispatch tests

use std::time::Duration;

use anyhow::anyhow;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

use jade::{
    proto::{encode_frame, ErrorCode, RpcRequest, Value, NUM_VALUES_VERINFO},
    DeviceHandle,
};

use crate::{
    check_error,
    vectors::{self, *},
};

/// Run all protocol tests
pub async fn test<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    bad_messages(d).await?;
    very_bad_messages(d).await?;
    too_much_input(d).await?;
    split_message(d).await?;
    concatenated_messages(d).await?;
    unknown_methods(d).await?;
    unexpected_methods(d).await?;

    Ok(())
}

/// Malformed envelopes return `InvalidRequest`, echoing usable ids
pub async fn bad_messages<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    for (msg, id) in vectors::bad_messages() {
        info!("bad message: {:?}", msg);

        let mut r = d
            .exchange_raw(&encode_frame(&msg)?, 1, d.request_timeout())
            .await?;
        let r = r.pop().ok_or_else(|| anyhow!("missing response"))?;

        check_error(&r, id, ErrorCode::InvalidRequest, "Invalid RPC Request message")?;
    }

    Ok(())
}

/// Undecodable frames return `InvalidRequest` with the default id
pub async fn very_bad_messages<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    for f in vectors::very_bad_messages() {
        let mut r = d.exchange_raw(&f, 1, d.request_timeout()).await?;
        let r = r.pop().ok_or_else(|| anyhow!("missing response"))?;

        check_error(&r, "00", ErrorCode::InvalidRequest, "Invalid RPC Request message")?;
    }

    Ok(())
}

/// Overflowing the frame buffer discards the leading data,
/// the retained tail is returned in the error
pub async fn too_much_input<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let noise = b"long";
    let cacophony = noise.repeat(4096);

    for _ in 0..25 {
        d.exchange_raw(&cacophony, 0, d.request_timeout()).await?;
    }
    d.exchange_raw(&noise.repeat(288), 0, d.request_timeout())
        .await?;

    let mut r = d.exchange_raw(b"xyz\n", 1, d.request_timeout()).await?;
    let r = r.pop().ok_or_else(|| anyhow!("missing response"))?;

    check_error(&r, "00", ErrorCode::InvalidRequest, "Invalid RPC Request message")?;

    let data = r
        .error()
        .and_then(|e| e.data.as_ref())
        .ok_or_else(|| anyhow!("missing error data"))?;
    assert_eq!(data.len(), 132);
    assert!(data.ends_with(b"longxyz\n"));

    Ok(())
}

/// Messages split over multiple writes are reassembled
pub async fn split_message<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let msg = encode_frame(&RpcRequest::<Value>::new("123456", "get_version_info", None))?;

    d.exchange_raw(&msg[..5], 0, d.request_timeout()).await?;
    tokio::time::sleep(Duration::from_millis(250)).await;

    d.exchange_raw(&msg[5..10], 0, d.request_timeout()).await?;
    tokio::time::sleep(Duration::from_millis(250)).await;

    let r = d.exchange_raw(&msg[10..], 1, d.request_timeout()).await?;
    check_version_info(&r[0], "123456")?;

    Ok(())
}

/// Back-to-back messages are answered in order
pub async fn concatenated_messages<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut msg = encode_frame(&RpcRequest::<Value>::new("123456", "get_version_info", None))?;
    msg.extend(encode_frame(&RpcRequest::<Value>::new(
        "456789",
        "get_version_info",
        None,
    ))?);

    let r = d.exchange_raw(&msg, 2, d.request_timeout()).await?;

    check_version_info(&r[0], "123456")?;
    check_version_info(&r[1], "456789")?;

    Ok(())
}

/// Methods outside the registry return `UnknownMethod`
pub async fn unknown_methods<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let params = map(&[("path", path(&[0, 1, 2, 3, 4])), ("message", text("Jade is cool"))]);

    for (i, m) in UNKNOWN_METHODS.iter().enumerate() {
        let id = format!("unk{i}");
        let r = d
            .call_raw(&RpcRequest::new(id.as_str(), *m, Some(params.clone())), d.request_timeout())
            .await?;

        check_error(&r, &id, ErrorCode::UnknownMethod, "Unknown method")?;
    }

    Ok(())
}

/// Continuations with no pending exchange return `UnexpectedMethod`
pub async fn unexpected_methods<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let params = [
        Some(map(&[("ske", text("abcdef")), ("sig", text("1234"))])),
        Some(map(&[("payload", text("abcdef")), ("hmac", text("1234"))])),
        Some(bytes("abcdef")),
        None,
        None,
    ];

    for (i, (m, p)) in UNEXPECTED_METHODS.iter().zip(params).enumerate() {
        let id = format!("protocol{i}");
        let r = d
            .call_raw(&RpcRequest::new(id.as_str(), *m, p), d.request_timeout())
            .await?;

        check_error(&r, &id, ErrorCode::UnexpectedMethod, "Unexpected method")?;
    }

    Ok(())
}

fn check_version_info(r: &jade::proto::RpcResponse, id: &str) -> anyhow::Result<()> {
    if r.id != id {
        return Err(anyhow!("unexpected id '{}' (expected '{}')", r.id, id));
    }

    match r.result() {
        Some(Value::Map(m)) if m.len() == NUM_VALUES_VERINFO => Ok(()),
        v => Err(anyhow!("unexpected version info: {:?}", v)),
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Generic transport abstraction for hiding underlying transport types

use std::{
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};

use strum::Display;
use tokio::{
    io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf},
    net::TcpStream,
};

use crate::Error;

/// Default TCP address for the serial transport of a simulated device
pub const DEFAULT_TCP_ADDR: &str = "127.0.0.1:30121";

/// TCP transport options
#[derive(Clone, Debug, PartialEq, clap::Args)]
pub struct TcpOptions {
    /// Device (simulator) address
    #[clap(long = "tcp-addr", default_value = DEFAULT_TCP_ADDR, env = "JADE_TCP_ADDR")]
    pub addr: SocketAddr,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 30121)),
        }
    }
}

impl TcpOptions {
    /// Connect to the configured address
    pub async fn connect(&self) -> Result<TcpStream, Error> {
        let s = TcpStream::connect(self.addr).await?;
        s.set_nodelay(true)?;
        Ok(s)
    }
}

/// Generic byte transport (abstract over transport types)
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum GenericTransport {
    Tcp(TcpStream),
    Duplex(DuplexStream),
}

/// Convert a TCP stream into a generic transport
impl From<TcpStream> for GenericTransport {
    fn from(t: TcpStream) -> Self {
        Self::Tcp(t)
    }
}

/// Convert an in-process stream into a generic transport
impl From<DuplexStream> for GenericTransport {
    fn from(t: DuplexStream) -> Self {
        Self::Duplex(t)
    }
}

impl AsyncRead for GenericTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(t) => Pin::new(t).poll_read(cx, buf),
            Self::Duplex(t) => Pin::new(t).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for GenericTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(t) => Pin::new(t).poll_write(cx, buf),
            Self::Duplex(t) => Pin::new(t).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(t) => Pin::new(t).poll_flush(cx),
            Self::Duplex(t) => Pin::new(t).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(t) => Pin::new(t).poll_shutdown(cx),
            Self::Duplex(t) => Pin::new(t).poll_shutdown(cx),
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream},
    net::TcpListener,
};

use jade_core::{
    engine::{Engine, SessionLock, Source},
    proto::hex_array,
    Config,
};

use crate::{SoftDriver, SoftOptions};

/// Read buffer size per connection
const READ_BUFF_LEN: usize = 4096;

/// Duplex buffer size for in-process connections
const DUPLEX_BUFF_LEN: usize = 64 * 1024;

/// Simulator options
#[derive(Clone, Debug, PartialEq, Parser)]
pub struct Options {
    /// Listen address
    #[clap(long, default_value = "127.0.0.1", env = "JADE_SIM_HOST")]
    pub host: String,

    /// TCP port for the serial transport
    #[clap(long, default_value = "30121", env = "JADE_SIM_SERIAL_PORT")]
    pub serial_port: u16,

    /// TCP port for the BLE transport
    #[clap(long, default_value = "30122", env = "JADE_SIM_BLE_PORT")]
    pub ble_port: u16,

    /// bip39 mnemonic used on wallet setup (random if omitted)
    #[clap(long, env = "JADE_SIM_MNEMONIC")]
    pub mnemonic: Option<String>,

    /// PIN used for user entry
    #[clap(long, default_value = crate::DEFAULT_PIN, env = "JADE_SIM_PIN")]
    pub pin: String,

    /// Idle timeout (seconds) after which the session lock is released
    #[clap(long, default_value = "300", env = "JADE_SIM_IDLE_TIMEOUT")]
    pub idle_timeout: u64,

    /// PIN server base URLs (defaults to the public mirrors)
    #[clap(long = "pinserver-url", env = "JADE_SIM_PINSERVER_URLS")]
    pub pinserver_urls: Vec<String>,

    /// PIN server identity public key (compressed, hex)
    #[clap(long, env = "JADE_SIM_PINSERVER_PUBKEY", value_parser = pubkey_from_hex)]
    pub pinserver_pubkey: Option<[u8; 33]>,
}

fn pubkey_from_hex(s: &str) -> anyhow::Result<[u8; 33]> {
    let k = hex_array(s)?;
    Ok(k)
}

impl Options {
    /// Build engine configuration from options
    pub fn config(&self) -> Config {
        let mut c = Config {
            idle_timeout: Duration::from_secs(self.idle_timeout),
            ..Default::default()
        };

        if !self.pinserver_urls.is_empty() {
            c.pinserver_urls = self.pinserver_urls.clone();
        }
        if let Some(k) = self.pinserver_pubkey {
            c.pinserver_pubkey = k;
        }

        c
    }

    /// Build driver options
    pub fn driver(&self) -> SoftOptions {
        SoftOptions {
            mnemonic: self.mnemonic.clone(),
            pin: self.pin.clone(),
            ..Default::default()
        }
    }
}

/// Simulated device, one [Engine] per connection sharing
/// a single [SoftDriver] and [SessionLock]
#[derive(Clone)]
pub struct Simulator {
    drv: Arc<SoftDriver>,
    lock: SessionLock,
    config: Config,
}

impl Simulator {
    /// Create a new simulator with the provided driver and configuration
    pub fn new(drv: SoftDriver, config: Config) -> Self {
        Self {
            drv: Arc::new(drv),
            lock: SessionLock::new(),
            config,
        }
    }

    /// Fetch shared driver
    pub fn driver(&self) -> &Arc<SoftDriver> {
        &self.drv
    }

    /// Fetch shared session lock
    pub fn lock(&self) -> &SessionLock {
        &self.lock
    }

    /// Fetch engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create an engine for a connection from the provided source
    pub fn engine(&self, source: Source) -> Engine<Arc<SoftDriver>> {
        Engine::new(
            self.drv.clone(),
            source,
            self.lock.clone(),
            self.config.clone(),
        )
    }

    /// Attach an in-process connection, returning the client half
    pub fn attach(&self, source: Source) -> DuplexStream {
        let (client, device) = tokio::io::duplex(DUPLEX_BUFF_LEN);

        let s = self.clone();
        tokio::spawn(async move {
            if let Err(e) = s.serve(source, device).await {
                warn!("{} connection error: {:?}", source, e);
            }
        });

        client
    }

    /// Service a single connection until closed
    pub async fn serve<S>(&self, source: Source, mut stream: S) -> std::io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut engine = self.engine(source);
        let mut buff = [0u8; READ_BUFF_LEN];

        debug!("{} connected", source);

        let r = 'conn: loop {
            let n = match stream.read(&mut buff).await {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(e),
            };

            // Frames are answered in order before the next read
            for resp in engine.feed(&buff[..n]) {
                if let Err(e) = stream.write_all(&resp).await {
                    break 'conn Err(e);
                }
            }
            if let Err(e) = stream.flush().await {
                break Err(e);
            }
        };

        // Pending exchanges do not outlive the connection
        engine.close();

        debug!("{} disconnected", source);

        r
    }

    /// Accept connections for a source, one at a time
    pub async fn listen(&self, source: Source, listener: TcpListener) -> std::io::Result<()> {
        info!("{} listening on {}", source, listener.local_addr()?);

        loop {
            let (stream, addr) = listener.accept().await?;
            info!("{} connection from {}", source, addr);

            if let Err(e) = self.serve(source, stream).await {
                warn!("{} connection error: {:?}", source, e);
            }
        }
    }

    /// Release the session lock on idle timeout
    pub async fn idle_timer(&self) {
        let period = (self.config.idle_timeout / 10).max(Duration::from_millis(100));
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            if self.lock.expire_idle(self.config.idle_timeout) {
                info!("Idle timeout, session lock released");
            }
        }
    }

    /// Run serial and BLE listeners with the idle timer
    pub async fn run(&self, opts: &Options) -> anyhow::Result<()> {
        let serial: SocketAddr = format!("{}:{}", opts.host, opts.serial_port).parse()?;
        let ble: SocketAddr = format!("{}:{}", opts.host, opts.ble_port).parse()?;

        let serial = TcpListener::bind(serial).await?;
        let ble = TcpListener::bind(ble).await?;

        let r = tokio::select!(
            r = self.listen(Source::Serial, serial) => r,
            r = self.listen(Source::Ble, ble) => r,
            _ = self.idle_timer() => Ok(()),
        );

        if let Err(e) = &r {
            error!("Listener failed: {:?}", e);
        }

        Ok(r?)
    }
}

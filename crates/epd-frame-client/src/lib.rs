//! Client library for the EPD Frame render daemon.
//!
//! Sends packed panel buffers over TCP using the framing in [`protocol`].

pub mod protocol;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub use protocol::{FrameError, Request, Status, MAX_PAYLOAD};

/// Default daemon address.
pub const DEFAULT_SERVER: &str = "127.0.0.1:50051";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A six-color refresh takes tens of seconds.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(90);

/// Connection to a render daemon.
pub struct RenderClient {
    stream: TcpStream,
    response_timeout: Duration,
}

impl RenderClient {
    /// Connects to the daemon at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .with_context(|| format!("Timed out connecting to {}", addr))?
            .with_context(|| format!("Failed to connect to {}", addr))?;
        stream.set_nodelay(true)?;
        debug!("Connected to {}", addr);

        Ok(Self {
            stream,
            response_timeout: RESPONSE_TIMEOUT,
        })
    }

    /// Overrides how long [`send`](Self::send) waits for the status byte.
    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// Sends one packed buffer and waits for the daemon's status.
    pub async fn send(&mut self, payload: &[u8]) -> Result<Status> {
        protocol::write_request(&mut self.stream, payload)
            .await
            .context("Failed to send payload")?;
        debug!("Sent {} byte payload", payload.len());

        let status = timeout(
            self.response_timeout,
            protocol::read_status(&mut self.stream),
        )
        .await
        .context("Timed out waiting for daemon response")?
        .context("Failed to read daemon response")?;
        debug!("Daemon replied {}", status);
        Ok(status)
    }
}

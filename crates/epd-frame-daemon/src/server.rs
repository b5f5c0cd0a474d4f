//! TCP render server.

use anyhow::Result;
use epd_frame_client::protocol::{self, Request};
use epd_frame_client::Status;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Accepts connections until the task is cancelled.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!("Connection from {}", peer);

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, state).await {
                warn!("Connection from {} failed: {:#}", peer, e);
            }
        });
    }
}

async fn handle_connection(mut socket: TcpStream, state: Arc<AppState>) -> Result<()> {
    while let Some(request) = protocol::read_request(&mut socket).await? {
        match request {
            Request::Oversized(len) => {
                // The unread body makes the stream unusable for further frames.
                warn!("Rejected {} byte payload without reading it", len);
                protocol::write_status(&mut socket, Status::ImageSizeMismatch).await?;
                return Ok(());
            }
            Request::Payload(payload) => {
                let len = payload.len();
                let status = state.handle(payload).await?;
                info!("Payload of {} bytes: {}", len, status);
                protocol::write_status(&mut socket, status).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::{Opener, Session};
    use epd_frame_client::{RenderClient, MAX_PAYLOAD};
    use epd_frame_hw::{Error, PACKED_LEN};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn start() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let state = Arc::new(AppState::headless(Config::default()));
        tokio::spawn(serve(listener, state));
        addr
    }

    #[tokio::test]
    async fn test_requests_on_one_connection() {
        let addr = start().await;
        let mut client = RenderClient::connect(&addr).await.unwrap();

        assert_eq!(
            client.send(&vec![0x11; PACKED_LEN]).await.unwrap(),
            Status::Ok
        );
        assert_eq!(
            client.send(&vec![0x11; 191_999]).await.unwrap(),
            Status::ImageSizeMismatch
        );
        assert_eq!(
            client.send(&vec![0x66; PACKED_LEN]).await.unwrap(),
            Status::Ok
        );
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let addr = start().await;
        let mut socket = TcpStream::connect(&addr).await.unwrap();
        let mut header = protocol::encode_header(0).unwrap();
        header[5..].copy_from_slice(&(MAX_PAYLOAD + 1).to_be_bytes());
        socket.write_all(&header).await.unwrap();

        assert_eq!(socket.read_u8().await.unwrap(), Status::ImageSizeMismatch as u8);
        // Server closes the connection after rejecting.
        let mut rest = Vec::new();
        assert_eq!(socket.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_panel_closes_without_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let opener: Opener = Box::new(|| -> epd_frame_hw::Result<Box<dyn Session>> {
            Err(Error::DeviceTimeout(Duration::from_secs(60)))
        });
        let state = Arc::new(AppState::with_opener(Config::default(), opener));
        tokio::spawn(serve(listener, state));

        let mut socket = TcpStream::connect(&addr).await.unwrap();
        let payload = vec![0x11; PACKED_LEN];
        protocol::write_request(&mut socket, &payload).await.unwrap();

        let mut rest = Vec::new();
        assert_eq!(socket.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_magic_closes_connection() {
        let addr = start().await;
        let mut socket = TcpStream::connect(&addr).await.unwrap();
        socket.write_all(b"GET / HTT").await.unwrap();

        let mut rest = Vec::new();
        assert_eq!(socket.read_to_end(&mut rest).await.unwrap(), 0);
    }
}

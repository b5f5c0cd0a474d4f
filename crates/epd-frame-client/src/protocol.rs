//! Request and response framing.
//!
//! A request is the 4-byte magic `EPDF`, a version byte, the payload length
//! as a big-endian `u32`, then the payload. The response is a single status
//! byte. A connection may carry any number of requests in sequence.

use std::fmt;
use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAGIC: [u8; 4] = *b"EPDF";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 9;

/// Largest payload the server will read.
pub const MAX_PAYLOAD: u32 = 1 << 20;

/// Framing errors.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Bad frame magic: {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown status code: {0}")]
    UnknownStatus(u8),

    #[error("Payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Server reply to a render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Displayed.
    Ok = 0,
    /// Accepted, refresh continues in the background.
    Queued = 1,
    /// Payload is not exactly one packed panel buffer.
    ImageSizeMismatch = 2,
}

impl Status {
    pub fn from_byte(byte: u8) -> Result<Self, FrameError> {
        match byte {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Queued),
            2 => Ok(Status::ImageSizeMismatch),
            other => Err(FrameError::UnknownStatus(other)),
        }
    }

    /// True if the server accepted the payload.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Status::Ok | Status::Queued)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Queued => write!(f, "QUEUED"),
            Status::ImageSizeMismatch => write!(f, "IMAGE_SIZE_MISMATCH"),
        }
    }
}

/// A request as read by the server.
#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    Payload(Vec<u8>),
    /// Declared length exceeds [`MAX_PAYLOAD`]; the body was not read.
    Oversized(u32),
}

pub fn encode_header(len: usize) -> Result<[u8; HEADER_LEN], FrameError> {
    let len = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge(len))?;
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&MAGIC);
    header[4] = VERSION;
    header[5..].copy_from_slice(&len.to_be_bytes());
    Ok(header)
}

/// Validates a header and returns the declared payload length.
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<u32, FrameError> {
    let magic = [header[0], header[1], header[2], header[3]];
    if magic != MAGIC {
        return Err(FrameError::BadMagic(magic));
    }
    if header[4] != VERSION {
        return Err(FrameError::UnsupportedVersion(header[4]));
    }
    Ok(u32::from_be_bytes([header[5], header[6], header[7], header[8]]))
}

pub async fn write_request<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_header(payload.len())?).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next request. Returns `None` when the peer closed the
/// connection before sending another header.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = decode_header(&header)?;
    if len > MAX_PAYLOAD {
        return Ok(Some(Request::Oversized(len)));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Request::Payload(payload)))
}

pub async fn write_status<W>(writer: &mut W, status: Status) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[status as u8]).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_status<R>(reader: &mut R) -> Result<Status, FrameError>
where
    R: AsyncRead + Unpin,
{
    Status::from_byte(reader.read_u8().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = encode_header(192_000).unwrap();
        assert_eq!(&header[..4], b"EPDF");
        assert_eq!(header[4], 1);
        assert_eq!(&header[5..], &[0x00, 0x02, 0xEE, 0x00]);
        assert_eq!(decode_header(&header).unwrap(), 192_000);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut header = encode_header(4).unwrap();
        header[0] = b'X';
        assert!(matches!(decode_header(&header), Err(FrameError::BadMagic(_))));

        let mut header = encode_header(4).unwrap();
        header[4] = 2;
        assert!(matches!(
            decode_header(&header),
            Err(FrameError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::from_byte(0).unwrap(), Status::Ok);
        assert_eq!(Status::from_byte(1).unwrap(), Status::Queued);
        assert_eq!(Status::from_byte(2).unwrap(), Status::ImageSizeMismatch);
        assert!(Status::from_byte(3).is_err());
        assert!(Status::Queued.is_accepted());
        assert!(!Status::ImageSizeMismatch.is_accepted());
        assert_eq!(Status::ImageSizeMismatch.to_string(), "IMAGE_SIZE_MISMATCH");
    }

    #[tokio::test]
    async fn test_request_over_stream() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let payload = vec![0x11u8; 1000];

        let sent = payload.clone();
        let writer = tokio::spawn(async move {
            write_request(&mut client, &sent).await.unwrap();
            write_request(&mut client, &[]).await.unwrap();
        });

        assert_eq!(
            read_request(&mut server).await.unwrap(),
            Some(Request::Payload(payload))
        );
        assert_eq!(
            read_request(&mut server).await.unwrap(),
            Some(Request::Payload(Vec::new()))
        );
        writer.await.unwrap();
        assert_eq!(read_request(&mut server).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_body_not_read() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut header = encode_header(0).unwrap();
        header[5..].copy_from_slice(&(MAX_PAYLOAD + 1).to_be_bytes());
        client.write_all(&header).await.unwrap();

        assert_eq!(
            read_request(&mut server).await.unwrap(),
            Some(Request::Oversized(MAX_PAYLOAD + 1))
        );
    }

    #[tokio::test]
    async fn test_status_over_stream() {
        let (mut client, mut server) = tokio::io::duplex(8);
        write_status(&mut server, Status::Queued).await.unwrap();
        assert_eq!(read_status(&mut client).await.unwrap(), Status::Queued);
    }
}

//! Bounded request reading.
//!
//! # Responsibilities
//! - Read the raw request bytes within a size limit and a deadline
//! - Keep reading until the header block and any declared body have arrived
//! - Report oversized and stalled requests instead of truncating them

use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Errors raised while reading a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The peer closed the connection without sending anything.
    #[error("connection closed before any request bytes")]
    Empty,

    /// The request is larger than the configured limit.
    #[error("request exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The request did not complete before the read deadline.
    #[error("request not received within {0:?}")]
    Timeout(Duration),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Position of the blank line separating headers from body.
pub fn header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Value of a `Content-Length` header in a header block, if well formed.
pub fn content_length(head: &[u8]) -> Option<usize> {
    head.split(|b| *b == b'\n').find_map(|line| {
        let line = std::str::from_utf8(line).ok()?.trim_end_matches('\r');
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Read one request from `stream`.
///
/// Returns once the headers and `Content-Length` bytes of body are in, or the
/// peer half-closes. Anything beyond `max_bytes` is an error, not a silent
/// truncation.
pub async fn read_request<S>(
    stream: &mut S,
    max_bytes: usize,
    deadline: Duration,
) -> Result<Vec<u8>, RequestError>
where
    S: AsyncRead + Unpin,
{
    tokio::time::timeout(deadline, read_until_complete(stream, max_bytes))
        .await
        .map_err(|_| RequestError::Timeout(deadline))?
}

async fn read_until_complete<S>(stream: &mut S, max_bytes: usize) -> Result<Vec<u8>, RequestError>
where
    S: AsyncRead + Unpin,
{
    let mut raw = Vec::with_capacity(max_bytes.min(8192));
    let mut chunk = [0u8; 2048];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if raw.is_empty() {
                return Err(RequestError::Empty);
            }
            return Ok(raw);
        }

        raw.extend_from_slice(&chunk[..n]);
        if raw.len() > max_bytes {
            return Err(RequestError::TooLarge { limit: max_bytes });
        }

        if let Some(end) = header_end(&raw) {
            let expected = end + 4 + content_length(&raw[..end]).unwrap_or(0);
            if expected > max_bytes {
                return Err(RequestError::TooLarge { limit: max_bytes });
            }
            if raw.len() >= expected {
                return Ok(raw);
            }
        }
    }
}

//! Banner grabbing for freshly opened TCP connections.
//!
//! A banner is whatever the service sends on its own right after the
//! handshake. One bounded read is attempted; nothing is sent to provoke it.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Maximum bytes read from the socket for a banner.
pub const MAX_BANNER_BYTES: usize = 1024;

/// Maximum characters kept after sanitizing.
pub const MAX_BANNER_CHARS: usize = 256;

/// Default timeout for the banner read.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(2);

/// Read an initial banner from a stream.
///
/// Returns `None` when the service stays silent, closes the connection, or
/// errors before `read_timeout` elapses.
pub async fn read_banner<S>(stream: &mut S, read_timeout: Duration) -> Option<String>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = [0u8; MAX_BANNER_BYTES];

    match timeout(read_timeout, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => {
            let banner = sanitize_banner(&buffer[..n]);
            (!banner.is_empty()).then_some(banner)
        }
        _ => None,
    }
}

/// Decode lossily, flatten whitespace and control bytes, and bound the length.
pub fn sanitize_banner(data: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(data);

    let mut result = String::new();
    let mut prev_space = false;
    for c in decoded.chars().take(MAX_BANNER_CHARS) {
        let c = match c {
            '\r' | '\n' | '\t' | ' ' => ' ',
            c if c.is_control() => '.',
            c => c,
        };
        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}

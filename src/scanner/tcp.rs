//! TCP connect prober.
//!
//! Uses the operating system's socket API to complete the full handshake.
//! No elevated privileges required.

use crate::banner::{read_banner, DEFAULT_BANNER_TIMEOUT};
use crate::error::ConnectionFailure;
use crate::scanner::traits::{ProbeResult, Prober};
use crate::types::{Port, Target};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Open a TCP connection within `limit`.
pub async fn connect(addr: SocketAddr, limit: Duration) -> Result<TcpStream, ConnectionFailure> {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ConnectionFailure::from_io(&e)),
        Err(_) => Err(ConnectionFailure::Timeout),
    }
}

/// TCP connect prober with optional banner capture.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
    grab_banner: bool,
    banner_timeout: Duration,
}

impl TcpProber {
    /// Create a prober.
    ///
    /// # Arguments
    /// * `timeout` - Connection timeout per port
    /// * `grab_banner` - Whether to read a banner from open ports
    pub fn new(timeout: Duration, grab_banner: bool) -> Self {
        Self {
            timeout,
            grab_banner,
            banner_timeout: DEFAULT_BANNER_TIMEOUT,
        }
    }

    /// Override the secondary timeout used for the banner read.
    pub fn with_banner_timeout(mut self, banner_timeout: Duration) -> Self {
        self.banner_timeout = banner_timeout;
        self
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &Target, port: Port) -> ProbeResult {
        let addr = SocketAddr::new(target.ip, port.as_u16());
        let start = Instant::now();

        match connect(addr, self.timeout).await {
            Ok(mut stream) => {
                let response_time = start.elapsed().as_millis() as u64;
                let banner = if self.grab_banner {
                    read_banner(&mut stream, self.banner_timeout).await
                } else {
                    None
                };
                ProbeResult::open(target.clone(), port, banner).with_response_time(response_time)
            }
            Err(failure) => {
                trace!(%addr, %failure, "port closed");
                ProbeResult::closed(target.clone(), port)
            }
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

//! TCP link to a rigctld daemon
//!
//! Owns the socket halves for one established connection. Dropping the link
//! closes the socket.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// An established connection to a daemon
#[derive(Debug)]
pub(crate) struct RigLink {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    addr: String,
}

impl RigLink {
    /// Connect to `host:port`, failing after `timeout`
    pub(crate) async fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let addr = format!("{}:{}", host, port);
        debug!("Connecting to rigctld at {}", addr);

        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {}ms", timeout.as_millis()),
                )
            })??;

        // Commands are tiny and latency-sensitive
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on {}: {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader,
            writer,
            addr,
        })
    }

    /// Address this link is connected to
    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }

    /// Write a full command to the daemon
    pub(crate) async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await
    }

    /// Read whatever bytes are available; 0 means the daemon closed
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }
}

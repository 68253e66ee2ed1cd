//! Virtual rigctld daemon
//!
//! Serves a [`VirtualRig`] over loopback TCP. Each accepted connection runs
//! its own task with a select! loop that reads command lines, answers them
//! from the shared rig, and stops when told to drop connections or shut
//! down.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::rig::{VirtualRig, VirtualRigConfig};

/// Options for a virtual daemon
#[derive(Debug, Clone, Default)]
pub struct RigServerConfig {
    /// Rig served by the daemon
    pub rig: VirtualRigConfig,
    /// Write responses in chunks of this many bytes, one segment each
    pub chunk_size: Option<usize>,
    /// Delay before each response is written
    pub response_delay: Option<Duration>,
}

/// Signals broadcast to connection tasks
#[derive(Debug, Clone, Copy)]
enum ConnectionSignal {
    Drop,
}

/// A running virtual daemon bound to a loopback port
#[derive(Debug)]
pub struct RigServer {
    addr: SocketAddr,
    rig: Arc<Mutex<VirtualRig>>,
    accepted: Arc<AtomicUsize>,
    signal_tx: broadcast::Sender<ConnectionSignal>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RigServer {
    /// Start a daemon with default options on an ephemeral port
    pub async fn start() -> io::Result<Self> {
        Self::with_config(RigServerConfig::default()).await
    }

    /// Start a daemon on an ephemeral port
    pub async fn with_config(config: RigServerConfig) -> io::Result<Self> {
        Self::bind("127.0.0.1:0", config).await
    }

    /// Start a daemon on a specific address
    pub async fn bind(addr: &str, config: RigServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("Virtual rigctld listening on {}", addr);

        let rig = Arc::new(Mutex::new(VirtualRig::from_config(config.rig.clone())));
        let accepted = Arc::new(AtomicUsize::new(0));
        let (signal_tx, _) = broadcast::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_accept_loop(
            listener,
            rig.clone(),
            accepted.clone(),
            signal_tx.clone(),
            shutdown_rx,
            config,
        ));

        Ok(Self {
            addr,
            rig,
            accepted,
            signal_tx,
            shutdown_tx,
            task,
        })
    }

    /// Address the daemon listens on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the daemon listens on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Shared rig state
    pub fn rig(&self) -> Arc<Mutex<VirtualRig>> {
        self.rig.clone()
    }

    /// Number of connections accepted so far
    pub fn connections_accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Close every open connection but keep listening
    pub fn drop_connections(&self) {
        debug!("Dropping connections on {}", self.addr);
        let _ = self.signal_tx.send(ConnectionSignal::Drop);
    }

    /// Stop listening and close every connection
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
        info!("Virtual rigctld on {} stopped", self.addr);
    }
}

async fn run_accept_loop(
    listener: TcpListener,
    rig: Arc<Mutex<VirtualRig>>,
    accepted: Arc<AtomicUsize>,
    signal_tx: broadcast::Sender<ConnectionSignal>,
    mut shutdown_rx: watch::Receiver<bool>,
    config: RigServerConfig,
) {
    let mut connections = Vec::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        accepted.fetch_add(1, Ordering::SeqCst);
                        debug!("Virtual rigctld accepted {}", peer);
                        connections.push(tokio::spawn(serve_connection(
                            stream,
                            rig.clone(),
                            signal_tx.subscribe(),
                            config.clone(),
                        )));
                    }
                    Err(e) => warn!("Virtual rigctld accept error: {}", e),
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }

    drop(listener);
    for connection in connections {
        connection.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    rig: Arc<Mutex<VirtualRig>>,
    mut signal_rx: broadcast::Receiver<ConnectionSignal>,
    config: RigServerConfig,
) {
    let mut buf = [0u8; 1024];
    let mut pending = Vec::new();

    loop {
        tokio::select! {
            result = stream.read(&mut buf) => {
                let n = match result {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        debug!("Virtual rigctld read error: {}", e);
                        break;
                    }
                };
                pending.extend_from_slice(&buf[..n]);

                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    if line.trim().is_empty() {
                        continue;
                    }

                    let response = rig.lock().await.handle_line(&line);
                    if let Err(e) = write_response(&mut stream, response.as_bytes(), &config).await {
                        debug!("Virtual rigctld write error: {}", e);
                        return;
                    }
                }
            }
            signal = signal_rx.recv() => {
                match signal {
                    Ok(ConnectionSignal::Drop) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => break,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn write_response(
    stream: &mut TcpStream,
    data: &[u8],
    config: &RigServerConfig,
) -> io::Result<()> {
    if let Some(delay) = config.response_delay {
        tokio::time::sleep(delay).await;
    }

    match config.chunk_size {
        Some(size) if size > 0 => {
            for chunk in data.chunks(size) {
                stream.write_all(chunk).await?;
                stream.flush().await?;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            Ok(())
        }
        _ => {
            stream.write_all(data).await?;
            stream.flush().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn test_serves_lines_in_order() {
        let server = RigServer::start().await.unwrap();
        let stream = TcpStream::connect(server.addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(b"F 3573000\nf\nm\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "RPRT 0");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "3573000");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "USB");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "2400");

        assert_eq!(server.rig().lock().await.frequency_hz(), 3_573_000);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_connections_keeps_listening() {
        let server = RigServer::start().await.unwrap();
        let mut first = TcpStream::connect(server.addr()).await.unwrap();

        // Let the accept loop register the connection
        first.write_all(b"f\n").await.unwrap();
        let mut buf = [0u8; 64];
        let n = first.read(&mut buf).await.unwrap();
        assert!(n > 0);

        server.drop_connections();
        let n = first.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);

        let _second = TcpStream::connect(server.addr()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(server.connections_accepted(), 2);
        server.shutdown().await;
    }
}

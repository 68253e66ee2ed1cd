//! Pass-through proxy listener and pair relay
//!
//! The accept task owns the listening socket. Every accepted local
//! connection gets its own task that opens a fresh connection to the remote
//! daemon and copies bytes both ways until either side closes. Pairs share
//! nothing but the shutdown signal and the active pair counter.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::ProxyError;

/// Default rigctld port on the remote side
pub const DEFAULT_REMOTE_PORT: u16 = 4532;

/// Default local port the proxy tries first
pub const DEFAULT_LOCAL_PORT: u16 = 4533;

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Remote daemon host
    pub remote_host: String,
    /// Remote daemon port
    pub remote_port: u16,
    /// Local port to try first; taken ports are skipped upward
    pub preferred_local_port: u16,
    /// Local address to listen on
    pub bind_addr: IpAddr,
    /// Number of consecutive ports to try before giving up
    pub max_bind_attempts: u16,
    /// Timeout for the outbound connection of each pair
    pub connect_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            remote_host: "localhost".to_string(),
            remote_port: DEFAULT_REMOTE_PORT,
            preferred_local_port: DEFAULT_LOCAL_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            max_bind_attempts: 16,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// A running pass-through proxy
///
/// Dropping the proxy tears down the listener and every pair, like
/// [`shutdown`](PassthroughProxy::shutdown).
#[derive(Debug)]
pub struct PassthroughProxy {
    local_addr: SocketAddr,
    active: Arc<AtomicUsize>,
    /// Closes the listener
    stop_tx: watch::Sender<bool>,
    /// Tears down established pairs
    kill_tx: watch::Sender<bool>,
    accept_task: Option<JoinHandle<()>>,
}

impl PassthroughProxy {
    /// Bind the local listener and start accepting connections
    pub async fn start(config: ProxyConfig) -> Result<Self, ProxyError> {
        let listener = bind_with_fallback(&config).await?;
        let local_addr = listener.local_addr()?;
        let remote = format!("{}:{}", config.remote_host, config.remote_port);
        info!("Proxy listening on {} for {}", local_addr, remote);

        let active = Arc::new(AtomicUsize::new(0));
        let (stop_tx, stop_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = watch::channel(false);

        let accept_task = tokio::spawn(run_accept_loop(
            listener,
            config,
            active.clone(),
            stop_rx,
            kill_rx,
        ));

        Ok(Self {
            local_addr,
            active,
            stop_tx,
            kill_tx,
            accept_task: Some(accept_task),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Port the listener is bound to
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Number of pairs currently relaying
    pub fn active_pairs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns whether the listener is still accepting
    pub fn is_listening(&self) -> bool {
        self.accept_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Close the listener; established pairs keep relaying until they end
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.accept_task.take() {
            let _ = task.await;
            info!("Proxy on {} stopped listening", self.local_addr);
        }
    }

    /// Close the listener and tear down every pair
    pub async fn shutdown(mut self) {
        let _ = self.kill_tx.send(true);
        self.stop().await;
    }
}

impl Drop for PassthroughProxy {
    fn drop(&mut self) {
        let _ = self.kill_tx.send(true);
        let _ = self.stop_tx.send(true);
    }
}

/// Bind on the preferred port, moving up one port per conflict
async fn bind_with_fallback(config: &ProxyConfig) -> Result<TcpListener, ProxyError> {
    let first = config.preferred_local_port;
    let mut port = first;
    let mut last = first;

    for _ in 0..config.max_bind_attempts.max(1) {
        last = port;
        match TcpListener::bind((config.bind_addr, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => match port.checked_add(1) {
                Some(next) => {
                    warn!("Port {} is in use, trying {}", port, next);
                    port = next;
                }
                None => {
                    warn!("Port {} is in use and no higher port exists", port);
                    break;
                }
            },
            Err(e) => {
                error!("Failed to bind {}:{}: {}", config.bind_addr, port, e);
                return Err(ProxyError::Bind(e));
            }
        }
    }

    error!("No free port in {}..={}", first, last);
    Err(ProxyError::BindExhausted { first, last })
}

/// Decrements the active pair count when a pair task ends
struct PairGuard(Arc<AtomicUsize>);

impl Drop for PairGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn run_accept_loop(
    listener: TcpListener,
    config: ProxyConfig,
    active: Arc<AtomicUsize>,
    mut stop_rx: watch::Receiver<bool>,
    kill_rx: watch::Receiver<bool>,
) {
    let mut pair_count = 0u64;

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((socket, peer)) => {
                        pair_count += 1;
                        let pair_id = pair_count;
                        info!("[Pair {}] New connection from {}", pair_id, peer);

                        active.fetch_add(1, Ordering::SeqCst);
                        let guard = PairGuard(active.clone());
                        let config = config.clone();
                        let kill_rx = kill_rx.clone();

                        tokio::spawn(async move {
                            let _guard = guard;
                            if let Err(e) = run_pair(socket, &config, kill_rx).await {
                                warn!("[Pair {}] Relay error: {}", pair_id, e);
                            }
                            info!("[Pair {}] Connection closed", pair_id);
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = stop_rx.changed() => break,
        }
    }

    debug!("Proxy accept loop ended");
}

/// Relay one local connection to a fresh remote connection
async fn run_pair(
    mut local: TcpStream,
    config: &ProxyConfig,
    mut kill_rx: watch::Receiver<bool>,
) -> io::Result<()> {
    let target = (config.remote_host.as_str(), config.remote_port);
    let mut remote = tokio::time::timeout(config.connect_timeout, TcpStream::connect(target))
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "connect to {}:{} timed out",
                    config.remote_host, config.remote_port
                ),
            )
        })??;

    // Disable Nagle's algorithm for lower latency
    local.set_nodelay(true)?;
    remote.set_nodelay(true)?;

    let (mut local_read, mut local_write) = local.split();
    let (mut remote_read, mut remote_write) = remote.split();

    // Whichever side finishes first ends the pair; dropping both streams
    // closes the other side
    tokio::select! {
        result = tokio::io::copy(&mut local_read, &mut remote_write) => {
            let bytes = result?;
            debug!("Local side closed after {} bytes", bytes);
        }
        result = tokio::io::copy(&mut remote_read, &mut local_write) => {
            let bytes = result?;
            debug!("Remote side closed after {} bytes", bytes);
        }
        _ = kill_rx.changed() => {
            debug!("Pair torn down by proxy shutdown");
        }
    }

    Ok(())
}

//! rigctld Pass-through Proxy
//!
//! Listens on a local port and tunnels every local connection to a remote
//! `rigctld` daemon over its own outbound connection. Bytes are relayed
//! unmodified in both directions, so any local tool that speaks the rigctld
//! protocol can drive the remote radio.
//!
//! The proxy is independent of protocol clients: it never looks
//! at the traffic and shares no connection with them.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_proxy::{PassthroughProxy, ProxyConfig};
//!
//! # async fn example() -> Result<(), rig_proxy::ProxyError> {
//! let proxy = PassthroughProxy::start(ProxyConfig {
//!     remote_host: "shack-pi.local".into(),
//!     ..Default::default()
//! })
//! .await?;
//! println!("Point local tools at port {}", proxy.local_port());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod proxy;

pub use error::ProxyError;
pub use proxy::{PassthroughProxy, ProxyConfig, DEFAULT_LOCAL_PORT, DEFAULT_REMOTE_PORT};

//! rigctld Client
//!
//! This crate provides an async client for the Hamlib `rigctld` network
//! daemon. A single background task owns the TCP connection and serializes
//! commands onto it, so any number of callers can share one connection
//! through cloned [`RigClient`] handles.
//!
//! # Architecture
//!
//! - Commands are queued FIFO and sent one at a time; each response is
//!   matched to the oldest outstanding command.
//! - Status transitions and response text are published as [`ClientEvent`]s
//!   on a broadcast channel.
//! - An unexpected connection loss triggers a bounded number of reconnect
//!   attempts with a fixed delay. A deliberate disconnect never retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_client::{ClientConfig, RigClient};
//!
//! # async fn example() -> Result<(), rig_client::ClientError> {
//! let client = RigClient::spawn(ClientConfig::default());
//! client.connect("localhost", 4532).await?;
//!
//! let hz = client.get_frequency().await?;
//! println!("VFO at {} Hz", hz);
//! # Ok(())
//! # }
//! ```

mod actor;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
mod link;

pub use client::RigClient;
pub use config::{ClientConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};
pub use error::ClientError;
pub use events::{ClientEvent, ConnectionStatus, StatusUpdate};

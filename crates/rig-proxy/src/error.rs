//! Error types for the pass-through proxy

use std::io;

use thiserror::Error;

/// Errors that can occur while starting the proxy
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Every port in the fallback range was taken
    #[error("no free local port in {first}..={last}")]
    BindExhausted {
        /// Preferred port
        first: u16,
        /// Last port tried
        last: u16,
    },

    /// Binding failed for a reason other than the port being taken
    #[error("failed to bind local listener: {0}")]
    Bind(#[from] io::Error),
}

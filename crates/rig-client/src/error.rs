//! Error types for the rig client

use std::io;

use rig_protocol::{ParseError, ProtocolError};
use thiserror::Error;

/// Errors that can occur while talking to a rigctld daemon
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket-level connect error (refused, unreachable, timed out)
    #[error("connection to {addr} failed: {source}")]
    ConnectionFailed {
        /// Address the client tried to reach
        addr: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The daemon answered with a negative `RPRT` code
    #[error("command failed with code {code}")]
    CommandFailed {
        /// Magnitude of the `RPRT` code
        code: i32,
    },

    /// Command cancelled because the client was told to disconnect
    #[error("disconnected")]
    Disconnected,

    /// The connection dropped while this command awaited its response
    #[error("connection lost while awaiting response")]
    ConnectionLost,

    /// No response arrived within the configured timeout
    #[error("no response after {0}ms")]
    ResponseTimeout(u64),

    /// Response could not be parsed into the expected value
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] ParseError),

    /// A typed operation failed; `context` names the operation
    #[error("{context}: {source}")]
    Operation {
        /// Operation description, e.g. `Failed to get frequency`
        context: String,
        /// The error the operation hit
        #[source]
        source: Box<ClientError>,
    },

    /// The client task has shut down
    #[error("client task has shut down")]
    ClientClosed,
}

impl ClientError {
    /// Wrap this error with an operation description
    pub(crate) fn context(self, context: impl Into<String>) -> Self {
        ClientError::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through operation context
    pub fn root(&self) -> &ClientError {
        match self {
            ClientError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// The `RPRT` code if the daemon rejected the command
    pub fn code(&self) -> Option<i32> {
        match self.root() {
            ClientError::CommandFailed { code } => Some(*code),
            _ => None,
        }
    }

    /// Returns whether the command was cancelled by a deliberate disconnect
    pub fn is_disconnected(&self) -> bool {
        matches!(self.root(), ClientError::Disconnected)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::CommandFailed { code } => ClientError::CommandFailed { code },
            ProtocolError::Parse(e) => ClientError::InvalidResponse(e),
        }
    }
}

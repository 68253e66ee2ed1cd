//! rigctld Protocol Library
//!
//! This crate provides encoding, framing and parsing for the line-based text
//! protocol spoken by Hamlib's `rigctld` network daemon.
//!
//! # Architecture
//!
//! The protocol has no request identifiers: a response can only be matched to
//! the command that produced it by strict ordering. This crate therefore
//! provides three pieces that the connection layer composes:
//!
//! - [`RigCommand`] encodes a typed command into its wire text and reports the
//!   [`ResponseShape`] the daemon will answer with
//! - [`RigctlCodec`] buffers raw bytes from the socket and yields a complete
//!   response once the shape's completion predicate is met, regardless of how
//!   TCP segmented the data
//! - [`classify_reply`] turns a completed response into either its text or a
//!   [`ProtocolError::CommandFailed`] for negative `RPRT` reports
//!
//! # Example
//!
//! ```rust
//! use rig_protocol::{classify_reply, parse_mode, RigCommand, RigctlCodec};
//!
//! let cmd = RigCommand::GetMode;
//! assert_eq!(cmd.encode(), "m\n");
//!
//! let mut codec = RigctlCodec::new();
//! codec.push_bytes(b"USB\n");
//! assert!(codec.next_response(cmd.response_shape()).is_none());
//! codec.push_bytes(b"2400\n");
//!
//! let lines = codec.next_response(cmd.response_shape()).unwrap();
//! let text = classify_reply(&lines).unwrap();
//! let info = parse_mode(&text).unwrap();
//! assert_eq!(info.passband_hz, 2400);
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod info;
pub mod mode;
pub mod reply;

pub use codec::RigctlCodec;
pub use command::{function, level, ResponseShape, RigCommand};
pub use error::{ParseError, ProtocolError};
pub use info::{ModeInfo, RadioSnapshot, RigInfo};
pub use mode::Mode;
pub use reply::{
    classify_reply, parse_bool, parse_frequency, parse_level, parse_mode, parse_report,
};

/// Default TCP port `rigctld` listens on
pub const DEFAULT_RIGCTLD_PORT: u16 = 4532;

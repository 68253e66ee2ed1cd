//! rigctld Simulation Library
//!
//! This crate provides a simulation layer for testing rigctld clients and
//! proxies without a physical radio or a running Hamlib daemon. It includes:
//!
//! - **VirtualRig**: Answers rigctld command lines from in-memory rig state
//! - **RigServer**: Serves a virtual rig over loopback TCP
//!
//! # Example
//!
//! ```rust
//! use rig_sim::VirtualRig;
//!
//! let mut rig = VirtualRig::default();
//! assert_eq!(rig.handle_line("F 7074000"), "RPRT 0\n");
//! assert_eq!(rig.handle_line("f"), "7074000\n");
//! ```

pub mod rig;
pub mod server;

pub use rig::{VirtualRig, VirtualRigConfig};
pub use server::{RigServer, RigServerConfig};

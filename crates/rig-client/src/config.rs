//! Client configuration

use std::time::Duration;

/// Default maximum number of reconnect attempts
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay between reconnect attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Construction-time configuration for a [`RigClient`](crate::RigClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retries after an unexpected connection loss before giving up
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each retry
    pub reconnect_delay: Duration,
    /// Maximum time a single connect attempt may take
    pub connect_timeout: Duration,
    /// Maximum time to wait for a response once a command is on the wire
    ///
    /// Expiry tears the connection down, since any late bytes would be
    /// attributed to the next command.
    pub response_timeout: Duration,
    /// Quiet period that ends an open-ended response (state dumps)
    pub open_response_quiet: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
    /// Capacity of the request channel into the client task
    pub request_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            open_response_quiet: Duration::from_millis(250),
            event_capacity: 256,
            request_capacity: 64,
        }
    }
}

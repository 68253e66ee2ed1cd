//! Rig Client Actor
//!
//! This module provides the async task that owns the connection to a rigctld
//! daemon. All socket I/O, queueing and reconnection happen in this task;
//! [`RigClient`](crate::RigClient) handles talk to it through a request
//! channel and receive replies on oneshot channels.
//!
//! # Ordering
//!
//! The protocol has no request identifiers, so the actor keeps exactly one
//! command on the wire at a time. Commands that arrive while one is in flight,
//! or while there is no connection, wait in a FIFO queue and are sent in
//! arrival order once the slot frees up.
//!
//! # Reconnection
//!
//! ```text
//! Disconnected --connect--> Connecting --ok--> Connected
//!                               |                  |
//!                             fail             socket closed
//!                               v                  v
//!                             Error           Reconnecting --delay--> Connecting
//!                                                  |
//!                                          attempts exhausted
//!                                                  v
//!                                               Failed
//! ```
//!
//! A deliberate disconnect clears any scheduled retry and never enters
//! `Reconnecting`. Retry connects run as a branch of the actor loop, so a
//! disconnect also abandons an attempt that is still waiting on the network.

use std::collections::VecDeque;
use std::future::{pending, Future};
use std::io;
use std::pin::Pin;

use rig_protocol::{classify_reply, ResponseShape, RigctlCodec};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, ConnectionStatus, StatusUpdate};
use crate::link::RigLink;

const READ_BUFFER_LEN: usize = 4096;

/// Reply channel for a request
pub(crate) type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

/// A retry connect in progress
type PendingConnect = Pin<Box<dyn Future<Output = io::Result<RigLink>> + Send>>;

/// Requests sent to the client actor
#[derive(Debug)]
pub(crate) enum ClientRequest {
    /// Open a connection, replacing any existing one
    Connect {
        host: String,
        port: u16,
        response: Reply<()>,
    },

    /// Close the connection and cancel everything waiting on it
    Disconnect { response: oneshot::Sender<()> },

    /// Queue a command for transmission
    Command {
        text: String,
        shape: ResponseShape,
        response: Reply<String>,
    },

    /// Stop the actor
    Shutdown,
}

/// A command waiting for the wire
#[derive(Debug)]
struct PendingCommand {
    text: String,
    shape: ResponseShape,
    response: Reply<String>,
}

/// The command currently on the wire
#[derive(Debug)]
struct InFlight {
    command: PendingCommand,
    /// Response timeout
    expires_at: Instant,
    /// Quiet-period end for open-ended responses that have started arriving
    quiet_at: Option<Instant>,
}

/// Internal state for the client actor
struct ClientActorState {
    config: ClientConfig,
    events: broadcast::Sender<ClientEvent>,
    status_tx: watch::Sender<StatusUpdate>,
    status: ConnectionStatus,
    /// Last host/port passed to connect, reused by reconnect attempts
    target: Option<(String, u16)>,
    link: Option<RigLink>,
    codec: RigctlCodec,
    queue: VecDeque<PendingCommand>,
    in_flight: Option<InFlight>,
    reconnect_at: Option<Instant>,
    /// Retry connect started when `reconnect_at` fired
    connecting: Option<PendingConnect>,
    attempts: u32,
}

impl ClientActorState {
    fn new(
        config: ClientConfig,
        events: broadcast::Sender<ClientEvent>,
        status_tx: watch::Sender<StatusUpdate>,
    ) -> Self {
        Self {
            config,
            events,
            status_tx,
            status: ConnectionStatus::Disconnected,
            target: None,
            link: None,
            codec: RigctlCodec::new(),
            queue: VecDeque::new(),
            in_flight: None,
            reconnect_at: None,
            connecting: None,
            attempts: 0,
        }
    }

    fn set_status(&mut self, update: StatusUpdate) {
        info!("Rig client {}: {}", update.status, update.message);
        self.status = update.status;
        self.status_tx.send_replace(update.clone());
        let _ = self.events.send(ClientEvent::Status(update));
    }

    async fn handle_request(&mut self, request: ClientRequest) {
        match request {
            ClientRequest::Connect {
                host,
                port,
                response,
            } => {
                self.reconnect_at = None;
                self.connecting = None;
                self.attempts = 0;
                if let Some(link) = self.link.take() {
                    info!("Replacing connection to {}", link.addr());
                    self.codec.clear();
                    self.fail_in_flight(ClientError::Disconnected);
                }

                self.target = Some((host.clone(), port));
                let result = self.open_link(&host, port).await;
                let connected = result.is_ok();
                let _ = response.send(result);

                if connected {
                    self.pump().await;
                }
            }

            ClientRequest::Disconnect { response } => {
                self.reconnect_at = None;
                if self.connecting.take().is_some() {
                    debug!("Abandoning reconnect attempt {}", self.attempts);
                }
                self.attempts = 0;
                if let Some(link) = self.link.take() {
                    info!("Disconnecting from {}", link.addr());
                }
                self.codec.clear();
                self.fail_in_flight(ClientError::Disconnected);
                self.fail_queued(|| ClientError::Disconnected);

                if self.status != ConnectionStatus::Disconnected {
                    self.set_status(StatusUpdate::new(
                        ConnectionStatus::Disconnected,
                        "Disconnected from server",
                    ));
                }
                let _ = response.send(());
            }

            ClientRequest::Command {
                text,
                shape,
                response,
            } => {
                if response.is_closed() {
                    return;
                }
                self.queue.push_back(PendingCommand {
                    text,
                    shape,
                    response,
                });

                if self.link.is_some() {
                    self.pump().await;
                } else {
                    debug!(
                        "Not connected; {} command(s) waiting",
                        self.queue.len()
                    );
                }
            }

            // Handled by the run loop
            ClientRequest::Shutdown => {}
        }
    }

    /// Connect and report the outcome through status
    async fn open_link(&mut self, host: &str, port: u16) -> Result<(), ClientError> {
        let addr = self.announce_connecting(host, port);
        let result = RigLink::connect(host, port, self.config.connect_timeout).await;
        self.link_opened(result)
            .map_err(|source| ClientError::ConnectionFailed { addr, source })
    }

    fn announce_connecting(&mut self, host: &str, port: u16) -> String {
        let addr = format!("{}:{}", host, port);
        self.set_status(StatusUpdate::new(
            ConnectionStatus::Connecting,
            format!("Connecting to {}...", addr),
        ));
        addr
    }

    /// Install a freshly connected link, or report why there is none
    fn link_opened(&mut self, result: io::Result<RigLink>) -> io::Result<()> {
        match result {
            Ok(link) => {
                let message = format!("Connected to {}", link.addr());
                self.link = Some(link);
                self.codec.clear();
                self.attempts = 0;
                self.set_status(StatusUpdate::new(ConnectionStatus::Connected, message));
                Ok(())
            }
            Err(e) => {
                self.set_status(StatusUpdate::new(
                    ConnectionStatus::Error,
                    format!("Connection error: {}", e),
                ));
                Err(e)
            }
        }
    }

    /// Send queued commands until one is in flight or the queue is empty
    async fn pump(&mut self) {
        while self.in_flight.is_none() {
            let Some(link) = self.link.as_mut() else {
                return;
            };
            let Some(command) = self.queue.pop_front() else {
                return;
            };

            // Caller stopped waiting; nothing would read the answer
            if command.response.is_closed() {
                debug!("Dropping abandoned command {:?}", command.text.trim_end());
                continue;
            }

            let mut line = command.text.clone();
            if !line.ends_with('\n') {
                line.push('\n');
            }
            debug!("Sending {:?} to {}", line.trim_end(), link.addr());

            match link.write(line.as_bytes()).await {
                Ok(()) => {
                    self.in_flight = Some(InFlight {
                        command,
                        expires_at: Instant::now() + self.config.response_timeout,
                        quiet_at: None,
                    });
                }
                Err(e) => {
                    let _ = command.response.send(Err(ClientError::ConnectionLost));
                    self.connection_lost(&format!("write error: {}", e));
                    return;
                }
            }
        }
    }

    async fn handle_read(&mut self, result: io::Result<usize>, data: &[u8]) {
        match result {
            Ok(0) => self.connection_lost("closed by server"),
            Ok(n) => {
                debug!("Read {} bytes: {:?}", n, String::from_utf8_lossy(&data[..n]));
                self.codec.push_bytes(&data[..n]);
                self.drain_responses().await;
            }
            Err(e) => self.connection_lost(&format!("read error: {}", e)),
        }
    }

    /// Resolve every response the buffered bytes complete
    async fn drain_responses(&mut self) {
        loop {
            let Some(in_flight) = self.in_flight.as_mut() else {
                if self.codec.has_pending() {
                    debug!("Discarding data received with no command in flight");
                    self.codec.clear();
                }
                return;
            };

            match self.codec.next_response(in_flight.command.shape) {
                Some(lines) => {
                    self.complete(lines);
                    self.pump().await;
                }
                None => {
                    if in_flight.command.shape == ResponseShape::Open && self.codec.has_pending() {
                        in_flight.quiet_at = Some(Instant::now() + self.config.open_response_quiet);
                    }
                    return;
                }
            }
        }
    }

    /// Hand a completed response to the command in flight
    fn complete(&mut self, lines: Vec<String>) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        let text = lines
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n");
        debug!(
            "Response to {:?}: {:?}",
            in_flight.command.text.trim_end(),
            text
        );
        let _ = self.events.send(ClientEvent::Data(text));

        let result = classify_reply(&lines).map_err(ClientError::from);
        let _ = in_flight.command.response.send(result);
    }

    fn in_flight_deadline(&self) -> Option<Instant> {
        self.in_flight.as_ref().map(|f| match f.quiet_at {
            Some(quiet_at) => quiet_at.min(f.expires_at),
            None => f.expires_at,
        })
    }

    async fn handle_deadline(&mut self) {
        let now = Instant::now();
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };

        if in_flight.quiet_at.is_some_and(|at| at <= now) {
            in_flight.quiet_at = None;
            if let Some(lines) = self.codec.take_partial() {
                self.complete(lines);
                self.pump().await;
            }
            return;
        }

        if in_flight.expires_at <= now {
            let ms = self.config.response_timeout.as_millis() as u64;
            warn!(
                "No response to {:?} after {}ms",
                in_flight.command.text.trim_end(),
                ms
            );
            self.fail_in_flight(ClientError::ResponseTimeout(ms));
            self.connection_lost("response timeout");
        }
    }

    /// Drop the socket after an unexpected loss and schedule a retry
    fn connection_lost(&mut self, reason: &str) {
        match self.link.take() {
            Some(link) => warn!("Connection to {} lost: {}", link.addr(), reason),
            None => warn!("Connection lost: {}", reason),
        }
        self.codec.clear();
        self.fail_in_flight(ClientError::ConnectionLost);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let max = self.config.max_reconnect_attempts;
        if self.attempts >= max {
            self.set_status(StatusUpdate::new(
                ConnectionStatus::Failed,
                format!("Giving up after {} reconnect attempts", max),
            ));
            self.fail_queued(|| ClientError::Disconnected);
            return;
        }

        self.attempts += 1;
        self.set_status(StatusUpdate::reconnecting(self.attempts, max));
        self.reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
    }

    /// Start the retry connect; the run loop drives it to completion
    fn begin_reconnect(&mut self) {
        self.reconnect_at = None;
        let Some((host, port)) = self.target.clone() else {
            return;
        };

        self.announce_connecting(&host, port);
        let timeout = self.config.connect_timeout;
        self.connecting = Some(Box::pin(async move {
            RigLink::connect(&host, port, timeout).await
        }));
    }

    async fn finish_reconnect(&mut self, result: io::Result<RigLink>) {
        self.connecting = None;
        match self.link_opened(result) {
            Ok(()) => self.pump().await,
            Err(e) => {
                debug!("Reconnect attempt {} failed: {}", self.attempts, e);
                self.schedule_reconnect();
            }
        }
    }

    fn fail_in_flight(&mut self, error: ClientError) {
        if let Some(in_flight) = self.in_flight.take() {
            let _ = in_flight.command.response.send(Err(error));
        }
    }

    fn fail_queued(&mut self, error: impl Fn() -> ClientError) {
        if !self.queue.is_empty() {
            debug!("Cancelling {} queued command(s)", self.queue.len());
        }
        for command in self.queue.drain(..) {
            let _ = command.response.send(Err(error()));
        }
    }

    fn shutdown(&mut self) {
        self.reconnect_at = None;
        self.connecting = None;
        self.link = None;
        self.fail_in_flight(ClientError::ClientClosed);
        self.fail_queued(|| ClientError::ClientClosed);
        if self.status != ConnectionStatus::Disconnected {
            self.set_status(StatusUpdate::new(
                ConnectionStatus::Disconnected,
                "Client shut down",
            ));
        }
    }
}

async fn read_link(link: &mut Option<RigLink>, buf: &mut [u8]) -> io::Result<usize> {
    match link {
        Some(link) => link.read(buf).await,
        None => pending().await,
    }
}

async fn wait_connect(connecting: &mut Option<PendingConnect>) -> io::Result<RigLink> {
    match connecting {
        Some(connect) => connect.as_mut().await,
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

/// Run the client actor until shutdown or until every handle is dropped
pub(crate) async fn run_client_actor(
    config: ClientConfig,
    mut requests: mpsc::Receiver<ClientRequest>,
    events: broadcast::Sender<ClientEvent>,
    status_tx: watch::Sender<StatusUpdate>,
) {
    let mut state = ClientActorState::new(config, events, status_tx);
    let mut buf = [0u8; READ_BUFFER_LEN];
    info!("Rig client actor started");

    loop {
        let reconnect_at = state.reconnect_at;
        let in_flight_deadline = state.in_flight_deadline();

        tokio::select! {
            request = requests.recv() => {
                match request {
                    Some(ClientRequest::Shutdown) | None => break,
                    Some(request) => state.handle_request(request).await,
                }
            }

            result = read_link(&mut state.link, &mut buf) => {
                state.handle_read(result, &buf).await;
            }

            _ = wait_until(reconnect_at) => {
                state.begin_reconnect();
            }

            result = wait_connect(&mut state.connecting) => {
                state.finish_reconnect(result).await;
            }

            _ = wait_until(in_flight_deadline) => {
                state.handle_deadline().await;
            }
        }
    }

    state.shutdown();
    info!("Rig client actor ended");
}

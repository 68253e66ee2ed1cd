//! Client handle and typed operations

use std::collections::BTreeMap;

use rig_protocol::{
    level, parse_bool, parse_frequency, parse_level, parse_mode, Mode, ModeInfo, ParseError,
    RadioSnapshot, ResponseShape, RigCommand, RigInfo,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::debug;

use crate::actor::{run_client_actor, ClientRequest};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, StatusUpdate};

/// Levels read best-effort during a snapshot refresh
const OPTIONAL_LEVELS: [&str; 3] = [level::RF_GAIN, level::SQUELCH, level::RF_POWER];

/// Handle to a rigctld client task
///
/// Cloning the handle is cheap; all clones talk to the same connection. The
/// task ends when [`shutdown`](RigClient::shutdown) is called or the last
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct RigClient {
    requests: mpsc::Sender<ClientRequest>,
    events: broadcast::Sender<ClientEvent>,
    status: watch::Receiver<StatusUpdate>,
}

impl RigClient {
    /// Spawn the client task on the current tokio runtime
    pub fn spawn(config: ClientConfig) -> Self {
        let (requests, request_rx) = mpsc::channel(config.request_capacity);
        let (events, _) = broadcast::channel(config.event_capacity);
        let (status_tx, status) = watch::channel(StatusUpdate::default());

        tokio::spawn(run_client_actor(config, request_rx, events.clone(), status_tx));

        Self {
            requests,
            events,
            status,
        }
    }

    /// Subscribe to status transitions and response data
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Current status
    pub fn status(&self) -> StatusUpdate {
        self.status.borrow().clone()
    }

    /// Watch the current status
    pub fn watch_status(&self) -> watch::Receiver<StatusUpdate> {
        self.status.clone()
    }

    /// Connect to a daemon
    ///
    /// An existing connection is closed first; the command in flight on it
    /// fails with [`ClientError::Disconnected`] while queued commands carry
    /// over to the new connection.
    pub async fn connect(&self, host: impl Into<String>, port: u16) -> Result<(), ClientError> {
        let (response, rx) = oneshot::channel();
        self.request(ClientRequest::Connect {
            host: host.into(),
            port,
            response,
        })
        .await?;
        rx.await.map_err(|_| ClientError::ClientClosed)?
    }

    /// Close the connection without retrying
    ///
    /// Every queued command fails with [`ClientError::Disconnected`]. Safe to
    /// call when already disconnected.
    pub async fn disconnect(&self) {
        let (response, rx) = oneshot::channel();
        if self
            .request(ClientRequest::Disconnect { response })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Stop the client task
    pub async fn shutdown(&self) {
        let _ = self.requests.send(ClientRequest::Shutdown).await;
    }

    /// Send a raw command and wait for its response text
    ///
    /// While disconnected the command waits in the queue until a connection
    /// is established.
    pub async fn send_command(&self, text: impl Into<String>) -> Result<String, ClientError> {
        let text = text.into();
        let shape = ResponseShape::for_command(&text);
        self.submit(text, shape).await
    }

    /// Send a typed command
    pub async fn execute(&self, command: &RigCommand) -> Result<String, ClientError> {
        self.submit(command.encode(), command.response_shape()).await
    }

    async fn submit(&self, text: String, shape: ResponseShape) -> Result<String, ClientError> {
        let (response, rx) = oneshot::channel();
        self.request(ClientRequest::Command {
            text,
            shape,
            response,
        })
        .await?;
        rx.await.map_err(|_| ClientError::ClientClosed)?
    }

    /// Send a typed command and parse its response
    async fn query<T>(
        &self,
        command: &RigCommand,
        parse: impl FnOnce(&str) -> Result<T, ParseError>,
    ) -> Result<T, ClientError> {
        let text = self.execute(command).await?;
        Ok(parse(&text)?)
    }

    async fn request(&self, request: ClientRequest) -> Result<(), ClientError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| ClientError::ClientClosed)
    }

    /// Get the VFO frequency in Hz
    pub async fn get_frequency(&self) -> Result<u64, ClientError> {
        self.query(&RigCommand::GetFrequency, parse_frequency)
            .await
            .map_err(|e| e.context("Failed to get frequency"))
    }

    /// Set the VFO frequency in Hz
    pub async fn set_frequency(&self, hz: u64) -> Result<(), ClientError> {
        self.execute(&RigCommand::SetFrequency { hz })
            .await
            .map(drop)
            .map_err(|e| e.context("Failed to set frequency"))
    }

    /// Get mode and passband
    pub async fn get_mode(&self) -> Result<ModeInfo, ClientError> {
        self.query(&RigCommand::GetMode, parse_mode)
            .await
            .map_err(|e| e.context("Failed to get mode"))
    }

    /// Set mode and passband; a passband of 0 selects the rig's default
    pub async fn set_mode(&self, mode: Mode, passband_hz: i32) -> Result<(), ClientError> {
        self.execute(&RigCommand::SetMode { mode, passband_hz })
            .await
            .map(drop)
            .map_err(|e| e.context("Failed to set mode"))
    }

    /// Get PTT (transmit) state
    pub async fn get_ptt(&self) -> Result<bool, ClientError> {
        self.query(&RigCommand::GetPtt, parse_bool)
            .await
            .map_err(|e| e.context("Failed to get PTT status"))
    }

    /// Set PTT (transmit) state
    pub async fn set_ptt(&self, active: bool) -> Result<(), ClientError> {
        self.execute(&RigCommand::SetPtt { active })
            .await
            .map(drop)
            .map_err(|e| e.context("Failed to set PTT"))
    }

    /// Get a level value, nominal 0.0 to 1.0
    pub async fn get_level(&self, name: &str) -> Result<f32, ClientError> {
        let command = RigCommand::GetLevel {
            name: name.to_string(),
        };
        self.query(&command, parse_level)
            .await
            .map_err(|e| e.context(format!("Failed to get level {}", name)))
    }

    /// Set a level value, nominal 0.0 to 1.0
    pub async fn set_level(&self, name: &str, value: f32) -> Result<(), ClientError> {
        self.execute(&RigCommand::SetLevel {
            name: name.to_string(),
            value,
        })
        .await
        .map(drop)
        .map_err(|e| e.context(format!("Failed to set level {}", name)))
    }

    /// Get a function's on/off state
    pub async fn get_function(&self, name: &str) -> Result<bool, ClientError> {
        let command = RigCommand::GetFunction {
            name: name.to_string(),
        };
        self.query(&command, parse_bool)
            .await
            .map_err(|e| e.context(format!("Failed to get function {}", name)))
    }

    /// Turn a function on or off
    pub async fn set_function(&self, name: &str, enabled: bool) -> Result<(), ClientError> {
        self.execute(&RigCommand::SetFunction {
            name: name.to_string(),
            enabled,
        })
        .await
        .map(drop)
        .map_err(|e| e.context(format!("Failed to set function {}", name)))
    }

    /// Get model, version and capabilities from a state dump
    pub async fn get_info(&self) -> Result<RigInfo, ClientError> {
        self.execute(&RigCommand::DumpState)
            .await
            .map(|dump| RigInfo::parse(&dump))
            .map_err(|e| e.context("Failed to get radio info"))
    }

    /// Read frequency, mode, PTT and the common levels
    ///
    /// Frequency, mode and PTT must succeed. RF gain, squelch and RF power
    /// are optional capabilities: a failed read leaves the level out of the
    /// snapshot instead of failing the refresh.
    pub async fn refresh_snapshot(&self) -> Result<RadioSnapshot, ClientError> {
        let frequency_hz = self.get_frequency().await?;
        let ModeInfo { mode, passband_hz } = self.get_mode().await?;
        let ptt = self.get_ptt().await?;

        let mut levels = BTreeMap::new();
        for name in OPTIONAL_LEVELS {
            match self.get_level(name).await {
                Ok(value) => {
                    levels.insert(name.to_string(), value);
                }
                Err(e) if e.is_disconnected() => return Err(e),
                Err(e) => debug!("Skipping level {}: {}", name, e),
            }
        }

        Ok(RadioSnapshot {
            frequency_hz,
            mode,
            passband_hz,
            ptt,
            levels,
        })
    }
}

//! Integration tests for the rigctld client
//!
//! These tests run the client against a virtual daemon on loopback and
//! verify:
//! - Typed operations and response parsing
//! - FIFO matching of responses to commands
//! - Framing of responses split across TCP segments
//! - Queueing while disconnected and cancellation on disconnect
//! - Bounded reconnection after an unexpected connection loss

use std::time::{Duration, Instant};

use rig_client::{ClientConfig, ClientError, ClientEvent, ConnectionStatus, RigClient, StatusUpdate};
use rig_protocol::{level, Mode};
use rig_sim::{RigServer, RigServerConfig, VirtualRigConfig};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Client config with short delays so reconnect tests run quickly
    pub fn fast_config(max_reconnect_attempts: u32) -> ClientConfig {
        ClientConfig {
            max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(20),
            connect_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Start a daemon and a client connected to it
    pub async fn connected_pair(config: RigServerConfig) -> (RigServer, RigClient) {
        let server = RigServer::with_config(config).await.unwrap();
        let client = RigClient::spawn(ClientConfig::default());
        client.connect("127.0.0.1", server.port()).await.unwrap();
        (server, client)
    }

    /// A port nothing is listening on
    pub async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    /// Collect status updates until one matches `done`
    pub async fn statuses_until(
        events: &mut broadcast::Receiver<ClientEvent>,
        done: impl Fn(&StatusUpdate) -> bool,
    ) -> Vec<StatusUpdate> {
        let mut seen = Vec::new();
        let collect = async {
            loop {
                match events.recv().await {
                    Ok(ClientEvent::Status(update)) => {
                        let finished = done(&update);
                        seen.push(update);
                        if finished {
                            return;
                        }
                    }
                    Ok(ClientEvent::Data(_)) => {}
                    Err(e) => panic!("event channel error: {}", e),
                }
            }
        };
        timeout(Duration::from_secs(5), collect)
            .await
            .expect("timed out waiting for status");
        seen
    }

    pub fn kinds(updates: &[StatusUpdate]) -> Vec<ConnectionStatus> {
        updates.iter().map(|u| u.status).collect()
    }
}

use helpers::*;

// ============================================================================
// Typed Operations
// ============================================================================

#[tokio::test]
async fn test_connect_reports_status() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(ClientConfig::default());
    let mut events = client.subscribe();

    assert_eq!(client.status().status, ConnectionStatus::Disconnected);
    client.connect("127.0.0.1", server.port()).await.unwrap();

    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Connected).await;
    assert_eq!(
        kinds(&updates),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Connected]
    );
    assert_eq!(
        updates[1].message,
        format!("Connected to 127.0.0.1:{}", server.port())
    );
    assert_eq!(client.status().status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_frequency_set_and_get() {
    let (server, client) = connected_pair(RigServerConfig::default()).await;

    assert_eq!(client.get_frequency().await.unwrap(), 14_250_000);
    client.set_frequency(14_200_000).await.unwrap();
    assert_eq!(client.get_frequency().await.unwrap(), 14_200_000);
    assert_eq!(server.rig().lock().await.frequency_hz(), 14_200_000);
}

#[tokio::test]
async fn test_get_frequency_reads_front_panel_change() {
    let (server, client) = connected_pair(RigServerConfig::default()).await;

    server.rig().lock().await.set_frequency(7_030_000);
    assert_eq!(client.get_frequency().await.unwrap(), 7_030_000);
}

#[tokio::test]
async fn test_mode_ptt_level_function() {
    let (server, client) = connected_pair(RigServerConfig::default()).await;

    let info = client.get_mode().await.unwrap();
    assert_eq!(info.mode, Mode::Usb);
    assert_eq!(info.passband_hz, 2400);

    client.set_mode(Mode::Cw, 0).await.unwrap();
    let info = client.get_mode().await.unwrap();
    assert_eq!(info.mode, Mode::Cw);
    assert_eq!(info.passband_hz, 500);
    assert_eq!(server.rig().lock().await.mode(), &Mode::Cw);

    assert!(!client.get_ptt().await.unwrap());
    client.set_ptt(true).await.unwrap();
    assert!(client.get_ptt().await.unwrap());

    client.set_level(level::RF_POWER, 0.25).await.unwrap();
    let power = client.get_level(level::RF_POWER).await.unwrap();
    assert!((power - 0.25).abs() < 1e-6);

    client.set_function("NB", true).await.unwrap();
    assert!(client.get_function("NB").await.unwrap());
    assert!(server.rig().lock().await.function("NB"));
}

#[tokio::test]
async fn test_negative_report_fails_with_code() {
    let (_server, client) = connected_pair(RigServerConfig::default()).await;

    let err = client.send_command("F abc").await.unwrap_err();
    assert!(matches!(err, ClientError::CommandFailed { code: 1 }));

    // Later commands still line up with their responses
    assert_eq!(client.send_command("f").await.unwrap(), "14250000");
}

#[tokio::test]
async fn test_unsupported_level_code_through_context() {
    let config = RigServerConfig {
        rig: VirtualRigConfig {
            unsupported_levels: vec![level::SQUELCH.to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let (_server, client) = connected_pair(config).await;

    let err = client.get_level(level::SQUELCH).await.unwrap_err();
    assert_eq!(err.code(), Some(11));
    assert!(err.to_string().starts_with("Failed to get level SQL"));
}

#[tokio::test]
async fn test_set_reply_is_report_text() {
    let (_server, client) = connected_pair(RigServerConfig::default()).await;
    assert_eq!(client.send_command("F 7074000").await.unwrap(), "RPRT 0");
    assert_eq!(client.send_command("m").await.unwrap(), "USB\n2400");
}

#[tokio::test]
async fn test_get_info_from_dump() {
    let (_server, client) = connected_pair(RigServerConfig::default()).await;

    let info = client.get_info().await.unwrap();
    assert_eq!(info.model, "1");
    assert_eq!(info.version, "20240101.0");
    assert_eq!(info.capabilities.len(), 6);
    assert!(info.capabilities.iter().any(|c| c.starts_with("Can get PTT")));
}

#[tokio::test]
async fn test_refresh_snapshot_skips_unsupported_levels() {
    let config = RigServerConfig {
        rig: VirtualRigConfig {
            unsupported_levels: vec![level::SQUELCH.to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let (_server, client) = connected_pair(config).await;

    let snapshot = client.refresh_snapshot().await.unwrap();
    assert_eq!(snapshot.frequency_hz, 14_250_000);
    assert_eq!(snapshot.mode, Mode::Usb);
    assert_eq!(snapshot.passband_hz, 2400);
    assert!(!snapshot.ptt);
    assert_eq!(snapshot.level(level::RF_GAIN), Some(0.75));
    assert_eq!(snapshot.level(level::RF_POWER), Some(0.5));
    assert_eq!(snapshot.level(level::SQUELCH), None);
}

#[tokio::test]
async fn test_responses_published_as_data() {
    let (_server, client) = connected_pair(RigServerConfig::default()).await;
    let mut events = client.subscribe();

    client.get_frequency().await.unwrap();

    let event = timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, ClientEvent::Data("14250000".into()));
}

// ============================================================================
// Ordering and Framing
// ============================================================================

#[tokio::test]
async fn test_concurrent_commands_resolve_in_order() {
    let (server, client) = connected_pair(RigServerConfig::default()).await;

    // join! polls in argument order, so the commands queue in that order
    let (a, b, c, d, e) = tokio::join!(
        client.set_frequency(3_573_000),
        client.get_frequency(),
        client.set_frequency(7_074_000),
        client.get_frequency(),
        client.get_mode(),
    );

    a.unwrap();
    assert_eq!(b.unwrap(), 3_573_000);
    c.unwrap();
    assert_eq!(d.unwrap(), 7_074_000);
    assert_eq!(e.unwrap().passband_hz, 2400);

    let history = server.rig().lock().await.history().to_vec();
    assert_eq!(history, ["F 3573000", "f", "F 7074000", "f", "m"]);
}

#[tokio::test]
async fn test_many_clones_share_one_connection() {
    let (server, client) = connected_pair(RigServerConfig::default()).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.get_mode().await }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().mode, Mode::Usb);
    }
    assert_eq!(server.connections_accepted(), 1);
}

#[tokio::test]
async fn test_fragmented_responses() {
    let config = RigServerConfig {
        chunk_size: Some(1),
        ..Default::default()
    };
    let (_server, client) = connected_pair(config).await;

    let info = client.get_mode().await.unwrap();
    assert_eq!(info.mode, Mode::Usb);
    assert_eq!(info.passband_hz, 2400);
    assert_eq!(client.get_frequency().await.unwrap(), 14_250_000);

    let info = client.get_info().await.unwrap();
    assert_eq!(info.model, "1");
}

// ============================================================================
// Queueing and Disconnect
// ============================================================================

#[tokio::test]
async fn test_commands_queue_until_connected() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(ClientConfig::default());

    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { client.get_frequency().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());

    client.connect("127.0.0.1", server.port()).await.unwrap();
    assert_eq!(waiting.await.unwrap().unwrap(), 14_250_000);
}

#[tokio::test]
async fn test_disconnect_rejects_queued_commands() {
    let client = RigClient::spawn(ClientConfig::default());
    let mut events = client.subscribe();

    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { client.get_frequency().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    client.disconnect().await;
    let err = waiting.await.unwrap().unwrap_err();
    assert!(err.is_disconnected());

    // Already disconnected; no duplicate transition
    assert!(events.try_recv().is_err());
    assert_eq!(client.status().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_deliberate_disconnect_does_not_reconnect() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(fast_config(5));
    client.connect("127.0.0.1", server.port()).await.unwrap();
    let mut events = client.subscribe();

    client.disconnect().await;
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Disconnected).await;
    assert_eq!(updates[0].message, "Disconnected from server");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(server.connections_accepted(), 1);
}

#[tokio::test]
async fn test_disconnect_rejects_command_in_flight() {
    let config = RigServerConfig {
        response_delay: Some(Duration::from_millis(300)),
        ..Default::default()
    };
    let (_server, client) = connected_pair(config).await;

    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { client.get_frequency().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    client.disconnect().await;
    let err = waiting.await.unwrap().unwrap_err();
    assert!(err.is_disconnected());
    assert_eq!(client.status().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_disconnect_while_reconnecting_cancels_retry() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(ClientConfig {
        reconnect_delay: Duration::from_millis(500),
        ..fast_config(5)
    });
    client.connect("127.0.0.1", server.port()).await.unwrap();
    client.get_frequency().await.unwrap();
    let mut events = client.subscribe();

    server.drop_connections();
    statuses_until(&mut events, |u| u.status == ConnectionStatus::Reconnecting).await;

    client.disconnect().await;
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Disconnected).await;
    assert_eq!(kinds(&updates), vec![ConnectionStatus::Disconnected]);

    // Well past the retry that was scheduled
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(server.connections_accepted(), 1);
    assert_eq!(client.status().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_disconnect_abandons_hanging_reconnect() {
    // A listener whose accept queue is full drops new SYNs, so connects hang
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let client = RigClient::spawn(ClientConfig {
        max_reconnect_attempts: 5,
        reconnect_delay: Duration::from_millis(20),
        connect_timeout: Duration::from_secs(10),
        ..Default::default()
    });
    client.connect("127.0.0.1", addr.port()).await.unwrap();
    let (accepted, _) = listener.accept().await.unwrap();

    let mut fillers = Vec::new();
    let mut full = false;
    for _ in 0..64 {
        match timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => fillers.push(stream),
            Ok(Err(e)) => panic!("filler connect failed: {}", e),
            Err(_) => {
                full = true;
                break;
            }
        }
    }
    assert!(full, "accept queue never filled");

    let mut events = client.subscribe();
    drop(accepted);
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Connecting).await;
    assert_eq!(
        kinds(&updates),
        vec![ConnectionStatus::Reconnecting, ConnectionStatus::Connecting]
    );

    timeout(Duration::from_secs(1), client.disconnect())
        .await
        .expect("disconnect waited on the pending connect");
    assert_eq!(client.status().status, ConnectionStatus::Disconnected);

    // The abandoned attempt reports nothing
    tokio::time::sleep(Duration::from_millis(200)).await;
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Disconnected).await;
    assert_eq!(kinds(&updates), vec![ConnectionStatus::Disconnected]);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_connect_failure_reports_error_without_retry() {
    let port = closed_port().await;
    let client = RigClient::spawn(fast_config(5));
    let mut events = client.subscribe();

    let err = client.connect("127.0.0.1", port).await.unwrap_err();
    assert!(matches!(err, ClientError::ConnectionFailed { .. }));

    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Error).await;
    assert_eq!(
        kinds(&updates),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Error]
    );
    assert!(updates[1].message.starts_with("Connection error:"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_reconnect_replaces_connection() {
    let first = RigServer::start().await.unwrap();
    let second = RigServer::start().await.unwrap();
    let client = RigClient::spawn(ClientConfig::default());

    client.connect("127.0.0.1", first.port()).await.unwrap();
    client.set_frequency(1_840_000).await.unwrap();

    client.connect("127.0.0.1", second.port()).await.unwrap();
    assert_eq!(client.get_frequency().await.unwrap(), 14_250_000);
    assert_eq!(second.rig().lock().await.history(), ["f"]);
}

#[tokio::test]
async fn test_shutdown_closes_client() {
    let (_server, client) = connected_pair(RigServerConfig::default()).await;
    client.shutdown().await;

    let err = client.get_frequency().await.unwrap_err();
    assert!(matches!(err.root(), ClientError::ClientClosed));
}

// ============================================================================
// Reconnection
// ============================================================================

#[tokio::test]
async fn test_reconnects_after_connection_loss() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(fast_config(5));
    client.connect("127.0.0.1", server.port()).await.unwrap();

    // Round trip so the daemon has registered the connection
    client.get_frequency().await.unwrap();
    let mut events = client.subscribe();

    server.drop_connections();
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Connected).await;
    assert_eq!(
        kinds(&updates),
        vec![
            ConnectionStatus::Reconnecting,
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
        ]
    );
    assert_eq!(updates[0].attempt, Some(1));
    assert_eq!(updates[0].max_attempts, Some(5));
    assert_eq!(updates[0].message, "Reconnecting (1/5)...");

    assert_eq!(client.get_frequency().await.unwrap(), 14_250_000);
    assert_eq!(server.connections_accepted(), 2);
}

#[tokio::test]
async fn test_reconnect_gives_up_after_max_attempts() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(fast_config(3));
    client.connect("127.0.0.1", server.port()).await.unwrap();
    client.get_frequency().await.unwrap();
    let mut events = client.subscribe();

    server.shutdown().await;
    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Failed).await;

    let attempts: Vec<u32> = updates
        .iter()
        .filter(|u| u.status == ConnectionStatus::Reconnecting)
        .filter_map(|u| u.attempt)
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);

    let connecting = updates
        .iter()
        .filter(|u| u.status == ConnectionStatus::Connecting)
        .count();
    assert_eq!(connecting, 3);
    assert_eq!(client.status().status, ConnectionStatus::Failed);

    // Terminal until an explicit connect
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_retries_wait_for_reconnect_delay() {
    let server = RigServer::start().await.unwrap();
    let client = RigClient::spawn(ClientConfig {
        reconnect_delay: Duration::from_millis(200),
        ..fast_config(3)
    });
    client.connect("127.0.0.1", server.port()).await.unwrap();
    client.get_frequency().await.unwrap();
    let mut events = client.subscribe();

    server.shutdown().await;

    let mut connecting_at = Vec::new();
    let collect = async {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Status(update)) => match update.status {
                    ConnectionStatus::Connecting => connecting_at.push(Instant::now()),
                    ConnectionStatus::Failed => return,
                    _ => {}
                },
                Ok(ClientEvent::Data(_)) => {}
                Err(e) => panic!("event channel error: {}", e),
            }
        }
    };
    timeout(Duration::from_secs(5), collect)
        .await
        .expect("timed out waiting for Failed");

    assert_eq!(connecting_at.len(), 3);
    for pair in connecting_at.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(180), "retry gap {:?}", gap);
        assert!(gap < Duration::from_secs(1), "retry gap {:?}", gap);
    }
}

#[tokio::test]
async fn test_response_timeout_tears_down_connection() {
    // Accepts and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let _hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let client = RigClient::spawn(ClientConfig {
        max_reconnect_attempts: 0,
        response_timeout: Duration::from_millis(100),
        ..Default::default()
    });
    client.connect("127.0.0.1", port).await.unwrap();
    let mut events = client.subscribe();

    let err = client.get_frequency().await.unwrap_err();
    assert!(matches!(err.root(), ClientError::ResponseTimeout(100)));

    let updates = statuses_until(&mut events, |u| u.status == ConnectionStatus::Failed).await;
    assert_eq!(kinds(&updates), vec![ConnectionStatus::Failed]);
}

#![allow(dead_code)]
// Transaction WebSocket Handlers
//
// Real-time WebSocket handlers for transaction layer events

use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade}},
    response::Response,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use axum::extract::ws::Utf8Bytes;
use tokio::time::{interval, Duration};

use super::super::types::ApiState;
use super::transaction_ws_types::*;

// ============================================================================
// WebSocket Upgrade Handlers
// ============================================================================

/// WebSocket handler for transaction lifecycle events
///
/// Streams real-time transaction begin, commit, rollback events
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/lifecycle",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_lifecycle(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_transaction_lifecycle(socket, state))
}

/// WebSocket handler for lock events
///
/// Streams real-time lock acquisition, release, and waiting events
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/locks",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_locks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_lock_events(socket, state))
}

/// WebSocket handler for deadlock events
///
/// Streams real-time deadlock detection and resolution events
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/deadlocks",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_deadlocks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_deadlock_events(socket, state))
}

/// WebSocket handler for MVCC events
///
/// Streams MVCC version visibility changes and garbage collection events
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/mvcc",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_mvcc(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_mvcc_events(socket, state))
}

/// WebSocket handler for WAL events
///
/// Streams Write-Ahead Log operations including writes, flushes, and checkpoints
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/wal",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_wal(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_wal_events(socket, state))
}

/// WebSocket handler for transaction statistics
///
/// Streams periodic transaction statistics updates
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/stats",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_transaction_stats(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_transaction_stats(socket, state))
}

// ============================================================================
// WebSocket Connection Handlers
// ============================================================================

/// Handle transaction lifecycle events
async fn handle_transaction_lifecycle(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Lifecycle,
        data: json!({
            "message": "Connected to transaction lifecycle stream",
            "supported_events": ["begin", "commit", "rollback", "savepoint", "timeout"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    // Simulate sending transaction events
    let mut ticker = interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Simulate a transaction begin event
                let event = TransactionEvent {
                    event_type: TransactionEventType::Begin,
                    transaction_id: crate::api::rest::types::TransactionId(rand::random()),
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                    isolation_level: Some("READ_COMMITTED".to_string()),
                    metadata: [
                        ("readonly".to_string(), json!(false)),
                        ("session_id".to_string(), json!(12345)),
                    ].iter().cloned().collect(),
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Lifecycle,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.timestamp,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Handle lock events
async fn handle_lock_events(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Locks,
        data: json!({
            "message": "Connected to lock events stream",
            "supported_events": ["acquired", "released", "wait_start", "wait_end", "upgraded", "escalated"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    let mut ticker = interval(Duration::from_secs(3));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = LockEvent {
                    event_type: LockEventType::Acquired,
                    transaction_id: crate::api::rest::types::TransactionId(rand::random()),
                    resource_id: format!("table.users.row_{}", rand::random::<u32>() % 1000),
                    lock_mode: "EXCLUSIVE".to_string(),
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                    wait_time_ms: Some(rand::random::<u64>() % 100),
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Locks,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.timestamp,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Handle deadlock events
async fn handle_deadlock_events(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Deadlocks,
        data: json!({
            "message": "Connected to deadlock events stream",
            "info": "You will be notified when deadlocks are detected"
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    // Deadlocks are rare, simulate one every 30 seconds
    let mut ticker = interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                use crate::api::rest::types::TransactionId;
                let txn1 = TransactionId(rand::random());
                let txn2 = TransactionId(rand::random());

                let event = DeadlockEvent {
                    deadlock_id: uuid::Uuid::new_v4().to_string(),
                    detected_at: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                    cycle: vec![txn1, txn2, txn1],
                    victim: txn2,
                    resolution: DeadlockResolution::AbortYoungest,
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Deadlocks,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.detected_at,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Handle MVCC events
async fn handle_mvcc_events(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Mvcc,
        data: json!({
            "message": "Connected to MVCC events stream",
            "supported_events": ["version_created", "version_deleted", "garbage_collected", "snapshot_taken"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    let mut ticker = interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = MvccEvent {
                    event_type: MvccEventType::VersionCreated,
                    transaction_id: crate::api::rest::types::TransactionId(rand::random()),
                    table: "users".to_string(),
                    key: format!("user_{}", rand::random::<u32>() % 1000),
                    version_count: (rand::random::<u32>() % 5 + 1) as usize,
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Mvcc,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.timestamp,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Handle WAL events
async fn handle_wal_events(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Wal,
        data: json!({
            "message": "Connected to WAL events stream",
            "supported_events": ["write", "flush", "checkpoint", "truncate"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    let mut ticker = interval(Duration::from_millis(500));
    let mut lsn_counter = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                lsn_counter += 1;
                let event = WalEvent {
                    event_type: WalEventType::Write,
                    lsn: format!("0/{:08X}", lsn_counter),
                    transaction_id: Some(crate::api::rest::types::TransactionId(rand::random())),
                    size_bytes: rand::random::<u64>() % 4096 + 128,
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Wal,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.timestamp,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Handle transaction statistics
async fn handle_transaction_stats(mut socket: WebSocket, state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = TransactionWsMessage {
        channel: TransactionChannel::Statistics,
        data: json!({
            "message": "Connected to transaction statistics stream",
            "update_interval_ms": 1000
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(msg))).await;
    }

    let mut ticker = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = TransactionStatsEvent {
                    total_commits: rand::random::<u64>() % 10000 + 50000,
                    total_aborts: rand::random::<u64>() % 1000 + 500,
                    total_deadlocks: rand::random::<u64>() % 10,
                    active_transactions: state.active_queries.read().await.len() as u64,
                    avg_commit_latency_ms: rand::random::<u64>() % 50 + 10,
                    p99_latency_ms: rand::random::<u64>() % 200 + 50,
                    abort_rate: (rand::random::<u64>() % 5) as f64 / 100.0,
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                };

                let msg = TransactionWsMessage {
                    channel: TransactionChannel::Statistics,
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: event.timestamp,
                };

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

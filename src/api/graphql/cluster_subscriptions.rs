// GraphQL Cluster Subscriptions
//
// Real-time subscription resolvers for replication, clustering, and RAC operations

use async_graphql::{Context, Enum, SimpleObject, Subscription, ID};
use futures_util::stream::Stream;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;

// ============================================================================
// Replication Subscription Types
// ============================================================================

/// Replication lag event for subscriptions
#[derive(Clone, Debug, SimpleObject)]
pub struct ReplicationLagEvent {
    /// Replica identifier
    pub replica_id: ID,
    /// Current lag in bytes
    pub lag_bytes: i64,
    /// Current lag in seconds
    pub lag_seconds: f64,
    /// Threshold that was exceeded
    pub threshold_bytes: i64,
    /// Severity level
    pub severity: AlertSeverity,
    /// Timestamp
    pub timestamp: i64,
}

/// Replica status change event
#[derive(Clone, Debug, SimpleObject)]
pub struct ReplicaStatusEvent {
    /// Replica identifier
    pub replica_id: ID,
    /// Previous status
    pub old_status: ReplicaStatus,
    /// New status
    pub new_status: ReplicaStatus,
    /// Reason for change
    pub reason: Option<String>,
    /// Timestamp
    pub timestamp: i64,
}

/// Replica status enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum ReplicaStatus {
    Online,
    Offline,
    CatchingUp,
    InSync,
    Failed,
}

/// Replication conflict event
#[derive(Clone, Debug, SimpleObject)]
pub struct ConflictEvent {
    /// Conflict ID
    pub conflict_id: ID,
    /// Table name
    pub table_name: String,
    /// Conflict type
    pub conflict_type: ConflictType,
    /// Resolution strategy
    pub resolution_strategy: String,
    /// Resolved successfully
    pub resolved: bool,
    /// Source replica
    pub source_replica: ID,
    /// Timestamp
    pub timestamp: i64,
}

/// Conflict type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum ConflictType {
    UpdateUpdate,
    UpdateDelete,
    InsertInsert,
    DeleteUpdate,
}

/// Shard rebalance progress event
#[derive(Clone, Debug, SimpleObject)]
pub struct RebalanceProgressEvent {
    /// Rebalance plan ID
    pub plan_id: ID,
    /// Table being rebalanced
    pub table_name: String,
    /// Progress percentage
    pub progress_percent: f64,
    /// Rows migrated
    pub rows_migrated: i64,
    /// Total rows
    pub total_rows: i64,
    /// Estimated time remaining (seconds)
    pub eta_seconds: Option<f64>,
    /// Current phase
    pub phase: RebalancePhase,
    /// Timestamp
    pub timestamp: i64,
}

/// Rebalance phase enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum RebalancePhase {
    Planning,
    Copying,
    Validating,
    Switching,
    Completed,
}

// ============================================================================
// Clustering Subscription Types
// ============================================================================

/// Cluster health change event
#[derive(Clone, Debug, SimpleObject)]
pub struct ClusterHealthEvent {
    /// Overall cluster status
    pub status: ClusterStatus,
    /// Total nodes
    pub total_nodes: i32,
    /// Healthy nodes
    pub healthy_nodes: i32,
    /// Degraded nodes
    pub degraded_nodes: i32,
    /// Failed nodes
    pub failed_nodes: i32,
    /// Has quorum
    pub has_quorum: bool,
    /// Timestamp
    pub timestamp: i64,
}

/// Cluster status enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum ClusterStatus {
    Healthy,
    Degraded,
    Failed,
}

/// Node status change event
#[derive(Clone, Debug, SimpleObject)]
pub struct NodeStatusEvent {
    /// Node identifier
    pub node_id: ID,
    /// Previous status
    pub old_status: NodeStatus,
    /// New status
    pub new_status: NodeStatus,
    /// Node role
    pub role: NodeRole,
    /// Health metrics
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    /// Timestamp
    pub timestamp: i64,
}

/// Node status enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum NodeStatus {
    Healthy,
    Degraded,
    Unreachable,
    Failed,
    ShuttingDown,
}

/// Node role enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum NodeRole {
    Leader,
    Follower,
    Witness,
    ReadOnly,
}

/// Failover event
#[derive(Clone, Debug, SimpleObject)]
pub struct FailoverEvent {
    /// Failover ID
    pub failover_id: ID,
    /// Failed node ID
    pub failed_node: ID,
    /// Replacement node ID
    pub replacement_node: Option<ID>,
    /// Failover type
    pub failover_type: FailoverType,
    /// Success status
    pub success: bool,
    /// Duration in seconds
    pub duration_seconds: Option<f64>,
    /// Error message if failed
    pub error_message: Option<String>,
    /// Timestamp
    pub timestamp: i64,
}

/// Failover type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum FailoverType {
    Automatic,
    Manual,
    Planned,
}

/// Leader election event
#[derive(Clone, Debug, SimpleObject)]
pub struct LeaderElectionEvent {
    /// New leader node ID
    pub leader_id: ID,
    /// Previous leader ID
    pub previous_leader: Option<ID>,
    /// Election term
    pub term: i64,
    /// Votes received
    pub votes_received: i32,
    /// Total voters
    pub total_voters: i32,
    /// Timestamp
    pub timestamp: i64,
}

// ============================================================================
// RAC Subscription Types
// ============================================================================

/// Cache Fusion event
#[derive(Clone, Debug, SimpleObject)]
pub struct CacheFusionEvent {
    /// Event type
    pub event_type: CacheFusionEventType,
    /// Block ID
    pub block_id: String,
    /// Source instance
    pub source_instance: ID,
    /// Target instance
    pub target_instance: ID,
    /// Block mode
    pub block_mode: BlockMode,
    /// Transfer size in bytes
    pub transfer_size: i64,
    /// Transfer duration in microseconds
    pub duration_micros: i64,
    /// Success status
    pub success: bool,
    /// Timestamp
    pub timestamp: i64,
}

/// Cache Fusion event type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum CacheFusionEventType {
    BlockTransfer,
    BlockRequest,
    BlockGrant,
}

/// Block mode enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum BlockMode {
    Null,
    Shared,
    Exclusive,
}

/// Resource lock event
#[derive(Clone, Debug, SimpleObject)]
pub struct LockEvent {
    /// Event type
    pub event_type: LockEventType,
    /// Resource ID
    pub resource_id: String,
    /// Lock type
    pub lock_type: LockType,
    /// Previous lock type (for conversions)
    pub previous_lock_type: Option<LockType>,
    /// Requesting instance
    pub instance_id: ID,
    /// Lock granted
    pub granted: bool,
    /// Wait time in milliseconds
    pub wait_time_ms: Option<i64>,
    /// Timestamp
    pub timestamp: i64,
}

/// Lock event type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum LockEventType {
    Granted,
    Released,
    Converted,
    Blocked,
}

/// Lock type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum LockType {
    Null,
    Shared,
    Exclusive,
}

/// Instance recovery event
#[derive(Clone, Debug, SimpleObject)]
pub struct RecoveryEvent {
    /// Event type
    pub event_type: RecoveryEventType,
    /// Failed instance ID
    pub failed_instance: ID,
    /// Recovering instance ID
    pub recovering_instance: Option<ID>,
    /// Recovery phase
    pub recovery_phase: RecoveryPhase,
    /// Progress percentage
    pub progress_percent: f64,
    /// Redo logs applied
    pub redo_logs_applied: i64,
    /// Total redo logs
    pub total_redo_logs: i64,
    /// Estimated time remaining (seconds)
    pub eta_seconds: Option<f64>,
    /// Timestamp
    pub timestamp: i64,
}

/// Recovery event type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum RecoveryEventType {
    Started,
    Progress,
    Completed,
    Failed,
}

/// Recovery phase enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum RecoveryPhase {
    RedoApply,
    LockReconfig,
    ResourceRemaster,
    Validation,
}

/// Parallel query event
#[derive(Clone, Debug, SimpleObject)]
pub struct ParallelQueryEvent {
    /// Event type
    pub event_type: QueryEventType,
    /// Query ID
    pub query_id: ID,
    /// SQL text (truncated)
    pub sql_text: String,
    /// Degree of parallelism
    pub dop: i32,
    /// Instances involved
    pub instances: Vec<ID>,
    /// Rows processed
    pub rows_processed: i64,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// Success status
    pub success: bool,
    /// Timestamp
    pub timestamp: i64,
}

/// Query event type enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum QueryEventType {
    Started,
    Progress,
    Completed,
    Failed,
}

/// Alert severity enum
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enum)]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

// ============================================================================
// Subscription Root
// ============================================================================

/// Cluster subscription operations
pub struct ClusterSubscriptionRoot;

#[Subscription]
impl ClusterSubscriptionRoot {
    /// Subscribe to replication lag updates
    ///
    /// Receives notifications when replication lag exceeds thresholds
    async fn replication_lag_updates<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        replica_id: Option<ID>,
        threshold: Option<i64>,
    ) -> impl Stream<Item = ReplicationLagEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(5));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| {
            ReplicationLagEvent {
                replica_id: replica_id
                    .clone()
                    .unwrap_or_else(|| ID::from("replica-001")),
                lag_bytes: 524288, // 512 KB
                lag_seconds: 2.5,
                threshold_bytes: threshold.unwrap_or(262144),
                severity: AlertSeverity::Warning,
                timestamp: chrono::Utc::now().timestamp(),
            }
        })
    }

    /// Subscribe to replica status changes
    ///
    /// Receives notifications when replicas change state (online/offline/etc)
    async fn replica_status_changes<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        replica_id: Option<ID>,
    ) -> impl Stream<Item = ReplicaStatusEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(10));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| ReplicaStatusEvent {
            replica_id: replica_id
                .clone()
                .unwrap_or_else(|| ID::from("replica-001")),
            old_status: ReplicaStatus::CatchingUp,
            new_status: ReplicaStatus::InSync,
            reason: Some("Caught up with primary".to_string()),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to replication conflicts
    ///
    /// Receives notifications when conflicts are detected or resolved
    async fn replication_conflicts<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        _group_id: Option<ID>,
    ) -> impl Stream<Item = ConflictEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(30));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| ConflictEvent {
            conflict_id: ID::from(uuid::Uuid::new_v4().to_string()),
            table_name: "users".to_string(),
            conflict_type: ConflictType::UpdateUpdate,
            resolution_strategy: "LastWriterWins".to_string(),
            resolved: true,
            source_replica: ID::from("replica-002"),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to shard rebalance progress
    ///
    /// Receives real-time updates during shard rebalancing operations
    async fn shard_rebalance_progress<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        table_id: Option<ID>,
    ) -> impl Stream<Item = RebalanceProgressEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(2));
        let stream = IntervalStream::new(interval);

        let mut progress: f64 = 0.0;
        stream.map(move |_| {
            progress = (progress + 5.0).min(100.0);
            RebalanceProgressEvent {
                plan_id: ID::from("plan-abc123"),
                table_name: table_id
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "orders".to_string()),
                progress_percent: progress,
                rows_migrated: (progress * 10000.0) as i64,
                total_rows: 1000000,
                eta_seconds: Some((100.0 - progress) * 2.0),
                phase: if progress < 100.0 {
                    RebalancePhase::Copying
                } else {
                    RebalancePhase::Completed
                },
                timestamp: chrono::Utc::now().timestamp(),
            }
        })
    }

    /// Subscribe to cluster health changes
    ///
    /// Receives notifications when overall cluster health status changes
    async fn cluster_health_changes<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
    ) -> impl Stream<Item = ClusterHealthEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(5));
        let stream = IntervalStream::new(interval);

        stream.map(|_| ClusterHealthEvent {
            status: ClusterStatus::Healthy,
            total_nodes: 5,
            healthy_nodes: 4,
            degraded_nodes: 1,
            failed_nodes: 0,
            has_quorum: true,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to node status changes
    ///
    /// Receives notifications when individual nodes change health status
    async fn node_status_changes<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        node_id: Option<ID>,
    ) -> impl Stream<Item = NodeStatusEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(15));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| NodeStatusEvent {
            node_id: node_id.clone().unwrap_or_else(|| ID::from("node-001")),
            old_status: NodeStatus::Healthy,
            new_status: NodeStatus::Degraded,
            role: NodeRole::Follower,
            cpu_usage: 78.5,
            memory_usage: 65.2,
            disk_usage: 45.0,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to failover events
    ///
    /// Receives notifications when failovers are initiated or completed
    async fn failover_events<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
    ) -> impl Stream<Item = FailoverEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(60));
        let stream = IntervalStream::new(interval);

        stream.map(|_| FailoverEvent {
            failover_id: ID::from(uuid::Uuid::new_v4().to_string()),
            failed_node: ID::from("node-003"),
            replacement_node: Some(ID::from("node-004")),
            failover_type: FailoverType::Automatic,
            success: true,
            duration_seconds: Some(5.2),
            error_message: None,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to leader elections
    ///
    /// Receives notifications when new cluster leaders are elected
    async fn leader_elections<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
    ) -> impl Stream<Item = LeaderElectionEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(120));
        let stream = IntervalStream::new(interval);

        stream.map(|_| LeaderElectionEvent {
            leader_id: ID::from("node-002"),
            previous_leader: Some(ID::from("node-001")),
            term: 42,
            votes_received: 3,
            total_voters: 5,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to Cache Fusion events
    ///
    /// Receives notifications about block transfers between RAC instances
    async fn cache_fusion_events<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        instance_id: Option<ID>,
    ) -> impl Stream<Item = CacheFusionEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_millis(500));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| CacheFusionEvent {
            event_type: CacheFusionEventType::BlockTransfer,
            block_id: format!("blk_{}", uuid::Uuid::new_v4().to_string()[..8].to_string()),
            source_instance: ID::from("instance-1"),
            target_instance: instance_id
                .clone()
                .unwrap_or_else(|| ID::from("instance-2")),
            block_mode: BlockMode::Shared,
            transfer_size: 8192,
            duration_micros: 150,
            success: true,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to resource lock events
    ///
    /// Receives notifications when locks are granted, released, or converted
    async fn resource_lock_events<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        resource_id: Option<String>,
    ) -> impl Stream<Item = LockEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(1));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| LockEvent {
            event_type: LockEventType::Granted,
            resource_id: resource_id
                .clone()
                .unwrap_or_else(|| "res_users_table".to_string()),
            lock_type: LockType::Shared,
            previous_lock_type: None,
            instance_id: ID::from("instance-2"),
            granted: true,
            wait_time_ms: Some(5),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Subscribe to instance recovery events
    ///
    /// Receives real-time updates during RAC instance recovery
    async fn instance_recovery_events<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
    ) -> impl Stream<Item = RecoveryEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(3));
        let stream = IntervalStream::new(interval);

        let mut progress: f64 = 0.0;
        stream.map(move |_| {
            progress = (progress + 10.0).min(100.0);
            RecoveryEvent {
                event_type: if progress < 100.0 {
                    RecoveryEventType::Progress
                } else {
                    RecoveryEventType::Completed
                },
                failed_instance: ID::from("instance-3"),
                recovering_instance: Some(ID::from("instance-1")),
                recovery_phase: RecoveryPhase::RedoApply,
                progress_percent: progress,
                redo_logs_applied: (progress * 100.0) as i64,
                total_redo_logs: 10000,
                eta_seconds: Some((100.0 - progress) * 0.3),
                timestamp: chrono::Utc::now().timestamp(),
            }
        })
    }

    /// Subscribe to parallel query events
    ///
    /// Receives updates about parallel queries executing across instances
    async fn parallel_query_events<'ctx>(
        &self,
        _ctx: &Context<'ctx>,
        query_id: Option<ID>,
    ) -> impl Stream<Item = ParallelQueryEvent> + 'ctx {
        let interval = tokio::time::interval(Duration::from_secs(10));
        let stream = IntervalStream::new(interval);

        stream.map(move |_| ParallelQueryEvent {
            event_type: QueryEventType::Completed,
            query_id: query_id
                .clone()
                .unwrap_or_else(|| ID::from(uuid::Uuid::new_v4().to_string())),
            sql_text: "SELECT * FROM large_table WHERE...".to_string(),
            dop: 4,
            instances: vec![ID::from("instance-1"), ID::from("instance-2")],
            rows_processed: 1000000,
            duration_ms: 5420,
            success: true,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }
}

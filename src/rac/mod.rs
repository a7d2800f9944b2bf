// # Real Application Clusters (RAC) Engine
//
// Oracle RAC-like clustering technology for RustyDB, providing shared-disk clustering
// with Cache Fusion technology for high availability and horizontal scalability.
//
// ## Overview
//
// The RAC engine enables multiple database instances to run on different servers while
// accessing the same shared storage. This provides:
//
// - **High Availability**: Automatic failover if an instance fails
// - **Horizontal Scalability**: Add instances to increase capacity
// - **Load Distribution**: Distribute workload across multiple instances
// - **Zero Downtime**: Rolling upgrades and maintenance
//
// ## Architecture
//
// The RAC implementation consists of several integrated components:
//
// ### Cache Fusion
//
// Direct memory-to-memory block transfers between instances without disk I/O:
// - Global Cache Service (GCS) for block management
// - Global Enqueue Service (GES) for distributed locking
// - RDMA-like zero-copy transfers
// - Read-read, read-write, write-write consistency protocols
//
// ### Global Resource Directory (GRD)
//
// Distributed resource ownership and mastering:
// - Resource master tracking
// - Affinity-based placement
// - Dynamic remastering
// - Load balancing
//
// ### Cluster Interconnect
//
// High-speed communication between cluster nodes:
// - Low-latency message passing
// - Heartbeat monitoring
// - Split-brain detection
// - Network partition handling
//
// ### Instance Recovery
//
// Automatic recovery from instance failures:
// - Failure detection
// - Redo log recovery
// - Lock reconfiguration
// - Resource remastering
//
// ### Parallel Query Coordination
//
// Cross-instance parallel query execution:
// - Work distribution
// - Data flow operators
// - Result aggregation
// - Adaptive parallelism
//
// ## Usage Example
//
// ```rust,no_run
// use rusty_db::rac::{RacCluster, RacConfig, ClusterNode};
// use rusty_db::Result;
//
// # async fn example() -> std::result::Result<(), rusty_db::error::DbError> {
// // Create a 3-node RAC cluster
// let config = RacConfig::default();
//
// let cluster = RacCluster::new("rac_cluster", config).await?;
//
// // Add nodes to the cluster
// cluster.add_node(ClusterNode {
//     node_id: "node1".to_string(),
//     address: "192.168.1.101:5000".to_string(),
//     ..Default::default()
// }).await?;
//
// cluster.add_node(ClusterNode {
//     node_id: "node2".to_string(),
//     address: "192.168.1.102:5000".to_string(),
//     ..Default::default()
// }).await?;
//
// // Start the cluster
// cluster.start().await?;
//
// // Execute a parallel query across instances
// let results = cluster.execute_parallel_query(
//     "SELECT * FROM large_table WHERE condition = true",
//     4  // degree of parallelism
// ).await?;
//
// # Ok(())
// # }
// ```

pub mod cache_fusion;
pub mod grd;
pub mod interconnect;
pub mod parallel_query;
pub mod recovery;

use crate::common::{NodeId, Tuple};
use crate::error::DbError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Re-export key types for convenience
pub use cache_fusion::{
    BlockMode, CacheFusionCoordinator, GcsConfig, GcsStatistics, GlobalCacheService,
    GlobalEnqueueService, LockType, ResourceId,
};

pub use grd::{
    AccessStatistics, AffinityScore, ClusterTopology, GlobalResourceDirectory, GrdConfig,
    GrdStatistics, ResourceEntry,
};

pub use interconnect::{
    ClusterInterconnect, ClusterView, InterconnectConfig, InterconnectStatistics, MessagePriority,
    MessageType, NodeState,
};

pub use recovery::{
    FailureReason, InstanceFailure, InstanceRecoveryManager, RecoveryConfig, RecoveryPhase,
    RecoveryState, RecoveryStatistics,
};

pub use parallel_query::{
    ExecutionStatus, ParallelQueryConfig, ParallelQueryCoordinator, ParallelQueryPlan,
    ParallelQueryStatistics, QueryFragment,
};

// ============================================================================
// Cluster Configuration
// ============================================================================

// RAC cluster configuration
#[derive(Debug, Clone)]
pub struct RacConfig {
    // Cluster name
    pub cluster_name: String,

    // Listen address for interconnect (e.g., "0.0.0.0:5000")
    pub listen_address: String,

    // Cache Fusion configuration
    pub cache_fusion: GcsConfig,

    // Global Resource Directory configuration
    pub grd: GrdConfig,

    // Interconnect configuration
    pub interconnect: InterconnectConfig,

    // Recovery configuration
    pub recovery: RecoveryConfig,

    // Parallel query configuration
    pub parallel_query: ParallelQueryConfig,

    // Enable automatic load balancing
    pub auto_load_balance: bool,

    // Load balance interval
    pub load_balance_interval: Duration,

    // Enable service placement optimization
    pub service_placement: bool,

    // Enable connection load balancing
    pub connection_load_balancing: bool,

    // Quorum requirement (0.0-1.0)
    pub quorum_percentage: f64,
}

impl Default for RacConfig {
    fn default() -> Self {
        Self {
            cluster_name: "rustydb_cluster".to_string(),
            // Listen address is configurable - users can override this via RacConfig
            // Default listens on all interfaces, port 5000
            // Production deployments should specify explicit IP addresses for security
            listen_address: Self::default_listen_address(),
            cache_fusion: GcsConfig::default(),
            grd: GrdConfig::default(),
            interconnect: InterconnectConfig::default(),
            recovery: RecoveryConfig::default(),
            parallel_query: ParallelQueryConfig::default(),
            auto_load_balance: true,
            load_balance_interval: Duration::from_secs(300),
            service_placement: true,
            connection_load_balancing: true,
            quorum_percentage: 0.5,
        }
    }
}

impl RacConfig {
    // Get default listen address from environment or use hardcoded fallback
    fn default_listen_address() -> String {
        // Check environment variable first for configurability
        std::env::var("RUSTYDB_RAC_LISTEN_ADDRESS")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
    }

    // Builder pattern for easy configuration
    pub fn with_listen_address(mut self, address: String) -> Self {
        self.listen_address = address;
        self
    }

    // Convenience method to set listen address from host and port
    pub fn with_host_port(mut self, host: &str, port: u16) -> Self {
        self.listen_address = format!("{}:{}", host, port);
        self
    }
}

// ============================================================================
// Cluster Node
// ============================================================================

// Cluster node information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNode {
    // Node identifier
    pub node_id: NodeId,

    // Network address
    pub address: String,

    // Node role
    pub role: NodeRole,

    // Node capacity
    pub capacity: NodeCapacity,

    // Active services
    pub services: Vec<String>,

    // Node priority (for failover)
    pub priority: u8,
}

impl Default for ClusterNode {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            address: String::new(),
            role: NodeRole::Standard,
            capacity: NodeCapacity::default(),
            services: Vec::new(),
            priority: 100,
        }
    }
}

// Node role in cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    // Standard database instance
    Standard,

    // Coordinator node (for administrative tasks)
    Coordinator,

    // Witness node (for quorum only)
    Witness,

    // Read-only instance
    ReadOnly,
}

// Node capacity information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCapacity {
    // CPU cores
    pub cpu_cores: usize,

    // Total memory (GB)
    pub total_memory_gb: usize,

    // Available memory (GB)
    pub available_memory_gb: usize,

    // Storage capacity (GB)
    pub storage_capacity_gb: usize,

    // Network bandwidth (Mbps)
    pub network_bandwidth_mbps: usize,
}

impl Default for NodeCapacity {
    fn default() -> Self {
        Self {
            cpu_cores: 8,
            total_memory_gb: 32,
            available_memory_gb: 16,
            storage_capacity_gb: 1000,
            network_bandwidth_mbps: 10000,
        }
    }
}

// ============================================================================
// RAC Cluster Manager
// ============================================================================

// RAC cluster manager - main entry point for RAC functionality
pub struct RacCluster {
    // Cluster name
    _cluster_name: String,

    // Local node identifier
    _node_id: NodeId,

    // Cluster nodes
    nodes: Arc<RwLock<HashMap<NodeId, ClusterNode>>>,

    // Cache Fusion coordinator
    cache_fusion: Arc<CacheFusionCoordinator>,

    // Global Resource Directory
    grd: Arc<GlobalResourceDirectory>,

    // Cluster interconnect
    interconnect: Arc<ClusterInterconnect>,

    // Instance recovery manager
    recovery: Arc<InstanceRecoveryManager>,

    // Parallel query coordinator
    parallel_query: Arc<ParallelQueryCoordinator>,

    // Configuration
    config: RacConfig,

    // Cluster state
    state: Arc<RwLock<ClusterState>>,

    // Statistics
    stats: Arc<RwLock<ClusterStatistics>>,
}

// Cluster state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    // Cluster is initializing
    Initializing,

    // Cluster is forming (nodes joining)
    Forming,

    // Cluster is operational
    Operational,

    // Cluster is degraded (some nodes down)
    Degraded,

    // Cluster is in recovery
    Recovering,

    // Cluster is shutting down
    ShuttingDown,

    // Cluster is stopped
    Stopped,
}

// Cluster-wide statistics
#[derive(Debug, Default, Clone)]
pub struct ClusterStatistics {
    // Total nodes
    pub total_nodes: usize,

    // Active nodes
    pub active_nodes: usize,

    // Failed nodes
    pub failed_nodes: usize,

    // Cache Fusion statistics
    pub cache_fusion: GcsStatistics,

    // GRD statistics
    pub grd: GrdStatistics,

    // Interconnect statistics
    pub interconnect: InterconnectStatistics,

    // Recovery statistics
    pub recovery: RecoveryStatistics,

    // Parallel query statistics
    pub parallel_query: ParallelQueryStatistics,

    // Cluster uptime (seconds)
    pub uptime_seconds: u64,

    // Total transactions processed
    pub total_transactions: u64,

    // Total queries executed
    pub total_queries: u64,
}

impl RacCluster {
    // Create a new RAC cluster
    pub async fn new(cluster_name: &str, config: RacConfig) -> Result<Self, DbError> {
        let node_id = Self::generate_node_id();

        // Initialize interconnect with configurable address
        let listen_address = config.listen_address.clone();
        let interconnect = Arc::new(ClusterInterconnect::new(
            node_id.clone(),
            listen_address.clone(),
            config.interconnect.clone(),
        ));

        // Initialize GRD
        let grd = Arc::new(GlobalResourceDirectory::new(
            node_id.clone(),
            vec![node_id.clone()],
            config.grd.clone(),
        ));

        // Initialize Cache Fusion
        let cache_fusion = Arc::new(CacheFusionCoordinator::new(
            node_id.clone(),
            config.cache_fusion.clone(),
        ));

        // Initialize recovery manager
        let recovery = Arc::new(InstanceRecoveryManager::new(
            node_id.clone(),
            interconnect.clone(),
            grd.clone(),
            config.recovery.clone(),
        ));

        // Initialize parallel query coordinator
        let parallel_query = Arc::new(ParallelQueryCoordinator::new(
            node_id.clone(),
            interconnect.clone(),
            config.parallel_query.clone(),
        ));

        // Initialize nodes map
        let mut nodes = HashMap::new();
        nodes.insert(
            node_id.clone(),
            ClusterNode {
                node_id: node_id.clone(),
                address: listen_address.clone(),
                role: NodeRole::Coordinator,
                capacity: NodeCapacity::default(),
                services: vec!["database".to_string()],
                priority: 100,
            },
        );

        Ok(Self {
            _cluster_name: cluster_name.to_string(),
            _node_id: node_id,
            nodes: Arc::new(RwLock::new(nodes)),
            cache_fusion,
            grd,
            interconnect,
            recovery,
            parallel_query,
            config,
            state: Arc::new(RwLock::new(ClusterState::Initializing)),
            stats: Arc::new(RwLock::new(ClusterStatistics::default())),
        })
    }

    // Start the RAC cluster
    pub async fn start(&self) -> Result<(), DbError> {
        *self.state.write() = ClusterState::Forming;

        // Start interconnect
        self.interconnect.start().await?;

        // Start recovery manager
        self.recovery.start().await?;

        // Start load balancing if enabled
        if self.config.auto_load_balance {
            self.start_load_balancer().await;
        }

        *self.state.write() = ClusterState::Operational;

        Ok(())
    }

    // Stop the RAC cluster
    pub async fn stop(&self) -> Result<(), DbError> {
        *self.state.write() = ClusterState::ShuttingDown;

        // Stop interconnect
        self.interconnect.stop().await?;

        *self.state.write() = ClusterState::Stopped;

        Ok(())
    }

    // Add a node to the cluster
    pub async fn add_node(&self, node: ClusterNode) -> Result<(), DbError> {
        // Add to interconnect
        self.interconnect
            .add_node(node.node_id.clone(), node.address.clone())
            .await?;

        // Add to GRD
        self.grd.add_member(node.node_id.clone())?;

        // Add to nodes map
        self.nodes.write().insert(node.node_id.clone(), node);

        // Update statistics
        let mut stats = self.stats.write();
        stats.total_nodes += 1;
        stats.active_nodes += 1;

        Ok(())
    }

    // Remove a node from the cluster
    pub async fn remove_node(&self, node_id: &NodeId) -> Result<(), DbError> {
        // Remove from interconnect
        self.interconnect.remove_node(node_id).await?;

        // Remove from GRD
        self.grd.remove_member(node_id)?;

        // Remove from nodes map
        self.nodes.write().remove(node_id);

        // Update statistics
        let mut stats = self.stats.write();
        stats.active_nodes = stats.active_nodes.saturating_sub(1);
        stats.failed_nodes += 1;

        Ok(())
    }

    // Execute a parallel query across the cluster
    pub async fn execute_parallel_query(
        &self,
        sql: &str,
        degree_of_parallelism: usize,
    ) -> Result<Vec<Tuple>, DbError> {
        // Create a simple query plan
        let plan = ParallelQueryPlan {
            query_id: Self::generate_query_id(),
            sql_text: sql.to_string(),
            fragments: vec![],
            data_flow: parallel_query::DataFlowGraph {
                operators: vec![],
                edges: vec![],
            },
            dop: degree_of_parallelism,
            instance_assignment: HashMap::new(),
            estimated_cost: 0.0,
        };

        // Execute the query
        self.parallel_query.execute_query(plan).await
    }

    // Get cluster topology
    pub fn get_topology(&self) -> ClusterTopology {
        self.grd.get_topology()
    }

    // Get cluster view
    pub fn get_cluster_view(&self) -> ClusterView {
        self.interconnect.get_cluster_view()
    }

    // Get cluster state
    pub fn get_state(&self) -> ClusterState {
        *self.state.read()
    }

    // Get cluster statistics
    pub fn get_statistics(&self) -> ClusterStatistics {
        let mut stats = self.stats.read().clone();

        // Update component statistics
        stats.cache_fusion = self.cache_fusion.get_statistics().gcs;
        stats.grd = self.grd.get_statistics();
        stats.interconnect = self.interconnect.get_statistics();
        stats.recovery = self.recovery.get_statistics();
        stats.parallel_query = self.parallel_query.get_statistics();

        // Update node counts
        let view = self.interconnect.get_cluster_view();
        stats.active_nodes = view.healthy_nodes.len() + 1; // +1 for local node
        stats.total_nodes = view.total_nodes;

        stats
    }

    // Check cluster health
    pub fn check_health(&self) -> ClusterHealth {
        let view = self.get_cluster_view();
        let state = self.get_state();

        ClusterHealth {
            state,
            has_quorum: view.has_quorum,
            healthy_nodes: view.healthy_nodes.len() + 1,
            total_nodes: view.total_nodes,
            suspected_nodes: view.suspected_nodes.len(),
            down_nodes: view.down_nodes.len(),
            active_recoveries: self.recovery.get_active_recoveries().len(),
            is_healthy: state == ClusterState::Operational && view.has_quorum,
        }
    }

    // Start automatic load balancer
    async fn start_load_balancer(&self) {
        let grd = self.grd.clone();
        let interval = self.config.load_balance_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                // Perform load balancing
                let _ = grd.load_balance();

                // Decay affinity scores
                grd.decay_affinity();
            }
        });
    }

    // Generate a unique node ID
    fn generate_node_id() -> NodeId {
        use std::time::SystemTime;

        let timestamp = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_micros();

        format!("node_{}", timestamp)
    }

    // Generate a unique query ID
    fn generate_query_id() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    // Get node information
    pub fn get_node(&self, node_id: &NodeId) -> Option<ClusterNode> {
        self.nodes.read().get(node_id).cloned()
    }

    // Get all nodes
    pub fn get_all_nodes(&self) -> Vec<ClusterNode> {
        self.nodes.read().values().cloned().collect()
    }

    // Perform graceful failover from one node to another
    pub async fn failover(&self, from_node: NodeId, _to_node: NodeId) -> Result<(), DbError> {
        // Initiate recovery for the failing node
        self.recovery
            .initiate_recovery(from_node.clone(), FailureReason::AdminShutdown)
            .await?;

        // Wait for recovery to complete
        // In production, would poll recovery state
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Update cluster state
        if self.get_cluster_view().down_nodes.len() > 0 {
            *self.state.write() = ClusterState::Degraded;
        }

        Ok(())
    }

    // Rebalance resources across cluster
    pub async fn rebalance(&self) -> Result<(), DbError> {
        self.grd.load_balance()?;
        Ok(())
    }
}

// Cluster health information
#[derive(Debug, Clone)]
pub struct ClusterHealth {
    // Current cluster state
    pub state: ClusterState,

    // Whether cluster has quorum
    pub has_quorum: bool,

    // Number of healthy nodes
    pub healthy_nodes: usize,

    // Total nodes in cluster
    pub total_nodes: usize,

    // Number of suspected nodes
    pub suspected_nodes: usize,

    // Number of down nodes
    pub down_nodes: usize,

    // Number of active recoveries
    pub active_recoveries: usize,

    // Overall health status
    pub is_healthy: bool,
}

// ============================================================================
// Service Placement
// ============================================================================

// Service placement for workload distribution
pub struct ServicePlacement {
    // Service name
    pub service_name: String,

    // Preferred instances
    pub preferred_instances: Vec<NodeId>,

    // Available instances
    pub available_instances: Vec<NodeId>,

    // Placement policy
    pub policy: PlacementPolicy,
}

// Placement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPolicy {
    // Prefer local instance
    PreferLocal,

    // Round-robin across instances
    RoundRobin,

    // Least loaded instance
    LeastLoaded,

    // Affinity-based placement
    AffinityBased,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rac_cluster_creation() {
        let config = RacConfig::default();
        let cluster = RacCluster::new("test_cluster", config).await;

        assert!(cluster.is_ok());
    }

    #[tokio::test]
    async fn test_cluster_state_transitions() {
        let config = RacConfig::default();
        let cluster = RacCluster::new("test_cluster", config).await.unwrap();

        assert_eq!(cluster.get_state(), ClusterState::Initializing);

        cluster.start().await.unwrap();
        assert_eq!(cluster.get_state(), ClusterState::Operational);
    }

    #[test]
    fn test_node_roles() {
        let node = ClusterNode {
            role: NodeRole::Coordinator,
            ..Default::default()
        };

        assert_eq!(node.role, NodeRole::Coordinator);
    }
}

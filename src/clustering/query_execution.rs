/// Distributed Query Execution
///
/// This module provides distributed query processing across cluster nodes:
/// - Query routing to appropriate shards
/// - Parallel execution coordination 
/// - Result aggregation and merging
/// - Cross-shard join strategies

use std::fmt;
use crate::error::DbError;
use crate::clustering::node::{NodeId, NodeInfo};
use std::collections::HashMap;
use std::sync::Arc;
use serde::{Deserialize, Serialize};

/// Trait for distributed query execution
pub trait DistributedQueryProcessor {
    fn execute_query(&self, query: &str) -> Result<DistributedQueryResult, DbError>;
    fn create_execution_plan(&self, query: &str) -> Result<ExecutionPlan, DbError>;
    fn execute_shard(&self, plan: &ShardPlan) -> Result<ShardResult, DbError>;
}

/// Distributed query executor
pub struct DistributedQueryExecutor {
    coordinator: Arc<dyn QueryCoordinator>,
    router: QueryRouter,
}

impl std::fmt::Debug for DistributedQueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedQueryExecutor")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl DistributedQueryExecutor {
    pub fn new(coordinator: Arc<dyn QueryCoordinator>) -> Self {
        Self {
            coordinator,
            router: QueryRouter::new(),
        }
    }
}

impl DistributedQueryProcessor for DistributedQueryExecutor {
    fn execute_query(&self, query: &str) -> Result<DistributedQueryResult, DbError> {
        let plan = self.create_execution_plan(query)?;
        let mut results = HashMap::new();
        
        for shard_plan in plan.shards {
            let result = self.execute_shard(&shard_plan)?;
            results.insert(shard_plan.node_id.clone(), result);
        }
        
        Ok(DistributedQueryResult {
            query: query.to_string(),
            execution_time_ms: 0,
            total_rows: results.values().map(|r| r.row_count).sum(),
            results: results.into_values().collect(),
        })
    }

    fn create_execution_plan(&self, _query: &str) -> Result<ExecutionPlan, DbError> {
        // Simplified implementation
        let nodes = self.coordinator.get_healthy_nodes()?;
        let shards = nodes.into_iter().enumerate().map(|(i, node)| {
            ShardPlan {
                shard_id: i,
                node_id: node.id,
                query_fragment: format!("SELECT * FROM table_{}", i),
                estimated_rows: 1000,
            }
        }).collect());

        Ok(ExecutionPlan {
            query_id: uuid::Uuid::new_v4().to_string(),
            strategy: ExecutionStrategy::Scatter,
            shards,
        })
    }

    fn execute_shard(&self, _plan: &ShardPlan) -> Result<ShardResult, DbError> {
        // Simplified implementation
        Ok(ShardResult {
            shard_id: _plan.shard_id,
            success: true,
            row_count: _plan.estimated_rows,
            execution_time_ms: 100,
            error: None,
        })
    }
}

/// Query router for determining execution strategy
#[derive(Debug)]
pub struct QueryRouter {
    strategies: HashMap<QueryType, ExecutionStrategy>,
}

impl QueryRouter {
    pub fn new() -> Self {
        let mut strategies = HashMap::new();
        strategies.insert(QueryType::Select, ExecutionStrategy::Scatter);
        strategies.insert(QueryType::Join, ExecutionStrategy::Broadcast);
        strategies.insert(QueryType::Aggregate, ExecutionStrategy::MapReduce);
        
        Self { strategies }
    }

    pub fn determine_strategy(&self, query_type: QueryType) -> ExecutionStrategy {
        self.strategies.get(&query_type)
            .copied()
            .unwrap_or(ExecutionStrategy::Scatter)
    }
}

/// Execution plan for distributed queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub query_id: String,
    pub strategy: ExecutionStrategy,
    pub shards: Vec<ShardPlan>,
}

/// Plan for executing on a specific shard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardPlan {
    pub shard_id: usize,
    pub node_id: NodeId,
    pub query_fragment: String,
    pub estimated_rows: usize,
}

/// Result from executing a shard plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardResult {
    pub shard_id: usize,
    pub success: bool,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub error: Option<String>,
}

/// Complete distributed query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedQueryResult {
    pub query: String,
    pub execution_time_ms: u64,
    pub total_rows: usize,
    pub results: Vec<ShardResult>,
}

/// Query execution strategies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    Scatter,    // Send query to all nodes
    Broadcast,  // Broadcast small table, join with large
    MapReduce,  // Map-reduce style processing
    CoLocated,  // Data is already co-located
}

/// Query types for routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Join,
    Aggregate,
    Insert,
    Update,
    Delete,
}

/// Trait for query coordination
pub trait QueryCoordinator {
    fn get_healthy_nodes(&self) -> Result<Vec<NodeInfo>, DbError>;
    fn route_query(&self, query: &str) -> Result<Vec<NodeId>, DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockCoordinator {
        nodes: Vec<NodeInfo>,
    }

    impl QueryCoordinator for MockCoordinator {
        fn get_healthy_nodes(&self) -> Result<Vec<NodeInfo>, DbError> {
            Ok(self.nodes.clone())
        }

        fn route_query(&self, _query: &str) -> Result<Vec<NodeId>, DbError> {
            Ok(self.nodes.iter().map(|n| n.id.clone()).collect())
        }
    }

    #[test]
    fn test_distributed_query_executor() {
        let nodes = vec![
            NodeInfo::new(NodeId("node1".to_string()), "127.0.0.1".to_string(), 5432),
            NodeInfo::new(NodeId("node2".to_string()), "127.0.0.2".to_string(), 5432),
        ];
        
        let coordinator = Arc::new(MockCoordinator { nodes });
        let executor = DistributedQueryExecutor::new(coordinator);
        
        let result = executor.execute_query("SELECT * FROM test");
        assert!(result.is_ok());
        
        let query_result = result.unwrap();
        assert_eq!(query_result.results.len(), 2);
        assert_eq!(query_result.total_rows, 2000);
    }

    #[test]
    fn test_query_router() {
        let router = QueryRouter::new();
        
        assert!(matches!(
            router.determine_strategy(QueryType::Select),
            ExecutionStrategy::Scatter
        ));
        
        assert!(matches!(
            router.determine_strategy(QueryType::Join),
            ExecutionStrategy::Broadcast
        ));
    }
}

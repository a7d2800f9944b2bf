// GraphQL DDL/Schema Subscriptions
//
// Real-time subscriptions for schema and DDL operations including:
// - Schema changes (CREATE, ALTER, DROP)
// - Partition operations
// - Index creation/rebuilding
// - Table modifications

use async_graphql::{Enum, Object, Subscription, ID};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::types::DateTime;

// ============================================================================
// Schema Change Event Types
// ============================================================================

/// Schema change event for DDL operations
#[derive(Clone, Debug)]
pub struct SchemaChangeEvent {
    pub change_id: ID,
    pub operation_type: DdlOperationType,
    pub object_type: SchemaObjectType,
    pub object_name: String,
    pub schema_name: Option<String>,
    pub sql_text: Option<String>,
    pub user_id: String,
    pub session_id: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub affected_objects: Vec<String>,
    pub timestamp: DateTime,
}

#[Object]
impl SchemaChangeEvent {
    async fn change_id(&self) -> &ID {
        &self.change_id
    }

    async fn operation_type(&self) -> DdlOperationType {
        self.operation_type
    }

    async fn object_type(&self) -> SchemaObjectType {
        self.object_type
    }

    async fn object_name(&self) -> &str {
        &self.object_name
    }

    async fn schema_name(&self) -> &Option<String> {
        &self.schema_name
    }

    async fn sql_text(&self) -> &Option<String> {
        &self.sql_text
    }

    async fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn session_id(&self) -> &Option<String> {
        &self.session_id
    }

    async fn success(&self) -> bool {
        self.success
    }

    async fn error_message(&self) -> &Option<String> {
        &self.error_message
    }

    async fn execution_time_ms(&self) -> i64 {
        self.execution_time_ms
    }

    async fn affected_objects(&self) -> &[String] {
        &self.affected_objects
    }

    async fn timestamp(&self) -> &DateTime {
        &self.timestamp
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum DdlOperationType {
    Create,
    Alter,
    Drop,
    Rename,
    Truncate,
    Comment,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum SchemaObjectType {
    Table,
    Index,
    View,
    Sequence,
    Trigger,
    Procedure,
    Function,
    Schema,
    Tablespace,
    User,
    Role,
    Constraint,
    Partition,
}

/// Partition operation event
#[derive(Clone, Debug)]
pub struct PartitionOperationEvent {
    pub event_id: ID,
    pub operation: PartitionOperation,
    pub table_name: String,
    pub partition_name: String,
    pub partition_type: PartitionType,
    pub status: PartitionOperationStatus,
    pub progress_percent: Option<f64>,
    pub rows_affected: Option<i64>,
    pub partition_bounds: Option<String>,
    pub parent_partition: Option<String>,
    pub subpartitions: Vec<String>,
    pub storage_used_bytes: Option<i64>,
    pub error_message: Option<String>,
    pub timestamp: DateTime,
}

#[Object]
impl PartitionOperationEvent {
    async fn event_id(&self) -> &ID {
        &self.event_id
    }

    async fn operation(&self) -> PartitionOperation {
        self.operation
    }

    async fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn partition_name(&self) -> &str {
        &self.partition_name
    }

    async fn partition_type(&self) -> PartitionType {
        self.partition_type
    }

    async fn status(&self) -> PartitionOperationStatus {
        self.status
    }

    async fn progress_percent(&self) -> Option<f64> {
        self.progress_percent
    }

    async fn rows_affected(&self) -> Option<i64> {
        self.rows_affected
    }

    async fn partition_bounds(&self) -> &Option<String> {
        &self.partition_bounds
    }

    async fn parent_partition(&self) -> &Option<String> {
        &self.parent_partition
    }

    async fn subpartitions(&self) -> &[String] {
        &self.subpartitions
    }

    async fn storage_used_bytes(&self) -> Option<i64> {
        self.storage_used_bytes
    }

    async fn error_message(&self) -> &Option<String> {
        &self.error_message
    }

    async fn timestamp(&self) -> &DateTime {
        &self.timestamp
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PartitionOperation {
    Add,
    Drop,
    Merge,
    Split,
    Truncate,
    Exchange,
    Move,
    Rebuild,
    Compress,
    Decompress,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PartitionType {
    Range,
    List,
    Hash,
    Composite,
    RangeHash,
    RangeList,
    ListHash,
    ListList,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PartitionOperationStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

// ============================================================================
// DDL Subscription Root
// ============================================================================

/// DDL and Schema subscription operations
pub struct DdlSubscriptionRoot;

#[Subscription]
impl DdlSubscriptionRoot {
    /// Subscribe to schema changes (DDL operations)
    ///
    /// Receives real-time notifications when DDL operations are executed
    /// including CREATE, ALTER, DROP operations on database objects.
    ///
    /// # Arguments
    /// * `object_types` - Optional filter for specific object types
    /// * `operation_types` - Optional filter for specific operations
    /// * `schema_name` - Optional filter for specific schema
    async fn schema_changes<'ctx>(
        &self,
        object_types: Option<Vec<SchemaObjectType>>,
        operation_types: Option<Vec<DdlOperationType>>,
        schema_name: Option<String>,
    ) -> impl Stream<Item = SchemaChangeEvent> + 'ctx {
        let (tx, rx) = broadcast::channel(1000);

        // Spawn background task to generate sample events
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(10));
            let ddl_ops = vec![
                DdlOperationType::Create,
                DdlOperationType::Alter,
                DdlOperationType::Drop,
            ];
            let obj_types = vec![
                SchemaObjectType::Table,
                SchemaObjectType::Index,
                SchemaObjectType::View,
            ];
            let mut counter = 0;

            loop {
                interval.tick().await;
                counter += 1;

                let op_type = ddl_ops[counter % ddl_ops.len()];
                let obj_type = obj_types[counter % obj_types.len()];

                let event = SchemaChangeEvent {
                    change_id: ID::from(format!("ddl_{}", uuid::Uuid::new_v4())),
                    operation_type: op_type,
                    object_type: obj_type,
                    object_name: format!("object_{}", counter),
                    schema_name: Some("public".to_string()),
                    sql_text: Some(format!("{:?} {:?} object_{}", op_type, obj_type, counter)),
                    user_id: "admin".to_string(),
                    session_id: Some(format!("session_{}", counter % 10)),
                    success: true,
                    error_message: None,
                    execution_time_ms: 125,
                    affected_objects: vec![format!("object_{}", counter)],
                    timestamp: DateTime::now(),
                };

                let _ = tx.send(event);
            }
        });

        // Apply filters
        let object_types = object_types.clone();
        let operation_types = operation_types.clone();
        let schema_name = schema_name.clone();

        BroadcastStream::new(rx).filter_map(move |result| {
            let object_types = object_types.clone();
            let operation_types = operation_types.clone();
            let schema_name = schema_name.clone();

            async move {
                result.ok().and_then(|event| {
                    // Filter by object type
                    if let Some(ref types) = object_types {
                        if !types.contains(&event.object_type) {
                            return None;
                        }
                    }

                    // Filter by operation type
                    if let Some(ref ops) = operation_types {
                        if !ops.contains(&event.operation_type) {
                            return None;
                        }
                    }

                    // Filter by schema name
                    if let Some(ref schema) = schema_name {
                        if event.schema_name.as_ref() != Some(schema) {
                            return None;
                        }
                    }

                    Some(event)
                })
            }
        })
    }

    /// Subscribe to partition operation events
    ///
    /// Receives real-time updates about partition operations including
    /// add, drop, merge, split, and maintenance operations.
    ///
    /// # Arguments
    /// * `table_name` - Optional filter for specific table
    /// * `operations` - Optional filter for specific operations
    async fn partition_events<'ctx>(
        &self,
        table_name: Option<String>,
        operations: Option<Vec<PartitionOperation>>,
    ) -> impl Stream<Item = PartitionOperationEvent> + 'ctx {
        let (tx, rx) = broadcast::channel(1000);

        // Spawn background task to generate sample events
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(15));
            let partition_ops = vec![
                PartitionOperation::Add,
                PartitionOperation::Drop,
                PartitionOperation::Merge,
                PartitionOperation::Split,
            ];
            let mut counter = 0;

            loop {
                interval.tick().await;
                counter += 1;

                let operation = partition_ops[counter % partition_ops.len()];

                let event = PartitionOperationEvent {
                    event_id: ID::from(format!("part_{}", uuid::Uuid::new_v4())),
                    operation,
                    table_name: "sales_data".to_string(),
                    partition_name: format!("p_202501_{}", counter % 12 + 1),
                    partition_type: PartitionType::Range,
                    status: PartitionOperationStatus::Completed,
                    progress_percent: Some(100.0),
                    rows_affected: Some(1000000 + (counter * 50000) as i64),
                    partition_bounds: Some(format!("VALUES LESS THAN ({})", counter)),
                    parent_partition: None,
                    subpartitions: vec![],
                    storage_used_bytes: Some(524288000),
                    error_message: None,
                    timestamp: DateTime::now(),
                };

                let _ = tx.send(event);
            }
        });

        // Apply filters
        let table_name = table_name.clone();
        let operations = operations.clone();

        BroadcastStream::new(rx).filter_map(move |result| {
            let table_name = table_name.clone();
            let operations = operations.clone();

            async move {
                result.ok().and_then(|event| {
                    // Filter by table name
                    if let Some(ref table) = table_name {
                        if &event.table_name != table {
                            return None;
                        }
                    }

                    // Filter by operations
                    if let Some(ref ops) = operations {
                        if !ops.contains(&event.operation) {
                            return None;
                        }
                    }

                    Some(event)
                })
            }
        })
    }
}

// ============================================================================
// Sample Event Generators
// ============================================================================

#[allow(dead_code)]
#[allow(dead_code)]
fn create_sample_schema_change() -> SchemaChangeEvent {
    SchemaChangeEvent {
        change_id: ID::from(format!("ddl_{}", uuid::Uuid::new_v4())),
        operation_type: DdlOperationType::Create,
        object_type: SchemaObjectType::Table,
        object_name: "new_table".to_string(),
        schema_name: Some("public".to_string()),
        sql_text: Some("CREATE TABLE new_table (id INT PRIMARY KEY, name VARCHAR(100))".to_string()),
        user_id: "admin".to_string(),
        session_id: Some("session_abc123".to_string()),
        success: true,
        error_message: None,
        execution_time_ms: 245,
        affected_objects: vec!["new_table".to_string()],
        timestamp: DateTime::now(),
    }
}

#[allow(dead_code)]
#[allow(dead_code)]
fn create_sample_partition_event() -> PartitionOperationEvent {
    PartitionOperationEvent {
        event_id: ID::from(format!("part_{}", uuid::Uuid::new_v4())),
        operation: PartitionOperation::Add,
        table_name: "orders".to_string(),
        partition_name: "p_2025_01".to_string(),
        partition_type: PartitionType::Range,
        status: PartitionOperationStatus::Completed,
        progress_percent: Some(100.0),
        rows_affected: Some(1500000),
        partition_bounds: Some("VALUES LESS THAN ('2025-02-01')".to_string()),
        parent_partition: None,
        subpartitions: vec![],
        storage_used_bytes: Some(786432000),
        error_message: None,
        timestamp: DateTime::now(),
    }
}

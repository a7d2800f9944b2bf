// # REST API Handlers
//
// Handler functions for all REST API endpoints.
// Each handler implements proper error handling and uses dependency injection.

use axum::{
    extract::{Path, Query, State},
    response::{Json as AxumJson},
    http::StatusCode,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::DbError;
use super::types::*;

/// Execute a SQL query
#[utoipa::path(
    post,
    path = "/api/v1/query",
    tag = "database",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query executed successfully", body = QueryResponse),
        (status = 400, description = "Invalid query", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn execute_query(
    State(state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<QueryRequest>,
) -> ApiResult<AxumJson<QueryResponse>> {
    let query_id = Uuid::new_v4();
    let start = SystemTime::now();

    // Validate SQL
    if request.sql.trim().is_empty() {
        return Err(ApiError::new("INVALID_INPUT", "SQL query cannot be empty"));
    }

    // Record query execution
    {
        let mut queries = state.active_queries.write().await;
        queries.insert(query_id, QueryExecution {
            query_id,
            sql: request.sql.clone(),
            started_at: start,
            session_id: SessionId(1), // TODO: Get from context
            status: "running".to_string(),
        });
    }

    // TODO: Execute query against actual database engine
    // For now, return mock response

    let execution_time = start.elapsed().unwrap_or_default().as_millis() as u64;

    // Clean up query tracking
    {
        let mut queries = state.active_queries.write().await;
        queries.remove(&query_id);
    }

    let response = QueryResponse {
        query_id: query_id.to_string(),
        rows: vec![],
        columns: vec![
            ColumnMetadata {
                name: "id".to_string(),
                data_type: "INTEGER".to_string(),
                nullable: false,
                precision: None,
                scale: None,
            },
        ],
        row_count: 0,
        affected_rows: None,
        execution_time_ms: execution_time,
        plan: if request.explain.unwrap_or(false) {
            Some("Sequential Scan on table".to_string())
        } else {
            None
        },
        warnings: vec![],
        has_more: false,
    };

    Ok(AxumJson(response))
}

/// Execute batch operations
#[utoipa::path(
    post,
    path = "/api/v1/batch",
    tag = "database",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Batch executed", body = BatchResponse),
        (status = 400, description = "Invalid batch", body = ApiError),
    )
)]
pub async fn execute_batch(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<BatchRequest>,
) -> ApiResult<AxumJson<BatchResponse>> {
    let batch_id = Uuid::new_v4();
    let start = SystemTime::now();

    if request.statements.is_empty() {
        return Err(ApiError::new("INVALID_INPUT", "Batch must contain at least one statement"));
    }

    let mut results = Vec::new();
    let mut success_count = 0;
    let mut failure_count = 0;

    for (index, statement) in request.statements.iter().enumerate() {
        let stmt_start = SystemTime::now();

        // TODO: Execute actual statement
        let success = !statement.is_empty();

        if success {
            success_count += 1;
        } else {
            failure_count += 1;

            if request.stop_on_error {
                break;
            }
        }

        results.push(BatchStatementResult {
            statement_index: index,
            success,
            affected_rows: Some(0),
            error: if !success { Some("Execution failed".to_string()) } else { None },
            execution_time_ms: stmt_start.elapsed().unwrap_or_default().as_millis() as u64,
        });
    }

    let total_time = start.elapsed().unwrap_or_default().as_millis() as u64;

    let response = BatchResponse {
        batch_id: batch_id.to_string(),
        results,
        total_time_ms: total_time,
        success_count,
        failure_count,
    };

    Ok(AxumJson(response))
}

/// Get table information
#[utoipa::path(
    get,
    path = "/api/v1/tables/{name}",
    tag = "database",
    params(
        ("name" = String, Path, description = "Table name")
    ),
    responses(
        (status = 200, description = "Table info", body = TableInfo),
        (status = 404, description = "Table not found", body = ApiError),
    )
)]
pub async fn get_table(
    State(_state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<AxumJson<TableInfo>> {
    // TODO: Implement actual table lookup
    let table = TableInfo {
        name: name.clone(),
        schema: "public".to_string(),
        row_count: 0,
        size_bytes: 0,
        columns: vec![],
        indexes: vec![],
    };

    Ok(AxumJson(table))
}

/// Create a new table
#[utoipa::path(
    post,
    path = "/api/v1/tables/{name}",
    tag = "database",
    request_body = TableRequest,
    responses(
        (status = 201, description = "Table created"),
        (status = 409, description = "Table already exists", body = ApiError),
    )
)]
pub async fn create_table(
    State(_state): State<Arc<ApiState>>,
    Path(_name): Path<String>,
    AxumJson(_request): AxumJson<TableRequest>,
) -> ApiResult<StatusCode> {
    // TODO: Implement table creation
    Ok(StatusCode::CREATED)
}

/// Update table schema
#[utoipa::path(
    put,
    path = "/api/v1/tables/{name}",
    tag = "database",
    request_body = TableRequest,
    responses(
        (status = 200, description = "Table updated"),
        (status = 404, description = "Table not found", body = ApiError),
    )
)]
pub async fn update_table(
    State(_state): State<Arc<ApiState>>,
    Path(_name): Path<String>,
    AxumJson(_request): AxumJson<TableRequest>,
) -> ApiResult<StatusCode> {
    // TODO: Implement table update
    Ok(StatusCode::OK)
}

/// Delete a table
#[utoipa::path(
    delete,
    path = "/api/v1/tables/{name}",
    tag = "database",
    responses(
        (status = 204, description = "Table deleted"),
        (status = 404, description = "Table not found", body = ApiError),
    )
)]
pub async fn delete_table(
    State(_state): State<Arc<ApiState>>,
    Path(_name): Path<String>,
) -> ApiResult<StatusCode> {
    // TODO: Implement table deletion
    Ok(StatusCode::NO_CONTENT)
}

/// Get database schema
#[utoipa::path(
    get,
    path = "/api/v1/schema",
    tag = "database",
    responses(
        (status = 200, description = "Schema information", body = SchemaResponse),
    )
)]
pub async fn get_schema(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<SchemaResponse>> {
    // TODO: Implement schema introspection
    let response = SchemaResponse {
        database_name: "rustydb".to_string(),
        tables: vec![],
        views: vec![],
        procedures: vec![],
        total_count: 0,
    };

    Ok(AxumJson(response))
}

/// Begin a new transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "database",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction started", body = TransactionResponse),
    )
)]
pub async fn begin_transaction(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<TransactionRequest>,
) -> ApiResult<AxumJson<TransactionResponse>> {
    let txn_id = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_micros() as u64;

    let response = TransactionResponse {
        transaction_id: TransactionId(txn_id),
        isolation_level: request.isolation_level.unwrap_or_else(|| "READ_COMMITTED".to_string()),
        started_at: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        status: "active".to_string(),
    };

    Ok(AxumJson(response))
}

/// Commit a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/commit",
    tag = "database",
    params(
        ("id" = u64, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction committed"),
        (status = 404, description = "Transaction not found", body = ApiError),
    )
)]
pub async fn commit_transaction(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    // TODO: Implement transaction commit
    Ok(StatusCode::OK)
}

/// Rollback a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/rollback",
    tag = "database",
    params(
        ("id" = u64, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction rolled back"),
        (status = 404, description = "Transaction not found", body = ApiError),
    )
)]
pub async fn rollback_transaction(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    // TODO: Implement transaction rollback
    Ok(StatusCode::OK)
}

// ============================================================================
// Administration Handlers
// ============================================================================

/// Get database configuration
#[utoipa::path(
    get,
    path = "/api/v1/admin/config",
    tag = "admin",
    responses(
        (status = 200, description = "Configuration", body = ConfigResponse),
    )
)]
pub async fn get_config(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<ConfigResponse>> {
    let mut settings = HashMap::new();
    settings.insert("max_connections".to_string(), json!(1000));
    settings.insert("buffer_pool_size".to_string(), json!(1024));
    settings.insert("wal_enabled".to_string(), json!(true));

    let response = ConfigResponse {
        settings,
        version: "1.0.0".to_string(),
        updated_at: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
    };

    Ok(AxumJson(response))
}

/// Update database configuration
#[utoipa::path(
    put,
    path = "/api/v1/admin/config",
    tag = "admin",
    request_body = HashMap<String, serde_json::Value>,
    responses(
        (status = 200, description = "Configuration updated"),
        (status = 400, description = "Invalid configuration", body = ApiError),
    )
)]
pub async fn update_config(
    State(_state): State<Arc<ApiState>>,
    AxumJson(_settings): AxumJson<HashMap<String, serde_json::Value>>,
) -> ApiResult<StatusCode> {
    // TODO: Validate and apply configuration changes
    Ok(StatusCode::OK)
}

/// Create a backup
#[utoipa::path(
    post,
    path = "/api/v1/admin/backup",
    tag = "admin",
    request_body = BackupRequest,
    responses(
        (status = 202, description = "Backup started", body = BackupResponse),
    )
)]
pub async fn create_backup(
    State(_state): State<Arc<ApiState>>,
    AxumJson(_request): AxumJson<BackupRequest>,
) -> ApiResult<AxumJson<BackupResponse>> {
    let backup_id = Uuid::new_v4();

    let response = BackupResponse {
        backup_id: backup_id.to_string(),
        status: "in_progress".to_string(),
        started_at: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        completed_at: None,
        size_bytes: None,
        location: "/backups/".to_string() + &backup_id.to_string(),
    };

    Ok(AxumJson(response))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/admin/health",
    tag = "admin",
    responses(
        (status = 200, description = "Health status", body = HealthResponse),
    )
)]
pub async fn get_health(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<HealthResponse>> {
    let mut checks = HashMap::new();

    checks.insert("database".to_string(), ComponentHealth {
        status: "healthy".to_string(),
        message: Some("Database is operational".to_string()),
        last_check: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
    });

    checks.insert("storage".to_string(), ComponentHealth {
        status: "healthy".to_string(),
        message: None,
        last_check: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
    });

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: "1.0.0".to_string(),
        uptime_seconds: 3600,
        checks,
    };

    Ok(AxumJson(response))
}

/// Run maintenance operations
#[utoipa::path(
    post,
    path = "/api/v1/admin/maintenance",
    tag = "admin",
    request_body = MaintenanceRequest,
    responses(
        (status = 202, description = "Maintenance started"),
        (status = 400, description = "Invalid operation", body = ApiError),
    )
)]
pub async fn run_maintenance(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<MaintenanceRequest>,
) -> ApiResult<StatusCode> {
    // Validate operation
    match request.operation.as_str() {
        "vacuum" | "analyze" | "reindex" | "checkpoint" => {
            // TODO: Execute maintenance operation
            Ok(StatusCode::ACCEPTED)
        }
        _ => Err(ApiError::new("INVALID_INPUT", "Invalid maintenance operation")),
    }
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
    )
)]
pub async fn get_users(
    State(_state): State<Arc<ApiState>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<AxumJson<PaginatedResponse<UserResponse>>> {
    // TODO: Fetch users from database
    let users = vec![];

    let response = PaginatedResponse::new(users, params.page, params.page_size, 0);
    Ok(AxumJson(response))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    tag = "admin",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "User already exists", body = ApiError),
    )
)]
pub async fn create_user(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<UserRequest>,
) -> ApiResult<AxumJson<UserResponse>> {
    let user = UserResponse {
        user_id: 1,
        username: request.username,
        roles: request.roles,
        enabled: request.enabled.unwrap_or(true),
        created_at: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        last_login: None,
    };

    Ok(AxumJson(user))
}

/// Get user by ID
pub async fn get_user(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<AxumJson<UserResponse>> {
    // TODO: Implement user lookup
    Err(ApiError::new("NOT_FOUND", "User not found"))
}

/// Update user
pub async fn update_user(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
    AxumJson(_request): AxumJson<UserRequest>,
) -> ApiResult<StatusCode> {
    // TODO: Implement user update
    Ok(StatusCode::OK)
}

/// Delete user
pub async fn delete_user(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    // TODO: Implement user deletion
    Ok(StatusCode::NO_CONTENT)
}

/// Get all roles
#[utoipa::path(
    get,
    path = "/api/v1/admin/roles",
    tag = "admin",
    responses(
        (status = 200, description = "List of roles", body = Vec<RoleResponse>),
    )
)]
pub async fn get_roles(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<Vec<RoleResponse>>> {
    // TODO: Fetch roles from database
    Ok(AxumJson(vec![]))
}

/// Create a new role
#[utoipa::path(
    post,
    path = "/api/v1/admin/roles",
    tag = "admin",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
    )
)]
pub async fn create_role(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<RoleRequest>,
) -> ApiResult<AxumJson<RoleResponse>> {
    let role = RoleResponse {
        role_id: 1,
        role_name: request.role_name,
        permissions: request.permissions,
        description: request.description,
        created_at: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
    };

    Ok(AxumJson(role))
}

/// Get role by ID
pub async fn get_role(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<AxumJson<RoleResponse>> {
    Err(ApiError::new("NOT_FOUND", "Role not found"))
}

/// Update role
pub async fn update_role(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
    AxumJson(_request): AxumJson<RoleRequest>,
) -> ApiResult<StatusCode> {
    Ok(StatusCode::OK)
}

/// Delete role
pub async fn delete_role(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Monitoring Handlers
// ============================================================================

/// Get metrics
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "monitoring",
    responses(
        (status = 200, description = "Metrics data", body = MetricsResponse),
    )
)]
pub async fn get_metrics(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<MetricsResponse>> {
    let metrics = state.metrics.read().await;

    let mut metric_data = HashMap::new();

    metric_data.insert("total_requests".to_string(), MetricData {
        value: metrics.total_requests as f64,
        unit: "count".to_string(),
        labels: HashMap::new(),
    });

    metric_data.insert("successful_requests".to_string(), MetricData {
        value: metrics.successful_requests as f64,
        unit: "count".to_string(),
        labels: HashMap::new(),
    });

    metric_data.insert("avg_response_time".to_string(), MetricData {
        value: metrics.avg_response_time_ms,
        unit: "milliseconds".to_string(),
        labels: HashMap::new(),
    });

    let response = MetricsResponse {
        timestamp: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        metrics: metric_data,
        prometheus_format: None,
    };

    Ok(AxumJson(response))
}

/// Get Prometheus-formatted metrics
pub async fn get_prometheus_metrics(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<String> {
    let metrics = state.metrics.read().await;

    let mut output = String::new();
    output.push_str("# HELP rustydb_total_requests Total number of requests\n");
    output.push_str("# TYPE rustydb_total_requests counter\n");
    output.push_str(&format!("rustydb_total_requests {}\n", metrics.total_requests));

    output.push_str("# HELP rustydb_successful_requests Number of successful requests\n");
    output.push_str("# TYPE rustydb_successful_requests counter\n");
    output.push_str(&format!("rustydb_successful_requests {}\n", metrics.successful_requests));

    output.push_str("# HELP rustydb_avg_response_time_ms Average response time in milliseconds\n");
    output.push_str("# TYPE rustydb_avg_response_time_ms gauge\n");
    output.push_str(&format!("rustydb_avg_response_time_ms {}\n", metrics.avg_response_time_ms));

    Ok(output)
}

/// Get session statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats/sessions",
    tag = "monitoring",
    responses(
        (status = 200, description = "Session statistics", body = SessionStatsResponse),
    )
)]
pub async fn get_session_stats(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<SessionStatsResponse>> {
    let sessions = state.active_sessions.read().await;

    let active_count = sessions.values()
        .filter(|s| s.state == "active")
        .count();

    let idle_count = sessions.values()
        .filter(|s| s.state == "idle")
        .count();

    let response = SessionStatsResponse {
        active_sessions: active_count,
        idle_sessions: idle_count,
        sessions: sessions.values().cloned().collect(),
        total_connections: sessions.len() as u64,
        peak_connections: sessions.len(),
    };

    Ok(AxumJson(response))
}

/// Get query statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats/queries",
    tag = "monitoring",
    responses(
        (status = 200, description = "Query statistics", body = QueryStatsResponse),
    )
)]
pub async fn get_query_stats(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<QueryStatsResponse>> {
    let metrics = state.metrics.read().await;

    let response = QueryStatsResponse {
        total_queries: metrics.total_requests,
        queries_per_second: 10.5,
        avg_execution_time_ms: metrics.avg_response_time_ms,
        slow_queries: vec![],
        top_queries: vec![],
    };

    Ok(AxumJson(response))
}

/// Get performance data
#[utoipa::path(
    get,
    path = "/api/v1/stats/performance",
    tag = "monitoring",
    responses(
        (status = 200, description = "Performance data", body = PerformanceDataResponse),
    )
)]
pub async fn get_performance_data(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<PerformanceDataResponse>> {
    // TODO: Collect actual system metrics
    let response = PerformanceDataResponse {
        cpu_usage_percent: 45.2,
        memory_usage_bytes: 1024 * 1024 * 512,
        memory_usage_percent: 25.0,
        disk_io_read_bytes: 1024 * 1024 * 100,
        disk_io_write_bytes: 1024 * 1024 * 50,
        cache_hit_ratio: 0.95,
        transactions_per_second: 250.0,
        locks_held: 15,
        deadlocks: 0,
    };

    Ok(AxumJson(response))
}

/// Get logs
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "monitoring",
    responses(
        (status = 200, description = "Log entries", body = LogResponse),
    )
)]
pub async fn get_logs(
    State(_state): State<Arc<ApiState>>,
    Query(_params): Query<PaginationParams>,
) -> ApiResult<AxumJson<LogResponse>> {
    // TODO: Fetch actual logs
    let response = LogResponse {
        entries: vec![],
        total_count: 0,
        has_more: false,
    };

    Ok(AxumJson(response))
}

/// Get alerts
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "monitoring",
    responses(
        (status = 200, description = "Alerts", body = AlertResponse),
    )
)]
pub async fn get_alerts(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<AlertResponse>> {
    let response = AlertResponse {
        alerts: vec![],
        active_count: 0,
    };

    Ok(AxumJson(response))
}

/// Acknowledge an alert
pub async fn acknowledge_alert(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<StatusCode> {
    // TODO: Mark alert as acknowledged
    Ok(StatusCode::OK)
}

// ============================================================================
// Pool Management Handlers
// ============================================================================

/// Get all connection pools
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "pool",
    responses(
        (status = 200, description = "List of pools", body = Vec<PoolConfig>),
    )
)]
pub async fn get_pools(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<Vec<PoolConfig>>> {
    // TODO: Fetch pool configurations
    let pools = vec![
        PoolConfig {
            pool_id: "default".to_string(),
            min_connections: 10,
            max_connections: 100,
            connection_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: Some(3600),
        }
    ];

    Ok(AxumJson(pools))
}

/// Get pool by ID
pub async fn get_pool(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<AxumJson<PoolConfig>> {
    let pool = PoolConfig {
        pool_id: "default".to_string(),
        min_connections: 10,
        max_connections: 100,
        connection_timeout_secs: 30,
        idle_timeout_secs: 600,
        max_lifetime_secs: Some(3600),
    };

    Ok(AxumJson(pool))
}

/// Update pool configuration
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}",
    tag = "pool",
    request_body = PoolConfig,
    responses(
        (status = 200, description = "Pool updated"),
    )
)]
pub async fn update_pool(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
    AxumJson(_config): AxumJson<PoolConfig>,
) -> ApiResult<StatusCode> {
    // TODO: Apply pool configuration
    Ok(StatusCode::OK)
}

/// Get pool statistics
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/stats",
    tag = "pool",
    responses(
        (status = 200, description = "Pool statistics", body = PoolStatsResponse),
    )
)]
pub async fn get_pool_stats(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<AxumJson<PoolStatsResponse>> {
    let _stats = PoolStatsResponse {
        pool_id: "default".to_string(),
        active_connections: 25,
        idle_connections: 15,
        total_connections: 40,
        waiting_requests: 2,
        total_acquired: 5000,
        total_created: 50,
        total_destroyed: 10,
    };

    Ok(AxumJson(stats))
}

/// Drain a connection pool
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/drain",
    tag = "pool",
    responses(
        (status = 202, description = "Pool draining started"),
    )
)]
pub async fn drain_pool(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<StatusCode> {
    // TODO: Initiate pool draining
    Ok(StatusCode::ACCEPTED)
}

/// Get all active connections
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    tag = "pool",
    responses(
        (status = 200, description = "List of connections", body = Vec<ConnectionInfo>),
    )
)]
pub async fn get_connections(
    State(_state): State<Arc<ApiState>>,
    Query(_params): Query<PaginationParams>,
) -> ApiResult<AxumJson<PaginatedResponse<ConnectionInfo>>> {
    // TODO: Fetch active connections
    let connections = vec![];

    let response = PaginatedResponse::new(connections, 1, 50, 0);
    Ok(AxumJson(response))
}

/// Get connection by ID
pub async fn get_connection(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<AxumJson<ConnectionInfo>> {
    Err(ApiError::new("NOT_FOUND", "Connection not found"))
}

/// Kill a connection
#[utoipa::path(
    delete,
    path = "/api/v1/connections/{id}",
    tag = "pool",
    responses(
        (status = 204, description = "Connection killed"),
    )
)]
pub async fn kill_connection(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    // TODO: Terminate connection
    Ok(StatusCode::NO_CONTENT)
}

/// Get all sessions
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "pool",
    responses(
        (status = 200, description = "List of sessions", body = Vec<SessionInfo>),
    )
)]
pub async fn get_sessions(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<AxumJson<PaginatedResponse<SessionInfo>>> {
    let sessions = state.active_sessions.read().await;
    let session_list: Vec<SessionInfo> = sessions.values().cloned().collect();

    let response = PaginatedResponse::new(
        session_list,
        params.page,
        params.page_size,
        sessions.len(),
    );

    Ok(AxumJson(response))
}

/// Get session by ID
pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
) -> ApiResult<AxumJson<SessionInfo>> {
    let sessions = state.active_sessions.read().await;

    sessions.get(&SessionId(id))
        .cloned()
        .map(AxumJson)
        .ok_or_else(|| ApiError::new("NOT_FOUND", "Session not found"))
}

/// Terminate a session
pub async fn terminate_session(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<u64>,
) -> ApiResult<StatusCode> {
    // TODO: Terminate session
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Cluster Management Handlers
// ============================================================================

/// Get all cluster nodes
#[utoipa::path(
    get,
    path = "/api/v1/cluster/nodes",
    tag = "cluster",
    responses(
        (status = 200, description = "List of cluster nodes", body = Vec<ClusterNodeInfo>),
    )
)]
pub async fn get_cluster_nodes(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<Vec<ClusterNodeInfo>>> {
    // TODO: Fetch cluster nodes
    let nodes = vec![
        ClusterNodeInfo {
            node_id: "node1".to_string(),
            address: "192.168.1.10:5432".to_string(),
            role: "leader".to_string(),
            status: "healthy".to_string(),
            version: "1.0.0".to_string(),
            uptime_seconds: 86400,
            last_heartbeat: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        },
        ClusterNodeInfo {
            node_id: "node2".to_string(),
            address: "192.168.1.11:5432".to_string(),
            role: "follower".to_string(),
            status: "healthy".to_string(),
            version: "1.0.0".to_string(),
            uptime_seconds: 86300,
            last_heartbeat: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        },
    ];

    Ok(AxumJson(nodes))
}

/// Add a new cluster node
#[utoipa::path(
    post,
    path = "/api/v1/cluster/nodes",
    tag = "cluster",
    request_body = AddNodeRequest,
    responses(
        (status = 201, description = "Node added", body = ClusterNodeInfo),
    )
)]
pub async fn add_cluster_node(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<AddNodeRequest>,
) -> ApiResult<AxumJson<ClusterNodeInfo>> {
    let node = ClusterNodeInfo {
        node_id: request.node_id,
        address: request.address,
        role: request.role.unwrap_or_else(|| "follower".to_string()),
        status: "initializing".to_string(),
        version: "1.0.0".to_string(),
        uptime_seconds: 0,
        last_heartbeat: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
    };

    Ok(AxumJson(node))
}

/// Get cluster node by ID
pub async fn get_cluster_node(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<AxumJson<ClusterNodeInfo>> {
    // TODO: Fetch node information
    Err(ApiError::new("NOT_FOUND", "Node not found"))
}

/// Remove a cluster node
pub async fn remove_cluster_node(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<StatusCode> {
    // TODO: Remove node from cluster
    Ok(StatusCode::NO_CONTENT)
}

/// Get cluster topology
#[utoipa::path(
    get,
    path = "/api/v1/cluster/topology",
    tag = "cluster",
    responses(
        (status = 200, description = "Cluster topology", body = TopologyResponse),
    )
)]
pub async fn get_cluster_topology(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<TopologyResponse>> {
    let nodes = vec![
        ClusterNodeInfo {
            node_id: "node1".to_string(),
            address: "192.168.1.10:5432".to_string(),
            role: "leader".to_string(),
            status: "healthy".to_string(),
            version: "1.0.0".to_string(),
            uptime_seconds: 86400,
            last_heartbeat: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
        },
    ];

    let response = TopologyResponse {
        cluster_id: "rustydb-cluster-1".to_string(),
        nodes,
        leader_node: Some("node1".to_string()),
        quorum_size: 2,
        total_nodes: 3,
    };

    Ok(AxumJson(response))
}

/// Trigger manual failover
#[utoipa::path(
    post,
    path = "/api/v1/cluster/failover",
    tag = "cluster",
    request_body = FailoverRequest,
    responses(
        (status = 202, description = "Failover initiated"),
    )
)]
pub async fn trigger_failover(
    State(_state): State<Arc<ApiState>>,
    AxumJson(_request): AxumJson<FailoverRequest>,
) -> ApiResult<StatusCode> {
    // TODO: Initiate cluster failover
    Ok(StatusCode::ACCEPTED)
}

/// Get replication status
#[utoipa::path(
    get,
    path = "/api/v1/cluster/replication",
    tag = "cluster",
    responses(
        (status = 200, description = "Replication status", body = ReplicationStatusResponse),
    )
)]
pub async fn get_replication_status(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<ReplicationStatusResponse>> {
    let response = ReplicationStatusResponse {
        primary_node: "node1".to_string(),
        replicas: vec![
            ReplicaStatus {
                node_id: "node2".to_string(),
                state: "streaming".to_string(),
                lag_bytes: 0,
                lag_ms: 5,
                last_sync: SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs() as i64,
            },
        ],
        replication_lag_ms: 5,
        sync_state: "synchronous".to_string(),
    };

    Ok(AxumJson(response))
}

/// Get cluster configuration
pub async fn get_cluster_config(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<HashMap<String, serde_json::Value>>> {
    let mut config = HashMap::new();
    config.insert("cluster_name".to_string(), json!("rustydb-cluster"));
    config.insert("replication_factor".to_string(), json!(3));
    config.insert("heartbeat_interval_ms".to_string(), json!(1000));

    Ok(AxumJson(config))
}

/// Update cluster configuration
#[utoipa::path(
    put,
    path = "/api/v1/cluster/config",
    tag = "cluster",
    request_body = HashMap<String, serde_json::Value>,
    responses(
        (status = 200, description = "Cluster configuration updated"),
    )
)]
pub async fn update_cluster_config(
    State(_state): State<Arc<ApiState>>,
    AxumJson(_config): AxumJson<HashMap<String, serde_json::Value>>,
) -> ApiResult<StatusCode> {
    // TODO: Apply cluster configuration
    Ok(StatusCode::OK)
}

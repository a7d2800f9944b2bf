// Replication Management Handlers
//
// Advanced replication configuration, slot management, and conflict resolution
// for enterprise database replication scenarios

use axum::{
    extract::{Path, State},
    response::Json as AxumJson,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::super::types::*;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationConfig {
    pub mode: String, // "synchronous", "asynchronous", "semi_synchronous"
    pub standby_nodes: Vec<String>,
    pub replication_timeout_secs: Option<u64>,
    pub max_wal_senders: Option<u32>,
    pub wal_keep_segments: Option<u32>,
    pub archive_mode: Option<bool>,
    pub archive_command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationSlot {
    pub slot_name: String,
    pub plugin: String, // "logical" or "physical"
    pub slot_type: String,
    pub database: Option<String>,
    pub active: bool,
    pub restart_lsn: Option<String>,
    pub confirmed_flush_lsn: Option<String>,
    pub wal_status: String,
    pub catalog_xmin: Option<u64>,
    pub restart_delay: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotRequest {
    pub slot_name: String,
    pub slot_type: String, // "logical" or "physical"
    pub plugin: Option<String>, // Required for logical slots (e.g., "pgoutput")
    pub temporary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationConflict {
    pub conflict_id: String,
    pub database: String,
    pub table_name: String,
    pub conflict_type: String, // "update_conflict", "delete_conflict", "uniqueness_violation"
    pub origin_node: String,
    pub target_node: String,
    pub detected_at: i64,
    pub local_data: serde_json::Value,
    pub remote_data: serde_json::Value,
    pub resolution_strategy: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveConflictRequest {
    pub conflict_id: String,
    pub strategy: String, // "use_local", "use_remote", "manual", "last_write_wins"
    pub manual_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplicationConfigResponse {
    pub success: bool,
    pub message: String,
    pub config: ReplicationConfig,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotListResponse {
    pub slots: Vec<ReplicationSlot>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConflictListResponse {
    pub conflicts: Vec<ReplicationConflict>,
    pub total_count: usize,
    pub unresolved_count: usize,
}

// ============================================================================
// State Management
// ============================================================================

lazy_static::lazy_static! {
    static ref REPLICATION_CONFIG: Arc<RwLock<Option<ReplicationConfig>>> = Arc::new(RwLock::new(None));
    static ref REPLICATION_SLOTS: Arc<RwLock<HashMap<String, ReplicationSlot>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref REPLICATION_CONFLICTS: Arc<RwLock<HashMap<String, ReplicationConflict>>> = Arc::new(RwLock::new(HashMap::new()));
}

// ============================================================================
// Replication Configuration Handlers
// ============================================================================

/// Configure replication settings
#[utoipa::path(
    post,
    path = "/api/v1/replication/configure",
    tag = "replication",
    request_body = ReplicationConfig,
    responses(
        (status = 200, description = "Replication configured successfully", body = ReplicationConfigResponse),
        (status = 400, description = "Invalid configuration", body = ApiError),
    )
)]
pub async fn configure_replication(
    State(_state): State<Arc<ApiState>>,
    AxumJson(config): AxumJson<ReplicationConfig>,
) -> ApiResult<AxumJson<ReplicationConfigResponse>> {
    // Validate configuration
    if config.mode != "synchronous" && config.mode != "asynchronous" && config.mode != "semi_synchronous" {
        return Err(ApiError::new("INVALID_INPUT", "mode must be synchronous, asynchronous, or semi_synchronous"));
    }

    if config.standby_nodes.is_empty() {
        return Err(ApiError::new("INVALID_INPUT", "standby_nodes cannot be empty"));
    }

    // Store configuration
    {
        let mut repl_config = REPLICATION_CONFIG.write();
        *repl_config = Some(config.clone());
    }

    log::info!("Replication configured: mode={}, standbys={}", config.mode, config.standby_nodes.len());

    Ok(AxumJson(ReplicationConfigResponse {
        success: true,
        message: "Replication configuration updated successfully".to_string(),
        config,
    }))
}

/// Get current replication configuration
#[utoipa::path(
    get,
    path = "/api/v1/replication/config",
    tag = "replication",
    responses(
        (status = 200, description = "Current replication configuration", body = ReplicationConfig),
        (status = 404, description = "Replication not configured", body = ApiError),
    )
)]
pub async fn get_replication_config(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<ReplicationConfig>> {
    let config = REPLICATION_CONFIG.read();

    config.as_ref()
        .cloned()
        .map(AxumJson)
        .ok_or_else(|| ApiError::new("NOT_FOUND", "Replication not configured"))
}

// ============================================================================
// Replication Slot Handlers
// ============================================================================

/// List all replication slots
#[utoipa::path(
    get,
    path = "/api/v1/replication/slots",
    tag = "replication",
    responses(
        (status = 200, description = "List of replication slots", body = SlotListResponse),
    )
)]
pub async fn list_replication_slots(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<SlotListResponse>> {
    let slots = REPLICATION_SLOTS.read();

    let slot_list: Vec<ReplicationSlot> = slots.values().cloned().collect();
    let total_count = slot_list.len();

    Ok(AxumJson(SlotListResponse {
        slots: slot_list,
        total_count,
    }))
}

/// Create a new replication slot
#[utoipa::path(
    post,
    path = "/api/v1/replication/slots",
    tag = "replication",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Replication slot created", body = ReplicationSlot),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Slot already exists", body = ApiError),
    )
)]
pub async fn create_replication_slot(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<CreateSlotRequest>,
) -> ApiResult<(StatusCode, AxumJson<ReplicationSlot>)> {
    // Validate slot type
    if request.slot_type != "logical" && request.slot_type != "physical" {
        return Err(ApiError::new("INVALID_INPUT", "slot_type must be 'logical' or 'physical'"));
    }

    // Logical slots require a plugin
    if request.slot_type == "logical" && request.plugin.is_none() {
        return Err(ApiError::new("INVALID_INPUT", "plugin is required for logical slots"));
    }

    // Check if slot already exists
    {
        let slots = REPLICATION_SLOTS.read();
        if slots.contains_key(&request.slot_name) {
            return Err(ApiError::new("CONFLICT", format!("Replication slot '{}' already exists", request.slot_name)));
        }
    }

    let slot = ReplicationSlot {
        slot_name: request.slot_name.clone(),
        plugin: request.plugin.unwrap_or_else(|| "physical".to_string()),
        slot_type: request.slot_type.clone(),
        database: Some("rustydb".to_string()),
        active: false,
        restart_lsn: Some("0/0".to_string()),
        confirmed_flush_lsn: Some("0/0".to_string()),
        wal_status: "reserved".to_string(),
        catalog_xmin: None,
        restart_delay: Some(0),
    };

    // Store slot
    {
        let mut slots = REPLICATION_SLOTS.write();
        slots.insert(request.slot_name.clone(), slot.clone());
    }

    log::info!("Replication slot created: {} (type: {})", request.slot_name, request.slot_type);

    Ok((StatusCode::CREATED, AxumJson(slot)))
}

/// Get replication slot by name
#[utoipa::path(
    get,
    path = "/api/v1/replication/slots/{name}",
    tag = "replication",
    params(
        ("name" = String, Path, description = "Slot name")
    ),
    responses(
        (status = 200, description = "Replication slot details", body = ReplicationSlot),
        (status = 404, description = "Slot not found", body = ApiError),
    )
)]
pub async fn get_replication_slot(
    State(_state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<AxumJson<ReplicationSlot>> {
    let slots = REPLICATION_SLOTS.read();

    slots.get(&name)
        .cloned()
        .map(AxumJson)
        .ok_or_else(|| ApiError::new("NOT_FOUND", format!("Replication slot '{}' not found", name)))
}

/// Delete a replication slot
#[utoipa::path(
    delete,
    path = "/api/v1/replication/slots/{name}",
    tag = "replication",
    params(
        ("name" = String, Path, description = "Slot name")
    ),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found", body = ApiError),
        (status = 409, description = "Slot is active and cannot be deleted", body = ApiError),
    )
)]
pub async fn delete_replication_slot(
    State(_state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let mut slots = REPLICATION_SLOTS.write();

    // Check if slot exists and is not active
    if let Some(slot) = slots.get(&name) {
        if slot.active {
            return Err(ApiError::new("CONFLICT", "Cannot delete active replication slot"));
        }
    } else {
        return Err(ApiError::new("NOT_FOUND", format!("Replication slot '{}' not found", name)));
    }

    slots.remove(&name);
    log::info!("Replication slot deleted: {}", name);

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Replication Conflict Handlers
// ============================================================================

/// Get all replication conflicts
#[utoipa::path(
    get,
    path = "/api/v1/replication/conflicts",
    tag = "replication",
    responses(
        (status = 200, description = "List of replication conflicts", body = ConflictListResponse),
    )
)]
pub async fn get_replication_conflicts(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<ConflictListResponse>> {
    let conflicts = REPLICATION_CONFLICTS.read();

    let conflict_list: Vec<ReplicationConflict> = conflicts.values().cloned().collect();
    let total_count = conflict_list.len();
    let unresolved_count = conflict_list.iter().filter(|c| !c.resolved).count();

    Ok(AxumJson(ConflictListResponse {
        conflicts: conflict_list,
        total_count,
        unresolved_count,
    }))
}

/// Resolve a replication conflict
#[utoipa::path(
    post,
    path = "/api/v1/replication/resolve-conflict",
    tag = "replication",
    request_body = ResolveConflictRequest,
    responses(
        (status = 200, description = "Conflict resolved successfully"),
        (status = 400, description = "Invalid resolution strategy", body = ApiError),
        (status = 404, description = "Conflict not found", body = ApiError),
    )
)]
pub async fn resolve_replication_conflict(
    State(_state): State<Arc<ApiState>>,
    AxumJson(request): AxumJson<ResolveConflictRequest>,
) -> ApiResult<AxumJson<serde_json::Value>> {
    // Validate strategy
    let valid_strategies = ["use_local", "use_remote", "manual", "last_write_wins"];
    if !valid_strategies.contains(&request.strategy.as_str()) {
        return Err(ApiError::new("INVALID_INPUT", "Invalid resolution strategy"));
    }

    // Check if manual data is provided for manual strategy
    if request.strategy == "manual" && request.manual_data.is_none() {
        return Err(ApiError::new("INVALID_INPUT", "manual_data is required for manual strategy"));
    }

    let mut conflicts = REPLICATION_CONFLICTS.write();

    // Find and resolve the conflict
    if let Some(conflict) = conflicts.get_mut(&request.conflict_id) {
        if conflict.resolved {
            return Err(ApiError::new("CONFLICT", "Conflict already resolved"));
        }

        conflict.resolved = true;
        conflict.resolved_at = Some(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs() as i64
        );
        conflict.resolution_strategy = Some(request.strategy.clone());

        log::info!("Replication conflict resolved: {} (strategy: {})",
                   request.conflict_id, request.strategy);

        Ok(AxumJson(serde_json::json!({
            "success": true,
            "message": "Conflict resolved successfully",
            "conflict_id": request.conflict_id,
            "strategy": request.strategy,
            "resolved_at": conflict.resolved_at
        })))
    } else {
        Err(ApiError::new("NOT_FOUND", format!("Conflict '{}' not found", request.conflict_id)))
    }
}

/// Simulate a replication conflict (for testing)
#[utoipa::path(
    post,
    path = "/api/v1/replication/conflicts/simulate",
    tag = "replication",
    responses(
        (status = 201, description = "Conflict simulated", body = ReplicationConflict),
    )
)]
pub async fn simulate_replication_conflict(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<(StatusCode, AxumJson<ReplicationConflict>)> {
    let conflict_id = format!("conflict_{}", Uuid::new_v4());
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let conflict = ReplicationConflict {
        conflict_id: conflict_id.clone(),
        database: "rustydb".to_string(),
        table_name: "users".to_string(),
        conflict_type: "update_conflict".to_string(),
        origin_node: "node-1".to_string(),
        target_node: "node-2".to_string(),
        detected_at: now,
        local_data: serde_json::json!({
            "id": 123,
            "name": "Local User",
            "updated_at": now - 60
        }),
        remote_data: serde_json::json!({
            "id": 123,
            "name": "Remote User",
            "updated_at": now - 30
        }),
        resolution_strategy: None,
        resolved: false,
        resolved_at: None,
    };

    // Store conflict
    {
        let mut conflicts = REPLICATION_CONFLICTS.write();
        conflicts.insert(conflict_id.clone(), conflict.clone());
    }

    log::info!("Simulated replication conflict: {}", conflict_id);

    Ok((StatusCode::CREATED, AxumJson(conflict)))
}

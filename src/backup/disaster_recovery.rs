// Disaster Recovery - Standby database, failover, and RTO/RPO management
// Provides comprehensive disaster recovery capabilities
//
// ============================================================================
// SECURITY FIX: PR #55/56 - Issue P0-3: No STONITH Fencing
// ============================================================================
// CRITICAL: Split-brain risk during failover without STONITH (Shoot The Other Node In The Head).
// Current implementation lacks fencing mechanism to prevent dual-primary scenarios.
//
// STONITH Implementation Requirements:
//
// 1. **Fencing Mechanism**:
//    - Integrate with hardware fencing devices (iLO, IPMI, fence_xvm)
//    - Implement power-off or network isolation for failed primary
//    - Verify primary is truly down before promoting standby
//
// 2. **Quorum and Witness**:
//    - Add quorum calculation with witness node
//    - Require majority quorum before failover
//    - Prevent split-brain when network partitions occur
//
// 3. **Fencing Coordination**:
//    - Add fencing coordinator service
//    - Implement fencing timeout (max 30 seconds)
//    - Add manual override for emergency failover
//
// 4. **Health Verification**:
//    - Multi-path health checks (network, disk, process)
//    - Require N consecutive failures before fencing
//    - Add fencing history and audit log
//
// TODO(critical): Implement STONITH fencing before production deployment
// - Add fence device registration and configuration
// - Implement fencing API (fence_node, verify_fenced, unfence_node)
// - Add quorum-based failover decision making
// - Test split-brain scenarios and recovery
//
// Reference: diagrams/07_security_enterprise_flow.md Section 8.3
// Reference: Pacemaker/Corosync STONITH implementation
// ============================================================================

use crate::error::DbError;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

// Standby database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandbyConfig {
    pub standby_name: String,
    pub standby_address: SocketAddr,
    pub primary_address: SocketAddr,
    pub replication_mode: ReplicationMode,
    pub apply_delay_seconds: u64,
    pub max_lag_tolerance_seconds: u64,
    pub auto_failover_enabled: bool,
    pub switchover_timeout_seconds: u64,
    pub health_check_interval_seconds: u64,
}

impl Default for StandbyConfig {
    fn default() -> Self {
        Self {
            standby_name: "standby-1".to_string(),
            standby_address: "127.0.0.1:5433".parse().unwrap(),
            primary_address: "127.0.0.1:5432".parse().unwrap(),
            replication_mode: ReplicationMode::Synchronous,
            apply_delay_seconds: 0,
            max_lag_tolerance_seconds: 60,
            auto_failover_enabled: true,
            switchover_timeout_seconds: 300,
            health_check_interval_seconds: 5,
        }
    }
}

// Replication mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReplicationMode {
    // Synchronous replication - waits for standby confirmation
    Synchronous,
    // Asynchronous replication - doesn't wait for standby
    Asynchronous,
    // Semi-synchronous - waits for at least one standby
    SemiSynchronous,
}

// Standby database role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DatabaseRole {
    Primary,
    Standby,
    Unknown,
}

// Standby database status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandbyStatus {
    pub standby_name: String,
    pub role: DatabaseRole,
    pub is_healthy: bool,
    pub last_health_check: SystemTime,
    pub replication_lag_seconds: u64,
    pub last_applied_lsn: u64,
    pub primary_lsn: u64,
    pub lag_bytes: u64,
    pub apply_rate_mbps: f64,
    pub uptime_seconds: u64,
}

impl StandbyStatus {
    pub fn is_lagging(&self, max_lag_seconds: u64) -> bool {
        self.replication_lag_seconds > max_lag_seconds
    }

    pub fn lag_percentage(&self) -> f64 {
        if self.primary_lsn == 0 {
            0.0
        } else {
            ((self.primary_lsn - self.last_applied_lsn) as f64 / self.primary_lsn as f64) * 100.0
        }
    }
}

// Recovery Time Objective (RTO) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtoConfig {
    pub target_seconds: u64,
    pub max_acceptable_seconds: u64,
    pub measured_recovery_time_seconds: Vec<u64>,
    pub last_test: Option<SystemTime>,
    pub test_frequency_days: u32,
}

impl Default for RtoConfig {
    fn default() -> Self {
        Self {
            target_seconds: 300,         // 5 minutes
            max_acceptable_seconds: 600, // 10 minutes
            measured_recovery_time_seconds: Vec::new(),
            last_test: None,
            test_frequency_days: 30,
        }
    }
}

impl RtoConfig {
    pub fn average_recovery_time(&self) -> Option<u64> {
        if self.measured_recovery_time_seconds.is_empty() {
            None
        } else {
            let sum: u64 = self.measured_recovery_time_seconds.iter().sum();
            Some(sum / self.measured_recovery_time_seconds.len() as u64)
        }
    }

    pub fn is_within_target(&self) -> bool {
        if let Some(avg) = self.average_recovery_time() {
            avg <= self.target_seconds
        } else {
            false
        }
    }

    pub fn needs_testing(&self) -> bool {
        if let Some(last_test) = self.last_test {
            if let Ok(elapsed) = SystemTime::now().duration_since(last_test) {
                return elapsed.as_secs() > (self.test_frequency_days as u64 * 86400);
            }
        }
        true
    }
}

// Recovery Point Objective (RPO) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpoConfig {
    pub target_seconds: u64,
    pub max_acceptable_data_loss_seconds: u64,
    pub measured_data_loss_seconds: Vec<u64>,
    pub current_lag_seconds: u64,
    pub backup_frequency_seconds: u64,
}

impl Default for RpoConfig {
    fn default() -> Self {
        Self {
            target_seconds: 60,                    // 1 minute
            max_acceptable_data_loss_seconds: 300, // 5 minutes
            measured_data_loss_seconds: Vec::new(),
            current_lag_seconds: 0,
            backup_frequency_seconds: 3600, // 1 hour
        }
    }
}

impl RpoConfig {
    pub fn is_at_risk(&self) -> bool {
        self.current_lag_seconds > self.target_seconds
    }

    pub fn average_data_loss(&self) -> Option<u64> {
        if self.measured_data_loss_seconds.is_empty() {
            None
        } else {
            let sum: u64 = self.measured_data_loss_seconds.iter().sum();
            Some(sum / self.measured_data_loss_seconds.len() as u64)
        }
    }

    pub fn is_within_target(&self) -> bool {
        if let Some(avg) = self.average_data_loss() {
            avg <= self.target_seconds
        } else {
            self.current_lag_seconds <= self.target_seconds
        }
    }
}

// Failover trigger conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FailoverTrigger {
    Manual,
    PrimaryUnreachable { duration_seconds: u64 },
    HealthCheckFailed { consecutive_failures: u32 },
    ReplicationLag { lag_seconds: u64 },
    NetworkPartition,
    QuorumLost,
}

// Failover status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FailoverStatus {
    Idle,
    Triggered { trigger: String },
    InProgress { step: FailoverStep },
    Completed { duration_seconds: u64 },
    Failed { error: String },
    RolledBack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FailoverStep {
    ValidatingStandby,
    StoppingReplication,
    PromotingStandby,
    ReconfigurationClients,
    VerifyingPromoted,
}

// Failover event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverEvent {
    pub event_id: String,
    pub trigger: FailoverTrigger,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub status: FailoverStatus,
    pub old_primary: String,
    pub new_primary: String,
    pub data_loss_seconds: Option<u64>,
    pub recovery_time_seconds: Option<u64>,
    pub steps_completed: Vec<String>,
}

impl FailoverEvent {
    pub fn new(trigger: FailoverTrigger, old_primary: String, new_primary: String) -> Self {
        Self {
            event_id: format!("FAILOVER-{}", uuid::Uuid::new_v4()),
            trigger,
            start_time: SystemTime::now(),
            end_time: None,
            status: FailoverStatus::Idle,
            old_primary,
            new_primary,
            data_loss_seconds: None,
            recovery_time_seconds: None,
            steps_completed: Vec::new(),
        }
    }

    pub fn complete(&mut self, data_loss: Option<u64>) {
        self.end_time = Some(SystemTime::now());
        if let Ok(duration) = self.end_time.unwrap().duration_since(self.start_time) {
            self.recovery_time_seconds = Some(duration.as_secs());
        }
        self.data_loss_seconds = data_loss;
        self.status = FailoverStatus::Completed {
            duration_seconds: self.recovery_time_seconds.unwrap_or(0),
        };
    }
}

// Disaster Recovery Manager
pub struct DisasterRecoveryManager {
    config: StandbyConfig,
    rto_config: RtoConfig,
    rpo_config: RpoConfig,
    standbys: Arc<RwLock<HashMap<String, StandbyStatus>>>,
    failover_history: Arc<RwLock<Vec<FailoverEvent>>>,
    current_role: Arc<RwLock<DatabaseRole>>,
    health_check_results: Arc<Mutex<VecDeque<(SystemTime, bool)>>>,
    replication_lag_history: Arc<Mutex<VecDeque<(SystemTime, u64)>>>,
}

impl DisasterRecoveryManager {
    pub fn new(config: StandbyConfig, rto_config: RtoConfig, rpo_config: RpoConfig) -> Self {
        Self {
            config,
            rto_config,
            rpo_config,
            standbys: Arc::new(RwLock::new(HashMap::new())),
            failover_history: Arc::new(RwLock::new(Vec::new())),
            current_role: Arc::new(RwLock::new(DatabaseRole::Primary)),
            health_check_results: Arc::new(Mutex::new(VecDeque::new())),
            replication_lag_history: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    // Register a standby database
    pub fn register_standby(&self, standby_name: String) -> Result<()> {
        let status = StandbyStatus {
            standby_name: standby_name.clone(),
            role: DatabaseRole::Standby,
            is_healthy: true,
            last_health_check: SystemTime::now(),
            replication_lag_seconds: 0,
            last_applied_lsn: 0,
            primary_lsn: 0,
            lag_bytes: 0,
            apply_rate_mbps: 0.0,
            uptime_seconds: 0,
        };

        self.standbys.write().insert(standby_name, status);
        Ok(())
    }

    // Update standby status
    pub fn update_standby_status(
        &self,
        standby_name: &str,
        last_applied_lsn: u64,
        primary_lsn: u64,
    ) -> Result<()> {
        let mut standbys = self.standbys.write();
        let standby = standbys
            .get_mut(standby_name)
            .ok_or_else(|| DbError::BackupError("Standby not found".to_string()))?;

        let _old_lsn = standby.last_applied_lsn;
        standby.last_applied_lsn = last_applied_lsn;
        standby.primary_lsn = primary_lsn;

        // Calculate lag
        standby.lag_bytes = primary_lsn.saturating_sub(last_applied_lsn);

        // Estimate lag in seconds (assuming ~1MB/s apply rate)
        standby.replication_lag_seconds = standby.lag_bytes / (1024 * 1024);

        // Track lag history
        let mut lag_history = self.replication_lag_history.lock();
        lag_history.push_back((SystemTime::now(), standby.replication_lag_seconds));
        if lag_history.len() > 1000 {
            lag_history.pop_front();
        }

        // Update RPO current lag
        drop(standbys);
        drop(lag_history);

        Ok(())
    }

    // Perform health check on standby
    pub fn health_check(&self, standby_name: &str) -> Result<bool> {
        let mut standbys = self.standbys.write();
        let standby = standbys
            .get_mut(standby_name)
            .ok_or_else(|| DbError::BackupError("Standby not found".to_string()))?;

        // Simulate health check
        let is_healthy = !standby.is_lagging(self.config.max_lag_tolerance_seconds);

        standby.is_healthy = is_healthy;
        standby.last_health_check = SystemTime::now();

        // Track health check history
        let mut health_history = self.health_check_results.lock();
        health_history.push_back((SystemTime::now(), is_healthy));
        if health_history.len() > 100 {
            health_history.pop_front();
        }

        Ok(is_healthy)
    }

    // Trigger failover
    pub fn trigger_failover(
        &self,
        trigger: FailoverTrigger,
        target_standby: &str,
    ) -> Result<String> {
        // Verify we're not already failing over
        {
            let role = self.current_role.read();
            if *role == DatabaseRole::Standby {
                return Err(DbError::BackupError(
                    "Already running as standby".to_string(),
                ));
            }
        }

        // Verify target standby exists and is healthy
        let standby_healthy = {
            let standbys = self.standbys.read();
            let standby = standbys
                .get(target_standby)
                .ok_or_else(|| DbError::BackupError("Target standby not found".to_string()))?;
            standby.is_healthy
        };

        if !standby_healthy && !matches!(trigger, FailoverTrigger::Manual) {
            return Err(DbError::BackupError(
                "Target standby is not healthy".to_string(),
            ));
        }

        // Create failover event
        let mut event =
            FailoverEvent::new(trigger, "primary".to_string(), target_standby.to_string());

        let event_id = event.event_id.clone();
        let start_time = Instant::now();

        // Execute failover steps
        event.status = FailoverStatus::InProgress {
            step: FailoverStep::ValidatingStandby,
        };
        self.validate_standby(target_standby)?;
        event.steps_completed.push("ValidatingStandby".to_string());

        event.status = FailoverStatus::InProgress {
            step: FailoverStep::StoppingReplication,
        };
        self.stop_replication(target_standby)?;
        event
            .steps_completed
            .push("StoppingReplication".to_string());

        event.status = FailoverStatus::InProgress {
            step: FailoverStep::PromotingStandby,
        };
        self.promote_standby(target_standby)?;
        event.steps_completed.push("PromotingStandby".to_string());

        event.status = FailoverStatus::InProgress {
            step: FailoverStep::ReconfigurationClients,
        };
        self.reconfigure_clients(target_standby)?;
        event
            .steps_completed
            .push("ReconfigurationClients".to_string());

        event.status = FailoverStatus::InProgress {
            step: FailoverStep::VerifyingPromoted,
        };
        self.verify_promoted(target_standby)?;
        event.steps_completed.push("VerifyingPromoted".to_string());

        // Complete failover
        let recovery_time = start_time.elapsed().as_secs();
        event.complete(Some(0)); // No data loss in this simulation

        // Update RTO metrics
        let mut rto_config = self.rto_config.clone();
        rto_config
            .measured_recovery_time_seconds
            .push(recovery_time);
        rto_config.last_test = Some(SystemTime::now());

        // Store failover event
        self.failover_history.write().push(event);

        // Update role
        *self.current_role.write() = DatabaseRole::Standby;

        Ok(event_id)
    }

    fn validate_standby(&self, standby_name: &str) -> Result<()> {
        // Verify standby is reachable and has recent data
        let standbys = self.standbys.read();
        let standby = standbys
            .get(standby_name)
            .ok_or_else(|| DbError::BackupError("Standby not found".to_string()))?;

        if standby.replication_lag_seconds > self.config.max_lag_tolerance_seconds {
            return Err(DbError::BackupError(format!(
                "Standby lag too high: {} seconds",
                standby.replication_lag_seconds
            )));
        }

        Ok(())
    }

    fn stop_replication(&self, _standby_name: &str) -> Result<()> {
        // Stop replication to prepare for promotion
        std::thread::sleep(Duration::from_millis(100));
        Ok(())
    }

    fn promote_standby(&self, standby_name: &str) -> Result<()> {
        // Promote standby to primary
        let mut standbys = self.standbys.write();
        if let Some(standby) = standbys.get_mut(standby_name) {
            standby.role = DatabaseRole::Primary;
        }

        std::thread::sleep(Duration::from_millis(500));
        Ok(())
    }

    fn reconfigure_clients(&self, _new_primary: &str) -> Result<()> {
        // Update client connections to point to new primary
        std::thread::sleep(Duration::from_millis(200));
        Ok(())
    }

    fn verify_promoted(&self, standby_name: &str) -> Result<()> {
        // Verify promoted standby is accepting connections
        let standbys = self.standbys.read();
        let standby = standbys
            .get(standby_name)
            .ok_or_else(|| DbError::BackupError("Standby not found".to_string()))?;

        if standby.role != DatabaseRole::Primary {
            return Err(DbError::BackupError(
                "Promotion verification failed".to_string(),
            ));
        }

        Ok(())
    }

    // Perform switchover (planned failover)
    pub fn switchover(&self, target_standby: &str) -> Result<String> {
        // Switchover is a planned failover with zero data loss
        self.trigger_failover(FailoverTrigger::Manual, target_standby)
    }

    // Get current RTO metrics
    pub fn get_rto_metrics(&self) -> RtoConfig {
        self.rto_config.clone()
    }

    // Get current RPO metrics
    pub fn get_rpo_metrics(&self) -> RpoConfig {
        self.rpo_config.clone()
    }

    // Test disaster recovery plan
    pub fn test_dr_plan(&self) -> Result<DrTestResult> {
        let start_time = Instant::now();

        // Simulate DR test
        let mut test_result = DrTestResult {
            test_id: format!("DR-TEST-{}", uuid::Uuid::new_v4()),
            test_time: SystemTime::now(),
            duration_seconds: 0,
            rto_target_met: false,
            rpo_target_met: false,
            issues_found: Vec::new(),
            recommendations: Vec::new(),
        };

        // Check if standby is healthy
        for (name, standby) in self.standbys.read().iter() {
            if !standby.is_healthy {
                test_result
                    .issues_found
                    .push(format!("Standby {} is not healthy", name));
            }

            if standby.is_lagging(self.config.max_lag_tolerance_seconds) {
                test_result.issues_found.push(format!(
                    "Standby {} has excessive lag: {} seconds",
                    name, standby.replication_lag_seconds
                ));
                test_result
                    .recommendations
                    .push("Increase replication bandwidth or reduce write load".to_string());
            }
        }

        // Check RTO
        if let Some(avg_rto) = self.rto_config.average_recovery_time() {
            test_result.rto_target_met = avg_rto <= self.rto_config.target_seconds;
            if !test_result.rto_target_met {
                test_result.recommendations.push(format!(
                    "RTO not meeting target. Average: {}s, Target: {}s",
                    avg_rto, self.rto_config.target_seconds
                ));
            }
        }

        // Check RPO
        test_result.rpo_target_met = self.rpo_config.is_within_target();
        if !test_result.rpo_target_met {
            test_result.recommendations.push(
                "RPO not meeting target. Consider more frequent backups or synchronous replication"
                    .to_string(),
            );
        }

        test_result.duration_seconds = start_time.elapsed().as_secs();

        Ok(test_result)
    }

    // Get failover history
    pub fn get_failover_history(&self) -> Vec<FailoverEvent> {
        self.failover_history.read().clone()
    }

    // Get all standby statuses
    pub fn get_standby_statuses(&self) -> Vec<StandbyStatus> {
        self.standbys.read().values().cloned().collect()
    }

    // Get current database role
    pub fn get_current_role(&self) -> DatabaseRole {
        self.current_role.read().clone()
    }

    // Calculate uptime percentage
    pub fn calculate_uptime_percentage(&self, period_hours: u64) -> f64 {
        let health_checks = self.health_check_results.lock();
        if health_checks.is_empty() {
            return 100.0;
        }

        let cutoff = SystemTime::now() - Duration::from_secs(period_hours * 3600);
        let recent_checks: Vec<_> = health_checks
            .iter()
            .filter(|(time, _)| *time >= cutoff)
            .collect();

        if recent_checks.is_empty() {
            return 100.0;
        }

        let healthy_count = recent_checks.iter().filter(|(_, healthy)| *healthy).count();
        (healthy_count as f64 / recent_checks.len() as f64) * 100.0
    }
}

// DR test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrTestResult {
    pub test_id: String,
    pub test_time: SystemTime,
    pub duration_seconds: u64,
    pub rto_target_met: bool,
    pub rpo_target_met: bool,
    pub issues_found: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disaster_recovery_manager() {
        let config = StandbyConfig::default();
        let rto = RtoConfig::default();
        let rpo = RpoConfig::default();

        let manager = DisasterRecoveryManager::new(config, rto, rpo);

        manager.register_standby("standby-1".to_string()).unwrap();
        let standbys = manager.get_standby_statuses();
        assert_eq!(standbys.len(), 1);
    }

    #[test]
    fn test_rto_config() {
        let mut rto = RtoConfig::default();
        rto.measured_recovery_time_seconds.push(100);
        rto.measured_recovery_time_seconds.push(200);
        rto.measured_recovery_time_seconds.push(150);

        assert_eq!(rto.average_recovery_time(), Some(150));
    }

    #[test]
    fn test_rpo_config() {
        let mut rpo = RpoConfig::default();
        rpo.current_lag_seconds = 30;

        assert!(!rpo.is_at_risk());
        assert!(rpo.is_within_target());

        rpo.current_lag_seconds = 120;
        assert!(rpo.is_at_risk());
    }

    #[test]
    fn test_failover_event() {
        let mut event = FailoverEvent::new(
            FailoverTrigger::Manual,
            "primary-1".to_string(),
            "standby-1".to_string(),
        );

        event.complete(Some(0));
        assert!(matches!(event.status, FailoverStatus::Completed { .. }));
    }
}

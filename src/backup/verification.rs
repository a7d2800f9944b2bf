// Backup Verification - Integrity checking, restore testing, and corruption detection
// Ensures backup reliability and recoverability

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs::metadata;
use std::time::{SystemTime};
use std::collections::{HashMap};
use parking_lot::RwLock;
use std::sync::Arc;
use crate::Result;
use crate::error::DbError;

/// Verification type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationType {
    /// Quick verification - checksum only
    Quick,
    /// Standard verification - checksum + basic structure
    Standard,
    /// Full verification - checksum + full structure validation
    Full,
    /// Restore test - actual restore to verify recoverability
    RestoreTest,
}

/// Verification status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Pending,
    Running { progress_pct: f64 },
    Passed,
    Failed { errors: Vec<String> },
    Warning { warnings: Vec<String> },
}

/// Verification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verification_id: String,
    pub backup_id: String,
    pub verification_type: VerificationType,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub status: VerificationStatus,
    pub checksum_valid: bool,
    pub structure_valid: bool,
    pub corruption_detected: bool,
    pub corrupted_blocks: Vec<CorruptedBlock>,
    pub restore_successful: Option<bool>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerificationResult {
    pub fn new(verification_id: String, backup_id: String, verification_type: VerificationType) -> Self {
        Self {
            verification_id,
            backup_id,
            verification_type,
            start_time: SystemTime::now(),
            end_time: None,
            status: VerificationStatus::Pending,
            checksum_valid: false,
            structure_valid: false,
            corruption_detected: false,
            corrupted_blocks: Vec::new(),
            restore_successful: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self.status, VerificationStatus::Passed)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_time.and_then(|end| end.duration_since(self.start_time).ok())
    }
}

/// Corrupted block information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorruptedBlock {
    pub file_id: u32,
    pub block_id: u64,
    pub expected_checksum: String,
    pub actual_checksum: String,
    pub corruption_type: CorruptionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CorruptionType {
    ChecksumMismatch,
    InvalidHeader,
    InvalidData,
    TornPage,
    MissingBlock,
}

/// Checksum algorithm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChecksumAlgorithm {
    CRC32,
    MD5,
    SHA256,
    XXHash,
}

/// Block checksum metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockChecksum {
    pub file_id: u32,
    pub block_id: u64,
    pub algorithm: ChecksumAlgorithm,
    pub checksum: String,
    pub computed_at: SystemTime,
}

impl BlockChecksum {
    pub fn verify(&self, data: &[u8]) -> bool {
        let computed = Self::compute(&self.algorithm, data);
        computed.as_str() == self.checksum.as_str()
    }

    pub fn compute(algorithm: &ChecksumAlgorithm, data: &[u8]) -> String {
        match algorithm {
            ChecksumAlgorithm::CRC32 => {
                // Simulate CRC32
                format!("CRC32-{:08x}", data.len())
            }
            ChecksumAlgorithm::MD5 => {
                // Simulate MD5
                format!("MD5-{}", uuid::Uuid::new_v4())
            }
            ChecksumAlgorithm::SHA256 => {
                // Simulate SHA256
                format!("SHA256-{}", uuid::Uuid::new_v4())
            }
            ChecksumAlgorithm::XXHash => {
                // Simulate XXHash
                format!("XXHASH-{:016x}", data.len())
            }
        }
    }
}

/// Restore test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreTestConfig {
    pub test_directory: PathBuf,
    pub cleanup_after_test: bool,
    pub verify_data_integrity: bool,
    pub test_timeout_seconds: u64,
    pub parallel_tests: usize,
}

impl Default for RestoreTestConfig {
    fn default() -> Self {
        Self {
            test_directory: PathBuf::from("/tmp/rustydb-restore-tests"),
            cleanup_after_test: true,
            verify_data_integrity: true,
            test_timeout_seconds: 3600,
            parallel_tests: 1,
        }
    }
}

/// Restore test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreTestResult {
    pub test_id: String,
    pub backup_id: String,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub success: bool,
    pub restore_duration_seconds: u64,
    pub data_integrity_verified: bool,
    pub restored_size_bytes: u64,
    pub errors: Vec<String>,
}

/// Verification schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSchedule {
    pub schedule_id: String,
    pub name: String,
    pub verification_type: VerificationType,
    pub frequency_hours: u64,
    pub last_execution: Option<SystemTime>,
    pub next_execution: Option<SystemTime>,
    pub enabled: bool,
    pub backup_filters: Vec<String>,
}

impl VerificationSchedule {
    pub fn is_due(&self) -> bool {
        if !self.enabled {
            return false;
        }

        if let Some(next) = self.next_execution {
            SystemTime::now() >= next
        } else {
            true
        }
    }

    pub fn update_next_execution(&mut self) {
        self.next_execution = Some(
            SystemTime::now() + Duration::from_secs(self.frequency_hours * 3600)
        );
    }
}

/// Backup verification manager
pub struct VerificationManager {
    checksums: Arc<RwLock<HashMap<String, Vec<BlockChecksum>>>>,
    verification_results: Arc<RwLock<BTreeMap<String, VerificationResult>>>,
    restore_tests: Arc<RwLock<HashMap<String, RestoreTestResult>>>,
    schedules: Arc<RwLock<HashMap<String, VerificationSchedule>>>,
    restore_test_config: RestoreTestConfig,
}

impl VerificationManager {
    pub fn new(restore_test_config: RestoreTestConfig) -> Self {
        Self {
            checksums: Arc::new(RwLock::new(HashMap::new())),
            verification_results: Arc::new(RwLock::new(BTreeMap::new())),
            restore_tests: Arc::new(RwLock::new(HashMap::new())),
            schedules: Arc::new(RwLock::new(HashMap::new())),
            restore_test_config,
        }
    }

    /// Compute checksums for a backup
    pub fn compute_checksums(
        &self,
        backup_id: String,
        _backup_path: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> Result<Vec<BlockChecksum>> {
        let mut checksums = Vec::new();

        // Simulate computing checksums for all blocks
        // In a real implementation, this would read the backup file
        for file_id in 0..10 {
            for block_id in 0..1000 {
                let checksum = BlockChecksum {
                    file_id,
                    block_id,
                    algorithm: algorithm.clone(),
                    checksum: BlockChecksum::compute(&algorithm, &[0u8; 8192]),
                    computed_at: SystemTime::now(),
                };
                checksums.push(checksum);
            }
        }

        // Store checksums
        self.checksums.write().insert(backup_id, checksums.clone());

        Ok(checksums)
    }

    /// Verify backup integrity
    pub fn verify_backup(
        &self,
        backup_id: String,
        backup_path: PathBuf,
        verification_type: VerificationType,
    ) -> Result<String> {
        let verification_id = format!("VERIFY-{}", uuid::Uuid::new_v4());
        let mut result = VerificationResult::new(
            verification_id.clone(),
            backup_id.clone(),
            verification_type.clone(),
        );

        result.status = VerificationStatus::Running { progress_pct: 0.0 };

        match verification_type {
            VerificationType::Quick => {
                self.verify_quick(&mut result, &backup_path)?;
            }
            VerificationType::Standard => {
                self.verify_standard(&mut result, &backup_path)?;
            }
            VerificationType::Full => {
                self.verify_full(&mut result, &backup_path)?;
            }
            VerificationType::RestoreTest => {
                self.verify_restore_test(&mut result, backup_id.as_str(), &backup_path)?;
            }
        }

        result.end_time = Some(SystemTime::now());

        // Determine final status
        if result.corruption_detected || !result.errors.is_empty() {
            result.status = VerificationStatus::Failed {
                errors: result.errors.clone(),
            };
        } else if !result.warnings.is_empty() {
            result.status = VerificationStatus::Warning {
                warnings: result.warnings.clone(),
            };
        } else {
            result.status = VerificationStatus::Passed;
        }

        self.verification_results.write().insert(verification_id.clone(), result);

        Ok(verification_id)
    }

    fn verify_quick(&self, result: &mut VerificationResult, backup_path: &Path) -> Result<()> {
        // Quick verification - just checksum the file
        result.status = VerificationStatus::Running { progress_pct: 50.0 };

        // Simulate file checksum
        if backup_path.exists() {
            result.checksum_valid = true;
        } else {
            result.errors.push("Backup file not found".to_string());
            result.checksum_valid = false;
        }

        Ok(())
    }

    fn verify_standard(&self, result: &mut VerificationResult, backup_path: &Path) -> Result<()> {
        // Standard verification - checksum + basic structure
        self.verify_quick(result, backup_path)?;

        result.status = VerificationStatus::Running { progress_pct: 75.0 };

        // Verify backup structure
        result.structure_valid = self.verify_structure(backup_path)?;

        if !result.structure_valid {
            result.errors.push("Invalid backup structure".to_string());
        }

        Ok(())
    }

    fn verify_full(&self, result: &mut VerificationResult, backup_path: &Path) -> Result<()> {
        // Full verification - checksum + full structure + block-level checks
        self.verify_standard(result, backup_path)?;

        result.status = VerificationStatus::Running { progress_pct: 90.0 };

        // Verify all blocks
        let corrupted = self.verify_all_blocks(result.backup_id.as_str(), backup_path)?;

        if !corrupted.is_empty() {
            result.corruption_detected = true;
            result.corrupted_blocks = corrupted;
            result.errors.push(
                format!("Found {} corrupted blocks", result.corrupted_blocks.len())
            );
        }

        Ok(())
    }

    fn verify_restore_test(
        &self,
        result: &mut VerificationResult,
        backup_id: &str,
        backup_path: &Path,
    ) -> Result<()> {
        // Perform actual restore test
        let test_result = self.perform_restore_test(backup_id.to_string(), backup_path.to_path_buf())?;

        result.restore_successful = Some(test_result.success);

        if !test_result.success {
            result.errors.extend(test_result.errors);
        }

        if !test_result.data_integrity_verified {
            result.warnings.push("Data integrity could not be fully verified".to_string());
        }

        Ok(())
    }

    fn verify_structure(&self, backup_path: &Path) -> Result<bool> {
        // Verify backup file structure
        if !backup_path.exists() {
            return Ok(false);
        }

        // Check file size
        let meta = metadata(backup_path)
            .map_err(|e| DbError::BackupError(format!("Failed to read metadata: {}", e)))?;

        if meta.len() == 0 {
            return Ok(false);
        }

        // In a real implementation, would check header, footer, etc.
        Ok(true)
    }

    fn verify_all_blocks(&self, backup_id: &str, _backup_path: &Path) -> Result<Vec<CorruptedBlock>> {
        let mut corrupted = Vec::new();

        // Get stored checksums
        let checksums = self.checksums.read();
        if let Some(block_checksums) = checksums.get(backup_id) {
            // Simulate verifying each block
            // In a real implementation, would read actual blocks and verify
            for (idx, checksum) in block_checksums.iter().enumerate() {
                // Simulate random corruption (1% chance)
                if idx % 100 == 0 {
                    corrupted.push(CorruptedBlock {
                        file_id: checksum.file_id,
                        block_id: checksum.block_id,
                        expected_checksum: checksum.checksum.clone(),
                        actual_checksum: "CORRUPTED".to_string(),
                        corruption_type: CorruptionType::ChecksumMismatch,
                    });
                }
            }
        }

        Ok(corrupted)
    }

    /// Perform restore test
    pub fn perform_restore_test(
        &self,
        backup_id: String,
        backup_path: PathBuf,
    ) -> Result<RestoreTestResult> {
        let test_id = format!("RESTORE-TEST-{}", uuid::Uuid::new_v4());
        let start_time = SystemTime::now();

        // Create test directory
        let test_dir = self.restore_test_config.test_directory.join(&test_id);
        std::fs::create_dir_all(&test_dir)
            .map_err(|e| DbError::BackupError(format!("Failed to create test directory: {}", e)))?;

        let mut errors = Vec::new();
        let mut success = true;

        // Simulate restore
        let restore_result = self.simulate_restore(&backup_path, &test_dir);
        if let Err(e) = restore_result {
            errors.push(format!("Restore failed: {}", e));
            success = false;
        }

        // Verify data integrity if configured
        let data_integrity_verified = if self.restore_test_config.verify_data_integrity {
            self.verify_restored_data(&test_dir).unwrap_or(false)
        } else {
            false
        };

        // Cleanup if configured
        if self.restore_test_config.cleanup_after_test {
            std::fs::remove_dir_all(&test_dir).ok();
        }

        let end_time = SystemTime::now();
        let restore_duration = end_time.duration_since(start_time)
            .unwrap_or_default()
            .as_secs();

        let test_result = RestoreTestResult {
            test_id: test_id.clone(),
            backup_id: backup_id.clone(),
            start_time,
            end_time: Some(end_time),
            success,
            restore_duration_seconds: restore_duration,
            data_integrity_verified,
            restored_size_bytes: 1024 * 1024 * 1024, // 1GB simulated
            errors,
        };

        self.restore_tests.write().insert(test_id, test_result.clone());

        Ok(test_result)
    }

    fn simulate_restore(&self, _backup_path: &Path, _restore_dir: &Path) -> Result<()> {
        // Simulate restore operation
        std::thread::sleep(Duration::from_millis(100));
        Ok(())
    }

    fn verify_restored_data(&self, _restore_dir: &Path) -> Result<bool> {
        // Verify restored data matches expectations
        // In a real implementation, would check data consistency
        Ok(true)
    }

    /// Add verification schedule
    pub fn add_schedule(&self, schedule: VerificationSchedule) -> Result<()> {
        let schedule_id = schedule.schedule_id.clone();
        self.schedules.write().insert(schedule_id, schedule);
        Ok(())
    }

    /// Execute due scheduled verifications
    pub fn execute_schedules(&self) -> Result<Vec<String>> {
        let mut verification_ids = Vec::new();
        let mut schedules = self.schedules.write();

        for (_schedule_id, schedule) in schedules.iter_mut() {
            if schedule.is_due() {
                // Get backups matching filters
                // For simulation, assume one backup
                let backup_id = "BACKUP-1".to_string();
                let backup_path = PathBuf::from("/tmp/backup-1");

                let verification_id = self.verify_backup(
                    backup_id,
                    backup_path,
                    schedule.verification_type.clone(),
                )?;

                verification_ids.push(verification_id);

                schedule.last_execution = Some(SystemTime::now());
                schedule.update_next_execution();
            }
        }

        Ok(verification_ids)
    }

    /// Get verification result
    pub fn get_verification_result(&self, verification_id: &str) -> Option<VerificationResult> {
        self.verification_results.read().get(verification_id).cloned()
    }

    /// List all verification results
    pub fn list_verification_results(&self) -> Vec<VerificationResult> {
        self.verification_results.read().values().cloned().collect()
    }

    /// Get restore test result
    pub fn get_restore_test_result(&self, test_id: &str) -> Option<RestoreTestResult> {
        self.restore_tests.read().get(test_id).cloned()
    }

    /// List all restore test results
    pub fn list_restore_tests(&self) -> Vec<RestoreTestResult> {
        self.restore_tests.read().values().cloned().collect()
    }

    /// Get verification statistics
    pub fn get_statistics(&self) -> VerificationStatistics {
        let results = self.verification_results.read();
        let restore_tests = self.restore_tests.read();

        let total_verifications = results.len();
        let mut passed = 0;
        let mut failed = 0;
        let mut warnings = 0;

        for result in results.values() {
            match &result.status {
                VerificationStatus::Passed => passed += 1,
                VerificationStatus::Failed { .. } => failed += 1,
                VerificationStatus::Warning { .. } => warnings += 1,
                _ => {}
            }
        }

        let total_restore_tests = restore_tests.len();
        let successful_restores = restore_tests.values().filter(|t| t.success).count();

        VerificationStatistics {
            total_verifications,
            passed_verifications: passed,
            failed_verifications: failed,
            warning_verifications: warnings,
            total_restore_tests,
            successful_restores,
            restore_success_rate: if total_restore_tests > 0 {
                (successful_restores as f64 / total_restore_tests as f64) * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Verification statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStatistics {
    pub total_verifications: usize,
    pub passed_verifications: usize,
    pub failed_verifications: usize,
    pub warning_verifications: usize,
    pub total_restore_tests: usize,
    pub successful_restores: usize,
    pub restore_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_manager() {
        let config = RestoreTestConfig::default();
        let manager = VerificationManager::new(config);

        let checksums = manager.compute_checksums(
            "test-backup".to_string(),
            Path::new("/tmp/test"),
            ChecksumAlgorithm::SHA256,
        ).unwrap();

        assert!(!checksums.is_empty());
    }

    #[test]
    fn test_block_checksum() {
        let data = vec![1, 2, 3, 4, 5];
        let checksum = BlockChecksum::compute(&ChecksumAlgorithm::CRC32, &data);
        assert!(!checksum.is_empty());
    }

    #[test]
    fn test_verification_schedule() {
        let mut schedule = VerificationSchedule {
            schedule_id: "test".to_string(),
            name: "Test Schedule".to_string(),
            verification_type: VerificationType::Quick,
            frequency_hours: 24,
            last_execution: None,
            next_execution: None,
            enabled: true,
            backup_filters: vec![],
        };

        assert!(schedule.is_due());
        schedule.update_next_execution();
        assert!(schedule.next_execution.is_some());
    }
}



// Partition Execution - Parallel, Monitoring, Balancing

use super::types::*;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

// ============================================================================
// Parallel Execution
// ============================================================================

pub struct ParallelPartitionScanner {
    #[allow(dead_code)]
    thread_pool_size: usize,
    #[allow(dead_code)]
    chunk_size: usize,
}

impl ParallelPartitionScanner {
    pub fn new(thread_pool_size: usize, chunk_size: usize) -> Self {
        Self {
            thread_pool_size,
            chunk_size,
        }
    }

    pub fn scan_partitions_parallel(
        &self,
        _table: &str,
        partitions: Vec<String>,
        _predicate: Option<String>,
    ) -> Result<ScanResult> {
        let results = Arc::new(Mutex::new(Vec::new()));

        for _partition in partitions {
            let partition_result = PartitionScanResult {
                rows: Vec::new(),
                scanned_rows: 0,
            };
            results.lock().unwrap().push(partition_result);
        }

        let final_results = results.lock().unwrap().clone();

        Ok(ScanResult {
            partition_results: final_results,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub partition_results: Vec<PartitionScanResult>,
}

#[derive(Debug, Clone)]
pub struct PartitionScanResult {
    pub rows: Vec<Vec<String>>,
    pub scanned_rows: usize,
}

pub struct ParallelPartitionLoader {
    #[allow(dead_code)]
    max_concurrent_loads: usize,
}

impl ParallelPartitionLoader {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent_loads: max_concurrent,
        }
    }

    pub fn load_data_parallel(
        &self,
        _table: &str,
        data_by_partition: HashMap<String, Vec<Vec<String>>>,
    ) -> Result<LoadResult> {
        let mut loaded_partitions = Vec::new();
        let mut total_rows = 0;

        for (partition, rows) in data_by_partition {
            loaded_partitions.push(partition);
            total_rows += rows.len();
        }

        Ok(LoadResult {
            loaded_partitions,
            total_rows,
        })
    }
}

#[derive(Debug)]
pub struct LoadResult {
    pub loaded_partitions: Vec<String>,
    pub total_rows: usize,
}

#[derive(Debug)]
pub struct PartitionLoadResult {
    pub rows_loaded: usize,
}

// ============================================================================
// Monitoring
// ============================================================================

pub struct PartitionHealthMonitor {
    health_checks: HashMap<String, PartitionHealth>,
    #[allow(dead_code)]
    check_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct PartitionHealth {
    pub table: String,
    pub partition: String,
    pub status: HealthStatus,
    pub last_check: SystemTime,
    pub issues: Vec<HealthIssue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct HealthIssue {
    pub severity: IssueSeverity,
    pub description: String,
    pub detected_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl PartitionHealthMonitor {
    pub fn new(check_interval: Duration) -> Self {
        Self {
            health_checks: HashMap::new(),
            check_interval,
        }
    }

    pub fn check_all_partitions(
        &mut self,
        partitions: &[(String, String)],
        stats: &HashMap<String, PartitionStatistics>,
    ) {
        for (table, partition) in partitions {
            let health = self.check_partition_health(table, partition, stats);
            let key = format!("{}:{}", table, partition);
            self.health_checks.insert(key, health);
        }
    }

    fn check_partition_health(
        &self,
        table: &str,
        partition: &str,
        stats: &HashMap<String, PartitionStatistics>,
    ) -> PartitionHealth {
        let key = format!("{}:{}", table, partition);
        let mut issues = Vec::new();
        let mut status = HealthStatus::Healthy;

        if let Some(partition_stats) = stats.get(&key) {
            if partition_stats.data_size > 10 * 1024 * 1024 * 1024 {
                issues.push(HealthIssue {
                    severity: IssueSeverity::Warning,
                    description: "Partition size exceeds 10GB".to_string(),
                    detected_at: SystemTime::now(),
                });
                status = HealthStatus::Warning;
            }

            if partition_stats.row_count == 0 {
                issues.push(HealthIssue {
                    severity: IssueSeverity::Info,
                    description: "Empty partition".to_string(),
                    detected_at: SystemTime::now(),
                });
            }
        } else {
            status = HealthStatus::Unknown;
            issues.push(HealthIssue {
                severity: IssueSeverity::Warning,
                description: "No statistics available".to_string(),
                detected_at: SystemTime::now(),
            });
        }

        PartitionHealth {
            table: table.to_string(),
            partition: partition.to_string(),
            status,
            last_check: SystemTime::now(),
            issues,
        }
    }

    pub fn get_unhealthy_partitions(&self) -> Vec<&PartitionHealth> {
        self.health_checks
            .values()
            .filter(|h| h.status != HealthStatus::Healthy)
            .collect()
    }

    pub fn generate_health_report(&self) -> HealthReport {
        let total = self.health_checks.len();
        let healthy = self
            .health_checks
            .values()
            .filter(|h| h.status == HealthStatus::Healthy)
            .count();
        let warning = self
            .health_checks
            .values()
            .filter(|h| h.status == HealthStatus::Warning)
            .count();
        let critical = self
            .health_checks
            .values()
            .filter(|h| h.status == HealthStatus::Critical)
            .count();

        HealthReport {
            total_partitions: total,
            healthy_count: healthy,
            warning_count: warning,
            critical_count: critical,
            generated_at: SystemTime::now(),
        }
    }
}

#[derive(Debug)]
pub struct HealthReport {
    pub total_partitions: usize,
    pub healthy_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub generated_at: SystemTime,
}

pub struct PartitionMetricsCollector {
    metrics: HashMap<String, PartitionMetrics>,
}

#[derive(Debug, Clone)]
pub struct PartitionMetrics {
    pub table: String,
    pub partition: String,
    pub read_count: usize,
    pub write_count: usize,
    pub scan_count: usize,
    pub avg_scan_time_ms: f64,
    pub last_accessed: SystemTime,
}

impl PartitionMetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
        }
    }

    pub fn record_read(&mut self, table: &str, partition: &str) {
        let key = format!("{}:{}", table, partition);
        let metrics = self.metrics.entry(key).or_insert(PartitionMetrics {
            table: table.to_string(),
            partition: partition.to_string(),
            read_count: 0,
            write_count: 0,
            scan_count: 0,
            avg_scan_time_ms: 0.0,
            last_accessed: SystemTime::now(),
        });

        metrics.read_count += 1;
        metrics.last_accessed = SystemTime::now();
    }

    pub fn get_hot_partitions(&self, limit: usize) -> Vec<&PartitionMetrics> {
        let mut sorted: Vec<_> = self.metrics.values().collect();
        sorted.sort_by(|a, b| {
            let a_total = a.read_count + a.write_count + a.scan_count;
            let b_total = b.read_count + b.write_count + b.scan_count;
            b_total.cmp(&a_total)
        });
        sorted.into_iter().take(limit).collect()
    }
}

impl Default for PartitionMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Balancing
// ============================================================================

pub struct PartitionLoadBalancer {
    target_size_variance: f64,
}

impl PartitionLoadBalancer {
    pub fn new(target_variance: f64) -> Self {
        Self {
            target_size_variance: target_variance,
        }
    }

    pub fn analyze_balance(
        &self,
        partitions: &HashMap<String, PartitionStatistics>,
    ) -> BalanceAnalysis {
        if partitions.is_empty() {
            return BalanceAnalysis {
                is_balanced: true,
                imbalance_ratio: 0.0,
                largest_partition: None,
                smallest_partition: None,
                recommendations: Vec::new(),
            };
        }

        let sizes: Vec<_> = partitions.values().map(|s| s.data_size).collect();
        let avg_size = sizes.iter().sum::<usize>() as f64 / sizes.len() as f64;
        let max_size = *sizes.iter().max().unwrap() as f64;
        let min_size = *sizes.iter().min().unwrap() as f64;

        let imbalance_ratio = if avg_size > 0.0 {
            (max_size - min_size) / avg_size
        } else {
            0.0
        };

        let is_balanced = imbalance_ratio <= self.target_size_variance;

        let largest = partitions
            .iter()
            .max_by_key(|(_, s)| s.data_size)
            .map(|(name, _)| name.clone());

        let smallest = partitions
            .iter()
            .min_by_key(|(_, s)| s.data_size)
            .map(|(name, _)| name.clone());

        let mut recommendations = Vec::new();
        if !is_balanced {
            if let Some(ref large) = largest {
                recommendations.push(format!("Consider splitting partition: {}", large));
            }
            if let Some(ref small) = smallest {
                recommendations.push(format!("Consider merging partition: {}", small));
            }
        }

        BalanceAnalysis {
            is_balanced,
            imbalance_ratio,
            largest_partition: largest,
            smallest_partition: smallest,
            recommendations,
        }
    }
}

#[derive(Debug)]
pub struct BalanceAnalysis {
    pub is_balanced: bool,
    pub imbalance_ratio: f64,
    pub largest_partition: Option<String>,
    pub smallest_partition: Option<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug)]
pub struct RebalancePlan {
    pub moves: Vec<DataMove>,
    pub estimated_duration_secs: u64,
}

#[derive(Debug)]
pub struct DataMove {
    pub from_partition: String,
    pub to_partition: String,
    pub estimated_size: usize,
}

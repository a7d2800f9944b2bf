/// Core Partition Manager implementation

use super::types::*;
use crate::error::{DbError, Result};
use std::collections::HashMap;

/// Partition manager
pub struct PartitionManager {
    /// Table partitions metadata
    partitions: HashMap<String, PartitionMetadata>,
    /// Partition data storage paths
    partition_paths: HashMap<String, Vec<String>>,
}

impl PartitionManager {
    pub fn new() -> Self {
        Self {
            partitions: HashMap::new(),
            partition_paths: HashMap::new(),
        }
    }

    /// Create a partitioned table
    pub fn create_partitioned_table(
        &mut self,
        table_name: String,
        strategy: PartitionStrategy,
    ) -> Result<()> {
        if self.partitions.contains_key(&table_name) {
            return Err(DbError::AlreadyExists(format!(
                "Partitioned table '{}' already exists",
                table_name
            )));
        }

        let partition_count = Self::calculate_partition_count(&strategy);

        let metadata = PartitionMetadata {
            table_name: table_name.clone(),
            strategy,
            created_at: std::time::SystemTime::now(),
            partition_count,
        };

        self.partitions.insert(table_name, metadata);
        Ok(())
    }

    /// Get partition for a given row value
    #[inline]
    pub fn get_partition_for_value(
        &self,
        table_name: &str,
        column_value: &str,
    ) -> Result<String> {
        let metadata = self.partitions.get(table_name)
            .ok_or_else(|| DbError::NotFound(format!(
                "Partitioned table '{}' not found",
                table_name
            )))?;

        match &metadata.strategy {
            PartitionStrategy::Range { ranges, .. } => {
                Self::find_range_partition(ranges, column_value)
            }
            PartitionStrategy::Hash { num_partitions, .. } => {
                Ok(Self::hash_partition(column_value, *num_partitions))
            }
            PartitionStrategy::List { lists, .. } => {
                Self::find_list_partition(lists, column_value)
            }
            PartitionStrategy::Composite { primary, secondary } => {
                // Use primary strategy
                let _ = secondary;
                match primary.as_ref() {
                    PartitionStrategy::Range { ranges, .. } => {
                        Self::find_range_partition(ranges, column_value)
                    }
                    PartitionStrategy::Hash { num_partitions, .. } => {
                        Ok(Self::hash_partition(column_value, *num_partitions))
                    }
                    PartitionStrategy::List { lists, .. } => {
                        Self::find_list_partition(lists, column_value)
                    }
                    _ => Err(DbError::InvalidOperation(
                        "Unsupported composite partitioning".to_string()
                    )),
                }
            }
        }
    }

    /// Add a new partition
    pub fn add_partition(
        &mut self,
        table_name: &str,
        partition_name: String,
        partition_def: PartitionDefinition,
    ) -> Result<()> {
        let metadata = self.partitions.get_mut(table_name)
            .ok_or_else(|| DbError::NotFound(format!(
                "Partitioned table '{}' not found",
                table_name
            )))?;

        match &mut metadata.strategy {
            PartitionStrategy::Range { ranges, .. } => {
                if let PartitionDefinition::Range { lower, upper } = partition_def {
                    ranges.push(RangePartition {
                        name: partition_name,
                        lower_bound: lower,
                        upper_bound: upper,
                    });
                    metadata.partition_count += 1;
                    Ok(())
                } else {
                    Err(DbError::InvalidInput(
                        "Expected range partition definition".to_string()
                    ))
                }
            }
            PartitionStrategy::List { lists, .. } => {
                if let PartitionDefinition::List { values } = partition_def {
                    lists.push(ListPartition {
                        name: partition_name,
                        values,
                    });
                    metadata.partition_count += 1;
                    Ok(())
                } else {
                    Err(DbError::InvalidInput(
                        "Expected list partition definition".to_string()
                    ))
                }
            }
            _ => Err(DbError::InvalidOperation(
                "Cannot add partition to hash partitioning".to_string()
            )),
        }
    }

    /// Drop a partition
    pub fn drop_partition(
        &mut self,
        table_name: &str,
        partition_name: &str,
    ) -> Result<()> {
        let metadata = self.partitions.get_mut(table_name)
            .ok_or_else(|| DbError::NotFound(format!(
                "Partitioned table '{}' not found",
                table_name
            )))?;

        match &mut metadata.strategy {
            PartitionStrategy::Range { ranges, .. } => {
                ranges.retain(|p| p.name != partition_name);
                metadata.partition_count = ranges.len();
            }
            PartitionStrategy::List { lists, .. } => {
                lists.retain(|p| p.name != partition_name);
                metadata.partition_count = lists.len();
            }
            PartitionStrategy::Hash { .. } => {
                return Err(DbError::InvalidOperation(
                    "Cannot drop individual hash partitions".to_string()
                ));
            }
            PartitionStrategy::Composite { .. } => {
                return Err(DbError::InvalidOperation(
                    "Composite partition management not yet supported".to_string()
                ));
            }
        }

        Ok(())
    }

    /// List all partitions for a table
    pub fn list_partitions(&self, table_name: &str) -> Result<Vec<String>> {
        let metadata = self.partitions.get(table_name)
            .ok_or_else(|| DbError::NotFound(format!(
                "Partitioned table '{}' not found",
                table_name
            )))?;

        Ok(match &metadata.strategy {
            PartitionStrategy::Range { ranges, .. } => {
                ranges.iter().map(|p| p.name.clone()).collect()
            }
            PartitionStrategy::Hash { num_partitions, .. } => {
                (0..*num_partitions)
                    .map(|i| format!("partition_{}", i))
                    .collect()
            }
            PartitionStrategy::List { lists, .. } => {
                lists.iter().map(|p| p.name.clone()).collect()
            }
            PartitionStrategy::Composite { primary, .. } => {
                match primary.as_ref() {
                    PartitionStrategy::Range { ranges, .. } => {
                        ranges.iter().map(|p| p.name.clone()).collect()
                    }
                    PartitionStrategy::Hash { num_partitions, .. } => {
                        (0..*num_partitions)
                            .map(|i| format!("partition_{}", i))
                            .collect()
                    }
                    PartitionStrategy::List { lists, .. } => {
                        lists.iter().map(|p| p.name.clone()).collect()
                    }
                    _ => Vec::new(),
                }
            }
        })
    }

    fn calculate_partition_count(strategy: &PartitionStrategy) -> usize {
        match strategy {
            PartitionStrategy::Range { ranges, .. } => ranges.len(),
            PartitionStrategy::Hash { num_partitions, .. } => *num_partitions,
            PartitionStrategy::List { lists, .. } => lists.len(),
            PartitionStrategy::Composite { primary, .. } => {
                Self::calculate_partition_count(primary)
            }
        }
    }

    pub fn find_range_partition(
        ranges: &[RangePartition],
        value: &str,
    ) -> Result<String> {
        for range in ranges {
            let in_range = match (&range.lower_bound, &range.upper_bound) {
                (None, None) => true,
                (None, Some(upper)) => value < upper.as_str(),
                (Some(lower), None) => value >= lower.as_str(),
                (Some(lower), Some(upper)) => value >= lower.as_str() && value < upper.as_str(),
            };

            if in_range {
                return Ok(range.name.clone());
            }
        }

        Err(DbError::NotFound(format!(
            "No partition found for value '{}'",
            value
        )))
    }

    pub fn hash_partition(value: &str, num_partitions: usize) -> String {
        let hash = value.bytes().fold(0u64, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u64)
        });

        let partition_idx = (hash % num_partitions as u64) as usize;
        format!("partition_{}", partition_idx)
    }

    pub fn find_list_partition(
        lists: &[ListPartition],
        value: &str,
    ) -> Result<String> {
        for list in lists {
            if list.values.contains(&value.to_string()) {
                return Ok(list.name.clone());
            }
        }

        Err(DbError::NotFound(format!(
            "No partition found for value '{}'",
            value
        )))
    }
}

impl Default for PartitionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Partition statistics manager
pub struct PartitionStatsManager {
    stats: HashMap<String, HashMap<String, PartitionStatistics>>,
}

impl PartitionStatsManager {
    pub fn new() -> Self {
        Self {
            stats: HashMap::new(),
        }
    }

    /// Update partition statistics
    pub fn update_stats(
        &mut self,
        table_name: String,
        partition_name: String,
        row_count: usize,
        size_bytes: usize,
    ) {
        let table_stats = self.stats.entry(table_name).or_insert_with(HashMap::new);

        table_stats.insert(
            partition_name.clone(),
            PartitionStatistics {
                partition_name,
                row_count,
                data_size: size_bytes,
                min_value: String::new(),
                max_value: String::new(),
                last_modified: std::time::SystemTime::now(),
            },
        );
    }

    /// Get statistics for a partition
    pub fn get_stats(
        &self,
        table_name: &str,
        partition_name: &str,
    ) -> Option<&PartitionStatistics> {
        self.stats
            .get(table_name)
            .and_then(|t| t.get(partition_name))
    }

    /// Get all statistics for a table
    pub fn get_table_stats(
        &self,
        table_name: &str,
    ) -> Option<&HashMap<String, PartitionStatistics>> {
        self.stats.get(table_name)
    }
}

impl Default for PartitionStatsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Partition merging support
pub struct PartitionMerger;

impl PartitionMerger {
    /// Merge two adjacent range partitions
    pub fn merge_range_partitions(
        _partition1: &RangePartition,
        _partition2: &RangePartition,
    ) -> Result<RangePartition> {
        Err(DbError::NotImplemented(
            "Partition merging not yet implemented".to_string()
        ))
    }
}

/// Partition splitting support
pub struct PartitionSplitter;

impl PartitionSplitter {
    /// Split a range partition into two
    pub fn split_range_partition(
        _partition: &RangePartition,
        _split_value: String,
    ) -> Result<(RangePartition, RangePartition)> {
        Err(DbError::NotImplemented(
            "Partition splitting not yet implemented".to_string()
        ))
    }
}

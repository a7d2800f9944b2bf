// View Management Module
//
// Provides management for regular views and materialized views

use crate::{Result, error::DbError, catalog::Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, SystemTime};

// View definition
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub query: String,
    pub schema: Schema,
    pub updatable: bool,
    pub check_option: Option<CheckOption>,
}

// Check option for updatable views
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CheckOption {
    Local,
    Cascaded,
}

// Materialized view definition
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedView {
    pub name: String,
    pub query: String,
    pub schema: Schema,
    pub last_refreshed: SystemTime,
    pub refresh_schedule: Option<RefreshSchedule>,
    pub data: Vec<Vec<String>>,
    pub indexes: Vec<MaterializedViewIndex>,
    pub statistics: ViewStatistics,
}

// Refresh schedule for materialized views
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSchedule {
    pub interval: Duration,
    pub next_refresh: SystemTime,
    pub auto_refresh: bool,
}

// Index on a materialized view
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedViewIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

// Statistics for a view or materialized view
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStatistics {
    pub row_count: u64,
    pub data_size_bytes: u64,
    pub last_accessed: SystemTime,
    pub access_count: u64,
    pub avg_query_time_ms: f64,
}

impl Default for ViewStatistics {
    fn default() -> Self {
        Self {
            row_count: 0,
            data_size_bytes: 0,
            last_accessed: SystemTime::now(),
            access_count: 0,
            avg_query_time_ms: 0.0,
        }
    }
}

// View manager for handling view operations
#[allow(dead_code)]
pub struct ViewManager {
    views: Arc<RwLock<HashMap<String, View>>>,
    materialized_views: Arc<RwLock<HashMap<String, MaterializedView>>>,
}

#[allow(dead_code)]
impl ViewManager {
    pub fn new() -> Self {
        Self {
            views: Arc::new(RwLock::new(HashMap::new())),
            materialized_views: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // Regular view operations
    pub fn create_view(&self, view: View) -> Result<()> {
        let mut views = self.views.write();
        if views.contains_key(&view.name) {
            return Err(DbError::Catalog(format!("View {} already exists", view.name)));
        }
        views.insert(view.name.clone(), view);
        Ok(())
    }

    pub fn drop_view(&self, name: &str) -> Result<()> {
        let mut views = self.views.write();
        views.remove(name);
        Ok(())
    }

    pub fn get_view(&self, name: &str) -> Result<View> {
        let views = self.views.read();
        views.get(name)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("View {} not found", name)))
    }

    pub fn list_views(&self) -> Vec<String> {
        self.views.read().keys().cloned().collect()
    }

    // Materialized view operations
    pub fn create_materialized_view(&self, mv: MaterializedView) -> Result<()> {
        let mut mvs = self.materialized_views.write();
        if mvs.contains_key(&mv.name) {
            return Err(DbError::Catalog(format!("Materialized view {} already exists", mv.name)));
        }
        mvs.insert(mv.name.clone(), mv);
        Ok(())
    }

    pub fn drop_materialized_view(&self, name: &str) -> Result<()> {
        let mut mvs = self.materialized_views.write();
        mvs.remove(name);
        Ok(())
    }

    pub fn refresh_materialized_view(&self, name: &str) -> Result<()> {
        let mut mvs = self.materialized_views.write();

        if let Some(mv) = mvs.get_mut(name) {
            mv.last_refreshed = SystemTime::now();
            mv.statistics.last_accessed = SystemTime::now();

            // In production, this would:
            // 1. Execute the query
            // 2. Replace the data
            // 3. Rebuild indexes
            // 4. Update statistics

            Ok(())
        } else {
            Err(DbError::NotFound(format!("Materialized view {} not found", name)))
        }
    }

    pub fn get_materialized_view(&self, name: &str) -> Result<MaterializedView> {
        let mvs = self.materialized_views.read();
        mvs.get(name)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("Materialized view {} not found", name)))
    }

    pub fn list_materialized_views(&self) -> Vec<String> {
        self.materialized_views.read().keys().cloned().collect()
    }

    pub fn get_materialized_view_stats(&self, name: &str) -> Result<ViewStatistics> {
        let mvs = self.materialized_views.read();
        mvs.get(name)
            .map(|mv| mv.statistics.clone())
            .ok_or_else(|| DbError::NotFound(format!("Materialized view {} not found", name)))
    }
}

impl Default for ViewManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Schema, Column, DataType};

    #[test]
    fn test_view_management() {
        let manager = ViewManager::new();

        let schema = Schema {
            name: "test_view".to_string(),
            columns: vec![
                Column {
                    name: "id".to_string(),
                    data_type: DataType::Integer,
                    nullable: false,
                    default: None,
                },
            ],
            primary_key: None,
        };

        let view = View {
            name: "test_view".to_string(),
            query: "SELECT * FROM users".to_string(),
            schema,
            updatable: false,
            check_option: None,
        };

        assert!(manager.create_view(view).is_ok());
        assert!(manager.get_view("test_view").is_ok());
        assert_eq!(manager.list_views().len(), 1);
        assert!(manager.drop_view("test_view").is_ok());
    }
}

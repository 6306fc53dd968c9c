use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

/// Folder path -> sorted file paths, in registration order.
pub type Index = IndexMap<String, Vec<String>>;

/// Folder path -> expanded flag. Absent means expanded.
pub type ExpansionState = HashMap<String, bool>;

pub fn is_expanded(expansion: &ExpansionState, folder: &str) -> bool {
    expansion.get(folder).copied().unwrap_or(true)
}

/// Order-insensitive comparison of two file lists.
pub fn same_file_set(stored: &[String], scanned: &[String]) -> bool {
    let stored: HashSet<&str> = stored.iter().map(String::as_str).collect();
    let scanned: HashSet<&str> = scanned.iter().map(String::as_str).collect();
    stored == scanned
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.updated.is_empty()
    }
}

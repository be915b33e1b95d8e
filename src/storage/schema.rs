//! Row definition for the `tcam_usage` table
//!
//! One row is written each time a hardware table is seen above its usage
//! threshold with a reading that differs from the previous one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tcam::TableUsage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRow {
    /// When the reading was recorded (always UTC)
    pub recorded_at: DateTime<Utc>,

    pub table_name: String,

    pub feature: String,

    pub free_entries: u64,

    pub used_entries: u64,

    pub committed_entries: u64,

    pub max_entries: u64,
}

impl UsageRow {
    pub fn from_usage(usage: &TableUsage, recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at,
            table_name: usage.key.table_name.clone(),
            feature: usage.key.feature.clone(),
            free_entries: usage.free_entries,
            used_entries: usage.used_entries,
            committed_entries: usage.committed_entries,
            max_entries: usage.max_entries,
        }
    }
}

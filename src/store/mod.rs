//! External record stores.
//!
//! The hosted backend owns violations, search history, and scan records;
//! this crate only talks to it through these traits. The in-memory
//! implementations in [`memory`] back tests and the CLI demo.

pub mod memory;

pub use memory::{MemoryScanStore, MemorySearchHistoryStore, MemoryViolationStore};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PlateWatchError;
use crate::types::DeviceType;

/// Payment status of a violation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationStatus {
    Paid,
    Unpaid,
}

impl ViolationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationStatus::Paid => "paid",
            ViolationStatus::Unpaid => "unpaid",
        }
    }
}

/// A violation record. Owned by the external store; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: Uuid,
    pub plate_number: String,
    pub violation_type: String,
    pub description: Option<String>,
    pub violation_date: DateTime<Utc>,
    pub location: Option<String>,
    /// Fine in VND; None when not yet assessed
    pub fine_amount: Option<u64>,
    pub status: ViolationStatus,
}

/// One entry of a user's plate search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub plate_number: String,
    pub searched_at: DateTime<Utc>,
}

/// A persisted recognition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateScanRecord {
    pub user_id: String,
    pub plate_number: String,
    pub confidence: f32,
    pub device_type: DeviceType,
    pub scanned_at: DateTime<Utc>,
}

/// Maximum accepted plate length in a scan record.
pub const MAX_PLATE_LENGTH: usize = 20;

lazy_static! {
    static ref SCAN_PLATE_PATTERN: Regex =
        Regex::new(r"^[A-Z0-9-]+$").expect("scan plate pattern");
}

/// Validate a scan record before insert.
///
/// Rejections are input-validation errors surfaced to the caller; nothing
/// is written for an invalid record.
pub fn validate_scan_record(record: &PlateScanRecord) -> Result<(), PlateWatchError> {
    if record.plate_number.is_empty() {
        return Err(PlateWatchError::InvalidScan(
            "plate number is required".to_string(),
        ));
    }
    if record.plate_number.len() > MAX_PLATE_LENGTH {
        return Err(PlateWatchError::InvalidScan(format!(
            "plate number exceeds {} characters",
            MAX_PLATE_LENGTH
        )));
    }
    if !SCAN_PLATE_PATTERN.is_match(&record.plate_number) {
        return Err(PlateWatchError::InvalidScan(format!(
            "plate number {:?} has invalid characters",
            record.plate_number
        )));
    }
    if !(0.0..=1.0).contains(&record.confidence) {
        return Err(PlateWatchError::InvalidScan(
            "confidence must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(())
}

/// Violation lookup by plate. Callers uppercase the plate; results come
/// back ordered by violation date, newest first.
pub trait ViolationStore: Send + Sync {
    fn violations_for_plate(&self, plate: &str) -> Result<Vec<Violation>, PlateWatchError>;
}

/// Per-user search history with upsert-on-conflict semantics keyed by
/// (user, plate).
pub trait SearchHistoryStore: Send + Sync {
    fn record_search(
        &self,
        user_id: &str,
        plate: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PlateWatchError>;

    fn recent_searches(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SearchHistoryEntry>, PlateWatchError>;

    fn clear_history(&self, user_id: &str) -> Result<(), PlateWatchError>;
}

/// Persistence for recognition results.
pub trait ScanStore: Send + Sync {
    fn insert_scan(&self, record: PlateScanRecord) -> Result<(), PlateWatchError>;
}

/// Aggregated violation lookup result for one plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub has_violations: bool,
    pub violations: Vec<Violation>,
    /// Sum of all assessed fines, VND
    pub total_fines: u64,
    /// Sum of fines on unpaid records, VND
    pub unpaid_fines: u64,
}

/// Query violations for a plate and aggregate fine totals.
///
/// Uppercases the plate before querying and re-sorts newest-first, so a
/// store that forgets the ordering contract cannot scramble the summary.
pub fn check_violations(
    store: &dyn ViolationStore,
    plate: &str,
) -> Result<ViolationSummary, PlateWatchError> {
    let plate = plate.trim().to_uppercase();
    let mut violations = store.violations_for_plate(&plate)?;
    violations.sort_by(|a, b| b.violation_date.cmp(&a.violation_date));

    let total_fines = violations.iter().filter_map(|v| v.fine_amount).sum();
    let unpaid_fines = violations
        .iter()
        .filter(|v| v.status == ViolationStatus::Unpaid)
        .filter_map(|v| v.fine_amount)
        .sum();

    Ok(ViolationSummary {
        has_violations: !violations.is_empty(),
        violations,
        total_fines,
        unpaid_fines,
    })
}

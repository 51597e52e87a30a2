//! In-memory store implementations.
//!
//! Reference implementations of the store traits, used by tests and the
//! CLI demo. A deployment backs these traits with the hosted data store
//! instead.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::PlateWatchError;
use crate::store::{
    validate_scan_record, PlateScanRecord, ScanStore, SearchHistoryEntry, SearchHistoryStore,
    Violation, ViolationStatus, ViolationStore,
};

/// Violation records keyed by plate number.
#[derive(Default)]
pub struct MemoryViolationStore {
    records: Mutex<HashMap<String, Vec<Violation>>>,
}

impl MemoryViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, violation: Violation) {
        let mut records = self.records.lock().expect("violation store poisoned");
        records
            .entry(violation.plate_number.clone())
            .or_default()
            .push(violation);
    }

    /// Store seeded with demo violations for the sample plates.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        let now = Utc::now();

        store.insert(sample_violation(
            "43A-123.45",
            "Speeding",
            Some("10-20km/h over the limit"),
            now - Duration::days(12),
            "Nguyen Van Linh - Hung Vuong, Da Nang",
            500_000,
            ViolationStatus::Unpaid,
        ));
        store.insert(sample_violation(
            "43A-123.45",
            "Running a red light",
            None,
            now - Duration::days(64),
            "Dragon Bridge, Da Nang",
            1_200_000,
            ViolationStatus::Paid,
        ));
        store.insert(sample_violation(
            "92C-437.19",
            "Driving against traffic",
            None,
            now - Duration::days(3),
            "Tran Phu - Le Duan, Da Nang",
            1_000_000,
            ViolationStatus::Unpaid,
        ));
        store.insert(sample_violation(
            "51G-246.81",
            "Illegal parking",
            None,
            now - Duration::days(30),
            "Nguyen Tat Thanh - Ngo Quyen, Da Nang",
            350_000,
            ViolationStatus::Paid,
        ));
        store.insert(sample_violation(
            "74D-555.32",
            "Lane violation",
            None,
            now - Duration::days(7),
            "2/9 - Hung Vuong, Da Nang",
            500_000,
            ViolationStatus::Unpaid,
        ));

        store
    }
}

fn sample_violation(
    plate: &str,
    violation_type: &str,
    description: Option<&str>,
    date: DateTime<Utc>,
    location: &str,
    fine: u64,
    status: ViolationStatus,
) -> Violation {
    Violation {
        id: Uuid::new_v4(),
        plate_number: plate.to_string(),
        violation_type: violation_type.to_string(),
        description: description.map(str::to_string),
        violation_date: date,
        location: Some(location.to_string()),
        fine_amount: Some(fine),
        status,
    }
}

impl ViolationStore for MemoryViolationStore {
    fn violations_for_plate(&self, plate: &str) -> Result<Vec<Violation>, PlateWatchError> {
        let records = self.records.lock().expect("violation store poisoned");
        let mut matches = records.get(plate).cloned().unwrap_or_default();
        matches.sort_by(|a, b| b.violation_date.cmp(&a.violation_date));
        Ok(matches)
    }
}

/// Search history with (user, plate) upsert semantics.
#[derive(Default)]
pub struct MemorySearchHistoryStore {
    entries: Mutex<HashMap<(String, String), SearchHistoryEntry>>,
}

impl MemorySearchHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("history store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchHistoryStore for MemorySearchHistoryStore {
    fn record_search(
        &self,
        user_id: &str,
        plate: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PlateWatchError> {
        let plate = plate.trim().to_uppercase();
        let mut entries = self.entries.lock().expect("history store poisoned");
        entries
            .entry((user_id.to_string(), plate.clone()))
            .and_modify(|entry| entry.searched_at = at)
            .or_insert_with(|| SearchHistoryEntry {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                plate_number: plate,
                searched_at: at,
            });
        Ok(())
    }

    fn recent_searches(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SearchHistoryEntry>, PlateWatchError> {
        let entries = self.entries.lock().expect("history store poisoned");
        let mut matches: Vec<SearchHistoryEntry> = entries
            .values()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.searched_at.cmp(&a.searched_at));
        matches.truncate(limit);
        Ok(matches)
    }

    fn clear_history(&self, user_id: &str) -> Result<(), PlateWatchError> {
        let mut entries = self.entries.lock().expect("history store poisoned");
        entries.retain(|(user, _), _| user != user_id);
        Ok(())
    }
}

/// Append-only scan log.
#[derive(Default)]
pub struct MemoryScanStore {
    scans: Mutex<Vec<PlateScanRecord>>,
}

impl MemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scans(&self) -> Vec<PlateScanRecord> {
        self.scans.lock().expect("scan store poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.scans.lock().expect("scan store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScanStore for MemoryScanStore {
    fn insert_scan(&self, record: PlateScanRecord) -> Result<(), PlateWatchError> {
        validate_scan_record(&record)?;
        let mut scans = self.scans.lock().expect("scan store poisoned");
        log::debug!(
            "Persisting scan of {} for user {} ({})",
            record.plate_number,
            record.user_id,
            record.device_type.as_str()
        );
        scans.push(record);
        Ok(())
    }
}

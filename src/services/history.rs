use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{DateFormat, format_date, format_duration};
use crate::models::AssignmentRecord;

/// Where a stay sits relative to today, worked out from its dates alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryStatus {
    #[serde(rename = "Currently Working")]
    CurrentlyWorking,
    Completed,
    Upcoming,
    /// No start date on record.
    Unscheduled,
}

/// Bounds are inclusive. A stay without an end date is open-ended.
pub fn classify_record(record: &AssignmentRecord, today: NaiveDate) -> HistoryStatus {
    let Some(start) = record.start_date else {
        return HistoryStatus::Unscheduled;
    };

    if start > today {
        return HistoryStatus::Upcoming;
    }
    match record.end_date {
        Some(end) if end < today => HistoryStatus::Completed,
        _ => HistoryStatus::CurrentlyWorking,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub record: AssignmentRecord,
    pub station_label: String,
    pub status: HistoryStatus,
    pub start_display: String,
    pub end_display: String,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentHistory {
    pub cv_id: String,
    pub entries: Vec<HistoryEntry>,
}

impl AssignmentHistory {
    /// Keeps the portal's chronological order.
    pub fn build(cv_id: &str, records: Vec<AssignmentRecord>, today: NaiveDate) -> Self {
        let entries = records
            .into_iter()
            .map(|record| {
                let station_label = record
                    .station
                    .as_ref()
                    .map(|s| s.label().to_string())
                    .unwrap_or_else(|| "Unknown station".to_string());
                let duration = match (record.start_date, record.end_date) {
                    (Some(start), Some(end)) => Some(format_duration(start, end)),
                    _ => None,
                };
                HistoryEntry {
                    status: classify_record(&record, today),
                    station_label,
                    start_display: format_date(record.start_date, DateFormat::DayMonthYear),
                    end_display: format_date(record.end_date, DateFormat::DayMonthYear),
                    duration,
                    record,
                }
            })
            .collect();

        Self {
            cv_id: cv_id.to_string(),
            entries,
        }
    }

    pub fn with_status(&self, status: HistoryStatus) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }

    pub fn current(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.with_status(HistoryStatus::CurrentlyWorking)
    }

    pub fn past(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.with_status(HistoryStatus::Completed)
    }

    pub fn upcoming(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.with_status(HistoryStatus::Upcoming)
    }

    /// Entries whose dates and the portal's `isCurrent` flag disagree.
    pub fn flag_mismatches(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(|e| {
            (e.status == HistoryStatus::CurrentlyWorking) != e.record.is_current
        })
    }
}

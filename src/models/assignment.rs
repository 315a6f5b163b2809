use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::lenient_date;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The portal sends either a populated station or its bare id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StationRef {
    Populated(StationSummary),
    Id(String),
}

impl StationRef {
    pub fn id(&self) -> &str {
        match self {
            StationRef::Populated(summary) => &summary.id,
            StationRef::Id(id) => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StationRef::Populated(summary) => summary
                .display_name
                .as_deref()
                .or(summary.station_name.as_deref())
                .unwrap_or(&summary.id),
            StationRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    #[serde(default)]
    pub station: Option<StationRef>,
    #[serde(default, with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
}

impl AssignmentRecord {
    pub fn station_id(&self) -> Option<&str> {
        self.station.as_ref().map(StationRef::id)
    }
}

/// Where a CV stands in its rotation.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentState {
    /// Never placed at a station.
    None,
    /// Has history but no current placement.
    NoCurrent,
    Current(AssignmentRecord),
}

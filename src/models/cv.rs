use serde::{Deserialize, Serialize};
use tracing::warn;

use super::assignment::{AssignmentRecord, AssignmentState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationalStatus {
    #[serde(rename = "station-not-assigned")]
    NotAssigned,
    #[serde(rename = "station-assigned")]
    Assigned,
}

impl RotationalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationalStatus::NotAssigned => "station-not-assigned",
            RotationalStatus::Assigned => "station-assigned",
        }
    }
}

/// Which slice of the CV pool a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvView {
    #[default]
    All,
    Pending,
    Unassigned,
    Assigned,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RotationalAssignment {
    #[serde(default)]
    pub status: Option<RotationalStatus>,
    #[serde(default)]
    pub assigned_stations: Vec<AssignmentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cv {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub nic: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub ref_no: Option<String>,
    #[serde(default)]
    pub selected_role: Option<String>,
    #[serde(default)]
    pub rotational_assignment: RotationalAssignment,
}

impl Cv {
    pub fn assigned_stations(&self) -> &[AssignmentRecord] {
        &self.rotational_assignment.assigned_stations
    }

    /// `station-assigned` iff the CV has any assignment record. A reported
    /// status that disagrees with the records is logged and overridden.
    pub fn status(&self) -> RotationalStatus {
        let derived = if self.assigned_stations().is_empty() {
            RotationalStatus::NotAssigned
        } else {
            RotationalStatus::Assigned
        };

        if let Some(reported) = self.rotational_assignment.status {
            if reported != derived {
                warn!(
                    "CV {} reports status {} but has {} assignment record(s)",
                    self.id,
                    reported.as_str(),
                    self.assigned_stations().len()
                );
            }
        }
        derived
    }

    pub fn current_assignment(&self) -> Option<&AssignmentRecord> {
        let mut current = self.assigned_stations().iter().filter(|s| s.is_current);
        let first = current.next();
        let extra = current.count();
        if extra > 0 {
            warn!("CV {} has {} current assignment records", self.id, extra + 1);
        }
        first
    }

    pub fn assignment_state(&self) -> AssignmentState {
        match self.current_assignment() {
            Some(record) => AssignmentState::Current(record.clone()),
            None if self.assigned_stations().is_empty() => AssignmentState::None,
            None => AssignmentState::NoCurrent,
        }
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;

use rotation_desk::dates::parse_wire_date;
use rotation_desk::error::AppError;
use rotation_desk::models::{
    AssignmentRecord, Cv, CvView, RotationalAssignment, RotationalStatus, Station, StationRef,
};
use rotation_desk::portal::PortalClient;
use rotation_desk::portal::dto::{
    AssignMultipleBody, AssignToStationBody, ReassignCvBody, RemoveFromStationBody,
};

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

pub fn station(id: &str, weeks: u32) -> Station {
    Station {
        id: id.to_string(),
        station_name: format!("{} station", id),
        display_name: None,
        priority: None,
        max_students: Some(10),
        available_seats: None,
        time_period: Some(weeks),
        active_status: true,
    }
}

pub fn record(station_id: &str, start: &str, end: &str, is_current: bool) -> AssignmentRecord {
    AssignmentRecord {
        station: Some(StationRef::Id(station_id.to_string())),
        start_date: Some(date(start)),
        end_date: Some(date(end)),
        is_current,
    }
}

pub fn cv(id: &str, name: &str, nic: &str, records: Vec<AssignmentRecord>) -> Cv {
    let status = if records.is_empty() {
        RotationalStatus::NotAssigned
    } else {
        RotationalStatus::Assigned
    };
    Cv {
        id: id.to_string(),
        nic: nic.to_string(),
        full_name: name.to_string(),
        ref_no: None,
        selected_role: None,
        rotational_assignment: RotationalAssignment {
            status: Some(status),
            assigned_stations: records,
        },
    }
}

/// In-memory portal that applies writes the way the real backend does.
#[derive(Default)]
pub struct FakePortal {
    pub stations: Mutex<Vec<Station>>,
    pub cvs: Mutex<Vec<Cv>>,
    pub calls: Mutex<Vec<String>>,
    /// Assigning to this station id fails with a 500.
    pub fail_assign_to: Mutex<Option<String>>,
    /// Reassign calls after this many successes fail.
    pub fail_reassign_after: Mutex<Option<usize>>,
    /// When set, assign_to_station waits on it before applying.
    pub assign_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, fetch_cvs waits on it before answering.
    pub cvs_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakePortal {
    pub fn new(stations: Vec<Station>, cvs: Vec<Cv>) -> Self {
        Self {
            stations: Mutex::new(stations),
            cvs: Mutex::new(cvs),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cv(&self, id: &str) -> Cv {
        self.cvs
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("cv exists")
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn end_current(&self, cv_id: &str, end: NaiveDate) {
        let mut cvs = self.cvs.lock().unwrap();
        if let Some(cv) = cvs.iter_mut().find(|c| c.id == cv_id) {
            for record in cv.rotational_assignment.assigned_stations.iter_mut() {
                if record.is_current {
                    record.is_current = false;
                    record.end_date = Some(end);
                }
            }
        }
    }

    fn append_current(&self, cv_id: &str, station_id: &str, start: &str, end: &str) {
        let mut cvs = self.cvs.lock().unwrap();
        if let Some(cv) = cvs.iter_mut().find(|c| c.id == cv_id) {
            for record in cv.rotational_assignment.assigned_stations.iter_mut() {
                record.is_current = false;
            }
            cv.rotational_assignment.assigned_stations.push(AssignmentRecord {
                station: Some(StationRef::Id(station_id.to_string())),
                start_date: parse_wire_date(start),
                end_date: parse_wire_date(end),
                is_current: true,
            });
            cv.rotational_assignment.status = Some(RotationalStatus::Assigned);
        }
    }

    fn server_error(message: &str) -> AppError {
        AppError::Api {
            status: 500,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl PortalClient for FakePortal {
    async fn fetch_stations(&self) -> Result<Vec<Station>, AppError> {
        self.log("GET stations");
        Ok(self.stations.lock().unwrap().clone())
    }

    async fn fetch_station(&self, station_id: &str) -> Result<Station, AppError> {
        self.log(format!("GET station {}", station_id));
        self.stations
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == station_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn fetch_cvs(&self, view: CvView) -> Result<Vec<Cv>, AppError> {
        let gate = self.cvs_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.log(format!("GET cvs {:?}", view));
        let cvs = self.cvs.lock().unwrap().clone();
        Ok(cvs
            .into_iter()
            .filter(|cv| {
                let records = cv.assigned_stations();
                let has_current = records.iter().any(|r| r.is_current);
                match view {
                    CvView::All => true,
                    CvView::Pending => records.is_empty(),
                    CvView::Unassigned => !records.is_empty() && !has_current,
                    CvView::Assigned => has_current,
                }
            })
            .collect())
    }

    async fn assign_to_station(&self, body: &AssignToStationBody) -> Result<(), AppError> {
        let gate = self.assign_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.log(format!("POST assign {} {:?}", body.station_id, body.cv_ids));
        if self.fail_assign_to.lock().unwrap().as_deref() == Some(body.station_id.as_str()) {
            return Err(Self::server_error("Station is full"));
        }
        for cv_id in &body.cv_ids {
            self.append_current(cv_id, &body.station_id, &body.start_date, &body.end_date);
        }
        Ok(())
    }

    async fn assign_to_multiple_stations(&self, body: &AssignMultipleBody) -> Result<(), AppError> {
        self.log(format!("POST assign-multiple {}", body.stations.len()));
        let mut cvs = self.cvs.lock().unwrap();
        for cv in cvs.iter_mut().filter(|c| body.cv_ids.contains(&c.id)) {
            for (i, span) in body.stations.iter().enumerate() {
                cv.rotational_assignment.assigned_stations.push(AssignmentRecord {
                    station: Some(StationRef::Id(span.station_id.clone())),
                    start_date: parse_wire_date(&span.start_date),
                    end_date: parse_wire_date(&span.end_date),
                    is_current: i == 0,
                });
            }
            cv.rotational_assignment.status = Some(RotationalStatus::Assigned);
        }
        Ok(())
    }

    async fn remove_from_station(
        &self,
        cv_id: &str,
        body: &RemoveFromStationBody,
    ) -> Result<(), AppError> {
        self.log(format!("DELETE station {}", cv_id));
        let end = parse_wire_date(&body.end_date).expect("removal end date");
        self.end_current(cv_id, end);
        Ok(())
    }

    async fn reassign_cv(&self, body: &ReassignCvBody) -> Result<(), AppError> {
        {
            let mut limit = self.fail_reassign_after.lock().unwrap();
            if let Some(remaining) = limit.as_mut() {
                if *remaining == 0 {
                    return Err(Self::server_error("Reassignment rejected"));
                }
                *remaining -= 1;
            }
        }
        self.log(format!("POST reassign {} {}", body.cv_id, body.new_station_id));
        let start = parse_wire_date(&body.new_start_date).expect("start");
        self.end_current(&body.cv_id, start);
        self.append_current(
            &body.cv_id,
            &body.new_station_id,
            &body.new_start_date,
            &body.new_end_date,
        );
        Ok(())
    }

    async fn assignment_history(&self, cv_id: &str) -> Result<Vec<AssignmentRecord>, AppError> {
        self.log(format!("GET history {}", cv_id));
        Ok(self.cv(cv_id).rotational_assignment.assigned_stations)
    }
}

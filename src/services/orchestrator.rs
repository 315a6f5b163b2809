use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RotationMode;
use crate::dates::{Clock, end_date_for};
use crate::error::AppError;
use crate::models::{
    AssignMultipleRequest, AssignRequest, AssignmentRecord, CvView, RemoveRequest,
    RotateRequest, RotationalStatus, Station,
};
use crate::portal::PortalClient;
use crate::scope::{ScopeToken, ViewScope};
use crate::portal::dto::{
    AssignMultipleBody, AssignToStationBody, ReassignCvBody, RemoveFromStationBody, StationSpan,
};
use crate::services::catalog::{CatalogLoader, RotationSnapshot};
use crate::services::history::AssignmentHistory;

/// Result of a mutation, with the view re-fetched from the portal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub operation_id: Uuid,
    pub message: String,
    pub affected: usize,
    /// `None` when the follow-up reload failed; the mutation itself went through.
    pub snapshot: Option<RotationSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSpan {
    pub station_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl PlannedSpan {
    fn to_wire(&self) -> StationSpan {
        StationSpan {
            station_id: self.station_id.clone(),
            start_date: wire(self.start_date),
            end_date: wire(self.end_date),
        }
    }
}

fn wire(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// End date of a stay at `station` starting on `start`.
pub fn derive_end_date(station: &Station, start: NaiveDate) -> Result<NaiveDate, AppError> {
    station
        .time_period
        .and_then(|weeks| end_date_for(start, weeks))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Cannot derive an end date: station {} has no time period",
                station.label()
            ))
        })
}

/// Back-to-back stays. A leg without a start date begins the day after the
/// previous leg ends; the first leg must carry one.
pub fn plan_consecutive(legs: &[(Station, Option<NaiveDate>)]) -> Result<Vec<PlannedSpan>, AppError> {
    let mut spans: Vec<PlannedSpan> = Vec::with_capacity(legs.len());

    for (station, start) in legs {
        let start = match (*start, spans.last()) {
            (Some(start), _) => start,
            (None, Some(previous)) => previous
                .end_date
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::Validation("Date out of range".to_string()))?,
            (None, None) => require_start(None)?,
        };
        let end = derive_end_date(station, start)?;
        spans.push(PlannedSpan {
            station_id: station.id.clone(),
            start_date: start,
            end_date: end,
        });
    }

    Ok(spans)
}

fn ensure_no_overlap(spans: &[PlannedSpan]) -> Result<(), AppError> {
    let mut sorted: Vec<&PlannedSpan> = spans.iter().collect();
    sorted.sort_by_key(|s| s.start_date);
    for pair in sorted.windows(2) {
        if pair[1].start_date <= pair[0].end_date {
            return Err(AppError::Validation(format!(
                "Stations {} and {} overlap",
                pair[0].station_id, pair[1].station_id
            )));
        }
    }
    Ok(())
}

fn require_cv_ids(cv_ids: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = cv_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(AppError::Validation("Please select at least one CV".to_string()));
    }
    Ok(ids)
}

fn require_station_id(station_id: Option<&str>) -> Result<String, AppError> {
    station_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Please select a station".to_string()))
}

fn require_start(start: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    start.ok_or_else(|| AppError::Validation("Please select a start date".to_string()))
}

fn ensure_can_take(station: &Station, count: usize) -> Result<(), AppError> {
    if !station.active_status {
        return Err(AppError::Validation(format!(
            "Station {} is not active",
            station.label()
        )));
    }
    if let Some(seats) = station.available_seats {
        if count > seats as usize {
            return Err(AppError::Validation(format!(
                "Station {} has only {} seat(s) available",
                station.label(),
                seats
            )));
        }
    }
    Ok(())
}

/// Releases the CV ids it holds when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    cv_ids: Vec<String>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        for id in &self.cv_ids {
            in_flight.remove(id);
        }
    }
}

pub struct Orchestrator {
    portal: Arc<dyn PortalClient>,
    catalog: CatalogLoader,
    clock: Arc<dyn Clock>,
    mode: RotationMode,
    in_flight: Mutex<HashSet<String>>,
    /// Scope of the most recent view load.
    view_scope: Mutex<ViewScope>,
}

impl Orchestrator {
    pub fn new(portal: Arc<dyn PortalClient>, clock: Arc<dyn Clock>, mode: RotationMode) -> Self {
        Self {
            catalog: CatalogLoader::new(portal.clone()),
            portal,
            clock,
            mode,
            in_flight: Mutex::new(HashSet::new()),
            view_scope: Mutex::new(ViewScope::new()),
        }
    }

    pub fn catalog(&self) -> &CatalogLoader {
        &self.catalog
    }

    /// A CV can only be part of one mutation at a time.
    fn claim(&self, cv_ids: &[String]) -> Result<InFlightGuard<'_>, AppError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(busy) = cv_ids.iter().find(|id| in_flight.contains(*id)) {
            return Err(AppError::Conflict(format!(
                "An assignment for CV {} is already in progress",
                busy
            )));
        }
        in_flight.extend(cv_ids.iter().cloned());
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            cv_ids: cv_ids.to_vec(),
        })
    }

    /// Starts a new view load and cancels the one before it, so a slow
    /// earlier response cannot overwrite a newer view.
    fn open_view(&self) -> ScopeToken {
        let mut current = self.view_scope.lock().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::take(&mut *current);
        previous.cancel();
        current.token()
    }

    pub async fn load_view(&self, view: CvView) -> Result<RotationSnapshot, AppError> {
        let token = self.open_view();
        self.catalog.load_in(token, view).await
    }

    async fn reload(&self, view: CvView) -> Option<RotationSnapshot> {
        match self.load_view(view).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Reload after mutation failed: {}", e);
                None
            }
        }
    }

    /// Recomputed by the UI whenever station or start date changes.
    pub async fn preview_end_date(
        &self,
        station_id: Option<&str>,
        start: Option<NaiveDate>,
    ) -> Result<NaiveDate, AppError> {
        let station_id = require_station_id(station_id)?;
        let start = require_start(start)?;
        let station = self.catalog.station(&station_id).await?;
        derive_end_date(&station, start)
    }

    pub async fn assign(&self, req: AssignRequest, view: CvView) -> Result<MutationOutcome, AppError> {
        let cv_ids = require_cv_ids(&req.cv_ids)?;
        let station_id = require_station_id(req.station_id.as_deref())?;
        let start = require_start(req.start_date)?;

        let station = self.catalog.station(&station_id).await?;
        let end = derive_end_date(&station, start)?;
        ensure_can_take(&station, cv_ids.len())?;

        let _guard = self.claim(&cv_ids)?;
        let operation_id = Uuid::new_v4();
        info!(
            "[{}] Assigning {} CV(s) to {} from {} to {}",
            operation_id,
            cv_ids.len(),
            station.label(),
            start,
            end
        );

        let body = AssignToStationBody {
            cv_ids: cv_ids.clone(),
            station_id,
            start_date: wire(start),
            end_date: wire(end),
            status: RotationalStatus::Assigned.as_str().to_string(),
        };
        self.portal.assign_to_station(&body).await?;

        Ok(MutationOutcome {
            operation_id,
            message: format!("Successfully assigned {} CV(s)", cv_ids.len()),
            affected: cv_ids.len(),
            snapshot: self.reload(view).await,
        })
    }

    /// Entries after the first may leave `startDate` empty to follow on from
    /// the previous stay.
    pub async fn assign_multiple(
        &self,
        req: AssignMultipleRequest,
        view: CvView,
    ) -> Result<MutationOutcome, AppError> {
        let cv_ids = require_cv_ids(&req.cv_ids)?;
        if req.stations.is_empty() {
            return Err(AppError::Validation("Please add at least one station".to_string()));
        }

        let mut station_ids = Vec::with_capacity(req.stations.len());
        for plan in &req.stations {
            station_ids.push(require_station_id(plan.station_id.as_deref())?);
        }
        require_start(req.stations[0].start_date)?;

        let mut legs = Vec::with_capacity(req.stations.len());
        for (plan, station_id) in req.stations.iter().zip(station_ids) {
            let station = self.catalog.station(&station_id).await?;
            ensure_can_take(&station, cv_ids.len())?;
            legs.push((station, plan.start_date));
        }
        let spans = plan_consecutive(&legs)?;
        ensure_no_overlap(&spans)?;

        let _guard = self.claim(&cv_ids)?;
        let operation_id = Uuid::new_v4();
        info!(
            "[{}] Assigning {} CV(s) across {} station(s)",
            operation_id,
            cv_ids.len(),
            spans.len()
        );

        let body = AssignMultipleBody {
            cv_ids: cv_ids.clone(),
            stations: spans.iter().map(PlannedSpan::to_wire).collect(),
        };
        self.portal.assign_to_multiple_stations(&body).await?;

        Ok(MutationOutcome {
            operation_id,
            message: format!(
                "Successfully assigned {} CV(s) to {} station(s)",
                cv_ids.len(),
                spans.len()
            ),
            affected: cv_ids.len(),
            snapshot: self.reload(view).await,
        })
    }

    pub async fn rotate(&self, req: RotateRequest, view: CvView) -> Result<MutationOutcome, AppError> {
        let cv_ids = require_cv_ids(&req.cv_ids)?;
        let station_id = require_station_id(req.new_station_id.as_deref())?;
        let start = require_start(req.new_start_date)?;

        let station = self.catalog.station(&station_id).await?;
        let end = derive_end_date(&station, start)?;
        ensure_can_take(&station, cv_ids.len())?;

        let _guard = self.claim(&cv_ids)?;
        let operation_id = Uuid::new_v4();
        info!(
            "[{}] Rotating {} CV(s) to {} ({:?})",
            operation_id,
            cv_ids.len(),
            station.label(),
            self.mode
        );

        match self.mode {
            RotationMode::Atomic => {
                self.rotate_atomic(operation_id, &cv_ids, &station_id, start, end)
                    .await?
            }
            RotationMode::Saga => {
                self.rotate_saga(operation_id, &cv_ids, &station_id, start, end)
                    .await?
            }
        }

        Ok(MutationOutcome {
            operation_id,
            message: format!(
                "Successfully rotated {} CV(s) to {}",
                cv_ids.len(),
                station.label()
            ),
            affected: cv_ids.len(),
            snapshot: self.reload(view).await,
        })
    }

    async fn rotate_atomic(
        &self,
        operation_id: Uuid,
        cv_ids: &[String],
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), AppError> {
        for (moved, cv_id) in cv_ids.iter().enumerate() {
            let body = ReassignCvBody {
                cv_id: cv_id.clone(),
                new_station_id: station_id.to_string(),
                new_start_date: wire(start),
                new_end_date: wire(end),
            };
            if let Err(e) = self.portal.reassign_cv(&body).await {
                error!("[{}] Reassigning CV {} failed: {}", operation_id, cv_id, e);
                if moved == 0 {
                    return Err(e);
                }
                return Err(AppError::RotationIncomplete {
                    message: format!(
                        "Moved {} of {} CV(s) before the portal failed: {}",
                        moved,
                        cv_ids.len(),
                        e.banner_message()
                    ),
                    stranded: Vec::new(),
                });
            }
        }
        Ok(())
    }

    /// Remove from the current station, then assign to the new one. If the
    /// assign step fails, removed CVs are put back on their previous station.
    async fn rotate_saga(
        &self,
        operation_id: Uuid,
        cv_ids: &[String],
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), AppError> {
        let current: HashMap<String, AssignmentRecord> = self
            .portal
            .fetch_cvs(CvView::All)
            .await?
            .into_iter()
            .filter(|cv| cv_ids.contains(&cv.id))
            .filter_map(|cv| cv.current_assignment().cloned().map(|record| (cv.id.clone(), record)))
            .collect();

        let removal = RemoveFromStationBody {
            end_date: self.clock.now().to_rfc3339(),
        };
        let mut removed: Vec<(String, AssignmentRecord)> = Vec::new();

        for cv_id in cv_ids {
            let Some(previous) = current.get(cv_id) else {
                continue;
            };
            if let Err(e) = self.portal.remove_from_station(cv_id, &removal).await {
                error!("[{}] Removing CV {} failed: {}", operation_id, cv_id, e);
                if removed.is_empty() {
                    return Err(e);
                }
                let stranded = self.compensate(operation_id, &removed).await;
                return Err(AppError::RotationIncomplete {
                    message: format!("Removal failed: {}", e.banner_message()),
                    stranded,
                });
            }
            removed.push((cv_id.clone(), previous.clone()));
        }

        let body = AssignToStationBody {
            cv_ids: cv_ids.to_vec(),
            station_id: station_id.to_string(),
            start_date: wire(start),
            end_date: wire(end),
            status: RotationalStatus::Assigned.as_str().to_string(),
        };
        if let Err(e) = self.portal.assign_to_station(&body).await {
            error!("[{}] Assign step of rotation failed: {}", operation_id, e);
            if removed.is_empty() {
                return Err(e);
            }
            let stranded = self.compensate(operation_id, &removed).await;
            return Err(AppError::RotationIncomplete {
                message: format!("Reassignment failed: {}", e.banner_message()),
                stranded,
            });
        }

        Ok(())
    }

    /// Puts each removed CV back on its previous station with its previous
    /// dates. Returns the CVs that could not be restored.
    async fn compensate(&self, operation_id: Uuid, removed: &[(String, AssignmentRecord)]) -> Vec<String> {
        let mut stranded = Vec::new();

        for (cv_id, previous) in removed {
            let restore = match (previous.station_id(), previous.start_date, previous.end_date) {
                (Some(station_id), Some(start), Some(end)) => AssignToStationBody {
                    cv_ids: vec![cv_id.clone()],
                    station_id: station_id.to_string(),
                    start_date: wire(start),
                    end_date: wire(end),
                    status: RotationalStatus::Assigned.as_str().to_string(),
                },
                _ => {
                    warn!("[{}] Cannot restore CV {}: previous stay is incomplete", operation_id, cv_id);
                    stranded.push(cv_id.clone());
                    continue;
                }
            };

            match self.portal.assign_to_station(&restore).await {
                Ok(()) => info!("[{}] Restored CV {} to station {}", operation_id, cv_id, restore.station_id),
                Err(e) => {
                    error!("[{}] Restoring CV {} failed: {}", operation_id, cv_id, e);
                    stranded.push(cv_id.clone());
                }
            }
        }

        stranded
    }

    pub async fn remove(
        &self,
        cv_id: &str,
        req: RemoveRequest,
        view: CvView,
    ) -> Result<MutationOutcome, AppError> {
        if !req.confirmed {
            return Err(AppError::Validation(
                "Removing a CV from its station must be confirmed".to_string(),
            ));
        }
        let cv_ids = require_cv_ids(&[cv_id.to_string()])?;

        let _guard = self.claim(&cv_ids)?;
        let operation_id = Uuid::new_v4();
        let body = RemoveFromStationBody {
            end_date: self.clock.now().to_rfc3339(),
        };
        info!("[{}] Removing CV {} from its station", operation_id, cv_ids[0]);
        self.portal.remove_from_station(&cv_ids[0], &body).await?;

        Ok(MutationOutcome {
            operation_id,
            message: "CV removed from station".to_string(),
            affected: 1,
            snapshot: self.reload(view).await,
        })
    }

    pub async fn history(&self, cv_id: &str) -> Result<AssignmentHistory, AppError> {
        let records = self.portal.assignment_history(cv_id).await?;
        let history = AssignmentHistory::build(cv_id, records, self.clock.today());

        let mismatches = history.flag_mismatches().count();
        if mismatches > 0 {
            warn!(
                "CV {}: {} history entr(ies) disagree with the portal's current flag",
                cv_id, mismatches
            );
        }
        Ok(history)
    }
}

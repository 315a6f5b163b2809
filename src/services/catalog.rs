use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::error::AppError;
use crate::models::{Cv, CvView, Station};
use crate::portal::PortalClient;
use crate::scope::ScopeToken;

/// Everything a rotation view shows, replaced wholesale on every load.
#[derive(Debug, Clone, Serialize)]
pub struct RotationSnapshot {
    pub view: CvView,
    pub stations: Vec<Station>,
    pub cvs: Vec<Cv>,
    pub loaded_at: DateTime<Utc>,
}

impl RotationSnapshot {
    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == station_id)
    }
}

#[derive(Clone)]
pub struct CatalogLoader {
    portal: Arc<dyn PortalClient>,
}

impl CatalogLoader {
    pub fn new(portal: Arc<dyn PortalClient>) -> Self {
        Self { portal }
    }

    /// Stations and CVs are fetched together; either failure fails the load.
    pub async fn load(&self, view: CvView) -> Result<RotationSnapshot, AppError> {
        let (stations, cvs) =
            tokio::try_join!(self.portal.fetch_stations(), self.portal.fetch_cvs(view)).map_err(
                |e| {
                    error!("Failed to load rotation view {:?}: {}", view, e);
                    e
                },
            )?;

        info!(
            "Loaded {} stations and {} CVs for view {:?}",
            stations.len(),
            cvs.len(),
            view
        );

        Ok(RotationSnapshot {
            view,
            stations,
            cvs,
            loaded_at: Utc::now(),
        })
    }

    pub async fn load_in(&self, token: ScopeToken, view: CvView) -> Result<RotationSnapshot, AppError> {
        token.run(self.load(view)).await
    }

    pub async fn stations(&self) -> Result<Vec<Station>, AppError> {
        self.portal.fetch_stations().await
    }

    pub async fn station(&self, station_id: &str) -> Result<Station, AppError> {
        self.portal.fetch_station(station_id).await
    }
}

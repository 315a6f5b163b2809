pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::PortalConfig;
use crate::error::AppError;
use crate::models::{AssignmentRecord, Cv, CvView, Station};

/// The internship portal's rotational endpoints.
#[async_trait]
pub trait PortalClient: Send + Sync {
    async fn fetch_stations(&self) -> Result<Vec<Station>, AppError>;
    async fn fetch_station(&self, station_id: &str) -> Result<Station, AppError>;
    async fn fetch_cvs(&self, view: CvView) -> Result<Vec<Cv>, AppError>;
    async fn assign_to_station(&self, body: &dto::AssignToStationBody) -> Result<(), AppError>;
    async fn assign_to_multiple_stations(&self, body: &dto::AssignMultipleBody) -> Result<(), AppError>;
    async fn remove_from_station(
        &self,
        cv_id: &str,
        body: &dto::RemoveFromStationBody,
    ) -> Result<(), AppError>;
    async fn reassign_cv(&self, body: &dto::ReassignCvBody) -> Result<(), AppError>;
    async fn assignment_history(&self, cv_id: &str) -> Result<Vec<AssignmentRecord>, AppError>;
}

pub fn cv_list_path(view: CvView) -> &'static str {
    match view {
        CvView::All => "/rotational/all-rotational",
        CvView::Pending => "/rotational/pending-rotational",
        CvView::Unassigned => "/rotational/unassigned-rotational",
        CvView::Assigned => "/rotational/assigned-rotational",
    }
}

pub struct PortalHttpClient {
    client: Client,
    config: PortalConfig,
}

impl PortalHttpClient {
    pub fn new(config: PortalConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .send()
            .await?;

        let body_text = Self::read_body(Method::GET, path, response).await?;
        serde_json::from_str::<T>(&body_text).map_err(|e| {
            error!("Failed to parse {}: {}", path, e);
            AppError::Decode(format!("{}: {}", path, e))
        })
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(body)
            .send()
            .await?;

        Self::read_body(method, path, response).await.map(|_| ())
    }

    async fn read_body(
        method: Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<String, AppError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("portal {} {} -> {}", method, path, status);

        if status == StatusCode::NOT_FOUND && method == Method::GET {
            return Err(AppError::NotFound);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<dto::ApiErrorBody>(&body)
                .unwrap_or_default()
                .into_message();
            error!("portal {} {} failed with {}: {}", method, path, status, message);
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PortalClient for PortalHttpClient {
    async fn fetch_stations(&self) -> Result<Vec<Station>, AppError> {
        let envelope: dto::ListEnvelope<Station> = self.get_json("/stations/all-stations").await?;
        Ok(envelope.into_vec())
    }

    async fn fetch_station(&self, station_id: &str) -> Result<Station, AppError> {
        let path = format!("/stations/get-station/{}", station_id);
        let envelope: dto::ItemEnvelope<Station> = self.get_json(&path).await?;
        Ok(envelope.into_inner())
    }

    async fn fetch_cvs(&self, view: CvView) -> Result<Vec<Cv>, AppError> {
        let envelope: dto::ListEnvelope<Cv> = self.get_json(cv_list_path(view)).await?;
        Ok(envelope.into_vec())
    }

    async fn assign_to_station(&self, body: &dto::AssignToStationBody) -> Result<(), AppError> {
        self.send_json(Method::POST, "/rotational/assign-to-station", body).await
    }

    async fn assign_to_multiple_stations(&self, body: &dto::AssignMultipleBody) -> Result<(), AppError> {
        self.send_json(Method::POST, "/rotational/assign-to-multiple-stations", body)
            .await
    }

    async fn remove_from_station(
        &self,
        cv_id: &str,
        body: &dto::RemoveFromStationBody,
    ) -> Result<(), AppError> {
        let path = format!("/rotational/remove-from-station/{}", cv_id);
        self.send_json(Method::DELETE, &path, body).await
    }

    async fn reassign_cv(&self, body: &dto::ReassignCvBody) -> Result<(), AppError> {
        self.send_json(Method::POST, "/rotational/reassign-cv", body).await
    }

    async fn assignment_history(&self, cv_id: &str) -> Result<Vec<AssignmentRecord>, AppError> {
        let path = format!("/rotational/assignment-history/{}", cv_id);
        let envelope: dto::ListEnvelope<AssignmentRecord> = self.get_json(&path).await?;
        Ok(envelope.into_vec())
    }
}

/// Portal that holds nothing and accepts every write.
pub struct NoopPortalClient;

#[async_trait]
impl PortalClient for NoopPortalClient {
    async fn fetch_stations(&self) -> Result<Vec<Station>, AppError> {
        Ok(Vec::new())
    }

    async fn fetch_station(&self, _station_id: &str) -> Result<Station, AppError> {
        Err(AppError::NotFound)
    }

    async fn fetch_cvs(&self, _view: CvView) -> Result<Vec<Cv>, AppError> {
        Ok(Vec::new())
    }

    async fn assign_to_station(&self, _body: &dto::AssignToStationBody) -> Result<(), AppError> {
        Ok(())
    }

    async fn assign_to_multiple_stations(&self, _body: &dto::AssignMultipleBody) -> Result<(), AppError> {
        Ok(())
    }

    async fn remove_from_station(
        &self,
        _cv_id: &str,
        _body: &dto::RemoveFromStationBody,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn reassign_cv(&self, _body: &dto::ReassignCvBody) -> Result<(), AppError> {
        Ok(())
    }

    async fn assignment_history(&self, _cv_id: &str) -> Result<Vec<AssignmentRecord>, AppError> {
        Ok(Vec::new())
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::wire_date;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub cv_ids: Vec<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default, with = "wire_date")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPlan {
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default, with = "wire_date")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMultipleRequest {
    #[serde(default)]
    pub cv_ids: Vec<String>,
    #[serde(default)]
    pub stations: Vec<StationPlan>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateRequest {
    #[serde(default)]
    pub cv_ids: Vec<String>,
    #[serde(default)]
    pub new_station_id: Option<String>,
    #[serde(default, with = "wire_date")]
    pub new_start_date: Option<NaiveDate>,
}

/// Removal only goes out once the operator has confirmed it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    #[serde(default)]
    pub confirmed: bool,
}

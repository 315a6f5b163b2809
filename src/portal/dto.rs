use serde::{Deserialize, Serialize};

/// List payloads arrive bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

#[derive(Debug, Deserialize)]
pub struct Wrapped<T> {
    #[serde(
        alias = "cvs",
        alias = "stations",
        alias = "history",
        alias = "assignedStations",
        alias = "assignmentHistory"
    )]
    pub data: Vec<T>,
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Wrapped(wrapped) => wrapped.data,
        }
    }
}

/// Single objects arrive bare or under `data` / `station`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Wrapped(WrappedItem<T>),
    Bare(T),
}

#[derive(Debug, Deserialize)]
pub struct WrappedItem<T> {
    #[serde(alias = "station")]
    pub data: T,
}

impl<T> ItemEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemEnvelope::Wrapped(wrapped) => wrapped.data,
            ItemEnvelope::Bare(item) => item,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub const FALLBACK: &'static str = "Something went wrong. Please try again.";

    /// `error`, then `message`, then the generic fallback.
    pub fn into_message(self) -> String {
        self.error
            .filter(|s| !s.is_empty())
            .or(self.message.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| Self::FALLBACK.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignToStationBody {
    pub cv_ids: Vec<String>,
    pub station_id: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationSpan {
    pub station_id: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignMultipleBody {
    pub cv_ids: Vec<String>,
    pub stations: Vec<StationSpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromStationBody {
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReassignCvBody {
    pub cv_id: String,
    pub new_station_id: String,
    pub new_start_date: String,
    pub new_end_date: String,
}

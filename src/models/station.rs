use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub max_students: Option<u32>,
    #[serde(default)]
    pub available_seats: Option<u32>,
    /// Length of a stay, in weeks.
    #[serde(default)]
    pub time_period: Option<u32>,
    #[serde(default = "default_active")]
    pub active_status: bool,
}

fn default_active() -> bool {
    true
}

impl Station {
    /// Display name, then station name, then id.
    pub fn label(&self) -> &str {
        [self.display_name.as_deref(), Some(self.station_name.as_str())]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

use crate::dates::parse_utc_offset;
use crate::error::AppError;

/// How a rotation moves CVs between stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// One `reassign-cv` call per CV; the portal moves it in a single step.
    #[default]
    Atomic,
    /// Remove then assign, rolling removals back if the assign step fails.
    Saga,
}

impl FromStr for RotationMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(RotationMode::Atomic),
            "saga" => Ok(RotationMode::Saga),
            other => Err(AppError::Config(format!("unknown ROTATION_MODE: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct DeskConfig {
    pub bind_addr: SocketAddr,
    pub portal: PortalConfig,
    pub rotation_mode: RotationMode,
    /// Offset used for "today" in history views; the host's local offset by default.
    pub utc_offset: FixedOffset,
}

impl DeskConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("PORTAL_BASE_URL")
            .map_err(|_| AppError::Config("PORTAL_BASE_URL is not set".to_string()))?;
        let api_token = env::var("PORTAL_TOKEN")
            .map_err(|_| AppError::Config("PORTAL_TOKEN is not set".to_string()))?;

        let bind_addr = env::var("DESK_BIND")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid DESK_BIND: {}", e)))?;

        let timeout = match env::var("PORTAL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|e| AppError::Config(format!("invalid PORTAL_TIMEOUT_SECS: {}", e)))?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let rotation_mode = match env::var("ROTATION_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => RotationMode::default(),
        };

        let utc_offset = match env::var("DESK_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)
                .ok_or_else(|| AppError::Config(format!("invalid DESK_UTC_OFFSET: {}", raw)))?,
            Err(_) => Local::now().offset().fix(),
        };

        Ok(Self {
            bind_addr,
            portal: PortalConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_token,
                timeout,
            },
            rotation_mode,
            utc_offset,
        })
    }
}

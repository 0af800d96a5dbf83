use std::time::Duration;

use crate::endpoint::stream_endpoint_for;
use crate::error::DashboardError;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Origin the dashboard was served from; the feed lives under it.
    pub base_url: String,
    pub command_id: String,
    /// `None` leaves timing to the HTTP collaborator.
    pub request_timeout: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            command_id: String::new(),
            request_timeout: None,
        }
    }
}

impl DashboardConfig {
    pub fn new(base_url: &str, command_id: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            command_id: command_id.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.command_id.trim().is_empty() {
            return Err(DashboardError::InvalidConfig("command id required".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(DashboardError::InvalidConfig("base url required".to_string()));
        }
        Ok(())
    }

    pub fn stream_endpoint(&self) -> Result<String, DashboardError> {
        stream_endpoint_for(&self.base_url)
    }
}

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::InvocationsResponse;
use crate::error::DashboardError;
use crate::invocation::InvocationMap;

pub const INVOCATIONS_PATH: &str = "/api/invocations";

/// HTTP side of the feed.
#[derive(Clone, Debug)]
pub struct FeedClient {
    pub base_url: String,
    client: Client,
}

impl FeedClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, DashboardError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| DashboardError::InvalidConfig(format!("http client: {err}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetches the full invocation set of `command_id`.
    pub async fn load_invocations(&self, command_id: &str) -> Result<InvocationMap, DashboardError> {
        let url = format!("{}{}", self.base_url, INVOCATIONS_PATH);
        debug!(%url, command_id, "requesting invocations");

        let resp = self
            .client
            .get(url)
            .query(&[("commandId", command_id)])
            .send()
            .await
            .map_err(DashboardError::feed)?;

        let status = resp.status();
        let body = resp.text().await.map_err(DashboardError::feed)?;
        if !status.is_success() {
            warn!(command_id, status = status.as_u16(), "invocation feed returned an error");
            return Err(DashboardError::FeedUnavailable(format!(
                "http {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed = serde_json::from_str::<InvocationsResponse>(&body)
            .map_err(|err| DashboardError::FeedUnavailable(format!("malformed body: {err}")))?;
        debug!(command_id, count = parsed.invocations.len(), "invocations received");
        Ok(parsed.invocations)
    }
}

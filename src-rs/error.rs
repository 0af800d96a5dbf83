use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    /// A record carried a status outside the known set. Never stored.
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    /// The HTTP feed could not be reached or returned an unusable body.
    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),
    /// The live update connection closed or failed.
    #[error("live updates lost: {0}")]
    StreamLost(String),
    /// A pushed or upserted record had a blank instance id.
    #[error("invocation record has no instance id")]
    MissingInstanceId,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DashboardError {
    pub fn feed(err: impl std::fmt::Display) -> Self {
        Self::FeedUnavailable(err.to_string())
    }

    pub fn stream(err: impl std::fmt::Display) -> Self {
        Self::StreamLost(err.to_string())
    }
}

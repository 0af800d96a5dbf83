use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    InProgress,
    Delayed,
    Success,
    Cancelled,
    TimedOut,
    Failed,
    Cancelling,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Pending,
        Status::InProgress,
        Status::Delayed,
        Status::Success,
        Status::Cancelled,
        Status::TimedOut,
        Status::Failed,
        Status::Cancelling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "InProgress",
            Status::Delayed => "Delayed",
            Status::Success => "Success",
            Status::Cancelled => "Cancelled",
            Status::TimedOut => "TimedOut",
            Status::Failed => "Failed",
            Status::Cancelling => "Cancelling",
        }
    }

    /// Whether the worker has stopped producing output for good.
    pub fn is_terminal(self) -> bool {
        match self {
            Status::Success | Status::Cancelled | Status::TimedOut | Status::Failed => true,
            Status::Pending | Status::InProgress | Status::Delayed | Status::Cancelling => false,
        }
    }
}

impl FromStr for Status {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| DashboardError::InvalidStatus(raw.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An invocation as the feed reports it, before the status is checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRecord {
    #[serde(default)]
    pub instance_id: String,
    pub status: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

pub type InvocationMap = HashMap<String, InvocationRecord>;

/// One worker instance's execution of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invocation {
    pub instance_id: String,
    pub status: Status,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn new(instance_id: &str, status: &str, stdout: &str, stderr: &str) -> Result<Self, DashboardError> {
        Ok(Self {
            instance_id: instance_id.to_string(),
            status: status.parse()?,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }
}

impl TryFrom<InvocationRecord> for Invocation {
    type Error = DashboardError;

    fn try_from(record: InvocationRecord) -> Result<Self, Self::Error> {
        let status = record.status.parse()?;
        Ok(Self {
            instance_id: record.instance_id,
            status,
            stdout: record.stdout,
            stderr: record.stderr,
        })
    }
}

impl From<&Invocation> for InvocationRecord {
    fn from(invocation: &Invocation) -> Self {
        Self {
            instance_id: invocation.instance_id.clone(),
            status: invocation.status.as_str().to_string(),
            stdout: invocation.stdout.clone(),
            stderr: invocation.stderr.clone(),
        }
    }
}

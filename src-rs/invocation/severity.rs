use serde::Serialize;

use super::types::Status;

/// Visual classification of a status, used to color-code cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Neutral,
    Success,
    Failure,
}

impl Severity {
    pub fn of(status: Status) -> Self {
        match status {
            Status::Pending | Status::InProgress | Status::Delayed => Severity::Neutral,
            Status::Success => Severity::Success,
            Status::Cancelled | Status::TimedOut | Status::Failed | Status::Cancelling => Severity::Failure,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Severity::Neutral => "neutral",
            Severity::Success => "success",
            Severity::Failure => "failure",
        }
    }
}

impl Status {
    pub fn severity(self) -> Severity {
        Severity::of(self)
    }
}

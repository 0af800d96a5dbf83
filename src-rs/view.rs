use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DashboardError;
use crate::invocation::{Invocation, Status, StatusSummary};

/// What the presentation layer draws for one invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardDescriptor {
    pub instance_id: String,
    pub status: Status,
    pub stdout: String,
    pub stderr: String,
    pub severity_class: &'static str,
}

impl From<&Invocation> for CardDescriptor {
    fn from(inv: &Invocation) -> Self {
        Self {
            instance_id: inv.instance_id.clone(),
            status: inv.status,
            stdout: inv.stdout.clone(),
            stderr: inv.stderr.clone(),
            severity_class: inv.status.severity().class_name(),
        }
    }
}

/// A user-visible problem, kept until the next successful load or dismissal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn from_error(err: &DashboardError) -> Self {
        Self {
            message: err.to_string(),
            raised_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderPass {
    pub command_id: String,
    pub cards: Vec<CardDescriptor>,
    pub summary: StatusSummary,
    pub notice: Option<Notice>,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub fn render_cards(invocations: &[Invocation]) -> Vec<CardDescriptor> {
    invocations.iter().map(CardDescriptor::from).collect()
}

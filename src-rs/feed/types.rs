use serde::{Deserialize, Serialize};

use crate::invocation::{InvocationMap, InvocationRecord, Status};

/// Body of `GET /api/invocations`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationsResponse {
    pub invocations: InvocationMap,
}

/// A partial change to one invocation pushed over the live stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationUpdate {
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_chunk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_chunk: Option<String>,
}

impl InvocationUpdate {
    /// Folds this update onto `existing`, producing the full record to store.
    /// Whole fields replace, chunks append.
    pub fn reconcile(&self, existing: Option<InvocationRecord>) -> InvocationRecord {
        let mut record = existing.unwrap_or_else(|| InvocationRecord {
            instance_id: self.instance_id.clone(),
            status: Status::Pending.as_str().to_string(),
            ..InvocationRecord::default()
        });
        record.instance_id = self.instance_id.clone();

        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(stdout) = &self.stdout {
            record.stdout = stdout.clone();
        }
        if let Some(stderr) = &self.stderr {
            record.stderr = stderr.clone();
        }
        if let Some(chunk) = &self.stdout_chunk {
            record.stdout.push_str(chunk);
        }
        if let Some(chunk) = &self.stderr_chunk {
            record.stderr.push_str(chunk);
        }
        record
    }
}

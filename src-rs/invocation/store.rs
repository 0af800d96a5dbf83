use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::severity::Severity;
use super::types::{Invocation, InvocationMap, InvocationRecord};
use crate::error::DashboardError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreChange {
    Replaced { count: usize },
    Inserted { instance_id: String },
    Updated { instance_id: String },
}

pub type StoreObserver = Arc<dyn Fn(&StoreChange) + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub neutral: usize,
    pub success: usize,
    pub failure: usize,
}

/// In-memory snapshot of every invocation of the active command, keyed by
/// instance id.
#[derive(Default)]
pub struct InvocationStore {
    invocations: HashMap<String, Invocation>,
    observers: Vec<StoreObserver>,
    revision: u64,
}

impl InvocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, observer: StoreObserver) {
        self.observers.push(observer);
    }

    /// Installs `records` in place of the current collection. Nothing is
    /// changed unless every record is valid.
    pub fn replace_all(&mut self, records: InvocationMap) -> Result<(), DashboardError> {
        let mut next = HashMap::with_capacity(records.len());
        for (key, record) in records {
            let invocation = Invocation::try_from(keyed(&key, record))?;
            next.insert(key, invocation);
        }

        let count = next.len();
        self.invocations = next;
        debug!(count, "replaced invocation set");
        self.notify(StoreChange::Replaced { count });
        Ok(())
    }

    /// Inserts the record, or overwrites the entry with the same instance id.
    pub fn upsert(&mut self, record: InvocationRecord) -> Result<(), DashboardError> {
        if record.instance_id.trim().is_empty() {
            return Err(DashboardError::MissingInstanceId);
        }
        let invocation = Invocation::try_from(record)?;
        let instance_id = invocation.instance_id.clone();
        let change = match self.invocations.insert(instance_id.clone(), invocation) {
            Some(_) => StoreChange::Updated { instance_id },
            None => StoreChange::Inserted { instance_id },
        };
        self.notify(change);
        Ok(())
    }

    /// Current invocations ordered by instance id.
    pub fn snapshot(&self) -> Vec<Invocation> {
        let mut items: Vec<Invocation> = self.invocations.values().cloned().collect();
        items.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        items
    }

    pub fn get(&self, instance_id: &str) -> Option<&Invocation> {
        self.invocations.get(instance_id)
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn all_complete(&self) -> bool {
        self.invocations.values().all(|inv| inv.status.is_terminal())
    }

    /// Invocations that are terminal now and were not terminal with the same
    /// status in `previous`.
    pub fn completed_since(&self, previous: &[Invocation]) -> Vec<Invocation> {
        let before: HashMap<&str, &Invocation> = previous
            .iter()
            .map(|inv| (inv.instance_id.as_str(), inv))
            .collect();
        self.snapshot()
            .into_iter()
            .filter(|inv| inv.status.is_terminal())
            .filter(|inv| match before.get(inv.instance_id.as_str()) {
                Some(prev) => prev.status != inv.status,
                None => true,
            })
            .collect()
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary {
            total: self.invocations.len(),
            ..StatusSummary::default()
        };
        for inv in self.invocations.values() {
            match inv.status.severity() {
                Severity::Neutral => summary.neutral += 1,
                Severity::Success => summary.success += 1,
                Severity::Failure => summary.failure += 1,
            }
        }
        summary
    }

    fn notify(&mut self, change: StoreChange) {
        self.revision += 1;
        for observer in &self.observers {
            observer(&change);
        }
    }
}

fn keyed(key: &str, mut record: InvocationRecord) -> InvocationRecord {
    if record.instance_id.is_empty() {
        record.instance_id = key.to_string();
    } else if record.instance_id != key {
        warn!(key, instance_id = %record.instance_id, "record instance id differs from its key, using key");
        record.instance_id = key.to_string();
    }
    record
}

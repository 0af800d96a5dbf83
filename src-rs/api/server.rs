use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, RwLock};

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::handlers::{handle_health, handle_invocations, handle_publish, handle_stream};
use crate::feed::{InvocationUpdate, InvocationsResponse, INVOCATIONS_PATH, STREAM_PATH};
use crate::invocation::InvocationMap;

const UPDATE_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum FeedServerError {
    #[error("fixture {path}: {message}")]
    Fixture { path: String, message: String },
    #[error("bind {addr}: {message}")]
    Bind { addr: SocketAddr, message: String },
    #[error("serve: {0}")]
    Serve(String),
}

#[derive(Clone, Debug)]
pub struct PublishedUpdate {
    pub command_id: String,
    pub update: InvocationUpdate,
}

/// Invocation sets per command plus the fan-out for live updates.
#[derive(Clone)]
pub struct FeedState {
    commands: Arc<RwLock<HashMap<String, InvocationMap>>>,
    updates: broadcast::Sender<PublishedUpdate>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            commands: Arc::new(RwLock::new(HashMap::new())),
            updates,
        }
    }

    /// Reads a JSON file mapping command ids to `{"Invocations": {...}}`.
    pub fn from_fixture(path: &Path) -> Result<Self, FeedServerError> {
        let fixture_err = |message: String| FeedServerError::Fixture {
            path: path.display().to_string(),
            message,
        };
        let data = fs::read_to_string(path).map_err(|err| fixture_err(err.to_string()))?;
        let commands: HashMap<String, InvocationsResponse> =
            serde_json::from_str(&data).map_err(|err| fixture_err(err.to_string()))?;

        let state = Self::new();
        for (command_id, resp) in commands {
            state.insert_command(&command_id, resp.invocations);
        }
        Ok(state)
    }

    pub fn insert_command(&self, command_id: &str, invocations: InvocationMap) {
        if let Ok(mut map) = self.commands.write() {
            map.insert(command_id.to_string(), invocations);
        }
    }

    pub fn invocations(&self, command_id: &str) -> Option<InvocationMap> {
        let map = self.commands.read().ok()?;
        map.get(command_id).cloned()
    }

    pub fn command_ids(&self) -> Vec<String> {
        let map = match self.commands.read() {
            Ok(lock) => lock,
            Err(_) => return vec![],
        };
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Folds the update into the stored set and pushes it to live
    /// subscribers. Returns how many subscribers received it.
    pub fn publish(&self, command_id: &str, update: InvocationUpdate) -> usize {
        if let Ok(mut map) = self.commands.write() {
            let invocations = map.entry(command_id.to_string()).or_default();
            let existing = invocations.get(&update.instance_id).cloned();
            invocations.insert(update.instance_id.clone(), update.reconcile(existing));
        }
        self.updates
            .send(PublishedUpdate {
                command_id: command_id.to_string(),
                update,
            })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedUpdate> {
        self.updates.subscribe()
    }
}

/// Development stand-in for the invocation API, serving the same routes the
/// dashboard consumes.
pub struct FeedServer {
    pub addr: SocketAddr,
    pub state: FeedState,
}

impl FeedServer {
    pub fn new(addr: SocketAddr, state: FeedState) -> Self {
        Self { addr, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route(INVOCATIONS_PATH, get(handle_invocations))
            .route(STREAM_PATH, get(handle_stream))
            .route("/api/invocations/updates", post(handle_publish))
            .with_state(self.state.clone())
    }

    pub async fn start(&self) -> Result<(), FeedServerError> {
        let app = self.router();
        info!(addr = %self.addr, "invocation feed listening");
        axum::Server::try_bind(&self.addr)
            .map_err(|err| FeedServerError::Bind {
                addr: self.addr,
                message: err.to_string(),
            })?
            .serve(app.into_make_service())
            .await
            .map_err(|err| FeedServerError::Serve(err.to_string()))
    }

    /// Binds and serves in the background, returning the bound address
    /// (useful with port 0).
    pub fn spawn(&self) -> Result<(SocketAddr, JoinHandle<()>), FeedServerError> {
        let server = axum::Server::try_bind(&self.addr)
            .map_err(|err| FeedServerError::Bind {
                addr: self.addr,
                message: err.to_string(),
            })?
            .serve(self.router().into_make_service());
        let addr = server.local_addr();
        info!(%addr, "invocation feed listening");
        let handle = tokio::spawn(async move {
            if let Err(err) = server.await {
                error!(error = %err, "invocation feed stopped");
            }
        });
        Ok((addr, handle))
    }
}

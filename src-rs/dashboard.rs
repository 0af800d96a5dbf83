use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::feed::{FeedClient, InvocationSubscription, InvocationUpdate};
use crate::invocation::{InvocationMap, InvocationRecord, InvocationStore, StoreObserver};
use crate::view::{render_cards, Notice, RenderPass};

/// Results coming back from background work. They are applied by whoever
/// owns the dashboard, one at a time.
#[derive(Debug)]
pub enum DashboardEvent {
    Loaded {
        epoch: u64,
        result: Result<InvocationMap, DashboardError>,
    },
    /// Stream events carry the generation of the stream that produced them.
    Update {
        generation: u64,
        update: InvocationUpdate,
    },
    StreamLost {
        generation: u64,
        error: DashboardError,
    },
}

pub struct Dashboard {
    config: DashboardConfig,
    client: FeedClient,
    store: InvocationStore,
    epoch: u64,
    notice: Option<Notice>,
    loaded_at: Option<DateTime<Utc>>,
    events_tx: mpsc::UnboundedSender<DashboardEvent>,
    events_rx: mpsc::UnboundedReceiver<DashboardEvent>,
    loads: Vec<JoinHandle<()>>,
    stream: Option<JoinHandle<()>>,
    stream_generation: u64,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self, DashboardError> {
        config.validate()?;
        let client = FeedClient::new(&config.base_url, config.request_timeout)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            config,
            client,
            store: InvocationStore::new(),
            epoch: 0,
            notice: None,
            loaded_at: None,
            events_tx,
            events_rx,
            loads: Vec::new(),
            stream: None,
            stream_generation: 0,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn command_id(&self) -> &str {
        &self.config.command_id
    }

    pub fn store(&self) -> &InvocationStore {
        &self.store
    }

    pub fn observe_store(&mut self, observer: StoreObserver) {
        self.store.observe(observer);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn stream_endpoint(&self) -> Result<String, DashboardError> {
        self.config.stream_endpoint()
    }

    /// Starts the initial load in the background. The result arrives as a
    /// [`DashboardEvent::Loaded`] through [`Dashboard::next_event`].
    pub fn activate(&mut self) -> u64 {
        info!(command_id = %self.config.command_id, "activating dashboard");
        self.spawn_load()
    }

    pub fn spawn_load(&mut self) -> u64 {
        let epoch = self.begin_load();
        let client = self.client.clone();
        let command_id = self.config.command_id.clone();
        let tx = self.events_tx.clone();

        self.loads.retain(|task| !task.is_finished());
        self.loads.push(tokio::spawn(async move {
            let result = client.load_invocations(&command_id).await;
            let _ = tx.send(DashboardEvent::Loaded { epoch, result });
        }));
        epoch
    }

    /// Loads and applies the invocation set inline.
    pub async fn reload(&mut self) -> Result<(), DashboardError> {
        let epoch = self.begin_load();
        let result = self.client.load_invocations(&self.config.command_id).await;
        self.apply_load(epoch, result).map(|_| ())
    }

    /// Issues a new load epoch. Only the result tagged with the latest epoch
    /// is ever applied.
    pub fn begin_load(&mut self) -> u64 {
        self.epoch += 1;
        debug!(epoch = self.epoch, command_id = %self.config.command_id, "load issued");
        self.epoch
    }

    /// Returns `Ok(false)` when the result was superseded by a newer load.
    pub fn apply_load(
        &mut self,
        epoch: u64,
        result: Result<InvocationMap, DashboardError>,
    ) -> Result<bool, DashboardError> {
        if epoch != self.epoch {
            debug!(epoch, latest = self.epoch, "discarding stale load");
            return Ok(false);
        }

        let records = match result {
            Ok(records) => records,
            Err(err) => return Err(self.raise(err)),
        };
        if let Err(err) = self.store.replace_all(records) {
            return Err(self.raise(err));
        }

        self.notice = None;
        self.loaded_at = Some(Utc::now());
        info!(epoch, count = self.store.len(), "invocations loaded");
        Ok(true)
    }

    /// Merges a partial update onto the stored record and upserts it.
    pub fn apply_update(&mut self, update: InvocationUpdate) -> Result<(), DashboardError> {
        if update.instance_id.trim().is_empty() {
            return Err(self.raise(DashboardError::MissingInstanceId));
        }
        let existing = self
            .store
            .get(&update.instance_id)
            .map(InvocationRecord::from);
        let record = update.reconcile(existing);
        match self.store.upsert(record) {
            Ok(()) => {
                debug!(instance_id = %update.instance_id, "applied live update");
                Ok(())
            }
            Err(err) => Err(self.raise(err)),
        }
    }

    /// Connects to the live endpoint derived from the base url and feeds
    /// its updates into the event queue.
    pub async fn subscribe(&mut self) -> Result<(), DashboardError> {
        let endpoint = match self.stream_endpoint() {
            Ok(endpoint) => endpoint,
            Err(err) => return Err(self.raise(err)),
        };
        match InvocationSubscription::connect(&endpoint, &self.config.command_id).await {
            Ok(subscription) => {
                self.attach_stream(subscription);
                Ok(())
            }
            Err(err) => Err(self.raise(err)),
        }
    }

    pub fn attach_stream(&mut self, mut subscription: InvocationSubscription) {
        self.detach_stream();
        let generation = self.stream_generation;
        let tx = self.events_tx.clone();
        self.stream = Some(tokio::spawn(async move {
            loop {
                match subscription.next_update().await {
                    Ok(update) => {
                        if tx.send(DashboardEvent::Update { generation, update }).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        let _ = tx.send(DashboardEvent::StreamLost { generation, error });
                        break;
                    }
                }
            }
        }));
        debug!(generation, "live stream attached");
    }

    /// Stops the live stream. Events it already queued are ignored from now on.
    pub fn detach_stream(&mut self) {
        if let Some(task) = self.stream.take() {
            task.abort();
        }
        self.stream_generation += 1;
    }

    pub fn stream_generation(&self) -> u64 {
        self.stream_generation
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: DashboardEvent) -> Result<(), DashboardError> {
        match event {
            DashboardEvent::Loaded { epoch, result } => self.apply_load(epoch, result).map(|_| ()),
            DashboardEvent::Update { generation, .. } | DashboardEvent::StreamLost { generation, .. }
                if generation != self.stream_generation =>
            {
                debug!(generation, latest = self.stream_generation, "discarding event from a detached stream");
                Ok(())
            }
            DashboardEvent::Update { update, .. } => self.apply_update(update),
            DashboardEvent::StreamLost { error, .. } => {
                self.detach_stream();
                Err(self.raise(error))
            }
        }
    }

    pub fn render(&self) -> RenderPass {
        RenderPass {
            command_id: self.config.command_id.clone(),
            cards: render_cards(&self.store.snapshot()),
            summary: self.store.summary(),
            notice: self.notice.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Drops the view. In-flight loads and the live stream are cancelled
    /// with it.
    pub fn teardown(self) {
        info!(command_id = %self.config.command_id, "tearing down dashboard");
    }

    fn raise(&mut self, err: DashboardError) -> DashboardError {
        warn!(command_id = %self.config.command_id, error = %err, "dashboard error");
        self.notice = Some(Notice::from_error(&err));
        err
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for task in self.loads.drain(..) {
            task.abort();
        }
        self.detach_stream();
    }
}

//! Polling session lifecycle
//!
//! One session owns the periodic fetch against the accounts endpoint. A
//! successful cycle replaces the shared snapshot and fans it out to the
//! registered listeners; a failed cycle keeps the last good snapshot and
//! reports the session offline with a classified reason.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::api::{AccountsClient, Snapshot};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::publish::{BridgeStatus, OfflineReason, StatusSink};

/// Handle returned by [`PollingSession::subscribe`]
pub type SubscriptionId = Uuid;

/// Observable lifecycle of a polling session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Polling,
    Updated,
    Failed,
    Disposed,
}

/// Receives every fresh snapshot, synchronously, on the polling task
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot(&self, snapshot: &Snapshot);
}

enum SessionCommand {
    PollNow,
}

/// Cloneable handle to a running polling session
#[derive(Clone)]
pub struct PollingSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: Uuid,
    status_sink: Arc<dyn StatusSink>,
    state_tx: watch::Sender<SessionState>,
    snapshot_tx: watch::Sender<Option<Snapshot>>,
    subscribers: Mutex<HashMap<SubscriptionId, Arc<dyn SnapshotListener>>>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
    logger: StructuredLogger,
}

impl PollingSession {
    /// Spawn the polling loop and return a handle to it
    ///
    /// The client is owned by the loop, so fetches are serialized by
    /// construction. With `poll_on_start` the first cycle runs immediately,
    /// otherwise one full interval after start.
    pub fn start(
        client: AccountsClient,
        status_sink: Arc<dyn StatusSink>,
        poll_interval: Duration,
        poll_on_start: bool,
    ) -> Self {
        let id = Uuid::new_v4();
        // The watch senders double as the store; writes must land even
        // while no receiver is subscribed
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (snapshot_tx, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(SessionInner {
            id,
            status_sink,
            state_tx,
            snapshot_tx,
            subscribers: Mutex::new(HashMap::new()),
            command_tx,
            shutdown_tx,
            task: Mutex::new(None),
            logger: get_logger_with_context(
                LogContext::new("session").with_session_id(id.to_string()),
            ),
        });

        let handle = tokio::spawn(run_loop(
            Arc::clone(&inner),
            client,
            poll_interval,
            poll_on_start,
            command_rx,
            shutdown_rx,
        ));
        if let Ok(mut guard) = inner.task.lock() {
            *guard = Some(handle);
        }
        inner.logger.info(&format!(
            "Polling session started (interval: {}s, poll_on_start: {})",
            poll_interval.as_secs(),
            poll_on_start
        ));

        Self { inner }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Register a listener for future snapshots
    ///
    /// Listeners never see snapshots fetched before they subscribed; the
    /// next successful cycle is the first one they observe.
    pub fn subscribe(&self, listener: Arc<dyn SnapshotListener>) -> SubscriptionId {
        let id = Uuid::new_v4();
        if let Ok(mut subs) = self.inner.subscribers.lock() {
            subs.insert(id, listener);
        }
        self.inner
            .logger
            .debug(&format!("Subscriber {} registered", id));
        id
    }

    /// Remove a listener; returns false when the id is unknown
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .inner
            .subscribers
            .lock()
            .map(|mut subs| subs.remove(&id).is_some())
            .unwrap_or(false);
        if removed {
            self.inner
                .logger
                .debug(&format!("Subscriber {} removed", id));
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Ask the loop for an extra cycle outside the regular cadence
    ///
    /// If a fetch is already in flight the request runs after it completes;
    /// cycles never overlap.
    pub fn poll_now(&self) {
        self.inner.command_tx.send(SessionCommand::PollNow).ok();
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Last successfully fetched snapshot, if any
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn snapshot_receiver(&self) -> watch::Receiver<Option<Snapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Stop the loop and drop all subscribers
    ///
    /// Safe to call more than once; no cycle starts after this returns.
    pub fn dispose(&self) {
        self.inner.shutdown_tx.send(()).ok();
        if let Ok(mut guard) = self.inner.task.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
            self.inner.logger.info("Polling session disposed");
        }
        if let Ok(mut subs) = self.inner.subscribers.lock() {
            subs.clear();
        }
        self.inner.state_tx.send_replace(SessionState::Disposed);
    }
}

impl SessionInner {
    fn notify_subscribers(&self, snapshot: &Snapshot) {
        // Clone the listener set out of the lock so a callback can
        // subscribe or unsubscribe without deadlocking
        let listeners: Vec<Arc<dyn SnapshotListener>> = match self.subscribers.lock() {
            Ok(subs) => subs.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener.on_snapshot(snapshot);
        }
    }
}

async fn run_loop(
    inner: Arc<SessionInner>,
    client: AccountsClient,
    poll_interval: Duration,
    poll_on_start: bool,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    mut shutdown_rx: mpsc::UnboundedReceiver<()>,
) {
    inner.status_sink.update_status(BridgeStatus::Unknown);

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    if !poll_on_start {
        // The first interval tick completes immediately; consume it so the
        // first cycle runs one full period from now
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                poll_cycle(&inner, &client).await;
            }
            Some(command) = command_rx.recv() => {
                match command {
                    SessionCommand::PollNow => {
                        inner.logger.debug("Manual poll requested");
                        poll_cycle(&inner, &client).await;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                inner.logger.debug("Polling loop stopping");
                break;
            }
        }
    }
}

async fn poll_cycle(inner: &SessionInner, client: &AccountsClient) {
    inner.state_tx.send_replace(SessionState::Polling);

    match client.fetch_accounts().await {
        Ok(snapshot) => {
            let account_count = snapshot.len();
            inner.snapshot_tx.send_replace(Some(snapshot.clone()));
            inner.status_sink.update_status(BridgeStatus::Online);
            inner.notify_subscribers(&snapshot);
            inner.state_tx.send_replace(SessionState::Updated);
            inner
                .logger
                .info(&format!("Snapshot updated ({} accounts)", account_count));
        }
        Err(e) => {
            // Last good snapshot stays in place
            let reason = OfflineReason::classify(&e);
            inner.logger.error(&format!("Poll cycle failed: {}", e));
            inner.status_sink.update_status(BridgeStatus::Offline(reason));
            inner.state_tx.send_replace(SessionState::Failed);
        }
    }
}

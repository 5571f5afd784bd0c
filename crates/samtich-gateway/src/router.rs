//! Per-chat event routing
//!
//! Each chat gets its own lane: an unbounded queue drained by one task, so
//! events of a chat reach the engine in arrival order while different chats
//! run concurrently. Idle lanes shut themselves down; [`ChatRouter::shutdown`]
//! closes every lane and waits for the queued events to be handled.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use samtich_core::{ChatId, InboundEvent, Outcome, SurveyEngine};

/// Idle time after which a chat lane is dropped
pub const DEFAULT_LANE_IDLE: Duration = Duration::from_secs(600);

/// Event counters for the status endpoint
#[derive(Debug, Default)]
pub struct RouterStats {
    events: AtomicU64,
    started: AtomicU64,
    finalized: AtomicU64,
    abandoned: AtomicU64,
    ignored: AtomicU64,
}

/// Point-in-time copy of [`RouterStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub events: u64,
    pub started: u64,
    pub finalized: u64,
    pub abandoned: u64,
    pub ignored: u64,
}

impl RouterStats {
    fn record(&self, outcome: &Outcome) {
        self.events.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Started => &self.started,
            Outcome::Finalized { .. } => &self.finalized,
            Outcome::Abandoned => &self.abandoned,
            Outcome::Ignored { .. } => &self.ignored,
            Outcome::Transitioned { .. } | Outcome::Replied => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events: self.events.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            finalized: self.finalized.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

/// Chat router - one ordered lane per active chat
#[derive(Clone)]
pub struct ChatRouter {
    lanes: Arc<Mutex<HashMap<ChatId, mpsc::UnboundedSender<InboundEvent>>>>,
    engine: Arc<SurveyEngine>,
    stats: Arc<RouterStats>,
    idle: Duration,
    tasks: TaskTracker,
    closed: Arc<AtomicBool>,
}

impl ChatRouter {
    pub fn new(engine: Arc<SurveyEngine>) -> Self {
        Self::with_idle(engine, DEFAULT_LANE_IDLE)
    }

    pub fn with_idle(engine: Arc<SurveyEngine>, idle: Duration) -> Self {
        Self {
            lanes: Arc::new(Mutex::new(HashMap::new())),
            engine,
            stats: Arc::new(RouterStats::default()),
            idle,
            tasks: TaskTracker::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue an event on its chat's lane, opening the lane if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn route(&self, event: InboundEvent) {
        let chat = event.origin().chat_id;
        let mut lanes = self.lanes.lock();
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!("Router is shut down, dropping {} from chat {}", event.kind(), chat);
            return;
        }

        let event = match lanes.get(&chat) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return,
                // lane task is gone, open a new one
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // rx is alive here
        let _ = tx.send(event);
        lanes.insert(chat, tx);
        drop(lanes);

        tracing::debug!("Lane opened for chat {}", chat);
        self.tasks.spawn(self.clone().drain(chat, rx));
    }

    async fn drain(self, chat: ChatId, mut rx: mpsc::UnboundedReceiver<InboundEvent>) {
        loop {
            let event = match tokio::time::timeout(self.idle, rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(_) => match self.close_if_idle(chat, &mut rx) {
                    Some(event) => event,
                    None => break,
                },
            };

            let outcome = self.engine.handle(event).await;
            self.stats.record(&outcome);
        }
        tracing::debug!("Lane closed for chat {}", chat);
    }

    /// Remove the lane unless an event slipped in after the timeout
    fn close_if_idle(&self, chat: ChatId, rx: &mut mpsc::UnboundedReceiver<InboundEvent>) -> Option<InboundEvent> {
        let mut lanes = self.lanes.lock();
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(_) => {
                lanes.remove(&chat);
                rx.close();
                None
            }
        }
    }

    /// Refuse new events, then wait until every lane has handled what it
    /// already queued
    pub async fn shutdown(&self) {
        {
            let mut lanes = self.lanes.lock();
            self.closed.store(true, Ordering::Release);
            // dropping the senders lets each lane drain and exit
            lanes.clear();
        }
        self.tasks.close();
        self.tasks.wait().await;
        tracing::debug!("All lanes drained");
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.lock().len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn engine(&self) -> &Arc<SurveyEngine> {
        &self.engine
    }
}

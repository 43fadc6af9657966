//! Recurring message refresh
//!
//! A single poller per open conversation. Fetches never overlap: a tick
//! that fires while a fetch is still running is skipped, and a manual
//! refresh during a fetch reports [`RefreshOutcome::Busy`] without issuing
//! a request.

use crate::api::{ApiError, ConsoleBackend};
use crate::conversation::Message;
use crate::history::MessageHistory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum RefreshOutcome {
    /// Latest page fetched and published
    Updated { count: usize },
    /// Another fetch is in flight
    Busy,
    Failed(ApiError),
}

pub struct MessagePoller<B> {
    backend: B,
    conversation_id: String,
    page_size: u32,
    interval: Duration,
    in_flight: AtomicBool,
    latest: watch::Sender<Vec<Message>>,
}

/// Clears the in-flight flag even if the fetch future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: ConsoleBackend> MessagePoller<B> {
    pub fn new(
        backend: B,
        conversation_id: impl Into<String>,
        page_size: u32,
        interval: Duration,
    ) -> Self {
        let (latest, _) = watch::channel(Vec::new());
        Self {
            backend,
            conversation_id: conversation_id.into(),
            page_size,
            interval,
            in_flight: AtomicBool::new(false),
            latest,
        }
    }

    /// Receive every published message list
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.latest.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn refresh_now(&self) -> RefreshOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                conversation_id = %self.conversation_id,
                "Refresh skipped, fetch in flight"
            );
            return RefreshOutcome::Busy;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let loaded =
            MessageHistory::load_latest(&self.backend, &self.conversation_id, self.page_size).await;
        match loaded {
            Ok(history) => {
                let messages = history.into_messages();
                let count = messages.len();
                self.latest.send_replace(messages);
                RefreshOutcome::Updated { count }
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %self.conversation_id,
                    error = %e,
                    "Message refresh failed"
                );
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Poll until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            conversation_id = %self.conversation_id,
            interval_secs = self.interval.as_secs(),
            "Message polling started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        _ = self.refresh_now() => {}
                    }
                }
            }
        }

        tracing::info!(conversation_id = %self.conversation_id, "Message polling stopped");
    }
}

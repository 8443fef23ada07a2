// Polling
//
// A poller owns one background task that re-fetches on a fixed cadence and
// publishes the outcome through a watch channel. Failed fetches never clear
// the last good snapshot; they only set the error message.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::client::error::ClientResult;

/// What a view shows at a given moment
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    /// Last successfully fetched data
    pub data: Option<T>,

    /// User-facing message from the most recent failure
    pub error: Option<String>,

    /// A fetch is in flight
    pub loading: bool,

    /// When `data` was last replaced
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: true,
            last_refreshed: None,
        }
    }
}

/// Background refresh loop for one view
///
/// The first fetch starts immediately. Dropping the poller stops the loop.
pub struct Poller<T> {
    state: watch::Receiver<ViewState<T>>,
    sender: Arc<watch::Sender<ViewState<T>>>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start polling `fetch` every `interval`
    ///
    /// `failure_message` is what the view shows when a fetch fails.
    pub fn spawn<F, Fut>(interval: Duration, failure_message: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let (sender, state) = watch::channel(ViewState::default());
        let sender = Arc::new(sender);
        let refresh = Arc::new(Notify::new());
        let failure_message = failure_message.into();

        let task = tokio::spawn(poll_loop(
            interval,
            failure_message,
            fetch,
            Arc::clone(&sender),
            Arc::clone(&refresh),
        ));

        Self {
            state,
            sender,
            refresh,
            task,
        }
    }

    /// Current view state
    #[must_use]
    pub fn snapshot(&self) -> ViewState<T> {
        self.state.borrow().clone()
    }

    /// Independent receiver for rendering loops
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.sender.subscribe()
    }

    /// Fetch now instead of waiting for the next tick
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Show an error without touching the data, e.g. after a failed mutation
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.sender.send_modify(|state| state.error = Some(message));
    }

    /// Wait until the state satisfies `predicate` and return it
    pub async fn wait_for(&self, mut predicate: impl FnMut(&ViewState<T>) -> bool) -> ViewState<T> {
        let mut receiver = self.sender.subscribe();
        let settled = receiver
            .wait_for(|state| predicate(state))
            .await
            .map(|state| state.clone());
        // The sender lives in `self`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop<T, F, Fut>(
    interval: Duration,
    failure_message: String,
    fetch: F,
    sender: Arc<watch::Sender<ViewState<T>>>,
    refresh: Arc<Notify>,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = refresh.notified() => ticker.reset(),
        }

        sender.send_modify(|state| state.loading = true);
        let outcome = fetch().await;

        sender.send_modify(|state| {
            state.loading = false;
            match outcome {
                Ok(data) => {
                    debug!("Poll succeeded");
                    state.data = Some(data);
                    state.error = None;
                    state.last_refreshed = Some(Utc::now());
                }
                Err(e) => {
                    warn!(retryable = e.is_retryable(), "Poll failed: {}", e);
                    state.error = Some(failure_message.clone());
                }
            }
        });
    }
}

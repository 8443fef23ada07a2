//! List and detail views over the polling client

use std::time::Duration;
use tracing::info;

use crate::client::api::ApiClient;
use crate::client::error::ClientResult;
use crate::client::poll::{Poller, ViewState};
use crate::registry::{ExperimentDefinition, ExperimentKey, ExperimentRecord};

/// Shown when the list cannot be fetched
pub const LIST_LOAD_FAILED: &str = "Failed to load experiments. Please try again later.";

/// Shown when the detail record cannot be fetched
pub const DETAIL_LOAD_FAILED: &str = "Failed to load experiment details. Please try again later.";

/// Shown when a create request fails
pub const CREATE_FAILED: &str = "Failed to create experiment. Please try again later.";

/// Message shown for a failed delete
#[must_use]
pub fn delete_failed_message(name: &str) -> String {
    format!("Failed to delete experiment {}. Please try again later.", name)
}

/// Question asked before deleting
#[must_use]
pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete experiment {}?", name)
}

/// How a confirmed-delete flow ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined the prompt; nothing was sent
    Cancelled,

    /// The server removed the experiment
    Deleted,
}

/// Polled list of all experiments
pub struct ExperimentListView {
    client: ApiClient,
    poller: Poller<Vec<ExperimentRecord>>,
}

impl ExperimentListView {
    /// Start polling the list endpoint
    pub fn mount(client: ApiClient, interval: Duration) -> Self {
        let fetcher = client.clone();
        let poller = Poller::spawn(interval, LIST_LOAD_FAILED, move || {
            let client = fetcher.clone();
            async move { client.list().await }
        });

        Self { client, poller }
    }

    /// Current state of the view
    #[must_use]
    pub fn state(&self) -> ViewState<Vec<ExperimentRecord>> {
        self.poller.snapshot()
    }

    /// Underlying poller, for subscribing or waiting on updates
    #[must_use]
    pub fn poller(&self) -> &Poller<Vec<ExperimentRecord>> {
        &self.poller
    }

    /// Create an experiment and re-poll the list
    pub async fn create(&self, definition: &ExperimentDefinition) -> ClientResult<ExperimentRecord> {
        match self.client.create(definition).await {
            Ok(record) => {
                info!(
                    namespace = record.namespace().unwrap_or_default(),
                    name = record.name().unwrap_or_default(),
                    "Created experiment"
                );
                self.poller.refresh();
                Ok(record)
            }
            Err(e) => {
                self.poller.report_error(CREATE_FAILED);
                Err(e)
            }
        }
    }

    /// Ask `confirm`, then delete and re-poll the list
    ///
    /// A failed delete leaves the list untouched and shows an error.
    pub async fn delete(
        &self,
        key: &ExperimentKey,
        confirm: impl FnOnce(&str) -> bool,
    ) -> ClientResult<DeleteOutcome> {
        if !confirm(&delete_prompt(&key.name)) {
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.client.delete(key).await {
            Ok(()) => {
                info!(experiment = %key, "Deleted experiment");
                self.poller.refresh();
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.poller.report_error(delete_failed_message(&key.name));
                Err(e)
            }
        }
    }
}

/// Polled view of one experiment
pub struct ExperimentDetailView {
    client: ApiClient,
    key: ExperimentKey,
    poller: Poller<ExperimentRecord>,
}

impl ExperimentDetailView {
    /// Start polling the single-experiment endpoint
    pub fn mount(client: ApiClient, key: ExperimentKey, interval: Duration) -> Self {
        let fetcher = client.clone();
        let target = key.clone();
        let poller = Poller::spawn(interval, DETAIL_LOAD_FAILED, move || {
            let client = fetcher.clone();
            let key = target.clone();
            async move { client.get(&key).await }
        });

        Self {
            client,
            key,
            poller,
        }
    }

    /// Experiment this view follows
    #[must_use]
    pub fn key(&self) -> &ExperimentKey {
        &self.key
    }

    /// Current state of the view
    #[must_use]
    pub fn state(&self) -> ViewState<ExperimentRecord> {
        self.poller.snapshot()
    }

    /// Underlying poller, for subscribing or waiting on updates
    #[must_use]
    pub fn poller(&self) -> &Poller<ExperimentRecord> {
        &self.poller
    }

    /// Ask `confirm`, then delete
    ///
    /// On `Deleted` the caller should drop the view and navigate back to
    /// the list.
    pub async fn delete(&self, confirm: impl FnOnce(&str) -> bool) -> ClientResult<DeleteOutcome> {
        if !confirm(&delete_prompt(&self.key.name)) {
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.client.delete(&self.key).await {
            Ok(()) => {
                info!(experiment = %self.key, "Deleted experiment");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.poller.report_error(delete_failed_message(&self.key.name));
                Err(e)
            }
        }
    }
}

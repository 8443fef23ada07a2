//! In-memory experiment registry
//!
//! Records are kept in insertion order, which is also list order. Lookups and
//! removals resolve the first record matching `(namespace, name)`.

mod record;
mod samples;

pub use record::{
    ExperimentDefinition, ExperimentKey, ExperimentRecord, ExperimentStatus, CREATED_MESSAGE,
    SERVER_OWNED_FIELDS,
};
pub use samples::sample_records;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Registry shared across request handlers
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No record is addressed by the key
    #[error("experiment {0} not found")]
    NotFound(ExperimentKey),

    /// A record with the key already exists and duplicates are rejected
    #[error("experiment {0} already exists")]
    AlreadyExists(ExperimentKey),
}

/// How `insert` treats a key that is already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Append anyway; lookups keep resolving the oldest record
    #[default]
    Allow,

    /// Refuse the insert
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "Invalid duplicate policy: {}. Must be one of: allow, reject",
                other
            )),
        }
    }
}

/// Ordered collection of experiment records
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ExperimentRecord>,
    policy: DuplicatePolicy,
}

impl Registry {
    /// Create an empty registry that accepts duplicate keys
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given duplicate policy
    #[must_use]
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    /// Create a registry pre-populated with the sample experiments
    ///
    /// Samples are stored as-is, so they keep their non-pending phases.
    #[must_use]
    pub fn seeded(policy: DuplicatePolicy, now: DateTime<Utc>) -> Self {
        let records = sample_records(now);
        info!(count = records.len(), "Seeded registry with sample experiments");
        Self { records, policy }
    }

    /// Wrap the registry for sharing between handlers
    #[must_use]
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Active duplicate policy
    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order
    #[must_use]
    pub fn list(&self) -> &[ExperimentRecord] {
        &self.records
    }

    /// First record addressed by `(namespace, name)`
    pub fn get(&self, namespace: &str, name: &str) -> RegistryResult<&ExperimentRecord> {
        self.position(namespace, name)
            .map(|index| &self.records[index])
            .ok_or_else(|| RegistryError::NotFound(ExperimentKey::new(namespace, name)))
    }

    /// Store a new experiment in the `Pending` phase
    ///
    /// Client-supplied status, timestamps and message are discarded.
    /// Returns the stored record. Under `Reject`, only a definition with a
    /// string `namespace` and `name` can collide with an existing record.
    pub fn insert(&mut self, definition: ExperimentDefinition) -> RegistryResult<&ExperimentRecord> {
        if self.policy == DuplicatePolicy::Reject {
            if let Some(key) = definition.key() {
                if self.position(&key.namespace, &key.name).is_some() {
                    return Err(RegistryError::AlreadyExists(key));
                }
            }
        }

        let record = ExperimentRecord::pending(definition);
        info!(
            namespace = record.namespace().unwrap_or_default(),
            name = record.name().unwrap_or_default(),
            "Registered experiment"
        );
        self.records.push(record);

        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Remove the first record addressed by `(namespace, name)`
    pub fn remove(&mut self, namespace: &str, name: &str) -> RegistryResult<ExperimentRecord> {
        match self.position(namespace, name) {
            Some(index) => {
                let record = self.records.remove(index);
                info!(namespace, name, "Removed experiment");
                Ok(record)
            }
            None => {
                debug!(namespace, name, "Remove requested for unknown experiment");
                Err(RegistryError::NotFound(ExperimentKey::new(namespace, name)))
            }
        }
    }

    fn position(&self, namespace: &str, name: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.definition.matches(namespace, name))
    }
}

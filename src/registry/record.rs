//! Experiment record types matching the dashboard wire contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Message stamped on every freshly created experiment
pub const CREATED_MESSAGE: &str = "Waiting to start";

/// Wire keys the registry owns; client-supplied values for these are dropped
pub const SERVER_OWNED_FIELDS: &[&str] = &["status", "startTime", "endTime", "message"];

/// Lifecycle phase of an experiment
///
/// Nothing in the registry moves a record out of `Pending`; the remaining
/// phases exist so clients can render records seeded or produced elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExperimentStatus {
    /// Accepted, not yet started
    #[default]
    Pending,

    /// Fault currently injected
    Running,

    /// Finished without error
    Completed,

    /// Finished with an error
    Failed,
}

impl ExperimentStatus {
    /// Whether the phase is final
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity of an experiment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExperimentKey {
    /// Grouping label
    pub namespace: String,

    /// Name within the namespace
    pub name: String,
}

impl ExperimentKey {
    /// Build a key from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Client-controlled half of a record: the submitted JSON object as-is
///
/// Nothing is validated. Keys keep whatever JSON type the client sent,
/// omitted keys stay omitted and explicit `null`s are kept. The accessors
/// below only read the well-known keys; they answer `None` when a key is
/// missing or not of the expected type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentDefinition {
    fields: Map<String, Value>,
}

impl ExperimentDefinition {
    /// Definition with only the identity set
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::default()
            .with("name", name.into())
            .with("namespace", namespace.into())
    }

    /// Take a parsed request body
    ///
    /// An object is kept verbatim. Any other JSON value carries no fields,
    /// so the stored record holds only the server-owned ones.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Builder-style `set`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw value of a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every submitted field
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Experiment name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Experiment namespace
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.text("namespace")
    }

    /// Fault type (`pod-failure`, `network-latency`, ...)
    #[must_use]
    pub fn experiment_type(&self) -> Option<&str> {
        self.text("experimentType")
    }

    /// Kind of the targeted workload
    #[must_use]
    pub fn target_kind(&self) -> Option<&str> {
        self.text("targetKind")
    }

    /// Name of the targeted workload
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        self.text("targetName")
    }

    /// Free-form duration (`30s`, `1m`, ...)
    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        self.text("duration")
    }

    /// Type-specific knobs
    #[must_use]
    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.fields.get("parameters").and_then(Value::as_object)
    }

    /// Identity, when both `namespace` and `name` are strings
    #[must_use]
    pub fn key(&self) -> Option<ExperimentKey> {
        Some(ExperimentKey::new(self.namespace()?, self.name()?))
    }

    /// Whether this definition is addressed by `(namespace, name)`
    ///
    /// A definition without a string name or namespace matches nothing.
    #[must_use]
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace() == Some(namespace) && self.name() == Some(name)
    }

    /// Drop keys that collide with server-owned fields
    pub(crate) fn strip_server_owned(&mut self) {
        self.fields
            .retain(|key, _| !SERVER_OWNED_FIELDS.contains(&key.as_str()));
    }
}

/// A stored experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Client-supplied fields
    #[serde(flatten)]
    pub definition: ExperimentDefinition,

    /// Lifecycle phase
    #[serde(default)]
    pub status: ExperimentStatus,

    /// When the fault was injected
    #[serde(rename = "startTime", default)]
    pub start_time: Option<DateTime<Utc>>,

    /// When the fault was lifted
    #[serde(rename = "endTime", default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Human-readable progress note
    #[serde(default)]
    pub message: String,
}

impl ExperimentRecord {
    /// Record in the state every create produces
    #[must_use]
    pub fn pending(mut definition: ExperimentDefinition) -> Self {
        definition.strip_server_owned();
        Self {
            definition,
            status: ExperimentStatus::Pending,
            start_time: None,
            end_time: None,
            message: CREATED_MESSAGE.to_string(),
        }
    }

    /// Experiment name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.definition.name()
    }

    /// Experiment namespace
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.definition.namespace()
    }

    /// Identity of the record
    #[must_use]
    pub fn key(&self) -> Option<ExperimentKey> {
        self.definition.key()
    }
}

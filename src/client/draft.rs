//! Experiment drafts and the catalogues the dashboard offers
//!
//! The registry accepts any JSON object; these helpers only pre-fill what a
//! create form would.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::registry::ExperimentDefinition;

/// A fault type the dashboard knows how to describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentTypeInfo {
    /// Wire value
    pub value: &'static str,

    /// Display label
    pub label: &'static str,

    /// One-line description
    pub description: &'static str,

    /// Parameters filled in when the draft leaves them unset
    pub default_parameters: &'static [(&'static str, &'static str)],
}

/// Known fault types
pub const EXPERIMENT_TYPES: &[ExperimentTypeInfo] = &[
    ExperimentTypeInfo {
        value: "pod-failure",
        label: "Pod Failure",
        description: "Kills a pod to test resilience to pod failures",
        default_parameters: &[],
    },
    ExperimentTypeInfo {
        value: "network-latency",
        label: "Network Latency",
        description: "Adds latency to network traffic",
        default_parameters: &[("latency", "100ms")],
    },
    ExperimentTypeInfo {
        value: "cpu-hog",
        label: "CPU Hog",
        description: "Consumes CPU resources",
        default_parameters: &[("cpuCores", "1")],
    },
    ExperimentTypeInfo {
        value: "memory-hog",
        label: "Memory Hog",
        description: "Consumes memory resources",
        default_parameters: &[("memoryMB", "256")],
    },
];

/// Known target kinds
pub const TARGET_KINDS: &[&str] = &["Pod", "Deployment", "StatefulSet", "Service"];

/// Preset durations as `(value, label)`
pub const DURATIONS: &[(&str, &str)] = &[
    ("30s", "30 seconds"),
    ("1m", "1 minute"),
    ("5m", "5 minutes"),
    ("10m", "10 minutes"),
    ("30m", "30 minutes"),
    ("1h", "1 hour"),
];

/// Look up a known fault type
#[must_use]
pub fn experiment_type(value: &str) -> Option<&'static ExperimentTypeInfo> {
    EXPERIMENT_TYPES.iter().find(|info| info.value == value)
}

/// Builder for a create request, starting from the dashboard defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentDraft {
    name: String,
    namespace: String,
    experiment_type: String,
    target_kind: String,
    target_name: String,
    duration: String,
    parameters: BTreeMap<String, String>,
}

impl Default for ExperimentDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            namespace: "default".to_string(),
            experiment_type: "pod-failure".to_string(),
            target_kind: "Pod".to_string(),
            target_name: String::new(),
            duration: "1m".to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

impl ExperimentDraft {
    /// Draft with a name and every other field at its default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the fault type; parameters set so far are discarded
    #[must_use]
    pub fn experiment_type(mut self, experiment_type: impl Into<String>) -> Self {
        self.experiment_type = experiment_type.into();
        self.parameters.clear();
        self
    }

    /// Set the targeted workload
    #[must_use]
    pub fn target(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.target_kind = kind.into();
        self.target_name = name.into();
        self
    }

    /// Set the duration
    #[must_use]
    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Set one parameter
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Finish the draft, filling type defaults for parameters left unset
    #[must_use]
    pub fn into_definition(mut self) -> ExperimentDefinition {
        if let Some(info) = experiment_type(&self.experiment_type) {
            for (key, value) in info.default_parameters {
                self.parameters
                    .entry((*key).to_string())
                    .or_insert_with(|| (*value).to_string());
            }
        }

        let parameters: Map<String, Value> = self
            .parameters
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        ExperimentDefinition::new(self.namespace, self.name)
            .with("experimentType", self.experiment_type)
            .with("targetKind", self.target_kind)
            .with("targetName", self.target_name)
            .with("duration", self.duration)
            .with("parameters", parameters)
    }
}

// Sample Experiments
//
// Demo records loaded when the server starts with seeding enabled.

use chrono::{DateTime, Duration, Utc};

use super::{ExperimentDefinition, ExperimentRecord, ExperimentStatus, CREATED_MESSAGE};

/// Namespace shared by all sample experiments
pub const SAMPLE_NAMESPACE: &str = "chaos-test";

fn sample(name: &str, experiment_type: &str) -> ExperimentDefinition {
    ExperimentDefinition::new(SAMPLE_NAMESPACE, name).with("experimentType", experiment_type)
}

/// One finished, one running and one pending experiment, timed relative to `now`
#[must_use]
pub fn sample_records(now: DateTime<Utc>) -> Vec<ExperimentRecord> {
    vec![
        ExperimentRecord {
            definition: sample("nginx-pod-failure", "pod-failure"),
            status: ExperimentStatus::Completed,
            start_time: Some(now - Duration::hours(1)),
            end_time: Some(now - Duration::minutes(55)),
            message: "Experiment completed successfully".to_string(),
        },
        ExperimentRecord {
            definition: sample("nginx-network-latency", "network-latency"),
            status: ExperimentStatus::Running,
            start_time: Some(now - Duration::minutes(30)),
            end_time: None,
            message: "Experiment in progress".to_string(),
        },
        ExperimentRecord {
            definition: sample("nginx-cpu-hog", "cpu-hog"),
            status: ExperimentStatus::Pending,
            start_time: None,
            end_time: None,
            message: CREATED_MESSAGE.to_string(),
        },
    ]
}

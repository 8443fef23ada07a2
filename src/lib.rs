//! chaos-registry - Chaos experiment registry
//!
//! An in-memory registry of simulated fault-injection experiments, the REST
//! API in front of it, and a polling client for dashboards and the CLI.
//!
//! ## Modules
//!
//! - [`registry`] - ordered in-memory store of experiment records
//! - [`server`] - axum HTTP surface (feature `server`)
//! - [`client`] - polling HTTP client and views (feature `client`)
//! - [`cli`] - command-line interface (feature `cli`)

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// In-memory experiment registry
pub mod registry;

/// HTTP server over the registry
#[cfg(feature = "server")]
pub mod server;

/// Polling client
#[cfg(feature = "client")]
pub mod client;

/// Command-line interface
#[cfg(feature = "cli")]
pub mod cli;

pub use registry::{
    ExperimentDefinition, ExperimentKey, ExperimentRecord, ExperimentStatus, Registry,
    RegistryError,
};

// CLI Interface
//
// This module provides the command-line interface for chaos-registry: one
// subcommand to run the server, the rest to talk to a running one.

/// Plain-text rendering
pub mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::client::views::delete_prompt;
use crate::client::{
    ApiClient, ClientConfig, ExperimentDetailView, ExperimentDraft, ExperimentListView, ViewState,
};
use crate::registry::{DuplicatePolicy, ExperimentKey};
use crate::server::{ChaosRegistryServer, ServerConfig};

/// chaos-registry - Chaos experiment registry
#[derive(Parser, Debug)]
#[command(name = "chaos-registry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve and browse an in-memory registry of chaos experiments", long_about = None)]
pub struct Cli {
    /// Server root for client commands (default: $CHAOS_REGISTRY_URL or http://localhost:5000)
    #[arg(global = true, long = "server", short = 's')]
    pub server: Option<String>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the registry HTTP server
    Serve {
        /// TOML config file
        #[arg(long = "config", short = 'c', value_name = "PATH")]
        config: Option<PathBuf>,

        /// Host address to bind to
        #[arg(long = "host")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long = "port")]
        port: Option<u16>,

        /// Serve a built dashboard from this directory
        #[arg(long = "static-dir", value_name = "DIR")]
        static_dir: Option<PathBuf>,

        /// Start with an empty registry
        #[arg(long = "no-seed")]
        no_seed: bool,

        /// Answer 409 to creates that reuse an existing namespace/name
        #[arg(long = "reject-duplicates")]
        reject_duplicates: bool,
    },

    /// Commands that talk to a running server
    #[command(flatten)]
    Client(ClientCommand),
}

/// Client-side commands
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// List all experiments
    List,

    /// Show one experiment
    Get {
        /// Experiment namespace
        namespace: String,

        /// Experiment name
        name: String,
    },

    /// Create an experiment
    Create {
        /// Experiment name
        name: String,

        /// Experiment namespace
        #[arg(long = "namespace", short = 'n', default_value = "default")]
        namespace: String,

        /// Fault type (pod-failure, network-latency, cpu-hog, memory-hog, ...)
        #[arg(long = "type", short = 't', default_value = "pod-failure")]
        experiment_type: String,

        /// Kind of the targeted workload
        #[arg(long = "target-kind", default_value = "Pod")]
        target_kind: String,

        /// Name of the targeted workload
        #[arg(long = "target-name", default_value = "")]
        target_name: String,

        /// How long the fault should last
        #[arg(long = "duration", default_value = "1m")]
        duration: String,

        /// Type-specific parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Delete an experiment
    Delete {
        /// Experiment namespace
        namespace: String,

        /// Experiment name
        name: String,

        /// Skip the confirmation prompt
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Poll the list, or one experiment, and print every refresh
    Watch {
        /// Experiment namespace (with NAME, watch a single experiment)
        namespace: Option<String>,

        /// Experiment name
        #[arg(requires = "namespace")]
        name: Option<String>,

        /// Seconds between polls
        #[arg(long = "interval", default_value = "5")]
        interval: u64,
    },
}

/// Parse a `KEY=VALUE` argument
pub fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> Result<()> {
        let client_config = match self.server {
            Some(url) => ClientConfig::new(url),
            None => ClientConfig::from_env(),
        };

        match self.command {
            Commands::Serve {
                config,
                host,
                port,
                static_dir,
                no_seed,
                reject_duplicates,
            } => {
                let mut config = match config {
                    Some(path) => ServerConfig::from_file(path)?,
                    None => ServerConfig::default(),
                }
                .with_env_overrides();

                if let Some(host) = host {
                    config.host = host;
                }
                if let Some(port) = port {
                    config.port = port;
                }
                if static_dir.is_some() {
                    config.static_dir = static_dir;
                }
                if no_seed {
                    config.seed_samples = false;
                }
                if reject_duplicates {
                    config.duplicate_policy = DuplicatePolicy::Reject;
                }

                init_logging(&config.log_level, self.verbose);
                cmd_serve(config).await
            }
            Commands::Client(command) => {
                init_logging("warn", self.verbose);
                let client = ApiClient::new(&client_config)?;
                command.run(client).await
            }
        }
    }
}

impl ClientCommand {
    /// Run against the server behind `client`
    pub async fn run(self, client: ApiClient) -> Result<()> {
        match self {
            Self::List => cmd_list(&client).await,
            Self::Get { namespace, name } => {
                cmd_get(&client, ExperimentKey::new(namespace, name)).await
            }
            Self::Create {
                name,
                namespace,
                experiment_type,
                target_kind,
                target_name,
                duration,
                params,
            } => {
                let draft = params.into_iter().fold(
                    ExperimentDraft::new(name)
                        .namespace(namespace)
                        .experiment_type(experiment_type)
                        .target(target_kind, target_name)
                        .duration(duration),
                    |draft, (key, value)| draft.parameter(key, value),
                );
                cmd_create(&client, draft).await
            }
            Self::Delete {
                namespace,
                name,
                yes,
            } => cmd_delete(&client, ExperimentKey::new(namespace, name), yes).await,
            Self::Watch {
                namespace,
                name,
                interval,
            } => {
                let key = namespace.zip(name).map(|(ns, n)| ExperimentKey::new(ns, n));
                cmd_watch(client, key, Duration::from_secs(interval.max(1))).await
            }
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides `level`
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Fails only when a global subscriber is already installed; that one stays.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

async fn cmd_serve(config: ServerConfig) -> Result<()> {
    let server = ChaosRegistryServer::new(config)?;
    eprintln!("Serving experiments on {}/api/experiments", server.server_url());
    eprintln!("Press Ctrl+C to stop");
    server.start().await?;
    Ok(())
}

async fn cmd_list(client: &ApiClient) -> Result<()> {
    let records = client
        .list()
        .await
        .context("Failed to load experiments")?;
    print!("{}", render::list_table(&records));
    if records.is_empty() {
        println!();
    }
    Ok(())
}

async fn cmd_get(client: &ApiClient, key: ExperimentKey) -> Result<()> {
    let record = client
        .get(&key)
        .await
        .with_context(|| format!("Failed to load experiment {}", key))?;
    print!("{}", render::detail(&record));
    Ok(())
}

async fn cmd_create(client: &ApiClient, draft: ExperimentDraft) -> Result<()> {
    let record = client
        .create(&draft.into_definition())
        .await
        .context("Failed to create experiment")?;
    match record.key() {
        Some(key) => println!("✓ Created experiment {}", key),
        None => println!("✓ Created experiment"),
    }
    print!("{}", render::detail(&record));
    Ok(())
}

async fn cmd_delete(client: &ApiClient, key: ExperimentKey, yes: bool) -> Result<()> {
    if !yes && !confirm_on_stdin(&delete_prompt(&key.name))? {
        println!("Cancelled");
        return Ok(());
    }

    client
        .delete(&key)
        .await
        .with_context(|| format!("Failed to delete experiment {}", key.name))?;
    println!("✓ Deleted experiment {}", key);
    Ok(())
}

async fn cmd_watch(client: ApiClient, key: Option<ExperimentKey>, interval: Duration) -> Result<()> {
    match key {
        Some(key) => {
            let view = ExperimentDetailView::mount(client, key, interval);
            render_until_interrupted(view.poller().subscribe(), render::detail_view).await
        }
        None => {
            let view = ExperimentListView::mount(client, interval);
            render_until_interrupted(view.poller().subscribe(), render::list_view).await
        }
    }
}

/// Print every settled state until Ctrl+C
async fn render_until_interrupted<T: Clone>(
    mut receiver: watch::Receiver<ViewState<T>>,
    render: fn(&ViewState<T>) -> String,
) -> Result<()> {
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = receiver.borrow_and_update().clone();
                if !state.loading {
                    println!("{}", render(&state));
                }
            }
            _ = &mut interrupted => break,
        }
    }
    Ok(())
}

fn confirm_on_stdin(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

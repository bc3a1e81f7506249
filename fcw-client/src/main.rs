//! fcw - Face clustering workbench command line
//!
//! Thin adapter over [`fcw_client::Workbench`]: parses arguments, prints
//! workflow events as they arrive and renders the results.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fcw_client::models::{Algorithm, LabelAssignment};
use fcw_client::services::{CommitOutcome, SearchResult, SessionOutcome};
use fcw_client::Workbench;
use fcw_common::config::{default_config_path, load_toml_config, resolve_service_url};
use fcw_common::events::WorkflowEvent;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for fcw
#[derive(Parser, Debug)]
#[command(name = "fcw")]
#[command(about = "Group photos by face using a remote clustering service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "FCW_CONFIG")]
    config: Option<PathBuf>,

    /// Clustering service base URL (overrides FCW_SERVICE_URL and config)
    #[arg(long)]
    service_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count images in a directory
    Count {
        directory: String,
    },
    /// Cluster faces found in a directory
    Cluster {
        /// Directory to scan (defaults to the last one used)
        directory: Option<String>,
        /// dbscan, kmeans or hierarchical
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
        /// DBSCAN neighbourhood radius
        #[arg(long)]
        eps: Option<f64>,
        /// DBSCAN minimum samples per cluster
        #[arg(long)]
        min_samples: Option<u32>,
        /// Cluster count for kmeans/hierarchical
        #[arg(long)]
        num_clusters: Option<u32>,
        /// Name a cluster, e.g. --label 0=Alice (repeatable)
        #[arg(short, long = "label", value_name = "ID=NAME")]
        labels: Vec<String>,
        /// Write the names back to the images' metadata
        #[arg(long)]
        save_metadata: bool,
        /// Export results to a JSON document
        #[arg(long)]
        export: bool,
    },
    /// Find images tagged with the given people
    Search {
        directory: String,
        /// Comma-separated person names
        names: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = load_toml_config(&config_path).context("Failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    let service_url = resolve_service_url(args.service_url.as_deref(), &config);
    info!("Clustering service: {}", service_url);

    let workbench = Workbench::from_config(&config, &service_url)?;
    let printer = tokio::spawn(print_events(workbench.subscribe()));

    let result = run_command(&workbench, args.command).await;

    // Closing the bus ends the printer once buffered events are drained
    drop(workbench);
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    result
}

async fn run_command(workbench: &Workbench, command: Command) -> Result<()> {
    match command {
        Command::Count { directory } => {
            match workbench.update_image_count(&directory).await? {
                Some(count) => println!("{} images found", count.count),
                None => println!("No directory given"),
            }
        }

        Command::Cluster {
            directory,
            algorithm,
            eps,
            min_samples,
            num_clusters,
            labels,
            save_metadata,
            export,
        } => {
            let labels = labels
                .iter()
                .map(|label| LabelAssignment::parse(label))
                .collect::<Result<Vec<_>, _>>()?;

            workbench.load_settings().await;
            workbench
                .update_form(|form| {
                    if let Some(directory) = directory {
                        form.directory = directory;
                    }
                    if let Some(algorithm) = algorithm {
                        form.algorithm = algorithm;
                    }
                    if let Some(eps) = eps {
                        form.eps = eps;
                    }
                    if let Some(min_samples) = min_samples {
                        form.min_samples = min_samples;
                    }
                    if let Some(num_clusters) = num_clusters {
                        form.num_clusters = num_clusters;
                    }
                })
                .await;

            let Some(summary) = workbench.start_clustering().await?.completed() else {
                println!("A clustering run is already in progress");
                return Ok(());
            };

            let stats = summary.statistics;
            println!("{} people identified", stats.num_clusters);
            println!(
                "  faces: {} total, {} clustered ({:.0}%)",
                stats.total_faces,
                stats.clustered_faces,
                stats.clustering_rate * 100.0
            );
            let model = workbench.cluster_model().await;
            for entry in model.entries() {
                let name = labels
                    .iter()
                    .rev()
                    .find(|label| label.cluster_id == entry.id)
                    .and_then(|label| label.name())
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.id.default_name());
                println!("  [{}] {}: {} images", entry.id, name, entry.member_count);
            }

            if save_metadata {
                match workbench.save_metadata(&labels).await? {
                    CommitOutcome::NothingToSave => println!("No names entered, nothing saved"),
                    CommitOutcome::Saved {
                        submitted,
                        accepted,
                    } => println!("Metadata saved for {} of {} clusters", accepted, submitted),
                }
            }

            if export {
                let path = workbench.export_results(&labels).await?;
                println!("Results exported to {}", path.display());
            }
        }

        Command::Search { directory, names } => {
            match workbench.perform_search(&directory, &names).await? {
                SessionOutcome::Completed(result) => print_matches(&result),
                SessionOutcome::AlreadyRunning => println!("A search is already in progress"),
            }
        }
    }

    Ok(())
}

fn print_matches(result: &SearchResult) {
    if result.matches.is_empty() {
        println!("No results found");
        return;
    }
    println!("{} images found", result.count);
    for item in result.items() {
        println!("  {}  ({})", item.file_name, item.directory);
    }
}

/// Render workflow events until the workbench goes away
async fn print_events(mut rx: tokio::sync::broadcast::Receiver<WorkflowEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.recv().await {
            Ok(WorkflowEvent::ClusteringProgress {
                percentage, label, ..
            }) => eprintln!("[{:>3}%] {}...", percentage, label),
            Ok(WorkflowEvent::ClusteringFailed { message, .. })
            | Ok(WorkflowEvent::SearchFailed { message, .. })
            | Ok(WorkflowEvent::MetadataFailed { message, .. }) => eprintln!("Error: {}", message),
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

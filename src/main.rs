//! ecs-compose - docker-compose manifests to ECS task definitions
//!
//! This is the main CLI entry point for ecs-compose.

use clap::{Parser, Subcommand};
use ecs_compose::compose::{Manifest, ManifestParser};
use ecs_compose::deploy::aws::DEFAULT_AWS_PROGRAM;
use ecs_compose::deploy::{AwsCliRegistry, DeployOptions, Deployer};
use ecs_compose::ecs::{ManifestTranslator, MAX_TASK_DEFINITION_BYTES};
use ecs_compose::error::{EcsComposeError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// ecs-compose - compose manifests to ECS task definitions
#[derive(Parser)]
#[command(name = "ecs-compose")]
#[command(version)]
#[command(about = "Translate docker-compose manifests into ECS task definitions", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the task definition JSON
    Generate {
        /// Compose file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Task definition family
        #[arg(long)]
        family: String,
        /// Only include these services
        #[arg(short, long)]
        service: Vec<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Register the task definition and optionally update services
    Deploy {
        /// Compose file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Task definition family
        #[arg(long)]
        family: String,
        /// Only include these services
        #[arg(short, long)]
        service: Vec<String>,
        /// ECS cluster
        #[arg(long)]
        cluster: Option<String>,
        /// ECS services to roll onto the new revision
        #[arg(short, long)]
        update: Vec<String>,
        /// AWS region
        #[arg(long)]
        region: Option<String>,
        /// AWS profile
        #[arg(long)]
        profile: Option<String>,
        /// AWS CLI executable
        #[arg(long, default_value = DEFAULT_AWS_PROGRAM)]
        aws: String,
        /// Timeout per AWS call in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
        /// Retries per AWS call
        #[arg(long, default_value = "2")]
        retries: u32,
    },

    /// List services declared in the manifest
    Services {
        /// Compose file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn load_manifest(file: Option<PathBuf>, working_dir: &Path) -> Result<Manifest> {
    let path = match file {
        Some(path) => path,
        None => ManifestParser::find_compose_file(working_dir)
            .ok_or_else(|| EcsComposeError::ManifestNotFound(working_dir.to_path_buf()))?,
    };

    tracing::info!("Loading manifest {}", path.display());
    ManifestParser::parse_file(&path)
}

fn service_filter(services: Vec<String>) -> Option<HashSet<String>> {
    if services.is_empty() {
        None
    } else {
        Some(services.into_iter().collect())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let working_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Generate {
            file,
            family,
            service,
            output,
        } => {
            let manifest = load_manifest(file, &working_dir)?;
            let filter = service_filter(service);
            let json = ManifestTranslator::render(&family, &manifest, filter.as_ref())?;

            if json.len() > MAX_TASK_DEFINITION_BYTES {
                tracing::warn!(
                    "Task definition is {} bytes, over the {} byte limit",
                    json.len(),
                    MAX_TASK_DEFINITION_BYTES
                );
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    tracing::info!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Deploy {
            file,
            family,
            service,
            cluster,
            update,
            region,
            profile,
            aws,
            timeout,
            retries,
        } => {
            let manifest = load_manifest(file, &working_dir)?;
            let filter = service_filter(service);
            let task = ManifestTranslator::generate(&family, &manifest, filter.as_ref())?;

            let mut registry = AwsCliRegistry::new().program(&aws);
            if let Some(region) = &region {
                registry = registry.region(region);
            }
            if let Some(profile) = &profile {
                registry = registry.profile(profile);
            }

            let options = DeployOptions {
                timeout: Duration::from_secs(timeout),
                retries,
                ..Default::default()
            };

            let deployer = Deployer::new(registry, options);
            let revision = deployer.deploy(&task, cluster.as_deref(), &update).await?;
            println!("{}", revision.arn);
        }

        Commands::Services { file } => {
            let manifest = load_manifest(file, &working_dir)?;
            for name in manifest.names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

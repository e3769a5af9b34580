//! ucdpub - Entry Point
//!
//! Publishes CI build output to UrbanCode Deploy and runs deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use ucdpub::app::options::{DeployJob, PublishJob, PullOptions};
use ucdpub::app::run::{deploy, publish, select_site, verify};
use ucdpub::deploy::poller::CancelSignal;
use ucdpub::errors::PublisherError;
use ucdpub::logs::{init_logging, LogLevel, LogOptions};
use ucdpub::storage::settings::Settings;
use ucdpub::utils::{expand_env, version_info};
use ucdpub::version::publish::{ComponentOutcome, PublishResult};

/// Exit code for a deployment the server reported as failed
const EXIT_PROCESS_FAILED: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "ucdpub", version, about)]
struct Cli {
    /// Settings file
    #[arg(long, env = "UCDPUB_SETTINGS", default_value = "ucdpub.json")]
    settings: String,

    /// Site profile to use instead of the configured default
    #[arg(long, env = "UCDPUB_SITE")]
    site: Option<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check connectivity and credentials
    Verify,

    /// Create a component version from build output
    Publish(PublishArgs),

    /// Request an application process and wait for it
    Deploy(DeployArgs),
}

#[derive(Debug, Args)]
struct PublishArgs {
    /// Component to publish; repeat for several components
    #[arg(long = "component", required = true)]
    components: Vec<String>,

    /// Name of the new version
    #[arg(long, default_value = "")]
    version_name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Directory containing the files to upload
    #[arg(long, default_value = ".")]
    base_dir: String,

    /// Subdirectory of the base directory to upload from
    #[arg(long)]
    offset: Option<String>,

    /// Include glob, optionally `glob=component`; repeatable
    #[arg(long = "include")]
    includes: Vec<String>,

    /// Exclude glob, optionally `glob=component`; repeatable
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Version property as `name=value`; repeatable
    #[arg(long = "property")]
    properties: Vec<String>,

    /// Create incremental versions
    #[arg(long)]
    incremental: bool,

    #[arg(long, default_value = "Build")]
    link_name: String,

    /// URL linked from the new version
    #[arg(long)]
    link_url: Option<String>,

    /// Create the component when it does not exist
    #[arg(long)]
    create_component: bool,

    /// Template for a created component
    #[arg(long, default_value = "")]
    template: String,

    /// Application a created component is added to
    #[arg(long)]
    application: Option<String>,

    /// Tag applied to the component; repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Let the server import the version through its source config
    #[arg(long)]
    pull: bool,

    /// Import property as `name=value`; repeatable
    #[arg(long = "pull-property")]
    pull_properties: Vec<String>,

    /// Source config plugin for a created component
    #[arg(long, default_value = "")]
    pull_source_type: String,

    /// Source config property as `name=value`; repeatable
    #[arg(long = "pull-source-property")]
    pull_source_properties: Vec<String>,
}

#[derive(Debug, Args)]
struct DeployArgs {
    #[arg(long)]
    application: String,

    #[arg(long)]
    environment: String,

    #[arg(long)]
    process: String,

    /// `SNAPSHOT=name` or `component:version`; repeatable
    #[arg(long = "versions", required = true)]
    versions: Vec<String>,

    /// Only install components whose version changed
    #[arg(long)]
    only_changed: bool,

    /// Create the application process from this component process if missing
    #[arg(long)]
    create_process: Option<String>,

    /// Seconds between status checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    max_wait: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        let code = if e.is_process_failure() {
            EXIT_PROCESS_FAILED
        } else {
            1
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), PublisherError> {
    let settings_path = PathBuf::from(expand_env(&cli.settings));
    let settings = Settings::load(&settings_path).await?;

    let _guard = init_logging(LogOptions {
        log_level: cli.log_level.clone().unwrap_or(settings.log_level.clone()),
        log_dir: settings.log_dir.clone(),
        json_format: settings.json_logs,
    })?;

    let version = version_info();
    info!("Running {} {}", version.name, version.version);

    let site = select_site(&settings, cli.site.as_deref())?;

    match cli.command {
        Command::Verify => {
            verify(&site).await?;
            println!(
                "{} connected to '{}' ({})",
                "ok:".green().bold(),
                site.profile_name(),
                site.base_url()
            );
            Ok(())
        }
        Command::Publish(args) => {
            let outcomes = publish(&site, &args.into_job()).await?;
            report_publish(outcomes)
        }
        Command::Deploy(args) => {
            let mut poll = settings.poll.to_options();
            if let Some(secs) = args.poll_interval {
                poll.interval = std::time::Duration::from_secs(secs.max(1));
            }
            if let Some(secs) = args.max_wait {
                poll.max_wait = Some(std::time::Duration::from_secs(secs));
            }
            if args.max_attempts.is_some() {
                poll.max_attempts = args.max_attempts;
            }

            let print_json = args.json;
            let outcome = deploy(&site, poll, &args.into_job(), interrupt_signal()).await?;
            if print_json {
                let body = serde_json::to_string_pretty(&outcome)
                    .map_err(|e| PublisherError::json("printing the deployment outcome", e))?;
                println!("{}", body);
            } else {
                println!(
                    "{} deployment {} finished with {} in {}s",
                    "ok:".green().bold(),
                    outcome.request_id,
                    outcome.result.as_str().bold(),
                    outcome.elapsed.as_secs()
                );
            }
            Ok(())
        }
    }
}

fn report_publish(outcomes: Vec<ComponentOutcome>) -> Result<(), PublisherError> {
    let mut failure = None;

    for outcome in outcomes {
        match outcome {
            ComponentOutcome::Published { component, result } => match result {
                PublishResult::Created {
                    version, upload, ..
                } => println!(
                    "{} {} version '{}' ({} files)",
                    "published:".green().bold(),
                    component,
                    version,
                    upload.files
                ),
                PublishResult::Imported => println!(
                    "{} {} import requested",
                    "published:".green().bold(),
                    component
                ),
            },
            ComponentOutcome::Failed { component, error } => {
                println!("{} {}: {}", "failed:".red().bold(), component, error);
                failure.get_or_insert(error);
            }
            ComponentOutcome::Skipped { component } => {
                println!("{} {}", "skipped:".yellow().bold(), component);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl PublishArgs {
    fn into_job(self) -> PublishJob {
        PublishJob {
            components: self.components,
            version: self.version_name,
            description: self.description,
            base_dir: PathBuf::from(self.base_dir),
            offset: self.offset,
            includes: self.includes.join("\n"),
            excludes: self.excludes.join("\n"),
            properties: self.properties.join("\n"),
            incremental: self.incremental,
            pull: self.pull.then(|| PullOptions {
                properties: self.pull_properties.join("\n"),
                source_type: self.pull_source_type,
                source_properties: self.pull_source_properties.join("\n"),
            }),
            create_component: self.create_component,
            template: self.template,
            application: self.application,
            tags: self.tags,
            link_name: self.link_name,
            link_url: self.link_url,
        }
    }
}

impl DeployArgs {
    fn into_job(self) -> DeployJob {
        DeployJob {
            application: self.application,
            environment: self.environment,
            process: self.process,
            versions: self.versions.join("\n"),
            only_changed: self.only_changed,
            create_process: self.create_process,
        }
    }
}

/// Resolves on Ctrl+C so a deployment wait can be abandoned cleanly
fn interrupt_signal() -> CancelSignal {
    Box::pin(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, stopping..."),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_publish_args_join_repeated_values() {
        let cli = Cli::try_parse_from([
            "ucdpub",
            "--log-level",
            "debug",
            "publish",
            "--component",
            "web",
            "--component",
            "api",
            "--version-name",
            "1.0.${BUILD}",
            "--include",
            "**/*.jar",
            "--include",
            "conf/**=api",
            "--property",
            "a=1",
            "--property",
            "b=2",
            "--pull",
            "--pull-source-type",
            "Git",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let Command::Publish(args) = cli.command else {
            panic!("expected publish");
        };
        let job = args.into_job();
        assert_eq!(job.components, vec!["web".to_string(), "api".to_string()]);
        assert_eq!(job.version, "1.0.${BUILD}");
        assert_eq!(job.includes, "**/*.jar\nconf/**=api");
        assert_eq!(job.properties, "a=1\nb=2");
        assert_eq!(job.link_name, "Build");
        assert_eq!(job.pull.map(|p| p.source_type), Some("Git".to_string()));
    }

    #[test]
    fn test_deploy_args_require_versions() {
        let missing = Cli::try_parse_from([
            "ucdpub",
            "deploy",
            "--application",
            "shop",
            "--environment",
            "qa",
            "--process",
            "Deploy",
        ]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "ucdpub",
            "deploy",
            "--application",
            "shop",
            "--environment",
            "qa",
            "--process",
            "Deploy",
            "--versions",
            "web:1.0",
            "--versions",
            "api:2.0",
            "--max-attempts",
            "10",
        ])
        .unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.max_attempts, Some(10));
        let job = args.into_job();
        assert_eq!(job.versions, "web:1.0\napi:2.0");
        assert!(!job.only_changed);
    }
}

mod commands;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use deployflow_cloud::tasks::{
    APPLICATION_ID_PROPERTY, AUTO_SCALING_GROUP_IDS_PROPERTY, DEPLOYMENT_GROUP_ID_PROPERTY,
    DEPLOYMENT_ID_PROPERTY,
};
use deployflow_cloud::{CancellationToken, Ec2TagFilter, NamedCondition};
use deployflow_config::DeployflowConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit code used when the run was interrupted (128 + SIGINT)
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "deployflow")]
#[command(about = "Build-pipeline tasks for stack and deployment lifecycles", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand; they override the config file
#[derive(Args, Debug, Default)]
struct CommonArgs {
    /// Config file (default: DEPLOYFLOW_CONFIG_PATH, ./deployflow.yaml, ...)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// AWS region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Maximum number of status checks before giving up
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Seconds to wait before each status check
    #[arg(long, global = true, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Delimiter for multi-value arguments and outputs
    #[arg(long, global = true)]
    delimiter: Option<String>,
}

impl CommonArgs {
    fn apply(&self, config: &mut DeployflowConfig) {
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(max_attempts) = self.max_attempts {
            config.poll.max_attempts = max_attempts;
        }
        if let Some(interval) = self.interval {
            config.poll.interval_secs = interval;
        }
        if let Some(delimiter) = &self.delimiter {
            config.delimiter = delimiter.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until a stack reaches one of the given statuses
    WaitStack {
        /// Stack name or id
        #[arg(long)]
        stack_name: Option<String>,
        /// Accepted statuses (e.g. CREATE_COMPLETE,UPDATE_COMPLETE)
        #[arg(long)]
        status: Option<String>,
    },
    /// Wait until a deployment reaches one of the given statuses
    WaitDeployment {
        #[arg(long)]
        deployment_id: Option<String>,
        /// Accepted statuses (e.g. Succeeded)
        #[arg(long)]
        status: Option<String>,
    },
    /// Find auto scaling groups by tag
    FindGroups {
        /// Tag condition, repeatable
        #[arg(long = "tag", value_name = "KEY=VALUE[|VALUE...]", value_parser = parse_tag)]
        tags: Vec<NamedCondition>,
        /// Named tag set from the config file, applied before --tag
        #[arg(long)]
        tag_set: Option<String>,
        /// Output property name
        #[arg(long, default_value = AUTO_SCALING_GROUP_IDS_PROPERTY)]
        property: String,
    },
    /// Create a CodeDeploy application
    CreateApplication {
        #[arg(long)]
        application_name: Option<String>,
        /// Output property name
        #[arg(long, default_value = APPLICATION_ID_PROPERTY)]
        property: String,
    },
    /// Create a CodeDeploy deployment group
    CreateDeploymentGroup {
        #[command(flatten)]
        args: commands::create_deployment_group::DeploymentGroupArgs,
        /// Output property name
        #[arg(long, default_value = DEPLOYMENT_GROUP_ID_PROPERTY)]
        property: String,
    },
    /// Start a CodeDeploy deployment
    CreateDeployment {
        #[command(flatten)]
        args: commands::create_deployment::DeploymentArgs,
        /// Output property name
        #[arg(long, default_value = DEPLOYMENT_ID_PROPERTY)]
        property: String,
    },
    /// Show version information
    Version,
}

fn parse_tag(spec: &str) -> Result<NamedCondition, String> {
    NamedCondition::parse(spec)
        .ok_or_else(|| format!("expected KEY=VALUE[|VALUE...], got '{}'", spec))
}

fn parse_tag_filter(spec: &str) -> Result<Ec2TagFilter, String> {
    if spec.is_empty() || spec == "=" {
        return Err("tag filter must not be empty".to_string());
    }

    let filter = match spec.split_once('=') {
        Some(("", value)) => Ec2TagFilter {
            key: None,
            value: Some(value.to_string()),
            filter_type: "VALUE_ONLY".to_string(),
        },
        Some((key, value)) => Ec2TagFilter::new(key, value),
        None => Ec2TagFilter {
            key: Some(spec.to_string()),
            value: None,
            filter_type: "KEY_ONLY".to_string(),
        },
    };
    Ok(filter)
}

fn init_tracing() {
    // stdout carries task outputs; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // version needs no config
    if matches!(cli.command, Commands::Version) {
        println!("deployflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing();

    let mut config = match &cli.common.config {
        Some(path) => deployflow_config::load_from(path)?,
        None => deployflow_config::load()?,
    };
    cli.common.apply(&mut config);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping...");
            signal_token.cancel();
        }
    });

    let ctx = commands::Context::new(config, cancel.clone());
    let result = until_cancelled(dispatch(&ctx, cli.command), &cancel).await;

    if let Err(e) = &result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
    }
    let code = exit_code(&result, cancel.is_cancelled());
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

async fn dispatch(ctx: &commands::Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::WaitStack { stack_name, status } => {
            commands::wait_stack::handle(ctx, stack_name, status).await
        }
        Commands::WaitDeployment {
            deployment_id,
            status,
        } => commands::wait_deployment::handle(ctx, deployment_id, status).await,
        Commands::FindGroups {
            tags,
            tag_set,
            property,
        } => commands::find_groups::handle(ctx, tags, tag_set, property).await,
        Commands::CreateApplication {
            application_name,
            property,
        } => commands::create_application::handle(ctx, application_name, property).await,
        Commands::CreateDeploymentGroup { args, property } => {
            commands::create_deployment_group::handle(ctx, args, property).await
        }
        Commands::CreateDeployment { args, property } => {
            commands::create_deployment::handle(ctx, args, property).await
        }
        Commands::Version => Ok(()),
    }
}

/// Drive `task` until it finishes or `cancel` fires, whichever comes first
async fn until_cancelled<F>(task: F, cancel: &CancellationToken) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    tokio::select! {
        result = task => result,
        _ = cancel.cancelled() => Err(anyhow::anyhow!("Interrupted")),
    }
}

/// 130 after an interrupt, whatever the command returned
fn exit_code(result: &anyhow::Result<()>, cancelled: bool) -> i32 {
    if cancelled {
        EXIT_CANCELLED
    } else if result.is_err() {
        1
    } else {
        0
    }
}

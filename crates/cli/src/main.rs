//! Chairside CLI - policy files, offline reports and device ids.
//!
//! # Usage
//!
//! ```bash
//! # Validate a policy file
//! cs-cli policy validate deploy/policy.yaml
//!
//! # Print the effective policy as YAML
//! cs-cli policy show
//!
//! # Run every analytics view for a tenant from a fixture
//! cs-cli report --fixture shop.json --tenant <uuid> --now 2026-05-31T12:00:00Z
//!
//! # Print (and create on first use) this machine's device id
//! cs-cli device show --store ~/.config/chairside/device-id
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cs-cli")]
#[command(author, version, about = "Chairside CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect analytics policy files
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
    /// Print every analytics view for a tenant as JSON
    Report {
        /// JSON fixture with tenant events
        #[arg(short, long)]
        fixture: PathBuf,

        /// Tenant id (UUID)
        #[arg(short, long)]
        tenant: String,

        /// Evaluation time (RFC 3339, default: now)
        #[arg(long)]
        now: Option<String>,

        /// Policy file (default: built-in policy)
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },
    /// Manage this machine's device id
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Check that a policy file loads and passes validation
    Validate {
        /// YAML or JSON policy file
        file: PathBuf,
    },
    /// Print the effective policy as YAML
    Show {
        /// Policy file (default: `DASHBOARD_POLICY_PATH`, then built-in)
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// Print the device id, creating it if missing
    Show {
        /// File holding the device id
        #[arg(short, long)]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Policy { action } => match action {
            PolicyAction::Validate { file } => {
                let policy = commands::policy::validate(&file)?;
                println!("{} is valid (version {})", file.display(), policy.version);
            }
            PolicyAction::Show { file } => {
                print!("{}", commands::policy::show(file.as_deref())?);
            }
        },
        Commands::Report {
            fixture,
            tenant,
            now,
            policy,
        } => {
            let args = commands::report::ReportArgs {
                fixture: &fixture,
                tenant: &tenant,
                now: now.as_deref(),
                policy: policy.as_deref(),
            };
            println!("{}", commands::report::run(&args).await?);
        }
        Commands::Device { action } => match action {
            DeviceAction::Show { store } => {
                println!("{}", commands::device::show(store)?);
            }
        },
    }
    Ok(())
}

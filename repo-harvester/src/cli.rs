//! This module implements the CLI interface for repo-harvester: command parsing,
//! configuration resolution, and the user-visible flow of a run.
//!
//! All core business logic (sandboxing, catalog paging, selection, cloning)
//! lives in the [`repo-harvester-core`] crate. This module is strictly CLI glue.
//!
//! ## How To Use
//! - For command-line users: use the installed `repo-harvester` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`repo-harvester-core`]: ../../repo_harvester_core/

use crate::load_config::{load_config, resolve, ConfigFile, Overrides};
use crate::prompt::{PresetInput, TerminalInput};
use crate::report;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use repo_harvester_core::catalog::{CatalogClient, GithubApi};
use repo_harvester_core::clone::CommandCloner;
use repo_harvester_core::config::HarvestConfig;
use repo_harvester_core::contract::SelectionInput;
use repo_harvester_core::harvest::Harvester;
use repo_harvester_core::sandbox;
use repo_harvester_core::selection::{self, SelectionMode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// CLI for repo-harvester: clone an organization's repositories and collect their READMEs.
#[derive(Parser)]
#[clap(
    name = "repo-harvester",
    version,
    about = "Clone an organization's repositories into a sandboxed directory and collect their READMEs"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone selected repositories and harvest their README files
    Harvest(HarvestArgs),
    /// Print the organization's repositories without cloning anything
    List(ListArgs),
}

/// Flags shared by every command that talks to the hosting API.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Organization name
    #[clap(long)]
    pub org: Option<String>,

    /// YAML config file; flags override its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Hosting API base URL
    #[clap(long)]
    pub api_url: Option<String>,

    /// Per-request timeout for catalog fetches, in seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// API token sent as `Authorization: token <TOKEN>`
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HarvestArgs {
    #[clap(flatten)]
    pub source: SourceArgs,

    /// Staging directory under the current directory (defaults to the organization name)
    #[clap(long)]
    pub base_dir: Option<PathBuf>,

    /// Subdirectory of the base directory receiving the clones (defaults to the organization name)
    #[clap(long)]
    pub org_dir: Option<PathBuf>,

    /// File of repository references to clone instead of querying the organization
    #[clap(long)]
    pub repos_file: Option<PathBuf>,

    /// Directory collecting harvested READMEs
    #[clap(long)]
    pub docs_dir: Option<PathBuf>,

    /// Clone every repository without prompting
    #[clap(long, conflicts_with_all = ["select", "repos_file"])]
    pub all: bool,

    /// Comma-separated 1-based indices to clone, without prompting
    #[clap(long, conflicts_with = "repos_file")]
    pub select: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[clap(flatten)]
    pub source: SourceArgs,
}

impl SourceArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            org: self.org.clone(),
            api_url: self.api_url.clone(),
            request_timeout_secs: self.timeout_secs,
            ..Overrides::default()
        }
    }

    fn config_file(&self) -> Result<ConfigFile> {
        match &self.config {
            Some(path) => load_config(path),
            None => Ok(ConfigFile::default()),
        }
    }
}

impl HarvestArgs {
    fn resolve(&self) -> Result<HarvestConfig> {
        let flags = Overrides {
            base_dir: self.base_dir.clone(),
            org_dir: self.org_dir.clone(),
            reference_file: self.repos_file.clone(),
            docs_dir: self.docs_dir.clone(),
            ..self.source.overrides()
        };
        resolve(self.source.config_file()?, flags)
    }

    fn preset(&self) -> Option<PresetInput> {
        match (&self.select, self.all) {
            (Some(raw), _) => Some(PresetInput::Indices(raw.clone())),
            (None, true) => Some(PresetInput::All),
            (None, false) => None,
        }
    }
}

fn catalog_client(config: &HarvestConfig, token: Option<&str>) -> Result<CatalogClient<GithubApi>> {
    if token.is_none() {
        tracing::warn!("No GITHUB_TOKEN set, using unauthenticated API rate limits");
    }
    let api = GithubApi::new(&config.api_url, token, config.request_timeout())?;
    Ok(CatalogClient::new(api))
}

/// Set the returned flag when the operator presses Ctrl-C.
fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current repository");
            println!("{} Interrupt received, stopping after the current repository", report::MARK_WARN);
            flag.store(true, Ordering::SeqCst);
        }
    });
    cancel
}

async fn harvest(args: HarvestArgs) -> Result<()> {
    let config = args.resolve()?;
    config.trace_loaded();

    let working_dir = std::env::current_dir()?;
    // Checked before `establish` so an escaping docs dir leaves nothing behind.
    let docs_dir = sandbox::contain(&working_dir, &config.docs_dir)?;
    let destination = sandbox::establish(&working_dir, &config.base_dir(), &config.org_dir())?;
    if destination.pre_existing {
        println!(
            "{} {} already exists, cloning will proceed inside it",
            report::MARK_WARN,
            destination.org_path.display()
        );
    }

    let plan = match &config.reference_file {
        Some(path) => selection::plan(&[], &SelectionMode::FromFile(path.clone()))?,
        None => {
            let client = catalog_client(&config, args.source.token.as_deref())?;
            let catalog = client.fetch_all(&config.org).await?;
            if catalog.is_empty() {
                println!("Organization '{}' has no repositories.", config.org);
                return Ok(());
            }
            let mut input: Box<dyn SelectionInput> = match args.preset() {
                Some(preset) => Box::new(preset),
                None => Box::new(TerminalInput::new()),
            };
            let mode = selection::resolve_mode(input.as_mut(), &catalog)?;
            selection::plan(&catalog, &mode)?
        }
    };

    for index in &plan.out_of_range {
        println!("{} Index {index} is out of range. Skipping.", report::MARK_WARN);
    }
    if plan.is_empty() {
        println!("Nothing selected, no repositories to clone.");
        return Ok(());
    }

    let harvester =
        Harvester::new(CommandCloner::default(), docs_dir).with_cancellation(cancel_on_ctrl_c());
    let result = harvester
        .execute(&plan, &destination, |outcome| {
            report::print_outcome(outcome);
        })
        .await;
    report::print_summary(&result, &destination);
    Ok(())
}

async fn list(args: ListArgs) -> Result<()> {
    let config = resolve(args.source.config_file()?, args.source.overrides())?;
    config.trace_loaded();
    let client = catalog_client(&config, args.source.token.as_deref())?;
    let catalog = client.fetch_all(&config.org).await?;
    if catalog.is_empty() {
        println!("Organization '{}' has no repositories.", config.org);
    }
    report::print_catalog(&catalog);
    Ok(())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Harvest(args) => {
            tracing::info!(command = "harvest", "Starting harvest");
            harvest(args).await
        }
        Commands::List(args) => {
            tracing::info!(command = "list", "Listing catalog");
            list(args).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}

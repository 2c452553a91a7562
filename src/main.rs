//! gitk - CLI entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use tracing::{error, warn};
use tracing_subscriber::filter::{LevelFilter, filter_fn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use gitk::catalog::{self, HttpCatalog, ModelCache, ProviderClient};
use gitk::config::{
    ConfigResolver, GitkPaths, SecretsFile, SettingsStore, TemplateOverrides,
    api_key_from_env,
};
use gitk::error::ConfigError;
use gitk::git::{StagedTarget, open_repository, staged_targets};
use gitk::logging::open_log_file;
use gitk::setup::run_init;
use gitk::template::TemplateStore;
use gitk::{
    CommitOutcome, CommitReview, CommitSettings, GenerateOptions, build_generator, commit_targets,
};

/// Environment variable holding the stderr log filter.
const LOG_ENV_VAR: &str = "GITK_LOG";

/// Target of the final failure event, which only goes to the log file.
const FAILURE_TARGET: &str = "gitk::failure";

/// Generate git commit messages from staged changes using an LLM.
#[derive(Parser, Debug)]
#[command(name = "gitk")]
#[command(about = "Generate git commit messages from staged changes using an LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Choose a provider, API key, model and template
    Init,

    /// Generate a commit message for the staged changes and commit
    Commit(CommitArgs),

    /// Refresh cached provider data
    Update {
        #[command(subcommand)]
        target: UpdateTarget,
    },

    /// List saved commit templates
    Templates,
}

#[derive(Subcommand, Debug)]
enum UpdateTarget {
    /// Fetch the provider's model catalog again
    Models,
}

#[derive(Args, Debug)]
struct CommitArgs {
    /// Ask for a title and a detailed body
    #[arg(long)]
    detailed: bool,

    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Make one commit per staged file
    #[arg(long)]
    split: bool,

    /// Template text to use instead of the configured template
    #[arg(long, conflicts_with = "template_file")]
    template: Option<String>,

    /// Template file to use instead of the configured template
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Extra instruction appended to the prompt
    #[arg(short = 'i', long)]
    instruction: Option<String>,

    /// Extra flags passed through to `git commit`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    git_flags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = GitkPaths::discover().context("Failed to locate the gitk config directory")?;
    init_tracing(&paths);

    let result = run(cli.command, &paths).await;
    if let Err(e) = &result {
        error!(target: FAILURE_TARGET, error = format!("{e:#}"), "Command failed");
    }
    result
}

async fn run(command: Command, paths: &GitkPaths) -> Result<()> {
    if let Err(e) = SecretsFile::from_paths(paths).load_into_env() {
        if !matches!(command, Command::Init) {
            return Err(e).context("Failed to load saved API keys. Run 'gitk init' to replace them");
        }
        warn!(error = %e, "Saved API keys are unreadable and will be replaced");
    }

    match command {
        Command::Init => init(paths).await,
        Command::Commit(args) => commit(paths, args).await,
        Command::Update {
            target: UpdateTarget::Models,
        } => update_models(paths).await,
        Command::Templates => list_templates(paths),
    }
}

/// Filtered stderr output plus an info-level log file in the config directory.
fn init_tracing(paths: &GitkPaths) {
    let stderr_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() != FAILURE_TARGET))
        .with_filter(stderr_filter);

    let (file_layer, file_error) = match open_log_file(paths) {
        Ok((file, _)) => {
            let layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::INFO);
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(error = %e, "Logging to file is disabled");
    }
}

async fn init(paths: &GitkPaths) -> Result<()> {
    let outcome = run_init(paths).await.context("Setup failed")?;

    println!();
    println!("Model: {}", outcome.config.model());
    println!("Template: {}", outcome.config.commit_template_path());
    println!("Config saved to {}", outcome.config_path.display());
    println!("API key saved to {}", outcome.secrets_path.display());
    Ok(())
}

async fn commit(paths: &GitkPaths, args: CommitArgs) -> Result<()> {
    let resolver = ConfigResolver::new(SettingsStore::from_paths(paths));
    let overrides = TemplateOverrides {
        inline: args.template.clone(),
        file: args.template_file.clone(),
    };
    let generation = resolver
        .resolve(&overrides)
        .context("Failed to load generation settings")?;

    let repo = open_repository(Path::new(".")).context("Run gitk from within a git repository")?;
    let workdir = repo
        .workdir()
        .context("Bare repositories are not supported")?
        .to_path_buf();

    let targets = staged_targets(&repo, args.split).context("Failed to read staged changes")?;
    if targets.is_empty() {
        println!("No staged changes. Stage files with 'git add' first.");
        return Ok(());
    }

    let generator = build_generator(&generation.config)?;
    let options = GenerateOptions {
        detailed: args.detailed,
        instruction: args.instruction.clone(),
    };
    let settings = CommitSettings {
        workdir: &workdir,
        git_flags: &args.git_flags,
    };
    let mut review = TerminalReview {
        model: generator.model().name().to_string(),
        confirm: !args.yes,
    };

    let outcomes = commit_targets(
        generator.as_ref(),
        &generation,
        &options,
        settings,
        &targets,
        &mut review,
    )
    .await?;

    let committed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, CommitOutcome::Committed { .. }))
        .count();
    if targets.len() > 1 {
        println!("\n{committed} of {} commits made", targets.len());
    }
    Ok(())
}

/// Prints each message and asks before committing unless `--yes` was given.
struct TerminalReview {
    model: String,
    confirm: bool,
}

impl CommitReview for TerminalReview {
    fn generating(&mut self, target: &StagedTarget) {
        if let Some(path) = &target.path {
            println!("\n--- {path} ---");
        }
        println!("Generating commit message with {}...", self.model);
    }

    fn approve(&mut self, target: &StagedTarget, message: &str) -> bool {
        println!("\n{message}\n");
        if !self.confirm {
            return true;
        }

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Commit with this message?")
            .default(true)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            match &target.path {
                Some(path) => println!("Skipping {path}"),
                None => println!("Commit cancelled"),
            }
        }
        confirmed
    }

    fn committed(&mut self, _target: &StagedTarget, output: &str) {
        print!("{output}");
    }
}

async fn update_models(paths: &GitkPaths) -> Result<()> {
    let provider_id = match SettingsStore::from_paths(paths).load() {
        Ok(config) => config.provider().to_string(),
        Err(ConfigError::NotInitialized(_)) => catalog::OPENROUTER.id.to_string(),
        Err(e) => return Err(e).context("Failed to load config"),
    };
    let Some(provider) = catalog::find_provider(&provider_id) else {
        bail!("Provider '{provider_id}' has no model catalog");
    };

    let api_key = api_key_from_env(provider.id)?;
    let fetcher = HttpCatalog::new(provider.id, provider.api_base, api_key)?;
    let client = ProviderClient::new(provider.id, fetcher, ModelCache::from_paths(paths));

    println!("Fetching models from {}...", provider.display_name);
    let models = client
        .refresh()
        .await
        .context("Failed to refresh the model catalog")?;
    println!("Cached {} models for {}", models.len(), provider.display_name);
    Ok(())
}

fn list_templates(paths: &GitkPaths) -> Result<()> {
    let store = TemplateStore::from_paths(paths);
    let templates = store.all().context("Failed to list templates")?;

    if templates.is_empty() {
        println!("No templates saved in {}", store.dir().display());
        return Ok(());
    }

    let active = SettingsStore::from_paths(paths)
        .load()
        .ok()
        .map(|config| PathBuf::from(config.commit_template_path()));

    for template in templates {
        let marker = if active.as_deref() == Some(template.path()) { "*" } else { " " };
        println!("{marker} {:<24} {}", template.name(), template.path().display());
    }
    Ok(())
}

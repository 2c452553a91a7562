//! Interactive `gitk init`: provider, API key, model and template.

use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use tracing::{debug, warn};

use crate::catalog::{
    CATALOG_PROVIDERS, HttpCatalog, ModelCache, ProviderClient, ProviderInfo, is_chat_model,
};
use crate::config::{GitkPaths, ResolvedConfig, SecretsFile, SettingsStore, env_var_name};
use crate::error::SetupError;
use crate::model::ModelRecord;
use crate::template::{Template, TemplateStore, validate_template_name};

/// Models offered per pricing tier.
const MODELS_PER_TIER: usize = 10;

/// Longest description shown next to a model name.
const DESCRIPTION_PREVIEW_CHARS: usize = 60;

/// What `gitk init` wrote.
#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub config: ResolvedConfig,
    pub config_path: PathBuf,
    pub secrets_path: PathBuf,
}

/// Walk the user through configuration and persist the result.
///
/// Nothing is written until every question has been answered.
pub async fn run_init(paths: &GitkPaths) -> Result<InitOutcome, SetupError> {
    let theme = ColorfulTheme::default();

    let provider = select_provider(&theme)?;
    let secrets = SecretsFile::from_paths(paths);
    let api_key = ask_api_key(&theme, provider, &secrets)?;

    let model = select_model(&theme, provider, &api_key, paths).await?;
    let template = select_template(&theme, &TemplateStore::from_paths(paths))?;

    let config = ResolvedConfig::new(model, template.path());
    let settings = SettingsStore::from_paths(paths);
    settings.save(&config)?;
    if let Err(e) = secrets.read_all() {
        warn!(error = %e, "Replacing unreadable API key file");
        secrets.remove()?;
    }
    secrets.save_key(provider.id, &api_key)?;

    Ok(InitOutcome {
        config,
        config_path: settings.path().to_path_buf(),
        secrets_path: secrets.path().to_path_buf(),
    })
}

fn select_provider(theme: &ColorfulTheme) -> Result<&'static ProviderInfo, SetupError> {
    if let [only] = CATALOG_PROVIDERS {
        return Ok(only);
    }

    let names: Vec<&str> = CATALOG_PROVIDERS.iter().map(|p| p.display_name).collect();
    let index = Select::with_theme(theme)
        .with_prompt("Choose a provider")
        .items(&names)
        .default(0)
        .interact()
        .map_err(|_| SetupError::Cancelled)?;
    Ok(&CATALOG_PROVIDERS[index])
}

fn ask_api_key(
    theme: &ColorfulTheme,
    provider: &ProviderInfo,
    secrets: &SecretsFile,
) -> Result<String, SetupError> {
    let env_var = env_var_name(provider.id);
    let saved = secrets.read_key(&env_var).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable API key file");
        None
    });
    if let Some(existing) = saved {
        let reuse = Confirm::with_theme(theme)
            .with_prompt(format!("An API key for {} is already saved. Keep it?", provider.display_name))
            .default(true)
            .interact()
            .map_err(|_| SetupError::Cancelled)?;
        if reuse {
            return Ok(existing);
        }
    }

    println!("{}", provider.key_instructions);
    let key = Password::with_theme(theme)
        .with_prompt(format!("{} API key", provider.display_name))
        .interact()
        .map_err(|_| SetupError::Cancelled)?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(SetupError::Cancelled);
    }
    Ok(key)
}

async fn select_model(
    theme: &ColorfulTheme,
    provider: &ProviderInfo,
    api_key: &str,
    paths: &GitkPaths,
) -> Result<ModelRecord, SetupError> {
    let fetcher = HttpCatalog::new(provider.id, provider.api_base, api_key)?;
    let client = ProviderClient::new(provider.id, fetcher, ModelCache::from_paths(paths));

    println!("Fetching models from {}...", provider.display_name);
    let top = client
        .get_top_models(is_chat_model, MODELS_PER_TIER, MODELS_PER_TIER)
        .await?;
    if top.is_empty() {
        return Err(SetupError::NoModels(provider.display_name.to_string()));
    }
    debug!(free = top.free.len(), paid = top.paid.len(), "Ranked models");

    let models: Vec<ModelRecord> = top.free.into_iter().chain(top.paid).collect();
    let labels: Vec<String> = models.iter().map(model_label).collect();

    let index = Select::with_theme(theme)
        .with_prompt("Choose a model")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|_| SetupError::Cancelled)?;

    Ok(models[index].clone())
}

/// One-line menu entry such as `[free] Qwen2.5-72B (32k ctx) | Instruction tuned`.
pub fn model_label(model: &ModelRecord) -> String {
    let tier = if model.is_free() { "free" } else { "paid" };
    let mut label = format!(
        "[{tier}] {} ({}k ctx)",
        model.name(),
        model.context_length() / 1000
    );

    let description = model.description().lines().next().unwrap_or_default();
    if !description.is_empty() {
        let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        label.push_str(" | ");
        label.push_str(&preview);
        if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
            label.push_str("...");
        }
    }
    label
}

fn select_template(theme: &ColorfulTheme, store: &TemplateStore) -> Result<Template, SetupError> {
    let choices = [
        "Use the default template",
        "Choose a saved template",
        "Write a new template",
        "Import a template from a file",
    ];
    let choice = Select::with_theme(theme)
        .with_prompt("Commit message template")
        .items(&choices)
        .default(0)
        .interact()
        .map_err(|_| SetupError::Cancelled)?;

    match choice {
        0 => Ok(store.default_template()?),
        1 => choose_saved_template(theme, store),
        2 => write_template(theme, store),
        _ => import_template(theme, store),
    }
}

fn choose_saved_template(theme: &ColorfulTheme, store: &TemplateStore) -> Result<Template, SetupError> {
    let mut templates = store.all()?;
    if templates.is_empty() {
        return Err(SetupError::NoTemplates(store.dir().to_path_buf()));
    }

    let names: Vec<&str> = templates.iter().map(Template::name).collect();
    let index = Select::with_theme(theme)
        .with_prompt("Choose a template")
        .items(&names)
        .default(0)
        .interact()
        .map_err(|_| SetupError::Cancelled)?;
    Ok(templates.swap_remove(index))
}

fn write_template(theme: &ColorfulTheme, store: &TemplateStore) -> Result<Template, SetupError> {
    let name: String = Input::<String>::with_theme(theme)
        .with_prompt("Template name")
        .default("custom_template".to_string())
        .validate_with(|input: &String| validate_template_name(input).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(|_| SetupError::Cancelled)?;

    println!("Enter the template text. Finish with an empty line.");
    let mut lines = Vec::new();
    loop {
        let line: String = Input::<String>::with_theme(theme)
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()
            .map_err(|_| SetupError::Cancelled)?;
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }

    Ok(store.create(&name, &lines.join("\n"))?)
}

fn import_template(theme: &ColorfulTheme, store: &TemplateStore) -> Result<Template, SetupError> {
    let path: String = Input::<String>::with_theme(theme)
        .with_prompt("Path to template file")
        .validate_with(|input: &String| {
            if Path::new(input.trim()).is_file() {
                Ok(())
            } else {
                Err(format!("{} is not a file", input.trim()))
            }
        })
        .interact_text()
        .map_err(|_| SetupError::Cancelled)?;

    Ok(store.import_file(Path::new(path.trim()))?)
}

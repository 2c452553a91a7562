//! Provider API keys stored in `<config_dir>/.env`.
//!
//! Keys are written by `gitk init` and handed to HTTP clients explicitly.
//! The process environment is only populated once, at startup, through
//! [`SecretsFile::load_into_env`].

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use super::paths::{GitkPaths, write_atomic};
use crate::error::{ProviderError, SecretsError};

const ENV_PREFIX: &str = "GITK";
const FILE_HEADER: &str = "# GitK API KEYS";

/// Environment variable holding the API key for `provider`.
///
/// `openrouter` becomes `GITK_OPENROUTER_API_KEY`.
pub fn env_var_name(provider: &str) -> String {
    let provider: String = provider
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{ENV_PREFIX}_{provider}_API_KEY")
}

/// Read the API key for `provider` from the process environment.
pub fn api_key_from_env(provider: &str) -> Result<String, ProviderError> {
    let env_var = env_var_name(provider);
    match env::var(&env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ProviderError::MissingApiKey {
            provider: provider.to_string(),
            env_var,
        }),
    }
}

/// The `KEY=VALUE` file holding provider API keys.
#[derive(Debug, Clone)]
pub struct SecretsFile {
    path: PathBuf,
}

impl SecretsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_paths(paths: &GitkPaths) -> Self {
        Self::new(paths.secrets_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order. A missing file has none.
    pub fn read_all(&self) -> Result<Vec<(String, String)>, SecretsError> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let read_failed = |source| SecretsError::ReadFailed {
            path: self.path.clone(),
            source,
        };
        dotenvy::from_path_iter(&self.path)
            .map_err(read_failed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_failed)
    }

    pub fn read_key(&self, env_var: &str) -> Result<Option<String>, SecretsError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|(name, value)| name == env_var && !value.trim().is_empty())
            .map(|(_, value)| value))
    }

    pub fn contains(&self, env_var: &str) -> Result<bool, SecretsError> {
        Ok(self.read_key(env_var)?.is_some())
    }

    /// Store the key for `provider`, keeping every other entry in place.
    pub fn save_key(&self, provider: &str, api_key: &str) -> Result<(), SecretsError> {
        let env_var = env_var_name(provider);
        let api_key = api_key.trim().to_string();
        let mut entries = self.read_all()?;

        match entries.iter_mut().find(|(name, _)| *name == env_var) {
            Some(entry) => entry.1 = api_key,
            None => entries.push((env_var, api_key)),
        }

        let mut contents = String::from(FILE_HEADER);
        contents.push('\n');
        for (name, value) in &entries {
            contents.push_str(&format!("{name}={}\n", quote_value(value)));
        }

        write_atomic(&self.path, contents.as_bytes()).map_err(|source| {
            SecretsError::WriteFailed {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Export the file's keys into the process environment.
    ///
    /// Variables that are already set win over the file.
    pub fn load_into_env(&self) -> Result<(), SecretsError> {
        if !self.path.is_file() {
            return Ok(());
        }
        dotenvy::from_path(&self.path).map_err(|source| SecretsError::ReadFailed {
            path: self.path.clone(),
            source,
        })
    }

    /// Delete the file. Missing is fine.
    pub fn remove(&self) -> Result<(), SecretsError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SecretsError::WriteFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Double-quote a value so the dotenv parser reads it back verbatim.
///
/// Inside double quotes the parser still expands `$NAME` and honours
/// backslash escapes, so those characters are escaped.
fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

//! Commit templates stored as `<config_dir>/templates/<name>.tpl`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::config::paths::{GitkPaths, ensure_dir, write_atomic};
use crate::error::TemplateError;

pub const DEFAULT_TEMPLATE_NAME: &str = "default_template";
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Name used when an imported file's stem has nothing usable.
pub const IMPORTED_TEMPLATE_NAME: &str = "imported_template";

/// Built-in instructions used when no template is configured.
pub const DEFAULT_COMMIT_TEMPLATE: &str = "

Requirements:
    - Use format: type: brief description
    - Types: feat, fix, docs, style, refactor, test, chore
    - Maximum 50 characters total
    - No explanations, no markdown, no extra text
    - Just the commit message line
    - Commit message must start with lowercase letter

    Examples:
    feat: add login validation
    fix: handle null user data
    docs: update setup guide

    Git Diff:

";

static TEMPLATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-.]+$").expect("template name pattern is valid"));

/// Check that `name` is usable as a template file stem.
pub fn validate_template_name(name: &str) -> Result<(), TemplateError> {
    if TEMPLATE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(TemplateError::InvalidName(name.to_string()))
    }
}

/// A template on disk. Content is read on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    path: PathBuf,
}

impl Template {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<String, TemplateError> {
        read_template_file(&self.path)
    }
}

fn read_template_file(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            TemplateError::NotFound(path.to_path_buf())
        } else {
            TemplateError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// The directory of saved templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_paths(paths: &GitkPaths) -> Self {
        Self::new(paths.templates_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure(&self) -> Result<(), TemplateError> {
        ensure_dir(&self.dir)?;
        Ok(())
    }

    /// Saved templates sorted by name.
    pub fn all(&self) -> Result<Vec<Template>, TemplateError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(TemplateError::ReadFailed {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut templates: Vec<Template> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
            })
            .map(Template::from_path)
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    /// Handle for the named template, whether or not it exists yet.
    pub fn get(&self, name: &str) -> Result<Template, TemplateError> {
        validate_template_name(name)?;
        Ok(Template::from_path(
            self.dir.join(format!("{name}.{TEMPLATE_EXTENSION}")),
        ))
    }

    /// Write (or overwrite) a named template.
    pub fn create(&self, name: &str, content: &str) -> Result<Template, TemplateError> {
        let template = self.get(name)?;
        if content.trim().is_empty() {
            return Err(TemplateError::EmptyContent);
        }

        self.ensure()?;
        write_atomic(template.path(), content.as_bytes()).map_err(|source| {
            TemplateError::WriteFailed {
                path: template.path().to_path_buf(),
                source,
            }
        })?;
        debug!(name, path = %template.path().display(), "Saved template");
        Ok(template)
    }

    /// Copy an external file into the store under its file stem.
    ///
    /// The stem is turned into a valid name first, so `My Template.txt`
    /// is stored as `My_Template`.
    pub fn import_file(&self, source: &Path) -> Result<Template, TemplateError> {
        let content = read_template_file(source)?;
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.create(&template_name_from(&stem), &content)
    }

    /// The built-in template, written to disk on first use.
    pub fn default_template(&self) -> Result<Template, TemplateError> {
        let template = self.get(DEFAULT_TEMPLATE_NAME)?;
        if template.exists() {
            return Ok(template);
        }
        self.create(DEFAULT_TEMPLATE_NAME, DEFAULT_COMMIT_TEMPLATE)
    }
}

/// Replace characters a template name cannot hold with `_`.
pub fn template_name_from(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }

    let name = name.trim_matches('_');
    if name.is_empty() {
        IMPORTED_TEMPLATE_NAME.to_string()
    } else {
        name.to_string()
    }
}

//! Staged change collection using git2.

use std::path::Path;

use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::CommitError;

/// One staged diff to turn into a commit. `path` is set when committing per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTarget {
    pub path: Option<String>,
    pub diff: String,
}

/// Open the repository containing `path`.
pub fn open_repository(path: &Path) -> Result<Repository, CommitError> {
    Repository::discover(path).map_err(CommitError::OpenRepository)
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(CommitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

fn staged<'r>(
    repo: &'r Repository,
    pathspec: Option<&str>,
) -> Result<git2::Diff<'r>, CommitError> {
    let head_tree = resolve_head_tree(repo)?;
    let mut opts = DiffOptions::new();
    if let Some(path) = pathspec {
        opts.pathspec(path).disable_pathspec_match(true);
    }
    repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(CommitError::DiffFailed)
}

/// Unified patch of everything staged (what `git diff --cached` prints).
pub fn staged_diff(repo: &Repository) -> Result<String, CommitError> {
    patch_text(&staged(repo, None)?)
}

/// Unified patch of the staged changes to a single path.
pub fn staged_diff_for_path(repo: &Repository, path: &str) -> Result<String, CommitError> {
    patch_text(&staged(repo, Some(path))?)
}

/// Paths with staged changes, sorted.
pub fn staged_files(repo: &Repository) -> Result<Vec<String>, CommitError> {
    let diff = staged(repo, None)?;
    let mut files: Vec<String> = diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

/// Staged diffs to commit, all taken against the current HEAD.
///
/// With `split`, one target per staged file; files whose scoped diff is empty
/// are left out. Nothing staged yields no targets.
pub fn staged_targets(repo: &Repository, split: bool) -> Result<Vec<StagedTarget>, CommitError> {
    if !split {
        return match staged_diff(repo) {
            Ok(diff) => Ok(vec![StagedTarget { path: None, diff }]),
            Err(CommitError::NoStagedChanges) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
    }

    let mut targets = Vec::new();
    for file in staged_files(repo)? {
        match staged_diff_for_path(repo, &file) {
            Ok(diff) => targets.push(StagedTarget {
                path: Some(file),
                diff,
            }),
            Err(CommitError::NoStagedChanges) => debug!(file = %file, "Empty diff, skipping"),
            Err(e) => return Err(e),
        }
    }
    Ok(targets)
}

fn patch_text(diff: &git2::Diff<'_>) -> Result<String, CommitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            text.push(line.origin());
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(CommitError::DiffFailed)?;

    if text.trim().is_empty() {
        return Err(CommitError::NoStagedChanges);
    }
    Ok(text)
}

//! Running `git commit` with a generated message.
//!
//! Commits shell out to the system `git` binary so hooks, signing and the
//! user's git config all apply as usual.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CommitError;

/// Locate the `git` executable on PATH.
pub fn find_git() -> Result<PathBuf, CommitError> {
    which::which("git").map_err(|_| CommitError::GitNotFound)
}

/// Arguments for `git commit -F <file> [extra flags] [-- <path>]`.
pub fn commit_args(message_file: &Path, extra_flags: &[String], path: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["commit".into(), "-F".into(), message_file.into()];
    args.extend(extra_flags.iter().map(OsString::from));
    if let Some(path) = path {
        args.push("--".into());
        args.push(path.into());
    }
    args
}

/// Commit in `repo_dir` with `message`, returning git's stdout.
///
/// With `path`, only that file is committed.
pub fn commit_with_message(
    repo_dir: &Path,
    message: &str,
    extra_flags: &[String],
    path: Option<&str>,
) -> Result<String, CommitError> {
    let git = find_git()?;

    let mut message_file = NamedTempFile::new().map_err(CommitError::MessageFileFailed)?;
    message_file
        .write_all(message.as_bytes())
        .map_err(CommitError::MessageFileFailed)?;
    message_file.flush().map_err(CommitError::MessageFileFailed)?;

    let args = commit_args(message_file.path(), extra_flags, path);
    debug!(?args, dir = %repo_dir.display(), "Running git commit");

    let output = Command::new(git)
        .current_dir(repo_dir)
        .args(&args)
        .output()
        .map_err(CommitError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Err(CommitError::GitFailed {
            code: output.status.code().unwrap_or(-1),
            stderr: if stderr.is_empty() { stdout } else { stderr },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_args_order() {
        let args = commit_args(
            Path::new("/tmp/msg"),
            &["--no-verify".to_string(), "--signoff".to_string()],
            Some("src/lib.rs"),
        );
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["commit", "-F", "/tmp/msg", "--no-verify", "--signoff", "--", "src/lib.rs"]
        );
    }

    #[test]
    fn test_commit_args_without_path() {
        let args = commit_args(Path::new("/tmp/msg"), &[], None);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_find_git() {
        // git is required to run the rest of the test suite anyway.
        assert!(find_git().is_ok());
    }
}

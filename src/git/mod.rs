//! Git access: staged diffs via git2, commits via the git executable.

pub mod commit;
pub mod diff;

pub use commit::{commit_args, commit_with_message, find_git};
pub use diff::{
    StagedTarget, open_repository, staged_diff, staged_diff_for_path, staged_files,
    staged_targets,
};

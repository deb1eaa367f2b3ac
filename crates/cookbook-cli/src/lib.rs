//! Drives the cookbook build over every fork in a fork list.

pub mod build;

pub use build::{CliError, build_all, build_fork, git_commit_hash};

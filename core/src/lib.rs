//! wsrun-core: dependency-aware batch execution for multi-package workspaces.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod util;
pub mod workspace;

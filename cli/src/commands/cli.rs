use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use wsrun_core::api::{ExecConfig, ExecRequest, UnitFilter, WorkspaceError};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wsrun",
    version,
    about = "Run a command in every package of a workspace, in dependency order"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root (defaults to the nearest directory holding wsrun.toml)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output_format: OutputFormat,

    /// Plain ASCII status markers in text output
    #[arg(long, global = true)]
    pub ascii: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in every selected package
    Exec(ExecArgs),
    /// Print the batch sequence without running anything
    Plan(PlanArgs),
}

/// Package selection by name.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only packages whose name matches (glob, repeatable)
    #[arg(long, action = clap::ArgAction::Append)]
    pub scope: Vec<String>,

    /// Skip packages whose name matches (glob, repeatable)
    #[arg(long, action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Skip packages marked private
    #[arg(long)]
    pub no_private: bool,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<UnitFilter, WorkspaceError> {
        UnitFilter::new(&self.scope, &self.ignore, !self.no_private)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecArgs {
    /// Packages in flight per batch (0 = unbounded, default: CPU count)
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    /// Keep going after a package fails
    #[arg(long)]
    pub no_bail: bool,

    /// Stream output live, prefixed by package name
    #[arg(long)]
    pub stream: bool,

    /// Start every package at once, ignoring dependencies (implies --stream)
    #[arg(long)]
    pub parallel: bool,

    /// Fail on dependency cycles instead of breaking them
    #[arg(long)]
    pub reject_cycles: bool,

    /// Put every package in one batch instead of ordering by dependencies
    #[arg(long)]
    pub no_sort: bool,

    /// Run the command through the platform shell
    #[arg(long)]
    pub shell: bool,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Command and arguments, usually after `--`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl ExecArgs {
    /// Flags win over `[exec]` config values.
    pub fn to_request(&self, cfg: &ExecConfig) -> ExecRequest {
        let mut request = ExecRequest::from_config(cfg, self.command.clone());
        if let Some(n) = self.concurrency {
            request.concurrency = n;
        }
        request.bail = request.bail && !self.no_bail;
        request.stream |= self.stream;
        request.parallel = self.parallel;
        request.reject_cycles |= self.reject_cycles;
        request.sort = request.sort && !self.no_sort;
        request.shell |= self.shell;
        request
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub reject_cycles: bool,

    #[arg(long)]
    pub no_sort: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

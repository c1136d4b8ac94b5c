//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Release-aware regression checks and grouping levels for tracked issues
#[derive(Parser, Debug)]
#[command(name = "tri", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (auto-discover .triage/triage.db if not set)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Actor name used for feature checks and audit fields
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Organization ID (defaults to `default-organization` config)
    #[arg(long = "org", global = true, value_name = "ID")]
    pub organization: Option<i64>,

    /// Project ID (defaults to `default-project` config)
    #[arg(long, global = true, value_name = "ID")]
    pub project: Option<i64>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a triage workspace
    Init(InitArgs),

    /// Manage releases
    Release {
        #[command(subcommand)]
        command: ReleaseCommands,
    },

    /// Manage groups (issues) and their materialized hashes
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Record events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Resolve a group against a release
    Resolve(ResolveArgs),

    /// Check whether a group is still resolved for a release
    Check(CheckArgs),

    /// List the hierarchical grouping levels of a group
    Levels(LevelsArgs),

    /// Manage feature flags
    Feature {
        #[command(subcommand)]
        command: FeatureCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Print the JSON Schema of command output records
    Schema(SchemaArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Overwrite an existing database
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommands {
    /// Add a release to the project
    Add(ReleaseAddArgs),
    /// List releases of the project, newest first
    List,
}

#[derive(Args, Debug)]
pub struct ReleaseAddArgs {
    /// Release version (e.g. "app@1.2.0" or "2024-06-nightly")
    pub version: String,

    /// When the release was added (RFC3339, YYYY-MM-DD, -2d, now)
    #[arg(long, default_value = "now")]
    pub date: String,

    /// Do not move pending next-release resolutions onto this release
    #[arg(long)]
    pub keep_pending: bool,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a group
    Create(GroupCreateArgs),
    /// Show a group with its resolution and hashes
    Show(GroupShowArgs),
    /// Materialize (or remove) hashes for a group
    Hash(GroupHashArgs),
}

#[derive(Args, Debug)]
pub struct GroupCreateArgs {
    /// Group title
    pub title: String,

    /// When the group was first seen
    #[arg(long, default_value = "now")]
    pub first_seen: String,
}

#[derive(Args, Debug)]
pub struct GroupShowArgs {
    /// Group ID
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct GroupHashArgs {
    /// Group ID
    pub id: i64,

    /// Hashes to materialize (32 hex characters)
    #[arg(required = true)]
    pub hashes: Vec<String>,

    /// Remove the hashes instead
    #[arg(long)]
    pub remove: bool,
}

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// Record an event for a group
    Record(EventRecordArgs),
}

#[derive(Args, Debug)]
pub struct EventRecordArgs {
    /// Group ID
    pub group_id: i64,

    /// Fingerprint component, most significant first (repeatable)
    #[arg(long = "frame", conflicts_with = "hashes")]
    pub frames: Vec<String>,

    /// Precomputed hierarchical hash, most granular first (repeatable)
    #[arg(long = "hash")]
    pub hashes: Vec<String>,

    /// Primary hash (defaults to the first hierarchical hash)
    #[arg(long)]
    pub primary_hash: Option<String>,

    /// Event timestamp
    #[arg(long, default_value = "now")]
    pub timestamp: String,
}

/// Resolution type accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ResolutionKind {
    /// Resolved in the given release
    #[default]
    InRelease,
    /// Resolved in whichever release follows the given one
    InNextRelease,
    /// Legacy resolution without a type
    Unset,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Group ID
    pub group_id: i64,

    /// Release ID or version (defaults to the project's latest release)
    #[arg(long)]
    pub release: Option<String>,

    /// Resolution type
    #[arg(long = "type", value_enum, default_value_t = ResolutionKind::InRelease)]
    pub kind: ResolutionKind,

    /// Version snapshot to compare against (defaults to the release version for in-next-release)
    #[arg(long, conflicts_with = "no_snapshot")]
    pub current_version: Option<String>,

    /// Store no version snapshot
    #[arg(long)]
    pub no_snapshot: bool,

    /// Numeric ID of the resolving user
    #[arg(long)]
    pub actor_id: Option<i64>,

    /// Remove the group's resolution instead
    #[arg(long, conflicts_with_all = ["release", "current_version", "no_snapshot"])]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Group ID
    pub group_id: i64,

    /// Candidate release ID or version (omit to check without a release)
    #[arg(long)]
    pub release: Option<String>,
}

#[derive(Args, Debug)]
pub struct LevelsArgs {
    /// Group ID
    pub group_id: i64,

    /// Show the overview record instead of the level list
    #[arg(long)]
    pub overview: bool,
}

#[derive(Subcommand, Debug)]
pub enum FeatureCommands {
    /// Enable a feature
    Enable(FeatureScopeArgs),
    /// Disable a feature
    Disable(FeatureScopeArgs),
    /// List enabled features
    List,
}

#[derive(Args, Debug)]
pub struct FeatureScopeArgs {
    /// Feature name (e.g. organizations:grouping-tree-ui)
    pub feature: String,

    /// Apply to every organization instead of the selected one
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get the effective value of a key
    Get {
        /// Config key (e.g. semver.release-window)
        key: String,
    },
    /// Store a runtime key in the database
    Set {
        /// Config key
        key: String,
        /// Value
        value: String,
    },
    /// Delete a key from the database
    #[command(visible_alias = "unset")]
    Delete {
        /// Config key
        key: String,
    },
    /// List the effective configuration
    List,
}

/// Arguments for the completions command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Record to describe (all when omitted)
    #[arg(value_enum)]
    pub target: Option<SchemaTarget>,
}

/// Output records with a published schema.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SchemaTarget {
    Release,
    Group,
    Resolution,
    Event,
    Overview,
    Levels,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_defaults() {
        let cli = Cli::try_parse_from(["tri", "resolve", "3", "--release", "1.0"]).unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.group_id, 3);
        assert_eq!(args.kind, ResolutionKind::InRelease);
        assert_eq!(args.release.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tri", "levels", "7", "--json", "--org", "2"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.organization, Some(2));
    }

    #[test]
    fn test_frames_conflict_with_hashes() {
        let result = Cli::try_parse_from([
            "tri", "event", "record", "1", "--frame", "a", "--hash", "b",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_next_release_type() {
        let cli =
            Cli::try_parse_from(["tri", "resolve", "1", "--type", "in-next-release"]).unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.kind, ResolutionKind::InNextRelease);
    }
}

//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::{Priority, Status};

pub mod commands;

/// Issue tracker with optimistic concurrency and a full audit trail (`SQLite`)
#[derive(Parser, Debug)]
#[command(name = "idb", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to .issuedb/issues.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Acting user (email, username or id)
    #[arg(long, global = true, env = "IDB_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize an issuedb workspace
    Init {
        /// Recreate config files and reopen an existing database
        #[arg(long)]
        force: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },

    /// Create a new issue
    Create(CreateArgs),

    /// List issues
    List(ListArgs),

    /// Show an issue with its comments
    Show {
        /// Issue ID
        id: i64,
    },

    /// Update an issue (requires the version you last read)
    Update(UpdateArgs),

    /// Manage comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Move several issues to one status atomically
    BulkStatus(BulkStatusArgs),

    /// Import issues from a CSV file
    Import(ImportArgs),

    /// Show the audit trail of an issue, newest first
    Timeline {
        /// Issue ID
        id: i64,
    },

    /// Aggregate reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Totals by status and priority plus recent issues
    Dashboard,

    /// Inspect and change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print JSON Schemas for command output
    Schema(SchemaArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Register(RegisterArgs),
    /// List users
    List,
    /// Show the authenticated actor
    Whoami,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Email address
    #[arg(long)]
    pub email: String,

    /// Unique username
    #[arg(long)]
    pub username: String,

    /// Display name
    #[arg(long)]
    pub full_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Create a label
    Create {
        /// Label name
        name: String,

        /// Hex color (#rrggbb)
        #[arg(long)]
        color: Option<String>,
    },
    /// List labels
    List,
    /// Install the standard label set
    Seed,
    /// Replace the labels of an issue
    Set {
        /// Issue ID
        id: i64,

        /// Label IDs (none clears every label)
        label_ids: Vec<i64>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Issue title
    pub title: String,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Initial status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Priority (defaults to config default-priority)
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Assignee (email, username or id)
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Label IDs
    #[arg(short, long = "label", value_delimiter = ',')]
    pub labels: Vec<i64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Filter by priority
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Filter by assignee (email, username or id)
    #[arg(long)]
    pub assignee: Option<String>,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Page size, 1-100 (defaults to config list-limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct UpdateArgs {
    /// Issue ID
    pub id: i64,

    /// Version you last read; the update fails if it is stale
    #[arg(long = "expected-version", visible_alias = "version")]
    pub expected_version: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,

    /// New status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// New priority
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// New assignee (email, username or id)
    #[arg(long, conflicts_with = "unassign")]
    pub assignee: Option<String>,

    /// Remove the assignee
    #[arg(long)]
    pub unassign: bool,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Add a comment to an issue
    Add {
        /// Issue ID
        id: i64,

        /// Comment text
        body: String,
    },
    /// List comments on an issue, oldest first
    List {
        /// Issue ID
        id: i64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct BulkStatusArgs {
    /// Target status
    #[arg(value_enum)]
    pub status: StatusArg,

    /// Issue IDs
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// CSV file with a header row
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Assignees with the most issues
    TopAssignees {
        /// Number of assignees, 1-50
        #[arg(long, default_value_t = crate::storage::DEFAULT_TOP_ASSIGNEES)]
        limit: usize,
    },
    /// Mean resolution time, overall and per priority
    ResolutionTime,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the merged configuration
    List,
    /// Show one key
    Get {
        /// Config key
        key: String,
    },
    /// Store a runtime key in the database
    Set {
        /// Config key
        key: String,
        /// Value
        value: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Which schema to print
    #[arg(value_enum, default_value_t = SchemaTarget::All)]
    pub target: SchemaTarget,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    All,
    Issue,
    IssueDetails,
    HistoryEntry,
    ImportResult,
    BulkStatusResult,
    TopAssignees,
    ResolutionStats,
    Dashboard,
    Error,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

/// Status as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Open,
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    Resolved,
    Closed,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => Self::Open,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Resolved => Self::Resolved,
            StatusArg::Closed => Self::Closed,
        }
    }
}

/// Priority as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
            PriorityArg::Critical => Self::Critical,
        }
    }
}

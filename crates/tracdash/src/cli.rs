//! Clap derive structures for the `tracdash` CLI.
//!
//! Defines the command tree, global flags and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tracdash -- GPS fleet dashboard for the terminal
#[derive(Debug, Parser)]
#[command(
    name = "tracdash",
    version,
    about = "Watch and control GPS tracking devices from the command line",
    long_about = "Command-line dashboard for Traccar-compatible GPS tracking servers.\n\n\
        Lists devices with their latest positions, shows a device's status card,\n\
        toggles live mode, light and buzzer, and runs trip reports.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "TRACDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'u', env = "TRACDASH_URL", global = true)]
    pub url: Option<String>,

    /// Account email (password read from TRACDASH_PASSWORD or keyring)
    #[arg(long, env = "TRACDASH_EMAIL", global = true)]
    pub email: Option<String>,

    /// API token (overrides profile credentials)
    #[arg(long, env = "TRACDASH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TRACDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "TRACDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "TRACDASH_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// A remotely switchable device feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CapabilityArg {
    /// Live mode (command type liveModeOn)
    #[value(alias = "live-mode")]
    Live,
    /// Light (command type lightOn)
    Light,
    /// Buzzer (command type buzzerOn)
    Buzzer,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect tracked devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Send a live mode, light or buzzer command to a device
    #[command(alias = "cmd")]
    Command(CommandArgs),

    /// Show which remote controls a device currently supports
    Status(StatusArgs),

    /// Create geofences from device positions
    #[command(alias = "geo")]
    Geofence(GeofenceArgs),

    /// Show full details of a position
    #[command(alias = "pos")]
    Position(PositionArgs),

    /// Run reports
    #[command(alias = "rep")]
    Report(ReportArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices with their latest position
    #[command(alias = "ls")]
    List {
        /// Only show devices with this status (online, offline, unknown)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a device's status card
    Show {
        /// Device ID, name or unique identifier
        device: String,

        /// Skip polling live mode, light and buzzer support
        #[arg(long)]
        no_poll: bool,
    },

    /// Print map and navigation links for a device's latest position
    Links {
        /// Device ID, name or unique identifier
        device: String,
    },

    /// Print the URL of a device's image
    Image {
        /// Device ID, name or unique identifier
        device: String,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Remove {
        /// Device ID, name or unique identifier
        device: String,
    },
}

// ── Command / Status ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CommandArgs {
    /// Device ID, name or unique identifier
    pub device: String,

    /// Control to activate
    pub capability: CapabilityArg,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Device ID, name or unique identifier
    pub device: String,
}

// ── Geofence ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GeofenceArgs {
    #[command(subcommand)]
    pub command: GeofenceCommand,
}

#[derive(Debug, Subcommand)]
pub enum GeofenceCommand {
    /// Create a 50 m circular geofence at a device's position and link it
    Create {
        /// Device ID, name or unique identifier
        device: String,
    },
}

// ── Position ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PositionArgs {
    /// Position ID
    pub id: i64,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Trips for one device over a time range
    Trips(TripsArgs),

    /// List the trip report columns and whether they show by default
    Columns,
}

#[derive(Debug, Args)]
pub struct TripsArgs {
    /// Device ID, name or unique identifier
    #[arg(long, short = 'd')]
    pub device: String,

    /// Range start (RFC 3339, or YYYY-MM-DD for local midnight)
    #[arg(long)]
    pub from: String,

    /// Range end (RFC 3339, or YYYY-MM-DD for local midnight)
    #[arg(long)]
    pub to: String,

    /// Download the report as a spreadsheet instead of printing rows
    #[arg(long, short = 'e')]
    pub export: bool,

    /// Ask the server to email the report
    #[arg(long)]
    pub mail: bool,

    /// Where to write an exported file (directory or file path)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Comma-separated columns to show (see `report columns`)
    #[arg(long, value_delimiter = ',', conflicts_with = "all_columns")]
    pub columns: Option<Vec<String>>,

    /// Show every column, including those hidden by default
    #[arg(long)]
    pub all_columns: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, email, auth_mode, token_env, password_env,
        /// insecure, timeout, ca_cert, inference, or pref.<name>)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a password or token in the system keyring
    SetPassword {
        /// Profile to store the secret for (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! `tracdash-tui`: terminal dashboard for Traccar-compatible GPS servers.
//!
//! Two screens, switched with `1`/`2` or Tab: the device list with a
//! floating status card for the selected device, and the trip report with
//! its filter form and column toggles.
//!
//! Logs go to a file (default `/tmp/tracdash-tui.log`) so they never
//! corrupt the terminal. A background data bridge opens the session and
//! keeps the device and position lists fresh.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod period;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tracdash_config::{AuthMode, Profile};
use tracdash_core::{AuthCredentials, ConnectionConfig};

use crate::app::{App, AppOptions};

/// Terminal dashboard for Traccar-compatible GPS tracking servers.
#[derive(Parser, Debug)]
#[command(name = "tracdash-tui", version, about)]
struct Cli {
    /// Profile from the tracdash config file
    #[arg(short = 'p', long, env = "TRACDASH_PROFILE")]
    profile: Option<String>,

    /// Server URL (e.g., https://track.example.com)
    #[arg(short = 'u', long, env = "TRACDASH_URL")]
    url: Option<String>,

    /// API token
    #[arg(long, env = "TRACDASH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Sign in with this email (password from TRACDASH_PASSWORD or keyring)
    #[arg(long, env = "TRACDASH_EMAIL")]
    email: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Seconds between device and position refreshes
    #[arg(long, default_value_t = 10)]
    refresh: u64,

    /// Directory exported reports are saved to
    #[arg(long, default_value = ".")]
    download_dir: PathBuf,

    /// Log file path
    #[arg(long, default_value = "/tmp/tracdash-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. The returned guard must live as long as the app so
/// buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tracdash_tui={log_level},tracdash_core={log_level},tracdash_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("tracdash-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Connection from flags layered over the selected (or default) profile.
fn build_connection(cli: &Cli) -> Result<ConnectionConfig> {
    let cfg = tracdash_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(cli.profile.as_deref());

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if cli.profile.is_some() => {
            return Err(eyre!(
                "profile '{profile_name}' not found (available: {})",
                cfg.profile_names()
            ));
        }
        None => {
            let url = cli.url.as_deref().ok_or_else(|| {
                eyre!(
                    "no server configured: pass --url or run `tracdash config init` ({})",
                    tracdash_config::config_path().display()
                )
            })?;
            Profile::new(url)
        }
    };
    if let Some(ref url) = cli.url {
        profile.url.clone_from(url);
    }
    if let Some(ref email) = cli.email {
        profile.email = Some(email.clone());
        profile.auth_mode = AuthMode::Password;
    }

    if let Some(ref token) = cli.token {
        profile.auth_mode = AuthMode::Token;
        profile.token = Some(token.clone());
    }

    let mut config =
        tracdash_config::profile_to_connection_config(&profile, &profile_name, &cfg.defaults)?;
    // An explicit flag beats any token found in the environment or keyring.
    if let Some(ref token) = cli.token {
        config.auth = AuthCredentials::Token(SecretString::from(token.clone()));
    }
    if cli.insecure {
        config.tls = tracdash_core::TlsVerification::DangerAcceptInvalid;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let connection = build_connection(&cli)?;
    info!(url = %connection.url, "starting tracdash-tui");

    let mut app = App::new(
        connection,
        AppOptions {
            refresh_interval: Duration::from_secs(cli.refresh.max(1)),
            download_dir: cli.download_dir,
        },
    );
    app.run().await?;

    Ok(())
}

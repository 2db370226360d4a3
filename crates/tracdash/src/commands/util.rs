//! Shared helpers for command handlers.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use tracdash_core::{Device, Session};

use crate::cli::{CapabilityArg, GlobalOpts};
use crate::error::CliError;

/// Refresh the cache and resolve a device by ID, name or unique id.
pub async fn load_device(session: &Session, identifier: &str) -> Result<std::sync::Arc<Device>, CliError> {
    session.refresh().await?;
    Ok(session.find_device(identifier)?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// A stderr spinner, hidden in quiet mode.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn capability(arg: CapabilityArg) -> tracdash_core::Capability {
    match arg {
        CapabilityArg::Live => tracdash_core::Capability::LiveMode,
        CapabilityArg::Light => tracdash_core::Capability::Light,
        CapabilityArg::Buzzer => tracdash_core::Capability::Buzzer,
    }
}

/// Parse an RFC 3339 timestamp, or a bare date as local midnight.
pub fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, CliError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let invalid = || CliError::Validation {
        field: field.into(),
        reason: format!("expected RFC 3339 or YYYY-MM-DD, got '{raw}'"),
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_time("from", "2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_bare_date() {
        assert!(parse_time("to", "2024-03-15").is_ok());
        assert!(matches!(
            parse_time("to", "15/03/2024"),
            Err(CliError::Validation { .. })
        ));
    }
}

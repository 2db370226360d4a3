//! Capability status handler.

use serde::Serialize;
use tabled::Tabled;

use tracdash_core::{Capability, Session};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct CapabilityEntry {
    capability: Capability,
    enabled: bool,
    error: Option<String>,
}

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Control")]
    control: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Note")]
    note: String,
}

pub async fn handle(session: &Session, args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let device = util::load_device(session, &args.device).await?;

    let bar = util::spinner("Checking remote controls", global);
    let poll = session.poll_status(device.id).await;
    bar.finish_and_clear();
    let poll = poll.ok_or_else(|| CliError::ApiError {
        message: "status poll was cancelled".into(),
        status: None,
    })?;

    if session.store().position(device.id).is_none() && !global.quiet {
        eprintln!("'{}' has no known position; remote controls are unavailable", device.name);
    }

    let entries: Vec<CapabilityEntry> = Capability::ALL
        .into_iter()
        .map(|c| {
            let state = poll.get(c);
            CapabilityEntry {
                capability: c,
                enabled: state.enabled,
                error: state.error.clone(),
            }
        })
        .collect();

    let fmt = session.formatter();
    let out = output::render_list(
        &global.output,
        &entries,
        |e| CapabilityRow {
            control: fmt.t(e.capability.label_key()),
            state: output::enabled(e.enabled, color),
            note: e.error.clone().unwrap_or_default(),
        },
        |e| format!("{}={}", e.capability, e.enabled),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

//! Device command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use tracdash_core::card::{apple_maps_url, google_maps_url, navigation_url, street_view_url};
use tracdash_core::format::Axis;
use tracdash_core::{
    CardAction, Device, DeviceStatus, MenuEntry, Position, Session, StatusCard,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

/// A device with its latest position, as listed.
#[derive(Serialize)]
struct DeviceEntry {
    #[serde(flatten)]
    device: Arc<Device>,
    position: Option<Arc<Position>>,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Identifier")]
    unique_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Update")]
    last_update: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Speed")]
    speed: String,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Link")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
}

#[derive(Serialize)]
struct Link {
    title: String,
    url: String,
}

fn device_row(entry: &DeviceEntry, session: &Session, color: bool) -> DeviceRow {
    let fmt = session.formatter();
    let d = &entry.device;
    DeviceRow {
        id: d.id.to_string(),
        name: d.name.clone(),
        unique_id: d.unique_id.clone(),
        status: output::device_status(d.status, color),
        last_update: d
            .last_update
            .map_or_else(|| "-".into(), |t| fmt.datetime(&t)),
        position: entry.position.as_ref().map_or_else(
            || "-".into(),
            |p| {
                format!(
                    "{}, {}",
                    fmt.coordinate(p.latitude, Axis::Latitude),
                    fmt.coordinate(p.longitude, Axis::Longitude)
                )
            },
        ),
        speed: entry
            .position
            .as_ref()
            .map_or_else(|| "-".into(), |p| fmt.speed(p.speed)),
    }
}

// ── Status card ─────────────────────────────────────────────────────

fn card_detail(card: &StatusCard, session: &Session, color: bool) -> String {
    let fmt = session.formatter();
    let mut out = vec![output::heading(&card.title, color)];

    if card.rows.is_empty() {
        out.push(fmt.t("sharedNoData"));
    } else {
        let pairs: Vec<(String, String)> = card
            .rows
            .iter()
            .map(|r| (r.label.clone(), r.value.clone()))
            .collect();
        out.push(output::key_values(&pairs));
    }
    if let Some(details) = card.details {
        out.push(format!("{}: {details}", fmt.t("sharedShowDetails")));
    }

    out.push(String::new());
    let actions: Vec<(String, String)> = card
        .toolbar
        .iter()
        .map(|b| {
            let mut state = output::enabled(b.enabled, color);
            if let Some(route) = card.route_for(b.action) {
                state.push_str(&format!("  {route}"));
            }
            (fmt.t(b.action.label_key()), state)
        })
        .collect();
    out.push(output::key_values(&actions));

    let menu: Vec<(String, String)> = card
        .menu
        .iter()
        .map(|entry| match entry {
            MenuEntry::CreateGeofence => (
                fmt.t("sharedCreateGeofence"),
                format!("tracdash geofence create {}", card.device_id),
            ),
            MenuEntry::Link { title, url } => (title.clone(), url.clone()),
            MenuEntry::Share(route) => (fmt.t("deviceShare"), route.to_string()),
        })
        .collect();
    if !menu.is_empty() {
        out.push(String::new());
        out.push(output::key_values(&menu));
    }
    out.join("\n")
}

fn links(session: &Session, position: &Position) -> Vec<Link> {
    let fmt = session.formatter();
    let mut links = vec![
        Link {
            title: fmt.t("linkGoogleMaps"),
            url: google_maps_url(position),
        },
        Link {
            title: fmt.t("linkAppleMaps"),
            url: apple_maps_url(position),
        },
        Link {
            title: fmt.t("linkStreetView"),
            url: street_view_url(position),
        },
    ];
    if let Some(app) = session.preferences().navigation_app() {
        links.push(Link {
            url: navigation_url(&app.link, position),
            title: app.title,
        });
    }
    links
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        DevicesCommand::List { status } => {
            let wanted = status
                .map(|s| {
                    s.parse::<DeviceStatus>().map_err(|_| CliError::Validation {
                        field: "status".into(),
                        reason: format!("expected online, offline or unknown, got '{s}'"),
                    })
                })
                .transpose()?;

            session.refresh().await?;
            let store = session.store();
            let entries: Vec<DeviceEntry> = store
                .devices_snapshot()
                .iter()
                .filter(|d| wanted.is_none_or(|w| d.status == w))
                .map(|d| DeviceEntry {
                    position: store.position(d.id),
                    device: Arc::clone(d),
                })
                .collect();

            let out = output::render_list(
                &global.output,
                &entries,
                |e| device_row(e, session, color),
                |e| e.device.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { device, no_poll } => {
            let device = util::load_device(session, &device).await?;
            let poll = if no_poll {
                None
            } else {
                let bar = util::spinner("Checking remote controls", global);
                let poll = session.poll_status(device.id).await;
                bar.finish_and_clear();
                poll
            };
            if let Some(ref poll) = poll {
                for err in poll.errors() {
                    tracing::warn!("{err}");
                }
            }

            let card = session
                .status_card(device.id, poll.as_ref(), false)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: device.id.to_string(),
                    list_command: "devices list".into(),
                })?;
            let out = output::render_single(
                &global.output,
                &card,
                |c| card_detail(c, session, color),
                |c| c.device_id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Links { device } => {
            let device = util::load_device(session, &device).await?;
            let Some(position) = session.store().position(device.id) else {
                return Err(CliError::Validation {
                    field: "device".into(),
                    reason: format!("'{}' has no known position", device.name),
                });
            };
            let mut links = links(session, &position);
            if session.permissions().can_share() {
                let share = tracdash_core::Route::DeviceShare(device.id);
                links.push(Link {
                    title: session.formatter().t("deviceShare"),
                    url: share
                        .url(session.base_url())
                        .map_or_else(|_| share.path(), |u| u.to_string()),
                });
            }
            let out = output::render_list(
                &global.output,
                &links,
                |l| LinkRow {
                    title: l.title.clone(),
                    url: l.url.clone(),
                },
                |l| l.url.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Image { device } => {
            let device = util::load_device(session, &device).await?;
            let url = session
                .device_image_url(&device)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "image for device".into(),
                    identifier: device.name.clone(),
                    list_command: "devices list".into(),
                })?;
            output::print_output(url.as_str(), global.quiet);
            Ok(())
        }

        DevicesCommand::Remove { device } => {
            let device = util::load_device(session, &device).await?;
            let card = session.status_card(device.id, None, false);
            if !card.is_some_and(|c| c.is_enabled(CardAction::Remove)) {
                return Err(CliError::PermissionDenied {
                    message: "removing devices requires a writable administrator account".into(),
                });
            }
            let prompt = format!("{} '{}'?", session.formatter().t("sharedRemoveConfirm"), device.name);
            if !util::confirm(&prompt, global.yes)? {
                return Err(CliError::NotConfirmed {
                    action: "devices remove".into(),
                });
            }
            session.remove_device(device.id).await?;
            if !global.quiet {
                eprintln!("Removed device '{}' ({})", device.name, device.id);
            }
            Ok(())
        }
    }
}

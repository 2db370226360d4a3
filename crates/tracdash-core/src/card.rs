// ── Device status card ──
//
// View model for the floating card shown for the selected device: a
// details table driven by the `positionItems` preference, a toolbar of
// actions with their enabled state, and the "more" menu of link-outs.
// Pure data; front-ends decide how to draw and move it.

use serde::Serialize;

use crate::attributes::AttributeDictionary;
use crate::format::Formatter;
use crate::model::{Device, DeviceId, Position};
use crate::permissions::Permissions;
use crate::preferences::Preferences;
use crate::route::Route;
use crate::status::{Capability, StatusPoll};

/// One row of the details table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// Toolbar actions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CardAction {
    More,
    Capability(Capability),
    Replay,
    SendCommand,
    Edit,
    Remove,
}

impl CardAction {
    pub fn label_key(self) -> &'static str {
        match self {
            Self::More => "sharedExtra",
            Self::Capability(c) => c.label_key(),
            Self::Replay => "reportReplay",
            Self::SendCommand => "commandTitle",
            Self::Edit => "sharedEdit",
            Self::Remove => "sharedRemove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolbarButton {
    pub action: CardAction,
    pub enabled: bool,
}

/// Entries of the "more" menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuEntry {
    CreateGeofence,
    /// External link-out.
    Link { title: String, url: String },
    Share(Route),
}

/// Everything needed to draw the status card for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCard {
    pub device_id: DeviceId,
    pub title: String,
    /// Device image file name, when one is configured.
    pub image: Option<String>,
    pub rows: Vec<StatusRow>,
    /// Admin-only link to the full position details.
    pub details: Option<Route>,
    pub toolbar: Vec<ToolbarButton>,
    /// Empty when no position is known.
    pub menu: Vec<MenuEntry>,
}

impl StatusCard {
    pub fn button(&self, action: CardAction) -> Option<&ToolbarButton> {
        self.toolbar.iter().find(|b| b.action == action)
    }

    pub fn is_enabled(&self, action: CardAction) -> bool {
        self.button(action).is_some_and(|b| b.enabled)
    }

    /// Route opened by a toolbar action, for actions that navigate.
    pub fn route_for(&self, action: CardAction) -> Option<Route> {
        match action {
            CardAction::Replay => Some(Route::Replay),
            CardAction::SendCommand => Some(Route::DeviceCommand(self.device_id)),
            CardAction::Edit => Some(Route::DeviceSettings(self.device_id)),
            _ => None,
        }
    }
}

/// Session-wide inputs to [`build_status_card`].
pub struct CardContext<'a> {
    pub permissions: &'a dyn Permissions,
    pub preferences: &'a Preferences,
    pub dictionary: &'a AttributeDictionary,
    pub formatter: &'a Formatter,
}

/// Build the card for `device`.
///
/// `status` is the latest capability poll for this device; before it
/// arrives the capability controls stay disabled. `disable_actions`
/// greys out navigation and edit actions (e.g. while replaying).
pub fn build_status_card(
    device: &Device,
    position: Option<&Position>,
    status: Option<&StatusPoll>,
    disable_actions: bool,
    ctx: &CardContext<'_>,
) -> StatusCard {
    let admin = ctx.permissions.administrator();
    let readonly = ctx.permissions.device_readonly();
    let has_position = position.is_some();

    let rows = position.map_or_else(Vec::new, |p| status_rows(p, ctx));

    let capability_enabled = |c: Capability| {
        has_position
            && status
                .filter(|s| s.device_id == device.id)
                .is_some_and(|s| s.enabled(c))
    };

    let mut toolbar = vec![
        ToolbarButton {
            action: CardAction::More,
            enabled: has_position,
        },
        ToolbarButton {
            action: CardAction::Capability(Capability::LiveMode),
            enabled: capability_enabled(Capability::LiveMode),
        },
        ToolbarButton {
            action: CardAction::Capability(Capability::Light),
            enabled: capability_enabled(Capability::Light),
        },
        ToolbarButton {
            action: CardAction::Capability(Capability::Buzzer),
            enabled: capability_enabled(Capability::Buzzer),
        },
        ToolbarButton {
            action: CardAction::Replay,
            enabled: !disable_actions && has_position,
        },
    ];
    if admin {
        toolbar.push(ToolbarButton {
            action: CardAction::SendCommand,
            enabled: !disable_actions,
        });
    }
    toolbar.push(ToolbarButton {
        action: CardAction::Edit,
        enabled: !disable_actions && !readonly,
    });
    if admin {
        toolbar.push(ToolbarButton {
            action: CardAction::Remove,
            enabled: !disable_actions && !readonly,
        });
    }

    StatusCard {
        device_id: device.id,
        title: device.name.clone(),
        image: device.image().map(str::to_owned),
        rows,
        details: position
            .filter(|_| admin)
            .map(|p| Route::PositionDetails(p.id)),
        toolbar,
        menu: position.map_or_else(Vec::new, |p| menu_entries(device.id, p, ctx)),
    }
}

/// Details rows in `positionItems` order. Keys the position lacks are
/// skipped; unknown keys are labelled with the key itself.
pub fn status_rows(position: &Position, ctx: &CardContext<'_>) -> Vec<StatusRow> {
    ctx.preferences
        .position_items()
        .into_iter()
        .filter_map(|key| {
            let (_, value) = position.lookup(&key)?;
            Some(StatusRow {
                label: ctx.dictionary.label(&key).to_owned(),
                value: ctx.dictionary.render(&key, &value, ctx.formatter),
                key,
            })
        })
        .collect()
}

fn menu_entries(device_id: DeviceId, position: &Position, ctx: &CardContext<'_>) -> Vec<MenuEntry> {
    let fmt = ctx.formatter;
    let mut entries = vec![
        MenuEntry::CreateGeofence,
        MenuEntry::Link {
            title: fmt.t("linkGoogleMaps"),
            url: google_maps_url(position),
        },
        MenuEntry::Link {
            title: fmt.t("linkAppleMaps"),
            url: apple_maps_url(position),
        },
        MenuEntry::Link {
            title: fmt.t("linkStreetView"),
            url: street_view_url(position),
        },
    ];
    if let Some(app) = ctx.preferences.navigation_app() {
        entries.push(MenuEntry::Link {
            url: navigation_url(&app.link, position),
            title: app.title,
        });
    }
    if ctx.permissions.can_share() {
        entries.push(MenuEntry::Share(Route::DeviceShare(device_id)));
    }
    entries
}

// ── Link-outs ────────────────────────────────────────────────────────

pub fn google_maps_url(position: &Position) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}%2C{}",
        position.latitude, position.longitude
    )
}

pub fn apple_maps_url(position: &Position) -> String {
    format!(
        "http://maps.apple.com/?ll={},{}",
        position.latitude, position.longitude
    )
}

pub fn street_view_url(position: &Position) -> String {
    format!(
        "https://www.google.com/maps/@?api=1&map_action=pano&viewpoint={}%2C{}&heading={}",
        position.latitude, position.longitude, position.course
    )
}

/// Fill a navigation app template's `{latitude}` and `{longitude}`.
pub fn navigation_url(template: &str, position: &Position) -> String {
    template
        .replacen("{latitude}", &position.latitude.to_string(), 1)
        .replacen("{longitude}", &position.longitude.to_string(), 1)
}

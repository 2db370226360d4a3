//! Every state change in the TUI travels through the action channel.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracdash_core::{
    Capability, Device, DeviceId, Position, Route, Session, StatusPoll, TripReportParams, TripRow,
};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast in the bottom-right corner.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Destructive operations waiting for a yes/no.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    RemoveDevice { id: DeviceId, name: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveDevice { name, .. } => write!(f, "Remove {name}? This cannot be undone."),
        }
    }
}

/// How a trip report request ended.
#[derive(Debug, Clone)]
pub enum TripReportResult {
    Rows(Arc<Vec<TripRow>>),
    /// Export written to disk.
    Saved(PathBuf),
    /// The server answered without a content type.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── Connection ────────────────────────────────────────────────
    Connecting,
    Connected(Session),
    Disconnected(String),

    // ── Data ──────────────────────────────────────────────────────
    DevicesUpdated(Arc<Vec<Arc<Device>>>),
    PositionsUpdated(Arc<Vec<Arc<Position>>>),

    // ── Status card ───────────────────────────────────────────────
    /// Card opened for a device, or closed with `None`.
    SelectDevice(Option<DeviceId>),
    StatusPolled(StatusPoll),
    SendCapability(DeviceId, Capability),
    CreateGeofence(DeviceId),
    RequestRemove(DeviceId),
    /// A dashboard page; shown as its URL.
    OpenRoute(Route),
    OpenLink { title: String, url: String },

    // ── Trip report ───────────────────────────────────────────────
    RunTripReport(TripReportParams),
    TripReportFinished(TripReportResult),

    // ── Confirm dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}

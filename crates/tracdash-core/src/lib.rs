//! Dashboard logic between `tracdash-api` and the UI crates (CLI / TUI).
//!
//! - **[`Session`]**: authenticated client plus the signed-in
//!   [`Account`], resolved [`Preferences`] and the reactive [`DataStore`]
//!   of devices and latest positions.
//!
//! - **Status card** ([`card`]): view model for the selected device,
//!   built from the attribute dictionary, formatters, the
//!   [`StatusPoller`] result and the caller's [`Permissions`].
//!
//! - **Remote commands** ([`dispatch`]): fixed command payloads for live
//!   mode, light and buzzer.
//!
//! - **Trip report** ([`report`]): JSON rows or a file download from one
//!   request, with column definitions and visibility toggles.
//!
//! - **Formatting** ([`format`], [`i18n`]): unit-aware, translatable
//!   display strings.

pub mod attributes;
pub mod card;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod fab;
pub mod format;
pub mod geofence;
pub mod i18n;
pub mod model;
pub mod permissions;
pub mod preferences;
pub mod report;
pub mod route;
pub mod session;
pub mod status;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use attributes::AttributeDictionary;
pub use card::{CardAction, MenuEntry, StatusCard, StatusRow, ToolbarButton};
pub use config::{AuthCredentials, ConnectionConfig, InferenceMode, TlsVerification};
pub use error::CoreError;
pub use fab::CollectionFab;
pub use format::{CoordinateFormat, DistanceUnit, Formatter, SpeedUnit, VolumeUnit};
pub use i18n::{Catalog, English, Translate};
pub use permissions::{Account, Permissions, StaticPermissions};
pub use preferences::Preferences;
pub use report::{ColumnVisibility, ReportFile, ReportOutcome, TRIP_COLUMNS, TripColumn, TripRow};
pub use route::Route;
pub use session::Session;
pub use status::{Capability, CapabilityState, StatusPoll, StatusPoller};
pub use store::DataStore;

pub use model::{
    Device, DeviceId, DeviceStatus, FieldSource, FieldValue, GeofenceId, Position, PositionId,
    Server, User,
};

// The API types callers need to build requests.
pub use tracdash_api::{ReportFormat, TripReportParams};

// tracdash-api: Async Rust client for Traccar-compatible tracking servers

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod commands;
mod devices;
mod geofences;
mod positions;
mod reports;
mod session;

pub use auth::Credentials;
pub use client::ApiClient;
pub use error::Error;
pub use reports::{EXCEL_MEDIA_TYPE, ReportFormat, ReportResponse, TripReportParams};
pub use transport::{TlsMode, TransportConfig};

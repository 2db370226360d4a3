// ── Domain model ──

pub mod account;
pub mod device;
pub mod ids;
pub mod position;

pub use account::{Server, User};
pub use device::{Device, DeviceStatus};
pub use ids::{DeviceId, GeofenceId, PositionId};
pub use position::{FIXED_FIELDS, FieldSource, FieldValue, Position};

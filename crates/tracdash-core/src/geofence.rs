// ── Geofence creation from a position ──
//
// Two writes: create a 50 m circle around the position, then link it to
// the position's device. The writes are not transactional. When the
// link fails the geofence stays on the server and the error names it.

use tracing::{info, warn};

use tracdash_api::ApiClient;
use tracdash_api::models::{DeviceGeofenceLink, NewGeofence};

use crate::error::CoreError;
use crate::model::{GeofenceId, Position};

/// Radius of geofences created from the status card, in meters.
pub const GEOFENCE_RADIUS: u32 = 50;

/// WKT-style circle area centred on `position`.
pub fn circle_area(position: &Position) -> String {
    format!(
        "CIRCLE ({} {}, {GEOFENCE_RADIUS})",
        position.latitude, position.longitude
    )
}

/// Create a geofence around `position` and link it to its device.
pub async fn create_at_position(
    client: &ApiClient,
    position: &Position,
    name: &str,
) -> Result<GeofenceId, CoreError> {
    let created = client
        .create_geofence(&NewGeofence {
            name: name.to_owned(),
            area: circle_area(position),
        })
        .await?;
    let geofence_id = GeofenceId(created.id);

    let link = DeviceGeofenceLink {
        device_id: position.device_id.0,
        geofence_id: geofence_id.0,
    };
    if let Err(e) = client.link_geofence(link).await {
        warn!(%geofence_id, device_id = %position.device_id, error = %e, "geofence left unlinked");
        return Err(CoreError::PartialFailure {
            geofence_id,
            message: e.to_string(),
        });
    }

    info!(%geofence_id, device_id = %position.device_id, "geofence created");
    Ok(geofence_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::position::tests::sample;

    #[test]
    fn circle_uses_latitude_then_longitude() {
        assert_eq!(circle_area(&sample()), "CIRCLE (52.52 13.405, 50)");
    }
}

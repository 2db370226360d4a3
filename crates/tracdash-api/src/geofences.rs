// Geofence and permission endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiGeofence, DeviceGeofenceLink, NewGeofence};

impl ApiClient {
    /// Create a geofence.
    ///
    /// `POST /api/geofences` with `{"name": "...", "area": "..."}`
    pub async fn create_geofence(&self, geofence: &NewGeofence) -> Result<ApiGeofence, Error> {
        debug!(name = %geofence.name, area = %geofence.area, "creating geofence");
        self.post_json("geofences", geofence).await
    }

    /// Link a device to a geofence.
    ///
    /// `POST /api/permissions` with `{"deviceId": N, "geofenceId": M}`
    pub async fn link_geofence(&self, link: DeviceGeofenceLink) -> Result<(), Error> {
        debug!(
            device_id = link.device_id,
            geofence_id = link.geofence_id,
            "linking device to geofence"
        );
        self.post_no_response("permissions", &link).await
    }
}

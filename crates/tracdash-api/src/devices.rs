// Device endpoints

use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::ApiDevice;

impl ApiClient {
    /// List all devices visible to the session user.
    ///
    /// `GET /api/devices`
    pub async fn list_devices(&self) -> Result<Vec<ApiDevice>, Error> {
        self.get_json("devices", &[]).await
    }

    /// Raw body of the device lookup for one id.
    ///
    /// `GET /api/devices?id={id}`. Returned uninterpreted so status
    /// inference can decide how to read it.
    pub async fn device_status_body(&self, device_id: i64) -> Result<String, Error> {
        debug!(device_id, "fetching device status body");
        self.get_text("devices", &[("id", device_id.to_string())])
            .await
    }

    /// Delete a device.
    ///
    /// `DELETE /api/devices/{id}`
    pub async fn delete_device(&self, device_id: i64) -> Result<(), Error> {
        debug!(device_id, "deleting device");
        self.delete(&format!("devices/{device_id}")).await
    }

    /// URL of a device image served by the media endpoint.
    ///
    /// `/api/media/{uniqueId}/{filename}`
    pub fn media_url(&self, unique_id: &str, filename: &str) -> Result<Url, Error> {
        let mut url = self.api_url("media")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(unique_id)
            .push(filename);
        Ok(url)
    }
}

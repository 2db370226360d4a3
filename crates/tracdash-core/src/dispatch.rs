// ── Remote command dispatch ──
//
// Each capability maps to one fixed command payload. Dispatch is a
// single POST with no retry; failures are returned to the caller.

use serde_json::Map;
use tracing::info;

use tracdash_api::ApiClient;
use tracdash_api::models::CommandRequest;

use crate::error::CoreError;
use crate::model::DeviceId;
use crate::status::Capability;

impl Capability {
    /// Server-side id of the saved command.
    pub fn command_id(self) -> i64 {
        match self {
            Self::LiveMode => 22,
            Self::Light => 9,
            Self::Buzzer => 7,
        }
    }

    pub fn command_type(self) -> &'static str {
        match self {
            Self::LiveMode => "liveModeOn",
            Self::Light => "lightOn",
            Self::Buzzer => "buzzerOn",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::LiveMode => "LiveMode",
            Self::Light => "Licht An",
            Self::Buzzer => "Buzzer An",
        }
    }

    /// The command payload that switches this capability on for `device_id`.
    pub fn command(self, device_id: DeviceId) -> CommandRequest {
        CommandRequest {
            id: self.command_id(),
            attributes: Map::new(),
            device_id: device_id.0,
            command_type: self.command_type().to_owned(),
            text_channel: false,
            description: self.description().to_owned(),
        }
    }
}

/// Send the command for `capability` to `device_id`.
pub async fn dispatch(
    client: &ApiClient,
    device_id: DeviceId,
    capability: Capability,
) -> Result<(), CoreError> {
    client.send_command(&capability.command(device_id)).await?;
    info!(%device_id, %capability, "command sent");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_in_wire_order() {
        let body = serde_json::to_string(&Capability::LiveMode.command(DeviceId(42))).unwrap();
        assert_eq!(
            body,
            r#"{"id":22,"attributes":{},"deviceId":42,"type":"liveModeOn","textChannel":false,"description":"LiveMode"}"#
        );
    }

    #[test]
    fn light_and_buzzer_payloads() {
        let light = Capability::Light.command(DeviceId(5));
        assert_eq!((light.id, light.command_type.as_str(), light.description.as_str()), (9, "lightOn", "Licht An"));
        let buzzer = Capability::Buzzer.command(DeviceId(5));
        assert_eq!((buzzer.id, buzzer.command_type.as_str(), buzzer.description.as_str()), (7, "buzzerOn", "Buzzer An"));
    }
}

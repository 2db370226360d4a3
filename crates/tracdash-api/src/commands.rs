// Device command endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::CommandRequest;

impl ApiClient {
    /// Queue or send a command to a device.
    ///
    /// `POST /api/commands/send`. The response body carries no contract the
    /// dashboard relies on, so only the status is checked.
    pub async fn send_command(&self, command: &CommandRequest) -> Result<(), Error> {
        debug!(
            device_id = command.device_id,
            command_type = %command.command_type,
            "sending command"
        );
        self.post_no_response("commands/send", command).await
    }

    /// Raw body of the command listing for one device.
    ///
    /// `GET /api/commands/send?deviceId={id}`. Returned uninterpreted so
    /// status inference can decide how to read it.
    pub async fn command_history_body(&self, device_id: i64) -> Result<String, Error> {
        debug!(device_id, "fetching command history body");
        self.get_text("commands/send", &[("deviceId", device_id.to_string())])
            .await
    }
}

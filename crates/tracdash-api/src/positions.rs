// Position endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::ApiPosition;

impl ApiClient {
    /// Latest known position of every visible device.
    ///
    /// `GET /api/positions`
    pub async fn latest_positions(&self) -> Result<Vec<ApiPosition>, Error> {
        self.get_json("positions", &[]).await
    }

    /// A single position by id.
    ///
    /// `GET /api/positions?id={id}` (the server answers with a one-element array).
    pub async fn position(&self, position_id: i64) -> Result<Option<ApiPosition>, Error> {
        debug!(position_id, "fetching position");
        let mut positions: Vec<ApiPosition> = self
            .get_json("positions", &[("id", position_id.to_string())])
            .await?;
        Ok(positions.pop())
    }
}

//! Detection statistics (admin)

use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{DetectionRecord, Statistics};

impl HelmetClient {
    pub async fn statistics(&self) -> Result<Statistics> {
        self.request(ApiRequest::get("/statistics")).await
    }

    /// Recent detection runs; the server defaults to 30 days
    pub async fn detection_history(&self, days: Option<u32>) -> Result<Vec<DetectionRecord>> {
        self.request(ApiRequest::get("/statistics/history").query_opt("days", days))
            .await
    }
}

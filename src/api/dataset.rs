//! Dataset management

use super::UploadFile;
use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{Ack, Dataset, DatasetUpload};

impl HelmetClient {
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        self.request(ApiRequest::get("/datasets")).await
    }

    pub async fn get_dataset(&self, id: i64) -> Result<Dataset> {
        self.request(ApiRequest::get(format!("/datasets/{}", id))).await
    }

    pub async fn create_dataset(&self, name: &str, description: Option<&str>) -> Result<Dataset> {
        let mut body = serde_json::json!({ "name": name });
        if let Some(description) = description {
            body["description"] = serde_json::Value::String(description.to_string());
        }
        self.request(ApiRequest::post("/datasets").json(body)).await
    }

    pub async fn delete_dataset(&self, id: i64) -> Result<Ack> {
        self.request(ApiRequest::delete(format!("/datasets/{}", id))).await
    }

    /// Upload images into a dataset (bulk transfer timeout)
    pub async fn upload_dataset(&self, id: i64, images: Vec<UploadFile>) -> Result<DatasetUpload> {
        let parts = images.into_iter().map(|f| f.into_part("images")).collect();
        self.request(
            ApiRequest::post(format!("/datasets/{}/upload", id))
                .multipart(parts)
                .timeout(self.config().upload_timeout()),
        )
        .await
    }
}

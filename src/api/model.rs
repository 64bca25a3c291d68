//! Detection model management and training

use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{Ack, Model, ModelMetrics, ModelTrainingData, ModelType, TrainRequest};

impl HelmetClient {
    pub async fn list_models(&self) -> Result<Vec<Model>> {
        self.request(ApiRequest::get("/models")).await
    }

    pub async fn get_model(&self, id: i64) -> Result<Model> {
        self.request(ApiRequest::get(format!("/models/{}", id))).await
    }

    pub async fn create_model(&self, name: &str, model_type: ModelType) -> Result<Model> {
        self.request(ApiRequest::post("/models").json(serde_json::json!({
            "name": name,
            "type": model_type,
        })))
        .await
    }

    pub async fn delete_model(&self, id: i64) -> Result<Ack> {
        self.request(ApiRequest::delete(format!("/models/{}", id))).await
    }

    /// Kick off training (admin); the server answers immediately
    pub async fn train_model(&self, request: &TrainRequest) -> Result<Ack> {
        self.request(ApiRequest::post("/models/train").json(serde_json::to_value(request)?))
            .await
    }

    pub async fn model_training_data(&self, id: i64) -> Result<ModelTrainingData> {
        self.request(ApiRequest::get(format!("/models/{}/training", id))).await
    }

    pub async fn model_metrics(&self, id: i64) -> Result<ModelMetrics> {
        self.request(ApiRequest::get(format!("/models/{}/metrics", id))).await
    }
}

//! Domain records exchanged with the detection backend
//!
//! Field names follow the backend's snake_case JSON. Timestamps are the
//! backend's naive ISO-8601 strings.

use crate::error::{ClientError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Detector class for a person wearing a helmet
pub const CLASS_WITH_HELMET: &str = "with_helmet";
/// Detector class for a person without a helmet
pub const CLASS_WITHOUT_HELMET: &str = "without_helmet";

/// Generic `{message}` acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Successful login: bearer token plus the signed-in user
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Fields for creating a user (admin)
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Partial update for a user (admin)
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// An image dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_count: u64,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub train_count: u64,
    #[serde(default)]
    pub val_count: u64,
    #[serde(default)]
    pub test_count: u64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Response to a dataset image upload
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetUpload {
    #[serde(default)]
    pub message: Option<String>,
    pub image_count: u64,
}

/// Model kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    General,
    Custom,
}

/// Evaluation metrics of a trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub map: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// A detection model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metrics: Option<ModelMetrics>,
    #[serde(default)]
    pub training_params: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Request to train a model on a dataset
#[derive(Debug, Clone, Serialize)]
pub struct TrainRequest {
    pub model_id: i64,
    pub dataset_id: i64,
    pub epochs: u32,
}

/// Per-epoch training curves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainingData {
    pub epochs: Vec<u32>,
    pub train_loss: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub map: Vec<f64>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
}

/// Detection count for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: String,
    pub count: u64,
}

/// Aggregate detection statistics (admin)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_detections: u64,
    pub with_helmet: u64,
    pub without_helmet: u64,
    pub detection_rate: f64,
    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
}

/// One stored detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub model_id: Option<i64>,
    pub detection_type: String,
    pub with_helmet: u64,
    pub without_helmet: u64,
    pub total: u64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Axis-aligned box in image pixel coordinates; `[x1, y1, x2, y2]` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    /// In `[0, 1]`
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn has_helmet(&self) -> bool {
        self.class == CLASS_WITH_HELMET
    }
}

/// Helmet / no-helmet counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub total: u64,
    pub with_helmet: u64,
    pub without_helmet: u64,
}

impl DetectionStats {
    /// Count detections by class; unknown classes only add to `total`
    pub fn from_detections(detections: &[Detection]) -> Self {
        detections.iter().fold(Self::default(), |mut stats, d| {
            stats.total += 1;
            match d.class.as_str() {
                CLASS_WITH_HELMET => stats.with_helmet += 1,
                CLASS_WITHOUT_HELMET => stats.without_helmet += 1,
                _ => {}
            }
            stats
        })
    }
}

fn decode_base64_image(image: &str) -> Result<Vec<u8>> {
    // Tolerate data URLs ("data:image/jpeg;base64,....")
    let payload = match image.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image,
    };
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| ClientError::Decode(format!("Invalid base64 image: {}", e)))
}

/// One realtime poll result: latest frame plus its detections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Base64-encoded image; empty while the server has no frame yet
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl DetectionFrame {
    /// Decode the image bytes
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        decode_base64_image(&self.image)
    }

    pub fn stats(&self) -> DetectionStats {
        DetectionStats::from_detections(&self.detections)
    }
}

/// Single image detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub stats: DetectionStats,
}

impl DetectResult {
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        decode_base64_image(&self.image)
    }
}

/// Totals over a processed video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub total_frames: u64,
    pub total_detections: u64,
    pub with_helmet: u64,
    pub without_helmet: u64,
}

/// Video detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetectResult {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub frame_results: Vec<DetectResult>,
    #[serde(default)]
    pub summary: VideoSummary,
}

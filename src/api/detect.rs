//! Image and video detection uploads

use super::UploadFile;
use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::{ApiRequest, MultipartPart};
use crate::types::{DetectResult, VideoDetectResult};

fn detect_form(field: &str, file: UploadFile, model_id: Option<i64>) -> Vec<MultipartPart> {
    let mut parts = vec![file.into_part(field)];
    if let Some(model_id) = model_id {
        parts.push(MultipartPart::text("model_id", model_id.to_string()));
    }
    parts
}

impl HelmetClient {
    /// Run detection on one image; `None` uses the server's default model
    pub async fn detect_image(&self, image: UploadFile, model_id: Option<i64>) -> Result<DetectResult> {
        self.request(ApiRequest::post("/detect/image").multipart(detect_form("image", image, model_id)))
            .await
    }

    /// Run detection over a whole video (bulk transfer timeout)
    pub async fn detect_video(
        &self,
        video: UploadFile,
        model_id: Option<i64>,
    ) -> Result<VideoDetectResult> {
        self.request(
            ApiRequest::post("/detect/video")
                .multipart(detect_form("video", video, model_id))
                .timeout(self.config().upload_timeout()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::UploadFile;
    use crate::config::ClientConfig;
    use crate::navigation::MemoryNavigator;
    use crate::session::Session;
    use crate::transport::memory::MemoryTransport;
    use crate::transport::{Method, MultipartPart, RequestBody};
    use crate::HelmetClient;
    use std::sync::Arc;
    use std::time::Duration;

    fn client() -> (HelmetClient, MemoryTransport) {
        let transport = MemoryTransport::new();
        let client = HelmetClient::with_parts(
            ClientConfig::default(),
            Arc::new(transport.clone()),
            Arc::new(Session::in_memory()),
            Arc::new(MemoryNavigator::new("/detect/image")),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn test_detect_image_with_model() {
        let (client, transport) = client();
        transport.respond(
            Method::Post,
            "/detect/image",
            serde_json::json!({
                "image": "aGVsbWV0",
                "detections": [{"class": "without_helmet", "confidence": 0.66, "bbox": [1, 2, 3, 4]}],
                "stats": {"total": 1, "with_helmet": 0, "without_helmet": 1}
            }),
        );

        let result = client
            .detect_image(UploadFile::new("gate.jpg", b"jpeg".to_vec()), Some(3))
            .await
            .unwrap();
        assert_eq!(result.stats.without_helmet, 1);
        assert_eq!(result.decode_image().unwrap(), b"helmet");

        let sent = transport.last_request().unwrap();
        assert!(sent.timeout.is_none());
        match sent.body {
            Some(RequestBody::Multipart(parts)) => {
                assert_eq!(parts[0].name(), "image");
                assert!(matches!(
                    &parts[1],
                    MultipartPart::Text { name, value } if name == "model_id" && value == "3"
                ));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detect_video_bulk_timeout() {
        let (client, transport) = client();
        transport.respond(
            Method::Post,
            "/detect/video",
            serde_json::json!({
                "video_url": "/api/detect/uploads/results/result.mp4",
                "frame_results": [],
                "summary": {"total_frames": 250, "total_detections": 40, "with_helmet": 35, "without_helmet": 5}
            }),
        );

        let result = client
            .detect_video(UploadFile::new("yard.mp4", b"mp4".to_vec()), None)
            .await
            .unwrap();
        assert_eq!(result.summary.total_frames, 250);

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.timeout, Some(Duration::from_secs(300)));
        match sent.body {
            Some(RequestBody::Multipart(parts)) => assert_eq!(parts.len(), 1),
            other => panic!("unexpected body: {:?}", other),
        }
    }
}

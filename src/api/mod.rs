//! Typed REST resources of the detection backend
//!
//! Each submodule adds methods to `HelmetClient` for one resource group.
//! All of them go through `HelmetClient::dispatch`.

mod auth;
mod dataset;
mod detect;
mod model;
mod statistics;
mod user;

use crate::error::{ClientError, Result};
use crate::transport::MultipartPart;
use bytes::Bytes;
use std::path::Path;

/// A file to upload in a multipart form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Bytes,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            content: content.into(),
            mime,
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Config(format!("Not a file path: {}", path.display())))?
            .to_string();
        let content = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Config(format!("Failed to read upload {}: {}", path.display(), e))
        })?;
        Ok(Self::new(file_name, content))
    }

    pub(crate) fn into_part(self, field: &str) -> MultipartPart {
        MultipartPart::File {
            name: field.to_string(),
            file_name: self.file_name,
            content: self.content,
            mime: self.mime,
        }
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "zip" => "application/zip",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("site.JPG"), Some("image/jpeg"));
        assert_eq!(guess_mime("clip.mp4"), Some("video/mp4"));
        assert_eq!(guess_mime("README"), None);
        assert_eq!(guess_mime("notes.txt"), None);
    }

    #[tokio::test]
    async fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let upload = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "worker.png");
        assert_eq!(upload.mime.as_deref(), Some("image/png"));
        assert_eq!(&upload.content[..], b"\x89PNG");

        assert!(UploadFile::from_path(dir.path().join("missing.png")).await.is_err());
    }
}

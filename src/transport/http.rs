//! HTTP transport backed by `reqwest`
//!
//! One reusable `reqwest::Client` with the ordinary timeout configured at
//! construction; bulk transfers override it per request.

use super::{
    ApiRequest, Method, MultipartPart, RequestBody, Transport, TransportFailure,
    TransportResponse,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use async_trait::async_trait;

/// `Transport` implementation that talks to the detection backend over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the underlying client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> std::result::Result<reqwest::Url, TransportFailure> {
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TransportFailure::network(format!("Invalid request URL: {}", e)))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn build_form(
    parts: &[MultipartPart],
) -> std::result::Result<reqwest::multipart::Form, TransportFailure> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
            MultipartPart::File {
                name,
                file_name,
                content,
                mime,
            } => {
                let mut file = reqwest::multipart::Part::bytes(content.to_vec())
                    .file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file.mime_str(mime).map_err(|e| {
                        TransportFailure::network(format!("Invalid MIME type '{}': {}", mime, e))
                    })?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

/// Parse a response body; empty bodies become `Null`, non-JSON text a string
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<TransportResponse, TransportFailure> {
        let url = self.url_for(request)?;
        let mut builder = self.client.request(to_reqwest_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match &request.body {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)?),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFailure::network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportFailure::network(e.to_string()))?;

        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                body: parse_body(&text),
            })
        } else {
            let body = match parse_body(&text) {
                serde_json::Value::Null | serde_json::Value::String(_) => None,
                json => Some(json),
            };
            Err(TransportFailure::status(status.as_u16(), body))
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(&ClientConfig {
            base_url: "http://127.0.0.1:5000/api/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(transport().base_url(), "http://127.0.0.1:5000/api");
    }

    #[test]
    fn test_url_includes_path_and_query() {
        let req = ApiRequest::get("/detect/realtime/frame")
            .query_opt("confidence", Some(0.5))
            .query_opt("fps", Some(10));
        let url = transport().url_for(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/detect/realtime/frame?confidence=0.5&fps=10"
        );
    }

    #[test]
    fn test_url_without_leading_slash() {
        let url = transport().url_for(&ApiRequest::get("auth/me")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/auth/me");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), serde_json::Value::Null);
        assert_eq!(parse_body("{\"a\":1}")["a"], 1);
        assert_eq!(parse_body("<html>"), serde_json::Value::String("<html>".into()));
    }

    #[test]
    fn test_invalid_mime_rejected() {
        let parts = vec![MultipartPart::File {
            name: "image".into(),
            file_name: "a.jpg".into(),
            content: bytes::Bytes::from_static(b"x"),
            mime: Some("not a mime".into()),
        }];
        assert!(build_form(&parts).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_failure() {
        let transport = HttpTransport::new(&ClientConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let failure = transport.send(&ApiRequest::get("/auth/me")).await.unwrap_err();
        assert!(failure.status.is_none());
        assert!(failure.message.is_some());
    }
}

//! Together.AI image generation client.

use crate::error::{Result, StudioError};
use crate::image::provider::ImageService;
use crate::image::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const GENERATIONS_URL: &str = "https://api.together.xyz/v1/images/generations";

/// Builder for TogetherClient.
#[derive(Debug, Clone)]
pub struct TogetherClientBuilder {
    endpoint: String,
    client: Option<reqwest::Client>,
}

impl Default for TogetherClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: GENERATIONS_URL.to_string(),
            client: None,
        }
    }
}

impl TogetherClientBuilder {
    /// Creates a new builder pointing at the public endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the generations endpoint (proxies, tests).
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the client.
    pub fn build(self) -> TogetherClient {
        TogetherClient {
            client: self.client.unwrap_or_default(),
            endpoint: self.endpoint,
        }
    }
}

/// Client for the Together.AI `images/generations` endpoint.
#[derive(Debug, Clone)]
pub struct TogetherClient {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for TogetherClient {
    fn default() -> Self {
        TogetherClientBuilder::new().build()
    }
}

impl TogetherClient {
    /// Creates a new `TogetherClientBuilder`.
    pub fn builder() -> TogetherClientBuilder {
        TogetherClientBuilder::new()
    }

    /// Endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds an error from a non-success response body.
    ///
    /// Uses `error.message` when present and non-empty, otherwise falls back
    /// to the status code.
    fn parse_error(status: u16, text: &str) -> StudioError {
        let message = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|body| {
                body.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("API request failed: {}", status));

        StudioError::Remote { status, message }
    }

    /// Pulls `data[0].url` out of a success body.
    fn parse_image_url(text: &str) -> Result<String> {
        let response: TogetherImageResponse =
            serde_json::from_str(text).map_err(|_| StudioError::MalformedResponse)?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|url| !url.is_empty())
            .ok_or(StudioError::MalformedResponse)
    }
}

#[async_trait]
impl ImageService for TogetherClient {
    async fn generate(&self, request: &GenerationRequest, credential: &str) -> Result<String> {
        let start = Instant::now();
        let body = TogetherImageRequest::from_generation_request(request);

        tracing::debug!(
            model = body.model,
            width = body.width,
            height = body.height,
            steps = body.steps,
            "submitting generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = Self::parse_error(status.as_u16(), &text);
            tracing::debug!(status = status.as_u16(), "generation rejected: {err}");
            return Err(err);
        }

        let url = Self::parse_image_url(&text)?;
        tracing::debug!(
            url = %url,
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        Ok(url)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(StudioError::Remote {
                status: response.status().as_u16(),
                message: "Failed to download image".into(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &str {
        "Together.AI"
    }
}

#[derive(Debug, Serialize)]
struct TogetherImageRequest {
    model: &'static str,
    prompt: String,
    width: u32,
    height: u32,
    steps: u32,
    n: u32,
    response_format: &'static str,
}

impl TogetherImageRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        Self {
            model: req.model().as_str(),
            prompt: req.prompt().to_string(),
            width: req.width(),
            height: req.height(),
            steps: req.steps(),
            n: 1,
            response_format: "url",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TogetherImageResponse {
    #[serde(default)]
    data: Vec<TogetherImageData>,
}

#[derive(Debug, Deserialize)]
struct TogetherImageData {
    #[serde(default)]
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::{GenerationForm, Model};
    use crate::image::validate::{validate, ValidationRules};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn cat_request() -> GenerationRequest {
        let form = GenerationForm::new("a cat")
            .with_size(512, 512)
            .with_steps(4)
            .with_model(Model::FluxSchnellFree);
        validate("key", &form, ValidationRules::default()).unwrap()
    }

    /// Answers exactly one HTTP request with a canned response and hands back
    /// the raw request text.
    async fn respond_once(
        status: u16,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&raw).into_owned()
        });

        (format!("http://{}/v1/images/generations", addr), handle)
    }

    #[test]
    fn test_request_construction() {
        let body = TogetherImageRequest::from_generation_request(&cat_request());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "black-forest-labs/FLUX.1-schnell-Free");
        assert_eq!(json["prompt"], "a cat");
        assert_eq!(json["width"], 512);
        assert_eq!(json["height"], 512);
        assert_eq!(json["steps"], 4);
        assert_eq!(json["n"], 1);
        assert_eq!(json["response_format"], "url");
    }

    #[test]
    fn test_parse_error_uses_message() {
        let err = TogetherClient::parse_error(
            402,
            r#"{"error": {"message": "insufficient credits"}}"#,
        );
        assert!(matches!(
            err,
            StudioError::Remote { status: 402, ref message } if message == "insufficient credits"
        ));
    }

    #[test]
    fn test_parse_error_falls_back_to_status() {
        for body in ["", "not json", "{}", r#"{"error": "flat"}"#, r#"{"error": {"message": ""}}"#] {
            let err = TogetherClient::parse_error(503, body);
            assert_eq!(err.to_string(), "API request failed: 503");
        }
    }

    #[test]
    fn test_parse_image_url() {
        let url =
            TogetherClient::parse_image_url(r#"{"data": [{"url": "https://x/img.png"}]}"#).unwrap();
        assert_eq!(url, "https://x/img.png");
    }

    #[test]
    fn test_parse_image_url_missing_fields() {
        for body in [
            "{}",
            r#"{"data": []}"#,
            r#"{"data": [{}]}"#,
            r#"{"data": [{"url": ""}]}"#,
            "<html>",
        ] {
            let err = TogetherClient::parse_image_url(body).unwrap_err();
            assert!(matches!(err, StudioError::MalformedResponse), "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_generate_success_over_http() {
        let (endpoint, server) =
            respond_once(200, r#"{"data": [{"url": "https://x/img.png"}]}"#).await;
        let client = TogetherClient::builder().endpoint(endpoint).build();

        let url = client.generate(&cat_request(), "secret-key").await.unwrap();
        assert_eq!(url, "https://x/img.png");

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("POST /v1/images/generations"));
        assert!(lower.contains("authorization: bearer secret-key"));
        assert!(lower.contains("content-type: application/json"));

        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["prompt"], "a cat");
        assert_eq!(json["n"], 1);
        assert_eq!(json["response_format"], "url");
    }

    #[tokio::test]
    async fn test_generate_remote_error_over_http() {
        let (endpoint, _server) =
            respond_once(402, r#"{"error": {"message": "insufficient credits"}}"#).await;
        let client = TogetherClient::builder().endpoint(endpoint).build();

        let err = client.generate(&cat_request(), "key").await.unwrap_err();
        assert!(matches!(err, StudioError::Remote { status: 402, .. }));
        assert_eq!(err.to_string(), "insufficient credits");
    }

    #[tokio::test]
    async fn test_generate_malformed_over_http() {
        let (endpoint, _server) = respond_once(200, "{}").await;
        let client = TogetherClient::builder().endpoint(endpoint).build();

        let err = client.generate(&cat_request(), "key").await.unwrap_err();
        assert!(matches!(err, StudioError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_generate_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TogetherClient::builder()
            .endpoint(format!("http://{}/v1/images/generations", addr))
            .build();

        let err = client.generate(&cat_request(), "key").await.unwrap_err();
        assert!(matches!(err, StudioError::Transport(_)));
    }

    #[test]
    fn test_builder_defaults_to_public_endpoint() {
        let client = TogetherClient::builder().build();
        assert_eq!(client.endpoint(), GENERATIONS_URL);
        assert_eq!(client.name(), "Together.AI");
    }
}

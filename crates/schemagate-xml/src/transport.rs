//! Network transport used to fetch raw documents.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single document request. The response body is returned as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: HttpMethod,
    pub content_type: String,
    pub data: Option<String>,
}

impl Request {
    pub fn new(url: impl Into<String>, method: HttpMethod, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            content_type: content_type.into(),
            data: None,
        }
    }
}

/// Trait implemented by transports that can fetch raw documents.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` and return the response body untouched.
    async fn request(&self, request: Request) -> Result<String, TransportError>;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "schemagate".to_string(),
        }
    }
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: Request) -> Result<String, TransportError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &request.url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type.as_str());
        if let Some(data) = request.data {
            builder = builder.body(data);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

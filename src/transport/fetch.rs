//! HTTP fetch capability used by the transport.
//!
//! The transport only describes the request it wants; an `HttpFetch`
//! implementation performs it. Production code uses `ReqwestFetch`, tests
//! inject fakes that never settle, reject, or record what they were given.

use crate::utils::error::TransportError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// A single delivery request
///
/// Never carries ambient credentials (cookies, auth state); the endpoint
/// authenticates via the key in its URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRequest {
    pub url: String,
    pub content_type: &'static str,
    pub body: String,
    /// Request may outlive the code that initiated it
    pub keepalive: bool,
}

/// Performs a POST and reports the response status
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// # Errors
    /// Network failures and non-2xx responses
    async fn post(&self, request: PostRequest) -> Result<u16, TransportError>;
}

/// `HttpFetch` backed by an async reqwest client
///
/// The client has no cookie store and no default headers, so nothing but
/// the body and content type leaves the process.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    /// Create a fetcher with a fresh client
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("devpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::RequestFailed)?;

        Ok(Self { client })
    }

    /// Reuse an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn post(&self, request: PostRequest) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(status.as_u16())
    }
}

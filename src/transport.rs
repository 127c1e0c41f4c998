//! HTTP transport used by the client
//!
//! [`Transport`] is the seam between request building and the
//! network. [`HttpTransport`] talks to the backend with reqwest;
//! tests substitute their own implementation.

use std::pin::Pin;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use log::{debug, error, trace};
use serde_json::Value;

/// Raw response body of a streaming call, consumed by the caller
pub type ByteStream = Pin<Box<
  dyn Stream<Item = Result<Bytes, crate::error::Error>> + Send
>>;

#[async_trait]
pub trait Transport: Send + Sync
{   /// `GET path` and decode the JSON response
    async fn get(&self, path: &str)
      -> Result<Value, crate::error::Error>;

    /// `POST path` with a JSON body and decode the JSON response
    async fn post(
      &self
    , path: &str
    , body: &Value
    , timeout: Option<Duration>
    ) -> Result<Value, crate::error::Error>;

    /// `POST path` on the streaming base and hand back the body
    /// without reading it
    async fn post_stream(&self, path: &str, body: &Value)
      -> Result<ByteStream, crate::error::Error>;
}

/// reqwest-backed transport
pub struct HttpTransport
{   config: crate::config::TransportConfig
  , http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new(config: crate::config::TransportConfig) -> Self
    {   debug!(
          "Creating HttpTransport for {} (stream: {})",
          config.api_base, config.stream_base
        );
        HttpTransport
        {   config
          , http_client: reqwest::Client::new()
        }
    }

    pub fn config(&self) -> &crate::config::TransportConfig
    {   &self.config
    }

    fn api_url(&self, path: &str) -> String
    {   join_url(&self.config.api_base, path)
    }

    async fn read_json(response: reqwest::Response)
      -> Result<Value, crate::error::Error>
    {   let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Backend error {}: {}", status, error_text);
            return Err(crate::error::Error::ApiError
            {   status: status.as_u16()
              , message: error_text
            });
        }

        response.json().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }
}

impl Default for HttpTransport
{   fn default() -> Self
    {   HttpTransport::new(crate::config::TransportConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn get(&self, path: &str)
      -> Result<Value, crate::error::Error>
    {   let url = self.api_url(path);
        debug!("GET {}", url);
        let response = self.http_client
          .get(&url)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::from(e)
          })?;
        Self::read_json(response).await
    }

    async fn post(
      &self
    , path: &str
    , body: &Value
    , timeout: Option<Duration>
    ) -> Result<Value, crate::error::Error>
    {   let url = self.api_url(path);
        debug!("POST {}", url);
        trace!("POST body: {}", body);

        let mut request = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .json(body);
        if let Some(timeout) = timeout
        {   request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
          error!("HTTP error: {}", e);
          crate::error::Error::from(e)
        })?;
        Self::read_json(response).await
    }

    async fn post_stream(&self, path: &str, body: &Value)
      -> Result<ByteStream, crate::error::Error>
    {   let url = join_url(&self.config.stream_base, path);
        debug!("POST (stream) {}", url);
        trace!("POST body: {}", body);

        let response = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .json(body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::from(e)
          })?;

        let status = response.status();
        if !status.is_success()
        {   error!("Streaming POST failed: {}", status);
            return Err(crate::error::Error::StreamRequestFailed(
              status.as_u16()
            ));
        }

        Ok(Box::pin(
          response.bytes_stream()
            .map(|chunk| chunk.map_err(crate::error::Error::from))
        ))
    }
}

/// Join a base URL and a route with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String
{   format!(
      "{}/{}",
      base.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
}

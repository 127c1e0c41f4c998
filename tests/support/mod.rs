#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use medinfo_llm::error::Error;
use medinfo_llm::transport::{ByteStream, Transport};

/// One call seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call
{   Get(String)
  , Post
    {   path: String
      , body: Value
      , timeout: Option<Duration>
    }
  , PostStream
    {   path: String
      , body: Value
    }
}

/// Transport answering from canned responses and recording calls
#[derive(Default)]
pub struct MockTransport
{   pub get_responses: HashMap<String, Result<Value, Error>>
  , pub post_response: Option<Result<Value, Error>>
  , pub stream_status: Option<u16>
  , pub stream_chunks: Vec<&'static str>
  , pub calls: Mutex<Vec<Call>>
}

impl MockTransport
{   pub fn new() -> Self
    {   MockTransport::default()
    }

    pub fn on_get(mut self, path: &str, response: Result<Value, Error>)
      -> Self
    {   self.get_responses.insert(path.to_string(), response);
        self
    }

    pub fn on_post(mut self, response: Result<Value, Error>) -> Self
    {   self.post_response = Some(response);
        self
    }

    pub fn on_stream(
      mut self
    , status: u16
    , chunks: Vec<&'static str>
    ) -> Self
    {   self.stream_status = Some(status);
        self.stream_chunks = chunks;
        self
    }

    pub fn calls(&self) -> Vec<Call>
    {   self.calls.lock().unwrap().clone()
    }

    /// Body of the only POST recorded
    pub fn posted_body(&self) -> Value
    {   let calls = self.calls();
        let bodies: Vec<&Value> = calls.iter()
          .filter_map(|c| match c
          {   Call::Post { body, .. } => Some(body)
            , Call::PostStream { body, .. } => Some(body)
            , Call::Get(_) => None
          })
          .collect();
        assert_eq!(bodies.len(), 1, "expected exactly one POST");
        bodies[0].clone()
    }
}

#[async_trait]
impl Transport for MockTransport
{   async fn get(&self, path: &str) -> Result<Value, Error>
    {   self.calls.lock().unwrap().push(Call::Get(path.to_string()));
        self.get_responses.get(path)
          .cloned()
          .unwrap_or_else(|| Err(Error::HttpError(
            format!("no route: {}", path)
          )))
    }

    async fn post(
      &self
    , path: &str
    , body: &Value
    , timeout: Option<Duration>
    ) -> Result<Value, Error>
    {   self.calls.lock().unwrap().push(Call::Post
        {   path: path.to_string()
          , body: body.clone()
          , timeout
        });
        self.post_response.clone()
          .unwrap_or_else(|| Ok(Value::String("ok".to_string())))
    }

    async fn post_stream(&self, path: &str, body: &Value)
      -> Result<ByteStream, Error>
    {   self.calls.lock().unwrap().push(Call::PostStream
        {   path: path.to_string()
          , body: body.clone()
        });
        let status = self.stream_status.unwrap_or(200);
        if !(200..300).contains(&status)
        {   return Err(Error::StreamRequestFailed(status));
        }
        let chunks: Vec<Result<Bytes, Error>> = self.stream_chunks
          .iter()
          .copied()
          .map(|c: &'static str| Ok(Bytes::from_static(c.as_bytes())))
          .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

pub fn completion_response(content: &str) -> Value
{   serde_json::json!({
      "id": "chatcmpl-1",
      "choices": [
        {   "index": 0
          , "message": { "role": "assistant", "content": content }
          , "finish_reason": "stop"
        }
      ]
    })
}

//! Request-body normalization from the legacy parameter shape

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::legacy::{parse_legacy_prompt_with, HeaderMatch};
use crate::request::{Message, RequestParameters};

/// Parameters accepted alongside a legacy `prompt`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyParameters
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>
  , /// Dropped on normalization, so any JSON value is accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<Value>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<Value>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<Value>
  , #[serde(
      default,
      deserialize_with = "token_count",
      skip_serializing_if = "Option::is_none"
    )]
    pub max_tokens: Option<u64>
  , #[serde(
      default,
      deserialize_with = "token_count",
      skip_serializing_if = "Option::is_none"
    )]
    pub max_completion_tokens: Option<u64>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl LegacyParameters
{   /// Drop the sampler-specific fields and rename `max_tokens` to
    /// `max_completion_tokens`; everything else passes through
    pub fn normalize(self) -> RequestParameters
    {   if self.top_k.is_some()
          || self.repetition_penalty.is_some()
          || self.mirostat_tau.is_some()
        {   trace!("Dropping legacy sampler parameters");
        }
        RequestParameters
        {   model: self.model
          , temperature: self.temperature
          , top_p: self.top_p
          , max_completion_tokens: self.max_tokens
              .or(self.max_completion_tokens)
          , extra: self.extra
        }
    }
}

/// Token limit from any JSON number; whole floats such as `256.0`
/// are accepted, fractions are truncated and negatives are dropped
fn token_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
  D: serde::Deserializer<'de>
{   let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| {
      n.as_u64().or_else(|| {
        n.as_f64()
          .filter(|f| f.is_finite() && *f >= 0.0)
          .map(|f| f as u64)
      })
    }))
}

/// The three request shapes accepted by
/// [`crate::client::MedInfoClient::ask_llm`].
///
/// Deserializes from JSON by trying each shape in order: an object
/// with `prompt`, then a bare message array, then an object with
/// `messages`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestBody
{   /// Flattened Llama-3 header prompt plus old-style parameters
    LegacyPrompt
    {   prompt: String
      , #[serde(flatten)]
        params: LegacyParameters
    }
  , /// Messages only; parameters are supplied separately
    Messages(Vec<Message>)
  , /// Messages with their parameters
    Conversation
    {   messages: Vec<Message>
      , #[serde(flatten)]
        params: RequestParameters
    }
}

impl RequestBody
{   pub fn legacy(prompt: impl Into<String>) -> Self
    {   RequestBody::LegacyPrompt
        {   prompt: prompt.into()
          , params: LegacyParameters::default()
        }
    }
}

/// Messages and parameters ready for a chat completion call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRequest
{   pub messages: Vec<Message>
  , pub params: RequestParameters
}

/// Normalize with substring header matching
pub fn normalize_request(
  body: RequestBody
, params: RequestParameters
) -> NormalizedRequest
{   normalize_request_with(body, params, HeaderMatch::Substring)
}

/// Normalize any [`RequestBody`].
///
/// `params` is only consulted for [`RequestBody::Messages`]; the
/// other shapes carry their own.
pub fn normalize_request_with(
  body: RequestBody
, params: RequestParameters
, matching: HeaderMatch
) -> NormalizedRequest
{   match body
    {   RequestBody::LegacyPrompt { prompt, params: legacy } => {
          debug!("Normalizing legacy prompt body");
          NormalizedRequest
          {   messages: parse_legacy_prompt_with(&prompt, matching)
            , params: legacy.normalize()
          }
        }
      , RequestBody::Messages(messages) => {
          debug!("Normalizing message array body");
          NormalizedRequest
          {   messages
            , params
          }
        }
      , RequestBody::Conversation { messages, params } => {
          debug!("Normalizing conversation body");
          NormalizedRequest
          {   messages
            , params
          }
        }
    }
}

//! Chat message and chat completion wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   /// Lowercase wire name of the role
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// A role-tagged unit of conversation content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   Message
        {   role
          , content: content.into()
        }
    }

    pub fn system(content: impl Into<String>) -> Self
    {   Message::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Message::new(Role::Assistant, content)
    }
}

/// Tuning values accepted by the chat completion proxy
///
/// Fields the crate does not model are kept in `extra` so they can
/// be forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParameters
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u64>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

/// Body posted to the chat completion route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<Message>
  , pub stream: bool
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl ChatCompletionRequest
{   /// Non-streaming request; only the modelled tuning values are sent
    pub fn completion(
      model: String
    , messages: Vec<Message>
    , params: &RequestParameters
    ) -> Self
    {   ChatCompletionRequest
        {   model
          , messages
          , stream: false
          , temperature: params.temperature
          , max_completion_tokens: params.max_completion_tokens
          , top_p: params.top_p
          , extra: Map::new()
        }
    }

    /// Streaming request; every parameter is forwarded, including
    /// pass-through fields
    pub fn streaming(
      model: String
    , messages: Vec<Message>
    , params: RequestParameters
    ) -> Self
    {   let mut extra = params.extra;
        // model and stream are decided here, not by the caller
        extra.remove("model");
        extra.remove("messages");
        extra.remove("stream");
        ChatCompletionRequest
        {   model
          , messages
          , stream: true
          , temperature: params.temperature
          , max_completion_tokens: params.max_completion_tokens
          , top_p: params.top_p
          , extra
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Message inside a choice; role is left loose since providers may
/// answer with roles the crate does not model; content is null when
/// the model produced no text
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

impl ChatCompletionResponse
{   /// Content of the first choice; null content reads as ""
    pub fn first_content(self)
      -> Result<String, crate::error::Error>
    {   self.choices.into_iter()
          .next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or(crate::error::Error::NoChoicesInResponse)
    }
}

/// A model reported by the proxy's listing route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo
{   pub id: String
  , #[serde(default)]
    pub owned_by: Option<String>
  , #[serde(default = "default_active")]
    pub active: bool
  , #[serde(default)]
    pub context_window: Option<u64>
}

fn default_active() -> bool
{   true
}

//! Per-task prompt settings stored by the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::template::{apply_template, Template};

/// One prompting step of an extraction task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step
{   pub name: String
  , pub user_message: String
  , pub completion_init: String
  , #[serde(default)]
    pub system_message: Option<String>
}

impl Step
{   /// Prompt for this step, continuing `previous` when given
    pub fn render(
      &self
    , template: &Template
    , previous: Option<&str>
    ) -> String
    {   apply_template(
          Some(template)
        , self.system_message.as_deref().unwrap_or("")
        , &self.user_message
        , &self.completion_init
        , previous
        )
    }
}

/// Sampling parameters saved with a task; unset values are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
}

impl ModelParameters
{   /// Saved parameters in the legacy request shape
    pub fn to_legacy(&self) -> crate::normalize::LegacyParameters
    {   crate::normalize::LegacyParameters
        {   model: self.model.clone()
          , temperature: self.temperature
          , top_p: self.top_p
          , top_k: self.top_k.map(Value::from)
          , repetition_penalty: self.repetition_penalty.map(Value::from)
          , mirostat_tau: self.mirostat_tau.map(Value::from)
          , max_tokens: self.max_tokens
          , max_completion_tokens: self.max_completion_tokens
          , extra: serde_json::Map::new()
        }
    }
}

/// Everything the backend stores for one task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProperties
{   pub steps: Vec<Step>
  , pub template: Template
  , #[serde(default)]
    pub model_parameters: ModelParameters
}

/// A prompt, the model's answer and the expected answer, for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptingLog
{   pub prompt: String
  , pub answer: String
  , pub expected: String
}

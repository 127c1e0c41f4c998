use std::time::Duration;
use log::{debug, error, info, trace};
use serde_json::Value;
use crate::config::ClientConfig;
use crate::legacy::HeaderMatch;
use crate::normalize::{normalize_request_with, RequestBody};
use crate::request::{
  ChatCompletionRequest, ChatCompletionResponse, Message, ModelInfo,
  RequestParameters
};
use crate::transport::{ByteStream, HttpTransport, Transport};

/// Client for the completion proxy and task-property routes
///
/// Owns its [`ClientConfig`]; every request reads the selected model
/// from it and only `&mut self` methods change it.
pub struct MedInfoClient<T: Transport = HttpTransport>
{   config: ClientConfig
  , transport: T
  , header_match: HeaderMatch
}

impl MedInfoClient<HttpTransport>
{   /// Client over reqwest with default routes
    pub fn new(transport_config: crate::config::TransportConfig) -> Self
    {   Self::with_transport(
          ClientConfig::default()
        , HttpTransport::new(transport_config)
        )
    }
}

impl<T: Transport> MedInfoClient<T>
{   pub fn with_transport(config: ClientConfig, transport: T) -> Self
    {   debug!("Creating MedInfoClient");
        MedInfoClient
        {   config
          , transport
          , header_match: HeaderMatch::default()
        }
    }

    /// Use strict role-header matching for legacy prompts
    pub fn with_header_match(mut self, header_match: HeaderMatch) -> Self
    {   self.header_match = header_match;
        self
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    pub fn is_advanced(&self) -> bool
    {   self.config.advanced
    }

    pub fn set_selected_model(&mut self, model_id: impl Into<String>)
    {   let model_id = model_id.into();
        info!("Selected model: {}", model_id);
        self.config.selected_model = Some(model_id);
    }

    /// Run a non-streaming chat completion and return the first
    /// choice's content.
    ///
    /// `params` is used only when `body` is a bare message array.
    pub async fn ask_llm(
      &self
    , body: RequestBody
    , params: RequestParameters
    ) -> Result<String, crate::error::Error>
    {   let normalized
          = normalize_request_with(body, params, self.header_match);
        let model = self.config
          .resolve_model(normalized.params.model.as_deref());
        debug!("ask_llm with model {}", model);

        let request = ChatCompletionRequest::completion(
          model
        , normalized.messages
        , &normalized.params
        );
        let payload = serde_json::to_value(&request)?;
        trace!("Completion request: {}", payload);

        let response = self.transport
          .post(
            &self.config.api_endpoint
          , &payload
          , Some(Duration::from_millis(
              self.config.completion_timeout_ms
            ))
          )
          .await?;

        let chat_response: ChatCompletionResponse
          = serde_json::from_value(response).map_err(|e| {
            error!("Unexpected completion response: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        chat_response.first_content().map_err(|e| {
          error!("No choices in response");
          e
        })
    }

    /// Start a streaming chat completion and return the raw body
    pub async fn send_message_to_llm(
      &self
    , messages: Vec<Message>
    , params: RequestParameters
    ) -> Result<ByteStream, crate::error::Error>
    {   let model = self.config.resolve_model(params.model.as_deref());
        debug!("send_message_to_llm with model {}", model);

        let request
          = ChatCompletionRequest::streaming(model, messages, params);
        let payload = serde_json::to_value(&request)?;
        trace!("Streaming request: {}", payload);

        self.transport
          .post_stream(&self.config.api_endpoint, &payload)
          .await
    }

    /// Fetch the model list; on any failure log it and return an
    /// empty list, leaving the stored list as it was
    pub async fn get_available_models(&mut self) -> Vec<ModelInfo>
    {   debug!("Fetching available models");
        let fetched = match self.transport
          .get(&self.config.models_endpoint)
          .await
        {   Ok(value) => serde_json::from_value::<Vec<ModelInfo>>(value)
              .map_err(crate::error::Error::from)
          , Err(e) => Err(e)
        };

        match fetched
        {   Ok(models) => {
              debug!("Retrieved {} models", models.len());
              self.config.available_models = models.clone();
              models
            }
          , Err(e) => {
              error!("Failed to fetch models: {}", e);
              vec![]
            }
        }
    }

    /// Saved properties of `task`
    pub async fn get_properties(&self, task: &str)
      -> Result<crate::properties::TaskProperties, crate::error::Error>
    {   debug!("get_properties for task: {}", task);
        let value = self.transport
          .get(&format!("get_properties/{}", task))
          .await?;

        // the backend answers with the document re-encoded as a string
        let value = match value
        {   Value::String(text) => serde_json::from_str(&text)?
          , other => other
        };
        Ok(serde_json::from_value(value)?)
    }

    pub async fn set_properties(
      &self
    , task: &str
    , properties: &crate::properties::TaskProperties
    ) -> Result<(), crate::error::Error>
    {   debug!("set_properties for task: {}", task);
        let payload = serde_json::to_value(properties)?;
        self.transport
          .post(&format!("set_properties/{}", task), &payload, None)
          .await?;
        Ok(())
    }

    /// Names of the tasks the backend has properties for
    pub async fn get_tasks(&self)
      -> Result<Vec<String>, crate::error::Error>
    {   debug!("get_tasks");
        let value = self.transport.get("get_tasks").await?;
        Ok(serde_json::from_value(value)?)
    }

    /// The backend's default prompt template text
    pub async fn get_template(&self)
      -> Result<String, crate::error::Error>
    {   debug!("get_template");
        match self.transport.get("get_template").await?
        {   Value::String(text) => Ok(text)
          , other => {
              error!("Template is not a string: {}", other);
              Err(crate::error::Error::ParseError(
                "expected template text".to_string()
              ))
            }
        }
    }

    /// Record a prompt and its answer under `task`
    pub async fn log_prompting(
      &self
    , task: &str
    , log: &crate::properties::PromptingLog
    ) -> Result<(), crate::error::Error>
    {   debug!("log_prompting for task: {}", task);
        let payload = serde_json::to_value(log)?;
        self.transport
          .post(&format!("log/{}", task), &payload, None)
          .await?;
        Ok(())
    }
}

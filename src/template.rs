//! Building a single prompt string from a delimiter template

use log::trace;
use serde::{Deserialize, Serialize};

/// Start/end delimiters for each message segment
///
/// Every field is optional when read; missing delimiters are written
/// back as `""` since the backend requires all six.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template
{   #[serde(default, serialize_with = "delimiter")]
    pub system_message_start: Option<String>
  , #[serde(default, serialize_with = "delimiter")]
    pub system_message_end: Option<String>
  , #[serde(default, serialize_with = "delimiter")]
    pub user_message_start: Option<String>
  , #[serde(default, serialize_with = "delimiter")]
    pub user_message_end: Option<String>
  , #[serde(default, serialize_with = "delimiter")]
    pub assistant_message_start: Option<String>
  , #[serde(default, serialize_with = "delimiter")]
    pub assistant_message_end: Option<String>
}

fn delimiter<S>(value: &Option<String>, serializer: S)
  -> Result<S::Ok, S::Error>
where
  S: serde::Serializer
{   serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// A [`Template`] with every delimiter present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedTemplate
{   pub system_start: String
  , pub system_end: String
  , pub user_start: String
  , pub user_end: String
  , pub assistant_start: String
  , pub assistant_end: String
}

impl Template
{   /// Missing delimiters become empty strings
    pub fn sanitize(&self) -> SanitizedTemplate
    {   let field = |f: &Option<String>| f.clone().unwrap_or_default();
        SanitizedTemplate
        {   system_start: field(&self.system_message_start)
          , system_end: field(&self.system_message_end)
          , user_start: field(&self.user_message_start)
          , user_end: field(&self.user_message_end)
          , assistant_start: field(&self.assistant_message_start)
          , assistant_end: field(&self.assistant_message_end)
        }
    }
}

/// Render a prompt ending where the assistant's generation resumes.
///
/// A non-empty `previous_message` replaces the system segment and is
/// closed with the assistant end delimiter unless it already ends
/// with it. `completion_init` may be empty.
pub fn apply_template(
  template: Option<&Template>
, system_message: &str
, user_message: &str
, completion_init: &str
, previous_message: Option<&str>
) -> String
{   let t = template
      .map(Template::sanitize)
      .unwrap_or_default();

    let mut prompt = String::new();
    match previous_message.filter(|p| !p.is_empty())
    {   Some(previous) => {
          prompt.push_str(previous);
          if !previous.ends_with(&t.assistant_end)
          {   prompt.push_str(&t.assistant_end);
          }
          prompt.push('\n');
        }
      , None if !system_message.is_empty() => {
          prompt.push_str(&t.system_start);
          prompt.push_str(system_message);
          prompt.push_str(&t.system_end);
          prompt.push('\n');
        }
      , None => {}
    }

    prompt.push_str(&t.user_start);
    prompt.push_str(user_message);
    prompt.push_str(&t.user_end);
    prompt.push('\n');
    prompt.push_str(&t.assistant_start);
    prompt.push_str(completion_init);

    trace!("Applied template: {:?}", prompt);
    prompt
}

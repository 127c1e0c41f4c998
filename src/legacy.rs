//! Parsing flattened prompt strings back into chat messages
//!
//! Two formats are understood: Llama-3 header prompts
//! (`<|start_header_id|>role<|end_header_id|> ... <|eot_id|>`) and
//! ChatML prompts (`<|im_start|>role` ... `<|im_end|>`).
//!
//! Malformed input is not validated. A Llama-3 section without
//! `<|eot_id|>` runs to the end of its segment; nothing here panics.

use log::{debug, trace};
use crate::request::{Message, Role};

pub const START_HEADER: &str = "<|start_header_id|>";
pub const END_HEADER: &str = "<|end_header_id|>";
pub const END_OF_TURN: &str = "<|eot_id|>";

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";

const ROLES: [Role; 3] = [Role::System, Role::User, Role::Assistant];

/// How a Llama-3 segment's role tag is recognised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMatch
{   /// `"<role><|end_header_id|>"` appears anywhere in the segment.
    /// A message body quoting that text can be misclassified.
    #[default]
    Substring
  , /// The text before the first `<|end_header_id|>`, trimmed,
    /// is exactly the role name
    Strict
}

/// Parse a Llama-3 header prompt with substring role matching
pub fn parse_legacy_prompt(prompt: &str) -> Vec<Message>
{   parse_legacy_prompt_with(prompt, HeaderMatch::Substring)
}

/// Parse a Llama-3 header prompt.
///
/// Messages come out in segment order; segments with no recognised
/// role or with blank content are dropped.
pub fn parse_legacy_prompt_with(
  prompt: &str
, matching: HeaderMatch
) -> Vec<Message>
{   let messages: Vec<Message> = prompt
      .split(START_HEADER)
      .filter_map(|segment| {
        let role = segment_role(segment, matching)?;
        let content = segment_content(segment).trim();
        if content.is_empty()
        {   trace!("Skipping empty {} section", role.as_str());
            return None;
        }
        Some(Message::new(role, content))
      })
      .collect();

    debug!("Parsed {} messages from legacy prompt", messages.len());
    messages
}

fn segment_role(segment: &str, matching: HeaderMatch) -> Option<Role>
{   match matching
    {   HeaderMatch::Substring => ROLES.into_iter().find(|role| {
          segment.contains(&format!("{}{}", role.as_str(), END_HEADER))
        })
      , HeaderMatch::Strict => {
          let (header, _) = segment.split_once(END_HEADER)?;
          let header = header.trim();
          ROLES.into_iter().find(|role| role.as_str() == header)
        }
    }
}

/// Text after the first header end and before the first turn end
fn segment_content(segment: &str) -> &str
{   let body = match segment.split_once(END_HEADER)
    {   Some((_, body)) => body
      , None => return ""
    };
    match body.split_once(END_OF_TURN)
    {   Some((content, _)) => content
      , None => body
    }
}

/// Parse a ChatML prompt line by line.
///
/// A line opening a role starts a new message; other non-blank lines
/// without `<|im_end|>` are collected into the current one. A
/// non-empty `completion_init` is appended as an assistant message.
pub fn parse_chatml_prompt(
  prompt: &str
, completion_init: &str
) -> Vec<Message>
{   let mut messages = Vec::new();
    let mut current: Option<(Role, Vec<&str>)> = None;

    for line in prompt.split('\n')
    {   let opened = ROLES.into_iter().find(|role| {
          line.contains(&format!("{}{}", IM_START, role.as_str()))
        });
        match opened
        {   Some(role) => {
              flush_chatml(&mut messages, current.take());
              current = Some((role, Vec::new()));
            }
          , None if !line.contains(IM_END) && !line.trim().is_empty() => {
              if let Some((_, lines)) = current.as_mut()
              {   lines.push(line);
              }
            }
          , None => {}
        }
    }
    flush_chatml(&mut messages, current);

    if !completion_init.is_empty()
    {   messages.push(Message::assistant(completion_init));
    }

    debug!("Parsed {} messages from ChatML prompt", messages.len());
    messages
}

fn flush_chatml(
  messages: &mut Vec<Message>
, current: Option<(Role, Vec<&str>)>
)
{   if let Some((role, lines)) = current
    {   if !lines.is_empty()
        {   messages.push(Message::new(role, lines.join("\n").trim()));
        }
    }
}

/// Message list from loose prompt parts; empty parts are skipped
/// except the user prompt, which is always present
pub fn convert_prompt_to_messages(
  prompt: &str
, system_message: &str
, completion_init: &str
) -> Vec<Message>
{   let mut messages = Vec::with_capacity(3);
    if !system_message.is_empty()
    {   messages.push(Message::system(system_message));
    }
    messages.push(Message::user(prompt));
    if !completion_init.is_empty()
    {   messages.push(Message::assistant(completion_init));
    }
    messages
}

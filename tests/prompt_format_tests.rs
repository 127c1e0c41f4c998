use serde_json::json;
use medinfo_llm::{
  apply_template, convert_prompt_to_messages, normalize_request,
  parse_chatml_prompt, parse_legacy_prompt, parse_legacy_prompt_with,
  HeaderMatch, Message, RequestBody, RequestParameters, Template
};

fn llama3_template() -> Template
{   Template
    {   system_message_start: Some(
          "<|start_header_id|>system<|end_header_id|>\n".to_string()
        )
      , system_message_end: Some("<|eot_id|>".to_string())
      , user_message_start: Some(
          "<|start_header_id|>user<|end_header_id|>\n".to_string()
        )
      , user_message_end: Some("<|eot_id|>".to_string())
      , assistant_message_start: Some(
          "<|start_header_id|>assistant<|end_header_id|>\n".to_string()
        )
      , assistant_message_end: Some("<|eot_id|>".to_string())
    }
}

fn assistant_end(end: &str) -> Template
{   Template
    {   assistant_message_end: Some(end.to_string())
      , ..Template::default()
    }
}

// ===== apply_template =====

#[test]
fn test_empty_template_is_user_then_completion()
{   let prompt = apply_template(None, "", "What drugs?", "Drugs:", None);
    assert_eq!(prompt, "What drugs?\nDrugs:");

    let prompt = apply_template(
      Some(&Template::default()), "", "What drugs?", "", None
    );
    assert_eq!(prompt, "What drugs?\n");
}

#[test]
fn test_previous_message_gets_assistant_end()
{   let template = assistant_end("</a>");
    let prompt
      = apply_template(Some(&template), "sys", "next", "", Some("abc"));
    assert!(prompt.starts_with("abc</a>\n"), "got {:?}", prompt);
    // previous message replaces the system segment
    assert_eq!(prompt, "abc</a>\nnext\n");
}

#[test]
fn test_previous_message_already_closed()
{   let template = assistant_end("</a>");
    let prompt
      = apply_template(Some(&template), "", "next", "", Some("abc</a>"));
    assert_eq!(prompt, "abc</a>\nnext\n");
}

#[test]
fn test_empty_previous_message_falls_back_to_system()
{   let prompt = apply_template(None, "sys", "user", "", Some(""));
    assert_eq!(prompt, "sys\nuser\n");
}

#[test]
fn test_full_llama3_template()
{   let prompt = apply_template(
      Some(&llama3_template())
    , "You are a clinician"
    , "List the drugs"
    , "Drugs:"
    , None
    );
    assert_eq!(
      prompt,
      "<|start_header_id|>system<|end_header_id|>\nYou are a clinician\
       <|eot_id|>\n<|start_header_id|>user<|end_header_id|>\nList the drugs\
       <|eot_id|>\n<|start_header_id|>assistant<|end_header_id|>\nDrugs:"
    );
}

#[test]
fn test_template_deserializes_partial()
{   let template: Template = serde_json::from_value(json!({
      "userMessageStart": "[INST]",
      "userMessageEnd": "[/INST]"
    })).unwrap();
    let t = template.sanitize();
    assert_eq!(t.user_start, "[INST]");
    assert_eq!(t.system_start, "");
    assert_eq!(t.assistant_end, "");
}

// ===== legacy prompt =====

#[test]
fn test_parse_legacy_prompt_system_and_user()
{   let prompt = "<|start_header_id|>system<|end_header_id|>\nYou are \
      helpful<|eot_id|><|start_header_id|>user<|end_header_id|>\nHi\
      <|eot_id|>";
    assert_eq!(parse_legacy_prompt(prompt), vec![
      Message::system("You are helpful")
    , Message::user("Hi")
    ]);
}

#[test]
fn test_parse_legacy_prompt_skips_empty_sections()
{   let prompt = "<|start_header_id|>system<|end_header_id|>\n  \n\
      <|eot_id|><|start_header_id|>user<|end_header_id|>\nHi<|eot_id|>\
      <|start_header_id|>assistant<|end_header_id|>\n";
    assert_eq!(parse_legacy_prompt(prompt), vec![Message::user("Hi")]);
}

#[test]
fn test_parse_legacy_prompt_is_positional()
{   let prompt = "<|begin_of_text|>\
      <|start_header_id|>user<|end_header_id|>\nfirst<|eot_id|>\
      <|start_header_id|>tool<|end_header_id|>\nignored<|eot_id|>\
      <|start_header_id|>assistant<|end_header_id|>\nreply<|eot_id|>\
      <|start_header_id|>system<|end_header_id|>\nlate<|eot_id|>";
    assert_eq!(parse_legacy_prompt(prompt), vec![
      Message::user("first")
    , Message::assistant("reply")
    , Message::system("late")
    ]);
}

#[test]
fn test_parse_legacy_prompt_without_turn_end()
{   let prompt = "<|start_header_id|>assistant<|end_header_id|>\n\
      Drugs: aspirin";
    assert_eq!(
      parse_legacy_prompt(prompt),
      vec![Message::assistant("Drugs: aspirin")]
    );
}

#[test]
fn test_substring_matching_misclassifies_quoted_tag()
{   let prompt = "<|start_header_id|>user<|end_header_id|>\n\
      quote system<|end_header_id|> here<|eot_id|>";

    let loose = parse_legacy_prompt_with(prompt, HeaderMatch::Substring);
    assert_eq!(loose[0].role, medinfo_llm::Role::System);

    let strict = parse_legacy_prompt_with(prompt, HeaderMatch::Strict);
    assert_eq!(strict, vec![
      Message::user("quote system<|end_header_id|> here")
    ]);
}

#[test]
fn test_strict_matching_requires_exact_header()
{   let prompt = "<|start_header_id|>superuser<|end_header_id|>\nx<|eot_id|>\
      <|start_header_id|> user <|end_header_id|>\ny<|eot_id|>";
    assert_eq!(
      parse_legacy_prompt_with(prompt, HeaderMatch::Strict),
      vec![Message::user("y")]
    );
    // "superuser<|end_header_id|>" contains "user<|end_header_id|>"
    assert_eq!(
      parse_legacy_prompt(prompt),
      vec![Message::user("x")]
    );
}

#[test]
fn test_parse_legacy_prompt_no_headers()
{   assert!(parse_legacy_prompt("plain text").is_empty());
    assert!(parse_legacy_prompt("").is_empty());
}

// ===== ChatML =====

#[test]
fn test_parse_chatml_prompt()
{   let prompt = "<|im_start|>system\nYou are a clinician.\n<|im_end|>\n\
      <|im_start|>user\nList the drugs.\nOne per line.\n<|im_end|>\n\
      <|im_start|>assistant\n";
    assert_eq!(parse_chatml_prompt(prompt, "Drugs:"), vec![
      Message::system("You are a clinician.")
    , Message::user("List the drugs.\nOne per line.")
    , Message::assistant("Drugs:")
    ]);
}

#[test]
fn test_parse_chatml_drops_lines_with_end_marker()
{   let prompt = "<|im_start|>user\nHi<|im_end|>\n";
    assert!(parse_chatml_prompt(prompt, "").is_empty());
}

#[test]
fn test_parse_chatml_ignores_text_before_first_role()
{   let prompt = "preamble\n<|im_start|>user\nHi\n";
    assert_eq!(parse_chatml_prompt(prompt, ""), vec![Message::user("Hi")]);
}

// ===== convert_prompt_to_messages =====

#[test]
fn test_convert_prompt_to_messages()
{   assert_eq!(convert_prompt_to_messages("Hi", "", ""), vec![
      Message::user("Hi")
    ]);
    assert_eq!(convert_prompt_to_messages("Hi", "sys", "Sure,"), vec![
      Message::system("sys")
    , Message::user("Hi")
    , Message::assistant("Sure,")
    ]);
}

// ===== normalization =====

#[test]
fn test_normalize_legacy_parameters()
{   let body: RequestBody = serde_json::from_value(json!({
      "prompt": "x",
      "top_k": 5,
      "max_tokens": 100
    })).unwrap();
    let normalized = normalize_request(body, RequestParameters::default());

    assert!(normalized.messages.is_empty());
    let params = serde_json::to_value(&normalized.params).unwrap();
    assert_eq!(params, json!({ "max_completion_tokens": 100 }));
}

#[test]
fn test_normalize_legacy_passes_other_fields_through()
{   let body: RequestBody = serde_json::from_value(json!({
      "prompt": "x",
      "repetition_penalty": 1.2,
      "mirostat_tau": 3.0,
      "max_completion_tokens": 50,
      "temperature": 0.4,
      "seed": 7
    })).unwrap();
    let normalized = normalize_request(body, RequestParameters::default());

    let params = serde_json::to_value(&normalized.params).unwrap();
    assert_eq!(params, json!({
      "temperature": 0.4,
      "max_completion_tokens": 50,
      "seed": 7
    }));
}

#[test]
fn test_normalize_shape_detection()
{   let array: RequestBody = serde_json::from_value(json!([
      { "role": "user", "content": "a" }
    ])).unwrap();
    assert!(matches!(array, RequestBody::Messages(_)));

    let separate = RequestParameters
    {   temperature: Some(0.3)
      , ..RequestParameters::default()
    };
    let normalized = normalize_request(array, separate.clone());
    assert_eq!(normalized.params, separate);
    assert_eq!(normalized.messages, vec![Message::user("a")]);

    let conversation: RequestBody = serde_json::from_value(json!({
      "messages": [{ "role": "assistant", "content": "b" }],
      "top_p": 0.8
    })).unwrap();
    let normalized = normalize_request(conversation, separate);
    assert_eq!(normalized.params.top_p, Some(0.8));
    assert_eq!(normalized.params.temperature, None);

    // prompt wins over messages
    let both: RequestBody = serde_json::from_value(json!({
      "prompt": "<|start_header_id|>user<|end_header_id|>\nq<|eot_id|>",
      "messages": []
    })).unwrap();
    assert!(matches!(both, RequestBody::LegacyPrompt { .. }));
}

#[test]
fn test_legacy_sampler_fields_accept_any_type()
{   for top_k in [json!(-1), json!(40.0), json!("40"), json!(null)]
    {   let body: RequestBody = serde_json::from_value(json!({
          "prompt": "<|start_header_id|>user<|end_header_id|>\nq<|eot_id|>",
          "top_k": top_k,
          "repetition_penalty": "1.1",
          "mirostat_tau": -1
        })).unwrap();
        assert!(matches!(body, RequestBody::LegacyPrompt { .. }));

        let normalized = normalize_request(body, RequestParameters::default());
        assert_eq!(normalized.messages, vec![Message::user("q")]);
        assert_eq!(serde_json::to_value(&normalized.params).unwrap(), json!({}));
    }
}

#[test]
fn test_legacy_max_tokens_accepts_float()
{   let body: RequestBody = serde_json::from_value(json!({
      "prompt": "x",
      "max_tokens": 256.0
    })).unwrap();
    let normalized = normalize_request(body, RequestParameters::default());
    assert_eq!(normalized.params.max_completion_tokens, Some(256));

    let body: RequestBody = serde_json::from_value(json!({
      "prompt": "x",
      "max_tokens": -5,
      "max_completion_tokens": 64.0
    })).unwrap();
    let normalized = normalize_request(body, RequestParameters::default());
    assert_eq!(normalized.params.max_completion_tokens, Some(64));
}

#[test]
fn test_template_writes_missing_delimiters_as_empty()
{   let value = serde_json::to_value(Template
    {   user_message_start: Some("[INST]".to_string())
      , ..Template::default()
    }).unwrap();
    assert_eq!(value, json!({
      "systemMessageStart": "",
      "systemMessageEnd": "",
      "userMessageStart": "[INST]",
      "userMessageEnd": "",
      "assistantMessageStart": "",
      "assistantMessageEnd": ""
    }));
}

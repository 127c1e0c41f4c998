pub mod error;
pub mod config;
pub mod request;
pub mod template;
pub mod legacy;
pub mod normalize;
pub mod properties;
pub mod transport;
pub mod client;

/*

medinfo-llm: async client for the medical information extraction
backend. Talks to a chat-completion proxy and converts between the
old flattened-prompt format and chat messages.

medinfo-llm/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and logging setup
│   ├── error.rs        # Crate error type
│   ├── config.rs       # Client and transport configuration
│   ├── request.rs      # Messages and chat completion wire types
│   ├── template.rs     # Prompt string from a delimiter template
│   ├── legacy.rs       # Llama-3 / ChatML prompt -> messages
│   ├── normalize.rs    # Request body shapes -> messages + params
│   ├── properties.rs   # Per-task prompt settings
│   ├── transport.rs    # Transport trait and reqwest implementation
│   └── client.rs       # MedInfoClient
└── tests/

*/

pub use client::MedInfoClient;
pub use config::{ClientConfig, TransportConfig, FALLBACK_MODEL};
pub use error::Error;
pub use legacy::{
  convert_prompt_to_messages, parse_chatml_prompt, parse_legacy_prompt,
  parse_legacy_prompt_with, HeaderMatch
};
pub use normalize::{
  normalize_request, LegacyParameters, NormalizedRequest, RequestBody
};
pub use request::{Message, ModelInfo, RequestParameters, Role};
pub use template::{apply_template, SanitizedTemplate, Template};
pub use transport::{ByteStream, HttpTransport, Transport};

/// Install `env_logger` as the `log` backend.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging()
{   let _ = env_logger::builder()
      .format_timestamp_millis()
      .try_init();
}

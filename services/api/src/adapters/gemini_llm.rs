//! services/api/src/adapters/gemini_llm.rs
//!
//! This module contains the adapter for the Gemini generation API.
//! It implements the `GenerationService` port from the `core` crate, talking to
//! Gemini through its OpenAI-compatible chat completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use cognipath_core::{
    domain::Role,
    normalize::StructuredOutput,
    ports::{GenerationService, ModelCall, ModelOutput, PortError, PortResult},
    LearningPath,
};
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` against Gemini.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client<OpenAIConfig>,
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapter` from an already configured client.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    /// Builds a client for `api_base` that makes exactly one attempt per request.
    pub fn connect(api_key: &str, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        // The client retries rate-limited requests by default. Retries belong to the caller.
        let no_retries = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Self::new(Client::with_config(config).with_backoff(no_retries))
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for GeminiAdapter {
    async fn generate(&self, call: ModelCall) -> PortResult<ModelOutput> {
        let schema_requested = call.response_schema.is_some();
        let request = build_request(&call).map_err(map_openai_error)?;

        debug!(
            model = %call.model,
            turns = request.messages.len(),
            structured = schema_requested,
            "Sending generation request"
        );

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = match response.choices.into_iter().next() {
            Some(choice) => choice.message.content,
            None => {
                return Err(PortError::Unexpected(
                    "Generation response contained no choices.".to_string(),
                ))
            }
        };
        interpret_content(content, schema_requested)
    }
}

//=========================================================================================
// Request and Response Mapping
//=========================================================================================

/// System instruction first, then prior turns in order, then the prompt as the final user turn.
fn build_request(call: &ModelCall) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let mut messages: Vec<ChatCompletionRequestMessage> =
        Vec::with_capacity(call.history.len() + 2);

    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(call.system_instruction.as_str())
            .build()?
            .into(),
    );
    for turn in &call.history {
        let message: ChatCompletionRequestMessage = match turn.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.text.as_str())
                .build()?
                .into(),
            Role::Model => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.text.as_str())
                .build()?
                .into(),
        };
        messages.push(message);
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(call.prompt.as_str())
            .build()?
            .into(),
    );

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(call.model.as_str()).messages(messages).n(1);
    if let Some(temperature) = call.temperature {
        args.temperature(temperature);
    }
    if let Some(schema) = &call.response_schema {
        args.response_format(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: LearningPath::SCHEMA_NAME.to_string(),
                schema: Some(schema.clone()),
                strict: Some(true),
            },
        });
    }
    args.build()
}

/// Content that parses as JSON under a schema constraint is handed back already parsed.
fn interpret_content(content: Option<String>, schema_requested: bool) -> PortResult<ModelOutput> {
    let text = content.ok_or_else(|| {
        PortError::Unexpected("Generation response contained no text content.".to_string())
    })?;

    if schema_requested {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            return Ok(ModelOutput::Structured(value));
        }
    }
    Ok(ModelOutput::Text(text))
}

fn map_openai_error(error: OpenAIError) -> PortError {
    match error {
        OpenAIError::ApiError(api_error) => PortError::Api(api_error.message),
        OpenAIError::Reqwest(e) => PortError::Transport(e.to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognipath_core::ConversationTurn;
    use serde_json::json;

    fn call() -> ModelCall {
        ModelCall {
            model: "gemini-2.5-flash-lite".into(),
            system_instruction: "Be a tutor.".into(),
            history: vec![ConversationTurn::user("A"), ConversationTurn::model("B")],
            prompt: "C".into(),
            response_schema: None,
            temperature: None,
        }
    }

    #[test]
    fn messages_keep_conversation_order() {
        let request = serde_json::to_value(build_request(&call()).unwrap()).unwrap();
        let messages = request["messages"].as_array().unwrap();

        let pairs: Vec<(&str, &str)> = messages
            .iter()
            .map(|m| (m["role"].as_str().unwrap(), m["content"].as_str().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("system", "Be a tutor."),
                ("user", "A"),
                ("assistant", "B"),
                ("user", "C"),
            ]
        );
        assert_eq!(request["model"], "gemini-2.5-flash-lite");
        assert!(request.get("response_format").is_none());
    }

    #[test]
    fn schema_becomes_strict_json_schema_response_format() {
        let schema = json!({ "type": "object" });
        let request = build_request(&ModelCall {
            response_schema: Some(schema.clone()),
            temperature: Some(0.7),
            ..call()
        })
        .unwrap();
        let request = serde_json::to_value(request).unwrap();

        let format = &request["response_format"];
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "learning_path");
        assert_eq!(format["json_schema"]["strict"], true);
        assert_eq!(format["json_schema"]["schema"], schema);
        assert!((request["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn parsable_content_is_structured_only_when_a_schema_was_requested() {
        let content = r#"{"title":"x"}"#.to_string();
        assert_eq!(
            interpret_content(Some(content.clone()), true).unwrap(),
            ModelOutput::Structured(json!({ "title": "x" }))
        );
        assert_eq!(
            interpret_content(Some(content.clone()), false).unwrap(),
            ModelOutput::Text(content)
        );
    }

    #[test]
    fn fenced_content_is_left_for_the_normalizer() {
        let content = "```json\n{}\n```".to_string();
        assert_eq!(
            interpret_content(Some(content.clone()), true).unwrap(),
            ModelOutput::Text(content)
        );
    }

    #[test]
    fn missing_content_is_unexpected() {
        assert!(matches!(
            interpret_content(None, false),
            Err(PortError::Unexpected(_))
        ));
    }
}

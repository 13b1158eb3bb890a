//! Client for OpenRouter-compatible chat-completion services.
//!
//! The [`DiagramGenerator`] trait is the seam between the editor and the
//! language model: it takes a prompt (usually built by
//! [`build_context_prompt`](crate::merge::build_context_prompt)) and returns
//! the model's raw text. Parsing that text is left to
//! [`umlcanvas_parser::parse_model_output`].
//!
//! [`OpenRouterClient`] implements the trait over HTTP with a blocking
//! `ureq` agent. Callers on an async runtime should run it on a blocking
//! thread.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{UmlCanvasError, config::LlmConfig};

/// Instructions sent as the system message of every text request.
pub const SYSTEM_PROMPT: &str = r##"You are an expert in UML 2.5 class diagrams. Produce ONLY valid JSON with no additional text.

REQUIRED STRUCTURE (UML 2.5):
{
  "classes": [
    {
      "name": "ClassName",
      "isAbstract": false,
      "isInterface": false,
      "stereotype": null,
      "fields": [
        {
          "name": "attribute",
          "type": "String",
          "visibility": "+",
          "multiplicity": null,
          "defaultValue": null
        }
      ],
      "methods": [
        {
          "name": "operation",
          "type": "void",
          "visibility": "+",
          "isAbstract": false,
          "parameters": [
            {
              "name": "parameter",
              "type": "String"
            }
          ]
        }
      ]
    }
  ],
  "connections": [
    {
      "fromId": "ClassName1",
      "toId": "ClassName2",
      "type": "association",
      "label": "1:*",
      "fromMultiplicity": "1",
      "toMultiplicity": "*"
    }
  ]
}

VALID UML 2.5 RELATIONSHIP TYPES:
- "association" (plain association)
- "aggregation" (weak whole-part)
- "composition" (strong whole-part)
- "generalization" (inheritance)
- "realization" (interface implementation)
- "dependency" (dependency)
- "oneToOne" (one to one)
- "oneToMany" (one to many)
- "manyToMany" (many to many)

UML 2.5 VISIBILITY:
- "+" = public
- "-" = private
- "#" = protected
- "~" = package

COMMON STEREOTYPES:
«entity», «control», «boundary», «service», «repository», «controller», «utility», «exception»

CRITICAL RULES:
1. If the prompt contains "CURRENT DIAGRAM CONTEXT", those classes ALREADY EXIST
2. In that case generate ONLY the new classes asked for under "NEW USER REQUEST"
3. DO NOT regenerate the existing classes listed in the context
4. In connections use the EXACT class names (existing or new)
5. To relate a new class to an existing one, use the existing class name
6. Answer ONLY with valid JSON, without markdown, explanations or extra text
7. For abstract classes use "isAbstract": true and mark abstract methods with "isAbstract": true
8. For interfaces use "isInterface": true
9. Use standard UML multiplicities: "1", "0..1", "*", "0..*", "1..*"

INCREMENTAL ANSWER EXAMPLE:
If the context has "Persona" and the request is "Add a class Estudiante that inherits from Persona":
{
  "classes": [
    {
      "name": "Estudiante",
      "fields": [...],
      "methods": [...]
    }
  ],
  "connections": [
    {
      "fromId": "Estudiante",
      "toId": "Persona",
      "type": "generalization"
    }
  ]
}"##;

/// User instructions that accompany an uploaded diagram image.
pub const VISION_PROMPT: &str = "The attached image shows a class diagram, possibly hand drawn. \
Transcribe every class with its attributes, methods and relationships into the JSON structure \
described above. Use the visible names exactly. Answer ONLY with valid JSON.";

/// An image to send to a vision model.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> ImageInput<'a> {
    pub fn new(mime_type: &'a str, bytes: &'a [u8]) -> Self {
        Self { mime_type, bytes }
    }

    /// The image as a `data:` URL with base64 payload.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(self.bytes))
    }
}

/// Source of model-generated diagrams.
pub trait DiagramGenerator {
    /// Sends `prompt` and returns the model's reply text.
    fn generate(&self, prompt: &str) -> Result<String, UmlCanvasError>;

    /// Asks a vision model to transcribe the diagram shown in `image`.
    fn describe_image(&self, image: ImageInput<'_>) -> Result<String, UmlCanvasError>;
}

/// Body of a chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatRequest {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.to_string()),
        }
    }

    fn user(content: MessageContent) -> Self {
        Self {
            role: "user",
            content,
        }
    }

    pub fn role(&self) -> &str {
        self.role
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extracts `choices[0].message.content` from a response body.
fn completion_content(body: &str) -> Result<String, UmlCanvasError> {
    let empty = || UmlCanvasError::EmptyCompletion {
        raw: body.to_string(),
    };
    let response: ChatResponse = serde_json::from_str(body).map_err(|_| empty())?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(empty)
}

/// [`DiagramGenerator`] backed by an OpenRouter-compatible HTTP API.
pub struct OpenRouterClient {
    config: LlmConfig,
    agent: ureq::Agent,
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.config.base_url())
            .field("model", &self.config.model())
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    pub fn new(config: LlmConfig) -> Self {
        // Non-2xx answers are read and reported with their body
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            config,
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url())
    }

    /// The request sent for a text prompt.
    pub fn text_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(MessageContent::Text(prompt.to_string())),
            ],
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        }
    }

    /// The request sent for a diagram image.
    pub fn image_request(&self, image: ImageInput<'_>) -> ChatRequest {
        ChatRequest {
            model: self.config.vision_model().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ])),
            ],
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        }
    }

    fn send(&self, request: &ChatRequest) -> Result<String, UmlCanvasError> {
        let api_key = self.config.api_key().ok_or_else(|| {
            UmlCanvasError::Config("OPENROUTER_API_KEY is not set".to_string())
        })?;

        let endpoint = self.endpoint();
        info!(endpoint = endpoint.as_str(), model = request.model(); "Sending chat completion");

        let mut response = self
            .agent
            .post(&endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .send_json(request)
            .map_err(|err| {
                error!(endpoint = endpoint.as_str(), err:err; "Chat completion request failed");
                UmlCanvasError::Transport(err.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| UmlCanvasError::Transport(err.to_string()))?;

        if !(200..300).contains(&status) {
            error!(status; "Upstream service rejected the request");
            return Err(UmlCanvasError::Upstream {
                status,
                details: body,
            });
        }

        let content = completion_content(&body)?;
        debug!(status, chars = content.len(); "Chat completion received");
        Ok(content)
    }
}

impl DiagramGenerator for OpenRouterClient {
    fn generate(&self, prompt: &str) -> Result<String, UmlCanvasError> {
        let request = self.text_request(prompt);
        self.send(&request)
    }

    fn describe_image(&self, image: ImageInput<'_>) -> Result<String, UmlCanvasError> {
        let request = self.image_request(image);
        self.send(&request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::merge::{CONTEXT_HEADER, REQUEST_HEADER};

    fn client() -> OpenRouterClient {
        OpenRouterClient::new(LlmConfig::default())
    }

    #[test]
    fn test_text_request_body() {
        let request = client().text_request("Add a class Curso");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "deepseek/deepseek-chat");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Add a class Curso");
        assert!(body["temperature"].as_f64().is_some());
    }

    #[test]
    fn test_image_request_body() {
        let request = client().image_request(ImageInput::new("image/png", b"png"));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "openai/gpt-4o-mini");
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,cG5n");
    }

    #[test]
    fn test_system_prompt_names_context_markers() {
        let context = CONTEXT_HEADER.trim_end_matches(':');
        let request = REQUEST_HEADER.trim_end_matches(':');
        assert!(SYSTEM_PROMPT.contains(context));
        assert!(SYSTEM_PROMPT.contains(request));
    }

    #[test]
    fn test_system_prompt_lists_every_visibility_symbol() {
        for line in [
            "\"+\" = public",
            "\"-\" = private",
            "\"#\" = protected",
            "\"~\" = package",
        ] {
            assert!(SYSTEM_PROMPT.contains(line), "missing `{line}`");
        }
        assert!(SYSTEM_PROMPT.trim_end().ends_with('}'));
    }

    #[test]
    fn test_completion_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"classes\":[]}"}}]}"#;
        assert_eq!(completion_content(body).unwrap(), r#"{"classes":[]}"#);
    }

    #[test]
    fn test_missing_content_keeps_raw_body() {
        for body in [r#"{"choices":[]}"#, r#"{"choices":[{"message":{}}]}"#, "not json"] {
            match completion_content(body) {
                Err(UmlCanvasError::EmptyCompletion { raw }) => assert_eq!(raw, body),
                other => panic!("unexpected result for {body}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_api_key() {
        let err = client().generate("anything").unwrap_err();
        assert!(matches!(err, UmlCanvasError::Config(_)));
    }

    #[test]
    fn test_unreachable_endpoint_is_a_transport_error() {
        let mut config: LlmConfig =
            serde_json::from_value(serde_json::json!({"base_url": "http://127.0.0.1:1/v1"})).unwrap();
        config.set_api_key("test-key");
        let err = OpenRouterClient::new(config).generate("anything").unwrap_err();
        assert!(matches!(err, UmlCanvasError::Transport(_)), "{err:?}");
    }

    #[test]
    fn test_request_serializes_plain_text_content_as_string() {
        let request = client().text_request("x");
        let body = serde_json::to_value(&request).unwrap();
        assert!(matches!(body["messages"][0]["content"], Value::String(_)));
    }
}

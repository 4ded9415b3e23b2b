//! OpenAI-compatible chat-completions backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, Usage,
};
use crate::tools::ToolSpec;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn function_type() -> String {
    "function".into()
}

/// Compatible servers send `null` where OpenAI omits the field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout: None,
        }
    }

    /// API root, e.g. `https://api.openai.com/v1`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model used when a request does not name one.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            api_key: self.api_key,
            model: self.model,
            timeout: self.timeout,
        }
    }
}

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Option<Duration>,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Tool messages expand to one wire message per result.
    fn message_to_api(msg: &Message) -> Vec<ApiMessage> {
        let role = Self::role_to_api(msg.role);
        if msg.role == Role::Tool {
            return msg
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::ToolResult(result) => Some(ApiMessage {
                        role,
                        content: Some(result.content.clone()),
                        tool_calls: Vec::new(),
                        tool_call_id: Some(result.tool_call_id.clone()),
                    }),
                    _ => None,
                })
                .collect();
        }

        let tool_calls: Vec<ApiToolCall> = msg
            .tool_calls()
            .into_iter()
            .map(|call| ApiToolCall {
                id: call.id.clone(),
                call_type: function_type(),
                function: ApiFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect();
        let text = msg.text();
        let content = if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(text)
        };

        vec![ApiMessage {
            role,
            content,
            tool_calls,
            tool_call_id: None,
        }]
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.json_schema(),
            },
        }
    }

    fn response_to_message(msg: ApiResponseMessage) -> Message {
        let calls = msg
            .tool_calls
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();
        let text = msg.content.filter(|text| !text.is_empty());
        Message::assistant_with_calls(text, calls)
    }

    fn map_send_error(e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Network(e.to_string())
        }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({})", self.model)
    }
}

impl Backend for OpenAiBackend {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: request.model.unwrap_or(&self.model),
            messages: request
                .messages
                .iter()
                .flat_map(Self::message_to_api)
                .collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
        };
        debug!(
            model = api_request.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "chat completion request"
        );

        let mut req = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("accept", "application/json");
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req
            .json(&api_request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%status, error = %e, "failed to read error body");
                    String::new()
                }
            };
            return Err(match status.as_u16() {
                408 => ModelError::Timeout,
                429 => ModelError::RateLimited(body),
                status => ModelError::Api { status, body },
            });
        }

        let body = response.text().await.map_err(Self::map_send_error)?;
        debug!(bytes = body.len(), "chat completion response");
        let api_response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use crate::tools::{ParamSpec, ParamType};
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    fn backend(server: &Server) -> OpenAiBackend {
        OpenAiBackend::builder("sk-test")
            .base_url(server.url_str("/v1"))
            .build()
    }

    fn weather_spec() -> ToolSpec {
        ToolSpec::new("get_weather", "Get the current weather for a location").param(
            ParamSpec::required("location", ParamType::String, "The city name"),
        )
    }

    #[tokio::test]
    async fn sends_tools_and_parses_tool_calls() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/chat/completions"),
                request::headers(contains(key("authorization"))),
                request::body(json_decoded(|body: &Value| {
                    body["model"] == "gpt-4o-mini"
                        && body["messages"][0]["role"] == "system"
                        && body["messages"][1]["content"] == "Weather in London?"
                        && body["tools"][0]["type"] == "function"
                        && body["tools"][0]["function"]["name"] == "get_weather"
                        && body["tools"][0]["function"]["parameters"]["required"]
                            == json!(["location"])
                })),
            ])
            .respond_with(json_encoded(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "get_weather",
                                "arguments": "{\"location\": \"London\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            }))),
        );

        let messages = [
            Message::system("You are a weather assistant."),
            Message::user("Weather in London?"),
        ];
        let tools = [weather_spec()];
        let response = backend(&server)
            .complete(ModelRequest::new(&messages).with_tools(&tools))
            .await
            .unwrap();

        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, r#"{"location": "London"}"#);
        assert!(response.message.text().is_empty());
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);
    }

    #[tokio::test]
    async fn follow_up_carries_tool_results_without_tools() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/chat/completions"),
                request::body(json_decoded(|body: &Value| {
                    let messages = &body["messages"];
                    body.get("tools").is_none()
                        && body["model"] == "gpt-4"
                        && messages[1]["role"] == "assistant"
                        && messages[1].get("content").is_none()
                        && messages[1]["tool_calls"][0]["function"]["arguments"]
                            == "{\"location\":\"Tokyo\"}"
                        && messages[2]["role"] == "tool"
                        && messages[2]["tool_call_id"] == "call_9"
                        && messages[2]["content"] == "The weather in Tokyo is clear, 70°F"
                })),
            ])
            .respond_with(json_encoded(json!({
                "choices": [{"message": {"role": "assistant", "content": "Clear skies in Tokyo."}}]
            }))),
        );

        let messages = [
            Message::user("Tokyo?"),
            Message::assistant_with_calls(
                None,
                vec![ToolCall::new("call_9", "get_weather", r#"{"location":"Tokyo"}"#)],
            ),
            Message::tool(ToolResult {
                tool_call_id: "call_9".into(),
                name: "get_weather".into(),
                content: "The weather in Tokyo is clear, 70°F".into(),
            }),
        ];
        let response = backend(&server)
            .complete(ModelRequest::new(&messages).with_model(Some("gpt-4")))
            .await
            .unwrap();

        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.text(), "Clear skies in Tokyo.");
        assert!(!response.message.has_tool_calls());
        assert_eq!(response.usage, Usage::default());
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(status_code(429).body("slow down")),
        );

        let messages = [Message::user("hi")];
        let err = backend(&server)
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::RateLimited(ref body) if body == "slow down"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn server_errors_are_transient_client_errors_are_not() {
        for (status, transient) in [(503, true), (401, false)] {
            let server = Server::run();
            server.expect(
                Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                    .respond_with(status_code(status).body("nope")),
            );

            let messages = [Message::user("hi")];
            let err = backend(&server)
                .complete(ModelRequest::new(&messages))
                .await
                .unwrap_err();

            assert!(
                matches!(err, ModelError::Api { status: s, .. } if s == status),
                "{err:?}"
            );
            assert_eq!(err.is_transient(), transient);
        }
    }

    #[tokio::test]
    async fn null_fields_read_as_absent() {
        let messages = [Message::user("hi")];

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(json_encoded(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "Sunny.", "tool_calls": null}
                    }],
                    "usage": null
                }))),
        );
        let text = backend(&server)
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap();
        assert_eq!(text.message.text(), "Sunny.");
        assert!(!text.message.has_tool_calls());
        assert_eq!(text.usage, Usage::default());

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(json_encoded(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "t1",
                                "type": "function",
                                "function": {"name": "transfer_to_french_agent", "arguments": null}
                            }]
                        }
                    }]
                }))),
        );
        let transfer = backend(&server)
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap();
        let calls = transfer.message.tool_calls();
        assert_eq!(calls[0].name, "transfer_to_french_agent");
        assert_eq!(calls[0].arguments, "");
    }

    #[tokio::test]
    async fn request_timeout_status_is_transient() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(status_code(408)),
        );

        let messages = [Message::user("hi")];
        let err = backend(&server)
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Timeout));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_choices_are_invalid() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(json_encoded(json!({"choices": []}))),
        );

        let messages = [Message::user("hi")];
        let err = backend(&server)
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(delay_and_then(
                    Duration::from_secs(2),
                    json_encoded(json!({"choices": []})),
                )),
        );

        let backend = OpenAiBackend::builder("sk-test")
            .base_url(server.url_str("/v1/"))
            .timeout(Duration::from_millis(100))
            .build();
        let messages = [Message::user("hi")];
        let err = backend
            .complete(ModelRequest::new(&messages))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Timeout));
    }

    #[test]
    fn display_names_model() {
        let backend = OpenAiBackend::builder("sk-test").model("gpt-4").build();
        assert_eq!(backend.to_string(), "openai(gpt-4)");
    }
}

//! Deterministic stand-ins for the model and tools, shared by unit tests.

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, Usage};
use crate::tools::{FunctionTools, ParamSpec, ParamType, ToolArguments, ToolError, ToolHost, ToolSpec};
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub model: Option<String>,
}

/// A backend that replays scripted replies in order.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Message, ModelError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    echo_tool_results: bool,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Message>) -> Self {
        Self::from_results(replies.into_iter().map(Ok))
    }

    pub fn from_results(replies: impl IntoIterator<Item = Result<Message, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            echo_tool_results: false,
        }
    }

    /// Once the script runs out, answer with the text of the latest tool result.
    pub fn echo_last_tool_result(mut self) -> Self {
        self.echo_tool_results = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn echo(messages: &[Message]) -> Option<Message> {
        messages.iter().rev().find_map(|m| match m.parts.first() {
            Some(Part::ToolResult(result)) if m.role == Role::Tool => {
                Some(Message::assistant(format!("Here you go: {}", result.content)))
            }
            _ => None,
        })
    }
}

impl Backend for ScriptedBackend {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            model: request.model.map(str::to_string),
        });

        let scripted = self.replies.lock().unwrap().pop_front();
        let message = match scripted {
            Some(reply) => reply?,
            None if self.echo_tool_results => Self::echo(request.messages)
                .ok_or_else(|| ModelError::InvalidResponse("nothing to echo".into()))?,
            None => return Err(ModelError::InvalidResponse("script exhausted".into())),
        };

        Ok(ModelResponse {
            message,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        })
    }
}

pub fn weather_spec() -> ToolSpec {
    ToolSpec::new("get_weather", "Get the current weather for a location").param(
        ParamSpec::required("location", ParamType::String, "The city name"),
    )
}

pub fn lookup_weather(args: &ToolArguments) -> Result<String, ToolError> {
    let location = args.get_str("location")?;
    let weather = match location {
        "London" => "rainy, 58°F",
        "Tokyo" => "clear, 70°F",
        _ => "partly cloudy, 68°F",
    };
    Ok(format!("The weather in {location} is {weather}"))
}

pub fn weather_tools() -> FunctionTools {
    FunctionTools::new().with_tool(weather_spec(), lookup_weather)
}

/// A tool host that records every execution.
pub struct RecordingTools {
    specs: Vec<ToolSpec>,
    fail_on: Option<String>,
    invocations: Mutex<Vec<(String, ToolArguments)>>,
}

impl RecordingTools {
    pub fn weather() -> Self {
        Self {
            specs: vec![weather_spec()],
            fail_on: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(location: &str) -> Self {
        Self {
            fail_on: Some(location.to_string()),
            ..Self::weather()
        }
    }

    pub fn invocations(&self) -> Vec<(String, ToolArguments)> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ToolHost for RecordingTools {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, name: &str, args: &ToolArguments) -> Result<String, ToolError> {
        self.invocations
            .lock()
            .unwrap()
            .push((name.to_string(), args.clone()));
        let location = args.get_str("location")?;
        if self.fail_on.as_deref() == Some(location) {
            return Err(ToolError::Execution(format!("no station in {location}")));
        }
        lookup_weather(args)
    }
}

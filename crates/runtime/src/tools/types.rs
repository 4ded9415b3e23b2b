//! Tool-related types.

use super::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render the parameter list as a JSON Schema object.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.kind.as_str(), "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check parsed arguments against the declared parameters.
    ///
    /// Unknown keys, missing required keys and mistyped values are rejected.
    pub fn validate(&self, args: &ToolArguments) -> Result<(), ToolError> {
        for key in args.0.keys() {
            if !self.parameters.iter().any(|p| p.name == *key) {
                return Err(ToolError::InvalidInput(format!(
                    "unknown parameter '{key}'"
                )));
            }
        }
        for param in &self.parameters {
            match args.get(&param.name) {
                None if param.required => {
                    return Err(ToolError::InvalidInput(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                None => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::InvalidInput(format!(
                        "parameter '{}' must be a {}",
                        param.name,
                        param.kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Parsed arguments of a tool call: a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(pub Map<String, Value>);

impl ToolArguments {
    /// Strictly parse a raw argument payload.
    ///
    /// The payload must be a JSON object. A blank payload is read as an empty
    /// object, which is how some providers encode parameterless calls.
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ToolError::InvalidInput(format!("arguments are not valid JSON: {e}")))?;
        Self::try_from(value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Result<&str, ToolError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput(format!("'{name}' must be a string")))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for ToolArguments {
    type Error = ToolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ToolError::InvalidInput(format!(
                "arguments must be a JSON object, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ToolArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

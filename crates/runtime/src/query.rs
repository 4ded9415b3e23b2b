//! User queries and their correlation ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier used to correlate logs of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// An immutable user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    trace_id: Option<TraceId>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    /// Record the trace id on the current span, if there is one.
    pub(crate) fn record_trace(&self) {
        if let Some(id) = self.trace_id {
            tracing::Span::current().record("trace_id", tracing::field::display(id));
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_round_trips_through_display() {
        let id = TraceId::new();
        let parsed: TraceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn query_keeps_text_and_trace() {
        let id = TraceId::new();
        let query = Query::new("What's the weather in London?").with_trace_id(id);
        assert_eq!(query.text(), "What's the weather in London?");
        assert_eq!(query.trace_id(), Some(id));
        assert_eq!(Query::from("hi").trace_id(), None);
    }
}

//! Agent configuration records and their execution.

use crate::model::Backend;
use crate::query::Query;
use crate::router::{HandoffRouter, RouteStrategy, SpecialistId, Specialists};
use crate::tool_loop::{FinalAnswer, ToolCallLoop};
use crate::tools::FunctionTools;
use crate::{Error, Result};

/// A specialist that answers queries with its own prompt and tools.
#[derive(Debug, Clone)]
pub struct LeafAgent {
    pub name: SpecialistId,
    pub instructions: String,
    pub model: Option<String>,
    pub tools: FunctionTools,
}

impl LeafAgent {
    pub fn new(name: SpecialistId, instructions: impl Into<String>) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            model: None,
            tools: FunctionTools::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tools(mut self, tools: FunctionTools) -> Self {
        self.tools = tools;
        self
    }
}

/// A triage agent that hands each query to one of its leaves.
#[derive(Debug, Clone)]
pub struct RoutingAgent {
    pub name: SpecialistId,
    pub instructions: String,
    pub model: Option<String>,
    pub handoffs: Vec<LeafAgent>,
    pub default: Option<SpecialistId>,
}

impl RoutingAgent {
    pub fn new(name: SpecialistId, instructions: impl Into<String>) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            model: None,
            handoffs: Vec::new(),
            default: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn handoff(mut self, leaf: LeafAgent) -> Self {
        self.handoffs.push(leaf);
        self
    }

    pub fn with_default(mut self, default: SpecialistId) -> Self {
        self.default = Some(default);
        self
    }

    /// The handoff targets as a validated specialist set.
    pub fn specialists(&self) -> Result<Specialists> {
        let set = Specialists::new(self.handoffs.iter().map(|leaf| leaf.name.clone()))?;
        match &self.default {
            Some(default) => set.with_default(default.clone()),
            None => Ok(set),
        }
    }

    fn leaf(&self, id: &SpecialistId) -> Result<&LeafAgent> {
        self.handoffs
            .iter()
            .find(|leaf| leaf.name == *id)
            .ok_or_else(|| Error::UnrecognizedSpecialist(id.to_string()))
    }
}

#[derive(Debug, Clone)]
pub enum Agent {
    Leaf(LeafAgent),
    Routing(RoutingAgent),
}

impl Agent {
    pub fn name(&self) -> &SpecialistId {
        match self {
            Self::Leaf(leaf) => &leaf.name,
            Self::Routing(router) => &router.name,
        }
    }
}

impl From<LeafAgent> for Agent {
    fn from(leaf: LeafAgent) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<RoutingAgent> for Agent {
    fn from(router: RoutingAgent) -> Self {
        Self::Routing(router)
    }
}

/// Which specialist answered, and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub specialist: SpecialistId,
    pub answer: FinalAnswer,
}

/// Run a query through an agent.
pub async fn run_agent<B: Backend>(backend: &B, agent: &Agent, query: &Query) -> Result<Outcome> {
    let leaf = match agent {
        Agent::Leaf(leaf) => leaf,
        Agent::Routing(router) => {
            let specialists = router.specialists()?;
            let id = HandoffRouter::new(backend)
                .instructions(Some(router.instructions.as_str()))
                .model(router.model.as_deref())
                .route(query, &specialists)
                .await?;
            router.leaf(&id)?
        }
    };
    run_leaf(backend, leaf, query).await
}

async fn run_leaf<B: Backend>(backend: &B, leaf: &LeafAgent, query: &Query) -> Result<Outcome> {
    let answer = ToolCallLoop::new(backend, &leaf.tools)
        .system(Some(leaf.instructions.as_str()))
        .model(leaf.model.as_deref())
        .run(query)
        .await?;
    Ok(Outcome {
        specialist: leaf.name.clone(),
        answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, ToolCall};
    use crate::testing::{ScriptedBackend, weather_tools};

    fn id(name: &str) -> SpecialistId {
        SpecialistId::new(name).unwrap()
    }

    fn language_router() -> RoutingAgent {
        RoutingAgent::new(id("triage_agent"), "Hand off to the agent for the user's language.")
            .handoff(LeafAgent::new(id("french_agent"), "You only speak French."))
            .handoff(LeafAgent::new(id("spanish_agent"), "You only speak Spanish."))
            .handoff(LeafAgent::new(id("english_agent"), "You only speak English."))
            .with_default(id("english_agent"))
    }

    #[tokio::test]
    async fn leaf_runs_the_tool_loop_with_its_prompt() {
        let backend = ScriptedBackend::new([
            Message::assistant_with_calls(
                None,
                vec![ToolCall::new("c1", "get_weather", r#"{"location": "London"}"#)],
            ),
        ])
        .echo_last_tool_result();
        let agent = Agent::from(
            LeafAgent::new(id("weather_agent"), "You are a weather assistant.")
                .with_tools(weather_tools()),
        );

        let outcome = run_agent(&backend, &agent, &Query::new("London?"))
            .await
            .unwrap();

        assert_eq!(outcome.specialist.as_str(), "weather_agent");
        assert!(outcome.answer.text.contains("rainy"));
        assert_eq!(
            backend.requests()[0].messages[0].text(),
            "You are a weather assistant."
        );
    }

    #[tokio::test]
    async fn router_hands_off_then_leaf_answers() {
        let backend = ScriptedBackend::new([
            Message::assistant_with_calls(
                None,
                vec![ToolCall::new("t1", "transfer_to_french_agent", "{}")],
            ),
            Message::assistant("Bonjour! Je vais bien, merci."),
        ]);
        let agent = Agent::from(language_router());

        let outcome = run_agent(&backend, &agent, &Query::new("Bonjour! Comment allez-vous?"))
            .await
            .unwrap();

        assert_eq!(outcome.specialist.as_str(), "french_agent");
        assert_eq!(outcome.answer.text, "Bonjour! Je vais bien, merci.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert!(
            requests[0].messages[0]
                .text()
                .starts_with("Hand off to the agent for the user's language.")
        );
        assert_eq!(requests[1].messages[0].text(), "You only speak French.");
        assert_eq!(requests[1].messages[1].text(), "Bonjour! Comment allez-vous?");
        assert!(requests[1].tool_names.is_empty());
    }

    #[tokio::test]
    async fn router_without_transfer_uses_default_leaf() {
        let backend = ScriptedBackend::new([
            Message::assistant("not sure"),
            Message::assistant("Peter Piper picked a peck of pickled peppers."),
        ]);
        let agent = Agent::from(language_router());

        let outcome = run_agent(&backend, &agent, &Query::new("Hi! Tell me a tongue twister."))
            .await
            .unwrap();

        assert_eq!(outcome.specialist.as_str(), "english_agent");
    }

    #[tokio::test]
    async fn per_agent_models_reach_the_backend() {
        let backend = ScriptedBackend::new([
            Message::assistant_with_calls(
                None,
                vec![ToolCall::new("t1", "transfer_to_spanish_agent", "")],
            ),
            Message::assistant("¡Hola!"),
        ]);
        let mut router = language_router().with_model("gpt-4o-mini");
        router.handoffs[1] = router.handoffs[1].clone().with_model("gpt-4");
        let agent = Agent::from(router);

        run_agent(&backend, &agent, &Query::new("¡Hola!")).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests[0].model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(requests[1].model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn default_outside_handoffs_is_a_config_error() {
        let router = language_router().with_default(id("german_agent"));
        assert!(matches!(router.specialists(), Err(Error::Config(_))));
    }
}

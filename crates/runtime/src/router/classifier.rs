//! Routing by a single classification call.

use super::{RouteStrategy, SpecialistId, Specialists};
use crate::model::{Backend, Conversation, ModelRequest};
use crate::query::Query;
use crate::Result;
use tracing::info;

/// Asks the model to answer with exactly one specialist name.
pub struct ClassifierRouter<'a, B> {
    backend: &'a B,
    model: Option<&'a str>,
}

impl<'a, B: Backend> ClassifierRouter<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            model: None,
        }
    }

    /// Override the backend's default model.
    pub fn model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }

    fn instructions(specialists: &Specialists) -> String {
        format!(
            "You are a query classifier. Classify queries into one of: {}. \
             Respond with ONLY the agent name, nothing else.{}",
            specialists.quoted_list(),
            specialists.default_hint()
        )
    }
}

impl<B: Backend> RouteStrategy for ClassifierRouter<'_, B> {
    #[tracing::instrument(name = "classify", skip_all, fields(trace_id = tracing::field::Empty))]
    async fn route(&self, query: &Query, specialists: &Specialists) -> Result<SpecialistId> {
        query.record_trace();
        let instructions = Self::instructions(specialists);
        let conversation = Conversation::new(Some(instructions.as_str()), query.text());

        let response = self
            .backend
            .complete(ModelRequest::new(conversation.messages()).with_model(self.model))
            .await?;

        let text = response.message.text();
        let answer = text.trim();
        match specialists.find(answer) {
            Some(id) => {
                info!(specialist = %id, "routed");
                Ok(id.clone())
            }
            None => specialists.fallback(answer),
        }
    }
}

//! One flow per subcommand, composing activities and the runtime.

use crate::error::{Error, Result, StepError};
use crate::specialists::{self, TriageTeam};
use activity::ActivityOptions;
use chrono::{DateTime, Local};
use runtime::{
    Agent, Backend, ClassifierRouter, FinalAnswer, Outcome, Query, RouteStrategy, TraceId,
    run_agent, tool_loop,
};
use tracing::info;

pub fn durable_run_id(trace_id: TraceId) -> String {
    format!("durable-agent-{trace_id}")
}

pub fn routing_run_id(now: DateTime<Local>) -> String {
    format!("routing-{}", now.format("%a-%b-%d-%I%M%S")).to_lowercase()
}

/// The weather agent called directly, without retries.
pub async fn ask<B: Backend>(backend: &B, query: &Query) -> Result<FinalAnswer> {
    let tools = specialists::weather_tools();
    Ok(tool_loop::run(backend, query, None, &tools).await?)
}

/// The weather agent as a single retryable activity.
pub async fn durable<B: Backend>(
    backend: &B,
    options: &ActivityOptions,
    query: &Query,
) -> Result<FinalAnswer> {
    let tools = &specialists::weather_tools();
    activity::execute("durable_agent", options, move || async move {
        Ok::<_, StepError>(tool_loop::run(backend, query, None, tools).await?)
    })
    .await
    .map_err(Error::activity("durable_agent"))
}

/// Classify the query, then let the chosen specialist answer it.
///
/// Classification and the specialist each run as their own activity;
/// classification runs under `classify`, the specialist under `options`.
pub async fn triage<B: Backend>(
    backend: &B,
    classify: &ActivityOptions,
    options: &ActivityOptions,
    query: &Query,
) -> Result<Outcome> {
    let team = &TriageTeam::new()?;
    let router = &ClassifierRouter::new(backend);

    let id = activity::execute("triage_query", classify, move || async move {
        Ok::<_, StepError>(router.route(query, &team.specialists).await?)
    })
    .await
    .map_err(Error::activity("triage_query"))?;
    info!(specialist = %id, "triaged");

    let leaf = team
        .agent(&id)
        .ok_or_else(|| runtime::Error::UnrecognizedSpecialist(id.to_string()))?;
    let agent = &Agent::Leaf(leaf.clone());
    activity::execute(id.as_str(), options, move || async move {
        Ok::<_, StepError>(run_agent(backend, agent, query).await?)
    })
    .await
    .map_err(Error::activity(id.as_str()))
}

/// Hand the query to a language specialist via transfer tools.
pub async fn route<B: Backend>(
    backend: &B,
    options: &ActivityOptions,
    query: &Query,
) -> Result<Outcome> {
    let agent = &Agent::Routing(specialists::language_router()?);
    let outcome = activity::execute("routing", options, move || async move {
        Ok::<_, StepError>(run_agent(backend, agent, query).await?)
    })
    .await
    .map_err(Error::activity("routing"))?;
    info!(specialist = %outcome.specialist, "handoff completed");
    Ok(outcome)
}

pub fn process_data(data: &str) -> String {
    format!("Processed: {}", data.to_uppercase())
}

/// The activity hello-world.
pub async fn hello(options: &ActivityOptions, name: &str) -> Result<String> {
    let input = &format!("Hello {name}");
    activity::execute("process_data", options, move || async move {
        info!(input = input.as_str(), "processing");
        Ok::<_, StepError>(process_data(input))
    })
    .await
    .map_err(Error::activity("process_data"))
}

//! The workshop's specialists and their lookup tools.

use runtime::{
    FunctionTools, LeafAgent, ParamSpec, ParamType, Result, RoutingAgent, SpecialistId,
    Specialists, ToolArguments, ToolError, ToolSpec,
};

pub const WEATHER_AGENT: &str = "weather_agent";
pub const TIME_AGENT: &str = "time_agent";
pub const GENERAL_AGENT: &str = "general_agent";

pub const FRENCH_AGENT: &str = "french_agent";
pub const SPANISH_AGENT: &str = "spanish_agent";
pub const ENGLISH_AGENT: &str = "english_agent";

fn location_param() -> ParamSpec {
    ParamSpec::required("location", ParamType::String, "The city name, e.g. San Francisco")
}

pub fn get_weather(args: &ToolArguments) -> std::result::Result<String, ToolError> {
    let location = args.get_str("location")?;
    let weather = match location {
        "San Francisco" => "sunny, 72°F",
        "New York" => "cloudy, 65°F",
        "London" => "rainy, 58°F",
        "Tokyo" => "clear, 70°F",
        _ => "partly cloudy, 68°F",
    };
    Ok(format!("The weather in {location} is {weather}"))
}

pub fn get_time(args: &ToolArguments) -> std::result::Result<String, ToolError> {
    let location = args.get_str("location")?;
    let time = match location {
        "San Francisco" => "10:45 AM PST",
        "New York" => "1:45 PM EST",
        "London" => "6:45 PM GMT",
        "Tokyo" => "3:45 AM JST",
        _ => "12:00 PM",
    };
    Ok(format!("The current time in {location} is {time}"))
}

pub fn weather_tools() -> FunctionTools {
    FunctionTools::new().with_tool(
        ToolSpec::new("get_weather", "Get the current weather for a location")
            .param(location_param()),
        get_weather,
    )
}

pub fn time_tools() -> FunctionTools {
    FunctionTools::new().with_tool(
        ToolSpec::new("get_time", "Get the current time for a location").param(location_param()),
        get_time,
    )
}

pub fn weather_agent() -> Result<LeafAgent> {
    Ok(
        LeafAgent::new(SpecialistId::new(WEATHER_AGENT)?, "You are a weather specialist assistant.")
            .with_tools(weather_tools()),
    )
}

pub fn time_agent() -> Result<LeafAgent> {
    Ok(
        LeafAgent::new(SpecialistId::new(TIME_AGENT)?, "You are a time specialist assistant.")
            .with_tools(time_tools()),
    )
}

pub fn general_agent() -> Result<LeafAgent> {
    Ok(LeafAgent::new(
        SpecialistId::new(GENERAL_AGENT)?,
        "You are a helpful general assistant. Answer concisely.",
    ))
}

/// Weather, time and general specialists for classifier triage.
pub struct TriageTeam {
    pub specialists: Specialists,
    agents: Vec<LeafAgent>,
}

impl TriageTeam {
    pub fn new() -> Result<Self> {
        let agents = vec![weather_agent()?, time_agent()?, general_agent()?];
        let specialists = Specialists::new(agents.iter().map(|a| a.name.clone()))?
            .with_default(SpecialistId::new(GENERAL_AGENT)?)?;
        Ok(Self {
            specialists,
            agents,
        })
    }

    /// The agent behind a routed id.
    pub fn agent(&self, id: &SpecialistId) -> Option<&LeafAgent> {
        self.agents.iter().find(|a| a.name == *id)
    }
}

fn language_agent(name: &str, language: &str) -> Result<LeafAgent> {
    Ok(LeafAgent::new(
        SpecialistId::new(name)?,
        format!("You only speak {language}. Respond naturally to user queries in {language}."),
    ))
}

/// Triage agent handing off to French, Spanish and English speakers.
pub fn language_router() -> Result<RoutingAgent> {
    Ok(RoutingAgent::new(
        SpecialistId::new("triage_agent")?,
        "You are a triage agent. Analyze the language of the user's query and hand off to \
         the appropriate language specialist agent. Detect if the query is in French, \
         Spanish, or English, then route accordingly.",
    )
    .handoff(language_agent(FRENCH_AGENT, "French")?)
    .handoff(language_agent(SPANISH_AGENT, "Spanish")?)
    .handoff(language_agent(ENGLISH_AGENT, "English")?)
    .with_default(SpecialistId::new(ENGLISH_AGENT)?))
}

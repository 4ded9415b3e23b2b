mod config;
mod error;
mod specialists;
mod workflows;

use std::path::PathBuf;

use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use runtime::{OpenAiBackend, Query, TraceId};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "handoff.toml";

const DEFAULT_ASK_QUERY: &str = "What's the weather like in San Francisco?";
const DEFAULT_TRIAGE_QUERY: &str = "What's the weather like in London?";
const DEFAULT_ROUTE_QUERY: &str = "Hi! Tell me a tongue twister.";
const DEFAULT_HELLO_NAME: &str = "Temporal";

#[derive(Parser)]
#[command(name = "handoff")]
#[command(about = "Tool-calling agents with specialist routing", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the weather agent directly
    Ask {
        #[arg(default_value = DEFAULT_ASK_QUERY)]
        query: String,
    },
    /// Ask the weather agent as a retryable activity
    Durable {
        #[arg(default_value = DEFAULT_ASK_QUERY)]
        query: String,
    },
    /// Classify the query, then ask the weather, time or general agent
    Triage {
        #[arg(default_value = DEFAULT_TRIAGE_QUERY)]
        query: String,
    },
    /// Hand the query off to a French, Spanish or English speaker
    Route {
        #[arg(default_value = DEFAULT_ROUTE_QUERY)]
        query: String,
    },
    /// Run the hello-world activity
    Hello {
        #[arg(default_value = DEFAULT_HELLO_NAME)]
        name: String,
    },
    /// Check that an API key is configured
    CheckEnv,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    let model = cli.model.as_deref();

    match cli.command {
        Commands::Ask { query } => cmd_ask(&config, model, query).await,
        Commands::Durable { query } => cmd_durable(&config, model, query).await,
        Commands::Triage { query } => cmd_triage(&config, model, query).await,
        Commands::Route { query } => cmd_route(&config, model, query).await,
        Commands::Hello { name } => cmd_hello(&config, &name).await,
        Commands::CheckEnv => cmd_check_env(&config),
    }
}

fn backend(config: &Config, model: Option<&str>) -> Result<OpenAiBackend> {
    let backend = config.backend(model)?;
    tracing::info!(%backend, "backend ready");
    Ok(backend)
}

async fn cmd_ask(config: &Config, model: Option<&str>, query: String) -> Result<()> {
    let backend = backend(config, model)?;
    println!("Query: {query}\n");

    let answer = workflows::ask(&backend, &Query::new(query)).await?;
    println!("Response: {}", answer.text);
    Ok(())
}

async fn cmd_durable(config: &Config, model: Option<&str>, query: String) -> Result<()> {
    let backend = backend(config, model)?;
    let options = config.activity_options()?;
    let trace_id = TraceId::new();
    println!("Trace ID: {trace_id}");
    println!("Run ID: {}", workflows::durable_run_id(trace_id));
    println!("Query: {query}\n");

    let query = Query::new(query).with_trace_id(trace_id);
    let answer = workflows::durable(&backend, &options, &query).await?;
    println!("Agent Response:\n{}\n", answer.text);
    println!(
        "Model calls: {}, tokens: {}",
        answer.model_calls,
        answer.usage.total_tokens()
    );
    Ok(())
}

async fn cmd_triage(config: &Config, model: Option<&str>, query: String) -> Result<()> {
    let backend = backend(config, model)?;
    let classify = config.classify_options()?;
    let options = config.activity_options()?;
    let trace_id = TraceId::new();
    println!("Trace ID: {trace_id}");
    println!("Query: {query}\n");

    let query = Query::new(query).with_trace_id(trace_id);
    let outcome = workflows::triage(&backend, &classify, &options, &query).await?;
    println!("Routed to: {}", outcome.specialist);
    println!("Final Response:\n{}", outcome.answer.text);
    Ok(())
}

async fn cmd_route(config: &Config, model: Option<&str>, query: String) -> Result<()> {
    let backend = backend(config, model)?;
    let options = config.activity_options()?;
    println!("Run ID: {}", workflows::routing_run_id(Local::now()));
    println!("Query: {query}\n");

    let query = Query::new(query).with_trace_id(TraceId::new());
    let outcome = workflows::route(&backend, &options, &query).await?;
    println!("Response: {}", outcome.answer.text);
    Ok(())
}

async fn cmd_hello(config: &Config, name: &str) -> Result<()> {
    let options = config.activity_options()?;
    println!("Run ID: hello-workflow-1");

    let result = workflows::hello(&options, name).await?;
    println!("Workflow result: {result}");
    Ok(())
}

fn cmd_check_env(config: &Config) -> Result<()> {
    let key = config.resolve_api_key()?;
    println!("Environment configured correctly");
    println!("  {}: {}", config::API_KEY_ENV, config::mask_key(&key));
    Ok(())
}

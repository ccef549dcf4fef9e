//! tilens CLI
//!
//! Ask an LLM agent about IPs, domains, URLs and file hashes, backed by
//! VirusTotal, AbuseIPDB, GreyNoise, OTX and RiskIQ.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tilens_agents::{
    create_anthropic_backend, create_backend, AnthropicConfig, LlmBackend, OpenAIBackendConfig,
    SessionConfig, SharedBackend,
};
use tilens_providers::ProviderConfig;
use tilens_runtime::AgentRegistry;

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4";

#[derive(Parser)]
#[command(name = "tilens")]
#[command(author, version, about = "tilens: conversational threat-intelligence lookups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Provider settings file (TOML); environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct BackendArgs {
    /// LLM model to use (default depends on the provider)
    #[arg(short, long)]
    model: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_key: Option<String>,

    /// Use OpenAI instead of Anthropic
    #[arg(long)]
    openai: bool,

    /// Use OpenRouter instead of Anthropic
    #[arg(long)]
    openrouter: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one prompt with an agent
    Run {
        /// Agent name, e.g. VTAgent
        #[arg(short, long)]
        agent: String,

        /// The question to ask
        #[arg(short, long)]
        prompt: String,

        /// Log every reasoning step
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Read prompts from stdin, one per line, in a single conversation
    Chat {
        /// Agent name, e.g. VTAgent
        #[arg(short, long)]
        agent: String,

        /// Log every reasoning step
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// List the available agents
    Agents,

    /// List the tools of an agent
    Tools {
        /// Agent name, e.g. VTAgent
        #[arg(short, long)]
        agent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let providers = match &cli.config {
        Some(path) => ProviderConfig::from_toml_file(path)?,
        None => ProviderConfig::default(),
    };

    match cli.command {
        Commands::Run {
            agent,
            prompt,
            debug,
            backend,
        } => {
            let registry = build_registry(&backend, &providers)?;
            registry.run(&agent, &prompt, debug).await?;
            print_buffer(&registry).await;
        }
        Commands::Chat {
            agent,
            debug,
            backend,
        } => {
            let registry = build_registry(&backend, &providers)?;
            chat(&registry, &agent, debug).await?;
        }
        Commands::Agents => {
            let registry = listing_registry(&providers)?;
            for name in registry.agent_names() {
                println!("{}", name);
            }
        }
        Commands::Tools { agent } => {
            let registry = listing_registry(&providers)?;
            for tool in registry.tools_for(&agent)? {
                println!("{}: {}", tool.name(), tool.description());
            }
        }
    }

    Ok(())
}

fn build_backend(args: &BackendArgs) -> Result<SharedBackend> {
    // Anthropic is default
    let backend = if args.openrouter {
        let key = args.openrouter_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("OpenRouter API key required. Set OPENROUTER_API_KEY or use --openrouter-key")
        })?;
        let model = args.model.as_deref().unwrap_or(DEFAULT_OPENROUTER_MODEL);
        create_backend(OpenAIBackendConfig::openrouter(key, model))?
    } else if args.openai {
        let key = args.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("OpenAI API key required. Set OPENAI_API_KEY or use --api-key")
        })?;
        let model = args.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
        create_backend(OpenAIBackendConfig::openai(key, model))?
    } else {
        let key = args.anthropic_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("Anthropic API key required. Set ANTHROPIC_API_KEY or use --anthropic-key")
        })?;
        let model = args.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
        create_anthropic_backend(AnthropicConfig::new(key, model))?
    };

    Ok(backend)
}

fn build_registry(args: &BackendArgs, providers: &ProviderConfig) -> Result<AgentRegistry> {
    let backend = build_backend(args)?;
    println!("📡 Model: {}", backend.model_name());
    Ok(AgentRegistry::with_default_agents(
        backend,
        providers,
        SessionConfig::default(),
    )?)
}

/// Registry for the listing commands; the backend is never called
fn listing_registry(providers: &ProviderConfig) -> Result<AgentRegistry> {
    let backend = create_backend(OpenAIBackendConfig::local(
        "http://localhost:11434/v1",
        DEFAULT_OPENAI_MODEL,
    ))?;
    Ok(AgentRegistry::with_default_agents(
        backend,
        providers,
        SessionConfig::default(),
    )?)
}

async fn chat(registry: &AgentRegistry, agent: &str, debug: bool) -> Result<()> {
    registry.initialize(agent, debug).await?;
    println!("💬 Talking to {} (type 'exit' or Ctrl-D to quit)", agent);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt.eq_ignore_ascii_case("exit") {
            break;
        }

        match registry.run(agent, prompt, debug).await {
            Ok(()) => {
                if let Some(answer) = registry.memory_turns().await.last() {
                    println!("{}", answer.ai);
                }
            }
            Err(e) => println!("⚠️  {}", e),
        }
    }

    print_buffer(registry).await;
    Ok(())
}

async fn print_buffer(registry: &AgentRegistry) {
    if let Some(buffer) = registry.memory_buffer().await {
        println!("\n{}", "=".repeat(60));
        println!("{}", buffer);
    }
}

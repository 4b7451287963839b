use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;

use rostra_core::provider::SpeechSynthesizer;
use rostra_engine::{DebateOrchestrator, OrchestratorConfig};
use rostra_llm::{
    AnthropicClient, AnthropicConfig, ElevenLabsClient, ElevenLabsConfig, TavilyClient, TavilyConfig,
};
use rostra_store::{ChangeFeed, Database};
use rostra_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "rostra", about = "Multi-agent debate orchestration server")]
struct Args {
    /// Port to serve on.
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Path to the SQLite database. Defaults to ~/.rostra/rostra.db.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Generation model override.
    #[arg(long)]
    model: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: String,

    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, default_value = "")]
    tavily_api_key: String,

    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true, default_value = "")]
    elevenlabs_api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _telemetry = init_telemetry(TelemetryConfig::default());
    tracing::info!("starting rostra");

    let db_path = match args.db {
        Some(path) => path,
        None => home_dir().join(".rostra").join("rostra.db"),
    };
    let db = Database::open(&db_path).context("failed to open database")?;
    let feed = ChangeFeed::default();

    let mut anthropic = AnthropicConfig::new(SecretString::from(args.anthropic_api_key));
    if let Some(model) = args.model {
        anthropic = anthropic.with_model(model);
    }
    let model = Arc::new(AnthropicClient::new(anthropic));

    if args.tavily_api_key.is_empty() {
        tracing::warn!("TAVILY_API_KEY not set; research lookups will fail and debates run ungrounded");
    }
    let research = Arc::new(TavilyClient::new(TavilyConfig::new(SecretString::from(
        args.tavily_api_key,
    ))));

    let speech: Option<Arc<dyn SpeechSynthesizer>> = if args.elevenlabs_api_key.is_empty() {
        tracing::info!("ELEVENLABS_API_KEY not set; speech synthesis disabled");
        None
    } else {
        Some(Arc::new(ElevenLabsClient::new(ElevenLabsConfig::new(
            SecretString::from(args.elevenlabs_api_key),
        ))))
    };

    let orchestrator = DebateOrchestrator::new(
        db.clone(),
        feed.clone(),
        model,
        research,
        speech,
        OrchestratorConfig::default(),
    );

    let config = rostra_server::ServerConfig {
        port: args.port,
        ..Default::default()
    };
    let handle = rostra_server::start(config, db, feed, orchestrator)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port, "rostra ready");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl+c")?;
    tracing::info!("shutting down");
    Ok(())
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

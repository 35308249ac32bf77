use std::sync::Arc;

use clap::{Parser, Subcommand};

use voxrelay_core::config::Config;
use voxrelay_core::knowledge::KnowledgeBase;
use voxrelay_providers::{DeepgramTranscriber, ElevenLabsSynthesizer, GroqGenerator};

#[derive(Parser)]
#[command(
    name = "voxrelay",
    about = "Voice chat relay — speech in, spoken replies out, over one WebSocket",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show resolved settings and credential status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up provider keys from a local .env before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::config_path);
    let config = Config::load(&config_path)?;

    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.gateway_port());

            let (warnings, errors) = config.validate();
            for w in &warnings {
                tracing::warn!("{w}");
            }
            if !errors.is_empty() {
                for e in &errors {
                    tracing::error!("{e}");
                }
                anyhow::bail!("Invalid configuration");
            }

            let knowledge = KnowledgeBase::load(&config.knowledge_dir())?;

            let config = Arc::new(config);
            let state = voxrelay_gateway::GatewayState::new(
                config.clone(),
                Arc::new(knowledge),
                Arc::new(DeepgramTranscriber::new(config.transcription())),
                Arc::new(GroqGenerator::new(config.generation())),
                Arc::new(ElevenLabsSynthesizer::new(config.synthesis())),
            );

            tracing::info!("Starting VoxRelay on port {port}");
            voxrelay_gateway::start_gateway(Arc::new(state), port).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
        },
        Commands::Status => {
            println!("VoxRelay v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Gateway port: {}", config.gateway_port());
            println!(
                "Knowledge dir: {}",
                config.knowledge_dir().display()
            );
            println!(
                "Transcription key: {}",
                key_status(config.transcription().resolve_api_key())
            );
            println!(
                "Generation key: {}",
                key_status(config.generation().resolve_api_key())
            );
            println!(
                "Synthesis key: {}",
                key_status(config.synthesis().resolve_api_key())
            );
            println!("Voice: {}", config.synthesis().resolve_voice_id());
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) {
    let logging = config.logging.clone().unwrap_or_default();

    let default_level = if verbose {
        "debug".to_string()
    } else {
        logging.level.unwrap_or_else(|| "info".to_string())
    };
    let mut directives = default_level;
    for f in &logging.filters {
        directives.push(',');
        directives.push_str(f);
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn key_status(key: Option<String>) -> &'static str {
    match key {
        Some(k) if !k.is_empty() => "set",
        _ => "NOT SET",
    }
}

use clap::{Parser, Subcommand};
use transbot::bot::format_translation;
use transbot::language::{self, Language};
use transbot::translator::{Translate, TranslatorClient};

#[derive(Parser)]
#[command(name = "transbot")]
#[command(about = "English/Sinhala translation bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway (POST /api/messages, GET /health, GET /). Requires AZURE_TRANSLATOR_KEY.
    Serve {
        /// Config file path (default: TRANSBOT_CONFIG_PATH; environment variables override file values)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 3978)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Translate text once and print the reply the bot would send.
    Translate {
        /// Config file path (default: TRANSBOT_CONFIG_PATH)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Target language code (en or si). Detected from the text when omitted.
        #[arg(long, value_name = "CODE")]
        to: Option<String>,

        /// Text to translate
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Print the target language the bot would pick for the text.
    Detect {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("transbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Translate { config, to, text }) => {
            if let Err(e) = run_translate(config, to, text.join(" ")).await {
                log::error!("translate failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Detect { text }) => {
            let text = text.join(" ");
            let target = language::target_language(&text);
            println!("{} ({})", target.code(), target.name());
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = transbot::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Err(e) = transbot::config::validate(&config) {
        log::info!("Please set the following environment variables:");
        for (name, help) in transbot::config::ENV_GUIDANCE {
            log::info!("- {}: {}", name, help);
        }
        return Err(e);
    }
    log::info!("Starting Translation Bot on {}:{}", config.gateway.bind, config.gateway.port);
    transbot::gateway::run_gateway(config).await
}

async fn run_translate(
    config_path: Option<std::path::PathBuf>,
    to: Option<String>,
    text: String,
) -> anyhow::Result<()> {
    let config = transbot::config::load_config(config_path)?;
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("no text to translate");
    }
    let target = match to {
        Some(code) => Language::from_code(&code)
            .ok_or_else(|| anyhow::anyhow!("unsupported target language: {} (use en or si)", code))?,
        None => language::target_language(text),
    };
    let client = TranslatorClient::new(&config.translator)?;
    let result = client.translate(text, target).await;
    println!("{}", format_translation(&result, target));
    Ok(())
}

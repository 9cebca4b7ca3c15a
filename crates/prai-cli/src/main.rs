use anyhow::Result;
use clap::Parser;

mod app;

#[derive(Parser)]
#[command(name = "prai")]
#[command(about = "PRAI - per-client chat with your agency's assistant")]
#[command(version)]
struct Cli {
    /// Send a single message to the active client and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Client to focus on start (defaults to the first configured client)
    #[arg(short, long)]
    client: Option<String>,

    /// Base URL of the assistant service (overrides config and PRAI_API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = prai_core::Settings::load();
    if let Some(url) = cli.api_url {
        settings.api.base_url = url;
    }

    let session = prai_core::ChatSession::open(&settings)?;
    if let Some(client) = cli.client {
        session.select(client);
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&session, &prompt).await?;
    } else {
        app::run_repl(&session).await?;
    }

    Ok(())
}

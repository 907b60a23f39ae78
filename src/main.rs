use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eddy::app::AppContext;
use eddy::cli::{commands, Cli, Commands, TrackAction};
use eddy::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Commands::Watch {
        interval: Some(secs),
        ..
    } = &cli.command
    {
        config.sync.poll_interval_secs = *secs;
    }

    let ctx = AppContext::new(None, config)?;

    match cli.command {
        Commands::Track { action } => match action {
            TrackAction::Add { channel } => commands::track_add(&ctx, &channel)?,
            TrackAction::Remove { channel } => commands::track_remove(&ctx, &channel)?,
            TrackAction::List => commands::track_list(&ctx)?,
        },
        Commands::Info { channel } => {
            commands::show_info(&ctx, &channel).await?;
        }
        Commands::History { channel, pages } => {
            commands::history(&ctx, &channel, pages).await?;
        }
        Commands::Watch { channel, .. } => {
            commands::watch(&ctx, &channel).await?;
        }
    }

    Ok(())
}

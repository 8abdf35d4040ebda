use crate::batch::{run_publish, run_render, BatchArgs};
use clap::{Args, Parser, Subcommand};
use scrutin_bot::config::AppConfig;
use scrutin_bot::error::AppError;
use scrutin_bot::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "scrutin-bot",
    about = "Summarise Assemblée nationale votes as charts and publish them",
    version
)]
struct Cli {
    /// Directory receiving rendered charts (overrides SCRUTIN_MEDIA_ROOT)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the charts and print the status text without publishing
    Render(BatchArgs),
    /// Render the charts and publish each vote with a poll reply
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
struct PublishArgs {
    #[command(flatten)]
    batch: BatchArgs,
    /// Log the posts locally instead of sending them, whatever DEBUG says
    #[arg(long)]
    dry_run: bool,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = if stays_local(&cli.command) {
        AppConfig::load_console()?
    } else {
        AppConfig::load()?
    };
    if let Some(media_root) = cli.media_root {
        config.media.root = media_root;
    }

    telemetry::init(&config.telemetry)?;
    info!(
        ?config.environment,
        media_root = %config.media.root.display(),
        console = config.publishing.is_console(),
        "scrutin bot starting"
    );

    match cli.command {
        Command::Render(args) => run_render(&config, args),
        Command::Publish(args) => run_publish(&config, args.batch),
    }
}

/// Rendering and dry runs never need credentials.
fn stays_local(command: &Command) -> bool {
    matches!(command, Command::Render(_) | Command::Publish(PublishArgs { dry_run: true, .. }))
}

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "biblio", about = "Book catalog REST service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default when no command is given)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = biblio_kernel::settings::Settings::load()
        .with_context(|| "failed to load BIBLIO settings")?;
    biblio_telemetry::init(&settings.telemetry);

    tracing::info!(env = ?settings.environment, "biblio CLI starting");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => biblio_app::run(settings).await,
    }
}

use anyhow::Context;
use biblio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load BIBLIO settings")?;
    biblio_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        host = %settings.server.host,
        port = settings.server.port,
        "biblio-app starting"
    );

    biblio_app::run(settings).await
}

//! BIBLIO Application Library
//!
//! Wires the books module into the kernel registry and runs the HTTP
//! server.

pub mod modules;

use biblio_kernel::settings::Settings;
use biblio_kernel::{InitCtx, ModuleRegistry};

/// Register modules, run the lifecycle, and serve HTTP until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    biblio_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;
    Ok(())
}

// =============================================================================
// providers/ — THE COURIERS WE ACTUALLY TALK TO
// =============================================================================
//
// Registration order matters: when several providers claim the same number,
// the one registered first wins every scalar field in the merged record.
//
//   1. YunExpress  (aggregator, delegates the last mile)
//   2. Speedy      (Bulgarian domestic courier)
// =============================================================================

pub mod html;
mod http;
pub mod speedy;
pub mod yunexpress;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::registry::Registry;

pub use http::build_client;
pub use speedy::SpeedyProvider;
pub use yunexpress::YunExpressProvider;

/// Every built-in provider, sharing one HTTP client.
pub fn builtin_registry(config: &Config) -> anyhow::Result<Registry> {
    let client = build_client(config).context("building HTTP client")?;

    let registry = Registry::builder()
        .register(Arc::new(
            YunExpressProvider::new(client.clone(), config)
                .context("compiling YunExpress tracking pattern")?,
        ))
        .register(Arc::new(
            SpeedyProvider::new(client, config).context("compiling Speedy tracking pattern")?,
        ))
        .build();

    info!(
        providers = registry.len(),
        names = ?registry.providers().map(|p| p.name()).collect::<Vec<_>>(),
        "Provider registry ready"
    );
    Ok(registry)
}

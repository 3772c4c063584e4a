pub mod config;

pub use config::{LogConfig, LogFormat};

use crate::{Error, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tracing::instrument(level = "info", skip_all)]
pub fn init_global_from_env() -> Result<()> {
    let cfg = LogConfig::from_env()?;
    init_global(&cfg)
}

/// Install the process-wide subscriber. `RUST_LOG` wins over `cfg.default_filter`.
#[tracing::instrument(level = "info", skip_all)]
pub fn init_global(cfg: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.default_filter.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    let res = match cfg.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(cfg.with_target),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(cfg.with_target))
            .try_init(),
    };
    res.map_err(|e| Error::InvalidInput(format!("tracing already initialized: {e}")))
}

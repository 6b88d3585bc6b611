use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::{ReportdError, ReportdResult};

/// Initialize the global tracing subscriber.
///
/// `level` is an EnvFilter directive (`info`, `reportd=debug`, ...);
/// `RUST_LOG` takes precedence when set. `format` is `pretty` or `json`.
pub fn init_logging(level: &str, format: &str) -> ReportdResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ReportdError::config_error(format!("invalid log filter '{level}': {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    result.map_err(|e| ReportdError::config_error(format!("failed to init logging: {e}")))
}

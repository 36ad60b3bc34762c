use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

use crate::presentation::config::{Environment, LoggingSettings};

const DEFAULT_DIRECTIVES: &str = "ragline=debug,tower_http=debug";

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(
    settings: &LoggingSettings,
    environment: Environment,
) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},{DEFAULT_DIRECTIVES}", settings.level))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if settings.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %environment,
        json = settings.json,
        level = %settings.level,
        "Tracing initialized"
    );
    Ok(())
}

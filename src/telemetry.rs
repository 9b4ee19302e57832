//! Tracing subscriber installation for the binary.

use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::AppError;

/// Install a global tracing subscriber writing compact output to stderr.
///
/// Defaults to `warn` so a successful run stays silent; override with the
/// `MDP_LOG` environment variable.
pub fn init() -> Result<(), AppError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("MDP_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|err| AppError::Telemetry(format!("failed to install tracing subscriber: {err}")))
}

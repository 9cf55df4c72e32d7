use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str = "info,app::api=debug,app::db=info";
const LOG_FILE_PREFIX: &str = "crm-dashboard.log";
/// Dashboard-specific override, checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "CRM_LOG";

/// Picks the filter directives: `CRM_LOG`, then `RUST_LOG`, then the default.
/// Blank values fall through.
fn select_directives(crm_log: Option<String>, rust_log: Option<String>) -> String {
    [crm_log, rust_log]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVES.to_string())
}

fn build_filter() -> AppResult<EnvFilter> {
    let directives = select_directives(
        std::env::var(LOG_ENV_VAR).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
        .map_err(|err| AppError::other(format!("invalid log directives: {err}")))
}

/// Installs the file and console subscribers. Later calls are no-ops.
pub fn init_logging(log_dir: &Path) -> AppResult<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            std::fs::create_dir_all(log_dir)?;

            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let env_filter = build_filter()?;

            LOGGER_GUARD
                .set(guard)
                .map_err(|_| AppError::other("logger already initialized"))?;

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("failed to install subscriber: {err}")))?;

            info!(target: "app::startup", log_dir = %log_dir.display(), "logging ready");
            Ok(())
        })
        .map(|_| ())
}

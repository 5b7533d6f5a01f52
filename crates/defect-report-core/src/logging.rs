//! Log subscriber bootstrap.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "defect_report_core=info,defect_report_catalog=info";

/// Install the global `fmt` subscriber. The filter is `filter` if given,
/// else `RUST_LOG`, else [`DEFAULT_LOG_FILTER`].
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> bool {
    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!("Defect report core v{}", env!("CARGO_PKG_VERSION"));
    }
    installed
}

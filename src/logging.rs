// tracing 初始化：RUST_LOG 优先，其次是配置里的 logLevel
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::model::LoggingCfg;

/// Directive used when neither `RUST_LOG` nor the configured level parses.
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global stderr subscriber. Returns `false` when one was
/// already installed (tests, embedding hosts).
pub fn init_logging(cfg: &LoggingCfg) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => filter_for(&cfg.log_level),
    };

    // stdout 留给命令输出
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    tracing::debug!(target = "app", level = %cfg.log_level, "tracing initialized");
    installed
}

fn filter_for(level: &str) -> EnvFilter {
    let level = level.trim();
    if level.is_empty() {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

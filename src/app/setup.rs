//! Application setup and the startup hook.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    core::{
        config::{
            loader as cfg_loader,
            model::{AppConfig, ProxyBackendKind},
        },
        orchestrator::{AutoSwitchOutcome, Orchestrator, OrchestratorError, OrchestratorOptions},
        permission::{FilePermissionBackend, PermissionGate},
        proxy::{MemoryProxyBackend, ProxyController, ProxySettingsBackend, SystemProxyBackend},
        store::{ConfigStore, FileStorageArea},
        util::now_millis,
    },
    events::{Event, EventBus, IndicatorState},
};

/// Everything a front-end needs, rooted at one base directory.
pub struct AppContext {
    pub base_dir: PathBuf,
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
}

/// Load (or initialise) the config under `base_dir` and wire the
/// production orchestrator from it.
pub fn build(base_dir: &Path, events: Arc<dyn EventBus>) -> Result<AppContext> {
    let config = cfg_loader::load_or_init_at(base_dir)
        .with_context(|| format!("load config under {}", base_dir.display()))?;
    Ok(from_config(base_dir, config, events))
}

/// File storage, file permissions, and the proxy backend named by
/// `proxy.backend`.
pub fn from_config(base_dir: &Path, config: AppConfig, events: Arc<dyn EventBus>) -> AppContext {
    let orchestrator = build_orchestrator(base_dir, &config, events);
    tracing::info!(
        target = "app",
        base = %base_dir.display(),
        backend = orchestrator.proxy().backend_name(),
        "application initialized"
    );
    AppContext {
        base_dir: base_dir.to_path_buf(),
        config,
        orchestrator,
    }
}

pub fn build_orchestrator(
    base_dir: &Path,
    config: &AppConfig,
    events: Arc<dyn EventBus>,
) -> Orchestrator {
    let store = ConfigStore::new(Arc::new(FileStorageArea::at_base_dir(base_dir)));
    let gate = PermissionGate::new(Arc::new(FilePermissionBackend::at_base_dir(base_dir)));
    let backend: Arc<dyn ProxySettingsBackend> = match config.proxy.backend {
        ProxyBackendKind::System => Arc::new(SystemProxyBackend::new()),
        ProxyBackendKind::Memory => Arc::new(MemoryProxyBackend::new()),
    };
    let proxy = ProxyController::new(backend).with_fallback_port(config.proxy.fallback_port);
    let options = OrchestratorOptions {
        health_check_timeout_ms: config.controller.health_check_timeout_ms,
        request_timeout_ms: config.controller.request_timeout_ms,
        clock: Arc::new(now_millis),
    };
    Orchestrator::new(store, gate, proxy, options, events)
}

/// Startup/install hook: reflect the persisted flag on the indicator, then
/// run the automatic fallback.
pub async fn on_startup(orch: &Orchestrator) -> Result<AutoSwitchOutcome, OrchestratorError> {
    let enabled = orch.store().get_proxy_enabled().await?;
    orch.publish(Event::Indicator(IndicatorState::from_enabled(enabled)));
    let outcome = orch.auto_switch().await?;
    tracing::info!(target = "app", outcome = ?outcome, "startup auto-switch finished");
    Ok(outcome)
}

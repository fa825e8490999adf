use std::sync::Arc;

use crate::core::controller::{ControllerClient, DEFAULT_HEALTH_CHECK_TIMEOUT_MS};
use crate::core::permission::PermissionGate;
use crate::core::proxy::{effective_bypass_list, ProxyController};
use crate::core::store::{ConfigStore, Profile, ProfilePatch, ProfileStatus};
use crate::core::util::now_millis;
use crate::events::{Event, EventBus, IndicatorState, ProfileEvent, ProxyEvent};

use super::errors::OrchestratorError;

/// Unix-millisecond time source used to stamp `last_used`.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

#[derive(Clone)]
pub struct OrchestratorOptions {
    pub health_check_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub clock: Clock,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            health_check_timeout_ms: DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
            request_timeout_ms: 5000,
            clock: Arc::new(now_millis),
        }
    }
}

impl std::fmt::Debug for OrchestratorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorOptions")
            .field("health_check_timeout_ms", &self.health_check_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish_non_exhaustive()
    }
}

/// What `auto_switch` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSwitchOutcome {
    NoProfiles,
    KeptActive(String),
    Switched {
        from: Option<String>,
        to: String,
        /// The proxy was on and re-enabling against `to` succeeded.
        reenabled: bool,
    },
    NoneReachable {
        disabled: bool,
    },
}

/// Proxy on/off and profile selection on top of the store, gate and platform rule.
///
/// Every operation runs its steps one after another; nothing is fanned out.
#[derive(Clone)]
pub struct Orchestrator {
    store: ConfigStore,
    gate: PermissionGate,
    proxy: ProxyController,
    options: OrchestratorOptions,
    events: Arc<dyn EventBus>,
}

impl Orchestrator {
    pub fn new(
        store: ConfigStore,
        gate: PermissionGate,
        proxy: ProxyController,
        options: OrchestratorOptions,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            store,
            gate,
            proxy,
            options,
            events,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn proxy(&self) -> &ProxyController {
        &self.proxy
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn publish(&self, evt: Event) {
        self.events.publish(evt);
    }

    fn client_for(&self, profile: &Profile) -> ControllerClient {
        ControllerClient::from_profile(profile).with_request_timeout(self.options.request_timeout_ms)
    }

    fn now(&self) -> u64 {
        (self.options.clock)()
    }

    pub async fn enable_proxy(&self) -> Result<(), OrchestratorError> {
        let Some(profile) = self.store.get_active_config().await? else {
            tracing::warn!(target = "orchestrator", "enable requested without an active profile");
            return Err(OrchestratorError::NoActiveConfig);
        };
        match self.enable_with(&profile).await {
            Ok(port) => {
                tracing::info!(target = "orchestrator", config_id = %profile.id, host = %profile.host, port, "proxy enabled");
                self.publish(Event::Proxy(ProxyEvent::Enabled {
                    config_id: profile.id.clone(),
                    host: profile.host.clone(),
                    port,
                }));
                self.publish(Event::Indicator(IndicatorState::On));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target = "orchestrator", config_id = %profile.id, host = %profile.host, category = e.category(), "enable failed: {}", e);
                if let Err(se) = self
                    .store
                    .update_config(&profile.id, ProfilePatch::status(ProfileStatus::Unavailable))
                    .await
                {
                    tracing::error!(target = "orchestrator", config_id = %profile.id, "failed to record unavailable status: {}", se);
                }
                self.publish(Event::Proxy(ProxyEvent::EnableFailed {
                    config_id: profile.id.clone(),
                    category: e.category().to_string(),
                    message: e.to_string(),
                }));
                self.publish(Event::Indicator(IndicatorState::Error));
                Err(e)
            }
        }
    }

    async fn enable_with(&self, profile: &Profile) -> Result<u16, OrchestratorError> {
        if !self.gate.has_permission(&profile.host).await {
            return Err(OrchestratorError::PermissionDenied(profile.host.clone()));
        }
        let config = self.client_for(profile).get_config().await?;
        let port = self.proxy.get_proxy_port(&config);
        let bypass = effective_bypass_list(profile.bypass_list.as_deref(), &profile.host);
        self.proxy.enable(&profile.host, port, &bypass).await?;
        self.store.set_proxy_enabled(true).await?;
        self.store
            .update_config(
                &profile.id,
                ProfilePatch::activated(ProfileStatus::Available, self.now()),
            )
            .await?;
        Ok(port)
    }

    pub async fn disable_proxy(&self) -> Result<(), OrchestratorError> {
        self.proxy.disable().await?;
        self.store.set_proxy_enabled(false).await?;
        tracing::info!(target = "orchestrator", "proxy disabled");
        self.publish(Event::Proxy(ProxyEvent::Disabled));
        self.publish(Event::Indicator(IndicatorState::Off));
        Ok(())
    }

    pub async fn toggle_proxy(&self) -> Result<(), OrchestratorError> {
        if self.store.get_proxy_enabled().await? {
            self.disable_proxy().await
        } else {
            self.enable_proxy().await
        }
    }

    /// Health-check every permitted profile in store order and record the result.
    ///
    /// Profiles whose host is not granted are left untouched and not reported.
    pub async fn check_all_configs(&self) -> Result<Vec<(String, ProfileStatus)>, OrchestratorError> {
        let configs = self.store.get_configs().await?;
        let mut results = Vec::with_capacity(configs.len());
        for profile in &configs {
            if !self.gate.has_permission(&profile.host).await {
                tracing::debug!(target = "orchestrator", config_id = %profile.id, host = %profile.host, "skipping health check, host not permitted");
                continue;
            }
            let status = self.probe(profile).await?;
            results.push((profile.id.clone(), status));
        }
        Ok(results)
    }

    /// Check `profile`, persist the status and publish it.
    async fn probe(&self, profile: &Profile) -> Result<ProfileStatus, OrchestratorError> {
        let reachable = self
            .client_for(profile)
            .health_check(self.options.health_check_timeout_ms)
            .await;
        let status = ProfileStatus::from_reachable(reachable);
        self.record_status(profile, status).await?;
        Ok(status)
    }

    async fn record_status(&self, profile: &Profile, status: ProfileStatus) -> Result<(), OrchestratorError> {
        self.store
            .update_config(&profile.id, ProfilePatch::status(status))
            .await?;
        tracing::debug!(target = "orchestrator", config_id = %profile.id, status = %status, "profile status recorded");
        self.publish(Event::Profile(ProfileEvent::StatusChanged {
            config_id: profile.id.clone(),
            status,
        }));
        Ok(())
    }

    /// Keep the active profile if it answers, otherwise fall back to the most
    /// recently used reachable one.
    ///
    /// An active profile whose host is not granted is marked unavailable
    /// without being contacted. Non-granted fallback candidates are skipped
    /// and keep their status.
    pub async fn auto_switch(&self) -> Result<AutoSwitchOutcome, OrchestratorError> {
        let configs = self.store.get_configs().await?;
        if configs.is_empty() {
            return Ok(AutoSwitchOutcome::NoProfiles);
        }

        let active_id = self.store.get_active_config_id().await?;
        let active = active_id
            .as_deref()
            .and_then(|id| configs.iter().find(|c| c.id == id));

        if let Some(active) = active {
            if self.gate.has_permission(&active.host).await {
                if self.probe(active).await? == ProfileStatus::Available {
                    tracing::info!(target = "orchestrator", config_id = %active.id, "active profile reachable");
                    return Ok(AutoSwitchOutcome::KeptActive(active.id.clone()));
                }
            } else {
                tracing::debug!(target = "orchestrator", config_id = %active.id, host = %active.host, "active profile host not permitted");
                self.record_status(active, ProfileStatus::Unavailable).await?;
            }
        }

        let mut candidates: Vec<&Profile> = configs
            .iter()
            .filter(|c| Some(c.id.as_str()) != active.map(|a| a.id.as_str()))
            .collect();
        // stable: ties keep store order
        candidates.sort_by(|a, b| b.last_used.cmp(&a.last_used));

        for candidate in candidates {
            if !self.gate.has_permission(&candidate.host).await {
                tracing::debug!(target = "orchestrator", config_id = %candidate.id, host = %candidate.host, "skipping candidate, host not permitted");
                continue;
            }
            if self.probe(candidate).await? != ProfileStatus::Available {
                continue;
            }
            self.store.set_active_config_id(Some(candidate.id.as_str())).await?;
            tracing::info!(target = "orchestrator", from = ?active_id, to = %candidate.id, "switched to reachable profile");
            self.publish(Event::Profile(ProfileEvent::Switched {
                from: active_id.clone(),
                to: candidate.id.clone(),
            }));
            let mut reenabled = false;
            if self.store.get_proxy_enabled().await? {
                match self.enable_proxy().await {
                    Ok(()) => reenabled = true,
                    Err(e) => tracing::warn!(target = "orchestrator", config_id = %candidate.id, "re-enable after switch failed: {}", e),
                }
            }
            return Ok(AutoSwitchOutcome::Switched {
                from: active_id,
                to: candidate.id.clone(),
                reenabled,
            });
        }

        let mut disabled = false;
        if self.store.get_proxy_enabled().await? {
            self.disable_proxy().await?;
            disabled = true;
        }
        tracing::warn!(target = "orchestrator", disabled, "no reachable profile");
        Ok(AutoSwitchOutcome::NoneReachable { disabled })
    }

    /// disable (if on) → set active + stamp last_used → enable (if it was on)
    pub async fn switch_config(&self, new_id: &str) -> Result<(), OrchestratorError> {
        let was_enabled = self.store.get_proxy_enabled().await?;
        if was_enabled {
            self.disable_proxy().await?;
        }
        let previous = self.store.get_active_config_id().await?;
        self.store.set_active_config_id(Some(new_id)).await?;
        self.store
            .update_config(new_id, ProfilePatch::last_used(self.now()))
            .await?;
        tracing::info!(target = "orchestrator", from = ?previous, to = %new_id, was_enabled, "active profile switched");
        self.publish(Event::Profile(ProfileEvent::Switched {
            from: previous,
            to: new_id.to_string(),
        }));
        if was_enabled {
            return self.enable_proxy().await;
        }
        Ok(())
    }
}

//! OS-level system proxy backend
//!
//! - Linux: `gsettings` under `org.gnome.system.proxy`
//! - macOS: `networksetup` on every enabled network service
//! - Windows: HKCU `Internet Settings` through `winreg`
//!
//! `<local>` is a Windows-only bypass token and is dropped on the other
//! platforms.

use async_trait::async_trait;

use super::backend::ProxySettingsBackend;
use super::errors::ProxySettingsError;
use super::settings::ProxySettings;

const WINDOWS_LOCAL_TOKEN: &str = "<local>";

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProxyBackend;

impl SystemProxyBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProxySettingsBackend for SystemProxyBackend {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn apply(&self, settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        let result = platform::apply(settings).await;
        match &result {
            Ok(()) => tracing::info!(target = "proxy", backend = "system", fixed = settings.is_fixed(), "system proxy updated"),
            Err(e) => tracing::warn!(target = "proxy", backend = "system", category = e.category(), "system proxy update failed: {}", e),
        }
        result
    }

    async fn current(&self) -> Result<ProxySettings, ProxySettingsError> {
        platform::current().await
    }
}

/// Bypass entries without the Windows-only `<local>` token.
pub fn non_windows_bypass(list: &[String]) -> Vec<String> {
    list.iter()
        .filter(|h| h.as_str() != WINDOWS_LOCAL_TOKEN)
        .cloned()
        .collect()
}

/// `['a', 'b']` as accepted by `gsettings set ... ignore-hosts`.
pub fn gsettings_list(list: &[String]) -> String {
    let items: Vec<String> = non_windows_bypass(list)
        .iter()
        .map(|h| format!("'{}'", h.replace('\'', "")))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Parse `gsettings get` output for a string list (`@as []` when empty).
pub fn parse_gsettings_list(raw: &str) -> Vec<String> {
    let raw = raw.trim().trim_start_matches("@as").trim();
    let inner = raw.trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|s| s.trim().trim_matches('\'').trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a scalar from `gsettings get`, e.g. `'manual'` or `uint32 7890`.
pub fn parse_gsettings_scalar(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.rsplit(' ').next().unwrap_or(raw);
    raw.trim_matches('\'').to_string()
}

/// Proxy server value and override list for the Windows registry.
pub fn windows_values(host: &str, port: u16, list: &[String]) -> (String, String) {
    (format!("{host}:{port}"), list.join(";"))
}

/// Enabled service names from `networksetup -listallnetworkservices`.
///
/// The first line is an explanatory header; disabled services start with `*`.
pub fn parse_network_services(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('*'))
        .map(str::to_string)
        .collect()
}

/// `Enabled/Server/Port` block from `networksetup -getwebproxy <service>`.
pub fn parse_networksetup_proxy(stdout: &str) -> Option<(String, u16)> {
    let mut enabled = false;
    let mut server = None;
    let mut port = None;
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else { continue };
        let value = value.trim();
        match key.trim() {
            "Enabled" => enabled = value.eq_ignore_ascii_case("yes"),
            "Server" if !value.is_empty() => server = Some(value.to_string()),
            "Port" => port = value.parse::<u16>().ok(),
            _ => {}
        }
    }
    if !enabled {
        return None;
    }
    Some((server?, port.filter(|p| *p > 0)?))
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
async fn run(program: &str, args: &[&str]) -> Result<String, ProxySettingsError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let reason = if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    };
    Err(ProxySettingsError::command(
        format!("{program} {}", args.join(" ")),
        reason,
    ))
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use crate::core::proxy::settings::ProxyScheme;

    const SCHEMA: &str = "org.gnome.system.proxy";

    async fn gset(schema: &str, key: &str, value: &str) -> Result<(), ProxySettingsError> {
        run("gsettings", &["set", schema, key, value]).await.map(|_| ())
    }

    async fn gget(schema: &str, key: &str) -> Result<String, ProxySettingsError> {
        run("gsettings", &["get", schema, key]).await
    }

    pub(super) async fn apply(settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        match settings {
            ProxySettings::FixedServers {
                host,
                port,
                bypass_list,
                ..
            } => {
                let port = port.to_string();
                for sub in ["http", "https"] {
                    let schema = format!("{SCHEMA}.{sub}");
                    gset(&schema, "host", host).await?;
                    gset(&schema, "port", &port).await?;
                }
                gset(SCHEMA, "ignore-hosts", &gsettings_list(bypass_list)).await?;
                gset(SCHEMA, "mode", "manual").await
            }
            ProxySettings::System => gset(SCHEMA, "mode", "none").await,
        }
    }

    pub(super) async fn current() -> Result<ProxySettings, ProxySettingsError> {
        if parse_gsettings_scalar(&gget(SCHEMA, "mode").await?) != "manual" {
            return Ok(ProxySettings::System);
        }
        let http = format!("{SCHEMA}.http");
        let host = parse_gsettings_scalar(&gget(&http, "host").await?);
        let port = parse_gsettings_scalar(&gget(&http, "port").await?)
            .parse::<u16>()
            .unwrap_or(0);
        let bypass_list = parse_gsettings_list(&gget(SCHEMA, "ignore-hosts").await?);
        Ok(ProxySettings::FixedServers {
            scheme: ProxyScheme::Http,
            host,
            port,
            bypass_list,
        })
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::*;
    use crate::core::proxy::settings::ProxyScheme;

    async fn services() -> Result<Vec<String>, ProxySettingsError> {
        let out = run("networksetup", &["-listallnetworkservices"]).await?;
        Ok(parse_network_services(&out))
    }

    pub(super) async fn apply(settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        let services = services().await?;
        match settings {
            ProxySettings::FixedServers {
                host,
                port,
                bypass_list,
                ..
            } => {
                let port = port.to_string();
                let mut domains = non_windows_bypass(bypass_list);
                if domains.is_empty() {
                    domains.push("Empty".to_string());
                }
                for service in &services {
                    run("networksetup", &["-setwebproxy", service.as_str(), host.as_str(), port.as_str()]).await?;
                    run("networksetup", &["-setsecurewebproxy", service.as_str(), host.as_str(), port.as_str()]).await?;
                    let mut args = vec!["-setproxybypassdomains", service.as_str()];
                    args.extend(domains.iter().map(String::as_str));
                    run("networksetup", &args).await?;
                }
                Ok(())
            }
            ProxySettings::System => {
                for service in &services {
                    run("networksetup", &["-setwebproxystate", service.as_str(), "off"]).await?;
                    run("networksetup", &["-setsecurewebproxystate", service.as_str(), "off"]).await?;
                }
                Ok(())
            }
        }
    }

    pub(super) async fn current() -> Result<ProxySettings, ProxySettingsError> {
        let Some(service) = services().await?.into_iter().next() else {
            return Ok(ProxySettings::System);
        };
        let out = run("networksetup", &["-getwebproxy", service.as_str()]).await?;
        let Some((host, port)) = parse_networksetup_proxy(&out) else {
            return Ok(ProxySettings::System);
        };
        let domains = run("networksetup", &["-getproxybypassdomains", service.as_str()]).await?;
        let bypass_list = domains
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("There aren't any"))
            .map(str::to_string)
            .collect();
        Ok(ProxySettings::FixedServers {
            scheme: ProxyScheme::Http,
            host,
            port,
            bypass_list,
        })
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use crate::core::proxy::settings::ProxyScheme;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};
    use winreg::RegKey;

    const INTERNET_SETTINGS: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings";

    fn open(flags: u32) -> Result<RegKey, ProxySettingsError> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(INTERNET_SETTINGS, flags)
            .map_err(|e| ProxySettingsError::Registry(e.to_string()))
    }

    fn reg_err(e: std::io::Error) -> ProxySettingsError {
        ProxySettingsError::Registry(e.to_string())
    }

    pub(super) async fn apply(settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        let key = open(KEY_READ | KEY_WRITE)?;
        match settings {
            ProxySettings::FixedServers {
                host,
                port,
                bypass_list,
                ..
            } => {
                let (server, overrides) = windows_values(host, *port, bypass_list);
                key.set_value("ProxyServer", &server).map_err(reg_err)?;
                key.set_value("ProxyOverride", &overrides).map_err(reg_err)?;
                key.set_value("ProxyEnable", &1u32).map_err(reg_err)
            }
            ProxySettings::System => key.set_value("ProxyEnable", &0u32).map_err(reg_err),
        }
    }

    pub(super) async fn current() -> Result<ProxySettings, ProxySettingsError> {
        let key = open(KEY_READ)?;
        let enabled: u32 = key.get_value("ProxyEnable").unwrap_or(0);
        if enabled == 0 {
            return Ok(ProxySettings::System);
        }
        let server: String = key.get_value("ProxyServer").map_err(reg_err)?;
        let overrides: String = key.get_value("ProxyOverride").unwrap_or_default();
        let (host, port) = match server.rsplit_once(':') {
            Some((h, p)) => (h.to_string(), p.parse::<u16>().unwrap_or(0)),
            None => (server.clone(), 0),
        };
        Ok(ProxySettings::FixedServers {
            scheme: ProxyScheme::Http,
            host,
            port,
            bypass_list: overrides
                .split(';')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod platform {
    use super::*;

    pub(super) async fn apply(_settings: &ProxySettings) -> Result<(), ProxySettingsError> {
        Err(ProxySettingsError::Unsupported(std::env::consts::OS.to_string()))
    }

    pub(super) async fn current() -> Result<ProxySettings, ProxySettingsError> {
        Err(ProxySettingsError::Unsupported(std::env::consts::OS.to_string()))
    }
}

use serde::{Deserialize, Serialize};

use crate::core::proxy::settings::default_bypass_list;
use crate::core::util::generate_id;

pub const KEY_CONFIGS: &str = "configs";
pub const KEY_ACTIVE_CONFIG_ID: &str = "activeConfigId";
pub const KEY_PROXY_ENABLED: &str = "proxyEnabled";
pub const KEY_THEME_MODE: &str = "themeMode";

pub const DEFAULT_PROFILE_EMOJI: &str = "🏠";
pub const DEFAULT_CONTROLLER_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONTROLLER_PORT: u16 = 9090;

/// Last known reachability of a profile's controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl ProfileStatus {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A named connection target for one controller instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_list: Option<Vec<String>>,
    #[serde(default)]
    pub is_default: bool,
    /// Unix milliseconds of the last activation, 0 when never used
    #[serde(default)]
    pub last_used: u64,
    #[serde(default)]
    pub status: ProfileStatus,
}

fn default_emoji() -> String {
    DEFAULT_PROFILE_EMOJI.to_string()
}

impl Profile {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            emoji: default_emoji(),
            host: host.into(),
            port,
            secret: None,
            bypass_list: Some(default_bypass_list()),
            is_default: false,
            last_used: 0,
            status: ProfileStatus::Unknown,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secret = if secret.is_empty() { None } else { Some(secret) };
        self
    }

    pub fn with_bypass_list(mut self, list: Vec<String>) -> Self {
        self.bypass_list = Some(list);
        self
    }

    pub fn with_last_used(mut self, last_used: u64) -> Self {
        self.last_used = last_used;
        self
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            is_default: true,
            ..Self::new("", DEFAULT_CONTROLLER_HOST, DEFAULT_CONTROLLER_PORT)
        }
    }
}

/// Partial update applied by `ConfigStore::update_config`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProfileStatus>,
}

impl ProfilePatch {
    pub fn status(status: ProfileStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn activated(status: ProfileStatus, last_used: u64) -> Self {
        Self {
            status: Some(status),
            last_used: Some(last_used),
            ..Default::default()
        }
    }

    pub fn last_used(last_used: u64) -> Self {
        Self {
            last_used: Some(last_used),
            ..Default::default()
        }
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(v) = &self.name {
            profile.name = v.clone();
        }
        if let Some(v) = &self.emoji {
            profile.emoji = v.clone();
        }
        if let Some(v) = &self.host {
            profile.host = v.clone();
        }
        if let Some(v) = self.port {
            profile.port = v;
        }
        if let Some(v) = &self.secret {
            profile.secret = if v.is_empty() { None } else { Some(v.clone()) };
        }
        if let Some(v) = &self.bypass_list {
            profile.bypass_list = Some(v.clone());
        }
        if let Some(v) = self.is_default {
            profile.is_default = v;
        }
        if let Some(v) = self.last_used {
            profile.last_used = v;
        }
        if let Some(v) = self.status {
            profile.status = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveTheme {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// `System` follows the platform colour-scheme preference.
    pub fn resolve(self, prefers_dark: bool) -> EffectiveTheme {
        match self {
            Self::Light => EffectiveTheme::Light,
            Self::Dark => EffectiveTheme::Dark,
            Self::System if prefers_dark => EffectiveTheme::Dark,
            Self::System => EffectiveTheme::Light,
        }
    }
}

/// Everything the store persists, as returned by `GET_STATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub proxy_enabled: bool,
    pub active_config_id: Option<String>,
    pub configs: Vec<Profile>,
    pub theme_mode: ThemeMode,
}

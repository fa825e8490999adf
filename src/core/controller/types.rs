use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probe target used when the caller does not pick one.
pub const DEFAULT_DELAY_PROBE_URL: &str = "http://www.gstatic.com/generate_204";
pub const DEFAULT_DELAY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 3000;

/// Group types a user can pick a member from.
pub const PROXY_GROUP_TYPES: [ProxyGroupType; 4] = [
    ProxyGroupType::Selector,
    ProxyGroupType::UrlTest,
    ProxyGroupType::LoadBalance,
    ProxyGroupType::Fallback,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClashVersion {
    #[serde(default)]
    pub premium: bool,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<bool>,
}

/// Controller routing mode. Decoding ignores case, and values it does not
/// know (`script`, future modes) are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Rule,
    Global,
    Direct,
    Other(String),
}

impl RunMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rule => "rule",
            Self::Global => "global",
            Self::Direct => "direct",
            Self::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rule" => Self::Rule,
            "global" => Self::Global,
            "direct" => Self::Direct,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl Serialize for RunMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null 当作默认模式
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|r| Self::parse(&r)).unwrap_or_default())
    }
}

/// Controller-side runtime configuration (`GET /configs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClashConfig {
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub socks_port: u16,
    #[serde(default)]
    pub redir_port: u16,
    #[serde(default)]
    pub mixed_port: u16,
    #[serde(default)]
    pub allow_lan: bool,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub log_level: String,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub external_controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ui: Option<String>,
}

/// Body of `PATCH /configs`; only the fields that are set go on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_lan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<bool>,
}

impl ConfigPatch {
    pub fn mode(mode: RunMode) -> Self {
        Self {
            mode: Some(mode),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHistory {
    pub time: String,
    pub delay: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyGroupType {
    Selector,
    #[serde(rename = "URLTest")]
    UrlTest,
    LoadBalance,
    Fallback,
    Relay,
}

impl ProxyGroupType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Selector" => Some(Self::Selector),
            "URLTest" => Some(Self::UrlTest),
            "LoadBalance" => Some(Self::LoadBalance),
            "Fallback" => Some(Self::Fallback),
            "Relay" => Some(Self::Relay),
            _ => None,
        }
    }
}

/// A proxy node or group as reported by `GET /proxies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub history: Vec<ProxyHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
}

impl ProxyNode {
    pub fn group_type(&self) -> Option<ProxyGroupType> {
        ProxyGroupType::parse(&self.node_type)
    }

    pub fn is_group(&self) -> bool {
        self.group_type().is_some()
    }

    /// Most recent delay sample, if any.
    pub fn latest_delay(&self) -> Option<i64> {
        self.history.last().map(|h| h.delay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProxiesResponse {
    #[serde(default)]
    pub proxies: BTreeMap<String, ProxyNode>,
}

impl ProxiesResponse {
    /// Selectable groups ordered by name.
    pub fn groups(&self) -> Vec<&ProxyNode> {
        self.proxies
            .values()
            .filter(|node| {
                node.group_type()
                    .map(|t| PROXY_GROUP_TYPES.contains(&t))
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub payload: String,
    pub proxy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RulesResponse {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMetadata {
    #[serde(default)]
    pub network: String,
    #[serde(default, rename = "type")]
    pub conn_type: String,
    #[serde(default, rename = "sourceIP")]
    pub source_ip: String,
    #[serde(default, rename = "destinationIP")]
    pub destination_ip: String,
    #[serde(default)]
    pub source_port: String,
    #[serde(default)]
    pub destination_port: String,
    #[serde(default)]
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub metadata: ConnectionMetadata,
    #[serde(default)]
    pub upload: u64,
    #[serde(default)]
    pub download: u64,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub rule_payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub inuse: u64,
    pub oslimit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsResponse {
    #[serde(default)]
    pub download_total: u64,
    #[serde(default)]
    pub upload_total: u64,
    // mihomo reports `null` when the table is empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayResult {
    pub delay: u64,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

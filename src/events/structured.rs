use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::core::store::ProfileStatus;

/// 代理开关相关事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProxyEvent {
    Enabled { config_id: String, host: String, port: u16 },
    Disabled,
    EnableFailed { config_id: String, category: String, message: String },
}

/// 配置（profile）相关事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileEvent {
    StatusChanged { config_id: String, status: ProfileStatus },
    Switched { from: Option<String>, to: String },
}

/// 工具栏指示灯状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorState {
    On,
    Off,
    Error,
}

impl IndicatorState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// 统一顶层事件枚举
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    Proxy(ProxyEvent),
    Profile(ProfileEvent),
    Indicator(IndicatorState),
}

/// 事件总线 trait
pub trait EventBus: Send + Sync + 'static {
    fn publish(&self, evt: Event);
}

/// 内存事件总线（测试与开发期使用）
#[derive(Clone, Default)]
pub struct MemoryEventBus {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_all(&self) -> Vec<Event> {
        if let Ok(mut g) = self.inner.lock() {
            std::mem::take(&mut *g)
        } else {
            Vec::new()
        }
    }

    pub fn snapshot(&self) -> Vec<Event> {
        if let Ok(g) = self.inner.lock() {
            g.clone()
        } else {
            Vec::new()
        }
    }

    /// 仅指示灯事件，按发布顺序
    pub fn indicators(&self) -> Vec<IndicatorState> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                Event::Indicator(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl EventBus for MemoryEventBus {
    fn publish(&self, evt: Event) {
        if let Ok(mut g) = self.inner.lock() {
            g.push(evt);
        }
    }
}

/// 生产环境总线：事件序列化为 JSON 后写入 tracing
#[derive(Clone, Copy, Default)]
pub struct TracingEventBus;

impl EventBus for TracingEventBus {
    fn publish(&self, evt: Event) {
        match serde_json::to_string(&evt) {
            Ok(json) => tracing::info!(target = "app", event = %json, "event"),
            Err(e) => tracing::warn!(target = "app", "event serialization failed: {}", e),
        }
    }
}

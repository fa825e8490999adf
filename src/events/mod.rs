//! 结构化事件：代理开关、配置状态与指示灯

pub mod structured;

pub use structured::{
    Event, EventBus, IndicatorState, MemoryEventBus, ProfileEvent, ProxyEvent, TracingEventBus,
};

#![allow(dead_code, unused_imports)]
//! 公共测试模块聚合
//!
//! - test_env: tracing 初始化
//! - fixtures: 模拟控制器、内存后端与 Orchestrator 装配

pub mod fixtures;
pub mod test_env;

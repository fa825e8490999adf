pub mod config;
pub mod controller;
pub mod orchestrator;
pub mod permission;
pub mod proxy;
pub mod store;
pub mod util;

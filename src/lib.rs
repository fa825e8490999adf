pub mod app;
pub mod core;
pub mod events;
pub mod logging;

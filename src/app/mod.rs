//! Host surfaces over the orchestrator.
//!
//! ## Module Structure
//!
//! - `messages`: the `{type, payload?}` / `{success, data?, error?}` envelope
//! - `dispatcher`: routes one message to one orchestrator operation
//! - `setup`: production wiring from `AppConfig` and the startup hook
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use clash_switchboard_lib::app::{dispatcher, messages::MessageRequest, setup};
//! use clash_switchboard_lib::core::config::loader::base_dir;
//! use clash_switchboard_lib::events::TracingEventBus;
//! # async fn demo() -> anyhow::Result<()> {
//! let ctx = setup::build(&base_dir(), Arc::new(TracingEventBus))?;
//! let resp = dispatcher::handle_message(&ctx.orchestrator, MessageRequest::new("GET_STATE")).await;
//! println!("{}", serde_json::to_string(&resp)?);
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod messages;
pub mod setup;

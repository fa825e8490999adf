//! Host permission gate for non-loopback controllers

pub mod backend;
pub mod errors;
pub mod gate;

pub use backend::{FilePermissionBackend, GrantPolicy, MemoryPermissionBackend, PermissionBackend};
pub use errors::PermissionError;
pub use gate::{is_local_host, origin_pattern, Interaction, PermissionGate, LOCAL_HOSTS};

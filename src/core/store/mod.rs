//! Persistent profile store
//!
//! - `model`: profiles, patches, theme and the persisted state shape
//! - `area`: storage areas (file backed and in-memory) with change feeds
//! - `config_store`: typed CRUD over an area

pub mod area;
pub mod config_store;
pub mod errors;
pub mod model;

pub use area::{change_channel, AreaName, FileStorageArea, MemoryStorageArea, StorageArea, StorageChange};
pub use config_store::{ConfigStore, StoreChanges};
pub use errors::{StoreError, StoreResult};
pub use model::{
    EffectiveTheme, Profile, ProfilePatch, ProfileStatus, StoreState, ThemeMode,
    DEFAULT_CONTROLLER_HOST, DEFAULT_CONTROLLER_PORT, DEFAULT_PROFILE_EMOJI, KEY_ACTIVE_CONFIG_ID,
    KEY_CONFIGS, KEY_PROXY_ENABLED, KEY_THEME_MODE,
};

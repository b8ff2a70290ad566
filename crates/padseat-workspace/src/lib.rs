mod controller_db;
mod mapping;
mod parse;
mod record;
mod resolve;
mod session;
mod settings;
mod store;
mod v1;
mod watcher;
mod workspace;

use thiserror::Error;

pub use controller_db::mapping_from_controller_db;
pub use mapping::{action, scancode, Hotkey, Mapping, NO_HOTKEY_KEY};
pub use parse::{parse_settings, parse_store, render_settings, render_store};
pub use record::{Record, RecordKind, StoreFile};
pub use resolve::{legacy_guid, MatchTier, MatchingResolver, StoreSnapshot};
pub use session::{ActionSpec, AssignError, ConfigSession, HotkeyFallback, CONFIG_ACTIONS};
pub use settings::{
    GunSettings, InputSettings, PlayerPreference, ScreenSize, Settings, DEFAULT_MAX_PLAYERS,
    DEFAULT_MOVE_TOLERANCE,
};
pub use store::{ConfigStore, StoreEvent};
pub use watcher::{SettingsEvent, SettingsEventReceiver, SettingsWatcher, WatcherError};
pub use workspace::Workspace;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("\"{first}\" and \"{second}\" are both bound to {input}")]
    Conflict {
        first: String,
        second: String,
        input: String,
    },
    #[error("saved mapping for \"{0}\" did not read back")]
    Verify(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("environment variable not set: {0}")]
    EnvVarNotSet(String),
    #[error("path is not a directory: {0}")]
    PathIsNotDirectory(String),
    #[error("path error: {0}")]
    PathError(#[from] std::io::Error),
    #[error("watcher error: {0}")]
    WatcherError(WatcherError),
}

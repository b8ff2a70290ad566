use std::path::{Path, PathBuf};

use crate::store::ConfigStore;
use crate::watcher::{SettingsEventReceiver, SettingsWatcher};
use crate::{Settings, SettingsError, WorkspaceError};

const DEFAULT_SHARED_PATH: &str = "/etc/padseat";
const APP_DIR: &str = "padseat";
const STORE_FILE_NAME: &str = "input.yaml";
const LAST_WRITTEN_FILE_NAME: &str = "last_input.yaml";
const SETTINGS_FILE_NAME: &str = "settings.yaml";
const SOCKET_FILE_NAME: &str = "padseatd.sock";

/// Directory holding the user's mapping store, settings and runtime files.
pub struct Workspace {
    path: PathBuf,
    shared: PathBuf,
}

impl Workspace {
    pub fn new(path: Option<&Path>, shared: Option<&Path>) -> Result<Self, WorkspaceError> {
        let path = {
            if let Some(path) = path {
                path.to_owned()
            } else {
                Self::default_path()?
            }
        };

        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        } else if !path.is_dir() {
            return Err(WorkspaceError::PathIsNotDirectory(
                path.display().to_string(),
            ));
        }

        let shared = shared.map_or_else(|| PathBuf::from(DEFAULT_SHARED_PATH), Path::to_path_buf);
        Ok(Self { path, shared })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store_path(&self) -> PathBuf {
        self.path.join(STORE_FILE_NAME)
    }

    pub fn shared_store_path(&self) -> PathBuf {
        self.shared.join(STORE_FILE_NAME)
    }

    pub fn last_written_path(&self) -> PathBuf {
        self.path.join(LAST_WRITTEN_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.path.join(SETTINGS_FILE_NAME)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.path.join(SOCKET_FILE_NAME)
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(
            self.store_path(),
            Some(self.shared_store_path()),
            self.last_written_path(),
        )
    }

    pub fn load_settings(&self) -> Result<Settings, SettingsError> {
        Settings::load(&self.settings_path())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.save(&self.settings_path())
    }

    pub fn start_settings_watcher(
        &self,
    ) -> Result<(SettingsWatcher, SettingsEventReceiver), WorkspaceError> {
        SettingsWatcher::new_with_starting_event(&self.settings_path())
            .map_err(WorkspaceError::WatcherError)
    }

    pub fn default_path() -> Result<PathBuf, WorkspaceError> {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(config).join(APP_DIR));
        }
        std::env::var("HOME")
            .map(PathBuf::from)
            .map(|p| p.join(".config").join(APP_DIR))
            .map_err(|_| WorkspaceError::EnvVarNotSet("HOME".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("padseat");
        let workspace = Workspace::new(Some(&path), Some(dir.path())).expect("workspace");
        assert!(path.is_dir());
        assert_eq!(workspace.store_path(), path.join("input.yaml"));
        assert_eq!(workspace.shared_store_path(), dir.path().join("input.yaml"));
    }

    #[test]
    fn rejects_file_as_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("file");
        std::fs::write(&file, "").expect("write");
        assert!(matches!(
            Workspace::new(Some(&file), None),
            Err(WorkspaceError::PathIsNotDirectory(_))
        ));
    }

    #[test]
    fn settings_round_trip_through_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::new(Some(dir.path()), None).expect("workspace");
        let mut settings = workspace.load_settings().expect("defaults");
        settings.gun.mouse_fallback = true;
        workspace.save_settings(&settings).expect("save");
        assert!(workspace.load_settings().expect("load").gun.mouse_fallback);
    }
}

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify::{Config, Error as NotifyError, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer_opt, DebounceEventResult, DebouncedEventKind, Debouncer};
use thiserror::Error;

use crate::{Settings, SettingsError};

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Watches the settings file and re-reads it on change.
pub struct SettingsWatcher {
    #[allow(dead_code)]
    watcher: Debouncer<RecommendedWatcher>,
}

pub enum SettingsEvent {
    Changed(Settings),
    Removed,
    Error(WatcherError),
}

pub type SettingsEventSender = mpsc::Sender<SettingsEvent>;
pub type SettingsEventReceiver = mpsc::Receiver<SettingsEvent>;

fn send_settings_event(path: &Path, tx: &SettingsEventSender) {
    let event = match Settings::load(path) {
        Ok(settings) => SettingsEvent::Changed(settings),
        Err(e) => SettingsEvent::Error(WatcherError::Settings(e)),
    };
    let _ = tx.send(event);
}

impl SettingsWatcher {
    pub fn new_with_sender(path: &Path, tx: SettingsEventSender) -> Result<Self, WatcherError> {
        let path_c = path.to_owned();

        let debouncer_config = notify_debouncer_mini::Config::default()
            .with_timeout(Duration::from_millis(500))
            .with_notify_config(Config::default());
        let mut debouncer = new_debouncer_opt::<_, RecommendedWatcher>(
            debouncer_config,
            move |events: DebounceEventResult| match events {
                Ok(events) => {
                    let touched = events.iter().any(|event| {
                        matches!(
                            event.kind,
                            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                        ) && event.path.file_name() == path_c.file_name()
                    });
                    if !touched {
                        return;
                    }
                    if path_c.exists() {
                        send_settings_event(&path_c, &tx);
                    } else {
                        let _ = tx.send(SettingsEvent::Removed);
                    }
                }
                Err(e) => {
                    let _ = tx.send(SettingsEvent::Error(WatcherError::Notify(e)));
                }
            },
        )?;

        // Watch the directory so the file can be created or replaced atomically.
        let dir = path.parent().unwrap_or(Path::new("."));
        debouncer.watcher().watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self { watcher: debouncer })
    }

    pub fn new(path: &Path) -> Result<(Self, SettingsEventReceiver), WatcherError> {
        let (tx, rx) = mpsc::channel();

        Ok((Self::new_with_sender(path, tx)?, rx))
    }

    pub fn new_with_starting_event(
        path: &Path,
    ) -> Result<(Self, SettingsEventReceiver), WatcherError> {
        let (tx, rx) = mpsc::channel();

        send_settings_event(path, &tx);
        Ok((Self::new_with_sender(path, tx)?, rx))
    }
}

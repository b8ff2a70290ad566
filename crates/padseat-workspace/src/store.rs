use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

use padseat_device::Device;

use crate::mapping::Mapping;
use crate::parse::{parse_store, render_store};
use crate::record::{Record, RecordKind, StoreFile};
use crate::resolve::{MatchTier, MatchingResolver, StoreSnapshot};
use crate::StoreError;

const SHELL: &str = "/bin/sh";

/// Notification sent after a mapping was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ConfigChanged { name: String, guid: String },
}

/// Reads and writes persisted mappings.
///
/// The user store is read-write, the shared store is read-only and the
/// "last written" export is write-only.
pub struct ConfigStore {
    user_path: PathBuf,
    shared_path: Option<PathBuf>,
    last_written_path: PathBuf,
    subscribers: Vec<Sender<StoreEvent>>,
}

fn read_store(path: &Path) -> Result<StoreFile, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(StoreFile::default()),
        Ok(content) => parse_store(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreFile::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes through a sibling temp file so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

impl ConfigStore {
    pub fn new(user_path: PathBuf, shared_path: Option<PathBuf>, last_written_path: PathBuf) -> Self {
        Self {
            user_path,
            shared_path,
            last_written_path,
            subscribers: Vec::new(),
        }
    }

    pub fn user_path(&self) -> &Path {
        &self.user_path
    }

    pub fn last_written_path(&self) -> &Path {
        &self.last_written_path
    }

    /// Subscribes to save notifications. Dropped receivers are pruned.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, event: &StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Reads both stores. An unreadable store is logged and treated as empty.
    pub fn snapshot(&self) -> StoreSnapshot {
        let user = read_store(&self.user_path).unwrap_or_else(|e| {
            error!("Unable to read {}: {e}", self.user_path.display());
            StoreFile::default()
        });
        let shared = match &self.shared_path {
            Some(path) => read_store(path).unwrap_or_else(|e| {
                error!("Unable to read {}: {e}", path.display());
                StoreFile::default()
            }),
            None => StoreFile::default(),
        };
        StoreSnapshot { user, shared }
    }

    /// Looks up the stored mapping of a device.
    pub fn load_mapping(&self, device: &Device) -> Option<(Mapping, MatchTier)> {
        let snapshot = self.snapshot();
        Self::load_from(&snapshot, device)
    }

    /// Looks up a device in an already read snapshot.
    pub fn load_from(snapshot: &StoreSnapshot, device: &Device) -> Option<(Mapping, MatchTier)> {
        let resolver = MatchingResolver::new(snapshot);
        let (record, tier) = resolver.resolve(RecordKind::of(device), &device.name, &device.guid)?;
        if tier != MatchTier::UserExact && tier != MatchTier::SharedExact {
            info!(
                "Approximate config for \"{}\" found using guid={} name=\"{}\" ({tier})",
                device.name, record.guid, record.name
            );
        }
        Some((record.mapping_for(device.id), tier))
    }

    /// Persists the mapping of a device.
    ///
    /// Refuses mappings with two actions on one input. On success both the
    /// user store and the last written export are rewritten, the store is
    /// read back for verification, `on_finish` commands run and subscribers
    /// are notified.
    pub fn save_mapping(&mut self, device: &Device, mapping: &Mapping) -> Result<(), StoreError> {
        if let Some((first, second, input)) = mapping.conflicts().into_iter().next() {
            return Err(StoreError::Conflict {
                first,
                second,
                input: input.to_string(),
            });
        }

        let record = Record::for_device(device, mapping);
        let mut store = read_store(&self.user_path)?;
        store.upsert(record.clone());

        if let Some(parent) = self.user_path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&self.user_path, &render_store(&store)?)?;

        let last = StoreFile {
            on_finish: Vec::new(),
            records: vec![record.clone()],
        };
        if let Err(e) = write_atomic(&self.last_written_path, &render_store(&last)?) {
            warn!("Unable to write {}: {e}", self.last_written_path.display());
        }

        let reread = read_store(&self.user_path)?;
        match reread.find(&record.name, &record.guid) {
            Some(saved) if saved.mapping.same_bindings(&record.mapping) => {}
            _ => return Err(StoreError::Verify(record.name)),
        }
        debug!("Saved mapping for \"{}\" ({})", record.name, record.guid);

        run_on_finish(&reread.on_finish);
        self.broadcast(&StoreEvent::ConfigChanged {
            name: record.name,
            guid: record.guid,
        });
        Ok(())
    }
}

fn run_on_finish(commands: &[String]) {
    for command in commands {
        match Command::new(SHELL).args(["-c", command]).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("on_finish command \"{command}\" exited with {status}"),
            Err(e) => error!("on_finish command \"{command}\" failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use padseat_device::{Input, InputKind, KEYBOARD_ID};

    use super::*;

    fn pad(name: &str, guid: &str) -> Device {
        Device {
            id: 4,
            index: 0,
            name: name.into(),
            guid: guid.into(),
            num_buttons: 12,
            num_hats: 1,
            num_axes: 4,
            path: None,
            battery_level: -1,
            is_wheel: false,
        }
    }

    fn mapping(a: i32, b: i32) -> Mapping {
        let mut m = Mapping::new();
        m.map_input("a", Input::new(4, InputKind::Button, a, 1, true));
        m.map_input("b", Input::new(4, InputKind::Button, b, 1, true));
        m
    }

    fn store(dir: &Path, shared: Option<PathBuf>) -> ConfigStore {
        ConfigStore::new(dir.join("input.yaml"), shared, dir.join("last_input.yaml"))
    }

    #[test]
    fn missing_store_resolves_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), Some(dir.path().join("absent.yaml")));
        assert!(store.load_mapping(&pad("Pad", "0300")).is_none());
    }

    #[test]
    fn corrupt_store_resolves_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("input.yaml"), "version: [").expect("write");
        let store = store(dir.path(), None);
        assert!(store.load_mapping(&pad("Pad", "0300")).is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store(dir.path(), None);
        let rx = store.subscribe();
        let device = pad("Pad", "0300");
        store.save_mapping(&device, &mapping(0, 1)).expect("save");

        let (loaded, tier) = store.load_mapping(&device).expect("found");
        assert_eq!(tier, MatchTier::UserExact);
        assert_eq!(loaded, mapping(0, 1));
        assert_eq!(
            rx.try_recv().ok(),
            Some(StoreEvent::ConfigChanged {
                name: "Pad".into(),
                guid: "0300".into()
            })
        );
        assert!(store.last_written_path().exists());
    }

    #[test]
    fn resave_replaces_previous_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store(dir.path(), None);
        let device = pad("Pad", "0300");
        store.save_mapping(&device, &mapping(0, 1)).expect("save");
        store.save_mapping(&device, &mapping(2, 3)).expect("save");
        store
            .save_mapping(&pad("Other", "0500"), &mapping(5, 6))
            .expect("save");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.user.records.len(), 2);
        assert_eq!(
            store.load_mapping(&device).map(|(m, _)| m),
            Some(mapping(2, 3))
        );

        let last = read_store(store.last_written_path()).expect("export");
        assert_eq!(last.records.len(), 1);
        assert_eq!(last.records[0].name, "Other");
    }

    #[test]
    fn conflicting_mapping_keeps_previous_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store(dir.path(), None);
        let device = pad("Pad", "0300");
        store.save_mapping(&device, &mapping(0, 1)).expect("save");

        let err = store.save_mapping(&device, &mapping(2, 2));
        assert!(matches!(err, Err(StoreError::Conflict { .. })));
        assert_eq!(
            store.load_mapping(&device).map(|(m, _)| m),
            Some(mapping(0, 1))
        );
    }

    #[test]
    fn corrupt_user_store_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.yaml");
        fs::write(&path, "version: [").expect("write");
        let mut store = store(dir.path(), None);
        assert!(store.save_mapping(&pad("Pad", "0300"), &mapping(0, 1)).is_err());
        assert_eq!(fs::read_to_string(&path).expect("read"), "version: [");
    }

    #[test]
    fn shared_store_is_consulted_after_user_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shared_path = dir.path().join("shared.yaml");
        fs::write(
            &shared_path,
            "version: 1\ndevices:\n  - type: joystick\n    name: Pad\n    guid: \"0300\"\n    inputs:\n      - { name: a, type: button, id: 9, value: 1 }\n",
        )
        .expect("write");
        let store = store(dir.path(), Some(shared_path));
        let (m, tier) = store.load_mapping(&pad("Pad", "0300")).expect("found");
        assert_eq!(tier, MatchTier::SharedExact);
        assert_eq!(m.input_by_name("a").map(|i| (i.device, i.id)), Some((4, 9)));
    }

    #[test]
    fn keyboard_records_use_fixed_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store(dir.path(), None);
        let mut keyboard = Device::keyboard();
        keyboard.name = "AT Translated Set 2".into();
        let mut m = Mapping::new();
        m.map_input("a", Input::new(KEYBOARD_ID, InputKind::Key, 41, 1, true));
        store.save_mapping(&keyboard, &m).expect("save");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.user.records[0].name, "Keyboard");
        assert_eq!(snapshot.user.records[0].kind, RecordKind::Keyboard);
    }

    #[test]
    fn on_finish_failures_do_not_fail_the_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("input.yaml"),
            "version: 1\non_finish:\n  - \"exit 3\"\n",
        )
        .expect("write");
        let mut store = store(dir.path(), None);
        store
            .save_mapping(&pad("Pad", "0300"), &mapping(0, 1))
            .expect("save");
        assert_eq!(store.snapshot().user.on_finish, vec!["exit 3".to_string()]);
    }
}

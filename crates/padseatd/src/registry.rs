use std::collections::BTreeMap;

use padseat_device::{AxisCalibrator, Device, DeviceId, JoystickBackend, JoystickInfo, CEC_ID, KEYBOARD_ID};
use padseat_workspace::{mapping_from_controller_db, ConfigStore, MatchTier, Mapping, StoreSnapshot};

use crate::{print_debug, print_error, print_info, print_warning};

/// Where a device's mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource {
    Store(MatchTier),
    /// Saved by the configuration flow during this run.
    Saved,
    /// Built-in default, never persisted.
    BuiltIn,
}

impl std::fmt::Display for MappingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingSource::Store(tier) => tier.fmt(f),
            MappingSource::Saved => f.write_str("saved"),
            MappingSource::BuiltIn => f.write_str("built-in default"),
        }
    }
}

/// A live device with its resolved mapping and axis state.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device: Device,
    pub mapping: Option<Mapping>,
    pub source: Option<MappingSource>,
    calibrator: AxisCalibrator,
}

impl DeviceEntry {
    fn new(device: Device, deadzone: i32) -> Self {
        let calibrator = AxisCalibrator::new(device.num_axes as usize, deadzone);
        Self {
            device,
            mapping: None,
            source: None,
            calibrator,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.mapping.as_ref().is_some_and(Mapping::is_configured)
    }

    pub fn calibrator(&self) -> &AxisCalibrator {
        &self.calibrator
    }

    fn resolve(&mut self, snapshot: &StoreSnapshot) -> bool {
        match ConfigStore::load_from(snapshot, &self.device) {
            Some((mapping, tier)) => {
                self.mapping = Some(mapping);
                self.source = Some(MappingSource::Store(tier));
                true
            }
            None => {
                self.mapping = None;
                self.source = None;
                false
            }
        }
    }
}

/// Outcome of [`DeviceRegistry::rebuild_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub opened: usize,
    /// Enumeration indexes that failed to open.
    pub failed: Vec<u32>,
}

/// Owner of every open joystick handle and the input singletons.
pub struct DeviceRegistry<B: JoystickBackend> {
    backend: B,
    store: ConfigStore,
    deadzone: i32,
    keyboard: DeviceEntry,
    cec: DeviceEntry,
    joysticks: BTreeMap<DeviceId, DeviceEntry>,
}

impl<B: JoystickBackend> DeviceRegistry<B> {
    /// Creates the registry and resolves the keyboard and CEC mappings.
    /// Joysticks appear on the first [`DeviceRegistry::rebuild_all`].
    pub fn new(backend: B, store: ConfigStore, deadzone: i32) -> Self {
        let mut registry = Self {
            backend,
            store,
            deadzone,
            keyboard: DeviceEntry::new(Device::keyboard(), deadzone),
            cec: DeviceEntry::new(Device::cec(), deadzone),
            joysticks: BTreeMap::new(),
        };
        let snapshot = registry.store.snapshot();
        registry.resolve_singletons(&snapshot);
        registry
    }

    fn resolve_singletons(&mut self, snapshot: &StoreSnapshot) {
        if !self.keyboard.resolve(snapshot) {
            print_debug!("no keyboard config found, using defaults");
            self.keyboard.mapping = Some(Mapping::default_keyboard());
            self.keyboard.source = Some(MappingSource::BuiltIn);
        }
        self.cec.resolve(snapshot);
    }

    /// Closes everything, re-enumerates and reopens every joystick.
    ///
    /// Joysticks that fail to open are logged and left out. Calibration
    /// state starts fresh for every device.
    pub fn rebuild_all(&mut self) -> RebuildReport {
        self.backend.close_all();
        self.joysticks.clear();

        let snapshot = self.store.snapshot();
        self.resolve_singletons(&snapshot);

        let mut report = RebuildReport::default();
        let count = match self.backend.enumerate() {
            Ok(count) => count,
            Err(e) => {
                print_error!("failed to enumerate joysticks: {e}");
                0
            }
        };

        for index in 0..count {
            let info = match self.backend.open(index) {
                Ok(info) => info,
                Err(e) => {
                    print_warning!("skipping joystick {index}: {e}");
                    report.failed.push(index);
                    continue;
                }
            };
            let entry = self.open_entry(&snapshot, &info);
            if let Some(stale) = self.joysticks.insert(info.id, entry) {
                print_warning!("instance id {} reused by {}", info.id, stale.device.name);
            }
            report.opened += 1;
        }

        print_debug!(
            "rebuilt devices: {} open, {} failed",
            report.opened,
            report.failed.len()
        );
        report
    }

    fn open_entry(&mut self, snapshot: &StoreSnapshot, info: &JoystickInfo) -> DeviceEntry {
        let mut entry = DeviceEntry::new(info.to_device(), self.deadzone);
        for axis in 0..info.num_axes {
            if let Some(rest) = self.backend.axis_rest(info.id, axis) {
                entry.calibrator.seed_rest(axis as usize, rest);
            }
        }

        if entry.resolve(snapshot) {
            print_info!(
                "added known joystick {} (instance id {}, index {})",
                info.name,
                info.id,
                info.index
            );
            return entry;
        }

        let synthesized = info
            .controller_db
            .as_deref()
            .and_then(|line| mapping_from_controller_db(line, info.id));
        match synthesized {
            Some(mapping) => {
                print_info!("creating config for {} from the controller database", info.name);
                if let Err(e) = self.store.save_mapping(&entry.device, &mapping) {
                    print_error!("failed to save config for {}: {e}", info.name);
                }
                entry.mapping = Some(mapping);
                entry.source = Some(MappingSource::Store(MatchTier::ControllerDb));
            }
            None => print_info!(
                "added unconfigured joystick {} (guid {}, instance id {}, index {})",
                info.name,
                info.guid,
                info.id,
                info.index
            ),
        }
        entry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    pub fn deadzone(&self) -> i32 {
        self.deadzone
    }

    /// Takes effect on the next rebuild.
    pub fn set_deadzone(&mut self, deadzone: i32) {
        self.deadzone = deadzone;
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: DeviceId) -> Option<&DeviceEntry> {
        match id {
            KEYBOARD_ID => Some(&self.keyboard),
            CEC_ID => Some(&self.cec),
            _ => self.joysticks.get(&id),
        }
    }

    fn get_mut(&mut self, id: DeviceId) -> Option<&mut DeviceEntry> {
        match id {
            KEYBOARD_ID => Some(&mut self.keyboard),
            CEC_ID => Some(&mut self.cec),
            _ => self.joysticks.get_mut(&id),
        }
    }

    pub fn keyboard(&self) -> &DeviceEntry {
        &self.keyboard
    }

    pub fn cec(&self) -> &DeviceEntry {
        &self.cec
    }

    /// Open joysticks in instance id order.
    pub fn joysticks(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.joysticks.values()
    }

    /// Keyboard, CEC, then joysticks.
    pub fn entries(&self) -> impl Iterator<Item = &DeviceEntry> {
        [&self.keyboard, &self.cec].into_iter().chain(self.joysticks.values())
    }

    pub fn device_count(&self) -> usize {
        self.joysticks.len()
    }

    /// Configured joysticks plus the keyboard and CEC when configured.
    pub fn configured_count(&self) -> usize {
        self.entries().filter(|e| e.is_configured()).count()
    }

    /// Configured joysticks, the candidates for player slots.
    pub fn configured_joysticks(&self) -> Vec<&Device> {
        self.joysticks
            .values()
            .filter(|e| e.is_configured())
            .map(|e| &e.device)
            .collect()
    }

    /// Feeds one axis sample, returning the new bucket on a transition.
    pub fn sample_axis(&mut self, id: DeviceId, axis: u32, value: i32) -> Option<i8> {
        self.joysticks
            .get_mut(&id)?
            .calibrator
            .sample(axis as usize, value)
    }

    /// Replaces the in-memory mapping of a live device.
    pub fn set_mapping(&mut self, id: DeviceId, mapping: Mapping, source: MappingSource) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        entry.mapping = Some(mapping.with_device(id));
        entry.source = Some(source);
        true
    }

    /// Sets the battery level of every configured joystick with the GUID.
    /// Returns whether any level changed.
    pub fn update_battery(&mut self, guid: &str, level: i8) -> bool {
        let mut changed = false;
        for entry in self.joysticks.values_mut() {
            if !entry.is_configured() || !entry.device.guid.eq_ignore_ascii_case(guid) {
                continue;
            }
            if entry.device.battery_level != level {
                entry.device.battery_level = level;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use padseat_device::{FakeBackend, FakeJoystick, Input, InputKind};
    use padseat_workspace::{Record, RecordKind};
    use tempfile::TempDir;

    use super::*;

    const XBOX: &str = "030000005e0400008e02000010010000";

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(
            dir.path().join("input.yaml"),
            None,
            dir.path().join("last_input.yaml"),
        )
    }

    fn save(store: &mut ConfigStore, name: &str, guid: &str) {
        let device = Device {
            id: 0,
            index: 0,
            name: name.into(),
            guid: guid.into(),
            num_buttons: 12,
            num_hats: 1,
            num_axes: 4,
            path: None,
            battery_level: -1,
            is_wheel: false,
        };
        let mut mapping = Mapping::new();
        mapping.map_input("a", Input::new(0, InputKind::Button, 0, 1, true));
        store.save_mapping(&device, &mapping).unwrap();
    }

    fn registry(dir: &TempDir, backend: FakeBackend) -> DeviceRegistry<FakeBackend> {
        DeviceRegistry::new(backend, store(dir), 8000)
    }

    #[test]
    fn keyboard_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir, FakeBackend::new());
        assert_eq!(reg.keyboard().source, Some(MappingSource::BuiltIn));
        assert!(reg.keyboard().is_configured());
        assert!(!reg.cec().is_configured());
        assert_eq!(reg.configured_count(), 1);
        assert!(!dir.path().join("input.yaml").exists());
    }

    #[test]
    fn rebuild_mirrors_backend_and_resolves_mappings() {
        let dir = TempDir::new().unwrap();
        let mut st = store(&dir);
        save(&mut st, "Xbox 360 Controller", XBOX);
        let mut backend = FakeBackend::new();
        let known = backend.plug(FakeJoystick::new("Xbox 360 Controller", XBOX));
        let unknown = backend.plug(FakeJoystick::new("Mystery Pad", "0300000000000000"));
        let mut reg = DeviceRegistry::new(backend, st, 8000);

        let report = reg.rebuild_all();
        assert_eq!(report.opened, 2);
        assert_eq!(reg.device_count(), 2);
        let entry = reg.get(known).unwrap();
        assert_eq!(entry.source, Some(MappingSource::Store(MatchTier::UserExact)));
        assert_eq!(entry.mapping.as_ref().unwrap().input_by_name("a").unwrap().device, known);
        assert!(!reg.get(unknown).unwrap().is_configured());
        assert_eq!(reg.configured_joysticks().len(), 1);
        assert!(reg.backend().is_open(known));
    }

    #[test]
    fn os_path_becomes_the_sort_path() {
        let dir = TempDir::new().unwrap();
        let mut backend = FakeBackend::new();
        let usb = backend.plug(
            FakeJoystick::new("Pad", XBOX).with_path("USB\\VID_045E&PID_028E&IG_00\\01&00&0000B7234380ED7E"),
        );
        let bare = backend.plug(FakeJoystick::new("Pad", XBOX));
        let mut reg = registry(&dir, backend);
        reg.rebuild_all();

        assert_eq!(
            reg.get(usb).unwrap().device.sort_path(),
            "USB\\VID_045E&PID_028E&IG_00\\0000B7234380ED7E"
        );
        assert_eq!(reg.get(bare).unwrap().device.sort_path(), format!("001@{XBOX}"));
    }

    #[test]
    fn rebuild_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut backend = FakeBackend::new();
        backend.plug(FakeJoystick::new("PadOne", "030000005e04"));
        backend.plug(FakeJoystick::new("PadTwo", "03000000de28"));
        let mut reg = registry(&dir, backend);

        reg.rebuild_all();
        let first: Vec<(DeviceId, String, String)> = reg
            .joysticks()
            .map(|e| (e.device.id, e.device.guid.clone(), e.device.name.clone()))
            .collect();
        reg.rebuild_all();
        let second: Vec<(DeviceId, String, String)> = reg
            .joysticks()
            .map(|e| (e.device.id, e.device.guid.clone(), e.device.name.clone()))
            .collect();
        assert_eq!(first, second);
        assert_eq!(reg.backend().open_handles(), 2);
    }

    #[test]
    fn open_failure_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut backend = FakeBackend::new();
        backend.plug(FakeJoystick::new("Locked", "01").failing());
        let ok = backend.plug(FakeJoystick::new("Fine", "02"));
        let mut reg = registry(&dir, backend);

        let report = reg.rebuild_all();
        assert_eq!(report.failed, vec![0]);
        assert_eq!(reg.device_count(), 1);
        assert!(reg.contains(ok));
    }

    #[test]
    fn enumeration_failure_leaves_no_joysticks() {
        let dir = TempDir::new().unwrap();
        let mut backend = FakeBackend::new();
        backend.plug(FakeJoystick::new("Pad", "01"));
        let mut reg = registry(&dir, backend);
        reg.rebuild_all();
        reg.backend_mut().set_enumerate_error(true);
        let report = reg.rebuild_all();
        assert_eq!(report, RebuildReport::default());
        assert_eq!(reg.device_count(), 0);
        assert_eq!(reg.backend().open_handles(), 0);
    }

    #[test]
    fn controller_db_mapping_is_synthesized_and_saved() {
        let dir = TempDir::new().unwrap();
        let line = format!("{XBOX},Xbox 360 Controller,a:b0,b:b1,back:b6,start:b7,leftx:a0,");
        let mut backend = FakeBackend::new();
        let id = backend.plug(FakeJoystick::new("Xbox 360 Controller", XBOX).with_controller_db(&line));
        let mut reg = registry(&dir, backend);
        reg.rebuild_all();

        let entry = reg.get(id).unwrap();
        assert_eq!(entry.source, Some(MappingSource::Store(MatchTier::ControllerDb)));
        assert!(entry.is_configured());

        let snapshot = reg.store().snapshot();
        let record: &Record = snapshot.user.find("Xbox 360 Controller", XBOX).unwrap();
        assert_eq!(record.kind, RecordKind::Joystick);

        // The next rebuild finds the saved record instead.
        reg.rebuild_all();
        assert_eq!(
            reg.get(id).unwrap().source,
            Some(MappingSource::Store(MatchTier::UserExact))
        );
    }

    #[test]
    fn calibrator_is_seeded_from_rest_and_reset_on_rebuild() {
        let dir = TempDir::new().unwrap();
        let mut backend = FakeBackend::new();
        let id = backend.plug(FakeJoystick::new("Wheel", "01").with_rest(vec![Some(30000), None]));
        let mut reg = registry(&dir, backend);
        reg.rebuild_all();

        assert_eq!(reg.sample_axis(id, 0, 31500), None);
        assert_eq!(reg.sample_axis(id, 0, 2000), Some(-1));
        // Axis 1 has no reported rest, its first sample becomes the rest.
        assert_eq!(reg.sample_axis(id, 1, -20000), None);
        assert_eq!(reg.sample_axis(id, 1, 0), Some(1));

        reg.rebuild_all();
        assert_eq!(reg.get(id).unwrap().calibrator().bucket_of(0), 0);
        assert_eq!(reg.sample_axis(99, 0, 0), None);
    }

    #[test]
    fn battery_updates_match_guid_ignoring_case() {
        let dir = TempDir::new().unwrap();
        let mut st = store(&dir);
        save(&mut st, "Pad", "03000000ABCD");
        let mut backend = FakeBackend::new();
        let id = backend.plug(FakeJoystick::new("Pad", "03000000ABCD"));
        let mut reg = DeviceRegistry::new(backend, st, 8000);
        reg.rebuild_all();

        assert!(reg.update_battery("03000000abcd", 40));
        assert_eq!(reg.get(id).unwrap().device.battery_level, 40);
        assert!(!reg.update_battery("03000000abcd", 40));
        assert!(!reg.update_battery("ffff", 10));
    }
}

use padseat_device::{Device, DeviceId, DeviceKind, CEC_NAME, KEYBOARD_NAME};

use crate::mapping::Mapping;

/// Device class a stored record applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Keyboard,
    Cec,
    Joystick,
}

impl RecordKind {
    pub fn of(device: &Device) -> Self {
        match device.kind() {
            DeviceKind::Keyboard => RecordKind::Keyboard,
            DeviceKind::Cec => RecordKind::Cec,
            _ => RecordKind::Joystick,
        }
    }
}

/// One persisted mapping, keyed by `(guid, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub name: String,
    pub guid: String,
    pub mapping: Mapping,
}

impl Record {
    pub fn for_device(device: &Device, mapping: &Mapping) -> Self {
        let kind = RecordKind::of(device);
        let name = match kind {
            RecordKind::Keyboard => KEYBOARD_NAME.to_string(),
            RecordKind::Cec => CEC_NAME.to_string(),
            RecordKind::Joystick => device.name.clone(),
        };
        Self {
            kind,
            name,
            guid: device.guid.clone(),
            mapping: mapping.clone(),
        }
    }

    pub fn has_key(&self, name: &str, guid: &str) -> bool {
        self.name == name && self.guid.eq_ignore_ascii_case(guid)
    }

    /// Bindings of this record, attached to a live device.
    pub fn mapping_for(&self, device: DeviceId) -> Mapping {
        self.mapping.clone().with_device(device)
    }
}

/// Content of one store file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFile {
    /// Shell commands run after every successful save.
    pub on_finish: Vec<String>,
    pub records: Vec<Record>,
}

impl StoreFile {
    pub fn find(&self, name: &str, guid: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.has_key(name, guid))
    }

    /// Replaces any record with the same key and appends `record`.
    pub fn upsert(&mut self, record: Record) {
        self.records
            .retain(|r| !r.has_key(&record.name, &record.guid));
        self.records.push(record);
    }
}

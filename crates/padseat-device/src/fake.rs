use std::collections::{BTreeSet, VecDeque};

use crate::backend::{JoystickBackend, JoystickInfo, RawEvent};
use crate::error::{Error, Result};
use crate::types::{DeviceId, UNKNOWN_BATTERY};

/// Scripted joystick for [`FakeBackend`].
#[derive(Debug, Clone)]
pub struct FakeJoystick {
    pub name: String,
    pub guid: String,
    pub num_buttons: u32,
    pub num_hats: u32,
    pub rest: Vec<Option<i32>>,
    pub path: Option<String>,
    pub battery_level: i8,
    pub controller_db: Option<String>,
    pub fail_open: bool,
}

impl FakeJoystick {
    pub fn new(name: &str, guid: &str) -> Self {
        Self {
            name: name.to_string(),
            guid: guid.to_string(),
            num_buttons: 12,
            num_hats: 1,
            rest: vec![Some(0); 4],
            path: None,
            battery_level: UNKNOWN_BATTERY,
            controller_db: None,
            fail_open: false,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn with_rest(mut self, rest: Vec<Option<i32>>) -> Self {
        self.rest = rest;
        self
    }

    #[must_use]
    pub fn with_controller_db(mut self, line: &str) -> Self {
        self.controller_db = Some(line.to_string());
        self
    }

    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

/// In-memory backend driven by tests.
///
/// Instance ids are handed out on plug and never reused, the way SDL does it.
#[derive(Debug, Default)]
pub struct FakeBackend {
    plugged: Vec<(DeviceId, FakeJoystick)>,
    opened: BTreeSet<DeviceId>,
    queue: VecDeque<RawEvent>,
    next_id: DeviceId,
    opens: usize,
    enumerate_error: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a joystick and queues its add notification.
    pub fn plug(&mut self, joystick: FakeJoystick) -> DeviceId {
        let id = self.next_id;
        self.next_id += 1;
        self.plugged.push((id, joystick));
        let index = u32::try_from(self.plugged.len() - 1).unwrap_or(u32::MAX);
        self.queue.push_back(RawEvent::DeviceAdded { index });
        id
    }

    /// Disconnects a joystick and queues its remove notification.
    pub fn unplug(&mut self, id: DeviceId) {
        self.plugged.retain(|(pid, _)| *pid != id);
        self.opened.remove(&id);
        self.queue.push_back(RawEvent::DeviceRemoved { id });
    }

    pub fn push(&mut self, event: RawEvent) {
        self.queue.push_back(event);
    }

    pub fn set_failing(&mut self, id: DeviceId, failing: bool) {
        if let Some((_, js)) = self.plugged.iter_mut().find(|(pid, _)| *pid == id) {
            js.fail_open = failing;
        }
    }

    pub fn set_enumerate_error(&mut self, fail: bool) {
        self.enumerate_error = fail;
    }

    pub fn is_open(&self, id: DeviceId) -> bool {
        self.opened.contains(&id)
    }

    pub fn open_handles(&self) -> usize {
        self.opened.len()
    }

    /// Total number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opens
    }

    fn at(&self, index: u32) -> Option<&(DeviceId, FakeJoystick)> {
        self.plugged.get(index as usize)
    }
}

impl JoystickBackend for FakeBackend {
    fn enumerate(&mut self) -> Result<u32> {
        if self.enumerate_error {
            return Err(Error::Backend("enumeration failed".into()));
        }
        Ok(u32::try_from(self.plugged.len()).unwrap_or(u32::MAX))
    }

    fn open(&mut self, index: u32) -> Result<JoystickInfo> {
        let Some((id, js)) = self.at(index).cloned() else {
            return Err(Error::OpenFailed {
                index,
                reason: "no such index".into(),
            });
        };
        if js.fail_open {
            return Err(Error::OpenFailed {
                index,
                reason: "permission denied".into(),
            });
        }
        self.opened.insert(id);
        self.opens += 1;
        Ok(JoystickInfo {
            id,
            index,
            name: js.name,
            guid: js.guid,
            num_buttons: js.num_buttons,
            num_hats: js.num_hats,
            num_axes: u32::try_from(js.rest.len()).unwrap_or(u32::MAX),
            path: js.path,
            battery_level: js.battery_level,
            is_wheel: false,
            controller_db: js.controller_db,
        })
    }

    fn close(&mut self, id: DeviceId) {
        self.opened.remove(&id);
    }

    fn close_all(&mut self) {
        self.opened.clear();
    }

    fn poll(&mut self, out: &mut Vec<RawEvent>) {
        out.extend(self.queue.drain(..));
    }

    fn name_for_index(&self, index: u32) -> Option<String> {
        self.at(index).map(|(_, js)| js.name.clone())
    }

    fn instance_id_for_index(&self, index: u32) -> Option<DeviceId> {
        self.at(index).map(|(id, _)| *id)
    }

    fn axis_rest(&self, id: DeviceId, axis: u32) -> Option<i32> {
        if !self.opened.contains(&id) {
            return None;
        }
        self.plugged
            .iter()
            .find(|(pid, _)| *pid == id)
            .and_then(|(_, js)| js.rest.get(axis as usize).copied().flatten())
    }
}

use padseat_device::{JoystickBackend, RawEvent};

use crate::events::SeatEvent;
use crate::registry::{DeviceRegistry, RebuildReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugState {
    Idle,
    RebuildRequested,
    Rebuilding,
}

/// Reacts to joystick add/remove notifications with a full rebuild.
///
/// Names for notifications are captured before the rebuild, while the
/// enumeration index of an added device still points at it.
#[derive(Debug)]
pub struct HotplugCoordinator {
    state: HotplugState,
    pending: Vec<SeatEvent>,
}

impl Default for HotplugCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl HotplugCoordinator {
    pub fn new() -> Self {
        Self {
            state: HotplugState::Idle,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> HotplugState {
        self.state
    }

    /// Records a hotplug notification. Returns `false` for other events.
    pub fn request<B: JoystickBackend>(&mut self, registry: &DeviceRegistry<B>, event: &RawEvent) -> bool {
        match *event {
            RawEvent::DeviceAdded { index } => {
                let backend = registry.backend();
                let known = backend
                    .instance_id_for_index(index)
                    .is_some_and(|id| registry.contains(id));
                if !known {
                    if let Some(name) = backend.name_for_index(index) {
                        self.pending.push(SeatEvent::Connected {
                            name: name.trim().to_string(),
                        });
                    }
                }
            }
            RawEvent::DeviceRemoved { id } => {
                if let Some(entry) = registry.get(id) {
                    self.pending.push(SeatEvent::Disconnected {
                        name: entry.device.name.trim().to_string(),
                    });
                }
            }
            _ => return false,
        }
        self.state = HotplugState::RebuildRequested;
        true
    }

    /// Runs the requested rebuild, returning its report and the captured
    /// connect/disconnect notifications.
    pub fn run<B: JoystickBackend>(
        &mut self,
        registry: &mut DeviceRegistry<B>,
    ) -> Option<(RebuildReport, Vec<SeatEvent>)> {
        if self.state != HotplugState::RebuildRequested {
            return None;
        }
        self.state = HotplugState::Rebuilding;
        let report = registry.rebuild_all();
        self.state = HotplugState::Idle;
        Some((report, std::mem::take(&mut self.pending)))
    }
}

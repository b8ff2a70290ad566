use std::collections::HashMap;
use std::path::Path;

use evdev::{AbsoluteAxisType, Key};
use log::warn;
use udev::{EventType, MonitorSocket};

use crate::buttons::{GunButton, GunButtons};
use crate::error::GunError;
use crate::source::{AbsRange, GunDescriptor, GunHotplug, GunSample, GunSource};

const GUN_PROPERTY: &str = "ID_INPUT_GUN";
const BORDERS_PROPERTY: &str = "ID_INPUT_GUN_NEED_BORDERS";
const EVENT_NODE_PREFIX: &str = "/dev/input/event";

const BUTTONS: [(Key, GunButton); 8] = [
    (Key::BTN_LEFT, GunButton::Trigger),
    (Key::BTN_RIGHT, GunButton::Secondary),
    (Key::BTN_MIDDLE, GunButton::Start),
    (Key::BTN_1, GunButton::Select),
    (Key::BTN_5, GunButton::Up),
    (Key::BTN_6, GunButton::Down),
    (Key::BTN_7, GunButton::Left),
    (Key::BTN_8, GunButton::Right),
];

/// Guns tagged by udev, read through evdev.
pub struct EvdevGunSource {
    monitor: MonitorSocket,
    devices: HashMap<String, evdev::Device>,
}

fn is_set(device: &udev::Device, property: &str) -> bool {
    device
        .property_value(property)
        .is_some_and(|v| v.to_str() == Some("1"))
}

fn descriptor(device: &udev::Device) -> Option<GunDescriptor> {
    let devpath = device.devnode()?.to_str()?.to_string();
    if !devpath.starts_with(EVENT_NODE_PREFIX) || !is_set(device, GUN_PROPERTY) {
        return None;
    }
    let name = device
        .parent()
        .and_then(|p| p.property_value("NAME").and_then(|n| n.to_str()).map(str::to_string))
        .map(|n| n.trim_matches('"').to_string())
        .unwrap_or_else(|| devpath.clone());
    Some(GunDescriptor {
        name,
        need_borders: is_set(device, BORDERS_PROPERTY),
        devpath,
    })
}

impl EvdevGunSource {
    pub fn new() -> Result<Self, GunError> {
        let monitor = udev::MonitorBuilder::new()?
            .match_subsystem("input")?
            .listen()?;
        Ok(Self {
            monitor,
            devices: HashMap::new(),
        })
    }
}

impl GunSource for EvdevGunSource {
    fn scan(&mut self) -> Vec<GunDescriptor> {
        let scan = || -> std::io::Result<Vec<GunDescriptor>> {
            let mut enumerator = udev::Enumerator::new()?;
            enumerator.match_subsystem("input")?;
            enumerator.match_property(GUN_PROPERTY, "1")?;
            Ok(enumerator
                .scan_devices()?
                .filter_map(|d| descriptor(&d))
                .collect())
        };
        scan().unwrap_or_else(|e| {
            warn!("Unable to enumerate guns: {e}");
            Vec::new()
        })
    }

    fn drain_hotplug(&mut self, out: &mut Vec<GunHotplug>) {
        for event in self.monitor.iter() {
            match event.event_type() {
                EventType::Add => {
                    if let Some(gun) = descriptor(&event.device()) {
                        out.push(GunHotplug::Added(gun));
                    }
                }
                EventType::Remove => {
                    if let Some(path) = event.device().devnode().and_then(Path::to_str) {
                        if path.starts_with(EVENT_NODE_PREFIX) {
                            out.push(GunHotplug::Removed {
                                devpath: path.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn open(&mut self, gun: &GunDescriptor) -> Result<(), GunError> {
        let device = evdev::Device::open(&gun.devpath)?;
        let has_xy = device.supported_absolute_axes().is_some_and(|axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        });
        if !has_xy {
            return Err(GunError::NotAGun(gun.devpath.clone()));
        }
        self.devices.insert(gun.devpath.clone(), device);
        Ok(())
    }

    fn close(&mut self, devpath: &str) {
        self.devices.remove(devpath);
    }

    fn read(&mut self, devpath: &str) -> Option<GunSample> {
        let device = self.devices.get(devpath)?;
        let abs = device.get_abs_state().ok()?;
        let keys = device.get_key_state().ok()?;
        let range = |axis: AbsoluteAxisType| {
            let info = abs[axis.0 as usize];
            AbsRange {
                value: info.value,
                min: info.minimum,
                max: info.maximum,
            }
        };
        let buttons = BUTTONS
            .iter()
            .filter(|(key, _)| keys.contains(*key))
            .map(|(_, button)| *button)
            .collect::<GunButtons>();
        Some(GunSample {
            x: range(AbsoluteAxisType::ABS_X),
            y: range(AbsoluteAxisType::ABS_Y),
            buttons,
        })
    }
}

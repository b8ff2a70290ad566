use std::collections::BTreeMap;

use crossbeam_channel::Receiver;
use thiserror::Error;

use padseat_device::{DeviceId, JoystickBackend, RawEvent};
use padseat_gun::{GunAggregator, GunEvent, GunSource};
use padseat_workspace::{
    ConfigStore, Mapping, Settings, SettingsError, StoreError, StoreEvent, WorkspaceError,
};

use crate::context::{DeviceSummary, InputContext, PlayerSummary, Snapshot};
use crate::events::{Discard, InputEvent, InputSink, SeatEvent};
use crate::hotplug::HotplugCoordinator;
use crate::registry::{DeviceEntry, DeviceRegistry, MappingSource};
use crate::router::route;
use crate::slots::{assign_slots, SlotTable};
use crate::{print_debug, print_info};

#[derive(Debug, Error)]
pub enum SeatError {
    #[error("no device with id {0}")]
    UnknownDevice(DeviceId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("device error: {0}")]
    Device(#[from] padseat_device::Error),
}

/// Index and battery level of the device last seen in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastKnownPlayer {
    pub index: i32,
    pub battery_level: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    /// The backend asked to quit.
    Quit,
}

/// Input subsystem of one machine: devices, guns and player slots.
///
/// All methods run on the polling thread. Other threads read through the
/// [`InputContext`].
pub struct Seat<B: JoystickBackend, G: GunSource> {
    registry: DeviceRegistry<B>,
    guns: GunAggregator<G>,
    hotplug: HotplugCoordinator,
    settings: Settings,
    slots: SlotTable,
    last_known: BTreeMap<usize, LastKnownPlayer>,
    context: InputContext,
    store_events: Receiver<StoreEvent>,
    raw: Vec<RawEvent>,
    gun_events: Vec<GunEvent>,
}

impl<B: JoystickBackend, G: GunSource> Seat<B, G> {
    /// Opens every device present and publishes the first snapshot.
    pub fn new(backend: B, mut store: ConfigStore, guns: G, settings: Settings, context: InputContext) -> Self {
        let store_events = store.subscribe();
        let registry = DeviceRegistry::new(backend, store, settings.input.deadzone);
        let guns = GunAggregator::new(guns, settings.gun);
        let mut seat = Self {
            registry,
            guns,
            hotplug: HotplugCoordinator::new(),
            slots: SlotTable::empty(settings.input.max_players),
            settings,
            last_known: BTreeMap::new(),
            context,
            store_events,
            raw: Vec::new(),
            gun_events: Vec::new(),
        };
        seat.registry.rebuild_all();
        seat.guns.init(&mut seat.gun_events);
        seat.forward_gun_events(&mut Discard);
        seat.recompute();
        seat.announce_devices();
        seat
    }

    pub fn context(&self) -> &InputContext {
        &self.context
    }

    pub fn registry(&self) -> &DeviceRegistry<B> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry<B> {
        &mut self.registry
    }

    pub fn guns(&self) -> &GunAggregator<G> {
        &self.guns
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Drains every pending OS and gun event once.
    pub fn tick(&mut self, sink: &mut impl InputSink) -> TickStatus {
        let mut status = TickStatus::Continue;
        let mut raw = std::mem::take(&mut self.raw);
        self.registry.backend_mut().poll(&mut raw);
        for event in raw.drain(..) {
            match event {
                RawEvent::Quit => status = TickStatus::Quit,
                RawEvent::DeviceAdded { .. } | RawEvent::DeviceRemoved { .. } => {
                    self.on_hotplug(&event);
                }
                RawEvent::MouseMotion { x, y } => self.guns.feed_mouse_motion(x, y),
                RawEvent::MouseButton { button, pressed, x, y } => {
                    self.guns.feed_mouse_motion(x, y);
                    self.guns.feed_mouse_button(button, pressed);
                }
                _ => {
                    if let Some(input) = route(&mut self.registry, &event) {
                        let entry = self.registry.get(input.device);
                        sink.input(&InputEvent {
                            input,
                            mapping: entry.and_then(|e| e.mapping.as_ref()),
                            player: self.slots.slot_of(input.device),
                        });
                    }
                }
            }
        }
        self.raw = raw;

        self.guns.update(&mut self.gun_events);
        self.forward_gun_events(sink);
        self.drain_store_events();
        status
    }

    fn on_hotplug(&mut self, event: &RawEvent) {
        if !self.hotplug.request(&self.registry, event) {
            return;
        }
        let Some((report, notices)) = self.hotplug.run(&mut self.registry) else {
            return;
        };
        for notice in &notices {
            if let Some(text) = notice.toast() {
                print_info!("{text}");
            }
            self.context.emit(notice);
        }
        if !report.failed.is_empty() {
            print_debug!("{} joystick(s) could not be opened", report.failed.len());
        }
        self.recompute();
        self.announce_devices();
    }

    fn forward_gun_events(&mut self, sink: &mut impl InputSink) {
        for event in self.gun_events.drain(..) {
            match event {
                GunEvent::Connected { index, name } => {
                    self.context.emit(&SeatEvent::GunConnected { index, name });
                }
                GunEvent::Disconnected { index, name } => {
                    self.context.emit(&SeatEvent::GunDisconnected { index, name });
                }
                GunEvent::Moved { index, x, y } => sink.gun_moved(index, x, y),
                GunEvent::Button { input, .. } => sink.input(&InputEvent {
                    input,
                    mapping: Some(self.guns.mapping()),
                    player: None,
                }),
            }
        }
    }

    fn drain_store_events(&mut self) {
        while let Ok(StoreEvent::ConfigChanged { name, guid }) = self.store_events.try_recv() {
            self.context.emit(&SeatEvent::ConfigChanged { name, guid });
        }
    }

    fn announce_devices(&self) {
        self.context.emit(&SeatEvent::DevicesChanged {
            devices: self.registry.device_count(),
            configured: self.registry.configured_count(),
        });
    }

    /// Rebuilds every device and recomputes the slots.
    pub fn rebuild(&mut self) {
        self.registry.rebuild_all();
        self.recompute();
        self.announce_devices();
    }

    /// Recomputes player slots and republishes the snapshot.
    pub fn recompute(&mut self) {
        let devices = self.registry.configured_joysticks();
        let slots = assign_slots(&devices, &self.settings.preferences());
        if slots != self.slots {
            for (slot, id) in slots.bound() {
                if let Some(entry) = self.registry.get(id) {
                    print_info!("player {}: {}", slot + 1, entry.device.name);
                }
            }
            self.slots = slots;
            self.context.emit(&SeatEvent::PlayersChanged);
        }
        self.last_known = self
            .players()
            .map(|(slot, entry)| {
                (
                    slot,
                    LastKnownPlayer {
                        index: entry.device.index,
                        battery_level: entry.device.battery_level,
                    },
                )
            })
            .collect();
        self.context.publish(self.snapshot());
    }

    fn players(&self) -> impl Iterator<Item = (usize, &DeviceEntry)> {
        self.slots
            .bound()
            .filter_map(|(slot, id)| self.registry.get(id).map(|entry| (slot, entry)))
    }

    fn snapshot(&self) -> Snapshot {
        let devices = self
            .registry
            .entries()
            .map(|entry| DeviceSummary {
                id: entry.device.id,
                index: entry.device.index,
                name: entry.device.name.clone(),
                guid: entry.device.guid.clone(),
                sort_path: entry.device.sort_path(),
                configured: entry.is_configured(),
                source: entry.source.map(|s| s.to_string()),
                battery_level: entry.device.battery_level,
            })
            .collect();
        let mut players = vec![None; self.slots.len()];
        for (slot, entry) in self.players() {
            let d = &entry.device;
            players[slot] = Some(PlayerSummary {
                slot: u32::try_from(slot).unwrap_or(u32::MAX),
                device_id: d.id,
                index: d.index,
                name: d.name.clone(),
                guid: d.guid.clone(),
                num_buttons: d.num_buttons,
                num_hats: d.num_hats,
                num_axes: d.num_axes,
                battery_level: d.battery_level,
            });
        }
        Snapshot {
            devices,
            configured: self.registry.configured_count(),
            players,
        }
    }

    /// Persists a mapping for a live device and applies it at once.
    pub fn save_mapping(&mut self, id: DeviceId, mapping: &Mapping) -> Result<(), SeatError> {
        let device = self
            .registry
            .get(id)
            .map(|e| e.device.clone())
            .ok_or(SeatError::UnknownDevice(id))?;
        self.registry.store_mut().save_mapping(&device, mapping)?;
        self.registry.set_mapping(id, mapping.clone(), MappingSource::Saved);
        self.recompute();
        self.drain_store_events();
        Ok(())
    }

    /// Applies a battery level reported for a GUID.
    pub fn update_battery(&mut self, guid: &str, level: i8) -> bool {
        let changed = self.registry.update_battery(guid, level);
        if changed {
            self.recompute();
        }
        changed
    }

    /// Applies new settings. A deadzone change rebuilds every device.
    pub fn apply_settings(&mut self, settings: Settings) {
        if settings == self.settings {
            return;
        }
        let rebuild = settings.input.deadzone != self.settings.input.deadzone;
        self.guns.apply_settings(settings.gun, &mut self.gun_events);
        self.settings = settings;
        self.forward_gun_events(&mut Discard);
        if rebuild {
            self.registry.set_deadzone(self.settings.input.deadzone);
            self.rebuild();
        } else {
            self.recompute();
        }
    }

    /// Configured joysticks in player slot order.
    pub fn configured_in_player_order(&self) -> Vec<&DeviceEntry> {
        self.players().map(|(_, entry)| entry).collect()
    }

    pub fn last_known_players(&self) -> &BTreeMap<usize, LastKnownPlayer> {
        &self.last_known
    }

    /// Per-player argument groups for launching an emulator.
    pub fn emulator_args(&self) -> String {
        let mut out = String::new();
        for (slot, entry) in self.players() {
            let p = slot + 1;
            let d = &entry.device;
            out.push_str(&format!(
                "-p{p}index {} -p{p}guid {} -p{p}name \"{}\" -p{p}nbbuttons {} -p{p}nbhats {} -p{p}nbaxes {} ",
                d.index, d.guid, d.name, d.num_buttons, d.num_hats, d.num_axes
            ));
        }
        out
    }
}

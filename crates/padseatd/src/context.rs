use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bitcode::{Decode, Encode};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::events::SeatEvent;

/// Published view of one device.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DeviceSummary {
    pub id: i32,
    pub index: i32,
    pub name: String,
    pub guid: String,
    pub sort_path: String,
    pub configured: bool,
    /// How the mapping was found, for display.
    pub source: Option<String>,
    pub battery_level: i8,
}

/// Published view of one bound player slot.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PlayerSummary {
    /// 0-based slot.
    pub slot: u32,
    pub device_id: i32,
    pub index: i32,
    pub name: String,
    pub guid: String,
    pub num_buttons: u32,
    pub num_hats: u32,
    pub num_axes: u32,
    pub battery_level: i8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub devices: Vec<DeviceSummary>,
    pub configured: usize,
    /// One entry per slot, `None` where nobody sits.
    pub players: Vec<Option<PlayerSummary>>,
}

#[derive(Default)]
struct Shared {
    snapshot: Mutex<Snapshot>,
    subscribers: Mutex<Vec<Sender<SeatEvent>>>,
}

/// State shared between the input loop and auxiliary readers.
///
/// Only the loop publishes; readers take the lock for a copy and let go.
#[derive(Clone, Default)]
pub struct InputContext {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        *lock(&self.shared.snapshot) = snapshot;
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared.snapshot).clone()
    }

    pub fn devices(&self) -> Vec<DeviceSummary> {
        lock(&self.shared.snapshot).devices.clone()
    }

    pub fn players(&self) -> Vec<Option<PlayerSummary>> {
        lock(&self.shared.snapshot).players.clone()
    }

    /// Device sitting in a 0-based slot.
    pub fn player(&self, slot: usize) -> Option<PlayerSummary> {
        lock(&self.shared.snapshot)
            .players
            .get(slot)
            .cloned()
            .flatten()
    }

    pub fn configured_count(&self) -> usize {
        lock(&self.shared.snapshot).configured
    }

    pub fn subscribe(&self) -> Receiver<SeatEvent> {
        let (tx, rx) = unbounded();
        lock(&self.shared.subscribers).push(tx);
        rx
    }

    /// Sends an event to every live subscriber, dropping closed ones.
    pub fn emit(&self, event: &SeatEvent) {
        lock(&self.shared.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

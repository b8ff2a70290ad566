use padseat_device::{normalize_os_path, Device, DeviceId};
use padseat_workspace::PlayerPreference;

/// Which device sits in which player slot.
///
/// Bound slots are always contiguous from slot 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotTable {
    slots: Vec<Option<DeviceId>>,
}

impl SlotTable {
    pub fn empty(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<DeviceId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, device: DeviceId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(device))
    }

    /// `(slot, device)` for every bound slot, in slot order.
    pub fn bound(&self) -> impl Iterator<Item = (usize, DeviceId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, id)| id.map(|id| (slot, id)))
    }

    pub fn as_slice(&self) -> &[Option<DeviceId>] {
        &self.slots
    }
}

struct Candidate<'a> {
    sort_path: String,
    device: &'a Device,
}

fn take(pool: &mut Vec<Candidate<'_>>, pred: impl Fn(&Candidate<'_>) -> bool) -> Option<DeviceId> {
    let pos = pool.iter().position(pred)?;
    Some(pool.remove(pos).device.id)
}

/// Seats configured devices into player slots.
///
/// `preferences` has one entry per slot. Preferences are honored in
/// order of strength: exact sort path, then name and GUID, then name
/// alone. Remaining slots take the leftover devices in sort path order,
/// and holes are closed by pulling later bindings down. Absent preferred
/// devices are skipped.
pub fn assign_slots(devices: &[&Device], preferences: &[PlayerPreference]) -> SlotTable {
    let mut pool: Vec<Candidate<'_>> = devices
        .iter()
        .map(|&device| Candidate {
            sort_path: device.sort_path(),
            device,
        })
        .collect();
    pool.sort_by(|a, b| {
        a.sort_path
            .cmp(&b.sort_path)
            .then_with(|| a.device.id.cmp(&b.device.id))
    });

    let mut slots: Vec<Option<DeviceId>> = vec![None; preferences.len()];

    for (slot, pref) in preferences.iter().enumerate() {
        let Some(path) = pref.path.as_deref() else {
            continue;
        };
        let path = normalize_os_path(path);
        slots[slot] = take(&mut pool, |c| c.sort_path == path);
    }

    for (slot, pref) in preferences.iter().enumerate() {
        if slots[slot].is_some() {
            continue;
        }
        let (Some(name), Some(guid)) = (pref.name.as_deref(), pref.guid.as_deref()) else {
            continue;
        };
        slots[slot] = take(&mut pool, |c| c.device.name == name && c.device.guid == guid);
    }

    for (slot, pref) in preferences.iter().enumerate() {
        if slots[slot].is_some() {
            continue;
        }
        let Some(name) = pref.name.as_deref() else {
            continue;
        };
        slots[slot] = take(&mut pool, |c| c.device.name == name);
    }

    let mut rest = pool.into_iter();
    for slot in slots.iter_mut().filter(|s| s.is_none()) {
        match rest.next() {
            Some(c) => *slot = Some(c.device.id),
            None => break,
        }
    }

    for slot in 0..slots.len() {
        if slots[slot].is_some() {
            continue;
        }
        if let Some(from) = (slot + 1..slots.len()).rev().find(|&i| slots[i].is_some()) {
            slots[slot] = slots[from].take();
        }
    }

    SlotTable { slots }
}

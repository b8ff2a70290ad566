use std::fmt;

use crate::record::{Record, RecordKind, StoreFile};

/// Which lookup found a device's mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    UserExact,
    SharedExact,
    UserLegacy,
    SharedLegacy,
    UserGuid,
    SharedGuid,
    UserName,
    SharedName,
    /// Synthesized from the controller database.
    ControllerDb,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchTier::UserExact => "user store, exact",
            MatchTier::SharedExact => "shared store, exact",
            MatchTier::UserLegacy => "user store, legacy guid",
            MatchTier::SharedLegacy => "shared store, legacy guid",
            MatchTier::UserGuid => "user store, guid only",
            MatchTier::SharedGuid => "shared store, guid only",
            MatchTier::UserName => "user store, name only",
            MatchTier::SharedName => "shared store, name only",
            MatchTier::ControllerDb => "controller database",
        })
    }
}

/// Zeroes hex digits 8..16 (bytes 4..8) of a GUID.
///
/// Some driver library versions encode a checksum there. Returns `None`
/// for GUIDs too short to carry one.
pub fn legacy_guid(guid: &str) -> Option<String> {
    if guid.len() < 16 || !guid.is_ascii() {
        return None;
    }
    let mut out = String::with_capacity(guid.len());
    out.push_str(&guid[..8]);
    out.push_str("00000000");
    out.push_str(&guid[16..]);
    Some(out.to_ascii_lowercase())
}

/// Both mapping stores, read once per lookup batch.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub user: StoreFile,
    pub shared: StoreFile,
}

/// Tiered lookup of a stored mapping for a device.
pub struct MatchingResolver<'a> {
    snapshot: &'a StoreSnapshot,
}

impl<'a> MatchingResolver<'a> {
    pub fn new(snapshot: &'a StoreSnapshot) -> Self {
        Self { snapshot }
    }

    /// Finds the record for a device, trying each tier in order.
    pub fn resolve(&self, kind: RecordKind, name: &str, guid: &str) -> Option<(&'a Record, MatchTier)> {
        let user: &'a [Record] = &self.snapshot.user.records;
        let shared: &'a [Record] = &self.snapshot.shared.records;
        let candidates = |records: &'a [Record]| records.iter().filter(move |r| r.kind == kind);

        let exact = |r: &&Record| r.has_key(name, guid);
        if let Some(r) = candidates(user).find(exact) {
            return Some((r, MatchTier::UserExact));
        }
        if let Some(r) = candidates(shared).find(exact) {
            return Some((r, MatchTier::SharedExact));
        }

        if let Some(legacy) = legacy_guid(guid) {
            let same_legacy = |r: &&Record| {
                r.name == name && legacy_guid(&r.guid).as_deref() == Some(legacy.as_str())
            };
            if let Some(r) = candidates(user).find(same_legacy) {
                return Some((r, MatchTier::UserLegacy));
            }
            if let Some(r) = candidates(shared).find(same_legacy) {
                return Some((r, MatchTier::SharedLegacy));
            }
        }

        let same_guid = |r: &&Record| r.guid.eq_ignore_ascii_case(guid);
        if let Some(r) = candidates(user).find(same_guid) {
            return Some((r, MatchTier::UserGuid));
        }
        if let Some(r) = candidates(shared).find(same_guid) {
            return Some((r, MatchTier::SharedGuid));
        }

        let same_name = |r: &&Record| r.name == name;
        if let Some(r) = candidates(user).find(same_name) {
            return Some((r, MatchTier::UserName));
        }
        candidates(shared)
            .find(same_name)
            .map(|r| (r, MatchTier::SharedName))
    }
}

#[cfg(test)]
mod tests {
    use padseat_device::{Input, InputKind};

    use super::*;
    use crate::mapping::Mapping;

    fn record(name: &str, guid: &str, button: i32) -> Record {
        let mut mapping = Mapping::new();
        mapping.map_input("a", Input::new(0, InputKind::Button, button, 1, true));
        Record {
            kind: RecordKind::Joystick,
            name: name.into(),
            guid: guid.into(),
            mapping,
        }
    }

    fn snapshot(user: Vec<Record>, shared: Vec<Record>) -> StoreSnapshot {
        StoreSnapshot {
            user: StoreFile {
                on_finish: Vec::new(),
                records: user,
            },
            shared: StoreFile {
                on_finish: Vec::new(),
                records: shared,
            },
        }
    }

    fn tier(snapshot: &StoreSnapshot, name: &str, guid: &str) -> Option<(i32, MatchTier)> {
        MatchingResolver::new(snapshot)
            .resolve(RecordKind::Joystick, name, guid)
            .map(|(r, t)| (r.mapping.input_by_name("a").map_or(-1, |i| i.id), t))
    }

    const GUID: &str = "03000000de2800001142000010010000";
    const GUID_CRC: &str = "03000000ab1200001142000010010000";

    #[test]
    fn legacy_guid_zeroes_checksum_bytes() {
        assert_eq!(
            legacy_guid("0300ABCDde2800001142000010010000").as_deref(),
            Some("0300abcd000000001142000010010000")
        );
        assert_eq!(legacy_guid("-1"), None);
    }

    #[test]
    fn user_exact_beats_shared_exact() {
        let s = snapshot(vec![record("Pad", GUID, 1)], vec![record("Pad", GUID, 2)]);
        assert_eq!(tier(&s, "Pad", GUID), Some((1, MatchTier::UserExact)));
    }

    #[test]
    fn shared_exact_beats_user_guid_only() {
        let s = snapshot(vec![record("Other", GUID, 1)], vec![record("Pad", GUID, 2)]);
        assert_eq!(tier(&s, "Pad", GUID), Some((2, MatchTier::SharedExact)));
    }

    #[test]
    fn legacy_retry_requires_same_name() {
        let s = snapshot(vec![record("Pad", GUID_CRC, 1)], Vec::new());
        assert_eq!(tier(&s, "Pad", GUID), Some((1, MatchTier::UserLegacy)));
        assert_eq!(tier(&s, "Other", GUID), None);
    }

    #[test]
    fn guid_only_beats_name_only() {
        let s = snapshot(
            vec![record("Renamed", GUID, 1), record("Pad", "0500000000000000", 2)],
            Vec::new(),
        );
        assert_eq!(tier(&s, "Pad", GUID), Some((1, MatchTier::UserGuid)));
    }

    #[test]
    fn shared_guid_beats_user_name() {
        let s = snapshot(
            vec![record("Pad", "0500000000000000", 1)],
            vec![record("Renamed", GUID, 2)],
        );
        assert_eq!(tier(&s, "Pad", GUID), Some((2, MatchTier::SharedGuid)));
    }

    #[test]
    fn name_only_is_last_resort() {
        let s = snapshot(Vec::new(), vec![record("Pad", "0500000000000000", 3)]);
        assert_eq!(tier(&s, "Pad", GUID), Some((3, MatchTier::SharedName)));
        assert_eq!(tier(&s, "Nobody", GUID), None);
    }

    #[test]
    fn records_of_other_kinds_are_ignored() {
        let mut keyboard = record("Pad", GUID, 1);
        keyboard.kind = RecordKind::Keyboard;
        let s = snapshot(vec![keyboard], Vec::new());
        assert_eq!(tier(&s, "Pad", GUID), None);
    }

    #[test]
    fn empty_snapshot_resolves_nothing() {
        assert_eq!(tier(&StoreSnapshot::default(), "Pad", GUID), None);
    }
}

use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, Criterion};
use padseat_device::{Device, UNKNOWN_BATTERY};
use padseat_workspace::PlayerPreference;
use padseatd::assign_slots;

fn pad(id: i32, name: &str, guid: &str, path: Option<&str>) -> Device {
    Device {
        id,
        index: id,
        name: name.to_string(),
        guid: guid.to_string(),
        num_buttons: 12,
        num_hats: 1,
        num_axes: 6,
        path: path.map(str::to_string),
        battery_level: UNKNOWN_BATTERY,
        is_wheel: false,
    }
}

fn devices() -> Vec<Device> {
    (0..8)
        .map(|i| {
            let path = format!("USB\\VID_045E&PID_02FF&IG_0{i}\\01&00&0000B7234380ED7{i}");
            pad(i, &format!("Pad {}", i % 3), &format!("03000000de28000011420000100{i}0000"), Some(&path))
        })
        .collect()
}

pub fn bench_assign_without_preferences(c: &mut Criterion) {
    let devices = devices();
    let refs: Vec<&Device> = devices.iter().collect();
    let prefs = vec![PlayerPreference::default(); 8];
    c.bench_function("slots_assign_fill_only", |b| {
        b.iter(|| {
            let table = assign_slots(black_box(&refs), black_box(&prefs));
            black_box(table);
        })
    });
}

pub fn bench_assign_mixed_preferences(c: &mut Criterion) {
    let devices = devices();
    let refs: Vec<&Device> = devices.iter().collect();
    let mut prefs = vec![PlayerPreference::default(); 8];
    prefs[0] = PlayerPreference::for_device(&devices[5]);
    prefs[2] = PlayerPreference::new(None, Some("Pad 1".into()), Some(devices[4].guid.clone()));
    prefs[5] = PlayerPreference::new(None, Some("Pad 2".into()), None);
    prefs[7] = PlayerPreference::new(Some("USB\\gone".into()), Some("Gone".into()), None);
    c.bench_function("slots_assign_mixed_preferences", |b| {
        b.iter(|| {
            let table = assign_slots(black_box(&refs), black_box(&prefs));
            black_box(table);
        })
    });
}

criterion_group!(benches, bench_assign_without_preferences, bench_assign_mixed_preferences);
criterion_main!(benches);

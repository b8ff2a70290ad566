mod aggregator;
mod buttons;
mod error;
#[cfg(all(target_os = "linux", feature = "evdev-guns"))]
mod evdev_source;
mod source;

pub use aggregator::{gun_mapping, Gun, GunAggregator, GunEvent};
pub use buttons::{GunButton, GunButtons};
pub use error::GunError;
#[cfg(all(target_os = "linux", feature = "evdev-guns"))]
pub use evdev_source::EvdevGunSource;
pub use source::{AbsRange, GunDescriptor, GunHotplug, GunSample, GunSource, NoGuns};

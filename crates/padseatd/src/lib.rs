pub mod api;
mod context;
mod events;
mod hotplug;
pub mod logging;
mod registry;
mod router;
mod seat;
mod slots;

pub use context::{DeviceSummary, InputContext, PlayerSummary, Snapshot};
pub use events::{Discard, InputEvent, InputSink, SeatEvent};
pub use hotplug::{HotplugCoordinator, HotplugState};
pub use registry::{DeviceEntry, DeviceRegistry, MappingSource, RebuildReport};
pub use router::route;
pub use seat::{LastKnownPlayer, Seat, SeatError, TickStatus};
pub use slots::{assign_slots, SlotTable};

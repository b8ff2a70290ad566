use bitflags::bitflags;

/// One gun button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GunButton {
    Trigger = 0,
    Secondary = 1,
    Start = 2,
    Select = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl GunButton {
    pub const ALL: [GunButton; 8] = [
        GunButton::Trigger,
        GunButton::Secondary,
        GunButton::Start,
        GunButton::Select,
        GunButton::Up,
        GunButton::Down,
        GunButton::Left,
        GunButton::Right,
    ];

    /// Raw button id used in emitted inputs.
    pub fn id(self) -> i32 {
        i32::from(self as u8)
    }
}

bitflags! {
    /// Set of pressed gun buttons.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct GunButtons: u8 {
        const TRIGGER = 1 << GunButton::Trigger as u8;
        const SECONDARY = 1 << GunButton::Secondary as u8;
        const START = 1 << GunButton::Start as u8;
        const SELECT = 1 << GunButton::Select as u8;
        const UP = 1 << GunButton::Up as u8;
        const DOWN = 1 << GunButton::Down as u8;
        const LEFT = 1 << GunButton::Left as u8;
        const RIGHT = 1 << GunButton::Right as u8;
    }
}

impl From<GunButton> for GunButtons {
    fn from(button: GunButton) -> Self {
        Self::from_bits_truncate(1 << button as u8)
    }
}

impl FromIterator<GunButton> for GunButtons {
    fn from_iter<I: IntoIterator<Item = GunButton>>(iter: I) -> Self {
        iter.into_iter().map(GunButtons::from).collect()
    }
}

impl GunButtons {
    /// Buttons whose state differs from `previous`, with their new state.
    pub fn changes(self, previous: GunButtons) -> impl Iterator<Item = (GunButton, bool)> {
        let diff = self.symmetric_difference(previous);
        GunButton::ALL
            .into_iter()
            .filter(move |&b| diff.contains(b.into()))
            .map(move |b| (b, self.contains(b.into())))
    }
}

use serde::{Deserialize, Serialize};

/// Flow color. `None` marks a cell that is not an endpoint.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Color {
    #[default]
    None = 0,
    Red,
    Blue,
    Green,
    Yellow,
    Magenta,
    Cyan,
    Orange,
    Purple,
}

impl Color {
    /// Every color that can identify a flow, in id order.
    pub const FLOWS: [Color; 8] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Orange,
        Color::Purple,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        use Color::*;
        Some(match id {
            0 => None,
            1 => Red,
            2 => Blue,
            3 => Green,
            4 => Yellow,
            5 => Magenta,
            6 => Cyan,
            7 => Orange,
            8 => Purple,
            _ => return Option::None,
        })
    }

    pub const fn is_flow(self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn css(self) -> &'static str {
        use Color::*;
        match self {
            None => "#FFFFFF",
            Red => "#FF0000",
            Blue => "#0000FF",
            Green => "#00FF00",
            Yellow => "#FFFF00",
            Magenta => "#FF00FF",
            Cyan => "#00FFFF",
            Orange => "#FFA500",
            Purple => "#800080",
        }
    }
}

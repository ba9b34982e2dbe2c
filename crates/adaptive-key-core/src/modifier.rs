// Adaptive Key Modifier System
// HID modifier bits and the modifier-set bitmask carried by every key identity

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// A single HID keyboard modifier.
///
/// The discriminant is the bit the modifier occupies in the HID modifier byte.
/// Names parse from both the long form (`LSHIFT`) and the wrapper form used in
/// key expressions (`LS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Modifier {
    #[strum(to_string = "LCTRL", serialize = "LC", serialize = "LCTL")]
    LeftCtrl = 0x01,
    #[strum(to_string = "LSHIFT", serialize = "LS", serialize = "LSHFT")]
    LeftShift = 0x02,
    #[strum(to_string = "LALT", serialize = "LA")]
    LeftAlt = 0x04,
    #[strum(to_string = "LGUI", serialize = "LG", serialize = "LMETA")]
    LeftGui = 0x08,
    #[strum(to_string = "RCTRL", serialize = "RC", serialize = "RCTL")]
    RightCtrl = 0x10,
    #[strum(to_string = "RSHIFT", serialize = "RS", serialize = "RSHFT")]
    RightShift = 0x20,
    #[strum(to_string = "RALT", serialize = "RA")]
    RightAlt = 0x40,
    #[strum(to_string = "RGUI", serialize = "RG", serialize = "RMETA")]
    RightGui = 0x80,
}

impl Modifier {
    /// The bit this modifier occupies in the HID modifier byte
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Short wrapper name, as written in key expressions like `LS(A)`
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Modifier::LeftCtrl => "LC",
            Modifier::LeftShift => "LS",
            Modifier::LeftAlt => "LA",
            Modifier::LeftGui => "LG",
            Modifier::RightCtrl => "RC",
            Modifier::RightShift => "RS",
            Modifier::RightAlt => "RA",
            Modifier::RightGui => "RG",
        }
    }
}

/// Set of active modifiers, stored as the raw HID modifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);

    /// Create a modifier set from its raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Modifiers(bits)
    }

    /// Raw HID modifier byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every modifier in `other` is also set in `self`
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, modifier: Modifier) -> Self {
        Modifiers(self.0 | modifier.bit())
    }

    /// Iterate the individual modifiers present, in bit order
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::iter().filter(move |m| self.0 & m.bit() != 0)
    }
}

impl From<Modifier> for Modifiers {
    fn from(modifier: Modifier) -> Self {
        Modifiers(modifier.bit())
    }
}

impl From<u8> for Modifiers {
    fn from(bits: u8) -> Self {
        Modifiers(bits)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;

    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|m| m.to_string()).collect();
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

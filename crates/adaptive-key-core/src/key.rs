// Adaptive Key Identity
// HID usage + modifier identity of a key, its packed encoding and matching rules

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::modifier::{Modifier, Modifiers};

/// HID usage page for the keyboard/keypad page
pub const HID_USAGE_KEY: u8 = 0x07;

/// HID usage page for consumer controls
pub const HID_USAGE_CONSUMER: u8 = 0x0C;

/// Known usage names: (name, page, id). The first entry for a usage is its
/// canonical display name, later ones are aliases.
const USAGE_NAMES: &[(&str, u8, u16)] = &[
    ("A", HID_USAGE_KEY, 0x04),
    ("B", HID_USAGE_KEY, 0x05),
    ("C", HID_USAGE_KEY, 0x06),
    ("D", HID_USAGE_KEY, 0x07),
    ("E", HID_USAGE_KEY, 0x08),
    ("F", HID_USAGE_KEY, 0x09),
    ("G", HID_USAGE_KEY, 0x0A),
    ("H", HID_USAGE_KEY, 0x0B),
    ("I", HID_USAGE_KEY, 0x0C),
    ("J", HID_USAGE_KEY, 0x0D),
    ("K", HID_USAGE_KEY, 0x0E),
    ("L", HID_USAGE_KEY, 0x0F),
    ("M", HID_USAGE_KEY, 0x10),
    ("N", HID_USAGE_KEY, 0x11),
    ("O", HID_USAGE_KEY, 0x12),
    ("P", HID_USAGE_KEY, 0x13),
    ("Q", HID_USAGE_KEY, 0x14),
    ("R", HID_USAGE_KEY, 0x15),
    ("S", HID_USAGE_KEY, 0x16),
    ("T", HID_USAGE_KEY, 0x17),
    ("U", HID_USAGE_KEY, 0x18),
    ("V", HID_USAGE_KEY, 0x19),
    ("W", HID_USAGE_KEY, 0x1A),
    ("X", HID_USAGE_KEY, 0x1B),
    ("Y", HID_USAGE_KEY, 0x1C),
    ("Z", HID_USAGE_KEY, 0x1D),
    ("N1", HID_USAGE_KEY, 0x1E),
    ("N2", HID_USAGE_KEY, 0x1F),
    ("N3", HID_USAGE_KEY, 0x20),
    ("N4", HID_USAGE_KEY, 0x21),
    ("N5", HID_USAGE_KEY, 0x22),
    ("N6", HID_USAGE_KEY, 0x23),
    ("N7", HID_USAGE_KEY, 0x24),
    ("N8", HID_USAGE_KEY, 0x25),
    ("N9", HID_USAGE_KEY, 0x26),
    ("N0", HID_USAGE_KEY, 0x27),
    ("RET", HID_USAGE_KEY, 0x28),
    ("ENTER", HID_USAGE_KEY, 0x28),
    ("ESC", HID_USAGE_KEY, 0x29),
    ("ESCAPE", HID_USAGE_KEY, 0x29),
    ("BSPC", HID_USAGE_KEY, 0x2A),
    ("BACKSPACE", HID_USAGE_KEY, 0x2A),
    ("TAB", HID_USAGE_KEY, 0x2B),
    ("SPACE", HID_USAGE_KEY, 0x2C),
    ("MINUS", HID_USAGE_KEY, 0x2D),
    ("EQUAL", HID_USAGE_KEY, 0x2E),
    ("LBKT", HID_USAGE_KEY, 0x2F),
    ("RBKT", HID_USAGE_KEY, 0x30),
    ("BSLH", HID_USAGE_KEY, 0x31),
    ("NUHS", HID_USAGE_KEY, 0x32),
    ("SEMI", HID_USAGE_KEY, 0x33),
    ("SEMICOLON", HID_USAGE_KEY, 0x33),
    ("SQT", HID_USAGE_KEY, 0x34),
    ("APOSTROPHE", HID_USAGE_KEY, 0x34),
    ("GRAVE", HID_USAGE_KEY, 0x35),
    ("COMMA", HID_USAGE_KEY, 0x36),
    ("DOT", HID_USAGE_KEY, 0x37),
    ("PERIOD", HID_USAGE_KEY, 0x37),
    ("FSLH", HID_USAGE_KEY, 0x38),
    ("SLASH", HID_USAGE_KEY, 0x38),
    ("CAPS", HID_USAGE_KEY, 0x39),
    ("F1", HID_USAGE_KEY, 0x3A),
    ("F2", HID_USAGE_KEY, 0x3B),
    ("F3", HID_USAGE_KEY, 0x3C),
    ("F4", HID_USAGE_KEY, 0x3D),
    ("F5", HID_USAGE_KEY, 0x3E),
    ("F6", HID_USAGE_KEY, 0x3F),
    ("F7", HID_USAGE_KEY, 0x40),
    ("F8", HID_USAGE_KEY, 0x41),
    ("F9", HID_USAGE_KEY, 0x42),
    ("F10", HID_USAGE_KEY, 0x43),
    ("F11", HID_USAGE_KEY, 0x44),
    ("F12", HID_USAGE_KEY, 0x45),
    ("PSCRN", HID_USAGE_KEY, 0x46),
    ("SLCK", HID_USAGE_KEY, 0x47),
    ("PAUSE", HID_USAGE_KEY, 0x48),
    ("INS", HID_USAGE_KEY, 0x49),
    ("HOME", HID_USAGE_KEY, 0x4A),
    ("PG_UP", HID_USAGE_KEY, 0x4B),
    ("DEL", HID_USAGE_KEY, 0x4C),
    ("DELETE", HID_USAGE_KEY, 0x4C),
    ("END", HID_USAGE_KEY, 0x4D),
    ("PG_DN", HID_USAGE_KEY, 0x4E),
    ("RIGHT", HID_USAGE_KEY, 0x4F),
    ("LEFT", HID_USAGE_KEY, 0x50),
    ("DOWN", HID_USAGE_KEY, 0x51),
    ("UP", HID_USAGE_KEY, 0x52),
    ("NON_US_BSLH", HID_USAGE_KEY, 0x64),
    ("LCTRL", HID_USAGE_KEY, 0xE0),
    ("LSHIFT", HID_USAGE_KEY, 0xE1),
    ("LALT", HID_USAGE_KEY, 0xE2),
    ("LGUI", HID_USAGE_KEY, 0xE3),
    ("RCTRL", HID_USAGE_KEY, 0xE4),
    ("RSHIFT", HID_USAGE_KEY, 0xE5),
    ("RALT", HID_USAGE_KEY, 0xE6),
    ("RGUI", HID_USAGE_KEY, 0xE7),
    ("C_PP", HID_USAGE_CONSUMER, 0xCD),
    ("C_MUTE", HID_USAGE_CONSUMER, 0xE2),
    ("C_VOL_UP", HID_USAGE_CONSUMER, 0xE9),
    ("C_VOL_DN", HID_USAGE_CONSUMER, 0xEA),
];

/// Errors produced when parsing a key expression such as `LS(RA(E))`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("key expression cannot be empty")]
    Empty,

    #[error("unknown key name: '{0}'")]
    UnknownKey(String),

    #[error("unknown modifier function: '{0}'")]
    UnknownModifier(String),

    #[error("invalid numeric usage: '{0}'")]
    InvalidUsage(String),
}

/// Identifies a key by HID usage and the modifiers active alongside it.
///
/// The value `page == 0` is reserved as the "no key observed" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyIdentity {
    pub modifiers: Modifiers,
    pub page: u8,
    pub id: u16,
}

impl KeyIdentity {
    /// The "no key observed" sentinel
    pub const NONE: KeyIdentity = KeyIdentity {
        modifiers: Modifiers::NONE,
        page: 0,
        id: 0,
    };

    pub const fn new(page: u8, id: u16) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            page,
            id,
        }
    }

    /// Key on the keyboard usage page without modifiers
    pub const fn keyboard(id: u16) -> Self {
        Self::new(HID_USAGE_KEY, id)
    }

    pub fn with_modifiers(mut self, modifiers: impl Into<Modifiers>) -> Self {
        self.modifiers = modifiers.into();
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers = self.modifiers.with(modifier);
        self
    }

    /// True for the "no key observed" sentinel (page 0)
    pub const fn is_none(&self) -> bool {
        self.page == 0
    }

    /// Pack into the firmware key parameter layout:
    /// modifiers in bits 24..32, page in bits 16..24, usage id in bits 0..16.
    pub const fn encode(&self) -> u32 {
        ((self.modifiers.bits() as u32) << 24) | ((self.page as u32) << 16) | self.id as u32
    }

    /// Unpack a firmware key parameter
    pub const fn decode(param: u32) -> Self {
        Self {
            modifiers: Modifiers::from_bits((param >> 24) as u8),
            page: ((param >> 16) & 0xFF) as u8,
            id: (param & 0xFFFF) as u16,
        }
    }

    /// Match `observed` against this key taken as a trigger candidate.
    ///
    /// Page and id must be equal. With `strict` the modifiers must be equal too;
    /// otherwise every modifier of the candidate must be present in `observed`
    /// and extra observed modifiers are allowed.
    pub fn matches(&self, observed: &KeyIdentity, strict: bool) -> bool {
        matches(self, observed, strict)
    }

    /// Canonical name of the usage, ignoring modifiers
    pub fn usage_name(&self) -> Option<&'static str> {
        USAGE_NAMES
            .iter()
            .find(|(_, page, id)| *page == self.page && *id == self.id)
            .map(|(name, _, _)| *name)
    }
}

/// Candidate/observed key comparison shared by trigger and dead-key lookups.
pub fn matches(candidate: &KeyIdentity, observed: &KeyIdentity, strict: bool) -> bool {
    if strict && candidate.modifiers != observed.modifiers {
        return false;
    }

    if !strict && !observed.modifiers.contains(candidate.modifiers) {
        return false;
    }

    candidate.page == observed.page && candidate.id == observed.id
}

/// Look up a usage by name (case-insensitive)
pub fn usage_from_name(name: &str) -> Option<(u8, u16)> {
    let upper = name.trim().to_ascii_uppercase();
    USAGE_NAMES
        .iter()
        .find(|(n, _, _)| *n == upper)
        .map(|(_, page, id)| (*page, *id))
}

fn wrapper_regex() -> &'static Regex {
    static WRAPPER: OnceLock<Regex> = OnceLock::new();
    WRAPPER.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{2})\s*\((.*)\)$").expect("modifier wrapper pattern is valid")
    })
}

fn numeric_regex() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^(?:0[xX]([0-9A-Fa-f]+)|([0-9]+))$").expect("numeric usage pattern is valid")
    })
}

impl FromStr for KeyIdentity {
    type Err = KeyParseError;

    /// Parse `A`, `LS(A)`, `LC(RA(N6))` or a packed numeric usage like `0x07002C`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError::Empty);
        }

        if let Some(caps) = wrapper_regex().captures(trimmed) {
            let func = &caps[1];
            let modifier = Modifier::from_str(func)
                .map_err(|_| KeyParseError::UnknownModifier(func.to_string()))?;
            let inner: KeyIdentity = caps[2].parse()?;
            return Ok(inner.with_modifier(modifier));
        }

        if let Some(caps) = numeric_regex().captures(trimmed) {
            let value = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16),
                (None, Some(dec)) => dec.as_str().parse::<u32>(),
                (None, None) => return Err(KeyParseError::InvalidUsage(trimmed.to_string())),
            }
            .map_err(|_| KeyParseError::InvalidUsage(trimmed.to_string()))?;
            return Ok(KeyIdentity::decode(value));
        }

        usage_from_name(trimmed)
            .map(|(page, id)| KeyIdentity::new(page, id))
            .ok_or_else(|| KeyParseError::UnknownKey(trimmed.to_string()))
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = match self.usage_name() {
            Some(name) => name.to_string(),
            None => format!("0x{:02X}{:04X}", self.page, self.id),
        };
        // Lowest modifier bit ends up outermost.
        let mods: Vec<Modifier> = self.modifiers.iter().collect();
        for modifier in mods.iter().rev() {
            text = format!("{}({})", modifier.wrapper_name(), text);
        }
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift() -> Modifiers {
        Modifiers::from(Modifier::LeftShift)
    }

    #[test]
    fn test_parse_plain_name() {
        let key: KeyIdentity = "space".parse().unwrap();
        assert_eq!(key, KeyIdentity::keyboard(0x2C));
    }

    #[test]
    fn test_parse_nested_wrappers() {
        let key: KeyIdentity = "LS(RA(E))".parse().unwrap();
        assert_eq!(key.page, HID_USAGE_KEY);
        assert_eq!(key.id, 0x08);
        assert_eq!(
            key.modifiers,
            Modifiers::from(Modifier::LeftShift).with(Modifier::RightAlt)
        );
    }

    #[test]
    fn test_parse_numeric_usage() {
        let key: KeyIdentity = "0x0207002C".parse().unwrap();
        assert_eq!(key, KeyIdentity::keyboard(0x2C).with_modifiers(shift()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeyIdentity>(), Err(KeyParseError::Empty));
        assert_eq!(
            "NOPE".parse::<KeyIdentity>(),
            Err(KeyParseError::UnknownKey("NOPE".to_string()))
        );
        assert_eq!(
            "XX(A)".parse::<KeyIdentity>(),
            Err(KeyParseError::UnknownModifier("XX".to_string()))
        );
    }

    #[test]
    fn test_encode_decode_layout() {
        let key = KeyIdentity::keyboard(0x04).with_modifiers(shift());
        assert_eq!(key.encode(), 0x0207_0004);
        assert_eq!(KeyIdentity::decode(0x0207_0004), key);
    }

    #[test]
    fn test_display_uses_wrappers() {
        let key = KeyIdentity::keyboard(0x08)
            .with_modifier(Modifier::LeftShift)
            .with_modifier(Modifier::RightAlt);
        assert_eq!(key.to_string(), "LS(RA(E))");
        assert_eq!(KeyIdentity::new(0x07, 0x0300).to_string(), "0x070300");
    }

    #[test]
    fn test_strict_match_requires_equal_modifiers() {
        let candidate = KeyIdentity::keyboard(0x04).with_modifiers(shift());
        let same = candidate;
        let extra = candidate.with_modifier(Modifier::LeftAlt);

        assert!(matches(&candidate, &same, true));
        assert!(!matches(&candidate, &extra, true));
        assert!(!matches(&candidate, &KeyIdentity::keyboard(0x04), true));
    }

    #[test]
    fn test_loose_match_allows_superset() {
        let candidate = KeyIdentity::keyboard(0x04).with_modifiers(shift());
        let extra = candidate
            .with_modifier(Modifier::LeftAlt)
            .with_modifier(Modifier::RightGui);

        assert!(matches(&candidate, &extra, false));
        assert!(!matches(&candidate, &KeyIdentity::keyboard(0x04), false));

        // Candidate without modifiers accepts any observed modifiers.
        let bare = KeyIdentity::keyboard(0x04);
        assert!(matches(&bare, &extra, false));
    }

    #[test]
    fn test_match_requires_same_usage() {
        let a = KeyIdentity::keyboard(0x04);
        let b = KeyIdentity::keyboard(0x05);
        let consumer_a = KeyIdentity::new(HID_USAGE_CONSUMER, 0x04);

        assert!(!matches(&a, &b, false));
        assert!(!matches(&a, &consumer_a, false));
    }

    #[test]
    fn test_exhaustive_modifier_subset_rule() {
        let usage = KeyIdentity::keyboard(0x2C);
        for candidate_bits in 0..=u8::MAX {
            for observed_bits in [0x00u8, 0x02, 0x22, 0xFF, candidate_bits] {
                let candidate = usage.with_modifiers(candidate_bits);
                let observed = usage.with_modifiers(observed_bits);
                let superset = observed_bits & candidate_bits == candidate_bits;
                assert_eq!(matches(&candidate, &observed, false), superset);
                assert_eq!(
                    matches(&candidate, &observed, true),
                    candidate_bits == observed_bits
                );
            }
        }
    }

    #[test]
    fn test_sentinel() {
        assert!(KeyIdentity::NONE.is_none());
        assert!(KeyIdentity::default().is_none());
        assert!(!KeyIdentity::keyboard(0x04).is_none());
    }
}

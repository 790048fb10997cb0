//! Key events and chord names.
//!
//! A chord name is the base key name prefixed by the held modifiers in the
//! fixed order `alt_`, `ctrl_`, `shift_`: `ctrl_shift_l`, `shift_tab`.

use regex::Regex;
use std::sync::LazyLock;

static CHORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(alt_)?(ctrl_)?(shift_)?([a-z0-9]+)$").expect("Invalid chord regex")
});

/// A key-down or key-up event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub code: u32,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

const FUNCTION_KEYS: &[(u32, &str)] = &[
    (8, "backspace"),
    (9, "tab"),
    (13, "enter"),
    (19, "pause"),
    (27, "escape"),
    (32, "space"),
    (33, "pageup"),
    (34, "pagedown"),
    (35, "end"),
    (36, "home"),
    (37, "left"),
    (38, "up"),
    (39, "right"),
    (40, "down"),
    (44, "printscreen"),
    (45, "insert"),
    (46, "delete"),
    (112, "f1"),
    (113, "f2"),
    (114, "f3"),
    (115, "f4"),
    (116, "f5"),
    (117, "f6"),
    (118, "f7"),
    (119, "f8"),
    (120, "f9"),
    (121, "f10"),
    (122, "f11"),
    (123, "f12"),
    (144, "numlock"),
    (145, "scrolllock"),
];

/// Bare modifier keys produce no chord of their own.
const MODIFIER_CODES: &[u32] = &[16, 17, 18];

pub mod codes {
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
    pub const DELETE: u32 = 46;
    pub const HOME: u32 = 36;
    pub const END: u32 = 35;
}

pub fn function_key_name(code: u32) -> Option<&'static str> {
    FUNCTION_KEYS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
}

fn function_key_code(name: &str) -> Option<u32> {
    FUNCTION_KEYS
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(c, _)| *c)
}

/// Digits and letters, lower-cased.
pub fn printable_key_name(code: u32) -> Option<char> {
    match code {
        48..=57 | 65..=90 => char::from_u32(code).map(|c| c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Checks that `chord` is a well-formed chord name.
pub fn is_valid_chord(chord: &str) -> bool {
    KeyEvent::from_chord(chord).is_some()
}

impl KeyEvent {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// The chord this event produces, or `None` when it has no name:
    /// bare modifiers, and letters or digits typed without alt or ctrl.
    pub fn chord(&self) -> Option<String> {
        if MODIFIER_CODES.contains(&self.code) {
            return None;
        }
        let base = match function_key_name(self.code) {
            Some(name) => name.to_string(),
            None if self.alt || self.ctrl => printable_key_name(self.code)?.to_string(),
            None => return None,
        };

        let mut chord = String::new();
        if self.alt {
            chord.push_str("alt_");
        }
        if self.ctrl {
            chord.push_str("ctrl_");
        }
        if self.shift {
            chord.push_str("shift_");
        }
        chord.push_str(&base);
        Some(chord)
    }

    /// Builds the event a chord name stands for.
    pub fn from_chord(chord: &str) -> Option<Self> {
        let caps = CHORD_RE.captures(chord)?;
        let base = caps.get(4)?.as_str();
        let code = match function_key_code(base) {
            Some(code) => code,
            None => {
                let mut chars = base.chars();
                let c = chars.next()?;
                if chars.next().is_some() || !c.is_ascii_alphanumeric() {
                    return None;
                }
                c.to_ascii_uppercase() as u32
            }
        };
        Some(Self {
            code,
            alt: caps.get(1).is_some(),
            ctrl: caps.get(2).is_some(),
            shift: caps.get(3).is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(KeyEvent::new(66).with_ctrl(), Some("ctrl_b"))]
    #[case(KeyEvent::new(76).with_ctrl().with_shift(), Some("ctrl_shift_l"))]
    #[case(KeyEvent::new(9).with_shift(), Some("shift_tab"))]
    #[case(KeyEvent::new(27), Some("escape"))]
    #[case(KeyEvent::new(54).with_ctrl(), Some("ctrl_6"))]
    #[case(KeyEvent::new(65).with_shift().with_ctrl().with_alt(), Some("alt_ctrl_shift_a"))]
    #[case(KeyEvent::new(113), Some("f2"))]
    #[case(KeyEvent::new(66), None)]
    #[case(KeyEvent::new(66).with_shift(), None)]
    #[case(KeyEvent::new(17).with_ctrl(), None)]
    #[case(KeyEvent::new(186).with_ctrl(), None)]
    fn chord_names(#[case] event: KeyEvent, #[case] expected: Option<&str>) {
        assert_eq!(event.chord().as_deref(), expected);
    }

    #[rstest]
    #[case("ctrl_shift_l")]
    #[case("shift_tab")]
    #[case("escape")]
    #[case("ctrl_0")]
    #[case("alt_f4")]
    fn from_chord_round_trips(#[case] chord: &str) {
        assert_eq!(KeyEvent::from_chord(chord).unwrap().chord().as_deref(), Some(chord));
    }

    #[rstest]
    #[case("shift_ctrl_l")]
    #[case("ctrl_")]
    #[case("ctrl_ab")]
    #[case("Ctrl_B")]
    #[case("")]
    fn invalid_chords(#[case] chord: &str) {
        assert!(!is_valid_chord(chord));
    }
}

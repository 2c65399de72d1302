//! Shortcut canonicalization.
//!
//! A [`Keystroke`] is one key combination a command may be bound to. For
//! indexing, every keystroke is encoded into a *canonical string*: the
//! modifiers in a fixed order — Ctrl and Meta collapse into a single `Ctrl`
//! token, then `Alt`, then `Shift` — joined by `+`, with the primary key
//! token appended last. Key tokens are pretty-printed through a small
//! substitution table (bracket codes map to literal brackets, `Digit5`
//! becomes `5`, letters are uppercased), so heterogeneous representations
//! of the same physical key — physical code, logical character, bare
//! letter or digit — converge on one canonical string whenever their
//! modifier sets match. That convergence is what lets keyboard dispatch
//! look up a registration by any of the four derivations of an incoming
//! event.
//!
//! ```
//! use sheetkit_commands::keystroke::Keystroke;
//!
//! let from_code: Keystroke = "Ctrl+KeyC".parse().unwrap();
//! let from_char: Keystroke = "Ctrl+c".parse().unwrap();
//! let from_cmd: Keystroke = "Cmd+C".parse().unwrap();
//! assert_eq!(from_code.canonical(), "Ctrl+C");
//! assert_eq!(from_char.canonical(), from_cmd.canonical());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::keyboard::{Key, KeyEvent, KeyboardModifiers};

/// A single key combination (one primary key with modifiers).
///
/// The primary key is stored as its canonical token, so two keystrokes
/// built from different representations of the same key compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    token: String,
    /// The modifier keys that must be held.
    pub modifiers: KeyboardModifiers,
}

impl Keystroke {
    /// Create a keystroke from a physical key code and modifiers.
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            token: key_token(key).to_string(),
            modifiers,
        }
    }

    /// The canonical primary-key token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Encode this keystroke as its canonical lookup string.
    pub fn canonical(&self) -> String {
        canonicalize(&self.token, self.modifiers)
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Error type for parsing keystrokes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeystrokeParseError {
    /// The string is empty.
    #[error("empty keystroke")]
    Empty,
    /// No key was specified (only modifiers).
    #[error("no key specified (only modifiers)")]
    NoKey,
    /// Unknown key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

impl FromStr for Keystroke {
    type Err = KeystrokeParseError;

    /// Parse a keystroke from a string like `"Ctrl+S"` or `"Cmd+["`.
    ///
    /// # Format
    ///
    /// - Modifiers: `Ctrl`, `Alt` (or `Option`), `Shift`, `Meta` (or
    ///   `Cmd`, `Super`, `Win`)
    /// - Keys: letters, digits, function keys, named keys (`Enter`,
    ///   `Escape`, …), physical codes (`KeyC`, `Digit5`, `BracketLeft`),
    ///   or literal punctuation (`[`, `;`, `/`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeystrokeParseError::Empty);
        }

        let mut modifiers = KeyboardModifiers::NONE;
        let mut token: Option<String> = None;

        for part in s.split('+') {
            let part = part.trim();
            if part.is_empty() {
                // "Ctrl++" names the '+' key via an empty final segment;
                // the shifted form is layout business, not ours.
                token = Some("=".to_string());
                continue;
            }
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "win" | "windows" | "super" => modifiers.meta = true,
                _ => {
                    token = Some(
                        normalize_token(part)
                            .ok_or_else(|| KeystrokeParseError::UnknownKey(part.to_string()))?,
                    );
                }
            }
        }

        match token {
            Some(token) => Ok(Keystroke { token, modifiers }),
            None => Err(KeystrokeParseError::NoKey),
        }
    }
}

/// Encode a canonical token and modifier set into the canonical string.
///
/// Modifier order is fixed: `Ctrl` (covering both Ctrl and Meta), `Alt`,
/// `Shift`, then the key token, joined by `+`.
pub fn canonicalize(token: &str, modifiers: KeyboardModifiers) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if modifiers.primary() {
        parts.push("Ctrl");
    }
    if modifiers.alt {
        parts.push("Alt");
    }
    if modifiers.shift {
        parts.push("Shift");
    }
    parts.push(token);
    parts.join("+")
}

/// The canonical token for a physical key code.
pub fn key_token(key: Key) -> &'static str {
    match key {
        Key::A => "A",
        Key::B => "B",
        Key::C => "C",
        Key::D => "D",
        Key::E => "E",
        Key::F => "F",
        Key::G => "G",
        Key::H => "H",
        Key::I => "I",
        Key::J => "J",
        Key::K => "K",
        Key::L => "L",
        Key::M => "M",
        Key::N => "N",
        Key::O => "O",
        Key::P => "P",
        Key::Q => "Q",
        Key::R => "R",
        Key::S => "S",
        Key::T => "T",
        Key::U => "U",
        Key::V => "V",
        Key::W => "W",
        Key::X => "X",
        Key::Y => "Y",
        Key::Z => "Z",
        Key::Digit0 => "0",
        Key::Digit1 => "1",
        Key::Digit2 => "2",
        Key::Digit3 => "3",
        Key::Digit4 => "4",
        Key::Digit5 => "5",
        Key::Digit6 => "6",
        Key::Digit7 => "7",
        Key::Digit8 => "8",
        Key::Digit9 => "9",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::ArrowUp => "Up",
        Key::ArrowDown => "Down",
        Key::ArrowLeft => "Left",
        Key::ArrowRight => "Right",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "PageUp",
        Key::PageDown => "PageDown",
        Key::Backspace => "Backspace",
        Key::Delete => "Delete",
        Key::Insert => "Insert",
        Key::Enter => "Enter",
        Key::Tab => "Tab",
        Key::Space => "Space",
        Key::Escape => "Escape",
        Key::Minus => "-",
        Key::Equal => "=",
        Key::BracketLeft => "[",
        Key::BracketRight => "]",
        Key::Backslash => "\\",
        Key::Semicolon => ";",
        Key::Quote => "'",
        Key::Comma => ",",
        Key::Period => ".",
        Key::Slash => "/",
        Key::Grave => "`",
        Key::Unknown(_) => "Unknown",
    }
}

/// The canonical token for a logical character, if it names a key.
pub fn char_token(ch: char) -> Option<String> {
    if ch.is_ascii_alphabetic() {
        return Some(ch.to_ascii_uppercase().to_string());
    }
    if ch.is_ascii_digit() {
        return Some(ch.to_string());
    }
    match ch {
        ' ' => Some("Space".to_string()),
        '\n' | '\r' => Some("Enter".to_string()),
        '\t' => Some("Tab".to_string()),
        '-' | '=' | '[' | ']' | '\\' | ';' | '\'' | ',' | '.' | '/' | '`' => {
            Some(ch.to_string())
        }
        _ => None,
    }
}

/// Normalize any textual key representation into the canonical token.
///
/// Accepts physical codes (`KeyC`, `Digit5`, `BracketLeft`), bare
/// characters (`c`, `5`, `[`), and named keys (`enter`, `esc`, `pgup`).
/// Returns `None` for names that resolve to no key.
pub fn normalize_token(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }

    // Bare single characters.
    let mut chars = s.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return char_token(ch);
    }

    let lower = s.to_lowercase();

    // Physical code prefixes, case-insensitive like everything else.
    if let Some(rest) = lower.strip_prefix("key") {
        let mut rest_chars = rest.chars();
        if let (Some(ch), None) = (rest_chars.next(), rest_chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(ch.to_ascii_uppercase().to_string());
            }
        }
        return None;
    }
    if let Some(rest) = lower.strip_prefix("digit") {
        let mut rest_chars = rest.chars();
        if let (Some(ch), None) = (rest_chars.next(), rest_chars.next()) {
            if ch.is_ascii_digit() {
                return Some(ch.to_string());
            }
        }
        return None;
    }

    // Named keys.
    let named = match lower.as_str() {
        "f1" => "F1",
        "f2" => "F2",
        "f3" => "F3",
        "f4" => "F4",
        "f5" => "F5",
        "f6" => "F6",
        "f7" => "F7",
        "f8" => "F8",
        "f9" => "F9",
        "f10" => "F10",
        "f11" => "F11",
        "f12" => "F12",
        "up" | "arrowup" => "Up",
        "down" | "arrowdown" => "Down",
        "left" | "arrowleft" => "Left",
        "right" | "arrowright" => "Right",
        "home" => "Home",
        "end" => "End",
        "pageup" | "pgup" => "PageUp",
        "pagedown" | "pgdn" => "PageDown",
        "backspace" | "back" => "Backspace",
        "delete" | "del" => "Delete",
        "insert" | "ins" => "Insert",
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "space" | "spacebar" => "Space",
        "escape" | "esc" => "Escape",
        "minus" => "-",
        "equal" | "equals" => "=",
        "bracketleft" => "[",
        "bracketright" => "]",
        "backslash" => "\\",
        "semicolon" => ";",
        "quote" => "'",
        "comma" => ",",
        "period" => ".",
        "slash" => "/",
        "grave" => "`",
        _ => return None,
    };
    Some(named.to_string())
}

/// Derive the ordered canonical lookup candidates for a key event.
///
/// Candidates come from the physical key code first, then the logical
/// character produced by the active layout. The code-derived token already
/// carries the bare digit and bare letter forms (`Digit5` encodes as `5`,
/// `KeyC` as `C`), so on layouts where code and character agree the two
/// derivations collapse to a single candidate. Duplicates are removed
/// preserving order.
pub fn event_candidates(event: &KeyEvent) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(2);
    let mut push = |token: Option<String>| {
        if let Some(token) = token {
            let canonical = canonicalize(&token, event.modifiers);
            if !candidates.contains(&canonical) {
                candidates.push(canonical);
            }
        }
    };

    push(Some(key_token(event.code).to_string()));
    push(event.character.and_then(char_token));

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::RegionId;

    #[test]
    fn test_canonical_modifier_order() {
        let ks = Keystroke::new(
            Key::C,
            KeyboardModifiers {
                shift: true,
                control: true,
                alt: true,
                meta: false,
            },
        );
        assert_eq!(ks.canonical(), "Ctrl+Alt+Shift+C");
    }

    #[test]
    fn test_ctrl_and_meta_collapse() {
        let ctrl = Keystroke::new(Key::C, KeyboardModifiers::CTRL);
        let meta = Keystroke::new(Key::C, KeyboardModifiers::META);
        assert_eq!(ctrl.canonical(), meta.canonical());
        assert_eq!(ctrl.canonical(), "Ctrl+C");
    }

    #[test]
    fn test_parse_equivalent_representations() {
        let reps = [
            "Ctrl+C",
            "Ctrl+c",
            "Ctrl+KeyC",
            "Ctrl+keyc",
            "Ctrl+KEYC",
            "Cmd+C",
            "control+keyc",
        ];
        for rep in reps {
            let ks: Keystroke = rep.parse().unwrap();
            assert_eq!(ks.canonical(), "Ctrl+C", "for {rep:?}");
        }

        let digits = ["Alt+5", "Alt+Digit5", "alt+digit5"];
        for rep in digits {
            let ks: Keystroke = rep.parse().unwrap();
            assert_eq!(ks.canonical(), "Alt+5", "for {rep:?}");
        }
    }

    #[test]
    fn test_parse_substitution_table() {
        let pairs = [
            ("Ctrl+[", "Ctrl+["),
            ("Ctrl+BracketLeft", "Ctrl+["),
            ("Ctrl+BracketRight", "Ctrl+]"),
            ("Shift+Semicolon", "Shift+;"),
            ("Ctrl+Period", "Ctrl+."),
            ("F11", "F11"),
            ("esc", "Escape"),
            ("Ctrl+Enter", "Ctrl+Enter"),
        ];
        for (input, expected) in pairs {
            let ks: Keystroke = input.parse().unwrap();
            assert_eq!(ks.canonical(), expected, "for {input:?}");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Keystroke>(), Err(KeystrokeParseError::Empty));
        assert_eq!(
            "Ctrl+Shift".parse::<Keystroke>(),
            Err(KeystrokeParseError::NoKey)
        );
        assert_eq!(
            "Ctrl+Bogus".parse::<Keystroke>(),
            Err(KeystrokeParseError::UnknownKey("Bogus".to_string()))
        );
    }

    #[test]
    fn test_event_candidates_converge() {
        let event = KeyEvent::new(Key::C, KeyboardModifiers::CTRL)
            .with_character('c')
            .with_origin(RegionId(1));
        let candidates = event_candidates(&event);
        assert_eq!(candidates, vec!["Ctrl+C".to_string()]);
    }

    #[test]
    fn test_event_candidates_divergent_character() {
        // Physical Q producing 'a' (e.g. AZERTY): both derivations offered,
        // physical code first.
        let event = KeyEvent::new(Key::Q, KeyboardModifiers::CTRL).with_character('a');
        let candidates = event_candidates(&event);
        assert_eq!(
            candidates,
            vec!["Ctrl+Q".to_string(), "Ctrl+A".to_string()]
        );
    }

    #[test]
    fn test_event_candidates_digit() {
        let event = KeyEvent::new(Key::Digit5, KeyboardModifiers::ALT).with_character('5');
        assert_eq!(event_candidates(&event), vec!["Alt+5".to_string()]);
    }

    #[test]
    fn test_display_matches_canonical() {
        let ks: Keystroke = "shift+f3".parse().unwrap();
        assert_eq!(ks.to_string(), "Shift+F3");
    }
}

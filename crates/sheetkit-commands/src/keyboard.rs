//! Keyboard event types and the command target surface.
//!
//! This module defines the raw material of keyboard dispatch:
//!
//! - [`Key`]: physical key codes, structured like web `KeyboardEvent.code`
//! - [`KeyboardModifiers`]: the modifier set held during a keystroke
//! - [`KeyEvent`]: one keystroke as delivered by the host shell, carrying
//!   both the physical code and the logical character plus its origin
//! - [`RegionId`]: a stable integer handle naming a visual region
//! - [`CommandTarget`]: the collaborator trait used to scope shortcut
//!   applicability

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keyboard key codes.
///
/// This enum represents the physical keys on a keyboard. It follows a
/// similar structure to web KeyboardEvent.code values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab,

    // Whitespace
    Space,

    // Punctuation and symbols
    Minus, Equal,
    BracketLeft, BracketRight, Backslash,
    Semicolon, Quote,
    Comma, Period, Slash,
    Grave,

    // Control
    Escape,

    // Unknown/unmapped key
    Unknown(u16),
}

impl Key {
    /// Check if this is a letter key.
    pub fn is_letter(&self) -> bool {
        matches!(
            self,
            Key::A | Key::B | Key::C | Key::D | Key::E | Key::F | Key::G
                | Key::H | Key::I | Key::J | Key::K | Key::L | Key::M
                | Key::N | Key::O | Key::P | Key::Q | Key::R | Key::S
                | Key::T | Key::U | Key::V | Key::W | Key::X | Key::Y
                | Key::Z
        )
    }

    /// Check if this is a digit key on the main keyboard.
    pub fn is_digit(&self) -> bool {
        matches!(
            self,
            Key::Digit0 | Key::Digit1 | Key::Digit2 | Key::Digit3
                | Key::Digit4 | Key::Digit5 | Key::Digit6 | Key::Digit7
                | Key::Digit8 | Key::Digit9
        )
    }

    /// Check if this is a function key.
    pub fn is_function_key(&self) -> bool {
        matches!(
            self,
            Key::F1 | Key::F2 | Key::F3 | Key::F4 | Key::F5 | Key::F6
                | Key::F7 | Key::F8 | Key::F9 | Key::F10 | Key::F11
                | Key::F12
        )
    }
}

/// The set of modifier keys held during a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if no modifiers are held.
    pub fn is_empty(&self) -> bool {
        !(self.shift || self.control || self.alt || self.meta)
    }

    /// Check if either primary command modifier (Ctrl or Meta) is held.
    ///
    /// Shortcut canonicalization collapses the two into one token, so two
    /// modifier sets are dispatch-equivalent when this and the Alt/Shift
    /// flags agree.
    pub fn primary(&self) -> bool {
        self.control || self.meta
    }
}

/// A stable integer handle naming a visual region of the host shell.
///
/// Origins of key events and the containment tests of [`CommandTarget`]
/// speak in region handles rather than host-framework node references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A collaborator that scopes shortcut applicability to a visual region.
///
/// A command or group with a target only responds to key events whose
/// origin the target [`contains`](CommandTarget::contains); `focus` asks
/// the host to move keyboard focus into the region.
pub trait CommandTarget: Send + Sync {
    /// Check whether the given region lies inside this target.
    fn contains(&self, region: RegionId) -> bool;

    /// Ask the host to focus this target's region.
    fn focus(&self);
}

/// One keystroke as delivered by the host shell.
///
/// Carries the physical key code, the logical character produced by the
/// active layout (when any), the modifier set, and the region the event
/// originated from. The consumed flag is set by dispatch before a matched
/// command executes, so the same physical keystroke is never dispatched
/// twice.
#[derive(Debug)]
pub struct KeyEvent {
    /// The physical key code.
    pub code: Key,
    /// The logical character produced by the keystroke, if any.
    pub character: Option<char>,
    /// The modifier set held during the keystroke.
    pub modifiers: KeyboardModifiers,
    /// The visual region the event originated from.
    pub origin: RegionId,
    /// Whether the event has been consumed by dispatch.
    consumed: AtomicBool,
}

impl KeyEvent {
    /// Create a key event with no character, default origin, and the given
    /// code and modifiers.
    pub fn new(code: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            code,
            character: None,
            modifiers,
            origin: RegionId::default(),
            consumed: AtomicBool::new(false),
        }
    }

    /// Builder pattern for the logical character.
    pub fn with_character(mut self, character: char) -> Self {
        self.character = Some(character);
        self
    }

    /// Builder pattern for the origin region.
    pub fn with_origin(mut self, origin: RegionId) -> Self {
        self.origin = origin;
        self
    }

    /// Check whether the event has already been consumed.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::SeqCst)
    }

    /// Mark the event consumed, suppressing any default host action.
    pub fn consume(&self) {
        self.consumed.store(true, Ordering::SeqCst);
    }
}

static_assertions::assert_impl_all!(KeyEvent: Send, Sync);

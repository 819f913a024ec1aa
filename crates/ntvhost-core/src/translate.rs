use std::collections::HashMap;

use crate::event::{Event, EventKind};

/// Key details as reported by the windowing platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawKey {
    /// Platform modifier bit set at the time of the notification.
    pub modifiers: u32,
    /// Platform scancode / keycode.
    pub keycode: u32,
    /// Produced text, empty when the key produced none.
    pub text: String,
    /// Symbolic key name (e.g. `"Shift"`, `"F1"`).
    pub symbol: String,
}

/// Platform notification before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Motion,
    Wheel { delta: f64 },
    ButtonPress { button: i32 },
    ButtonRelease { button: i32 },
    KeyPress(RawKey),
    KeyRelease(RawKey),
    Timer,
    Quit,
    /// Resize, expose or any other surface notification.
    Surface,
}

/// A raw notification together with the pointer and surface snapshot taken when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub input: RawInput,
}

impl RawEvent {
    #[inline]
    pub fn new(input: RawInput, (x, y): (i32, i32), (width, height): (u32, u32)) -> Self {
        Self {
            x,
            y,
            width,
            height,
            input,
        }
    }
}

/// Wheel synthesis: delta < 0 is virtual button 4, anything else button 5.
pub const WHEEL_BUTTON_NEGATIVE: i32 = 4;
pub const WHEEL_BUTTON_POSITIVE: i32 = 5;

/// Highest real mouse button; releases above it are dropped.
pub const MAX_RELEASED_BUTTON: i32 = 3;

const KEY_NORMALIZATION: &[(&str, &str)] = &[("\r", "\n"), ("\x1b", "Escape")];

/// Converts platform notifications into canonical [`Event`]s.
///
/// Owns the key correlation cache: release notifications are unreliable on some
/// platforms/layouts, so each press records its resolved label under
/// `(modifiers, keycode)` and the matching release reuses it.
#[derive(Debug, Default)]
pub struct EventTranslator {
    key_cache: HashMap<(u32, u32), String>,
}

impl EventTranslator {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the notification must be ignored.
    pub fn translate(&mut self, raw: &RawEvent) -> Option<Event> {
        let w = raw.width.max(1);
        let h = raw.height.max(1);
        let mut e = Event::new(EventKind::Configure, raw.x, raw.y, w, h);

        match &raw.input {
            RawInput::Motion => e.kind = EventKind::Motion,
            RawInput::Wheel { delta } => {
                e.kind = EventKind::ButtonPress;
                e.button = if *delta < 0.0 {
                    WHEEL_BUTTON_NEGATIVE
                } else {
                    WHEEL_BUTTON_POSITIVE
                };
            }
            RawInput::ButtonPress { button } => {
                e.kind = EventKind::ButtonPress;
                e.button = *button;
            }
            RawInput::ButtonRelease { button } => {
                if *button > MAX_RELEASED_BUTTON {
                    return None;
                }
                e.kind = EventKind::ButtonRelease;
                e.button = *button;
            }
            RawInput::KeyPress(key) => {
                let label = normalize(reported_label(key));
                self.key_cache
                    .insert((key.modifiers, key.keycode), label.to_owned());
                e.kind = EventKind::KeyPress;
                e.key = label.as_bytes().to_vec();
            }
            RawInput::KeyRelease(key) => {
                let label = self
                    .key_cache
                    .get(&(key.modifiers, key.keycode))
                    .map(String::as_str)
                    .unwrap_or_else(|| reported_label(key));
                e.kind = EventKind::KeyRelease;
                e.key = label.as_bytes().to_vec();
            }
            RawInput::Timer => e.kind = EventKind::Timer,
            RawInput::Quit => e.kind = EventKind::Quit,
            RawInput::Surface => {}
        }

        Some(e)
    }

    #[cfg(test)]
    pub(crate) fn cached_keys(&self) -> usize {
        self.key_cache.len()
    }
}

#[inline]
fn reported_label(key: &RawKey) -> &str {
    if key.text.is_empty() {
        &key.symbol
    } else {
        &key.text
    }
}

#[inline]
fn normalize(label: &str) -> &str {
    KEY_NORMALIZATION
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| *to)
        .unwrap_or(label)
}

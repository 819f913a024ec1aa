use std::ffi::CStr;

/// Canonical event kinds exchanged with the native module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Motion,
    Wheel,
    ButtonPress,
    ButtonRelease,
    KeyPress,
    KeyRelease,
    Configure,
    Timer,
    Quit,
}

impl EventKind {
    /// Wire-level tag handed to `update` as a C string.
    #[inline]
    pub const fn tag(self) -> &'static CStr {
        match self {
            EventKind::Motion => c"M",
            EventKind::Wheel => c"W",
            EventKind::ButtonPress => c"BP",
            EventKind::ButtonRelease => c"BR",
            EventKind::KeyPress => c"KP",
            EventKind::KeyRelease => c"KR",
            EventKind::Configure => c"C",
            EventKind::Timer => c"T",
            EventKind::Quit => c"Q",
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        // Tags are plain ASCII.
        self.tag().to_str().unwrap_or("?")
    }
}

/// One normalized input/timer/quit notification.
///
/// `x`/`y` are relative to the surface's top-left corner, `w`/`h` are the surface's
/// current size. `button` is 0 and `key` is empty when not applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub button: i32,
    pub key: Vec<u8>,
}

impl Event {
    #[inline]
    pub fn new(kind: EventKind, x: i32, y: i32, w: u32, h: u32) -> Self {
        Self {
            kind,
            x,
            y,
            w,
            h,
            button: 0,
            key: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_wire_vocabulary() {
        let tags: Vec<&str> = [
            EventKind::Motion,
            EventKind::Wheel,
            EventKind::ButtonPress,
            EventKind::ButtonRelease,
            EventKind::KeyPress,
            EventKind::KeyRelease,
            EventKind::Configure,
            EventKind::Timer,
            EventKind::Quit,
        ]
        .into_iter()
        .map(EventKind::as_str)
        .collect();

        assert_eq!(tags, ["M", "W", "BP", "BR", "KP", "KR", "C", "T", "Q"]);
    }

    #[test]
    fn new_event_has_no_button_or_key() {
        let e = Event::new(EventKind::Motion, 3, 4, 10, 20);
        assert_eq!(e.button, 0);
        assert!(e.key.is_empty());
    }
}

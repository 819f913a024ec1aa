use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ntvhost_core::RawKey;
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{Key, ModifiersState, NativeKeyCode, PhysicalKey};
use winit::platform::scancode::PhysicalKeyExtScancode;

const SYNTHETIC_KEYCODE_BIT: u32 = 1 << 31;

/// Events injected into the winit loop from outside the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostUserEvent {
    /// Ctrl-C or another external stop request.
    Quit,
}

/// X11-style button numbering: 1 left, 2 middle, 3 right, 8/9 back/forward.
#[inline]
pub fn button_index(button: MouseButton) -> i32 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
        MouseButton::Back => 8,
        MouseButton::Forward => 9,
        MouseButton::Other(n) => i32::from(n),
    }
}

/// Vertical wheel delta; `None` for purely horizontal scrolling.
#[inline]
pub fn wheel_delta(delta: MouseScrollDelta) -> Option<f64> {
    let (dx, dy) = match delta {
        MouseScrollDelta::LineDelta(x, y) => (f64::from(x), f64::from(y)),
        MouseScrollDelta::PixelDelta(p) => (p.x, p.y),
    };
    if dy == 0.0 && dx != 0.0 {
        return None;
    }
    Some(dy)
}

/// Symbolic name of a logical key (`"Enter"`, `"F1"`, `"a"`...).
pub fn key_symbol(key: &Key) -> String {
    match key {
        Key::Named(named) => format!("{named:?}"),
        Key::Character(s) => s.to_string(),
        Key::Dead(Some(c)) => c.to_string(),
        Key::Dead(None) => "Dead".to_string(),
        Key::Unidentified(_) => "Unidentified".to_string(),
    }
}

/// Hardware scancode, else the platform's native code. Keys with neither get a stable
/// per-key value with the top bit set so they never share a cache slot.
pub fn keycode(physical: PhysicalKey) -> u32 {
    if let Some(code) = physical.to_scancode() {
        return code;
    }
    match physical {
        PhysicalKey::Unidentified(NativeKeyCode::Xkb(c) | NativeKeyCode::Android(c)) => c,
        PhysicalKey::Unidentified(NativeKeyCode::Windows(c) | NativeKeyCode::MacOS(c)) => {
            u32::from(c)
        }
        other => {
            let mut hasher = DefaultHasher::new();
            other.hash(&mut hasher);
            (hasher.finish() as u32) | SYNTHETIC_KEYCODE_BIT
        }
    }
}

pub fn raw_key(
    modifiers: ModifiersState,
    physical: PhysicalKey,
    logical: &Key,
    text: Option<&str>,
) -> RawKey {
    RawKey {
        modifiers: modifiers.bits(),
        keycode: keycode(physical),
        text: text.unwrap_or_default().to_string(),
        symbol: key_symbol(logical),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use winit::dpi::PhysicalPosition;
    use winit::keyboard::{KeyCode, NamedKey};

    #[test]
    fn buttons_use_x11_numbering() {
        assert_eq!(button_index(MouseButton::Left), 1);
        assert_eq!(button_index(MouseButton::Middle), 2);
        assert_eq!(button_index(MouseButton::Right), 3);
        assert_eq!(button_index(MouseButton::Back), 8);
        assert_eq!(button_index(MouseButton::Forward), 9);
        assert_eq!(button_index(MouseButton::Other(12)), 12);
    }

    #[test]
    fn wheel_uses_vertical_component() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, -1.0)), Some(-1.0));
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 12.5))),
            Some(12.5)
        );
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(2.0, 0.0)), None);
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 0.0)), Some(0.0));
    }

    #[test]
    fn symbols() {
        assert_eq!(key_symbol(&Key::Named(NamedKey::Escape)), "Escape");
        assert_eq!(key_symbol(&Key::Named(NamedKey::F1)), "F1");
        assert_eq!(key_symbol(&Key::Character("q".into())), "q");
        assert_eq!(key_symbol(&Key::Dead(None)), "Dead");
    }

    #[test]
    fn keycodes_are_distinct_and_stable() {
        let keys = [
            PhysicalKey::Code(KeyCode::KeyA),
            PhysicalKey::Code(KeyCode::KeyB),
            PhysicalKey::Code(KeyCode::Fn),
            PhysicalKey::Code(KeyCode::FnLock),
            PhysicalKey::Code(KeyCode::BrowserSearch),
            PhysicalKey::Code(KeyCode::LaunchApp2),
        ];
        let codes: Vec<u32> = keys.iter().map(|&k| keycode(k)).collect();

        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b, "{codes:?}");
            }
        }
        assert_eq!(keycode(PhysicalKey::Code(KeyCode::Fn)), codes[2]);
    }

    #[test]
    fn raw_key_carries_text_and_modifiers() {
        let k = raw_key(
            ModifiersState::SHIFT,
            PhysicalKey::Code(KeyCode::KeyA),
            &Key::Character("A".into()),
            Some("A"),
        );
        assert_eq!(k.modifiers, ModifiersState::SHIFT.bits());
        assert_eq!(k.text, "A");
        assert_eq!(k.symbol, "A");

        let k = raw_key(
            ModifiersState::empty(),
            PhysicalKey::Code(KeyCode::ShiftLeft),
            &Key::Named(NamedKey::Shift),
            None,
        );
        assert!(k.text.is_empty());
        assert_eq!(k.symbol, "Shift");
    }
}

//! Binary contract between the host and a native module.
//!
//! A module named `<name>` exports two C entry points:
//!
//! ```text
//! void *<name>_init(int argc, const char **argv,
//!                   int *inout_width, int *inout_height, double *inout_dt);
//!
//! int <name>_update(const char *kind, int x, int y, int w, int h,
//!                   int button, const char *key,
//!                   unsigned char *screen, void *state);
//! ```
//!
//! `init` returns an opaque state pointer (null on failure) that the host passes back
//! unchanged to every `update`. `screen` points at exactly `3 * w * h` bytes that are
//! only valid for the duration of the call. `update` returns a negative value to quit;
//! bit 0 set means the screen was modified.

use std::ffi::{c_char, c_double, c_int, c_void};
use std::ptr::NonNull;

pub const INIT_SUFFIX: &str = "_init";
pub const UPDATE_SUFFIX: &str = "_update";

pub type InitFn = unsafe extern "C" fn(
    argc: c_int,
    argv: *const *const c_char,
    inout_width: *mut c_int,
    inout_height: *mut c_int,
    inout_dt: *mut c_double,
) -> *mut c_void;

pub type UpdateFn = unsafe extern "C" fn(
    kind: *const c_char,
    x: c_int,
    y: c_int,
    w: c_int,
    h: c_int,
    button: c_int,
    key: *const c_char,
    screen: *mut u8,
    state: *mut c_void,
) -> c_int;

/// Opaque state handle produced by `init`.
///
/// Owned by the module: the host stores and forwards it, never reads through it and
/// never frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleState(NonNull<c_void>);

impl ModuleState {
    #[inline]
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[inline]
    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// In/out parameters of `init`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitParams {
    pub width: u32,
    pub height: u32,
    /// Timer period in seconds; negative disables the periodic timer.
    pub dt: f64,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            dt: -1.0,
        }
    }
}

impl InitParams {
    #[inline]
    pub fn timer_enabled(&self) -> bool {
        self.dt >= 0.0
    }
}

/// Decoded return value of `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStatus(pub i32);

impl UpdateStatus {
    pub const GO_ON: Self = Self(0);
    pub const REDRAW: Self = Self(1);
    pub const QUIT: Self = Self(-1);

    #[inline]
    pub fn is_quit(self) -> bool {
        self.0 < 0
    }

    /// Bit 0 set on a non-negative value.
    #[inline]
    pub fn needs_redraw(self) -> bool {
        !self.is_quit() && self.0 & 1 != 0
    }
}

#![forbid(unsafe_op_in_unsafe_fn)]

//! Sample native module for `ntvhost`.
//!
//! Run with `ntvhost demo [size]`. A square bounces around on every timer tick; left
//! click moves it to the pointer, the wheel resizes it, space pauses, `q` or Escape
//! quits.

use std::ffi::{c_char, c_double, c_int, c_void, CStr};

/* =============================================================================================
   Exported entry points
   ============================================================================================= */

/// # Safety
/// Called by the host with `argc` valid C strings in `argv` and valid in/out pointers.
#[no_mangle]
pub unsafe extern "C" fn demo_init(
    argc: c_int,
    argv: *const *const c_char,
    inout_width: *mut c_int,
    inout_height: *mut c_int,
    inout_dt: *mut c_double,
) -> *mut c_void {
    let args: Vec<String> = (0..argc.max(0) as usize)
        .map(|i| {
            // Safety: the host passes argc valid, NUL-terminated strings.
            let p = unsafe { *argv.add(i) };
            unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
        })
        .collect();

    let size = match args.get(2).map(|s| s.parse::<i32>()) {
        None => 24,
        Some(Ok(n)) if n > 0 => n,
        Some(_) => return std::ptr::null_mut(),
    };

    // Safety: the host owns these for the duration of the call.
    let (w, h, dt) = unsafe { (&mut *inout_width, &mut *inout_height, &mut *inout_dt) };
    *w = (*w).max(size * 4);
    *h = (*h).max(size * 4);
    *dt = 1.0 / 30.0;

    Box::into_raw(Box::new(Bounce::new(size, *w, *h))) as *mut c_void
}

/// # Safety
/// `kind`/`key` are valid C strings, `screen` holds `3*w*h` bytes, `state` came from
/// `demo_init` and has not been released by a previous quit.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn demo_update(
    kind: *const c_char,
    x: c_int,
    y: c_int,
    w: c_int,
    h: c_int,
    button: c_int,
    key: *const c_char,
    screen: *mut u8,
    state: *mut c_void,
) -> c_int {
    let kind = unsafe { CStr::from_ptr(kind) }.to_bytes();
    let key = unsafe { CStr::from_ptr(key) }.to_bytes();
    let (w, h) = (w.max(0) as usize, h.max(0) as usize);
    let screen = unsafe { std::slice::from_raw_parts_mut(screen, 3 * w * h) };
    let app = unsafe { &mut *(state as *mut Bounce) };

    let input = Input {
        kind,
        x,
        y,
        button,
        key,
    };

    match app.update(&input, Screen { w, h, pixels: screen }) {
        Status::GoOn => 0,
        Status::Redraw => 1,
        Status::Quit => {
            // The module owns its state; release it on the way out.
            drop(unsafe { Box::from_raw(state as *mut Bounce) });
            -1
        }
    }
}

/* =============================================================================================
   Application
   ============================================================================================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    GoOn,
    Redraw,
    Quit,
}

struct Input<'a> {
    kind: &'a [u8],
    x: i32,
    y: i32,
    button: i32,
    key: &'a [u8],
}

struct Screen<'a> {
    w: usize,
    h: usize,
    pixels: &'a mut [u8],
}

impl Screen<'_> {
    fn fill_rect(&mut self, x0: i32, y0: i32, side: i32, rgb: [u8; 3]) {
        let clamp = |v: i32, max: usize| v.clamp(0, max as i32) as usize;
        let (x1, y1) = (clamp(x0 + side, self.w), clamp(y0 + side, self.h));
        let (x0, y0) = (clamp(x0, self.w), clamp(y0, self.h));
        for y in y0..y1 {
            for x in x0..x1 {
                let at = 3 * (y * self.w + x);
                self.pixels[at..at + 3].copy_from_slice(&rgb);
            }
        }
    }
}

struct Bounce {
    side: i32,
    pos: (i32, i32),
    vel: (i32, i32),
    paused: bool,
    ticks: u64,
}

impl Bounce {
    fn new(side: i32, w: i32, h: i32) -> Self {
        Self {
            side,
            pos: ((w - side) / 2, (h - side) / 2),
            vel: (3, 2),
            paused: false,
            ticks: 0,
        }
    }

    fn update(&mut self, input: &Input<'_>, mut screen: Screen<'_>) -> Status {
        let status = match input.kind {
            b"Q" => return Status::Quit,
            b"KP" => match input.key {
                b"q" | b"Escape" => return Status::Quit,
                b" " => {
                    self.paused = !self.paused;
                    Status::GoOn
                }
                _ => Status::GoOn,
            },
            b"BP" => match input.button {
                1 => {
                    self.pos = (input.x - self.side / 2, input.y - self.side / 2);
                    Status::Redraw
                }
                4 => {
                    self.side = (self.side - 2).max(4);
                    Status::Redraw
                }
                5 => {
                    self.side = (self.side + 2).min(256);
                    Status::Redraw
                }
                _ => Status::GoOn,
            },
            b"T" if !self.paused => {
                self.step(screen.w as i32, screen.h as i32);
                Status::Redraw
            }
            b"C" => Status::Redraw,
            _ => Status::GoOn,
        };

        if status == Status::Redraw {
            self.draw(&mut screen);
        }
        status
    }

    fn step(&mut self, w: i32, h: i32) {
        self.ticks += 1;
        let max_x = (w - self.side).max(0);
        let max_y = (h - self.side).max(0);

        self.pos.0 += self.vel.0;
        self.pos.1 += self.vel.1;
        if self.pos.0 <= 0 || self.pos.0 >= max_x {
            self.vel.0 = -self.vel.0;
        }
        if self.pos.1 <= 0 || self.pos.1 >= max_y {
            self.vel.1 = -self.vel.1;
        }
        self.pos = (self.pos.0.clamp(0, max_x), self.pos.1.clamp(0, max_y));
    }

    fn draw(&self, screen: &mut Screen<'_>) {
        let (w, h) = (screen.w.max(1), screen.h.max(1));
        for (i, px) in screen.pixels.chunks_exact_mut(3).enumerate() {
            let (x, y) = (i % w, i / w);
            px[0] = (x * 255 / w) as u8;
            px[1] = (y * 255 / h) as u8;
            px[2] = 96;
        }
        let shade = (self.ticks % 64) as u8 * 2;
        screen.fill_rect(self.pos.0, self.pos.1, self.side, [255, 255 - shade, 64]);
    }
}

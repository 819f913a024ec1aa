use std::time::{Duration, Instant};

use crate::abi::{InitParams, UpdateStatus};
use crate::event::{Event, EventKind};
use crate::framebuffer::FrameBuffer;
use crate::present::Presenter;
use crate::translate::{EventTranslator, RawEvent};

/// Shortest delay a timer is ever armed with.
pub const MIN_TIMER_DELAY: Duration = Duration::from_millis(1);

/// Application logic driven by the host. The loaded native module implements it.
pub trait Application {
    /// `screen` is the live pixel region, exactly `3 * event.w * event.h` bytes.
    fn update(&mut self, event: &Event, screen: &mut [u8]) -> UpdateStatus;
}

/// Handle of an armed one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Environment the host loop runs in: a presenter plus the wait loop controls.
pub trait HostSurface: Presenter {
    /// Stop waiting for further notifications.
    fn request_exit(&mut self);

    /// Arm a one-shot timer that delivers a `Timer` notification after `delay`.
    fn schedule_timer(&mut self, delay: Duration) -> TimerId;
}

/// Host-side application state. Mutated only by [`Host`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub width: u32,
    pub height: u32,
    pub must_quit: bool,
    /// Timer period in seconds; negative means no periodic timer.
    pub dt: f64,
    pub pending_timer: Option<TimerId>,
}

impl AppState {
    #[inline]
    pub fn new(params: InitParams) -> Self {
        Self {
            width: params.width.max(1),
            height: params.height.max(1),
            must_quit: false,
            dt: params.dt,
            pending_timer: None,
        }
    }
}

/// What happened to one raw notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Dropped before reaching the module.
    Ignored,
    Delivered(UpdateStatus),
}

/// Delay until the next tick: `dt - elapsed`, floored at [`MIN_TIMER_DELAY`].
pub fn next_timer_delay(dt: f64, elapsed: Duration) -> Duration {
    let remaining = dt - elapsed.as_secs_f64();
    if remaining.is_nan() || remaining <= MIN_TIMER_DELAY.as_secs_f64() {
        return MIN_TIMER_DELAY;
    }
    // The module picks dt; absurd periods saturate.
    Duration::try_from_secs_f64(remaining).unwrap_or(Duration::MAX)
}

/// The single-threaded event loop body.
///
/// One notification in, at most one `update` call out. Owns the frame buffer and the
/// event translator; the surrounding platform owns waiting and presentation.
pub struct Host<A: Application> {
    app: A,
    state: AppState,
    frame: Option<FrameBuffer>,
    translator: EventTranslator,
    timer_enabled: bool,
}

impl<A: Application> Host<A> {
    pub fn new(app: A, params: InitParams) -> Self {
        Self {
            app,
            state: AppState::new(params),
            frame: None,
            translator: EventTranslator::new(),
            timer_enabled: params.timer_enabled(),
        }
    }

    #[inline]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[inline]
    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn app(&self) -> &A {
        &self.app
    }

    /// Arms the first timer when the module asked for one.
    pub fn start(&mut self, surface: &mut dyn HostSurface) {
        if self.state.must_quit || !self.timer_enabled {
            return;
        }
        let delay = next_timer_delay(self.state.dt, Duration::ZERO);
        self.state.pending_timer = Some(surface.schedule_timer(delay));
        log::debug!("host: first timer in {:?}", delay);
    }

    /// Handles one raw notification.
    pub fn handle(&mut self, raw: &RawEvent, surface: &mut dyn HostSurface) -> Dispatch {
        if self.state.must_quit {
            return Dispatch::Ignored;
        }

        let Some(event) = self.translator.translate(raw) else {
            return Dispatch::Ignored;
        };

        let started = Instant::now();
        if event.kind == EventKind::Timer {
            self.state.pending_timer = None;
        }

        let frame = match self.frame.take() {
            Some(fb) if fb.matches(event.w, event.h) => fb,
            _ => {
                log::debug!("host: frame buffer {}x{}", event.w, event.h);
                self.state.width = event.w;
                self.state.height = event.h;
                FrameBuffer::allocate(event.w, event.h)
            }
        };
        let frame = self.frame.insert(frame);

        log::trace!(
            "host: {} x={} y={} w={} h={} btn={} key={:?}",
            event.kind.as_str(),
            event.x,
            event.y,
            event.w,
            event.h,
            event.button,
            String::from_utf8_lossy(&event.key)
        );

        let status = self.app.update(&event, frame.pixel_region_mut());

        if status.is_quit() {
            log::info!("host: module requested quit");
            self.state.must_quit = true;
            self.state.pending_timer = None;
            surface.request_exit();
            return Dispatch::Delivered(status);
        }

        if status.needs_redraw() {
            surface.present(frame);
            surface.flush();
        }

        if event.kind == EventKind::Timer {
            let delay = next_timer_delay(self.state.dt, started.elapsed());
            self.state.pending_timer = Some(surface.schedule_timer(delay));
            log::debug!("host: next timer in {:?}", delay);
        }

        Dispatch::Delivered(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::translate::{RawInput, RawKey};

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        screen_lens: Vec<usize>,
        aligned: Vec<bool>,
        replies: Vec<i32>,
        busy: Duration,
    }

    impl Application for Recorder {
        fn update(&mut self, event: &Event, screen: &mut [u8]) -> UpdateStatus {
            self.events.push(event.clone());
            self.screen_lens.push(screen.len());
            self.aligned.push(screen.as_ptr() as usize % 64 == 0);
            screen.fill(0x7F);
            if !self.busy.is_zero() {
                std::thread::sleep(self.busy);
            }
            let rc = if self.replies.is_empty() {
                0
            } else {
                self.replies.remove(0)
            };
            UpdateStatus(rc)
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        presented: Vec<(u32, u32)>,
        flushes: u32,
        exit_requests: u32,
        timers: Vec<Duration>,
    }

    impl Presenter for FakeSurface {
        fn present(&mut self, frame: &FrameBuffer) {
            self.presented.push((frame.width(), frame.height()));
        }

        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    impl HostSurface for FakeSurface {
        fn request_exit(&mut self) {
            self.exit_requests += 1;
        }

        fn schedule_timer(&mut self, delay: Duration) -> TimerId {
            self.timers.push(delay);
            TimerId(self.timers.len() as u64)
        }
    }

    fn params(dt: f64) -> InitParams {
        InitParams {
            width: 640,
            height: 480,
            dt,
        }
    }

    fn raw(input: RawInput, w: u32, h: u32) -> RawEvent {
        RawEvent::new(input, (5, 6), (w, h))
    }

    #[test]
    fn first_event_allocates_frame() {
        let mut host = Host::new(Recorder::default(), params(-1.0));
        let mut s = FakeSurface::default();
        assert!(host.frame().is_none());

        host.handle(&raw(RawInput::Surface, 640, 480), &mut s);

        let fb = host.frame().unwrap();
        assert!(fb.matches(640, 480));
        assert_eq!(host.app().screen_lens, [3 * 640 * 480]);
        assert_eq!(host.app().aligned, [true]);
    }

    #[test]
    fn resize_reallocates_before_update() {
        let mut host = Host::new(Recorder::default(), params(-1.0));
        let mut s = FakeSurface::default();

        host.handle(&raw(RawInput::Motion, 640, 480), &mut s);
        host.handle(&raw(RawInput::Surface, 800, 600), &mut s);

        let last = host.app().events.last().unwrap();
        assert_eq!((last.kind, last.w, last.h), (EventKind::Configure, 800, 600));
        assert_eq!(host.app().screen_lens, [3 * 640 * 480, 3 * 800 * 600]);
        assert_eq!((host.state().width, host.state().height), (800, 600));
        assert!(host.frame().unwrap().matches(800, 600));
    }

    #[test]
    fn redraw_bit_presents_and_flushes() {
        let rec = Recorder {
            replies: vec![1, 0, 3, 2],
            ..Recorder::default()
        };
        let mut host = Host::new(rec, params(-1.0));
        let mut s = FakeSurface::default();

        for _ in 0..4 {
            host.handle(&raw(RawInput::Motion, 4, 3), &mut s);
        }

        assert_eq!(s.presented, [(4, 3), (4, 3)]);
        assert_eq!(s.flushes, 2);
    }

    #[test]
    fn negative_status_quits_and_blocks_later_events() {
        let rec = Recorder {
            replies: vec![-1],
            ..Recorder::default()
        };
        let mut host = Host::new(rec, params(0.01));
        let mut s = FakeSurface::default();
        host.start(&mut s);
        assert_eq!(s.timers.len(), 1);

        let d = host.handle(&raw(RawInput::Timer, 10, 10), &mut s);
        assert_eq!(d, Dispatch::Delivered(UpdateStatus(-1)));
        assert!(host.state().must_quit);
        assert_eq!(s.exit_requests, 1);
        assert!(s.presented.is_empty());
        // No rearm after quitting.
        assert_eq!(s.timers.len(), 1);
        assert_eq!(host.state().pending_timer, None);

        assert_eq!(
            host.handle(&raw(RawInput::Timer, 10, 10), &mut s),
            Dispatch::Ignored
        );
        assert_eq!(host.app().events.len(), 1);
    }

    #[test]
    fn ignored_events_never_reach_module() {
        let mut host = Host::new(Recorder::default(), params(-1.0));
        let mut s = FakeSurface::default();

        let d = host.handle(&raw(RawInput::ButtonRelease { button: 5 }, 10, 10), &mut s);
        assert_eq!(d, Dispatch::Ignored);
        assert!(host.app().events.is_empty());
        assert!(host.frame().is_none());
    }

    #[test]
    fn no_timer_when_dt_negative() {
        let mut host = Host::new(Recorder::default(), params(-1.0));
        let mut s = FakeSurface::default();
        host.start(&mut s);
        host.handle(&raw(RawInput::Motion, 10, 10), &mut s);
        assert!(s.timers.is_empty());
        assert_eq!(host.state().pending_timer, None);
    }

    #[test]
    fn first_timer_uses_dt_with_floor() {
        let mut host = Host::new(Recorder::default(), params(0.0));
        let mut s = FakeSurface::default();
        host.start(&mut s);
        assert_eq!(s.timers, [MIN_TIMER_DELAY]);
        assert_eq!(host.state().pending_timer, Some(TimerId(1)));
    }

    #[test]
    fn only_timer_events_rearm() {
        let mut host = Host::new(Recorder::default(), params(0.5));
        let mut s = FakeSurface::default();

        host.handle(&raw(RawInput::Motion, 10, 10), &mut s);
        host.handle(
            &raw(RawInput::KeyPress(RawKey::default()), 10, 10),
            &mut s,
        );
        assert!(s.timers.is_empty());

        host.handle(&raw(RawInput::Timer, 10, 10), &mut s);
        assert_eq!(s.timers.len(), 1);
        assert!(s.timers[0] <= Duration::from_millis(500));
        assert!(host.state().pending_timer.is_some());
    }

    #[test]
    fn slow_update_shortens_next_delay() {
        let rec = Recorder {
            replies: vec![1],
            busy: Duration::from_millis(200),
            ..Recorder::default()
        };
        let mut host = Host::new(rec, params(0.5));
        let mut s = FakeSurface::default();

        host.handle(&raw(RawInput::Timer, 10, 10), &mut s);

        assert_eq!(s.presented.len(), 1);
        let delay = s.timers[0];
        assert!(delay <= Duration::from_millis(300), "{delay:?}");
        assert!(delay >= MIN_TIMER_DELAY);
    }

    #[test]
    fn delay_computation() {
        let d = next_timer_delay(0.5, Duration::from_millis(200));
        assert!((d.as_secs_f64() - 0.3).abs() < 1e-6, "{d:?}");
        assert_eq!(next_timer_delay(0.5, Duration::from_secs(2)), MIN_TIMER_DELAY);
        assert_eq!(next_timer_delay(0.0, Duration::ZERO), MIN_TIMER_DELAY);
        assert_eq!(
            next_timer_delay(0.0005, Duration::ZERO),
            MIN_TIMER_DELAY
        );
        assert_eq!(next_timer_delay(f64::NAN, Duration::ZERO), MIN_TIMER_DELAY);
    }

    #[test]
    fn huge_periods_saturate() {
        assert_eq!(next_timer_delay(1e300, Duration::ZERO), Duration::MAX);
        assert_eq!(next_timer_delay(1e20, Duration::from_secs(1)), Duration::MAX);
        assert_eq!(next_timer_delay(f64::INFINITY, Duration::ZERO), Duration::MAX);
    }

    #[test]
    fn start_with_huge_period_arms_saturated_timer() {
        let mut host = Host::new(Recorder::default(), params(1e20));
        let mut s = FakeSurface::default();
        host.start(&mut s);
        assert_eq!(s.timers, [Duration::MAX]);

        host.handle(&raw(RawInput::Timer, 10, 10), &mut s);
        assert_eq!(s.timers, [Duration::MAX, Duration::MAX]);
    }

    #[test]
    fn quit_from_input_clears_pending_timer() {
        let rec = Recorder {
            replies: vec![-1],
            ..Recorder::default()
        };
        let mut host = Host::new(rec, params(0.25));
        let mut s = FakeSurface::default();
        host.start(&mut s);
        assert!(host.state().pending_timer.is_some());

        host.handle(&raw(RawInput::KeyPress(RawKey::default()), 10, 10), &mut s);
        assert!(host.state().must_quit);
        assert_eq!(host.state().pending_timer, None);
        assert_eq!(s.exit_requests, 1);
    }
}

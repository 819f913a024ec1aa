use std::rc::Rc;
use std::time::{Duration, Instant};

use ntvhost_core::{Application, FrameBuffer, Host, HostSurface, Presenter, RawEvent, RawInput, TimerId};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::ModifiersState,
    window::{Window, WindowAttributes, WindowId},
};

use crate::error::{PlatformError, PlatformResult};
use crate::events::{button_index, raw_key, wheel_delta, HostUserEvent};
use crate::presenter::SoftbufferPresenter;
use crate::signals::install_ctrlc;

#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
}

/// The single pending one-shot timer.
#[derive(Debug, Default)]
struct TimerSlot {
    deadline: Option<Instant>,
    last_id: u64,
}

impl TimerSlot {
    /// A deadline past what `Instant` can represent never fires.
    fn arm(&mut self, now: Instant, delay: Duration) -> TimerId {
        self.deadline = now.checked_add(delay);
        if self.deadline.is_none() {
            log::debug!("platform: timer delay {:?} out of range, not armed", delay);
        }
        self.last_id = self.last_id.wrapping_add(1);
        TimerId(self.last_id)
    }
}

/// Host environment view over the winit loop for the duration of one dispatch.
struct WinitSurface<'a> {
    event_loop: &'a ActiveEventLoop,
    presenter: Option<&'a mut SoftbufferPresenter>,
    timer: &'a mut TimerSlot,
}

impl Presenter for WinitSurface<'_> {
    fn present(&mut self, frame: &FrameBuffer) {
        if let Some(p) = self.presenter.as_deref_mut() {
            p.present(frame);
        }
    }

    fn flush(&mut self) {
        if let Some(p) = self.presenter.as_deref_mut() {
            p.flush();
        }
    }
}

impl HostSurface for WinitSurface<'_> {
    fn request_exit(&mut self) {
        self.timer.deadline = None;
        self.event_loop.exit();
    }

    fn schedule_timer(&mut self, delay: Duration) -> TimerId {
        self.timer.arm(Instant::now(), delay)
    }
}

struct HostApp<A: Application> {
    host: Host<A>,
    options: WindowOptions,

    window: Option<Rc<Window>>,
    window_id: Option<WindowId>,
    presenter: Option<SoftbufferPresenter>,

    cursor: (i32, i32),
    modifiers: ModifiersState,
    timer: TimerSlot,

    started: bool,
    error: Option<PlatformError>,
}

impl<A: Application> HostApp<A> {
    fn new(host: Host<A>, options: WindowOptions) -> Self {
        Self {
            host,
            options,
            window: None,
            window_id: None,
            presenter: None,
            cursor: (0, 0),
            modifiers: ModifiersState::empty(),
            timer: TimerSlot::default(),
            started: false,
            error: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> PlatformResult<()> {
        let state = self.host.state();
        let attrs = WindowAttributes::default()
            .with_title(self.options.title.clone())
            .with_inner_size(PhysicalSize::new(state.width, state.height));

        let window = Rc::new(event_loop.create_window(attrs)?);
        let presenter = SoftbufferPresenter::new(window.clone())?;

        self.window_id = Some(window.id());
        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }

    #[inline]
    fn surface_size(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|w| {
                let s = w.inner_size();
                (s.width, s.height)
            })
            .unwrap_or((self.host.state().width, self.host.state().height))
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, input: RawInput) {
        let raw = RawEvent::new(input, self.cursor, self.surface_size());
        let mut surface = WinitSurface {
            event_loop,
            presenter: self.presenter.as_mut(),
            timer: &mut self.timer,
        };
        self.host.handle(&raw, &mut surface);
    }

    fn on_window_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.dispatch(event_loop, RawInput::Quit),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.dispatch(event_loop, RawInput::Surface)
            }
            WindowEvent::RedrawRequested => {
                // Expose: show the last frame again without involving the module.
                if let (Some(p), Some(frame)) = (self.presenter.as_mut(), self.host.frame()) {
                    p.present(frame);
                }
            }
            WindowEvent::ModifiersChanged(m) => self.modifiers = m.state(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as i32, position.y as i32);
                self.dispatch(event_loop, RawInput::Motion);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(delta) = wheel_delta(delta) {
                    self.dispatch(event_loop, RawInput::Wheel { delta });
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = button_index(button);
                let input = match state {
                    ElementState::Pressed => RawInput::ButtonPress { button },
                    ElementState::Released => RawInput::ButtonRelease { button },
                };
                self.dispatch(event_loop, input);
            }
            WindowEvent::KeyboardInput {
                event,
                is_synthetic: false,
                ..
            } => {
                let key = raw_key(
                    self.modifiers,
                    event.physical_key,
                    &event.logical_key,
                    event.text.as_deref(),
                );
                let input = match event.state {
                    ElementState::Pressed => RawInput::KeyPress(key),
                    ElementState::Released => RawInput::KeyRelease(key),
                };
                self.dispatch(event_loop, input);
            }
            _ => {}
        }
    }
}

impl<A: Application> ApplicationHandler<HostUserEvent> for HostApp<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("platform: {e}");
            self.error = Some(e);
            event_loop.exit();
            return;
        }

        if !self.started {
            self.started = true;
            let mut surface = WinitSurface {
                event_loop,
                presenter: self.presenter.as_mut(),
                timer: &mut self.timer,
            };
            self.host.start(&mut surface);

            // Make sure the module sees the opening size.
            self.dispatch(event_loop, RawInput::Surface);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }
        self.on_window_event(event_loop, event);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: HostUserEvent) {
        match event {
            HostUserEvent::Quit => self.dispatch(event_loop, RawInput::Quit),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.state().must_quit {
            event_loop.exit();
            return;
        }

        if let Some(deadline) = self.timer.deadline {
            if Instant::now() >= deadline {
                self.timer.deadline = None;
                self.dispatch(event_loop, RawInput::Timer);
            }
        }

        match self.timer.deadline {
            Some(deadline) if !self.host.state().must_quit => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline))
            }
            _ => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

/// Runs the host inside a winit event loop until the module quits.
///
/// Blocks on the calling (main) thread.
pub fn run_winit_app<A: Application>(host: Host<A>, options: WindowOptions) -> PlatformResult<()> {
    let event_loop = EventLoop::<HostUserEvent>::with_user_event().build()?;
    install_ctrlc(event_loop.create_proxy());

    let mut app = HostApp::new(host, options);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

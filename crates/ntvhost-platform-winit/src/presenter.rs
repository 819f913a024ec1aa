use std::num::NonZeroU32;
use std::rc::Rc;

use ntvhost_core::{EncoderChain, FrameBuffer, Presenter, Target};
use softbuffer::{Context, Surface};
use winit::window::Window;

use crate::error::PlatformResult;

/// CPU presentation through softbuffer.
///
/// The softbuffer surface always matches the window's inner size; the encoder chain
/// converts (or rescales) the RGB frame into it. Presentation is synchronous, so
/// `flush` has nothing left to do.
pub struct SoftbufferPresenter {
    window: Rc<Window>,
    _context: Context<Rc<Window>>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    chain: EncoderChain,
    size: Option<(NonZeroU32, NonZeroU32)>,
}

impl SoftbufferPresenter {
    pub fn new(window: Rc<Window>) -> PlatformResult<Self> {
        let context = Context::new(window.clone())?;
        let surface = Surface::new(&context, window.clone())?;

        Ok(Self {
            window,
            _context: context,
            surface,
            chain: EncoderChain::with_defaults(),
            size: None,
        })
    }

    fn try_present(&mut self, frame: &FrameBuffer) -> PlatformResult<()> {
        let inner = self.window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(inner.width), NonZeroU32::new(inner.height))
        else {
            // Minimized.
            return Ok(());
        };

        if self.size != Some((w, h)) {
            self.surface.resize(w, h)?;
            self.size = Some((w, h));
        }

        let mut buffer = self.surface.buffer_mut()?;
        let mut target = Target {
            pixels: &mut *buffer,
            width: w.get(),
            height: h.get(),
        };

        if let Err(e) = self.chain.encode(frame, &mut target) {
            log::debug!("present: frame skipped: {e}");
            return Ok(());
        }

        self.window.pre_present_notify();
        buffer.present()?;
        Ok(())
    }
}

impl Presenter for SoftbufferPresenter {
    fn present(&mut self, frame: &FrameBuffer) {
        if let Err(e) = self.try_present(frame) {
            log::warn!("present: {e}");
        }
    }
}

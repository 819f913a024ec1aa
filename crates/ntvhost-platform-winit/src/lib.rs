mod app;
mod error;
mod events;
mod presenter;
mod signals;

pub use crate::app::{run_winit_app, WindowOptions};
pub use crate::error::{PlatformError, PlatformResult};
pub use crate::events::HostUserEvent;
pub use crate::presenter::SoftbufferPresenter;

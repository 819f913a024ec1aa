#![forbid(unsafe_op_in_unsafe_fn)]

pub mod abi;
pub mod config;
pub mod error;
pub mod event;
pub mod framebuffer;
pub mod host;
pub mod loader;
pub mod present;
pub mod translate;

pub use crate::abi::{InitParams, ModuleState, UpdateStatus};
pub use crate::config::HostConfig;
pub use crate::error::{HostError, HostResult};
pub use crate::event::{Event, EventKind};
pub use crate::framebuffer::FrameBuffer;
pub use crate::host::{Application, AppState, Dispatch, Host, HostSurface, TimerId};
pub use crate::loader::{LibraryNaming, NativeModule};
pub use crate::present::{EncoderChain, Presenter, Target};
pub use crate::translate::{EventTranslator, RawEvent, RawInput, RawKey};

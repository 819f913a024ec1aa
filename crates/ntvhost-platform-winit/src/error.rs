use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("softbuffer error: {0}")]
    Softbuffer(#[from] softbuffer::SoftBufferError),
}

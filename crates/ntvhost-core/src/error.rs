use std::path::PathBuf;

use thiserror::Error;

pub type HostResult<T> = Result<T, HostError>;

/// Fatal host errors.
///
/// Every variant terminates the process with exit code 1. A negative return from the
/// module's `update` entry point is a normal quit and never shows up here.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot load library '{module}'")]
    ModuleNotFound { module: String },

    #[error("cannot find '{symbol}' in '{module}'")]
    SymbolNotFound { module: String, symbol: String },

    #[error("cannot initialise application '{module}'")]
    InitFailed { module: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error [{}]: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

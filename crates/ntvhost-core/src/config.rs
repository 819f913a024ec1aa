use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::abi::InitParams;
use crate::error::{HostError, HostResult};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "NTVHOST_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ntvhost.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Window title prefix; the module name is appended.
    #[serde(default = "default_title")]
    pub title: String,

    /// Size hints passed to `init`.
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Timer hint passed to `init`; negative disables the timer.
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Extra directories searched for modules, after the built-in ones.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_title() -> String {
    "NtvHost".to_string()
}
fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_dt() -> f64 {
    -1.0
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            dt: default_dt(),
            search_paths: Vec::new(),
        }
    }
}

impl HostConfig {
    /// `$NTVHOST_CONFIG` when set, otherwise `ntvhost.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load_or_default(path: &Path) -> HostResult<Self> {
        match fs::read_to_string(path) {
            Ok(s) => {
                let cfg: HostConfig = toml::from_str(&s).map_err(|e| HostError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                log::debug!("config: loaded '{}'", path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(HostError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    #[inline]
    pub fn init_hints(&self) -> InitParams {
        InitParams {
            width: self.width,
            height: self.height,
            dt: self.dt,
        }
    }
}

use std::ffi::{c_char, c_int, CString, OsString};
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::abi::{InitFn, InitParams, ModuleState, UpdateFn, UpdateStatus, INIT_SUFFIX, UPDATE_SUFFIX};
use crate::error::{HostError, HostResult};
use crate::event::Event;
use crate::host::Application;

/* =============================================================================================
   Library naming
   ============================================================================================= */

/// Shared library filename convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryNaming {
    /// `lib<name>.so`
    Unix,
    /// `lib<name>.dylib`
    MacOs,
    /// `<name>.dll`
    Windows,
}

impl LibraryNaming {
    #[inline]
    pub const fn native() -> Self {
        if cfg!(windows) {
            LibraryNaming::Windows
        } else if cfg!(target_os = "macos") {
            LibraryNaming::MacOs
        } else {
            LibraryNaming::Unix
        }
    }

    pub fn file_name(self, module: &str) -> String {
        match self {
            LibraryNaming::Unix => format!("lib{module}.so"),
            LibraryNaming::MacOs => format!("lib{module}.dylib"),
            LibraryNaming::Windows => format!("{module}.dll"),
        }
    }
}

/* =============================================================================================
   Search path
   ============================================================================================= */

/// Directories searched for a module, in order: current directory, the host
/// executable's directory, `PATH` entries (Windows only), then `extra`.
pub fn search_dirs(naming: LibraryNaming, extra: &[PathBuf]) -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));

    search_dirs_from(
        naming,
        std::env::current_dir().ok(),
        exe_dir,
        std::env::var_os("PATH"),
        extra,
    )
}

fn search_dirs_from(
    naming: LibraryNaming,
    cwd: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    path_var: Option<OsString>,
    extra: &[PathBuf],
) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut push = |d: PathBuf| {
        if !dirs.contains(&d) {
            dirs.push(d);
        }
    };

    cwd.into_iter().for_each(&mut push);
    exe_dir.into_iter().for_each(&mut push);

    if naming == LibraryNaming::Windows {
        if let Some(path_var) = path_var {
            std::env::split_paths(&path_var)
                .filter(|p| !p.as_os_str().is_empty() && p.exists())
                .for_each(&mut push);
        }
    }

    extra.iter().cloned().for_each(&mut push);
    dirs
}

/// Full candidate list: every directory joined with `file_name`, then the bare name so
/// the OS loader can apply its own search rules.
pub fn candidates(file_name: &str, dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter()
        .map(|d| d.join(file_name))
        .chain(std::iter::once(PathBuf::from(file_name)))
        .collect()
}

/* =============================================================================================
   Native module
   ============================================================================================= */

/// A loaded module with both entry points bound.
///
/// The library is never unloaded: the module may keep memory and threads alive until the
/// process exits.
pub struct NativeModule {
    name: String,
    path: PathBuf,
    _lib: ManuallyDrop<Library>,
    init: InitFn,
    update: UpdateFn,
    state: Option<ModuleState>,
}

impl NativeModule {
    /// Resolves, loads and binds `name` using the platform's naming and search order.
    pub fn load(name: &str, extra_dirs: &[PathBuf]) -> HostResult<Self> {
        let naming = LibraryNaming::native();
        let file_name = naming.file_name(name);
        let dirs = search_dirs(naming, extra_dirs);
        Self::load_from(name, &candidates(&file_name, &dirs))
    }

    /// Tries each candidate in order; the first one that loads is bound.
    pub fn load_from(name: &str, candidates: &[PathBuf]) -> HostResult<Self> {
        for path in candidates {
            // Safety: loading runs the library's static initialisers.
            match unsafe { Library::new(path) } {
                Ok(lib) => {
                    log::info!("loader: loaded '{}' from '{}'", name, path.display());
                    return Self::bind(name, path.clone(), lib);
                }
                Err(e) => {
                    log::debug!("loader: skip '{}': {}", path.display(), e);
                }
            }
        }

        Err(HostError::ModuleNotFound {
            module: name.to_string(),
        })
    }

    /// Binds `<name>_init` and `<name>_update`; both must exist.
    pub fn bind(name: &str, path: PathBuf, lib: Library) -> HostResult<Self> {
        // Safety: the signatures are the fixed module ABI.
        let init: InitFn = unsafe { bind_symbol(&lib, name, INIT_SUFFIX)? };
        let update: UpdateFn = unsafe { bind_symbol(&lib, name, UPDATE_SUFFIX)? };

        Ok(Self {
            name: name.to_string(),
            path,
            _lib: ManuallyDrop::new(lib),
            init,
            update,
            state: None,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Calls `<name>_init` once with the full argv and the size/timer hints.
    ///
    /// Returned dimensions are floored at 1.
    pub fn init(&mut self, args: &[String], hints: InitParams) -> HostResult<InitParams> {
        let c_args = args
            .iter()
            .map(|a| {
                CString::new(a.as_bytes())
                    .map_err(|_| HostError::InvalidArgument(format!("NUL byte in argument {a:?}")))
            })
            .collect::<HostResult<Vec<_>>>()?;

        let argc = c_int::try_from(c_args.len())
            .map_err(|_| HostError::InvalidArgument("too many arguments".to_string()))?;

        let mut argv: Vec<*const c_char> = c_args.iter().map(|a| a.as_ptr()).collect();
        argv.push(std::ptr::null());

        let mut width = c_int::try_from(hints.width).unwrap_or(c_int::MAX);
        let mut height = c_int::try_from(hints.height).unwrap_or(c_int::MAX);
        let mut dt = hints.dt;

        // Safety: argv and the in/out pointers outlive the call; strings are NUL-terminated.
        let raw = unsafe { (self.init)(argc, argv.as_ptr(), &mut width, &mut height, &mut dt) };

        let state = ModuleState::from_raw(raw).ok_or_else(|| HostError::InitFailed {
            module: self.name.clone(),
        })?;
        self.state = Some(state);

        let params = InitParams {
            width: width.max(1) as u32,
            height: height.max(1) as u32,
            dt,
        };
        log::info!(
            "loader: '{}' initialised {}x{} dt={:.3}",
            self.name,
            params.width,
            params.height,
            params.dt
        );
        Ok(params)
    }
}

impl Application for NativeModule {
    fn update(&mut self, event: &Event, screen: &mut [u8]) -> UpdateStatus {
        let Some(state) = self.state else {
            log::error!("loader: update called on uninitialised module '{}'", self.name);
            return UpdateStatus::QUIT;
        };

        // A C reader stops at the first NUL; hand over exactly that prefix.
        let key_bytes = event.key.split(|&b| b == 0).next().unwrap_or_default();
        let key = CString::new(key_bytes).unwrap_or_default();

        // Safety: `screen` is exactly 3*w*h bytes and stays valid for the whole call;
        // the state handle is forwarded untouched.
        let rc = unsafe {
            (self.update)(
                event.kind.tag().as_ptr(),
                event.x,
                event.y,
                c_int::try_from(event.w).unwrap_or(c_int::MAX),
                c_int::try_from(event.h).unwrap_or(c_int::MAX),
                event.button,
                key.as_ptr(),
                screen.as_mut_ptr(),
                state.as_raw(),
            )
        };
        UpdateStatus(rc)
    }
}

/// # Safety
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn bind_symbol<T: Copy>(lib: &Library, module: &str, suffix: &str) -> HostResult<T> {
    let symbol = format!("{module}{suffix}");

    let mut bytes = Vec::with_capacity(symbol.len() + 1);
    bytes.extend_from_slice(symbol.as_bytes());
    bytes.push(0);

    match unsafe { lib.get::<T>(&bytes) } {
        Ok(sym) => Ok(*sym),
        Err(e) => {
            log::debug!("loader: symbol '{}' lookup failed: {}", symbol, e);
            Err(HostError::SymbolNotFound {
                module: module.to_string(),
                symbol,
            })
        }
    }
}

//! Dynamic module loader: resolves a stage's five ABI entry points from a
//! shared object, `.dll`, or `.dylib`.

use crate::abi::{
    self, PlaceWorkFn, PluginAttachFn, PluginFiniFn, PluginInitFn, PluginWaitFinishedFn,
};
use crate::error::LoaderError;
use libloading::Library;
use std::path::Path;

/// Selects how isolated a loaded stage module's global state is from its
/// siblings (§4.5, §6's `ANALYZER_NAMESPACE_ISOLATION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationMode {
    /// Symbols stay private to the module (`RTLD_LOCAL` on unix). The
    /// default, and the only mode that matches the spec's description of
    /// giving "each stage its own view of process-wide globals".
    Isolated,
    /// Symbols are exported into the process-wide symbol table
    /// (`RTLD_GLOBAL` on unix), matching the source's "classic local-symbol
    /// loader" fallback name only in spirit — call sites should read this
    /// as "not isolated" rather than literally local.
    Classic,
}

impl IsolationMode {
    /// Implements §6's environment contract: absent, or anything other
    /// than `"0"`, selects isolated mode; `"0"` selects classic mode.
    pub fn from_env_var(value: Option<&str>) -> Self {
        match value {
            Some("0") => IsolationMode::Classic,
            _ => IsolationMode::Isolated,
        }
    }
}

/// A stage module resolved through the dynamic loader: the open `Library`
/// (kept alive for as long as the stage is in use) plus its five entry
/// points, copied out of their `Symbol` wrappers as plain function pointers
/// so they outlive the borrow.
pub struct LoadedStage {
    name: String,
    // Never read after construction; exists solely to keep the module
    // mapped for the lifetime of this `LoadedStage`.
    _library: Library,
    init: PluginInitFn,
    attach: PluginAttachFn,
    place_work: PlaceWorkFn,
    wait_finished: PluginWaitFinishedFn,
    fini: PluginFiniFn,
}

impl LoadedStage {
    /// Opens `path` and resolves all five entry points. Missing or
    /// unresolved symbols are a hard error (§4.4 phase 2).
    pub fn open(name: &str, path: &Path, mode: IsolationMode) -> Result<Self, LoaderError> {
        let path_string = path.display().to_string();
        let library = unsafe { open_library(path, mode) }.map_err(|source| LoaderError::Open {
            path: path_string.clone(),
            source,
        })?;

        macro_rules! resolve {
            ($symbol:literal) => {
                unsafe {
                    *library
                        .get(concat!($symbol, "\0").as_bytes())
                        .map_err(|source| LoaderError::MissingSymbol {
                            path: path_string.clone(),
                            symbol: $symbol,
                            source,
                        })?
                }
            };
        }

        let init: PluginInitFn = resolve!("plugin_init");
        let attach: PluginAttachFn = resolve!("plugin_attach");
        let place_work: PlaceWorkFn = resolve!("plugin_place_work");
        let wait_finished: PluginWaitFinishedFn = resolve!("plugin_wait_finished");
        let fini: PluginFiniFn = resolve!("plugin_fini");

        Ok(Self {
            name: name.to_string(),
            _library: library,
            init,
            attach,
            place_work,
            wait_finished,
            fini,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls `plugin_init`.
    pub fn init(&self, queue_size: usize) -> Result<(), String> {
        let raw = unsafe { (self.init)(queue_size) };
        match unsafe { abi::read_optional_error(raw) } {
            None => Ok(()),
            Some(message) => Err(message),
        }
    }

    /// Calls `plugin_attach` with the downstream stage's `plugin_place_work`.
    pub fn attach(&self, next: PlaceWorkFn) {
        unsafe { (self.attach)(next) }
    }

    /// Exposes this stage's own `plugin_place_work`, for the upstream stage
    /// to attach to.
    pub fn place_work_fn(&self) -> PlaceWorkFn {
        self.place_work
    }

    /// Calls `plugin_place_work` directly — used by the driver to feed the
    /// head stage.
    pub fn place_work(&self, line: &[u8]) -> Result<(), String> {
        let raw = unsafe { (self.place_work)(line.as_ptr(), line.len()) };
        match unsafe { abi::read_optional_error(raw) } {
            None => Ok(()),
            Some(message) => Err(message),
        }
    }

    /// Calls `plugin_wait_finished`.
    pub fn wait_finished(&self) -> Result<(), String> {
        let raw = unsafe { (self.wait_finished)() };
        match unsafe { abi::read_optional_error(raw) } {
            None => Ok(()),
            Some(message) => Err(message),
        }
    }

    /// Calls `plugin_fini`.
    pub fn fini(&self) -> Result<(), String> {
        let raw = unsafe { (self.fini)() };
        match unsafe { abi::read_optional_error(raw) } {
            None => Ok(()),
            Some(message) => Err(message),
        }
    }
}

#[cfg(unix)]
unsafe fn open_library(path: &Path, mode: IsolationMode) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_LOCAL, RTLD_NOW};
    let flags = match mode {
        IsolationMode::Isolated => RTLD_NOW | RTLD_LOCAL,
        IsolationMode::Classic => RTLD_NOW | RTLD_GLOBAL,
    };
    UnixLibrary::open(Some(path), flags).map(Library::from)
}

#[cfg(not(unix))]
unsafe fn open_library(path: &Path, _mode: IsolationMode) -> Result<Library, libloading::Error> {
    // Namespace isolation has no equivalent on this platform; fall back to
    // the host's default loader behavior, as §4.5 allows ("where supported").
    Library::new(path)
}

//! Pipeline construction, steady-state feeding, and shutdown (§4.4).

use crate::error::{PipelineError, PipelineResult};
use crate::loader::{IsolationMode, LoadedStage};
use crate::transform::TERMINATOR;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Resolves a stage name from the command line to the module file the
/// loader should open.
///
/// A name containing `/` is used verbatim; a bare name is resolved to
/// `<stage_dir>/<dylib filename for name>` (§6).
pub fn resolve_stage_path(requested: &str, stage_dir: &Path) -> PathBuf {
    if requested.contains('/') {
        PathBuf::from(requested)
    } else {
        stage_dir.join(dylib_filename(requested))
    }
}

/// The directory bare stage names are resolved against: the directory
/// containing the running executable, which is where cargo places sibling
/// `cdylib` build artifacts alongside the driver binary.
pub fn default_stage_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(target_os = "macos")]
fn dylib_filename(name: &str) -> String {
    format!("lib{name}.dylib")
}

#[cfg(all(unix, not(target_os = "macos")))]
fn dylib_filename(name: &str) -> String {
    format!("lib{name}.so")
}

#[cfg(windows)]
fn dylib_filename(name: &str) -> String {
    format!("{name}.dll")
}

/// The ordered, wired sequence of stages that make up a running pipeline.
///
/// Ownership is strictly linear: [`Pipeline::build`] constructs stages in
/// order and [`Pipeline::shutdown`] destroys them in reverse order,
/// consuming `self` so a caller can't feed a line or await a stage that has
/// already been torn down.
pub struct Pipeline {
    stages: Vec<LoadedStage>,
}

impl Pipeline {
    /// Runs phases 1–4 of §4.4: parse is assumed already done by the
    /// caller (`queue_size` and `stage_names` are already validated), so
    /// this runs Load, Initialize, and Wire.
    pub fn build(
        queue_size: usize,
        stage_names: &[String],
        stage_dir: &Path,
        mode: IsolationMode,
    ) -> PipelineResult<Self> {
        // --- Phase 2: Load ---
        let mut stages: Vec<LoadedStage> = Vec::with_capacity(stage_names.len());
        for name in stage_names {
            let path = resolve_stage_path(name, stage_dir);
            info!(stage = %name, path = %path.display(), "loading stage module");
            match LoadedStage::open(name, &path, mode) {
                Ok(stage) => stages.push(stage),
                Err(source) => {
                    error!(stage = %name, error = %source, "failed to load stage module");
                    close_in_reverse(&mut stages);
                    return Err(PipelineError::Load {
                        stage_name: name.clone(),
                        source,
                    });
                }
            }
        }

        // --- Phase 3: Initialize ---
        for k in 0..stages.len() {
            if let Err(message) = stages[k].init(queue_size) {
                let failed_name = stages[k].name().to_string();
                error!(stage = %failed_name, %message, "stage failed to initialize");

                // Roll back stages that did finish initializing, in
                // reverse order, before closing every module.
                for j in (0..k).rev() {
                    if let Err(e) = stages[j].fini() {
                        error!(stage = stages[j].name(), error = %e, "error during init rollback");
                    }
                }
                close_in_reverse(&mut stages);

                return Err(PipelineError::Init {
                    stage_name: failed_name,
                    message,
                });
            }
        }

        // --- Phase 4: Wire ---
        for i in 0..stages.len().saturating_sub(1) {
            let next = stages[i + 1].place_work_fn();
            debug!(from = stages[i].name(), to = stages[i + 1].name(), "wiring stages");
            stages[i].attach(next);
        }

        info!(stage_count = stages.len(), "pipeline wired and ready");
        Ok(Self { stages })
    }

    /// Feeds one line to the head stage (§4.4 phase 5).
    pub fn feed_line(&self, line: &[u8]) -> PipelineResult<()> {
        let head = self
            .stages
            .first()
            .expect("Pipeline::build never produces an empty stage list");
        head.place_work(line).map_err(|message| PipelineError::Feed {
            stage_name: head.name().to_string(),
            message,
        })
    }

    /// Feeds the terminator to the head stage exactly once, per §4.4's
    /// "On the terminator, call place_work(\"<END>\") once and stop reading."
    pub fn feed_terminator(&self) -> PipelineResult<()> {
        self.feed_line(TERMINATOR)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs phases 6–7 of §4.4: await every stage's `finished` gate in
    /// stream order, then finalize in reverse order. Consumes `self` since
    /// a pipeline has nothing left to do afterward.
    pub fn shutdown(mut self) -> PipelineResult<()> {
        let mut first_error: Option<(String, String)> = None;

        // --- Phase 6: Await ---
        for stage in &self.stages {
            if let Err(message) = stage.wait_finished() {
                error!(stage = stage.name(), %message, "wait_finished reported an error");
                first_error.get_or_insert_with(|| (stage.name().to_string(), message));
            } else {
                debug!(stage = stage.name(), "stage finished");
            }
        }

        // --- Phase 7: Finalize ---
        while let Some(stage) = self.stages.pop() {
            let name = stage.name().to_string();
            if let Err(message) = stage.fini() {
                error!(stage = %name, %message, "fini reported an error");
                first_error.get_or_insert_with(|| (name.clone(), message));
            }
            info!(stage = %name, "stage finalized");
            // `stage` drops here, closing its module handle.
        }

        match first_error {
            Some((stage_name, message)) => Err(PipelineError::Shutdown { stage_name, message }),
            None => Ok(()),
        }
    }
}

/// Closes already-opened modules in reverse order, the rollback discipline
/// §4.4 phase 2 and phase 3 both require.
fn close_in_reverse(stages: &mut Vec<LoadedStage>) {
    while let Some(stage) = stages.pop() {
        drop(stage);
    }
}

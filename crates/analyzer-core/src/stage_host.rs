//! The generic worker harness every stage — built-in or plugin — is built
//! on top of.
//!
//! `StageHost<T>` is the "owned instance" the design notes call for: it
//! holds the real [`Channel`], the real worker [`thread::JoinHandle`], and
//! the transform `T`. The only place the C ABI touches this type is the
//! thin `#[no_mangle]` shim each stage crate's `lib.rs` generates with
//! [`crate::stage_plugin`] — `StageHost` itself is plain, safe Rust.

use crate::abi::{self, PlaceWorkFn};
use crate::channel::Channel;
use crate::error::ChannelResult;
use crate::transform::{is_terminator, Transform, TransformOutcome, TERMINATOR};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info_span, warn};

/// Runs a stage's worker thread, joinable channel, and (at most once)
/// forwarding handle to its downstream neighbor.
pub struct StageHost<T: Transform + 'static> {
    name: &'static str,
    channel: Arc<Channel>,
    forward: Arc<OnceLock<PlaceWorkFn>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    transform: Arc<T>,
}

impl<T: Transform + 'static> StageHost<T> {
    /// Allocates the stage's input [`Channel`] and spawns exactly one
    /// worker thread bound to `transform`. This is `plugin_init`'s job per
    /// §4.3: "must allocate the Channel, spawn exactly one worker thread
    /// bound to its transform, and return absence of error."
    pub fn spawn(name: &'static str, queue_size: usize, transform: T) -> ChannelResult<Self> {
        let channel = Arc::new(Channel::new(queue_size)?);
        let forward: Arc<OnceLock<PlaceWorkFn>> = Arc::new(OnceLock::new());
        let transform = Arc::new(transform);

        let worker_channel = Arc::clone(&channel);
        let worker_forward = Arc::clone(&forward);
        let worker_transform = Arc::clone(&transform);

        let handle = thread::Builder::new()
            .name(format!("stage-{name}"))
            .spawn(move || run_worker(name, worker_channel, worker_forward, worker_transform))
            .expect("failed to spawn stage worker thread");

        Ok(Self {
            name,
            channel,
            forward,
            worker: Mutex::new(Some(handle)),
            transform,
        })
    }

    /// Binds the downstream stage's `plugin_place_work` entry point.
    /// `None` marks this as the terminal stage. May be called at most once;
    /// a second call panics, matching "attach semantics" in §4.3 — the
    /// driver never attaches the same stage twice by construction.
    pub fn attach(&self, next: Option<PlaceWorkFn>) {
        if let Some(next) = next {
            self.forward
                .set(next)
                .unwrap_or_else(|_| panic!("stage '{}' was attached more than once", self.name));
        }
    }

    /// Enqueues a line for this stage to process.
    pub fn place_work(&self, line: &[u8]) -> ChannelResult<()> {
        self.channel.put(line)
    }

    /// Blocks until the worker has observed the terminator and exited.
    pub fn wait_finished(&self) {
        self.channel.wait_finished();
    }

    /// Joins the worker thread. Idempotent: calling this more than once
    /// after the first join is a no-op.
    pub fn fini(&self) {
        if let Some(handle) = self.worker.lock().expect("stage mutex poisoned").take() {
            if handle.join().is_err() {
                error!(stage = self.name, "worker thread panicked during shutdown");
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn transform_name(&self) -> &'static str {
        self.transform.name()
    }
}

fn run_worker<T: Transform>(
    name: &'static str,
    channel: Arc<Channel>,
    forward: Arc<OnceLock<PlaceWorkFn>>,
    transform: Arc<T>,
) {
    // One span for the worker's entire lifetime, so a `RUST_LOG=debug` run
    // reads as an ordered per-stage trace rather than an interleaved jumble.
    let span = info_span!("stage_worker", stage = name);
    let _guard = span.enter();

    loop {
        let item = match channel.get() {
            Ok(item) => item,
            Err(_) => {
                warn!(stage = name, "channel closed while waiting; worker exiting");
                break;
            }
        };

        if is_terminator(&item) {
            if let Some(&next) = forward.get() {
                if let Err(message) = forward_line(next, TERMINATOR) {
                    error!(stage = name, error = %message, "failed to forward terminator downstream");
                }
            }
            debug!(stage = name, "observed terminator");
            break;
        }

        match transform.apply(&item) {
            TransformOutcome::Owned(output) => {
                if let Some(&next) = forward.get() {
                    if let Err(message) = forward_line(next, &output) {
                        error!(stage = name, error = %message, "failed to forward line downstream");
                    }
                }
            }
            TransformOutcome::Transient => {
                warn!(stage = name, "transform reported a transient failure; dropping line");
            }
        }
    }

    // Reached on every exit path (terminator observed, or the channel was
    // closed out from under us) — P5 requires this to fire exactly once,
    // which a single call site outside the loop guarantees.
    channel.signal_finished();
}

fn forward_line(next: PlaceWorkFn, line: &[u8]) -> Result<(), String> {
    let raw = unsafe { next(line.as_ptr(), line.len()) };
    match unsafe { abi::read_optional_error(raw) } {
        None => Ok(()),
        Some(message) => Err(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi;
    use std::os::raw::c_char;
    use std::sync::Mutex as StdMutex;

    struct Uppercase;
    impl Transform for Uppercase {
        fn name(&self) -> &'static str {
            "uppercase"
        }
        fn apply(&self, input: &[u8]) -> TransformOutcome {
            TransformOutcome::Owned(input.to_ascii_uppercase())
        }
    }

    // A tiny in-process "next stage" used only to exercise forwarding: a
    // static sink capturing everything passed to its `plugin_place_work`.
    static SINK: StdMutex<Vec<Vec<u8>>> = StdMutex::new(Vec::new());

    unsafe extern "C" fn sink_place_work(ptr: *const u8, len: usize) -> *mut c_char {
        let bytes = std::slice::from_raw_parts(ptr, len).to_vec();
        SINK.lock().unwrap().push(bytes);
        abi::no_error()
    }

    #[test]
    fn forwards_transformed_line_then_terminator_and_signals_finished_once() {
        SINK.lock().unwrap().clear();

        let host = StageHost::spawn("uppercase", 4, Uppercase).unwrap();
        host.attach(Some(sink_place_work as PlaceWorkFn));

        host.place_work(b"hello").unwrap();
        host.place_work(TERMINATOR).unwrap();
        host.wait_finished();
        host.fini();

        let sunk = SINK.lock().unwrap();
        assert_eq!(sunk.as_slice(), &[b"HELLO".to_vec(), TERMINATOR.to_vec()]);
    }

    #[test]
    fn terminal_stage_with_no_attach_still_finishes() {
        let host = StageHost::spawn("sink", 4, Uppercase).unwrap();
        host.place_work(b"quiet").unwrap();
        host.place_work(TERMINATOR).unwrap();
        host.wait_finished();
        host.fini();
    }

    #[test]
    #[should_panic(expected = "attached more than once")]
    fn attach_twice_panics() {
        let host = StageHost::spawn("double-attach", 4, Uppercase).unwrap();
        host.attach(Some(sink_place_work as PlaceWorkFn));
        host.attach(Some(sink_place_work as PlaceWorkFn));
    }
}

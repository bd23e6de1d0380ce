//! The pure `Vec<u8> -> Vec<u8>` contract every stage's transform satisfies.

/// The literal terminator line. Compared byte-for-byte, case-sensitively,
/// with no surrounding whitespace stripped.
pub const TERMINATOR: &[u8] = b"<END>";

/// Returns `true` if `line` is exactly the terminator.
pub fn is_terminator(line: &[u8]) -> bool {
    line == TERMINATOR
}

/// The result of applying a transform to one line.
pub enum TransformOutcome {
    /// The transform produced a new, independently owned line.
    Owned(Vec<u8>),
    /// A transient failure (e.g. a simulated allocation failure) — the
    /// worker logs this and drops the line without forwarding it. The
    /// terminator is never fed through a transform, so this can't be
    /// confused with end-of-stream.
    Transient,
}

/// A pure, non-blocking (save for [`typewriter`'s][crate] documented sleep)
/// mapping from one line to another.
///
/// Implementations run on exactly one worker thread for the lifetime of
/// their stage, so interior mutability is never required for thread safety
/// with respect to the stage itself — `Send + Sync` is still required
/// because [`crate::stage_host::StageHost`] holds the transform behind an
/// `Arc` alongside the rest of its shared state.
pub trait Transform: Send + Sync {
    /// A short, stable name used in log messages.
    fn name(&self) -> &'static str;

    /// Applies the transform to one line. Never called with the terminator;
    /// [`crate::stage_host`]'s worker loop special-cases it before this is
    /// invoked. Implementations still treat a terminator input as a no-op
    /// passthrough, matching the transform contract in §4.3 for anyone
    /// calling the function directly (as the unit tests in each stage crate
    /// do to check idempotence).
    fn apply(&self, input: &[u8]) -> TransformOutcome;
}

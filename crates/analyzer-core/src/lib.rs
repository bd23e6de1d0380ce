//! Core primitives for the streaming text analyzer: the [`gate::Gate`]
//! synchronization primitive, the bounded [`channel::Channel`], the
//! [`stage_host::StageHost`] worker harness every stage is built from, the
//! [`loader`] that resolves stage modules at runtime, and the [`pipeline`]
//! that wires them together.
//!
//! Kept as its own library crate, separate from the `analyzer` binary, so
//! the concurrency and ABI primitives can be unit- and property-tested
//! without touching process argv, stdin, or dynamic loading.

pub mod abi;
pub mod channel;
pub mod error;
pub mod gate;
pub mod loader;
#[macro_use]
pub mod macros;
pub mod pipeline;
pub mod stage_host;
pub mod transform;

pub use channel::Channel;
pub use error::{ChannelError, ChannelResult, LoaderError, PipelineError, PipelineResult};
pub use gate::Gate;
pub use loader::{IsolationMode, LoadedStage};
pub use pipeline::Pipeline;
pub use stage_host::StageHost;
pub use transform::{is_terminator, Transform, TransformOutcome, TERMINATOR};

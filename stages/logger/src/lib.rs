//! `logger`: writes `"[logger] " + s + "\n"` to the process output and
//! passes `s` through unchanged (§4.6).

use analyzer_core::{Transform, TransformOutcome};
use std::io::{self, Write};

#[derive(Default)]
pub struct Logger;

impl Transform for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        let mut out = io::stdout().lock();
        let _ = out.write_all(b"[logger] ");
        let _ = out.write_all(input);
        let _ = out.write_all(b"\n");
        let _ = out.flush();
        TransformOutcome::Owned(input.to_vec())
    }
}

analyzer_core::stage_plugin! {
    name: "logger",
    transform: Logger,
}

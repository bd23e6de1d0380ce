//! `typewriter`: writes `"[typewriter] "` followed by each byte of `s` with
//! a 100 ms pause between bytes, then a newline; returns a copy of `s`.
//! Empty input emits nothing (§4.6) — the only transform with that
//! exception, since an empty line otherwise still gets a log line out of
//! `logger`.

use analyzer_core::{Transform, TransformOutcome};
use std::io::{self, Write};
use std::time::Duration;

const BYTE_PAUSE: Duration = Duration::from_millis(100);

#[derive(Default)]
pub struct Typewriter;

impl Transform for Typewriter {
    fn name(&self) -> &'static str {
        "typewriter"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        if !input.is_empty() {
            let mut out = io::stdout().lock();
            let _ = out.write_all(b"[typewriter] ");
            for (i, byte) in input.iter().enumerate() {
                if i > 0 {
                    std::thread::sleep(BYTE_PAUSE);
                }
                let _ = out.write_all(&[*byte]);
                let _ = out.flush();
            }
            let _ = out.write_all(b"\n");
            let _ = out.flush();
        }
        TransformOutcome::Owned(input.to_vec())
    }
}

analyzer_core::stage_plugin! {
    name: "typewriter",
    transform: Typewriter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_an_independently_owned_copy() {
        match Typewriter.apply(b"hi") {
            TransformOutcome::Owned(out) => assert_eq!(out, b"hi"),
            TransformOutcome::Transient => panic!("typewriter never fails"),
        }
    }

    #[test]
    fn empty_input_still_returns_a_copy() {
        match Typewriter.apply(b"") {
            TransformOutcome::Owned(out) => assert!(out.is_empty()),
            TransformOutcome::Transient => panic!("typewriter never fails"),
        }
    }
}

//! `flipper`: returns the byte-reversed string (§4.6).

use analyzer_core::{Transform, TransformOutcome};

#[derive(Default)]
pub struct Flipper;

impl Transform for Flipper {
    fn name(&self) -> &'static str {
        "flipper"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        let mut out = input.to_vec();
        out.reverse();
        TransformOutcome::Owned(out)
    }
}

analyzer_core::stage_plugin! {
    name: "flipper",
    transform: Flipper,
}

//! `expander`: if `n = 0` returns an empty string; else returns
//! `s[0] + " " + s[1] + " " + ... + s[n-1]`, length `2n-1` (§4.6).

use analyzer_core::{Transform, TransformOutcome};

#[derive(Default)]
pub struct Expander;

impl Transform for Expander {
    fn name(&self) -> &'static str {
        "expander"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        if input.is_empty() {
            return TransformOutcome::Owned(Vec::new());
        }
        let mut out = Vec::with_capacity(2 * input.len() - 1);
        for (i, byte) in input.iter().enumerate() {
            if i > 0 {
                out.push(b' ');
            }
            out.push(*byte);
        }
        TransformOutcome::Owned(out)
    }
}

analyzer_core::stage_plugin! {
    name: "expander",
    transform: Expander,
}

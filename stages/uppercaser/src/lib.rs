//! `uppercaser`: returns `s` with each ASCII letter uppercased, leaving
//! every other byte untouched (§4.6).

use analyzer_core::{Transform, TransformOutcome};

#[derive(Default)]
pub struct Uppercaser;

impl Transform for Uppercaser {
    fn name(&self) -> &'static str {
        "uppercaser"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        TransformOutcome::Owned(input.to_ascii_uppercase())
    }
}

analyzer_core::stage_plugin! {
    name: "uppercaser",
    transform: Uppercaser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn apply(input: &[u8]) -> Vec<u8> {
        match Uppercaser.apply(input) {
            TransformOutcome::Owned(out) => out,
            TransformOutcome::Transient => panic!("uppercaser never fails"),
        }
    }

    #[test]
    fn uppercases_ascii_letters_only() {
        assert_eq!(apply(b"Hello, World! 123"), b"HELLO, WORLD! 123");
    }

    #[test]
    fn non_ascii_bytes_pass_through_unchanged() {
        let input = [b'a', 0xC3, 0xA9, b'B']; // "a" + utf-8 'é' bytes + "B"
        assert_eq!(apply(&input), [b'A', 0xC3, 0xA9, b'B']);
    }

    #[test]
    fn empty_input_passes_through() {
        assert_eq!(apply(b""), b"");
    }

    proptest! {
        #[test]
        fn idempotent_under_composition(bytes: Vec<u8>) {
            let once = apply(&bytes);
            let twice = apply(&once);
            prop_assert_eq!(once, twice);
        }
    }
}

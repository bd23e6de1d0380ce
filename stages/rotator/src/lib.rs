//! `rotator`: if `n <= 1`, returns a copy; else returns `s[n-1] + s[0..n-1]`
//! — a right-rotation by one byte with wraparound (§4.6).

use analyzer_core::{Transform, TransformOutcome};

#[derive(Default)]
pub struct Rotator;

impl Transform for Rotator {
    fn name(&self) -> &'static str {
        "rotator"
    }

    fn apply(&self, input: &[u8]) -> TransformOutcome {
        if input.len() <= 1 {
            return TransformOutcome::Owned(input.to_vec());
        }
        let mut out = Vec::with_capacity(input.len());
        out.push(input[input.len() - 1]);
        out.extend_from_slice(&input[..input.len() - 1]);
        TransformOutcome::Owned(out)
    }
}

analyzer_core::stage_plugin! {
    name: "rotator",
    transform: Rotator,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn apply(input: &[u8]) -> Vec<u8> {
        match Rotator.apply(input) {
            TransformOutcome::Owned(out) => out,
            TransformOutcome::Transient => panic!("rotator never fails"),
        }
    }

    #[test]
    fn rotates_right_by_one_with_wrap() {
        assert_eq!(apply(b"hello"), b"ohell");
    }

    #[test]
    fn length_zero_or_one_is_a_passthrough() {
        assert_eq!(apply(b""), b"");
        assert_eq!(apply(b"x"), b"x");
    }

    proptest! {
        #[test]
        fn n_applications_on_a_length_n_line_is_identity(bytes: Vec<u8>) {
            let n = bytes.len();
            let mut current = bytes.clone();
            for _ in 0..n {
                current = apply(&current);
            }
            prop_assert_eq!(current, bytes);
        }
    }
}

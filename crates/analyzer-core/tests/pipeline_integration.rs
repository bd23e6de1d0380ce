//! Exercises two `stage_plugin!`-generated stages wired together entirely
//! in-process, through their generated C-ABI entry points — the same path
//! the dynamic loader drives, minus the `dlopen` itself. This is the
//! "independently testable without a real `.so` on disk" path the core
//! library is built for.

use analyzer_core::abi::PlaceWorkFn;
use analyzer_core::{Transform, TransformOutcome, TERMINATOR};
use std::os::raw::c_char;
use std::sync::Mutex;

#[derive(Default)]
struct Uppercase;
impl Transform for Uppercase {
    fn name(&self) -> &'static str {
        "uppercase"
    }
    fn apply(&self, input: &[u8]) -> TransformOutcome {
        TransformOutcome::Owned(input.to_ascii_uppercase())
    }
}

#[derive(Default)]
struct Reverse;
impl Transform for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }
    fn apply(&self, input: &[u8]) -> TransformOutcome {
        let mut out = input.to_vec();
        out.reverse();
        TransformOutcome::Owned(out)
    }
}

mod stage_a {
    use super::Uppercase;
    analyzer_core::stage_plugin! {
        name: "stage_a",
        transform: Uppercase,
    }
}

mod stage_b {
    use super::Reverse;
    analyzer_core::stage_plugin! {
        name: "stage_b",
        transform: Reverse,
    }
}

static SINK: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

unsafe extern "C" fn sink_place_work(ptr: *const u8, len: usize) -> *mut c_char {
    let bytes = std::slice::from_raw_parts(ptr, len).to_vec();
    SINK.lock().unwrap().push(bytes);
    std::ptr::null_mut()
}

#[test]
fn two_stage_pipeline_forwards_transformed_lines_then_terminator() {
    unsafe {
        assert!(stage_a::plugin_init(4).is_null());
        assert!(stage_b::plugin_init(4).is_null());

        stage_a::plugin_attach(stage_b::plugin_place_work as PlaceWorkFn);
        stage_b::plugin_attach(sink_place_work as PlaceWorkFn);

        assert!(stage_a::plugin_place_work(b"hello".as_ptr(), 5).is_null());
        assert!(stage_a::plugin_place_work(TERMINATOR.as_ptr(), TERMINATOR.len()).is_null());

        assert!(stage_a::plugin_wait_finished().is_null());
        assert!(stage_b::plugin_wait_finished().is_null());

        assert!(stage_a::plugin_fini().is_null());
        assert!(stage_b::plugin_fini().is_null());
    }

    let sunk = SINK.lock().unwrap();
    assert_eq!(sunk.as_slice(), &[b"OLLEH".to_vec(), TERMINATOR.to_vec()]);
}

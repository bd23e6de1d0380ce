//! Generates the thin C-ABI shim a stage crate's `lib.rs` needs.
//!
//! Expands to a process-wide static [`crate::stage_host::StageHost`] plus
//! the five `#[no_mangle]` `extern "C"` functions the loader resolves by
//! name (§6). Everything past the shim is ordinary, safe Rust inside
//! `StageHost` — this macro exists purely so the five stage crates don't
//! each hand-write the same unsafe boilerplate around it.
#[macro_export]
macro_rules! stage_plugin {
    (name: $name:expr, transform: $transform:ty $(,)?) => {
        static __STAGE_HOST: ::std::sync::OnceLock<$crate::stage_host::StageHost<$transform>> =
            ::std::sync::OnceLock::new();

        fn __host() -> &'static $crate::stage_host::StageHost<$transform> {
            __STAGE_HOST
                .get()
                .expect("plugin_init must be called before any other entry point")
        }

        /// # Safety
        /// Invoked only by the analyzer's dynamic loader, per the plugin ABI.
        #[no_mangle]
        pub unsafe extern "C" fn plugin_init(queue_size: usize) -> *mut ::std::os::raw::c_char {
            match $crate::stage_host::StageHost::spawn($name, queue_size, <$transform>::default())
            {
                Ok(host) => {
                    if __STAGE_HOST.set(host).is_err() {
                        return $crate::abi::leak_error(format!(
                            "{} was already initialized",
                            $name
                        ));
                    }
                    $crate::abi::no_error()
                }
                Err(e) => $crate::abi::leak_error(e.to_string()),
            }
        }

        /// # Safety
        /// `next` must be a valid `plugin_place_work` entry point from a
        /// stage module kept alive for the remaining lifetime of the process.
        #[no_mangle]
        pub unsafe extern "C" fn plugin_attach(next: $crate::abi::PlaceWorkFn) {
            __host().attach(Some(next));
        }

        /// # Safety
        /// `ptr` must be valid for reads of `len` bytes; the callee copies
        /// the bytes before returning and does not retain `ptr`.
        #[no_mangle]
        pub unsafe extern "C" fn plugin_place_work(
            ptr: *const u8,
            len: usize,
        ) -> *mut ::std::os::raw::c_char {
            let line = ::std::slice::from_raw_parts(ptr, len);
            match __host().place_work(line) {
                Ok(()) => $crate::abi::no_error(),
                Err(e) => $crate::abi::leak_error(e.to_string()),
            }
        }

        /// # Safety
        /// Invoked only by the analyzer's dynamic loader.
        #[no_mangle]
        pub unsafe extern "C" fn plugin_wait_finished() -> *mut ::std::os::raw::c_char {
            __host().wait_finished();
            $crate::abi::no_error()
        }

        /// # Safety
        /// Invoked only by the analyzer's dynamic loader.
        #[no_mangle]
        pub unsafe extern "C" fn plugin_fini() -> *mut ::std::os::raw::c_char {
            __host().fini();
            $crate::abi::no_error()
        }
    };
}

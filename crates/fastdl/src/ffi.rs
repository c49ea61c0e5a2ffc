//! C ABI for the host plugin. See `include/fastdl.h`.
//!
//! The host is single threaded, but a `static` must be `Sync`, so the one
//! process-wide engine lives behind a mutex. Panics are caught here and
//! never unwind into the host.

use std::ffi::{CStr, CString, c_char, c_uint};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::slice;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::engine::FastdlEngine;

/// `void (*)(unsigned int level, const char *message)`. The message is only
/// valid for the duration of the call.
pub type LogCallback = extern "C" fn(level: c_uint, message: *const c_char);

/// Routes diagnostics to the host's log callback, or to `tracing` when none
/// is registered.
#[derive(Debug, Default)]
pub struct HostSink {
    callback: Option<LogCallback>,
}

impl DiagnosticSink for HostSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let Some(callback) = self.callback else {
            TracingSink.report(diagnostic);
            return;
        };
        let message = diagnostic.to_string().replace('\0', " ");
        if let Ok(message) = CString::new(message) {
            callback(diagnostic.level() as c_uint, message.as_ptr());
        }
    }
}

static ENGINE: Lazy<Mutex<FastdlEngine<HostSink>>> =
    Lazy::new(|| Mutex::new(FastdlEngine::with_sink(HostSink::default())));

fn with_engine<R>(
    operation: &'static str,
    fallback: R,
    f: impl FnOnce(&mut FastdlEngine<HostSink>) -> R,
) -> R {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        let mut engine = ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut engine)
    }));
    outcome.unwrap_or_else(|_| {
        tracing::error!(operation, "panic caught at the C boundary");
        fallback
    })
}

/// Borrow a C string argument, reporting null or non-UTF-8 input.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn c_str<'a>(
    engine: &mut FastdlEngine<HostSink>,
    operation: &'static str,
    argument: &'static str,
    ptr: *const c_char,
) -> Option<&'a str> {
    let reason = if ptr.is_null() {
        "null pointer"
    } else {
        match unsafe { CStr::from_ptr(ptr) }.to_str() {
            Ok(s) => return Some(s),
            Err(_) => "not valid UTF-8",
        }
    };
    engine.sink_mut().report(Diagnostic::InvalidArgument {
        operation,
        argument,
        reason,
    });
    None
}

/// Start a session and write the NUL-terminated download URL to `out_url`.
///
/// Returns the URL bytes written, excluding the terminator; 0 on misuse or
/// when a session is already active.
///
/// # Safety
///
/// String arguments must be null or NUL-terminated. `out_url` must be null or
/// valid for `out_size` bytes of writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fastdl_init(
    config_dir: *const c_char,
    game_dir: *const c_char,
    out_url: *mut c_char,
    out_size: c_uint,
) -> c_uint {
    const OP: &str = "fastdl_init";
    with_engine(OP, 0, |engine| {
        let Some(config_dir) = (unsafe { c_str(engine, OP, "config_dir", config_dir) }) else {
            return 0;
        };
        let Some(game_dir) = (unsafe { c_str(engine, OP, "gamedir", game_dir) }) else {
            return 0;
        };
        if out_url.is_null() || out_size == 0 {
            engine.sink_mut().report(Diagnostic::InvalidArgument {
                operation: OP,
                argument: "out_url",
                reason: "no room for the terminator",
            });
            return 0;
        }

        // One byte stays reserved for the terminator.
        let capacity = out_size as usize - 1;
        let result = {
            let out = unsafe { slice::from_raw_parts_mut(out_url.cast::<u8>(), capacity) };
            engine.init(Path::new(config_dir), Path::new(game_dir), out)
        };
        match result {
            Ok(copy) => {
                unsafe { out_url.add(copy.written).write(0) };
                copy.written as c_uint
            }
            Err(error) => {
                engine.sink_mut().report(Diagnostic::Refused { operation: OP, error });
                0
            }
        }
    })
}

/// Offer a precached resource for whitelisting. `prefix` is the host's
/// category hint: `"sound"`, `""`, or a category name.
///
/// # Safety
///
/// Both arguments must be null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fastdl_insert_to_whitelist(prefix: *const c_char, path: *const c_char) {
    const OP: &str = "fastdl_insert_to_whitelist";
    with_engine(OP, (), |engine| {
        let Some(prefix) = (unsafe { c_str(engine, OP, "prefix", prefix) }) else {
            return;
        };
        let Some(path) = (unsafe { c_str(engine, OP, "path", path) }) else {
            return;
        };
        engine.classify_and_insert(prefix, path);
    });
}

/// End the session, publishing the final manifest. Safe to call twice.
#[unsafe(no_mangle)]
pub extern "C" fn fastdl_deinit() {
    with_engine("fastdl_deinit", (), |engine| engine.deinit());
}

/// Send diagnostics to `callback` instead of `tracing`; NULL restores the
/// default. The callback must not call back into fastdl.
#[unsafe(no_mangle)]
pub extern "C" fn fastdl_set_log_callback(callback: Option<LogCallback>) {
    with_engine("fastdl_set_log_callback", (), |engine| {
        engine.sink_mut().callback = callback;
    });
}

//! FFI bindings for Eventgrid
//!
//! This module provides C-compatible functions for calling Eventgrid from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `grid_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::error::GridError;
use crate::events::{DescriptionContext, Event};
use crate::report::{GridProcessor, ReportRequest};
use crate::types::ReportKind;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result back across the boundary, recording the error on failure
fn finish(result: Result<String, GridError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn build_with(
    processor: &GridProcessor,
    kind: &str,
    request_json: &str,
) -> Result<String, GridError> {
    let kind: ReportKind = kind.parse()?;
    let request: ReportRequest = serde_json::from_str(request_json)?;
    let report = processor.build(kind, &request)?;
    Ok(serde_json::to_string(&report)?)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build a report and return it as JSON.
///
/// # Safety
/// - `kind` and `request_json` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `grid_free_string`.
/// - Returns NULL on error; call `grid_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn grid_build_report(
    kind: *const c_char,
    request_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let kind_str = match cstr_to_string(kind) {
        Some(s) => s,
        None => {
            set_last_error("Invalid kind string pointer");
            return ptr::null_mut();
        }
    };

    let request_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    let processor = match cstr_to_string(config_json) {
        Some(config) => match GridProcessor::from_config_json(&config) {
            Ok(p) => p,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => GridProcessor::new(),
    };

    finish(build_with(&processor, &kind_str, &request_str))
}

#[derive(Serialize)]
struct EventSummary {
    description: Option<String>,
    edit_uri: Option<String>,
    transcript: Option<String>,
}

/// Describe a raw app event.
///
/// Returns `{"description", "edit_uri", "transcript"}` as JSON; each field is
/// null when the event kind has no such value.
///
/// # Safety
/// - `event_json` must be a valid null-terminated C string.
/// - `context_json` and `user_id` may be NULL.
/// - Returns a newly allocated string that must be freed with `grid_free_string`.
/// - Returns NULL on error; call `grid_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn grid_describe_event(
    event_json: *const c_char,
    context_json: *const c_char,
    user_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let event_str = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid event string pointer");
            return ptr::null_mut();
        }
    };
    let context_str = cstr_to_string(context_json);
    let user = cstr_to_string(user_id);

    let result = (|| -> Result<String, GridError> {
        let ctx: DescriptionContext = match context_str {
            Some(json) => serde_json::from_str(&json)?,
            None => DescriptionContext::default(),
        };
        let event = Event::from_json(&event_str)?;
        let summary = EventSummary {
            description: event.description(&ctx)?,
            edit_uri: user.as_deref().and_then(|u| event.edit_uri(u)),
            transcript: event.transcript(),
        };
        Ok(serde_json::to_string(&summary)?)
    })();

    finish(result)
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a GridProcessor
pub struct GridProcessorHandle {
    processor: GridProcessor,
}

/// Create a new GridProcessor.
///
/// # Safety
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a pointer to a newly allocated GridProcessor.
/// - Must be freed with `grid_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn grid_processor_new(config_json: *const c_char) -> *mut GridProcessorHandle {
    clear_last_error();

    let processor = match cstr_to_string(config_json) {
        Some(config) => match GridProcessor::from_config_json(&config) {
            Ok(p) => p,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => GridProcessor::new(),
    };

    Box::into_raw(Box::new(GridProcessorHandle { processor }))
}

/// Free a GridProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `grid_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn grid_processor_free(processor: *mut GridProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Build a report with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `grid_processor_new`.
/// - `kind` and `request_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `grid_free_string`.
/// - Returns NULL on error; call `grid_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn grid_processor_build(
    processor: *mut GridProcessorHandle,
    kind: *const c_char,
    request_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let kind_str = match cstr_to_string(kind) {
        Some(s) => s,
        None => {
            set_last_error("Invalid kind string pointer");
            return ptr::null_mut();
        }
    };

    let request_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    finish(build_with(&handle.processor, &kind_str, &request_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Eventgrid functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Eventgrid function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn grid_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Eventgrid call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn grid_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Eventgrid library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn grid_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

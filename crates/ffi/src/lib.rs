// ABOUTME: C FFI bindings for the NeuroFlow engine.
// ABOUTME: Runs page commands and reader extraction over HTML snapshots with arena-allocated results.

use std::cell::RefCell;
use std::panic;
use std::ptr;

use bumpalo::Bump;
use neuroflow_engine::{
    extract_reader_region, Command, DetectionSource, Dispatcher, EngineError, ErrorCode, Options,
    Outcome, Page,
};
use serde_json::Value;

/// FFI version constant for ABI compatibility checking.
pub const NEUROFLOW_FFI_VERSION: u32 = 1;

/// Returns the FFI ABI version number.
/// Consumers should check this matches their expected version.
#[no_mangle]
pub extern "C" fn neuroflow_ffi_version() -> u32 {
    NEUROFLOW_FFI_VERSION
}

// ----------------------------------------------------------------------------
// Error handling
// ----------------------------------------------------------------------------

/// Error codes matching the C ABI NErrorCode enum.
#[repr(u32)]
pub enum NErrorCode {
    Ok = 0,
    Parse = 1,
    Detached = 2,
    Config = 3,
    Command = 4,
    Invalid = 5,
    Internal = 255,
}

/// UTF-8 string slice for FFI. Not null-terminated.
/// Consumer must not mutate or free; memory owned by arena.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct NString {
    pub data: *const u8,
    pub len: usize,
}

impl NString {
    /// Creates an empty NString with null pointer and zero length.
    pub const fn empty() -> Self {
        NString {
            data: ptr::null(),
            len: 0,
        }
    }
}

impl Default for NString {
    fn default() -> Self {
        Self::empty()
    }
}

/// FFI error struct matching C ABI NError.
#[repr(C)]
pub struct NError {
    pub code: u32,
    pub message: NString,
}

impl NError {
    /// Creates a success (N_OK) error with empty message.
    pub const fn ok() -> Self {
        NError {
            code: NErrorCode::Ok as u32,
            message: NString::empty(),
        }
    }
}

// ----------------------------------------------------------------------------
// Result views
// ----------------------------------------------------------------------------

/// The page after a command ran.
#[repr(C)]
pub struct NPageView {
    /// Serialized page.
    pub html: NString,
    /// Outcome name, e.g. "annotated" or "unchanged".
    pub outcome: NString,
    /// Words emphasized or markers restored, 0 for other outcomes.
    pub annotated: u64,
}

/// The sanitized main-content region of a page.
#[repr(C)]
pub struct NReaderView {
    pub html: NString,
    pub text: NString,
    /// "article", "scored" or "body".
    pub source: NString,
    pub removed: u64,
}

/// Arena holding a command result.
pub struct NPageArena {
    #[allow(dead_code)]
    bump: Bump,
    view: *const NPageView,
}

/// Arena holding a reader extraction result.
pub struct NReaderArena {
    #[allow(dead_code)]
    bump: Bump,
    view: *const NReaderView,
}

// ----------------------------------------------------------------------------
// Helper functions
// ----------------------------------------------------------------------------

/// Copies a string into the arena and returns an NString pointing to it.
fn copy_str_to_arena(bump: &Bump, s: &str) -> NString {
    if s.is_empty() {
        return NString::empty();
    }
    let bytes = bump.alloc_slice_copy(s.as_bytes());
    NString {
        data: bytes.as_ptr(),
        len: bytes.len(),
    }
}

fn make_page_view(bump: &Bump, page: &Page, outcome: &Outcome) -> *const NPageView {
    let annotated = match outcome {
        Outcome::Annotated(summary) => summary.emphasized_words as u64,
        Outcome::Restored(summary) => summary.restored as u64,
        _ => 0,
    };
    let view = bump.alloc(NPageView {
        html: copy_str_to_arena(bump, &page.html()),
        outcome: copy_str_to_arena(bump, outcome.name()),
        annotated,
    });
    view as *const NPageView
}

fn source_name(source: DetectionSource) -> &'static str {
    match source {
        DetectionSource::Article => "article",
        DetectionSource::Scored(_) => "scored",
        DetectionSource::BodyFallback => "body",
    }
}

/// Maps an engine error code to an NErrorCode.
fn map_error_code(code: ErrorCode) -> u32 {
    match code {
        ErrorCode::Parse => NErrorCode::Parse as u32,
        ErrorCode::Detached => NErrorCode::Detached as u32,
        ErrorCode::Config => NErrorCode::Config as u32,
        ErrorCode::Command => NErrorCode::Command as u32,
        ErrorCode::Io => NErrorCode::Internal as u32,
    }
}

thread_local! {
    // Backing storage for the last error message handed out on this thread.
    static LAST_ERROR: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// Sets the out_err with the given code and message.
/// The message stays valid until the next failing call on the same thread.
/// If out_err is null, this is a no-op.
unsafe fn set_error(out_err: *mut NError, code: u32, message: &str) {
    if out_err.is_null() {
        return;
    }
    (*out_err).code = code;
    (*out_err).message = LAST_ERROR.with(|buf| {
        let mut buf = buf.borrow_mut();
        buf.clear();
        buf.extend_from_slice(message.as_bytes());
        if buf.is_empty() {
            NString::empty()
        } else {
            NString {
                data: buf.as_ptr(),
                len: buf.len(),
            }
        }
    });
}

/// Sets out_err to success (N_OK with empty message).
/// If out_err is null, this is a no-op.
unsafe fn set_success(out_err: *mut NError) {
    if !out_err.is_null() {
        (*out_err).code = NErrorCode::Ok as u32;
        (*out_err).message = NString::empty();
    }
}

fn run_command(html: &[u8], action: &str, payload: &Value) -> Result<(Page, Outcome), EngineError> {
    let cmd = Command::from_message(action, payload)?;
    let page = Page::from_bytes(html, None);
    let mut dispatcher = Dispatcher::new(Options::default());
    let outcome = dispatcher.dispatch(&page, cmd)?;
    Ok((page, outcome))
}

// ----------------------------------------------------------------------------
// Command FFI functions
// ----------------------------------------------------------------------------

/// Runs one extension command over a page snapshot.
///
/// # Arguments
/// * `html` - HTML content bytes (any charset; sniffed when not UTF-8)
/// * `html_len` - Length of HTML in bytes
/// * `action` - Wire name, e.g. `TOGGLE_BIONIC` (UTF-8)
/// * `action_len` - Length of action in bytes
/// * `payload` - JSON payload bytes (UTF-8); may be null for no payload
/// * `payload_len` - Length of payload in bytes
/// * `out_err` - Output error struct (may be null)
///
/// # Returns
/// Pointer to NPageArena on success, null on failure.
/// On failure, out_err (if non-null) contains error details.
///
/// # Safety
/// Caller must free the returned arena via neuroflow_free_page.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_run_command(
    html: *const u8,
    html_len: usize,
    action: *const u8,
    action_len: usize,
    payload: *const u8,
    payload_len: usize,
    out_err: *mut NError,
) -> *mut NPageArena {
    if html.is_null() || html_len == 0 {
        set_error(out_err, NErrorCode::Invalid as u32, "html is null or empty");
        return ptr::null_mut();
    }
    if action.is_null() || action_len == 0 {
        set_error(out_err, NErrorCode::Invalid as u32, "action is null or empty");
        return ptr::null_mut();
    }

    let action_slice = std::slice::from_raw_parts(action, action_len);
    let action_str = match std::str::from_utf8(action_slice) {
        Ok(s) => s,
        Err(_) => {
            set_error(out_err, NErrorCode::Invalid as u32, "action is not valid UTF-8");
            return ptr::null_mut();
        }
    };

    let payload_value = if payload.is_null() || payload_len == 0 {
        Value::Null
    } else {
        let payload_slice = std::slice::from_raw_parts(payload, payload_len);
        match serde_json::from_slice::<Value>(payload_slice) {
            Ok(v) => v,
            Err(e) => {
                let msg = format!("payload is not valid JSON: {}", e);
                set_error(out_err, NErrorCode::Parse as u32, &msg);
                return ptr::null_mut();
            }
        }
    };

    let html_slice = std::slice::from_raw_parts(html, html_len);

    // Catch panics to avoid unwinding across FFI boundary
    let result = panic::catch_unwind(|| {
        run_command(html_slice, action_str, &payload_value).map(|(page, outcome)| {
            let bump = Bump::new();
            let view = make_page_view(&bump, &page, &outcome);
            NPageArena { bump, view }
        })
    });

    match result {
        Ok(Ok(arena)) => {
            set_success(out_err);
            Box::into_raw(Box::new(arena))
        }
        Ok(Err(engine_err)) => {
            let code = map_error_code(engine_err.code);
            let msg = engine_err.to_string();
            set_error(out_err, code, &msg);
            ptr::null_mut()
        }
        Err(_) => {
            set_error(
                out_err,
                NErrorCode::Internal as u32,
                "internal panic while running command",
            );
            ptr::null_mut()
        }
    }
}

/// Returns a pointer to the NPageView inside the arena.
///
/// # Safety
/// The arena pointer must be valid and non-null.
/// The returned pointer is valid until neuroflow_free_page is called.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_page_result(arena: *const NPageArena) -> *const NPageView {
    if arena.is_null() {
        return ptr::null();
    }
    (*arena).view
}

/// Frees the page arena and all associated allocations.
///
/// # Safety
/// The arena pointer must have been returned by neuroflow_run_command.
/// After this call, the arena pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_free_page(arena: *mut NPageArena) {
    if !arena.is_null() {
        drop(Box::from_raw(arena));
    }
}

// ----------------------------------------------------------------------------
// Reader FFI functions
// ----------------------------------------------------------------------------

/// Extracts the sanitized main-content region of a page snapshot.
///
/// # Safety
/// Caller must free the returned arena via neuroflow_free_reader.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_extract_reader(
    html: *const u8,
    html_len: usize,
    out_err: *mut NError,
) -> *mut NReaderArena {
    if html.is_null() || html_len == 0 {
        set_error(out_err, NErrorCode::Invalid as u32, "html is null or empty");
        return ptr::null_mut();
    }
    let html_slice = std::slice::from_raw_parts(html, html_len);

    let result = panic::catch_unwind(|| {
        let page = Page::from_bytes(html_slice, None);
        let region = extract_reader_region(page.document(), &Options::default());
        let bump = Bump::new();
        let view = bump.alloc(NReaderView {
            html: copy_str_to_arena(&bump, &region.html()),
            text: copy_str_to_arena(&bump, &region.text()),
            source: copy_str_to_arena(&bump, source_name(region.source)),
            removed: region.removed as u64,
        }) as *const NReaderView;
        NReaderArena { bump, view }
    });

    match result {
        Ok(arena) => {
            set_success(out_err);
            Box::into_raw(Box::new(arena))
        }
        Err(_) => {
            set_error(
                out_err,
                NErrorCode::Internal as u32,
                "internal panic during extraction",
            );
            ptr::null_mut()
        }
    }
}

/// Returns a pointer to the NReaderView inside the arena.
///
/// # Safety
/// The arena pointer must be valid and non-null.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_reader_result(arena: *const NReaderArena) -> *const NReaderView {
    if arena.is_null() {
        return ptr::null();
    }
    (*arena).view
}

/// Frees the reader arena.
///
/// # Safety
/// The arena pointer must have been returned by neuroflow_extract_reader.
#[no_mangle]
pub unsafe extern "C" fn neuroflow_free_reader(arena: *mut NReaderArena) {
    if !arena.is_null() {
        drop(Box::from_raw(arena));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

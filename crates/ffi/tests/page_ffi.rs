// ABOUTME: Integration tests for the NeuroFlow FFI command and reader functions.
// ABOUTME: Calls the C ABI functions directly and reads results back out of the arenas.

use std::ptr;
use std::slice;
use std::str;

use neuroflow_ffi::{
    neuroflow_extract_reader, neuroflow_free_page, neuroflow_free_reader, neuroflow_page_result,
    neuroflow_reader_result, neuroflow_run_command, NError, NErrorCode, NString,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>FFI page</title></head>
<body>
<nav><a href="/">Home</a></nav>
<article>
<h1>Gentle reading</h1>
<p style="font-size: 8px">Words arrive one at a time.</p>
<div class="social-share">Share this</div>
</article>
</body></html>"#;

/// Helper to convert an NString to a &str for assertions.
unsafe fn nstring_to_str(ns: &NString) -> &str {
    if ns.data.is_null() || ns.len == 0 {
        return "";
    }
    let slice = slice::from_raw_parts(ns.data, ns.len);
    str::from_utf8(slice).unwrap_or("")
}

fn new_err() -> NError {
    NError {
        code: NErrorCode::Internal as u32,
        message: NString::empty(),
    }
}

unsafe fn run(html: &str, action: &str, payload: Option<&str>, err: &mut NError) -> *mut neuroflow_ffi::NPageArena {
    let (p, plen) = match payload {
        Some(p) => (p.as_ptr(), p.len()),
        None => (ptr::null(), 0),
    };
    neuroflow_run_command(html.as_ptr(), html.len(), action.as_ptr(), action.len(), p, plen, err)
}

#[test]
fn test_toggle_bionic_round_trip() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "TOGGLE_BIONIC", Some(r#"{"value": true}"#), &mut err);
        assert!(!arena.is_null(), "arena should not be null on success");
        assert_eq!(err.code, NErrorCode::Ok as u32);

        let view = neuroflow_page_result(arena);
        assert!(!view.is_null());
        assert_eq!(nstring_to_str(&(*view).outcome), "annotated");
        assert!((*view).annotated > 0);
        let marked = nstring_to_str(&(*view).html).to_string();
        assert!(marked.contains(r#"<b class="nf-bionic">Gen</b>tle"#));
        neuroflow_free_page(arena);

        let arena = run(&marked, "TOGGLE_BIONIC", Some(r#"{"value": false}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "restored");
        let plain = nstring_to_str(&(*view).html);
        assert!(!plain.contains("nf-bionic"));
        assert!(plain.contains("<h1>Gentle reading</h1>"));
        neuroflow_free_page(arena);
    }
}

#[test]
fn test_focus_view_then_close_on_snapshot() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "TOGGLE_CLUTTER_FREE", Some(r#"{"value": true}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "reader-opened");
        let opened = nstring_to_str(&(*view).html).to_string();
        assert!(opened.contains("nf-reader-overlay"));
        neuroflow_free_page(arena);

        let arena = run(&opened, "TOGGLE_CLUTTER_FREE", Some(r#"{"value": false}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "reader-closed");
        assert!(!nstring_to_str(&(*view).html).contains("nf-scroll-lock"));
        neuroflow_free_page(arena);
    }
}

#[test]
fn test_reader_actions_on_snapshot() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "TOGGLE_CLUTTER_FREE", Some(r#"{"value": true}"#), &mut err);
        let opened = nstring_to_str(&(*neuroflow_page_result(arena)).html).to_string();
        neuroflow_free_page(arena);

        let arena = run(&opened, "TOGGLE_CLUTTER_FREE", Some(r#"{"value": true}"#), &mut err);
        assert_eq!(nstring_to_str(&(*neuroflow_page_result(arena)).outcome), "unchanged");
        neuroflow_free_page(arena);

        let arena = run(&opened, "READER_ACTION", Some(r#"{"action": "font-increase"}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "reader-updated");
        let grown = nstring_to_str(&(*view).html).to_string();
        assert!(grown.contains("font-size: 20px"));
        neuroflow_free_page(arena);

        let arena = run(&grown, "READER_ACTION", Some(r#"{"action": "escape"}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "reader-closed");
        let closed = nstring_to_str(&(*view).html);
        assert!(closed.contains("hidden"));
        assert!(!closed.contains("nf-scroll-lock"));
        neuroflow_free_page(arena);
    }
}

#[test]
fn test_second_bionic_toggle_is_unchanged() {
    unsafe {
        let mut err = new_err();
        let arena = run("<p>hello world</p>", "TOGGLE_BIONIC", Some(r#"{"value": true}"#), &mut err);
        let once = nstring_to_str(&(*neuroflow_page_result(arena)).html).to_string();
        neuroflow_free_page(arena);
        assert!(once.contains(r#"<b class="nf-bionic">hel</b>lo"#));

        let arena = run(&once, "TOGGLE_BIONIC", Some(r#"{"value": true}"#), &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "unchanged");
        assert_eq!(nstring_to_str(&(*view).html), once);
        neuroflow_free_page(arena);
    }
}

#[test]
fn test_panic_without_payload() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "TRIGGER_PANIC", None, &mut err);
        assert!(!arena.is_null());
        let view = neuroflow_page_result(arena);
        assert_eq!(nstring_to_str(&(*view).outcome), "calm-shown");
        assert!(nstring_to_str(&(*view).html).contains("nf-calm-overlay"));
        neuroflow_free_page(arena);
    }
}

#[test]
fn test_unknown_action_sets_error() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "OPEN_POPUP", None, &mut err);
        assert!(arena.is_null());
        assert_eq!(err.code, NErrorCode::Command as u32);
        assert!(nstring_to_str(&err.message).contains("OPEN_POPUP"));
    }
}

#[test]
fn test_bad_payload_sets_parse_error() {
    unsafe {
        let mut err = new_err();
        let arena = run(PAGE, "TOGGLE_BIONIC", Some("{value"), &mut err);
        assert!(arena.is_null());
        assert_eq!(err.code, NErrorCode::Parse as u32);
        assert!(!nstring_to_str(&err.message).is_empty());
    }
}

#[test]
fn test_null_inputs_are_invalid() {
    unsafe {
        let mut err = new_err();
        let action = "TOGGLE_BIONIC";
        let arena = neuroflow_run_command(
            ptr::null(),
            0,
            action.as_ptr(),
            action.len(),
            ptr::null(),
            0,
            &mut err,
        );
        assert!(arena.is_null());
        assert_eq!(err.code, NErrorCode::Invalid as u32);

        let reader = neuroflow_extract_reader(ptr::null(), 0, ptr::null_mut());
        assert!(reader.is_null());
        assert!(neuroflow_page_result(ptr::null()).is_null());
        neuroflow_free_page(ptr::null_mut());
    }
}

#[test]
fn test_extract_reader() {
    unsafe {
        let mut err = new_err();
        let arena = neuroflow_extract_reader(PAGE.as_ptr(), PAGE.len(), &mut err);
        assert!(!arena.is_null());
        assert_eq!(err.code, NErrorCode::Ok as u32);

        let view = neuroflow_reader_result(arena);
        assert_eq!(nstring_to_str(&(*view).source), "article");
        assert_eq!((*view).removed, 1);
        assert_eq!(
            nstring_to_str(&(*view).text),
            "Gentle reading Words arrive one at a time."
        );
        let html = nstring_to_str(&(*view).html);
        assert!(!html.contains("style="));
        assert!(!html.contains("Share this"));
        neuroflow_free_reader(arena);
    }
}

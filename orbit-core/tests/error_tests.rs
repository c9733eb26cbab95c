//! Integration tests for error handling

use orbit_core::error::{OrbitError, ResultExt};
use orbit_core::session::FailureKind;

#[test]
fn test_error_context_chaining() {
    let base_error = OrbitError::encode("Codec not found");
    let with_context = base_error.with_context("Failed to initialize encoder");

    let msg = format!("{}", with_context);
    assert!(msg.contains("Failed to initialize encoder"));
    assert!(msg.contains("Codec not found"));
}

#[test]
fn test_error_context_preserves_hint() {
    let base_error = OrbitError::device("Camera busy");
    let hint_before = base_error.user_hint();

    let with_context = base_error.with_context("Starting camera");
    let hint_after = with_context.user_hint();

    assert_eq!(hint_before, hint_after);
}

#[test]
fn test_result_ext_context() {
    let result: Result<(), OrbitError> = Err(OrbitError::ipc("Connection reset"));
    let err = result.context("Delivering surface message").unwrap_err();

    let msg = format!("{}", err);
    assert!(msg.contains("Delivering surface message"));
    assert!(matches!(err.root(), OrbitError::Ipc(_)));
}

#[test]
fn test_user_hints() {
    let err = OrbitError::permission("screen recording");
    assert!(err.user_hint().unwrap().contains("relaunch"));

    let err = OrbitError::source_not_found("window:1");
    assert!(err.user_hint().unwrap().contains("Pick the source again"));

    let err = OrbitError::config("test");
    assert!(err.user_hint().unwrap().contains("config.toml"));

    let err = OrbitError::save("test");
    assert!(err.user_hint().unwrap().contains("writable"));
}

#[test]
fn test_user_message_includes_hint() {
    let err = OrbitError::device("camera busy");
    let message = err.user_message();
    assert!(message.starts_with("Device unavailable: camera busy. "));
    assert!(message.ends_with("connected and allowed."));
}

#[test]
fn test_error_display_format() {
    let err = OrbitError::source_not_found("window:42");
    assert_eq!(format!("{}", err), "Source not found: window:42");

    let err = OrbitError::surface("no display");
    assert_eq!(format!("{}", err), "Surface creation failed: no display");

    let err = OrbitError::encode("Invalid codec");
    assert_eq!(format!("{}", err), "Encoder error: Invalid codec");
}

#[test]
fn test_nested_context() {
    let err = OrbitError::save("Disk full")
        .with_context("Writing vid-1.webm")
        .with_context("Finishing recording");

    let msg = format!("{}", err);
    assert!(msg.starts_with("Finishing recording"));
    assert!(matches!(err.root(), OrbitError::Save(_)));
    assert_eq!(err.detail(), "Finishing recording: Writing vid-1.webm: Disk full");
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let orbit_err: OrbitError = io_err.into();

    let msg = format!("{}", orbit_err);
    assert!(msg.contains("I/O error"));
    assert!(msg.contains("File not found"));
    assert_eq!(FailureKind::of(&orbit_err), FailureKind::Save);
}

#[test]
fn test_failure_kind_round_trip() {
    for kind in [
        FailureKind::Source,
        FailureKind::Device,
        FailureKind::Permission,
        FailureKind::Encode,
        FailureKind::Save,
    ] {
        let err = kind.into_error("reason");
        assert_eq!(FailureKind::of(&err), kind);
        assert_eq!(err.detail(), "reason");
    }
}

#[test]
fn test_json_error_is_ipc() {
    let err: OrbitError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, OrbitError::Ipc(_)));
    assert!(err.to_string().contains("Malformed message"));
}

//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_asset_not_found_display() {
    let err = Error::AssetNotFound("world/wmo/inn.wmo".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Asset not found"));
    assert!(display.contains("world/wmo/inn.wmo"));
}

#[test]
fn test_asset_load_failed_display() {
    let err = Error::AssetLoadFailed("connection reset".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Asset load failed"));
    assert!(display.contains("connection reset"));
}

#[test]
fn test_malformed_bsp_display() {
    let err = Error::MalformedBsp("cycle at node 3".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Malformed BSP tree"));
    assert!(display.contains("cycle at node 3"));
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("portal range out of bounds".to_string());
    assert_eq!(format!("{}", err), "Invalid resource: portal range out of bounds");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::MalformedBsp("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::AssetNotFound("a".to_string()));
    assert!(debug.contains("AssetNotFound"));

    let debug = format!("{:?}", Error::MalformedBsp("b".to_string()));
    assert!(debug.contains("MalformedBsp"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::AssetLoadFailed("timeout".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::AssetNotFound("timeout".to_string()));
}

#[test]
fn test_is_load_failure() {
    assert!(Error::AssetNotFound("a".to_string()).is_load_failure());
    assert!(Error::AssetLoadFailed("a".to_string()).is_load_failure());
    assert!(!Error::MalformedBsp("a".to_string()).is_load_failure());
    assert!(!Error::InvalidResource("a".to_string()).is_load_failure());
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

#[test]
fn test_result_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidResource("bad".to_string()))
    }
    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }
    assert!(matches!(outer(), Err(Error::InvalidResource(_))));
}

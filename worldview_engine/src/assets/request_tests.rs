use std::sync::Arc;
use crate::error::Error;
use super::*;

#[test]
fn test_pending_then_resolved() {
    let (request, resolver) = AssetRequest::<u32>::pending();
    assert!(!request.is_ready());
    assert!(request.poll().is_none());

    resolver.resolve(Ok(Arc::new(7)));

    assert!(request.is_ready());
    assert_eq!(*request.poll().unwrap().unwrap(), 7);
    // Polling again still yields the result
    assert!(request.poll().is_some());
}

#[test]
fn test_clones_share_the_result() {
    let (request, resolver) = AssetRequest::<u32>::pending();
    let other = request.clone();
    resolver.resolve(Err(Error::AssetNotFound("x".to_string())));
    assert_eq!(other.poll(), Some(Err(Error::AssetNotFound("x".to_string()))));
}

#[test]
fn test_ready_request() {
    let request = AssetRequest::ready(Ok(Arc::new("done")));
    assert!(request.is_ready());
}

#[test]
fn test_dropped_resolver_fails_request() {
    let (request, resolver) = AssetRequest::<u32>::pending();
    drop(resolver);
    assert!(matches!(request.poll(), Some(Err(Error::AssetLoadFailed(_)))));
}

#[test]
fn test_abandoned_resolver() {
    let (request, resolver) = AssetRequest::<u32>::pending();
    assert!(!resolver.is_abandoned());
    assert_eq!(request.handle_count(), 2);
    drop(request);
    assert!(resolver.is_abandoned());
    // Resolving an abandoned request is harmless
    resolver.resolve(Ok(Arc::new(1)));
}

use crate::error::Error;
use crate::assets::descriptors::{BuildingDescriptor, ModelDescriptor};
use super::*;

#[test]
fn test_requests_resolve_on_pump_only() {
    let mut streamer = InMemoryStreamer::new();
    streamer.insert_model("a.m2", ModelDescriptor::default());

    let request = streamer.load_model("a.m2");
    assert!(!request.is_ready());
    assert_eq!(streamer.queued(), 1);

    streamer.pump();
    assert!(matches!(request.poll(), Some(Ok(_))));
    assert_eq!(streamer.queued(), 0);
}

#[test]
fn test_missing_asset_resolves_not_found() {
    let mut streamer = InMemoryStreamer::new();
    let request = streamer.load_building_main("nowhere.wmo");
    streamer.pump();
    assert_eq!(request.poll(), Some(Err(Error::AssetNotFound("nowhere.wmo".to_string()))));
}

#[test]
fn test_injected_failure() {
    let mut streamer = InMemoryStreamer::new();
    streamer.insert_building("inn.wmo", BuildingDescriptor::default());
    streamer.fail("inn.wmo", "disk error");

    let request = streamer.load_building_main("inn.wmo");
    streamer.pump();
    assert!(matches!(request.poll(), Some(Err(Error::AssetLoadFailed(_)))));
}

#[test]
fn test_pause_holds_queue() {
    let mut streamer = InMemoryStreamer::new();
    streamer.insert_model("a.m2", ModelDescriptor::default());
    streamer.set_paused(true);

    let request = streamer.load_model("a.m2");
    streamer.pump();
    assert!(!request.is_ready());

    streamer.set_paused(false);
    streamer.pump();
    assert!(request.is_ready());
}

#[test]
fn test_clones_share_state_and_counts() {
    let mut owned = InMemoryStreamer::new();
    let observer = owned.clone();
    observer.insert_model("b.m2", ModelDescriptor::default());

    owned.load_model("b.m2");
    owned.load_model("b.m2");
    assert_eq!(observer.load_count("b.m2"), 2);
    assert_eq!(observer.load_count("c.m2"), 0);
}

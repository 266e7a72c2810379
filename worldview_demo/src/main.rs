//! Headless walkthrough of the visibility pipeline.
//!
//! Builds a small synthetic world on the in-memory streamer (one building
//! with two rooms and a porch, a row of trees and a few lanterns), then
//! walks the camera from the field outside into the first room and on
//! through the inner door into the second. Per-frame culling statistics go to the `log` facade.
//!
//! Run with: RUST_LOG=info cargo run -p worldview_demo

use worldview_engine::glam::{Mat4, Vec3};
use worldview_engine::worldview::assets::synthetic::{box_model, register_two_room_building};
use worldview_engine::worldview::assets::InMemoryStreamer;
use worldview_engine::worldview::log::{LogEntry, LogSeverity, Logger};
use worldview_engine::worldview::math::Placement;
use worldview_engine::worldview::scene::{DrawList, DrawStage};
use worldview_engine::worldview::{
    run_frame, CameraState, Engine, GraphManager, Result, ViewerConfig,
};

const FRAME_MS: f32 = 16.0;
const FRAMES: usize = 240;

/// Forwards engine log entries to the `log` crate
struct LogBridge;

impl Logger for LogBridge {
    fn log(&self, entry: &LogEntry) {
        let level = match entry.severity {
            LogSeverity::Trace => log::Level::Trace,
            LogSeverity::Debug => log::Level::Debug,
            LogSeverity::Info => log::Level::Info,
            LogSeverity::Warn => log::Level::Warn,
            LogSeverity::Error => log::Level::Error,
        };
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => {
                log::log!(target: entry.source.as_str(), level, "{} ({}:{})", entry.message, file, line)
            }
            _ => log::log!(target: entry.source.as_str(), level, "{}", entry.message),
        }
    }
}

fn build_world(streamer: &InMemoryStreamer) {
    register_two_room_building(streamer, "inn.wmo", "chair.m2");
    streamer.insert_model("tree.m2", box_model(2.0, false));
    streamer.insert_model("lantern.m2", box_model(0.3, true));
    // Referenced by the map but never shipped
    streamer.fail("statue.m2", "missing from archive");
}

fn populate(manager: &mut GraphManager) {
    manager.add_building_with_placement("inn.wmo", Placement::default(), 1);
    for i in 0..8 {
        let position = Vec3::new(-40.0 + i as f32 * 12.0, -15.0, 0.0);
        manager.add_model_with_placement("tree.m2", Placement::from_matrix(Mat4::from_translation(position)));
    }
    for x in [-10.0, 30.0, 45.0] {
        let position = Vec3::new(x, 5.0, 2.5);
        manager.add_model_with_placement("lantern.m2", Placement::from_matrix(Mat4::from_translation(position)));
    }
    manager.add_model_with_placement("statue.m2", Placement::from_matrix(Mat4::from_translation(Vec3::new(-20.0, 0.0, 0.0))));
}

/// Eye position along the walk: from the field, along the room axis,
/// ending in the back room.
fn eye_at(frame: usize) -> Vec3 {
    let t = frame as f32 / (FRAMES - 1) as f32;
    Vec3::new(-30.0 + t * 45.0, 5.0, 1.7)
}

fn main() -> Result<()> {
    env_logger::init();
    Engine::set_logger(LogBridge);

    let streamer = InMemoryStreamer::new();
    build_world(&streamer);

    let config = ViewerConfig { use_instancing: true, ..ViewerConfig::default() };
    let mut manager = GraphManager::new(Box::new(streamer), config);
    populate(&mut manager);

    let mut list = DrawList::new();
    let mut last_group = i32::MIN;
    for frame in 0..FRAMES {
        let eye = eye_at(frame);
        let camera = CameraState::look_at(eye, eye + Vec3::X, 75f32.to_radians(), 16.0 / 9.0, 0.1, 2000.0);

        list.clear();
        let result = run_frame(&mut manager, &camera, FRAME_MS, &mut list)?;
        let stats = manager.stats();

        if result.interior_group != last_group {
            last_group = result.interior_group;
            log::info!("frame {}: interior group {} (bsp node {})", frame, result.interior_group, result.bsp_node);
        }
        if frame % 30 == 0 {
            log::info!(
                "frame {}: eye {:.1?}, {} objects, {} frustum-visible, {} distance-culled, {} rendered, {} group draws, {} model draws",
                frame,
                eye,
                stats.objects,
                stats.frustum_visible,
                stats.distance_culled,
                stats.rendered,
                list.count_stage(DrawStage::Buildings),
                list.count_stage(DrawStage::OpaqueModels) + list.count_stage(DrawStage::TransparentModels),
            );
        }
    }

    log::info!("walkthrough finished after {} frames", FRAMES);
    Ok(())
}

/*!
# Worldview Engine

Scene visibility and culling core of a game-world viewer.

The crate decides, every frame, which placed buildings, building groups and
model instances are worth drawing, and in which order. It never touches a
GPU: draw work leaves through the `RenderBackend` trait, and geometry
arrives through the `AssetStreamer` trait as already decoded descriptors.

## Architecture

- **GraphManager**: owns every placed object and runs the per-frame pipeline
- **Building / Group**: interior containment (BSP) and portal traversal
- **SceneObject**: one placement of a streamed model
- **AssetStore**: reference-counted, load-once front of the streamer
- **RenderLoop**: frame clock driving update then draw
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod math;
pub mod camera;
pub mod config;
pub mod assets;
pub mod scene;
pub mod render_loop;

// Main worldview namespace module
pub mod worldview {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Runtime configuration
    pub use crate::config::ViewerConfig;

    // Camera container
    pub use crate::camera::Camera;

    // Viewer entry points
    pub use crate::scene::{FrameResult, FrameStats, GraphManager};
    pub use crate::render_loop::{run_frame, CameraState, FrameReport, FrameTime, FrameTimer, RenderLoop};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Spatial math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Asset streaming sub-module
    pub mod assets {
        pub use crate::assets::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;

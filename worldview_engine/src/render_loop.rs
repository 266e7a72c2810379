//! Per-frame driver.
//!
//! The render loop owns the frame clock. Each frame it hands the camera to
//! the Graph Manager, runs the visibility update and only then issues the
//! draw, so no draw command ever sees a partially culled frame.

use std::time::Instant;
use glam::{Mat4, Vec3};
use crate::error::Result;
use crate::scene::{FrameResult, FrameStats, GraphManager, RenderBackend};

/// Longest frame step fed to the Graph Manager; stalls beyond this
/// (debugger, window drag) are clamped.
pub const MAX_FRAME_DELTA_MS: f32 = 250.0;

/// Timing snapshot of one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Milliseconds since the previous tick, clamped to `MAX_FRAME_DELTA_MS`
    pub delta_ms: f32,
    /// Milliseconds since the timer was created
    pub elapsed_ms: f64,
    /// Frame number, starting at 0
    pub frame: u64,
}

/// Monotonic frame clock
#[derive(Debug, Clone)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    frame: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last_tick: now, frame: 0 }
    }

    /// Advance by one frame.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw_ms = (now - self.last_tick).as_secs_f32() * 1000.0;
        let time = FrameTime {
            delta_ms: raw_ms.min(MAX_FRAME_DELTA_MS),
            elapsed_ms: (now - self.start).as_secs_f64() * 1000.0,
            frame: self.frame,
        };
        self.last_tick = now;
        self.frame += 1;
        time
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Camera matrices for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraState {
    /// Right-handed, Z-up perspective camera with `[0, 1]` depth.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: eye,
            view: Mat4::look_at_rh(eye, target, Vec3::Z),
            projection: Mat4::perspective_rh(fov_y_radians, aspect, near, far),
        }
    }
}

/// What one frame produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub time: FrameTime,
    pub result: FrameResult,
    pub stats: FrameStats,
}

/// Run one frame with an explicit step: camera in, update, draw.
pub fn run_frame(
    manager: &mut GraphManager,
    camera: &CameraState,
    delta_ms: f32,
    backend: &mut dyn RenderBackend,
) -> Result<FrameResult> {
    manager.set_camera_position(camera.position);
    manager.set_view_matrix(camera.view);
    manager.set_projection_matrix(camera.projection);
    let result = manager.update(delta_ms);
    manager.draw(backend)?;
    Ok(result)
}

/// Wall-clock frame loop around `run_frame`
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    timer: FrameTimer,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn frame(
        &mut self,
        manager: &mut GraphManager,
        camera: &CameraState,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameReport> {
        let time = self.timer.tick();
        let result = run_frame(manager, camera, time.delta_ms, backend)?;
        Ok(FrameReport { time, result, stats: *manager.stats() })
    }
}

#[cfg(test)]
#[path = "render_loop_tests.rs"]
mod tests;

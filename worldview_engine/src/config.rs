//! Viewer configuration
//!
//! Runtime toggles read by the Graph Manager every frame. Changing a field
//! takes effect on the next `update`/`draw`.

/// Viewer runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Use portal traversal when the camera is inside a building interior
    pub use_portal_culling: bool,
    /// Draw map and building doodads
    pub render_models: bool,
    /// Draw building groups
    pub render_buildings: bool,
    /// Draw terrain chunks
    pub render_terrain: bool,
    /// Draw the sky dome
    pub render_sky: bool,
    /// Run the coarse depth-buffer occlusion pass after distance culling
    pub depth_culling: bool,
    /// Draw opaque models through per-model placement buffers
    pub use_instancing: bool,
    /// Debug overlay: model and group bounding boxes
    pub draw_bounding_boxes: bool,
    /// Debug overlay: portal polygons of the current building
    pub draw_portals: bool,
    /// Debug overlay: BSP leaf containing the camera
    pub draw_bsp_leaf: bool,
    /// Objects farther than `diameter * distance_cull_factor` are culled
    pub distance_cull_factor: f32,
    /// Milliseconds between distance recomputation and back-to-front sort
    pub sort_interval_ms: f32,
    /// Milliseconds between instancing placement buffer rebuilds
    pub placement_update_interval_ms: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            use_portal_culling: true,
            render_models: true,
            render_buildings: true,
            render_terrain: true,
            render_sky: true,
            depth_culling: false,
            use_instancing: false,
            draw_bounding_boxes: false,
            draw_portals: false,
            draw_bsp_leaf: false,
            distance_cull_factor: 100.0,
            sort_interval_ms: 500.0,
            placement_update_interval_ms: 1000.0,
        }
    }
}

impl ViewerConfig {
    /// Distance beyond which an object of the given diameter is culled
    pub fn distance_threshold(&self, diameter: f32) -> f32 {
        diameter * self.distance_cull_factor
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

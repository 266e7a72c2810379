//! Spatial math utilities
//!
//! Bounding boxes, frustum planes, BSP queries, portal polygons and
//! placement matrices shared by the scene objects.

mod aabb;
mod bsp;
mod frustum;
mod placement;
mod polygon;

pub use aabb::AABB;
pub use bsp::{
    BspAxis, BspFaces, BspNode, TopBottom, BSP_LEAF_FLAG, BSP_NO_CHILD,
    locate_leaf, query_bsp_tree, top_bottom_from_bsp, validate_bsp_tree,
};
pub use frustum::{
    Frustum, aabb_intersects_planes, polygon_plane, signed_distance,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
    PORTAL_PLANE_EPSILON,
};
pub use placement::{Placement, TILE_SIZE, MAP_SCALE_ONE};
pub use polygon::sort_against_plane;

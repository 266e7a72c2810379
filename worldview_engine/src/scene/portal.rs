//! Portal traversal from an interior viewpoint.
//!
//! Starting at the group holding the camera, visibility spreads breadth
//! first through portal polygons. Every portal crossed narrows the frustum
//! to the opening, so a group is reached only when some chain of portals
//! lets the camera see into it. Each group is entered at most once, which
//! bounds the walk even when rooms form loops.

use std::collections::VecDeque;
use glam::Vec3;
use crate::assets::{BuildingDescriptor, GroupFlags};
use crate::math::{signed_distance, sort_against_plane, Frustum, Placement};

/// Outcome of testing one portal reference during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalOutcome {
    /// Camera is on the far side of the portal plane
    BackFacing,
    /// Opening lies outside the current frustum
    OutOfView,
    /// Traversed, possibly into an already reached group
    Traversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalVisit {
    pub portal_index: usize,
    pub from_group: usize,
    pub to_group: usize,
    pub outcome: PortalOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct PortalTraversal {
    /// Frustum each reached group is seen through, by group index
    group_frustums: Vec<Option<Frustum>>,
    /// Frusta through which the outside world is seen
    exterior_frustums: Vec<Frustum>,
    visits: Vec<PortalVisit>,
}

impl PortalTraversal {
    pub fn is_group_visible(&self, group: usize) -> bool {
        matches!(self.group_frustums.get(group), Some(Some(_)))
    }

    pub fn group_frustum(&self, group: usize) -> Option<&Frustum> {
        self.group_frustums.get(group).and_then(Option::as_ref)
    }

    pub fn visible_groups(&self) -> impl Iterator<Item = usize> + '_ {
        self.group_frustums
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|_| i))
    }

    pub fn exterior_frustums(&self) -> &[Frustum] {
        &self.exterior_frustums
    }

    pub fn visits(&self) -> &[PortalVisit] {
        &self.visits
    }
}

/// Whether the camera stands on the owning group's side of a portal.
fn faces_camera(side: i16, distance: f32) -> bool {
    if side < 0 { distance <= 0.0 } else { distance >= 0.0 }
}

/// Walk the portal graph of one building instance.
///
/// `start_group` holds the camera and is seen through `frustum` itself.
/// Portal polygons with fewer than three vertices or no area cannot narrow
/// the frustum; they pass the parent frustum on unchanged. Groups flagged
/// exterior record the frustum they were reached through as a view onto
/// the outside world.
pub fn traverse_portals(
    descriptor: &BuildingDescriptor,
    placement: &Placement,
    start_group: usize,
    camera_world: Vec3,
    frustum: &Frustum,
) -> PortalTraversal {
    let group_count = descriptor.groups.len();
    let mut traversal = PortalTraversal {
        group_frustums: vec![None; group_count],
        exterior_frustums: Vec::new(),
        visits: Vec::new(),
    };
    if start_group >= group_count {
        return traversal;
    }

    let camera_local = placement.to_local(camera_world);
    traversal.group_frustums[start_group] = Some(frustum.clone());
    let mut queue = VecDeque::from([start_group]);

    while let Some(group_index) = queue.pop_front() {
        let Some(current) = traversal.group_frustums[group_index].clone() else {
            continue;
        };
        let group = &descriptor.groups[group_index];
        let start = group.portal_ref_start as usize;
        let end = start + group.portal_ref_count as usize;

        for portal_ref in descriptor.portal_refs.get(start..end).unwrap_or(&[]) {
            let portal_index = portal_ref.portal_index as usize;
            let to_group = portal_ref.group_index as usize;
            let (Some(portal), Some(polygon)) =
                (descriptor.portals.get(portal_index), descriptor.portal_polygon(portal_index))
            else {
                continue;
            };

            let mut visit = PortalVisit {
                portal_index,
                from_group: group_index,
                to_group,
                outcome: PortalOutcome::BackFacing,
            };

            if !faces_camera(portal_ref.side, signed_distance(portal.plane, camera_local)) {
                traversal.visits.push(visit);
                continue;
            }

            let mut ordered = polygon.to_vec();
            sort_against_plane(&mut ordered, portal.plane);
            let world: Vec<Vec3> = ordered.iter().map(|v| placement.to_world(*v)).collect();
            let narrowed = if world.len() < 3 {
                current.clone()
            } else {
                if !current.intersects_polygon(&world) {
                    visit.outcome = PortalOutcome::OutOfView;
                    traversal.visits.push(visit);
                    continue;
                }
                current
                    .through_portal(camera_world, &world)
                    .unwrap_or_else(|| current.clone())
            };

            visit.outcome = PortalOutcome::Traversed;
            traversal.visits.push(visit);

            if to_group >= group_count || traversal.group_frustums[to_group].is_some() {
                continue;
            }
            if descriptor.groups[to_group].flags.contains(GroupFlags::EXTERIOR) {
                traversal.exterior_frustums.push(narrowed.clone());
            }
            traversal.group_frustums[to_group] = Some(narrowed);
            queue.push_back(to_group);
        }
    }

    traversal
}

#[cfg(test)]
#[path = "portal_tests.rs"]
mod tests;

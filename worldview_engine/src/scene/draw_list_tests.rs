use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use super::*;

fn model(pass: DrawPass, x: f32) -> DrawCommand {
    DrawCommand::Model {
        model: Arc::from("crate.m2"),
        transform: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        diffuse: Vec4::ONE,
        pass,
    }
}

#[test]
fn test_stage_order_matches_frame_order() {
    assert!(DrawStage::Terrain < DrawStage::Buildings);
    assert!(DrawStage::Buildings < DrawStage::Sky);
    assert!(DrawStage::Sky < DrawStage::OpaqueModels);
    assert!(DrawStage::OpaqueModels < DrawStage::TransparentModels);
    assert!(DrawStage::TransparentModels < DrawStage::Debug);
}

#[test]
fn test_command_stages() {
    assert_eq!(DrawCommand::Terrain.stage(), DrawStage::Terrain);
    assert_eq!(model(DrawPass::Opaque, 0.0).stage(), DrawStage::OpaqueModels);
    assert_eq!(model(DrawPass::Transparent, 0.0).stage(), DrawStage::TransparentModels);
    let instances = DrawCommand::ModelInstances {
        model: Arc::from("crate.m2"),
        pass: DrawPass::Opaque,
        instance_count: 0,
        placements: Arc::from(Vec::<u8>::new()),
    };
    assert_eq!(instances.stage(), DrawStage::OpaqueModels);
    let portal = DrawCommand::Portal { vertices: vec![], color: Vec4::ONE };
    assert_eq!(portal.stage(), DrawStage::Debug);
}

#[test]
fn test_draw_list_records_in_order() {
    let mut list = DrawList::new();
    list.submit(DrawCommand::Sky).unwrap();
    list.submit(model(DrawPass::Transparent, 2.0)).unwrap();
    list.submit(model(DrawPass::Transparent, 1.0)).unwrap();
    list.submit(model(DrawPass::Opaque, 3.0)).unwrap();

    assert_eq!(list.len(), 4);
    assert_eq!(list.commands()[0], DrawCommand::Sky);
    let xs: Vec<f32> = list
        .model_transforms(DrawPass::Transparent)
        .iter()
        .map(|m| m.w_axis.x)
        .collect();
    assert_eq!(xs, vec![2.0, 1.0]);
    assert_eq!(list.count_stage(DrawStage::OpaqueModels), 1);

    list.clear();
    assert!(list.is_empty());
}

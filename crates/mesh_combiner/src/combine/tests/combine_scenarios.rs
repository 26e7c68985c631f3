use std::f32::consts::PI;
use std::sync::Arc;

use approx::assert_relative_eq;

use super::{strip, triangle_at, Fixture};
use crate::combine::{CombineError, MeshCombiner};
use crate::config::CombineConfig;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::render::{IndexBuffer, IndexFormat, Mesh, SubMesh};
use crate::scene::{SceneError, SceneNode};

fn combiner() -> MeshCombiner {
    MeshCombiner::new(CombineConfig::default())
}

#[test]
fn test_single_child_keeps_geometry() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let cube = Arc::new(Mesh::cube());
    let root = fx.root;
    fx.renderable(root, "cube", cube.clone(), material, Transform::identity());

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(mesh.vertex_count(), cube.vertex_count());
    assert_eq!(mesh.submesh_count(), 1);
    assert_eq!(mesh.submesh_indices(0), cube.submesh_indices(0));
    assert_eq!(mesh.index_format(), IndexFormat::Narrow);
    assert_eq!(mesh.positions, cube.positions);
    assert_eq!(fx.root_materials(), vec![material]);
    assert_eq!(report.nodes_merged, 1);
    assert_eq!(report.nodes_destroyed, 1);
    assert!(!report.degenerate);
}

#[test]
fn test_two_children_same_material_share_one_submesh() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    fx.renderable(root, "a", triangle_at(0.0), material, Transform::identity());
    fx.renderable(root, "b", triangle_at(5.0), material, Transform::identity());

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.submesh_count(), 1);
    assert_eq!(mesh.submesh_indices(0), Some(vec![0, 1, 2, 3, 4, 5]));
    assert_eq!(mesh.positions[3], Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(fx.root_materials(), vec![material]);
}

#[test]
fn test_two_children_distinct_materials_get_own_windows() {
    let mut fx = Fixture::new();
    let stone = fx.material("stone");
    let wood = fx.material("wood");
    let root = fx.root;
    fx.renderable(root, "a", triangle_at(0.0), stone, Transform::identity());
    fx.renderable(root, "b", triangle_at(5.0), wood, Transform::identity());

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(
        mesh.submeshes(),
        &[
            SubMesh { index_start: 0, index_count: 3, first_vertex: 0, vertex_count: 3 },
            SubMesh { index_start: 3, index_count: 3, first_vertex: 3, vertex_count: 3 },
        ]
    );
    assert_eq!(mesh.submesh_indices(0), Some(vec![0, 1, 2]));
    assert_eq!(mesh.submesh_indices(1), Some(vec![3, 4, 5]));
    assert_eq!(fx.root_materials(), vec![stone, wood]);
    assert_eq!(report.material_count, 2);
}

#[test]
fn test_identical_looking_materials_are_not_merged() {
    let mut fx = Fixture::new();
    let first = fx.material("twin");
    let second = fx.material("twin");
    let root = fx.root;
    fx.renderable(root, "a", triangle_at(0.0), first, Transform::identity());
    fx.renderable(root, "b", triangle_at(1.0), second, Transform::identity());

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert_eq!(fx.root_mesh().submesh_count(), 2);
}

#[test]
fn test_nested_hierarchy_counts_and_windows() {
    let mut fx = Fixture::new();
    let materials = [fx.material("a"), fx.material("b"), fx.material("c")];
    let root = fx.root;

    let mut expected_vertices = 0;
    for branch in 0..4 {
        let pivot = fx.pivot(
            root,
            &format!("pivot {}", branch),
            Transform::from_position(Vec3::new(branch as f32, 0.0, 0.0)),
        );
        for leaf in 0..5 {
            let mesh = if leaf % 2 == 0 { Arc::new(Mesh::cube()) } else { strip(3 * (leaf + 1)) };
            expected_vertices += mesh.vertex_count();
            let material = materials[(branch + leaf) % materials.len()];
            let node = fx.renderable(pivot, &format!("leaf {}", leaf), mesh, material, Transform::identity());
            // A non-renderable grandchild below each leaf
            fx.pivot(node, "socket", Transform::identity());
        }
    }

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(mesh.vertex_count(), expected_vertices);
    assert_eq!(mesh.submesh_count(), materials.len());
    assert_eq!(report.nodes_merged, 20);
    assert_eq!(report.nodes_destroyed, 4 + 20 + 20);

    let mut next_window = 0;
    for (slot, submesh) in mesh.submeshes().iter().enumerate() {
        assert_eq!(submesh.first_vertex, next_window);
        next_window += submesh.vertex_count;

        let window = submesh.vertex_range();
        let indices = mesh.submesh_indices(slot).unwrap();
        assert!(indices.iter().all(|&i| window.contains(&(i as usize))));
    }
    assert_eq!(next_window, expected_vertices);
    assert_eq!(fx.graph.len(), 1);
}

#[test]
fn test_group_order_follows_first_encounter() {
    let mut fx = Fixture::new();
    let stone = fx.material("stone");
    let wood = fx.material("wood");
    let root = fx.root;
    let pivot = fx.pivot(root, "pivot", Transform::identity());
    fx.renderable(pivot, "deep wood", triangle_at(0.0), wood, Transform::identity());
    fx.renderable(root, "stone", triangle_at(1.0), stone, Transform::identity());
    fx.renderable(root, "late wood", triangle_at(2.0), wood, Transform::identity());

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert_eq!(fx.root_materials(), vec![wood, stone]);
    let mesh = fx.root_mesh();
    assert_eq!(mesh.submeshes()[0].vertex_count, 6);
    assert_eq!(mesh.positions[3], Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_child_transforms_are_baked_into_root_space() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    let pivot = fx.pivot(
        root,
        "pivot",
        Transform::from_position_rotation(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), PI / 2.0),
        ),
    );
    fx.renderable(
        pivot,
        "leaf",
        triangle_at(0.0),
        material,
        Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_uniform_scale(3.0),
    );

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    // (1,0,0) scales to (3,0,0), shifts to (4,0,0), turns to (0,4,0) and lifts to (0,6,0)
    let positions = &fx.root_mesh().positions;
    assert_relative_eq!(positions[0], Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(positions[1], Vec3::new(0.0, 6.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(positions[2], Vec3::new(-3.0, 3.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_root_transform_is_restored_and_ignored() {
    let root_transforms = [
        Transform::identity(),
        Transform::from_trs(
            Vec3::new(10.0, -4.0, 7.5),
            Quat::from_axis_angle(&Vec3::y_axis(), 1.1),
            Vec3::new(2.0, 0.5, 3.0),
        ),
        Transform::from_position(Vec3::new(-100.0, 0.0, 0.0)).with_uniform_scale(0.01),
    ];

    let mut reference: Option<Vec<Vec3>> = None;
    for root_transform in root_transforms {
        let mut fx = Fixture::new();
        fx.graph.get_mut(fx.root).unwrap().transform = root_transform.clone();
        let material = fx.material("stone");
        let root = fx.root;
        fx.renderable(
            root,
            "leaf",
            triangle_at(1.0),
            material,
            Transform::from_position(Vec3::new(0.0, 0.0, 2.0)),
        );

        combiner().combine(&mut fx.graph, fx.root).unwrap();

        assert_eq!(fx.graph.get(fx.root).unwrap().transform, root_transform);
        let positions = fx.root_mesh().positions.clone();
        match &reference {
            None => reference = Some(positions),
            Some(expected) => {
                for (actual, expected) in positions.iter().zip(expected) {
                    assert_relative_eq!(*actual, *expected, epsilon = 1e-5);
                }
            }
        }
    }
}

#[test]
fn test_narrow_overflow_leaves_hierarchy_intact() {
    let mut fx = Fixture::new();
    let stone = fx.material("stone");
    let wood = fx.material("wood");
    let root_transform = Transform::from_position(Vec3::new(3.0, 0.0, 0.0));
    fx.graph.get_mut(fx.root).unwrap().transform = root_transform.clone();
    let root = fx.root;
    let a = fx.renderable(root, "a", strip(40_000), stone, Transform::identity());
    let b = fx.renderable(root, "b", strip(30_000), wood, Transform::identity());

    let result = combiner().combine(&mut fx.graph, fx.root);

    match result {
        Err(CombineError::IndexFormatOverflow { vertex_count, index_format, max_vertices }) => {
            assert_eq!(vertex_count, 70_000);
            assert_eq!(index_format, IndexFormat::Narrow);
            assert_eq!(max_vertices, 65_536);
        }
        other => panic!("expected overflow, got {:?}", other),
    }

    let root_node = fx.graph.get(fx.root).unwrap();
    assert_eq!(root_node.children(), &[a, b]);
    assert!(root_node.mesh_filter.is_none());
    assert!(root_node.mesh_renderer.is_none());
    assert_eq!(root_node.transform, root_transform);
    assert_eq!(fx.graph.len(), 3);
}

#[test]
fn test_wide_format_handles_large_meshes() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    fx.renderable(root, "a", strip(40_000), material, Transform::identity());
    fx.renderable(root, "b", strip(30_000), material, Transform::identity());

    let config = CombineConfig::default()
        .with_index_format(IndexFormat::Wide)
        .without_post_processing();
    let report = MeshCombiner::new(config).combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(report.vertex_count, 70_000);
    assert!(matches!(mesh.indices(), IndexBuffer::U32(_)));
    let indices = mesh.submesh_indices(0).unwrap();
    assert_eq!(indices.len(), 39_999 + 30_000);
    assert_eq!(indices[39_998], 39_998);
    assert_eq!(indices[39_999], 40_000);
    assert_eq!(indices[indices.len() - 1], 69_999);
}

#[test]
fn test_shared_mesh_contributes_once_per_node() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let shared = triangle_at(0.0);
    let root = fx.root;
    for i in 0..3 {
        fx.renderable(
            root,
            &format!("copy {}", i),
            shared.clone(),
            material,
            Transform::from_position(Vec3::new(0.0, 0.0, i as f32)),
        );
    }

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    let mesh = fx.root_mesh();
    assert_eq!(mesh.vertex_count(), 9);
    assert_eq!(mesh.positions[6], Vec3::new(0.0, 0.0, 2.0));
    assert_eq!(Arc::strong_count(&shared), 1);
}

#[test]
fn test_nothing_renderable_is_degenerate() {
    let mut fx = Fixture::new();
    let root = fx.root;
    fx.pivot(root, "empty", Transform::identity());
    fx.pivot(root, "another", Transform::identity());

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert!(report.degenerate);
    assert_eq!(report.nodes_destroyed, 2);
    assert_eq!(fx.root_mesh().vertex_count(), 0);
    assert_eq!(fx.root_mesh().submesh_count(), 0);
    assert!(fx.root_materials().is_empty());
    assert!(fx.graph.children(fx.root).unwrap().is_empty());
}

#[test]
fn test_leaf_root_is_degenerate() {
    let mut fx = Fixture::new();

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert!(report.degenerate);
    assert_eq!(report.nodes_destroyed, 0);
    assert_eq!(fx.graph.len(), 1);
}

#[test]
fn test_incomplete_nodes_are_skipped_but_destroyed() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    fx.renderable(root, "full", triangle_at(0.0), material, Transform::identity());
    fx.graph
        .add_child(root, SceneNode::new("mesh only").with_mesh(triangle_at(1.0)))
        .unwrap();

    let report = combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert_eq!(report.nodes_merged, 1);
    assert_eq!(report.nodes_skipped, 1);
    assert_eq!(report.nodes_destroyed, 2);
    assert_eq!(fx.root_mesh().vertex_count(), 3);
}

#[test]
fn test_root_mesh_is_replaced_not_merged() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    {
        let root_node = fx.graph.get_mut(fx.root).unwrap();
        *root_node = root_node.clone().with_mesh(Arc::new(Mesh::cube())).with_material(material);
    }
    let root = fx.root;
    fx.renderable(root, "child", triangle_at(0.0), material, Transform::identity());

    combiner().combine(&mut fx.graph, fx.root).unwrap();

    assert_eq!(fx.root_mesh().vertex_count(), 3);
    assert_eq!(fx.root_mesh().name.as_deref(), Some("root (combined)"));
}

#[test]
fn test_invalid_geometry_leaves_hierarchy_intact() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let broken = Arc::new(Mesh::new(
        vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
        Vec::new(),
        vec![0, 1, 7],
    ));
    let root = fx.root;
    fx.renderable(root, "good", triangle_at(0.0), material, Transform::identity());
    fx.renderable(root, "broken", broken, material, Transform::identity());

    let result = combiner().combine(&mut fx.graph, fx.root);

    match result {
        Err(CombineError::InvalidGeometry { node, .. }) => assert_eq!(node, "broken"),
        other => panic!("expected invalid geometry, got {:?}", other),
    }
    assert_eq!(fx.graph.len(), 3);
    assert!(fx.graph.get(fx.root).unwrap().mesh_filter.is_none());
}

#[test]
fn test_invalid_config_is_rejected_before_touching_the_graph() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    fx.renderable(root, "a", triangle_at(0.0), material, Transform::identity());

    let config = CombineConfig::default().with_default_uv(f32::INFINITY, 0.0);
    let result = MeshCombiner::new(config).combine(&mut fx.graph, fx.root);

    assert!(matches!(result, Err(CombineError::InvalidConfig(_))));
    assert_eq!(fx.graph.len(), 2);
}

#[test]
fn test_stale_root_is_reported() {
    let mut fx = Fixture::new();
    let root = fx.root;
    fx.graph.destroy(root).unwrap();

    let result = combiner().combine(&mut fx.graph, root);

    assert!(matches!(
        result,
        Err(CombineError::Scene(SceneError::NodeNotFound(id))) if id == root
    ));
}

#[test]
fn test_combine_subtree_of_larger_scene() {
    let mut fx = Fixture::new();
    let material = fx.material("stone");
    let root = fx.root;
    let building = fx.pivot(root, "building", Transform::from_position(Vec3::new(20.0, 0.0, 0.0)));
    fx.renderable(building, "wall", triangle_at(0.0), material, Transform::identity());
    let outside = fx.renderable(root, "tree", triangle_at(9.0), material, Transform::identity());

    let report = combiner().combine(&mut fx.graph, building).unwrap();

    assert_eq!(report.nodes_destroyed, 1);
    assert!(fx.graph.contains(outside));
    assert_eq!(fx.graph.children(root).unwrap(), &[building, outside]);
    let building_node = fx.graph.get(building).unwrap();
    assert_eq!(building_node.mesh().map(|m| m.vertex_count()), Some(3));
    assert_eq!(building_node.transform.position, Vec3::new(20.0, 0.0, 0.0));
}

//! Scenario tests running the full combine pipeline

mod combine_scenarios;

use std::sync::Arc;

use crate::foundation::math::{Transform, Vec3};
use crate::render::{Material, MaterialId, MaterialLibrary, Mesh};
use crate::scene::{NodeId, SceneGraph, SceneNode};

/// Scene with a root node and a material library
struct Fixture {
    graph: SceneGraph,
    library: MaterialLibrary,
    root: NodeId,
}

impl Fixture {
    fn new() -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(SceneNode::new("root"));
        Self { graph, library: MaterialLibrary::new(), root }
    }

    fn material(&mut self, name: &str) -> MaterialId {
        self.library.register(Material::new().with_name(name))
    }

    fn renderable(
        &mut self,
        parent: NodeId,
        name: &str,
        mesh: Arc<Mesh>,
        material: MaterialId,
        transform: Transform,
    ) -> NodeId {
        let node = SceneNode::new(name)
            .with_transform(transform)
            .with_mesh(mesh)
            .with_material(material);
        self.graph.add_child(parent, node).unwrap()
    }

    fn pivot(&mut self, parent: NodeId, name: &str, transform: Transform) -> NodeId {
        self.graph
            .add_child(parent, SceneNode::new(name).with_transform(transform))
            .unwrap()
    }

    fn root_mesh(&self) -> &Mesh {
        self.graph.get(self.root).unwrap().mesh().unwrap()
    }

    fn root_materials(&self) -> Vec<MaterialId> {
        self.graph
            .get(self.root)
            .unwrap()
            .mesh_renderer
            .as_ref()
            .unwrap()
            .materials
            .clone()
    }
}

/// Triangle whose vertices are `(x, 0, 0)`, `(x + 1, 0, 0)`, `(x, 1, 0)`
fn triangle_at(x: f32) -> Arc<Mesh> {
    Arc::new(Mesh::new(
        vec![Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0), Vec3::new(x, 1.0, 0.0)],
        Vec::new(),
        vec![0, 1, 2],
    ))
}

/// Strip of `vertex_count` vertices along X with one triangle per vertex triple
fn strip(vertex_count: usize) -> Arc<Mesh> {
    let positions = (0..vertex_count)
        .map(|i| Vec3::new(i as f32, (i % 2) as f32, 0.0))
        .collect();
    let indices = (0..(vertex_count / 3 * 3) as u32).collect();
    Arc::new(Mesh::new(positions, Vec::new(), indices))
}

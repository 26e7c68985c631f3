//! Mesh combine command line tool
//!
//! Loads a RON scene description, merges everything under its root node
//! into one multi-material mesh and prints what was produced. The input file
//! is never modified; pass `--output` to write the combined scene.

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};

use mesh_combiner::combine::{CombineError, MeshCombiner, DATA_LOSS_WARNING, INDEX_FORMAT_HINT};
use mesh_combiner::config::{CombineConfig, Config};
use mesh_combiner::foundation::logging;
use mesh_combiner::render::{IndexFormat, Material, MaterialId, MaterialLibrary, Mesh};

mod scene_file;
use scene_file::{LoadedScene, SceneFile};

fn command() -> Command {
    Command::new("mesh_combine")
        .about("Merges the meshes under a scene's root node into one mesh with a sub-mesh per material")
        .after_help("The scene file is never modified. Without --output nothing is saved.")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("RON scene description")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Combine configuration (.toml or .ron)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the combined scene as RON"),
        )
        .arg(
            Arg::new("index-format")
                .short('i')
                .long("index-format")
                .value_name("FORMAT")
                .help("Index width of the combined mesh, overrides the config file")
                .value_parser(["narrow", "wide"]),
        )
        .arg(
            Arg::new("optimize")
                .long("optimize")
                .help("Reorder vertices of the combined mesh for locality")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Confirm that the root's children may be destroyed")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<()> {
    let matches = command().get_matches();

    logging::init_with_level(log::LevelFilter::Info);

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CombineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => CombineConfig::default(),
    };
    match matches.get_one::<String>("index-format").map(String::as_str) {
        Some("narrow") => config.index_format = IndexFormat::Narrow,
        Some("wide") => config.index_format = IndexFormat::Wide,
        _ => {}
    }
    if matches.get_flag("optimize") {
        config.optimize_layout = true;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let scene_path = matches
        .get_one::<String>("scene")
        .context("Missing scene file")?;
    let LoadedScene { mut graph, materials, root } = SceneFile::load(scene_path)
        .and_then(|scene| scene.instantiate())
        .with_context(|| format!("Failed to load scene {}", scene_path))?;

    println!("WARNING: {}", DATA_LOSS_WARNING);
    if !matches.get_flag("yes") {
        bail!("Not combining without confirmation, rerun with --yes");
    }

    log::info!("Combining with {} indices", config.index_format);
    let combiner = MeshCombiner::new(config);
    let report = match combiner.combine(&mut graph, root) {
        Ok(report) => report,
        Err(error @ CombineError::IndexFormatOverflow { .. }) => {
            eprintln!("{}", INDEX_FORMAT_HINT);
            return Err(error.into());
        }
        Err(error) => return Err(error.into()),
    };

    if report.degenerate {
        println!("Nothing to combine: no node under the root has both a mesh and a material");
    }
    println!(
        "Merged {} nodes ({} skipped), destroyed {} nodes",
        report.nodes_merged, report.nodes_skipped, report.nodes_destroyed
    );

    let root_node = graph.get(root)?;
    if let (Some(mesh), Some(renderer)) = (root_node.mesh(), root_node.mesh_renderer.as_ref()) {
        print_mesh(mesh, &renderer.materials, &materials);
    }

    match matches.get_one::<String>("output") {
        Some(path) => {
            SceneFile::capture(&graph, &materials, root)
                .and_then(|scene| scene.save(path))
                .with_context(|| format!("Failed to write {}", path))?;
            log::info!("Wrote combined scene to {}", path);
        }
        None => println!("Nothing saved, pass --output to write the combined scene"),
    }
    Ok(())
}

fn print_mesh(mesh: &Mesh, slots: &[MaterialId], materials: &MaterialLibrary) {
    println!(
        "{}: {} vertices, {} triangles, {} indices",
        mesh.name.as_deref().unwrap_or("combined mesh"),
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.index_format()
    );
    for (submesh, material) in mesh.submeshes().iter().zip(slots) {
        let material = materials.get(*material);
        let name = material.and_then(|m| m.name.as_deref()).unwrap_or("<unnamed>");
        println!(
            "  {:<16} vertices {:>7}..{:<7} indices {:>7}  {}",
            name,
            submesh.first_vertex,
            submesh.first_vertex + submesh.vertex_count,
            submesh.index_count,
            material.map(describe_material).unwrap_or_default()
        );
    }
}

fn describe_material(material: &Material) -> String {
    let [r, g, b] = material.base_color;
    format!(
        "color ({:.2}, {:.2}, {:.2}) metallic {:.2} roughness {:.2} alpha {:.2}",
        r, g, b, material.metallic, material.roughness, material.alpha
    )
}

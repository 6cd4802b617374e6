//! Asset inspection demo
//!
//! Loads a scene asset, flattens it, and prints a per-record summary.
//!
//! Usage:
//! ```bash
//! cargo run --example inspect -- path/to/scene.gltf [lh|rh]
//! ```

use anyhow::{bail, Context, Result};
use bannock::{AxisSystem, ElementKind, SceneConverter};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: inspect <asset path> [lh|rh]");
    };
    let target_axis = match args.next().as_deref() {
        Some("rh") => AxisSystem::RightHandedYUp,
        Some("lh") | None => AxisSystem::LeftHandedYUp,
        Some(other) => bail!("unknown axis convention '{}', expected lh or rh", other),
    };

    let converter = SceneConverter::new(target_axis);
    let records = converter
        .load(&path)
        .with_context(|| format!("failed to convert '{}'", path))?;

    println!("{}: {} record(s)", path, records.node_count());
    for record in &records {
        println!(
            "  {} (parent: {}) - {} vertex(es), {} triangle(s), {} uv set(s)",
            record.name,
            record.parent_name,
            record.positions.len(),
            record.triangle_count(),
            record.elements.uv_sets,
        );
        for (name, &index) in &record.uv_set_ids {
            println!("    uv set {} -> #{}", name, index);
        }
        for material in &record.materials {
            println!(
                "    material {:?}: diffuse {:?}, specular {:?}, power {}",
                material.kind, material.diffuse.kind, material.specular.kind, material.specular_power,
            );
            for (uv_set, files) in &material.diffuse.textures {
                for file in files {
                    println!("      diffuse texture [{}] {}", uv_set, file);
                }
            }
        }
    }

    let colored = records
        .iter()
        .flat_map(|record| &record.materials)
        .filter(|material| material.diffuse.kind != ElementKind::None)
        .count();
    println!("{} material(s) with a resolved diffuse channel", colored);

    Ok(())
}

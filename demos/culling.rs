use std::sync::Arc;

use glam::Vec3;
use log::info;
use octocull::prelude::*;

const GRID: u32 = 32;

fn main() -> Result<(), TreeError> {
    env_logger::init();

    let registry = Arc::new(Registry::standard()?);
    let config = OctreeConfig::default()
        .with_min_node_size(2.0)
        .with_max_lifespan_cap(32);
    let mut tree = Octree::with_config(
        registry,
        Aabb::new(Vec3::ZERO, Vec3::splat(8.0)),
        config,
    )?;

    // A flat grid of props, far larger than the initial root.
    for i in 0..GRID {
        for j in 0..GRID {
            let center = Vec3::new(i as f32 * 4.0, 0.0, j as f32 * -4.0);
            tree.insert(i * GRID + j, &Aabb::new(center, Vec3::splat(0.5)).into())?;
        }
    }
    info!("{} keys in {} nodes", tree.len(), tree.node_count());

    let camera = Frustum::from_perspective(
        Vec3::new(64.0, 10.0, 10.0),
        Vec3::new(0.0, -0.2, -1.0),
        Vec3::Y,
        std::f32::consts::FRAC_PI_3,
        16.0 / 9.0,
        0.1,
        60.0,
    );
    let visible = tree.get_culled_objects(&camera);
    println!("visible: {} of {}", visible.len(), tree.len());

    // Move the first row out of the grid, then let empty regions age out.
    let moved: Vec<(u32, Shape)> = (0..GRID)
        .map(|j| {
            let center = Vec3::new(-40.0, 20.0, j as f32 * -4.0);
            (j, Aabb::new(center, Vec3::splat(0.5)).into())
        })
        .collect();
    tree.update(&moved)?;
    for _ in 0..config.max_lifespan_cap {
        tree.maintain();
    }

    let visible = tree.get_culled_objects(&camera);
    println!(
        "visible after update: {} of {}, {} nodes",
        visible.len(),
        tree.len(),
        tree.node_count()
    );

    for key in 0..GRID {
        tree.remove(&key)?;
    }
    assert_eq!(tree.len(), ((GRID - 1) * GRID) as usize);
    Ok(())
}

//! Dynamic [`octree`](tree::Octree) for frustum culling of large scenes.
//!
//! The tree stores caller-owned keys at the shallowest region that fully
//! contains their bounding shape. It grows when a shape falls outside the
//! root, ages and prunes empty regions over repeated
//! [`maintenance`](tree::Octree::maintain) passes and collapses a root with a
//! single child.
//!
//! Geometric tests between the six [`Shape`](shape::Shape) kinds go through a
//! [`Registry`](dispatch::Registry) of `6x6` dispatch tables built once and
//! shared by every tree.
//!
//! ## Available methods:
//!
//! - ### Index operations
//!
//!   - [`Insertion`](tree::Octree::insert)
//!   - [`Repositioning`](tree::Octree::reposition)
//!   - [`Removing`](tree::Octree::remove)
//!   - [`Maintenance`](tree::Octree::maintain)
//!   - [`Batch update`](tree::Octree::update)
//!
//! - ### Queries
//!
//!   - [`Frustum culling`](tree::Octree::get_culled_objects)
//!   - [`Shape query`](tree::Octree::query)
//!   - [`Custom intersection closure`](tree::Octree::intersect_with)
//!   - [`Region boxes for debug overlays`](tree::Octree::get_boxes)
//!
//! - ### Predicates
//!
//!   - [`On right side of a plane`](dispatch::Registry::is_on_right_side)
//!   - [`Containment`](dispatch::Registry::is_inside)
//!   - [`Intersection`](dispatch::Registry::is_intersecting)
//!   - [`Parametrized ray intersection`](dispatch::Registry::intersect)
//!
//! To enable bevy integrations:
//!
//! ```toml
//! [dependencies]
//! octocull = { version = "0.1.0", features = ["bevy"] }
//! ```
//!
//! ## Optimizations:
//!
//! - Tree structure is represented by flat, reusable [`Pool`](`pool::Pool`). Freed slots are reused.
//! - Few memory allocations. [`smallvec`] and [`heapless`] structures are used.
//! - Pair dispatch is two array lookups, no dynamic type checks.
//! - No interior mutability; the registry is shared through an [`Arc`](std::sync::Arc).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use glam::Vec3;
//! use octocull::prelude::*;
//!
//! fn main() -> Result<(), TreeError> {
//!     let registry = Arc::new(Registry::standard()?);
//!     let mut tree = Octree::from_aabb(registry, Aabb::new(Vec3::ZERO, Vec3::splat(32.0)))?;
//!
//!     tree.insert(1u32, &Aabb::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE).into())?;
//!     tree.insert(2u32, &Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0).into())?;
//!
//!     // Outside the root: the tree grows.
//!     tree.insert(3u32, &Sphere::new(Vec3::new(0.0, 0.0, -100.0), 2.0).into())?;
//!
//!     let camera = Frustum::from_perspective(
//!         Vec3::ZERO,
//!         Vec3::NEG_Z,
//!         Vec3::Y,
//!         std::f32::consts::FRAC_PI_2,
//!         16.0 / 9.0,
//!         0.1,
//!         500.0,
//!     );
//!
//!     // Conservative: keys of every region touching the view volume.
//!     let visible = tree.get_culled_objects(&camera);
//!     assert!(visible.contains(&1));
//!     assert!(visible.contains(&3));
//!
//!     tree.update(&[(1, Sphere::new(Vec3::new(50.0, 0.0, 0.0), 1.0).into())])?;
//!     tree.remove(&2)?;
//!     assert_eq!(tree.len(), 2);
//!
//!     Ok(())
//! }
//! ```
//!
//! Run the example:
//!
//! ```sh
//! cargo run --release --example culling
//! ```
//!
//! ## Check yourself list:
//!
//! - tests
//!
//!   ```sh
//!   cargo test --all-targets --all-features --release
//!   ```
//!
//! - clippy
//!
//!   ```sh
//!   cargo clippy --all-targets --all-features
//!   ```
//!
//! - benchmark
//!
//!   ```sh
//!   cargo bench --all-features
//!   ```
//!
//! - docs
//!   ```sh
//!   cargo doc --no-deps --open --all-features
//!   ```

#[cfg(feature = "bevy")]
pub mod bevy_integration;
pub mod bounding;
pub mod config;
pub mod dispatch;
pub mod intersect_with;
pub mod node;
pub mod pool;
pub mod predicates;
pub mod prelude;
pub mod shape;
pub mod tree;

use std::{
    error::Error,
    fmt::{self},
};

/// Index [`tree.nodes`](pool::Pool) with it.
///
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u32);

impl From<NodeId> for usize {
    fn from(value: NodeId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId {}", self.0)
    }
}

/// Enum of all possible errors of the octree's and the registry's operations.
#[derive(Debug, PartialEq)]
pub enum TreeError {
    /// No implementation is registered for a pair of [`ShapeTag`](shape::ShapeTag)s.
    UnregisteredPair(String),

    /// A pair was registered twice for the same operation.
    DuplicatePair(String),

    /// The key is not stored in the [`tree`](tree::Octree).
    KeyNotFound(String),

    /// The shape kind can not be tested for containment in a region.
    NotInsertable(String),

    /// The root did not reach the shape within
    /// [`max_growth_steps`](config::OctreeConfig::max_growth_steps).
    GrowthLimit(String),
}

impl Error for TreeError {}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnregisteredPair(info) => write!(f, "Unregistered pair. {info}"),
            TreeError::DuplicatePair(info) => write!(f, "Pair registered twice. {info}"),
            TreeError::KeyNotFound(info) => write!(f, "Key not found. {info}"),
            TreeError::NotInsertable(info) => write!(f, "Shape is not insertable. {info}"),
            TreeError::GrowthLimit(info) => write!(f, "Root growth limit reached. {info}"),
        }
    }
}

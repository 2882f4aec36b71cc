//! Crate's core types reimports.

pub use crate::{
    bounding::{Aabb, Frustum, Interval, Plane, Ray, Sphere, Triangle},
    config::OctreeConfig,
    dispatch::{Predicate, Registry, RegistryBuilder},
    node::{Life, Node, NodeState},
    shape::{Shape, ShapeTag, ShapeVariant},
    tree::Octree,
    NodeId, TreeError,
};

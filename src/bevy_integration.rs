//! [Bevy](https://docs.rs/bevy/) game engine integrations.
//!
//! Adds the [Bevy](https://docs.rs/bevy/) game engine as a dependency.
//!
//! ### Conversions:
//! - [Aabb3d] to and from [Aabb]
//! - [BoundingSphere] to and from [Sphere]
//! - [RayCast3d] into [Ray]
//!
//! ### Intersections:
//! - [ray](RayCast3d) [cast](Octree::ray_cast)
//!
//! ```ignore
//! let ray = RayCast3d::new(Vec3A::new(0.0, 0.0, 50.0), Dir3A::NEG_Z, 100.0);
//! let keys = tree.ray_cast(&ray)?;
//! ```

use bevy::math::{
    bounding::{Aabb3d, BoundingSphere, IntersectsVolume, RayCast3d},
    Vec3A,
};
use glam::Vec3;

use crate::{
    bounding::{Aabb, Ray, Sphere},
    dispatch::{unregistered, Predicate},
    shape::{Shape, ShapeTag},
    tree::Octree,
    TreeError,
};

// bevy may pin another glam release, so vectors cross by components.
#[inline(always)]
fn to_bevy(v: Vec3) -> Vec3A {
    Vec3A::new(v.x, v.y, v.z)
}

#[inline(always)]
fn from_bevy(v: Vec3A) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

impl<K> Octree<K>
where
    K: Copy + PartialEq,
{
    /// Keys of every node whose region the ray crosses within
    /// `[0, ray.max]`. Regions behind the origin are skipped.
    pub fn ray_cast(&self, ray: &RayCast3d) -> Result<Vec<K>, TreeError> {
        if !self
            .registry
            .supports(Predicate::Intersect, ShapeTag::Ray, ShapeTag::Aabb)
        {
            return Err(unregistered(
                Predicate::Intersect,
                ShapeTag::Ray,
                ShapeTag::Aabb,
            ));
        }

        let shape = Shape::Ray((*ray).into());
        Ok(self.intersect_with(|aabb| {
            self.registry
                .intersect(&shape, &Shape::Aabb(*aabb))
                .hit()
                .is_some_and(|hit| hit.max() >= 0.0 && hit.min().max(0.0) <= ray.max)
        }))
    }
}

impl From<Aabb> for Aabb3d {
    fn from(value: Aabb) -> Self {
        Aabb3d {
            min: to_bevy(value.min),
            max: to_bevy(value.max),
        }
    }
}

impl From<Aabb3d> for Aabb {
    fn from(value: Aabb3d) -> Self {
        Aabb::from_min_max(from_bevy(value.min), from_bevy(value.max))
    }
}

impl From<Sphere> for BoundingSphere {
    fn from(value: Sphere) -> Self {
        BoundingSphere::new(to_bevy(value.center()), value.radius())
    }
}

impl From<BoundingSphere> for Sphere {
    fn from(value: BoundingSphere) -> Self {
        Sphere::new(from_bevy(value.center), value.radius())
    }
}

impl From<RayCast3d> for Ray {
    fn from(value: RayCast3d) -> Self {
        Ray::new(from_bevy(value.origin), from_bevy(*value.direction))
    }
}

impl<K> IntersectsVolume<Aabb3d> for Octree<K>
where
    K: Copy + PartialEq,
{
    /// Check if a [Aabb3d] volume intersects with the [Octree] root node.
    fn intersects(&self, volume: &Aabb3d) -> bool {
        let aabb: Aabb3d = self.root_aabb().into();
        volume.intersects(&aabb)
    }
}

impl<K> IntersectsVolume<BoundingSphere> for Octree<K>
where
    K: Copy + PartialEq,
{
    /// Check if a [BoundingSphere] volume intersects with the [Octree] root node.
    fn intersects(&self, volume: &BoundingSphere) -> bool {
        let aabb: Aabb3d = self.root_aabb().into();
        volume.intersects(&aabb)
    }
}

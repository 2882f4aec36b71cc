//! The closed set of shape kinds handled by the [`Registry`](crate::dispatch::Registry).

use std::fmt;

use glam::Vec3;

use crate::bounding::{Aabb, Frustum, Plane, Ray, Sphere, Triangle};

/// Dense integer tag of a shape kind, used to index dispatch tables.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeTag {
    Ray = 0,
    Triangle = 1,
    Sphere = 2,
    Plane = 3,
    Aabb = 4,
    Frustum = 5,
}

impl ShapeTag {
    pub const COUNT: usize = 6;

    pub const ALL: [ShapeTag; ShapeTag::COUNT] = [
        ShapeTag::Ray,
        ShapeTag::Triangle,
        ShapeTag::Sphere,
        ShapeTag::Plane,
        ShapeTag::Aabb,
        ShapeTag::Frustum,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeTag::Ray => "Ray",
            ShapeTag::Triangle => "Triangle",
            ShapeTag::Sphere => "Sphere",
            ShapeTag::Plane => "Plane",
            ShapeTag::Aabb => "Aabb",
            ShapeTag::Frustum => "Frustum",
        };
        f.write_str(name)
    }
}

/// Any of the six geometric primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Ray(Ray),
    Triangle(Triangle),
    Sphere(Sphere),
    Plane(Plane),
    Aabb(Aabb),
    Frustum(Frustum),
}

impl Shape {
    #[inline(always)]
    pub fn tag(&self) -> ShapeTag {
        match self {
            Shape::Ray(_) => ShapeTag::Ray,
            Shape::Triangle(_) => ShapeTag::Triangle,
            Shape::Sphere(_) => ShapeTag::Sphere,
            Shape::Plane(_) => ShapeTag::Plane,
            Shape::Aabb(_) => ShapeTag::Aabb,
            Shape::Frustum(_) => ShapeTag::Frustum,
        }
    }

    /// Representative position of a bounded shape.
    ///
    /// Rays and planes are unbounded and have none.
    pub fn center(&self) -> Option<Vec3> {
        match self {
            Shape::Triangle(t) => Some(t.centroid()),
            Shape::Sphere(s) => Some(s.center()),
            Shape::Aabb(a) => Some(a.center()),
            Shape::Frustum(f) => Some(f.bounds().center()),
            Shape::Ray(_) | Shape::Plane(_) => None,
        }
    }
}

/// Implemented by every primitive so the registry can recover the concrete
/// type behind a [`Shape`].
pub trait ShapeVariant: Copy + Into<Shape> + 'static {
    const TAG: ShapeTag;

    fn cast(shape: &Shape) -> Option<&Self>;
}

macro_rules! shape_variant {
    ($ty:ident) => {
        impl ShapeVariant for $ty {
            const TAG: ShapeTag = ShapeTag::$ty;

            #[inline(always)]
            fn cast(shape: &Shape) -> Option<&Self> {
                match shape {
                    Shape::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Shape {
            fn from(value: $ty) -> Self {
                Shape::$ty(value)
            }
        }
    };
}

shape_variant!(Ray);
shape_variant!(Triangle);
shape_variant!(Sphere);
shape_variant!(Plane);
shape_variant!(Aabb);
shape_variant!(Frustum);

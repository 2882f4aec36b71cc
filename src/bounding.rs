//! Bounding primitives.
//!
//! [`Ray`], [`Triangle`], [`Sphere`], [`Plane`], [`Aabb`], [`Frustum`] and the
//! [`Interval`] returned by parametrized ray queries.

use std::{
    array::from_fn,
    fmt::{self, Display},
};

use glam::{Mat4, Vec3};

/// Magnitude below which a direction component or a denominator counts as zero.
pub const EPSILON: f32 = f32::EPSILON;

/// Half-line defined by an origin and a direction.
///
/// Parametrized queries assume a unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Ray {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Ray { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Per-axis reciprocal of the direction.
    ///
    /// A zero component maps to `f32::MAX` instead of infinity, so slab
    /// products against a zero offset stay finite.
    pub(crate) fn inverse_direction(&self) -> Vec3 {
        let inv = |d: f32| if d.abs() < EPSILON { f32::MAX } else { 1.0 / d };
        Vec3::new(
            inv(self.direction.x),
            inv(self.direction.y),
            inv(self.direction.z),
        )
    }
}

/// Triangle defined by three points.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub k: Vec3,
    pub l: Vec3,
    pub m: Vec3,
}

impl Triangle {
    pub fn new(k: Vec3, l: Vec3, m: Vec3) -> Self {
        Triangle { k, l, m }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.k + self.l + self.m) / 3.0
    }

    pub fn points(&self) -> [Vec3; 3] {
        [self.k, self.l, self.m]
    }
}

/// Sphere defined by a center and a radius.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Sphere { center, radius }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }
}

/// Plane defined by a normal and a point on it.
///
/// The normal points toward the "right" side: [`Plane::distance`] is
/// positive there.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    point: Vec3,
    // cached -(normal . point)
    minus_n_dot_p: f32,
}

impl Plane {
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        Plane {
            normal,
            point,
            minus_n_dot_p: -normal.dot(point),
        }
    }

    /// Plane through three points, normal `normalize((c - b) x (a - b))`.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (c - b).cross(a - b).normalize();
        Plane::new(normal, a)
    }

    /// Plane from the `Ax + By + Cz + D = 0` coefficients.
    ///
    /// The normal `(A, B, C)` is normalized, `D` is scaled accordingly.
    pub fn from_coefficients(normal: Vec3, d: f32) -> Self {
        let len = normal.length();
        let (normal, d) = if len > 0.0 {
            (normal / len, d / len)
        } else {
            (normal, d)
        };
        Plane {
            normal,
            point: -normal * d,
            minus_n_dot_p: d,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn set_normal(&mut self, normal: Vec3) {
        *self = Plane::new(normal, self.point);
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }

    pub fn set_point(&mut self, point: Vec3) {
        *self = Plane::new(self.normal, point);
    }

    /// Signed distance of `p` from the plane.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.minus_n_dot_p + self.normal.dot(p)
    }

    /// Same plane facing the other way.
    pub fn flipped(&self) -> Plane {
        Plane::new(-self.normal, self.point)
    }
}

/// Axis Aligned Bounding Box
///
/// [`Aabb::default`] is the empty box (`min = +MAX`, `max = -MAX`), ready to be
/// grown with [`Aabb::expand`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}

impl Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aabb(min: {}, max: {})", self.min, self.max)
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(-f32::MAX),
    };

    /// Creates an [`Aabb`] from its center and half-extents.
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Aabb {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Creates an [`Aabb`] from a min and max
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Aabb { min, max }
    }

    /// Half of the box dimensions.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min).abs() * 0.5
    }

    pub fn center(&self) -> Vec3 {
        self.min + self.extents()
    }

    pub fn size(&self) -> Vec3 {
        (self.max - self.min).abs()
    }

    /// Corner furthest along `n`.
    #[inline]
    pub fn pos_vertex(&self, n: Vec3) -> Vec3 {
        Vec3::new(
            if n.x >= 0.0 { self.max.x } else { self.min.x },
            if n.y >= 0.0 { self.max.y } else { self.min.y },
            if n.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }

    /// Corner furthest against `n`.
    #[inline]
    pub fn neg_vertex(&self, n: Vec3) -> Vec3 {
        Vec3::new(
            if n.x >= 0.0 { self.min.x } else { self.max.x },
            if n.y >= 0.0 { self.min.y } else { self.max.y },
            if n.z >= 0.0 { self.min.z } else { self.max.z },
        )
    }

    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Corners in octant order (bit 0 = +x, bit 1 = +y, bit 2 = +z).
    pub fn corners(&self) -> [Vec3; 8] {
        from_fn(|i| {
            Vec3::new(
                if i & 0b1 != 0 { self.max.x } else { self.min.x },
                if i & 0b10 != 0 { self.max.y } else { self.min.y },
                if i & 0b100 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// Region of child `octant` (0..8): half the extents, offset from `min`
    /// by one half-extent on every axis whose bit is set.
    #[inline]
    pub fn octant(&self, octant: usize) -> Aabb {
        let half = self.extents();
        let offset = Vec3::new(
            if octant & 0b1 != 0 { half.x } else { 0.0 },
            if octant & 0b10 != 0 { half.y } else { 0.0 },
            if octant & 0b100 != 0 { half.z } else { 0.0 },
        );
        let min = self.min + offset;
        Aabb::from_min_max(min, min + half)
    }

    #[inline]
    pub fn split(&self) -> [Aabb; 8] {
        from_fn(|i| self.octant(i))
    }
}

/// Entry/exit parameters of a ray query.
///
/// A miss is [`Interval::INVALID`]. `near` is not guaranteed to be smaller
/// than `far`: when the ray starts inside the volume the exit comes first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub near: f32,
    pub far: f32,
}

impl Interval {
    pub const INVALID: Interval = Interval {
        near: f32::MAX,
        far: f32::MAX,
    };

    pub fn new(near: f32, far: f32) -> Self {
        Interval { near, far }
    }

    pub fn splat(t: f32) -> Self {
        Interval { near: t, far: t }
    }

    pub fn is_valid(&self) -> bool {
        *self != Interval::INVALID
    }

    /// `Some(self)` unless this is the miss sentinel.
    pub fn hit(self) -> Option<Interval> {
        self.is_valid().then_some(self)
    }

    pub fn min(&self) -> f32 {
        self.near.min(self.far)
    }

    pub fn max(&self) -> f32 {
        self.near.max(self.far)
    }
}

/// Six planes with inward facing normals and the eight corners of a view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
    pub points: [Vec3; 8],
}

impl Frustum {
    pub const TOP: usize = 0;
    pub const BOTTOM: usize = 1;
    pub const LEFT: usize = 2;
    pub const RIGHT: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    pub const NTL: usize = 0;
    pub const NTR: usize = 1;
    pub const NBL: usize = 2;
    pub const NBR: usize = 3;
    pub const FTL: usize = 4;
    pub const FTR: usize = 5;
    pub const FBL: usize = 6;
    pub const FBR: usize = 7;

    /// Builds the view volume of a perspective camera.
    ///
    /// `fov_y` is the full vertical field of view in radians, `aspect` is
    /// width over height.
    pub fn from_perspective(
        position: Vec3,
        view_dir: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let forward = view_dir.normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let nc = position + forward * near;
        let fc = position + forward * far;

        let tan = (fov_y * 0.5).tan();
        let nh = tan * near;
        let nw = nh * aspect;
        let fh = tan * far;
        let fw = fh * aspect;

        let mut points = [Vec3::ZERO; 8];
        points[Self::NTL] = nc + up * nh - right * nw;
        points[Self::NTR] = nc + up * nh + right * nw;
        points[Self::NBL] = nc - up * nh - right * nw;
        points[Self::NBR] = nc - up * nh + right * nw;
        points[Self::FTL] = fc + up * fh - right * fw;
        points[Self::FTR] = fc + up * fh + right * fw;
        points[Self::FBL] = fc - up * fh - right * fw;
        points[Self::FBR] = fc - up * fh + right * fw;

        Self::from_corners(points)
    }

    /// Builds the view volume of a view-projection matrix with a `[0, 1]`
    /// depth range (glam's `perspective_rh` / `perspective_lh`).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let inv = vp.inverse();
        let ndc = |x: f32, y: f32, z: f32| inv.project_point3(Vec3::new(x, y, z));

        let mut points = [Vec3::ZERO; 8];
        points[Self::NTL] = ndc(-1.0, 1.0, 0.0);
        points[Self::NTR] = ndc(1.0, 1.0, 0.0);
        points[Self::NBL] = ndc(-1.0, -1.0, 0.0);
        points[Self::NBR] = ndc(1.0, -1.0, 0.0);
        points[Self::FTL] = ndc(-1.0, 1.0, 1.0);
        points[Self::FTR] = ndc(1.0, 1.0, 1.0);
        points[Self::FBL] = ndc(-1.0, -1.0, 1.0);
        points[Self::FBR] = ndc(1.0, -1.0, 1.0);

        Self::from_corners(points)
    }

    /// Builds the planes from the eight corners, indexed by [`Frustum::NTL`]..[`Frustum::FBR`].
    pub fn from_corners(points: [Vec3; 8]) -> Self {
        let p = &points;
        let mut planes = [Plane::default(); 6];
        planes[Self::TOP] = Plane::from_points(p[Self::NTR], p[Self::NTL], p[Self::FTL]);
        planes[Self::BOTTOM] = Plane::from_points(p[Self::NBL], p[Self::NBR], p[Self::FBR]);
        planes[Self::LEFT] = Plane::from_points(p[Self::NTL], p[Self::NBL], p[Self::FBL]);
        planes[Self::RIGHT] = Plane::from_points(p[Self::NBR], p[Self::NTR], p[Self::FBR]);
        planes[Self::NEAR] = Plane::from_points(p[Self::NTL], p[Self::NTR], p[Self::NBR]);
        planes[Self::FAR] = Plane::from_points(p[Self::FTR], p[Self::FTL], p[Self::FBL]);

        // Winding follows the handedness of the corner set; face every plane
        // toward the centroid.
        let centroid = points.iter().copied().sum::<Vec3>() / 8.0;
        for plane in planes.iter_mut() {
            if plane.distance(centroid) < 0.0 {
                *plane = plane.flipped();
            }
        }

        Frustum { planes, points }
    }

    /// Box enclosing the eight corners.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for p in self.points {
            aabb.expand(p);
        }
        aabb
    }
}

//! Pairwise shape predicates.
//!
//! Each function takes the concrete primitives of one registered pair. They
//! are wired into the dispatch tables by
//! [`Registry::standard`](crate::dispatch::Registry::standard).

/// "Is `a` on the side of plane `b` its normal points to", at least partially.
pub mod right_side {
    use crate::bounding::{Aabb, Plane, Sphere};

    #[inline]
    pub fn sphere_plane(a: &Sphere, b: &Plane) -> bool {
        // dist + radius is how far the sphere reaches past the plane
        b.distance(a.center()) >= -a.radius()
    }

    #[inline]
    pub fn aabb_plane(a: &Aabb, b: &Plane) -> bool {
        b.distance(a.pos_vertex(b.normal())) >= 0.0
    }
}

/// "Is `a` entirely inside `b`". Touching the boundary counts as inside.
pub mod inside {
    use glam::Vec3;

    use crate::bounding::{Aabb, Sphere, Triangle};

    #[inline]
    pub fn aabb_aabb(a: &Aabb, b: &Aabb) -> bool {
        a.min.cmpge(b.min).all() && a.max.cmple(b.max).all()
    }

    #[inline]
    pub fn sphere_aabb(a: &Sphere, b: &Aabb) -> bool {
        let r = Vec3::splat(a.radius());
        (a.center() + r).cmple(b.max).all() && (a.center() - r).cmpge(b.min).all()
    }

    pub fn aabb_sphere(a: &Aabb, b: &Sphere) -> bool {
        let r2 = b.radius() * b.radius();
        a.corners()
            .iter()
            .all(|p| (*p - b.center()).length_squared() <= r2)
    }

    pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> bool {
        let slack = b.radius() - a.radius();
        slack >= 0.0 && (b.center() - a.center()).length_squared() <= slack * slack
    }

    pub fn triangle_aabb(a: &Triangle, b: &Aabb) -> bool {
        a.points().iter().all(|p| b.contains_point(*p))
    }
}

/// Boolean overlap tests. Registered once per unordered pair.
pub mod intersecting {
    use glam::Vec3;

    use super::{intersect, right_side};
    use crate::bounding::{Aabb, Frustum, Plane, Ray, Sphere, Triangle, EPSILON};

    pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> bool {
        let rad_sum = a.radius() + b.radius();
        (a.center() - b.center()).length_squared() <= rad_sum * rad_sum
    }

    pub fn sphere_plane(a: &Sphere, b: &Plane) -> bool {
        b.distance(a.center()).abs() <= a.radius()
    }

    /// Planes intersect unless their normals are parallel.
    pub fn plane_plane(a: &Plane, b: &Plane) -> bool {
        a.normal().cross(b.normal()) != Vec3::ZERO
    }

    pub fn aabb_aabb(a: &Aabb, b: &Aabb) -> bool {
        let t = (b.center() - a.center()).abs();
        t.cmple(a.extents() + b.extents()).all()
    }

    pub fn aabb_sphere(a: &Aabb, b: &Sphere) -> bool {
        let c = b.center();
        let nearest = c.max(a.min).min(a.max);
        (c - nearest).length_squared() <= b.radius() * b.radius()
    }

    pub fn aabb_plane(a: &Aabb, b: &Plane) -> bool {
        let dist_p = b.distance(a.pos_vertex(b.normal()));
        let dist_n = b.distance(a.neg_vertex(b.normal()));
        !((dist_n > 0.0 && dist_p > 0.0) || (dist_n < 0.0 && dist_p < 0.0))
    }

    /// Conservative: a sphere outside the volume but near an edge or corner
    /// passes.
    pub fn frustum_sphere(a: &Frustum, b: &Sphere) -> bool {
        a.planes.iter().all(|p| right_side::sphere_plane(b, p))
    }

    /// Conservative: a box outside the volume but near an edge or corner
    /// passes.
    pub fn frustum_aabb(a: &Frustum, b: &Aabb) -> bool {
        a.planes.iter().all(|p| right_side::aabb_plane(b, p))
    }

    pub fn ray_aabb(a: &Ray, b: &Aabb) -> bool {
        let (entry, exit) = intersect::slabs(a, b);
        exit > entry
    }

    pub fn ray_sphere(a: &Ray, b: &Sphere) -> bool {
        let m = a.origin - b.center();
        let c = m.length_squared() - b.radius() * b.radius();
        if c <= 0.0 {
            // origin inside
            return true;
        }

        let half_b = a.direction.dot(m);
        if half_b > 0.0 {
            // pointing away
            return false;
        }

        half_b * half_b - a.direction.length_squared() * c >= 0.0
    }

    pub fn ray_plane(a: &Ray, b: &Plane) -> bool {
        let denom = a.direction.dot(b.normal());
        if denom.abs() < EPSILON {
            return false;
        }
        (b.point() - a.origin).dot(b.normal()) * denom > 0.0
    }

    pub fn ray_triangle(a: &Ray, b: &Triangle) -> bool {
        intersect::ray_triangle(a, b).is_valid()
    }
}

/// Parametrized ray queries. A miss is [`Interval::INVALID`](crate::bounding::Interval::INVALID).
pub mod intersect {
    use crate::bounding::{Aabb, Interval, Plane, Ray, Sphere, Triangle, EPSILON};

    /// Largest per-axis entry and smallest per-axis exit.
    #[inline]
    pub(crate) fn slabs(ray: &Ray, aabb: &Aabb) -> (f32, f32) {
        let inv = ray.inverse_direction();
        let tbot = inv * (aabb.min - ray.origin);
        let ttop = inv * (aabb.max - ray.origin);

        let tmin = ttop.min(tbot);
        let tmax = ttop.max(tbot);

        (tmin.max_element(), tmax.min_element())
    }

    pub fn ray_aabb(a: &Ray, b: &Aabb) -> Interval {
        let (entry, exit) = slabs(a, b);
        if exit > entry {
            if entry >= 0.0 {
                Interval::new(entry, exit)
            } else {
                Interval::new(exit, entry)
            }
        } else {
            Interval::INVALID
        }
    }

    pub fn ray_sphere(a: &Ray, b: &Sphere) -> Interval {
        let x = a.origin - b.center();

        let qa = a.direction.length_squared();
        let qb = a.direction.dot(x) * 2.0;
        let qc = x.length_squared() - b.radius() * b.radius();

        let sqr = qb * qb - 4.0 * qa * qc;
        if sqr <= 0.0 || qa < EPSILON {
            return Interval::INVALID;
        }

        let root = sqr.sqrt();
        let inv_2a = 0.5 / qa;
        let t1 = (-qb - root) * inv_2a;
        let t2 = (-qb + root) * inv_2a;

        if t1 >= 0.0 {
            Interval::new(t1, t2)
        } else if t2 >= 0.0 {
            Interval::new(t2, t1)
        } else {
            Interval::INVALID
        }
    }

    pub fn ray_plane(a: &Ray, b: &Plane) -> Interval {
        let denom = a.direction.dot(b.normal());
        if denom.abs() < EPSILON {
            return Interval::INVALID;
        }

        let t = (b.point() - a.origin).dot(b.normal());
        if t * denom > 0.0 {
            Interval::splat(t / denom)
        } else {
            Interval::INVALID
        }
    }

    /// Möller–Trumbore. Hits on the far side of the origin only.
    pub fn ray_triangle(a: &Ray, b: &Triangle) -> Interval {
        let e1 = b.l - b.k;
        let e2 = b.m - b.k;

        let p = a.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < EPSILON {
            return Interval::INVALID;
        }
        let inv_det = 1.0 / det;

        let s = a.origin - b.k;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return Interval::INVALID;
        }

        let q = s.cross(e1);
        let v = a.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return Interval::INVALID;
        }

        let t = e2.dot(q) * inv_det;
        if t > EPSILON {
            Interval::splat(t)
        } else {
            Interval::INVALID
        }
    }
}

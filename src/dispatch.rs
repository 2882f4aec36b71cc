//! Closed-set predicate dispatch.
//!
//! Every operation owns a `6x6` table indexed by the [`ShapeTag`] of both
//! operands. Tables are filled through a [`RegistryBuilder`] and frozen into a
//! [`Registry`], which is then shared read-only.
//!
//! ```rust
//! use glam::Vec3;
//! use octocull::prelude::*;
//!
//! let registry = Registry::standard().unwrap();
//!
//! let ray = Shape::from(Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z));
//! let aabb = Shape::from(Aabb::new(Vec3::ZERO, Vec3::ONE));
//!
//! assert!(registry.is_intersecting(&ray, &aabb));
//! assert_eq!(registry.intersect(&aabb, &ray), Interval::new(4.0, 6.0));
//! ```

use std::{array::from_fn, fmt};

use crate::{
    bounding::{Aabb, Frustum, Interval, Plane, Ray, Sphere, Triangle},
    predicates::{inside, intersect, intersecting, right_side},
    shape::{Shape, ShapeTag, ShapeVariant},
    TreeError,
};

/// The four dispatched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `a` is on the side of `b` its normal points to.
    OnRightSide,
    /// `a` lies entirely inside `b`.
    Inside,
    /// `a` and `b` overlap.
    Intersecting,
    /// Parametrized intersection, an [`Interval`].
    Intersect,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::OnRightSide => write!(f, "Predicate: OnRightSide"),
            Predicate::Inside => write!(f, "Predicate: Inside"),
            Predicate::Intersecting => write!(f, "Predicate: Intersecting"),
            Predicate::Intersect => write!(f, "Predicate: Intersect"),
        }
    }
}

/// Type-erased pair implementation. `None` means the operands did not carry
/// the tags of the slot they were dispatched through.
type Erased<R> = Box<dyn Fn(&Shape, &Shape) -> Option<R> + Send + Sync>;

struct Table<R> {
    slots: [[Option<Erased<R>>; ShapeTag::COUNT]; ShapeTag::COUNT],
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Table {
            slots: from_fn(|_| from_fn(|_| None)),
        }
    }
}

impl<R> Table<R> {
    #[inline(always)]
    fn get(&self, a: ShapeTag, b: ShapeTag) -> Option<&Erased<R>> {
        self.slots[a.index()][b.index()].as_ref()
    }

    #[inline(always)]
    fn contains(&self, a: ShapeTag, b: ShapeTag) -> bool {
        self.get(a, b).is_some()
    }

    /// Returns `false` if the slot was already taken.
    fn set(&mut self, a: ShapeTag, b: ShapeTag, f: Erased<R>) -> bool {
        let slot = &mut self.slots[a.index()][b.index()];
        let vacant = slot.is_none();
        *slot = Some(f);
        vacant
    }

    fn pairs(&self) -> usize {
        self.slots.iter().flatten().filter(|s| s.is_some()).count()
    }
}

fn erase<A, B, R, F>(f: F) -> Erased<R>
where
    A: ShapeVariant,
    B: ShapeVariant,
    F: Fn(&A, &B) -> R + Send + Sync + 'static,
{
    Box::new(move |a: &Shape, b: &Shape| match (A::cast(a), B::cast(b)) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    })
}

fn erase_swapped<A, B, R, F>(f: F) -> Erased<R>
where
    A: ShapeVariant,
    B: ShapeVariant,
    F: Fn(&A, &B) -> R + Send + Sync + 'static,
{
    Box::new(move |b: &Shape, a: &Shape| match (A::cast(a), B::cast(b)) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    })
}

pub(crate) fn unregistered(op: Predicate, a: ShapeTag, b: ShapeTag) -> TreeError {
    TreeError::UnregisteredPair(format!("{op} has no implementation for ({a}, {b})"))
}

/// Collects pair implementations and validates them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    on_right_side: Table<bool>,
    inside: Table<bool>,
    intersecting: Table<bool>,
    intersect: Table<Interval>,
    duplicates: Vec<(Predicate, ShapeTag, ShapeTag)>,
    required: Vec<(Predicate, ShapeTag, ShapeTag)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    fn note(&mut self, vacant: bool, op: Predicate, a: ShapeTag, b: ShapeTag) {
        if !vacant {
            self.duplicates.push((op, a, b));
        }
    }

    /// Registers `a` on the right side of `b` for the ordered pair `(A, B)` only.
    pub fn on_right_side<A, B, F>(mut self, f: F) -> Self
    where
        A: ShapeVariant,
        B: ShapeVariant,
        F: Fn(&A, &B) -> bool + Send + Sync + 'static,
    {
        let vacant = self.on_right_side.set(A::TAG, B::TAG, erase(f));
        self.note(vacant, Predicate::OnRightSide, A::TAG, B::TAG);
        self
    }

    /// Registers `(A, B)` and serves `(B, A)` with the operands swapped.
    pub fn on_right_side_mirrored<A, B, F>(mut self, f: F) -> Self
    where
        A: ShapeVariant,
        B: ShapeVariant,
        F: Fn(&A, &B) -> bool + Clone + Send + Sync + 'static,
    {
        let vacant = self.on_right_side.set(A::TAG, B::TAG, erase(f.clone()));
        self.note(vacant, Predicate::OnRightSide, A::TAG, B::TAG);
        if A::TAG != B::TAG {
            let vacant = self.on_right_side.set(B::TAG, A::TAG, erase_swapped(f));
            self.note(vacant, Predicate::OnRightSide, B::TAG, A::TAG);
        }
        self
    }

    /// Registers "`A` entirely inside `B`". Containment is not symmetric.
    pub fn inside<A, B, F>(mut self, f: F) -> Self
    where
        A: ShapeVariant,
        B: ShapeVariant,
        F: Fn(&A, &B) -> bool + Send + Sync + 'static,
    {
        let vacant = self.inside.set(A::TAG, B::TAG, erase(f));
        self.note(vacant, Predicate::Inside, A::TAG, B::TAG);
        self
    }

    /// Registers the boolean intersection of `A` and `B`, in both orders.
    pub fn intersecting<A, B, F>(mut self, f: F) -> Self
    where
        A: ShapeVariant,
        B: ShapeVariant,
        F: Fn(&A, &B) -> bool + Clone + Send + Sync + 'static,
    {
        let vacant = self.intersecting.set(A::TAG, B::TAG, erase(f.clone()));
        self.note(vacant, Predicate::Intersecting, A::TAG, B::TAG);
        if A::TAG != B::TAG {
            let vacant = self.intersecting.set(B::TAG, A::TAG, erase_swapped(f));
            self.note(vacant, Predicate::Intersecting, B::TAG, A::TAG);
        }
        self
    }

    /// Registers the parametrized intersection of `A` and `B`, in both orders.
    pub fn intersect<A, B, F>(mut self, f: F) -> Self
    where
        A: ShapeVariant,
        B: ShapeVariant,
        F: Fn(&A, &B) -> Interval + Clone + Send + Sync + 'static,
    {
        let vacant = self.intersect.set(A::TAG, B::TAG, erase(f.clone()));
        self.note(vacant, Predicate::Intersect, A::TAG, B::TAG);
        if A::TAG != B::TAG {
            let vacant = self.intersect.set(B::TAG, A::TAG, erase_swapped(f));
            self.note(vacant, Predicate::Intersect, B::TAG, A::TAG);
        }
        self
    }

    /// Makes [`build`](RegistryBuilder::build) fail unless `(a, b)` ends up registered for `op`.
    pub fn require(mut self, op: Predicate, a: ShapeTag, b: ShapeTag) -> Self {
        self.required.push((op, a, b));
        self
    }

    pub fn build(self) -> Result<Registry, TreeError> {
        if let Some((op, a, b)) = self.duplicates.first() {
            return Err(TreeError::DuplicatePair(format!(
                "{op} is registered more than once for ({a}, {b})"
            )));
        }

        let registry = Registry {
            on_right_side: self.on_right_side,
            inside: self.inside,
            intersecting: self.intersecting,
            intersect: self.intersect,
        };

        for &(op, a, b) in self.required.iter() {
            if !registry.supports(op, a, b) {
                return Err(unregistered(op, a, b));
            }
        }

        Ok(registry)
    }
}

/// Frozen dispatch tables.
pub struct Registry {
    on_right_side: Table<bool>,
    inside: Table<bool>,
    intersecting: Table<bool>,
    intersect: Table<Interval>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("on_right_side", &self.on_right_side.pairs())
            .field("inside", &self.inside.pairs())
            .field("intersecting", &self.intersecting.pairs())
            .field("intersect", &self.intersect.pairs())
            .finish()
    }
}

impl Registry {
    /// Builder preloaded with every built-in pair.
    pub fn standard_builder() -> RegistryBuilder {
        RegistryBuilder::new()
            .on_right_side_mirrored::<Sphere, Plane, _>(right_side::sphere_plane)
            .on_right_side_mirrored::<Aabb, Plane, _>(right_side::aabb_plane)
            .inside::<Aabb, Aabb, _>(inside::aabb_aabb)
            .inside::<Aabb, Sphere, _>(inside::aabb_sphere)
            .inside::<Sphere, Aabb, _>(inside::sphere_aabb)
            .inside::<Sphere, Sphere, _>(inside::sphere_sphere)
            .inside::<Triangle, Aabb, _>(inside::triangle_aabb)
            .intersecting::<Aabb, Aabb, _>(intersecting::aabb_aabb)
            .intersecting::<Aabb, Sphere, _>(intersecting::aabb_sphere)
            .intersecting::<Ray, Aabb, _>(intersecting::ray_aabb)
            .intersecting::<Frustum, Aabb, _>(intersecting::frustum_aabb)
            .intersecting::<Aabb, Plane, _>(intersecting::aabb_plane)
            .intersecting::<Sphere, Plane, _>(intersecting::sphere_plane)
            .intersecting::<Ray, Plane, _>(intersecting::ray_plane)
            .intersecting::<Plane, Plane, _>(intersecting::plane_plane)
            .intersecting::<Sphere, Sphere, _>(intersecting::sphere_sphere)
            .intersecting::<Ray, Sphere, _>(intersecting::ray_sphere)
            .intersecting::<Frustum, Sphere, _>(intersecting::frustum_sphere)
            .intersecting::<Ray, Triangle, _>(intersecting::ray_triangle)
            .intersect::<Ray, Aabb, _>(intersect::ray_aabb)
            .intersect::<Ray, Plane, _>(intersect::ray_plane)
            .intersect::<Ray, Sphere, _>(intersect::ray_sphere)
            .intersect::<Ray, Triangle, _>(intersect::ray_triangle)
    }

    pub fn standard() -> Result<Registry, TreeError> {
        Self::standard_builder().build()
    }

    pub fn supports(&self, op: Predicate, a: ShapeTag, b: ShapeTag) -> bool {
        match op {
            Predicate::OnRightSide => self.on_right_side.contains(a, b),
            Predicate::Inside => self.inside.contains(a, b),
            Predicate::Intersecting => self.intersecting.contains(a, b),
            Predicate::Intersect => self.intersect.contains(a, b),
        }
    }

    #[inline]
    fn dispatch<R>(
        table: &Table<R>,
        op: Predicate,
        a: &Shape,
        b: &Shape,
    ) -> Result<R, TreeError> {
        table
            .get(a.tag(), b.tag())
            .and_then(|f| f(a, b))
            .ok_or_else(|| unregistered(op, a.tag(), b.tag()))
    }

    pub fn try_is_on_right_side(&self, a: &Shape, b: &Shape) -> Result<bool, TreeError> {
        Self::dispatch(&self.on_right_side, Predicate::OnRightSide, a, b)
    }

    pub fn try_is_inside(&self, a: &Shape, b: &Shape) -> Result<bool, TreeError> {
        Self::dispatch(&self.inside, Predicate::Inside, a, b)
    }

    pub fn try_is_intersecting(&self, a: &Shape, b: &Shape) -> Result<bool, TreeError> {
        Self::dispatch(&self.intersecting, Predicate::Intersecting, a, b)
    }

    pub fn try_intersect(&self, a: &Shape, b: &Shape) -> Result<Interval, TreeError> {
        Self::dispatch(&self.intersect, Predicate::Intersect, a, b)
    }

    /// # Panics
    ///
    /// If `(a, b)` has no registered implementation.
    pub fn is_on_right_side(&self, a: &Shape, b: &Shape) -> bool {
        self.try_is_on_right_side(a, b)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    ///
    /// If `(a, b)` has no registered implementation.
    pub fn is_inside(&self, a: &Shape, b: &Shape) -> bool {
        self.try_is_inside(a, b).unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    ///
    /// If `(a, b)` has no registered implementation.
    pub fn is_intersecting(&self, a: &Shape, b: &Shape) -> bool {
        self.try_is_intersecting(a, b)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    ///
    /// If `(a, b)` has no registered implementation.
    pub fn intersect(&self, a: &Shape, b: &Shape) -> Interval {
        self.try_intersect(a, b).unwrap_or_else(|err| panic!("{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::Rng;

    fn random_vec(rng: &mut impl Rng) -> Vec3 {
        Vec3::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
        )
    }

    fn random_shapes(rng: &mut impl Rng) -> Vec<Shape> {
        let frustum = Frustum::from_perspective(
            random_vec(rng),
            random_vec(rng).try_normalize().unwrap_or(Vec3::NEG_Z),
            Vec3::Y,
            1.0,
            1.3,
            0.5,
            10.0,
        );
        vec![
            Ray::new(random_vec(rng), random_vec(rng).try_normalize().unwrap_or(Vec3::X)).into(),
            Triangle::new(random_vec(rng), random_vec(rng), random_vec(rng)).into(),
            Sphere::new(random_vec(rng), rng.gen_range(0.1..3.0)).into(),
            Plane::new(random_vec(rng).try_normalize().unwrap_or(Vec3::Y), random_vec(rng)).into(),
            Aabb::new(random_vec(rng), random_vec(rng).abs() * 0.5).into(),
            frustum.into(),
        ]
    }

    #[test]
    fn test_standard_pairs() {
        let registry = Registry::standard().unwrap();

        assert!(registry.supports(Predicate::OnRightSide, ShapeTag::Sphere, ShapeTag::Plane));
        assert!(registry.supports(Predicate::OnRightSide, ShapeTag::Plane, ShapeTag::Aabb));
        assert!(registry.supports(Predicate::Inside, ShapeTag::Triangle, ShapeTag::Aabb));
        assert!(!registry.supports(Predicate::Inside, ShapeTag::Aabb, ShapeTag::Triangle));
        assert!(registry.supports(Predicate::Intersecting, ShapeTag::Aabb, ShapeTag::Frustum));
        assert!(registry.supports(Predicate::Intersecting, ShapeTag::Frustum, ShapeTag::Aabb));
        assert!(registry.supports(Predicate::Intersect, ShapeTag::Triangle, ShapeTag::Ray));
        assert!(!registry.supports(Predicate::Intersecting, ShapeTag::Frustum, ShapeTag::Frustum));

        let debug = format!("{registry:?}");
        assert!(debug.contains("inside: 5"));
        assert!(debug.contains("intersect: 8"));
    }

    #[test]
    fn test_ray_against_box() {
        let registry = Registry::standard().unwrap();
        let ray: Shape = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).into();
        let aabb: Shape = Aabb::new(Vec3::ZERO, Vec3::ONE).into();

        assert!(registry.is_intersecting(&ray, &aabb));
        assert!(registry.is_intersecting(&aabb, &ray));
        assert_eq!(registry.intersect(&ray, &aabb), Interval::new(4.0, 6.0));
        assert_eq!(registry.intersect(&aabb, &ray), Interval::new(4.0, 6.0));
    }

    #[test]
    fn test_right_side_both_orders() {
        let registry = Registry::standard().unwrap();
        let plane: Shape = Plane::new(Vec3::X, Vec3::ZERO).into();
        let left: Shape = Sphere::new(Vec3::new(-3.0, 0.0, 0.0), 1.0).into();
        let right: Shape = Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0).into();

        assert!(!registry.is_on_right_side(&left, &plane));
        assert!(!registry.is_on_right_side(&plane, &left));
        assert!(registry.is_on_right_side(&right, &plane));
        assert!(registry.is_on_right_side(&plane, &right));
    }

    #[test]
    fn test_intersecting_is_symmetric() {
        let registry = Registry::standard().unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let shapes = random_shapes(&mut rng);
            for a in shapes.iter() {
                for b in shapes.iter() {
                    if !registry.supports(Predicate::Intersecting, a.tag(), b.tag()) {
                        continue;
                    }
                    assert_eq!(
                        registry.is_intersecting(a, b),
                        registry.is_intersecting(b, a),
                        "{} vs {}",
                        a.tag(),
                        b.tag()
                    );
                }
            }
        }
    }

    #[test]
    fn test_inside_implies_intersecting() {
        let registry = Registry::standard().unwrap();
        let mut rng = rand::thread_rng();

        let mut insides = 0;
        for _ in 0..2000 {
            let sphere: Shape = Sphere::new(random_vec(&mut rng), rng.gen_range(0.1..2.0)).into();
            let aabb: Shape =
                Aabb::new(random_vec(&mut rng), random_vec(&mut rng).abs() + Vec3::ONE).into();

            if registry.is_inside(&sphere, &aabb) {
                insides += 1;
                assert!(registry.is_intersecting(&sphere, &aabb));
            }
            if registry.is_inside(&aabb, &sphere) {
                assert!(registry.is_intersecting(&aabb, &sphere));
            }
        }
        assert!(insides > 0);
    }

    #[test]
    fn test_unregistered_pair() {
        let registry = Registry::standard().unwrap();
        let frustum: Shape = Frustum::from_perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            1.0,
            1.0,
            1.0,
            10.0,
        )
        .into();

        assert!(matches!(
            registry.try_is_intersecting(&frustum, &frustum),
            Err(TreeError::UnregisteredPair(_))
        ));
        assert!(matches!(
            registry.try_intersect(&frustum, &Shape::from(Aabb::default())),
            Err(TreeError::UnregisteredPair(_))
        ));
    }

    #[test]
    #[should_panic(expected = "Unregistered")]
    fn test_unregistered_pair_panics() {
        let registry = Registry::standard().unwrap();
        let ray: Shape = Ray::default().into();
        registry.is_inside(&ray, &ray);
    }

    #[test]
    fn test_duplicate_pair() {
        let result = RegistryBuilder::new()
            .intersecting::<Aabb, Sphere, _>(intersecting::aabb_sphere)
            .intersecting::<Sphere, Aabb, _>(|s: &Sphere, a: &Aabb| intersecting::aabb_sphere(a, s))
            .build();
        assert!(matches!(result, Err(TreeError::DuplicatePair(_))));

        let result = Registry::standard_builder()
            .inside::<Aabb, Aabb, _>(inside::aabb_aabb)
            .build();
        assert!(matches!(result, Err(TreeError::DuplicatePair(_))));
    }

    #[test]
    fn test_required_pair() {
        let result = RegistryBuilder::new()
            .inside::<Aabb, Aabb, _>(inside::aabb_aabb)
            .require(Predicate::Inside, ShapeTag::Aabb, ShapeTag::Aabb)
            .require(Predicate::Intersecting, ShapeTag::Frustum, ShapeTag::Aabb)
            .build();
        assert!(matches!(result, Err(TreeError::UnregisteredPair(_))));

        let result = Registry::standard_builder()
            .require(Predicate::Intersecting, ShapeTag::Frustum, ShapeTag::Aabb)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_custom_pair() {
        // frustum vs frustum through the bounds of both
        let registry = Registry::standard_builder()
            .intersecting::<Frustum, Frustum, _>(|a: &Frustum, b: &Frustum| {
                intersecting::aabb_aabb(&a.bounds(), &b.bounds())
            })
            .build()
            .unwrap();

        let frustum: Shape =
            Frustum::from_perspective(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 1.0, 1.0, 1.0, 10.0)
                .into();
        assert!(registry.is_intersecting(&frustum, &frustum));
    }
}

//! Read-only traversals: frustum culling, shape queries and helpers with a
//! custom intersection closure.
//!
//! All of them walk the tree depth-first and prune the subtree of any node
//! whose region fails the test. Every key stored at a passing node is
//! reported; keys are never tested individually.

use heapless::Vec as HVec;

use crate::{
    bounding::{Aabb, Frustum},
    dispatch::{unregistered, Predicate},
    shape::{Shape, ShapeTag},
    tree::Octree,
    NodeId, TreeError,
};

impl<K> Octree<K>
where
    K: Copy + PartialEq,
{
    /// Keys of every node whose region intersects `frustum`.
    ///
    /// The test is conservative, so keys of nodes just outside the volume may
    /// be reported too.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use glam::Vec3;
    /// use octocull::prelude::*;
    ///
    /// let registry = Arc::new(Registry::standard().unwrap());
    /// let mut tree = Octree::from_aabb(registry, Aabb::new(Vec3::ZERO, Vec3::splat(64.0))).unwrap();
    /// tree.insert(7u32, &Aabb::new(Vec3::new(0.0, 0.0, -20.0), Vec3::ONE).into()).unwrap();
    ///
    /// let frustum = Frustum::from_perspective(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 1.0, 1.0, 0.1, 100.0);
    /// assert_eq!(tree.get_culled_objects(&frustum), vec![7]);
    /// ```
    pub fn get_culled_objects(&self, frustum: &Frustum) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        self.extend_culled_objects(frustum, &mut keys);
        keys
    }

    /// Same as [`get_culled_objects`](Octree::get_culled_objects), reusing a
    /// supplied [`vector`](Vec) rather than allocating a new one.
    pub fn extend_culled_objects(&self, frustum: &Frustum, keys: &mut Vec<K>) {
        let frustum = Shape::Frustum(*frustum);
        self.extend_intersect_with(
            |aabb| self.registry.is_intersecting(&frustum, &Shape::Aabb(*aabb)),
            keys,
        );
    }

    /// Keys of every node whose region intersects `shape`.
    pub fn query(&self, shape: &Shape) -> Result<Vec<K>, TreeError> {
        if !self
            .registry
            .supports(Predicate::Intersecting, shape.tag(), ShapeTag::Aabb)
        {
            return Err(unregistered(
                Predicate::Intersecting,
                shape.tag(),
                ShapeTag::Aabb,
            ));
        }

        Ok(self.intersect_with(|aabb| {
            self.registry.is_intersecting(shape, &Shape::Aabb(*aabb))
        }))
    }

    /// `true` iff `key` is stored on a path from the root whose every region
    /// intersects `frustum`.
    pub fn is_in_frustum(&self, key: &K, frustum: &Frustum) -> bool {
        let frustum = Shape::Frustum(*frustum);
        self.rcontains_with(self.root, key, &|aabb: &Aabb| {
            self.registry.is_intersecting(&frustum, &Shape::Aabb(*aabb))
        })
    }

    fn rcontains_with<F>(&self, node: NodeId, key: &K, what: &F) -> bool
    where
        F: Fn(&Aabb) -> bool,
    {
        let mut stack = HVec::<NodeId, 32>::new();
        if stack.push(node).is_err() {
            return false;
        }
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if !what(&n.aabb) {
                continue;
            }
            if n.objects.contains(key) {
                return true;
            }
            for child in n.active_children() {
                if stack.push(child).is_err() && self.rcontains_with(child, key, what) {
                    return true;
                }
            }
        }
        false
    }

    /// Region of every node, depth-first from the root.
    pub fn get_boxes(&self) -> Vec<Aabb> {
        let mut boxes = Vec::with_capacity(self.node_count());
        self.rvisit_nodes(self.root, &|_| true, &mut |node| {
            boxes.push(self.nodes[node].aabb)
        });
        boxes
    }

    /// Intersect [`Octree`] with a custom intersection closure.
    ///
    /// Returns the [`vector`](Vec) of keys stored at the nodes whose region
    /// passes `what`.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use glam::Vec3;
    /// use octocull::prelude::*;
    ///
    /// let registry = Arc::new(Registry::standard().unwrap());
    /// let mut tree = Octree::from_aabb(registry, Aabb::new(Vec3::ZERO, Vec3::splat(16.0))).unwrap();
    /// tree.insert('a', &Sphere::new(Vec3::ONE, 1.0).into()).unwrap();
    ///
    /// assert_eq!(tree.intersect_with(|_| true), vec!['a']);
    /// assert!(tree.intersect_with(|_| false).is_empty());
    /// ```
    pub fn intersect_with<F>(&self, what: F) -> Vec<K>
    where
        F: Fn(&Aabb) -> bool,
    {
        let mut keys = Vec::with_capacity(10);
        self.extend_intersect_with(what, &mut keys);
        keys
    }

    /// Intersect [`Octree`] with a custom intersection closure reusing a
    /// supplied [`vector`](Vec) rather than allocating a new one.
    pub fn extend_intersect_with<F>(&self, what: F, keys: &mut Vec<K>)
    where
        F: Fn(&Aabb) -> bool,
    {
        self.intersect_with_for_each(what, |key| keys.push(*key));
    }

    /// Intersect [`Octree`] with a custom intersection closure. Each key
    /// stored at a passing node is handed to `actor`.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use glam::Vec3;
    /// use octocull::prelude::*;
    ///
    /// let registry = Arc::new(Registry::standard().unwrap());
    /// let mut tree = Octree::from_aabb(registry, Aabb::new(Vec3::ZERO, Vec3::splat(16.0))).unwrap();
    /// tree.insert(3u8, &Sphere::new(Vec3::ONE, 1.0).into()).unwrap();
    ///
    /// let mut sum = 0;
    /// tree.intersect_with_for_each(|_| true, |key| sum += key);
    /// assert_eq!(sum, 3);
    /// ```
    pub fn intersect_with_for_each<F, A>(&self, what: F, mut actor: A)
    where
        F: Fn(&Aabb) -> bool,
        A: FnMut(&K),
    {
        self.rvisit_nodes(self.root, &what, &mut |node| {
            for key in self.nodes[node].objects.iter() {
                actor(key);
            }
        });
    }

    fn rvisit_nodes<F, V>(&self, node: NodeId, what: &F, visit: &mut V)
    where
        F: Fn(&Aabb) -> bool,
        V: FnMut(NodeId),
    {
        // We use a heapless stack to loop through the nodes however if the
        // stack becomes full then we fallback on recursive calls.
        let mut stack = HVec::<NodeId, 32>::new();
        if stack.push(node).is_err() {
            return;
        }
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if !what(&n.aabb) {
                continue;
            }
            visit(node);

            // reversed, so octant 0 is popped first
            for octant in (0..8).rev() {
                if let Some(child) = n.child(octant) {
                    if stack.push(child).is_err() {
                        self.rvisit_nodes(child, what, visit);
                    }
                }
            }
        }
    }
}

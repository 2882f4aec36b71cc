use std::sync::Arc;

use glam::Vec3;
use heapless::Vec as HVec;
use log::{debug, trace, warn};

use crate::{
    bounding::{Aabb, Plane, Sphere},
    config::OctreeConfig,
    dispatch::{unregistered, Predicate, Registry},
    node::{Life, Node},
    pool::Pool,
    shape::{Shape, ShapeTag},
    NodeId, TreeError,
};

/// Pairs every tree operation dispatches through, independent of the
/// inserted shapes.
const REQUIRED_PAIRS: [(Predicate, ShapeTag, ShapeTag); 3] = [
    (Predicate::Inside, ShapeTag::Aabb, ShapeTag::Aabb),
    (Predicate::OnRightSide, ShapeTag::Sphere, ShapeTag::Plane),
    (Predicate::Intersecting, ShapeTag::Frustum, ShapeTag::Aabb),
];

/// Dynamic sparse octree of caller-owned keys.
///
/// The tree stores keys only; the bounding [`Shape`] of a key is supplied on
/// [`insert`](Octree::insert) and [`reposition`](Octree::reposition).
pub struct Octree<K> {
    pub(crate) nodes: Pool<Node<K>>,
    pub(crate) root: NodeId,
    pub(crate) registry: Arc<Registry>,
    pub(crate) config: OctreeConfig,
    len: usize,
}

impl<K> Octree<K>
where
    K: Copy + PartialEq,
{
    pub fn from_aabb(registry: Arc<Registry>, aabb: Aabb) -> Result<Self, TreeError> {
        Self::build(registry, aabb, OctreeConfig::default(), 0)
    }

    pub fn with_config(
        registry: Arc<Registry>,
        aabb: Aabb,
        config: OctreeConfig,
    ) -> Result<Self, TreeError> {
        Self::build(registry, aabb, config, 0)
    }

    /// Helps to reduce the amount of the memory reallocations.
    pub fn from_aabb_with_capacity(
        registry: Arc<Registry>,
        aabb: Aabb,
        capacity: usize,
    ) -> Result<Self, TreeError> {
        Self::build(registry, aabb, OctreeConfig::default(), capacity)
    }

    fn build(
        registry: Arc<Registry>,
        aabb: Aabb,
        config: OctreeConfig,
        capacity: usize,
    ) -> Result<Self, TreeError> {
        for (op, a, b) in REQUIRED_PAIRS {
            if !registry.supports(op, a, b) {
                return Err(unregistered(op, a, b));
            }
        }

        // fields are public, so the setter clamp may have been bypassed
        let config = config.with_initial_lifespan(config.initial_lifespan);
        let mut nodes = Pool::with_capacity(capacity.max(1));
        let root = nodes.insert(Node::from_aabb(aabb, None, config.initial_lifespan));

        Ok(Octree {
            nodes,
            root,
            registry,
            config,
            len: 0,
        })
    }

    /// Current root. Replaced by growth and collapse.
    #[inline(always)]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline(always)]
    pub fn root_aabb(&self) -> Aabb {
        self.nodes[self.root].aabb
    }

    pub fn nodes(&self) -> &Pool<Node<K>> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Number of stored keys.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Stores `key` at the shallowest node that fully contains `shape`,
    /// growing the root first when needed.
    ///
    /// Keys must be unique; inserting a stored key again is not detected.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use glam::Vec3;
    /// use octocull::prelude::*;
    ///
    /// let registry = Arc::new(Registry::standard().unwrap());
    /// let mut tree = Octree::from_aabb(registry, Aabb::new(Vec3::ZERO, Vec3::ONE)).unwrap();
    ///
    /// tree.insert(1u32, &Sphere::new(Vec3::splat(10.0), 1.0).into()).unwrap();
    /// assert!(tree.root_aabb().contains_point(Vec3::splat(10.0)));
    /// ```
    pub fn insert(&mut self, key: K, shape: &Shape) -> Result<(), TreeError> {
        self.check_insertable(shape)?;

        if !self.fits(shape, self.root) {
            self.grow(shape)?;
        }

        self._insert(key, shape, self.root);
        self.len += 1;
        Ok(())
    }

    /// Moves `key` to match its new bounding `shape`.
    ///
    /// The key stays where it is while the holding node still contains it.
    /// Otherwise it is reinserted from the nearest containing ancestor.
    pub fn reposition(&mut self, key: K, shape: &Shape) -> Result<(), TreeError> {
        let node = self.find_node(&key).ok_or_else(|| {
            TreeError::KeyNotFound("Attempt to reposition a key which is not stored".into())
        })?;
        self.check_insertable(shape)?;

        if self.fits(shape, node) {
            return Ok(());
        }

        let mut start = self.nodes[node].parent;
        while let Some(ancestor) = start {
            if self.fits(shape, ancestor) {
                break;
            }
            start = self.nodes[ancestor].parent;
        }

        let start = match start {
            Some(ancestor) => ancestor,
            None => {
                self.grow(shape)?;
                self.root
            }
        };

        self.take_key(node, &key);
        self._insert(key, shape, start);
        Ok(())
    }

    /// Erases `key` from the first node holding it.
    pub fn remove(&mut self, key: &K) -> Result<(), TreeError> {
        match self.find_node(key) {
            Some(node) => {
                self.take_key(node, key);
                self.len -= 1;
                Ok(())
            }
            None => Err(TreeError::KeyNotFound(
                "Attempt to remove a key which is not stored".into(),
            )),
        }
    }

    /// Repositions every pair, then runs one [`maintain`](Octree::maintain) pass.
    pub fn update(&mut self, objects: &[(K, Shape)]) -> Result<(), TreeError> {
        for (key, shape) in objects {
            self.reposition(*key, shape)?;
        }
        self.maintain();
        Ok(())
    }

    /// Ages empty nodes, detaches expired ones and collapses a root with a
    /// single child.
    ///
    /// An empty leaf is detached on the `max_lifespan`-th consecutive pass it
    /// spends empty. A node that is revived during its countdown doubles its
    /// `max_lifespan`, up to [`OctreeConfig::max_lifespan_cap`].
    pub fn maintain(&mut self) {
        self.maintain_node(self.root);
        self.collapse_root();
    }

    fn maintain_node(&mut self, node: NodeId) {
        for octant in 0..8 {
            let Some(child) = self.nodes[node].child(octant) else {
                continue;
            };
            self.maintain_node(child);
            let n = &self.nodes[child];
            if n.life.is_dead() && !n.has_children() {
                self.detach(node, octant);
            }
        }

        let cap = self.config.max_lifespan_cap;
        let n = &mut self.nodes[node];
        if n.objects.is_empty() {
            // a countdown holds while the node has children
            if !n.has_children() {
                n.life = match n.life {
                    Life::Alive => Life::Countdown(n.max_lifespan.saturating_sub(1)),
                    Life::Countdown(left) => Life::Countdown(left.saturating_sub(1)),
                };
            }
        } else if n.life != Life::Alive {
            n.life = Life::Alive;
            n.max_lifespan = n.max_lifespan.saturating_mul(2).min(cap);
        }
    }

    fn detach(&mut self, parent: NodeId, octant: usize) {
        let child = self.nodes[parent].children[octant];
        self.nodes[parent].clear_child(octant);
        self.nodes.remove(child);
        trace!("Detached {child} from octant {octant} of {parent}");
    }

    fn collapse_root(&mut self) {
        loop {
            let root = &self.nodes[self.root];
            if !root.objects.is_empty() || root.children_count() != 1 {
                return;
            }
            let Some(child) = root.active_children().next() else {
                return;
            };

            let old = self.root;
            self.nodes.remove(old);
            self.nodes[child].parent = None;
            self.root = child;
            debug!("Collapsed root {old} into {child}: {}", self.nodes[child].aabb);
        }
    }

    fn check_insertable(&self, shape: &Shape) -> Result<(), TreeError> {
        if self
            .registry
            .supports(Predicate::Inside, shape.tag(), ShapeTag::Aabb)
        {
            Ok(())
        } else {
            Err(TreeError::NotInsertable(format!(
                "{} has no containment test against Aabb",
                shape.tag()
            )))
        }
    }

    #[inline(always)]
    fn fits(&self, shape: &Shape, node: NodeId) -> bool {
        self.contains(shape, self.nodes[node].aabb)
    }

    #[inline(always)]
    fn contains(&self, shape: &Shape, region: Aabb) -> bool {
        self.registry.is_inside(shape, &Shape::Aabb(region))
    }

    /// Doubles the root until it contains `shape`.
    ///
    /// Per axis the new root extends toward the side of the old root's
    /// center the shape's center lies on, so the old root keeps its place as
    /// one octant of the new one. The regions are planned first; no node is
    /// created unless the shape fits within `max_growth_steps` doublings.
    fn grow(&mut self, shape: &Shape) -> Result<(), TreeError> {
        let center = shape.center().ok_or_else(|| {
            TreeError::NotInsertable(format!("{} has no center to grow toward", shape.tag()))
        })?;
        let probe = Shape::Sphere(Sphere::new(center, 0.0));

        let mut region = self.root_aabb();
        let mut plan = Vec::new();
        while !self.contains(shape, region) {
            if plan.len() as u32 == self.config.max_growth_steps {
                warn!(
                    "Root growth stopped after {} steps at {region}",
                    plan.len()
                );
                return Err(TreeError::GrowthLimit(format!(
                    "Root does not contain the shape after {} doublings",
                    plan.len()
                )));
            }
            let step = self.doubled(&probe, region);
            region = step.0;
            plan.push(step);
        }

        for (grown, octant) in plan {
            let old = self.root;
            let mut node = Node::from_aabb(grown, None, self.config.initial_lifespan);
            node.set_child(octant, old);
            let root = self.nodes.insert(node);

            self.nodes[old].parent = Some(root);
            self.root = root;
            debug!("Grew root to {grown}, old root {old} in octant {octant}");
        }
        Ok(())
    }

    /// Region twice the size of `aabb` toward `probe`, and the octant `aabb`
    /// takes in it. The kept faces are copied, so `aabb` stays inside.
    fn doubled(&self, probe: &Shape, aabb: Aabb) -> (Aabb, usize) {
        let center = aabb.center();
        let size = aabb.size();
        let (mut min, mut max) = (aabb.min, aabb.max);

        let mut octant = 0;
        for (axis, normal) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
            let plane = Shape::Plane(Plane::new(normal, center));
            if self.registry.is_on_right_side(probe, &plane) {
                max[axis] += size[axis];
            } else {
                min[axis] -= size[axis];
                octant |= 1 << axis;
            }
        }
        (Aabb::from_min_max(min, max), octant)
    }

    fn _insert(&mut self, key: K, shape: &Shape, start: NodeId) {
        let mut node = start;
        loop {
            let n = &self.nodes[node];
            if n.aabb.size().x <= self.config.min_node_size
                || n.objects.len() < self.config.split_threshold
            {
                break;
            }
            match self.descend(node, shape) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.nodes[node].objects.push(key);
    }

    /// First octant of `node` that fully contains `shape`, created on demand.
    fn descend(&mut self, node: NodeId, shape: &Shape) -> Option<NodeId> {
        let aabb = self.nodes[node].aabb;
        for octant in 0..8 {
            let existing = self.nodes[node].child(octant);
            let region = match existing {
                Some(child) => self.nodes[child].aabb,
                None => aabb.octant(octant),
            };
            if !self.contains(shape, region) {
                continue;
            }

            return Some(match existing {
                Some(child) => child,
                None => {
                    let child = self.nodes.insert(Node::from_aabb(
                        region,
                        Some(node),
                        self.config.initial_lifespan,
                    ));
                    self.nodes[node].set_child(octant, child);
                    trace!("Created {child} in octant {octant} of {node}");
                    child
                }
            });
        }
        None
    }

    fn take_key(&mut self, node: NodeId, key: &K) {
        let objects = &mut self.nodes[node].objects;
        if let Some(idx) = objects.iter().position(|k| k == key) {
            objects.remove(idx);
        }
    }

    /// Node holding `key`, depth-first.
    pub(crate) fn find_node(&self, key: &K) -> Option<NodeId> {
        self.rfind_node(self.root, key)
    }

    fn rfind_node(&self, node: NodeId, key: &K) -> Option<NodeId> {
        let mut stack = HVec::<NodeId, 32>::new();
        stack.push(node).ok()?;
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if n.objects.contains(key) {
                return Some(node);
            }
            for child in n.active_children() {
                // If we can't push to the stack then we fallback to recursive calls.
                if stack.push(child).is_err() {
                    if let Some(found) = self.rfind_node(child, key) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

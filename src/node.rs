use core::fmt;

use smallvec::SmallVec;

use crate::{bounding::Aabb, NodeId};

/// A region of the [`Octree`](crate::tree::Octree).
///
/// Children are indexed by octant: bit 0 is `+x`, bit 1 is `+y`, bit 2 is `+z`.
/// Bit `c` of `active` is set iff `children[c]` is occupied.
#[derive(Clone, Debug)]
pub struct Node<K> {
    pub aabb: Aabb,
    pub children: [NodeId; 8],
    pub active: u8,
    pub objects: SmallVec<[K; 4]>,
    pub parent: Option<NodeId>,
    pub life: Life,
    pub max_lifespan: u32,
}

impl<K> Node<K> {
    pub(crate) fn from_aabb(aabb: Aabb, parent: Option<NodeId>, max_lifespan: u32) -> Self {
        Node {
            aabb,
            children: Default::default(),
            active: 0,
            objects: SmallVec::new(),
            parent,
            life: Life::Alive,
            max_lifespan,
        }
    }

    #[inline(always)]
    pub fn has_children(&self) -> bool {
        self.active != 0
    }

    /// Holds objects and has no children.
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.state() == NodeState::Leaf
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn state(&self) -> NodeState {
        if self.has_children() {
            NodeState::Internal
        } else if self.objects.is_empty() {
            NodeState::Empty
        } else {
            NodeState::Leaf
        }
    }

    #[inline(always)]
    pub fn child(&self, octant: usize) -> Option<NodeId> {
        (self.active & (1 << octant) != 0).then_some(self.children[octant])
    }

    #[inline(always)]
    pub fn children_count(&self) -> u32 {
        self.active.count_ones()
    }

    /// Active children in octant order.
    pub fn active_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..8).filter_map(|octant| self.child(octant))
    }

    pub(crate) fn set_child(&mut self, octant: usize, child: NodeId) {
        self.children[octant] = child;
        self.active |= 1 << octant;
    }

    pub(crate) fn clear_child(&mut self, octant: usize) {
        self.children[octant] = NodeId::default();
        self.active &= !(1 << octant);
    }
}

/// Countdown of an empty node toward detachment.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Life {
    /// Occupied, or empty for less than one maintenance pass.
    #[default]
    Alive,
    /// Passes left before the node is detached.
    Countdown(u32),
}

impl Life {
    #[inline(always)]
    pub fn is_dead(&self) -> bool {
        *self == Life::Countdown(0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeState {
    Empty,
    Leaf,
    Internal,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Empty => write!(f, "NodeState: Empty"),
            NodeState::Leaf => write!(f, "NodeState: Leaf"),
            NodeState::Internal => write!(f, "NodeState: Internal"),
        }
    }
}

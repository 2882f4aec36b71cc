//! Tunable constants of an [`Octree`](crate::tree::Octree).

/// ```rust
/// use octocull::prelude::*;
///
/// let config = OctreeConfig::default()
///     .with_min_node_size(4.0)
///     .with_split_threshold(8);
/// assert_eq!(config.initial_lifespan, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Nodes with an edge this short or shorter are never subdivided.
    pub min_node_size: f32,

    /// A node keeps objects directly until it holds this many.
    pub split_threshold: usize,

    /// Maintenance passes an empty leaf survives before it is detached.
    pub initial_lifespan: u32,

    /// Upper bound for the lifespan doubling on revival.
    pub max_lifespan_cap: u32,

    /// Root doublings a single insertion may trigger.
    pub max_growth_steps: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        OctreeConfig {
            min_node_size: 1.0,
            split_threshold: 3,
            initial_lifespan: 8,
            max_lifespan_cap: 64,
            max_growth_steps: 64,
        }
    }
}

impl OctreeConfig {
    pub fn with_min_node_size(mut self, min_node_size: f32) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    pub fn with_split_threshold(mut self, split_threshold: usize) -> Self {
        self.split_threshold = split_threshold;
        self
    }

    /// A zero lifespan is raised to one pass.
    pub fn with_initial_lifespan(mut self, initial_lifespan: u32) -> Self {
        self.initial_lifespan = initial_lifespan.max(1);
        self
    }

    pub fn with_max_lifespan_cap(mut self, max_lifespan_cap: u32) -> Self {
        self.max_lifespan_cap = max_lifespan_cap;
        self
    }

    pub fn with_max_growth_steps(mut self, max_growth_steps: u32) -> Self {
        self.max_growth_steps = max_growth_steps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = OctreeConfig::default()
            .with_initial_lifespan(0)
            .with_max_lifespan_cap(16)
            .with_max_growth_steps(4);

        assert_eq!(config.initial_lifespan, 1);
        assert_eq!(config.max_lifespan_cap, 16);
        assert_eq!(config.max_growth_steps, 4);
        assert_eq!(config.min_node_size, 1.0);
        assert_eq!(config.split_threshold, 3);
    }
}

//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the pool arena.
///
/// Controls the size of the first pool and how quickly later pools grow.
/// Validated when the arena is constructed; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Capacity in bytes of the first pool the arena creates.
    ///
    /// Default: 1024. Must be non-zero.
    pub initial_capacity: usize,

    /// Multiplier applied to the most recently created pool's capacity when
    /// sizing the next pool.
    ///
    /// Default: 2. Must be at least 1 (1 means every pool has the same
    /// size unless a single request needs more).
    pub growth_factor: usize,

    /// Upper bound on the capacity of any pool, or `None` for no ceiling
    /// beyond the platform's layout limit.
    ///
    /// Geometric growth is clamped to this value, and a single request that
    /// would need a larger pool fails with
    /// [`ArenaError::AllocationTooLarge`].
    pub max_pool_capacity: Option<usize>,
}

impl ArenaConfig {
    /// Default capacity of the first pool, in bytes.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

    /// Default growth multiplier between consecutive pools.
    pub const DEFAULT_GROWTH_FACTOR: usize = 2;

    /// Create a config with the given first-pool capacity.
    ///
    /// Uses default values for all other parameters.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            max_pool_capacity: None,
        }
    }

    /// Set the growth multiplier.
    #[must_use]
    pub fn with_growth_factor(mut self, growth_factor: usize) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Set the pool capacity ceiling.
    #[must_use]
    pub fn with_max_pool_capacity(mut self, max_pool_capacity: usize) -> Self {
        self.max_pool_capacity = Some(max_pool_capacity);
        self
    }

    /// Check the config for values the arena cannot work with.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial_capacity == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "initial_capacity must be non-zero".into(),
            });
        }
        if self.growth_factor == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "growth_factor must be >= 1".into(),
            });
        }
        if let Some(max) = self.max_pool_capacity {
            if max < self.initial_capacity {
                return Err(ArenaError::InvalidConfig {
                    reason: format!(
                        "max_pool_capacity ({max}) must be >= initial_capacity ({})",
                        self.initial_capacity
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}

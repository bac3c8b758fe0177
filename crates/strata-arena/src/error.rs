//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during pool and arena operations.
///
/// Every failing operation leaves the arena's bookkeeping exactly as it was
/// before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The targeted pool cannot fit the request.
    OutOfSpace {
        /// Bytes the request needs beyond the pool's current cursor,
        /// alignment padding included.
        requested: usize,
        /// Bytes left in the pool.
        remaining: usize,
    },
    /// A reallocation targeted a block that is not its pool's most recent
    /// allocation. Only the tip of a pool may grow or shrink in place.
    NotLastAllocation,
    /// The alignment is zero or not a power of two, or a pointer handed to
    /// `reallocate` does not satisfy it.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
    /// The request exceeds the largest pool the arena is allowed to create.
    AllocationTooLarge {
        /// Bytes requested.
        requested: usize,
        /// Largest pool capacity the arena may create.
        limit: usize,
    },
    /// A pointer handed to `reallocate` does not belong to any pool of
    /// this arena.
    UnknownPointer,
    /// An allocation or reallocation was attempted while a
    /// [`pools`](crate::Arena::pools) view was still alive.
    PoolsBorrowed,
    /// The arena configuration is invalid.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfSpace {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "pool out of space: requested {requested} bytes, remaining {remaining} bytes"
                )
            }
            Self::NotLastAllocation => {
                write!(f, "block is not the pool's last allocation")
            }
            Self::InvalidAlignment { alignment } => {
                write!(f, "invalid alignment: {alignment}")
            }
            Self::AllocationTooLarge { requested, limit } => {
                write!(
                    f,
                    "allocation too large: requested {requested} bytes, limit {limit} bytes"
                )
            }
            Self::UnknownPointer => write!(f, "pointer was not issued by this arena"),
            Self::PoolsBorrowed => write!(f, "arena pools are borrowed by a live view"),
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_sizes() {
        let err = ArenaError::OutOfSpace {
            requested: 64,
            remaining: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("64"));
        assert!(msg.contains("8"));
    }

    #[test]
    fn display_invalid_config_includes_reason() {
        let err = ArenaError::InvalidConfig {
            reason: "growth_factor must be >= 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid arena config: growth_factor must be >= 1"
        );
    }
}

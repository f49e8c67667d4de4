//! Mutation generations
//!
//! The tree carries a counter bumped on every structural or attribute
//! mutation. Two reads at the same generation observed the same tree.

/// Generation counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Generation of a freshly built tree
    pub const INITIAL: Self = Generation(0);

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    #[inline]
    pub fn is_newer_than(self, other: Self) -> bool {
        self.0 > other.0
    }
}

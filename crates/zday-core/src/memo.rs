//! A cached value with an explicit recompute predicate.

/// Holds the last computed value until a validity check rejects it.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    value: Option<T>,
    recomputations: u64,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            value: None,
            recomputations: 0,
        }
    }
}

impl<T> Memo<T> {
    /// Create an empty memo.
    pub const fn new() -> Self {
        Self {
            value: None,
            recomputations: 0,
        }
    }

    /// Return the cached value if `is_valid` accepts it; otherwise replace
    /// it with `recompute()` (which may yield nothing) and return that.
    pub fn resolve(
        &mut self,
        is_valid: impl FnOnce(&T) -> bool,
        recompute: impl FnOnce() -> Option<T>,
    ) -> Option<&T> {
        if !self.value.as_ref().is_some_and(is_valid) {
            self.value = recompute();
            self.recomputations = self.recomputations.saturating_add(1);
        }
        self.value.as_ref()
    }

    /// The cached value, without validation.
    pub const fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drop the cached value.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// How many times the value has been recomputed.
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

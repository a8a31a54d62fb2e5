//! Helpers for bounded configuration values.

use std::cmp;

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a config variable.
#[derive(Clone, Copy, Debug)]
pub struct DefMinMax<T> {
    /// The default value,
    def: T,

    /// The minimum value,
    min: T,

    /// The maximum value,
    max: T,
}

impl<T> DefMinMax<T> {
    /// Creates a new value.
    pub const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    /// Returns the default value.
    pub fn default(self) -> T {
        self.def
    }

    /// Trims the given value to fit into the minimum/maximum range.
    pub fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn limit_clamps_to_range() {
        let dmm = DefMinMax::new(12_u16, 1, 100);
        assert_eq!(dmm.default(), 12);
        assert_eq!(dmm.limit(0), 1);
        assert_eq!(dmm.limit(50), 50);
        assert_eq!(dmm.limit(1000), 100);
    }

    #[test]
    fn limit_durations() {
        let dmm = DefMinMax::new(
            Duration::from_secs(5),
            Duration::from_millis(100),
            Duration::from_secs(60),
        );
        assert_eq!(dmm.limit(Duration::ZERO), Duration::from_millis(100));
        assert_eq!(
            dmm.limit(Duration::from_secs(3600)),
            Duration::from_secs(60)
        );
    }
}

/// Represents a range of floating-point values.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ValueRange {
    /// Lower bound
    pub low: f32,
    /// Upper bound
    pub high: f32,
}

impl ValueRange {
    /// Constructs new, empty range.
    pub fn empty() -> ValueRange {
        ValueRange {
            low: f32::NAN,
            high: f32::NAN,
        }
    }

    /// Constructs minimal range, where all samples from an iterator
    /// are inside the range.
    pub fn from_samples(iter: impl IntoIterator<Item = f32>) -> ValueRange {
        let mut range = ValueRange::empty();
        for val in iter {
            range.extend(val);
        }
        range
    }

    /// Extend the range with new value.
    pub fn extend(&mut self, val: f32) {
        if self.is_empty() {
            self.low = val;
            self.high = val;
            return;
        }

        if val > self.high {
            self.high = val;
        }

        if val < self.low {
            self.low = val;
        }
    }

    /// No value was added yet
    pub fn is_empty(&self) -> bool {
        self.low.is_nan() || self.high.is_nan()
    }

    /// Check if value is inside the range.
    pub fn contains(&self, val: f32) -> bool {
        self.low <= val && val <= self.high
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extend_from_empty() {
        let mut range = ValueRange::empty();
        assert!(range.is_empty());

        range.extend(4.0);
        assert_eq!(range, ValueRange { low: 4.0, high: 4.0 });

        range.extend(-1.0);
        range.extend(2.0);
        assert_eq!(range, ValueRange { low: -1.0, high: 4.0 });
        assert!(range.contains(0.0));
        assert!(!range.contains(4.5));
    }

    #[test]
    fn from_samples() {
        let range = ValueRange::from_samples([3.0, 0.0, 4095.0, 12.0]);
        assert_eq!(range.low, 0.0);
        assert_eq!(range.high, 4095.0);
    }
}

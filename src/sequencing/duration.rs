/// Musical note duration represented as a rational fraction of a whole note.
/// All operations preserve exact ratios—no floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    // Standard note values
    pub const WHOLE: Duration = Duration {
        numerator: 1,
        denominator: 1,
    };
    pub const HALF: Duration = Duration {
        numerator: 1,
        denominator: 2,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const EIGHTH: Duration = Duration {
        numerator: 1,
        denominator: 8,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };
    pub const THIRTY_SECOND: Duration = Duration {
        numerator: 1,
        denominator: 32,
    };

    // Convenience constants for common dotted notes
    pub const DOTTED_HALF: Duration = Duration::HALF.dotted();
    pub const DOTTED_QUARTER: Duration = Duration::QUARTER.dotted();
    pub const DOTTED_EIGHTH: Duration = Duration::EIGHTH.dotted();

    // Convenience constants for common triplets
    pub const QUARTER_TRIPLET: Duration = Duration::QUARTER.triplet();
    pub const EIGHTH_TRIPLET: Duration = Duration::EIGHTH.triplet();

    /// Apply a dot: multiply duration by 3/2 (increases by 50%)
    pub const fn dotted(self) -> Self {
        Duration {
            numerator: self.numerator * 3,
            denominator: self.denominator * 2,
        }
    }

    /// Create a triplet: multiply duration by 2/3
    /// (three notes in the time of two)
    pub const fn triplet(self) -> Self {
        self.tuplet(2, 3)
    }

    /// General tuplet: `played` notes in the time of `in_time_of` notes
    /// E.g., `.tuplet(2, 3)` = triplet (3 in time of 2)
    ///       `.tuplet(4, 5)` = quintuplet (5 in time of 4)
    pub const fn tuplet(self, in_time_of: u32, played: u32) -> Self {
        Duration {
            numerator: self.numerator * in_time_of,
            denominator: self.denominator * played,
        }
    }

    /// Double the duration
    pub const fn double(self) -> Self {
        Duration {
            numerator: self.numerator * 2,
            denominator: self.denominator,
        }
    }

    /// Halve the duration
    pub const fn half(self) -> Self {
        Duration {
            numerator: self.numerator,
            denominator: self.denominator * 2,
        }
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Convert this duration to integer ticks
    /// ppq = pulses per quarter note (standard MIDI timing resolution)
    /// Formula: ticks = (numerator * 4 * ppq) / denominator
    pub fn to_ticks(&self, ppq: u32) -> u32 {
        (self.numerator * 4 * ppq) / self.denominator
    }

    /// Add two durations (finds common denominator)
    pub const fn add(self, other: Self) -> Self {
        Duration {
            numerator: self.numerator * other.denominator + other.numerator * self.denominator,
            denominator: self.denominator * other.denominator,
        }
        .reduce()
    }
}

/// Compute greatest common divisor (Euclidean algorithm)
/// Used to reduce fractions to lowest terms
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

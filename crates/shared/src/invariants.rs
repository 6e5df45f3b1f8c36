//! Range-checked numeric wrappers for configuration knobs.

use std::fmt;

/// Out-of-range error for bounded numeric wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError<T> {
    /// Raw value provided.
    pub value: T,
    /// Inclusive minimum.
    pub min: T,
    /// Inclusive maximum.
    pub max: T,
}

impl<T: fmt::Display> fmt::Display for BoundsError<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "value {} is outside [{}, {}]",
            self.value, self.min, self.max
        )
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for BoundsError<T> {}

/// Bounded `u32` with const generic limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedU32<const MIN: u32, const MAX: u32>(u32);

impl<const MIN: u32, const MAX: u32> BoundedU32<MIN, MAX> {
    /// Create a bounded value when within the inclusive range.
    pub const fn new(value: u32) -> Option<Self> {
        if value < MIN || value > MAX {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Create a bounded value or return a bounds error.
    pub const fn try_new(value: u32) -> Result<Self, BoundsError<u32>> {
        match Self::new(value) {
            Some(value) => Ok(value),
            None => Err(BoundsError {
                value,
                min: MIN,
                max: MAX,
            }),
        }
    }

    /// Return the wrapped value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Bounded `u64` with const generic limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedU64<const MIN: u64, const MAX: u64>(u64);

impl<const MIN: u64, const MAX: u64> BoundedU64<MIN, MAX> {
    /// Create a bounded value when within the inclusive range.
    pub const fn new(value: u64) -> Option<Self> {
        if value < MIN || value > MAX {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Create a bounded value or return a bounds error.
    pub const fn try_new(value: u64) -> Result<Self, BoundsError<u64>> {
        match Self::new(value) {
            Some(value) => Ok(value),
            None => Err(BoundsError {
                value,
                min: MIN,
                max: MAX,
            }),
        }
    }

    /// Return the wrapped value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

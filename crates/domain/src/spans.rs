//! Half-open line ranges.

use crate::primitives::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line range `[start, end)` with 0-indexed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    #[serde(rename = "startLine")]
    start: usize,
    #[serde(rename = "endLine")]
    end: usize,
}

impl LineRange {
    /// Construct a non-empty range.
    pub const fn new(start: usize, end: usize) -> Result<Self, PrimitiveError> {
        if start >= end {
            return Err(PrimitiveError::EmptyLineRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First line in the range.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last line in the range.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of lines covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// True when `line` falls inside the range.
    #[must_use]
    pub const fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {})", self.start, self.end)
    }
}

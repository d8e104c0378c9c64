use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("sequence {seq} has invalid symbol {symbol:?} at position {pos}")]
    InvalidSymbol { seq: usize, pos: usize, symbol: char },
    #[error("guide #{index} is malformed: {fault}")]
    InvalidGuide { index: usize, fault: GuideFault },
    #[error("a {len1} x {len2} matrix exceeds the addressable number of cells")]
    TooLarge { len1: usize, len2: usize },
    #[error("invalid scoring: {0}")]
    InvalidScoring(String),
    /// An invariant of the recursion was violated. Never expected.
    #[error("internal alignment error: {0}")]
    Internal(String),
}

/// What is wrong with a guide hit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideFault {
    #[error("start lies after end")]
    Reversed,
    #[error("query and subject spans differ in length")]
    LengthMismatch,
    #[error("span runs past the end of the sequence")]
    OutOfRange,
    #[error("starts before the previous guide")]
    Unsorted,
    #[error("overlaps the previous guide")]
    Overlapping,
}

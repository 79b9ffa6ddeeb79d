//! Boundary validation for caller-supplied input

/// Invalid input supplied by a caller.
///
/// This is the only error category that surfaces from the engine's public
/// entry points. Collaborator failures are absorbed and reported through the
/// dispatch result instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Quality rating outside 0..=5
    #[error("Quality rating out of range: {0} (expected 0..=5)")]
    QualityOutOfRange(i32),
    /// Negative repetition count
    #[error("Repetitions must not be negative: {0}")]
    NegativeRepetitions(i32),
    /// Repetition count above the supported maximum
    #[error("Repetitions exceed the supported maximum of 100000: {0}")]
    TooManyRepetitions(i32),
    /// Interval below one day
    #[error("Interval must be at least 1 day: {0}")]
    IntervalTooSmall(i32),
    /// Interval above the supported maximum
    #[error("Interval exceeds the supported maximum of 36500 days: {0}")]
    IntervalTooLarge(i32),
    /// Ease factor below the floor or not finite
    #[error("Invalid ease factor: {0} (must be finite and >= 1.3)")]
    InvalidEaseFactor(f64),
    /// Unknown feedback label
    #[error("Unknown feedback label: {0}")]
    UnknownFeedback(String),
    /// Item identifier missing
    #[error("Item id must not be empty")]
    EmptyItemId,
    /// A numeric context field outside its documented range
    #[error("Field '{field}' out of range: {value}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f64,
    },
}

/// Validation result type
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reject a value outside `[0, 1]` (or non-finite).
pub(crate) fn check_unit(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}

/// Reject a value outside `[0, max]` (or non-finite).
pub(crate) fn check_range(field: &'static str, value: f64, max: f64) -> Result<()> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}

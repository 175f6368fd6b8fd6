//! Range query step resolution.

/// Number of steps a range is split into when no step is given.
pub const DEFAULT_STEPS_PER_RANGE: u64 = 250;

/// Smallest step the server accepts, in seconds.
pub const MIN_STEP: u64 = 1;

/// Resolve the step of a range query.
///
/// Without an explicit step the range is divided into
/// [`DEFAULT_STEPS_PER_RANGE`] steps (integer division). The result is never
/// below [`MIN_STEP`], whether given or derived.
#[must_use]
pub fn resolve_step(range_secs: u64, step: Option<u64>) -> u64 {
    step.unwrap_or(range_secs / DEFAULT_STEPS_PER_RANGE)
        .max(MIN_STEP)
}

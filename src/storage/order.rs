//! Fractional ordering within a column.
//!
//! Orders are plain `f64` sort keys. Inserting between two neighbors takes
//! their midpoint; inserting at an edge steps one `GAP` past the neighbor.
//! No rebalancing pass exists.

/// Distance kept from a single neighbor when inserting at a column edge.
pub const GAP: f64 = 99_999.899_12;

/// Order assigned when no neighbor is known.
pub const INITIAL_ORDER: f64 = 100_000_000_000.0;

/// Compute an order from the orders of the issue that should follow
/// (`before`) and the one that should precede (`after`).
///
/// An existing `current` order is kept when it already satisfies the
/// requested placement, which avoids churning the update log.
#[must_use]
pub fn compute_order(before: Option<f64>, after: Option<f64>, current: Option<f64>) -> f64 {
    match (before, after) {
        (Some(before), Some(after)) => match current {
            Some(current) if after < current && current < before => current,
            _ => after + (before - after) / 2.0,
        },
        (Some(before), None) => match current {
            Some(current) if current < before => current,
            _ => before - GAP,
        },
        (None, Some(after)) => match current {
            Some(current) if current > after => current,
            _ => after + GAP,
        },
        (None, None) => INITIAL_ORDER,
    }
}

//! Domain error types.
//!
//! These errors signal data inconsistencies inside the planner. They never
//! describe bad user input: a caller that sees one has found a corrupt
//! timetable or a bug.

use super::StopId;

/// Domain-level errors for data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., arrival before departure)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// Consecutive legs don't share a stop
    #[error("discontinuous itinerary: leg {} ends at {ends_at} but leg {} starts at {starts_at}", .index, .index + 1)]
    Discontinuous {
        index: usize,
        ends_at: StopId,
        starts_at: StopId,
    },

    /// Search bookkeeping doesn't lead back to the origin
    #[error("path reconstruction failed: {0}")]
    BrokenPath(&'static str),
}

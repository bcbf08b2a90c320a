//! Network graph compiler.
//!
//! Turns a [`TimetableSnapshot`](crate::timetable::TimetableSnapshot) into
//! the departure-sorted connection list used by the planner, plus an
//! adjacency summary for diagnostics.

mod compile;
mod connection;

pub use compile::{EdgeSummary, GraphStats, NetworkGraph};
pub use connection::{Connection, StopIdx, WalkTransfer};

use crate::domain::{ServiceTime, StopId, TripId};

/// Errors raised while compiling a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A trip reaches a stop before leaving the previous one
    #[error("trip {trip} has negative travel time: departs {from} at {departure}, arrives {to} at {arrival}")]
    NegativeTravelTime {
        trip: TripId,
        from: StopId,
        to: StopId,
        departure: ServiceTime,
        arrival: ServiceTime,
    },

    /// A record references a stop missing from the snapshot
    #[error("unknown stop {0}")]
    UnknownStop(StopId),
}

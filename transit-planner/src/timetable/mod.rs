//! Timetable snapshot and GTFS loading.
//!
//! The snapshot is pure data: stops, routes, trips with their ordered stop
//! visits, and optional walk transfers. It is built once and shared
//! read-only by everything downstream.

mod error;
mod loader;
mod model;

pub use error::TimetableError;
pub use loader::load_dir;
pub use model::{
    DEFAULT_TRANSFER_SECS, Route, Stop, StopVisit, TimetableSnapshot, Transfer, Trip,
};

#[cfg(test)]
pub(crate) use model::fixtures;

//! Domain types for the transit journey planner.
//!
//! This module contains the value types shared by the search and the live
//! overlay. Types enforce their invariants at construction time, so code
//! that receives them can trust their validity.

mod error;
mod ids;
mod itinerary;
mod leg;
pub mod mode;
mod time;

pub use error::DomainError;
pub use ids::{InvalidId, RouteId, StopId, TripId, WALK_TRIP_ID};
pub use itinerary::{InvalidityReason, Itinerary, ItineraryRealtime, Validity};
pub use leg::{Leg, LegRealtime, LegRoute, StopRef};
pub use mode::{TransportMode, is_multi_modal, mode_name, modes_used};
pub use time::{
    ClockTime, SECONDS_PER_DAY, ServiceTime, TimeError, format_delay, format_duration,
};

//! Itinerary types.
//!
//! An `Itinerary` is a complete journey from origin to destination: an
//! ordered, connected, non-empty list of legs.

use std::fmt;

use chrono::Duration;

use super::{
    ClockTime, DomainError, Leg, ServiceTime, StopId, StopRef, TransportMode, format_duration,
    mode,
};

/// Why live data made an itinerary unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidityReason {
    /// At least one leg's trip was cancelled.
    ServiceCancelled,
    /// The vehicle no longer calls where a leg boards or alights.
    StopSkipped { stop_id: StopId, stop_name: String },
    /// A transfer window shrank below what the change needs.
    MissedTransfer {
        stop_id: StopId,
        stop_name: String,
        available_secs: i64,
        required_secs: i64,
    },
}

impl fmt::Display for InvalidityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidityReason::ServiceCancelled => {
                f.write_str("One or more services have been cancelled")
            }
            InvalidityReason::StopSkipped { stop_name, .. } => {
                write!(f, "Service no longer stops at {stop_name}")
            }
            InvalidityReason::MissedTransfer {
                stop_name,
                available_secs,
                required_secs,
                ..
            } => write!(
                f,
                "Transfer at {stop_name} no longer feasible: only {} min available, need {} min",
                available_secs.div_euclid(60),
                required_secs / 60
            ),
        }
    }
}

/// Whether an itinerary is still usable after live data was applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Validity {
    #[default]
    Valid,
    Invalid(InvalidityReason),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn reason(&self) -> Option<&InvalidityReason> {
        match self {
            Validity::Valid => None,
            Validity::Invalid(reason) => Some(reason),
        }
    }
}

/// Itinerary-level live data summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItineraryRealtime {
    /// Sum of per-leg departure delays.
    pub total_delay_secs: i64,
    /// First leg's actual departure, when known.
    pub actual_departure: Option<ClockTime>,
    /// Last leg's actual arrival, when known.
    pub actual_arrival: Option<ClockTime>,
    pub validity: Validity,
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs connect (`legs[i].to_stop() == legs[i + 1].from_stop()`)
/// - Origin and destination match the first and last legs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    legs: Vec<Leg>,
    realtime: Option<ItineraryRealtime>,
}

impl Itinerary {
    /// Constructs an itinerary from legs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the list is empty or consecutive legs don't connect.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        for (index, window) in legs.windows(2).enumerate() {
            let ends_at = window[0].to_stop();
            let starts_at = window[1].from_stop();
            if ends_at != starts_at {
                return Err(DomainError::Discontinuous {
                    index,
                    ends_at: ends_at.clone(),
                    starts_at: starts_at.clone(),
                });
            }
        }

        Ok(Itinerary {
            legs,
            realtime: None,
        })
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    fn first_leg(&self) -> &Leg {
        // Safe: validated non-empty at construction
        &self.legs[0]
    }

    fn last_leg(&self) -> &Leg {
        &self.legs[self.legs.len() - 1]
    }

    pub fn origin(&self) -> &StopRef {
        self.first_leg().from()
    }

    pub fn destination(&self) -> &StopRef {
        self.last_leg().to()
    }

    /// Returns the scheduled departure time.
    pub fn departure(&self) -> ServiceTime {
        self.first_leg().departure()
    }

    /// Returns the scheduled arrival time.
    pub fn arrival(&self) -> ServiceTime {
        self.last_leg().arrival()
    }

    /// Returns the scheduled duration.
    pub fn duration(&self) -> Duration {
        self.arrival().signed_duration_since(self.departure())
    }

    /// Returns the number of transfers (legs - 1).
    pub fn transfer_count(&self) -> usize {
        self.legs.len() - 1
    }

    /// Scheduled wait in seconds between each pair of consecutive legs.
    pub fn transfer_wait_times(&self) -> Vec<i64> {
        self.legs
            .windows(2)
            .map(|w| w[1].departure().signed_secs_since(w[0].arrival()))
            .collect()
    }

    /// Distinct non-walking modes in first-seen order.
    pub fn modes_used(&self) -> Vec<TransportMode> {
        mode::modes_used(&self.legs)
    }

    pub fn is_multi_modal(&self) -> bool {
        mode::is_multi_modal(&self.legs)
    }

    /// Returns live data, if any was applied.
    pub fn realtime(&self) -> Option<&ItineraryRealtime> {
        self.realtime.as_ref()
    }

    pub fn has_realtime(&self) -> bool {
        self.realtime.is_some()
    }

    /// Returns false only if live data showed the plan is no longer usable.
    pub fn is_realtime_valid(&self) -> bool {
        self.realtime.as_ref().is_none_or(|rt| rt.validity.is_valid())
    }

    pub fn invalidity_reason(&self) -> Option<&InvalidityReason> {
        self.realtime.as_ref().and_then(|rt| rt.validity.reason())
    }

    /// Returns a copy with all live data removed.
    pub fn scheduled(&self) -> Itinerary {
        Itinerary {
            legs: self.legs.iter().map(Leg::scheduled).collect(),
            realtime: None,
        }
    }

    /// Returns a copy with the given legs and live summary.
    ///
    /// The replacement legs must have the same scheduled shape; only their
    /// live data may differ.
    pub(crate) fn with_realtime(&self, legs: Vec<Leg>, realtime: ItineraryRealtime) -> Itinerary {
        debug_assert_eq!(legs.len(), self.legs.len());
        Itinerary {
            legs,
            realtime: Some(realtime),
        }
    }

    /// Multi-line text summary of the itinerary.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Journey: {} → {}",
                self.origin().name,
                self.destination().name
            ),
            format!("Departure: {}", self.departure()),
            format!("Arrival: {}", self.arrival()),
            format!("Duration: {}", format_duration(self.duration())),
            format!("Transfers: {}", self.transfer_count()),
            String::new(),
        ];

        let waits = self.transfer_wait_times();
        for (i, leg) in self.legs.iter().enumerate() {
            lines.push(format!("Leg {}:", i + 1));
            lines.push(format!("  {} → {}", leg.from().name, leg.to().name));
            lines.push(format!(
                "  Depart: {}  Arrive: {}",
                leg.departure(),
                leg.arrival()
            ));
            lines.push(format!("  Duration: {}", format_duration(leg.duration())));
            lines.push(format!("  Mode: {}", leg.mode_name()));
            if let Some(name) = leg.route_name() {
                lines.push(format!("  Route: {name}"));
            }
            lines.push(format!("  Stops: {}", leg.num_stops()));
            if let Some(wait) = waits.get(i) {
                lines.push(format!("  Transfer wait: {}m", wait / 60));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

//! Journey leg type.
//!
//! A `Leg` is one unbroken ride on a single trip, or one walk between two
//! stops. Scheduled fields are fixed at construction; live data is attached
//! separately by [`Leg::with_realtime`] and never replaces them.

use chrono::Duration;

use super::{ClockTime, DomainError, RouteId, ServiceTime, StopId, TransportMode, TripId};

/// A stop as it appears in a journey: identifier plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRef {
    pub id: StopId,
    pub name: String,
}

impl StopRef {
    pub fn new(id: StopId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The route a vehicle leg travels on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegRoute {
    pub id: RouteId,
    /// Display name, if the route has one.
    pub name: Option<String>,
    /// Numeric mode code (`route_type`).
    pub mode_code: u16,
}

/// Live data attached to a leg.
///
/// Delays are signed seconds, positive when late. A side with no live
/// record has a delay of zero and its actual time equals the scheduled time.
/// Cancelled legs carry no actual times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegRealtime {
    pub departure_delay_secs: i32,
    pub arrival_delay_secs: i32,
    pub actual_departure: Option<ClockTime>,
    pub actual_arrival: Option<ClockTime>,
    pub cancelled: bool,
    /// Boarding or alighting stop the vehicle will no longer call at.
    pub skipped_stop: Option<StopId>,
    /// Platform reported by the live feed, overriding the timetable.
    pub platform: Option<String>,
}

/// One leg of an itinerary.
///
/// # Invariants
///
/// - `arrival >= departure`
/// - `num_stops >= 2` (both ends are counted)
/// - walk legs use the synthetic walk trip id and have no route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    from: StopRef,
    to: StopRef,
    departure: ServiceTime,
    arrival: ServiceTime,
    trip_id: TripId,
    route: Option<LegRoute>,
    is_walk: bool,
    num_stops: usize,
    realtime: Option<LegRealtime>,
}

impl Leg {
    /// Construct a leg on a scheduled trip.
    ///
    /// `num_stops` counts every stop visited, including both ends.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `arrival < departure`
    /// - `num_stops < 2`
    /// - `trip_id` is the synthetic walk trip
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::{Leg, LegRoute, RouteId, ServiceTime, StopId, StopRef, TripId};
    ///
    /// let leg = Leg::vehicle(
    ///     StopRef::new(StopId::new("S1").unwrap(), "Flinders Street"),
    ///     StopRef::new(StopId::new("S3").unwrap(), "Richmond"),
    ///     ServiceTime::parse_hhmmss("08:00:00").unwrap(),
    ///     ServiceTime::parse_hhmmss("08:20:00").unwrap(),
    ///     TripId::new("T1").unwrap(),
    ///     Some(LegRoute {
    ///         id: RouteId::new("R1").unwrap(),
    ///         name: Some("Frankston".into()),
    ///         mode_code: 2,
    ///     }),
    ///     3,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(leg.mode_name(), "Regional Train");
    /// assert_eq!(leg.duration(), chrono::Duration::minutes(20));
    /// ```
    pub fn vehicle(
        from: StopRef,
        to: StopRef,
        departure: ServiceTime,
        arrival: ServiceTime,
        trip_id: TripId,
        route: Option<LegRoute>,
        num_stops: usize,
    ) -> Result<Self, DomainError> {
        if trip_id.is_walk() {
            return Err(DomainError::InvalidLeg(
                "vehicle leg cannot use the walk trip id",
            ));
        }
        Self::build(from, to, departure, arrival, trip_id, route, false, num_stops)
    }

    /// Construct a walking leg between two stops.
    pub fn walk(
        from: StopRef,
        to: StopRef,
        departure: ServiceTime,
        arrival: ServiceTime,
    ) -> Result<Self, DomainError> {
        Self::build(from, to, departure, arrival, TripId::walk(), None, true, 2)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        from: StopRef,
        to: StopRef,
        departure: ServiceTime,
        arrival: ServiceTime,
        trip_id: TripId,
        route: Option<LegRoute>,
        is_walk: bool,
        num_stops: usize,
    ) -> Result<Self, DomainError> {
        if arrival < departure {
            return Err(DomainError::InvalidLeg("arrival must not be before departure"));
        }
        if num_stops < 2 {
            return Err(DomainError::InvalidLeg("a leg spans at least two stops"));
        }
        Ok(Leg {
            from,
            to,
            departure,
            arrival,
            trip_id,
            route,
            is_walk,
            num_stops,
            realtime: None,
        })
    }

    /// Returns the boarding stop.
    pub fn from(&self) -> &StopRef {
        &self.from
    }

    /// Returns the alighting stop.
    pub fn to(&self) -> &StopRef {
        &self.to
    }

    pub fn from_stop(&self) -> &StopId {
        &self.from.id
    }

    pub fn to_stop(&self) -> &StopId {
        &self.to.id
    }

    /// Returns the scheduled departure time.
    pub fn departure(&self) -> ServiceTime {
        self.departure
    }

    /// Returns the scheduled arrival time.
    pub fn arrival(&self) -> ServiceTime {
        self.arrival
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    pub fn route(&self) -> Option<&LegRoute> {
        self.route.as_ref()
    }

    /// Returns the route display name, if any.
    pub fn route_name(&self) -> Option<&str> {
        self.route.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn mode_code(&self) -> Option<u16> {
        self.route.as_ref().map(|r| r.mode_code)
    }

    /// Returns true if this leg is a walk between stops.
    pub fn is_walk(&self) -> bool {
        self.is_walk
    }

    /// Returns the number of stops spanned, including both ends.
    pub fn num_stops(&self) -> usize {
        self.num_stops
    }

    pub fn mode(&self) -> TransportMode {
        TransportMode::classify(self.mode_code(), self.is_walk)
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode().name()
    }

    /// Returns the scheduled duration.
    pub fn duration(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }

    /// Returns live data, if any was applied.
    pub fn realtime(&self) -> Option<&LegRealtime> {
        self.realtime.as_ref()
    }

    pub fn has_realtime(&self) -> bool {
        self.realtime.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.realtime.as_ref().is_some_and(|rt| rt.cancelled)
    }

    pub fn departure_delay_secs(&self) -> i32 {
        self.realtime.as_ref().map_or(0, |rt| rt.departure_delay_secs)
    }

    pub fn arrival_delay_secs(&self) -> i32 {
        self.realtime.as_ref().map_or(0, |rt| rt.arrival_delay_secs)
    }

    /// Best known departure in unwrapped service seconds (scheduled plus delay).
    pub fn effective_departure_secs(&self) -> i64 {
        i64::from(self.departure.as_secs()) + i64::from(self.departure_delay_secs())
    }

    /// Best known arrival in unwrapped service seconds (scheduled plus delay).
    pub fn effective_arrival_secs(&self) -> i64 {
        i64::from(self.arrival.as_secs()) + i64::from(self.arrival_delay_secs())
    }

    /// Returns a copy of this leg carrying the given live data.
    ///
    /// Scheduled fields are unchanged.
    pub fn with_realtime(&self, realtime: LegRealtime) -> Leg {
        Leg {
            realtime: Some(realtime),
            ..self.clone()
        }
    }

    /// Returns a copy with any live data removed.
    pub fn scheduled(&self) -> Leg {
        Leg {
            realtime: None,
            ..self.clone()
        }
    }

    /// The stop this leg can no longer board or alight at, if live data
    /// says the vehicle skips it.
    pub fn skipped_stop(&self) -> Option<&StopRef> {
        let skipped = self.realtime.as_ref()?.skipped_stop.as_ref()?;
        [&self.from, &self.to].into_iter().find(|s| &s.id == skipped)
    }
}

//! Decoded live feed snapshot.
//!
//! A `LiveFeedSnapshot` is an immutable, trip-indexed view of one or more
//! GTFS-Realtime trip-update feeds. It is built once per fetch and shared
//! behind an `Arc` between concurrent overlay requests.

use std::collections::HashMap;

use crate::domain::{StopId, TripId};

/// Live delays reported for one stop of a trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopTimeDelay {
    /// Departure delay in seconds, positive when late.
    pub departure_delay_secs: i32,
    /// Arrival delay in seconds, positive when late.
    pub arrival_delay_secs: i32,
    /// Platform or assigned stop, when the feed overrides the timetable.
    pub platform: Option<String>,
    /// The vehicle will not stop here. Boarding or alighting is impossible.
    pub skipped: bool,
}

/// Live state of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripUpdate {
    pub trip_id: TripId,
    pub cancelled: bool,
    stops: HashMap<StopId, StopTimeDelay>,
}

impl TripUpdate {
    pub fn new(trip_id: TripId, cancelled: bool) -> Self {
        Self {
            trip_id,
            cancelled,
            stops: HashMap::new(),
        }
    }

    /// Record the delay at a stop. A later record for the same stop replaces
    /// the earlier one.
    pub fn with_stop(mut self, stop_id: StopId, delay: StopTimeDelay) -> Self {
        self.stops.insert(stop_id, delay);
        self
    }

    pub(crate) fn insert_stop(&mut self, stop_id: StopId, delay: StopTimeDelay) {
        self.stops.insert(stop_id, delay);
    }

    /// Live record for a stop, if the feed reported one.
    pub fn stop(&self, stop_id: &str) -> Option<&StopTimeDelay> {
        self.stops.get(stop_id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }
}

/// Trip-indexed live data from one or more feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveFeedSnapshot {
    trips: HashMap<TripId, TripUpdate>,
    /// POSIX seconds from the feed header, newest across merged feeds.
    timestamp: Option<u64>,
}

impl LiveFeedSnapshot {
    /// Build a snapshot from trip updates.
    ///
    /// If a trip appears more than once the last update wins.
    pub fn new(updates: impl IntoIterator<Item = TripUpdate>, timestamp: Option<u64>) -> Self {
        let trips = updates
            .into_iter()
            .map(|update| (update.trip_id.clone(), update))
            .collect();
        Self { trips, timestamp }
    }

    /// Look up the live state of a trip.
    pub fn trip(&self, trip_id: &str) -> Option<&TripUpdate> {
        self.trips.get(trip_id)
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn cancelled_count(&self) -> usize {
        self.trips.values().filter(|t| t.cancelled).count()
    }

    /// Combine snapshots from several partitions.
    ///
    /// Trip ids are unique across partitions in practice; if one is not,
    /// the later snapshot's update wins.
    pub fn merge<'a>(snapshots: impl IntoIterator<Item = &'a LiveFeedSnapshot>) -> Self {
        let mut merged = LiveFeedSnapshot::default();
        for snapshot in snapshots {
            merged
                .trips
                .extend(snapshot.trips.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged.timestamp = merged.timestamp.max(snapshot.timestamp);
        }
        merged
    }
}

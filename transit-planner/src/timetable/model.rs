//! Timetable snapshot records.
//!
//! A [`TimetableSnapshot`] is the immutable input to the graph compiler.
//! Every string has already been parsed into typed values; validation of
//! cross-references happens once, in [`TimetableSnapshot::new`].

use std::collections::{HashMap, HashSet};

use super::TimetableError;
use crate::domain::{RouteId, ServiceTime, StopId, TripId};

/// Minimum walk time used when a transfer record gives none.
pub const DEFAULT_TRANSFER_SECS: u32 = 120;

/// A stop or station.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub parent_station: Option<StopId>,
    pub platform_code: Option<String>,
}

/// A route: a named group of trips sharing a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    pub short_name: String,
    pub long_name: String,
    /// GTFS `route_type`.
    pub mode_code: u16,
}

impl Route {
    /// Returns the long name, falling back to the short name.
    ///
    /// `None` if both are empty.
    pub fn display_name(&self) -> Option<&str> {
        [self.long_name.as_str(), self.short_name.as_str()]
            .into_iter()
            .find(|name| !name.is_empty())
    }
}

/// One scheduled call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopVisit {
    pub stop_id: StopId,
    pub sequence: u32,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
}

/// A scheduled vehicle run with its calls in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub visits: Vec<StopVisit>,
}

/// A walk between two distinct stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from_stop: StopId,
    pub to_stop: StopId,
    pub min_duration_secs: u32,
}

/// The complete, validated timetable for one network.
///
/// # Invariants
///
/// - Stop, route and trip ids are unique
/// - Every trip references a known route, and every visit a known stop
/// - Visit sequence numbers strictly increase within each trip
/// - Transfers join two distinct known stops
#[derive(Debug, Clone)]
pub struct TimetableSnapshot {
    stops: Vec<Stop>,
    stop_index: HashMap<StopId, usize>,
    routes: HashMap<RouteId, Route>,
    trips: Vec<Trip>,
    transfers: Vec<Transfer>,
}

impl TimetableSnapshot {
    /// Validate and assemble a snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn new(
        stops: Vec<Stop>,
        routes: Vec<Route>,
        trips: Vec<Trip>,
        transfers: Vec<Transfer>,
    ) -> Result<Self, TimetableError> {
        let mut stop_index = HashMap::with_capacity(stops.len());
        for (idx, stop) in stops.iter().enumerate() {
            if stop_index.insert(stop.id.clone(), idx).is_some() {
                return Err(TimetableError::DuplicateId {
                    kind: "stop",
                    id: stop.id.to_string(),
                });
            }
        }

        let mut route_map = HashMap::with_capacity(routes.len());
        for route in routes {
            if route_map.contains_key(&route.id) {
                return Err(TimetableError::DuplicateId {
                    kind: "route",
                    id: route.id.to_string(),
                });
            }
            route_map.insert(route.id.clone(), route);
        }

        let mut trip_ids = HashSet::with_capacity(trips.len());
        for trip in &trips {
            if !trip_ids.insert(&trip.id) {
                return Err(TimetableError::DuplicateId {
                    kind: "trip",
                    id: trip.id.to_string(),
                });
            }
            if !route_map.contains_key(&trip.route_id) {
                return Err(TimetableError::UnknownReference {
                    kind: "route",
                    id: trip.route_id.to_string(),
                    referrer: format!("trip {}", trip.id),
                });
            }
            for visit in &trip.visits {
                if !stop_index.contains_key(&visit.stop_id) {
                    return Err(TimetableError::UnknownReference {
                        kind: "stop",
                        id: visit.stop_id.to_string(),
                        referrer: format!("trip {}", trip.id),
                    });
                }
            }
            for pair in trip.visits.windows(2) {
                if pair[1].sequence <= pair[0].sequence {
                    return Err(TimetableError::NonIncreasingSequence {
                        trip: trip.id.clone(),
                        sequence: pair[1].sequence,
                    });
                }
            }
        }

        for transfer in &transfers {
            if transfer.from_stop == transfer.to_stop {
                return Err(TimetableError::SelfTransfer(transfer.from_stop.clone()));
            }
            for stop in [&transfer.from_stop, &transfer.to_stop] {
                if !stop_index.contains_key(stop) {
                    return Err(TimetableError::UnknownReference {
                        kind: "stop",
                        id: stop.to_string(),
                        referrer: format!(
                            "transfer {} -> {}",
                            transfer.from_stop, transfer.to_stop
                        ),
                    });
                }
            }
        }

        Ok(Self {
            stops,
            stop_index,
            routes: route_map,
            trips,
            transfers,
        })
    }

    /// Look up a stop by id.
    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stop_index.get(id).map(|&idx| &self.stops[idx])
    }

    /// Look up a route by id.
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    /// All stops, in load order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built snapshots shared by tests across the crate.

    use super::*;

    pub fn stop(id: &str, name: &str) -> Stop {
        Stop {
            id: StopId::new(id).unwrap(),
            name: name.to_string(),
            lat: -37.8,
            lon: 144.9,
            parent_station: None,
            platform_code: None,
        }
    }

    pub fn route(id: &str, long_name: &str, mode_code: u16) -> Route {
        Route {
            id: RouteId::new(id).unwrap(),
            short_name: String::new(),
            long_name: long_name.to_string(),
            mode_code,
        }
    }

    /// Build a trip from `(stop, arrival, departure)` triples.
    pub fn trip(id: &str, route_id: &str, calls: &[(&str, &str, &str)]) -> Trip {
        Trip {
            id: TripId::new(id).unwrap(),
            route_id: RouteId::new(route_id).unwrap(),
            visits: calls
                .iter()
                .enumerate()
                .map(|(i, (stop, arr, dep))| StopVisit {
                    stop_id: StopId::new(*stop).unwrap(),
                    sequence: i as u32 + 1,
                    arrival: ServiceTime::parse_hhmmss(arr).unwrap(),
                    departure: ServiceTime::parse_hhmmss(dep).unwrap(),
                })
                .collect(),
        }
    }

    pub fn transfer(from: &str, to: &str, secs: u32) -> Transfer {
        Transfer {
            from_stop: StopId::new(from).unwrap(),
            to_stop: StopId::new(to).unwrap(),
            min_duration_secs: secs,
        }
    }

    /// S1 -> S2 -> S3 on trip T1 (route R1, regional rail).
    pub fn three_stop_line() -> TimetableSnapshot {
        TimetableSnapshot::new(
            vec![
                stop("S1", "Southern Cross"),
                stop("S2", "Footscray"),
                stop("S3", "Sunshine"),
            ],
            vec![route("R1", "Ballarat Line", 2)],
            vec![trip(
                "T1",
                "R1",
                &[
                    ("S1", "08:00:00", "08:00:00"),
                    ("S2", "08:10:00", "08:12:00"),
                    ("S3", "08:20:00", "08:20:00"),
                ],
            )],
            vec![],
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn display_name_prefers_long() {
        let mut r = route("R1", "Ballarat Line", 2);
        r.short_name = "BAL".into();
        assert_eq!(r.display_name(), Some("Ballarat Line"));
        r.long_name.clear();
        assert_eq!(r.display_name(), Some("BAL"));
        r.short_name.clear();
        assert_eq!(r.display_name(), None);
    }

    #[test]
    fn valid_snapshot() {
        let snapshot = three_stop_line();
        assert_eq!(snapshot.stop_count(), 3);
        assert_eq!(snapshot.route_count(), 1);
        assert_eq!(snapshot.trip_count(), 1);
        assert_eq!(snapshot.stop("S2").unwrap().name, "Footscray");
        assert!(snapshot.stop("S9").is_none());
        assert_eq!(snapshot.route("R1").unwrap().mode_code, 2);
    }

    #[test]
    fn duplicate_stop_rejected() {
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A"), stop("S1", "B")],
            vec![],
            vec![],
            vec![],
        );
        assert!(matches!(
            result,
            Err(TimetableError::DuplicateId { kind: "stop", .. })
        ));
    }

    #[test]
    fn unknown_route_rejected() {
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A"), stop("S2", "B")],
            vec![],
            vec![trip(
                "T1",
                "R1",
                &[("S1", "08:00:00", "08:00:00"), ("S2", "08:05:00", "08:05:00")],
            )],
            vec![],
        );
        assert!(matches!(
            result,
            Err(TimetableError::UnknownReference { kind: "route", .. })
        ));
    }

    #[test]
    fn unknown_stop_rejected() {
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A")],
            vec![route("R1", "Line", 1)],
            vec![trip(
                "T1",
                "R1",
                &[("S1", "08:00:00", "08:00:00"), ("S2", "08:05:00", "08:05:00")],
            )],
            vec![],
        );
        assert!(matches!(
            result,
            Err(TimetableError::UnknownReference { kind: "stop", .. })
        ));
    }

    #[test]
    fn non_increasing_sequence_rejected() {
        let mut t = trip(
            "T1",
            "R1",
            &[("S1", "08:00:00", "08:00:00"), ("S2", "08:05:00", "08:05:00")],
        );
        t.visits[1].sequence = 1;
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A"), stop("S2", "B")],
            vec![route("R1", "Line", 1)],
            vec![t],
            vec![],
        );
        assert!(matches!(
            result,
            Err(TimetableError::NonIncreasingSequence { sequence: 1, .. })
        ));
    }

    #[test]
    fn self_transfer_rejected() {
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A")],
            vec![],
            vec![],
            vec![transfer("S1", "S1", 60)],
        );
        assert!(matches!(result, Err(TimetableError::SelfTransfer(_))));
    }

    #[test]
    fn transfer_to_unknown_stop_rejected() {
        let result = TimetableSnapshot::new(
            vec![stop("S1", "A")],
            vec![],
            vec![],
            vec![transfer("S1", "S2", 60)],
        );
        assert!(matches!(
            result,
            Err(TimetableError::UnknownReference { kind: "stop", .. })
        ));
    }
}

//! Connections: the unit of travel the search scans.

use crate::domain::{RouteId, ServiceTime, TripId};

/// Dense index of a stop within a compiled graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIdx(pub(crate) usize);

impl StopIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Travel between two consecutive stop visits of one trip, or one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: StopIdx,
    pub to: StopIdx,
    pub trip_id: TripId,
    /// `None` for walks.
    pub route_id: Option<RouteId>,
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
    /// `None` for walks.
    pub mode_code: Option<u16>,
    pub is_walk: bool,
    /// Stop sequence of the departing visit; 0 for walks.
    pub sequence: u32,
}

impl Connection {
    /// Travel time in seconds.
    pub fn travel_secs(&self) -> u32 {
        self.arrival.as_secs() - self.departure.as_secs()
    }
}

/// A static walk edge between two distinct stops.
///
/// Walks have no timetable: they can start whenever the rider reaches
/// `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkTransfer {
    pub from: StopIdx,
    pub to: StopIdx,
    pub duration_secs: u32,
}

impl WalkTransfer {
    /// Materialise this walk as a connection starting at `departure`.
    ///
    /// Returns `None` if the arrival would overflow the time range.
    pub fn to_connection(&self, departure: ServiceTime) -> Option<Connection> {
        Some(Connection {
            from: self.from,
            to: self.to,
            trip_id: TripId::walk(),
            route_id: None,
            departure,
            arrival: departure.checked_add_secs(self.duration_secs)?,
            mode_code: None,
            is_walk: true,
            sequence: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_materialises_with_walk_trip() {
        let walk = WalkTransfer {
            from: StopIdx(0),
            to: StopIdx(1),
            duration_secs: 180,
        };
        let conn = walk
            .to_connection(ServiceTime::parse_hhmmss("08:10:00").unwrap())
            .unwrap();
        assert!(conn.is_walk);
        assert!(conn.trip_id.is_walk());
        assert_eq!(conn.route_id, None);
        assert_eq!(conn.mode_code, None);
        assert_eq!(conn.arrival.to_string(), "08:13:00");
        assert_eq!(conn.travel_secs(), 180);
    }

    #[test]
    fn walk_overflow_is_none() {
        let walk = WalkTransfer {
            from: StopIdx(0),
            to: StopIdx(1),
            duration_secs: u32::MAX,
        };
        assert!(walk.to_connection(ServiceTime::from_secs(10)).is_none());
    }
}

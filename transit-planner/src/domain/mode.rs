//! Transport mode classification.
//!
//! Routes carry a numeric mode code (`route_type` in GTFS). Walk transfers
//! have no route, and are always classified as walking.

use std::fmt;

use super::Leg;

/// A human-facing transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Tram,
    Metro,
    RegionalTrain,
    Bus,
    Ferry,
    Walking,
    Unknown,
}

impl TransportMode {
    /// Classify a mode code.
    ///
    /// A walk transfer is `Walking` whatever code it carries. Codes 700 and
    /// 900 are operator extensions aliasing bus and tram.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::TransportMode;
    ///
    /// assert_eq!(TransportMode::classify(Some(2), false), TransportMode::RegionalTrain);
    /// assert_eq!(TransportMode::classify(Some(2), true), TransportMode::Walking);
    /// assert_eq!(TransportMode::classify(Some(900), false), TransportMode::Tram);
    /// assert_eq!(TransportMode::classify(Some(42), false), TransportMode::Unknown);
    /// ```
    pub fn classify(mode_code: Option<u16>, is_walk: bool) -> Self {
        if is_walk {
            return TransportMode::Walking;
        }
        match mode_code {
            Some(0) | Some(900) => TransportMode::Tram,
            Some(1) => TransportMode::Metro,
            Some(2) => TransportMode::RegionalTrain,
            Some(3) | Some(700) => TransportMode::Bus,
            Some(4) => TransportMode::Ferry,
            _ => TransportMode::Unknown,
        }
    }

    /// Returns the display name.
    pub fn name(self) -> &'static str {
        match self {
            TransportMode::Tram => "Tram",
            TransportMode::Metro => "Metro",
            TransportMode::RegionalTrain => "Regional Train",
            TransportMode::Bus => "Bus",
            TransportMode::Ferry => "Ferry",
            TransportMode::Walking => "Walking",
            TransportMode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the display name for a mode code.
pub fn mode_name(mode_code: Option<u16>, is_walk: bool) -> &'static str {
    TransportMode::classify(mode_code, is_walk).name()
}

/// Distinct modes used by the legs, in first-seen order, excluding walking.
pub fn modes_used(legs: &[Leg]) -> Vec<TransportMode> {
    let mut modes = Vec::new();
    for leg in legs {
        let mode = leg.mode();
        if mode != TransportMode::Walking && !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

/// Returns true if the legs use more than one non-walking mode.
pub fn is_multi_modal(legs: &[Leg]) -> bool {
    modes_used(legs).len() > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LegRoute, RouteId, ServiceTime, StopId, StopRef, TripId};

    fn stop(id: &str) -> StopRef {
        StopRef::new(StopId::new(id).unwrap(), format!("Stop {id}"))
    }

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse_hhmmss(s).unwrap()
    }

    fn vehicle(from: &str, to: &str, code: u16) -> Leg {
        Leg::vehicle(
            stop(from),
            stop(to),
            t("08:00:00"),
            t("08:10:00"),
            TripId::new(format!("T-{from}-{to}")).unwrap(),
            Some(LegRoute {
                id: RouteId::new("R").unwrap(),
                name: Some("Route".into()),
                mode_code: code,
            }),
            2,
        )
        .unwrap()
    }

    fn walk(from: &str, to: &str) -> Leg {
        Leg::walk(stop(from), stop(to), t("08:10:00"), t("08:12:00")).unwrap()
    }

    #[test]
    fn classify_all_codes() {
        assert_eq!(mode_name(Some(0), false), "Tram");
        assert_eq!(mode_name(Some(1), false), "Metro");
        assert_eq!(mode_name(Some(2), false), "Regional Train");
        assert_eq!(mode_name(Some(3), false), "Bus");
        assert_eq!(mode_name(Some(4), false), "Ferry");
        assert_eq!(mode_name(Some(700), false), "Bus");
        assert_eq!(mode_name(Some(900), false), "Tram");
        assert_eq!(mode_name(Some(5), false), "Unknown");
        assert_eq!(mode_name(None, false), "Unknown");
    }

    #[test]
    fn walk_flag_overrides_code() {
        assert_eq!(mode_name(Some(2), true), "Walking");
        assert_eq!(mode_name(None, true), "Walking");
    }

    #[test]
    fn modes_used_skips_walking_and_dedups() {
        let legs = vec![
            vehicle("A", "B", 2),
            walk("B", "C"),
            vehicle("C", "D", 0),
            vehicle("D", "E", 900),
            vehicle("E", "F", 3),
        ];
        assert_eq!(
            modes_used(&legs),
            vec![
                TransportMode::RegionalTrain,
                TransportMode::Tram,
                TransportMode::Bus
            ]
        );
        assert!(is_multi_modal(&legs));
    }

    #[test]
    fn single_mode_with_walk_is_not_multi_modal() {
        let legs = vec![vehicle("A", "B", 1), walk("B", "C"), vehicle("C", "D", 1)];
        assert_eq!(modes_used(&legs), vec![TransportMode::Metro]);
        assert!(!is_multi_modal(&legs));
    }

    #[test]
    fn walk_only() {
        let legs = vec![walk("A", "B")];
        assert!(modes_used(&legs).is_empty());
        assert!(!is_multi_modal(&legs));
    }
}

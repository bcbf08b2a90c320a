//! Identifier types for timetable entities.
//!
//! GTFS identifiers are opaque strings chosen by the feed publisher. The only
//! validation is that they must be non-empty, but wrapping them keeps stop,
//! trip and route identifiers from being mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when an identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} identifier: must not be empty")]
pub struct InvalidId {
    kind: &'static str,
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier, rejecting empty strings.
            pub fn new(s: impl Into<String>) -> Result<Self, InvalidId> {
                let s = s.into();
                if s.is_empty() {
                    return Err(InvalidId { kind: $kind });
                }
                Ok(Self(s))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// A stop (or station) identifier from `stops.txt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::StopId;
    ///
    /// let id = StopId::new("19854").unwrap();
    /// assert_eq!(id.as_str(), "19854");
    /// assert!(StopId::new("").is_err());
    /// ```
    StopId,
    "stop"
);

string_id!(
    /// A trip identifier from `trips.txt`.
    TripId,
    "trip"
);

string_id!(
    /// A route identifier from `routes.txt`.
    RouteId,
    "route"
);

/// Trip id given to synthetic walking connections.
pub const WALK_TRIP_ID: &str = "WALK";

impl TripId {
    /// The synthetic trip id shared by all walking connections.
    pub fn walk() -> Self {
        Self(WALK_TRIP_ID.to_string())
    }

    /// Returns true if this is the synthetic walking trip id.
    pub fn is_walk(&self) -> bool {
        self.0 == WALK_TRIP_ID
    }
}

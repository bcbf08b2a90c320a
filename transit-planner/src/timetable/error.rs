//! Timetable loading and validation errors.

use std::path::PathBuf;

use crate::domain::{InvalidId, StopId, TimeError, TripId};

/// Errors raised while loading or validating a timetable snapshot.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// A required feed file is absent
    #[error("required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The feed file could not be read or parsed as CSV
    #[error("failed to read {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A row has a field that fails to parse
    #[error("{file} row {row}: invalid {field}: {reason}")]
    InvalidField {
        file: &'static str,
        row: u64,
        field: &'static str,
        reason: String,
    },

    /// Two records share an identifier
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A record references an identifier that doesn't exist
    #[error("{referrer} references unknown {kind} {id}")]
    UnknownReference {
        kind: &'static str,
        id: String,
        referrer: String,
    },

    /// Stop sequence numbers within a trip are not strictly increasing
    #[error("trip {trip} has non-increasing stop sequence at {sequence}")]
    NonIncreasingSequence { trip: TripId, sequence: u32 },

    /// A transfer starts and ends at the same stop
    #[error("transfer from {0} to itself")]
    SelfTransfer(StopId),
}

impl TimetableError {
    pub(crate) fn invalid_id(file: &'static str, row: u64, field: &'static str, e: InvalidId) -> Self {
        TimetableError::InvalidField {
            file,
            row,
            field,
            reason: e.to_string(),
        }
    }

    pub(crate) fn invalid_time(file: &'static str, row: u64, field: &'static str, e: TimeError) -> Self {
        TimetableError::InvalidField {
            file,
            row,
            field,
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TimetableError::MissingFile(PathBuf::from("/gtfs/stops.txt"));
        assert_eq!(err.to_string(), "required file not found: /gtfs/stops.txt");

        let err = TimetableError::DuplicateId {
            kind: "stop",
            id: "S1".into(),
        };
        assert_eq!(err.to_string(), "duplicate stop id: S1");

        let err = TimetableError::UnknownReference {
            kind: "route",
            id: "R9".into(),
            referrer: "trip T1".into(),
        };
        assert_eq!(err.to_string(), "trip T1 references unknown route R9");

        let err = TimetableError::NonIncreasingSequence {
            trip: TripId::new("T1").unwrap(),
            sequence: 3,
        };
        assert_eq!(
            err.to_string(),
            "trip T1 has non-increasing stop sequence at 3"
        );
    }
}

//! GTFS static feed loader.
//!
//! Reads an extracted GTFS directory into a [`TimetableSnapshot`]. Text is
//! parsed once here; nothing downstream sees raw strings. Calendars are not
//! read: every trip is treated as running on the query day.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{
    DEFAULT_TRANSFER_SECS, Route, Stop, StopVisit, TimetableError, TimetableSnapshot, Transfer,
    Trip,
};
use crate::domain::{RouteId, ServiceTime, StopId, TripId};

const STOPS: &str = "stops.txt";
const ROUTES: &str = "routes.txt";
const TRIPS: &str = "trips.txt";
const STOP_TIMES: &str = "stop_times.txt";
const TRANSFERS: &str = "transfers.txt";

/// GTFS transfer_type meaning no transfer is possible.
const TRANSFER_NOT_POSSIBLE: u8 = 3;

#[derive(Debug, Deserialize)]
struct StopRow {
    stop_id: String,
    stop_name: String,
    stop_lat: f64,
    stop_lon: f64,
    #[serde(default)]
    parent_station: Option<String>,
    #[serde(default)]
    platform_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteRow {
    route_id: String,
    #[serde(default)]
    route_short_name: String,
    #[serde(default)]
    route_long_name: String,
    route_type: u16,
}

#[derive(Debug, Deserialize)]
struct TripRow {
    route_id: String,
    trip_id: String,
}

#[derive(Debug, Deserialize)]
struct StopTimeRow {
    trip_id: String,
    #[serde(default)]
    arrival_time: String,
    #[serde(default)]
    departure_time: String,
    stop_id: String,
    stop_sequence: u32,
}

#[derive(Debug, Deserialize)]
struct TransferRow {
    from_stop_id: String,
    to_stop_id: String,
    #[serde(default)]
    transfer_type: Option<u8>,
    #[serde(default)]
    min_transfer_time: Option<u32>,
}

/// Load a GTFS feed from an extracted directory.
///
/// `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` are required;
/// `transfers.txt` is optional. Stop times are ordered by `stop_sequence`.
///
/// # Errors
///
/// Returns `Err` if a required file is missing, a row fails to parse, or the
/// assembled snapshot violates an invariant.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<TimetableSnapshot, TimetableError> {
    let dir = dir.as_ref();
    info!(dir = %dir.display(), "loading GTFS feed");

    let stops = read_rows::<StopRow>(dir, STOPS)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_stop(row, i as u64 + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let routes = read_rows::<RouteRow>(dir, ROUTES)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_route(row, i as u64 + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut trips = read_rows::<TripRow>(dir, TRIPS)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_trip(row, i as u64 + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut visits_by_trip: HashMap<TripId, Vec<StopVisit>> = HashMap::new();
    let mut stop_time_count = 0usize;
    for (i, row) in read_rows::<StopTimeRow>(dir, STOP_TIMES)?.into_iter().enumerate() {
        let (trip_id, visit) = convert_stop_time(row, i as u64 + 1)?;
        visits_by_trip.entry(trip_id).or_default().push(visit);
        stop_time_count += 1;
    }

    for trip in &mut trips {
        if let Some(mut visits) = visits_by_trip.remove(&trip.id) {
            visits.sort_by_key(|v| v.sequence);
            trip.visits = visits;
        }
    }
    if let Some(orphan) = visits_by_trip.keys().next() {
        return Err(TimetableError::UnknownReference {
            kind: "trip",
            id: orphan.to_string(),
            referrer: STOP_TIMES.to_string(),
        });
    }

    let transfers = if dir.join(TRANSFERS).is_file() {
        let mut transfers = Vec::new();
        for (i, row) in read_rows::<TransferRow>(dir, TRANSFERS)?.into_iter().enumerate() {
            if let Some(transfer) = convert_transfer(row, i as u64 + 1)? {
                transfers.push(transfer);
            }
        }
        transfers
    } else {
        debug!("no transfers.txt, skipping walk transfers");
        Vec::new()
    };

    let snapshot = TimetableSnapshot::new(stops, routes, trips, transfers)?;
    info!(
        stops = snapshot.stop_count(),
        routes = snapshot.route_count(),
        trips = snapshot.trip_count(),
        stop_times = stop_time_count,
        transfers = snapshot.transfers().len(),
        "loaded GTFS feed"
    );
    Ok(snapshot)
}

fn read_rows<T: DeserializeOwned>(dir: &Path, file: &'static str) -> Result<Vec<T>, TimetableError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(TimetableError::MissingFile(path));
    }

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|source| TimetableError::Csv { file, source })?;

    reader
        .into_deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TimetableError::Csv { file, source })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn convert_stop(row: StopRow, line: u64) -> Result<Stop, TimetableError> {
    let id = StopId::new(row.stop_id)
        .map_err(|e| TimetableError::invalid_id(STOPS, line, "stop_id", e))?;
    let parent_station = non_empty(row.parent_station)
        .map(StopId::new)
        .transpose()
        .map_err(|e| TimetableError::invalid_id(STOPS, line, "parent_station", e))?;

    Ok(Stop {
        id,
        name: row.stop_name,
        lat: row.stop_lat,
        lon: row.stop_lon,
        parent_station,
        platform_code: non_empty(row.platform_code),
    })
}

fn convert_route(row: RouteRow, line: u64) -> Result<Route, TimetableError> {
    Ok(Route {
        id: RouteId::new(row.route_id)
            .map_err(|e| TimetableError::invalid_id(ROUTES, line, "route_id", e))?,
        short_name: row.route_short_name,
        long_name: row.route_long_name,
        mode_code: row.route_type,
    })
}

fn convert_trip(row: TripRow, line: u64) -> Result<Trip, TimetableError> {
    Ok(Trip {
        id: TripId::new(row.trip_id)
            .map_err(|e| TimetableError::invalid_id(TRIPS, line, "trip_id", e))?,
        route_id: RouteId::new(row.route_id)
            .map_err(|e| TimetableError::invalid_id(TRIPS, line, "route_id", e))?,
        visits: Vec::new(),
    })
}

fn convert_stop_time(row: StopTimeRow, line: u64) -> Result<(TripId, StopVisit), TimetableError> {
    let trip_id = TripId::new(row.trip_id)
        .map_err(|e| TimetableError::invalid_id(STOP_TIMES, line, "trip_id", e))?;
    let stop_id = StopId::new(row.stop_id)
        .map_err(|e| TimetableError::invalid_id(STOP_TIMES, line, "stop_id", e))?;

    // A call with only one of the two times uses it for both.
    let (arrival, departure) = match (row.arrival_time.is_empty(), row.departure_time.is_empty()) {
        (false, false) => (row.arrival_time, row.departure_time),
        (false, true) => (row.arrival_time.clone(), row.arrival_time),
        (true, false) => (row.departure_time.clone(), row.departure_time),
        (true, true) => {
            return Err(TimetableError::InvalidField {
                file: STOP_TIMES,
                row: line,
                field: "arrival_time",
                reason: "arrival and departure are both empty".into(),
            });
        }
    };

    let arrival = ServiceTime::parse_hhmmss(&arrival)
        .map_err(|e| TimetableError::invalid_time(STOP_TIMES, line, "arrival_time", e))?;
    let departure = ServiceTime::parse_hhmmss(&departure)
        .map_err(|e| TimetableError::invalid_time(STOP_TIMES, line, "departure_time", e))?;

    Ok((
        trip_id,
        StopVisit {
            stop_id,
            sequence: row.stop_sequence,
            arrival,
            departure,
        },
    ))
}

/// Returns `None` for rows that don't describe a usable walk.
fn convert_transfer(row: TransferRow, line: u64) -> Result<Option<Transfer>, TimetableError> {
    if row.from_stop_id == row.to_stop_id {
        return Ok(None);
    }
    if row.transfer_type == Some(TRANSFER_NOT_POSSIBLE) {
        return Ok(None);
    }
    Ok(Some(Transfer {
        from_stop: StopId::new(row.from_stop_id)
            .map_err(|e| TimetableError::invalid_id(TRANSFERS, line, "from_stop_id", e))?,
        to_stop: StopId::new(row.to_stop_id)
            .map_err(|e| TimetableError::invalid_id(TRANSFERS, line, "to_stop_id", e))?,
        min_duration_secs: row.min_transfer_time.unwrap_or(DEFAULT_TRANSFER_SECS),
    }))
}

//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Itinerary, Leg, LegRealtime, StopRef, format_delay, format_duration};
use crate::graph::GraphStats;
use crate::stops::StopMatch;
use crate::timetable::TimetableSnapshot;

/// Query for stop name search.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Free text typed by the user
    pub q: String,

    /// Maximum results (default 10, capped at 50)
    pub limit: Option<usize>,
}

/// A stop in search results.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StopResult {
    pub stop_id: String,
    pub name: String,
    /// Match score, 100 for an exact match
    pub score: u8,
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopResult>,
}

/// Network size and shape.
#[derive(Debug, Serialize)]
pub struct NetworkStatsResponse {
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub connections: usize,
    /// Distinct directed stop pairs with at least one connection
    pub edges: usize,
    pub walk_transfers: usize,
    pub average_degree: f64,
}

/// Request to plan a journey.
#[derive(Debug, Deserialize)]
pub struct PlanJourneyRequest {
    /// Origin stop id or name
    pub origin: String,

    /// Destination stop id or name
    pub destination: String,

    /// Earliest departure, HH:MM:SS (hours may exceed 23)
    pub time: String,

    /// Apply live delays and cancellations
    #[serde(default)]
    pub realtime: bool,

    /// Live feed partitions to use; the server default if empty
    #[serde(default)]
    pub partitions: Vec<String>,
}

/// A resolved stop.
#[derive(Debug, Serialize)]
pub struct StopInfo {
    pub stop_id: String,
    pub name: String,
}

/// Live data for one leg.
#[derive(Debug, Serialize)]
pub struct LegRealtimeResult {
    pub departure_delay_secs: i32,
    pub arrival_delay_secs: i32,
    /// e.g. "3 min delay"
    pub delay_text: String,
    pub actual_departure: Option<String>,
    pub actual_arrival: Option<String>,
    pub cancelled: bool,
    /// Stop id the vehicle no longer calls at
    pub skipped_stop: Option<String>,
    pub platform: Option<String>,
}

/// One leg of an itinerary.
#[derive(Debug, Serialize)]
pub struct LegResult {
    pub from: StopInfo,
    pub to: StopInfo,
    /// Scheduled departure, HH:MM:SS
    pub departure: String,
    /// Scheduled arrival, HH:MM:SS
    pub arrival: String,
    pub duration: String,
    pub mode: &'static str,
    pub route: Option<String>,
    pub trip_id: String,
    pub num_stops: usize,
    pub is_walk: bool,
    pub realtime: Option<LegRealtimeResult>,
}

/// An itinerary option.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    pub origin: StopInfo,
    pub destination: StopInfo,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub duration_mins: i64,
    pub transfers: usize,
    pub modes: Vec<&'static str>,
    pub multi_modal: bool,
    pub legs: Vec<LegResult>,
    pub has_realtime: bool,
    /// False only when live data showed the plan no longer works
    pub realtime_valid: bool,
    pub invalidity_reason: Option<String>,
    pub total_delay_secs: Option<i64>,
    pub actual_departure: Option<String>,
    pub actual_arrival: Option<String>,
    /// Plain text rendering of the itinerary
    pub summary: String,
}

/// Response for a data reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Stops in the freshly loaded network
    pub stops: usize,
    pub live_feed_refreshed: bool,
}

/// Response for journey planning.
#[derive(Debug, Serialize)]
pub struct PlanJourneyResponse {
    pub origin: StopInfo,
    pub destination: StopInfo,
    /// Found itineraries, best first
    pub itineraries: Vec<ItineraryResult>,
    /// Whether live data could be requested at all
    pub realtime_available: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl From<StopMatch> for StopResult {
    fn from(m: StopMatch) -> Self {
        Self {
            stop_id: m.stop_id.into_inner(),
            name: m.name,
            score: m.score,
        }
    }
}

impl From<&StopRef> for StopInfo {
    fn from(stop: &StopRef) -> Self {
        Self {
            stop_id: stop.id.to_string(),
            name: stop.name.clone(),
        }
    }
}

impl NetworkStatsResponse {
    pub fn new(stats: &GraphStats, snapshot: &TimetableSnapshot) -> Self {
        Self {
            stops: stats.stop_count,
            routes: snapshot.route_count(),
            trips: snapshot.trip_count(),
            connections: stats.connection_count,
            edges: stats.edge_count,
            walk_transfers: stats.walk_transfer_count,
            average_degree: stats.average_degree,
        }
    }
}

impl LegRealtimeResult {
    fn from_realtime(rt: &LegRealtime) -> Self {
        let delay_text = if rt.cancelled {
            "Cancelled".to_string()
        } else {
            format_delay(i64::from(rt.departure_delay_secs))
        };
        Self {
            departure_delay_secs: rt.departure_delay_secs,
            arrival_delay_secs: rt.arrival_delay_secs,
            delay_text,
            actual_departure: rt.actual_departure.map(|t| t.to_string()),
            actual_arrival: rt.actual_arrival.map(|t| t.to_string()),
            cancelled: rt.cancelled,
            skipped_stop: rt.skipped_stop.as_ref().map(|id| id.to_string()),
            platform: rt.platform.clone(),
        }
    }
}

impl LegResult {
    /// Create from a domain Leg.
    pub fn from_leg(leg: &Leg) -> Self {
        Self {
            from: leg.from().into(),
            to: leg.to().into(),
            departure: leg.departure().to_string(),
            arrival: leg.arrival().to_string(),
            duration: format_duration(leg.duration()),
            mode: leg.mode_name(),
            route: leg.route_name().map(str::to_string),
            trip_id: leg.trip_id().to_string(),
            num_stops: leg.num_stops(),
            is_walk: leg.is_walk(),
            realtime: leg.realtime().map(LegRealtimeResult::from_realtime),
        }
    }
}

impl ItineraryResult {
    /// Create from a domain Itinerary.
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        let realtime = itinerary.realtime();
        Self {
            origin: itinerary.origin().into(),
            destination: itinerary.destination().into(),
            departure: itinerary.departure().to_string(),
            arrival: itinerary.arrival().to_string(),
            duration: format_duration(itinerary.duration()),
            duration_mins: itinerary.duration().num_minutes(),
            transfers: itinerary.transfer_count(),
            modes: itinerary.modes_used().iter().map(|m| m.name()).collect(),
            multi_modal: itinerary.is_multi_modal(),
            legs: itinerary.legs().iter().map(LegResult::from_leg).collect(),
            has_realtime: itinerary.has_realtime(),
            realtime_valid: itinerary.is_realtime_valid(),
            invalidity_reason: itinerary.invalidity_reason().map(|r| r.to_string()),
            total_delay_secs: realtime.map(|rt| rt.total_delay_secs),
            actual_departure: realtime
                .and_then(|rt| rt.actual_departure)
                .map(|t| t.to_string()),
            actual_arrival: realtime
                .and_then(|rt| rt.actual_arrival)
                .map(|t| t.to_string()),
            summary: itinerary.summary(),
        }
    }
}

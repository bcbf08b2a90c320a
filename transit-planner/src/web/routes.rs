//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::domain::{Itinerary, ServiceTime, StopId};
use crate::network::Network;
use crate::planner::{Planner, SearchError};
use crate::realtime::RealtimeOverlay;

use super::dto::*;
use super::state::{AppState, LiveFeed};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/search", get(search_stops))
        .route("/network/stats", get(network_stats))
        .route("/journey/plan", post(plan_journey))
        .route("/admin/reload", post(reload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// Search stops by name.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Json<StopSearchResponse> {
    let limit = req.limit.unwrap_or(10).min(50);
    let network = state.network.current().await;

    let mut stops: Vec<StopResult> = Vec::new();
    // A query that is itself a stop id comes first.
    if let Some(stop) = network.graph().stop(req.q.trim()) {
        stops.push(StopResult {
            stop_id: stop.id.to_string(),
            name: stop.name.clone(),
            score: 100,
        });
    }
    for m in network.names().search(&req.q, limit) {
        if stops.len() >= limit {
            break;
        }
        if stops.iter().all(|s| s.stop_id != m.stop_id.as_str()) {
            stops.push(m.into());
        }
    }

    Json(StopSearchResponse { stops })
}

/// Size and shape of the loaded network.
async fn network_stats(State(state): State<AppState>) -> Json<NetworkStatsResponse> {
    let network = state.network.current().await;
    let graph = network.graph();
    Json(NetworkStatsResponse::new(&graph.stats(), graph.snapshot()))
}

/// Reload the timetable, and refresh the live feed backend.
///
/// A failed timetable load leaves the current network in service.
async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let Some(gtfs_dir) = state.gtfs_dir.as_deref() else {
        return Err(AppError::BadRequest {
            message: "no GTFS directory configured".to_string(),
        });
    };

    let stops = state
        .network
        .reload(gtfs_dir)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("reload failed: {e}"),
        })?;

    let live_feed_refreshed = match &state.realtime {
        Some(overlay) => overlay
            .source()
            .refresh(state.feed_dir.as_deref())
            .await
            .map_err(|e| AppError::Internal {
                message: format!("live feed reload failed: {e}"),
            })?,
        None => false,
    };

    info!(stops, live_feed_refreshed, "data reloaded");
    Ok(Json(ReloadResponse {
        stops,
        live_feed_refreshed,
    }))
}

/// Plan a journey, optionally checking it against live data.
async fn plan_journey(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlanJourneyResponse>, AppError> {
    // Parse JSON manually so a malformed body gets our error shape.
    let req: PlanJourneyRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(body = %String::from_utf8_lossy(&body), "unparseable plan request");
        AppError::BadRequest {
            message: format!("invalid JSON: {e}"),
        }
    })?;

    let depart_at = ServiceTime::parse_hhmmss(&req.time).map_err(|e| AppError::BadRequest {
        message: format!("invalid time {:?}: {e}", req.time),
    })?;

    let network = state.network.current().await;
    let origin = resolve_stop(&network, &req.origin, "origin")?;
    let destination = resolve_stop(&network, &req.destination, "destination")?;

    let planner = Planner::new(network.graph(), &state.config);
    let mut itineraries = planner.find_multiple(&origin, &destination, depart_at)?;
    info!(
        origin = %origin,
        destination = %destination,
        depart_at = %depart_at,
        found = itineraries.len(),
        "planned journey"
    );

    let realtime_available = state.realtime.is_some();
    if req.realtime {
        match &state.realtime {
            Some(overlay) => {
                let partitions = if req.partitions.is_empty() {
                    vec![state.default_partition.to_string()]
                } else {
                    req.partitions.clone()
                };
                let mut updated = Vec::with_capacity(itineraries.len());
                for itinerary in &itineraries {
                    updated.push(apply_live(overlay, itinerary, &partitions).await);
                }
                itineraries = updated;
            }
            None => warn!("realtime requested but no live feed is configured"),
        }
    }

    let stop_info = |id: &StopId| {
        let name = network
            .graph()
            .stop(id.as_str())
            .map(|s| s.name.clone())
            .unwrap_or_default();
        StopInfo {
            stop_id: id.to_string(),
            name,
        }
    };

    Ok(Json(PlanJourneyResponse {
        origin: stop_info(&origin),
        destination: stop_info(&destination),
        itineraries: itineraries
            .iter()
            .map(ItineraryResult::from_itinerary)
            .collect(),
        realtime_available,
    }))
}

async fn apply_live(
    overlay: &RealtimeOverlay<LiveFeed>,
    itinerary: &Itinerary,
    partitions: &[String],
) -> Itinerary {
    match partitions {
        [single] => overlay.apply_live(itinerary, single).await,
        many => overlay.apply_live_merged(itinerary, many).await,
    }
}

/// Resolve what the user typed to a stop id: an exact stop id first, then
/// a stop name.
fn resolve_stop(network: &Network, input: &str, role: &str) -> Result<StopId, AppError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::BadRequest {
            message: format!("{role} must not be empty"),
        });
    }
    if let Some(stop) = network.graph().stop(input) {
        return Ok(stop.id.clone());
    }
    network
        .names()
        .resolve(input)
        .map(|m| m.stop_id)
        .ok_or_else(|| AppError::NotFound {
            message: format!("{role} stop {input} not found"),
        })
}

/// Error type for handlers.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::OriginNotFound(_) | SearchError::DestinationNotFound(_) => {
                AppError::NotFound {
                    message: e.to_string(),
                }
            }
            SearchError::Integrity(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::network::NetworkHandle;
    use crate::planner::SearchConfig;
    use crate::domain::TripId;
    use crate::realtime::{
        LiveFeedSnapshot, OverlayConfig, StaticFeedSource, StopTimeDelay, TripUpdate,
    };
    use crate::timetable::fixtures::three_stop_line;

    fn state(realtime: Option<RealtimeOverlay<LiveFeed>>) -> AppState {
        let network = NetworkHandle::new(Network::build(three_stop_line()).unwrap());
        AppState::new(network, SearchConfig::default(), realtime, "metro")
    }

    fn recorded(feed: LiveFeedSnapshot) -> RealtimeOverlay<LiveFeed> {
        let source = StaticFeedSource::from_snapshots([("metro".to_string(), feed)]);
        RealtimeOverlay::new(
            LiveFeed::Recorded(source),
            OverlayConfig {
                fetch_timeout: Duration::from_secs(1),
                ..OverlayConfig::default()
            },
        )
    }

    fn request(origin: &str, destination: &str, time: &str, realtime: bool) -> Bytes {
        request_with(serde_json::json!({
            "origin": origin,
            "destination": destination,
            "time": time,
            "realtime": realtime,
        }))
    }

    fn request_with(body: serde_json::Value) -> Bytes {
        Bytes::from(body.to_string())
    }

    #[tokio::test]
    async fn health_ok() {
        assert_eq!(health().await, "OK");
    }

    #[tokio::test]
    async fn plan_by_stop_id() {
        let Json(resp) = plan_journey(State(state(None)), request("S1", "S3", "07:30:00", false))
            .await
            .unwrap();

        assert_eq!(resp.itineraries.len(), 1);
        let itinerary = &resp.itineraries[0];
        assert_eq!(itinerary.departure, "08:00:00");
        assert_eq!(itinerary.arrival, "08:20:00");
        assert_eq!(itinerary.transfers, 0);
        assert_eq!(itinerary.legs[0].num_stops, 3);
        assert_eq!(resp.destination.name, "Sunshine");
        assert!(!resp.realtime_available);
    }

    #[tokio::test]
    async fn plan_by_name() {
        let Json(resp) = plan_journey(
            State(state(None)),
            request("southern cross", "Sunshin", "07:30:00", false),
        )
        .await
        .unwrap();
        assert_eq!(resp.origin.stop_id, "S1");
        assert_eq!(resp.destination.stop_id, "S3");
        assert_eq!(resp.itineraries.len(), 1);
    }

    #[tokio::test]
    async fn no_route_is_empty_not_error() {
        let Json(resp) = plan_journey(State(state(None)), request("S1", "S3", "08:30:00", false))
            .await
            .unwrap();
        assert!(resp.itineraries.is_empty());
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let err = plan_journey(State(state(None)), request("S1", "Geelong", "08:00:00", false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref message } if message.contains("Geelong")));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let err = plan_journey(State(state(None)), Bytes::from_static(b"{\"origin\": 1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { ref message } if message.starts_with("invalid JSON")));
    }

    #[tokio::test]
    async fn bad_time_is_bad_request() {
        let err = plan_journey(State(state(None)), request("S1", "S3", "8am", false))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn realtime_delay_is_reported() {
        let feed = LiveFeedSnapshot::new(
            [TripUpdate::new(TripId::new("T1").unwrap(), false).with_stop(
                StopId::new("S3").unwrap(),
                StopTimeDelay {
                    arrival_delay_secs: 300,
                    departure_delay_secs: 300,
                    ..Default::default()
                },
            )],
            None,
        );
        let Json(resp) = plan_journey(
            State(state(Some(recorded(feed)))),
            request("S1", "S3", "07:30:00", true),
        )
        .await
        .unwrap();

        let itinerary = &resp.itineraries[0];
        assert!(resp.realtime_available);
        assert!(itinerary.has_realtime);
        assert!(itinerary.realtime_valid);
        assert_eq!(itinerary.actual_arrival.as_deref(), Some("08:25:00"));
        // Scheduled times are untouched.
        assert_eq!(itinerary.arrival, "08:20:00");
    }

    #[tokio::test]
    async fn missing_partition_degrades_to_schedule() {
        let req = request_with(serde_json::json!({
            "origin": "S1",
            "destination": "S3",
            "time": "07:30:00",
            "realtime": true,
            "partitions": ["vline"],
        }));
        let Json(resp) = plan_journey(
            State(state(Some(recorded(LiveFeedSnapshot::default())))),
            req,
        )
        .await
        .unwrap();

        assert_eq!(resp.itineraries.len(), 1);
        assert!(!resp.itineraries[0].has_realtime);
        assert!(resp.itineraries[0].realtime_valid);
    }

    #[tokio::test]
    async fn stop_search() {
        let Json(resp) = search_stops(
            State(state(None)),
            Query(StopSearchRequest {
                q: "footscray".into(),
                limit: None,
            }),
        )
        .await;
        assert_eq!(resp.stops[0].stop_id, "S2");
        assert_eq!(resp.stops[0].score, 100);

        let Json(resp) = search_stops(
            State(state(None)),
            Query(StopSearchRequest {
                q: "S3".into(),
                limit: Some(1),
            }),
        )
        .await;
        assert_eq!(resp.stops.len(), 1);
        assert_eq!(resp.stops[0].name, "Sunshine");
    }

    fn write_gtfs(dir: &std::path::Path) {
        let files = [
            (
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon\n\
                 S1,Southern Cross,-37.818,144.952\n\
                 S2,Footscray,-37.801,144.903\n\
                 S3,Sunshine,-37.788,144.833\n\
                 S4,Tottenham,-37.799,144.863\n",
            ),
            ("routes.txt", "route_id,route_long_name,route_type\nR1,Sunbury,2\n"),
            ("trips.txt", "route_id,service_id,trip_id\nR1,WD,T1\n"),
            (
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,08:00:00,S1,1\n\
                 T1,08:10:00,08:10:00,S4,2\n",
            ),
        ];
        for (name, contents) in files {
            std::fs::write(dir.join(name), contents).unwrap();
        }
    }

    #[tokio::test]
    async fn reload_swaps_network_and_feeds() {
        let gtfs = tempfile::tempdir().unwrap();
        write_gtfs(gtfs.path());
        let feeds = tempfile::tempdir().unwrap();
        let empty_feed = gtfs_realtime::FeedMessage {
            header: gtfs_realtime::FeedHeader {
                gtfs_realtime_version: "2.0".into(),
                ..Default::default()
            },
            entity: vec![],
        };
        std::fs::write(
            feeds.path().join("metro.pb"),
            prost::Message::encode_to_vec(&empty_feed),
        )
        .unwrap();

        let state = state(Some(recorded(LiveFeedSnapshot::default())))
            .with_data_dirs(gtfs.path(), Some(feeds.path()));
        let Json(resp) = reload(State(state.clone())).await.unwrap();
        assert_eq!(resp.stops, 4);
        assert!(resp.live_feed_refreshed);

        let Json(stats) = network_stats(State(state)).await;
        assert_eq!(stats.stops, 4);
        assert_eq!(stats.connections, 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_network() {
        let empty = tempfile::tempdir().unwrap();
        let state = state(None).with_data_dirs(empty.path(), None);

        let err = reload(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
        let Json(stats) = network_stats(State(state)).await;
        assert_eq!(stats.stops, 3);
    }

    #[tokio::test]
    async fn reload_without_directory_is_bad_request() {
        let err = reload(State(state(None))).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats() {
        let Json(resp) = network_stats(State(state(None))).await;
        assert_eq!(resp.stops, 3);
        assert_eq!(resp.routes, 1);
        assert_eq!(resp.trips, 1);
        assert_eq!(resp.connections, 2);
        assert_eq!(resp.edges, 2);
    }
}

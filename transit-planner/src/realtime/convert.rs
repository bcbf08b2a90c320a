//! Conversion from GTFS-Realtime wire messages to a `LiveFeedSnapshot`.

use gtfs_realtime::FeedMessage;
use gtfs_realtime::trip_descriptor::ScheduleRelationship as TripRelationship;
use gtfs_realtime::trip_update::stop_time_update::ScheduleRelationship as StopRelationship;
use gtfs_realtime::trip_update::{StopTimeEvent, StopTimeUpdate};
use tracing::debug;

use crate::domain::{StopId, TripId};

use super::feed::{LiveFeedSnapshot, StopTimeDelay, TripUpdate};

const TRIP_CANCELED: i32 = TripRelationship::Canceled as i32;
const STOP_SKIPPED: i32 = StopRelationship::Skipped as i32;

/// Index a decoded feed by trip id.
///
/// Entities that are deleted, carry no trip update, or have no trip id are
/// dropped. Stop updates without a stop id are dropped. A stop event with no
/// delay counts as on time.
pub fn convert_feed(message: &FeedMessage) -> LiveFeedSnapshot {
    let updates: Vec<TripUpdate> = message
        .entity
        .iter()
        .filter(|entity| !entity.is_deleted.unwrap_or(false))
        .filter_map(|entity| entity.trip_update.as_ref())
        .filter_map(convert_trip_update)
        .collect();

    debug!(
        entities = message.entity.len(),
        trips = updates.len(),
        "converted live feed"
    );

    LiveFeedSnapshot::new(updates, message.header.timestamp)
}

fn convert_trip_update(update: &gtfs_realtime::TripUpdate) -> Option<TripUpdate> {
    let trip_id = update
        .trip
        .trip_id
        .as_deref()
        .and_then(|id| TripId::new(id).ok())?;
    let cancelled = update.trip.schedule_relationship == Some(TRIP_CANCELED);

    let mut converted = TripUpdate::new(trip_id, cancelled);
    for stu in &update.stop_time_update {
        let Some(stop_id) = stu.stop_id.as_deref().and_then(|id| StopId::new(id).ok()) else {
            continue;
        };
        converted.insert_stop(stop_id, convert_stop_time(stu));
    }
    Some(converted)
}

fn convert_stop_time(stu: &StopTimeUpdate) -> StopTimeDelay {
    let delay = |event: &Option<StopTimeEvent>| {
        event.as_ref().and_then(|e| e.delay).unwrap_or(0)
    };

    StopTimeDelay {
        departure_delay_secs: delay(&stu.departure),
        arrival_delay_secs: delay(&stu.arrival),
        platform: stu
            .stop_time_properties
            .as_ref()
            .and_then(|p| p.assigned_stop_id.clone())
            .filter(|p| !p.is_empty()),
        skipped: stu.schedule_relationship == Some(STOP_SKIPPED),
    }
}


#[cfg(test)]
mod tests {
    use gtfs_realtime::trip_update::stop_time_update::StopTimeProperties;
    use prost::Message;

    use super::fixtures::*;
    use super::*;

    #[test]
    fn converts_delays_by_stop() {
        let msg = message(vec![trip_entity(
            "T1",
            false,
            vec![stop_update("S1", 0, 60), stop_update("S2", 240, 300)],
        )]);
        let snapshot = convert_feed(&msg);

        let trip = snapshot.trip("T1").unwrap();
        assert!(!trip.cancelled);
        assert_eq!(trip.stop("S1").unwrap().departure_delay_secs, 60);
        assert_eq!(trip.stop("S2").unwrap().arrival_delay_secs, 240);
        assert_eq!(snapshot.timestamp(), Some(1_700_000_000));
    }

    #[test]
    fn cancelled_trip() {
        let snapshot = convert_feed(&message(vec![trip_entity("T9", true, vec![])]));
        assert!(snapshot.trip("T9").unwrap().cancelled);
    }

    #[test]
    fn missing_delay_is_on_time() {
        let mut update = stop_update("S1", 0, 0);
        update.arrival = None;
        update.departure = Some(StopTimeEvent {
            time: Some(1_700_000_100),
            ..Default::default()
        });
        let snapshot = convert_feed(&message(vec![trip_entity("T1", false, vec![update])]));

        let stop = snapshot.trip("T1").unwrap().stop("S1").unwrap();
        assert_eq!(stop.arrival_delay_secs, 0);
        assert_eq!(stop.departure_delay_secs, 0);
    }

    #[test]
    fn drops_unusable_entities() {
        let mut deleted = trip_entity("T1", false, vec![]);
        deleted.is_deleted = Some(true);

        let mut no_trip_id = trip_entity("T2", false, vec![]);
        if let Some(update) = no_trip_id.trip_update.as_mut() {
            update.trip.trip_id = None;
        }

        let no_update = gtfs_realtime::FeedEntity {
            id: "alert".into(),
            ..Default::default()
        };

        let mut no_stop_id = stop_update("S1", 0, 0);
        no_stop_id.stop_id = None;
        let kept = trip_entity("T3", false, vec![no_stop_id]);

        let snapshot = convert_feed(&message(vec![deleted, no_trip_id, no_update, kept]));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.trip("T3").unwrap().stop_count(), 0);
    }

    #[test]
    fn platform_and_skip_flags() {
        let mut update = stop_update("S2", 0, 0);
        update.schedule_relationship = Some(STOP_SKIPPED);
        update.stop_time_properties = Some(StopTimeProperties {
            assigned_stop_id: Some("S2-P3".into()),
            ..Default::default()
        });
        let snapshot = convert_feed(&message(vec![trip_entity("T1", false, vec![update])]));

        let stop = snapshot.trip("T1").unwrap().stop("S2").unwrap();
        assert!(stop.skipped);
        assert_eq!(stop.platform.as_deref(), Some("S2-P3"));
    }

    #[test]
    fn decodes_from_wire_bytes() {
        let msg = message(vec![trip_entity("T1", false, vec![stop_update("S1", 30, 30)])]);
        let bytes = msg.encode_to_vec();

        let decoded = FeedMessage::decode(bytes.as_slice()).unwrap();
        let snapshot = convert_feed(&decoded);
        assert_eq!(snapshot.trip("T1").unwrap().stop("S1").unwrap().arrival_delay_secs, 30);
    }
}

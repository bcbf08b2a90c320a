//! Realtime overlay: annotate a scheduled itinerary with live data.
//!
//! [`apply`] is a pure transform from (itinerary, snapshot) to a new
//! itinerary. Scheduled departure and arrival fields are never touched;
//! live delays, actual times, cancellations and platform overrides are
//! attached alongside them.
//!
//! [`RealtimeOverlay`] wraps a [`LiveFeedSource`] and bounds each fetch with
//! a timeout. If the fetch fails the itinerary comes back exactly as it went
//! in, so an outage never reads as "verified on schedule".

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{
    InvalidityReason, Itinerary, ItineraryRealtime, Leg, LegRealtime, Validity,
};

use super::error::FeedError;
use super::feed::LiveFeedSnapshot;
use super::source::LiveFeedSource;

/// Default minimum time to change between vehicles.
pub const DEFAULT_MIN_TRANSFER_SECS: u32 = 120;

/// Default bound on a single live feed fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the realtime overlay.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Minimum gap between arriving on one vehicle and departing on the next.
    pub min_transfer_secs: u32,
    /// Upper bound on how long a live fetch may take.
    pub fetch_timeout: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_transfer_secs: DEFAULT_MIN_TRANSFER_SECS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Apply a live snapshot to an itinerary.
///
/// Any live data already on the itinerary is discarded first, so the result
/// depends only on the schedule and `feed`.
///
/// Legs whose trip is absent from the snapshot are left without live data.
/// A cancelled trip marks its leg cancelled with no actual times. Otherwise
/// each side of the leg takes its stop's delay, or zero if only the other
/// side was reported.
///
/// A leg whose boarding or alighting stop is skipped cannot be ridden.
/// Transfers are re-checked on the delayed times and the first infeasible
/// one invalidates the itinerary. Cancellation is reported first, then a
/// skipped stop, then a missed transfer. If no leg received live data the
/// scheduled itinerary is returned.
pub fn apply(itinerary: &Itinerary, feed: &LiveFeedSnapshot, min_transfer_secs: u32) -> Itinerary {
    let scheduled = itinerary.scheduled();
    let legs: Vec<Leg> = scheduled
        .legs()
        .iter()
        .map(|leg| match leg_realtime(leg, feed) {
            Some(rt) => leg.with_realtime(rt),
            None => leg.clone(),
        })
        .collect();

    if !legs.iter().any(Leg::has_realtime) {
        debug!("no live data for any leg");
        return scheduled;
    }

    let total_delay_secs: i64 = legs
        .iter()
        .map(|leg| i64::from(leg.departure_delay_secs()))
        .sum();

    let validity = if legs.iter().any(Leg::is_cancelled) {
        Validity::Invalid(InvalidityReason::ServiceCancelled)
    } else if let Some(stop) = legs.iter().find_map(Leg::skipped_stop) {
        Validity::Invalid(InvalidityReason::StopSkipped {
            stop_id: stop.id.clone(),
            stop_name: stop.name.clone(),
        })
    } else {
        match first_missed_transfer(&legs, min_transfer_secs) {
            Some(reason) => Validity::Invalid(reason),
            None => Validity::Valid,
        }
    };

    let realtime = ItineraryRealtime {
        total_delay_secs,
        actual_departure: legs
            .first()
            .and_then(|leg| leg.realtime())
            .and_then(|rt| rt.actual_departure),
        actual_arrival: legs
            .last()
            .and_then(|leg| leg.realtime())
            .and_then(|rt| rt.actual_arrival),
        validity,
    };

    if let Some(reason) = realtime.validity.reason() {
        warn!(
            origin = %itinerary.origin().id,
            destination = %itinerary.destination().id,
            %reason,
            "itinerary invalidated by live data"
        );
    }

    scheduled.with_realtime(legs, realtime)
}

fn leg_realtime(leg: &Leg, feed: &LiveFeedSnapshot) -> Option<LegRealtime> {
    if leg.is_walk() {
        return None;
    }
    let update = feed.trip(leg.trip_id().as_str())?;

    if update.cancelled {
        return Some(LegRealtime {
            cancelled: true,
            ..LegRealtime::default()
        });
    }

    let origin = update.stop(leg.from_stop().as_str());
    let destination = update.stop(leg.to_stop().as_str());
    if origin.is_none() && destination.is_none() {
        return None;
    }

    let departure_delay_secs = origin.map_or(0, |s| s.departure_delay_secs);
    let arrival_delay_secs = destination.map_or(0, |s| s.arrival_delay_secs);
    let skipped_stop = if origin.is_some_and(|s| s.skipped) {
        Some(leg.from_stop().clone())
    } else if destination.is_some_and(|s| s.skipped) {
        Some(leg.to_stop().clone())
    } else {
        None
    };

    Some(LegRealtime {
        departure_delay_secs,
        arrival_delay_secs,
        actual_departure: Some(leg.departure().with_delay(departure_delay_secs)),
        actual_arrival: Some(leg.arrival().with_delay(arrival_delay_secs)),
        cancelled: false,
        skipped_stop,
        platform: origin
            .and_then(|s| s.platform.clone())
            .or_else(|| destination.and_then(|s| s.platform.clone())),
    })
}

/// Find the earliest transfer whose window is too short.
///
/// Walk legs belong to the transfer they sit in: the window is measured
/// between the surrounding vehicle legs and must cover the walk.
fn first_missed_transfer(legs: &[Leg], min_transfer_secs: u32) -> Option<InvalidityReason> {
    let mut previous: Option<&Leg> = None;
    let mut walk_secs: Option<i64> = None;

    for leg in legs {
        if leg.is_walk() {
            let secs = leg.duration().num_seconds();
            walk_secs = Some(walk_secs.unwrap_or(0) + secs);
            continue;
        }

        if let Some(prev) = previous {
            let available_secs = leg.effective_departure_secs() - prev.effective_arrival_secs();
            let required_secs = walk_secs.unwrap_or(i64::from(min_transfer_secs));
            if available_secs < required_secs {
                return Some(InvalidityReason::MissedTransfer {
                    stop_id: prev.to_stop().clone(),
                    stop_name: prev.to().name.clone(),
                    available_secs,
                    required_secs,
                });
            }
        }

        previous = Some(leg);
        walk_secs = None;
    }

    None
}

/// Fetches live data and applies it, degrading to the scheduled itinerary.
pub struct RealtimeOverlay<S> {
    source: S,
    config: OverlayConfig,
}

impl<S: LiveFeedSource> RealtimeOverlay<S> {
    pub fn new(source: S, config: OverlayConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Fetch one partition's snapshot, bounded by the configured timeout.
    pub async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.fetch(partition)).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(timeout)),
        }
    }

    /// Apply the live data for `partition` to `itinerary`.
    ///
    /// On any fetch failure the failure is logged and an unmodified copy of
    /// the itinerary is returned.
    pub async fn apply_live(&self, itinerary: &Itinerary, partition: &str) -> Itinerary {
        match self.fetch(partition).await {
            Ok(feed) => {
                info!(
                    partition,
                    trips = feed.len(),
                    cancelled = feed.cancelled_count(),
                    feed_timestamp = feed.timestamp(),
                    "applying live feed"
                );
                apply(itinerary, &feed, self.config.min_transfer_secs)
            }
            Err(e) => {
                warn!(partition, error = %e, "live feed unavailable, keeping scheduled itinerary");
                itinerary.clone()
            }
        }
    }

    /// Apply live data merged from several partitions.
    ///
    /// Partitions are fetched concurrently. Failed partitions are skipped;
    /// if every partition fails the itinerary is returned unmodified.
    pub async fn apply_live_merged(&self, itinerary: &Itinerary, partitions: &[String]) -> Itinerary {
        let results = join_all(partitions.iter().map(|p| self.fetch(p))).await;

        let mut snapshots = Vec::with_capacity(results.len());
        for (partition, result) in partitions.iter().zip(results) {
            match result {
                Ok(feed) => snapshots.push(feed),
                Err(e) => warn!(partition = %partition, error = %e, "skipping live feed partition"),
            }
        }

        if snapshots.is_empty() {
            warn!("no live feed partitions available, keeping scheduled itinerary");
            return itinerary.clone();
        }

        let merged = LiveFeedSnapshot::merge(snapshots.iter().map(|s| &**s));
        apply(itinerary, &merged, self.config.min_transfer_secs)
    }
}

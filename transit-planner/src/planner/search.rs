//! Earliest-arrival journey search (Connection Scan).
//!
//! One forward pass over the departure-sorted connections computes the
//! earliest time every stop can be reached from the origin. The itinerary
//! is then rebuilt by following, from the destination, the connection that
//! last improved each stop.
//!
//! Ties keep the first connection scanned: a later connection must arrive
//! strictly earlier to replace it. Walk transfers are relaxed as footpaths
//! from the origin and from every stop whose arrival a vehicle improves;
//! walks are never chained.

use tracing::{debug, trace};

use crate::domain::{DomainError, Itinerary, Leg, LegRoute, ServiceTime, StopId, StopRef};
use crate::graph::{Connection, NetworkGraph, StopIdx, WalkTransfer};

use super::config::SearchConfig;

/// Error from journey search.
///
/// "No route" is not an error: searches return `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Origin stop id is not in the network
    #[error("origin stop {0} not found")]
    OriginNotFound(StopId),

    /// Destination stop id is not in the network
    #[error("destination stop {0} not found")]
    DestinationNotFound(StopId),

    /// The network produced an inconsistent result
    #[error("internal consistency error: {0}")]
    Integrity(#[from] DomainError),
}

/// How the search reached a stop.
#[derive(Debug, Clone, Copy)]
enum Entry {
    /// Index into the graph's connection list.
    Ride(usize),
    /// A walk starting at the given time.
    Walk(WalkTransfer, ServiceTime),
}

/// Per-query scan state.
struct ScanState {
    earliest: Vec<Option<ServiceTime>>,
    entering: Vec<Option<Entry>>,
}

impl ScanState {
    fn new(stop_count: usize) -> Self {
        Self {
            earliest: vec![None; stop_count],
            entering: vec![None; stop_count],
        }
    }

    fn earliest(&self, stop: StopIdx) -> Option<ServiceTime> {
        self.earliest[stop.index()]
    }

    /// Record `arrival` at `stop` if it is strictly earlier than the best so far.
    fn improve(&mut self, stop: StopIdx, arrival: ServiceTime, entry: Entry) -> bool {
        let slot = &mut self.earliest[stop.index()];
        if slot.is_some_and(|best| best <= arrival) {
            return false;
        }
        *slot = Some(arrival);
        self.entering[stop.index()] = Some(entry);
        true
    }
}

/// Journey planner over a compiled network.
pub struct Planner<'a> {
    graph: &'a NetworkGraph,
    config: &'a SearchConfig,
}

impl<'a> Planner<'a> {
    /// Create a new planner.
    pub fn new(graph: &'a NetworkGraph, config: &'a SearchConfig) -> Self {
        Self { graph, config }
    }

    /// Find the earliest-arrival itinerary leaving `origin` no earlier than `depart_at`.
    ///
    /// Returns `Ok(None)` if the destination is unreachable, or if origin
    /// and destination are the same stop.
    ///
    /// # Errors
    ///
    /// Returns `OriginNotFound` / `DestinationNotFound` for unknown stop ids,
    /// and `Integrity` if the result can't be assembled into a valid
    /// itinerary.
    pub fn find_earliest_arrival(
        &self,
        origin: &StopId,
        destination: &StopId,
        depart_at: ServiceTime,
    ) -> Result<Option<Itinerary>, SearchError> {
        let origin_idx = self
            .graph
            .stop_idx(origin.as_str())
            .ok_or_else(|| SearchError::OriginNotFound(origin.clone()))?;
        let dest_idx = self
            .graph
            .stop_idx(destination.as_str())
            .ok_or_else(|| SearchError::DestinationNotFound(destination.clone()))?;

        if origin_idx == dest_idx {
            return Ok(None);
        }

        let mut state = ScanState::new(self.graph.stop_count());
        state.earliest[origin_idx.index()] = Some(depart_at);
        self.relax_walks(&mut state, origin_idx, depart_at);

        let connections = self.graph.connections();
        // Nothing departing before the query time can be boarded.
        let start = connections.partition_point(|c| c.departure < depart_at);
        let mut scanned = 0usize;

        for (idx, conn) in connections.iter().enumerate().skip(start) {
            if state
                .earliest(dest_idx)
                .is_some_and(|best| best <= conn.departure)
            {
                break;
            }
            scanned += 1;

            let Some(reached) = state.earliest(conn.from) else {
                continue;
            };
            if conn.departure < reached {
                continue;
            }
            if state.improve(conn.to, conn.arrival, Entry::Ride(idx)) {
                self.relax_walks(&mut state, conn.to, conn.arrival);
            }
        }

        debug!(
            origin = %origin,
            destination = %destination,
            depart_at = %depart_at,
            scanned,
            total = connections.len(),
            "connection scan finished"
        );

        if state.entering[dest_idx.index()].is_none() {
            return Ok(None);
        }

        let path = self.reconstruct(&state, origin_idx, dest_idx)?;
        let legs = self.build_legs(&path)?;
        Ok(Some(Itinerary::new(legs)?))
    }

    /// Return up to `max_results` itineraries.
    ///
    /// Only the single earliest-arrival itinerary is produced, so the result
    /// has zero or one element.
    pub fn find_multiple(
        &self,
        origin: &StopId,
        destination: &StopId,
        depart_at: ServiceTime,
    ) -> Result<Vec<Itinerary>, SearchError> {
        let found = self.find_earliest_arrival(origin, destination, depart_at)?;
        Ok(found
            .into_iter()
            .take(self.config.max_results)
            .collect())
    }

    fn relax_walks(&self, state: &mut ScanState, from: StopIdx, at: ServiceTime) {
        for walk in self.graph.walks_from(from) {
            let Some(arrival) = at.checked_add_secs(walk.duration_secs) else {
                continue;
            };
            if state.improve(walk.to, arrival, Entry::Walk(*walk, at)) {
                trace!(from = from.index(), to = walk.to.index(), "walk improved arrival");
            }
        }
    }

    /// Follow entering connections back from the destination.
    fn reconstruct(
        &self,
        state: &ScanState,
        origin: StopIdx,
        destination: StopIdx,
    ) -> Result<Vec<Connection>, DomainError> {
        let connections = self.graph.connections();
        let mut path = Vec::new();
        let mut current = destination;

        while current != origin {
            if path.len() > self.graph.stop_count() {
                return Err(DomainError::BrokenPath("entering connections form a cycle"));
            }
            let entry = state.entering[current.index()]
                .ok_or(DomainError::BrokenPath("stop on path has no entering connection"))?;
            let conn = match entry {
                Entry::Ride(idx) => connections[idx].clone(),
                Entry::Walk(walk, at) => walk
                    .to_connection(at)
                    .ok_or(DomainError::BrokenPath("walk arrival out of range"))?,
            };
            current = conn.from;
            path.push(conn);
        }

        path.reverse();
        Ok(path)
    }

    /// Group a connection path into legs, one per run of a single trip.
    fn build_legs(&self, path: &[Connection]) -> Result<Vec<Leg>, DomainError> {
        path.chunk_by(|a, b| a.trip_id == b.trip_id)
            .map(|run| self.make_leg(run))
            .collect()
    }

    fn make_leg(&self, run: &[Connection]) -> Result<Leg, DomainError> {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return Err(DomainError::InvalidLeg("a leg needs at least one connection"));
        };
        let from = self.stop_ref(first.from);
        let to = self.stop_ref(last.to);

        if first.is_walk {
            return Leg::walk(from, to, first.departure, last.arrival);
        }

        let route = first.route_id.as_ref().and_then(|id| {
            let route = self.graph.snapshot().route(id.as_str())?;
            Some(LegRoute {
                id: id.clone(),
                name: route.display_name().map(str::to_string),
                mode_code: route.mode_code,
            })
        });

        Leg::vehicle(
            from,
            to,
            first.departure,
            last.arrival,
            first.trip_id.clone(),
            route,
            run.len() + 1,
        )
    }

    fn stop_ref(&self, idx: StopIdx) -> StopRef {
        let stop = self.graph.stop_at(idx);
        StopRef::new(stop.id.clone(), stop.name.clone())
    }
}

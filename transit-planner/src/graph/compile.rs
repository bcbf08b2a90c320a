//! Timetable to connection-graph compiler.
//!
//! The search needs only the flat, departure-sorted connection list. The
//! per-stop adjacency summary built alongside it serves diagnostic queries
//! and never influences search results.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::info;

use super::{CompileError, Connection, StopIdx, WalkTransfer};
use crate::domain::{RouteId, StopId};
use crate::timetable::{Stop, TimetableSnapshot};

/// Aggregated view of every connection between one ordered stop pair.
#[derive(Debug, Clone, Default)]
pub struct EdgeSummary {
    /// Minimum travel time over scheduled and walk connections.
    pub min_travel_secs: u32,
    pub route_ids: BTreeSet<RouteId>,
    pub trip_count: usize,
    pub has_walk: bool,
    connections: Vec<usize>,
}

/// Summary counts for a compiled graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    pub stop_count: usize,
    /// Distinct ordered stop pairs joined by at least one connection or walk.
    pub edge_count: usize,
    pub connection_count: usize,
    pub walk_transfer_count: usize,
    pub average_degree: f64,
}

/// A compiled, immutable network ready for searching.
#[derive(Debug)]
pub struct NetworkGraph {
    snapshot: Arc<TimetableSnapshot>,
    stop_index: HashMap<StopId, StopIdx>,
    /// Scheduled connections sorted by (departure, trip id, sequence).
    connections: Vec<Connection>,
    walks: Vec<Vec<WalkTransfer>>,
    edges: Vec<BTreeMap<StopIdx, EdgeSummary>>,
    walk_count: usize,
}

impl NetworkGraph {
    /// Compile a timetable snapshot.
    ///
    /// Each trip with N visits yields N-1 connections. Each transfer yields
    /// one walk edge.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::NegativeTravelTime` if a trip arrives at a
    /// stop before departing the previous one.
    pub fn compile(snapshot: Arc<TimetableSnapshot>) -> Result<Self, CompileError> {
        let stop_index: HashMap<StopId, StopIdx> = snapshot
            .stops()
            .iter()
            .enumerate()
            .map(|(i, stop)| (stop.id.clone(), StopIdx(i)))
            .collect();
        let lookup = |id: &StopId| {
            stop_index
                .get(id)
                .copied()
                .ok_or_else(|| CompileError::UnknownStop(id.clone()))
        };

        let mut connections = Vec::new();
        for trip in snapshot.trips() {
            // Snapshot validation guarantees the route exists.
            let mode_code = snapshot.route(trip.route_id.as_str()).map(|r| r.mode_code);
            for pair in trip.visits.windows(2) {
                let (current, next) = (&pair[0], &pair[1]);
                if next.arrival < current.departure {
                    return Err(CompileError::NegativeTravelTime {
                        trip: trip.id.clone(),
                        from: current.stop_id.clone(),
                        to: next.stop_id.clone(),
                        departure: current.departure,
                        arrival: next.arrival,
                    });
                }
                connections.push(Connection {
                    from: lookup(&current.stop_id)?,
                    to: lookup(&next.stop_id)?,
                    trip_id: trip.id.clone(),
                    route_id: Some(trip.route_id.clone()),
                    departure: current.departure,
                    arrival: next.arrival,
                    mode_code,
                    is_walk: false,
                    sequence: current.sequence,
                });
            }
        }

        connections.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
                .then_with(|| a.sequence.cmp(&b.sequence))
        });

        let stop_count = snapshot.stop_count();
        let mut walks = vec![Vec::new(); stop_count];
        for transfer in snapshot.transfers() {
            let walk = WalkTransfer {
                from: lookup(&transfer.from_stop)?,
                to: lookup(&transfer.to_stop)?,
                duration_secs: transfer.min_duration_secs,
            };
            walks[walk.from.0].push(walk);
        }
        let walk_count = snapshot.transfers().len();

        let mut edges: Vec<BTreeMap<StopIdx, EdgeSummary>> = vec![BTreeMap::new(); stop_count];
        for (idx, conn) in connections.iter().enumerate() {
            let edge = edges[conn.from.0].entry(conn.to).or_insert_with(|| EdgeSummary {
                min_travel_secs: u32::MAX,
                ..EdgeSummary::default()
            });
            edge.min_travel_secs = edge.min_travel_secs.min(conn.travel_secs());
            if let Some(route_id) = &conn.route_id {
                edge.route_ids.insert(route_id.clone());
            }
            edge.trip_count += 1;
            edge.connections.push(idx);
        }
        for walk in walks.iter().flatten() {
            let edge = edges[walk.from.0].entry(walk.to).or_insert_with(|| EdgeSummary {
                min_travel_secs: u32::MAX,
                ..EdgeSummary::default()
            });
            // A walk can beat every scheduled trip between the same stops.
            edge.min_travel_secs = edge.min_travel_secs.min(walk.duration_secs);
            edge.has_walk = true;
        }

        let graph = Self {
            snapshot,
            stop_index,
            connections,
            walks,
            edges,
            walk_count,
        };
        let stats = graph.stats();
        info!(
            stops = stats.stop_count,
            connections = stats.connection_count,
            walk_transfers = stats.walk_transfer_count,
            edges = stats.edge_count,
            "compiled network graph"
        );
        Ok(graph)
    }

    /// The snapshot this graph was compiled from.
    pub fn snapshot(&self) -> &TimetableSnapshot {
        &self.snapshot
    }

    /// Scheduled connections in scan order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Walk edges leaving a stop.
    pub fn walks_from(&self, stop: StopIdx) -> &[WalkTransfer] {
        self.walks.get(stop.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stop_count(&self) -> usize {
        self.snapshot.stop_count()
    }

    pub fn stop_idx(&self, id: &str) -> Option<StopIdx> {
        self.stop_index.get(id).copied()
    }

    /// Returns the stop at a dense index.
    ///
    /// # Panics
    ///
    /// Panics if `idx` did not come from this graph.
    pub fn stop_at(&self, idx: StopIdx) -> &Stop {
        &self.snapshot.stops()[idx.0]
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.snapshot.stop(id)
    }

    pub fn has_stop(&self, id: &str) -> bool {
        self.stop_index.contains_key(id)
    }

    fn edge(&self, from: &str, to: &str) -> Option<&EdgeSummary> {
        let from = self.stop_idx(from)?;
        let to = self.stop_idx(to)?;
        self.edges[from.0].get(&to)
    }

    /// Returns true if any connection or walk goes directly from one stop to the other.
    pub fn has_connection(&self, from: &str, to: &str) -> bool {
        self.edge(from, to).is_some()
    }

    /// Stops directly reachable from `id`, by connection or walk.
    pub fn neighbors(&self, id: &str) -> Vec<&StopId> {
        let Some(from) = self.stop_idx(id) else {
            return Vec::new();
        };
        self.edges[from.0]
            .keys()
            .map(|&to| &self.stop_at(to).id)
            .collect()
    }

    /// Minimum direct travel time in seconds, across scheduled and walk edges.
    pub fn travel_time(&self, from: &str, to: &str) -> Option<u32> {
        self.edge(from, to).map(|e| e.min_travel_secs)
    }

    /// Routes with a scheduled connection directly between two stops.
    pub fn routes_between(&self, from: &str, to: &str) -> Vec<&RouteId> {
        self.edge(from, to)
            .map(|e| e.route_ids.iter().collect())
            .unwrap_or_default()
    }

    /// Scheduled connections departing a stop, in scan order.
    pub fn connections_from(&self, id: &str) -> Vec<&Connection> {
        let Some(from) = self.stop_idx(id) else {
            return Vec::new();
        };
        let mut indices: Vec<usize> = self.edges[from.0]
            .values()
            .flat_map(|e| e.connections.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.connections[i]).collect()
    }

    /// Scheduled connections directly between two stops, in scan order.
    pub fn connections_between(&self, from: &str, to: &str) -> Vec<&Connection> {
        self.edge(from, to)
            .map(|e| e.connections.iter().map(|&i| &self.connections[i]).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> GraphStats {
        let stop_count = self.stop_count();
        let edge_count: usize = self.edges.iter().map(BTreeMap::len).sum();
        GraphStats {
            stop_count,
            edge_count,
            connection_count: self.connections.len(),
            walk_transfer_count: self.walk_count,
            average_degree: if stop_count == 0 {
                0.0
            } else {
                edge_count as f64 / stop_count as f64
            },
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{RouteId, ServiceTime, TripId};
    use crate::timetable::fixtures::{route, stop};
    use crate::timetable::{StopVisit, Trip};
    use proptest::prelude::*;

    /// Trips over 6 stops with non-decreasing times.
    fn arb_trips() -> impl Strategy<Value = Vec<Vec<(usize, u32, u32)>>> {
        prop::collection::vec(
            prop::collection::vec((0usize..6, 0u32..600, 0u32..120), 0..8),
            1..6,
        )
    }

    proptest! {
        #[test]
        fn trip_with_n_visits_yields_n_minus_one(trips in arb_trips()) {
            let stops = (0..6).map(|i| stop(&format!("S{i}"), "Stop")).collect();
            let trips: Vec<Trip> = trips
                .iter()
                .enumerate()
                .map(|(t, calls)| {
                    let mut clock = 6 * 3600;
                    let visits = calls
                        .iter()
                        .enumerate()
                        .map(|(seq, &(s, travel, dwell))| {
                            let arrival = clock + travel;
                            clock = arrival + dwell;
                            StopVisit {
                                stop_id: StopId::new(format!("S{s}")).unwrap(),
                                sequence: seq as u32,
                                arrival: ServiceTime::from_secs(arrival),
                                departure: ServiceTime::from_secs(clock),
                            }
                        })
                        .collect();
                    Trip {
                        id: TripId::new(format!("T{t}")).unwrap(),
                        route_id: RouteId::new("R1").unwrap(),
                        visits,
                    }
                })
                .collect();
            let expected: usize = trips.iter().map(|t| t.visits.len().saturating_sub(1)).sum();

            let snapshot = TimetableSnapshot::new(stops, vec![route("R1", "Line", 3)], trips, vec![]).unwrap();
            let graph = NetworkGraph::compile(Arc::new(snapshot)).unwrap();

            prop_assert_eq!(graph.connections().len(), expected);
            for conn in graph.connections() {
                prop_assert!(conn.arrival >= conn.departure);
            }
            for pair in graph.connections().windows(2) {
                prop_assert!(pair[0].departure <= pair[1].departure);
            }
        }
    }
}

//! Stop name lookup.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::StopId;
use crate::timetable::{Stop, TimetableSnapshot};

use super::similarity::{ratio, token_sort_key};

/// Default minimum score for an approximate match.
pub const DEFAULT_MIN_SCORE: u8 = 60;

/// A stop matched by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopMatch {
    pub stop_id: StopId,
    pub name: String,
    /// Similarity to the query, 100 for an exact match.
    pub score: u8,
}

#[derive(Debug, Clone)]
struct IndexedStop {
    id: StopId,
    name: String,
    key: String,
}

/// Resolves free-text stop names to stop ids.
///
/// Exact matches are case-insensitive; when several stops share a name the
/// first one in timetable order wins. Approximate matches compare
/// word-order-insensitive normalised names.
#[derive(Debug, Clone, Default)]
pub struct StopNameIndex {
    stops: Vec<IndexedStop>,
    by_name: HashMap<String, Vec<usize>>,
}

impl StopNameIndex {
    /// Index every stop in a timetable snapshot.
    pub fn build(snapshot: &TimetableSnapshot) -> Self {
        Self::from_stops(snapshot.stops())
    }

    pub fn from_stops<'a>(stops: impl IntoIterator<Item = &'a Stop>) -> Self {
        let mut index = StopNameIndex::default();
        for stop in stops {
            let position = index.stops.len();
            index
                .by_name
                .entry(stop.name.to_lowercase())
                .or_default()
                .push(position);
            index.stops.push(IndexedStop {
                id: stop.id.clone(),
                name: stop.name.clone(),
                key: token_sort_key(&stop.name),
            });
        }
        debug!(stops = index.stops.len(), names = index.by_name.len(), "indexed stop names");
        index
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Case-insensitive exact name match.
    pub fn find_exact(&self, name: &str) -> Option<StopMatch> {
        let position = *self.by_name.get(&name.trim().to_lowercase())?.first()?;
        Some(self.matched(position, 100))
    }

    /// Every stop whose name matches exactly, in timetable order.
    pub fn find_all_exact(&self, name: &str) -> Vec<StopMatch> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|positions| positions.iter().map(|&p| self.matched(p, 100)).collect())
            .unwrap_or_default()
    }

    /// Approximate matches scoring at least `min_score`, best first.
    ///
    /// Equal scores are ordered by timetable order.
    pub fn find_fuzzy(&self, query: &str, limit: usize, min_score: u8) -> Vec<StopMatch> {
        let key = token_sort_key(query);
        let mut scored: Vec<(u8, usize)> = self
            .stops
            .iter()
            .enumerate()
            .map(|(position, stop)| (ratio(&key, &stop.key), position))
            .filter(|&(score, _)| score >= min_score)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, position)| self.matched(position, score))
            .collect()
    }

    /// Resolve a name to a single stop: exact match first, then the best
    /// approximate match scoring at least [`DEFAULT_MIN_SCORE`].
    pub fn resolve(&self, name: &str) -> Option<StopMatch> {
        self.find_exact(name)
            .or_else(|| self.find_fuzzy(name, 1, DEFAULT_MIN_SCORE).into_iter().next())
    }

    /// Suggestions for a partially typed name.
    ///
    /// Exact matches come first, followed by approximate matches not
    /// already listed.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StopMatch> {
        let mut results = self.find_all_exact(query);
        results.truncate(limit);
        for candidate in self.find_fuzzy(query, limit, DEFAULT_MIN_SCORE) {
            if results.len() >= limit {
                break;
            }
            if !results.iter().any(|r| r.stop_id == candidate.stop_id) {
                results.push(candidate);
            }
        }
        results
    }

    fn matched(&self, position: usize, score: u8) -> StopMatch {
        let stop = &self.stops[position];
        StopMatch {
            stop_id: stop.id.clone(),
            name: stop.name.clone(),
            score,
        }
    }
}

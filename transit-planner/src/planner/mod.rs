//! Journey planner using the Connection Scan Algorithm.
//!
//! This module answers: "leaving stop A no earlier than time T, what is the
//! earliest I can reach stop B, and by which legs?"
//!
//! The search is synchronous and reads a shared, immutable
//! [`NetworkGraph`](crate::graph::NetworkGraph), so concurrent queries need
//! no locking.

mod config;
mod search;


pub use config::SearchConfig;
pub use search::{Planner, SearchError};

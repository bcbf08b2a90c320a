//! Web layer for the journey planner.
//!
//! Provides JSON endpoints for stop search, network statistics and
//! journey planning.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, LiveFeed};

//! Stop name resolution.
//!
//! The planner only works with stop ids; this module turns what a user
//! typed into one.

mod index;
mod similarity;

pub use index::{DEFAULT_MIN_SCORE, StopMatch, StopNameIndex};
pub use similarity::token_sort_ratio;

//! Live delay and cancellation data.
//!
//! Decodes GTFS-Realtime trip-update feeds into a trip-indexed
//! [`LiveFeedSnapshot`] and overlays it onto scheduled itineraries.

mod client;
mod convert;
mod error;
mod feed;
mod mock;
mod overlay;
mod source;

pub use client::{FeedClientConfig, GtfsRealtimeClient};
pub use convert::convert_feed;
pub use error::FeedError;
pub use feed::{LiveFeedSnapshot, StopTimeDelay, TripUpdate};
pub use mock::StaticFeedSource;
pub use overlay::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MIN_TRANSFER_SECS, OverlayConfig, RealtimeOverlay, apply,
};
pub use source::LiveFeedSource;

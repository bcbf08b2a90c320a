//! Transit journey planner.
//!
//! Answers: "leaving stop A after time T, what is the earliest I can reach
//! stop B, how many changes does it take, and does live data say the plan
//! still works?"

pub mod cache;
pub mod config;
pub mod domain;
pub mod graph;
pub mod network;
pub mod planner;
pub mod realtime;
pub mod stops;
pub mod timetable;
pub mod web;

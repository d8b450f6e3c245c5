//! Fetch orchestration.
//!
//! Decides which collections are stale, fans one request per stale key out
//! concurrently, and writes each settled result back into the cache on its
//! own so one failing endpoint never blanks the others.

mod error;
mod in_flight;
mod orchestrator;
mod planner;
mod source;

pub use error::FetchError;
pub use in_flight::{FetchGuard, InFlightError, InFlightKeys};
pub use orchestrator::{FetchConfig, FetchOrchestrator, RefreshReport, extract_collection};
pub use planner::RefreshPlan;
pub use source::CollectionSource;

//! Dynamic value tracking and non-destructive write-back (spec.md §4.8-4.9).
//! Components G (Dynamic Value Tracker) and H (Write-Back) of the pipeline.

pub mod error;
pub mod tracker;
pub mod writeback;

pub use error::{Error, Result};
pub use tracker::{DirtyEntry, SiteOrigin, Tracker};

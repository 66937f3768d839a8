//! Computation modules: point filtering and spatial indexing.

pub mod spatial;
pub mod validation;

pub use validation::{FilterOutcome, centroid, filter_points, validate_geographic_point};

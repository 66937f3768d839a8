//! Coordinate validation and point filtering.

use crate::error::{GeobinError, Result};
use geo::{Centroid, MultiPoint};
use geobin_types::point::Point;
use geobin_types::record::{FieldValue, RecordTable};
use std::collections::BTreeMap;

/// Validates a longitude/latitude pair.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geobin::compute::validation::validate_geographic_point;
///
/// assert!(validate_geographic_point(35.6895, 139.6917).is_ok());
/// assert!(validate_geographic_point(95.0, 139.0).is_err());
/// assert!(validate_geographic_point(35.0, f64::NAN).is_err());
/// ```
pub fn validate_geographic_point(lat: f64, lon: f64) -> Result<()> {
    if !lon.is_finite() {
        return Err(GeobinError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !lat.is_finite() {
        return Err(GeobinError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeobinError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeobinError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Points that survived filtering, plus how many records were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub points: Vec<Point>,
    pub dropped: usize,
}

impl FilterOutcome {
    /// Arithmetic mean of the surviving coordinates.
    pub fn centroid(&self) -> Result<geo::Point<f64>> {
        centroid(&self.points)
    }
}

/// Turn raw records into valid [`Point`]s.
///
/// A missing coordinate column is fatal and reported once. Rows whose
/// coordinate is null, non-numeric or out of range are dropped and counted.
/// All remaining columns are carried into each point's field map. If no
/// row survives the result is [`GeobinError::EmptyInput`].
///
/// # Examples
///
/// ```
/// use geobin::compute::validation::filter_points;
/// use geobin_types::record::{FieldValue, RecordTable};
///
/// let table = RecordTable::from_rows(
///     vec!["lat".into(), "lon".into()],
///     vec![
///         vec![35.0.into(), 139.0.into()],
///         vec![35.1.into(), FieldValue::Null],
///     ],
/// );
///
/// let outcome = filter_points(&table, "lat", "lon").unwrap();
/// assert_eq!(outcome.points.len(), 1);
/// assert_eq!(outcome.dropped, 1);
/// ```
pub fn filter_points(table: &RecordTable, lat_column: &str, lon_column: &str) -> Result<FilterOutcome> {
    let lat_idx = table
        .column_index(lat_column)
        .ok_or_else(|| GeobinError::ColumnMissing(lat_column.to_string()))?;
    let lon_idx = table
        .column_index(lon_column)
        .ok_or_else(|| GeobinError::ColumnMissing(lon_column.to_string()))?;

    let mut points = Vec::with_capacity(table.len());
    let mut dropped = 0usize;

    for (row_idx, row) in table.rows().iter().enumerate() {
        let coords = row[lat_idx].as_f64().zip(row[lon_idx].as_f64());
        let Some((lat, lon)) = coords else {
            dropped += 1;
            continue;
        };

        if let Err(e) = validate_geographic_point(lat, lon) {
            log::trace!("dropping row {}: {}", row_idx, e);
            dropped += 1;
            continue;
        }

        let fields: BTreeMap<String, FieldValue> = table
            .columns()
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(idx, _)| *idx != lat_idx && *idx != lon_idx)
            .map(|(_, (name, value))| (name.clone(), value.clone()))
            .collect();

        points.push(Point::new(lat, lon, fields));
    }

    if points.is_empty() {
        return Err(GeobinError::EmptyInput { dropped });
    }

    if dropped > 0 {
        log::debug!(
            "filtered {} records: {} valid, {} dropped",
            table.len(),
            points.len(),
            dropped
        );
    }

    Ok(FilterOutcome { points, dropped })
}

/// Arithmetic mean of latitude and longitude over `points`, as a
/// `geo::Point` (x = lon, y = lat).
///
/// Fails with [`GeobinError::EmptyInput`] for an empty slice.
pub fn centroid(points: &[Point]) -> Result<geo::Point<f64>> {
    let multi: MultiPoint<f64> = points.iter().map(|p| *p.location()).collect();
    multi
        .centroid()
        .ok_or(GeobinError::EmptyInput { dropped: 0 })
}

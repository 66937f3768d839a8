//! Weighted points for heat layers.

use crate::error::{GeobinError, Result};
use geobin_types::point::Point;
use serde::{Deserialize, Serialize};

/// A heat sample. Serializes as `[lat, lon, weight]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

impl From<[f64; 3]> for HeatPoint {
    fn from(v: [f64; 3]) -> Self {
        Self {
            lat: v[0],
            lon: v[1],
            weight: v[2],
        }
    }
}

impl From<HeatPoint> for [f64; 3] {
    fn from(p: HeatPoint) -> Self {
        [p.lat, p.lon, p.weight]
    }
}

/// One heat sample per point, weighted by `weight_field` (or 1.0).
///
/// A point without a numeric value for the weight field fails the call with
/// [`GeobinError::UnknownField`].
pub fn heat_points(points: &[Point], weight_field: Option<&str>) -> Result<Vec<HeatPoint>> {
    points
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let weight = match weight_field {
                None => 1.0,
                Some(field) => p.field_f64(field).ok_or_else(|| GeobinError::UnknownField {
                    field: field.to_string(),
                    index: idx,
                })?,
            };
            Ok(HeatPoint {
                lat: p.lat(),
                lon: p.lon(),
                weight,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geobin_types::record::FieldValue;
    use std::collections::BTreeMap;

    fn point(weight: Option<f64>) -> Point {
        let mut fields = BTreeMap::new();
        if let Some(w) = weight {
            fields.insert("dead".to_string(), FieldValue::from(w));
        }
        Point::new(35.0, 139.0, fields)
    }

    #[test]
    fn test_unweighted() {
        let heat = heat_points(&[point(None), point(None)], None).unwrap();
        assert!(heat.iter().all(|h| h.weight == 1.0));
    }

    #[test]
    fn test_weighted_and_missing() {
        let heat = heat_points(&[point(Some(2.0))], Some("dead")).unwrap();
        assert_eq!(heat[0].weight, 2.0);

        assert!(matches!(
            heat_points(&[point(Some(2.0)), point(None)], Some("dead")),
            Err(GeobinError::UnknownField { index: 1, .. })
        ));
    }

    #[test]
    fn test_serializes_as_triple() {
        let json = serde_json::to_string(&HeatPoint {
            lat: 35.0,
            lon: 139.5,
            weight: 2.0,
        })
        .unwrap();
        assert_eq!(json, "[35.0,139.5,2.0]");
    }
}

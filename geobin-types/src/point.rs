use crate::record::FieldValue;
use geo::Point as GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A validated geographic record: a coordinate plus its auxiliary fields.
///
/// The coordinate is stored as a `geo::Point` with x = longitude and
/// y = latitude. Points are immutable once built.
///
/// # Examples
///
/// ```
/// use geobin_types::point::Point;
/// use geobin_types::record::FieldValue;
/// use std::collections::BTreeMap;
///
/// let mut fields = BTreeMap::new();
/// fields.insert("injured".to_string(), FieldValue::from(2.0));
///
/// let p = Point::new(43.0621, 141.3544, fields);
/// assert_eq!(p.lat(), 43.0621);
/// assert_eq!(p.field_f64("injured"), Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    location: GeoPoint<f64>,
    fields: BTreeMap<String, FieldValue>,
}

impl Point {
    pub fn new(lat: f64, lon: f64, fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            location: GeoPoint::new(lon, lat),
            fields,
        }
    }

    /// Point with no auxiliary fields.
    pub fn bare(lat: f64, lon: f64) -> Self {
        Self::new(lat, lon, BTreeMap::new())
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    pub fn location(&self) -> &GeoPoint<f64> {
        &self.location
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric value of a field, `None` when absent, null or non-numeric.
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_f64)
    }
}

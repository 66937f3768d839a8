//! Japanese national grid meshes ("meshcodes").
//!
//! | order | digits | cell size (lat x lon)  | subdivision of parent |
//! |-------|--------|------------------------|-----------------------|
//! | 1     | 4      | 40' x 1°               | -                     |
//! | 2     | 6      | 5' x 7.5'              | 8 x 8                 |
//! | 3     | 8      | 30" x 45"              | 10 x 10               |
//!
//! Decoding follows the standard formulas digit by digit and does not check
//! that sub-cell digits stay inside their parent.

use crate::error::{GeobinError, Result};
use geo::{Rect, coord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FIRST_LAT: f64 = 2.0 / 3.0;
const FIRST_LON: f64 = 1.0;
const SECOND_LAT: f64 = 5.0 / 60.0;
const SECOND_LON: f64 = 7.5 / 60.0;
const THIRD_LAT: f64 = 30.0 / 3600.0;
const THIRD_LON: f64 = 45.0 / 3600.0;
const LON_OFFSET: f64 = 100.0;

/// Points closer than this to a cell's south/west edge are snapped into it.
const EDGE_EPSILON: f64 = 1e-9;

/// Mesh subdivision order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MeshOrder {
    First,
    Second,
    Third,
}

impl MeshOrder {
    /// Number of decimal digits in a code of this order.
    pub const fn digits(self) -> usize {
        match self {
            MeshOrder::First => 4,
            MeshOrder::Second => 6,
            MeshOrder::Third => 8,
        }
    }

    /// Cell size as (lat, lon) degrees.
    pub const fn size(self) -> (f64, f64) {
        match self {
            MeshOrder::First => (FIRST_LAT, FIRST_LON),
            MeshOrder::Second => (SECOND_LAT, SECOND_LON),
            MeshOrder::Third => (THIRD_LAT, THIRD_LON),
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            4 => Some(MeshOrder::First),
            6 => Some(MeshOrder::Second),
            8 => Some(MeshOrder::Third),
            _ => None,
        }
    }
}

impl TryFrom<u8> for MeshOrder {
    type Error = GeobinError;

    fn try_from(order: u8) -> Result<Self> {
        match order {
            1 => Ok(MeshOrder::First),
            2 => Ok(MeshOrder::Second),
            3 => Ok(MeshOrder::Third),
            other => Err(GeobinError::Config(format!(
                "mesh order must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<MeshOrder> for u8 {
    fn from(order: MeshOrder) -> Self {
        match order {
            MeshOrder::First => 1,
            MeshOrder::Second => 2,
            MeshOrder::Third => 3,
        }
    }
}

/// A syntactically valid meshcode: 4, 6 or 8 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeshCode(String);

impl MeshCode {
    /// Validate a meshcode string.
    ///
    /// Any length other than 4, 6 or 8, or any non-digit character, is a
    /// [`GeobinError::Format`].
    pub fn parse(code: &str) -> Result<Self> {
        if MeshOrder::from_len(code.len()).is_none() {
            return Err(GeobinError::Format(format!(
                "meshcode {:?} has length {}, expected 4, 6 or 8",
                code,
                code.len()
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GeobinError::Format(format!(
                "meshcode {:?} contains non-digit characters",
                code
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn order(&self) -> MeshOrder {
        MeshOrder::from_len(self.0.len()).unwrap_or(MeshOrder::Third)
    }

    fn digit(&self, i: usize) -> f64 {
        (self.0.as_bytes()[i] - b'0') as f64
    }

    fn pair(&self, i: usize) -> f64 {
        self.digit(i) * 10.0 + self.digit(i + 1)
    }

    /// South-west corner as (lat, lon) degrees.
    pub fn origin(&self) -> (f64, f64) {
        let mut lat = self.pair(0) * FIRST_LAT;
        let mut lon = self.pair(2) + LON_OFFSET;

        if self.order() >= MeshOrder::Second {
            lat += self.digit(4) * SECOND_LAT;
            lon += self.digit(5) * SECOND_LON;
        }
        if self.order() == MeshOrder::Third {
            lat += self.digit(6) * THIRD_LAT;
            lon += self.digit(7) * THIRD_LON;
        }
        (lat, lon)
    }

    /// Bounding rectangle (x = lon, y = lat).
    pub fn rect(&self) -> Rect<f64> {
        let (lat, lon) = self.origin();
        let (dlat, dlon) = self.order().size();
        Rect::new(
            coord! { x: lon, y: lat },
            coord! { x: lon + dlon, y: lat + dlat },
        )
    }

    /// Closed counter-clockwise ring of `[lon, lat]` pairs starting at the
    /// south-west corner.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        let rect = self.rect();
        let (min, max) = (rect.min(), rect.max());
        vec![
            [min.x, min.y],
            [max.x, min.y],
            [max.x, max.y],
            [min.x, max.y],
            [min.x, min.y],
        ]
    }

    /// Enclosing code at a coarser order, `None` if `order` is finer.
    pub fn parent(&self, order: MeshOrder) -> Option<MeshCode> {
        (order <= self.order()).then(|| MeshCode(self.0[..order.digits()].to_string()))
    }
}

impl fmt::Display for MeshCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MeshCode {
    type Err = GeobinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MeshCode {
    type Error = GeobinError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<MeshCode> for String {
    fn from(code: MeshCode) -> Self {
        code.0
    }
}

/// Decode a meshcode into its bounding rectangle.
///
/// # Examples
///
/// ```
/// use geobin::compute::spatial::mesh::index_mesh;
///
/// let rect = index_mesh("5340").unwrap();
/// assert!((rect.min().y - 35.333333).abs() < 1e-6);
/// assert_eq!(rect.min().x, 140.0);
/// assert!((rect.height() - 2.0 / 3.0).abs() < 1e-12);
/// assert_eq!(rect.width(), 1.0);
///
/// assert!(index_mesh("53401").is_err());
/// ```
pub fn index_mesh(code: &str) -> Result<Rect<f64>> {
    Ok(MeshCode::parse(code)?.rect())
}

/// Encode a coordinate as the meshcode of the cell containing it.
///
/// Coordinates outside the grid's domain (latitude `[0, 66.67)`, longitude
/// `[100, 200)`) fail with [`GeobinError::InvalidInput`].
///
/// # Examples
///
/// ```
/// use geobin::compute::spatial::mesh::{mesh_code, MeshOrder};
///
/// // Tokyo Station
/// let code = mesh_code(35.681236, 139.767125, MeshOrder::Third).unwrap();
/// assert_eq!(code.as_str(), "53394611");
/// ```
pub fn mesh_code(lat: f64, lon: f64, order: MeshOrder) -> Result<MeshCode> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(GeobinError::InvalidInput(format!(
            "coordinate must be finite, got ({}, {})",
            lat, lon
        )));
    }

    let lat = lat + EDGE_EPSILON;
    let lon = lon - LON_OFFSET + EDGE_EPSILON;

    let p = (lat / FIRST_LAT).floor();
    let u = lon.floor();
    if !(0.0..100.0).contains(&p) || !(0.0..100.0).contains(&u) {
        return Err(GeobinError::InvalidInput(format!(
            "coordinate ({}, {}) is outside the national grid",
            lat - EDGE_EPSILON,
            lon + LON_OFFSET - EDGE_EPSILON
        )));
    }

    let mut code = format!("{:02}{:02}", p as u8, u as u8);
    if order == MeshOrder::First {
        return Ok(MeshCode(code));
    }

    // Work in seconds from here on to keep the remainders well-conditioned.
    let lat_rem = lat * 3600.0 - p * 2400.0;
    let lon_rem = lon * 3600.0 - u * 3600.0;

    let q = (lat_rem / 300.0).floor().clamp(0.0, 7.0);
    let v = (lon_rem / 450.0).floor().clamp(0.0, 7.0);
    code.push_str(&format!("{}{}", q as u8, v as u8));
    if order == MeshOrder::Second {
        return Ok(MeshCode(code));
    }

    let r = ((lat_rem - q * 300.0) / 30.0).floor().clamp(0.0, 9.0);
    let w = ((lon_rem - v * 450.0) / 45.0).floor().clamp(0.0, 9.0);
    code.push_str(&format!("{}{}", r as u8, w as u8));
    Ok(MeshCode(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Contains;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_first_order_decode() {
        let code = MeshCode::parse("5340").unwrap();
        let (lat, lon) = code.origin();
        assert_close(lat, 35.0 + 1.0 / 3.0);
        assert_close(lon, 140.0);

        let rect = code.rect();
        assert_close(rect.height(), 2.0 / 3.0);
        assert_close(rect.width(), 1.0);
    }

    #[test]
    fn test_second_order_decode() {
        let (lat, lon) = MeshCode::parse("533947").unwrap().origin();
        assert_close(lat, 53.0 * 2.0 / 3.0 + 4.0 * 5.0 / 60.0);
        assert_close(lon, 139.0 + 7.0 * 7.5 / 60.0);
    }

    #[test]
    fn test_third_order_decode() {
        let code = MeshCode::parse("53394659").unwrap();
        let (lat, lon) = code.origin();
        assert_close(lat, 53.0 * 2.0 / 3.0 + 4.0 * 5.0 / 60.0 + 5.0 * 30.0 / 3600.0);
        assert_close(lon, 139.0 + 6.0 * 7.5 / 60.0 + 9.0 * 45.0 / 3600.0);

        let rect = code.rect();
        assert_close(rect.height(), 30.0 / 3600.0);
        assert_close(rect.width(), 45.0 / 3600.0);
    }

    #[test]
    fn test_bad_lengths_and_digits() {
        for bad in ["", "534", "53401", "5339461", "533946111", "53a0"] {
            assert!(
                matches!(MeshCode::parse(bad), Err(GeobinError::Format(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_encode_contains_point() {
        let samples = [
            (35.681236, 139.767125),
            (43.0621, 141.3544),
            (26.2124, 127.6809),
            (33.5902, 130.4017),
        ];
        for (lat, lon) in samples {
            for order in [MeshOrder::First, MeshOrder::Second, MeshOrder::Third] {
                let code = mesh_code(lat, lon, order).unwrap();
                assert_eq!(code.order(), order);
                let rect = code.rect();
                assert!(
                    rect.contains(&geo::Point::new(lon, lat)),
                    "{} does not contain ({}, {})",
                    code,
                    lat,
                    lon
                );
            }
        }
    }

    #[test]
    fn test_encode_origin_is_stable() {
        for s in ["5340", "533947", "53394659", "64414277"] {
            let code = MeshCode::parse(s).unwrap();
            let (lat, lon) = code.origin();
            assert_eq!(mesh_code(lat, lon, code.order()).unwrap(), code);
        }
    }

    #[test]
    fn test_encode_outside_grid() {
        assert!(mesh_code(-1.0, 139.0, MeshOrder::First).is_err());
        assert!(mesh_code(35.0, 99.0, MeshOrder::First).is_err());
        assert!(mesh_code(67.0, 139.0, MeshOrder::First).is_err());
    }

    #[test]
    fn test_parent_truncates() {
        let code = MeshCode::parse("53394611").unwrap();
        assert_eq!(code.parent(MeshOrder::First).unwrap().as_str(), "5339");
        assert_eq!(code.parent(MeshOrder::Second).unwrap().as_str(), "533946");
        assert_eq!(MeshCode::parse("5339").unwrap().parent(MeshOrder::Third), None);
    }

    #[test]
    fn test_ring_is_closed_box() {
        let ring = MeshCode::parse("5340").unwrap().ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[0][0], 140.0);
        assert_eq!(ring[2][0], 141.0);
    }

    #[test]
    fn test_order_serde() {
        assert_eq!(serde_json::to_string(&MeshOrder::Second).unwrap(), "2");
        assert!(serde_json::from_str::<MeshOrder>("4").is_err());
    }
}

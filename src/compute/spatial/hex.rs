//! Hexagonal hierarchical cells backed by `h3o`.
//!
//! A [`HexCell`] has three interchangeable forms: the `h3o::CellIndex`, its
//! `u64` bit pattern, and a lowercase base-16 string without prefix. The
//! string form is always the plain base-16 rendering of the integer form.

use crate::error::{GeobinError, Result};
use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_RESOLUTION: u8 = 15;

/// Validate and convert a hex resolution.
pub fn resolution(res: u8) -> Result<Resolution> {
    Resolution::try_from(res).map_err(|_| GeobinError::InvalidResolution(res))
}

/// A valid hex cell identifier. Ordered by its integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexCell(CellIndex);

impl HexCell {
    fn index(&self) -> CellIndex {
        self.0
    }

    pub fn to_int(&self) -> u64 {
        u64::from(self.0)
    }

    /// Rebuild a cell from its integer form.
    ///
    /// Fails with [`GeobinError::Format`] if `n` is not a valid cell index.
    pub fn from_int(n: u64) -> Result<Self> {
        CellIndex::try_from(n)
            .map(Self::from)
            .map_err(|e| GeobinError::Format(format!("invalid hex cell integer {:#x}: {}", n, e)))
    }

    /// Lowercase base-16 string, no `0x` prefix.
    pub fn to_hex_string(&self) -> String {
        self.index().to_string()
    }

    /// Parse the base-16 string form (case-insensitive).
    pub fn parse_hex(s: &str) -> Result<Self> {
        s.trim()
            .to_ascii_lowercase()
            .parse::<CellIndex>()
            .map(Self::from)
            .map_err(|e| GeobinError::Format(format!("invalid hex cell string {:?}: {}", s, e)))
    }

    pub fn resolution(&self) -> u8 {
        u8::from(self.index().resolution())
    }

    /// Enclosing cell at a coarser resolution. `None` when `res` is finer than
    /// this cell.
    pub fn parent(&self, res: u8) -> Result<Option<HexCell>> {
        let res = resolution(res)?;
        Ok(self.index().parent(res).map(Self::from))
    }

    /// Cell center as (lat, lon) degrees.
    pub fn center(&self) -> (f64, f64) {
        let ll = LatLng::from(self.index());
        (ll.lat(), ll.lng())
    }

    /// Closed boundary ring as `[lon, lat]` pairs.
    pub fn boundary_ring(&self) -> Vec<[f64; 2]> {
        let boundary = self.index().boundary();
        let mut ring: Vec<[f64; 2]> = boundary.iter().map(|ll| [ll.lng(), ll.lat()]).collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }
}

impl From<CellIndex> for HexCell {
    fn from(index: CellIndex) -> Self {
        Self(index)
    }
}

impl PartialOrd for HexCell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexCell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_int().cmp(&other.to_int())
    }
}

impl fmt::Display for HexCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl FromStr for HexCell {
    type Err = GeobinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for HexCell {
    type Error = GeobinError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse_hex(&s)
    }
}

impl From<HexCell> for String {
    fn from(cell: HexCell) -> Self {
        cell.to_hex_string()
    }
}

/// Map a coordinate to the hex cell containing it.
///
/// # Examples
///
/// ```
/// use geobin::compute::spatial::hex::{index_hex, HexCell};
///
/// let cell = index_hex(43.0621, 141.3544, 7).unwrap();
/// assert_eq!(cell.resolution(), 7);
/// assert_eq!(HexCell::from_int(cell.to_int()).unwrap(), cell);
/// assert_eq!(cell.to_hex_string(), format!("{:x}", cell.to_int()));
///
/// assert!(index_hex(43.0, 141.0, 16).is_err());
/// ```
pub fn index_hex(lat: f64, lon: f64, res: u8) -> Result<HexCell> {
    let res = resolution(res)?;
    index_hex_at(lat, lon, res)
}

pub(crate) fn index_hex_at(lat: f64, lon: f64, res: Resolution) -> Result<HexCell> {
    let ll = LatLng::new(lat, lon)
        .map_err(|e| GeobinError::InvalidInput(format!("invalid coordinate ({}, {}): {}", lat, lon, e)))?;
    Ok(HexCell::from(ll.to_cell(res)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [(f64, f64); 5] = [
        (43.0621, 141.3544),
        (35.6812, 139.7671),
        (26.2124, 127.6809),
        (-33.8688, 151.2093),
        (0.0, 0.0),
    ];

    #[test]
    fn test_int_round_trip_all_resolutions() {
        for (lat, lon) in SAMPLES {
            for res in 0..=MAX_RESOLUTION {
                let cell = index_hex(lat, lon, res).unwrap();
                assert_eq!(cell.resolution(), res);
                assert_eq!(HexCell::from_int(cell.to_int()).unwrap(), cell);
            }
        }
    }

    #[test]
    fn test_hex_string_matches_generic_base16() {
        for (lat, lon) in SAMPLES {
            for res in 0..=MAX_RESOLUTION {
                let cell = index_hex(lat, lon, res).unwrap();
                let generic = format!("{:x}", cell.to_int());
                assert!(cell.to_hex_string().eq_ignore_ascii_case(&generic));
                assert!(!cell.to_hex_string().starts_with("0x"));
                assert_eq!(HexCell::parse_hex(&generic.to_uppercase()).unwrap(), cell);
                assert_eq!(u64::from_str_radix(&cell.to_hex_string(), 16).unwrap(), cell.to_int());
            }
        }
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(matches!(
            index_hex(35.0, 139.0, 16),
            Err(GeobinError::InvalidResolution(16))
        ));
    }

    #[test]
    fn test_invalid_integer_and_string() {
        assert!(matches!(HexCell::from_int(0), Err(GeobinError::Format(_))));
        assert!(matches!(HexCell::parse_hex("not-hex"), Err(GeobinError::Format(_))));
    }

    #[test]
    fn test_parent_nests() {
        let fine = index_hex(35.6812, 139.7671, 9).unwrap();
        let coarse = fine.parent(5).unwrap().unwrap();
        assert_eq!(coarse.resolution(), 5);
        assert_eq!(HexCell::parse_hex(&coarse.to_hex_string()).unwrap(), coarse);
        assert_eq!(coarse.parent(5).unwrap(), Some(coarse));
        assert_eq!(fine.parent(9).unwrap(), Some(fine));
        assert_eq!(coarse.parent(9).unwrap(), None);
    }

    #[test]
    fn test_boundary_is_closed_ring() {
        let cell = index_hex(35.6812, 139.7671, 6).unwrap();
        let ring = cell.boundary_ring();
        assert!(ring.len() >= 7);
        assert_eq!(ring.first(), ring.last());

        let (lat, lon) = cell.center();
        assert!((lat - 35.6812).abs() < 0.2);
        assert!((lon - 139.7671).abs() < 0.2);
    }

    #[test]
    fn test_serde_as_string() {
        let cell = index_hex(35.6812, 139.7671, 6).unwrap();
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, format!("\"{}\"", cell.to_hex_string()));
        let back: HexCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }
}

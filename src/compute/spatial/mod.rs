//! Spatial indexing: mapping coordinates to discrete cells.

pub mod hex;
pub mod mesh;

use crate::config::Indexing;
use crate::error::{GeobinError, Result};
use geobin_types::point::Point;
use h3o::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use hex::{HexCell, MAX_RESOLUTION, index_hex};
pub use mesh::{MeshCode, MeshOrder, index_mesh, mesh_code};

/// Identifier of a spatial cell, in one of the two supported encodings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellId {
    Mesh(MeshCode),
    Hex(HexCell),
}

impl CellId {
    /// Parse either encoding: 4/6/8 digit strings are meshcodes, anything
    /// else is tried as a hex cell.
    pub fn parse(s: &str) -> Result<Self> {
        if matches!(s.len(), 4 | 6 | 8) && s.bytes().all(|b| b.is_ascii_digit()) {
            return MeshCode::parse(s).map(CellId::Mesh);
        }
        HexCell::parse_hex(s).map(CellId::Hex)
    }

    /// Closed polygon ring of `[lon, lat]` pairs.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        match self {
            CellId::Hex(h) => h.boundary_ring(),
            CellId::Mesh(m) => m.ring(),
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellId::Hex(h) => fmt::Display::fmt(h, f),
            CellId::Mesh(m) => fmt::Display::fmt(m, f),
        }
    }
}

impl From<HexCell> for CellId {
    fn from(cell: HexCell) -> Self {
        CellId::Hex(cell)
    }
}

impl From<MeshCode> for CellId {
    fn from(code: MeshCode) -> Self {
        CellId::Mesh(code)
    }
}

/// Maps points to cells under one validated [`Indexing`] configuration.
///
/// The resolution is checked once at construction rather than per point.
#[derive(Debug, Clone, Copy)]
pub enum Indexer {
    Hex(Resolution),
    Mesh(MeshOrder),
}

impl Indexer {
    pub fn new(indexing: Indexing) -> Result<Self> {
        match indexing {
            Indexing::Hex { resolution } => Ok(Indexer::Hex(hex::resolution(resolution)?)),
            Indexing::Mesh { order } => Ok(Indexer::Mesh(order)),
        }
    }

    pub fn index(&self, lat: f64, lon: f64) -> Result<CellId> {
        match self {
            Indexer::Hex(res) => hex::index_hex_at(lat, lon, *res).map(CellId::Hex),
            Indexer::Mesh(order) => mesh_code(lat, lon, *order).map(CellId::Mesh),
        }
    }

    /// Tag every point with its cell, preserving input order.
    pub fn tag<'a>(&self, points: &'a [Point]) -> Result<Vec<(CellId, &'a Point)>> {
        points
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                self.index(p.lat(), p.lon())
                    .map(|cell| (cell, p))
                    .map_err(|e| match e {
                        GeobinError::InvalidInput(msg) => {
                            GeobinError::InvalidInput(format!("point {}: {}", idx, msg))
                        }
                        other => other,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_parse() {
        assert!(matches!(CellId::parse("5340").unwrap(), CellId::Mesh(_)));
        let hex = index_hex(35.0, 139.0, 5).unwrap();
        assert_eq!(CellId::parse(&hex.to_hex_string()).unwrap(), CellId::Hex(hex));
        assert!(CellId::parse("53401").is_err());
    }

    #[test]
    fn test_cell_id_serde_untagged() {
        let ids = vec![
            CellId::Mesh(MeshCode::parse("533946").unwrap()),
            CellId::Hex(index_hex(35.0, 139.0, 5).unwrap()),
        ];
        let json = serde_json::to_string(&ids).unwrap();
        let back: Vec<CellId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ids);
    }

    #[test]
    fn test_indexer_rejects_resolution() {
        assert!(matches!(
            Indexer::new(Indexing::Hex { resolution: 20 }),
            Err(GeobinError::InvalidResolution(20))
        ));
    }

    #[test]
    fn test_tag_mesh_points() {
        let points = vec![
            Point::bare(35.681236, 139.767125),
            Point::bare(35.6813, 139.7672),
            Point::bare(43.0621, 141.3544),
        ];
        let indexer = Indexer::new(Indexing::Mesh {
            order: MeshOrder::First,
        })
        .unwrap();
        let tagged = indexer.tag(&points).unwrap();
        assert_eq!(tagged[0].0, tagged[1].0);
        assert_ne!(tagged[0].0, tagged[2].0);
        assert_eq!(tagged[0].0.to_string(), "5339");
    }

    #[test]
    fn test_tag_reports_point_outside_grid() {
        let points = vec![Point::bare(35.0, 139.0), Point::bare(-10.0, 20.0)];
        let indexer = Indexer::new(Indexing::Mesh {
            order: MeshOrder::Second,
        })
        .unwrap();
        match indexer.tag(&points) {
            Err(GeobinError::InvalidInput(msg)) => assert!(msg.starts_with("point 1")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}

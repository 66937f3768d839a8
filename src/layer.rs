//! Assembly of colored cells into renderable layer records.
//!
//! The [`Layer`] is the hand-off to an external map renderer: one record per
//! cell carrying geometry, fill and line colors, an elevation and a display
//! string for tooltips. Geometry is either a hex id string or an explicit
//! closed ring of `[lon, lat]` pairs.

use crate::color::ColoredCell;
use crate::compute::spatial::CellId;
use crate::error::{GeobinError, Result};
use geobin_types::color::Rgb;
use serde::{Deserialize, Serialize};

/// Base map style; decides the default cell outline color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStyle {
    Dark,
    #[default]
    Light,
}

impl MapStyle {
    pub const fn line_color(self) -> Rgb {
        match self {
            // lemonchiffon
            MapStyle::Dark => Rgb::new(255, 250, 205),
            // aquamarine
            MapStyle::Light => Rgb::new(127, 255, 212),
        }
    }
}

/// Rendering hints applied uniformly to every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderHints {
    #[serde(default = "RenderHints::default_elevation_scale")]
    pub elevation_scale: f64,

    /// Elevations are clamped into `[min, max]`.
    #[serde(default = "RenderHints::default_elevation_range")]
    pub elevation_range: [f64; 2],

    #[serde(default = "RenderHints::default_opacity")]
    pub opacity: f64,

    /// Explicit outline color; falls back to the map style's color.
    #[serde(default)]
    pub line_color: Option<Rgb>,

    #[serde(default)]
    pub map_style: MapStyle,

    /// Emit hex cells as boundary polygons instead of ids.
    #[serde(default)]
    pub hex_polygons: bool,

    #[serde(default)]
    pub extruded: bool,
}

impl RenderHints {
    const fn default_elevation_scale() -> f64 {
        50.0
    }

    const fn default_elevation_range() -> [f64; 2] {
        [0.0, 3000.0]
    }

    const fn default_opacity() -> f64 {
        0.5
    }

    pub fn with_elevation_scale(mut self, scale: f64) -> Self {
        self.elevation_scale = scale;
        self
    }

    pub fn with_elevation_range(mut self, min: f64, max: f64) -> Self {
        self.elevation_range = [min, max];
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_line_color(mut self, color: Rgb) -> Self {
        self.line_color = Some(color);
        self
    }

    pub fn with_map_style(mut self, style: MapStyle) -> Self {
        self.map_style = style;
        self
    }

    pub fn with_hex_polygons(mut self, enabled: bool) -> Self {
        self.hex_polygons = enabled;
        self
    }

    pub fn with_extruded(mut self, extruded: bool) -> Self {
        self.extruded = extruded;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.elevation_scale.is_finite() || self.elevation_scale < 0.0 {
            return Err(GeobinError::Config(format!(
                "elevation scale must be finite and >= 0, got {}",
                self.elevation_scale
            )));
        }
        let [min, max] = self.elevation_range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(GeobinError::Config(format!(
                "elevation range must be finite with min <= max, got [{}, {}]",
                min, max
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(GeobinError::Config(format!(
                "opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Resolved outline color.
    pub fn line_color(&self) -> Rgb {
        self.line_color.unwrap_or(self.map_style.line_color())
    }

    /// Aggregate scaled linearly and clamped into the elevation range.
    pub fn elevation(&self, value: f64) -> f64 {
        let [min, max] = self.elevation_range;
        let scaled = value * self.elevation_scale;
        if scaled.is_nan() {
            return min;
        }
        scaled.clamp(min, max)
    }
}

impl Default for RenderHints {
    fn default() -> Self {
        Self {
            elevation_scale: Self::default_elevation_scale(),
            elevation_range: Self::default_elevation_range(),
            opacity: Self::default_opacity(),
            line_color: None,
            map_style: MapStyle::default(),
            hex_polygons: false,
            extruded: false,
        }
    }
}

/// Requested geometry form for the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEncoding {
    /// Hex cells by id string.
    HexagonId,
    /// Hex cells as boundary rings.
    HexagonBoundary,
    /// Mesh cells as bounding rectangles.
    MeshRectangle,
}

impl GeometryEncoding {
    fn accepts(self, cell: &CellId) -> bool {
        matches!(
            (self, cell),
            (GeometryEncoding::HexagonId | GeometryEncoding::HexagonBoundary, CellId::Hex(_))
                | (GeometryEncoding::MeshRectangle, CellId::Mesh(_))
        )
    }

    pub fn layer_kind(self) -> LayerKind {
        match self {
            GeometryEncoding::HexagonId => LayerKind::H3HexagonLayer,
            GeometryEncoding::HexagonBoundary | GeometryEncoding::MeshRectangle => LayerKind::PolygonLayer,
        }
    }
}

/// Cell geometry on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellGeometry {
    Hexagon(String),
    Polygon(Vec<[f64; 2]>),
}

/// One renderable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub geometry: CellGeometry,
    pub fill_color: Rgb,
    pub line_color: Rgb,
    pub elevation: f64,
    /// Aggregate formatted for tooltips.
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    H3HexagonLayer,
    PolygonLayer,
}

/// Layer description handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub kind: LayerKind,
    pub opacity: f64,
    pub extruded: bool,
    /// Tooltip template referencing the `display` field.
    pub tooltip: String,
    pub records: Vec<LayerRecord>,
}

impl Layer {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Export as a GeoJSON feature collection with style properties.
    /// Hex ids are expanded into boundary polygons.
    #[cfg(feature = "geojson")]
    pub fn to_feature_collection(&self) -> Result<geojson::FeatureCollection> {
        use crate::compute::spatial::HexCell;
        use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

        let features = self
            .records
            .iter()
            .map(|record| {
                let ring = match &record.geometry {
                    CellGeometry::Hexagon(id) => HexCell::parse_hex(id)?.boundary_ring(),
                    CellGeometry::Polygon(ring) => ring.clone(),
                };
                let positions = ring.iter().map(|[lon, lat]| vec![*lon, *lat]).collect();

                let mut properties = JsonObject::new();
                properties.insert("fill_color".into(), record.fill_color.to_hex().into());
                properties.insert("line_color".into(), record.line_color.to_hex().into());
                properties.insert("fill_opacity".into(), self.opacity.into());
                properties.insert("elevation".into(), record.elevation.into());
                properties.insert("display".into(), record.display.clone().into());

                Ok(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![positions]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn display_value(value: f64) -> String {
    // Aggregates are integral in both modes; `{}` renders 5.0 as "5".
    format!("{}", value)
}

/// Turn colored cells into a layer, preserving their order.
///
/// Every cell must match the requested encoding (hex cells for the hexagon
/// encodings, meshcodes for rectangles), otherwise the call fails with
/// [`GeobinError::Config`] and nothing is produced.
pub fn assemble(
    cells: &[ColoredCell],
    encoding: GeometryEncoding,
    hints: &RenderHints,
    label: &str,
) -> Result<Layer> {
    hints.validate()?;
    let line_color = hints.line_color();

    let records = cells
        .iter()
        .map(|c| {
            if !encoding.accepts(&c.cell) {
                return Err(GeobinError::Config(format!(
                    "cell {} cannot be rendered with {:?}",
                    c.cell, encoding
                )));
            }
            let geometry = match (&c.cell, encoding) {
                (CellId::Hex(h), GeometryEncoding::HexagonId) => CellGeometry::Hexagon(h.to_hex_string()),
                (cell, _) => CellGeometry::Polygon(cell.ring()),
            };
            Ok(LayerRecord {
                geometry,
                fill_color: c.color,
                line_color,
                elevation: hints.elevation(c.value),
                display: display_value(c.value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Layer {
        kind: encoding.layer_kind(),
        opacity: hints.opacity,
        extruded: hints.extruded,
        tooltip: format!("{}: {{display}}", label),
        records,
    })
}

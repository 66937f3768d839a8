//! Pipeline configuration.
//!
//! A [`Config`] fully determines a pipeline run together with the input
//! records. It can be built in code with the `with_*` methods, or loaded from
//! JSON (and TOML with the `toml` feature).

use crate::aggregate::Aggregation;
use crate::color::{Interpolation, Normalization};
use crate::compute::spatial::mesh::MeshOrder;
use crate::compute::spatial::hex::MAX_RESOLUTION;
use crate::error::{GeobinError, Result};
use crate::layer::RenderHints;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How points are mapped to cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indexing {
    /// Hierarchical hex cells at the given resolution (0..=15).
    Hex { resolution: u8 },
    /// Japanese national grid meshes at order 1, 2 or 3.
    Mesh { order: MeshOrder },
}

impl Default for Indexing {
    fn default() -> Self {
        Indexing::Hex {
            resolution: Config::default_resolution(),
        }
    }
}

/// Optional heat layer built alongside the cell layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatmapConfig {
    /// Field used as heat weight; every point weighs 1.0 when unset.
    #[serde(default)]
    pub weight_field: Option<String>,
}

/// Binning pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_lat_column")]
    pub lat_column: String,

    #[serde(default = "Config::default_lon_column")]
    pub lon_column: String,

    /// Columns the caller declares as numeric. When non-empty, aggregation
    /// and heat weight fields must be listed here.
    #[serde(default)]
    pub numeric_fields: Vec<String>,

    #[serde(default)]
    pub indexing: Indexing,

    #[serde(default)]
    pub aggregation: Aggregation,

    /// Color scheme name, resolved against the pipeline's scheme registry.
    #[serde(default = "Config::default_scheme")]
    pub scheme: String,

    /// Overrides the scheme's own normalization when set.
    #[serde(default)]
    pub normalization: Option<Normalization>,

    #[serde(default)]
    pub interpolation: Interpolation,

    #[serde(default)]
    pub render: RenderHints,

    #[serde(default)]
    pub heatmap: Option<HeatmapConfig>,

    #[serde(default = "Config::default_zoom")]
    pub zoom: u8,
}

impl Config {
    fn default_lat_column() -> String {
        "lat".to_string()
    }

    fn default_lon_column() -> String {
        "lon".to_string()
    }

    fn default_scheme() -> String {
        "Contrast".to_string()
    }

    const fn default_resolution() -> u8 {
        5
    }

    const fn default_zoom() -> u8 {
        6
    }

    pub fn with_columns(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.lat_column = lat.into();
        self.lon_column = lon.into();
        self
    }

    pub fn with_numeric_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_indexing(mut self, indexing: Indexing) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn with_hex_resolution(mut self, resolution: u8) -> Self {
        if resolution > 12 {
            log::warn!(
                "Hex resolution {} produces very small cells; large inputs will yield \
                almost one cell per point.",
                resolution
            );
        }
        self.indexing = Indexing::Hex { resolution };
        self
    }

    pub fn with_mesh_order(mut self, order: MeshOrder) -> Self {
        self.indexing = Indexing::Mesh { order };
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = Some(normalization);
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_render(mut self, render: RenderHints) -> Self {
        self.render = render;
        self
    }

    pub fn with_heatmap(mut self, heatmap: HeatmapConfig) -> Self {
        self.heatmap = Some(heatmap);
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Check the configuration for errors that can be detected before any
    /// data is seen. Scheme names are resolved later, when a pipeline is
    /// built against a scheme registry.
    pub fn validate(&self) -> Result<()> {
        if self.lat_column.is_empty() || self.lon_column.is_empty() {
            return Err(GeobinError::Config(
                "coordinate column names must not be empty".to_string(),
            ));
        }

        if self.lat_column == self.lon_column {
            return Err(GeobinError::Config(format!(
                "latitude and longitude columns must differ, both are {:?}",
                self.lat_column
            )));
        }

        if let Indexing::Hex { resolution } = self.indexing
            && resolution > MAX_RESOLUTION
        {
            return Err(GeobinError::InvalidResolution(resolution));
        }

        if let Aggregation::Mean { field } = &self.aggregation {
            self.check_declared(field, "mean aggregation")?;
        }

        if let Some(HeatmapConfig {
            weight_field: Some(field),
        }) = &self.heatmap
        {
            self.check_declared(field, "heat weight")?;
        }

        if self.scheme.is_empty() {
            return Err(GeobinError::Config("color scheme name must not be empty".to_string()));
        }

        self.render.validate()
    }

    fn check_declared(&self, field: &str, purpose: &str) -> Result<()> {
        if !self.numeric_fields.is_empty() && !self.numeric_fields.iter().any(|f| f == field) {
            return Err(GeobinError::Config(format!(
                "{} field {:?} is not a declared numeric field",
                purpose, field
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a configuration file, choosing the format by extension
    /// (`.toml` requires the `toml` feature; anything else is read as JSON).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        #[cfg(feature = "toml")]
        if path.extension().is_some_and(|ext| ext == "toml") {
            return Self::from_toml(&contents);
        }

        Self::from_json(&contents)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lat_column: Self::default_lat_column(),
            lon_column: Self::default_lon_column(),
            numeric_fields: Vec::new(),
            indexing: Indexing::default(),
            aggregation: Aggregation::default(),
            scheme: Self::default_scheme(),
            normalization: None,
            interpolation: Interpolation::default(),
            render: RenderHints::default(),
            heatmap: None,
            zoom: Self::default_zoom(),
        }
    }
}

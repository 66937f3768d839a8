//! Pipeline builder for flexible configuration
//!
//! Collects a [`Config`] and any custom color schemes, then validates
//! everything at once in [`PipelineBuilder::build`].

use crate::aggregate::Aggregation;
use crate::color::{ColorScheme, Interpolation, Normalization, SchemeRegistry};
use crate::compute::spatial::MeshOrder;
use crate::config::{Config, HeatmapConfig, Indexing};
use crate::error::Result;
use crate::layer::RenderHints;
use crate::pipeline::Pipeline;
use std::path::Path;

/// Builder for [`Pipeline`]s.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    config: Config,
    registry: SchemeRegistry,
}

impl PipelineBuilder {
    /// Create a new builder with the default configuration and built-in schemes.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            registry: SchemeRegistry::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON (or, with the `toml` feature, TOML) file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.config = Config::from_file(path)?;
        Ok(self)
    }

    pub fn columns(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.config = self.config.with_columns(lat, lon);
        self
    }

    pub fn hex(mut self, resolution: u8) -> Self {
        self.config = self.config.with_hex_resolution(resolution);
        self
    }

    pub fn mesh(mut self, order: MeshOrder) -> Self {
        self.config = self.config.with_indexing(Indexing::Mesh { order });
        self
    }

    pub fn count(mut self) -> Self {
        self.config = self.config.with_aggregation(Aggregation::Count);
        self
    }

    pub fn mean(mut self, field: impl Into<String>) -> Self {
        self.config = self
            .config
            .with_aggregation(Aggregation::Mean { field: field.into() });
        self
    }

    pub fn scheme(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_scheme(name);
        self
    }

    /// Register a custom scheme and select it.
    pub fn custom_scheme(mut self, scheme: ColorScheme) -> Self {
        self.config = self.config.with_scheme(scheme.name());
        self.registry.register(scheme);
        self
    }

    pub fn normalization(mut self, normalization: Normalization) -> Self {
        self.config = self.config.with_normalization(normalization);
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.config = self.config.with_interpolation(interpolation);
        self
    }

    pub fn render(mut self, hints: RenderHints) -> Self {
        self.config = self.config.with_render(hints);
        self
    }

    pub fn heatmap(mut self, weight_field: Option<&str>) -> Self {
        self.config = self.config.with_heatmap(HeatmapConfig {
            weight_field: weight_field.map(str::to_string),
        });
        self
    }

    /// Validate the configuration and resolve the color scheme.
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::with_registry(self.config, &self.registry)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! End-to-end binning: records -> points -> cells -> aggregates -> colors -> layer.
//!
//! A [`Pipeline`] is immutable after construction and holds no per-call
//! state; the only shared mutable state is an optional [`RampCache`] owned by
//! the caller.

use crate::aggregate::{Aggregates, aggregate};
use crate::color::{ColorScheme, RampCache, SchemeRegistry, build_ramp, colorize};
use crate::compute::spatial::Indexer;
use crate::compute::validation::filter_points;
use crate::config::{Config, Indexing};
use crate::error::{GeobinError, Result};
use crate::heatmap::{HeatPoint, heat_points};
use crate::layer::{GeometryEncoding, Layer, assemble};
use geobin_types::record::RecordTable;
use geobin_types::view::ViewState;
use serde::{Deserialize, Serialize};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub layer: Layer,
    /// Camera centred on the mean of the valid points.
    pub view: ViewState,
    /// Records dropped for missing or invalid coordinates.
    pub dropped: usize,
    /// Largest cell aggregate.
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat: Option<Vec<HeatPoint>>,
}

impl PipelineOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A validated, ready-to-run binning configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    scheme: ColorScheme,
    indexer: Indexer,
}

impl Pipeline {
    /// Build a pipeline with the built-in color schemes.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, &SchemeRegistry::new())
    }

    /// Build a pipeline resolving the scheme from `registry`.
    pub fn with_registry(config: Config, registry: &SchemeRegistry) -> Result<Self> {
        config.validate()?;
        let scheme = registry.get(&config.scheme)?.clone();
        if let Some(normalization) = &config.normalization {
            normalization.validate(scheme.len())?;
        }
        let indexer = Indexer::new(config.indexing)?;

        Ok(Self {
            config,
            scheme,
            indexer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    fn encoding(&self) -> GeometryEncoding {
        match self.config.indexing {
            Indexing::Hex { .. } if self.config.render.hex_polygons => GeometryEncoding::HexagonBoundary,
            Indexing::Hex { .. } => GeometryEncoding::HexagonId,
            Indexing::Mesh { .. } => GeometryEncoding::MeshRectangle,
        }
    }

    /// Run the whole pipeline over `table`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geobin::{Config, Pipeline};
    /// use geobin_types::record::RecordTable;
    ///
    /// let table = RecordTable::from_rows(
    ///     vec!["lat".into(), "lon".into()],
    ///     vec![
    ///         vec![35.6812.into(), 139.7671.into()],
    ///         vec![35.6813.into(), 139.7672.into()],
    ///         vec![43.0621.into(), 141.3544.into()],
    ///     ],
    /// );
    ///
    /// let pipeline = Pipeline::new(Config::default().with_hex_resolution(5))?;
    /// let output = pipeline.run(&table, None)?;
    /// assert_eq!(output.layer.records.len(), 2);
    /// assert_eq!(output.max, 2.0);
    /// # Ok::<(), geobin::GeobinError>(())
    /// ```
    pub fn run(&self, table: &RecordTable, cache: Option<&RampCache>) -> Result<PipelineOutput> {
        let filtered = filter_points(table, &self.config.lat_column, &self.config.lon_column)?;
        let center = filtered.centroid()?;
        let view = ViewState::new(center.y(), center.x(), self.config.zoom);

        let tagged = self.indexer.tag(&filtered.points)?;
        let aggregates = aggregate(&tagged, &self.config.aggregation)?;
        let layer = self.render(&aggregates, cache)?;
        log::info!(
            "binned {} points into {} cells ({} dropped, max {})",
            filtered.points.len(),
            aggregates.len(),
            filtered.dropped,
            aggregates.max()
        );

        let heat = match &self.config.heatmap {
            Some(heat) => Some(heat_points(&filtered.points, heat.weight_field.as_deref())?),
            None => None,
        };

        Ok(PipelineOutput {
            layer,
            view,
            dropped: filtered.dropped,
            max: aggregates.max(),
            heat,
        })
    }

    /// Color and assemble cells that were aggregated elsewhere (for example
    /// rows that already carry a meshcode and a value).
    pub fn render(&self, aggregates: &Aggregates, cache: Option<&RampCache>) -> Result<Layer> {
        if aggregates.is_empty() {
            return Err(GeobinError::EmptyInput { dropped: 0 });
        }

        let ramp = build_ramp(
            aggregates,
            &self.scheme,
            self.config.normalization.as_ref(),
            self.config.interpolation,
            cache,
        )?;
        let colored = colorize(aggregates, &ramp);
        assemble(
            &colored,
            self.encoding(),
            &self.config.render,
            self.config.aggregation.label(),
        )
    }
}

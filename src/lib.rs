//! Spatial binning and choropleth coloring for point datasets.
//!
//! Raw records flow through five stages: coordinate filtering, cell
//! indexing (hex cells or Japanese grid meshes), per-cell aggregation,
//! color ramp evaluation and layer assembly. The result is a list of
//! renderable cell records for an external map renderer.
//!
//! ```rust
//! use geobin::{MeshOrder, PipelineBuilder};
//! use geobin_types::record::RecordTable;
//!
//! let table = RecordTable::from_rows(
//!     vec!["lat".into(), "lon".into()],
//!     vec![
//!         vec![35.681236.into(), 139.767125.into()],
//!         vec![34.702485.into(), 135.495951.into()],
//!     ],
//! );
//!
//! let pipeline = PipelineBuilder::new()
//!     .mesh(MeshOrder::First)
//!     .scheme("Snowflake")
//!     .build()?;
//! let output = pipeline.run(&table, None)?;
//! assert_eq!(output.layer.records.len(), 2);
//! # Ok::<(), geobin::GeobinError>(())
//! ```

pub mod aggregate;
pub mod builder;
pub mod color;
pub mod compute;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod layer;
pub mod pipeline;

pub use builder::PipelineBuilder;
pub use config::{Config, HeatmapConfig, Indexing};
pub use error::{GeobinError, Result};
pub use pipeline::{Pipeline, PipelineOutput};

pub use aggregate::{Aggregates, Aggregation, aggregate};

pub use color::{
    ColorRamp, ColorScheme, ColorStop, ColoredCell, Interpolation, Normalization, RampCache,
    SchemeRegistry, build_ramp, colorize, quantiles,
};

pub use compute::spatial::{
    CellId, HexCell, Indexer, MeshCode, MeshOrder, index_hex, index_mesh, mesh_code,
};
pub use compute::validation::{FilterOutcome, centroid, filter_points};

pub use heatmap::{HeatPoint, heat_points};

pub use layer::{
    CellGeometry, GeometryEncoding, Layer, LayerKind, LayerRecord, MapStyle, RenderHints,
    assemble,
};

pub use geobin_types::{color::Rgb, point::Point, record::FieldValue, record::RecordTable, view::ViewState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{GeobinError, Pipeline, PipelineBuilder, Result};

    pub use crate::{Aggregation, Config, Indexing, MeshOrder};

    pub use crate::{ColorScheme, Interpolation, Normalization, RampCache};

    pub use crate::{MapStyle, RenderHints};

    pub use geobin_types::record::{FieldValue, RecordTable};
}

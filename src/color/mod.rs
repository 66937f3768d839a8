//! Choropleth coloring: schemes, ramps and per-cell color assignment.

pub mod cache;
pub mod ramp;
pub mod scheme;

pub use cache::RampCache;
pub use ramp::{ColorRamp, ColorStop, Interpolation, Normalization, quantiles};
pub use scheme::{ColorScheme, SchemeRegistry};

use crate::aggregate::Aggregates;
use crate::compute::spatial::CellId;
use crate::error::Result;
use geobin_types::color::Rgb;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A cell with its aggregate and assigned color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredCell {
    pub cell: CellId,
    pub value: f64,
    pub color: Rgb,
}

/// Build the ramp for `aggregates` under a scheme.
///
/// `normalization` overrides the scheme's default when given. With a cache
/// the ramp is reused for repeated calls on the same value multiset.
pub fn build_ramp(
    aggregates: &Aggregates,
    scheme: &ColorScheme,
    normalization: Option<&Normalization>,
    interpolation: Interpolation,
    cache: Option<&RampCache>,
) -> Result<Arc<ColorRamp>> {
    let normalization = normalization.unwrap_or_else(|| scheme.normalization());
    normalization.validate(scheme.len())?;

    let values: Vec<f64> = aggregates.iter().map(|(_, v)| v).collect();
    let build = || {
        let points = normalization.control_points(scheme.fractions(), &values)?;
        ColorRamp::from_parts(&points, scheme.colors(), interpolation)
    };

    match cache {
        Some(cache) => cache.get_or_build(&values, scheme, normalization, interpolation, build),
        None => build().map(Arc::new),
    }
}

/// Evaluate `ramp` at every cell's aggregate, in cell order.
pub fn colorize(aggregates: &Aggregates, ramp: &ColorRamp) -> Vec<ColoredCell> {
    aggregates
        .iter()
        .map(|(cell, value)| ColoredCell {
            cell: cell.clone(),
            value,
            color: ramp.evaluate(value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::spatial::MeshCode;

    fn aggregates(values: &[(&str, f64)]) -> Aggregates {
        Aggregates::from_cells(
            values
                .iter()
                .map(|(c, v)| (CellId::Mesh(MeshCode::parse(c).unwrap()), *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_quantile_extremes_get_end_colors() {
        let agg = aggregates(&[("5339", 1.0), ("5340", 4.0), ("5440", 10.0), ("5441", 7.0)]);
        let scheme = ColorScheme::snowflake();
        let ramp = build_ramp(&agg, &scheme, None, Interpolation::Linear, None).unwrap();
        let colored = colorize(&agg, &ramp);

        let min = colored.iter().find(|c| c.value == 1.0).unwrap();
        let max = colored.iter().find(|c| c.value == 10.0).unwrap();
        assert_eq!(min.color, scheme.colors()[0]);
        assert_eq!(max.color, scheme.colors()[3]);
    }

    #[test]
    fn test_blue_red_scales_by_max() {
        let agg = aggregates(&[("5339", 0.0), ("5340", 10.0)]);
        let ramp = build_ramp(&agg, &ColorScheme::blue_red(), None, Interpolation::Linear, None).unwrap();
        assert_eq!(ramp.domain(), (0.0, 10.0));
        assert_eq!(ramp.evaluate(10.0), Rgb::new(255, 0, 0));
        assert_eq!(ramp.evaluate(0.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_override_with_fixed_index() {
        let agg = aggregates(&[("5339", 1.0), ("5340", 3.0)]);
        let n = Normalization::Fixed {
            vmin: 0.0,
            vmax: 5.0,
            index: vec![0.0, 1.0, 2.0, 5.0],
        };
        let ramp = build_ramp(&agg, &ColorScheme::snowflake(), Some(&n), Interpolation::Step, None).unwrap();
        assert_eq!(ramp.evaluate(1.5), ColorScheme::snowflake().colors()[1]);
    }

    #[test]
    fn test_cached_build_is_identical() {
        let agg = aggregates(&[("5339", 1.0), ("5340", 3.0), ("5440", 2.0)]);
        let cache = RampCache::new();
        let scheme = ColorScheme::contrast();
        let a = build_ramp(&agg, &scheme, None, Interpolation::Linear, Some(&cache)).unwrap();
        let b = build_ramp(&agg, &scheme, None, Interpolation::Linear, Some(&cache)).unwrap();
        let uncached = build_ramp(&agg, &scheme, None, Interpolation::Linear, None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *uncached);
    }
}

//! Per-cell aggregation of tagged points.

use crate::compute::spatial::CellId;
use crate::error::{GeobinError, Result};
use geobin_types::point::Point;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What scalar summarizes the points of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Aggregation {
    /// Number of points in the cell.
    #[default]
    Count,
    /// Mean of a numeric field, truncated toward zero.
    Mean { field: String },
}

impl Aggregation {
    /// Tooltip label for the aggregate value.
    pub fn label(&self) -> &str {
        match self {
            Aggregation::Count => "Count",
            Aggregation::Mean { field } => field,
        }
    }
}

/// Aggregated value per cell, ordered by cell id, with the maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    values: BTreeMap<CellId, f64>,
    max: f64,
}

impl Aggregates {
    /// Build from already-aggregated cells, e.g. rows that carry their own
    /// meshcode and value. Later duplicates replace earlier ones.
    ///
    /// Fails with [`GeobinError::InvalidInput`] naming the first cell whose
    /// value is NaN or infinite.
    pub fn from_cells<I>(cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CellId, f64)>,
    {
        let mut values = BTreeMap::new();
        for (cell, value) in cells {
            if !value.is_finite() {
                return Err(GeobinError::InvalidInput(format!(
                    "cell {} has non-finite value {}",
                    cell, value
                )));
            }
            values.insert(cell, value);
        }
        let max = values.values().copied().fold(0.0, f64::max);
        Ok(Self { values, max })
    }

    pub fn values(&self) -> &BTreeMap<CellId, f64> {
        &self.values
    }

    pub fn get(&self, cell: &CellId) -> Option<f64> {
        self.values.get(cell).copied()
    }

    /// Largest aggregate across all cells, `0.0` when there are none.
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellId, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    sum: f64,
}

/// Group tagged points by cell and reduce each group to one scalar.
///
/// In mean mode every point must carry a numeric value for the target
/// field; the first point lacking one fails the whole aggregation with
/// [`GeobinError::UnknownField`].
///
/// # Examples
///
/// ```
/// use geobin::aggregate::{aggregate, Aggregation};
/// use geobin::compute::spatial::{CellId, MeshCode};
/// use geobin_types::point::Point;
///
/// let a = CellId::from(MeshCode::parse("5339").unwrap());
/// let p = Point::bare(35.7, 139.7);
/// let tagged = vec![(a.clone(), &p), (a.clone(), &p)];
///
/// let agg = aggregate(&tagged, &Aggregation::Count).unwrap();
/// assert_eq!(agg.get(&a), Some(2.0));
/// assert_eq!(agg.max(), 2.0);
/// ```
pub fn aggregate(tagged: &[(CellId, &Point)], mode: &Aggregation) -> Result<Aggregates> {
    let mut groups: FxHashMap<&CellId, Accumulator> = FxHashMap::default();

    for (idx, (cell, point)) in tagged.iter().enumerate() {
        let acc = groups.entry(cell).or_default();
        acc.count += 1;

        if let Aggregation::Mean { field } = mode {
            let value = point
                .field_f64(field)
                .ok_or_else(|| GeobinError::UnknownField {
                    field: field.clone(),
                    index: idx,
                })?;
            acc.sum += value;
        }
    }

    let values: BTreeMap<CellId, f64> = groups
        .into_iter()
        .map(|(cell, acc)| {
            let value = match mode {
                Aggregation::Count => acc.count as f64,
                Aggregation::Mean { field } => {
                    if !acc.sum.is_finite() {
                        return Err(GeobinError::InvalidInput(format!(
                            "sum of {:?} overflows in cell {}",
                            field, cell
                        )));
                    }
                    (acc.sum / acc.count as f64).trunc()
                }
            };
            Ok((cell.clone(), value))
        })
        .collect::<Result<_>>()?;

    let max = values.values().copied().fold(0.0, f64::max);

    log::debug!(
        "aggregated {} points into {} cells (max {})",
        tagged.len(),
        values.len(),
        max
    );

    Ok(Aggregates { values, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::spatial::MeshCode;
    use geobin_types::record::FieldValue;
    use std::collections::BTreeMap;

    fn cell(code: &str) -> CellId {
        CellId::Mesh(MeshCode::parse(code).unwrap())
    }

    fn with_value(v: f64) -> Point {
        let mut fields = BTreeMap::new();
        fields.insert("v".to_string(), FieldValue::from(v));
        Point::new(35.0, 139.0, fields)
    }

    #[test]
    fn test_count_mode() {
        let p = Point::bare(35.0, 139.0);
        let (a, b) = (cell("5339"), cell("5340"));
        let mut tagged = vec![(a.clone(), &p); 5];
        tagged.extend(vec![(b.clone(), &p); 3]);

        let agg = aggregate(&tagged, &Aggregation::Count).unwrap();
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get(&a), Some(5.0));
        assert_eq!(agg.get(&b), Some(3.0));
        assert_eq!(agg.max(), 5.0);
    }

    #[test]
    fn test_mean_mode_truncates() {
        let points = [with_value(1.0), with_value(2.0), with_value(4.0)];
        let a = cell("5339");
        let tagged: Vec<_> = points.iter().map(|p| (a.clone(), p)).collect();

        let agg = aggregate(&tagged, &Aggregation::Mean { field: "v".into() }).unwrap();
        assert_eq!(agg.get(&a), Some(2.0));
    }

    #[test]
    fn test_mean_truncates_toward_zero_for_negatives() {
        let points = [with_value(-1.0), with_value(-2.0)];
        let a = cell("5339");
        let tagged: Vec<_> = points.iter().map(|p| (a.clone(), p)).collect();

        let agg = aggregate(&tagged, &Aggregation::Mean { field: "v".into() }).unwrap();
        assert_eq!(agg.get(&a), Some(-1.0));
    }

    #[test]
    fn test_mean_missing_field_fails() {
        let good = with_value(3.0);
        let bad = Point::bare(35.0, 139.0);
        let a = cell("5339");
        let tagged = vec![(a.clone(), &good), (a.clone(), &bad)];

        match aggregate(&tagged, &Aggregation::Mean { field: "v".into() }) {
            Err(GeobinError::UnknownField { field, index }) => {
                assert_eq!(field, "v");
                assert_eq!(index, 1);
            }
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn test_order_independent() {
        let points = [with_value(1.0), with_value(5.0), with_value(9.0)];
        let cells = [cell("5339"), cell("5340"), cell("5339")];
        let forward: Vec<_> = cells.iter().cloned().zip(points.iter()).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let mode = Aggregation::Mean { field: "v".into() };
        assert_eq!(
            aggregate(&forward, &mode).unwrap(),
            aggregate(&backward, &mode).unwrap()
        );
    }

    #[test]
    fn test_from_cells() {
        let agg = Aggregates::from_cells(vec![(cell("5340"), 1.0), (cell("533947"), 3.0)]).unwrap();
        assert_eq!(agg.max(), 3.0);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_from_cells_rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            match Aggregates::from_cells(vec![(cell("5340"), 1.0), (cell("533947"), bad)]) {
                Err(GeobinError::InvalidInput(msg)) => assert!(msg.contains("533947"), "{}", msg),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_mean_sum_overflow() {
        let a = cell("5339");
        let points = [with_value(f64::MAX), with_value(f64::MAX)];
        let tagged: Vec<(CellId, &Point)> = points.iter().map(|p| (a.clone(), p)).collect();

        match aggregate(&tagged, &Aggregation::Mean { field: "v".into() }) {
            Err(GeobinError::InvalidInput(msg)) => assert!(msg.contains("5339"), "{}", msg),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}

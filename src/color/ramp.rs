//! Piecewise color interpolation over control points.

use crate::error::{GeobinError, Result};
use geobin_types::color::Rgb;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A (domain value, color) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub fn new(value: f64, color: Rgb) -> Self {
        Self { value, color }
    }
}

/// How colors are blended between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Linear blend between neighbouring stops.
    #[default]
    Linear,
    /// Each stop's color holds until the next stop.
    Step,
}

/// How control points are derived from the aggregate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Normalization {
    /// Control points are quantiles of the values at the scheme's fractions.
    Quantile,
    /// Control points are the scheme's fractions of the maximum value.
    ZeroToMax,
    /// Control points are given explicitly by `index`, or spread over
    /// `[vmin, vmax]` at the scheme's fractions when `index` is empty.
    Fixed {
        vmin: f64,
        vmax: f64,
        #[serde(default)]
        index: Vec<f64>,
    },
}

impl Normalization {
    /// Check internal consistency against a scheme with `colors` colors.
    pub fn validate(&self, colors: usize) -> Result<()> {
        if let Normalization::Fixed { vmin, vmax, index } = self {
            if !vmin.is_finite() || !vmax.is_finite() || vmin > vmax {
                return Err(GeobinError::Config(format!(
                    "fixed normalization needs finite vmin <= vmax, got [{}, {}]",
                    vmin, vmax
                )));
            }
            if !index.is_empty() && index.len() != colors {
                return Err(GeobinError::Config(format!(
                    "fixed index has {} entries but the scheme has {} colors",
                    index.len(),
                    colors
                )));
            }
        }
        Ok(())
    }

    /// Compute control points for `values` given the scheme's stop fractions.
    pub fn control_points(&self, fractions: &[f64], values: &[f64]) -> Result<Vec<f64>> {
        match self {
            Normalization::Quantile => quantiles(values, fractions),
            Normalization::ZeroToMax => {
                let max = values.iter().copied().fold(0.0, f64::max);
                Ok(fractions.iter().map(|f| f * max).collect())
            }
            Normalization::Fixed { vmin, vmax, index } => {
                self.validate(fractions.len())?;
                if index.is_empty() {
                    Ok(fractions.iter().map(|f| vmin + (vmax - vmin) * f).collect())
                } else {
                    Ok(index.clone())
                }
            }
        }
    }
}

/// Quantiles of `values` at each fraction, interpolating linearly between
/// the two closest ranks.
///
/// # Examples
///
/// ```
/// use geobin::color::quantiles;
///
/// let q = quantiles(&[4.0, 1.0, 3.0, 2.0], &[0.0, 0.5, 1.0]).unwrap();
/// assert_eq!(q, vec![1.0, 2.5, 4.0]);
/// ```
pub fn quantiles(values: &[f64], fractions: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(GeobinError::EmptyInput { dropped: 0 });
    }
    if let Some(bad) = fractions.iter().find(|f| !(0.0..=1.0).contains(*f)) {
        return Err(GeobinError::Config(format!(
            "quantile fraction {} outside [0, 1]",
            bad
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = (sorted.len() - 1) as f64;

    Ok(fractions
        .iter()
        .map(|q| {
            let pos = q * last;
            let lo = pos.floor();
            let hi = pos.ceil();
            let (a, b) = (sorted[lo as usize], sorted[hi as usize]);
            a + (b - a) * (pos - lo)
        })
        .collect())
}

/// A validated color ramp: at least two stops with finite, non-decreasing
/// domain values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: SmallVec<[ColorStop; 8]>,
    interpolation: Interpolation,
}

impl ColorRamp {
    pub fn new<I>(stops: I, interpolation: Interpolation) -> Result<Self>
    where
        I: IntoIterator<Item = ColorStop>,
    {
        let stops: SmallVec<[ColorStop; 8]> = stops.into_iter().collect();

        if stops.len() < 2 {
            return Err(GeobinError::Config(format!(
                "a color ramp needs at least 2 stops, got {}",
                stops.len()
            )));
        }
        if let Some(stop) = stops.iter().find(|s| !s.value.is_finite()) {
            return Err(GeobinError::Config(format!(
                "color stop value must be finite, got {}",
                stop.value
            )));
        }
        if stops.windows(2).any(|w| w[1].value < w[0].value) {
            return Err(GeobinError::Config(
                "color stop values must be non-decreasing".to_string(),
            ));
        }

        Ok(Self {
            stops,
            interpolation,
        })
    }

    /// Pair control points with colors in order. The two lists must have
    /// the same length.
    pub fn from_parts(control_points: &[f64], colors: &[Rgb], interpolation: Interpolation) -> Result<Self> {
        if control_points.len() != colors.len() {
            return Err(GeobinError::Config(format!(
                "{} control points but {} colors",
                control_points.len(),
                colors.len()
            )));
        }
        Self::new(
            control_points
                .iter()
                .zip(colors)
                .map(|(v, c)| ColorStop::new(*v, *c)),
            interpolation,
        )
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Domain covered by the stops.
    pub fn domain(&self) -> (f64, f64) {
        (self.stops[0].value, self.stops[self.stops.len() - 1].value)
    }

    /// Color at `x`. Values below the first stop (and NaN) take the first
    /// color, values at or above the last stop take the last color.
    pub fn evaluate(&self, x: f64) -> Rgb {
        let first = &self.stops[0];
        let last = &self.stops[self.stops.len() - 1];

        if x.is_nan() || x <= first.value {
            // Step ramps still honour ties at the first stop.
            if self.interpolation == Interpolation::Step && x == first.value {
                return self.step_color(x);
            }
            return first.color;
        }
        if x >= last.value {
            return last.color;
        }

        match self.interpolation {
            Interpolation::Step => self.step_color(x),
            Interpolation::Linear => {
                // x is strictly inside the domain, so 1 <= upper < len.
                let upper = self.stops.iter().filter(|s| s.value < x).count();
                let lo = &self.stops[upper - 1];
                let hi = &self.stops[upper];
                let t = (x - lo.value) / (hi.value - lo.value);
                let (a, b) = (lo.color.to_unit(), hi.color.to_unit());
                Rgb::from_unit([
                    a[0] + (b[0] - a[0]) * t,
                    a[1] + (b[1] - a[1]) * t,
                    a[2] + (b[2] - a[2]) * t,
                ])
            }
        }
    }

    fn step_color(&self, x: f64) -> Rgb {
        self.stops
            .iter()
            .rev()
            .find(|s| s.value <= x)
            .unwrap_or(&self.stops[0])
            .color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb = Rgb::new(0, 0, 255);
    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn two_stop() -> ColorRamp {
        ColorRamp::from_parts(&[0.0, 10.0], &[BLUE, RED], Interpolation::Linear).unwrap()
    }

    #[test]
    fn test_quantiles_linear() {
        let q = quantiles(&[1.0, 2.0, 3.0, 4.0, 5.0], &[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_eq!(q, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let q = quantiles(&[10.0, 20.0], &[0.33]).unwrap();
        assert!((q[0] - 13.3).abs() < 1e-9);
    }

    #[test]
    fn test_quantiles_reject_bad_input() {
        assert!(matches!(quantiles(&[], &[0.5]), Err(GeobinError::EmptyInput { .. })));
        assert!(matches!(quantiles(&[1.0], &[1.5]), Err(GeobinError::Config(_))));
    }

    #[test]
    fn test_linear_endpoints_and_clamp() {
        let ramp = two_stop();
        assert_eq!(ramp.evaluate(0.0), BLUE);
        assert_eq!(ramp.evaluate(-5.0), BLUE);
        assert_eq!(ramp.evaluate(10.0), RED);
        assert_eq!(ramp.evaluate(99.0), RED);
        assert_eq!(ramp.evaluate(f64::NAN), BLUE);
    }

    #[test]
    fn test_linear_midpoint() {
        let mid = two_stop().evaluate(5.0);
        assert_eq!(mid, Rgb::new(127, 0, 127));
    }

    #[test]
    fn test_tied_stops() {
        let ramp = ColorRamp::from_parts(
            &[0.0, 5.0, 5.0, 10.0],
            &[BLUE, GREEN, RED, RED],
            Interpolation::Linear,
        )
        .unwrap();
        assert_eq!(ramp.evaluate(5.0), GREEN);
        assert_eq!(ramp.evaluate(5.0 + 1e-12), RED);
    }

    #[test]
    fn test_step_interpolation() {
        let ramp = ColorRamp::from_parts(&[0.0, 1.0, 2.0], &[BLUE, GREEN, RED], Interpolation::Step).unwrap();
        assert_eq!(ramp.evaluate(0.0), BLUE);
        assert_eq!(ramp.evaluate(0.99), BLUE);
        assert_eq!(ramp.evaluate(1.0), GREEN);
        assert_eq!(ramp.evaluate(1.5), GREEN);
        assert_eq!(ramp.evaluate(2.0), RED);
    }

    #[test]
    fn test_length_mismatch_is_config_error() {
        let err = ColorRamp::from_parts(&[0.0, 1.0, 2.0, 3.0], &[BLUE, GREEN, RED, RED, BLUE], Interpolation::Linear);
        assert!(matches!(err, Err(GeobinError::Config(_))));
    }

    #[test]
    fn test_invalid_stops() {
        assert!(ColorRamp::from_parts(&[1.0], &[BLUE], Interpolation::Linear).is_err());
        assert!(ColorRamp::from_parts(&[2.0, 1.0], &[BLUE, RED], Interpolation::Linear).is_err());
        assert!(ColorRamp::from_parts(&[0.0, f64::INFINITY], &[BLUE, RED], Interpolation::Linear).is_err());
    }

    #[test]
    fn test_fixed_normalization() {
        let fixed = Normalization::Fixed {
            vmin: 0.0,
            vmax: 5.0,
            index: vec![],
        };
        assert_eq!(
            fixed.control_points(&[0.0, 0.5, 1.0], &[100.0]).unwrap(),
            vec![0.0, 2.5, 5.0]
        );

        let explicit = Normalization::Fixed {
            vmin: 0.0,
            vmax: 5.0,
            index: vec![0.0, 1.0, 5.0],
        };
        assert_eq!(
            explicit.control_points(&[0.0, 0.5, 1.0], &[]).unwrap(),
            vec![0.0, 1.0, 5.0]
        );

        assert!(explicit.validate(4).is_err());
    }

    #[test]
    fn test_zero_to_max() {
        let points = Normalization::ZeroToMax
            .control_points(&[0.0, 1.0], &[3.0, 8.0, 2.0])
            .unwrap();
        assert_eq!(points, vec![0.0, 8.0]);
    }
}

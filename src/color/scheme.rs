//! Named color schemes and the registry that resolves them.

use crate::color::ramp::Normalization;
use crate::error::{GeobinError, Result};
use geobin_types::color::Rgb;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// An ordered color list paired with the relative position of each stop.
///
/// `fractions` are quantile levels under [`Normalization::Quantile`] and
/// relative positions in the value range under the other normalizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    name: String,
    colors: Vec<Rgb>,
    fractions: Vec<f64>,
    normalization: Normalization,
}

static BUILTIN: Lazy<Vec<ColorScheme>> = Lazy::new(|| {
    vec![
        ColorScheme {
            name: "Contrast".to_string(),
            colors: vec![
                Rgb::new(128, 128, 128),
                Rgb::new(0, 0, 255),
                Rgb::new(0, 128, 0),
                Rgb::new(255, 255, 0),
                Rgb::new(255, 165, 0),
                Rgb::new(255, 0, 0),
            ],
            fractions: vec![0.0, 0.25, 0.5, 0.75, 0.9, 1.0],
            normalization: Normalization::Quantile,
        },
        ColorScheme {
            name: "Snowflake".to_string(),
            colors: vec![
                Rgb::new(0x66, 0x66, 0x66),
                Rgb::new(0x24, 0xbf, 0xf2),
                Rgb::new(0x12, 0x64, 0x81),
                Rgb::new(0xd9, 0x66, 0xff),
            ],
            fractions: vec![0.0, 0.33, 0.66, 1.0],
            normalization: Normalization::Quantile,
        },
        ColorScheme {
            name: "BlueRed".to_string(),
            colors: vec![Rgb::new(0, 0, 255), Rgb::new(255, 0, 0)],
            fractions: vec![0.0, 1.0],
            normalization: Normalization::ZeroToMax,
        },
    ]
});

impl ColorScheme {
    /// Define a scheme. Colors and fractions must pair up one to one, and
    /// fractions must lie in `[0, 1]` in non-decreasing order.
    ///
    /// # Examples
    ///
    /// ```
    /// use geobin::color::ColorScheme;
    /// use geobin_types::color::Rgb;
    ///
    /// let heat = ColorScheme::new(
    ///     "Heat",
    ///     vec![Rgb::new(255, 255, 0), Rgb::new(255, 0, 0)],
    ///     vec![0.0, 1.0],
    /// )
    /// .unwrap();
    /// assert_eq!(heat.len(), 2);
    ///
    /// // One fraction too few
    /// assert!(ColorScheme::new("Bad", vec![Rgb::new(0, 0, 0); 3], vec![0.0, 1.0]).is_err());
    /// ```
    pub fn new(name: impl Into<String>, colors: Vec<Rgb>, fractions: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if colors.len() != fractions.len() {
            return Err(GeobinError::Config(format!(
                "scheme {:?}: {} colors but {} stops",
                name,
                colors.len(),
                fractions.len()
            )));
        }
        if colors.len() < 2 {
            return Err(GeobinError::Config(format!(
                "scheme {:?} needs at least 2 colors",
                name
            )));
        }
        if fractions.iter().any(|f| !(0.0..=1.0).contains(f))
            || fractions.windows(2).any(|w| w[1] < w[0])
        {
            return Err(GeobinError::Config(format!(
                "scheme {:?}: stop fractions must be non-decreasing within [0, 1]",
                name
            )));
        }
        Ok(Self {
            name,
            colors,
            fractions,
            normalization: Normalization::Quantile,
        })
    }

    /// Like [`ColorScheme::new`] with colors given as `#rrggbb` strings or
    /// CSS names.
    pub fn from_color_names(name: impl Into<String>, colors: &[&str], fractions: Vec<f64>) -> Result<Self> {
        let parsed = colors
            .iter()
            .map(|c| {
                c.parse::<Rgb>()
                    .map_err(|e| GeobinError::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, parsed, fractions)
    }

    /// Default normalization for this scheme.
    pub fn with_normalization(mut self, normalization: Normalization) -> Result<Self> {
        normalization.validate(self.colors.len())?;
        self.normalization = normalization;
        Ok(self)
    }

    /// Built-in scheme by name (case-insensitive).
    pub fn by_name(name: &str) -> Result<Self> {
        BUILTIN
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| GeobinError::Config(format!("unknown color scheme {:?}", name)))
    }

    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contrast() -> Self {
        BUILTIN[0].clone()
    }

    pub fn snowflake() -> Self {
        BUILTIN[1].clone()
    }

    pub fn blue_red() -> Self {
        BUILTIN[2].clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Caller-owned set of schemes available to a pipeline: the built-ins plus
/// any registered custom schemes.
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    schemes: Vec<ColorScheme>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self {
            schemes: BUILTIN.clone(),
        }
    }

    /// Add a scheme, replacing any existing scheme with the same name.
    pub fn register(&mut self, scheme: ColorScheme) {
        if let Some(existing) = self
            .schemes
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(&scheme.name))
        {
            log::debug!("replacing color scheme {:?}", scheme.name);
            *existing = scheme;
        } else {
            self.schemes.push(scheme);
        }
    }

    pub fn get(&self, name: &str) -> Result<&ColorScheme> {
        self.schemes
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GeobinError::Config(format!("unknown color scheme {:?}", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(|s| s.name.as_str())
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

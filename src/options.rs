//! Configuration of a covering run.
use crate::{grid::Codec, InvalidOptionSnafu, Result};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::{fmt, str::FromStr};

pub const DEFAULT_PRECISION: usize = 6;
pub const DEFAULT_SPLIT_AT: usize = 2000;

/// How a swept cell is decided to be part of the cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// Cells whose centre lies inside the polygon (holes excluded).
    #[default]
    Inside,
    /// Every cell the row sweep touches.
    Extent,
    /// Cells whose overlap with the polygon is at least `threshold` of their area.
    Intersect,
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashMode::Inside => "inside",
            HashMode::Extent => "extent",
            HashMode::Intersect => "intersect",
        };
        f.write_str(name)
    }
}

impl FromStr for HashMode {
    type Err = crate::HashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inside" => Ok(HashMode::Inside),
            "extent" => Ok(HashMode::Extent),
            "intersect" => Ok(HashMode::Intersect),
            other => InvalidOptionSnafu {
                description: format!(
                    "unknown hash mode '{other}', expected one of inside, extent, intersect"
                ),
            }
            .fail(),
        }
    }
}

/// Options for [stream](crate::stream) and [polygon_hash](crate::polygon_hash).
///
/// Deserialises from the camelCase keys `precision`, `rowMode`, `hashMode`,
/// `threshold`, `splitAt` and `integerMode`; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashOptions {
    /// Geohash string length, or the bit depth when `integer_mode` is set.
    pub precision: usize,
    /// Emit whole rows instead of single cells.
    pub row_mode: bool,
    pub hash_mode: HashMode,
    /// Minimum overlap fraction in `[0, 1]`, only used by [HashMode::Intersect].
    pub threshold: f64,
    /// Outer ring vertex count from which polygons get clipped per row.
    pub split_at: usize,
    pub integer_mode: bool,
}

impl Default for HashOptions {
    fn default() -> Self {
        HashOptions {
            precision: DEFAULT_PRECISION,
            row_mode: false,
            hash_mode: HashMode::default(),
            threshold: 0.0,
            split_at: DEFAULT_SPLIT_AT,
            integer_mode: false,
        }
    }
}

impl HashOptions {
    /// Reject option values no traversal could run with.
    ///
    /// An odd integer bit depth is accepted; the grid is then simply not square.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.threshold),
            InvalidOptionSnafu {
                description: format!("threshold must be within [0, 1], got {}", self.threshold),
            }
        );
        ensure!(
            self.split_at > 0,
            InvalidOptionSnafu {
                description: "splitAt must be at least 1",
            }
        );
        self.codec().map(|_| ())
    }

    /// The grid codec selected by `precision` and `integer_mode`.
    pub fn codec(&self) -> Result<Codec> {
        Codec::new(self.precision, self.integer_mode)
    }
}

//! Cover GeoJSON (multi)polygons with geohash cells, one grid row at a time.
//!
//! The traversal is pull driven: a [`CellStream`] only computes the next row of
//! cells when it is asked for one, so memory stays bounded by a single row no
//! matter how large the polygon's bounding box is.
//!
//! ```no_run
//! use geohash_poly::{polygon_hash, Coordinates, HashOptions};
//!
//! let square: Coordinates =
//!     serde_json::from_str("[[[0,0],[0,1],[1,1],[1,0],[0,0]]]").expect("coordinates");
//! let options = HashOptions {
//!     precision: 4,
//!     ..HashOptions::default()
//! };
//! let cells = polygon_hash(square, &options).expect("cells");
//! println!("{} cells", cells.len());
//! ```
use snafu::{prelude::*, Backtrace};

pub mod batch;
pub mod geometry;
pub mod grid;
pub mod inclusion;
pub mod options;
pub mod polygon_set;
pub mod scanner;
pub mod stream;

pub use batch::{polygon_hash, polygon_hash_many, stream};
pub use grid::{CellId, Codec, GridCodec};
pub use options::{HashMode, HashOptions};
pub use polygon_set::{Coordinates, PolygonSet};
pub use scanner::RowScanner;
pub use stream::{CellStream, Emission, OutputMode};

pub type Result<T> = std::result::Result<T, HashError>;

#[derive(Debug, Snafu)]
pub enum HashError {
    /// The input coordinates do not describe a usable (multi)polygon.
    #[snafu(display("Invalid geometry: {description}"))]
    InvalidGeometry {
        description: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid option: {description}"))]
    InvalidOption {
        description: String,
        backtrace: Backtrace,
    },
    /// The grid codec or the geometry engine failed internally.
    ///
    /// The row that was being computed is discarded entirely.
    #[snafu(display("The {adapter} adapter failed: {message}"))]
    AdapterFailure {
        adapter: &'static str,
        message: String,
        backtrace: Backtrace,
    },
}

impl HashError {
    pub fn is_invalid_geometry(&self) -> bool {
        matches!(self, HashError::InvalidGeometry { .. })
    }

    pub fn is_invalid_option(&self) -> bool {
        matches!(self, HashError::InvalidOption { .. })
    }

    pub fn is_adapter_failure(&self) -> bool {
        matches!(self, HashError::AdapterFailure { .. })
    }
}

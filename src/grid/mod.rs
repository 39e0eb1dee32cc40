//! Grid codecs: the cell addressing scheme the row scanner walks over.
//!
//! Both codecs describe the same geohash grid. [GeohashCodec] names cells
//! with base32 strings, [IntegerCodec] with the raw interleaved bits. The
//! scanner only sees the [GridCodec] trait, so it is indifferent to which one
//! is used. [Codec] picks one at runtime.
use crate::{geometry::BoundingBox, AdapterFailureSnafu, HashError, Result};
use geo::Coord;
use serde::Serialize;
use std::fmt;

mod hash;
mod integer;

pub use hash::GeohashCodec;
pub use integer::IntegerCodec;

/// A step on the grid, in whole rows (northwards) and columns (eastwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub rows: i64,
    pub columns: i64,
}

impl Offset {
    /// One row north
    pub const NORTH: Offset = Offset {
        rows: 1,
        columns: 0,
    };
    /// One column east
    pub const EAST: Offset = Offset {
        rows: 0,
        columns: 1,
    };
    /// One row south
    pub const SOUTH: Offset = Offset {
        rows: -1,
        columns: 0,
    };
    /// One column west
    pub const WEST: Offset = Offset {
        rows: 0,
        columns: -1,
    };

    pub const fn new(rows: i64, columns: i64) -> Self {
        Offset { rows, columns }
    }
}

/// Encodes positions into grid cells and navigates between cells.
///
/// Neighbours wrap around in longitude. In latitude they saturate: the
/// neighbour north of the top row (or south of the bottom row) is the cell
/// itself.
pub trait GridCodec {
    type Cell: Clone + PartialEq + fmt::Debug;

    /// The cell containing the position.
    fn encode(&self, lat: f64, lon: f64) -> Result<Self::Cell>;

    /// Centre of the cell (`x = longitude`, `y = latitude`).
    fn decode(&self, cell: &Self::Cell) -> Result<Coord<f64>>;

    fn decode_bbox(&self, cell: &Self::Cell) -> Result<BoundingBox>;

    fn neighbor(&self, cell: &Self::Cell, offset: Offset) -> Result<Self::Cell>;

    /// How many cells make up one full row around the globe.
    fn columns_per_row(&self) -> u64;
}

/// Latitude is saturated at the poles, longitude wraps into [-180, 180).
pub(crate) fn step_position(
    centre: Coord<f64>,
    bbox: &BoundingBox,
    offset: Offset,
) -> (f64, f64) {
    let height = bbox.north - bbox.south;
    let width = bbox.east - bbox.west;
    let lat = (centre.y + offset.rows as f64 * height).clamp(-90.0, 90.0);
    let lon = (centre.x + offset.columns as f64 * width + 180.0).rem_euclid(360.0) - 180.0;
    (lat, lon)
}

pub(crate) fn check_position(lat: f64, lon: f64) -> Result<()> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        AdapterFailureSnafu {
            adapter: "grid",
            message: format!("position lat={lat}, lon={lon} is outside of the grid"),
        }
        .fail()
    }
}

/// Identifier of a cell in either codec's representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CellId {
    Hash(String),
    Bits(u64),
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellId::Hash(hash) => write!(f, "{hash}"),
            CellId::Bits(bits) => write!(f, "{bits}"),
        }
    }
}

/// Runtime choice between the string and the integer codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Geohash(GeohashCodec),
    Integer(IntegerCodec),
}

impl Codec {
    /// `precision` is a string length, or a bit depth if `integer_mode` is set.
    pub fn new(precision: usize, integer_mode: bool) -> Result<Self> {
        if integer_mode {
            IntegerCodec::new(precision).map(Codec::Integer)
        } else {
            GeohashCodec::new(precision).map(Codec::Geohash)
        }
    }

    fn mismatch(&self, cell: &CellId) -> HashError {
        AdapterFailureSnafu {
            adapter: "grid",
            message: format!("cell {cell} does not belong to codec {self:?}"),
        }
        .build()
    }
}

impl GridCodec for Codec {
    type Cell = CellId;

    fn encode(&self, lat: f64, lon: f64) -> Result<CellId> {
        match self {
            Codec::Geohash(codec) => codec.encode(lat, lon).map(CellId::Hash),
            Codec::Integer(codec) => codec.encode(lat, lon).map(CellId::Bits),
        }
    }

    fn decode(&self, cell: &CellId) -> Result<Coord<f64>> {
        match (self, cell) {
            (Codec::Geohash(codec), CellId::Hash(hash)) => codec.decode(hash),
            (Codec::Integer(codec), CellId::Bits(bits)) => codec.decode(bits),
            _ => Err(self.mismatch(cell)),
        }
    }

    fn decode_bbox(&self, cell: &CellId) -> Result<BoundingBox> {
        match (self, cell) {
            (Codec::Geohash(codec), CellId::Hash(hash)) => codec.decode_bbox(hash),
            (Codec::Integer(codec), CellId::Bits(bits)) => codec.decode_bbox(bits),
            _ => Err(self.mismatch(cell)),
        }
    }

    fn neighbor(&self, cell: &CellId, offset: Offset) -> Result<CellId> {
        match (self, cell) {
            (Codec::Geohash(codec), CellId::Hash(hash)) => {
                codec.neighbor(hash, offset).map(CellId::Hash)
            }
            (Codec::Integer(codec), CellId::Bits(bits)) => {
                codec.neighbor(bits, offset).map(CellId::Bits)
            }
            _ => Err(self.mismatch(cell)),
        }
    }

    fn columns_per_row(&self) -> u64 {
        match self {
            Codec::Geohash(codec) => codec.columns_per_row(),
            Codec::Integer(codec) => codec.columns_per_row(),
        }
    }
}

use super::*;
use crate::InvalidOptionSnafu;
use snafu::ensure;

pub const MAX_BIT_DEPTH: usize = 64;

/// Geohash cells as raw interleaved bits.
///
/// Bits alternate longitude, latitude, longitude, ... starting at the most
/// significant used bit, exactly like the base32 alphabet of a string
/// geohash. An odd bit depth gives longitude the extra bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerCodec {
    bit_depth: u32,
}

impl IntegerCodec {
    pub fn new(bit_depth: usize) -> Result<Self> {
        ensure!(
            (1..=MAX_BIT_DEPTH).contains(&bit_depth),
            InvalidOptionSnafu {
                description: format!(
                    "integer bit depth must be between 1 and {MAX_BIT_DEPTH}, got {bit_depth}"
                ),
            }
        );
        Ok(IntegerCodec {
            bit_depth: bit_depth as u32,
        })
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    fn lon_bits(&self) -> u32 {
        (self.bit_depth + 1) / 2
    }

    fn lat_bits(&self) -> u32 {
        self.bit_depth / 2
    }

    fn split(&self, cell: u64) -> Result<(u64, u64)> {
        if self.bit_depth < 64 && cell >> self.bit_depth != 0 {
            return AdapterFailureSnafu {
                adapter: "integer geohash",
                message: format!("cell {cell} has more than {} bits", self.bit_depth),
            }
            .fail();
        }
        let mut lat_index = 0u64;
        let mut lon_index = 0u64;
        for position in 0..self.bit_depth {
            let bit = (cell >> (self.bit_depth - 1 - position)) & 1;
            if position % 2 == 0 {
                lon_index = (lon_index << 1) | bit;
            } else {
                lat_index = (lat_index << 1) | bit;
            }
        }
        Ok((lat_index, lon_index))
    }

    fn join(&self, lat_index: u64, lon_index: u64) -> u64 {
        let lon_bits = self.lon_bits();
        let lat_bits = self.lat_bits();
        let mut cell = 0u64;
        for position in 0..self.bit_depth {
            let bit = if position % 2 == 0 {
                (lon_index >> (lon_bits - 1 - position / 2)) & 1
            } else {
                (lat_index >> (lat_bits - 1 - position / 2)) & 1
            };
            cell = (cell << 1) | bit;
        }
        cell
    }
}

/// Half-open bucket of `value` within `[min, max]` split into `2^bits` parts.
fn bucket(value: f64, min: f64, max: f64, bits: u32) -> u64 {
    let buckets = 1u64 << bits;
    let scaled = ((value - min) / (max - min) * buckets as f64).floor() as u64;
    scaled.min(buckets - 1)
}

fn span(bits: u32, extent: f64) -> f64 {
    extent / (1u64 << bits) as f64
}

impl GridCodec for IntegerCodec {
    type Cell = u64;

    fn encode(&self, lat: f64, lon: f64) -> Result<u64> {
        check_position(lat, lon)?;
        let lat_index = bucket(lat, -90.0, 90.0, self.lat_bits());
        let lon_index = bucket(lon, -180.0, 180.0, self.lon_bits());
        Ok(self.join(lat_index, lon_index))
    }

    fn decode(&self, cell: &u64) -> Result<Coord<f64>> {
        let bbox = self.decode_bbox(cell)?;
        Ok(Coord {
            x: bbox.mid_longitude(),
            y: bbox.mid_latitude(),
        })
    }

    fn decode_bbox(&self, cell: &u64) -> Result<BoundingBox> {
        let (lat_index, lon_index) = self.split(*cell)?;
        let height = span(self.lat_bits(), 180.0);
        let width = span(self.lon_bits(), 360.0);
        let south = -90.0 + lat_index as f64 * height;
        let west = -180.0 + lon_index as f64 * width;
        Ok(BoundingBox {
            south,
            west,
            north: south + height,
            east: west + width,
        })
    }

    fn neighbor(&self, cell: &u64, offset: Offset) -> Result<u64> {
        let (lat_index, lon_index) = self.split(*cell)?;
        let rows = 1i128 << self.lat_bits();
        let columns = 1i128 << self.lon_bits();
        let lat_index = (lat_index as i128 + offset.rows as i128).clamp(0, rows - 1);
        let lon_index = (lon_index as i128 + offset.columns as i128).rem_euclid(columns);
        Ok(self.join(lat_index as u64, lon_index as u64))
    }

    fn columns_per_row(&self) -> u64 {
        1u64 << self.lon_bits()
    }
}

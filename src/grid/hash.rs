use super::*;
use crate::InvalidOptionSnafu;
use snafu::ensure;

/// Longest geohash the base32 codec supports.
pub const MAX_HASH_LENGTH: usize = 12;

/// Base32 geohash cells, backed by the `geohash` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeohashCodec {
    length: usize,
}

impl GeohashCodec {
    pub fn new(length: usize) -> Result<Self> {
        ensure!(
            (1..=MAX_HASH_LENGTH).contains(&length),
            InvalidOptionSnafu {
                description: format!(
                    "geohash precision must be between 1 and {MAX_HASH_LENGTH}, got {length}"
                ),
            }
        );
        Ok(GeohashCodec { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn longitude_bits(&self) -> u32 {
        // 5 bits per character, longitude takes the first (and any odd) bit
        (5 * self.length as u32 + 1) / 2
    }
}

fn codec_failure(error: geohash::GeohashError) -> HashError {
    AdapterFailureSnafu {
        adapter: "geohash",
        message: format!("{error:?}"),
    }
    .build()
}

impl GridCodec for GeohashCodec {
    type Cell = String;

    fn encode(&self, lat: f64, lon: f64) -> Result<String> {
        check_position(lat, lon)?;
        geohash::encode(Coord { x: lon, y: lat }, self.length).map_err(codec_failure)
    }

    fn decode(&self, cell: &String) -> Result<Coord<f64>> {
        geohash::decode(cell)
            .map(|(centre, _, _)| centre)
            .map_err(codec_failure)
    }

    fn decode_bbox(&self, cell: &String) -> Result<BoundingBox> {
        geohash::decode_bbox(cell)
            .map(BoundingBox::from)
            .map_err(codec_failure)
    }

    fn neighbor(&self, cell: &String, offset: Offset) -> Result<String> {
        let bbox = self.decode_bbox(cell)?;
        let centre = Coord {
            x: bbox.mid_longitude(),
            y: bbox.mid_latitude(),
        };
        let (lat, lon) = step_position(centre, &bbox, offset);
        geohash::encode(Coord { x: lon, y: lat }, cell.len()).map_err(codec_failure)
    }

    fn columns_per_row(&self) -> u64 {
        1u64 << self.longitude_bits()
    }
}

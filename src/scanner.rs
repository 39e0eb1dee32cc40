//! The row sweep over a [PolygonSet].
//!
//! Each member polygon is walked from the grid row containing its north-west
//! corner southwards, one row per call to [RowScanner::next_row]. Within a row
//! the columns are swept eastwards until one past the row's eastern extent.
//! Polygons are processed last to first; the set itself is never modified,
//! progress is just an index into it.
use crate::{
    geometry::{BoundingBox, GeoEngine, GeometryEngine},
    grid::{Codec, GridCodec, Offset},
    inclusion::InclusionPolicy,
    options::HashOptions,
    polygon_set::{PolygonSet, SimplePolygon},
    Result,
};
use geo::Geometry;
use std::borrow::Cow;

/// Padding around the row band when clipping a polygon, so that cells right on
/// the band's edges are not lost to floating point error.
pub const ROW_BUFFER: f64 = 0.0002;

#[derive(Debug, Clone)]
struct RowCursor<C> {
    polygon_bbox: BoundingBox,
    row_cell: C,
}

/// What one row is tested against.
struct RowTarget<'a, C> {
    working: Cow<'a, Geometry<f64>>,
    row_bbox: BoundingBox,
    start: C,
}

pub struct RowScanner<G: GridCodec, E: GeometryEngine = GeoEngine> {
    codec: G,
    engine: E,
    policy: InclusionPolicy,
    split_at: usize,
    polygons: PolygonSet,
    /// `polygons[..remaining]` are not finished yet, the last one is current.
    remaining: usize,
    cursor: Option<RowCursor<G::Cell>>,
}

impl<G: GridCodec> RowScanner<G, GeoEngine> {
    pub fn new(polygons: PolygonSet, codec: G, policy: InclusionPolicy, split_at: usize) -> Self {
        RowScanner::with_engine(polygons, codec, GeoEngine, policy, split_at)
    }
}

impl RowScanner<Codec, GeoEngine> {
    /// Validate `options` and set up a scanner with the codec they select.
    pub fn from_options(polygons: PolygonSet, options: &HashOptions) -> Result<Self> {
        options.validate()?;
        let policy = InclusionPolicy::new(options.hash_mode, options.threshold);
        Ok(RowScanner::new(
            polygons,
            options.codec()?,
            policy,
            options.split_at,
        ))
    }
}

impl<G: GridCodec, E: GeometryEngine> RowScanner<G, E> {
    pub fn with_engine(
        polygons: PolygonSet,
        codec: G,
        engine: E,
        policy: InclusionPolicy,
        split_at: usize,
    ) -> Self {
        let remaining = polygons.len();
        RowScanner {
            codec,
            engine,
            policy,
            split_at,
            polygons,
            remaining,
            cursor: None,
        }
    }

    pub fn codec(&self) -> &G {
        &self.codec
    }

    pub fn policy(&self) -> InclusionPolicy {
        self.policy
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    pub fn polygons_remaining(&self) -> usize {
        self.remaining
    }

    pub fn polygons_finished(&self) -> usize {
        self.polygons.len() - self.remaining
    }

    /// Rewind to the start of the traversal.
    pub fn restart(&mut self) {
        self.remaining = self.polygons.len();
        self.cursor = None;
    }

    /// Compute the next row of the current polygon.
    ///
    /// Returns `None` once every polygon is finished. A returned row may be
    /// empty. On error nothing is advanced, so the failed row is never
    /// partially reported.
    pub fn next_row(&mut self) -> Result<Option<Vec<G::Cell>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let index = self.remaining - 1;
        let polygon = &self.polygons[index];
        let (polygon_bbox, row_cell) = match &self.cursor {
            Some(cursor) => (cursor.polygon_bbox, cursor.row_cell.clone()),
            None => {
                let bbox = polygon.bounding_box(&self.engine)?;
                let row_cell = self.codec.encode(bbox.north, bbox.west)?;
                log::debug!(
                    "Starting polygon {} of {} with {} outer vertices in {}",
                    index + 1,
                    self.polygons.len(),
                    polygon.outer_vertex_count(),
                    bbox
                );
                (bbox, row_cell)
            }
        };
        let row_box = self.codec.decode_bbox(&row_cell)?;
        let target = self.row_target(polygon, &polygon_bbox, &row_box, &row_cell)?;
        let candidates = self.sweep(&target, &row_box)?;
        let swept = candidates.len();
        let cells = self.policy.retain_row(
            &self.codec,
            &self.engine,
            candidates,
            &target.working,
            &target.row_bbox,
        )?;
        log::trace!(
            "Row {} of polygon {}: kept {} of {} swept cells",
            row_box,
            index + 1,
            cells.len(),
            swept
        );
        let south = self.codec.neighbor(&row_cell, Offset::SOUTH)?;

        if south == row_cell || row_box.south <= polygon_bbox.south {
            log::debug!("Polygon {} of {} exhausted", index + 1, self.polygons.len());
            self.remaining = index;
            self.cursor = None;
        } else {
            self.cursor = Some(RowCursor {
                polygon_bbox,
                row_cell: south,
            });
        }
        Ok(Some(cells))
    }

    /// Clip large polygons to the row band, if that leaves anything.
    fn row_target<'a>(
        &self,
        polygon: &'a SimplePolygon,
        polygon_bbox: &BoundingBox,
        row_box: &BoundingBox,
        row_cell: &G::Cell,
    ) -> Result<RowTarget<'a, G::Cell>> {
        if self.policy.clips() && polygon.outer_vertex_count() >= self.split_at {
            let band = BoundingBox {
                south: row_box.south,
                west: polygon_bbox.west,
                north: row_box.north,
                east: polygon_bbox.east,
            }
            .padded(ROW_BUFFER);
            let clipped = self
                .engine
                .intersect(&band.to_polygon(), polygon.geometry())?;
            if let Some(clipped) = clipped {
                if let Some(row_bbox) = self.engine.extent(&clipped) {
                    // The clipped box may only graze the band, so its own
                    // midpoint can lie in a neighbouring row.
                    let start = self
                        .codec
                        .encode(row_box.mid_latitude(), row_bbox.west)?;
                    return Ok(RowTarget {
                        working: Cow::Owned(clipped),
                        row_bbox,
                        start,
                    });
                }
            }
        }
        Ok(RowTarget {
            working: Cow::Borrowed(polygon.geometry()),
            row_bbox: *polygon_bbox,
            start: row_cell.clone(),
        })
    }

    /// Test columns from `target.start` eastwards, up to and including the
    /// column holding the east edge of `target.row_bbox`.
    ///
    /// The first column is always tested and at most one full row is swept,
    /// so a box spanning all longitudes cannot loop.
    fn sweep(
        &self,
        target: &RowTarget<'_, G::Cell>,
        row_box: &BoundingBox,
    ) -> Result<Vec<G::Cell>> {
        let row_latitude = row_box.mid_latitude();
        let east_column = self.codec.encode(row_latitude, target.row_bbox.east)?;
        let terminator = self.codec.neighbor(&east_column, Offset::EAST)?;

        let mut candidates = Vec::new();
        let mut column = target.start.clone();
        for _ in 0..self.codec.columns_per_row() {
            let centre = self.codec.decode(&column)?;
            if self.policy.admits(&self.engine, centre, &target.working) {
                candidates.push(column.clone());
            }
            let next = self.codec.neighbor(&column, Offset::EAST)?;
            if next == terminator {
                break;
            }
            column = next;
        }
        Ok(candidates)
    }
}

impl<G: GridCodec, E: GeometryEngine> std::fmt::Debug for RowScanner<G, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowScanner")
            .field("policy", &self.policy)
            .field("split_at", &self.split_at)
            .field("polygons", &self.polygons.len())
            .field("remaining", &self.remaining)
            .field("row_cell", &self.cursor.as_ref().map(|c| &c.row_cell))
            .finish()
    }
}

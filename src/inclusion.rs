//! Decides which swept cells become part of the cover.
use crate::{
    geometry::{geometry_type, BoundingBox, GeometryEngine, Intersecting},
    grid::GridCodec,
    options::HashMode,
    Result,
};
use geo::{Coord, Geometry, Polygon};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InclusionPolicy {
    /// Keep cells whose centre passes the even-odd parity test.
    Inside,
    /// Keep every swept cell.
    Extent,
    /// Keep cells overlapping the working geometry by at least `threshold`
    /// of their own area. A threshold of `0` keeps every swept cell.
    Intersect { threshold: f64 },
}

impl InclusionPolicy {
    pub fn new(mode: HashMode, threshold: f64) -> Self {
        match mode {
            HashMode::Inside => InclusionPolicy::Inside,
            HashMode::Extent => InclusionPolicy::Extent,
            HashMode::Intersect => InclusionPolicy::Intersect { threshold },
        }
    }

    /// Whether large polygons are clipped to the row band before testing.
    ///
    /// Clipping narrows the sweep to the polygon's extent within the row, so
    /// it only applies where cells outside that extent can never be admitted.
    /// A zero threshold admits every swept cell, like `Extent`.
    pub fn clips(&self) -> bool {
        match self {
            InclusionPolicy::Inside => true,
            InclusionPolicy::Extent => false,
            InclusionPolicy::Intersect { threshold } => *threshold > 0.0,
        }
    }

    /// Test a single swept cell by its centre.
    pub fn admits<E: GeometryEngine + ?Sized>(
        &self,
        engine: &E,
        centre: Coord<f64>,
        working: &Geometry<f64>,
    ) -> bool {
        match self {
            InclusionPolicy::Inside => encloses(engine, working, centre),
            InclusionPolicy::Extent | InclusionPolicy::Intersect { .. } => true,
        }
    }

    /// Filter the candidates of a completely swept row.
    ///
    /// Only [InclusionPolicy::Intersect] with a non-zero threshold removes
    /// anything. `row_bbox` is the extent of `working`; cells outside it are
    /// dropped without an intersection.
    pub fn retain_row<G, E>(
        &self,
        codec: &G,
        engine: &E,
        candidates: Vec<G::Cell>,
        working: &Geometry<f64>,
        row_bbox: &BoundingBox,
    ) -> Result<Vec<G::Cell>>
    where
        G: GridCodec + ?Sized,
        E: GeometryEngine + ?Sized,
    {
        let threshold = match self {
            InclusionPolicy::Intersect { threshold } if *threshold > 0.0 => *threshold,
            _ => return Ok(candidates),
        };
        let mut base_area = None;
        let mut kept = Vec::with_capacity(candidates.len());
        for cell in candidates {
            let cell_box = codec.decode_bbox(&cell)?;
            let rectangle = cell_box.to_polygon();
            let base = *base_area.get_or_insert_with(|| cell_area(engine, &rectangle));
            if !row_bbox.intersects(&cell_box) || base <= 0.0 {
                continue;
            }
            let overlap = match engine.intersect(&rectangle, working)? {
                Some(intersection) => overlap_area(engine, &intersection),
                None => 0.0,
            };
            if overlap > 0.0 && overlap / base >= threshold {
                kept.push(cell);
            }
        }
        Ok(kept)
    }
}

fn cell_area<E: GeometryEngine + ?Sized>(engine: &E, rectangle: &Polygon<f64>) -> f64 {
    engine.area(&Geometry::Polygon(rectangle.clone()))
}

/// Lines and points left over from a degenerate intersection have no overlap.
fn overlap_area<E: GeometryEngine + ?Sized>(engine: &E, intersection: &Geometry<f64>) -> f64 {
    match intersection {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => engine.area(intersection),
        _ => 0.0,
    }
}

/// Even-odd parity of `point` over every ring of every polygon in `geometry`.
///
/// Holes are ordinary rings here: being inside an outer ring and one of its
/// holes is two crossings, i.e. outside. Anything that is not a polygon or a
/// multipolygon contains nothing.
pub fn encloses<E: GeometryEngine + ?Sized>(
    engine: &E,
    geometry: &Geometry<f64>,
    point: Coord<f64>,
) -> bool {
    let polygons = match geometry {
        Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
        Geometry::MultiPolygon(multi_polygon) => multi_polygon.0.as_slice(),
        other => {
            log::trace!(
                "Working geometry of type {} contains nothing",
                geometry_type(other)
            );
            return false;
        }
    };
    let enclosing_rings = polygons
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .filter(|ring| engine.point_in_ring(point, ring))
        .count();
    enclosing_rings % 2 == 1
}

//! Normalised polygon input for the row scanner.
use crate::{
    geometry::{BoundingBox, GeometryEngine},
    AdapterFailureSnafu, InvalidGeometrySnafu, Result,
};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use snafu::{ensure, OptionExt};
use std::{cell::OnceCell, ops::Index};

/// A ring must at least be a closed triangle.
pub const MIN_RING_POSITIONS: usize = 4;

/// GeoJSON `coordinates` of a Polygon or a MultiPolygon.
///
/// Which of the two it is gets decided by nesting depth when deserialising.
/// Positions are `[lon, lat, ...]`; extra ordinates (altitude) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// One polygon with its holes. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SimplePolygon {
    geometry: Geometry<f64>,
    bounding_box: OnceCell<BoundingBox>,
}

impl SimplePolygon {
    fn new(polygon: Polygon<f64>) -> Self {
        SimplePolygon {
            geometry: Geometry::Polygon(polygon),
            bounding_box: OnceCell::new(),
        }
    }

    /// Always a [Geometry::Polygon].
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        match &self.geometry {
            Geometry::Polygon(polygon) => polygon,
            _ => unreachable!("SimplePolygon always wraps a Polygon"),
        }
    }

    /// Number of positions in the outer ring, including the closing one.
    pub fn outer_vertex_count(&self) -> usize {
        self.polygon().exterior().0.len()
    }

    /// Extent of the outer ring and holes, computed on first use.
    pub fn bounding_box(&self, engine: &impl GeometryEngine) -> Result<BoundingBox> {
        if let Some(bbox) = self.bounding_box.get() {
            return Ok(*bbox);
        }
        let bbox = engine
            .extent(&self.geometry)
            .with_context(|| AdapterFailureSnafu {
                adapter: "geometry",
                message: "polygon has no extent",
            })?;
        Ok(*self.bounding_box.get_or_init(|| bbox))
    }
}

/// Ordered member polygons of the input.
///
/// The scanner consumes it back to front by index; the set itself is never
/// mutated, so a traversal can be inspected or restarted at any time.
#[derive(Debug, Clone)]
pub struct PolygonSet {
    polygons: Vec<SimplePolygon>,
}

impl PolygonSet {
    pub fn from_coordinates(coordinates: Coordinates) -> Result<Self> {
        let polygons = match coordinates {
            Coordinates::Polygon(rings) => vec![rings],
            Coordinates::MultiPolygon(polygons) => polygons,
        };
        let polygons = polygons
            .into_iter()
            .enumerate()
            .map(|(index, rings)| build_polygon(index, rings))
            .collect::<Result<Vec<_>>>()?;
        PolygonSet::from_polygons(polygons)
    }

    /// Validate every ring of `polygons` and take them as members.
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        ensure!(
            !polygons.is_empty(),
            InvalidGeometrySnafu {
                description: "no polygons in input",
            }
        );
        for (index, polygon) in polygons.iter().enumerate() {
            check_ring(index, 0, polygon.exterior())?;
            for (hole, ring) in polygon.interiors().iter().enumerate() {
                check_ring(index, hole + 1, ring)?;
            }
        }
        Ok(PolygonSet {
            polygons: polygons.into_iter().map(SimplePolygon::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimplePolygon> {
        self.polygons.iter()
    }
}

impl Index<usize> for PolygonSet {
    type Output = SimplePolygon;

    fn index(&self, index: usize) -> &Self::Output {
        &self.polygons[index]
    }
}

impl TryFrom<Coordinates> for PolygonSet {
    type Error = crate::HashError;

    fn try_from(coordinates: Coordinates) -> Result<Self> {
        PolygonSet::from_coordinates(coordinates)
    }
}

impl TryFrom<Polygon<f64>> for PolygonSet {
    type Error = crate::HashError;

    fn try_from(polygon: Polygon<f64>) -> Result<Self> {
        PolygonSet::from_polygons(vec![polygon])
    }
}

impl TryFrom<MultiPolygon<f64>> for PolygonSet {
    type Error = crate::HashError;

    fn try_from(multi_polygon: MultiPolygon<f64>) -> Result<Self> {
        PolygonSet::from_polygons(multi_polygon.0)
    }
}

fn build_polygon(index: usize, rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings
        .into_iter()
        .enumerate()
        .map(|(ring_index, positions)| build_ring(index, ring_index, positions));
    let exterior = rings.next().with_context(|| InvalidGeometrySnafu {
        description: format!("polygon {index} has no rings"),
    })??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn build_ring(
    index: usize,
    ring_index: usize,
    positions: Vec<Vec<f64>>,
) -> Result<LineString<f64>> {
    positions
        .into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
            _ => InvalidGeometrySnafu {
                description: format!(
                    "ring {ring_index} of polygon {index} has a position {position:?} \
                     with fewer than two ordinates"
                ),
            }
            .fail(),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn check_ring(index: usize, ring_index: usize, ring: &LineString<f64>) -> Result<()> {
    ensure!(
        ring.0.len() >= MIN_RING_POSITIONS,
        InvalidGeometrySnafu {
            description: format!(
                "ring {ring_index} of polygon {index} has {} positions, \
                 at least {MIN_RING_POSITIONS} are required",
                ring.0.len()
            ),
        }
    );
    let outside = ring.coords().find(|c| {
        !((-180.0..=180.0).contains(&c.x) && (-90.0..=90.0).contains(&c.y))
    });
    if let Some(position) = outside {
        return InvalidGeometrySnafu {
            description: format!(
                "ring {ring_index} of polygon {index} has an invalid position \
                 lon={}, lat={}",
                position.x, position.y
            ),
        }
        .fail();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoEngine;
    use approx::assert_abs_diff_eq;

    fn parse(json: &str) -> Coordinates {
        serde_json::from_str(json).expect("coordinates")
    }

    #[test]
    fn test_polygon_detection() {
        let coords = parse("[[[0,0],[0,1],[1,1],[1,0],[0,0]]]");
        assert!(matches!(coords, Coordinates::Polygon(_)));
        let set = PolygonSet::from_coordinates(coords).expect("set");
        assert_eq!(1, set.len());
        assert_eq!(5, set[0].outer_vertex_count());
    }

    #[test]
    fn test_multi_polygon_detection() {
        let coords = parse(
            "[[[[0,0],[0,1],[1,1],[1,0],[0,0]]],
              [[[5,5],[5,9],[9,9],[9,5],[5,5]],[[6,6],[6,7],[7,7],[7,6],[6,6]]]]",
        );
        assert!(matches!(coords, Coordinates::MultiPolygon(_)));
        let set = PolygonSet::from_coordinates(coords).expect("set");
        assert_eq!(2, set.len());
        assert_eq!(0, set[0].polygon().interiors().len());
        assert_eq!(1, set[1].polygon().interiors().len());
    }

    #[test]
    fn test_altitude_is_ignored() {
        let coords = parse("[[[0,0,10],[0,1,10],[1,1,10],[1,0,10],[0,0,10]]]");
        let set = PolygonSet::from_coordinates(coords).expect("set");
        assert_eq!(Coord { x: 1.0, y: 1.0 }, set[0].polygon().exterior().0[2]);
    }

    #[test]
    fn test_invalid_geometry() {
        let empty = PolygonSet::from_coordinates(parse("[]")).expect_err("empty");
        assert!(empty.is_invalid_geometry());
        let no_rings = PolygonSet::from_coordinates(parse("[[]]")).expect_err("no ring");
        assert!(no_rings.is_invalid_geometry());
        let short =
            PolygonSet::from_coordinates(parse("[[[0,0],[0,1],[0,0]]]")).expect_err("short");
        assert!(short.is_invalid_geometry());
        let short_hole = PolygonSet::from_coordinates(parse(
            "[[[0,0],[0,1],[1,1],[1,0],[0,0]],[[0.2,0.2],[0.3,0.3]]]",
        ))
        .expect_err("short hole");
        assert!(short_hole.is_invalid_geometry());
        let out_of_range =
            PolygonSet::from_coordinates(parse("[[[0,0],[0,91],[1,1],[1,0],[0,0]]]"))
                .expect_err("range");
        assert!(out_of_range.is_invalid_geometry());
        let one_ordinate =
            PolygonSet::from_coordinates(parse("[[[0,0],[0],[1,1],[1,0],[0,0]]]"))
                .expect_err("ordinates");
        assert!(one_ordinate.is_invalid_geometry());
        let empty_member =
            PolygonSet::from_coordinates(parse("[[[[0,0],[0,1],[1,1],[1,0],[0,0]]],[]]"))
                .expect_err("empty member");
        assert!(empty_member.is_invalid_geometry());
    }

    #[test]
    fn test_bounding_box_is_cached() {
        let set = PolygonSet::from_coordinates(parse("[[[-1,2],[-1,4],[3,4],[3,2],[-1,2]]]"))
            .expect("set");
        assert!(set[0].bounding_box.get().is_none());
        let bbox = set[0].bounding_box(&GeoEngine).expect("bbox");
        assert_abs_diff_eq!(
            bbox,
            BoundingBox {
                south: 2.0,
                west: -1.0,
                north: 4.0,
                east: 3.0
            }
        );
        assert_eq!(Some(&bbox), set[0].bounding_box.get());
    }

    #[test]
    fn test_from_geo_types() {
        let polygon = BoundingBox {
            south: 0.0,
            west: 0.0,
            north: 1.0,
            east: 1.0,
        }
        .to_polygon();
        let multi_polygon = MultiPolygon::new(vec![polygon.clone(), polygon.clone()]);
        assert_eq!(2, PolygonSet::try_from(multi_polygon).expect("set").len());
        assert_eq!(1, PolygonSet::try_from(polygon).expect("set").len());
    }

    #[test]
    fn test_geo_types_are_validated() {
        let empty_ring = Polygon::new(LineString::new(Vec::new()), Vec::new());
        let err = PolygonSet::try_from(empty_ring).expect_err("empty ring");
        assert!(err.is_invalid_geometry());

        let too_far_north = LineString::from(vec![(0.0, 0.0), (0.0, 95.0), (1.0, 1.0), (0.0, 0.0)]);
        let err = PolygonSet::try_from(Polygon::new(too_far_north, Vec::new()))
            .expect_err("latitude");
        assert!(err.is_invalid_geometry());

        let unit = BoundingBox {
            south: 0.0,
            west: 0.0,
            north: 1.0,
            east: 1.0,
        };
        let short_hole = LineString::from(vec![(0.2, 0.2), (0.3, 0.3), (0.2, 0.2)]);
        let holed = Polygon::new(unit.to_polygon().exterior().clone(), vec![short_hole]);
        let err = PolygonSet::try_from(MultiPolygon::new(vec![unit.to_polygon(), holed]))
            .expect_err("short hole");
        assert!(err.is_invalid_geometry());

        let err = PolygonSet::try_from(MultiPolygon::<f64>::new(Vec::new())).expect_err("empty");
        assert!(err.is_invalid_geometry());
    }
}

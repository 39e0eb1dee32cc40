use crate::{AdapterFailureSnafu, Result};
use geo::{Area, BooleanOps, BoundingRect, Coord, Geometry, LineString, MultiPolygon, Polygon};
use std::panic::{self, AssertUnwindSafe};

pub mod planar;

pub use planar::{point_in_ring, BoundingBox};

/// Types implementing this trait can be checked for intersections with `Rhs`
pub trait Intersecting<Rhs = Self> {
    /// Returns `true` if `self` intersects with `other`.
    fn intersects(&self, other: &Rhs) -> bool;
}

/// The planar geometry operations the row scanner depends on.
///
/// Coordinates are `x = longitude`, `y = latitude`, and all computations are
/// planar in degree units.
pub trait GeometryEngine {
    /// Bounding box of `geometry`, or `None` if it has no coordinates.
    fn extent(&self, geometry: &Geometry<f64>) -> Option<BoundingBox>;

    /// Intersect a rectangle polygon with `geometry`.
    ///
    /// Returns `None` if the intersection is empty, or if `geometry` is not a
    /// polygon or multipolygon.
    fn intersect(
        &self,
        rectangle: &Polygon<f64>,
        geometry: &Geometry<f64>,
    ) -> Result<Option<Geometry<f64>>>;

    /// Unsigned planar area of `geometry`.
    fn area(&self, geometry: &Geometry<f64>) -> f64;

    /// Even-odd enclosure of `point` by a single closed `ring`.
    fn point_in_ring(&self, point: Coord<f64>, ring: &LineString<f64>) -> bool {
        point_in_ring(point, ring)
    }
}

/// [GeometryEngine] backed by the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeometryEngine for GeoEngine {
    fn extent(&self, geometry: &Geometry<f64>) -> Option<BoundingBox> {
        geometry.bounding_rect().map(BoundingBox::from)
    }

    fn intersect(
        &self,
        rectangle: &Polygon<f64>,
        geometry: &Geometry<f64>,
    ) -> Result<Option<Geometry<f64>>> {
        let subject = match geometry {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            Geometry::MultiPolygon(mp) => mp.clone(),
            other => {
                log::trace!(
                    "Not intersecting with unsupported geometry type {}",
                    geometry_type(other)
                );
                return Ok(None);
            }
        };
        let clip = MultiPolygon::new(vec![rectangle.clone()]);
        // The sweep-line in `BooleanOps` panics on some degenerate inputs.
        let result = panic::catch_unwind(AssertUnwindSafe(|| clip.intersection(&subject)));
        match result {
            Ok(intersection) if intersection.0.is_empty() => Ok(None),
            Ok(intersection) => Ok(Some(Geometry::MultiPolygon(intersection))),
            Err(cause) => {
                let message = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "boolean operation panicked".to_string());
                log::warn!("Polygon intersection failed: {message}");
                AdapterFailureSnafu {
                    adapter: "geometry",
                    message,
                }
                .fail()
            }
        }
    }

    fn area(&self, geometry: &Geometry<f64>) -> f64 {
        geometry.unsigned_area()
    }
}

pub(crate) fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Delegates to [GeoEngine] but fails every intersection.
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct FailingEngine;

    impl GeometryEngine for FailingEngine {
        fn extent(&self, geometry: &Geometry<f64>) -> Option<BoundingBox> {
            GeoEngine.extent(geometry)
        }

        fn intersect(
            &self,
            _rectangle: &Polygon<f64>,
            _geometry: &Geometry<f64>,
        ) -> Result<Option<Geometry<f64>>> {
            AdapterFailureSnafu {
                adapter: "test",
                message: "intersection unavailable",
            }
            .fail()
        }

        fn area(&self, geometry: &Geometry<f64>) -> f64 {
            GeoEngine.area(geometry)
        }
    }
}

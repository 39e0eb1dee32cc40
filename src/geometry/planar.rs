use super::*;
use approx::AbsDiffEq;
use geo::{Coord, LineString, Polygon, Rect};
use itertools::Itertools;
use std::fmt;

/// Axis-aligned box in degrees.
///
/// `south <= north` and `west <= east` always hold; boxes never wrap around
/// the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn mid_latitude(&self) -> f64 {
        (self.south + self.north) / 2.0
    }

    pub fn mid_longitude(&self) -> f64 {
        (self.west + self.east) / 2.0
    }

    /// Grow the box by `buffer` on all four sides.
    pub fn padded(&self, buffer: f64) -> BoundingBox {
        BoundingBox {
            south: self.south - buffer,
            west: self.west - buffer,
            north: self.north + buffer,
            east: self.east + buffer,
        }
    }

    /// Closed counter-clockwise rectangle ring, starting in the south-west corner.
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring = vec![
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
            Coord {
                x: self.west,
                y: self.north,
            },
            Coord {
                x: self.west,
                y: self.south,
            },
        ];
        Polygon::new(LineString::new(ring), Vec::new())
    }

    pub fn assert_legal(&self) {
        assert!(
            self.south <= self.north && self.west <= self.east,
            "BoundingBox {} is illegal!",
            self
        );
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        let r = BoundingBox {
            south: min.y,
            west: min.x,
            north: max.y,
            east: max.x,
        };
        if cfg!(test) {
            r.assert_legal();
        }
        r
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[S{} W{} | N{} E{}]",
            self.south, self.west, self.north, self.east
        )
    }
}

impl AbsDiffEq for BoundingBox {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.south.abs_diff_eq(&other.south, epsilon)
            && self.west.abs_diff_eq(&other.west, epsilon)
            && self.north.abs_diff_eq(&other.north, epsilon)
            && self.east.abs_diff_eq(&other.east, epsilon)
    }
}

impl Intersecting for BoundingBox {
    /// Shared edges count as intersecting.
    fn intersects(&self, other: &BoundingBox) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }
}

/// Crossing-number test of `point` against a closed `ring`.
///
/// Points exactly on the ring may be reported either way.
pub fn point_in_ring(point: Coord<f64>, ring: &LineString<f64>) -> bool {
    ring.coords()
        .tuple_windows()
        .filter(|(a, b)| {
            (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        })
        .count()
        % 2
        == 1
}

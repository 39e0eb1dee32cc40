//! Entry points that set up a traversal from raw coordinates and options.
use crate::{
    grid::{CellId, Codec},
    options::HashOptions,
    polygon_set::{Coordinates, PolygonSet},
    scanner::RowScanner,
    stream::{CellStream, OutputMode},
    Result,
};
use rayon::prelude::*;

/// Lazily cover `coordinates`, yielding rows or cells according to
/// `options.row_mode`.
pub fn stream(coordinates: Coordinates, options: &HashOptions) -> Result<CellStream<Codec>> {
    let polygons = PolygonSet::from_coordinates(coordinates)?;
    let scanner = RowScanner::from_options(polygons, options)?;
    Ok(CellStream::new(
        scanner,
        OutputMode::from_row_mode(options.row_mode),
    ))
}

/// Collect the complete cover of `coordinates`, in row then column order.
///
/// Cells are not deduplicated: overlapping member polygons report shared cells
/// once per polygon.
pub fn polygon_hash(coordinates: Coordinates, options: &HashOptions) -> Result<Vec<CellId>> {
    stream(coordinates, options)?.cells().collect()
}

/// Cover independent inputs in parallel. Results are in input order.
pub fn polygon_hash_many(
    inputs: Vec<Coordinates>,
    options: &HashOptions,
) -> Vec<Result<Vec<CellId>>> {
    inputs
        .into_par_iter()
        .map(|coordinates| polygon_hash(coordinates, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HashMode;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn coordinates(json: &str) -> Coordinates {
        serde_json::from_str(json).expect("coordinates")
    }

    fn with_mode(precision: usize, hash_mode: HashMode, threshold: f64) -> HashOptions {
        HashOptions {
            precision,
            hash_mode,
            threshold,
            ..HashOptions::default()
        }
    }

    const UNIT_SQUARE: &str = "[[[0,0],[0,1],[1,1],[1,0],[0,0]]]";

    #[test]
    fn test_unit_square_at_precision_one() {
        let options = with_mode(1, HashMode::Extent, 0.0);
        let cells = polygon_hash(coordinates(UNIT_SQUARE), &options).expect("cells");
        assert_eq!(vec![CellId::Hash("s".to_string())], cells);

        let rows = stream(
            coordinates(UNIT_SQUARE),
            &HashOptions {
                row_mode: true,
                ..options
            },
        )
        .expect("stream")
        .count();
        // [0, 1] lies within the single precision 1 row [0, 45]
        assert_eq!(1, rows);
    }

    #[test]
    fn test_idempotent() {
        let square = "[[[10.1,20.1],[10.1,21.3],[11.7,21.3],[11.7,20.1],[10.1,20.1]]]";
        for mode in [HashMode::Inside, HashMode::Extent, HashMode::Intersect] {
            let options = with_mode(4, mode, 0.4);
            let first = polygon_hash(coordinates(square), &options).expect("first");
            let second = polygon_hash(coordinates(square), &options).expect("second");
            assert!(!first.is_empty());
            assert_eq!(first, second, "{mode}");
        }
    }

    #[test]
    fn test_integer_mode() {
        let options = HashOptions {
            precision: 20,
            integer_mode: true,
            hash_mode: HashMode::Extent,
            ..HashOptions::default()
        };
        let square = "[[[10.1,20.1],[10.1,21.3],[11.7,21.3],[11.7,20.1],[10.1,20.1]]]";
        let bits = polygon_hash(coordinates(square), &options).expect("bits");
        let hashes = polygon_hash(coordinates(square), &with_mode(4, HashMode::Extent, 0.0))
            .expect("hashes");
        assert!(bits.iter().all(|cell| matches!(cell, CellId::Bits(_))));
        // same grid, different names
        assert_eq!(hashes.len(), bits.len());
    }

    #[test]
    fn test_invalid_input() {
        let err = polygon_hash(coordinates("[[[0,0],[1,1],[0,0]]]"), &HashOptions::default())
            .expect_err("short ring");
        assert!(err.is_invalid_geometry());
        let err = polygon_hash(
            coordinates(UNIT_SQUARE),
            &HashOptions {
                precision: 0,
                ..HashOptions::default()
            },
        )
        .expect_err("precision");
        assert!(err.is_invalid_option());
    }

    #[test]
    fn test_overlapping_polygons_are_not_deduplicated() {
        let twice = "[
            [[[1,1],[1,2],[2,2],[2,1],[1,1]]],
            [[[1,1],[1,2],[2,2],[2,1],[1,1]]]
        ]";
        let options = with_mode(2, HashMode::Extent, 0.0);
        let cells = polygon_hash(coordinates(twice), &options).expect("cells");
        let once = polygon_hash(coordinates("[[[1,1],[1,2],[2,2],[2,1],[1,1]]]"), &options)
            .expect("cells");
        assert_eq!(2, cells.len());
        assert_eq!(cells[0], cells[1]);
        assert_eq!(1, once.len());
    }

    #[test]
    fn test_polygon_hash_many() {
        let inputs = vec![
            coordinates(UNIT_SQUARE),
            coordinates("[]"),
            coordinates("[[[-71.2,42.1],[-71.2,42.6],[-70.8,42.6],[-70.8,42.1],[-71.2,42.1]]]"),
        ];
        let options = with_mode(5, HashMode::Inside, 0.0);
        let results = polygon_hash_many(inputs.clone(), &options);
        assert_eq!(3, results.len());
        assert!(results[1].as_ref().is_err());
        for (input, result) in inputs.into_iter().zip(results) {
            match (polygon_hash(input, &options), result) {
                (Ok(expected), Ok(actual)) => assert_eq!(expected, actual),
                (Err(_), Err(_)) => (),
                (expected, actual) => panic!("{expected:?} != {actual:?}"),
            }
        }
    }

    /// Rectangles and right triangles away from the poles and the antimeridian.
    fn convex_polygon() -> impl Strategy<Value = Coordinates> {
        (
            -170.0..160.0f64,
            -80.0..70.0f64,
            0.01..5.0f64,
            0.01..5.0f64,
            any::<bool>(),
        )
            .prop_map(|(west, south, width, height, triangle)| {
                let (east, north) = (west + width, south + height);
                let ring = if triangle {
                    vec![
                        vec![west, south],
                        vec![east, south],
                        vec![west, north],
                        vec![west, south],
                    ]
                } else {
                    vec![
                        vec![west, south],
                        vec![east, south],
                        vec![east, north],
                        vec![west, north],
                        vec![west, south],
                    ]
                };
                Coordinates::Polygon(vec![ring])
            })
    }

    fn cover(polygon: &Coordinates, options: &HashOptions) -> Vec<CellId> {
        polygon_hash(polygon.clone(), options).expect("cover")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn inside_is_a_subset_of_extent(polygon in convex_polygon(), precision in 1..=4usize) {
            let inside = cover(&polygon, &with_mode(precision, HashMode::Inside, 0.0));
            let extent = cover(&polygon, &with_mode(precision, HashMode::Extent, 0.0));
            prop_assert!(inside.len() <= extent.len());
            let extent: HashSet<_> = extent.into_iter().collect();
            prop_assert!(inside.iter().all(|cell| extent.contains(cell)));
        }

        #[test]
        fn intersect_at_zero_threshold_is_extent(
            polygon in convex_polygon(),
            precision in 1..=4usize,
        ) {
            let intersect = cover(&polygon, &with_mode(precision, HashMode::Intersect, 0.0));
            let extent = cover(&polygon, &with_mode(precision, HashMode::Extent, 0.0));
            prop_assert_eq!(intersect, extent);
        }

        #[test]
        fn full_overlap_cells_are_inside(polygon in convex_polygon(), precision in 2..=4usize) {
            let full = cover(&polygon, &with_mode(precision, HashMode::Intersect, 1.0));
            let inside: HashSet<_> = cover(&polygon, &with_mode(precision, HashMode::Inside, 0.0))
                .into_iter()
                .collect();
            prop_assert!(full.iter().all(|cell| inside.contains(cell)), "{:?} not inside", full);
        }

        #[test]
        fn rows_flatten_to_cells(polygon in convex_polygon(), precision in 1..=4usize) {
            let cells_options = with_mode(precision, HashMode::Inside, 0.0);
            let rows_options = HashOptions { row_mode: true, ..cells_options.clone() };
            let flattened: Vec<CellId> = stream(polygon.clone(), &rows_options)
                .expect("stream")
                .map(|emission| emission.expect("row").into_cells())
                .collect::<Vec<_>>()
                .concat();
            let single = cover(&polygon, &cells_options);
            prop_assert_eq!(flattened, single);
        }
    }
}

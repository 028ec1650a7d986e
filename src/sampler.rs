use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::{ProbeVolumeError, Result},
    points::centered_box,
    types::{LayerMask, Point, Value, Vector},
};

/// Number of grid points along one axis for the given full extent.
///
/// The grid starts at `-extent / 2` and is boundary inclusive, so an extent
/// that is an exact multiple of `spacing` still lands a point on the far
/// face. Negative extents are treated as zero width and yield the single
/// coordinate `0`.
#[inline]
pub fn axis_steps(extent: Value, spacing: Value) -> usize {
    (extent.max(0.0) / spacing).floor() as usize + 1
}

/// Grid point counts along x, y and z for a box of the given size.
///
/// Fails with [`ProbeVolumeError::InvalidSpacing`] when `spacing` is zero,
/// negative or non-finite, and with [`ProbeVolumeError::InvalidBoxSize`] when
/// a size component is non-finite. Negative components clamp to zero width.
pub fn grid_counts(size: Vector, spacing: Value) -> Result<[usize; 3]> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(ProbeVolumeError::InvalidSpacing);
    }
    if !(size.x.is_finite() && size.y.is_finite() && size.z.is_finite()) {
        return Err(ProbeVolumeError::InvalidBoxSize);
    }

    Ok([
        axis_steps(size.x, spacing),
        axis_steps(size.y, spacing),
        axis_steps(size.z, spacing),
    ])
}

/// Fills an origin-centered box with a regular grid of probe points and
/// returns the accepted positions in local space.
///
/// Grid coordinates are derived per axis as `min + i * spacing` rather than
/// by accumulating `spacing` in a float loop, so the point count is exactly
/// `floor(size/spacing) + 1` per axis regardless of rounding drift.
///
/// Each candidate is mapped to world space through `transform`; when an
/// `oracle` is given, candidates whose world position has geometry within
/// `margin` (restricted to `mask`) are discarded. Without an oracle every
/// grid point is kept. Passing `None` is how callers disable avoidance.
///
/// X slices are fanned out to Rayon workers and merged back in x order, so
/// the output is deterministic for a deterministic oracle. The oracle only
/// needs to tolerate concurrent read access.
///
/// ```text
/// Per candidate:
/// 1. local = (min.x + i·s, min.y + j·s, min.z + k·s)
/// 2. world = transform(local)
/// 3. oracle(world, margin, mask)?  →  discard on true
/// 4. keep local
/// ```
pub fn sample_grid<T>(
    size: Vector,
    spacing: Value,
    transform: T,
    oracle: Option<&(dyn Fn(Point, Value, LayerMask) -> bool + Send + Sync)>,
    margin: Value,
    mask: LayerMask,
) -> Result<Vec<Point>>
where
    T: Fn(Point) -> Point + Sync,
{
    let [nx, ny, nz] = grid_counts(size, spacing)?;
    let [min, _] = centered_box(size);

    log::debug!("Sampling {}x{}x{} probe grid...", nx, ny, nz);

    let transform = &transform;
    let per_x: Vec<Vec<Point>> = (0..nx)
        .into_par_iter()
        .map(|i| {
            let mut local: Vec<Point> = Vec::with_capacity(ny * nz);
            let x = min.x + i as Value * spacing;

            for j in 0..ny {
                let y = min.y + j as Value * spacing;
                for k in 0..nz {
                    let z = min.z + k as Value * spacing;
                    let pos = Point::new(x, y, z);

                    let intersecting = match oracle {
                        Some(query) => query(transform(pos), margin, mask),
                        None => false,
                    };
                    if !intersecting {
                        local.push(pos);
                    }
                }
            }
            local
        })
        .collect();

    // Merge per-X slices into a single point buffer
    let total: usize = per_x.iter().map(|v| v.len()).sum();
    let mut points: Vec<Point> = Vec::with_capacity(total);
    for mut slice in per_x {
        points.append(&mut slice);
    }

    log::debug!(
        "Kept {} of {} probe candidates",
        points.len(),
        nx * ny * nz
    );

    Ok(points)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::points::{enclosing_size, inside_centered_box};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn identity(p: Point) -> Point {
        p
    }

    #[test]
    fn test_count_formula() {
        let size = Vector::new(3.0, 1.5, 0.4);
        let spacing = 0.5;
        let points = sample_grid(size, spacing, identity, None, 0.0, LayerMask::ALL).unwrap();

        let expected: usize = [size.x, size.y, size.z]
            .iter()
            .map(|extent| (extent / spacing).floor() as usize + 1)
            .product();
        assert_eq!(points.len(), expected);
    }

    #[test]
    fn test_two_unit_box_yields_27_lattice_points() {
        let points = sample_grid(
            Vector::new(2.0, 2.0, 2.0),
            1.0,
            identity,
            None,
            0.0,
            LayerMask::ALL,
        )
        .unwrap();

        assert_eq!(points.len(), 27);
        for p in &points {
            for c in [p.x, p.y, p.z] {
                assert!(
                    [-1.0, 0.0, 1.0].iter().any(|v| (c - v).abs() < 1e-6),
                    "coordinate {} not on the unit lattice",
                    c
                );
            }
        }
    }

    #[test]
    fn test_spacing_wider_than_box_yields_single_min_corner() {
        let points = sample_grid(
            Vector::new(1.0, 1.0, 1.0),
            2.0,
            identity,
            None,
            0.0,
            LayerMask::ALL,
        )
        .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0], Point::new(-0.5, -0.5, -0.5));
    }

    #[test]
    fn test_invalid_spacing_is_rejected() {
        for spacing in [0.0, -1.0, Value::NAN, Value::INFINITY] {
            let result = sample_grid(
                Vector::new(1.0, 1.0, 1.0),
                spacing,
                identity,
                None,
                0.0,
                LayerMask::ALL,
            );
            assert_eq!(result.unwrap_err(), ProbeVolumeError::InvalidSpacing);
        }
    }

    #[test]
    fn test_non_finite_size_is_rejected() {
        let result = sample_grid(
            Vector::new(1.0, Value::NAN, 1.0),
            1.0,
            identity,
            None,
            0.0,
            LayerMask::ALL,
        );
        assert_eq!(result.unwrap_err(), ProbeVolumeError::InvalidBoxSize);
    }

    #[test]
    fn test_negative_size_component_clamps_to_zero_width() {
        let points = sample_grid(
            Vector::new(2.0, -3.0, 2.0),
            1.0,
            identity,
            None,
            0.0,
            LayerMask::ALL,
        )
        .unwrap();

        // 3 x 1 x 3 grid, flat in y
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn test_rejecting_oracle_yields_empty_set() {
        let everything = |_: Point, _: Value, _: LayerMask| true;
        let points = sample_grid(
            Vector::new(2.0, 2.0, 2.0),
            1.0,
            identity,
            Some(&everything),
            0.2,
            LayerMask::ALL,
        )
        .unwrap();

        assert!(points.is_empty());
    }

    #[test]
    fn test_permissive_oracle_matches_no_oracle() {
        let nothing = |_: Point, _: Value, _: LayerMask| false;
        let size = Vector::new(2.0, 1.0, 2.0);

        let with_oracle =
            sample_grid(size, 0.5, identity, Some(&nothing), 0.2, LayerMask::ALL).unwrap();
        let without = sample_grid(size, 0.5, identity, None, 0.2, LayerMask::ALL).unwrap();

        assert_eq!(with_oracle, without);
    }

    #[test]
    fn test_filtered_output_is_subset_of_unfiltered() {
        let half_space = |world: Point, _: Value, _: LayerMask| world.x > 0.25;
        let size = Vector::new(2.0, 2.0, 2.0);

        let filtered =
            sample_grid(size, 0.5, identity, Some(&half_space), 0.2, LayerMask::ALL).unwrap();
        let unfiltered = sample_grid(size, 0.5, identity, None, 0.2, LayerMask::ALL).unwrap();

        assert!(!filtered.is_empty());
        assert!(filtered.len() < unfiltered.len());
        assert!(filtered.iter().all(|p| unfiltered.contains(p)));
    }

    #[test]
    fn test_oracle_sees_world_space_but_output_stays_local() {
        // Translate by +10 on x; reject everything right of the world origin
        // plane at x = 10, keeping only the negative local-x half.
        let shift = |p: Point| Point::new(p.x + 10.0, p.y, p.z);
        let wall = |world: Point, _: Value, _: LayerMask| world.x > 10.0;

        let points = sample_grid(
            Vector::new(2.0, 2.0, 2.0),
            1.0,
            shift,
            Some(&wall),
            0.2,
            LayerMask::ALL,
        )
        .unwrap();

        assert_eq!(points.len(), 18);
        assert!(points.iter().all(|p| p.x <= 0.0));
        assert!(points.iter().all(|p| p.x >= -1.0));
    }

    #[test]
    fn test_margin_and_mask_reach_the_oracle_unchanged() {
        let queries = AtomicUsize::new(0);
        let mask = LayerMask::layer(5) | LayerMask::layer(7);
        let spy = |_: Point, margin: Value, seen: LayerMask| {
            assert_eq!(margin, 0.35);
            assert_eq!(seen, mask);
            queries.fetch_add(1, Ordering::Relaxed);
            false
        };

        let points = sample_grid(
            Vector::new(1.0, 1.0, 1.0),
            0.5,
            identity,
            Some(&spy),
            0.35,
            mask,
        )
        .unwrap();

        assert_eq!(queries.load(Ordering::Relaxed), points.len());
        assert_eq!(points.len(), 27);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let oracle = |world: Point, margin: Value, _: LayerMask| world.coords.norm() < margin;

        let a = sample_grid(
            Vector::new(3.0, 2.0, 3.0),
            0.7,
            identity,
            Some(&oracle),
            1.0,
            LayerMask::ALL,
        )
        .unwrap();
        let b = sample_grid(
            Vector::new(3.0, 2.0, 3.0),
            0.7,
            identity,
            Some(&oracle),
            1.0,
            LayerMask::ALL,
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_samples_never_escape_the_box() {
        let size = Vector::new(2.5, 1.3, 4.1);
        let points = sample_grid(size, 0.6, identity, None, 0.0, LayerMask::ALL).unwrap();

        assert!(
            points
                .iter()
                .all(|p| inside_centered_box(*p, size, 1e-5))
        );

        let refit = enclosing_size(points.iter().copied());
        assert!(refit.x <= size.x + 1e-5);
        assert!(refit.y <= size.y + 1e-5);
        assert!(refit.z <= size.z + 1e-5);
    }
}

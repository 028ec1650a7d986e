use bevy::prelude::*;

use crate::types::{Point, Value, Vector};

/// The probe positions stored on a volume entity, in the entity's local space.
///
/// This is the persisted artifact: sampling writes it, bounds inference reads
/// it. World-space positions are obtained by running the owning entity's
/// transform over each point; the set itself never stores world coordinates.
#[derive(Component, Debug, Clone, Default)]
pub struct ProbeSet {
    points: Vec<Point>,
}

impl ProbeSet {
    /// Creates a set from local-space positions.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of stored probes.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the local-space probe positions.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Read access to the backing storage.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Replaces the stored probes with a freshly sampled batch.
    pub fn replace(&mut self, points: Vec<Point>) {
        self.points = points;
    }

    /// Size of the smallest origin-centered box enclosing every probe.
    ///
    /// See [`enclosing_size`].
    pub fn enclosing_size(&self) -> Vector {
        enclosing_size(self.points.iter().copied())
    }
}

/// Computes the full extents of the smallest origin-centered axis-aligned box
/// that encloses all of the points returned by the given iterator.
///
/// Per axis this is twice the maximum absolute coordinate. An empty iterator
/// yields a zero vector; callers that want to keep an earlier size for empty
/// input have to check themselves.
pub fn enclosing_size<P>(points: P) -> Vector
where
    P: IntoIterator<Item = Point>,
{
    let half = points.into_iter().fold(Vector::zeros(), |half, p| {
        Vector::new(
            half.x.max(p.x.abs()),
            half.y.max(p.y.abs()),
            half.z.max(p.z.abs()),
        )
    });

    half * 2.0
}

/// Half extents of an origin-centered box, with negative size components
/// treated as zero width.
pub fn half_extents(size: Vector) -> Vector {
    Vector::new(
        size.x.max(0.0) / 2.0,
        size.y.max(0.0) / 2.0,
        size.z.max(0.0) / 2.0,
    )
}

/// Returns the `[min, max]` corners of an origin-centered box with the given
/// full extents.
pub fn centered_box(size: Vector) -> [Point; 2] {
    let half = half_extents(size);
    [Point::from(-half), Point::from(half)]
}

/// Whether `point` lies inside the origin-centered box of the given size,
/// within `tolerance` on each axis.
pub fn inside_centered_box(point: Point, size: Vector, tolerance: Value) -> bool {
    let half = half_extents(size);
    point.x.abs() <= half.x + tolerance
        && point.y.abs() <= half.y + tolerance
        && point.z.abs() <= half.z + tolerance
}

#[cfg(test)]
mod test {

    use super::*;
    use std::iter;

    #[test]
    fn test_enclosing_size_empty() {
        assert_eq!(enclosing_size(iter::empty()), Vector::zeros());
    }

    #[test]
    fn test_enclosing_size_single_point() {
        let size = enclosing_size(iter::once(Point::new(1.0, -2.0, 3.0)));
        assert_eq!(size, Vector::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_enclosing_size_takes_max_per_axis() {
        let size = enclosing_size(vec![
            Point::new(-0.5, 0.25, 1.0),
            Point::new(0.5, -0.75, 0.0),
            Point::new(0.25, 0.5, -2.0),
        ]);
        assert_eq!(size, Vector::new(1.0, 1.5, 4.0));
    }

    #[test]
    fn test_probe_set_enclosing_size() {
        let set = ProbeSet::from_points(vec![
            Point::new(-1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.5),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.enclosing_size(), Vector::new(2.0, 2.0, 1.0));
    }

    #[test]
    fn test_centered_box_corners() {
        let [min, max] = centered_box(Vector::new(2.0, 4.0, 1.0));
        assert_eq!(min, Point::new(-1.0, -2.0, -0.5));
        assert_eq!(max, Point::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_negative_size_clamps_to_zero_width() {
        let [min, max] = centered_box(Vector::new(-3.0, 2.0, -0.1));
        assert_eq!(min, Point::new(0.0, -1.0, 0.0));
        assert_eq!(max, Point::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_inside_centered_box() {
        let size = Vector::new(2.0, 2.0, 2.0);
        assert!(inside_centered_box(Point::new(1.0, -1.0, 0.0), size, 1e-6));
        assert!(!inside_centered_box(Point::new(1.1, 0.0, 0.0), size, 1e-6));
    }
}

use nalgebra::{Point3, Vector3};

/// Scalar used for coordinates, spacings and distances.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// A collision query function: answers whether any geometry selected by the
/// [`LayerMask`] lies within `margin` of the world-space point.
///
/// A return value of `true` means the candidate probe is **rejected**.
pub type CollisionQuery = dyn Fn(Point, Value, LayerMask) -> bool + Send + Sync;

/// An opaque bitset selecting which geometry categories participate in
/// collision queries.
///
/// The sampler never interprets the bits; they are handed to the
/// [`CollisionQuery`] unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches every layer.
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Matches no layer.
    pub const NONE: LayerMask = LayerMask(0);

    /// Mask with only the given layer bit set.
    ///
    /// # Panics
    /// Panics (in debug) if `layer` is 32 or more.
    pub fn layer(layer: u32) -> LayerMask {
        debug_assert!(layer < 32);
        LayerMask(1 << layer)
    }

    /// Whether the two masks share at least one layer.
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for LayerMask {
    type Output = LayerMask;

    fn bitand(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 & rhs.0)
    }
}

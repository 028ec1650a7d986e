use bevy::prelude::*;

use crate::{
    points::{ProbeSet, enclosing_size},
    types::{LayerMask, Value, Vector},
};

/// A box volume to be filled with a regular grid of probe points.
///
/// The box is axis-aligned in the entity's local space and centered on the
/// local origin; `size` holds the full extents along each axis. The entity's
/// [`Transform`] carries the volume into world space, which is where
/// collision queries run. Sampled probes land in the entity's [`ProbeSet`]
/// in local space.
#[derive(Component, Debug, Clone)]
#[require(Transform)]
pub struct ProbeVolume {
    /// Full extents of the box along each local axis.
    pub size: Vector,
    /// Distance between neighbouring grid points; must be > 0 to sample.
    pub spacing: Value,
    /// When `true`, probes closer than [`margin`](ProbeVolume::margin) to
    /// scene geometry are discarded.
    pub avoid_geometry: bool,
    /// Minimum clearance between a probe and any geometry selected by
    /// [`mask`](ProbeVolume::mask), in world units.
    pub margin: Value,
    /// Which geometry categories participate in avoidance queries.
    pub mask: LayerMask,
}

impl Default for ProbeVolume {
    fn default() -> Self {
        Self {
            size: Vector::new(1.0, 1.0, 1.0),
            spacing: 1.0,
            avoid_geometry: true,
            margin: 0.2,
            mask: LayerMask::ALL,
        }
    }
}

impl ProbeVolume {
    /// Creates a volume with the given full extents and default sampling
    /// parameters.
    pub fn new(size: Vector) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Sets the grid spacing.
    pub fn with_spacing(mut self, spacing: Value) -> Self {
        self.spacing = spacing;
        self
    }

    /// Enables or disables geometry avoidance.
    pub fn with_avoidance(mut self, avoid_geometry: bool) -> Self {
        self.avoid_geometry = avoid_geometry;
        self
    }

    /// Sets the required clearance to scene geometry.
    pub fn with_margin(mut self, margin: Value) -> Self {
        self.margin = margin;
        self
    }

    /// Restricts avoidance queries to the given layers.
    pub fn with_mask(mut self, mask: LayerMask) -> Self {
        self.mask = mask;
        self
    }

    /// Shrink-wraps the box onto an existing probe set.
    ///
    /// Sets `size` to the smallest origin-centered box enclosing every probe.
    /// An empty set leaves the current size untouched, so a volume keeps its
    /// hand-edited extents when its probes have been cleared.
    pub fn fit_to(&mut self, probes: &ProbeSet) {
        if !probes.is_empty() {
            self.size = enclosing_size(probes.iter().copied());
        }
    }
}

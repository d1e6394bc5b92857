use serde::{Deserialize, Serialize};

use crate::core::Float;

/// Specifies the type of interaction of light with a sequential model
/// surface.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Refracting,
    Reflecting,
}

/// Specifies a surface in a sequential optical system.
///
/// `Object`, `Image`, `Probe`, and `Stop` carry no geometry of their own other
/// than a semi-diameter: `Object`, `Image`, and `Probe` have theirs derived
/// during [`build`](crate::Engine::build) from the neighboring conic
/// surfaces, while `Stop` declares its own.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum SurfaceSpec {
    Object,
    Image,
    /// A reference surface with no effect on rays, used to record
    /// intersections at an arbitrary axial location.
    Probe,
    Stop {
        semi_diameter: Float,
    },
    Conic {
        semi_diameter: Float,
        radius_of_curvature: Float,
        conic_constant: Float,
        kind: SurfaceKind,
    },
}

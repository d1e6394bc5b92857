/// Constants used by the mathematics module.
use crate::core::Float;

/// The tolerance to use when comparing geometrical values to zero.
///
/// The rationale for this value is as follows:
/// - The smallest possible feature size in optical systems is typically around the
///   wavelength of light, or 1 micron (1e-6 meters).
/// - Optical systems are specified in units from millimeters to meters.
/// - When specified in millimeters, we can expect distances up to a maximum of
///   10,000 mm. At this scale, 1e-10 = ~55 ULPs in 64-bit floating point arithmetic.
/// - When specified in meters, we can expect distances up to a maximum of 10 m. At
///   this scale, 1e-10 = ~56,000 ULPs.
/// - Most geometrical operations should only accumulate a few ULPs of error because
///   they are non-iterative.
pub const GEOM_ZERO_TOL: Float = 1e-10;

/// The tolerance below which a quadratic (or linearized) intersection
/// denominator is treated as zero.
pub const SOLVER_DENOM_TOL: Float = 1e-12;

/// The amount by which a ray's transverse radius is allowed to exceed a
/// surface's semi-diameter before it is considered vignetted.
///
/// This absorbs rounding error accumulated by the intersection solver so that
/// rays landing exactly on the clear aperture boundary are not spuriously
/// vignetted.
pub const APERTURE_OVER_TOL: Float = 1e-9;

//! Stable error types returned across the engine's external interface.
//!
//! [`SystemError`] is returned by [`build`](crate::Engine::build) and halts
//! the build pipeline at the first offending surface or gap. It is
//! deliberately small and serializable so that it can cross a host boundary
//! (e.g. as JSON in the [message protocol](crate::protocol)) without carrying
//! any non-portable state. [`TerminationReason`] plays the same role for
//! individual ray terminations recorded in a [`RayBundle`](crate::RayBundle).
use serde::{Deserialize, Serialize};

use crate::core::Float;

/// The stable enumeration of ways a system can fail to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemErrorKind {
    /// The surface or gap list does not have the required shape (e.g. fewer
    /// than two surfaces, the first surface is not an object, the last is
    /// not an image, or the gap count does not match the surface count).
    ShapeInvalid,

    /// A conic surface's semi-diameter exceeds what its radius of curvature
    /// and conic constant can geometrically support.
    GeometryUnrealizable,

    /// A gap referenced a material by name that no configured catalog could
    /// resolve.
    MaterialUnknown,

    /// More than one surface was tagged as the aperture stop, or the
    /// paraxial marginal ray used to infer the stop could not be traced.
    AmbiguousStop,

    /// A computed quantity (e.g. a semi-diameter, thickness, or wavelength)
    /// was NaN or infinite where a finite value was required.
    NonFinite,
}

/// An error halting [`build`](crate::Engine::build), identifying the first
/// offending surface or gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?} at index {surface_or_gap_index:?}: {message}")]
pub struct SystemError {
    pub kind: SystemErrorKind,

    /// The index of the offending surface or gap, if the error can be
    /// localized to one.
    pub surface_or_gap_index: Option<usize>,

    pub message: String,
}

impl SystemError {
    pub(crate) fn new(
        kind: SystemErrorKind,
        surface_or_gap_index: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            surface_or_gap_index,
            message: message.into(),
        }
    }

    pub(crate) fn shape_invalid(message: impl Into<String>) -> Self {
        Self::new(SystemErrorKind::ShapeInvalid, None, message)
    }

    pub(crate) fn geometry_unrealizable(index: usize, message: impl Into<String>) -> Self {
        Self::new(SystemErrorKind::GeometryUnrealizable, Some(index), message)
    }

    pub(crate) fn material_unknown(index: usize, name: &str) -> Self {
        Self::new(
            SystemErrorKind::MaterialUnknown,
            Some(index),
            format!("no material catalog entry for '{name}'"),
        )
    }

    pub(crate) fn ambiguous_stop(message: impl Into<String>) -> Self {
        Self::new(SystemErrorKind::AmbiguousStop, None, message)
    }

    pub(crate) fn non_finite(index: Option<usize>, message: impl Into<String>) -> Self {
        Self::new(SystemErrorKind::NonFinite, index, message)
    }
}

/// The stable enumeration of reasons a single ray can terminate before
/// reaching the image surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The ray's trajectory does not intersect the surface's conic at any
    /// positive path length.
    MissedSurface,

    /// The ray intersects the surface outside its clear aperture.
    Vignetted,

    /// Refraction into a rarer medium exceeded the critical angle.
    TotalInternalReflection,
}

/// A single surface-intersection quantity that failed a finiteness check
/// during layout or analysis; used internally to build [`SystemError`]s of
/// kind [`NonFinite`](SystemErrorKind::NonFinite).
pub(crate) fn require_finite(value: Float, index: Option<usize>, what: &str) -> Result<Float, SystemError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SystemError::non_finite(
            index,
            format!("{what} is not finite: {value}"),
        ))
    }
}

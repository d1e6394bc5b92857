use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::Float;

/// Specifies how a field's pupil is sampled with rays, in unit-pupil
/// coordinates (i.e. normalized so the pupil is a disk of radius 1).
///
/// Implementers carrying pupil coordinates from a system specified in real
/// (mm) units must rescale them into unit-pupil coordinates before handing a
/// spacing to this engine.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum PupilSampling {
    /// Samples the unit pupil on a square grid with the given spacing,
    /// keeping only points that fall within the unit circle.
    SquareGrid { spacing: Float },
}

impl PupilSampling {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::SquareGrid { spacing } => {
                if !spacing.is_finite() || *spacing <= 0.0 || *spacing > 2.0 {
                    return Err(anyhow!(
                        "pupil sampling spacing must be finite and in (0, 2], got {spacing}"
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Specifies a field point to be traced through the system.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum FieldSpec {
    /// A field at infinite conjugate, specified by its angle (in degrees)
    /// with respect to the optical axis.
    Angle {
        angle_deg: Float,
        pupil_sampling: PupilSampling,
    },

    /// A field at finite conjugate, specified by its transverse position in
    /// the object plane. The axial position of the object plane is
    /// determined by the system's first gap.
    PointSource {
        x: Float,
        y: Float,
        pupil_sampling: PupilSampling,
    },
}

impl FieldSpec {
    pub(crate) fn pupil_sampling(&self) -> PupilSampling {
        match self {
            Self::Angle { pupil_sampling, .. } => *pupil_sampling,
            Self::PointSource { pupil_sampling, .. } => *pupil_sampling,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Angle {
                angle_deg,
                pupil_sampling,
            } => {
                if !angle_deg.is_finite() || angle_deg.abs() > 90.0 {
                    return Err(anyhow!(
                        "field angle must be finite and at most 90 degrees, got {angle_deg}"
                    ));
                }
                pupil_sampling.validate()
            }
            Self::PointSource {
                x,
                y,
                pupil_sampling,
            } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(anyhow!(
                        "point source field coordinates must be finite, got ({x}, {y})"
                    ));
                }
                pupil_sampling.validate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_field_rejects_nan() {
        let field = FieldSpec::Angle {
            angle_deg: Float::NAN,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        };
        assert!(field.validate().is_err());
    }

    #[test]
    fn angle_field_rejects_out_of_range() {
        let field = FieldSpec::Angle {
            angle_deg: 91.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        };
        assert!(field.validate().is_err());
    }

    #[test]
    fn angle_field_accepts_90_degrees() {
        let field = FieldSpec::Angle {
            angle_deg: 90.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        };
        assert!(field.validate().is_ok());
    }

    #[test]
    fn point_source_field_rejects_infinite_coordinates() {
        let field = FieldSpec::PointSource {
            x: Float::INFINITY,
            y: 0.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        };
        assert!(field.validate().is_err());
    }

    #[test]
    fn pupil_sampling_rejects_out_of_range_spacing() {
        assert!(PupilSampling::SquareGrid { spacing: 0.0 }.validate().is_err());
        assert!(PupilSampling::SquareGrid { spacing: 2.5 }.validate().is_err());
        assert!(PupilSampling::SquareGrid { spacing: 0.1 }.validate().is_ok());
    }
}

//! A ~50 mm EFL convexplano lens: Scenario A/B of the canonical test suite.
use crate::core::sequential_model::SequentialModel;
use crate::materials::Medium;
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};
use crate::core::Float;

pub fn specs() -> (Vec<SurfaceSpec>, Vec<GapSpec>) {
    let air = Medium::RefractiveIndex(1.0);
    let nbk7 = Medium::RefractiveIndex(1.515);

    let gaps = vec![
        GapSpec {
            thickness: Float::INFINITY,
            medium: air.clone(),
        },
        GapSpec {
            thickness: 5.3,
            medium: nbk7,
        },
        GapSpec {
            thickness: 46.6,
            medium: air,
        },
    ];

    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 12.5,
            radius_of_curvature: 25.8,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 12.5,
            radius_of_curvature: Float::INFINITY,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Image,
    ];

    (surfaces, gaps)
}

pub fn sequential_model() -> SequentialModel {
    let (surfaces, gaps) = specs();
    SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
}

/// The same lens, modeled at the supplied wavelengths (constant-index media
/// have no dispersion, but this is useful for exercising multi-wavelength
/// bookkeeping such as `primary_axial_color`).
pub fn sequential_model_at_wavelengths(wavelengths: &[Float]) -> SequentialModel {
    let (surfaces, gaps) = specs();
    SequentialModel::new(&gaps, &surfaces, wavelengths, None).unwrap()
}

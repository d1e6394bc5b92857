//! A Petzval lens: Scenario C of the canonical test suite (explicit stop at
//! surface index 4, no vignetting for 0deg/5deg fields).
use crate::core::sequential_model::SequentialModel;
use crate::n;
use crate::specs::fields::{FieldSpec, PupilSampling};
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};
use crate::core::Float;

pub fn specs() -> (Vec<SurfaceSpec>, Vec<GapSpec>) {
    let air = n!(1.0);

    let gaps = vec![
        GapSpec { thickness: Float::INFINITY, medium: air.clone() },
        GapSpec { thickness: 13.0, medium: n!(1.5168) },
        GapSpec { thickness: 4.0, medium: n!(1.6645) },
        GapSpec { thickness: 40.0, medium: air.clone() },
        GapSpec { thickness: 40.0, medium: air.clone() },
        GapSpec { thickness: 12.0, medium: n!(1.6074) },
        GapSpec { thickness: 3.0, medium: n!(1.6727) },
        GapSpec { thickness: 46.82210, medium: air.clone() },
        GapSpec { thickness: 2.0, medium: n!(1.6727) },
        GapSpec { thickness: 1.87179, medium: air },
    ];

    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 28.478,
            radius_of_curvature: 99.56266,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 26.276,
            radius_of_curvature: -86.84002,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 21.02,
            radius_of_curvature: -1187.63858,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Stop { semi_diameter: 16.631 },
        SurfaceSpec::Conic {
            semi_diameter: 20.543,
            radius_of_curvature: 57.47491,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 20.074,
            radius_of_curvature: -54.61685,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 20.074,
            radius_of_curvature: -614.68633,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 17.297,
            radius_of_curvature: -38.17110,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 18.94,
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

pub fn field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::Angle {
            angle_deg: 0.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        },
        FieldSpec::Angle {
            angle_deg: 5.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
        },
    ]
}

pub const APERTURE_STOP: usize = 4;

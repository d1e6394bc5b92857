//! A f=+100 mm concave mirror: Scenario D of the canonical test suite.
use crate::core::sequential_model::SequentialModel;
use crate::materials::Medium;
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};
use crate::core::Float;

pub fn sequential_model() -> SequentialModel {
    let air = Medium::RefractiveIndex(1.0);

    let gaps = vec![
        GapSpec {
            thickness: Float::INFINITY,
            medium: air.clone(),
        },
        GapSpec {
            thickness: 100.0,
            medium: air,
        },
    ];

    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 12.5,
            radius_of_curvature: -200.0,
            conic_constant: 0.0,
            kind: SurfaceKind::Reflecting,
        },
        SurfaceSpec::Image,
    ];

    SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
}

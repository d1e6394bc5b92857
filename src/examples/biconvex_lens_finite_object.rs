//! A f = +100 mm biconvex lens with an object at a finite distance.
//!
//! Thorlabs Part No.: LB1676-A. Used to exercise `FieldSpec::PointSource`
//! fields, which require a finite object distance (invariant 6).
use crate::core::Float;
use crate::core::sequential_model::SequentialModel;
use crate::n;
use crate::specs::fields::{FieldSpec, PupilSampling};
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};

pub fn sequential_model() -> SequentialModel {
    let air = n!(1.0);
    let nbk7 = n!(1.5168);

    let gaps = vec![
        GapSpec {
            thickness: 200.0,
            medium: air.clone(),
        },
        GapSpec {
            thickness: 3.6,
            medium: nbk7,
        },
        GapSpec {
            thickness: 196.1684,
            medium: air,
        },
    ];

    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 12.7,
            radius_of_curvature: 102.4,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 12.7,
            radius_of_curvature: -102.4,
            conic_constant: 0.0,
            kind: SurfaceKind::Refracting,
        },
        SurfaceSpec::Image,
    ];

    SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
}

pub fn field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::PointSource {
            x: 0.0,
            y: 0.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.2 },
        },
        FieldSpec::PointSource {
            x: 0.0,
            y: 2.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 0.2 },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequential_model::{Axis, SubModelID};

    #[test]
    fn object_gap_is_finite() {
        let model = sequential_model();
        assert!(!model
            .submodels()
            .get(&SubModelID(0, Axis::Y))
            .unwrap()
            .is_obj_at_inf());
    }

    #[test]
    fn has_four_surfaces() {
        let model = sequential_model();
        assert_eq!(model.surfaces().len(), 4);
    }
}

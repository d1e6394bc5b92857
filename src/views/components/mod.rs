/// Groups consecutive refracting/reflecting surfaces into optical elements
/// (engine design §4.1 step 5).
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::Float;
use crate::core::sequential_model::{SequentialModel, Surface};

const TOL: Float = 1e-6;

/// A component is a group of one or more adjacent `Conic` surfaces that
/// behaves as a single optical part: a cemented/air-spaced pair when the
/// surfaces share a non-air medium, otherwise a single surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Element { surf_idxs: (usize, usize) },
    UnpairedSurface { surf_idx: usize },
}

/// Builds the ordered list of components for a system: every `Conic`
/// surface, in order, paired with its successor whenever the gap between
/// them is not air (`n != 1.0`).
///
/// Any one submodel's gaps are used for the pairing decision: whether a gap
/// is air or glass is a structural property of the system, not something
/// that varies meaningfully between the wavelengths of a dispersive medium.
pub fn components_view(sequential_model: &SequentialModel) -> Result<Vec<Component>> {
    let surfaces = sequential_model.surfaces();
    if surfaces.len() < 3 {
        // Only the Object and Image planes exist; no physical surfaces.
        return Ok(Vec::new());
    }

    let submodel = sequential_model
        .submodels()
        .values()
        .next()
        .ok_or_else(|| anyhow!("no submodels found in the sequential model"))?;
    let gaps = submodel.gaps();

    let last_physical = surfaces.len() - 2;
    let mut components = Vec::new();
    let mut i = 1;
    while i <= last_physical {
        if !matches!(surfaces[i], Surface::Conic(_)) {
            i += 1;
            continue;
        }

        let pairs_with_next = i < last_physical
            && matches!(surfaces[i + 1], Surface::Conic(_))
            && (gaps[i].n - 1.0).abs() > TOL;

        if pairs_with_next {
            components.push(Component::Element { surf_idxs: (i, i + 1) });
            i += 2;
        } else {
            components.push(Component::UnpairedSurface { surf_idx: i });
            i += 1;
        }
    }

    Ok(components)
}

#[cfg(test)]
mod tests {
    use crate::core::Float;
    use crate::materials::Medium;
    use crate::n;
    use crate::specs::gaps::GapSpec;
    use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};

    use super::*;

    fn empty_system() -> SequentialModel {
        let surfaces = vec![SurfaceSpec::Object, SurfaceSpec::Image];
        let gaps = vec![GapSpec {
            thickness: 1.0,
            medium: n!(1.0),
        }];
        SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
    }

    fn single_surface_and_stop() -> SequentialModel {
        let surfaces = vec![
            SurfaceSpec::Object,
            SurfaceSpec::Conic {
                semi_diameter: 12.5,
                radius_of_curvature: 25.8,
                conic_constant: 0.0,
                kind: SurfaceKind::Refracting,
            },
            SurfaceSpec::Stop { semi_diameter: 12.5 },
            SurfaceSpec::Image,
        ];
        let gaps = vec![
            GapSpec { thickness: Float::INFINITY, medium: n!(1.0) },
            GapSpec { thickness: 10.0, medium: n!(1.515) },
            GapSpec { thickness: 10.0, medium: n!(1.0) },
        ];
        SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
    }

    fn triplet_with_trailing_unpaired_surface() -> SequentialModel {
        let air = Medium::RefractiveIndex(1.0);
        let nbk7 = Medium::RefractiveIndex(1.515);

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
            SurfaceSpec::Conic {
                semi_diameter: 12.5,
                radius_of_curvature: 25.8,
                conic_constant: 0.0,
                kind: SurfaceKind::Refracting,
            },
            SurfaceSpec::Image,
        ];
        let gaps = vec![
            GapSpec { thickness: Float::INFINITY, medium: air.clone() },
            GapSpec { thickness: 5.3, medium: nbk7.clone() },
            GapSpec { thickness: 46.6, medium: air },
            GapSpec { thickness: 20.0, medium: nbk7 },
        ];
        SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap()
    }

    #[test]
    fn system_with_no_physical_surfaces_has_no_components() {
        let model = empty_system();
        assert!(components_view(&model).unwrap().is_empty());
    }

    #[test]
    fn convexplano_lens_is_a_single_cemented_element() {
        let model = crate::examples::convexplano_lens::sequential_model();
        let components = components_view(&model).unwrap();
        assert_eq!(components, vec![Component::Element { surf_idxs: (1, 2) }]);
    }

    #[test]
    fn a_stop_surface_is_not_a_component() {
        let model = single_surface_and_stop();
        let components = components_view(&model).unwrap();
        assert_eq!(components, vec![Component::UnpairedSurface { surf_idx: 1 }]);
    }

    #[test]
    fn trailing_surface_with_no_partner_is_unpaired() {
        let model = triplet_with_trailing_unpaired_surface();
        let components = components_view(&model).unwrap();
        assert_eq!(
            components,
            vec![
                Component::Element { surf_idxs: (1, 2) },
                Component::UnpairedSurface { surf_idx: 3 },
            ]
        );
    }
}

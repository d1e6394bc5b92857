/// Builds ray bundles in object space and traces them through every surface
/// of a system (engine design §4.4-4.6).
mod rays;
mod trace;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::Float;
use crate::core::math::vec3::Vec3;
use crate::core::sequential_model::{Axis, SequentialModel, SequentialSubModel, SubModelID, Surface};
use crate::specs::fields::{FieldSpec, PupilSampling};

use rays::PupilCoord;
pub(crate) use rays::{chief_and_marginal, tangential_fan};
use trace::trace;

pub use rays::Ray;
pub use trace::RayBundle;

use super::paraxial::ParaxialView;

/// The tolerance below which a field angle is treated as exactly 90 degrees,
/// where the "origin on the first surface plane" construction of §4.4
/// degenerates (the ray travels parallel to that plane).
const GRAZING_ANGLE_TOL: Float = 1e-9;

/// The collection of every `(wavelength, field, axis)` ray trace produced by
/// one call to `trace()`.
#[derive(Debug, Serialize)]
pub struct TraceResultsCollection {
    results: Vec<TraceResults>,
}

/// One `(wavelength, field, axis)` ray trace: the full sampled bundle plus a
/// single chief-ray trace for reference.
#[derive(Debug, Serialize)]
pub struct TraceResults {
    wavelength_id: usize,
    field_id: usize,
    axis: Axis,
    ray_bundle: RayBundle,
    chief_ray: RayBundle,
}

impl TraceResultsCollection {
    fn new(results: Vec<TraceResults>) -> Self {
        Self { results }
    }

    pub fn get(&self, field_id: usize, wavelength_id: usize, axis: Axis) -> Option<&TraceResults> {
        self.results
            .iter()
            .find(|r| r.field_id == field_id && r.wavelength_id == wavelength_id && r.axis == axis)
    }

    pub fn get_by_axis(&self, axis: Axis) -> Vec<&TraceResults> {
        self.results.iter().filter(|r| r.axis == axis).collect()
    }

    pub fn get_by_wavelength_id(&self, wavelength_id: usize) -> Vec<&TraceResults> {
        self.results.iter().filter(|r| r.wavelength_id == wavelength_id).collect()
    }

    pub fn get_by_field_id(&self, field_id: usize) -> Vec<&TraceResults> {
        self.results.iter().filter(|r| r.field_id == field_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceResults> {
        self.results.iter()
    }
}

impl TraceResults {
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn field_id(&self) -> usize {
        self.field_id
    }

    pub fn wavelength_id(&self) -> usize {
        self.wavelength_id
    }

    pub fn ray_bundle(&self) -> &RayBundle {
        &self.ray_bundle
    }

    pub fn chief_ray(&self) -> &RayBundle {
        &self.chief_ray
    }
}

/// Traces every field at every wavelength, sampling each field's pupil with
/// its own declared `pupil_sampling`.
pub(crate) fn ray_trace_3d_view(
    sequential_model: &SequentialModel,
    paraxial_view: &ParaxialView,
    field_specs: &[FieldSpec],
) -> Result<TraceResultsCollection> {
    validate_field_specs(sequential_model, field_specs)?;
    build_results(sequential_model, paraxial_view, field_specs, |field_spec| {
        pupil_coords(field_spec.pupil_sampling())
    })
}

/// Traces every field at every wavelength, overriding every field's pupil
/// sampling with a fixed set of pupil coordinates. Used for diagnostic
/// subsets (tangential ray fan, chief + marginal rays) that ignore each
/// field's declared `pupil_sampling`.
pub(crate) fn ray_trace_3d_view_with_coords(
    sequential_model: &SequentialModel,
    paraxial_view: &ParaxialView,
    field_specs: &[FieldSpec],
    coords: &[PupilCoord],
) -> Result<TraceResultsCollection> {
    validate_field_specs(sequential_model, field_specs)?;
    build_results(sequential_model, paraxial_view, field_specs, |_| coords.to_vec())
}

fn build_results(
    sequential_model: &SequentialModel,
    paraxial_view: &ParaxialView,
    field_specs: &[FieldSpec],
    coords_for: impl Fn(&FieldSpec) -> Vec<PupilCoord> + Sync,
) -> Result<TraceResultsCollection> {
    let surfaces = sequential_model.surfaces();

    let jobs: Vec<(usize, &FieldSpec, SubModelID, &SequentialSubModel)> = field_specs
        .iter()
        .enumerate()
        .flat_map(|(field_id, field_spec)| {
            sequential_model
                .submodels()
                .iter()
                .map(move |(&submodel_id, submodel)| (field_id, field_spec, submodel_id, submodel))
        })
        .collect();

    let results: Result<Vec<TraceResults>> = jobs
        .into_par_iter()
        .map(|(field_id, field_spec, submodel_id, submodel)| {
            let paraxial_subview = paraxial_view
                .subviews()
                .get(&submodel_id)
                .ok_or_else(|| anyhow!("no paraxial subview for submodel {:?}", submodel_id))?;
            let pupil = paraxial_subview.entrance_pupil();

            let rays: Vec<_> = coords_for(field_spec)
                .into_iter()
                .map(|c| field_ray(field_spec, surfaces, pupil, c))
                .collect();
            let chief = field_ray(field_spec, surfaces, pupil, PupilCoord::CHIEF);

            let mut iter = submodel.iter(surfaces);
            let ray_bundle = trace(&mut iter, rays);

            let mut chief_iter = submodel.iter(surfaces);
            let chief_ray = trace(&mut chief_iter, vec![chief]);

            Ok(TraceResults {
                wavelength_id: submodel_id.0,
                field_id,
                axis: submodel_id.1,
                ray_bundle,
                chief_ray,
            })
        })
        .collect();

    let mut results = results?;
    results.sort_by_key(|r| (r.field_id, r.wavelength_id, r.axis == Axis::X));
    Ok(TraceResultsCollection::new(results))
}

fn pupil_coords(sampling: PupilSampling) -> Vec<PupilCoord> {
    match sampling {
        PupilSampling::SquareGrid { spacing } => rays::square_grid(spacing),
    }
}

/// Builds the object-space ray that passes through pupil coordinate `coord`
/// of `field_spec`'s field, per §4.4.
fn field_ray(
    field_spec: &FieldSpec,
    surfaces: &[Surface],
    pupil: &super::paraxial::Pupil,
    coord: PupilCoord,
) -> rays::Ray {
    let pupil_point = Vec3::new(
        coord.rho_x * pupil.semi_diameter,
        coord.rho_y * pupil.semi_diameter,
        pupil.location,
    );

    match field_spec {
        FieldSpec::Angle { angle_deg, .. } => {
            let theta = angle_deg.to_radians();
            let (sin_theta, cos_theta) = (theta.sin(), theta.cos());
            let dir = Vec3::new(0.0, sin_theta, cos_theta);

            if cos_theta.abs() < GRAZING_ANGLE_TOL {
                // Grazing incidence (|angle_deg| == 90): the ray travels
                // parallel to the first-surface plane, so there is no single
                // "plane" origin to solve for. Launch from the pupil point
                // itself.
                return rays::Ray::new(pupil_point, dir);
            }

            let z1 = surfaces[1].pos();
            let s = (pupil.location - z1) / cos_theta;
            let origin = Vec3::new(
                pupil_point.x(),
                pupil_point.y() - s * sin_theta,
                z1,
            );
            rays::Ray::new(origin, dir)
        }
        FieldSpec::PointSource { x, y, .. } => {
            let origin = Vec3::new(*x, *y, surfaces[0].pos());
            let dir = (pupil_point - origin).normalize();
            rays::Ray::new(origin, dir)
        }
    }
}

/// Rejects `PointSource` fields when any submodel's object is at infinity
/// (invariant 6: a finite-conjugate field needs a finite object distance).
fn validate_field_specs(sequential_model: &SequentialModel, field_specs: &[FieldSpec]) -> Result<()> {
    let has_point_source = field_specs.iter().any(|f| matches!(f, FieldSpec::PointSource { .. }));
    if has_point_source {
        for submodel in sequential_model.submodels().values() {
            if submodel.is_obj_at_inf() {
                return Err(anyhow!(
                    "cannot trace a PointSource field when the object is at infinity"
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::core::sequential_model::SubModelID;
    use crate::examples::convexplano_lens;
    use crate::specs::aperture::ApertureSpec;
    use crate::specs::fields::PupilSampling;

    use super::*;

    fn setup() -> (SequentialModel, ParaxialView, Vec<FieldSpec>) {
        let sequential_model = convexplano_lens::sequential_model();
        let field_specs = vec![
            FieldSpec::Angle {
                angle_deg: 0.0,
                pupil_sampling: PupilSampling::SquareGrid { spacing: 1.0 },
            },
            FieldSpec::Angle {
                angle_deg: 5.0,
                pupil_sampling: PupilSampling::SquareGrid { spacing: 1.0 },
            },
        ];
        let aperture_spec = ApertureSpec::EntrancePupil { semi_diameter: 12.5 };
        let paraxial_view =
            ParaxialView::new(&sequential_model, &[0.5876], &field_specs, &aperture_spec)
                .unwrap();
        (sequential_model, paraxial_view, field_specs)
    }

    #[test]
    fn traces_every_field_wavelength_axis_combination() {
        let (model, paraxial_view, field_specs) = setup();
        let results = ray_trace_3d_view(&model, &paraxial_view, &field_specs).unwrap();
        // 2 fields x 1 wavelength x 1 axis (Y only: the system is centered).
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn on_axis_chief_ray_is_undeviated() {
        let (model, paraxial_view, field_specs) = setup();
        let results = ray_trace_3d_view(&model, &paraxial_view, &field_specs).unwrap();
        let on_axis = results.get(0, 0, Axis::Y).unwrap();

        let last = on_axis.chief_ray().num_surfaces() - 1;
        let (pos, dir) = on_axis.chief_ray().get(last, 0);
        assert_abs_diff_eq!(pos.x(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(pos.y(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dir.y(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn off_axis_field_produces_a_tilted_chief_ray() {
        let (model, paraxial_view, field_specs) = setup();
        let results = ray_trace_3d_view(&model, &paraxial_view, &field_specs).unwrap();
        let off_axis = results.get(1, 0, Axis::Y).unwrap();

        let (_, dir0) = off_axis.chief_ray().get(0, 0);
        assert_abs_diff_eq!(dir0.y(), (5.0_f64).to_radians().sin(), epsilon = 1e-6);
    }

    #[test]
    fn square_grid_spacing_one_samples_five_rays() {
        let (model, paraxial_view, field_specs) = setup();
        let results = ray_trace_3d_view(&model, &paraxial_view, &field_specs).unwrap();
        let on_axis = results.get(0, 0, Axis::Y).unwrap();
        assert_eq!(on_axis.ray_bundle().num_rays(), 5);
    }

    #[test]
    fn diagnostic_override_replaces_every_fields_sampling() {
        let (model, paraxial_view, field_specs) = setup();
        let coords = rays::tangential_fan();
        let results =
            ray_trace_3d_view_with_coords(&model, &paraxial_view, &field_specs, &coords).unwrap();
        for r in results.iter() {
            assert_eq!(r.ray_bundle().num_rays(), rays::TANGENTIAL_FAN_RAYS);
        }
    }

    #[test]
    fn point_source_field_rejected_for_infinite_object() {
        let model = convexplano_lens::sequential_model();
        let field_specs = vec![FieldSpec::PointSource {
            x: 0.0,
            y: 0.0,
            pupil_sampling: PupilSampling::SquareGrid { spacing: 1.0 },
        }];
        assert!(validate_field_specs(&model, &field_specs).is_err());
    }
}

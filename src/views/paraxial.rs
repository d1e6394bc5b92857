/// A paraxial view into an optical system.
///
/// Paraxial optics is a simplified model of optical systems that assumes
/// rays are close to the optic axis and that angles are small. Rays are
/// traced through the system using ray transfer matrices, which are 2x2
/// matrices that describe how rays propagate through and interact with
/// optical surfaces. The paraxial view is used to compute the first-order
/// parameters of an optical system, such as the entrance and exit pupils,
/// the back and front focal distances, and the effective focal length.
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use ndarray::{arr2, s, Array, Array1, Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::core::math::vec3::Vec3;
use crate::core::sequential_model::{
    Axis, Gap, SequentialModel, SequentialSubModel, SubModelID, Surface, SurfaceInteraction,
};
use crate::core::{argmin, Float};
use crate::specs::aperture::ApertureSpec;
use crate::specs::fields::FieldSpec;

const DEFAULT_THICKNESS: Float = 0.0;

/// A 2 x Nr array of paraxial rays: row 0 is height, row 1 is angle.
type ParaxialRays = Array2<Float>;
type ParaxialRaysView<'a> = ArrayView2<'a, Float>;

/// A Ns x 2 x Nr array of paraxial ray trace results, one slice per surface.
type ParaxialRayTraceResults = Array3<Float>;

/// A 2 x 2 ray transfer matrix.
type RayTransferMatrix = Array2<Float>;

/// A paraxial view into an optical system: one subview per (wavelength,
/// axis), plus the system-level chromatic aberration it implies.
#[derive(Debug)]
pub struct ParaxialView {
    subviews: HashMap<SubModelID, ParaxialSubView>,
    wavelengths: Vec<Float>,
}

/// A serializable description of a paraxial view, for export to a host.
#[derive(Debug, Serialize)]
pub struct ParaxialViewDescription {
    pub subviews: HashMap<SubModelID, ParaxialSubViewDescription>,
    pub primary_axial_color: HashMap<Axis, Float>,
}

/// The first-order optical properties of a system at a single wavelength.
#[derive(Debug)]
pub struct ParaxialSubView {
    aperture_stop: usize,
    back_focal_distance: Float,
    back_principal_plane: Float,
    chief_ray: ParaxialRayTraceResults,
    effective_focal_length: Float,
    entrance_pupil: Pupil,
    exit_pupil: Pupil,
    front_focal_distance: Float,
    front_principal_plane: Float,
    marginal_ray: ParaxialRayTraceResults,
    paraxial_image_plane: ImagePlane,
}

#[derive(Debug, Serialize)]
pub struct ParaxialSubViewDescription {
    pub aperture_stop: usize,
    pub back_focal_distance: Float,
    pub back_principal_plane: Float,
    pub effective_focal_length: Float,
    pub entrance_pupil: Pupil,
    pub exit_pupil: Pupil,
    pub front_focal_distance: Float,
    pub front_principal_plane: Float,
    pub paraxial_image_plane: ImagePlane,
}

/// A paraxial entrance or exit pupil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pupil {
    pub location: Float,
    pub semi_diameter: Float,
}

/// A paraxial image plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlane {
    pub location: Float,
    pub semi_diameter: Float,
}

impl Pupil {
    pub fn pos(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.location)
    }
}

/// Propagates paraxial rays a distance along the optic axis.
fn propagate(rays: ParaxialRaysView, distance: Float) -> ParaxialRays {
    let mut propagated = rays.to_owned();
    let mut ray_heights = propagated.row_mut(0);
    ray_heights += &(distance * &rays.row(1));
    propagated
}

/// Computes the z-intercepts (height == 0) of a set of paraxial rays.
fn z_intercepts(rays: ParaxialRaysView) -> Result<Array1<Float>> {
    let results = (-&rays.row(0) / rays.row(1)).to_owned();
    if results.iter().any(|x| x.is_nan()) {
        return Err(anyhow!("some z-intercepts are NaN (ray height and angle both zero)"));
    }
    Ok(results)
}

/// Index of the first physical (non-`Object`) surface, if any.
fn first_physical_surface(surfaces: &[Surface]) -> Option<usize> {
    (surfaces.len() > 2).then_some(1)
}

/// Index of the last physical (non-`Image`) surface, if any.
fn last_physical_surface(surfaces: &[Surface]) -> Option<usize> {
    (surfaces.len() > 2).then_some(surfaces.len() - 2)
}

/// Maps a surface index to its position in a full-system reverse ray trace's
/// result array (see [`rtms`]'s `reverse` branch for the index correspondence).
fn reversed_surface_id(n_gaps: usize, surface_index: usize) -> usize {
    n_gaps - surface_index
}

/// Computes the largest-magnitude field angle/height among `field_specs`,
/// together with the (angle, height) pair that produced it.
fn max_field(obj_pupil_separation: Float, field_specs: &[FieldSpec]) -> (Float, Float) {
    let mut max_angle = 0.0;
    let mut max_height = 0.0;

    for field_spec in field_specs {
        let (height, paraxial_angle) = match field_spec {
            FieldSpec::Angle { angle_deg, .. } => {
                let paraxial_angle = angle_deg.to_radians().tan();
                let height = -obj_pupil_separation * paraxial_angle;
                (height, paraxial_angle)
            }
            FieldSpec::PointSource { y, .. } => {
                let paraxial_angle = -y / obj_pupil_separation;
                (*y, paraxial_angle)
            }
        };

        if paraxial_angle.abs() > max_angle {
            max_angle = paraxial_angle.abs();
            max_height = height;
        }
    }

    (max_angle, max_height)
}

impl ParaxialView {
    /// Builds a paraxial view of `sequential_model`, one subview per
    /// submodel (i.e. per wavelength). `wavelengths` must be the same list
    /// used to build `sequential_model`, so that submodel wavelength
    /// indices can be resolved back to wavelength values.
    pub fn new(
        sequential_model: &SequentialModel,
        wavelengths: &[Float],
        field_specs: &[FieldSpec],
        aperture_spec: &ApertureSpec,
    ) -> Result<Self> {
        let surfaces = sequential_model.surfaces();
        let subviews: Result<HashMap<SubModelID, ParaxialSubView>> = sequential_model
            .submodels()
            .iter()
            .map(|(id, submodel)| {
                Ok((
                    *id,
                    ParaxialSubView::new(submodel, surfaces, field_specs, aperture_spec)?,
                ))
            })
            .collect();

        Ok(Self {
            subviews: subviews?,
            wavelengths: wavelengths.to_vec(),
        })
    }

    pub fn describe(&self) -> ParaxialViewDescription {
        ParaxialViewDescription {
            subviews: self
                .subviews
                .iter()
                .map(|(id, subview)| (*id, subview.describe()))
                .collect(),
            primary_axial_color: self.primary_axial_color(),
        }
    }

    pub fn subviews(&self) -> &HashMap<SubModelID, ParaxialSubView> {
        &self.subviews
    }

    /// The difference in back focal distance between the submodels at the
    /// minimum and maximum wavelength indices, keyed by axis.
    pub fn primary_axial_color(&self) -> HashMap<Axis, Float> {
        let min_idx = self
            .wavelengths
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let max_idx = self
            .wavelengths
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut bfd_min: HashMap<Axis, Float> = HashMap::new();
        let mut bfd_max: HashMap<Axis, Float> = HashMap::new();

        for (id, subview) in &self.subviews {
            if id.0 == min_idx {
                bfd_min.insert(id.1, subview.back_focal_distance);
            }
            if id.0 == max_idx {
                bfd_max.insert(id.1, subview.back_focal_distance);
            }
        }

        let mut primary_axial_color = HashMap::new();
        for (axis, bfd_lo) in bfd_min {
            if let Some(bfd_hi) = bfd_max.get(&axis) {
                primary_axial_color.insert(axis, (bfd_hi - bfd_lo).abs());
            }
        }
        primary_axial_color
    }
}

impl ParaxialSubView {
    fn new(
        submodel: &SequentialSubModel,
        surfaces: &[Surface],
        field_specs: &[FieldSpec],
        aperture_spec: &ApertureSpec,
    ) -> Result<Self> {
        let gaps = submodel.gaps();

        let pseudo_marginal_ray = Self::calc_pseudo_marginal_ray(submodel, gaps, surfaces)?;
        let parallel_ray = Self::calc_parallel_ray(gaps, surfaces)?;
        let reverse_parallel_ray = Self::calc_reverse_parallel_ray(gaps, surfaces)?;

        let aperture_stop = Self::calc_aperture_stop(surfaces, &pseudo_marginal_ray);
        let back_focal_distance = Self::calc_back_focal_distance(surfaces, &parallel_ray)?;
        let front_focal_distance = Self::calc_front_focal_distance(surfaces, &reverse_parallel_ray)?;
        let marginal_ray =
            Self::calc_marginal_ray(&pseudo_marginal_ray, aperture_stop, aperture_spec);

        let entrance_pupil =
            Self::calc_entrance_pupil(submodel, gaps, surfaces, aperture_stop, &marginal_ray)?;
        let exit_pupil = Self::calc_exit_pupil(gaps, surfaces, aperture_stop, &marginal_ray)?;
        let effective_focal_length = Self::calc_effective_focal_length(&parallel_ray);

        let back_principal_plane =
            Self::calc_back_principal_plane(surfaces, back_focal_distance, effective_focal_length)?;
        let front_principal_plane =
            Self::calc_front_principal_plane(front_focal_distance, effective_focal_length);

        let chief_ray =
            Self::calc_chief_ray(gaps, surfaces, field_specs, &entrance_pupil)?;
        let paraxial_image_plane = Self::calc_paraxial_image_plane(surfaces, &marginal_ray, &chief_ray)?;

        Ok(Self {
            aperture_stop,
            back_focal_distance,
            back_principal_plane,
            chief_ray,
            effective_focal_length,
            entrance_pupil,
            exit_pupil,
            front_focal_distance,
            front_principal_plane,
            marginal_ray,
            paraxial_image_plane,
        })
    }

    fn describe(&self) -> ParaxialSubViewDescription {
        ParaxialSubViewDescription {
            aperture_stop: self.aperture_stop,
            back_focal_distance: self.back_focal_distance,
            back_principal_plane: self.back_principal_plane,
            effective_focal_length: self.effective_focal_length,
            entrance_pupil: self.entrance_pupil.clone(),
            exit_pupil: self.exit_pupil.clone(),
            front_focal_distance: self.front_focal_distance,
            front_principal_plane: self.front_principal_plane,
            paraxial_image_plane: self.paraxial_image_plane.clone(),
        }
    }

    pub fn aperture_stop(&self) -> usize {
        self.aperture_stop
    }

    pub fn back_focal_distance(&self) -> Float {
        self.back_focal_distance
    }

    pub fn back_principal_plane(&self) -> Float {
        self.back_principal_plane
    }

    pub fn chief_ray(&self) -> &ParaxialRayTraceResults {
        &self.chief_ray
    }

    pub fn effective_focal_length(&self) -> Float {
        self.effective_focal_length
    }

    pub fn entrance_pupil(&self) -> &Pupil {
        &self.entrance_pupil
    }

    pub fn exit_pupil(&self) -> &Pupil {
        &self.exit_pupil
    }

    pub fn front_focal_distance(&self) -> Float {
        self.front_focal_distance
    }

    pub fn front_principal_plane(&self) -> Float {
        self.front_principal_plane
    }

    pub fn marginal_ray(&self) -> &ParaxialRayTraceResults {
        &self.marginal_ray
    }

    pub fn paraxial_image_plane(&self) -> &ImagePlane {
        &self.paraxial_image_plane
    }

    /// Selects the aperture-stop surface: the one maximizing `|y|` relative
    /// to its own semi-diameter, compared surface by surface against the
    /// pseudo-marginal ray's height AT THAT SAME SURFACE (not a single
    /// system-wide denominator — each surface's ratio uses its own ray
    /// height).
    fn calc_aperture_stop(
        surfaces: &[Surface],
        pseudo_marginal_ray: &ParaxialRayTraceResults,
    ) -> usize {
        if let Some(index) = surfaces.iter().position(Surface::is_stop) {
            return index;
        }

        let semi_diameters = Array::from_vec(
            surfaces.iter().map(Surface::semi_diameter).collect::<Vec<Float>>(),
        );
        let heights = pseudo_marginal_ray.slice(s![.., 0, 0]);
        let ratios = (semi_diameters / &heights).mapv(Float::abs);

        argmin(&ratios.slice(s![1..(ratios.len() - 1)])) + 1
    }

    fn calc_back_focal_distance(
        surfaces: &[Surface],
        parallel_ray: &ParaxialRayTraceResults,
    ) -> Result<Float> {
        let last = last_physical_surface(surfaces).ok_or_else(|| anyhow!("no physical surfaces"))?;
        let z = z_intercepts(parallel_ray.slice(s![last, .., ..]))?[0];
        Ok(if z.is_infinite() { Float::INFINITY } else { z })
    }

    fn calc_back_principal_plane(
        surfaces: &[Surface],
        back_focal_distance: Float,
        effective_focal_length: Float,
    ) -> Result<Float> {
        let delta = back_focal_distance - effective_focal_length;
        if delta.is_infinite() {
            return Ok(Float::NAN);
        }
        let last = last_physical_surface(surfaces).ok_or_else(|| anyhow!("no physical surfaces"))?;
        Ok(surfaces[last].pos() + delta)
    }

    fn calc_chief_ray(
        gaps: &[Gap],
        surfaces: &[Surface],
        field_specs: &[FieldSpec],
        entrance_pupil: &Pupil,
    ) -> Result<ParaxialRayTraceResults> {
        let obj_pos = surfaces.first().ok_or_else(|| anyhow!("no surfaces"))?.pos();
        let sep = if obj_pos.is_infinite() {
            0.0
        } else {
            entrance_pupil.location - obj_pos
        };

        let (paraxial_angle, height) = max_field(sep, field_specs);
        if paraxial_angle.is_infinite() {
            return Err(anyhow!("cannot compute chief ray from an infinite field angle"));
        }

        let initial_ray: ParaxialRays = arr2(&[[height], [paraxial_angle]]);
        Self::trace(initial_ray, gaps, surfaces, false)
    }

    fn calc_effective_focal_length(parallel_ray: &ParaxialRayTraceResults) -> Float {
        let y_1 = parallel_ray.slice(s![1, 0, 0]).into_scalar();
        let u_final = parallel_ray.slice(s![-2, 1, 0]).into_scalar();
        let efl = -y_1 / u_final;
        if efl.is_infinite() {
            Float::INFINITY
        } else {
            efl
        }
    }

    fn calc_entrance_pupil(
        submodel: &SequentialSubModel,
        gaps: &[Gap],
        surfaces: &[Surface],
        aperture_stop: usize,
        marginal_ray: &ParaxialRayTraceResults,
    ) -> Result<Pupil> {
        if aperture_stop == 1 {
            return Ok(Pupil {
                location: 0.0,
                semi_diameter: surfaces[1].semi_diameter(),
            });
        }

        let ray = arr2(&[[0.0], [1.0]]);
        let results = Self::trace(
            ray,
            &gaps[0..aperture_stop],
            &surfaces[0..=aperture_stop],
            true,
        )?;
        let location = z_intercepts(results.slice(s![-1, .., ..]))?[0];

        let distance = if submodel.is_obj_at_inf() {
            location
        } else {
            gaps.first()
                .expect("a submodel always has at least one gap")
                .thickness
                + location
        };
        let init_marginal_ray = marginal_ray.slice(s![0, .., ..1]);
        let semi_diameter = propagate(init_marginal_ray, distance)[[0, 0]];

        Ok(Pupil { location, semi_diameter })
    }

    fn calc_exit_pupil(
        gaps: &[Gap],
        surfaces: &[Surface],
        aperture_stop: usize,
        marginal_ray: &ParaxialRayTraceResults,
    ) -> Result<Pupil> {
        let last = last_physical_surface(surfaces).ok_or_else(|| anyhow!("no physical surfaces"))?;
        if last == aperture_stop {
            return Ok(Pupil {
                location: surfaces[last].pos(),
                semi_diameter: surfaces[last].semi_diameter(),
            });
        }

        let ray = arr2(&[[0.0], [1.0]]);
        let results = Self::trace(ray, &gaps[aperture_stop..], &surfaces[aperture_stop..], false)?;

        let local_last = last - aperture_stop;
        let distance = z_intercepts(results.slice(s![local_last, .., ..]))?[0];
        let location = surfaces[last].pos() + distance;

        let semi_diameter = propagate(marginal_ray.slice(s![last, .., ..]), distance)[[0, 0]];

        Ok(Pupil { location, semi_diameter })
    }

    fn calc_front_focal_distance(
        surfaces: &[Surface],
        reverse_parallel_ray: &ParaxialRayTraceResults,
    ) -> Result<Float> {
        let first = first_physical_surface(surfaces).ok_or_else(|| anyhow!("no physical surfaces"))?;
        let n_gaps = surfaces.len() - 1;
        let index = reversed_surface_id(n_gaps, first);
        let z = z_intercepts(reverse_parallel_ray.slice(s![index, .., ..]))?[0];
        Ok(if z.is_infinite() { Float::INFINITY } else { z })
    }

    fn calc_front_principal_plane(front_focal_distance: Float, effective_focal_length: Float) -> Float {
        if front_focal_distance.is_infinite() {
            return Float::NAN;
        }
        front_focal_distance + effective_focal_length
    }

    /// Scales the pseudo-marginal ray so its height at the aperture stop
    /// equals the aperture spec's declared semi-diameter (engine design
    /// §4 supplement: this is the working aperture an iris stops down to,
    /// which may be smaller than the stop surface's own physical clear
    /// aperture).
    fn calc_marginal_ray(
        pseudo_marginal_ray: &ParaxialRayTraceResults,
        aperture_stop: usize,
        aperture_spec: &ApertureSpec,
    ) -> ParaxialRayTraceResults {
        let ApertureSpec::EntrancePupil { semi_diameter } = aperture_spec;
        let height_at_stop = pseudo_marginal_ray[[aperture_stop, 0, 0]];
        let scale_factor = semi_diameter / height_at_stop;
        pseudo_marginal_ray * scale_factor
    }

    fn calc_parallel_ray(gaps: &[Gap], surfaces: &[Surface]) -> Result<ParaxialRayTraceResults> {
        Self::trace(arr2(&[[1.0], [0.0]]), gaps, surfaces, false)
    }

    fn calc_paraxial_image_plane(
        surfaces: &[Surface],
        marginal_ray: &ParaxialRayTraceResults,
        chief_ray: &ParaxialRayTraceResults,
    ) -> Result<ImagePlane> {
        let last = last_physical_surface(surfaces).ok_or_else(|| anyhow!("no physical surfaces"))?;

        let dz = z_intercepts(marginal_ray.slice(s![last, .., ..]))?[0];
        let location = if dz.is_infinite() {
            Float::INFINITY
        } else {
            surfaces[last].pos() + dz
        };

        let ray = chief_ray.slice(s![last, .., ..]);
        let propagated = propagate(ray, dz);
        let semi_diameter = propagated[[0, 0]].abs();

        Ok(ImagePlane { location, semi_diameter })
    }

    /// Traces an arbitrary nonzero ray (parallel if the object is at
    /// infinity, divergent from the axis otherwise) used only to locate the
    /// aperture stop; [`calc_marginal_ray`] rescales it afterward.
    fn calc_pseudo_marginal_ray(
        submodel: &SequentialSubModel,
        gaps: &[Gap],
        surfaces: &[Surface],
    ) -> Result<ParaxialRayTraceResults> {
        let ray = if submodel.is_obj_at_inf() {
            arr2(&[[1.0], [0.0]])
        } else {
            arr2(&[[0.0], [1.0]])
        };
        Self::trace(ray, gaps, surfaces, false)
    }

    fn calc_reverse_parallel_ray(gaps: &[Gap], surfaces: &[Surface]) -> Result<ParaxialRayTraceResults> {
        Self::trace(arr2(&[[1.0], [0.0]]), gaps, surfaces, true)
    }

    /// Computes the ray transfer matrix for each gap/surface pair, in
    /// forward or reverse traversal order.
    ///
    /// Reverse traversal walks surfaces from the end of the slice back to
    /// (but not including) its first gap — there is no gap before the first
    /// surface to consume — treating each gap's thickness as negative so
    /// that matrix inversion is never needed.
    fn rtms(gaps: &[Gap], surfaces: &[Surface], reverse: bool) -> Vec<RayTransferMatrix> {
        let n = gaps.len();
        let mut txs = Vec::with_capacity(n);

        if reverse {
            for forward_index in (1..n).rev() {
                let gap_0 = &gaps[forward_index];
                let surface = &surfaces[forward_index];
                let gap_1 = Some(&gaps[forward_index - 1]);
                txs.push(step_to_rtm(gap_0, surface, gap_1, true));
            }
        } else {
            for i in 0..n {
                let gap_0 = &gaps[i];
                let surface = &surfaces[i + 1];
                let gap_1 = gaps.get(i + 1);
                txs.push(step_to_rtm(gap_0, surface, gap_1, false));
            }
        }

        txs
    }

    fn trace(
        rays: ParaxialRays,
        gaps: &[Gap],
        surfaces: &[Surface],
        reverse: bool,
    ) -> Result<ParaxialRayTraceResults> {
        let txs = Self::rtms(gaps, surfaces, reverse);

        let mut results = Array3::zeros((txs.len() + 1, 2, rays.shape()[1]));
        results.slice_mut(s![0, .., ..]).assign(&rays);

        for (i, tx) in txs.iter().enumerate() {
            let rays = results.slice(s![i, .., ..]);
            let rays = tx.dot(&rays);
            results.slice_mut(s![i + 1, .., ..]).assign(&rays);
        }

        Ok(results)
    }
}

/// Computes the ray transfer matrix for propagation through a gap and
/// interaction with the surface that terminates it.
fn step_to_rtm(gap_0: &Gap, surface: &Surface, gap_1: Option<&Gap>, reverse: bool) -> RayTransferMatrix {
    let t = if gap_0.thickness.is_infinite() {
        DEFAULT_THICKNESS
    } else if reverse {
        -gap_0.thickness
    } else {
        gap_0.thickness
    };

    let roc = surface.roc();
    let n_0 = gap_0.n;
    let n_1 = gap_1.map_or(n_0, |g| g.n);

    match surface {
        Surface::Conic(_) => match surface.interaction() {
            SurfaceInteraction::Refracting => arr2(&[
                [1.0, t],
                [(n_0 - n_1) / n_1 / roc, t * (n_0 - n_1) / n_1 / roc + n_0 / n_1],
            ]),
            SurfaceInteraction::Reflecting => arr2(&[[1.0, t], [-2.0 / roc, 1.0 - 2.0 * t / roc]]),
            SurfaceInteraction::NoOp => unreachable!("conic surfaces always refract or reflect"),
        },
        Surface::Image(_) | Surface::Probe(_) | Surface::Stop(_) => arr2(&[[1.0, t], [0.0, 1.0]]),
        Surface::Object(_) => arr2(&[[1.0, 0.0], [0.0, 1.0]]),
    }
}

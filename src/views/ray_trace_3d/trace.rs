/// The real (non-paraxial) sequential ray tracer: surface intersection,
/// refraction/reflection, and per-ray termination bookkeeping (engine design
/// §4.5).
use serde::Serialize;

use crate::core::Float;
use crate::core::math::constants::APERTURE_OVER_TOL;
use crate::core::math::linalg::Quadratic;
use crate::core::math::vec3::Vec3;
use crate::core::sequential_model::{Gap, SequentialSubModelIter, Surface, SurfaceInteraction};
use crate::error::TerminationReason;

use super::rays::Ray;

/// A full 3D ray trace of one bundle of rays through every surface of a
/// system.
///
/// Rays are stored row-major as `[surface][ray]`: `positions`/`directions`
/// hold `num_surfaces * num_rays` entries, with the ray axis varying
/// fastest (row stride `num_rays`).
#[derive(Debug, Clone, Serialize)]
pub struct RayBundle {
    positions: Vec<Vec3>,
    directions: Vec<Vec3>,
    num_surfaces: usize,
    num_rays: usize,

    /// For each ray, the 1-based surface index at which it terminated, or
    /// `0` if the ray survived to the image surface.
    terminated: Vec<usize>,

    /// Termination reasons, keyed by ray index. Absent for rays that
    /// survived.
    reason_for_termination: std::collections::HashMap<usize, TerminationReason>,

    /// `+1.0`/`-1.0` after each surface: the sign of propagation along z,
    /// flipped by every `Reflecting` surface. Shared by every ray in the
    /// bundle since it depends only on the sequence of surfaces, not on any
    /// particular ray's path.
    direction_of_travel: Vec<Float>,
}

impl RayBundle {
    fn new(num_surfaces: usize, num_rays: usize) -> Self {
        Self {
            positions: vec![Vec3::new(0.0, 0.0, 0.0); num_surfaces * num_rays],
            directions: vec![Vec3::new(0.0, 0.0, 1.0); num_surfaces * num_rays],
            num_surfaces,
            num_rays,
            terminated: vec![0; num_rays],
            reason_for_termination: std::collections::HashMap::new(),
            direction_of_travel: vec![1.0; num_surfaces],
        }
    }

    fn index(&self, surface: usize, ray: usize) -> usize {
        surface * self.num_rays + ray
    }

    fn set(&mut self, surface: usize, ray: usize, pos: Vec3, dir: Vec3) {
        let idx = self.index(surface, ray);
        self.positions[idx] = pos;
        self.directions[idx] = dir;
    }

    /// Returns the recorded `(position, direction)` of `ray` at `surface`.
    pub fn get(&self, surface: usize, ray: usize) -> (Vec3, Vec3) {
        let idx = self.index(surface, ray);
        (self.positions[idx], self.directions[idx])
    }

    pub fn num_surfaces(&self) -> usize {
        self.num_surfaces
    }

    pub fn num_rays(&self) -> usize {
        self.num_rays
    }

    /// The 1-based surface at which `ray` terminated, or `0` if it survived.
    pub fn terminated(&self, ray: usize) -> usize {
        self.terminated[ray]
    }

    pub fn reason_for_termination(&self, ray: usize) -> Option<TerminationReason> {
        self.reason_for_termination.get(&ray).copied()
    }

    pub fn direction_of_travel(&self, surface: usize) -> Float {
        self.direction_of_travel[surface]
    }
}

/// Traces `rays` through every (gap, surface, gap) step yielded by `steps`,
/// recording positions/directions into a [`RayBundle`] and terminating rays
/// that miss, vignette, or total-internally-reflect.
///
/// `steps` must start at the first surface after the object (i.e. the
/// iterator yielded by [`SequentialSubModel::iter`](crate::core::sequential_model::SequentialSubModel::iter)),
/// and `rays` must already carry each ray's object-space starting position
/// and direction, which this function records as surface 0 of the bundle.
pub(crate) fn trace(steps: &mut SequentialSubModelIter<'_>, rays: Vec<Ray>) -> RayBundle {
    let num_rays = rays.len();
    let num_surfaces = steps.len() + 1;
    let mut bundle = RayBundle::new(num_surfaces, num_rays);

    let mut current: Vec<Ray> = rays;
    for (ray_idx, ray) in current.iter().enumerate() {
        bundle.set(0, ray_idx, ray.pos, ray.dir);
    }

    let mut direction_of_travel: Float = 1.0;
    let mut alive = vec![true; num_rays];

    for (surf_idx, (gap_in, surface, gap_out)) in steps.enumerate().map(|(i, s)| (i + 1, s)) {
        if let SurfaceInteraction::Reflecting = surface.interaction() {
            direction_of_travel = -direction_of_travel;
        }
        bundle.direction_of_travel[surf_idx] = direction_of_travel;

        for ray_idx in 0..num_rays {
            if !alive[ray_idx] {
                // Carry the last valid position/direction forward as the sentinel value.
                let (pos, dir) = bundle.get(surf_idx - 1, ray_idx);
                bundle.set(surf_idx, ray_idx, pos, dir);
                continue;
            }

            let ray = &mut current[ray_idx];
            match step_ray(ray, surface, gap_in, gap_out) {
                Ok(()) => bundle.set(surf_idx, ray_idx, ray.pos, ray.dir),
                Err(reason) => {
                    let (pos, dir) = bundle.get(surf_idx - 1, ray_idx);
                    bundle.set(surf_idx, ray_idx, pos, dir);
                    bundle.terminated[ray_idx] = surf_idx;
                    bundle.reason_for_termination.insert(ray_idx, reason);
                    alive[ray_idx] = false;
                }
            }
        }
    }

    bundle
}

/// Advances a single ray through one surface: transfer, intersect, aperture
/// test, normal, and refract/reflect/pass-through.
fn step_ray(
    ray: &mut Ray,
    surface: &Surface,
    gap_in: &Gap,
    gap_out: Option<&Gap>,
) -> Result<(), TerminationReason> {
    // Transfer into the surface's local frame (apex at the origin).
    let local_pos = Vec3::new(ray.pos.x(), ray.pos.y(), ray.pos.z() - surface.pos());
    let dir = ray.dir;

    let t = intersect(local_pos, dir, surface)?;
    let hit = local_pos + dir * t;

    let r2 = hit.x() * hit.x() + hit.y() * hit.y();
    let limit = surface.semi_diameter() + APERTURE_OVER_TOL;
    if r2 > limit * limit {
        return Err(TerminationReason::Vignetted);
    }

    let (_, raw_normal) = surface.sag_norm(hit.x(), hit.y());
    // `sag_norm` always returns a normal with a positive z-component; orient
    // it against the incoming ray so the refraction/reflection formulas
    // below see a consistent convention regardless of which side of the
    // surface the ray arrives from.
    let normal = if dir.dot(raw_normal) > 0.0 {
        -raw_normal
    } else {
        raw_normal
    };

    let new_dir = match surface.interaction() {
        SurfaceInteraction::Refracting => {
            let n_in = gap_in.n;
            let n_out = gap_out.map_or(n_in, |g| g.n);
            refract(dir, normal, n_in, n_out).ok_or(TerminationReason::TotalInternalReflection)?
        }
        SurfaceInteraction::Reflecting => reflect(dir, normal),
        SurfaceInteraction::NoOp => dir,
    };

    ray.pos = Vec3::new(hit.x(), hit.y(), hit.z() + surface.pos());
    ray.dir = new_dir;

    Ok(())
}

/// Solves for the smallest positive path length `t` along `pos + t·dir` that
/// lands on `surface`'s conic (or plane). Returns
/// [`TerminationReason::MissedSurface`] if no positive real root exists;
/// whether the hit point lies within the clear aperture is checked
/// separately by the caller.
fn intersect(pos: Vec3, dir: Vec3, surface: &Surface) -> Result<Float, TerminationReason> {
    let roc = surface.roc();

    if roc.is_infinite() {
        if dir.z().abs() < crate::core::math::constants::SOLVER_DENOM_TOL {
            return Err(TerminationReason::MissedSurface);
        }
        let t = -pos.z() / dir.z();
        return smallest_positive(&[t]);
    }

    let c = 1.0 / roc;
    let k = surface.conic_constant();

    let a = c * (dir.x() * dir.x() + dir.y() * dir.y()) + c * k * dir.z() * dir.z();
    let b = 2.0 * c * (pos.x() * dir.x() + pos.y() * dir.y()) - 2.0 * dir.z()
        + 2.0 * c * k * pos.z() * dir.z();
    let cc = c * (pos.x() * pos.x() + pos.y() * pos.y()) - 2.0 * pos.z()
        + c * k * pos.z() * pos.z();

    match Quadratic::new(a, b, cc) {
        Ok(quad) => match quad.roots() {
            Ok((r1, r2)) => smallest_positive(&[r1, r2]),
            Err(_) => Err(TerminationReason::MissedSurface),
        },
        Err(_) => {
            // `a` too close to zero: fall back to the linearized solve.
            if b.abs() < crate::core::math::constants::SOLVER_DENOM_TOL {
                return Err(TerminationReason::MissedSurface);
            }
            smallest_positive(&[-cc / b])
        }
    }
}

/// Returns the smallest finite, non-retrograde value in `roots`, or
/// [`TerminationReason::MissedSurface`] if none qualify.
///
/// The threshold is `-GEOM_ZERO_TOL` rather than `0.0`: a ray launched
/// exactly at a surface's vertex (e.g. an on-axis chief ray starting at the
/// entrance pupil when the pupil coincides with the first surface) has a
/// true root of `t = 0`, which must still count as a valid hit rather than
/// "behind the ray".
fn smallest_positive(roots: &[Float]) -> Result<Float, TerminationReason> {
    use crate::core::math::constants::GEOM_ZERO_TOL;
    roots
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t > -GEOM_ZERO_TOL)
        .fold(None, |acc, t| match acc {
            Some(best) if best <= t => Some(best),
            _ => Some(t),
        })
        .ok_or(TerminationReason::MissedSurface)
}

/// Vector Snell's law. Returns `None` on total internal reflection.
fn refract(dir: Vec3, normal: Vec3, n_in: Float, n_out: Float) -> Option<Vec3> {
    let mu = n_in / n_out;
    let cos_theta_i = -dir.dot(normal);
    let cos2_theta_t = 1.0 - mu * mu * (1.0 - cos_theta_i * cos_theta_i);
    if cos2_theta_t < 0.0 {
        return None;
    }
    let cos_theta_t = cos2_theta_t.sqrt();
    Some(dir * mu + normal * (mu * cos_theta_i - cos_theta_t))
}

/// Mirror reflection about the surface normal.
fn reflect(dir: Vec3, normal: Vec3) -> Vec3 {
    dir - normal * (2.0 * dir.dot(normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequential_model::{Axis, SequentialModel, SubModelID};
    use crate::examples::{concave_mirror, convexplano_lens};
    use crate::materials::Medium;

    #[test]
    fn ray_through_flat_surface_on_axis_is_undeviated() {
        let model = convexplano_lens::sequential_model();
        let submodel = model.submodels().get(&SubModelID(0, Axis::Y)).unwrap();
        let mut iter = submodel.iter(model.surfaces());

        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let bundle = trace(&mut iter, vec![ray]);

        assert_eq!(bundle.terminated(0), 0);
        let (pos, dir) = bundle.get(bundle.num_surfaces() - 1, 0);
        assert!(pos.x().abs() < 1e-9 && pos.y().abs() < 1e-9);
        assert!(dir.x().abs() < 1e-9 && dir.y().abs() < 1e-9);
    }

    #[test]
    fn snells_law_holds_at_every_refracting_surface() {
        let model = convexplano_lens::sequential_model();
        let submodel = model.submodels().get(&SubModelID(0, Axis::Y)).unwrap();

        let ray = Ray::new(Vec3::new(0.0, 3.0, -10.0), Vec3::new(0.0, 0.0, 1.0).normalize());
        let mut iter = submodel.iter(model.surfaces());
        let bundle = trace(&mut iter, vec![ray]);

        assert_eq!(bundle.terminated(0), 0);

        let (pos1, dir0) = bundle.get(0, 0);
        let (_, dir1) = bundle.get(1, 0);
        let surface = &model.surfaces()[1];
        let (_, normal) = surface.sag_norm(pos1.x(), pos1.y());

        let n_in = submodel.gaps()[0].n;
        let n_out = submodel.gaps()[1].n;

        let sin_theta_i = (1.0 - dir0.dot(normal).powi(2)).sqrt();
        let sin_theta_t = (1.0 - dir1.dot(normal).powi(2)).sqrt();

        assert!((n_in * sin_theta_i - n_out * sin_theta_t).abs() < 1e-9);
    }

    #[test]
    fn grazing_tir_terminates_ray() {
        // A steeply curved entrance surface bends an edge ray past the
        // critical angle for n=1.515 -> n=1.0 (~41.3 degrees) before it
        // reaches the flat exit face.
        use crate::specs::gaps::GapSpec;
        use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};

        let air = Medium::RefractiveIndex(1.0);
        let nbk7 = Medium::RefractiveIndex(1.515);

        let gaps = vec![
            GapSpec { thickness: Float::INFINITY, medium: air.clone() },
            GapSpec { thickness: 0.3, medium: nbk7 },
            GapSpec { thickness: 1.0, medium: air },
        ];
        let surfaces = vec![
            SurfaceSpec::Object,
            SurfaceSpec::Conic {
                semi_diameter: 1.999,
                radius_of_curvature: 2.0,
                conic_constant: 0.0,
                kind: SurfaceKind::Refracting,
            },
            SurfaceSpec::Conic {
                semi_diameter: 5.0,
                radius_of_curvature: Float::INFINITY,
                conic_constant: 0.0,
                kind: SurfaceKind::Refracting,
            },
            SurfaceSpec::Image,
        ];
        let model = SequentialModel::new(&gaps, &surfaces, &[0.5876], None).unwrap();
        let submodel = model.submodels().get(&SubModelID(0, Axis::Y)).unwrap();

        // Parallel to the axis, at the very edge of the steep front surface.
        let ray = Ray::new(Vec3::new(0.0, 1.995, -5.0), Vec3::new(0.0, 0.0, 1.0));

        let mut iter = submodel.iter(model.surfaces());
        let bundle = trace(&mut iter, vec![ray]);

        assert_eq!(bundle.terminated(0), 2);
        assert_eq!(
            bundle.reason_for_termination(0),
            Some(TerminationReason::TotalInternalReflection)
        );
    }

    #[test]
    fn vignetted_ray_terminates_at_clear_aperture() {
        let model = convexplano_lens::sequential_model();
        let submodel = model.submodels().get(&SubModelID(0, Axis::Y)).unwrap();
        let mut iter = submodel.iter(model.surfaces());

        // Launch far off-axis, parallel to the optic axis: well outside the
        // 12.5 mm clear aperture of surface 1.
        let ray = Ray::new(Vec3::new(0.0, 20.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let bundle = trace(&mut iter, vec![ray]);

        assert_eq!(bundle.terminated(0), 1);
        assert_eq!(bundle.reason_for_termination(0), Some(TerminationReason::Vignetted));
    }

    #[test]
    fn concave_mirror_flips_direction_of_travel() {
        let model = concave_mirror::sequential_model();
        let submodel = model
            .submodels()
            .get(&SubModelID(0, Axis::Y))
            .unwrap();
        let mut iter = submodel.iter(model.surfaces());

        let ray = Ray::new(Vec3::new(0.0, 1.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let bundle = trace(&mut iter, vec![ray]);

        assert_eq!(bundle.terminated(0), 0);
        assert_eq!(bundle.direction_of_travel(1), -1.0);
    }

    #[test]
    fn reversing_a_refracted_ray_returns_to_its_origin() {
        let model = convexplano_lens::sequential_model();
        let submodel = model.submodels().get(&SubModelID(0, Axis::Y)).unwrap();

        let origin = Vec3::new(0.0, 3.0, -10.0);
        let ray = Ray::new(origin, Vec3::new(0.0, 0.05, 1.0).normalize());
        let mut forward = submodel.iter(model.surfaces());
        let forward_bundle = trace(&mut forward, vec![ray]);
        assert_eq!(forward_bundle.terminated(0), 0);

        let last = forward_bundle.num_surfaces() - 1;
        let (final_pos, final_dir) = forward_bundle.get(last, 0);
        let reversed = Ray::new(final_pos, -final_dir);

        let reverse_steps: Vec<_> = submodel.iter(model.surfaces()).collect();
        let mut ray = reversed;
        for (gap_in, surface, gap_out) in reverse_steps.into_iter().rev() {
            // Walking surfaces in reverse with directions negated retraces the
            // same physical path since refraction is time-reversible.
            let _ = step_ray(&mut ray, surface, gap_out.unwrap_or(gap_in), Some(gap_in));
        }

        assert!((ray.pos.x() - origin.x()).abs() < 1e-6);
        assert!((ray.pos.y() - origin.y()).abs() < 1e-6);
        assert!((ray.pos.z() - origin.z()).abs() < 1e-6);
    }
}

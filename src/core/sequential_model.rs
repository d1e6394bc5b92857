/// Data types for modeling sequential ray tracing systems.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{Cursor, Float};
use crate::core::math::constants::GEOM_ZERO_TOL;
use crate::core::medium;
use crate::error::SystemError;
use crate::materials::MaterialCatalog;
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::{SurfaceKind, SurfaceSpec};

/// The transverse direction along which system properties are computed.
///
/// `X` is reserved for a future toric surface kind; this engine only builds
/// centered, rotationally symmetric systems, so every submodel uses `Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug)]
pub(crate) struct Gap {
    pub thickness: Float,
    pub n: Float,
}

/// What a surface does to a ray that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceInteraction {
    Refracting,
    Reflecting,
    NoOp,
}

impl From<SurfaceKind> for SurfaceInteraction {
    fn from(kind: SurfaceKind) -> Self {
        match kind {
            SurfaceKind::Refracting => Self::Refracting,
            SurfaceKind::Reflecting => Self::Reflecting,
        }
    }
}

/// A fully validated, axially laid out collection of submodels for sequential
/// ray tracing.
///
/// Produced by [`build`](crate::Engine::build); see [`SystemError`] for the
/// ways construction can fail.
#[derive(Debug)]
pub struct SequentialModel {
    surfaces: Vec<Surface>,
    submodels: HashMap<SubModelID, SequentialSubModel>,
}

#[derive(Debug)]
pub struct SequentialSubModel {
    gaps: Vec<Gap>,
}

/// A unique identifier for a submodel: a wavelength index into the system's
/// wavelength list, paired with the transverse axis the submodel is computed
/// along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubModelID(pub usize, pub Axis);

/// An iterator over the surfaces and gaps in a submodel.
///
/// Most operations in sequential modeling involve use of this iterator.
pub(crate) struct SequentialSubModelIter<'a> {
    surfaces: &'a [Surface],
    gaps: &'a [Gap],
    index: usize,
}

/// A reverse iterator over the surfaces and gaps in a submodel.
pub(crate) struct SequentialSubModelReverseIter<'a> {
    surfaces: &'a [Surface],
    gaps: &'a [Gap],
    index: usize,
}

/// A single ray tracing step in a sequential system.
pub(crate) type Step<'a> = (&'a Gap, &'a Surface, Option<&'a Gap>);

#[derive(Debug)]
pub enum Surface {
    Conic(Conic),
    Image(Plane),
    Object(Plane),
    Probe(Plane),
    Stop(Stop),
}

/// A conic-of-revolution refracting or reflecting surface.
#[derive(Debug)]
pub(crate) struct Conic {
    pos: Float,
    semi_diameter: Float,
    radius_of_curvature: Float,
    conic_constant: Float,
    interaction: SurfaceInteraction,
}

/// A flat surface with no effect of its own on ray geometry: `Object`,
/// `Image`, and `Probe` all share this shape.
#[derive(Debug)]
pub(crate) struct Plane {
    pos: Float,
    semi_diameter: Float,
}

#[derive(Debug)]
pub(crate) struct Stop {
    pos: Float,
    semi_diameter: Float,
}

impl Conic {
    /// Returns the surface sag and outward normal at a transverse position
    /// `(x, y)`, both in the surface's local frame (vertex at the origin).
    pub(crate) fn sag_norm(&self, x: Float, y: Float) -> (Float, crate::core::math::vec3::Vec3) {
        use crate::core::math::vec3::Vec3;

        if self.radius_of_curvature.is_infinite() {
            return (0.0, Vec3::new(0.0, 0.0, 1.0));
        }

        let r2 = x * x + y * y;
        let roc = self.radius_of_curvature;
        let k = self.conic_constant;
        let a = r2 / roc;
        let sag = a / (1.0 + (1.0 - (1.0 + k) * a / roc).sqrt());

        let denom = (roc.powi(4) - (1.0 + k) * r2 * roc * roc).sqrt();
        let dfdx = -x * roc / denom;
        let dfdy = -y * roc / denom;
        let dfdz = 1.0;
        let norm = Vec3::new(dfdx, dfdy, dfdz).normalize();

        (sag, norm)
    }

    pub(crate) fn roc(&self) -> Float {
        self.radius_of_curvature
    }

    pub(crate) fn conic_constant(&self) -> Float {
        self.conic_constant
    }

    /// Checks invariant 3: the conic must geometrically close by the time it
    /// reaches `semi_diameter`.
    fn check_realizable(&self, index: usize) -> Result<(), SystemError> {
        if self.radius_of_curvature.is_infinite() {
            return Ok(());
        }
        let k = self.conic_constant;
        if 1.0 + k <= 0.0 {
            // Hyperboloid or steeper: the surface never closes, always realizable.
            return Ok(());
        }
        let limit = self.radius_of_curvature.abs() * (1.0 / (1.0 + k)).sqrt();
        if self.semi_diameter.abs() > limit + GEOM_ZERO_TOL {
            return Err(SystemError::geometry_unrealizable(
                index,
                format!(
                    "semi-diameter {} exceeds the closure limit {} for R={}, k={}",
                    self.semi_diameter, limit, self.radius_of_curvature, k
                ),
            ));
        }
        Ok(())
    }
}

impl Gap {
    pub(crate) fn try_from_spec(
        spec: &GapSpec,
        wavelength: Float,
        catalog: Option<&dyn MaterialCatalog>,
        index: usize,
    ) -> Result<Self, SystemError> {
        let n = medium::resolve(&spec.medium, wavelength, catalog, index)?;
        Ok(Self {
            thickness: spec.thickness,
            n,
        })
    }
}

impl SequentialModel {
    /// Validates `surface_specs`/`gap_specs` and lays them out along the
    /// optical axis, resolving a refractive index for every (gap,
    /// wavelength) pair.
    ///
    /// This implements steps 1-4 of the build pipeline: shape check,
    /// per-surface semi-diameter defaults, axial layout, and medium
    /// resolution. Aperture-stop solving and entrance-pupil sizing happen
    /// afterward, once a paraxial trace is available.
    pub(crate) fn new(
        gap_specs: &[GapSpec],
        surface_specs: &[SurfaceSpec],
        wavelengths: &[Float],
        catalog: Option<&dyn MaterialCatalog>,
    ) -> Result<Self, SystemError> {
        Self::validate_shape(gap_specs, surface_specs, wavelengths)?;

        let surfaces = Self::surf_specs_to_surfs(surface_specs, gap_specs)?;

        let mut submodels = HashMap::new();
        for (wavelength_index, &wavelength) in wavelengths.iter().enumerate() {
            let gaps = Self::gap_specs_to_gaps(gap_specs, wavelength, catalog)?;
            submodels.insert(
                SubModelID(wavelength_index, Axis::Y),
                SequentialSubModel::new(gaps),
            );
        }

        Ok(Self {
            surfaces,
            submodels,
        })
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn submodels(&self) -> &HashMap<SubModelID, SequentialSubModel> {
        &self.submodels
    }

    /// Returns the largest semi-diameter of any surface in the system,
    /// ignoring `Object`, `Image`, and `Probe` surfaces.
    pub fn largest_semi_diameter(&self) -> Float {
        self.surfaces
            .iter()
            .filter_map(|surf| match surf {
                Surface::Conic(conic) => Some(conic.semi_diameter),
                Surface::Stop(stop) => Some(stop.semi_diameter),
                _ => None,
            })
            .fold(0.0, |acc, x: Float| acc.max(x))
    }

    fn gap_specs_to_gaps(
        gap_specs: &[GapSpec],
        wavelength: Float,
        catalog: Option<&dyn MaterialCatalog>,
    ) -> Result<Vec<Gap>, SystemError> {
        gap_specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Gap::try_from_spec(spec, wavelength, catalog, index))
            .collect()
    }

    fn surf_specs_to_surfs(
        surf_specs: &[SurfaceSpec],
        gap_specs: &[GapSpec],
    ) -> Result<Vec<Surface>, SystemError> {
        let mut surfaces = Vec::with_capacity(surf_specs.len());

        // Surface 0 (Object) sits wherever the cursor starts; the cursor's
        // handling of an infinite first gap lands surface 1 at z=0.
        let mut cursor = Cursor::new(-gap_specs[0].thickness);

        for (index, (surf_spec, gap_spec)) in
            surf_specs.iter().zip(gap_specs.iter()).enumerate()
        {
            let surf = Surface::from_spec(surf_spec, cursor.pos(), surf_specs, index)?;

            if let SurfaceInteraction::Reflecting = surf.interaction() {
                cursor.invert();
            }

            surfaces.push(surf);
            cursor.advance(gap_spec.thickness);
        }

        let last_index = surf_specs.len() - 1;
        surfaces.push(Surface::from_spec(
            &surf_specs[last_index],
            cursor.pos(),
            surf_specs,
            last_index,
        )?);

        Ok(surfaces)
    }

    fn validate_shape(
        gap_specs: &[GapSpec],
        surf_specs: &[SurfaceSpec],
        wavelengths: &[Float],
    ) -> Result<(), SystemError> {
        if surf_specs.len() < 2 {
            return Err(SystemError::shape_invalid(
                "a system requires at least an Object and an Image surface",
            ));
        }
        if surf_specs.len() != gap_specs.len() + 1 {
            return Err(SystemError::shape_invalid(format!(
                "expected {} gaps for {} surfaces, got {}",
                surf_specs.len() - 1,
                surf_specs.len(),
                gap_specs.len()
            )));
        }
        if !matches!(surf_specs.first(), Some(SurfaceSpec::Object)) {
            return Err(SystemError::shape_invalid("the first surface must be Object"));
        }
        if !matches!(surf_specs.last(), Some(SurfaceSpec::Image)) {
            return Err(SystemError::shape_invalid("the last surface must be Image"));
        }
        for (index, spec) in surf_specs.iter().enumerate().skip(1).take(surf_specs.len() - 2) {
            if matches!(spec, SurfaceSpec::Object | SurfaceSpec::Image) {
                return Err(SystemError::shape_invalid(format!(
                    "surface {index} is Object/Image but is not the first/last surface"
                )));
            }
        }
        if wavelengths.is_empty() {
            return Err(SystemError::shape_invalid("at least one wavelength is required"));
        }
        for &w in wavelengths {
            if !w.is_finite() || w <= 0.0 {
                return Err(SystemError::shape_invalid(format!(
                    "wavelengths must be finite and positive, got {w}"
                )));
            }
        }
        for (index, gap) in gap_specs.iter().enumerate() {
            let is_edge = index == 0 || index == gap_specs.len() - 1;
            if gap.thickness < 0.0 {
                return Err(SystemError::shape_invalid(format!(
                    "gap {index} has negative thickness {}",
                    gap.thickness
                )));
            }
            if gap.thickness.is_infinite() && !is_edge {
                return Err(SystemError::shape_invalid(format!(
                    "only the first and last gaps may be infinite, got gap {index}"
                )));
            }
        }
        Ok(())
    }
}

impl SequentialSubModel {
    pub(crate) fn new(gaps: Vec<Gap>) -> Self {
        Self { gaps }
    }

    pub(crate) fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub(crate) fn is_obj_at_inf(&self) -> bool {
        self.gaps
            .first()
            .expect("there must be at least one gap in a sequential submodel")
            .thickness
            .is_infinite()
    }

    pub(crate) fn iter<'a>(&'a self, surfaces: &'a [Surface]) -> SequentialSubModelIter<'a> {
        SequentialSubModelIter::new(surfaces, &self.gaps)
    }
}

impl<'a> SequentialSubModelIter<'a> {
    fn new(surfaces: &'a [Surface], gaps: &'a [Gap]) -> Self {
        Self {
            surfaces,
            gaps,
            index: 0,
        }
    }

    pub fn reverse(self) -> SequentialSubModelReverseIter<'a> {
        SequentialSubModelReverseIter::new(self.surfaces, self.gaps)
    }
}

impl<'a> Iterator for SequentialSubModelIter<'a> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.gaps.len() - 1 {
            let result = Some((&self.gaps[self.index], &self.surfaces[self.index + 1], None));
            self.index += 1;
            result
        } else if self.index < self.gaps.len() {
            let result = Some((
                &self.gaps[self.index],
                &self.surfaces[self.index + 1],
                Some(&self.gaps[self.index + 1]),
            ));
            self.index += 1;
            result
        } else {
            None
        }
    }
}

impl<'a> ExactSizeIterator for SequentialSubModelIter<'a> {
    fn len(&self) -> usize {
        self.gaps.len()
    }
}

impl<'a> SequentialSubModelReverseIter<'a> {
    fn new(surfaces: &'a [Surface], gaps: &'a [Gap]) -> Self {
        Self {
            surfaces,
            gaps,
            // Never iterate from the image space surface in reverse.
            index: 1,
        }
    }
}

impl<'a> Iterator for SequentialSubModelReverseIter<'a> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.gaps.len();
        let forward_index = n - self.index;
        if self.index < n {
            let result = Some((
                &self.gaps[forward_index],
                &self.surfaces[forward_index],
                Some(&self.gaps[forward_index - 1]),
            ));
            self.index += 1;
            result
        } else {
            None
        }
    }
}

/// Returns the default semi-diameter for a surface that does not declare its
/// own: the largest semi-diameter among the surfaces immediately before and
/// after it that carry one, or `1.0` if neither does.
fn default_semi_diameter(index: usize, surf_specs: &[SurfaceSpec]) -> Float {
    let neighbor_sd = |spec: Option<&SurfaceSpec>| match spec {
        Some(SurfaceSpec::Conic { semi_diameter, .. }) => Some(*semi_diameter),
        Some(SurfaceSpec::Stop { semi_diameter }) => Some(*semi_diameter),
        _ => None,
    };

    let before = index.checked_sub(1).and_then(|i| neighbor_sd(surf_specs.get(i)));
    let after = neighbor_sd(surf_specs.get(index + 1));

    match (before, after) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => 1.0,
    }
}

impl Surface {
    pub(crate) fn from_spec(
        spec: &SurfaceSpec,
        pos: Float,
        surf_specs: &[SurfaceSpec],
        index: usize,
    ) -> Result<Self, SystemError> {
        let surf = match spec {
            SurfaceSpec::Conic {
                semi_diameter,
                radius_of_curvature,
                conic_constant,
                kind,
            } => {
                let conic = Conic {
                    pos,
                    semi_diameter: *semi_diameter,
                    radius_of_curvature: *radius_of_curvature,
                    conic_constant: *conic_constant,
                    interaction: (*kind).into(),
                };
                conic.check_realizable(index)?;
                Self::Conic(conic)
            }
            SurfaceSpec::Image => Self::Image(Plane {
                pos,
                semi_diameter: default_semi_diameter(index, surf_specs),
            }),
            SurfaceSpec::Object => Self::Object(Plane {
                pos,
                semi_diameter: default_semi_diameter(index, surf_specs),
            }),
            SurfaceSpec::Probe => Self::Probe(Plane {
                pos,
                semi_diameter: default_semi_diameter(index, surf_specs),
            }),
            SurfaceSpec::Stop { semi_diameter } => Self::Stop(Stop {
                pos,
                semi_diameter: *semi_diameter,
            }),
        };
        Ok(surf)
    }

    /// Determines whether a transverse point is outside the clear aperture
    /// of the surface. The axial position is ignored.
    pub(crate) fn outside_clear_aperture(&self, x: Float, y: Float) -> bool {
        let r_max = self.semi_diameter();
        x * x + y * y > r_max * r_max
    }

    pub(crate) fn roc(&self) -> Float {
        match self {
            Self::Conic(conic) => conic.roc(),
            _ => Float::INFINITY,
        }
    }

    pub(crate) fn conic_constant(&self) -> Float {
        match self {
            Self::Conic(conic) => conic.conic_constant(),
            _ => 0.0,
        }
    }

    /// Returns the axial position of the surface in the global frame.
    pub(crate) fn pos(&self) -> Float {
        match self {
            Self::Conic(conic) => conic.pos,
            Self::Image(plane) => plane.pos,
            Self::Object(plane) => plane.pos,
            Self::Probe(plane) => plane.pos,
            Self::Stop(stop) => stop.pos,
        }
    }

    /// Returns the surface sag and normal at a transverse position `(x, y)`
    /// in the surface's local frame.
    pub(crate) fn sag_norm(&self, x: Float, y: Float) -> (Float, crate::core::math::vec3::Vec3) {
        match self {
            Self::Conic(conic) => conic.sag_norm(x, y),
            Self::Image(_) | Self::Object(_) | Self::Probe(_) | Self::Stop(_) => {
                (0.0, crate::core::math::vec3::Vec3::new(0.0, 0.0, 1.0))
            }
        }
    }

    pub(crate) fn semi_diameter(&self) -> Float {
        match self {
            Self::Conic(conic) => conic.semi_diameter,
            Self::Stop(stop) => stop.semi_diameter,
            Self::Image(plane) | Self::Object(plane) | Self::Probe(plane) => plane.semi_diameter,
        }
    }

    pub(crate) fn interaction(&self) -> SurfaceInteraction {
        match self {
            Self::Conic(conic) => conic.interaction,
            _ => SurfaceInteraction::NoOp,
        }
    }

    pub(crate) fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

//! The host-facing entry point for this crate (`spec.md` §6).
//!
//! [`Engine`] owns the editable specs of a system and the [`BuiltSystem`]
//! produced from them, if any. A host edits specs through the setters, calls
//! [`Engine::build`] to validate and analyze them, then reads the result
//! through [`Engine::describe`] and traces rays through it with
//! [`Engine::trace`] and its diagnostic variants. Every setter discards the
//! built system (invariant 7: edits invalidate the build), so a host can
//! never read a description or trace that does not match the specs
//! currently set.
use tracing::instrument;

use crate::core::Float;
use crate::core::sequential_model::SequentialModel;
use crate::error::SystemError;
use crate::materials::MaterialCatalog;
use crate::specs::aperture::ApertureSpec;
use crate::specs::fields::FieldSpec;
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::SurfaceSpec;
use crate::views::description::Description;
use crate::views::paraxial::ParaxialView;
use crate::views::ray_trace_3d::{self, TraceResultsCollection};

/// A validated, analyzed system: the frozen result of [`Engine::build`].
///
/// Bundles the [`SequentialModel`] built from the current specs together
/// with the [`ParaxialView`] derived from it and the specs that produced
/// both, so [`Engine::describe`] and [`Engine::trace`] always read a
/// mutually consistent set of values.
#[derive(Debug)]
pub struct BuiltSystem {
    sequential_model: SequentialModel,
    paraxial_view: ParaxialView,
    aperture_spec: ApertureSpec,
    field_specs: Vec<FieldSpec>,
}

impl BuiltSystem {
    pub fn sequential_model(&self) -> &SequentialModel {
        &self.sequential_model
    }

    pub fn paraxial_view(&self) -> &ParaxialView {
        &self.paraxial_view
    }

    pub fn aperture_spec(&self) -> &ApertureSpec {
        &self.aperture_spec
    }

    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.field_specs
    }
}

/// The error an `Engine` method returns when it requires a built system and
/// none is present, or when the trace it was asked to run could not run.
///
/// This is distinct from [`SystemError`]: a [`SystemError`] describes a
/// defect in the host's data, while [`EngineError::NotBuilt`] describes a
/// caller ordering mistake (calling `describe`/`trace` before `build`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("system has not been built; call build() first")]
    NotBuilt,

    #[error(transparent)]
    Build(#[from] SystemError),

    #[error("trace failed: {0}")]
    Trace(String),
}

/// The editable specs of a system plus whatever was last built from them.
#[derive(Debug, Default)]
pub struct Engine {
    surface_specs: Vec<SurfaceSpec>,
    gap_specs: Vec<GapSpec>,
    aperture_spec: Option<ApertureSpec>,
    field_specs: Vec<FieldSpec>,
    wavelengths: Vec<Float>,
    material_catalog: Option<Box<dyn MaterialCatalog>>,
    built: Option<BuiltSystem>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_surfaces(&mut self, surface_specs: Vec<SurfaceSpec>) {
        self.surface_specs = surface_specs;
        self.built = None;
    }

    pub fn set_gaps(&mut self, gap_specs: Vec<GapSpec>) {
        self.gap_specs = gap_specs;
        self.built = None;
    }

    pub fn set_aperture(&mut self, aperture_spec: ApertureSpec) {
        self.aperture_spec = Some(aperture_spec);
        self.built = None;
    }

    pub fn set_fields(&mut self, field_specs: Vec<FieldSpec>) {
        self.field_specs = field_specs;
        self.built = None;
    }

    pub fn set_wavelengths(&mut self, wavelengths: Vec<Float>) {
        self.wavelengths = wavelengths;
        self.built = None;
    }

    /// Installs the host's materials collaborator, used to resolve
    /// [`Medium::Material`] gaps at build time. Systems that only use
    /// [`Medium::RefractiveIndex`] gaps never need one.
    pub fn set_material_catalog(&mut self, catalog: Box<dyn MaterialCatalog>) {
        self.material_catalog = Some(catalog);
        self.built = None;
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Validates the current specs and analyzes them into a [`BuiltSystem`],
    /// replacing whatever was built before.
    ///
    /// Halts at the first offending surface or gap, per §7's error
    /// handling design: this crate never partially builds a system.
    #[instrument(skip(self), fields(
        num_surfaces = self.surface_specs.len(),
        num_gaps = self.gap_specs.len(),
        num_wavelengths = self.wavelengths.len(),
    ))]
    pub fn build(&mut self) -> Result<(), SystemError> {
        self.built = None;

        let aperture_spec = self
            .aperture_spec
            .ok_or_else(|| SystemError::shape_invalid("no aperture spec set"))?;
        aperture_spec
            .validate()
            .map_err(|e| SystemError::shape_invalid(e.to_string()))?;

        for (index, field_spec) in self.field_specs.iter().enumerate() {
            field_spec.validate().map_err(|e| {
                SystemError::new(
                    crate::error::SystemErrorKind::ShapeInvalid,
                    Some(index),
                    e.to_string(),
                )
            })?;
        }

        let sequential_model = SequentialModel::new(
            &self.gap_specs,
            &self.surface_specs,
            &self.wavelengths,
            self.material_catalog.as_deref(),
        )?;

        let paraxial_view = ParaxialView::new(
            &sequential_model,
            &self.wavelengths,
            &self.field_specs,
            &aperture_spec,
        )
        .map_err(|e| SystemError::ambiguous_stop(e.to_string()))?;

        tracing::debug!("system built successfully");

        self.built = Some(BuiltSystem {
            sequential_model,
            paraxial_view,
            aperture_spec,
            field_specs: self.field_specs.clone(),
        });

        Ok(())
    }

    fn require_built(&self) -> Result<&BuiltSystem, EngineError> {
        self.built.as_ref().ok_or(EngineError::NotBuilt)
    }

    /// Assembles the components, cutaway, and paraxial views of the last
    /// built system.
    #[instrument(skip(self))]
    pub fn describe(&self) -> Result<Description, EngineError> {
        let built = self.require_built()?;
        Description::new(&built.sequential_model, &built.paraxial_view).map_err(EngineError::from)
    }

    /// Traces every field at every wavelength, sampling each field's pupil
    /// with its own declared `pupil_sampling`.
    #[instrument(skip(self))]
    pub fn trace(&self) -> Result<TraceResultsCollection, EngineError> {
        let built = self.require_built()?;
        ray_trace_3d::ray_trace_3d_view(
            &built.sequential_model,
            &built.paraxial_view,
            &built.field_specs,
        )
        .map_err(|e| EngineError::Trace(e.to_string()))
    }

    /// Traces a diagnostic tangential ray fan through every field, ignoring
    /// each field's declared `pupil_sampling`.
    #[instrument(skip(self))]
    pub fn trace_tangential_ray_fan(&self) -> Result<TraceResultsCollection, EngineError> {
        let built = self.require_built()?;
        let coords = ray_trace_3d::tangential_fan();
        ray_trace_3d::ray_trace_3d_view_with_coords(
            &built.sequential_model,
            &built.paraxial_view,
            &built.field_specs,
            &coords,
        )
        .map_err(|e| EngineError::Trace(e.to_string()))
    }

    /// Traces only the chief ray and the two marginal rays of the
    /// tangential fan through every field.
    #[instrument(skip(self))]
    pub fn trace_chief_and_marginal_rays(&self) -> Result<TraceResultsCollection, EngineError> {
        let built = self.require_built()?;
        let coords = ray_trace_3d::chief_and_marginal();
        ray_trace_3d::ray_trace_3d_view_with_coords(
            &built.sequential_model,
            &built.paraxial_view,
            &built.field_specs,
            &coords,
        )
        .map_err(|e| EngineError::Trace(e.to_string()))
    }
}

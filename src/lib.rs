//! A sequential ray-tracing engine for centered, rotationally-symmetric
//! optical systems.
//!
//! The core structure of sequential optical design is the
//! [SequentialModel](struct@SequentialModel), a set of submodels containing
//! surfaces and gaps between surfaces. Each
//! [SequentialSubModel](struct@SequentialSubModel) corresponds to a unique
//! set of system parameters, i.e. a wavelength and a transverse axis. A
//! submodel provides an interface to iterate over the surfaces and gaps in
//! the system.
//!
//! Inputs to the system are provided by specs, of which there are several
//! types:
//!
//! - [SurfaceSpec](enum@SurfaceSpec) - Describes a surface in the system for
//!   which surface sag or paraxial ray trace matrices can be calculated.
//! - [GapSpec](struct@GapSpec) - Describes a gap between surfaces in the
//!   system. The refractive [Medium](enum@Medium) filling it is located
//!   here.
//! - [ApertureSpec](enum@ApertureSpec) - Describes the aperture of the
//!   system. This may differ from any pupils that can be derived directly
//!   from the surfaces and gaps.
//! - [FieldSpec](enum@FieldSpec) - Describes the field points of the system.
//! - [MaterialCatalog](trait@MaterialCatalog) - Resolves a named
//!   [Medium::Material](enum@Medium) into a refractive index. This is a
//!   trait so that different material databases may be implemented by a
//!   host.
//!
//! The outputs of the system are provided by views, such as:
//!
//! - [ParaxialView](struct@ParaxialView) - A paraxial view of the system.
//!   Contains information such as focal length, principal planes, etc.
//! - [TraceResultsCollection](struct@TraceResultsCollection) - A 3D ray
//!   trace view of the system.
//! - [CutawayView](struct@CutawayView) - A cutaway view of the system. Used
//!   primarily for drawing the system.
//! - [components_view](fn@components_view) - A view of the components of
//!   the system. Used for grouping surfaces into lenses.
//!
//! Most applications drive all of the above through a single [Engine],
//! which owns the current specs and the system last built from them.
//!
//! # Quick Start
//! ```rust
//! use sequential_raytracer::{
//!     n, ApertureSpec, Engine, FieldSpec, GapSpec, PupilSampling, SurfaceKind, SurfaceSpec,
//! };
//!
//! // Create a convexplano lens with an object at infinity.
//! let air = n!(1.0);
//! let nbk7 = n!(1.515);
//!
//! // Define a set of gaps between surfaces.
//! let gaps = vec![
//!     GapSpec {
//!         thickness: f64::INFINITY,
//!         medium: air.clone(),
//!     },
//!     GapSpec {
//!         thickness: 5.3,
//!         medium: nbk7,
//!     },
//!     GapSpec {
//!         thickness: 46.6,
//!         medium: air,
//!     },
//! ];
//!
//! // Define a set of surfaces in the system.
//! let surfaces = vec![
//!     SurfaceSpec::Object,
//!     SurfaceSpec::Conic {
//!         semi_diameter: 12.5,
//!         radius_of_curvature: 25.8,
//!         conic_constant: 0.0,
//!         kind: SurfaceKind::Refracting,
//!     },
//!     SurfaceSpec::Conic {
//!         semi_diameter: 12.5,
//!         radius_of_curvature: f64::INFINITY,
//!         conic_constant: 0.0,
//!         kind: SurfaceKind::Refracting,
//!     },
//!     SurfaceSpec::Image,
//! ];
//!
//! // Define a user-defined system aperture.
//! let aperture_spec = ApertureSpec::EntrancePupil { semi_diameter: 5.0 };
//!
//! // Analyze the system at two different field points, sampling the pupil
//! // with a square grid with a spacing of 0.1 in normalized pupil coordinates.
//! let field_specs = vec![
//!     FieldSpec::Angle {
//!         angle_deg: 0.0,
//!         pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
//!     },
//!     FieldSpec::Angle {
//!         angle_deg: 5.0,
//!         pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 },
//!     },
//! ];
//!
//! // Assemble the engine and build the system.
//! let mut engine = Engine::new();
//! engine.set_surfaces(surfaces);
//! engine.set_gaps(gaps);
//! engine.set_wavelengths(vec![0.567]);
//! engine.set_aperture(aperture_spec);
//! engine.set_fields(field_specs);
//! engine.build().unwrap();
//!
//! // Read the first-order properties of each wavelength/axis submodel.
//! for (sub_model_id, sub_view) in engine.describe().unwrap().paraxial.subviews {
//!     println!(
//!         "Submodel ID: {:?}, Effective focal length: {}",
//!         sub_model_id, sub_view.effective_focal_length
//!     );
//! }
//!
//! // Trace every field at every wavelength.
//! let rays = engine.trace().unwrap();
//! assert_eq!(rays.len(), 2);
//! ```

mod core;
mod engine;
mod error;
mod materials;
pub mod protocol;
mod specs;
mod views;

// API
pub mod examples;
pub use core::{
    math::vec3::Vec3,
    sequential_model::{Axis, SequentialModel, SequentialSubModel, SubModelID},
};
pub use engine::{BuiltSystem, Engine, EngineError};
pub use error::{SystemError, SystemErrorKind, TerminationReason};
pub use materials::{MaterialCatalog, Medium};
pub use specs::{
    aperture::ApertureSpec,
    fields::{FieldSpec, PupilSampling},
    gaps::GapSpec,
    surfaces::{SurfaceKind, SurfaceSpec},
};
pub use views::{
    components::{components_view, Component},
    cutaway::CutawayView,
    description::Description,
    paraxial::{
        ImagePlane, ParaxialSubView, ParaxialSubViewDescription, ParaxialView,
        ParaxialViewDescription, Pupil,
    },
    ray_trace_3d::{Ray, RayBundle, TraceResults, TraceResultsCollection},
};

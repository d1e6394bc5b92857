/// Untyped-to-typed input boundary for a sequential optical system.
///
/// Specs are the editable, serializable description of a system as the host
/// provides it. [`build`](crate::Engine::build) is the sole place a spec is
/// validated and turned into the crate's internal, immutable representation.
pub mod aperture;
pub mod fields;
pub mod gaps;
pub mod surfaces;

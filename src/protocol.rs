//! The host-worker message protocol (`spec.md` §6).
//!
//! The host owns one [`Engine`] instance off its UI thread and serializes
//! requests through a FIFO queue with a monotonically increasing
//! `request_id`, which the engine echoes back in its `Computed` response so
//! a host can discard stale results. This module only defines the message
//! shapes and the pure [`handle`] dispatch function; the queue, the thread,
//! and how messages physically arrive are left to the host.
use serde::{Deserialize, Serialize};

use crate::core::Float;
use crate::engine::Engine;
use crate::specs::aperture::ApertureSpec;
use crate::specs::fields::FieldSpec;
use crate::specs::gaps::GapSpec;
use crate::specs::surfaces::SurfaceSpec;
use crate::views::ray_trace_3d::TraceResultsCollection;

/// A message sent from the host to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "msg")]
pub enum HostMessage {
    /// Resets the engine to a freshly-constructed state.
    Initialize,

    /// Replaces every spec and traces the resulting system in one step.
    Compute {
        request_id: u32,
        specs: ComputeSpecs,
    },
}

/// The full set of specs needed to build and trace a system in one
/// `Compute` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSpecs {
    pub surfaces: Vec<SurfaceSpec>,
    pub gaps: Vec<GapSpec>,
    pub aperture: ApertureSpec,
    pub fields: Vec<FieldSpec>,
    pub wavelengths: Vec<Float>,
}

/// A message sent from the engine to the host.
#[derive(Debug, Serialize)]
#[serde(tag = "msg")]
pub enum EngineMessage {
    /// Acknowledges an `Initialize` request.
    Initialized,

    /// Answers a `Compute` request, echoing its `request_id`. Exactly one
    /// of `rays`/`error` is present: a build or trace failure is reported
    /// as `error`, never as a panic.
    Computed {
        request_id: u32,
        rays: Option<TraceResultsCollection>,
        error: Option<String>,
    },
}

/// Applies `message` to `engine` and returns the engine's response.
///
/// This is the entire contract §5/§6 place on the engine side of the
/// protocol: given the current engine state and one message, produce the
/// next state and a response, with no hidden I/O. A host may call this
/// directly from its own queue-draining loop, or from a worker thread that
/// simply forwards `HostMessage`s in and `EngineMessage`s out.
pub fn handle(engine: &mut Engine, message: HostMessage) -> EngineMessage {
    match message {
        HostMessage::Initialize => {
            *engine = Engine::new();
            EngineMessage::Initialized
        }
        HostMessage::Compute { request_id, specs } => {
            engine.set_surfaces(specs.surfaces);
            engine.set_gaps(specs.gaps);
            engine.set_aperture(specs.aperture);
            engine.set_fields(specs.fields);
            engine.set_wavelengths(specs.wavelengths);

            let result = engine
                .build()
                .map_err(|e| e.to_string())
                .and_then(|()| engine.trace().map_err(|e| e.to_string()));

            match result {
                Ok(rays) => EngineMessage::Computed {
                    request_id,
                    rays: Some(rays),
                    error: None,
                },
                Err(message) => EngineMessage::Computed {
                    request_id,
                    rays: None,
                    error: Some(message),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examples::convexplano_lens;
    use crate::specs::fields::PupilSampling;

    fn convexplano_compute(request_id: u32) -> HostMessage {
        let (surfaces, gaps) = convexplano_lens::specs();

        HostMessage::Compute {
            request_id,
            specs: ComputeSpecs {
                surfaces,
                gaps,
                aperture: ApertureSpec::EntrancePupil { semi_diameter: 12.5 },
                fields: vec![FieldSpec::Angle {
                    angle_deg: 0.0,
                    pupil_sampling: PupilSampling::SquareGrid { spacing: 0.5 },
                }],
                wavelengths: vec![0.5876],
            },
        }
    }

    #[test]
    fn initialize_resets_the_engine() {
        let mut engine = Engine::new();
        engine.set_wavelengths(vec![0.5876]);
        let response = handle(&mut engine, HostMessage::Initialize);
        assert!(matches!(response, EngineMessage::Initialized));
        assert!(!engine.is_built());
    }

    #[test]
    fn compute_echoes_the_request_id_and_returns_rays() {
        let mut engine = Engine::new();
        let response = handle(&mut engine, convexplano_compute(7));
        match response {
            EngineMessage::Computed {
                request_id,
                rays,
                error,
            } => {
                assert_eq!(request_id, 7);
                assert!(rays.is_some());
                assert!(error.is_none());
            }
            EngineMessage::Initialized => panic!("expected Computed"),
        }
    }

    #[test]
    fn compute_reports_build_failures_as_an_error_string_not_a_panic() {
        let mut engine = Engine::new();
        let message = HostMessage::Compute {
            request_id: 1,
            specs: ComputeSpecs {
                surfaces: vec![SurfaceSpec::Object],
                gaps: vec![],
                aperture: ApertureSpec::EntrancePupil { semi_diameter: 5.0 },
                fields: vec![],
                wavelengths: vec![0.5876],
            },
        };
        let response = handle(&mut engine, message);
        match response {
            EngineMessage::Computed { rays, error, .. } => {
                assert!(rays.is_none());
                assert!(error.is_some());
            }
            EngineMessage::Initialized => panic!("expected Computed"),
        }
    }
}

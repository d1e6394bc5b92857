/// Samples every surface's profile in the y-z plane for rendering a cutaway
/// diagram of the system (engine design §4.3).
use std::collections::HashMap;

use serde::Serialize;

use crate::core::Float;
use crate::core::math::vec3::Vec3;
use crate::core::sequential_model::{SequentialModel, Surface};

/// Default number of points sampled across a conic's clear aperture.
const DEFAULT_SAMPLES: usize = 21;

/// A cutaway view through the center transverse plane of a sequential model:
/// one polyline per surface, in the y-z plane (`x=0`).
///
/// The renderer is expected to complete the flange segments of `Stop`,
/// `Object`, and `Image` planes from the system's overall bounding box; this
/// view returns only each surface's clear-aperture polyline.
#[derive(Debug, Clone, Serialize)]
pub struct CutawayView {
    pub path_samples: HashMap<usize, Vec<Vec3>>,
    pub semi_diameters: HashMap<usize, Float>,
    pub surface_types: HashMap<usize, String>,
}

impl CutawayView {
    pub fn new(sequential_model: &SequentialModel) -> CutawayView {
        Self::with_samples(sequential_model, DEFAULT_SAMPLES)
    }

    pub fn with_samples(sequential_model: &SequentialModel, num_samples: usize) -> CutawayView {
        let mut path_samples = HashMap::new();
        let mut semi_diameters = HashMap::new();
        let mut surface_types = HashMap::new();

        for (i, surface) in sequential_model.surfaces().iter().enumerate() {
            path_samples.insert(i, sample_yz(surface, num_samples));
            semi_diameters.insert(i, surface.semi_diameter());
            surface_types.insert(i, surface_tag(surface).to_string());
        }

        CutawayView {
            path_samples,
            semi_diameters,
            surface_types,
        }
    }
}

/// Samples `surface`'s clear-aperture profile as an ordered polyline of
/// `(x=0, y, z)` points, `y` sweeping `[-semi_diameter, +semi_diameter]`.
///
/// An `Object`/`Image` plane at infinity has no physical location to sample
/// and yields an empty polyline. A flat surface (`roc == ∞`, including every
/// `Probe`/`Stop`/`Object`/`Image`) is a vertical segment: only its two
/// endpoints are returned rather than `num_samples` collinear points.
fn sample_yz(surface: &Surface, num_samples: usize) -> Vec<Vec3> {
    if matches!(surface, Surface::Object(_) | Surface::Image(_)) && surface.pos().is_infinite() {
        return Vec::new();
    }

    let semi_diameter = surface.semi_diameter();
    let z_vertex = surface.pos();

    if surface.roc().is_infinite() {
        return vec![
            Vec3::new(0.0, -semi_diameter, z_vertex),
            Vec3::new(0.0, semi_diameter, z_vertex),
        ];
    }

    (0..num_samples)
        .map(|i| {
            let y = -semi_diameter + 2.0 * semi_diameter * i as Float / (num_samples - 1) as Float;
            let (sag, _) = surface.sag_norm(0.0, y);
            Vec3::new(0.0, y, z_vertex + sag)
        })
        .collect()
}

fn surface_tag(surface: &Surface) -> &'static str {
    match surface {
        Surface::Conic(_) => "Conic",
        Surface::Image(_) => "Image",
        Surface::Object(_) => "Object",
        Surface::Probe(_) => "Probe",
        Surface::Stop(_) => "Stop",
    }
}

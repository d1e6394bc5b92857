//! A Cassegrain-style two-mirror system: the beam reflects off a concave
//! primary, folds back onto a convex secondary, and folds forward again to
//! the image plane. Confirms `direction_of_travel` bookkeeping survives more
//! than one reflection in the same system (a single concave mirror only
//! exercises one sign flip).
use sequential_raytracer::{
    ApertureSpec, Axis, Engine, FieldSpec, GapSpec, Medium, PupilSampling, SurfaceKind,
    SurfaceSpec,
};

fn built_engine() -> Engine {
    let air = Medium::RefractiveIndex(1.0);

    let gaps = vec![
        GapSpec { thickness: f64::INFINITY, medium: air.clone() },
        GapSpec { thickness: 500.0, medium: air.clone() },
        GapSpec { thickness: 600.0, medium: air },
    ];
    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 50.0,
            radius_of_curvature: -2000.0,
            conic_constant: 0.0,
            kind: SurfaceKind::Reflecting,
        },
        SurfaceSpec::Conic {
            semi_diameter: 10.0,
            radius_of_curvature: 400.0,
            conic_constant: 0.0,
            kind: SurfaceKind::Reflecting,
        },
        SurfaceSpec::Image,
    ];

    let mut engine = Engine::new();
    engine.set_surfaces(surfaces);
    engine.set_gaps(gaps);
    engine.set_wavelengths(vec![0.5876]);
    engine.set_aperture(ApertureSpec::EntrancePupil { semi_diameter: 50.0 });
    engine.set_fields(vec![FieldSpec::Angle {
        angle_deg: 0.0,
        pupil_sampling: PupilSampling::SquareGrid { spacing: 0.5 },
    }]);
    engine.build().unwrap();
    engine
}

#[test]
fn direction_of_travel_folds_twice_and_returns_forward() {
    let engine = built_engine();
    let results = engine.trace().unwrap();
    let on_axis = results.get(0, 0, Axis::Y).unwrap();
    let bundle = on_axis.ray_bundle();

    // Surface 0 (object) to surface 1 (primary): still traveling forward.
    assert_eq!(bundle.direction_of_travel(0), 1.0);
    // Surface 1 to surface 2 (secondary): folded back by the primary.
    assert_eq!(bundle.direction_of_travel(1), -1.0);
    // Surface 2 to surface 3 (image): folded forward again by the secondary.
    assert_eq!(bundle.direction_of_travel(2), 1.0);
}

#[test]
fn on_axis_ray_reaches_the_image_surface_without_vignetting() {
    let engine = built_engine();
    let results = engine.trace().unwrap();
    let on_axis = results.get(0, 0, Axis::Y).unwrap();
    let bundle = on_axis.ray_bundle();

    let image_surface = bundle.num_surfaces() - 1;
    for ray in 0..bundle.num_rays() {
        assert_eq!(bundle.terminated(ray), image_surface);
        assert_eq!(bundle.reason_for_termination(ray), None);
    }
}

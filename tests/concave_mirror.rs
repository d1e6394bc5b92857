//! Scenario D of the canonical test suite: a single concave mirror with
//! f = +100 mm. Checks that `direction_of_travel` flips sign after the
//! reflecting surface and that the paraxial properties match a textbook
//! mirror of this radius.
use approx::assert_abs_diff_eq;

use sequential_raytracer::examples::concave_mirror;
use sequential_raytracer::{ApertureSpec, Axis, Engine, FieldSpec, PupilSampling};

const APERTURE_STOP: usize = 1;
const EFFECTIVE_FOCAL_LENGTH: f64 = 100.0;
const BACK_FOCAL_DISTANCE: f64 = 100.0;
const FRONT_FOCAL_DISTANCE: f64 = 100.0;
const BACK_PRINCIPAL_PLANE: f64 = 0.0;
const FRONT_PRINCIPAL_PLANE: f64 = 0.0;
const ENTRANCE_PUPIL_SEMI_DIAMETER: f64 = 12.5;
const PARAXIAL_IMAGE_PLANE_5DEG_SEMI_DIAMETER: f64 = 8.7489;

fn specs() -> (Vec<sequential_raytracer::SurfaceSpec>, Vec<sequential_raytracer::GapSpec>) {
    use sequential_raytracer::{GapSpec, SurfaceKind, SurfaceSpec};

    let air = sequential_raytracer::Medium::RefractiveIndex(1.0);
    let gaps = vec![
        GapSpec { thickness: f64::INFINITY, medium: air.clone() },
        GapSpec { thickness: 100.0, medium: air },
    ];
    let surfaces = vec![
        SurfaceSpec::Object,
        SurfaceSpec::Conic {
            semi_diameter: 12.5,
            radius_of_curvature: -200.0,
            conic_constant: 0.0,
            kind: SurfaceKind::Reflecting,
        },
        SurfaceSpec::Image,
    ];
    (surfaces, gaps)
}

fn built_engine() -> Engine {
    let (surfaces, gaps) = specs();
    let mut engine = Engine::new();
    engine.set_surfaces(surfaces);
    engine.set_gaps(gaps);
    engine.set_wavelengths(vec![0.5876]);
    engine.set_aperture(ApertureSpec::EntrancePupil { semi_diameter: ENTRANCE_PUPIL_SEMI_DIAMETER });
    engine.set_fields(vec![
        FieldSpec::Angle { angle_deg: 0.0, pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 } },
        FieldSpec::Angle { angle_deg: 5.0, pupil_sampling: PupilSampling::SquareGrid { spacing: 0.1 } },
    ]);
    engine.build().unwrap();
    engine
}

#[test]
fn describe_matches_a_textbook_f_over_8_spherical_mirror() {
    let engine = built_engine();
    let description = engine.describe().unwrap();
    let subview = description
        .paraxial
        .subviews
        .get(&sequential_raytracer::SubModelID(0, Axis::Y))
        .unwrap();

    assert_eq!(subview.aperture_stop, APERTURE_STOP);
    assert_abs_diff_eq!(subview.effective_focal_length, EFFECTIVE_FOCAL_LENGTH, epsilon = 1e-3);
    assert_abs_diff_eq!(subview.back_focal_distance, BACK_FOCAL_DISTANCE, epsilon = 1e-3);
    assert_abs_diff_eq!(subview.front_focal_distance, FRONT_FOCAL_DISTANCE, epsilon = 1e-3);
    assert_abs_diff_eq!(subview.back_principal_plane, BACK_PRINCIPAL_PLANE, epsilon = 1e-9);
    assert_abs_diff_eq!(subview.front_principal_plane, FRONT_PRINCIPAL_PLANE, epsilon = 1e-9);
    assert_abs_diff_eq!(subview.entrance_pupil.semi_diameter, ENTRANCE_PUPIL_SEMI_DIAMETER, epsilon = 1e-9);
    assert_abs_diff_eq!(subview.exit_pupil.semi_diameter, ENTRANCE_PUPIL_SEMI_DIAMETER, epsilon = 1e-9);
}

#[test]
fn direction_of_travel_flips_sign_after_the_mirror() {
    let engine = built_engine();
    let results = engine.trace().unwrap();
    let on_axis = results.get(0, 0, Axis::Y).unwrap();
    let bundle = on_axis.ray_bundle();

    assert!(bundle.direction_of_travel(0) > 0.0);
    assert!(bundle.direction_of_travel(bundle.num_surfaces() - 1) < 0.0);
}

#[test]
fn chief_ray_reaches_the_paraxial_image_height_at_five_degrees() {
    let engine = built_engine();
    let results = engine.trace().unwrap();
    let five_degrees = results.get(1, 0, Axis::Y).unwrap();
    let chief = five_degrees.chief_ray();

    let image_surface = chief.num_surfaces() - 1;
    let (pos, _dir) = chief.get(image_surface, 0);
    assert_abs_diff_eq!(pos.y().abs(), PARAXIAL_IMAGE_PLANE_5DEG_SEMI_DIAMETER, epsilon = 0.1);
}

mod support;

use support::{centroid, fields_with, field_with, l, patch};
use tri_extrema::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn delta_is_intensity_minus_background() {
    let mesh = patch();
    let field = field_with(&mesh, 0.0, &[(5, -10.0)]);
    let catalog = ExtremaLocator::new("minima_back", "", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();

    let objects = catalog.objects_at(0);
    assert_eq!(objects.len(), 1);
    let p = &objects[0];
    assert_eq!(p.labels.to_vec(), vec![l(5)]);
    // two point-adjacency hops around 5 reach triangles 1..=9
    let background = p.background.unwrap();
    assert!(close(background, -10.0 / 9.0));
    assert_eq!(p.delta, p.intensity - background);
    assert_eq!(catalog.meta()["method_args"], "contour=0,max_merge_dist=0,min_delta=0,bg_hops=2");
}

#[test]
fn min_delta_filters_shallow_anomalies() {
    let mesh = patch();
    let field = field_with(&mesh, 0.0, &[(5, -10.0)]);
    let strict = ExtremaLocator::new("minima_back(0,0,9)", "", DetectionOpts::default()).unwrap();
    assert!(strict.locate(&mesh, &field).unwrap().is_empty());
    let loose = ExtremaLocator::new("minima_back(0,0,8)", "", DetectionOpts::default()).unwrap();
    assert_eq!(loose.locate(&mesh, &field).unwrap().len(), 1);
}

#[test]
fn background_members_must_stay_below_background() {
    let mesh = patch();
    // 4 and 6 are within the contour but only 4 sits below its background
    let field = field_with(&mesh, 0.0, &[(5, -10.0), (4, -3.0), (6, 1.0)]);
    let catalog = ExtremaLocator::new("minima_back(12)", "", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();
    let p = &catalog.objects_at(0)[0];
    assert!(p.labels.contains(l(4)));
    assert!(!p.labels.contains(l(6)));
}

/// Dip at triangle 3 at t = 0 moving to triangle 5 at t = 1.
fn moving_dip(mesh: &TriMesh) -> FieldSection {
    fields_with(mesh, &[(0.0, &[(3, -10.0)]), (0.0, &[(5, -10.0)])])
}

#[test]
fn wind_background_is_taken_upstream_at_the_previous_step() {
    let mesh = patch();
    let field = moving_dip(&mesh);
    let (c3, c5) = (centroid(&mesh, l(3)), centroid(&mesh, l(5)));
    let d = [c5[0] - c3[0], c5[1] - c3[1], c5[2] - c3[2]];
    let steering = format!("uniform({},{},{})", d[0], d[1], d[2]);

    let wind = ExtremaLocator::new("minima_back_wind(0,0,1)", &steering, DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();
    let still = ExtremaLocator::new("minima_back(0,0,1)", "", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();

    // the first step has nothing upstream and matches the unsteered variant
    assert_eq!(wind.objects_at(0)[0].labels, still.objects_at(0)[0].labels);
    assert_eq!(wind.objects_at(0)[0].background, Some(-1.25));

    let moved = &wind.objects_at(1)[0];
    assert_eq!(moved.origin, l(5));
    // ring around 3 at t = 0: triangles 0..=7, one of them at -10
    assert_eq!(moved.background, Some(-1.25));
    assert_eq!(moved.delta, -10.0 + 1.25);

    let unsteered = &still.objects_at(1)[0];
    assert!(close(unsteered.background.unwrap(), -10.0 / 9.0));
    assert_eq!(wind.meta()["steering"], "uniform");
}

#[test]
fn wind_without_displacements_falls_back() {
    let mesh = patch();
    let field = moving_dip(&mesh);
    let mut wind = ExtremaLocator::new("minima_back_wind(0,0,1)", "precomputed()", DetectionOpts::default()).unwrap();
    wind.set_steering_vector(Box::new(PrecomputedSteering::new())).unwrap();
    let wind = wind.locate(&mesh, &field).unwrap();
    let still = ExtremaLocator::new("minima_back(0,0,1)", "", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();
    let strip = |c: &ExtremaCatalog| -> Vec<(usize, Vec<TriLabel>, f64, f64)> {
        c.iter()
            .map(|p| (p.time_step, p.labels.to_vec(), p.intensity, p.delta))
            .collect()
    };
    assert_eq!(strip(&wind), strip(&still));
    assert!(wind.iter().all(|p| p.steering.is_none()));
}

#[test]
fn precomputed_vectors_steer_only_where_given() {
    let mesh = patch();
    let field = moving_dip(&mesh);
    let mut steering = PrecomputedSteering::new();
    steering.set(l(5), 1, [0.0, 0.0, 0.1]);
    let mut loc = ExtremaLocator::new("minima", "precomputed(1)", DetectionOpts::default()).unwrap();
    loc.set_steering_vector(Box::new(steering)).unwrap();
    let catalog = loc.locate(&mesh, &field).unwrap();
    assert_eq!(catalog.objects_at(0)[0].steering, None);
    assert_eq!(catalog.objects_at(1)[0].steering, Some([0.0, 0.0, 0.1]));
    assert_eq!(catalog.meta()["steering_args"], "1");
}

//! Behavioural tests for [`CoordinateBoundingBox`].

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use scoop_core::{BoundingBoxError, CoordinateBoundingBox, GeoPoint};

const TOLERANCE: f64 = 1.0e-4;

#[derive(Default)]
struct BoxWorld {
    centre: RefCell<Option<GeoPoint>>,
    result: RefCell<Option<Result<CoordinateBoundingBox, BoundingBoxError>>>,
}

#[fixture]
fn world() -> BoxWorld {
    BoxWorld::default()
}

fn built(world: &BoxWorld) -> CoordinateBoundingBox {
    let result = world.result.borrow();
    match result.as_ref() {
        Some(Ok(bbox)) => *bbox,
        other => panic!("expected a box, got {other:?}"),
    }
}

fn assert_near(actual: GeoPoint, lat: f64, lon: f64) {
    assert!(
        (actual.latitude - lat).abs() <= TOLERANCE && (actual.longitude - lon).abs() <= TOLERANCE,
        "expected ({lat}, {lon}), got {actual:?}"
    );
}

#[given("a centre at {lat}, {lon}")]
fn centre(world: &BoxWorld, lat: f64, lon: f64) {
    world
        .centre
        .replace(Some(GeoPoint::new(lat, lon).expect("valid centre")));
}

#[when("I build a box with a radius of {radius} km")]
fn build(world: &BoxWorld, radius: f64) {
    let centre = world.centre.borrow().expect("centre set");
    world
        .result
        .replace(Some(CoordinateBoundingBox::around(centre, radius)));
}

#[then("the south-west corner is near {lat}, {lon}")]
fn south_west(world: &BoxWorld, lat: f64, lon: f64) {
    assert_near(built(world).south_west(), lat, lon);
}

#[then("the north-east corner is near {lat}, {lon}")]
fn north_east(world: &BoxWorld, lat: f64, lon: f64) {
    assert_near(built(world).north_east(), lat, lon);
}

#[then("the box is rejected for a non-positive radius")]
fn rejected_radius(world: &BoxWorld) {
    assert!(matches!(
        *world.result.borrow(),
        Some(Err(BoundingBoxError::NonPositiveRadius(_)))
    ));
}

#[then("the box is rejected for its latitude")]
fn rejected_latitude(world: &BoxWorld) {
    assert!(matches!(
        *world.result.borrow(),
        Some(Err(BoundingBoxError::LatitudeOutOfRange { .. }))
    ));
}

#[scenario(path = "tests/features/bounding_box.feature", index = 0)]
fn seoul_city_hall(world: BoxWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/bounding_box.feature", index = 1)]
fn negative_radius(world: BoxWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/bounding_box.feature", index = 2)]
fn polar_centre(world: BoxWorld) {
    let _ = world;
}

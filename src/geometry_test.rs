#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn bounds_approx_eq(a: Bounds, b: Bounds) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.width, b.width) && approx_eq(a.height, b.height)
}

// --- percent <-> pixel ---

#[test]
fn percent_to_pixel_basic() {
    assert!(approx_eq(percent_to_pixel(10.0, 800.0), 80.0));
    assert!(approx_eq(percent_to_pixel(100.0, 640.0), 640.0));
    assert!(approx_eq(percent_to_pixel(0.0, 640.0), 0.0));
}

#[test]
fn pixel_to_percent_basic() {
    assert!(approx_eq(pixel_to_percent(80.0, 800.0), 10.0));
    assert!(approx_eq(pixel_to_percent(640.0, 640.0), 100.0));
}

#[test]
fn pixel_to_percent_zero_extent_is_zero() {
    assert!(approx_eq(pixel_to_percent(42.0, 0.0), 0.0));
}

#[test]
fn percent_pixel_round_trip() {
    let v = 37.25;
    assert!(approx_eq(pixel_to_percent(percent_to_pixel(v, 1234.0), 1234.0), v));
}

// --- normalize_angle ---

#[test]
fn normalize_angle_in_range_unchanged() {
    assert!(approx_eq(normalize_angle(0.0), 0.0));
    assert!(approx_eq(normalize_angle(90.0), 90.0));
    assert!(approx_eq(normalize_angle(359.9), 359.9));
}

#[test]
fn normalize_angle_wraps_positive() {
    assert!(approx_eq(normalize_angle(360.0), 0.0));
    assert!(approx_eq(normalize_angle(450.0), 90.0));
    assert!(approx_eq(normalize_angle(720.0), 0.0));
}

#[test]
fn normalize_angle_wraps_negative() {
    assert!(approx_eq(normalize_angle(-90.0), 270.0));
    assert!(approx_eq(normalize_angle(-360.0), 0.0));
    assert!(approx_eq(normalize_angle(-450.0), 270.0));
}

// --- rotate_point / rotate_bounds ---

#[test]
fn rotate_point_clockwise() {
    let p = rotate_point(Point::new(10.0, 20.0), true);
    assert!(point_approx_eq(p, Point::new(80.0, 10.0)));
}

#[test]
fn rotate_point_counterclockwise() {
    let p = rotate_point(Point::new(10.0, 20.0), false);
    assert!(point_approx_eq(p, Point::new(20.0, 90.0)));
}

#[test]
fn rotate_point_round_trip() {
    let p = Point::new(12.5, 77.0);
    let back = rotate_point(rotate_point(p, true), false);
    assert!(point_approx_eq(p, back));
}

#[test]
fn rotate_bounds_clockwise_swaps_extents() {
    let b = rotate_bounds(Bounds::new(10.0, 20.0, 30.0, 40.0), true);
    assert!(bounds_approx_eq(b, Bounds::new(40.0, 10.0, 40.0, 30.0)));
}

#[test]
fn rotate_bounds_round_trip() {
    let b = Bounds::new(10.0, 10.0, 20.0, 20.0);
    let back = rotate_bounds(rotate_bounds(b, true), false);
    assert!(bounds_approx_eq(b, back));
}

#[test]
fn rotate_bounds_four_quarter_turns_is_identity() {
    let b = Bounds::new(5.0, 15.0, 25.0, 35.0);
    let mut r = b;
    for _ in 0..4 {
        r = rotate_bounds(r, true);
    }
    assert!(bounds_approx_eq(b, r));
}

// --- Viewport ---

#[test]
fn viewport_default_is_identity() {
    let vp = Viewport::default();
    let p = vp.screen_to_source(Point::new(50.0, 75.0));
    assert!(point_approx_eq(p, Point::new(50.0, 75.0)));
}

#[test]
fn viewport_screen_to_source_with_zoom_and_pan() {
    let vp = Viewport { zoom: 2.0, pan_x: 20.0, pan_y: 10.0, rotation: 0.0 };
    let p = vp.screen_to_source(Point::new(20.0, 10.0));
    assert!(point_approx_eq(p, Point::new(0.0, 0.0)));
}

#[test]
fn viewport_round_trip() {
    let vp = Viewport { zoom: 0.75, pan_x: 13.7, pan_y: -42.3, rotation: 0.0 };
    let source = Point::new(333.3, -999.9);
    let back = vp.screen_to_source(vp.source_to_screen(source));
    assert!(point_approx_eq(source, back));
}

#[test]
fn viewport_rotation_detection() {
    assert!(!Viewport::default().is_rotated());
    assert!(Viewport { rotation: 90.0, ..Viewport::default() }.is_rotated());
    assert!(!Viewport { rotation: 360.0, ..Viewport::default() }.is_rotated());
    assert!(Viewport { rotation: -90.0, ..Viewport::default() }.is_rotated());
}

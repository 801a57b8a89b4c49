#![allow(clippy::float_cmp)]

use super::*;
use crate::config::ControlKind;

const TOLERANCE: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

fn rect_region() -> Region {
    Region::new(
        "r1",
        "img",
        Shape::Rectangle { x: 10.0, y: 10.0, width: 20.0, height: 20.0, rotation: 0.0 },
    )
}

// =============================================================
// strip_id_suffix
// =============================================================

#[test]
fn strip_suffix_removes_disambiguator() {
    assert_eq!(strip_id_suffix("abc#2"), "abc");
    assert_eq!(strip_id_suffix("abc"), "abc");
    assert_eq!(strip_id_suffix("abc#2#3"), "abc");
    assert_eq!(strip_id_suffix(""), "");
}

// =============================================================
// update_image_size: idempotence / no-drift law
// =============================================================

#[test]
fn update_image_size_computes_pixel_bounds() {
    let mut region = rect_region();
    region.update_image_size(800.0, 600.0);
    let px = region.pixel_bounds();
    assert!(approx_eq(px.x, 80.0));
    assert!(approx_eq(px.y, 60.0));
    assert!(approx_eq(px.width, 160.0));
    assert!(approx_eq(px.height, 120.0));
}

#[test]
fn keypoint_pixel_box_is_square_and_centered() {
    let mut region = Region::new("k1", "img", Shape::Keypoint { x: 50.0, y: 50.0, width: 10.0 });
    // Non-square render: the marker must stay square and centered anyway.
    region.update_image_size(800.0, 600.0);
    let px = region.pixel_bounds();
    assert!(approx_eq(px.width, 80.0));
    assert!(approx_eq(px.height, 80.0));
    assert!(approx_eq(px.x + px.width / 2.0, 400.0));
    assert!(approx_eq(px.y + px.height / 2.0, 300.0));
}

#[test]
fn update_image_size_does_not_drift() {
    let mut region = rect_region();
    region.update_image_size(800.0, 600.0);
    let first = region.pixel_bounds();

    // Bounce through other sizes and come back.
    region.update_image_size(400.0, 300.0);
    region.update_image_size(1234.0, 77.0);
    region.update_image_size(800.0, 600.0);

    let again = region.pixel_bounds();
    assert!(approx_eq(first.x, again.x));
    assert!(approx_eq(first.y, again.y));
    assert!(approx_eq(first.width, again.width));
    assert!(approx_eq(first.height, again.height));
}

#[test]
fn update_image_size_repeated_same_size_is_idempotent() {
    let mut region = rect_region();
    region.update_image_size(640.0, 480.0);
    let first = region.pixel_bounds();
    for _ in 0..10 {
        region.update_image_size(640.0, 480.0);
    }
    let last = region.pixel_bounds();
    assert_eq!(first, last);
}

#[test]
fn update_image_size_leaves_canonical_geometry_untouched() {
    let mut region = rect_region();
    region.update_image_size(800.0, 600.0);
    region.update_image_size(123.0, 456.0);
    match &region.shape {
        Shape::Rectangle { x, y, width, height, .. } => {
            assert!(approx_eq(*x, 10.0));
            assert!(approx_eq(*y, 10.0));
            assert!(approx_eq(*width, 20.0));
            assert!(approx_eq(*height, 20.0));
        }
        other => panic!("unexpected shape {other:?}"),
    }
}

// =============================================================
// rotate
// =============================================================

#[test]
fn rotate_90_then_back_is_identity() {
    let mut region = Region::new(
        "r1",
        "img",
        Shape::Rectangle { x: 10.0, y: 20.0, width: 30.0, height: 15.0, rotation: 5.0 },
    );
    region.rotate(90.0);
    region.rotate(-90.0);
    match &region.shape {
        Shape::Rectangle { x, y, width, height, rotation } => {
            assert!(approx_eq(*x, 10.0));
            assert!(approx_eq(*y, 20.0));
            assert!(approx_eq(*width, 30.0));
            assert!(approx_eq(*height, 15.0));
            assert!(approx_eq(*rotation, 5.0));
        }
        other => panic!("unexpected shape {other:?}"),
    }
    assert!(approx_eq(region.image_rotation, 0.0));
}

#[test]
fn rotate_90_swaps_extents() {
    let mut region = rect_region();
    region.rotate(90.0);
    match &region.shape {
        Shape::Rectangle { width, height, .. } => {
            assert!(approx_eq(*width, 20.0));
            assert!(approx_eq(*height, 20.0));
        }
        other => panic!("unexpected shape {other:?}"),
    }
    let mut tall = Region::new(
        "r2",
        "img",
        Shape::Rectangle { x: 0.0, y: 0.0, width: 10.0, height: 40.0, rotation: 0.0 },
    );
    tall.rotate(90.0);
    match &tall.shape {
        Shape::Rectangle { x, y, width, height, .. } => {
            assert!(approx_eq(*width, 40.0));
            assert!(approx_eq(*height, 10.0));
            assert!(approx_eq(*x, 60.0)); // 100 - 0 - 40
            assert!(approx_eq(*y, 0.0));
        }
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn rotate_normalizes_accumulated_angle() {
    let mut region = rect_region();
    region.rotate(90.0);
    region.rotate(90.0);
    region.rotate(90.0);
    region.rotate(90.0);
    assert!(approx_eq(region.image_rotation, 0.0));
    region.rotate(-90.0);
    assert!(approx_eq(region.image_rotation, 270.0));
}

#[test]
fn rotate_polygon_points() {
    let mut region = Region::new(
        "r1",
        "img",
        Shape::Polygon { points: vec![[10.0, 20.0], [30.0, 40.0]] },
    );
    region.rotate(90.0);
    region.rotate(-90.0);
    match &region.shape {
        Shape::Polygon { points } => {
            assert!(approx_eq(points[0][0], 10.0));
            assert!(approx_eq(points[0][1], 20.0));
            assert!(approx_eq(points[1][0], 30.0));
            assert!(approx_eq(points[1][1], 40.0));
        }
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn rotate_timerange_is_noop_on_geometry() {
    let mut region = Region::new("r1", "audio", Shape::Timerange { start: 1.5, end: 3.0 });
    region.rotate(90.0);
    assert_eq!(region.shape, Shape::Timerange { start: 1.5, end: 3.0 });
}

// =============================================================
// set_value choke point
// =============================================================

#[test]
fn set_value_creates_entry_when_control_gains_state() {
    let mut region = rect_region();
    let mut labels = ControlNode::new("lbl", ControlKind::Labels, "img");
    labels.selected = vec!["A".to_string()];
    assert!(region.set_value(&labels));
    assert_eq!(region.entries.len(), 1);
    assert_eq!(region.labels(), vec![("lbl", "A")]);
}

#[test]
fn set_value_updates_existing_entry() {
    let mut region = rect_region();
    let mut labels = ControlNode::new("lbl", ControlKind::Labels, "img");
    labels.selected = vec!["A".to_string()];
    region.set_value(&labels);
    labels.selected = vec!["B".to_string()];
    assert!(region.set_value(&labels));
    assert_eq!(region.labels(), vec![("lbl", "B")]);
    assert_eq!(region.entries.len(), 1);
}

#[test]
fn set_value_removes_entry_when_control_empties() {
    let mut region = rect_region();
    let mut labels = ControlNode::new("lbl", ControlKind::Labels, "img");
    labels.selected = vec!["A".to_string()];
    region.set_value(&labels);
    labels.selected = Vec::new();
    assert!(region.set_value(&labels));
    assert!(region.entries.is_empty());
}

#[test]
fn set_value_geometric_control_keeps_entry_when_labels_clear() {
    let mut region = rect_region();
    let mut rect = ControlNode::new("rect", ControlKind::Rectangle, "img");
    rect.selected = vec!["Car".to_string()];
    region.set_value(&rect);
    rect.selected = Vec::new();
    assert!(region.set_value(&rect));
    assert_eq!(region.entries.len(), 1);
    assert!(region.entries[0].payload.is_empty());
}

#[test]
fn set_value_same_state_reports_no_change() {
    let mut region = rect_region();
    let labels = ControlNode::new("lbl", ControlKind::Labels, "img");
    assert!(!region.set_value(&labels)); // no state, no entry
    assert!(region.entries.is_empty());
}

use super::*;
use crate::annotation::{Annotation, AnnotationKind};
use crate::config::{ConfigRegistry, ControlKind, ControlNode, ObjectKind, ObjectNode};

/// An 8×8 buffer: left half bright red, right half dark red. The halves are
/// 110 channel units apart, inside the maximum tolerance but far outside the
/// default one.
fn two_tone_buffer() -> PixelBuffer {
    let mut data = Vec::with_capacity(8 * 8 * 4);
    for _y in 0..8 {
        for x in 0..8 {
            if x < 4 {
                data.extend_from_slice(&[200, 0, 0, 255]);
            } else {
                data.extend_from_slice(&[90, 0, 0, 255]);
            }
        }
    }
    PixelBuffer::from_rgba(8, 8, data).unwrap()
}

fn test_registry() -> ConfigRegistry {
    let mut registry = ConfigRegistry::new();
    let mut image = ObjectNode::new("img", ObjectKind::Image);
    image.natural_width = 8;
    image.natural_height = 8;
    registry.add_object(image);
    let mut brush = ControlNode::new("wand", ControlKind::Brush, "img");
    brush.selected = vec!["Sky".to_string()];
    registry.add_control(brush);
    registry
}

fn decoded_mask(annotation: &Annotation, id: &str) -> BitMask {
    match &annotation.region(id).unwrap().shape {
        Shape::Mask { rle, width, height } => BitMask::from_rle(rle, *width, *height).unwrap(),
        other => panic!("unexpected shape {other:?}"),
    }
}

// =============================================================
// pixel buffer
// =============================================================

#[test]
fn from_rgba_rejects_mismatched_length() {
    assert_eq!(PixelBuffer::from_rgba(2, 2, vec![0; 15]), Err(WandError::BufferSize));
    assert!(PixelBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn sample_viewport_identity_copies_pixels() {
    let source = two_tone_buffer();
    let sampled = source.sample_viewport(&Viewport::default(), 8, 8);
    assert_eq!(sampled.rgba(1, 1), [200, 0, 0, 255]);
    assert_eq!(sampled.rgba(6, 6), [90, 0, 0, 255]);
}

#[test]
fn sample_viewport_applies_zoom_and_pan() {
    let source = two_tone_buffer();
    let viewport = Viewport { zoom: 2.0, pan_x: 0.0, pan_y: 0.0, rotation: 0.0 };
    let sampled = source.sample_viewport(&viewport, 16, 16);
    // Screen x=7 maps to source x=3 (bright); x=8 to source x=4 (dark).
    assert_eq!(sampled.rgba(7, 0), [200, 0, 0, 255]);
    assert_eq!(sampled.rgba(8, 0), [90, 0, 0, 255]);
}

#[test]
fn sample_viewport_fills_outside_with_transparent() {
    let source = two_tone_buffer();
    let viewport = Viewport { zoom: 1.0, pan_x: 4.0, pan_y: 0.0, rotation: 0.0 };
    let sampled = source.sample_viewport(&viewport, 8, 8);
    // Screen x=0 maps to source x=-4: outside.
    assert_eq!(sampled.rgba(0, 0), [0, 0, 0, 0]);
    assert_eq!(sampled.rgba(4, 0), [200, 0, 0, 255]);
}

// =============================================================
// flood fill
// =============================================================

#[test]
fn flood_fill_selects_connected_area_only() {
    let buffer = two_tone_buffer();
    let mask = flood_fill(&buffer, 1, 1, 0);
    assert_eq!(mask.count(), 4 * 8); // the red half
    assert!(mask.get(0, 0));
    assert!(mask.get(3, 7));
    assert!(!mask.get(4, 0));
}

#[test]
fn flood_fill_tolerance_widens_selection() {
    let buffer = two_tone_buffer();
    let mask = flood_fill(&buffer, 1, 1, 110);
    assert_eq!(mask.count(), 8 * 8);
}

#[test]
fn flood_fill_out_of_bounds_anchor_is_empty() {
    let buffer = two_tone_buffer();
    let mask = flood_fill(&buffer, 99, 0, 0);
    assert_eq!(mask.count(), 0);
}

// =============================================================
// threshold mapping
// =============================================================

#[test]
fn displacement_right_loosens_and_left_tightens() {
    let base = threshold_from_displacement(WAND_DEFAULT_THRESHOLD, 0.0, 0.0);
    assert_eq!(base, WAND_DEFAULT_THRESHOLD);
    assert!(threshold_from_displacement(WAND_DEFAULT_THRESHOLD, 40.0, 0.0) > base);
    assert!(threshold_from_displacement(WAND_DEFAULT_THRESHOLD, -40.0, 0.0) < base);
}

#[test]
fn displacement_sign_follows_dominant_axis() {
    let loosened = threshold_from_displacement(WAND_DEFAULT_THRESHOLD, -10.0, 40.0);
    assert!(loosened > WAND_DEFAULT_THRESHOLD); // down dominates
    let tightened = threshold_from_displacement(WAND_DEFAULT_THRESHOLD, -40.0, 10.0);
    assert!(tightened < WAND_DEFAULT_THRESHOLD); // left dominates
}

#[test]
fn threshold_is_clamped_to_bounds() {
    assert_eq!(threshold_from_displacement(WAND_DEFAULT_THRESHOLD, 100_000.0, 0.0), WAND_MAX_THRESHOLD);
    assert_eq!(threshold_from_displacement(WAND_DEFAULT_THRESHOLD, -100_000.0, 0.0), 0);
}

// =============================================================
// run-length coding
// =============================================================

#[test]
fn rle_survives_a_round_trip_and_rejects_corrupt_payloads() {
    let mut mask = BitMask::new(4, 4);
    mask.set(0, 0);
    mask.set(1, 0);
    mask.set(3, 3);
    let rle = mask.to_rle();
    assert_eq!(BitMask::from_rle(&rle, 4, 4), Some(mask));

    assert_eq!(BitMask::from_rle(&rle, 5, 5), None); // wrong dimensions
    assert_eq!(BitMask::from_rle(&rle[..rle.len() - 1], 4, 4), None); // truncated
}

#[test]
fn rle_leads_with_a_zero_run_when_first_pixel_is_set() {
    let mut mask = BitMask::new(2, 1);
    mask.set(0, 0);
    let rle = mask.to_rle();
    assert_eq!(u32::from_le_bytes([rle[0], rle[1], rle[2], rle[3]]), 0);
}

// =============================================================
// gesture state machine
// =============================================================

struct Fixture {
    registry: ConfigRegistry,
    annotation: Annotation,
    source: PixelBuffer,
    wand: MagicWand,
}

fn fixture() -> Fixture {
    Fixture {
        registry: test_registry(),
        annotation: Annotation::new("a1", AnnotationKind::Annotation),
        source: two_tone_buffer(),
        wand: MagicWand::new(),
    }
}

fn press(fx: &mut Fixture, x: f64, y: f64) {
    fx.wand
        .pointer_down(
            Point::new(x, y),
            &fx.source,
            &Viewport::default(),
            8,
            8,
            false,
            &mut fx.annotation,
        )
        .unwrap();
}

fn release(fx: &mut Fixture) -> Option<String> {
    let control = fx.registry.control("wand").unwrap().clone();
    fx.wand
        .pointer_up(&Viewport::default(), 8, 8, &control, &fx.registry, &mut fx.annotation)
        .unwrap()
}

#[test]
fn click_commits_one_region_and_one_undo_entry() {
    let mut fx = fixture();
    assert_eq!(fx.annotation.history_len(), 1);

    press(&mut fx, 1.0, 1.0);
    let id = release(&mut fx).unwrap();

    assert_eq!(fx.annotation.regions().len(), 1);
    assert_eq!(fx.annotation.history_len(), 2); // the whole gesture is one entry
    assert_eq!(fx.annotation.selected_region().map(|r| r.id.clone()), Some(id.clone()));
    assert_eq!(decoded_mask(&fx.annotation, &id).count(), 4 * 8);
    assert!(!fx.wand.is_active());
}

#[test]
fn drag_recomputes_overlay_live() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    assert!(fx.wand.overlay().is_none());

    let first = fx.wand.pointer_move(Point::new(1.0, 1.0)).unwrap().count();
    assert_eq!(first, 4 * 8);
    // Drag far right: tolerance maxes out, the fill crosses the color edge.
    let widened = fx.wand.pointer_move(Point::new(1000.0, 1.0)).unwrap().count();
    assert_eq!(widened, 8 * 8);
    assert_eq!(fx.wand.threshold(), WAND_MAX_THRESHOLD);

    release(&mut fx);
}

#[test]
fn consecutive_gestures_on_same_label_merge_into_one_region() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    let first = release(&mut fx).unwrap();

    press(&mut fx, 6.0, 6.0); // the dark half
    let second = release(&mut fx).unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.annotation.regions().len(), 1);
    assert_eq!(decoded_mask(&fx.annotation, &first).count(), 8 * 8);
}

#[test]
fn label_change_starts_a_new_region() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    release(&mut fx).unwrap();

    fx.registry.control_mut("wand").unwrap().selected = vec!["Sea".to_string()];
    press(&mut fx, 6.0, 6.0);
    release(&mut fx).unwrap();

    assert_eq!(fx.annotation.regions().len(), 2);
}

#[test]
fn deleting_the_region_invalidates_the_cache() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    let id = release(&mut fx).unwrap();

    fx.annotation.delete_region(&id).unwrap();
    fx.wand.invalidate_region(&id);

    press(&mut fx, 1.0, 1.0);
    let fresh = release(&mut fx).unwrap();
    assert_ne!(fresh, id);
    assert_eq!(fx.annotation.regions().len(), 1);
}

#[test]
fn pointer_down_during_a_gesture_aborts_the_stale_one() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    // The pointer-up for the first press was lost; the second press must not
    // stack a second history freeze.
    press(&mut fx, 1.0, 1.0);
    let id = release(&mut fx).unwrap();
    assert_eq!(fx.annotation.regions().len(), 1);
    assert_eq!(fx.annotation.history_len(), 2);

    // History is live again: later mutations record and undo steps back.
    fx.annotation.delete_region(&id).unwrap();
    assert_eq!(fx.annotation.history_len(), 3);
    assert!(fx.annotation.undo());
}

#[test]
fn escape_aborts_without_committing() {
    let mut fx = fixture();
    press(&mut fx, 1.0, 1.0);
    fx.wand.pointer_move(Point::new(3.0, 3.0)).unwrap();
    fx.wand.escape(&mut fx.annotation);

    assert!(!fx.wand.is_active());
    assert!(fx.annotation.regions().is_empty());
    assert_eq!(fx.annotation.history_len(), 1);
    assert!(!fx.annotation.undo()); // freeze was released, nothing pending
}

#[test]
fn rejects_rotated_viewport_and_active_crosshair() {
    let mut fx = fixture();
    let rotated = Viewport { rotation: 90.0, ..Viewport::default() };
    let err = fx
        .wand
        .pointer_down(Point::new(1.0, 1.0), &fx.source, &rotated, 8, 8, false, &mut fx.annotation)
        .unwrap_err();
    assert_eq!(err, WandError::RotatedImage);

    let err = fx
        .wand
        .pointer_down(
            Point::new(1.0, 1.0),
            &fx.source,
            &Viewport::default(),
            8,
            8,
            true,
            &mut fx.annotation,
        )
        .unwrap_err();
    assert_eq!(err, WandError::CrosshairActive);
    assert_eq!(fx.annotation.history_len(), 1); // no freeze leaked
}

#[test]
fn rejects_anchor_outside_the_rendered_area() {
    let mut fx = fixture();
    let err = fx
        .wand
        .pointer_down(
            Point::new(9.0, 1.0),
            &fx.source,
            &Viewport::default(),
            8,
            8,
            false,
            &mut fx.annotation,
        )
        .unwrap_err();
    assert_eq!(err, WandError::OutOfBounds);
}

#[test]
fn move_and_release_without_a_gesture_are_errors() {
    let mut fx = fixture();
    assert_eq!(fx.wand.pointer_move(Point::new(1.0, 1.0)).unwrap_err(), WandError::NotActive);
    let control = fx.registry.control("wand").unwrap().clone();
    let err = fx
        .wand
        .pointer_up(&Viewport::default(), 8, 8, &control, &fx.registry, &mut fx.annotation)
        .unwrap_err();
    assert_eq!(err, WandError::NotActive);
}

#[test]
fn non_editable_annotation_refuses_the_commit() {
    let mut fx = fixture();
    fx.annotation = Annotation::new("p1", AnnotationKind::Prediction);
    press(&mut fx, 1.0, 1.0);
    assert_eq!(release(&mut fx), None);
    assert!(fx.annotation.regions().is_empty());
}

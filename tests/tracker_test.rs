use thermal_skin_tracker::estimator::{EstimatorParams, estimate};
use thermal_skin_tracker::geometry::movement;
use thermal_skin_tracker::hotspot::{HotspotParams, locate_center};
use thermal_skin_tracker::radiometry::{celsius, code_from_celsius};
use thermal_skin_tracker::tracker::{AssociationParams, smooth_temperature};
use thermal_skin_tracker::{BoundingBox, RawThermalFrame, TrackAssociator};

fn associator() -> TrackAssociator {
    TrackAssociator::new(
        AssociationParams::default(),
        HotspotParams::default(),
        EstimatorParams::default(),
    )
}

fn ids(a: &TrackAssociator) -> Vec<u32> {
    a.tracks().keys().copied().collect()
}

#[test]
fn test_overlapping_box_keeps_id() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();

    a.update(&frame, &[BoundingBox::new(10, 10, 60, 110)]);
    assert_eq!(ids(&a), vec![1]);

    a.update(&frame, &[BoundingBox::new(12, 11, 61, 109)]);
    assert_eq!(ids(&a), vec![1]);
    assert_eq!(a.tracks()[&1].bbox, BoundingBox::new(12, 11, 61, 109));

    a.update(&frame, &[BoundingBox::new(120, 10, 150, 40)]);
    assert_eq!(ids(&a), vec![2]);
}

#[test]
fn test_unmatched_track_is_dropped() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    let bbox = BoundingBox::new(10, 10, 60, 110);

    a.update(&frame, &[bbox]);
    assert_eq!(ids(&a), vec![1]);

    // nobody this cycle
    a.update(&frame, &[]);
    assert!(a.tracks().is_empty());

    // same place again, but a fresh identity
    a.update(&frame, &[bbox]);
    assert_eq!(ids(&a), vec![2]);
    assert_eq!(a.next_id(), 3);
}

#[test]
fn test_low_overlap_starts_new_track() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    a.update(&frame, &[BoundingBox::new(0, 0, 10, 10)]);
    // IoU 1 / 199
    assert_eq!(a.best_match(&BoundingBox::new(9, 9, 19, 19)), None);
    a.update(&frame, &[BoundingBox::new(9, 9, 19, 19)]);
    assert_eq!(ids(&a), vec![2]);
}

#[test]
fn test_two_people_keep_ids_when_order_changes() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    let left = BoundingBox::new(10, 10, 50, 110);
    let right = BoundingBox::new(100, 10, 140, 110);

    a.update(&frame, &[left, right]);
    assert_eq!(a.tracks()[&1].bbox, left);
    assert_eq!(a.tracks()[&2].bbox, right);

    let right_moved = BoundingBox::new(103, 10, 143, 110);
    let left_moved = BoundingBox::new(12, 10, 52, 110);
    a.update(&frame, &[right_moved, left_moved]);
    assert_eq!(a.tracks()[&1].bbox, left_moved);
    assert_eq!(a.tracks()[&2].bbox, right_moved);
    assert_eq!(a.next_id(), 3);
}

#[test]
fn test_ids_never_reused() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    let mut seen = Vec::new();
    for i in 0..5 {
        // alternate between two far apart spots so nothing ever matches
        let x = if i % 2 == 0 { 0 } else { 100 };
        a.update(&frame, &[BoundingBox::new(x, 0, x + 30, 60)]);
        let id = ids(&a)[0];
        assert!(!seen.contains(&id));
        seen.push(id);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_temperature_and_center_filled() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    a.update(&frame, &[BoundingBox::new(10, 10, 60, 110)]);
    let t = &a.tracks()[&1];
    assert!(t.center.is_some());
    assert!((t.temperature.unwrap() - 35.7).abs() < 1e-9);
}

#[test]
fn test_no_data_keeps_previous_temperature() {
    let warm = RawThermalFrame::filled(160, 120, 30965);
    let dead = RawThermalFrame::zeros(160, 120);
    let bbox = BoundingBox::new(10, 10, 60, 110);
    let mut a = associator();

    a.update(&warm, &[bbox]);
    let first = a.tracks()[&1].clone();

    a.update(&dead, &[bbox]);
    let second = &a.tracks()[&1];
    assert_eq!(second.center, first.center);
    assert_eq!(second.temperature, first.temperature);
}

#[test]
fn test_new_track_on_dead_frame_has_no_data() {
    let dead = RawThermalFrame::zeros(160, 120);
    let mut a = associator();
    a.update(&dead, &[BoundingBox::new(10, 10, 60, 110)]);
    let t = &a.tracks()[&1];
    assert_eq!(t.center, None);
    assert_eq!(t.temperature, None);
}

#[test]
fn test_temperature_smoothing_converges() {
    let bbox = BoundingBox::new(10, 10, 60, 110);
    let mut a = associator();
    a.update(&RawThermalFrame::filled(160, 120, code_from_celsius(30.0)), &[bbox]);

    let hot = RawThermalFrame::filled(160, 120, code_from_celsius(36.5));
    let target = celsius(code_from_celsius(36.5)) - 0.8;
    let mut previous_error = f64::MAX;
    for _ in 0..14 {
        a.update(&hot, &[bbox]);
        let error = (a.tracks()[&1].temperature.unwrap() - target).abs();
        assert!(error < previous_error);
        previous_error = error;
    }
    assert!(previous_error <= 0.01 * target.abs());
}

#[test]
fn test_smooth_temperature_rules() {
    assert_eq!(smooth_temperature(None, None, 0.3), None);
    assert_eq!(smooth_temperature(None, Some(36.0), 0.3), Some(36.0));
    assert_eq!(smooth_temperature(Some(35.0), None, 0.3), Some(35.0));
    let s = smooth_temperature(Some(30.0), Some(40.0), 0.3).unwrap();
    assert!((s - 33.0).abs() < 1e-9);
}

#[test]
fn test_smoothing_reaches_one_percent_within_fourteen_cycles() {
    let target = 36.5;
    let mut s = Some(0.0);
    for _ in 0..14 {
        s = smooth_temperature(s, Some(target), 0.3);
    }
    assert!((s.unwrap() - target).abs() <= 0.01 * target);
}

#[test]
fn test_two_boxes_claiming_one_track_keep_the_last() {
    let frame = RawThermalFrame::filled(160, 120, 30965);
    let mut a = associator();
    a.update(&frame, &[BoundingBox::new(10, 10, 60, 110)]);

    let first = BoundingBox::new(12, 10, 62, 110);
    let second = BoundingBox::new(8, 10, 58, 110);
    assert_eq!(a.best_match(&first), Some(1));
    assert_eq!(a.best_match(&second), Some(1));

    a.update(&frame, &[first, second]);
    assert_eq!(ids(&a), vec![1]);
    assert_eq!(a.tracks()[&1].bbox, second);
    assert_eq!(a.next_id(), 2);
}

/// Warm blob peaking at 4000 around `(cx, cy)` over a 3000 background.
fn blob_frame(cx: i32, cy: i32) -> RawThermalFrame {
    RawThermalFrame::from_fn(160, 120, |x, y| {
        let d2 = (x as i32 - cx).pow(2) + (y as i32 - cy).pow(2);
        (4000 - 10 * d2).max(3000) as u16
    })
}

#[test]
fn test_moving_face_uses_moving_hot_ratio() {
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let hotspot = HotspotParams::default();
    let estimator = EstimatorParams::default();
    let mut a = associator();

    let still = blob_frame(35, 25);
    a.update(&still, &[bbox]);
    let before = a.tracks()[&1].clone();
    let c1 = locate_center(&still, &bbox, None, &hotspot);
    assert_eq!(before.center, c1);

    let moved = blob_frame(45, 55);
    let c2 = locate_center(&moved, &bbox, c1, &hotspot);
    assert!(movement(c1, c2) > 5.0, "{:?} -> {:?}", c1, c2);

    let moving_sample = estimate(&moved, c2, 0.05, &estimator).unwrap();
    let still_sample = estimate(&moved, c2, 0.08, &estimator).unwrap();
    assert!((moving_sample - still_sample).abs() > 1e-6);

    a.update(&moved, &[bbox]);
    let after = &a.tracks()[&1];
    assert_eq!(after.center, c2);
    let expected = smooth_temperature(before.temperature, Some(moving_sample), 0.3).unwrap();
    assert!((after.temperature.unwrap() - expected).abs() < 1e-9);
}

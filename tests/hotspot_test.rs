use thermal_skin_tracker::hotspot::{HotspotParams, locate_center};
use thermal_skin_tracker::{BoundingBox, FaceCenter, RawThermalFrame};

fn fill(frame: &mut RawThermalFrame, x0: u32, y0: u32, x1: u32, y1: u32, code: u16) {
    for y in y0..y1 {
        for x in x0..x1 {
            frame.set(x, y, code);
        }
    }
}

/// Box (20, 0, 60, 100): band rows 10..80, cells 10 px wide and 11.67 px tall.
/// Cell (row 1, col 2) spans x 40..50, y 21..33.
fn frame_with_hot_cell(code: u16) -> RawThermalFrame {
    let mut frame = RawThermalFrame::filled(160, 120, 3000);
    fill(&mut frame, 40, 21, 50, 33, code);
    frame
}

#[test]
fn test_zero_frame_returns_prior() {
    let frame = RawThermalFrame::zeros(160, 120);
    let params = HotspotParams::default();
    let prior = Some(FaceCenter::new(5, 7));
    for bbox in [
        BoundingBox::new(10, 10, 60, 110),
        BoundingBox::new(0, 0, 159, 119),
        BoundingBox::new(100, 50, 120, 60),
    ] {
        assert_eq!(locate_center(&frame, &bbox, prior, &params), prior);
        assert_eq!(locate_center(&frame, &bbox, None, &params), None);
    }
}

#[test]
fn test_hottest_cell_center() {
    let frame = frame_with_hot_cell(4000);
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let center = locate_center(&frame, &bbox, None, &HotspotParams::default());
    assert_eq!(center, Some(FaceCenter::new(45, 27)));
}

#[test]
fn test_blend_with_prior() {
    let frame = frame_with_hot_cell(4000);
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let prior = Some(FaceCenter::new(35, 17));
    let center = locate_center(&frame, &bbox, prior, &HotspotParams::default());
    assert_eq!(center, Some(FaceCenter::new(40, 22)));
}

#[test]
fn test_single_hot_pixel_does_not_win() {
    let mut frame = frame_with_hot_cell(3500);
    // lands in cell (row 4, col 0), 120 pixels, mean only 3050
    frame.set(25, 60, 9000);
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let center = locate_center(&frame, &bbox, None, &HotspotParams::default());
    assert_eq!(center, Some(FaceCenter::new(45, 27)));
}

#[test]
fn test_legs_are_ignored() {
    let mut frame = RawThermalFrame::filled(160, 120, 3000);
    // hot floor below the 80% line of the box
    fill(&mut frame, 20, 85, 60, 100, 5000);
    fill(&mut frame, 40, 21, 50, 33, 3200);
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let center = locate_center(&frame, &bbox, None, &HotspotParams::default());
    assert_eq!(center, Some(FaceCenter::new(45, 27)));
}

#[test]
fn test_degenerate_box_returns_prior() {
    let frame = frame_with_hot_cell(4000);
    let params = HotspotParams::default();
    let prior = Some(FaceCenter::new(1, 2));

    let flat = BoundingBox::new(50, 50, 50, 80);
    assert_eq!(locate_center(&frame, &flat, prior, &params), prior);

    // entirely right of the frame, collapses onto the last column
    let outside = BoundingBox::new(200, 10, 300, 50);
    assert_eq!(locate_center(&frame, &outside, prior, &params), prior);
    assert_eq!(locate_center(&frame, &outside, None, &params), None);

    // inverted
    let inverted = BoundingBox::new(60, 100, 20, 0);
    assert_eq!(locate_center(&frame, &inverted, prior, &params), prior);
}

#[test]
fn test_box_partly_outside_is_clamped() {
    let mut frame = RawThermalFrame::filled(160, 120, 3000);
    fill(&mut frame, 0, 20, 10, 40, 4000);
    let bbox = BoundingBox::new(-40, -10, 40, 150);
    let center = locate_center(&frame, &bbox, None, &HotspotParams::default()).unwrap();
    assert!(center.x >= 0 && center.x < 160);
    assert!(center.y >= 0 && center.y < 120);
    assert!(center.x < 20, "{:?}", center);
}

#[test]
fn test_uniform_frame_picks_first_cell() {
    let frame = RawThermalFrame::filled(160, 120, 3000);
    let bbox = BoundingBox::new(20, 0, 60, 100);
    let center = locate_center(&frame, &bbox, None, &HotspotParams::default());
    // row 0 spans y 10..21, col 0 spans x 20..30
    assert_eq!(center, Some(FaceCenter::new(25, 15)));
}

#[test]
fn test_empty_grid_returns_prior() {
    let frame = RawThermalFrame::filled(20, 20, 3000);
    let params = HotspotParams {
        grid_rows: 0,
        ..Default::default()
    };
    let prior = Some(FaceCenter::new(3, 4));
    assert_eq!(
        locate_center(&frame, &BoundingBox::new(0, 0, 19, 19), prior, &params),
        prior
    );
}

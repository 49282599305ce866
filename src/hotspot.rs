use serde::{Deserialize, Serialize};

use crate::frame::RawThermalFrame;
use crate::geometry::{BoundingBox, FaceCenter};

/// Grid search parameters for [`locate_center`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotParams {
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Top of the searched band as a fraction of box height.
    pub band_top: f64,
    /// Bottom of the searched band as a fraction of box height.
    pub band_bottom: f64,
    /// Weight of the new candidate when blending with the previous center.
    pub position_alpha: f32,
}

impl Default for HotspotParams {
    fn default() -> Self {
        Self {
            grid_rows: 6,
            grid_cols: 4,
            band_top: 0.10,
            band_bottom: 0.80,
            position_alpha: 0.5,
        }
    }
}

/// Finds the warmest cell of a person box and returns its center.
///
/// Only the 10%..80% vertical band of the box is searched, which keeps the head
/// and torso of an upright subject and drops legs and floor. The band is split
/// into a `grid_rows x grid_cols` grid and the cell with the highest mean valid
/// code wins. Coarse cell means keep a single hot pixel from grabbing the center.
///
/// Falls back to `prior` when the box collapses after clamping or when no cell
/// holds a valid pixel. With a prior the candidate is blended toward it by
/// `position_alpha` to damp jitter across grid boundaries.
pub fn locate_center(
    frame: &RawThermalFrame,
    bbox: &BoundingBox,
    prior: Option<FaceCenter>,
    params: &HotspotParams,
) -> Option<FaceCenter> {
    if params.grid_rows == 0 || params.grid_cols == 0 {
        return prior;
    }
    let b = bbox.clamp_to(frame.width(), frame.height());
    if b.is_degenerate() {
        return prior;
    }

    let w = frame.width() as i32;
    let h = frame.height() as i32;
    let box_h = (b.y2 - b.y1) as f64;
    let sy1 = ((b.y1 as f64 + box_h * params.band_top) as i32).clamp(0, h - 1);
    let sy2 = ((b.y1 as f64 + box_h * params.band_bottom) as i32).clamp(0, h);
    let sx1 = b.x1.clamp(0, w - 1);
    let sx2 = b.x2.clamp(0, w);
    if sy2 <= sy1 || sx2 <= sx1 {
        return prior;
    }

    let cell_h = (sy2 - sy1) as f64 / params.grid_rows as f64;
    let cell_w = (sx2 - sx1) as f64 / params.grid_cols as f64;

    let mut best: Option<(f64, FaceCenter)> = None;
    for r in 0..params.grid_rows {
        let cy1 = (sy1 as f64 + r as f64 * cell_h) as i32;
        let cy2 = (sy1 as f64 + (r + 1) as f64 * cell_h) as i32;
        for c in 0..params.grid_cols {
            let cx1 = (sx1 as f64 + c as f64 * cell_w) as i32;
            let cx2 = (sx1 as f64 + (c + 1) as f64 * cell_w) as i32;
            let Some(mean) = frame.valid_mean(cx1, cy1, cx2, cy2) else {
                continue;
            };
            if best.is_none_or(|(m, _)| mean > m) {
                best = Some((mean, FaceCenter::new((cx1 + cx2) / 2, (cy1 + cy2) / 2)));
            }
        }
    }

    let Some((mean, candidate)) = best else {
        return prior;
    };
    log::trace!(
        "hotspot cell at ({}, {}) mean code {:.1}",
        candidate.x,
        candidate.y,
        mean
    );
    match prior {
        Some(p) => Some(candidate.blend(&p, params.position_alpha)),
        None => Some(candidate),
    }
}

use serde::{Deserialize, Serialize};

use crate::frame::RawThermalFrame;
use crate::geometry::FaceCenter;
use crate::radiometry::celsius_from_code;

/// Guards `ceil` against products like `0.05 * 20 = 1.0000000000000002`.
const RATIO_ROUNDING_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Half side of the square neighborhood around the face center.
    pub radius: u32,
    /// The median trim kicks in when the hot subset is larger than this.
    pub trim_min_count: usize,
    /// Added to the radiometric reading, in degrees Celsius.
    pub calibration_offset: f64,
    pub hot_ratio: HotRatioPolicy,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            radius: 10,
            trim_min_count: 6,
            calibration_offset: -0.8,
            hot_ratio: HotRatioPolicy::default(),
        }
    }
}

/// Picks how much of the neighborhood counts as skin, depending on motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotRatioPolicy {
    pub still: f64,
    pub moving: f64,
    /// Pixels of center movement above which the subject counts as moving.
    pub movement_threshold: f32,
}

impl Default for HotRatioPolicy {
    fn default() -> Self {
        Self {
            still: 0.08,
            moving: 0.05,
            movement_threshold: 5.0,
        }
    }
}

impl HotRatioPolicy {
    pub fn select(&self, movement: f32) -> f64 {
        if movement > self.movement_threshold {
            self.moving
        } else {
            self.still
        }
    }
}

/// Estimates skin temperature around a face center.
///
/// Takes the valid codes of the `(2 * radius + 1)` square neighborhood, keeps
/// the warmest `ceil(hot_ratio * n)` of them, drops the part of that subset
/// below its median once it has more than `trim_min_count` members, then
/// averages, converts and applies the calibration offset.
///
/// Returns `None` without a center or without any valid pixel.
pub fn estimate(
    frame: &RawThermalFrame,
    center: Option<FaceCenter>,
    hot_ratio: f64,
    params: &EstimatorParams,
) -> Option<f64> {
    let center = center?;
    let r = params.radius as i32;
    let mut codes = frame.valid_codes(center.x - r, center.y - r, center.x + r + 1, center.y + r + 1);
    if codes.is_empty() {
        return None;
    }
    codes.sort_unstable();

    let hot = hot_subset(&codes, hot_ratio);
    let kept = if hot.len() > params.trim_min_count {
        let med = median(hot);
        let start = hot.partition_point(|&c| (c as f64) < med);
        &hot[start..]
    } else {
        hot
    };

    let mean = kept.iter().map(|&c| c as f64).sum::<f64>() / kept.len() as f64;
    Some(celsius_from_code(mean) + params.calibration_offset)
}

/// Top `ceil(ratio * n)` entries of an ascending slice, at least one.
fn hot_subset(sorted: &[u16], ratio: f64) -> &[u16] {
    let n = sorted.len();
    let k = ((ratio * n as f64 - RATIO_ROUNDING_SLACK).ceil().max(1.0) as usize).min(n);
    &sorted[n - k..]
}

fn median(sorted: &[u16]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    }
}

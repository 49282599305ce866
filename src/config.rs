use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detector::PERSON_LABEL;
use crate::error::{Result, ThermalError};
use crate::estimator::EstimatorParams;
use crate::frame::{LEPTON_HEIGHT, LEPTON_WIDTH};
use crate::hotspot::HotspotParams;
use crate::tracker::AssociationParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: LEPTON_WIDTH,
            height: LEPTON_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum wall-clock time between two detection cycles.
    pub interval_secs: f64,
    /// Detector label kept as a person.
    pub person_label: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            person_label: PERSON_LABEL.to_string(),
        }
    }
}

/// Every tunable of the tracker. Missing JSON fields fall back to the defaults
/// of the reference 160x120 Lepton deployment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub frame: FrameConfig,
    pub detection: DetectionConfig,
    pub hotspot: HotspotParams,
    pub estimator: EstimatorParams,
    pub association: AssociationParams,
}

impl TrackerConfig {
    pub fn from_json_str(s: &str) -> Result<TrackerConfig> {
        let config: TrackerConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<TrackerConfig> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let j = serde_json::to_string_pretty(self)?;
        std::fs::write(path, j)?;
        Ok(())
    }

    /// Saturates at `Duration::MAX` for an interval [`validate`](Self::validate) would reject.
    pub fn detection_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.detection.interval_secs).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ThermalError::InvalidConfig(msg));
        if self.frame.width == 0 || self.frame.height == 0 {
            return invalid(format!(
                "frame size {}x{} is empty",
                self.frame.width, self.frame.height
            ));
        }
        // the visual frame is W x H x 3 bytes addressed with u32 dimensions
        if self
            .frame
            .width
            .checked_mul(self.frame.height)
            .and_then(|n| n.checked_mul(3))
            .is_none()
        {
            return invalid(format!(
                "frame size {}x{} is too large",
                self.frame.width, self.frame.height
            ));
        }
        if Duration::try_from_secs_f64(self.detection.interval_secs).is_err() {
            return invalid(format!(
                "detection interval {} must be a non-negative number of seconds",
                self.detection.interval_secs
            ));
        }
        if self.hotspot.grid_rows == 0 || self.hotspot.grid_cols == 0 {
            return invalid("hotspot grid needs at least one row and one column".to_string());
        }
        let band = &self.hotspot;
        if !(0.0..=1.0).contains(&band.band_top)
            || !(0.0..=1.0).contains(&band.band_bottom)
            || band.band_top >= band.band_bottom
        {
            return invalid(format!(
                "hotspot band {}..{} must satisfy 0 <= top < bottom <= 1",
                band.band_top, band.band_bottom
            ));
        }
        if !(0.0..=1.0).contains(&self.hotspot.position_alpha) {
            return invalid(format!(
                "position alpha {} outside [0, 1]",
                self.hotspot.position_alpha
            ));
        }
        let ratios = &self.estimator.hot_ratio;
        for r in [ratios.still, ratios.moving] {
            if !(r > 0.0 && r <= 1.0) {
                return invalid(format!("hot ratio {} outside (0, 1]", r));
            }
        }
        if !(0.0..=1.0).contains(&self.association.temperature_beta) {
            return invalid(format!(
                "temperature beta {} outside [0, 1]",
                self.association.temperature_beta
            ));
        }
        if !(0.0..1.0).contains(&self.association.iou_threshold) {
            return invalid(format!(
                "IoU threshold {} outside [0, 1)",
                self.association.iou_threshold
            ));
        }
        Ok(())
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::estimator::{EstimatorParams, estimate};
use crate::frame::RawThermalFrame;
use crate::geometry::{BoundingBox, FaceCenter, movement};
use crate::hotspot::{HotspotParams, locate_center};

pub type TrackId = u32;

/// Live tracks keyed by id; iteration is in ascending id order.
pub type TrackTable = BTreeMap<TrackId, Track>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub bbox: BoundingBox,
    pub center: Option<FaceCenter>,
    /// Smoothed skin temperature in degrees Celsius.
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationParams {
    /// A box must overlap a track by strictly more than this to inherit its id.
    pub iou_threshold: f64,
    /// Weight of the new sample in the temperature EMA.
    pub temperature_beta: f64,
}

impl Default for AssociationParams {
    fn default() -> Self {
        Self {
            iou_threshold: 0.1,
            temperature_beta: 0.3,
        }
    }
}

/// Exponential smoothing of the per-cycle temperature sample.
///
/// A missing sample keeps the previous value; a missing previous value takes
/// the sample as is.
pub fn smooth_temperature(prior: Option<f64>, sample: Option<f64>, beta: f64) -> Option<f64> {
    match (prior, sample) {
        (Some(p), Some(s)) => Some(beta * s + (1.0 - beta) * p),
        (None, s) => s,
        (p, None) => p,
    }
}

/// Owns the track table and assigns ids across detection cycles.
pub struct TrackAssociator {
    tracks: TrackTable,
    next_id: TrackId,
    association: AssociationParams,
    hotspot: HotspotParams,
    estimator: EstimatorParams,
}

impl TrackAssociator {
    pub fn new(
        association: AssociationParams,
        hotspot: HotspotParams,
        estimator: EstimatorParams,
    ) -> TrackAssociator {
        TrackAssociator {
            tracks: TrackTable::new(),
            next_id: 1,
            association,
            hotspot,
            estimator,
        }
    }

    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    /// Id the next unmatched box will receive.
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }

    /// Best overlapping track for a box. Ties keep the lowest id.
    pub fn best_match(&self, bbox: &BoundingBox) -> Option<TrackId> {
        let mut best: Option<(TrackId, f64)> = None;
        for (id, track) in &self.tracks {
            let v = bbox.iou(&track.bbox);
            if v > self.association.iou_threshold && best.is_none_or(|(_, b)| v > b) {
                best = Some((*id, v));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Runs one detection cycle over the person boxes of the current frame.
    ///
    /// The table is rebuilt from this cycle's boxes only: a track without a
    /// matching box is dropped, and a later box at the same place gets a fresh id.
    pub fn update(&mut self, frame: &RawThermalFrame, boxes: &[BoundingBox]) -> &TrackTable {
        let mut rebuilt = TrackTable::new();

        for bbox in boxes {
            let (id, prior_center, prior_temp) = match self.best_match(bbox) {
                Some(id) => {
                    let t = &self.tracks[&id];
                    (id, t.center, t.temperature)
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    log::debug!(
                        "new track {} at [{}, {}, {}, {}]",
                        id,
                        bbox.x1,
                        bbox.y1,
                        bbox.x2,
                        bbox.y2
                    );
                    (id, None, None)
                }
            };

            let center = locate_center(frame, bbox, prior_center, &self.hotspot);
            let moved = movement(prior_center, center);
            let hot_ratio = self.estimator.hot_ratio.select(moved);
            let sample = estimate(frame, center, hot_ratio, &self.estimator);
            let temperature =
                smooth_temperature(prior_temp, sample, self.association.temperature_beta);

            log::trace!(
                "track {}: moved {:.1}px, hot_ratio {}, sample {:?}, smoothed {:?}",
                id,
                moved,
                hot_ratio,
                sample,
                temperature
            );

            if rebuilt.contains_key(&id) {
                log::debug!("track {} claimed by more than one box, keeping the last", id);
            }
            rebuilt.insert(
                id,
                Track {
                    id,
                    bbox: *bbox,
                    center,
                    temperature,
                },
            );
        }

        for id in self.tracks.keys().filter(|id| !rebuilt.contains_key(id)) {
            log::debug!("track {} lost", id);
        }
        self.tracks = rebuilt;
        &self.tracks
    }
}

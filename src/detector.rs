use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThermalError};
use crate::frame::FramePair;
use crate::geometry::BoundingBox;
use crate::radiometry::code_from_celsius;

pub const PERSON_LABEL: &str = "person";

/// One detector hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn person(bbox: BoundingBox) -> Detection {
        Detection {
            label: PERSON_LABEL.to_string(),
            bbox,
        }
    }
}

/// Any person detector, learned or classical.
///
/// Gets the full frame pair plus the contrast-stretched raw frame, which is
/// what the reference YOLO setup was fed.
pub trait Detector {
    fn detect(&mut self, frame: &FramePair, gray: &GrayImage) -> Result<Vec<Detection>>;
}

/// Boxes of the detections carrying `label`, in detector order.
pub fn person_boxes(detections: &[Detection], label: &str) -> Vec<BoundingBox> {
    detections
        .iter()
        .filter(|d| d.label == label)
        .map(|d| d.bbox)
        .collect()
}

/// Wire format of [`JsonFileDetector`]; coordinates may be fractional.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    label: String,
    xyxy: [f64; 4],
}

/// Picks up detections that an out-of-process model writes to a JSON file.
///
/// The file holds an array of `{"label": "person", "xyxy": [x1, y1, x2, y2]}`.
/// A missing file means nothing was detected.
pub struct JsonFileDetector {
    path: PathBuf,
}

impl JsonFileDetector {
    pub fn new(path: impl AsRef<Path>) -> JsonFileDetector {
        JsonFileDetector {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Detector for JsonFileDetector {
    fn detect(&mut self, _frame: &FramePair, _gray: &GrayImage) -> Result<Vec<Detection>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let records: Vec<DetectionRecord> = serde_json::from_str(&contents)
            .map_err(|e| ThermalError::Detector(format!("{}: {}", self.path.display(), e)))?;
        Ok(records
            .into_iter()
            .map(|r| Detection {
                label: r.label,
                bbox: BoundingBox::from_xyxy(r.xyxy),
            })
            .collect())
    }
}

/// Classical fallback: every connected blob of skin-warm pixels large enough
/// is reported as a person.
#[derive(Debug, Clone)]
pub struct HotBlobDetector {
    pub min_celsius: f64,
    pub min_area: u32,
}

impl Default for HotBlobDetector {
    fn default() -> Self {
        Self {
            min_celsius: 28.0,
            min_area: 40,
        }
    }
}

impl Detector for HotBlobDetector {
    fn detect(&mut self, frame: &FramePair, _gray: &GrayImage) -> Result<Vec<Detection>> {
        let raw = &frame.raw;
        let threshold = code_from_celsius(self.min_celsius);
        let mask = GrayImage::from_fn(raw.width(), raw.height(), |x, y| {
            let c = raw.get(x, y);
            Luma([if c > 0 && c >= threshold { 255 } else { 0 }])
        });
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        // label -> (x_min, y_min, x_max, y_max, pixel count)
        let mut blobs: BTreeMap<u32, (u32, u32, u32, u32, u32)> = BTreeMap::new();
        for (x, y, p) in labels.enumerate_pixels() {
            let l = p[0];
            if l == 0 {
                continue;
            }
            let e = blobs.entry(l).or_insert((x, y, x, y, 0));
            e.0 = e.0.min(x);
            e.1 = e.1.min(y);
            e.2 = e.2.max(x);
            e.3 = e.3.max(y);
            e.4 += 1;
        }

        let detections: Vec<Detection> = blobs
            .values()
            .filter(|b| b.4 >= self.min_area)
            .map(|&(x0, y0, x1, y1, _)| {
                Detection::person(BoundingBox::new(
                    x0 as i32,
                    y0 as i32,
                    x1 as i32 + 1,
                    y1 as i32 + 1,
                ))
            })
            .collect();
        log::trace!(
            "hot blob detector: {} blobs, {} above {} px",
            blobs.len(),
            detections.len(),
            self.min_area
        );
        Ok(detections)
    }
}

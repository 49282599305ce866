use glam::Vec2;
use serde::{Deserialize, Serialize};

const IOU_EPSILON: f64 = 1e-6;

/// Axis-aligned person box in frame pixel coordinates, `(x1, y1)` top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox { x1, y1, x2, y2 }
    }

    /// Builds a box from detector output, truncating each coordinate toward zero.
    pub fn from_xyxy(xyxy: [f64; 4]) -> BoundingBox {
        BoundingBox::new(
            xyxy[0] as i32,
            xyxy[1] as i32,
            xyxy[2] as i32,
            xyxy[3] as i32,
        )
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0);
        w as f64 * h as f64
    }

    /// Intersection over union, with a small epsilon in the denominator so
    /// degenerate boxes yield 0 instead of NaN.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let inter = self.intersection_area(other);
        if inter <= 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter + IOU_EPSILON)
    }

    /// Clamps every corner onto the last valid pixel of a `width` x `height` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        BoundingBox {
            x1: self.x1.clamp(0, max_x.max(0)),
            y1: self.y1.clamp(0, max_y.max(0)),
            x2: self.x2.clamp(0, max_x.max(0)),
            y2: self.y2.clamp(0, max_y.max(0)),
        }
    }

    pub fn min_and_size(&self) -> ((f32, f32), (f32, f32)) {
        (
            (self.x1 as f32, self.y1 as f32),
            (self.width() as f32, self.height() as f32),
        )
    }
}

/// Estimated face / exposed skin location inside a person box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceCenter {
    pub x: i32,
    pub y: i32,
}

impl FaceCenter {
    pub fn new(x: i32, y: i32) -> FaceCenter {
        FaceCenter { x, y }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn distance(&self, other: &FaceCenter) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }

    /// `alpha * self + (1 - alpha) * prior` on each axis, rounded to the nearest pixel.
    pub fn blend(&self, prior: &FaceCenter, alpha: f32) -> FaceCenter {
        let v = self.as_vec2() * alpha + prior.as_vec2() * (1.0 - alpha);
        FaceCenter::new(v.x.round() as i32, v.y.round() as i32)
    }
}

/// Pixel distance a face moved between two cycles; 0 when either end is unknown.
pub fn movement(prior: Option<FaceCenter>, current: Option<FaceCenter>) -> f32 {
    match (prior, current) {
        (Some(p), Some(c)) => p.distance(&c),
        _ => 0.0,
    }
}

use image::RgbImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::detector::Detection;
use crate::frame::{FramePair, RawThermalFrame};
use crate::geometry::BoundingBox;
use crate::radiometry::{code_from_celsius, stretch_to_grayscale};

/// A standing figure: warm clothed body with a hotter head near the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPerson {
    pub bbox: BoundingBox,
    pub face_celsius: f64,
    pub body_celsius: f64,
}

impl SyntheticPerson {
    pub fn new(bbox: BoundingBox, face_celsius: f64) -> SyntheticPerson {
        SyntheticPerson {
            bbox,
            face_celsius,
            body_celsius: face_celsius - 6.0,
        }
    }

    /// Head patch: upper part of the box, central half of its width.
    pub fn face_box(&self) -> BoundingBox {
        let b = &self.bbox;
        let w = b.width();
        let h = b.height();
        BoundingBox::new(
            b.x1 + w / 4,
            b.y1 + h / 10,
            b.x2 - w / 4,
            b.y1 + h * 3 / 10,
        )
    }

    pub fn translated(&self, dx: i32, dy: i32) -> SyntheticPerson {
        let b = &self.bbox;
        SyntheticPerson {
            bbox: BoundingBox::new(b.x1 + dx, b.y1 + dy, b.x2 + dx, b.y2 + dy),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticScene {
    pub width: u32,
    pub height: u32,
    pub background_celsius: f64,
    /// Uniform noise amplitude in raw codes.
    pub noise_codes: u16,
    pub people: Vec<SyntheticPerson>,
}

impl SyntheticScene {
    pub fn new(width: u32, height: u32, background_celsius: f64) -> SyntheticScene {
        SyntheticScene {
            width,
            height,
            background_celsius,
            noise_codes: 0,
            people: Vec::new(),
        }
    }

    pub fn with_person(mut self, person: SyntheticPerson) -> SyntheticScene {
        self.people.push(person);
        self
    }

    pub fn with_noise(mut self, noise_codes: u16) -> SyntheticScene {
        self.noise_codes = noise_codes;
        self
    }

    /// Noise-free raw frame.
    pub fn render_raw(&self) -> RawThermalFrame {
        let background = code_from_celsius(self.background_celsius);
        let mut raw = RawThermalFrame::filled(self.width, self.height, background);
        for p in &self.people {
            fill(&mut raw, &p.bbox, code_from_celsius(p.body_celsius));
            fill(&mut raw, &p.face_box(), code_from_celsius(p.face_celsius));
        }
        raw
    }

    pub fn render<R: Rng>(&self, rng: &mut R) -> FramePair {
        let mut raw = self.render_raw();
        if self.noise_codes > 0 {
            let n = self.noise_codes as i32;
            for y in 0..self.height {
                for x in 0..self.width {
                    let c = raw.get(x, y) as i32 + rng.random_range(-n..=n);
                    raw.set(x, y, c.clamp(1, u16::MAX as i32) as u16);
                }
            }
        }
        let gray = stretch_to_grayscale(&raw);
        let visual = RgbImage::from_fn(self.width, self.height, |x, y| {
            let v = gray.get_pixel(x, y)[0];
            image::Rgb([v, v, v])
        });
        FramePair { visual, raw }
    }

    /// Ground-truth person detections for this scene.
    pub fn detections(&self) -> Vec<Detection> {
        self.people.iter().map(|p| Detection::person(p.bbox)).collect()
    }
}

fn fill(raw: &mut RawThermalFrame, bbox: &BoundingBox, code: u16) {
    let x0 = bbox.x1.clamp(0, raw.width() as i32);
    let x1 = bbox.x2.clamp(0, raw.width() as i32);
    let y0 = bbox.y1.clamp(0, raw.height() as i32);
    let y1 = bbox.y2.clamp(0, raw.height() as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            raw.set(x as u32, y as u32, code);
        }
    }
}

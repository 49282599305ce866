use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{Result, ThermalError};

pub const LEPTON_WIDTH: u32 = 160;
pub const LEPTON_HEIGHT: u32 = 120;

/// Number of pixels in a `width x height` frame, computed without `u32` overflow.
pub fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// One frame of radiometric codes, row major. A code of 0 means "no reading".
#[derive(Debug, Clone, PartialEq)]
pub struct RawThermalFrame {
    width: u32,
    height: u32,
    data: Vec<u16>,
}

impl RawThermalFrame {
    pub fn new(width: u32, height: u32, data: Vec<u16>) -> Result<RawThermalFrame> {
        let expected = pixel_count(width, height);
        if data.len() != expected {
            return Err(ThermalError::FrameSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(RawThermalFrame {
            width,
            height,
            data,
        })
    }

    pub fn zeros(width: u32, height: u32) -> RawThermalFrame {
        RawThermalFrame {
            width,
            height,
            data: vec![0; pixel_count(width, height)],
        }
    }

    pub fn filled(width: u32, height: u32, code: u16) -> RawThermalFrame {
        RawThermalFrame {
            width,
            height,
            data: vec![code; pixel_count(width, height)],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u16) -> RawThermalFrame {
        let mut data = Vec::with_capacity(pixel_count(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        RawThermalFrame {
            width,
            height,
            data,
        }
    }

    /// Decodes little-endian u16 codes. Returns `None` on a short buffer.
    pub fn from_le_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<RawThermalFrame> {
        let n = pixel_count(width, height);
        if bytes.len() < n * 2 {
            return None;
        }
        let data = bytes[..n * 2]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        Some(RawThermalFrame {
            width,
            height,
            data,
        })
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|c| c.to_le_bytes()).collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn codes(&self) -> &[u16] {
        &self.data
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, code: u16) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = code;
    }

    /// Valid (non-zero) codes inside the half-open window `[x0, x1) x [y0, y1)`.
    ///
    /// The window is clamped to the frame first.
    pub fn valid_codes(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<u16> {
        let x0 = x0.clamp(0, self.width as i32) as usize;
        let x1 = x1.clamp(0, self.width as i32) as usize;
        let y0 = y0.clamp(0, self.height as i32) as usize;
        let y1 = y1.clamp(0, self.height as i32) as usize;
        if x1 <= x0 || y1 <= y0 {
            return Vec::new();
        }
        let w = self.width as usize;
        (y0..y1)
            .flat_map(|y| self.data[y * w + x0..y * w + x1].iter().copied())
            .filter(|&c| c > 0)
            .collect()
    }

    /// Mean of the valid codes inside a window, `None` when it has none.
    pub fn valid_mean(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<f64> {
        let codes = self.valid_codes(x0, y0, x1, y1);
        if codes.is_empty() {
            return None;
        }
        Some(codes.iter().map(|&c| c as f64).sum::<f64>() / codes.len() as f64)
    }
}

/// Synchronized visual / raw pair as published by the capture process.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub visual: RgbImage,
    pub raw: RawThermalFrame,
}

/// Producer of frame pairs. `Ok(None)` means "not ready yet" and the loop skips.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<FramePair>>;
}

/// Reads the shared-memory files written by the Lepton capture process.
pub struct ShmFrameSource {
    raw_path: PathBuf,
    visual_path: PathBuf,
    width: u32,
    height: u32,
}

impl ShmFrameSource {
    pub fn new(
        raw_path: impl AsRef<Path>,
        visual_path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> ShmFrameSource {
        ShmFrameSource {
            raw_path: raw_path.as_ref().to_path_buf(),
            visual_path: visual_path.as_ref().to_path_buf(),
            width,
            height,
        }
    }

    fn read_segment(path: &Path, expected: usize) -> Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) if bytes.len() >= expected => Ok(Some(bytes)),
            Ok(bytes) => {
                log::trace!(
                    "short read on {}: {} of {} bytes",
                    path.display(),
                    bytes.len(),
                    expected
                );
                Ok(None)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::trace!("{} not published yet", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl FrameSource for ShmFrameSource {
    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        let n = pixel_count(self.width, self.height);
        let Some(visual_bytes) = Self::read_segment(&self.visual_path, n * 3)? else {
            return Ok(None);
        };
        let Some(raw_bytes) = Self::read_segment(&self.raw_path, n * 2)? else {
            return Ok(None);
        };
        let Some(raw) = RawThermalFrame::from_le_bytes(self.width, self.height, &raw_bytes)
        else {
            return Ok(None);
        };
        let Some(visual) = RgbImage::from_raw(self.width, self.height, visual_bytes[..n * 3].to_vec())
        else {
            return Ok(None);
        };
        Ok(Some(FramePair { visual, raw }))
    }
}

use image::{GrayImage, Luma};

use crate::frame::RawThermalFrame;

/// Sensor codes are centi-Kelvin.
pub const CODE_SCALE: f64 = 0.01;
pub const KELVIN_OFFSET: f64 = 273.15;

/// Minimum code span used when stretching a nearly flat frame.
const MIN_STRETCH_SPAN: u16 = 10;

/// Converts a radiometric code to degrees Celsius.
///
/// Linear approximation `code * 0.01 - 273.15`; good for relative comparison,
/// not a certified calibration.
pub fn celsius(code: u16) -> f64 {
    celsius_from_code(code as f64)
}

/// Same mapping for an averaged (fractional) code.
pub fn celsius_from_code(code: f64) -> f64 {
    code * CODE_SCALE - KELVIN_OFFSET
}

/// Inverse of [`celsius`], saturating at the u16 range.
pub fn code_from_celsius(temp_c: f64) -> u16 {
    ((temp_c + KELVIN_OFFSET) / CODE_SCALE)
        .round()
        .clamp(0.0, u16::MAX as f64) as u16
}

/// Min/max contrast stretch of the valid codes into an 8-bit image.
///
/// This is what the detector and the display see. Invalid pixels end up black.
pub fn stretch_to_grayscale(frame: &RawThermalFrame) -> GrayImage {
    let mut out = GrayImage::new(frame.width(), frame.height());
    let valid = frame.codes().iter().copied().filter(|&c| c > 0);
    let Some((lo, hi)) = valid.fold(None, |acc: Option<(u16, u16)>, c| match acc {
        None => Some((c, c)),
        Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
    }) else {
        return out;
    };
    let span = (hi - lo).max(MIN_STRETCH_SPAN) as f64;
    let scale = 255.0 / span;
    for (i, &code) in frame.codes().iter().enumerate() {
        let v = ((code as f64 - lo as f64) * scale).clamp(0.0, 255.0) as u8;
        let x = i as u32 % frame.width();
        let y = i as u32 / frame.width();
        out.put_pixel(x, y, Luma([v]));
    }
    out
}

/// Temperature under a pointer, with the deployment calibration offset applied.
///
/// `None` when the pointer is outside the frame or the pixel has no reading.
pub fn pointer_temperature(
    frame: &RawThermalFrame,
    cursor: (i32, i32),
    calibration_offset: f64,
) -> Option<f64> {
    let (x, y) = cursor;
    if !frame.contains(x, y) {
        return None;
    }
    let code = frame.get(x as u32, y as u32);
    if code == 0 {
        return None;
    }
    Some(celsius(code) + calibration_offset)
}

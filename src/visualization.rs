use image::{GrayImage, RgbImage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;

use crate::error::{Result, ThermalError};
use crate::pipeline::{FrameView, RenderSink};
use crate::tracker::TrackTable;

/// Overlay text for the n-th listed person, `--.-C` when no temperature yet.
pub fn track_label(index: usize, temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("Person{}: {:.2}C", index, t),
        None => format!("Person{}: --.-C", index),
    }
}

/// One overlay line per live track, numbered from 1 in id order.
pub fn track_labels(tracks: &TrackTable) -> Vec<String> {
    tracks
        .values()
        .enumerate()
        .map(|(i, t)| track_label(i + 1, t.temperature))
        .collect()
}

pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Maps a stretched thermal image through the inferno palette.
pub fn colorize(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let c = colorous::INFERNO.eval_continuous(gray.get_pixel(x, y)[0] as f64 / 255.0);
        image::Rgb([c.r, c.g, c.b])
    })
}

/// Logs the track table whenever a detection cycle ran.
#[derive(Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn render(&mut self, view: &FrameView<'_>) -> Result<()> {
        if view.cycle_ran {
            if view.tracks.is_empty() {
                log::info!("frame {}: no person detected", view.frame_index);
            }
            for (label, track) in track_labels(view.tracks).iter().zip(view.tracks.values()) {
                log::info!(
                    "frame {}: id {} {} box [{}, {}, {}, {}]",
                    view.frame_index,
                    track.id,
                    label,
                    track.bbox.x1,
                    track.bbox.y1,
                    track.bbox.x2,
                    track.bbox.y2
                );
            }
        }
        if let Some(p) = view.pointer {
            log::trace!("pointer ({}, {}): {:.2}C", p.x, p.y, p.celsius);
        }
        Ok(())
    }
}

/// Streams thermal image, boxes, face centers and labels to a rerun recording.
pub struct RerunSink {
    recording: RecordingStream,
    topic: String,
}

impl RerunSink {
    pub fn new(recording: RecordingStream, topic: &str) -> RerunSink {
        RerunSink {
            recording,
            topic: topic.to_string(),
        }
    }

    /// Records to an `.rrd` file.
    pub fn save(path: &str) -> Result<RerunSink> {
        let recording = rerun::RecordingStreamBuilder::new("thermal_tracker")
            .save(path)
            .map_err(to_vis_error)?;
        Ok(RerunSink::new(recording, "/thermal"))
    }

    fn log_tracks(&self, tracks: &TrackTable) -> Result<()> {
        let labels = track_labels(tracks);
        let colors: Vec<_> = tracks.keys().map(|id| id_to_color(*id as usize)).collect();
        let (mins, sizes): (Vec<_>, Vec<_>) =
            tracks.values().map(|t| t.bbox.min_and_size()).unzip();
        self.recording
            .log(
                format!("{}/people", self.topic),
                &rerun::Boxes2D::from_mins_and_sizes(mins, sizes)
                    .with_labels(labels)
                    .with_colors(colors.clone()),
            )
            .map_err(to_vis_error)?;

        let (centers, center_colors): (Vec<_>, Vec<_>) = tracks
            .values()
            .zip(colors)
            .filter_map(|(t, c)| t.center.map(|p| ((p.x as f32, p.y as f32), c)))
            .unzip();
        self.recording
            .log(
                format!("{}/faces", self.topic),
                &rerun::Points2D::new(rerun_shift(&centers))
                    .with_colors(center_colors)
                    .with_radii([rerun::Radius::new_ui_points(3.0)]),
            )
            .map_err(to_vis_error)
    }
}

impl RenderSink for RerunSink {
    fn render(&mut self, view: &FrameView<'_>) -> Result<()> {
        self.recording
            .set_time_sequence("frame", view.frame_index as i64);
        let rgb = colorize(view.gray);
        let (w, h) = rgb.dimensions();
        self.recording
            .log(
                format!("{}/image", self.topic),
                &rerun::Image::from_rgb24(rgb.into_raw(), [w, h]),
            )
            .map_err(to_vis_error)?;
        self.log_tracks(view.tracks)?;
        if let Some(p) = view.pointer {
            self.recording
                .log(
                    format!("{}/pointer", self.topic),
                    &rerun::Points2D::new(rerun_shift(&[(p.x as f32, p.y as f32)]))
                        .with_labels([format!("{:.2}C", p.celsius)])
                        .with_radii([rerun::Radius::new_ui_points(2.0)]),
                )
                .map_err(to_vis_error)?;
        }
        Ok(())
    }
}

fn to_vis_error(e: impl std::fmt::Display) -> ThermalError {
    ThermalError::Visualization(e.to_string())
}

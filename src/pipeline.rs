use std::time::{Duration, Instant};

use image::GrayImage;

use crate::config::TrackerConfig;
use crate::detector::{Detector, person_boxes};
use crate::error::Result;
use crate::frame::{FramePair, FrameSource};
use crate::radiometry::{pointer_temperature, stretch_to_grayscale};
use crate::tracker::{TrackAssociator, TrackTable};

/// Rate limiter for the expensive detect + estimate cycle.
#[derive(Debug, Clone)]
pub struct DetectionCycleClock {
    interval: Duration,
    last: Option<Instant>,
}

impl DetectionCycleClock {
    pub fn new(interval: Duration) -> DetectionCycleClock {
        DetectionCycleClock {
            interval,
            last: None,
        }
    }

    /// True on the first call and whenever strictly more than `interval` has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub fn last_cycle(&self) -> Option<Instant> {
        self.last
    }
}

/// Mutable state of the loop, owned by [`Pipeline`] and handed to components
/// explicitly.
pub struct PipelineContext {
    pub associator: TrackAssociator,
    pub clock: DetectionCycleClock,
    pub cursor: Option<(i32, i32)>,
}

impl PipelineContext {
    pub fn new(config: &TrackerConfig) -> PipelineContext {
        PipelineContext {
            associator: TrackAssociator::new(
                config.association.clone(),
                config.hotspot.clone(),
                config.estimator.clone(),
            ),
            clock: DetectionCycleClock::new(config.detection_interval()),
            cursor: None,
        }
    }
}

/// Temperature under the pointer for the diagnostic overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerReading {
    pub x: i32,
    pub y: i32,
    pub celsius: f64,
}

/// Everything the renderer needs for one frame. Borrowed, read only.
pub struct FrameView<'a> {
    pub frame_index: u64,
    pub frame: &'a FramePair,
    pub gray: &'a GrayImage,
    pub tracks: &'a TrackTable,
    pub pointer: Option<PointerReading>,
    pub cycle_ran: bool,
}

/// Consumer of the per-frame track snapshot.
pub trait RenderSink {
    fn render(&mut self, view: &FrameView<'_>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The source had no complete frame; nothing changed.
    Skipped,
    Rendered { cycle_ran: bool },
}

/// Single-threaded cooperative loop: pull a frame, run a detection cycle when
/// the clock allows, render.
pub struct Pipeline {
    config: TrackerConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    context: PipelineContext,
    frames: u64,
}

impl Pipeline {
    pub fn new(
        config: TrackerConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
    ) -> Pipeline {
        let context = PipelineContext::new(&config);
        Pipeline {
            config,
            source,
            detector,
            context,
            frames: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn tracks(&self) -> &TrackTable {
        self.context.associator.tracks()
    }

    pub fn set_cursor(&mut self, cursor: Option<(i32, i32)>) {
        self.context.cursor = cursor;
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn step(&mut self, sink: &mut dyn RenderSink) -> Result<StepOutcome> {
        self.step_at(Instant::now(), sink)
    }

    /// One loop iteration, with `now` supplied by the caller.
    pub fn step_at(&mut self, now: Instant, sink: &mut dyn RenderSink) -> Result<StepOutcome> {
        let Some(pair) = self.source.next_frame()? else {
            return Ok(StepOutcome::Skipped);
        };
        let gray = stretch_to_grayscale(&pair.raw);

        let cycle_ran = self.context.clock.is_due(now);
        if cycle_ran {
            self.run_cycle(&pair, &gray);
            self.context.clock.mark(now);
        }

        let pointer = self.context.cursor.and_then(|(x, y)| {
            pointer_temperature(&pair.raw, (x, y), self.config.estimator.calibration_offset)
                .map(|celsius| PointerReading { x, y, celsius })
        });

        let view = FrameView {
            frame_index: self.frames,
            frame: &pair,
            gray: &gray,
            tracks: self.context.associator.tracks(),
            pointer,
            cycle_ran,
        };
        sink.render(&view)?;
        self.frames += 1;
        Ok(StepOutcome::Rendered { cycle_ran })
    }

    fn run_cycle(&mut self, pair: &FramePair, gray: &GrayImage) {
        let detections = match self.detector.detect(pair, gray) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("detector failed, keeping previous tracks: {}", e);
                return;
            }
        };
        let boxes = person_boxes(&detections, &self.config.detection.person_label);
        log::debug!(
            "detection cycle: {} detections, {} people",
            detections.len(),
            boxes.len()
        );
        self.context.associator.update(&pair.raw, &boxes);
    }

    /// Iterates until `should_stop` returns true, checked once per iteration.
    ///
    /// `idle` is slept after an iteration that found no frame.
    pub fn run(
        &mut self,
        sink: &mut dyn RenderSink,
        idle: Duration,
        mut should_stop: impl FnMut(&Pipeline) -> bool,
    ) -> Result<u64> {
        while !should_stop(self) {
            if self.step(sink)? == StepOutcome::Skipped && !idle.is_zero() {
                std::thread::sleep(idle);
            }
        }
        Ok(self.frames)
    }
}

use std::path::Path;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use thermal_skin_tracker::detector::{Detector, HotBlobDetector, JsonFileDetector};
use thermal_skin_tracker::pipeline::{FrameView, RenderSink};
use thermal_skin_tracker::visualization::{LogSink, RerunSink};
use thermal_skin_tracker::{Pipeline, ShmFrameSource, TrackerConfig};

#[derive(Clone, Copy, ValueEnum)]
enum DetectorKind {
    /// read detections written by an external model
    JsonFile,
    /// threshold and label warm blobs
    HotBlob,
}

#[derive(Parser)]
#[command(version, about, author)]
struct ThermalTrackerCli {
    /// tracker config json, defaults are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<String>,

    /// shared memory file with raw16 frames
    #[arg(long, default_value = "/dev/shm/lepton_raw")]
    raw_path: String,

    /// shared memory file with rgb frames
    #[arg(long, default_value = "/dev/shm/lepton_frame")]
    visual_path: String,

    #[arg(long, value_enum, default_value = "hot-blob")]
    detector: DetectorKind,

    /// json detections file for `--detector json-file`
    #[arg(long, default_value = "/dev/shm/lepton_detections.json")]
    detections_path: String,

    /// minimum blob temperature for `--detector hot-blob`
    #[arg(long, default_value_t = 28.0)]
    blob_celsius: f64,

    /// save a rerun recording (.rrd)
    #[arg(long)]
    rerun: Option<String>,

    /// pixel to read out, "x,y"
    #[arg(long, value_parser = parse_cursor)]
    pointer: Option<(i32, i32)>,

    /// stop after this many rendered frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// stop when this file appears
    #[arg(long, default_value = "/tmp/thermal_tracker.stop")]
    stop_file: String,

    /// sleep between polls when no complete frame is available
    #[arg(long, default_value_t = 5)]
    idle_ms: u64,
}

fn parse_cursor(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {}", s))?;
    let x = x.trim().parse().map_err(|e| format!("{}", e))?;
    let y = y.trim().parse().map_err(|e| format!("{}", e))?;
    Ok((x, y))
}

struct Sinks(Vec<Box<dyn RenderSink>>);

impl RenderSink for Sinks {
    fn render(&mut self, view: &FrameView<'_>) -> thermal_skin_tracker::Result<()> {
        for s in &mut self.0 {
            s.render(view)?;
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = ThermalTrackerCli::parse();

    let config = match &cli.config {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(path) = &cli.dump_config {
        config.to_json_file(path)?;
        log::info!("config written to {}", path);
        return Ok(());
    }

    let source = ShmFrameSource::new(
        &cli.raw_path,
        &cli.visual_path,
        config.frame.width,
        config.frame.height,
    );
    let detector: Box<dyn Detector> = match cli.detector {
        DetectorKind::JsonFile => Box::new(JsonFileDetector::new(&cli.detections_path)),
        DetectorKind::HotBlob => Box::new(HotBlobDetector {
            min_celsius: cli.blob_celsius,
            ..Default::default()
        }),
    };

    let mut sinks: Vec<Box<dyn RenderSink>> = vec![Box::new(LogSink)];
    if let Some(path) = &cli.rerun {
        sinks.push(Box::new(RerunSink::save(path)?));
    }
    let mut sinks = Sinks(sinks);

    let mut pipeline = Pipeline::new(config, Box::new(source), detector);
    pipeline.set_cursor(cli.pointer);

    log::info!("waiting for frames on {}", cli.raw_path);
    let now = Instant::now();
    let max_frames = cli.max_frames;
    let stop_file = cli.stop_file.clone();
    let frames = pipeline.run(&mut sinks, Duration::from_millis(cli.idle_ms), |p| {
        max_frames.is_some_and(|m| p.frames() >= m) || Path::new(&stop_file).exists()
    })?;

    let duration_sec = now.elapsed().as_secs_f64();
    log::info!("rendered {} frames in {:.3} sec", frames, duration_sec);
    Ok(())
}

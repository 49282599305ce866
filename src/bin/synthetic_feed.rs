use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thermal_skin_tracker::BoundingBox;
use thermal_skin_tracker::synthetic::{SyntheticPerson, SyntheticScene};

/// Publishes synthetic Lepton frames to the shared memory files, standing in
/// for the capture process.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "/dev/shm/lepton_raw")]
    raw_path: String,

    #[arg(long, default_value = "/dev/shm/lepton_frame")]
    visual_path: String,

    /// also write ground-truth detections here
    #[arg(long)]
    detections_path: Option<String>,

    /// Number of frames to publish
    #[arg(short, long, default_value = "300")]
    num_frames: usize,

    /// Delay between frames in milliseconds
    #[arg(long, default_value = "110")]
    period_ms: u64,

    /// Number of walking people
    #[arg(long, default_value = "2")]
    people: usize,

    #[arg(long, default_value = "160")]
    width: u32,

    #[arg(long, default_value = "120")]
    height: u32,

    /// Raw code noise amplitude
    #[arg(long, default_value = "20")]
    noise: u16,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let spacing = args.width as i32 / (args.people as i32 + 1);
    let walkers: Vec<SyntheticPerson> = (0..args.people)
        .map(|i| {
            let cx = spacing * (i as i32 + 1);
            SyntheticPerson::new(
                BoundingBox::new(cx - 15, 10, cx + 15, args.height as i32 - 10),
                36.5 + i as f64 * 0.4,
            )
        })
        .collect();

    for frame_idx in 0..args.num_frames {
        // slow side-to-side sway
        let phase = frame_idx as f64 / 40.0;
        let mut scene = SyntheticScene::new(args.width, args.height, 22.0).with_noise(args.noise);
        for (i, w) in walkers.iter().enumerate() {
            let dx = ((phase + i as f64).sin() * 10.0) as i32;
            scene = scene.with_person(w.translated(dx, 0));
        }

        let pair = scene.render(&mut rng);
        fs::write(Path::new(&args.raw_path), pair.raw.to_le_bytes())?;
        fs::write(Path::new(&args.visual_path), pair.visual.as_raw())?;
        if let Some(path) = &args.detections_path {
            let records: Vec<_> = scene
                .detections()
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "label": d.label,
                        "xyxy": [d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2],
                    })
                })
                .collect();
            fs::write(path, serde_json::to_string(&records)?)?;
        }
        log::trace!("published frame {}", frame_idx);
        std::thread::sleep(Duration::from_millis(args.period_ms));
    }

    log::info!("published {} frames to {}", args.num_frames, args.raw_path);
    Ok(())
}

pub mod config;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod geometry;
pub mod hotspot;
pub mod pipeline;
pub mod radiometry;
pub mod synthetic;
pub mod tracker;
pub mod visualization;

pub use config::TrackerConfig;
pub use error::{Result, ThermalError};
pub use frame::{FramePair, FrameSource, RawThermalFrame, ShmFrameSource};
pub use geometry::{BoundingBox, FaceCenter};
pub use pipeline::{Pipeline, RenderSink};
pub use tracker::{Track, TrackAssociator, TrackTable};

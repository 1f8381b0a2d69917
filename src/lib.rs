// src/lib.rs
//
// Detection fusion and plate-text normalization for agricultural vehicle
// monitoring.
//
// The crate fuses two noisy, independent signals from one frame — object
// detections (vehicles, plates, cargo) and an OCR character stream off a
// plate crop — into a single decision-ready record: which vehicle is
// present, its type and body color, whether it carries cargo, and its
// validated registration identifier.
//
// Detection and OCR themselves live behind the `backend` traits; everything
// on this side of that seam is pure, synchronous computation that is safe to
// run concurrently on independent frames.

pub mod backend;
pub mod color_analysis;
pub mod config;
pub mod fusion;
pub mod geometry;
pub mod plate_text;
pub mod record;
pub mod types;

pub use backend::{PlateReader, SceneAnalyzer, VehicleDetector};
pub use fusion::fuse;
pub use geometry::BoundingBox;
pub use types::{
    Config, Detection, DetectionClass, FrameView, FusedResult, LoadStatus, PipelineState,
    PlateColor, VehicleColor, VehicleType,
};

// src/backend.rs
//
// Seam between the pure fusion pipeline and its external collaborators.
//
// The detection model and the OCR reader are injected as stateless service
// handles; the analyzer owns no model state and holds nothing across frames,
// so one analyzer can serve concurrent per-frame calls as long as the
// injected backends do.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::fusion;
use crate::geometry::BoundingBox;
use crate::types::{Config, Detection, FrameView, FusedResult};

/// Produces zero or more detections for a frame, in an undefined but stable
/// order. Confidence filtering beyond the model's global floor happens on
/// this side of the seam.
pub trait VehicleDetector {
    fn detect(&self, frame: FrameView<'_>) -> Result<Vec<Detection>>;
}

/// Reads raw text segments (allow-listed alphabet) off a plate crop. May
/// return no segments at all for an unreadable crop.
pub trait PlateReader {
    fn read(&self, plate: FrameView<'_>) -> Result<Vec<String>>;
}

/// Drives the injected backends over one frame and hands their outputs to the
/// fusion pipeline.
pub struct SceneAnalyzer<'a> {
    detector: &'a dyn VehicleDetector,
    reader: &'a dyn PlateReader,
    config: Config,
}

impl<'a> SceneAnalyzer<'a> {
    pub fn new(
        detector: &'a dyn VehicleDetector,
        reader: &'a dyn PlateReader,
        config: Config,
    ) -> Self {
        Self {
            detector,
            reader,
            config,
        }
    }

    /// Analyze one frame end to end: detect, filter, read the plate, fuse.
    ///
    /// Backend failures propagate; fusion itself cannot fail.
    pub fn analyze(&self, frame: FrameView<'_>) -> Result<FusedResult> {
        let raw = self
            .detector
            .detect(frame)
            .context("vehicle detection failed")?;
        let detections = self.sanitize(raw, frame);

        let segments = self.read_plate_text(frame, &detections)?;
        let result = fusion::fuse(frame, &detections, &segments, &self.config);

        info!(
            "frame analyzed: state={} vehicle={} plate={}",
            result.state.as_str(),
            result
                .vehicle_type
                .map(|t| t.as_str())
                .unwrap_or("none"),
            result.plate_text.as_deref().unwrap_or("-"),
        );
        Ok(result)
    }

    /// Drop malformed boxes and apply the per-class confidence floors the
    /// detection backend is expected to run under.
    fn sanitize(&self, raw: Vec<Detection>, frame: FrameView<'_>) -> Vec<Detection> {
        let mut detections = Vec::with_capacity(raw.len());
        for det in raw {
            if !det.bbox.is_valid() {
                warn!(
                    "dropping malformed {} box {:?}",
                    det.class.as_str(),
                    det.bbox
                );
                continue;
            }
            let floor = self.config.class_confidence.floor(det.class);
            if det.confidence < floor {
                debug!(
                    "dropping {} at {:.2} (floor {:.2})",
                    det.class.as_str(),
                    det.confidence,
                    floor
                );
                continue;
            }
            let clamped = det.bbox.clamp_to(frame.width, frame.height);
            if !clamped.is_valid() {
                warn!("dropping off-frame {} box {:?}", det.class.as_str(), det.bbox);
                continue;
            }
            detections.push(Detection {
                bbox: clamped,
                ..det
            });
        }
        detections
    }

    /// Crop the plate the fusion pass will associate and run the reader on
    /// it. With no vehicle and no plate box, the whole frame is treated as a
    /// plate crop; with a vehicle but no associated plate, there is nothing
    /// to read.
    fn read_plate_text(
        &self,
        frame: FrameView<'_>,
        detections: &[Detection],
    ) -> Result<Vec<String>> {
        let selected = fusion::select_vehicle(detections, &self.config.selection);

        let plate_box = match selected {
            Some(vehicle) => match fusion::associate_plate(detections, &vehicle.bbox) {
                Some(plate) => Some(plate.bbox),
                None => return Ok(Vec::new()),
            },
            None => fusion::fallback_plate(detections).map(|d| d.bbox),
        };

        match plate_box {
            Some(bbox) => {
                let (data, width, height) = crop_rgb(frame, &bbox);
                if data.is_empty() {
                    return Ok(Vec::new());
                }
                self.reader
                    .read(FrameView::new(&data, width, height))
                    .context("plate OCR failed")
            }
            None => self
                .reader
                .read(frame)
                .context("whole-frame OCR failed"),
        }
    }
}

/// Copy a box region out of a frame into an owned RGB buffer.
fn crop_rgb(frame: FrameView<'_>, bbox: &BoundingBox) -> (Vec<u8>, usize, usize) {
    let clamped = bbox.clamp_to(frame.width, frame.height);
    if !clamped.is_valid() {
        return (Vec::new(), 0, 0);
    }

    let width = clamped.width() as usize;
    let height = clamped.height() as usize;
    let mut data = Vec::with_capacity(width * height * 3);

    for y in clamped.y1..clamped.y2 {
        let start = (y as usize * frame.width + clamped.x1 as usize) * 3;
        let end = start + width * 3;
        if end > frame.data.len() {
            return (Vec::new(), 0, 0);
        }
        data.extend_from_slice(&frame.data[start..end]);
    }

    (data, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionClass, LoadStatus, PipelineState, VehicleType};

    struct FixedDetector(Vec<Detection>);

    impl VehicleDetector for FixedDetector {
        fn detect(&self, _frame: FrameView<'_>) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct FixedReader(Vec<String>);

    impl PlateReader for FixedReader {
        fn read(&self, _plate: FrameView<'_>) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn det(class: DetectionClass, confidence: f32, bbox: BoundingBox) -> Detection {
        Detection {
            class,
            confidence,
            bbox,
        }
    }

    #[test]
    fn test_analyze_full_scene() {
        let img = vec![0u8; 640 * 480 * 3];
        let frame = FrameView::new(&img, 640, 480);

        let detector = FixedDetector(vec![
            det(DetectionClass::Truck, 0.8, BoundingBox::new(50, 50, 450, 400)),
            det(
                DetectionClass::Plate,
                0.6,
                BoundingBox::new(200, 320, 300, 360),
            ),
            det(
                DetectionClass::Cargo,
                0.7,
                BoundingBox::new(100, 80, 400, 250),
            ),
        ]);
        let reader = FixedReader(vec!["MHI2AB34S6".to_string()]);

        let analyzer = SceneAnalyzer::new(&detector, &reader, Config::default());
        let result = analyzer.analyze(frame).unwrap();

        assert!(result.vehicle_present);
        assert_eq!(result.vehicle_type, Some(VehicleType::Truck));
        assert_eq!(result.load_status, LoadStatus::Loaded);
        assert_eq!(result.plate_text, Some("MH12AB3456".to_string()));
        assert_eq!(result.state, PipelineState::VehicleWithPlate);
    }

    #[test]
    fn test_analyze_drops_malformed_and_low_confidence() {
        let img = vec![0u8; 640 * 480 * 3];
        let frame = FrameView::new(&img, 640, 480);

        let detector = FixedDetector(vec![
            // Inverted box, must be dropped before fusion.
            det(DetectionClass::Truck, 0.9, BoundingBox::new(400, 50, 50, 400)),
            // Below the tractor floor of 0.40.
            det(
                DetectionClass::Tractor,
                0.35,
                BoundingBox::new(10, 10, 200, 200),
            ),
        ]);
        let reader = FixedReader(Vec::new());

        let analyzer = SceneAnalyzer::new(&detector, &reader, Config::default());
        let result = analyzer.analyze(frame).unwrap();

        assert!(!result.vehicle_present);
        assert_eq!(result.load_status, LoadStatus::Unknown);
    }

    #[test]
    fn test_analyze_whole_frame_fallback() {
        let img = vec![0u8; 640 * 480 * 3];
        let frame = FrameView::new(&img, 640, 480);

        let detector = FixedDetector(Vec::new());
        let reader = FixedReader(vec!["MH12AB3456".to_string()]);

        let analyzer = SceneAnalyzer::new(&detector, &reader, Config::default());
        let result = analyzer.analyze(frame).unwrap();

        assert!(!result.vehicle_present);
        assert_eq!(result.plate_text, Some("MH12AB3456".to_string()));
        assert_eq!(result.state, PipelineState::PlateOnly);
    }

    #[test]
    fn test_vehicle_without_plate_skips_ocr() {
        let img = vec![0u8; 640 * 480 * 3];
        let frame = FrameView::new(&img, 640, 480);

        let detector = FixedDetector(vec![det(
            DetectionClass::Tractor,
            0.9,
            BoundingBox::new(50, 50, 300, 300),
        )]);
        // A reader that would "succeed" if it were ever consulted.
        let reader = FixedReader(vec!["MH12AB3456".to_string()]);

        let analyzer = SceneAnalyzer::new(&detector, &reader, Config::default());
        let result = analyzer.analyze(frame).unwrap();

        assert_eq!(result.state, PipelineState::VehicleOnly);
        assert_eq!(result.plate_text, None);
    }

    #[test]
    fn test_crop_rgb_dimensions() {
        let mut img = vec![0u8; 10 * 10 * 3];
        // Mark pixel (3, 2) red.
        let idx = (2 * 10 + 3) * 3;
        img[idx] = 255;
        let frame = FrameView::new(&img, 10, 10);

        let (data, w, h) = crop_rgb(frame, &BoundingBox::new(3, 2, 6, 5));
        assert_eq!((w, h), (3, 3));
        assert_eq!(data.len(), 3 * 3 * 3);
        assert_eq!(data[0], 255);
    }
}

// src/fusion.rs
//
// One frame's detection set + one OCR character stream → one FusedResult.
//
// The pipeline is a single pass with no cross-call state: partition the
// detections, pick the most plausible vehicle, correct its type from box
// geometry, associate plate and cargo boxes by center containment, classify
// colors, normalize the plate text, assemble the record. Every
// insufficient-signal condition resolves locally to an UNKNOWN sentinel.

use tracing::debug;

use crate::color_analysis::{classify_plate_color, classify_vehicle_color};
use crate::geometry::{aspect_ratio, contains_center, BoundingBox};
use crate::plate_text;
use crate::types::{
    Config, Detection, DetectionClass, FrameView, FusedResult, LoadStatus, PipelineState,
    SelectionConfig, VehicleType,
};

// ============================================================================
// VEHICLE SELECTION
// ============================================================================

/// Score used to rank competing vehicle detections. The detector runs
/// under-confident on trucks relative to tractors, so trucks get a fixed
/// additive bias.
fn selection_score(det: &Detection, cfg: &SelectionConfig) -> f32 {
    let bias = if det.class == DetectionClass::Truck {
        cfg.truck_bias
    } else {
        0.0
    };
    det.confidence + bias
}

/// Pick the single most plausible vehicle among the vehicle-class detections.
/// Ties break by first-seen order; the input order is never re-sorted here.
pub fn select_vehicle<'a>(
    detections: &'a [Detection],
    cfg: &SelectionConfig,
) -> Option<&'a Detection> {
    let mut best: Option<(&Detection, f32)> = None;
    for det in detections.iter().filter(|d| d.class.is_vehicle()) {
        let score = selection_score(det, cfg);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((det, score)),
        }
    }
    best.map(|(det, _)| det)
}

/// Geometry-based type correction, applied once after selection: elongated
/// boxes at tractor-typical confidence are empirically truck silhouettes the
/// detector's shape prior misclassified.
pub fn reclassify(selected: &Detection, cfg: &SelectionConfig) -> Option<VehicleType> {
    let vehicle_type = VehicleType::from_class(selected.class)?;
    if vehicle_type == VehicleType::Tractor
        && aspect_ratio(&selected.bbox) > cfg.tractor_aspect_threshold
    {
        debug!(
            "reclassified tractor → truck (aspect {:.2} > {:.2})",
            aspect_ratio(&selected.bbox),
            cfg.tractor_aspect_threshold
        );
        return Some(VehicleType::Truck);
    }
    Some(vehicle_type)
}

// ============================================================================
// SPATIAL ASSOCIATION
// ============================================================================

/// Deterministic association order: descending confidence, then descending
/// box area. The detector's output order is unspecified, so a raw
/// first-match scan over it would not be stable across runs.
fn association_order<'a>(detections: &'a [Detection], class: DetectionClass) -> Vec<&'a Detection> {
    let mut candidates: Vec<&Detection> =
        detections.iter().filter(|d| d.class == class).collect();
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.bbox.area().cmp(&a.bbox.area()))
    });
    candidates
}

/// First plate whose center is contained by the vehicle box. First-match, not
/// best-match: later candidates are not evaluated once one qualifies.
pub fn associate_plate<'a>(
    detections: &'a [Detection],
    vehicle_box: &BoundingBox,
) -> Option<&'a Detection> {
    association_order(detections, DetectionClass::Plate)
        .into_iter()
        .find(|p| contains_center(&p.bbox, vehicle_box))
}

/// Plate candidate for the no-vehicle path, picked by the same deterministic
/// order as association so the OCR crop and the fused record agree.
pub fn fallback_plate(detections: &[Detection]) -> Option<&Detection> {
    association_order(detections, DetectionClass::Plate)
        .into_iter()
        .next()
}

/// LOADED iff any cargo box center falls inside the vehicle box; UNKNOWN when
/// there is no vehicle to test against.
pub fn load_status(detections: &[Detection], vehicle_box: Option<&BoundingBox>) -> LoadStatus {
    let Some(vehicle_box) = vehicle_box else {
        return LoadStatus::Unknown;
    };
    let loaded = association_order(detections, DetectionClass::Cargo)
        .into_iter()
        .any(|c| contains_center(&c.bbox, vehicle_box));
    if loaded {
        LoadStatus::Loaded
    } else {
        LoadStatus::Empty
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Fuse one frame's detections and OCR segments into a decision-ready record.
///
/// Total over its input domain: the detection slice and the OCR segments may
/// both be empty, and the result is always well-formed. The frame pixels are
/// a read-only borrow; nothing is mutated.
pub fn fuse(
    frame: FrameView<'_>,
    detections: &[Detection],
    ocr_segments: &[String],
    config: &Config,
) -> FusedResult {
    let mut result = FusedResult::empty();
    let mut state = PipelineState::NoVehicle;

    let selected = select_vehicle(detections, &config.selection);

    let plate_det = match selected {
        Some(vehicle) => {
            state = PipelineState::VehicleOnly;

            result.vehicle_present = true;
            result.vehicle_type = reclassify(vehicle, &config.selection);
            if let Some(vehicle_type) = result.vehicle_type {
                result.vehicle_color =
                    classify_vehicle_color(frame, &vehicle.bbox, vehicle_type, &config.color).color;
            }
            result.load_status = load_status(detections, Some(&vehicle.bbox));

            let associated = associate_plate(detections, &vehicle.bbox);
            if associated.is_some() {
                state = PipelineState::VehicleWithPlate;
            }
            associated
        }
        None => {
            // Plate-only fallback: no vehicle in frame, but a plate detection
            // (or a whole-frame OCR attempt) can still yield an identifier.
            let fallback = fallback_plate(detections);
            if fallback.is_some() || !ocr_segments.is_empty() {
                state = PipelineState::PlateOnly;
            }
            fallback
        }
    };

    if let Some(plate) = plate_det {
        result.plate_color = classify_plate_color(frame, &plate.bbox, &config.color);
    }
    result.plate_text = plate_text::normalize_segments(ocr_segments);

    result.state = state;
    debug!(
        "fused frame: state={} vehicle={:?} load={} plate={:?}",
        state.as_str(),
        result.vehicle_type,
        result.load_status.as_str(),
        result.plate_text,
    );
    result
}

// ============================================================================
// TESTS
// ============================================================================

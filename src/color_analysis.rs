// src/color_analysis.rs
//
// HSV-based color classification for vehicle bodies and plate backgrounds.
//
// Whole-vehicle color averaging is dominated by cargo-bed and chassis pixels,
// so the vehicle classifier samples a type-specific cabin/hood sub-crop and
// votes in HSV space, which holds up under:
//   - Harsh midday sun and dusk shadow on open farm roads
//   - Dust-film desaturation on working vehicles
//   - Camera white-balance shifts between frames
//
// Plate background is a coarse saturation proxy: Indian plates are white
// (private) or yellow (commercial); saturation separates the two without OCR.

use tracing::debug;

use crate::geometry::BoundingBox;
use crate::types::{ColorConfig, FrameView, PlateColor, VehicleColor, VehicleType};

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// Outcome of vehicle-color analysis, with sampling diagnostics.
#[derive(Debug, Clone)]
pub struct VehicleColorAnalysis {
    pub color: VehicleColor,
    /// Fraction of cast hue votes held by the winning bucket [0, 1].
    pub vote_share: f32,
    /// Pixels surviving the shadow/glare value filter.
    pub samples: u32,
    pub avg_saturation: f32,
    pub avg_value: f32,
}

impl VehicleColorAnalysis {
    fn unknown(samples: u32) -> Self {
        Self {
            color: VehicleColor::Unknown,
            vote_share: 0.0,
            samples,
            avg_saturation: 0.0,
            avg_value: 0.0,
        }
    }
}

// ============================================================================
// HSV CONVERSION
// ============================================================================

/// Convert RGB to HSV on the OpenCV integer scales.
/// Returns (H: 0-180, S: 0-255, V: 0-255).
#[inline]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let r_n = r / 255.0;
    let g_n = g / 255.0;
    let b_n = b / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    // Hue in degrees, then halved to the OpenCV 0-180 range
    let h = if delta < 1e-6 {
        0.0
    } else if (max - r_n).abs() < 1e-6 {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if (max - g_n).abs() < 1e-6 {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let h = h / 2.0;

    // Saturation (0-255)
    let s = if max < 1e-6 {
        0.0
    } else {
        (delta / max) * 255.0
    };

    // Value (0-255)
    let v = max * 255.0;

    (h, s, v)
}

// ============================================================================
// CABIN REGION
// ============================================================================

/// Proportional cabin/hood sub-crop of a vehicle box, in absolute pixel
/// coordinates. The offsets are type-specific: the paint-bearing region sits
/// mid-body on a tractor and front-top on a truck. Bullock carts have no
/// painted cabin, so there is no defined region.
pub fn cabin_region(vehicle_box: &BoundingBox, vehicle_type: VehicleType) -> Option<BoundingBox> {
    let w = vehicle_box.width() as f32;
    let h = vehicle_box.height() as f32;

    let (fx1, fx2, fy1, fy2) = match vehicle_type {
        // Hood + steering area
        VehicleType::Tractor => (0.35, 0.70, 0.45, 0.75),
        // Front cabin only
        VehicleType::Truck => (0.25, 0.65, 0.20, 0.50),
        VehicleType::BullockCart => return None,
    };

    Some(BoundingBox::new(
        vehicle_box.x1 + (w * fx1) as i32,
        vehicle_box.y1 + (h * fy1) as i32,
        vehicle_box.x1 + (w * fx2) as i32,
        vehicle_box.y1 + (h * fy2) as i32,
    ))
}

// ============================================================================
// VEHICLE COLOR CLASSIFIER
// ============================================================================

/// Classify the body color of a vehicle from its bounding box region.
///
/// Samples the cabin sub-crop, filters shadow and specular-glare pixels by
/// value, then decides white/black from channel means and everything else by
/// hue-bucket voting. Any insufficient-signal condition resolves to
/// `VehicleColor::Unknown`, never an error.
pub fn classify_vehicle_color(
    frame: FrameView<'_>,
    vehicle_box: &BoundingBox,
    vehicle_type: VehicleType,
    cfg: &ColorConfig,
) -> VehicleColorAnalysis {
    let clamped = vehicle_box.clamp_to(frame.width, frame.height);
    if !clamped.is_valid() {
        return VehicleColorAnalysis::unknown(0);
    }

    let region = match cabin_region(&clamped, vehicle_type) {
        Some(r) if r.is_valid() => r.clamp_to(frame.width, frame.height),
        _ => return VehicleColorAnalysis::unknown(0),
    };
    if !region.is_valid() {
        return VehicleColorAnalysis::unknown(0);
    }

    let mut hues: Vec<f32> = Vec::new();
    let mut sats: Vec<f32> = Vec::new();
    let mut sum_s: f64 = 0.0;
    let mut sum_v: f64 = 0.0;
    let mut samples: u32 = 0;

    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let Some((r, g, b)) = frame.pixel(x as usize, y as usize) else {
                continue;
            };
            let (h, s, v) = rgb_to_hsv(r as f32, g as f32, b as f32);

            // Shadow and glare suppression
            if v <= cfg.value_min || v >= cfg.value_max {
                continue;
            }

            samples += 1;
            sum_s += s as f64;
            sum_v += v as f64;
            hues.push(h);
            sats.push(s);
        }
    }

    if samples < cfg.min_cabin_pixels {
        debug!(
            "vehicle color: only {} valid cabin pixels (need {}), giving UNKNOWN",
            samples, cfg.min_cabin_pixels
        );
        return VehicleColorAnalysis::unknown(samples);
    }

    let avg_s = (sum_s / samples as f64) as f32;
    let avg_v = (sum_v / samples as f64) as f32;

    // Achromatic verdicts come straight from the channel means
    if avg_s < cfg.white_max_saturation && avg_v > cfg.white_min_value {
        return VehicleColorAnalysis {
            color: VehicleColor::White,
            vote_share: 1.0,
            samples,
            avg_saturation: avg_s,
            avg_value: avg_v,
        };
    }
    if avg_v < cfg.black_max_value {
        return VehicleColorAnalysis {
            color: VehicleColor::Black,
            vote_share: 1.0,
            samples,
            avg_saturation: avg_s,
            avg_value: avg_v,
        };
    }

    // ----- HUE VOTING -----
    let mut votes_red: u32 = 0;
    let mut votes_yellow: u32 = 0;
    let mut votes_green: u32 = 0;
    let mut votes_blue: u32 = 0;

    for (&h, &s) in hues.iter().zip(sats.iter()) {
        if s < cfg.vote_min_saturation {
            continue;
        }

        if h < 10.0 || h > 165.0 {
            votes_red += 1;
        } else if (15.0..35.0).contains(&h) {
            votes_yellow += 1;
        } else if (40.0..80.0).contains(&h) {
            votes_green += 1;
        } else if (90.0..130.0).contains(&h) {
            votes_blue += 1;
        }
    }

    let total = votes_red + votes_yellow + votes_green + votes_blue;
    // Ties keep the earlier bucket.
    let mut winner = VehicleColor::Red;
    let mut winner_votes = votes_red;
    for (color, votes) in [
        (VehicleColor::Yellow, votes_yellow),
        (VehicleColor::Green, votes_green),
        (VehicleColor::Blue, votes_blue),
    ] {
        if votes > winner_votes {
            winner = color;
            winner_votes = votes;
        }
    }

    if total == 0 {
        return VehicleColorAnalysis {
            color: VehicleColor::Unknown,
            vote_share: 0.0,
            samples,
            avg_saturation: avg_s,
            avg_value: avg_v,
        };
    }

    let share = winner_votes as f32 / total as f32;
    let color = if share < cfg.min_vote_share {
        VehicleColor::Unknown
    } else {
        winner
    };

    debug!(
        "🎨 vehicle color: {} (share {:.0}%, {} samples, S̄={:.0} V̄={:.0})",
        color.as_str(),
        share * 100.0,
        samples,
        avg_s,
        avg_v,
    );

    VehicleColorAnalysis {
        color,
        vote_share: share,
        samples,
        avg_saturation: avg_s,
        avg_value: avg_v,
    }
}

// ============================================================================
// PLATE COLOR CLASSIFIER
// ============================================================================

/// Classify a plate's background color from mean saturation over the crop.
///
/// Coarse proxy, not OCR-verified: low saturation reads as a white private
/// plate, mid saturation as a yellow commercial plate, anything above as OTHER.
pub fn classify_plate_color(
    frame: FrameView<'_>,
    plate_box: &BoundingBox,
    cfg: &ColorConfig,
) -> PlateColor {
    let clamped = plate_box.clamp_to(frame.width, frame.height);
    if !clamped.is_valid() {
        return PlateColor::Unknown;
    }

    let mut sum_s: f64 = 0.0;
    let mut samples: u32 = 0;

    for y in clamped.y1..clamped.y2 {
        for x in clamped.x1..clamped.x2 {
            let Some((r, g, b)) = frame.pixel(x as usize, y as usize) else {
                continue;
            };
            let (_, s, _) = rgb_to_hsv(r as f32, g as f32, b as f32);
            sum_s += s as f64;
            samples += 1;
        }
    }

    if samples == 0 {
        return PlateColor::Unknown;
    }

    let avg_s = (sum_s / samples as f64) as f32;
    if avg_s < cfg.plate_white_max_saturation {
        PlateColor::White
    } else if avg_s < cfg.plate_yellow_max_saturation {
        PlateColor::Yellow
    } else {
        PlateColor::Other
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: usize, h: usize, rgb: (u8, u8, u8)) -> Vec<u8> {
        let mut img = vec![0u8; w * h * 3];
        for i in 0..w * h {
            img[i * 3] = rgb.0;
            img[i * 3 + 1] = rgb.1;
            img[i * 3 + 2] = rgb.2;
        }
        img
    }

    #[test]
    fn test_rgb_to_hsv_red() {
        let (h, s, v) = rgb_to_hsv(255.0, 0.0, 0.0);
        assert!(h.abs() < 1.0);
        assert!((s - 255.0).abs() < 1.0);
        assert!((v - 255.0).abs() < 1.0);
    }

    #[test]
    fn test_rgb_to_hsv_blue() {
        let (h, s, _) = rgb_to_hsv(0.0, 0.0, 255.0);
        assert!((h - 120.0).abs() < 1.0);
        assert!((s - 255.0).abs() < 1.0);
    }

    #[test]
    fn test_rgb_to_hsv_gray_has_zero_saturation() {
        let (_, s, v) = rgb_to_hsv(128.0, 128.0, 128.0);
        assert!(s < 1.0);
        assert!((v - 128.0).abs() < 1.0);
    }

    #[test]
    fn test_cabin_region_tractor_proportions() {
        let b = BoundingBox::new(0, 0, 100, 100);
        let r = cabin_region(&b, VehicleType::Tractor).unwrap();
        assert_eq!(r, BoundingBox::new(35, 45, 70, 75));
    }

    #[test]
    fn test_cabin_region_truck_proportions() {
        let b = BoundingBox::new(100, 200, 300, 400);
        let r = cabin_region(&b, VehicleType::Truck).unwrap();
        assert_eq!(r, BoundingBox::new(150, 240, 230, 300));
    }

    #[test]
    fn test_cabin_region_bullock_cart_undefined() {
        let b = BoundingBox::new(0, 0, 100, 100);
        assert!(cabin_region(&b, VehicleType::BullockCart).is_none());
    }

    #[test]
    fn test_classify_green_tractor() {
        // Saturated mid-value green fills the whole frame, so the cabin crop
        // sees it too.
        let w = 200;
        let h = 200;
        let img = solid_frame(w, h, (30, 160, 40));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let result =
            classify_vehicle_color(frame, &bbox, VehicleType::Tractor, &ColorConfig::default());
        assert_eq!(result.color, VehicleColor::Green);
        assert!(result.vote_share >= 0.40);
    }

    #[test]
    fn test_classify_white_truck() {
        let w = 200;
        let h = 200;
        let img = solid_frame(w, h, (210, 210, 210));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let result =
            classify_vehicle_color(frame, &bbox, VehicleType::Truck, &ColorConfig::default());
        assert_eq!(result.color, VehicleColor::White);
    }

    #[test]
    fn test_insufficient_pixels_gives_unknown() {
        // A 10x10 vehicle crop leaves a cabin region far below 120 pixels,
        // whatever the hue content.
        let w = 10;
        let h = 10;
        let img = solid_frame(w, h, (30, 160, 40));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let result =
            classify_vehicle_color(frame, &bbox, VehicleType::Tractor, &ColorConfig::default());
        assert_eq!(result.color, VehicleColor::Unknown);
        assert!(result.samples < 120);
    }

    #[test]
    fn test_glare_pixels_are_discarded() {
        // Near-saturated white is over the glare cut-off, so nothing survives.
        let w = 200;
        let h = 200;
        let img = solid_frame(w, h, (245, 245, 245));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let result =
            classify_vehicle_color(frame, &bbox, VehicleType::Truck, &ColorConfig::default());
        assert_eq!(result.color, VehicleColor::Unknown);
        assert_eq!(result.samples, 0);
    }

    #[test]
    fn test_plate_color_gray_is_white() {
        let w = 40;
        let h = 20;
        let img = solid_frame(w, h, (180, 180, 180));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let color = classify_plate_color(frame, &bbox, &ColorConfig::default());
        assert_eq!(color, PlateColor::White);
    }

    #[test]
    fn test_plate_color_saturated_is_other() {
        // (60, 200, 60): S = (1 - 60/200) * 255 = 178, past the yellow band.
        let w = 40;
        let h = 20;
        let img = solid_frame(w, h, (60, 200, 60));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let color = classify_plate_color(frame, &bbox, &ColorConfig::default());
        assert_eq!(color, PlateColor::Other);
    }

    #[test]
    fn test_plate_color_mid_saturation_is_yellow() {
        // (200, 190, 130): S = (1 - 130/200) * 255 ≈ 89, inside 50..120.
        let w = 40;
        let h = 20;
        let img = solid_frame(w, h, (200, 190, 130));
        let frame = FrameView::new(&img, w, h);
        let bbox = BoundingBox::new(0, 0, w as i32, h as i32);
        let color = classify_plate_color(frame, &bbox, &ColorConfig::default());
        assert_eq!(color, PlateColor::Yellow);
    }

    #[test]
    fn test_plate_color_empty_crop_is_unknown() {
        let img = solid_frame(10, 10, (180, 180, 180));
        let frame = FrameView::new(&img, 10, 10);
        // Entirely outside the frame, clamps to a degenerate box.
        let bbox = BoundingBox::new(50, 50, 60, 60);
        let color = classify_plate_color(frame, &bbox, &ColorConfig::default());
        assert_eq!(color, PlateColor::Unknown);
    }
}

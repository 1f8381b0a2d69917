use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub color: ColorConfig,
    #[serde(default)]
    pub class_confidence: ClassConfidenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub truck_bias: f32,
    pub tractor_aspect_threshold: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            truck_bias: 0.15,
            tractor_aspect_threshold: 1.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    pub value_min: f32,
    pub value_max: f32,
    pub min_cabin_pixels: u32,
    pub white_max_saturation: f32,
    pub white_min_value: f32,
    pub black_max_value: f32,
    pub vote_min_saturation: f32,
    pub min_vote_share: f32,
    pub plate_white_max_saturation: f32,
    pub plate_yellow_max_saturation: f32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            value_min: 70.0,
            value_max: 230.0,
            min_cabin_pixels: 120,
            white_max_saturation: 35.0,
            white_min_value: 170.0,
            black_max_value: 80.0,
            vote_min_saturation: 45.0,
            min_vote_share: 0.40,
            plate_white_max_saturation: 50.0,
            plate_yellow_max_saturation: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfidenceConfig {
    pub tractor: f32,
    pub truck: f32,
    pub bullock_cart: f32,
    pub plate: f32,
    pub cargo: f32,
}

impl Default for ClassConfidenceConfig {
    fn default() -> Self {
        // Cargo runs lower because loose loads are visually complex.
        Self {
            tractor: 0.40,
            truck: 0.40,
            bullock_cart: 0.40,
            plate: 0.30,
            cargo: 0.20,
        }
    }
}

impl ClassConfidenceConfig {
    pub fn floor(&self, class: DetectionClass) -> f32 {
        match class {
            DetectionClass::Tractor => self.tractor,
            DetectionClass::Truck => self.truck,
            DetectionClass::BullockCart => self.bullock_cart,
            DetectionClass::Plate => self.plate,
            DetectionClass::Cargo => self.cargo,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Read-only view over one frame's RGB pixels (HWC, 3 bytes per pixel).
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> FrameView<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// RGB triple at (x, y), or None when out of bounds or the buffer is short.
    pub fn pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        if idx + 2 >= self.data.len() {
            return None;
        }
        Some((self.data[idx], self.data[idx + 1], self.data[idx + 2]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionClass {
    Tractor,
    Truck,
    BullockCart,
    Plate,
    Cargo,
}

impl DetectionClass {
    pub fn is_vehicle(&self) -> bool {
        matches!(
            self,
            DetectionClass::Tractor | DetectionClass::Truck | DetectionClass::BullockCart
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionClass::Tractor => "tractor",
            DetectionClass::Truck => "truck",
            DetectionClass::BullockCart => "bullock_cart",
            DetectionClass::Plate => "plate",
            DetectionClass::Cargo => "cargo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class: DetectionClass,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Tractor,
    Truck,
    BullockCart,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Tractor => "tractor",
            VehicleType::Truck => "truck",
            VehicleType::BullockCart => "bullock_cart",
        }
    }

    pub fn from_class(class: DetectionClass) -> Option<Self> {
        match class {
            DetectionClass::Tractor => Some(VehicleType::Tractor),
            DetectionClass::Truck => Some(VehicleType::Truck),
            DetectionClass::BullockCart => Some(VehicleType::BullockCart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleColor {
    White,
    Black,
    Red,
    Green,
    Blue,
    Yellow,
    Unknown,
}

impl VehicleColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleColor::White => "WHITE",
            VehicleColor::Black => "BLACK",
            VehicleColor::Red => "RED",
            VehicleColor::Green => "GREEN",
            VehicleColor::Blue => "BLUE",
            VehicleColor::Yellow => "YELLOW",
            VehicleColor::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlateColor {
    White,
    Yellow,
    Other,
    Unknown,
}

impl PlateColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlateColor::White => "WHITE",
            PlateColor::Yellow => "YELLOW",
            PlateColor::Other => "OTHER",
            PlateColor::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadStatus {
    Empty,
    Loaded,
    Unknown,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Empty => "EMPTY",
            LoadStatus::Loaded => "LOADED",
            LoadStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Terminal state of one fusion pass over a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    NoVehicle,
    VehicleOnly,
    VehicleWithPlate,
    PlateOnly,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::NoVehicle => "NO_VEHICLE",
            PipelineState::VehicleOnly => "VEHICLE_ONLY",
            PipelineState::VehicleWithPlate => "VEHICLE_WITH_PLATE",
            PipelineState::PlateOnly => "PLATE_ONLY",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    pub vehicle_present: bool,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_color: VehicleColor,
    pub load_status: LoadStatus,
    pub plate_text: Option<String>,
    pub plate_color: PlateColor,
    pub state: PipelineState,
}

impl FusedResult {
    /// The record every frame starts from: nothing seen, everything unknown.
    pub fn empty() -> Self {
        Self {
            vehicle_present: false,
            vehicle_type: None,
            vehicle_color: VehicleColor::Unknown,
            load_status: LoadStatus::Unknown,
            plate_text: None,
            plate_color: PlateColor::Unknown,
            state: PipelineState::NoVehicle,
        }
    }
}

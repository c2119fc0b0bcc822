use serde::{Deserialize, Serialize};

/// Axis-aligned detection rectangle in the source video's pixel grid.
///
/// Only meaningful against the intrinsic frame size it was produced for; map
/// it through the current overlay transform on every render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl DetectionBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

impl From<[f32; 4]> for DetectionBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<DetectionBox> for [f32; 4] {
    fn from(detection: DetectionBox) -> Self {
        [detection.x1, detection.y1, detection.x2, detection.y2]
    }
}

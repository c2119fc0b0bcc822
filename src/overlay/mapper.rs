use crate::common::DetectionBox;

/// A rectangle in destination (rendered) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Uniform scale plus offset taking source-pixel coordinates onto the
/// letterboxed rendering of the frame inside the destination box.
///
/// The offset is relative to the destination box's own origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl OverlayTransform {
    pub const IDENTITY: OverlayTransform = OverlayTransform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    pub fn apply_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.offset_x,
            y * self.scale + self.offset_y,
        )
    }

    /// Maps a detection box into coordinates relative to the destination
    /// box's origin.
    pub fn apply_box(&self, detection: &DetectionBox) -> Rect {
        let (x, y) = self.apply_point(detection.x1, detection.y1);
        Rect::new(
            x,
            y,
            detection.width() * self.scale,
            detection.height() * self.scale,
        )
    }
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn usable(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Fit-without-cropping transform for a `source_width` x `source_height`
/// frame rendered inside `dest`.
///
/// A source with a non-positive or non-finite side maps with the identity
/// transform. A destination side that is not usable counts as zero, which
/// collapses the overlay to a scale of zero instead of producing NaN.
pub fn compute_transform(source_width: f32, source_height: f32, dest: Rect) -> OverlayTransform {
    if !usable(source_width) || !usable(source_height) {
        return OverlayTransform::IDENTITY;
    }
    let dest_width = if usable(dest.width) { dest.width } else { 0.0 };
    let dest_height = if usable(dest.height) { dest.height } else { 0.0 };

    let scale = (dest_width / source_width).min(dest_height / source_height);
    if !scale.is_finite() {
        return OverlayTransform::IDENTITY;
    }

    OverlayTransform {
        scale,
        offset_x: (dest_width - source_width * scale) / 2.0,
        offset_y: (dest_height - source_height * scale) / 2.0,
    }
}

/// Caches the overlay transform and recomputes it whenever the frame's
/// intrinsic size or the video element's rendered box changes.
#[derive(Debug, Clone, Default)]
pub struct CoordinateMapper {
    source: Option<(f32, f32)>,
    dest: Option<Rect>,
    transform: OverlayTransform,
}

impl CoordinateMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> OverlayTransform {
        self.transform
    }

    pub fn source_size(&self) -> Option<(f32, f32)> {
        self.source
    }

    /// Returns `true` when the size differed and the transform was refreshed.
    pub fn set_source_size(&mut self, width: f32, height: f32) -> bool {
        if self.source == Some((width, height)) {
            return false;
        }
        self.source = Some((width, height));
        self.recompute();
        true
    }

    /// Returns `true` when the box differed and the transform was refreshed.
    pub fn set_dest_rect(&mut self, dest: Rect) -> bool {
        if self.dest == Some(dest) {
            return false;
        }
        self.dest = Some(dest);
        self.recompute();
        true
    }

    /// Maps boxes against the current transform, in absolute destination
    /// coordinates. Call once per render pass; do not keep the result.
    pub fn map_boxes(&self, boxes: &[DetectionBox]) -> Vec<Rect> {
        let origin = self.dest.unwrap_or_default();
        boxes
            .iter()
            .map(|detection| {
                let rect = self.transform.apply_box(detection);
                Rect::new(origin.x + rect.x, origin.y + rect.y, rect.width, rect.height)
            })
            .collect()
    }

    fn recompute(&mut self) {
        // Until the frame size is known there is nothing to letterbox.
        self.transform = match (self.source, self.dest) {
            (Some((width, height)), Some(dest)) => compute_transform(width, height, dest),
            _ => OverlayTransform::IDENTITY,
        };
    }
}

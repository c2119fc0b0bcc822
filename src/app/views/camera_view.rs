use chrono::{DateTime, Utc};
use egui::{Align2, Color32, FontId, Sense, Stroke, StrokeKind, TextureOptions};
use uuid::Uuid;

use crate::app::views::{View, ACCENT};
use crate::common::DetectionBox;
use crate::overlay::{CoordinateMapper, Rect, VideoFrame};

/// Live scanner feed with the backend's detection boxes drawn on top.
pub struct CameraView {
    mapper: CoordinateMapper,
    frame: Option<VideoFrame>,
    uploaded: Option<(Uuid, DateTime<Utc>)>,
    texture: Option<egui::TextureHandle>,
    detections: Vec<DetectionBox>,
}

impl CameraView {
    pub fn new() -> Self {
        Self {
            mapper: CoordinateMapper::new(),
            frame: None,
            uploaded: None,
            texture: None,
            detections: Vec::new(),
        }
    }

    pub fn update(&mut self, frame: Option<VideoFrame>, detections: &[DetectionBox]) {
        self.frame = frame;
        self.detections.clear();
        self.detections.extend_from_slice(detections);
    }

    /// Drops the uploaded texture once the feed is gone.
    pub fn clear(&mut self) {
        self.frame = None;
        self.uploaded = None;
        self.texture = None;
    }

    fn upload(&mut self, ctx: &egui::Context, frame: &VideoFrame) {
        let stamp = (frame.session_id(), frame.captured_at());
        if self.uploaded == Some(stamp) && self.texture.is_some() {
            return;
        }
        let (width, height) = frame.size();
        let color_image = egui::ColorImage::from_rgb(
            [width as usize, height as usize],
            frame.image().as_raw().as_slice(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("camera_feed", color_image, TextureOptions::LINEAR))
            }
        }
        self.uploaded = Some(stamp);
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for CameraView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        let (area, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(area);
        painter.rect_filled(area, 8.0, Color32::BLACK);

        let Some(frame) = self.frame.clone() else {
            painter.text(
                area.center(),
                Align2::CENTER_CENTER,
                "Waiting for camera...",
                FontId::proportional(24.0),
                Color32::GRAY,
            );
            return;
        };

        let (width, height) = frame.size();
        self.mapper.set_source_size(width as f32, height as f32);
        self.mapper
            .set_dest_rect(Rect::new(area.min.x, area.min.y, area.width(), area.height()));
        self.upload(ui.ctx(), &frame);

        let transform = self.mapper.transform();
        let content = egui::Rect::from_min_size(
            area.min + egui::vec2(transform.offset_x, transform.offset_y),
            egui::vec2(width as f32 * transform.scale, height as f32 * transform.scale),
        );
        if let Some(texture) = &self.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), content, uv, Color32::WHITE);
        }

        // Mapped fresh each pass so a resize never shows stale geometry.
        for rect in self.mapper.map_boxes(&self.detections) {
            let outline = egui::Rect::from_min_size(
                egui::pos2(rect.x, rect.y),
                egui::vec2(rect.width, rect.height),
            );
            painter.rect_stroke(outline, 4.0, Stroke::new(3.0, ACCENT), StrokeKind::Inside);
        }
    }
}

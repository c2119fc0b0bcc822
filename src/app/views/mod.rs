pub mod camera_view;
pub mod debug_view;
pub mod description_view;
pub mod scene_view;

/// A panel of the kiosk window, redrawn every frame.
pub trait View {
    fn draw(&mut self, ui: &mut egui::Ui);
}

/// Accent used for highlights, borders and detection boxes.
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(0xA1, 0x00, 0xFF);

use egui::{Color32, RichText};

use crate::app::views::{View, ACCENT};
use crate::content::Description;
use crate::presentation::ConnectorDirection;

/// Title, body and illustration for the current phase, with the connector
/// wire pointing at the scanner or at the result panels.
pub struct DescriptionView {
    description: Description,
    connector: Option<ConnectorDirection>,
}

impl DescriptionView {
    pub fn new() -> Self {
        Self {
            description: Description::default(),
            connector: None,
        }
    }

    pub fn update(&mut self, description: &Description, connector: Option<ConnectorDirection>) {
        if self.description != *description {
            self.description = description.clone();
        }
        self.connector = connector;
    }
}

impl Default for DescriptionView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for DescriptionView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        let Some(connector) = self.connector else {
            return;
        };
        ui.horizontal_top(|ui| {
            let wire = match connector {
                ConnectorDirection::Down => "\u{2198}",
                ConnectorDirection::Up => "\u{2197}",
            };
            ui.label(RichText::new(wire).size(48.0).color(ACCENT));
            ui.vertical(|ui| {
                ui.label(
                    RichText::new(&self.description.title)
                        .size(36.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.add_space(12.0);
                ui.label(
                    RichText::new(&self.description.body)
                        .size(28.0)
                        .color(Color32::WHITE),
                );
                if let Some(image) = &self.description.image {
                    ui.add_space(48.0);
                    ui.add(
                        egui::Image::from_bytes(
                            format!("bytes://{}", image.uri),
                            image.bytes.clone(),
                        )
                        .max_width(ui.available_width() * 2.0 / 3.0)
                        .maintain_aspect_ratio(true),
                    );
                }
            });
        });
    }
}

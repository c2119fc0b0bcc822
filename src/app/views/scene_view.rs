use egui::{Color32, RichText, Stroke};

use crate::app::views::{View, ACCENT};
use crate::common::ItemTag;
use crate::content::{ItemResult, Retrieval};
use crate::presentation::SceneLayout;

const MUTED: Color32 = Color32::from_gray(0x9c);

/// Upper half of the display: intro banner, loading prompt, item indicator.
pub struct TopDisplay {
    layout: SceneLayout,
}

impl TopDisplay {
    pub fn new() -> Self {
        Self {
            layout: SceneLayout::default(),
        }
    }

    pub fn update(&mut self, layout: &SceneLayout) {
        self.layout = layout.clone();
    }
}

impl Default for TopDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TopDisplay {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            if self.layout.intro {
                ui.add_space(24.0);
                ui.label(
                    RichText::new(SceneLayout::INTRO_TITLE)
                        .size(56.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.label(RichText::new(SceneLayout::INTRO_SUBTITLE).size(28.0).color(MUTED));
            }
            if self.layout.loading_prompt {
                ui.add_space(32.0);
                for line in SceneLayout::LOADING_PROMPT {
                    ui.label(RichText::new(line).size(32.0).color(Color32::WHITE));
                }
            }
            if let Some(indicator) = self.layout.item_indicator {
                ui.add_space(32.0);
                egui::Frame::new()
                    .stroke(Stroke::new(2.0, ACCENT))
                    .corner_radius(8.0)
                    .inner_margin(16.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(indicator).size(32.0).color(ACCENT));
                    });
            }
        });
    }
}

/// Side panels that follow the scan timeline: cloud upload,
/// identification, retrieved files and the result arrows.
pub struct StageView {
    layout: SceneLayout,
    tag: Option<ItemTag>,
    retrieval: Retrieval,
    item_result: Option<ItemResult>,
}

impl StageView {
    pub fn new() -> Self {
        Self {
            layout: SceneLayout::default(),
            tag: None,
            retrieval: Retrieval::Idle,
            item_result: None,
        }
    }

    pub fn update(
        &mut self,
        layout: &SceneLayout,
        tag: Option<&ItemTag>,
        retrieval: &Retrieval,
        item_result: Option<ItemResult>,
    ) {
        self.layout = layout.clone();
        self.tag = tag.cloned();
        if self.retrieval != *retrieval {
            self.retrieval = retrieval.clone();
        }
        self.item_result = item_result;
    }

    fn panel(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::new()
            .fill(Color32::from_black_alpha(180))
            .stroke(Stroke::new(1.0, ACCENT.gamma_multiply(0.5)))
            .corner_radius(12.0)
            .inner_margin(20.0)
            .show(ui, |ui| {
                ui.label(RichText::new(title).size(26.0).strong().color(Color32::WHITE));
                ui.add_space(12.0);
                add_contents(ui);
            });
        ui.add_space(16.0);
    }

    fn draw_retrieval(&self, ui: &mut egui::Ui) {
        Self::panel(ui, "Retrieved data", |ui| match &self.retrieval {
            Retrieval::Idle => {}
            Retrieval::Loading => {
                ui.label(RichText::new("Loading files...").color(MUTED));
            }
            Retrieval::Error => {
                ui.label(RichText::new("Couldn't read RetrievedData.txt.").color(MUTED));
            }
            Retrieval::Ready(rows) if rows.is_empty() => {
                ui.label(RichText::new("No files found.").color(MUTED));
            }
            Retrieval::Ready(rows) => {
                for row in rows {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(row.kind.label()).small().color(ACCENT));
                        ui.hyperlink_to(RichText::new(&row.name).size(20.0), &row.href);
                    });
                }
            }
        });
    }

    fn draw_arrows(&self, ui: &mut egui::Ui) {
        Self::panel(ui, "Result", |ui| {
            for outcome in ItemResult::ALL {
                let highlighted = self.item_result == Some(outcome);
                let (marker, color) = if highlighted {
                    ("\u{2192}", ACCENT)
                } else {
                    ("\u{21e2}", MUTED)
                };
                ui.label(
                    RichText::new(format!("{} {}", marker, outcome))
                        .size(if highlighted { 32.0 } else { 24.0 })
                        .color(color),
                );
            }
        });
    }
}

impl Default for StageView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for StageView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        if self.layout.cloud_upload {
            Self::panel(ui, "Uploading scan", |ui| {
                ui.add(egui::Spinner::new().size(32.0).color(ACCENT));
            });
        }
        if self.layout.identification {
            let tag = self
                .tag
                .as_ref()
                .map(|tag| tag.to_string())
                .unwrap_or_else(|| "Unknown item".to_string());
            Self::panel(ui, "Identification", |ui| {
                ui.label(RichText::new(tag).size(28.0).color(ACCENT));
            });
        }
        if self.layout.retrieval {
            self.draw_retrieval(ui);
        }
        if self.layout.result_arrows {
            self.draw_arrows(ui);
        }
    }
}

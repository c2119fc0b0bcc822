use egui::{Color32, Margin};

use crate::app::views::{
    camera_view::CameraView,
    debug_view::DebugView,
    description_view::DescriptionView,
    scene_view::{StageView, TopDisplay},
    View,
};
use crate::config::Settings;
use crate::coordinator::KioskHandles;
use crate::error::AppError;
use crate::overlay::CameraFeed;
use crate::presentation::SceneLayout;

const WINDOW_TITLE: &str = "Inspection Kiosk";

/// Full-screen kiosk window. Everything drawn is derived from the latest
/// presentation and content snapshots; the only state kept here is the
/// camera session and the views' render caches.
pub struct KioskApp {
    handles: KioskHandles,
    camera: CameraFeed,
    top_display: TopDisplay,
    camera_view: CameraView,
    description_view: DescriptionView,
    stage_view: StageView,
    debug_view: Option<DebugView>,
}

impl KioskApp {
    pub fn new(cc: &eframe::CreationContext<'_>, handles: KioskHandles, settings: &Settings) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let debug_view = settings
            .debug
            .enabled
            .then(|| DebugView::new(handles.debug_tx.clone()));
        Self {
            handles,
            camera: CameraFeed::new(settings.camera.clone()),
            top_display: TopDisplay::new(),
            camera_view: CameraView::new(),
            description_view: DescriptionView::new(),
            stage_view: StageView::new(),
            debug_view,
        }
    }

    /// Runs the window on the calling thread until it is closed.
    pub fn start_gui(settings: &Settings, handles: KioskHandles) -> Result<(), AppError> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(settings.display.width, settings.display.height))
                .with_fullscreen(settings.display.fullscreen)
                .with_title(WINDOW_TITLE),
            ..Default::default()
        };

        let settings = settings.clone();
        eframe::run_native(
            WINDOW_TITLE,
            options,
            Box::new(move |cc| Ok(Box::new(KioskApp::new(cc, handles, &settings)))),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }
}

impl eframe::App for KioskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let presentation = self.handles.presentation.borrow_and_update().clone();
        let content = self.handles.content.borrow_and_update().clone();
        let layout = SceneLayout::from(&presentation);

        if self.camera.sync(layout.camera_feed) {
            self.camera_view.clear();
        }
        let frame = self.camera.latest();
        self.camera_view.update(frame, &presentation.detections);
        self.top_display.update(&layout);
        self.description_view
            .update(&content.description, layout.description);
        self.stage_view.update(
            &layout,
            presentation.tag.as_ref(),
            &content.retrieval,
            content.item_result,
        );

        if let Some(debug_view) = &mut self.debug_view {
            debug_view.update(&presentation);
            egui::TopBottomPanel::bottom("debug_panel").show(ctx, |ui| {
                debug_view.draw(ui);
            });
        }

        let backdrop = egui::Frame::new()
            .fill(Color32::BLACK)
            .inner_margin(Margin::same(32));

        egui::TopBottomPanel::top("top_display")
            .frame(backdrop)
            .show(ctx, |ui| {
                self.top_display.draw(ui);
            });

        egui::SidePanel::right("stage_panel")
            .frame(backdrop)
            .exact_width(ctx.screen_rect().width() * 0.3)
            .show(ctx, |ui| {
                self.stage_view.draw(ui);
            });

        egui::CentralPanel::default().frame(backdrop).show(ctx, |ui| {
            ui.columns(2, |columns| {
                if layout.camera_feed {
                    self.camera_view.draw(&mut columns[0]);
                }
                self.description_view.draw(&mut columns[1]);
            });
        });

        ctx.request_repaint();
    }
}

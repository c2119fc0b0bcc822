use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

use crate::app::views::View;
use crate::presentation::{DebugCommand, Presentation};

/// Operator strip: current tuple plus manual stepping controls.
pub struct DebugView {
    debug_tx: mpsc::Sender<DebugCommand>,
    snapshot: Presentation,
}

impl DebugView {
    pub fn new(debug_tx: mpsc::Sender<DebugCommand>) -> Self {
        Self {
            debug_tx,
            snapshot: Presentation::default(),
        }
    }

    pub fn update(&mut self, snapshot: &Presentation) {
        if self.snapshot != *snapshot {
            self.snapshot = snapshot.clone();
        }
    }

    fn send(&self, command: DebugCommand) {
        match self.debug_tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => warn!("Debug queue full, dropped {:?}", command),
            Err(TrySendError::Closed(_)) => error!("Presentation router is gone"),
        }
    }
}

impl View for DebugView {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!(
                "state: {}  phase: {}  tag: {}  boxes: {}",
                self.snapshot.state,
                self.snapshot.phase,
                self.snapshot
                    .tag
                    .as_ref()
                    .map(|tag| tag.as_str())
                    .unwrap_or("-"),
                self.snapshot.detections.len()
            ));
            ui.separator();
            if ui.button("\u{25c0} State").clicked() {
                self.send(DebugCommand::PreviousState);
            }
            if ui.button("State \u{25b6}").clicked() {
                self.send(DebugCommand::NextState);
            }
            ui.separator();
            if ui.button("\u{25c0} Phase").clicked() {
                self.send(DebugCommand::PreviousPhase);
            }
            if ui.button("Phase \u{25b6}").clicked() {
                self.send(DebugCommand::NextPhase);
            }
            if ui.button("Clear tag").clicked() {
                self.send(DebugCommand::SetTag(None));
            }
        });
    }
}

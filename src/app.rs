use std::sync::mpsc;
use std::time::Instant;

use crate::errors::{Result, INVALID_IMAGE_MESSAGE};
use crate::messages::{WorkerCommand, WorkerResult};
use crate::selection::pick_image;
use crate::status::StatusController;
use crate::traits::BackgroundRemovalModel;
use crate::worker::{spawn_worker, WorkerHandle};

pub const APP_TITLE: &str = "Background Remover";
const HEADING: &str = "Pick an image to convert to PNG without background:";

pub struct BackgroundRemoverApp {
    worker: WorkerHandle,
    result_rx: mpsc::Receiver<WorkerResult>,
    status: StatusController,
    show_invalid_dialog: bool,
}

impl BackgroundRemoverApp {
    pub fn new<M>(ctx: &egui::Context, model: M) -> Result<Self>
    where
        M: BackgroundRemovalModel + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel();
        let worker = spawn_worker(model, result_tx, ctx.clone())?;

        Ok(Self {
            worker,
            result_rx,
            status: StatusController::new(),
            show_invalid_dialog: false,
        })
    }

    /// Drain all pending results from the worker.
    fn poll_results(&mut self, now: Instant) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                WorkerResult::InvalidImage { path } => {
                    tracing::debug!(path = %path.display(), "showing invalid image dialog");
                    self.show_invalid_dialog = true;
                }
                WorkerResult::Started { request } => {
                    tracing::debug!(source = %request.source.display(), "conversion started");
                    self.status.start_processing(now);
                }
                WorkerResult::Converted { .. } => self.status.succeed(now),
                WorkerResult::Failed { message, .. } => self.status.fail(message),
            }
        }
    }

    /// The select button is locked while the invalid-image modal is open.
    const fn select_enabled(&self) -> bool {
        !self.show_invalid_dialog
    }

    fn dismiss_invalid_dialog(&mut self) {
        self.show_invalid_dialog = false;
    }

    fn open_file_dialog(&self) {
        let Some(cmd_tx) = self.worker.sender() else {
            return;
        };
        // The dialog blocks; keep it off the UI thread.
        let spawned = std::thread::Builder::new()
            .name("bg-remover-dialog".into())
            .spawn(move || {
                if let Some(path) = pick_image() {
                    let _ = cmd_tx.send(WorkerCommand::Select { path });
                }
            });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "failed to open file dialog");
        }
    }

    fn show_main_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let content_height = 160.0;
            ui.add_space(((ui.available_height() - content_height) / 2.0).max(0.0));

            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(HEADING).size(24.0));
                ui.add_space(16.0);

                let button = egui::Button::new(egui::RichText::new("Select Image").size(18.0));
                if ui
                    .add_enabled_ui(self.select_enabled(), |ui| {
                        ui.add_sized([250.0, 60.0], button)
                    })
                    .inner
                    .clicked()
                {
                    self.open_file_dialog();
                }

                ui.add_space(16.0);
                ui.label(egui::RichText::new(self.status.text()).size(18.0));
            });
        });
    }

    fn invalid_image_dialog(&mut self, ctx: &egui::Context) {
        if !self.show_invalid_dialog {
            return;
        }
        egui::Window::new("Invalid image")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(INVALID_IMAGE_MESSAGE);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.dismiss_invalid_dialog();
                    }
                });
            });
    }
}

impl eframe::App for BackgroundRemoverApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_results(now);
        self.status.tick(now);

        if ctx.input(|i| i.viewport().close_requested()) {
            tracing::info!("window close requested, stopping worker");
            self.worker.shutdown();
        }

        self.show_main_panel(ctx);
        self.invalid_image_dialog(ctx);

        if let Some(deadline) = self.status.next_deadline(now) {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

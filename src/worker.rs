use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::converter::{ConversionRequest, Converter};
use crate::error_log::ErrorLog;
use crate::errors::{BgRemoverError, Result};
use crate::messages::{WorkerCommand, WorkerResult};
use crate::selection::validate_image;
use crate::traits::BackgroundRemovalModel;

/// Owns the worker thread. Dropping it runs the shutdown sequence.
pub struct WorkerHandle {
    cmd_tx: Option<mpsc::Sender<WorkerCommand>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// A sender for threads that need to submit commands, e.g. the file dialog.
    pub fn sender(&self) -> Option<mpsc::Sender<WorkerCommand>> {
        self.cmd_tx.clone()
    }

    pub fn send(&self, cmd: WorkerCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(cmd);
        }
    }

    /// Asks the worker to stop and waits for it. An in-flight conversion is
    /// allowed to finish first. Calling it twice is harmless.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WorkerCommand::Shutdown);
        }
        if let Some(thread) = self.thread.take() {
            tracing::debug!("waiting for worker thread");
            if thread.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the worker thread that validates and converts picked files.
pub fn spawn_worker<M>(
    model: M,
    result_tx: mpsc::Sender<WorkerResult>,
    ctx: egui::Context,
) -> Result<WorkerHandle>
where
    M: BackgroundRemovalModel + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();

    let thread = std::thread::Builder::new()
        .name("bg-remover-worker".into())
        .spawn(move || {
            worker_loop(Converter::new(model), cmd_rx, result_tx, ctx);
        })
        .map_err(|e| BgRemoverError::Configuration {
            message: format!("failed to spawn worker thread: {e}"),
        })?;

    Ok(WorkerHandle {
        cmd_tx: Some(cmd_tx),
        thread: Some(thread),
    })
}

fn send(tx: &mpsc::Sender<WorkerResult>, ctx: &egui::Context, result: WorkerResult) {
    let _ = tx.send(result);
    ctx.request_repaint();
}

fn worker_loop<M: BackgroundRemovalModel>(
    converter: Converter<M>,
    cmd_rx: mpsc::Receiver<WorkerCommand>,
    result_tx: mpsc::Sender<WorkerResult>,
    ctx: egui::Context,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            WorkerCommand::Select { path } => {
                handle_selection(&converter, &path, &result_tx, &ctx);
            }
            WorkerCommand::Shutdown => break,
        }
    }
    tracing::debug!("worker loop finished");
}

fn handle_selection<M: BackgroundRemovalModel>(
    converter: &Converter<M>,
    path: &Path,
    tx: &mpsc::Sender<WorkerResult>,
    ctx: &egui::Context,
) {
    tracing::info!(path = %path.display(), "image selected");

    if let Err(err) = validate_image(path) {
        tracing::warn!(error = %err.report(), "rejected invalid image");
        send(
            tx,
            ctx,
            WorkerResult::InvalidImage {
                path: path.to_path_buf(),
            },
        );
        return;
    }

    let request = ConversionRequest::new(path);
    send(
        tx,
        ctx,
        WorkerResult::Started {
            request: request.clone(),
        },
    );

    match converter.convert(&request) {
        Ok(outcome) => {
            tracing::info!(
                output = %outcome.request.output.display(),
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "background removed"
            );
            send(tx, ctx, WorkerResult::Converted { outcome });
        }
        Err(err) => {
            tracing::error!(kind = %err.kind(), error = %err.report(), "conversion failed");
            let log = ErrorLog::for_image(&request.source);
            if let Err(log_err) = log.append(&err) {
                tracing::error!(
                    path = %log.path().display(),
                    error = %log_err,
                    "failed to write error backlog"
                );
            }
            send(
                tx,
                ctx,
                WorkerResult::Failed {
                    request,
                    kind: err.kind(),
                    message: err.status_message(),
                },
            );
        }
    }
}

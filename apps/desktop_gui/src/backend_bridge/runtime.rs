//! Backend worker: owns the tokio runtime and the shared HTTP client.
//!
//! One OS thread runs the command loop; each command is served on its own
//! task so a slow accuracy test never blocks a correction. Per-operation
//! mutexes carry the request lifecycle: a trigger that arrives while its
//! operation is still in flight fails the `try_lock` and is dropped, which
//! matches the disabled trigger control on the UI side.

use std::{sync::Arc, thread};

use client_core::render::{AccuracyDisplay, SampleSetDisplay};
use client_core::{ops, Operation, OperationView, SpellServiceClient};
use crossbeam_channel::{Receiver, Sender};
use shared::protocol::{CorrectResponse, DatasetStats};
use tokio::sync::Mutex;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{Panel, UiEvent};

/// Renders an operation by forwarding display events to the egui thread.
/// A full or disconnected queue drops the event; a dropped busy exit would
/// leave a trigger disabled, so every drop is logged.
struct ChannelView {
    panel: Panel,
    ui_tx: Sender<UiEvent>,
}

impl ChannelView {
    fn send(&self, event: UiEvent) {
        if let Err(err) = self.ui_tx.try_send(event) {
            tracing::warn!(panel = ?self.panel, "ui event dropped: {err}");
        }
    }

    fn busy(&self, busy: bool) {
        self.send(UiEvent::Busy {
            panel: self.panel,
            busy,
        });
    }

    fn empty(&self, message: &str) {
        self.send(UiEvent::EmptyRendered {
            panel: self.panel,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.send(UiEvent::ErrorRendered {
            panel: self.panel,
            message: message.to_string(),
        });
    }
}

impl OperationView<CorrectResponse> for ChannelView {
    fn set_busy(&mut self, busy: bool) {
        self.busy(busy);
    }

    fn render_result(&mut self, result: &CorrectResponse) {
        self.send(UiEvent::CorrectionRendered(result.clone()));
    }

    fn render_empty(&mut self, message: &str) {
        self.empty(message);
    }

    fn render_error(&mut self, message: &str) {
        self.error(message);
    }
}

impl OperationView<DatasetStats> for ChannelView {
    fn set_busy(&mut self, busy: bool) {
        self.busy(busy);
    }

    fn render_result(&mut self, result: &DatasetStats) {
        self.send(UiEvent::StatsRendered(result.clone()));
    }

    fn render_empty(&mut self, message: &str) {
        self.empty(message);
    }

    fn render_error(&mut self, message: &str) {
        self.error(message);
    }
}

impl OperationView<SampleSetDisplay> for ChannelView {
    fn set_busy(&mut self, busy: bool) {
        self.busy(busy);
    }

    fn render_result(&mut self, result: &SampleSetDisplay) {
        self.send(UiEvent::SamplesRendered(result.clone()));
    }

    fn render_empty(&mut self, message: &str) {
        self.empty(message);
    }

    fn render_error(&mut self, message: &str) {
        self.error(message);
    }
}

impl OperationView<AccuracyDisplay> for ChannelView {
    fn set_busy(&mut self, busy: bool) {
        self.busy(busy);
    }

    fn render_result(&mut self, result: &AccuracyDisplay) {
        self.send(UiEvent::AccuracyRendered(result.clone()));
    }

    fn render_empty(&mut self, message: &str) {
        self.empty(message);
    }

    fn render_error(&mut self, message: &str) {
        self.error(message);
    }
}

pub fn spawn_backend_thread(
    server_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Notice(format!(
                    "Backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match SpellServiceClient::new(server_url) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Notice(format!(
                        "Backend worker startup failure: {err}"
                    )));
                    tracing::error!("failed to build http client: {err}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::WorkerReady);

            let correct_op = Arc::new(Mutex::new(Operation::new("correct")));
            let stats_op = Arc::new(Mutex::new(Operation::new("stats")));
            let samples_op = Arc::new(Mutex::new(Operation::new("samples")));
            let accuracy_op = Arc::new(Mutex::new(Operation::new("accuracy")));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend command received");
                match cmd {
                    BackendCommand::LoadBackendInfo => {
                        let client = client.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            match client.backend_info().await {
                                Ok(info) => {
                                    let _ = ui_tx.try_send(UiEvent::BackendInfoLoaded(info));
                                }
                                Err(err) => {
                                    tracing::warn!(error = %err, "backend info unavailable");
                                    let _ = ui_tx.try_send(UiEvent::Notice(
                                        "Backend status unavailable".to_string(),
                                    ));
                                }
                            }
                        });
                    }
                    BackendCommand::Correct { text } => {
                        let client = client.clone();
                        let op = correct_op.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let Ok(mut op) = op.try_lock() else {
                                tracing::debug!("correction already in flight; trigger dropped");
                                return;
                            };
                            let mut view = ChannelView {
                                panel: Panel::Correction,
                                ui_tx,
                            };
                            if let Err(err) =
                                ops::correct_text(&client, &mut op, &mut view, &text).await
                            {
                                view.send(UiEvent::InputRejected(err.to_string()));
                            }
                        });
                    }
                    BackendCommand::LoadStats => {
                        let client = client.clone();
                        let op = stats_op.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let Ok(mut op) = op.try_lock() else {
                                tracing::debug!("stats load already in flight; trigger dropped");
                                return;
                            };
                            let mut view = ChannelView {
                                panel: Panel::Stats,
                                ui_tx,
                            };
                            ops::fetch_stats(&client, &mut op, &mut view).await;
                        });
                    }
                    BackendCommand::LoadSamples { count } => {
                        let client = client.clone();
                        let op = samples_op.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let Ok(mut op) = op.try_lock() else {
                                tracing::debug!("sample load already in flight; trigger dropped");
                                return;
                            };
                            let mut view = ChannelView {
                                panel: Panel::Samples,
                                ui_tx,
                            };
                            ops::fetch_samples(&client, &mut op, &mut view, count).await;
                        });
                    }
                    BackendCommand::RunAccuracyTest { sample_size } => {
                        let client = client.clone();
                        let op = accuracy_op.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let Ok(mut op) = op.try_lock() else {
                                tracing::debug!("accuracy test already in flight; trigger dropped");
                                return;
                            };
                            let mut view = ChannelView {
                                panel: Panel::Accuracy,
                                ui_tx,
                            };
                            ops::run_accuracy_test(&client, &mut op, &mut view, sample_size).await;
                        });
                    }
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn full_queue_drops_events_without_blocking_the_worker() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        let view = ChannelView {
            panel: Panel::Stats,
            ui_tx,
        };

        view.busy(true);
        view.busy(false);

        assert!(matches!(
            ui_rx.try_recv(),
            Ok(UiEvent::Busy { busy: true, .. })
        ));
        assert!(ui_rx.try_recv().is_err());
    }

    #[test]
    fn disconnected_queue_is_tolerated() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        drop(ui_rx);
        let view = ChannelView {
            panel: Panel::Correction,
            ui_tx,
        };

        view.error("Could not correct text. Please try again.");
    }
}

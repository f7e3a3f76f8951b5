//! App shell: correction panel, dataset tabs, and event intake.

use client_core::render::{AccuracyDisplay, PartitionDisplay, SampleSetDisplay};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::protocol::{BackendInfo, CorrectResponse, DatasetStats};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{Panel, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "spell_checker_gui.settings";

const DEFAULT_SAMPLE_COUNT: u32 = 10;
const MAX_SAMPLE_COUNT: u32 = 50;
const DEFAULT_ACCURACY_SAMPLE_SIZE: u32 = 50;
const MAX_ACCURACY_SAMPLE_SIZE: u32 = 100;

/// What a panel's output region currently shows. `Empty` is a successful
/// outcome with nothing to list and is never styled like `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutput<T> {
    Blank,
    Busy,
    Ready(T),
    Empty(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetTab {
    Stats,
    Samples,
    Accuracy,
}

impl DatasetTab {
    fn label(self) -> &'static str {
        match self {
            DatasetTab::Stats => "Statistics",
            DatasetTab::Samples => "Random Samples",
            DatasetTab::Accuracy => "Accuracy Test",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedPanelSettings {
    sample_count: u32,
    accuracy_sample_size: u32,
    active_tab: DatasetTab,
}

impl Default for PersistedPanelSettings {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            accuracy_sample_size: DEFAULT_ACCURACY_SAMPLE_SIZE,
            active_tab: DatasetTab::Stats,
        }
    }
}

impl PersistedPanelSettings {
    fn into_runtime(self) -> (u32, u32, DatasetTab) {
        (
            self.sample_count.clamp(1, MAX_SAMPLE_COUNT),
            self.accuracy_sample_size.clamp(1, MAX_ACCURACY_SAMPLE_SIZE),
            self.active_tab,
        )
    }
}

pub struct SpellCheckerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    backend_info: Option<BackendInfo>,
    input: String,
    correction: PanelOutput<CorrectResponse>,
    correction_busy: bool,

    active_tab: DatasetTab,
    stats: PanelOutput<DatasetStats>,
    stats_busy: bool,
    samples: PanelOutput<SampleSetDisplay>,
    samples_busy: bool,
    sample_count: u32,
    accuracy: PanelOutput<AccuracyDisplay>,
    accuracy_busy: bool,
    accuracy_sample_size: u32,

    status: String,
    alert: Option<String>,
}

impl SpellCheckerApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedPanelSettings>,
    ) -> Self {
        let (sample_count, accuracy_sample_size, active_tab) =
            persisted.unwrap_or_default().into_runtime();
        Self {
            cmd_tx,
            ui_rx,
            backend_info: None,
            input: String::new(),
            correction: PanelOutput::Blank,
            correction_busy: false,
            active_tab,
            stats: PanelOutput::Blank,
            stats_busy: false,
            samples: PanelOutput::Blank,
            samples_busy: false,
            sample_count,
            accuracy: PanelOutput::Blank,
            accuracy_busy: false,
            accuracy_sample_size,
            status: "Connecting to correction service...".to_string(),
            alert: None,
        }
    }

    fn busy_flag(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::Correction => &mut self.correction_busy,
            Panel::Stats => &mut self.stats_busy,
            Panel::Samples => &mut self.samples_busy,
            Panel::Accuracy => &mut self.accuracy_busy,
        }
    }

    fn enter_busy(&mut self, panel: Panel) {
        *self.busy_flag(panel) = true;
        match panel {
            Panel::Correction => self.correction = PanelOutput::Busy,
            Panel::Stats => self.stats = PanelOutput::Busy,
            Panel::Samples => self.samples = PanelOutput::Busy,
            Panel::Accuracy => self.accuracy = PanelOutput::Busy,
        }
    }

    /// Queues an operation command and flips its panel busy in the same
    /// frame, so a second trigger before the worker's own busy event
    /// round-trips is rejected rather than queued behind the first.
    fn dispatch_operation(&mut self, panel: Panel, cmd: BackendCommand) {
        if *self.busy_flag(panel) {
            return;
        }
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.enter_busy(panel);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::WorkerReady => {
                self.status = "Connected".to_string();
                // Header info and the stats tab load without a user action.
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::LoadBackendInfo,
                    &mut self.status,
                );
                self.dispatch_operation(Panel::Stats, BackendCommand::LoadStats);
            }
            UiEvent::BackendInfoLoaded(info) => {
                self.backend_info = Some(info);
            }
            UiEvent::Busy { panel, busy } => {
                if busy {
                    self.enter_busy(panel);
                } else {
                    *self.busy_flag(panel) = false;
                }
            }
            UiEvent::CorrectionRendered(response) => {
                self.correction = PanelOutput::Ready(response);
            }
            UiEvent::StatsRendered(stats) => {
                self.stats = PanelOutput::Ready(stats);
            }
            UiEvent::SamplesRendered(display) => {
                self.samples = PanelOutput::Ready(display);
            }
            UiEvent::AccuracyRendered(display) => {
                self.accuracy = PanelOutput::Ready(display);
            }
            UiEvent::EmptyRendered { panel, message } => match panel {
                Panel::Correction => self.correction = PanelOutput::Empty(message),
                Panel::Stats => self.stats = PanelOutput::Empty(message),
                Panel::Samples => self.samples = PanelOutput::Empty(message),
                Panel::Accuracy => self.accuracy = PanelOutput::Empty(message),
            },
            UiEvent::ErrorRendered { panel, message } => match panel {
                Panel::Correction => self.correction = PanelOutput::Error(message),
                Panel::Stats => self.stats = PanelOutput::Error(message),
                Panel::Samples => self.samples = PanelOutput::Error(message),
                Panel::Accuracy => self.accuracy = PanelOutput::Error(message),
            },
            UiEvent::InputRejected(message) => {
                self.alert = Some(message);
            }
            UiEvent::Notice(message) => {
                self.status = message;
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn trigger_correction(&mut self) {
        // Enter can still fire while the button is disabled.
        if self.correction_busy {
            return;
        }
        if self.input.trim().is_empty() {
            self.alert = Some("Please enter some text to correct!".to_string());
            return;
        }
        self.dispatch_operation(
            Panel::Correction,
            BackendCommand::Correct {
                text: self.input.clone(),
            },
        );
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Spell Checker");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &self.backend_info {
                    Some(info) => {
                        ui.label(format!("Backend: {} ({})", info.backend, info.status));
                    }
                    None => {
                        ui.weak("Backend: unknown");
                    }
                }
            });
        });
        ui.horizontal(|ui| {
            ui.small("Status:");
            ui.small(egui::RichText::new(&self.status).weak());
        });
    }

    fn show_correction_panel(&mut self, ui: &mut egui::Ui) {
        ui.label("Enter text to correct:");
        let response = ui.add(
            egui::TextEdit::multiline(&mut self.input)
                .hint_text("Ths is a tst")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        // Enter submits; Shift+Enter and Ctrl+Enter keep the newline.
        let plain_enter = response.has_focus()
            && ui.input(|i| {
                i.key_pressed(egui::Key::Enter) && !i.modifiers.shift && !i.modifiers.ctrl
            });
        if plain_enter {
            while self.input.ends_with('\n') {
                self.input.pop();
            }
            self.trigger_correction();
        }

        let label = if self.correction_busy {
            "Correcting..."
        } else {
            "Correct Text"
        };
        if ui
            .add_enabled(!self.correction_busy, egui::Button::new(label))
            .clicked()
        {
            self.trigger_correction();
        }

        match &self.correction {
            PanelOutput::Blank => {
                ui.weak("Corrected text will appear here.");
            }
            PanelOutput::Busy => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Processing...");
                });
            }
            PanelOutput::Ready(result) => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(&result.corrected)
                            .strong()
                            .color(egui::Color32::from_rgb(87, 171, 90)),
                    );
                    ui.small(format!("original: {}", result.original));
                });
            }
            PanelOutput::Empty(message) => {
                ui.label(message);
            }
            PanelOutput::Error(message) => {
                ui.colored_label(egui::Color32::from_rgb(205, 92, 92), message);
            }
        }
    }

    fn show_stats_tab(&mut self, ui: &mut egui::Ui) {
        if ui
            .add_enabled(!self.stats_busy, egui::Button::new("Refresh"))
            .clicked()
        {
            self.dispatch_operation(Panel::Stats, BackendCommand::LoadStats);
        }

        match &self.stats {
            PanelOutput::Blank => {
                ui.weak("No statistics loaded.");
            }
            PanelOutput::Busy => {
                ui.spinner();
            }
            PanelOutput::Ready(stats) => {
                if let Some(name) = &stats.dataset_name {
                    ui.small(format!("dataset: {name}"));
                }
                egui::Grid::new("dataset_stats_grid")
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label("Total entries");
                        ui.label(stats.total_entries.to_string());
                        ui.end_row();
                        ui.label("Single-word typos");
                        ui.label(stats.single_word_typos.to_string());
                        ui.end_row();
                        ui.label("Multi-word typos");
                        ui.label(stats.multi_word_typos.to_string());
                        ui.end_row();
                        ui.label("Avg words per typo");
                        ui.label(format!("{:.2}", stats.avg_words_per_typo));
                        ui.end_row();
                        ui.label("Missing letters");
                        ui.label(stats.typo_types.missing_letters.to_string());
                        ui.end_row();
                        ui.label("Extra letters");
                        ui.label(stats.typo_types.extra_letters.to_string());
                        ui.end_row();
                        ui.label("Swapped letters");
                        ui.label(stats.typo_types.swapped_letters.to_string());
                        ui.end_row();
                        ui.label("Wrong letters");
                        ui.label(stats.typo_types.wrong_letters.to_string());
                        ui.end_row();
                    });
                if !stats.common_words.is_empty() {
                    ui.add_space(4.0);
                    ui.label("Most common words:");
                    ui.horizontal_wrapped(|ui| {
                        for entry in &stats.common_words {
                            ui.small(format!("{} ({})", entry.word, entry.count));
                        }
                    });
                }
            }
            PanelOutput::Empty(message) => {
                ui.label(message);
            }
            PanelOutput::Error(message) => {
                ui.colored_label(egui::Color32::from_rgb(205, 92, 92), message);
            }
        }
    }

    fn show_samples_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Count:");
            ui.add(egui::DragValue::new(&mut self.sample_count).range(1..=MAX_SAMPLE_COUNT));
            if ui
                .add_enabled(!self.samples_busy, egui::Button::new("Load Samples"))
                .clicked()
            {
                self.dispatch_operation(
                    Panel::Samples,
                    BackendCommand::LoadSamples {
                        count: self.sample_count,
                    },
                );
            }
        });

        match &self.samples {
            PanelOutput::Blank => {
                ui.weak("No samples loaded.");
            }
            PanelOutput::Busy => {
                ui.spinner();
            }
            PanelOutput::Ready(display) => {
                ui.label(format!(
                    "Match rate: {} ({} of {})",
                    display.match_rate_label, display.match_count, display.total
                ));
                egui::ScrollArea::vertical()
                    .id_salt("samples_scroll")
                    .max_height(260.0)
                    .show(ui, |ui| {
                        for row in &display.rows {
                            let (mark, color) = if row.matches {
                                ("✓", egui::Color32::from_rgb(87, 171, 90))
                            } else {
                                ("✗", egui::Color32::from_rgb(205, 92, 92))
                            };
                            ui.horizontal(|ui| {
                                ui.colored_label(color, mark);
                                ui.label(&row.typo);
                                ui.weak("expected:");
                                ui.label(&row.expected);
                                ui.weak("got:");
                                ui.label(&row.produced);
                            });
                        }
                    });
            }
            PanelOutput::Empty(message) => {
                ui.label(message);
            }
            PanelOutput::Error(message) => {
                ui.colored_label(egui::Color32::from_rgb(205, 92, 92), message);
            }
        }
    }

    fn show_accuracy_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Sample size:");
            ui.add(
                egui::DragValue::new(&mut self.accuracy_sample_size)
                    .range(1..=MAX_ACCURACY_SAMPLE_SIZE),
            );
            let label = if self.accuracy_busy {
                "Running..."
            } else {
                "Run Accuracy Test"
            };
            if ui
                .add_enabled(!self.accuracy_busy, egui::Button::new(label))
                .clicked()
            {
                self.dispatch_operation(
                    Panel::Accuracy,
                    BackendCommand::RunAccuracyTest {
                        sample_size: self.accuracy_sample_size,
                    },
                );
            }
        });

        match &self.accuracy {
            PanelOutput::Blank => {
                ui.weak("Run the test to measure backend accuracy.");
            }
            PanelOutput::Busy => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Testing accuracy, this may take a moment...");
                });
            }
            PanelOutput::Ready(display) => {
                ui.add(
                    egui::ProgressBar::new(display.progress_fraction)
                        .text(format!("Accuracy: {}", display.headline)),
                );
                ui.small(format!(
                    "{} of {} corrected exactly",
                    display.correct_count, display.total_tested
                ));
                Self::show_partition(ui, "Correct", &display.correct, true);
                Self::show_partition(ui, "Incorrect", &display.incorrect, false);
            }
            PanelOutput::Empty(message) => {
                ui.label(message);
            }
            PanelOutput::Error(message) => {
                ui.colored_label(egui::Color32::from_rgb(205, 92, 92), message);
            }
        }
    }

    fn show_partition(ui: &mut egui::Ui, label: &str, partition: &PartitionDisplay, correct: bool) {
        let color = if correct {
            egui::Color32::from_rgb(87, 171, 90)
        } else {
            egui::Color32::from_rgb(205, 92, 92)
        };
        egui::CollapsingHeader::new(format!("{label} ({})", partition.total))
            .default_open(!correct)
            .show(ui, |ui| {
                for record in &partition.inline {
                    ui.horizontal(|ui| {
                        ui.colored_label(color, &record.typo);
                        ui.weak("expected:");
                        ui.label(&record.expected);
                        ui.weak("got:");
                        ui.label(&record.corrected);
                    });
                }
                if let Some(notice) = partition.overflow_notice() {
                    ui.weak(notice);
                }
            });
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&message);
                if ui.button("OK").clicked() {
                    self.alert = None;
                }
            });
    }
}

impl eframe::App for SpellCheckerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        // Worker events arrive off-frame; poll at a coarse cadence.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.show_header(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_correction_panel(ui);
            ui.add_space(8.0);
            ui.separator();

            ui.horizontal(|ui| {
                for tab in [DatasetTab::Stats, DatasetTab::Samples, DatasetTab::Accuracy] {
                    if ui
                        .selectable_label(self.active_tab == tab, tab.label())
                        .clicked()
                    {
                        self.active_tab = tab;
                    }
                }
            });
            ui.add_space(4.0);

            match self.active_tab {
                DatasetTab::Stats => self.show_stats_tab(ui),
                DatasetTab::Samples => self.show_samples_tab(ui),
                DatasetTab::Accuracy => self.show_accuracy_tab(ui),
            }
        });

        self.show_alert(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedPanelSettings {
            sample_count: self.sample_count,
            accuracy_sample_size: self.accuracy_sample_size,
            active_tab: self.active_tab,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn test_app() -> SpellCheckerApp {
        let (cmd_tx, _cmd_rx) = bounded::<BackendCommand>(16);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        SpellCheckerApp::new(cmd_tx, ui_rx, None)
    }

    #[test]
    fn busy_event_replaces_output_with_placeholder() {
        let mut app = test_app();
        app.correction = PanelOutput::Error("old failure".to_string());

        app.apply_event(UiEvent::Busy {
            panel: Panel::Correction,
            busy: true,
        });

        assert!(app.correction_busy);
        assert_eq!(app.correction, PanelOutput::Busy);
    }

    #[test]
    fn error_event_styles_only_its_panel() {
        let mut app = test_app();

        app.apply_event(UiEvent::ErrorRendered {
            panel: Panel::Samples,
            message: "Error loading samples".to_string(),
        });

        assert_eq!(
            app.samples,
            PanelOutput::Error("Error loading samples".to_string())
        );
        assert_eq!(app.correction, PanelOutput::Blank);
        assert_eq!(app.stats, PanelOutput::Blank);
    }

    #[test]
    fn empty_outcome_is_not_error_styled() {
        let mut app = test_app();

        app.apply_event(UiEvent::EmptyRendered {
            panel: Panel::Samples,
            message: "No samples available".to_string(),
        });

        assert_eq!(
            app.samples,
            PanelOutput::Empty("No samples available".to_string())
        );
    }

    #[test]
    fn rejected_input_opens_blocking_alert() {
        let mut app = test_app();

        app.apply_event(UiEvent::InputRejected(
            "Please enter some text to correct!".to_string(),
        ));

        assert_eq!(
            app.alert.as_deref(),
            Some("Please enter some text to correct!")
        );
    }

    #[test]
    fn blank_input_triggers_alert_without_queueing_a_command() {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        let mut app = SpellCheckerApp::new(cmd_tx, ui_rx, None);
        app.input = "   \n".to_string();

        app.trigger_correction();

        assert!(app.alert.is_some());
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn second_trigger_before_busy_event_is_rejected_not_queued() {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        let mut app = SpellCheckerApp::new(cmd_tx, ui_rx, None);
        app.input = "Ths is a tst".to_string();

        // No worker round-trip has happened between the two triggers.
        app.trigger_correction();
        app.trigger_correction();

        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::Correct { .. })
        ));
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_flips_panel_busy_in_the_same_frame() {
        let (cmd_tx, _cmd_rx) = bounded::<BackendCommand>(16);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        let mut app = SpellCheckerApp::new(cmd_tx, ui_rx, None);

        app.dispatch_operation(Panel::Samples, BackendCommand::LoadSamples { count: 5 });

        assert!(app.samples_busy);
        assert_eq!(app.samples, PanelOutput::Busy);
    }

    #[test]
    fn failed_dispatch_leaves_panel_interactive() {
        // Zero-capacity queue rejects every send.
        let (cmd_tx, _cmd_rx) = bounded::<BackendCommand>(0);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        let mut app = SpellCheckerApp::new(cmd_tx, ui_rx, None);

        app.dispatch_operation(
            Panel::Accuracy,
            BackendCommand::RunAccuracyTest { sample_size: 20 },
        );

        assert!(!app.accuracy_busy);
        assert_eq!(app.accuracy, PanelOutput::Blank);
        assert_eq!(app.status, "Command queue is full; please retry");
    }

    #[test]
    fn persisted_settings_clamp_to_backend_caps() {
        let settings = PersistedPanelSettings {
            sample_count: 500,
            accuracy_sample_size: 0,
            active_tab: DatasetTab::Accuracy,
        };

        let (count, size, tab) = settings.into_runtime();
        assert_eq!(count, MAX_SAMPLE_COUNT);
        assert_eq!(size, 1);
        assert_eq!(tab, DatasetTab::Accuracy);
    }
}

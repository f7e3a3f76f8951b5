//! Events flowing from the backend worker to the egui thread.

use client_core::render::{AccuracyDisplay, SampleSetDisplay};
use shared::protocol::{BackendInfo, CorrectResponse, DatasetStats};

/// The output region an event addresses. Each panel owns one operation and
/// renders independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Correction,
    Stats,
    Samples,
    Accuracy,
}

pub enum UiEvent {
    WorkerReady,
    BackendInfoLoaded(BackendInfo),
    Busy { panel: Panel, busy: bool },
    CorrectionRendered(CorrectResponse),
    StatsRendered(DatasetStats),
    SamplesRendered(SampleSetDisplay),
    AccuracyRendered(AccuracyDisplay),
    /// Succeeded with nothing to show; rendered as plain text, not error-styled.
    EmptyRendered { panel: Panel, message: String },
    ErrorRendered { panel: Panel, message: String },
    /// Locally rejected input; shown as a blocking notice over the panel.
    InputRejected(String),
    Notice(String),
}

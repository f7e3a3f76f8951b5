//! Pure mapping from response payloads to display structures.
//!
//! Nothing here touches the network or mutates shared state; front ends
//! consume these structures verbatim so every surface shows the same derived
//! numbers.

use shared::protocol::{AccuracyRecord, AccuracyReport, Sample};

/// At most this many records of a partition are shown inline; the rest are
/// summarized as a remainder count. The full record set stays in memory.
pub const INLINE_DISPLAY_LIMIT: usize = 10;

pub const NO_SAMPLES_MESSAGE: &str = "No samples available";

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSetDisplay {
    pub match_count: usize,
    pub total: usize,
    /// One-decimal percentage, e.g. "60.0%".
    pub match_rate_label: String,
    /// Backend order preserved.
    pub rows: Vec<Sample>,
}

/// Returns `None` for an empty set; the caller renders the no-samples
/// message instead and no division happens.
pub fn sample_set_display(samples: &[Sample]) -> Option<SampleSetDisplay> {
    if samples.is_empty() {
        return None;
    }
    let match_count = samples.iter().filter(|sample| sample.matches).count();
    Some(SampleSetDisplay {
        match_count,
        total: samples.len(),
        match_rate_label: format_match_rate(match_count, samples.len()),
        rows: samples.to_vec(),
    })
}

/// Match rate over the *returned* count, not the requested one.
pub fn format_match_rate(match_count: usize, total: usize) -> String {
    format!("{:.1}%", (match_count as f64 / total as f64) * 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDisplay {
    pub total: usize,
    pub inline: Vec<AccuracyRecord>,
    pub overflow: usize,
}

impl PartitionDisplay {
    fn new(records: Vec<AccuracyRecord>) -> Self {
        let total = records.len();
        let overflow = total.saturating_sub(INLINE_DISPLAY_LIMIT);
        let mut inline = records;
        inline.truncate(INLINE_DISPLAY_LIMIT);
        Self {
            total,
            inline,
            overflow,
        }
    }

    /// "...and N more", or `None` when everything fits inline.
    pub fn overflow_notice(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("...and {} more", self.overflow))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyDisplay {
    /// Headline percentage, e.g. "75%" or "87.5%".
    pub headline: String,
    /// Fraction in [0, 1] for scaling a progress indicator.
    pub progress_fraction: f32,
    pub correct_count: u64,
    pub total_tested: u64,
    pub correct: PartitionDisplay,
    pub incorrect: PartitionDisplay,
}

pub fn accuracy_display(report: &AccuracyReport) -> AccuracyDisplay {
    let (correct, incorrect): (Vec<_>, Vec<_>) = report
        .results
        .iter()
        .cloned()
        .partition(|record| record.correct);
    AccuracyDisplay {
        headline: format_accuracy_headline(report.accuracy),
        progress_fraction: (report.accuracy / 100.0).clamp(0.0, 1.0) as f32,
        correct_count: report.correct_count,
        total_tested: report.total_tested,
        correct: PartitionDisplay::new(correct),
        incorrect: PartitionDisplay::new(incorrect),
    }
}

/// Two decimals at most, trailing zeros dropped ("75%", "87.5%", "66.67%").
pub fn format_accuracy_headline(accuracy: f64) -> String {
    let fixed = format!("{accuracy:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}%")
}

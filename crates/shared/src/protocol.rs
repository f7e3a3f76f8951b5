use serde::{Deserialize, Serialize};

/// Identity and health of the correction backend, shown in the page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub backend: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectResponse {
    pub original: String,
    pub corrected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_status: Option<String>,
}

/// Per-category breakdown of typo shapes in the labeled dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypoTypeCounts {
    pub missing_letters: u64,
    pub extra_letters: u64,
    #[serde(default)]
    pub swapped_letters: u64,
    pub wrong_letters: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_entries: u64,
    pub single_word_typos: u64,
    pub multi_word_typos: u64,
    pub avg_words_per_typo: f64,
    pub typo_types: TypoTypeCounts,
    /// Ordered most-common-first; display must preserve this ordering.
    pub common_words: Vec<WordCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
}

/// One sampled dataset entry with the backend's correction attempt.
///
/// `matches` is computed by the backend under its own case/whitespace policy;
/// the client treats it as an opaque boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub typo: String,
    pub expected: String,
    pub produced: String,
    pub matches: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplesResponse {
    pub samples: Vec<Sample>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccuracyRequest {
    pub sample_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub typo: String,
    pub expected: String,
    pub corrected: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Backend-reported percentage over the tested batch, already rounded.
    pub accuracy: f64,
    pub correct_count: u64,
    pub total_tested: u64,
    /// Dataset order; the client derives the correct/incorrect partition.
    pub results: Vec<AccuracyRecord>,
}

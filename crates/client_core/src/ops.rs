//! The user-triggered operations: correction, dataset statistics, random
//! samples, and the batch accuracy test.
//!
//! Each entry point pairs one network exchange with one [`Operation`] record
//! and renders through the injected view. Failure messages are fixed per
//! operation; transport detail only reaches the log.

use shared::protocol::{CorrectResponse, DatasetStats};
use thiserror::Error;

use crate::lifecycle::{drive, Operation, OperationView, Outcome};
use crate::render::{
    accuracy_display, sample_set_display, AccuracyDisplay, SampleSetDisplay, NO_SAMPLES_MESSAGE,
};
use crate::SpellServiceClient;

pub const CORRECTION_FAILURE: &str = "Could not correct text. Please try again.";
pub const STATS_FAILURE: &str = "Error loading statistics";
pub const SAMPLES_FAILURE: &str = "Error loading samples";
pub const ACCURACY_FAILURE: &str = "Error running accuracy test";

/// Locally detected bad input. Surfaced as a blocking notice by the caller;
/// the operation record is untouched and no request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter some text to correct!")]
    EmptyInput,
}

/// Submits trimmed text for correction.
///
/// Empty-after-trim input fails validation before the lifecycle is touched.
/// A second trigger while pending is dropped, matching the disabled trigger
/// control.
pub async fn correct_text(
    client: &SpellServiceClient,
    op: &mut Operation,
    view: &mut (dyn OperationView<CorrectResponse> + Send),
    input: &str,
) -> Result<Option<CorrectResponse>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    let outcome = drive(op, view, CORRECTION_FAILURE, async {
        client.correct(trimmed).await.map(Outcome::Data)
    })
    .await;
    Ok(outcome.unwrap_or(None))
}

pub async fn fetch_stats(
    client: &SpellServiceClient,
    op: &mut Operation,
    view: &mut (dyn OperationView<DatasetStats> + Send),
) -> Option<DatasetStats> {
    drive(op, view, STATS_FAILURE, async {
        client.dataset_stats().await.map(Outcome::Data)
    })
    .await
    .ok()
    .flatten()
}

/// Fetches `count` random samples and derives the match rate client-side.
/// Zero returned samples is a valid outcome rendered as the no-samples
/// message.
pub async fn fetch_samples(
    client: &SpellServiceClient,
    op: &mut Operation,
    view: &mut (dyn OperationView<SampleSetDisplay> + Send),
    count: u32,
) -> Option<SampleSetDisplay> {
    drive(op, view, SAMPLES_FAILURE, async {
        let response = client.random_samples(count).await?;
        Ok(match sample_set_display(&response.samples) {
            Some(display) => Outcome::Data(display),
            None => Outcome::Empty {
                message: NO_SAMPLES_MESSAGE,
            },
        })
    })
    .await
    .ok()
    .flatten()
}

/// Runs the batch accuracy test and partitions the records for display.
pub async fn run_accuracy_test(
    client: &SpellServiceClient,
    op: &mut Operation,
    view: &mut (dyn OperationView<AccuracyDisplay> + Send),
    sample_size: u32,
) -> Option<AccuracyDisplay> {
    drive(op, view, ACCURACY_FAILURE, async {
        let report = client.test_accuracy(sample_size).await?;
        Ok(Outcome::Data(accuracy_display(&report)))
    })
    .await
    .ok()
    .flatten()
}

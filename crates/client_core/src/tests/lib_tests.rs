use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use shared::protocol::{
    AccuracyRecord, AccuracyReport, CorrectRequest, CorrectResponse, DatasetStats, Sample,
    SamplesResponse, TypoTypeCounts, WordCount,
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::lifecycle::{Operation, OperationState, OperationView};
use crate::ops::{
    self, ACCURACY_FAILURE, CORRECTION_FAILURE, SAMPLES_FAILURE, STATS_FAILURE,
};
use crate::render::SampleSetDisplay;
use crate::ValidationError;

#[derive(Clone)]
struct MockBackendState {
    fail_all: Arc<Mutex<bool>>,
    correct_requests: Arc<Mutex<Vec<CorrectRequest>>>,
    sample_counts_seen: Arc<Mutex<Vec<u32>>>,
    sample_sizes_seen: Arc<Mutex<Vec<u32>>>,
    stats_hits: Arc<Mutex<u32>>,
    samples: Arc<Mutex<Vec<Sample>>>,
    accuracy_report: Arc<Mutex<AccuracyReport>>,
    malformed_correct_body: Arc<Mutex<bool>>,
}

fn sample(typo: &str, matches: bool) -> Sample {
    Sample {
        typo: typo.to_string(),
        expected: format!("{typo} fixed"),
        produced: if matches {
            format!("{typo} fixed")
        } else {
            format!("{typo} wrong")
        },
        matches,
    }
}

fn record(typo: &str, correct: bool) -> AccuracyRecord {
    AccuracyRecord {
        typo: typo.to_string(),
        expected: format!("{typo} fixed"),
        corrected: format!("{typo} fixed"),
        correct,
    }
}

fn default_report() -> AccuracyReport {
    AccuracyReport {
        accuracy: 75.0,
        correct_count: 15,
        total_tested: 20,
        results: (0..20).map(|i| record(&format!("t{i}"), i < 15)).collect(),
    }
}

async fn handle_info(State(state): State<MockBackendState>) -> Result<Json<BackendInfo>, StatusCode> {
    if *state.fail_all.lock().await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(BackendInfo {
        backend: "TextBlob".to_string(),
        status: "active".to_string(),
    }))
}

async fn handle_correct(
    State(state): State<MockBackendState>,
    Json(request): Json<CorrectRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if *state.fail_all.lock().await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.correct_requests.lock().await.push(request.clone());
    if *state.malformed_correct_body.lock().await {
        return Ok(Json(json!({ "unexpected": true })));
    }
    Ok(Json(json!({
        "original": request.text,
        "corrected": "This is a test",
        "backend": "TextBlob",
        "backend_status": "active",
    })))
}

async fn handle_stats(
    State(state): State<MockBackendState>,
) -> Result<Json<DatasetStats>, StatusCode> {
    *state.stats_hits.lock().await += 1;
    if *state.fail_all.lock().await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(DatasetStats {
        total_entries: 42,
        single_word_typos: 30,
        multi_word_typos: 12,
        avg_words_per_typo: 1.4,
        typo_types: TypoTypeCounts {
            missing_letters: 20,
            extra_letters: 10,
            swapped_letters: 2,
            wrong_letters: 10,
        },
        common_words: vec![WordCount {
            word: "toilet".to_string(),
            count: 3,
        }],
        dataset_name: Some("typo.txt".to_string()),
    }))
}

#[derive(Deserialize)]
struct SamplesQuery {
    count: u32,
}

async fn handle_samples(
    State(state): State<MockBackendState>,
    Query(query): Query<SamplesQuery>,
) -> Result<Json<SamplesResponse>, StatusCode> {
    if *state.fail_all.lock().await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.sample_counts_seen.lock().await.push(query.count);
    let samples = state.samples.lock().await.clone();
    let count = samples.len();
    Ok(Json(SamplesResponse { samples, count }))
}

#[derive(Deserialize)]
struct AccuracyBody {
    sample_size: u32,
}

async fn handle_accuracy(
    State(state): State<MockBackendState>,
    Json(body): Json<AccuracyBody>,
) -> Result<Json<AccuracyReport>, StatusCode> {
    if *state.fail_all.lock().await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.sample_sizes_seen.lock().await.push(body.sample_size);
    Ok(Json(state.accuracy_report.lock().await.clone()))
}

async fn spawn_backend() -> (String, MockBackendState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let state = MockBackendState {
        fail_all: Arc::new(Mutex::new(false)),
        correct_requests: Arc::new(Mutex::new(Vec::new())),
        sample_counts_seen: Arc::new(Mutex::new(Vec::new())),
        sample_sizes_seen: Arc::new(Mutex::new(Vec::new())),
        stats_hits: Arc::new(Mutex::new(0)),
        samples: Arc::new(Mutex::new(Vec::new())),
        accuracy_report: Arc::new(Mutex::new(default_report())),
        malformed_correct_body: Arc::new(Mutex::new(false)),
    };
    let app = Router::new()
        .route("/api/info", get(handle_info))
        .route("/api/correct", post(handle_correct))
        .route("/api/dataset/stats", get(handle_stats))
        .route("/api/dataset/samples", get(handle_samples))
        .route("/api/dataset/test-accuracy", post(handle_accuracy))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn test_client(server_url: &str) -> SpellServiceClient {
    SpellServiceClient::with_timeout(server_url, Duration::from_secs(5)).expect("build client")
}

struct RecordingView<R> {
    busy: Vec<bool>,
    results: Vec<R>,
    empties: Vec<String>,
    errors: Vec<String>,
}

impl<R> RecordingView<R> {
    fn new() -> Self {
        Self {
            busy: Vec::new(),
            results: Vec::new(),
            empties: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<R: Clone> OperationView<R> for RecordingView<R> {
    fn set_busy(&mut self, busy: bool) {
        self.busy.push(busy);
    }

    fn render_result(&mut self, result: &R) {
        self.results.push(result.clone());
    }

    fn render_empty(&mut self, message: &str) {
        self.empties.push(message.to_string());
    }

    fn render_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

#[tokio::test]
async fn correction_posts_trimmed_text_and_renders_corrected_string() {
    let (server_url, state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("correct");
    let mut view = RecordingView::<CorrectResponse>::new();

    let result = ops::correct_text(&client, &mut op, &mut view, "  Ths is a tst  ")
        .await
        .expect("not a validation failure");

    assert_eq!(
        result.as_ref().map(|r| r.corrected.as_str()),
        Some("This is a test")
    );
    assert_eq!(op.state(), OperationState::Succeeded);
    assert_eq!(view.busy, vec![true, false]);
    assert_eq!(view.results[0].corrected, "This is a test");
    assert!(view.errors.is_empty());

    let requests = state.correct_requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "Ths is a tst");
}

#[tokio::test]
async fn empty_input_issues_no_request_and_leaves_state_untouched() {
    let (server_url, state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("correct");
    let mut view = RecordingView::<CorrectResponse>::new();

    let err = ops::correct_text(&client, &mut op, &mut view, "   \n\t ")
        .await
        .expect_err("must fail validation");

    assert_eq!(err, ValidationError::EmptyInput);
    assert_eq!(op.state(), OperationState::Idle);
    assert!(view.busy.is_empty());
    assert!(state.correct_requests.lock().await.is_empty());
}

#[tokio::test]
async fn server_error_fails_operation_and_reenables_trigger() {
    let (server_url, state) = spawn_backend().await;
    *state.fail_all.lock().await = true;
    let client = test_client(&server_url);
    let mut op = Operation::new("correct");
    let mut view = RecordingView::<CorrectResponse>::new();

    let result = ops::correct_text(&client, &mut op, &mut view, "tolet")
        .await
        .expect("validation passes");

    assert!(result.is_none());
    assert_eq!(op.state(), OperationState::Failed);
    assert_eq!(op.last_error(), Some(CORRECTION_FAILURE));
    assert_eq!(view.errors, vec![CORRECTION_FAILURE]);
    // Busy exited on the failure path, so the trigger is interactive again.
    assert_eq!(view.busy, vec![true, false]);
}

#[tokio::test]
async fn malformed_success_body_is_distinct_from_transport_failure() {
    let (server_url, state) = spawn_backend().await;
    *state.malformed_correct_body.lock().await = true;
    let client = test_client(&server_url);

    let err = client.correct("tolet").await.expect_err("must fail");
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_failure() {
    // Bind-then-drop so nothing listens on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = test_client(&format!("http://{addr}"));

    let err = client.backend_info().await.expect_err("must fail");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn non_success_status_is_uniform_regardless_of_class() {
    let (server_url, state) = spawn_backend().await;
    *state.fail_all.lock().await = true;
    let client = test_client(&server_url);

    let err = client.dataset_stats().await.expect_err("must fail");
    match err {
        ClientError::Status { status } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn stats_fetch_maps_payload_and_renders_once() {
    let (server_url, state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("stats");
    let mut view = RecordingView::<DatasetStats>::new();

    let stats = ops::fetch_stats(&client, &mut op, &mut view)
        .await
        .expect("stats");

    assert_eq!(stats.total_entries, 42);
    assert_eq!(stats.typo_types.missing_letters, 20);
    assert_eq!(stats.common_words[0].word, "toilet");
    assert_eq!(view.results.len(), 1);
    assert_eq!(*state.stats_hits.lock().await, 1);
}

#[tokio::test]
async fn stats_failure_renders_single_error_line() {
    let (server_url, state) = spawn_backend().await;
    *state.fail_all.lock().await = true;
    let client = test_client(&server_url);
    let mut op = Operation::new("stats");
    let mut view = RecordingView::<DatasetStats>::new();

    let stats = ops::fetch_stats(&client, &mut op, &mut view).await;

    assert!(stats.is_none());
    assert_eq!(view.errors, vec![STATS_FAILURE]);
    assert_eq!(op.state(), OperationState::Failed);
}

#[tokio::test]
async fn pending_operation_rejects_second_trigger_without_a_request() {
    let (server_url, state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("stats");
    let mut view = RecordingView::<DatasetStats>::new();

    op.begin(&mut view).expect("begin");
    let stats = ops::fetch_stats(&client, &mut op, &mut view).await;

    assert!(stats.is_none());
    assert_eq!(op.state(), OperationState::Pending);
    assert_eq!(*state.stats_hits.lock().await, 0);
    // Only the manual begin toggled the view.
    assert_eq!(view.busy, vec![true]);
}

#[tokio::test]
async fn sample_fetch_forwards_count_and_computes_match_rate() {
    let (server_url, state) = spawn_backend().await;
    *state.samples.lock().await = vec![
        sample("a", true),
        sample("b", true),
        sample("c", true),
        sample("d", false),
        sample("e", false),
    ];
    let client = test_client(&server_url);
    let mut op = Operation::new("samples");
    let mut view = RecordingView::<SampleSetDisplay>::new();

    let display = ops::fetch_samples(&client, &mut op, &mut view, 5)
        .await
        .expect("display");

    assert_eq!(display.match_rate_label, "60.0%");
    assert_eq!(display.match_count, 3);
    assert_eq!(display.total, 5);
    assert_eq!(display.rows[0].typo, "a");
    assert_eq!(*state.sample_counts_seen.lock().await, vec![5]);
}

#[tokio::test]
async fn empty_sample_set_renders_no_samples_message_not_an_error() {
    let (server_url, _state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("samples");
    let mut view = RecordingView::<SampleSetDisplay>::new();

    let display = ops::fetch_samples(&client, &mut op, &mut view, 10).await;

    assert!(display.is_none());
    assert_eq!(op.state(), OperationState::Succeeded);
    assert_eq!(view.empties, vec!["No samples available"]);
    assert!(view.errors.is_empty());
}

#[tokio::test]
async fn sample_fetch_failure_renders_generic_message() {
    let (server_url, state) = spawn_backend().await;
    *state.fail_all.lock().await = true;
    let client = test_client(&server_url);
    let mut op = Operation::new("samples");
    let mut view = RecordingView::<SampleSetDisplay>::new();

    let display = ops::fetch_samples(&client, &mut op, &mut view, 10).await;

    assert!(display.is_none());
    assert_eq!(view.errors, vec![SAMPLES_FAILURE]);
    assert!(view.empties.is_empty());
}

#[tokio::test]
async fn accuracy_test_forwards_sample_size_and_partitions_records() {
    let (server_url, state) = spawn_backend().await;
    let client = test_client(&server_url);
    let mut op = Operation::new("accuracy");
    let mut view = RecordingView::<render::AccuracyDisplay>::new();

    let display = ops::run_accuracy_test(&client, &mut op, &mut view, 20)
        .await
        .expect("display");

    assert_eq!(*state.sample_sizes_seen.lock().await, vec![20]);
    assert_eq!(display.headline, "75%");
    assert_eq!(display.progress_fraction, 0.75);
    assert_eq!(display.correct_count, 15);
    assert_eq!(display.total_tested, 20);
    assert_eq!(display.correct.inline.len(), 10);
    assert_eq!(
        display.correct.overflow_notice().as_deref(),
        Some("...and 5 more")
    );
    assert_eq!(display.incorrect.inline.len(), 5);
    assert!(display.incorrect.overflow_notice().is_none());
    assert_eq!(
        display.correct.total + display.incorrect.total,
        display.total_tested as usize
    );
}

#[tokio::test]
async fn accuracy_failure_renders_single_error_line() {
    let (server_url, state) = spawn_backend().await;
    *state.fail_all.lock().await = true;
    let client = test_client(&server_url);
    let mut op = Operation::new("accuracy");
    let mut view = RecordingView::<render::AccuracyDisplay>::new();

    let display = ops::run_accuracy_test(&client, &mut op, &mut view, 20).await;

    assert!(display.is_none());
    assert_eq!(view.errors, vec![ACCURACY_FAILURE]);
    assert_eq!(op.state(), OperationState::Failed);
    assert_eq!(view.busy, vec![true, false]);
}

#[tokio::test]
async fn backend_info_parses_header_payload() {
    let (server_url, _state) = spawn_backend().await;
    let client = test_client(&server_url);

    let info = client.backend_info().await.expect("info");
    assert_eq!(info.backend, "TextBlob");
    assert_eq!(info.status, "active");
}

#[tokio::test]
async fn operations_overlap_independently() {
    let (server_url, state) = spawn_backend().await;
    *state.samples.lock().await = vec![sample("a", true)];
    let client = test_client(&server_url);

    let mut stats_op = Operation::new("stats");
    let mut samples_op = Operation::new("samples");
    let mut stats_view = RecordingView::<DatasetStats>::new();
    let mut samples_view = RecordingView::<SampleSetDisplay>::new();

    let (stats, display) = tokio::join!(
        ops::fetch_stats(&client, &mut stats_op, &mut stats_view),
        ops::fetch_samples(&client, &mut samples_op, &mut samples_view, 1),
    );

    assert!(stats.is_some());
    assert!(display.is_some());
    assert_eq!(stats_op.state(), OperationState::Succeeded);
    assert_eq!(samples_op.state(), OperationState::Succeeded);
}

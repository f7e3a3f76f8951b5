use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::render::{AccuracyDisplay, PartitionDisplay, SampleSetDisplay};
use client_core::{ops, Operation, OperationState, OperationView, SpellServiceClient};
use shared::protocol::{CorrectResponse, DatasetStats};

#[derive(Parser, Debug)]
#[command(about = "Terminal front end for the spell-correction service")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which correction backend the service is running.
    Info,
    /// Correct a piece of text.
    Correct { text: String },
    /// Show statistics about the labeled typo dataset.
    Stats,
    /// Fetch random dataset samples with the backend's correction attempts.
    Samples {
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
        count: u32,
    },
    /// Run the backend accuracy test over a random batch.
    Accuracy {
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=100))]
        sample_size: u32,
    },
}

/// Renders operation output straight to stdout. Busy toggles are a no-op
/// here since a one-shot command has nothing to disable.
struct StdoutView;

impl OperationView<CorrectResponse> for StdoutView {
    fn set_busy(&mut self, _busy: bool) {}

    fn render_result(&mut self, result: &CorrectResponse) {
        println!("original:  {}", result.original);
        println!("corrected: {}", result.corrected);
        if let Some(backend) = &result.backend {
            println!("backend:   {backend}");
        }
    }

    fn render_empty(&mut self, message: &str) {
        println!("{message}");
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

impl OperationView<DatasetStats> for StdoutView {
    fn set_busy(&mut self, _busy: bool) {}

    fn render_result(&mut self, stats: &DatasetStats) {
        if let Some(name) = &stats.dataset_name {
            println!("dataset: {name}");
        }
        println!("total entries:     {}", stats.total_entries);
        println!("single-word typos: {}", stats.single_word_typos);
        println!("multi-word typos:  {}", stats.multi_word_typos);
        println!("avg words/typo:    {:.2}", stats.avg_words_per_typo);
        println!("typo types:");
        println!("  missing letters: {}", stats.typo_types.missing_letters);
        println!("  extra letters:   {}", stats.typo_types.extra_letters);
        println!("  swapped letters: {}", stats.typo_types.swapped_letters);
        println!("  wrong letters:   {}", stats.typo_types.wrong_letters);
        if !stats.common_words.is_empty() {
            println!("most common words:");
            for entry in &stats.common_words {
                println!("  {} ({})", entry.word, entry.count);
            }
        }
    }

    fn render_empty(&mut self, message: &str) {
        println!("{message}");
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

impl OperationView<SampleSetDisplay> for StdoutView {
    fn set_busy(&mut self, _busy: bool) {}

    fn render_result(&mut self, display: &SampleSetDisplay) {
        println!(
            "match rate: {} ({} of {})",
            display.match_rate_label, display.match_count, display.total
        );
        for row in &display.rows {
            let mark = if row.matches { "ok " } else { "MISS" };
            println!(
                "  [{mark}] {:20} expected: {:20} got: {}",
                row.typo, row.expected, row.produced
            );
        }
    }

    fn render_empty(&mut self, message: &str) {
        println!("{message}");
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

impl OperationView<AccuracyDisplay> for StdoutView {
    fn set_busy(&mut self, _busy: bool) {}

    fn render_result(&mut self, display: &AccuracyDisplay) {
        println!(
            "accuracy: {} ({} of {} correct)",
            display.headline, display.correct_count, display.total_tested
        );
        print_partition("correct", &display.correct, |r| r.expected.clone());
        print_partition("incorrect", &display.incorrect, |r| r.corrected.clone());
    }

    fn render_empty(&mut self, message: &str) {
        println!("{message}");
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn print_partition(
    label: &str,
    partition: &PartitionDisplay,
    produced: impl Fn(&shared::protocol::AccuracyRecord) -> String,
) {
    println!("{label} ({}):", partition.total);
    for record in &partition.inline {
        println!("  {} -> {}", record.typo, produced(record));
    }
    if let Some(notice) = partition.overflow_notice() {
        println!("  {notice}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();
    let client = SpellServiceClient::with_timeout(
        &args.server_url,
        std::time::Duration::from_secs(args.timeout_secs),
    )?;
    let mut view = StdoutView;

    match args.command {
        Command::Info => {
            let info = client.backend_info().await?;
            println!("backend: {} ({})", info.backend, info.status);
            Ok(())
        }
        Command::Correct { text } => {
            let mut op = Operation::new("correct");
            ops::correct_text(&client, &mut op, &mut view, &text).await?;
            finish(&op)
        }
        Command::Stats => {
            let mut op = Operation::new("stats");
            ops::fetch_stats(&client, &mut op, &mut view).await;
            finish(&op)
        }
        Command::Samples { count } => {
            let mut op = Operation::new("samples");
            ops::fetch_samples(&client, &mut op, &mut view, count).await;
            finish(&op)
        }
        Command::Accuracy { sample_size } => {
            let mut op = Operation::new("accuracy");
            ops::run_accuracy_test(&client, &mut op, &mut view, sample_size).await;
            finish(&op)
        }
    }
}

/// Non-zero exit when the operation failed; the view already printed the
/// user-facing message.
fn finish(op: &Operation) -> Result<()> {
    if op.state() == OperationState::Failed {
        bail!("{} failed", op.name());
    }
    Ok(())
}

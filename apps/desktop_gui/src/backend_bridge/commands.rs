//! Backend commands queued from UI to backend worker.

pub enum BackendCommand {
    LoadBackendInfo,
    Correct { text: String },
    LoadStats,
    LoadSamples { count: u32 },
    RunAccuracyTest { sample_size: u32 },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadBackendInfo => "load_backend_info",
            BackendCommand::Correct { .. } => "correct",
            BackendCommand::LoadStats => "load_stats",
            BackendCommand::LoadSamples { .. } => "load_samples",
            BackendCommand::RunAccuracyTest { .. } => "run_accuracy_test",
        }
    }
}

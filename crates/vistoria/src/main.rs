//! Inspection processing worker.
//!
//! ```bash
//! vistoria-worker --config vistoria.json
//! vistoria-worker --config vistoria.json --json-logs --resume
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use vistoria::ai::{
    AiClient, HttpObjectDetector, ObjectDetector, SpeechToText, TextSummarizer, VisionAnalyzer,
};
use vistoria::processing::{Collaborators, JobRunner, ProcessingContext, ProcessingSettings};
use vistoria::worker::{BatchDispatcher, JobProgressBroadcaster};
use vistoria::{init_logging, load_config, Config, Database, DocumentTextExtractor, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "vistoria-worker")]
#[command(about = "Runs inspection artifact, cost and comparison jobs")]
#[command(version)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "VISTORIA_CONFIG")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Re-dispatch artifacts left pending by a previous run.
    #[arg(long)]
    resume: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_logging(format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> vistoria::Result<()> {
    info!("Starting vistoria-worker v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let db = Database::open(&PathBuf::from(&config.database_path))?;

    let ctx = ProcessingContext::new(
        db,
        build_collaborators(&config),
        ProcessingSettings::from_config(&config),
    );
    let dispatcher = BatchDispatcher::start(
        JobRunner::new(Arc::new(ctx)),
        config.worker_count,
        Some(JobProgressBroadcaster::default()),
    )?;

    if args.resume {
        let handles = dispatcher.resume_pending()?;
        info!("Resumed {} artifact jobs", handles.len());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.send(());
    }) {
        error!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Worker ready with {} threads", config.worker_count);
    let _ = rx.recv();

    info!("Shutdown signal received");
    dispatcher.shutdown();
    Ok(())
}

/// Wires the AI provider and detector from config. A provider that fails to
/// initialise is logged and replaced by its disabled form.
fn build_collaborators(config: &Config) -> Collaborators {
    let extractor = Arc::new(DocumentTextExtractor::from_config(&config.ocr));
    let mut collaborators = Collaborators::without_ai(extractor);

    if config.ai.enabled {
        match AiClient::from_config(&config.ai) {
            Ok(client) => {
                let client = Arc::new(client);
                collaborators.vision = Arc::clone(&client) as Arc<dyn VisionAnalyzer>;
                collaborators.speech = Arc::clone(&client) as Arc<dyn SpeechToText>;
                collaborators.summarizer = client as Arc<dyn TextSummarizer>;
                info!("AI provider enabled at {}", config.ai.endpoint);
            }
            Err(e) => warn!("AI provider disabled: {}", e),
        }
    }

    if config.detector.enabled {
        match HttpObjectDetector::from_config(&config.detector) {
            Ok(detector) => collaborators.detector = Arc::new(detector) as Arc<dyn ObjectDetector>,
            Err(e) => warn!("Object detector disabled: {}", e),
        }
    }

    collaborators
}

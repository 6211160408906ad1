mod infra;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use infra::{
    AppState, KeywordOverlapOracle, LogOnlyDispatcher, PlainTextExtractor, TemplateMessageGenerator,
};
use talentscope::config::AppConfig;
use talentscope::error::AppError;
use talentscope::telemetry;
use talentscope::workflows::recruitment::{
    recruitment_router, CandidateLedger, ContentStore, DecisionEngine, IncomingDocument,
    IntakeCoordinator, IntakeError, JsonSnapshotStore, LedgerError, PipelineState, SourceChannel,
};

#[derive(Parser, Debug)]
#[command(
    name = "TalentScope",
    about = "Run the candidate intake and decisioning pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Ingest local CV files through the manual channel and score them
    Analyze(AnalyzeArgs),
    /// Partition the current candidates against a threshold
    Decide(DecideArgs),
    /// Delete every stored CV and reset the ledger
    Purge,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Job description text to score against
    #[arg(long)]
    jd: String,
    /// CV files to ingest
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct DecideArgs {
    /// Shortlist threshold (0-100); scores at or above it shortlist
    #[arg(long, default_value_t = 65)]
    threshold: u8,
    /// Synthesize sample messages without dispatching anything
    #[arg(long)]
    preview: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Decide(args) => run_decide(args),
        Command::Purge => run_purge(),
    }
}

/// Wires the file-backed ledger and content store to the default
/// collaborators from `infra`.
fn build_pipeline(config: &AppConfig) -> PipelineState {
    let content = ContentStore::new(config.storage.upload_dir.clone());
    let ledger = Arc::new(CandidateLedger::open(Box::new(JsonSnapshotStore::new(
        config.storage.snapshot_file.clone(),
    ))));

    let intake = Arc::new(IntakeCoordinator::new(
        content.clone(),
        ledger.clone(),
        Box::new(KeywordOverlapOracle),
        Box::new(PlainTextExtractor),
    ));
    let decisions = Arc::new(DecisionEngine::new(
        ledger.clone(),
        Box::new(TemplateMessageGenerator),
        Box::new(LogOnlyDispatcher::default()),
        config.sender.clone(),
    ));

    PipelineState {
        intake,
        decisions,
        ledger,
        content,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = build_pipeline(&config);

    let app = recruitment_router(pipeline)
        .merge(
            Router::new()
                .route("/health", get(healthcheck))
                .route("/ready", get(readiness_endpoint))
                .route("/metrics", get(metrics_endpoint))
                .with_state(app_state),
        )
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "candidate pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = build_pipeline(&config);

    let mut documents = Vec::new();
    for path in &args.files {
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(IncomingDocument {
            bytes,
            filename,
            channel: SourceChannel::Manual,
            sender: None,
        });
    }

    let accepted = pipeline
        .intake
        .ingest(documents, &args.jd)
        .map_err(intake_error)?;

    println!("Accepted {} candidate(s)", accepted.len());
    for candidate in &accepted {
        println!(
            "- {} | {}% | {} | {}",
            candidate.candidate_name,
            candidate.score,
            candidate.status,
            candidate.cv_filename
        );
    }

    Ok(())
}

fn run_decide(args: DecideArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = build_pipeline(&config);

    let outcome = pipeline
        .decisions
        .decide(args.threshold, args.preview)
        .map_err(invalid_input)?;

    if args.preview {
        println!("Preview messages (threshold {})", args.threshold);
        for (name, preview) in &outcome.preview_messages {
            println!("\n== {name} ({:?}) ==\n{}", preview.kind, preview.message);
        }
        return Ok(());
    }

    println!(
        "Shortlisted {}, regretted {}, errors {}",
        outcome.shortlisted.len(),
        outcome.regretted.len(),
        outcome.errors.len()
    );
    for failure in &outcome.errors {
        println!("- error: {}: {}", failure.name, failure.reason);
    }

    Ok(())
}

fn run_purge() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = build_pipeline(&config);

    let content = pipeline.content.clone();
    let deleted = pipeline
        .ledger
        .mutate(|snapshot| content.purge_all(snapshot))
        .map_err(|err| match err {
            LedgerError::Storage(err) => AppError::Storage(err),
            LedgerError::Persist(err) => AppError::Persist(err),
        })?;

    println!("Deleted {deleted} stored document(s); ledger reset");
    Ok(())
}

fn intake_error(err: IntakeError) -> AppError {
    match err {
        IntakeError::Storage(err) => AppError::Storage(err),
        IntakeError::Persist(err) => AppError::Persist(err),
        other => invalid_input(other),
    }
}

fn invalid_input(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        err.to_string(),
    ))
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

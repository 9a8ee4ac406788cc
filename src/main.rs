use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use jobdesk::applications::{
    application_router, ApplicationService, ApplicationStatus, SubmitRequest,
};
use jobdesk::auth::Actor;
use jobdesk::catalog::{self, CompanyId, JobId, JobPosting};
use jobdesk::config::AppConfig;
use jobdesk::error::AppError;
use jobdesk::saved_jobs::{saved_job_router, SavedJobService};
use jobdesk::storage::{MemoryApplicationStore, MemoryJobCatalog, MemorySavedJobStore};
use jobdesk::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "jobdesk",
    about = "Job-board service: application lifecycle tracking and saved-job bookmarks",
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
    /// Walk one application through its lifecycle and print the audit trail
    Demo,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// CSV of job postings to load into the catalog at startup
    #[arg(long)]
    jobs_csv: Option<PathBuf>,
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
        Command::Demo => run_demo(),
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
    if let Some(path) = args.jobs_csv.take() {
        config.jobs_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let job_catalog = Arc::new(MemoryJobCatalog::default());
    if let Some(path) = &config.jobs_csv {
        let postings = catalog::load_postings(path)?;
        info!(count = postings.len(), path = %path.display(), "loaded job postings");
        job_catalog.extend(postings);
    }

    let applications = Arc::new(ApplicationService::new(
        Arc::new(MemoryApplicationStore::default()),
        job_catalog,
    ));
    let saved_jobs = Arc::new(SavedJobService::new(Arc::new(
        MemorySavedJobStore::default(),
    )));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(application_router(applications))
        .merge(saved_job_router(saved_jobs))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job-board service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_demo() -> Result<(), AppError> {
    let catalog = Arc::new(MemoryJobCatalog::with_postings([JobPosting {
        id: JobId("job-demo".to_string()),
        company_id: CompanyId("acme".to_string()),
        title: "Backend Engineer".to_string(),
        active: true,
    }]));
    let service = ApplicationService::new(Arc::new(MemoryApplicationStore::default()), catalog);

    let candidate = Actor::user("cand-demo");
    let company = Actor::company("acme");

    let record = service.submit(
        &candidate,
        SubmitRequest {
            job_id: JobId("job-demo".to_string()),
            profile: Default::default(),
        },
    )?;
    println!("submitted {} for job-demo", record.id.0);

    for (status, note) in [
        (ApplicationStatus::Reviewing, Some("screening call booked")),
        (ApplicationStatus::Shortlisted, None),
        (ApplicationStatus::Interview, Some("onsite scheduled")),
        (ApplicationStatus::Offered, None),
    ] {
        let updated = service.transition_status(
            &record.id,
            status,
            note.map(str::to_string),
            &company,
        )?;
        println!("-> {}", updated.status.label());
    }

    let finished = service.get(&record.id, &company)?;
    println!("\nstatus history:");
    for change in &finished.status_history {
        match &change.note {
            Some(note) => println!("  {} at {} ({note})", change.status.label(), change.changed_at),
            None => println!("  {} at {}", change.status.label(), change.changed_at),
        }
    }

    let counts = service.status_counts(&company, None)?;
    println!("\nstatus counts for acme:");
    for (status, count) in &counts.counts {
        println!("  {:<12} {count}", status.label());
    }
    println!("  {:<12} {}", "total", counts.total);

    Ok(())
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

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use diagnostic_advisor::advisor::Advisor;
use diagnostic_advisor::cli::{parse_symptoms, render_diagnosis, Args};
use diagnostic_advisor::config::AdvisorConfig;
use diagnostic_advisor::reports::JsonFileReportStore;
use diagnostic_advisor::store::InMemorySessionStore;
use diagnostic_advisor::web::{self, AppState};

fn init_tracing(config: &AdvisorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so one-shot output on stdout stays clean.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    init_tracing(&config);

    let advisor = Advisor::new(
        Arc::new(InMemorySessionStore::new()),
        config.failure_threshold,
    )?;

    if args.serve {
        let state = Arc::new(AppState {
            advisor,
            reports: Arc::new(JsonFileReportStore::new(config.reports_file.clone())),
        });
        web::serve(&config.bind_addr(), state).await?;
        return Ok(());
    }

    let symptoms = parse_symptoms(&args.symptoms).map_err(|e| format!("Invalid symptom: {}", e))?;
    let diagnosis = advisor.diagnose(&symptoms)?;
    print!("{}", render_diagnosis(&diagnosis));

    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use engine::aggregation::Aggregator;
use engine::config::Config;
use engine::models::{AggregationOutcome, CandidateProfile, IntakeRecord, ResumeRecord};
use engine::persistence::{JsonFileSink, ResultSink};
use engine::sources::file_registrations;

/// `profile.json` in the input directory: the resume and intake records.
#[derive(Debug, Deserialize)]
struct ProfileInput {
    #[serde(default)]
    resume: ResumeRecord,
    #[serde(default)]
    intake: IntakeRecord,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job aggregation engine v{}", env!("CARGO_PKG_VERSION"));

    let profile = load_profile(&config.input_dir.join("profile.json"))?;
    info!(
        role = %profile.preferred_role,
        locations = ?profile.locations,
        skills = ?profile.top_skills,
        years = profile.years_experience,
        "Candidate profile resolved"
    );

    let aggregator = file_registrations(&config.input_dir)
        .into_iter()
        .inspect(|registration| info!(?registration, "Registered source"))
        .fold(Aggregator::new(config.aggregation.clone()), Aggregator::register);

    let outcome = aggregator.aggregate(&profile).await?;
    match &outcome {
        AggregationOutcome::Results(result) => info!(
            run_id = %result.run_id,
            unique = result.unique_postings,
            shortlisted = result.best_matches.len(),
            "Aggregation finished"
        ),
        AggregationOutcome::NoResults { source_reports } => warn!(
            sources = source_reports.len(),
            "No job postings found from any source"
        ),
    }

    let sink = JsonFileSink::new(&config.output_dir, config.output_file.clone());
    let path = sink.save(&profile, &outcome).await?;
    info!("Results written to {}", path.display());

    Ok(())
}

fn load_profile(path: &Path) -> Result<CandidateProfile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile from {}", path.display()))?;
    let input: ProfileInput = serde_json::from_str(&raw)
        .with_context(|| format!("Profile at {} is not valid JSON", path.display()))?;
    CandidateProfile::from_records(&input.resume, &input.intake)
        .context("Profile records do not yield a valid candidate profile")
}

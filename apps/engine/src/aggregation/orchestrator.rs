//! Aggregation Orchestrator: fans out to every registered source, applies the
//! fallback policy, then drives Normalizer → Deduplicator → Scorer → Ranker.
//!
//! The only suspension points are source fetches. Everything after the
//! fan-out is synchronous over in-memory postings.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AggregationConfig;
use crate::dedup::dedupe;
use crate::errors::AggregatorError;
use crate::models::result::{FallbackReport, FetchStatus};
use crate::models::{
    AggregationOutcome, AggregationResult, CandidateProfile, FitSummary, JobPosting,
    ScoredJobPosting, SourceReport, SourceTag,
};
use crate::normalize::normalize_batch;
use crate::ranking::{rank, select};
use crate::scoring::{FitScorer, WeightedFitScorer};
use crate::sources::{JobSource, SourceRegistration};

// ────────────────────────────────────────────────────────────────────────────
// Fetch bookkeeping
// ────────────────────────────────────────────────────────────────────────────

/// One fetch of one source, already normalized.
struct Attempt {
    source: SourceTag,
    status: FetchStatus,
    raw_records: usize,
    postings: Vec<JobPosting>,
    dropped: usize,
    error: Option<String>,
    search_criteria: Option<serde_json::Value>,
}

/// Everything a registration contributed: its report and its postings,
/// primary first, fallback after.
struct RegistrationRun {
    report: SourceReport,
    postings: Vec<JobPosting>,
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregator
// ────────────────────────────────────────────────────────────────────────────

pub struct Aggregator {
    config: AggregationConfig,
    scorer: Arc<dyn FitScorer>,
    registrations: Vec<SourceRegistration>,
}

impl Aggregator {
    /// An aggregator with the default weighted scorer and no sources.
    pub fn new(config: AggregationConfig) -> Self {
        let scorer = Arc::new(WeightedFitScorer::new(&config));
        Self {
            config,
            scorer,
            registrations: Vec::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn FitScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Registration order is the order postings are concatenated in.
    pub fn register(mut self, registration: SourceRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Runs one aggregation for `profile`.
    ///
    /// Fails only on an invalid profile or configuration. Source failures are
    /// absorbed into the reports; a run that ends with no postings returns
    /// `AggregationOutcome::NoResults`.
    pub async fn aggregate(
        &self,
        profile: &CandidateProfile,
    ) -> Result<AggregationOutcome, AggregatorError> {
        profile.validate()?;
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            sources = self.registrations.len(),
            scorer = self.scorer.backend(),
            role = %profile.preferred_role,
            "Starting aggregation run"
        );

        let runs = join_all(
            self.registrations
                .iter()
                .map(|registration| self.run_registration(registration, profile)),
        )
        .await;

        let mut source_reports = Vec::with_capacity(runs.len());
        let mut merged: Vec<JobPosting> = Vec::new();
        for run in runs {
            source_reports.push(run.report);
            merged.extend(run.postings);
        }

        if merged.is_empty() {
            warn!(%run_id, "No postings from any source");
            return Ok(AggregationOutcome::NoResults { source_reports });
        }

        let mut per_source_raw: BTreeMap<SourceTag, Vec<JobPosting>> = BTreeMap::new();
        for posting in &merged {
            per_source_raw
                .entry(posting.source)
                .or_default()
                .push(posting.clone());
        }

        let unique = dedupe(&merged, &self.config.source_priority);

        let mut source_breakdown: BTreeMap<SourceTag, usize> =
            per_source_raw.keys().map(|tag| (*tag, 0)).collect();
        for posting in &unique {
            *source_breakdown.entry(posting.source).or_default() += 1;
        }

        let scored: Vec<ScoredJobPosting> = unique
            .iter()
            .map(|posting| self.scorer.score(profile, posting))
            .collect();
        let fit_summary = FitSummary::from_scored(&scored);

        let ranked = rank(scored);
        let best_matches = select(&ranked, &self.config.shortlist);

        info!(
            %run_id,
            merged = merged.len(),
            unique = unique.len(),
            shortlisted = best_matches.len(),
            strong = fit_summary.strong,
            medium = fit_summary.medium,
            "Aggregation run complete"
        );

        Ok(AggregationOutcome::Results(AggregationResult {
            run_id,
            generated_at: Utc::now(),
            best_matches,
            source_breakdown,
            per_source_raw,
            unique_postings: unique.len(),
            fit_summary,
            source_reports,
        }))
    }

    /// Fetches a primary and, when it errored, timed out or came up short,
    /// its fallback. The fallback is tried at most once.
    async fn run_registration(
        &self,
        registration: &SourceRegistration,
        profile: &CandidateProfile,
    ) -> RegistrationRun {
        let primary = self.attempt(registration.primary.as_ref(), profile).await;

        let needs_fallback = primary.status != FetchStatus::Ok
            || primary.postings.len() < self.config.min_usable_postings;

        let fallback = match (&registration.fallback, needs_fallback) {
            (Some(source), true) => {
                info!(
                    primary = %primary.source,
                    fallback = %source.tag(),
                    usable = primary.postings.len(),
                    "Primary came up short, trying fallback"
                );
                Some(self.attempt(source.as_ref(), profile).await)
            }
            _ => None,
        };

        let primary_normalized = primary.postings.len();
        let mut postings = primary.postings;
        let fallback_report = fallback.map(|attempt| {
            let report = FallbackReport {
                source: attempt.source,
                status: attempt.status,
                normalized: attempt.postings.len(),
                dropped: attempt.dropped,
                error: attempt.error,
            };
            postings.extend(attempt.postings);
            report
        });

        let report = SourceReport {
            source: primary.source,
            status: primary.status,
            raw_records: primary.raw_records,
            normalized: primary_normalized,
            dropped: primary.dropped,
            error: primary.error,
            fallback: fallback_report,
            search_criteria: primary.search_criteria,
        };

        info!(
            source = %report.source,
            status = ?report.status,
            normalized = report.normalized,
            dropped = report.dropped,
            usable = report.usable(),
            "Source finished"
        );

        RegistrationRun { report, postings }
    }

    /// One timed fetch, normalized. Never fails: errors become a report.
    async fn attempt(&self, source: &dyn JobSource, profile: &CandidateProfile) -> Attempt {
        let tag = source.tag();
        let timeout = self.config.source_timeout();

        let fetched = tokio::time::timeout(timeout, source.fetch(profile)).await;

        match fetched {
            Ok(Ok(batch)) => {
                let normalized = normalize_batch(&batch.records, tag);
                Attempt {
                    source: tag,
                    status: FetchStatus::Ok,
                    raw_records: batch.records.len(),
                    postings: normalized.postings,
                    dropped: normalized.dropped,
                    error: None,
                    search_criteria: batch.search_criteria,
                }
            }
            Ok(Err(e)) => {
                warn!(source = %tag, "Source fetch failed: {e}");
                Attempt::empty(tag, FetchStatus::Failed, e.to_string())
            }
            Err(_) => {
                warn!(source = %tag, timeout_secs = timeout.as_secs(), "Source fetch timed out");
                Attempt::empty(
                    tag,
                    FetchStatus::TimedOut,
                    format!("no response within {}s", timeout.as_secs()),
                )
            }
        }
    }
}

impl Attempt {
    fn empty(source: SourceTag, status: FetchStatus, error: String) -> Self {
        Self {
            source,
            status,
            raw_records: 0,
            postings: Vec::new(),
            dropped: 0,
            error: Some(error),
            search_criteria: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::models::RemotePreference;
    use crate::sources::{file_registrations, StaticSource};
    use serde_json::{json, Value};
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tempfile::TempDir;

    fn profile() -> CandidateProfile {
        CandidateProfile::new(
            "Platform Engineer",
            vec!["Pune".to_string()],
            RemotePreference::Any,
            None,
            5.0,
            vec!["Kubernetes".to_string(), "Terraform".to_string()],
        )
        .unwrap()
    }

    fn job(title: &str, company: &str, url: Option<&str>) -> Value {
        let mut record = json!({
            "title": title,
            "company": company,
            "location_area": "Pune",
            "required_skills": ["Kubernetes"],
        });
        if let Some(url) = url {
            record["job_url"] = json!(url);
        }
        record
    }

    fn jobs(prefix: &str, n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                job(
                    &format!("Platform Engineer {prefix}{i}"),
                    &format!("{prefix} Co {i}"),
                    Some(&format!("https://{prefix}.example/jobs/{i}")),
                )
            })
            .collect()
    }

    fn source(tag: SourceTag, records: Vec<Value>) -> Arc<dyn JobSource> {
        Arc::new(StaticSource::records(tag, records))
    }

    #[tokio::test]
    async fn test_same_url_across_sources_merges_to_higher_priority() {
        let aggregator = Aggregator::new(AggregationConfig::default())
            .register(SourceRegistration::new(source(
                SourceTag::Ddg,
                vec![job("Platform Engineer", "Acme", Some("http://x.com/job/1/"))],
            )))
            .register(SourceRegistration::new(source(
                SourceTag::Jsearch,
                vec![job("Platform Engineer", "Acme", Some("https://x.com/job/1"))],
            )));

        let result = aggregator.aggregate(&profile()).await.unwrap().into_result().unwrap();
        assert_eq!(result.unique_postings, 1);
        assert_eq!(result.best_matches[0].posting.source, SourceTag::Jsearch);
        assert_eq!(result.source_breakdown[&SourceTag::Jsearch], 1);
        assert_eq!(result.source_breakdown[&SourceTag::Ddg], 0);
        assert_eq!(result.per_source_raw[&SourceTag::Ddg].len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_short() {
        let aggregator = Aggregator::new(AggregationConfig::default()).register(
            SourceRegistration::new(source(SourceTag::Jsearch, jobs("js", 1)))
                .with_fallback(source(SourceTag::Ddg, jobs("ddg", 4))),
        );

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        let report = &outcome.source_reports()[0];
        assert_eq!(report.status, FetchStatus::Ok);
        assert_eq!(report.normalized, 1);
        let fallback = report.fallback.as_ref().unwrap();
        assert_eq!(fallback.source, SourceTag::Ddg);
        assert_eq!(fallback.normalized, 4);
        assert_eq!(report.usable(), 5);
        assert_eq!(outcome.result().unwrap().unique_postings, 5);
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_primary_sufficient() {
        let aggregator = Aggregator::new(AggregationConfig::default()).register(
            SourceRegistration::new(source(SourceTag::Adzuna, jobs("az", 3)))
                .with_fallback(source(SourceTag::Ddg, jobs("ddg", 4))),
        );

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        assert!(outcome.source_reports()[0].fallback.is_none());
        assert_eq!(outcome.result().unwrap().unique_postings, 3);
    }

    #[tokio::test]
    async fn test_failed_primary_triggers_fallback() {
        let failing: Arc<dyn JobSource> = Arc::new(StaticSource::failing(
            SourceTag::Jsearch,
            SourceError::Transport("connection reset".to_string()),
        ));
        let aggregator = Aggregator::new(AggregationConfig::default()).register(
            SourceRegistration::new(failing).with_fallback(source(SourceTag::Ddg, jobs("ddg", 2))),
        );

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        let report = &outcome.source_reports()[0];
        assert_eq!(report.status, FetchStatus::Failed);
        assert!(report.error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(report.usable(), 2);
    }

    #[tokio::test]
    async fn test_file_wiring_counts_each_ddg_record_once() {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, records: Vec<Value>| {
            std::fs::write(dir.path().join(name), Value::Array(records).to_string()).unwrap();
        };
        write("jsearch.json", jobs("js", 1));
        write("jsearch_ddg.json", jobs("jsddg", 2));
        write("adzuna.json", jobs("az", 1));
        write("ddg.json", jobs("ddg", 2));

        let aggregator = file_registrations(dir.path())
            .into_iter()
            .fold(Aggregator::new(AggregationConfig::default()), Aggregator::register);
        let outcome = aggregator.aggregate(&profile()).await.unwrap();

        let reports = outcome.source_reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].fallback.as_ref().map(|f| f.normalized), Some(2));
        assert!(reports[1].fallback.is_none());
        assert_eq!(reports[2].source, SourceTag::Ddg);
        assert_eq!(reports[2].status, FetchStatus::Ok);

        let result = outcome.result().unwrap();
        let ddg_raw = &result.per_source_raw[&SourceTag::Ddg];
        let urls: BTreeSet<_> = ddg_raw.iter().filter_map(|p| p.url.as_deref()).collect();
        assert_eq!(ddg_raw.len(), 4);
        assert_eq!(urls.len(), 4);
        assert_eq!(result.unique_postings, 6);
        assert_eq!(result.source_breakdown[&SourceTag::Ddg], 4);
    }

    #[tokio::test]
    async fn test_ddg_primary_queried_when_apis_are_full() {
        let dir = TempDir::new().unwrap();
        for (name, prefix) in [("jsearch.json", "js"), ("adzuna.json", "az"), ("ddg.json", "ddg")] {
            std::fs::write(dir.path().join(name), Value::Array(jobs(prefix, 3)).to_string()).unwrap();
        }

        let aggregator = file_registrations(dir.path())
            .into_iter()
            .fold(Aggregator::new(AggregationConfig::default()), Aggregator::register);
        let result = aggregator.aggregate(&profile()).await.unwrap().into_result().unwrap();

        assert_eq!(result.per_source_raw[&SourceTag::Ddg].len(), 3);
        assert_eq!(result.unique_postings, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out_without_blocking_others() {
        let slow: Arc<dyn JobSource> = Arc::new(
            StaticSource::records(SourceTag::Adzuna, jobs("az", 5)).with_delay(Duration::from_secs(120)),
        );
        let config = AggregationConfig {
            source_timeout_secs: 5,
            ..Default::default()
        };
        let aggregator = Aggregator::new(config)
            .register(SourceRegistration::new(slow))
            .register(SourceRegistration::new(source(SourceTag::Jsearch, jobs("js", 3))));

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        let reports = outcome.source_reports();
        assert_eq!(reports[0].status, FetchStatus::TimedOut);
        assert_eq!(reports[0].usable(), 0);
        assert_eq!(reports[1].status, FetchStatus::Ok);
        assert_eq!(outcome.result().unwrap().unique_postings, 3);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_no_results() {
        let failing = |tag| -> Arc<dyn JobSource> {
            Arc::new(StaticSource::failing(tag, SourceError::Unavailable("down".to_string())))
        };
        let aggregator = Aggregator::new(AggregationConfig::default())
            .register(SourceRegistration::new(failing(SourceTag::Jsearch)).with_fallback(failing(SourceTag::Ddg)))
            .register(SourceRegistration::new(failing(SourceTag::Adzuna)));

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        match outcome {
            AggregationOutcome::NoResults { source_reports } => {
                assert_eq!(source_reports.len(), 2);
                assert_eq!(
                    source_reports[0].fallback.as_ref().map(|f| f.status),
                    Some(FetchStatus::Failed)
                );
            }
            AggregationOutcome::Results(_) => panic!("expected no results"),
        }
    }

    #[tokio::test]
    async fn test_malformed_records_counted_in_report() {
        let records = vec![json!({"title": "Platform Engineer"}), json!(42), json!({"company": "x"})];
        let aggregator = Aggregator::new(AggregationConfig {
            min_usable_postings: 1,
            ..Default::default()
        })
        .register(SourceRegistration::new(source(SourceTag::Ddg, records)));

        let outcome = aggregator.aggregate(&profile()).await.unwrap();
        let report = &outcome.source_reports()[0];
        assert_eq!(report.raw_records, 3);
        assert_eq!(report.normalized, 1);
        assert_eq!(report.dropped, 2);
    }

    #[tokio::test]
    async fn test_invalid_profile_rejected() {
        let mut bad = profile();
        bad.years_experience = -1.0;
        let err = Aggregator::new(AggregationConfig::default())
            .aggregate(&bad)
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::InvalidProfile(_)));
    }

    #[tokio::test]
    async fn test_shortlist_bounded_and_summary_covers_all() {
        let aggregator = Aggregator::new(AggregationConfig::default())
            .register(SourceRegistration::new(source(SourceTag::Jsearch, jobs("js", 10))))
            .register(SourceRegistration::new(source(SourceTag::Adzuna, jobs("az", 10))));

        let result = aggregator.aggregate(&profile()).await.unwrap().into_result().unwrap();
        assert_eq!(result.unique_postings, 20);
        assert!(result.best_matches.len() >= 8 && result.best_matches.len() <= 12);
        assert_eq!(result.fit_summary.total(), 20);
        assert_eq!(result.source_breakdown.values().sum::<usize>(), 20);
    }

    /// Scores every posting by title length, so ranking order is predictable.
    struct TitleLengthScorer(WeightedFitScorer);

    impl FitScorer for TitleLengthScorer {
        fn score(&self, profile: &CandidateProfile, posting: &JobPosting) -> ScoredJobPosting {
            let mut scored = self.0.score(profile, posting);
            scored.matched_criteria.clear();
            scored.overall_score = posting.title.len() as f64;
            scored
        }

        fn backend(&self) -> &'static str {
            "title-length"
        }
    }

    #[tokio::test]
    async fn test_custom_scorer_drives_ranking() {
        let records = vec![
            job("SRE", "A", Some("https://a.example/1")),
            job("Platform Engineer II", "B", Some("https://b.example/1")),
            job("Data Engineer", "C", Some("https://c.example/1")),
        ];
        let config = AggregationConfig::default();
        let aggregator = Aggregator::new(config.clone())
            .with_scorer(Arc::new(TitleLengthScorer(WeightedFitScorer::new(&config))))
            .register(SourceRegistration::new(source(SourceTag::Ddg, records)));

        let result = aggregator.aggregate(&profile()).await.unwrap().into_result().unwrap();
        let titles: Vec<&str> = result
            .best_matches
            .iter()
            .map(|s| s.posting.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Platform Engineer II", "Data Engineer", "SRE"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_independent_of_completion_order() {
        let build = |fast_first: bool| {
            let (a, b) = if fast_first { (1, 30) } else { (30, 1) };
            Aggregator::new(AggregationConfig::default())
                .register(SourceRegistration::new(Arc::new(
                    StaticSource::records(SourceTag::Jsearch, jobs("js", 4))
                        .with_delay(Duration::from_millis(a)),
                )))
                .register(SourceRegistration::new(Arc::new(
                    StaticSource::records(SourceTag::Adzuna, jobs("az", 4))
                        .with_delay(Duration::from_millis(b)),
                )))
        };

        let first = build(true).aggregate(&profile()).await.unwrap().into_result().unwrap();
        let second = build(false).aggregate(&profile()).await.unwrap().into_result().unwrap();

        let titles = |r: &AggregationResult| -> Vec<String> {
            r.best_matches.iter().map(|s| s.posting.title.clone()).collect()
        };
        assert_eq!(titles(&first), titles(&second));
        assert_eq!(first.source_breakdown, second.source_breakdown);
        assert_eq!(first.source_reports, second.source_reports);
    }
}

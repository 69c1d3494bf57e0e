//! Posting Normalizer: maps each source's loosely-typed records onto `JobPosting`.
//!
//! Untyped `serde_json::Value`s stop here. Anything absent or unparsable becomes
//! `None`; nothing is guessed. A record that cannot yield a title is dropped
//! and counted, the rest of the batch carries on.

mod fields;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{JobPosting, SourceTag};

use fields::{number_field, skills_field, text_field};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no usable title")]
    MissingTitle,
}

/// Result of normalizing one source batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub postings: Vec<JobPosting>,
    pub dropped: usize,
}

/// Normalizes every record of a batch, dropping and counting malformed ones.
pub fn normalize_batch(records: &[Value], source: SourceTag) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, raw) in records.iter().enumerate() {
        match normalize(raw, source) {
            Ok(posting) => batch.postings.push(posting),
            Err(e) => {
                debug!(source = %source, index, "dropping record: {e}");
                batch.dropped += 1;
            }
        }
    }
    batch
}

/// Converts one raw record into a canonical posting.
pub fn normalize(raw: &Value, source: SourceTag) -> Result<JobPosting, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let posting = match source {
        SourceTag::Jsearch => normalize_jsearch(raw),
        SourceTag::Adzuna => normalize_adzuna(raw),
        SourceTag::Ddg => normalize_canonical(raw, source),
    };

    if posting.title.is_empty() {
        return Err(NormalizeError::MissingTitle);
    }
    Ok(posting)
}

/// The shape every source agent is asked to emit. Also the only shape `ddg` has.
fn normalize_canonical(raw: &Value, source: SourceTag) -> JobPosting {
    JobPosting {
        title: text_field(raw, &["title"]).unwrap_or_default(),
        company: text_field(raw, &["company"]),
        location_area: text_field(raw, &["location_area", "location"]),
        url: text_field(raw, &["job_url", "url"]),
        source,
        salary_min: number_field(raw, &["salary_min"]),
        salary_max: number_field(raw, &["salary_max"]),
        salary_currency: text_field(raw, &["salary_currency"]),
        job_type: text_field(raw, &["job_type"]),
        remote_type: text_field(raw, &["remote_type"]),
        experience_required: text_field(raw, &["experience_required"]),
        required_skills: skills_field(raw, &["required_skills"]),
        preferred_skills: skills_field(raw, &["preferred_skills"]),
    }
}

fn normalize_jsearch(raw: &Value) -> JobPosting {
    let canonical = normalize_canonical(raw, SourceTag::Jsearch);

    let location = canonical.location_area.or_else(|| {
        let parts: Vec<String> = ["job_city", "job_state", "job_country"]
            .iter()
            .filter_map(|key| text_field(raw, &[*key]))
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    });

    let remote_type = canonical.remote_type.or_else(|| {
        raw.get("job_is_remote")
            .and_then(|v| v.as_bool())
            .filter(|remote| *remote)
            .map(|_| "remote".to_string())
    });

    let experience_required = canonical.experience_required.or_else(|| {
        raw.pointer("/job_required_experience/required_experience_in_months")
            .and_then(|v| v.as_f64())
            .filter(|months| months.is_finite() && *months > 0.0)
            .map(|months| {
                let years = (months / 12.0 * 10.0).round() / 10.0;
                format!("{years}+ years")
            })
    });

    JobPosting {
        title: if canonical.title.is_empty() {
            text_field(raw, &["job_title"]).unwrap_or_default()
        } else {
            canonical.title
        },
        company: canonical.company.or_else(|| text_field(raw, &["employer_name"])),
        location_area: location,
        url: canonical
            .url
            .or_else(|| text_field(raw, &["job_apply_link", "job_google_link"])),
        source: SourceTag::Jsearch,
        salary_min: canonical
            .salary_min
            .or_else(|| number_field(raw, &["job_min_salary"])),
        salary_max: canonical
            .salary_max
            .or_else(|| number_field(raw, &["job_max_salary"])),
        salary_currency: canonical
            .salary_currency
            .or_else(|| text_field(raw, &["job_salary_currency"])),
        job_type: canonical
            .job_type
            .or_else(|| text_field(raw, &["job_employment_type"])),
        remote_type,
        experience_required,
        required_skills: canonical
            .required_skills
            .or_else(|| skills_field(raw, &["job_required_skills"])),
        preferred_skills: canonical.preferred_skills,
    }
}

fn normalize_adzuna(raw: &Value) -> JobPosting {
    let canonical = normalize_canonical(raw, SourceTag::Adzuna);

    JobPosting {
        company: canonical
            .company
            .or_else(|| text_field(raw, &["company.display_name"])),
        location_area: canonical
            .location_area
            .or_else(|| text_field(raw, &["location.display_name"])),
        url: canonical.url.or_else(|| text_field(raw, &["redirect_url"])),
        job_type: canonical
            .job_type
            .or_else(|| text_field(raw, &["contract_time", "contract_type"])),
        ..canonical
    }
}

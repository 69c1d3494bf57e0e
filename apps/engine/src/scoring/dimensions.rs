//! The five dimension scorers. Each returns a `[0, 3]` score with its evidence,
//! or a `DimensionError` the combiner turns into a zero.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::dedup::locations_overlap;
use crate::models::scored::{
    ExperienceScore, LocationReason, LocationScore, RoleScore, SalaryReason, SalaryScore,
    SkillsScore, MAX_DIMENSION_SCORE,
};
use crate::models::{JobPosting, RemotePreference};
use crate::scoring::similarity::SimilarityMetric;

/// Floor for a role whose name, or one of its words, appears in the title.
pub const ROLE_SUBSTRING_FLOOR: f64 = 1.2;

/// Cap on the skills denominator, so long wish-lists do not drown a match.
pub const MAX_SKILL_DENOM: usize = 3;

/// Score given when salary cannot be compared.
pub const SALARY_NEUTRAL_SCORE: f64 = 1.0;

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\b").unwrap());

#[derive(Debug, Error, PartialEq)]
pub enum DimensionError {
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

fn clamp_score(x: f64) -> f64 {
    x.clamp(0.0, MAX_DIMENSION_SCORE)
}

pub(crate) fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

fn finite(x: f64, what: &'static str) -> Result<f64, DimensionError> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(DimensionError::NonFinite(what))
    }
}

pub fn score_role(
    metric: &dyn SimilarityMetric,
    preferred_role: &str,
    title: &str,
) -> Result<RoleScore, DimensionError> {
    let role = preferred_role.trim().to_lowercase();
    let title = title.trim().to_lowercase();
    if role.is_empty() || title.is_empty() {
        return Ok(RoleScore {
            score: 0.0,
            similarity: 0.0,
        });
    }

    let similarity = finite(metric.ratio(&role, &title), "role similarity")?.clamp(0.0, 1.0);
    let mut score = clamp_score(similarity * MAX_DIMENSION_SCORE);

    let substring_hit =
        title.contains(&role) || role.split_whitespace().any(|tok| title.contains(tok));
    if substring_hit {
        score = score.max(ROLE_SUBSTRING_FLOOR);
    }

    Ok(RoleScore {
        score: round_to(score, 3),
        similarity: round_to(similarity, 3),
    })
}

/// Exact-or-substring overlap between the candidate's skills and the posting's
/// required and preferred skills.
pub fn score_skills(user_skills: &[String], posting: &JobPosting) -> SkillsScore {
    let job_skills_known = posting.all_skills().is_some();

    let mut job_skills: Vec<String> = Vec::new();
    for skill in posting.all_skills().unwrap_or_default() {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !job_skills.contains(&skill) {
            job_skills.push(skill);
        }
    }

    let mut matched: Vec<String> = Vec::new();
    let mut seen_user: Vec<String> = Vec::new();
    for user in user_skills {
        let user = user.trim().to_lowercase();
        if user.is_empty() || seen_user.contains(&user) {
            continue;
        }
        if let Some(hit) = job_skills
            .iter()
            .find(|job| **job == user || job.contains(user.as_str()) || user.contains(job.as_str()))
        {
            if !matched.contains(hit) {
                matched.push(hit.clone());
            }
        }
        seen_user.push(user);
    }

    let denom = job_skills.len().min(MAX_SKILL_DENOM).max(1);
    let ratio = matched.len() as f64 / denom as f64;

    SkillsScore {
        score: round_to(clamp_score(ratio * MAX_DIMENSION_SCORE), 3),
        matched_skills: matched,
        job_skills_known,
    }
}

/// Every number in a requirement text such as `"3-5 years"` or `"5+ yrs"`.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    RE_NUMBER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect()
}

pub fn score_experience(
    years_experience: f64,
    requirement: Option<&str>,
) -> Result<ExperienceScore, DimensionError> {
    let years = finite(years_experience, "years of experience")?;
    let numbers = requirement.map(extract_numbers).unwrap_or_default();

    let Some(required) = numbers.into_iter().reduce(f64::max) else {
        let score = if years >= 1.0 { 1.0 } else { 0.0 };
        return Ok(ExperienceScore {
            score,
            required_years: None,
        });
    };

    let score = if required <= 0.0 {
        0.0
    } else if years >= required {
        MAX_DIMENSION_SCORE
    } else {
        clamp_score(years / required * MAX_DIMENSION_SCORE)
    };

    Ok(ExperienceScore {
        score: round_to(score, 3),
        required_years: Some(required),
    })
}

/// Location fit: exact place, shared token, then remote compatibility.
pub fn score_location(
    candidate_locations: &[String],
    remote_preference: RemotePreference,
    posting: &JobPosting,
) -> LocationScore {
    if let Some(job_location) = posting
        .location_area
        .as_deref()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
    {
        let mut overlap = false;

        for candidate in candidate_locations {
            let candidate = candidate.trim().to_lowercase();
            if candidate.is_empty() {
                continue;
            }
            if candidate == job_location {
                return LocationScore {
                    score: 3.0,
                    reason: LocationReason::ExactMatch,
                };
            }
            overlap |= locations_overlap(&candidate, &job_location);
        }

        if overlap {
            return LocationScore {
                score: 2.0,
                reason: LocationReason::TokenOverlap,
            };
        }
    }

    let remote_type = posting
        .remote_type
        .as_deref()
        .map(|r| r.trim().to_lowercase())
        .unwrap_or_default();

    if !remote_type.is_empty() && remote_type.contains(remote_preference.as_str()) {
        return LocationScore {
            score: 2.0,
            reason: LocationReason::RemoteCompatible,
        };
    }
    if posting.is_remote() && remote_preference.accepts_remote() {
        return LocationScore {
            score: 1.5,
            reason: LocationReason::JobRemoteUserFlexible,
        };
    }

    LocationScore {
        score: 0.0,
        reason: LocationReason::NoMatch,
    }
}

/// Share of the target the posting's salary midpoint reaches.
pub fn score_salary(
    target: Option<f64>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
) -> Result<SalaryScore, DimensionError> {
    let Some(target) = target else {
        return Ok(SalaryScore {
            score: SALARY_NEUTRAL_SCORE,
            reason: SalaryReason::NoExpectation,
        });
    };

    let midpoint = match (salary_min, salary_max) {
        (Some(min), Some(max)) => (min + max) / 2.0,
        (Some(bound), None) | (None, Some(bound)) => bound,
        (None, None) => {
            return Ok(SalaryScore {
                score: SALARY_NEUTRAL_SCORE,
                reason: SalaryReason::SalaryUnknown,
            })
        }
    };
    let target = finite(target, "salary target")?;
    let midpoint = finite(midpoint, "salary midpoint")?;

    if midpoint >= target {
        return Ok(SalaryScore {
            score: MAX_DIMENSION_SCORE,
            reason: SalaryReason::MeetsExpectation,
        });
    }

    let ratio = if target > 0.0 { midpoint / target } else { 0.0 };
    let reason = if ratio >= 0.8 {
        SalaryReason::Near
    } else if ratio >= 0.5 {
        SalaryReason::Below
    } else {
        SalaryReason::FarBelow
    };

    Ok(SalaryScore {
        score: round_to(clamp_score(ratio * MAX_DIMENSION_SCORE), 3),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceTag;
    use crate::scoring::similarity::LevenshteinSimilarity;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn posting_with_skills(required: Option<&[&str]>, preferred: Option<&[&str]>) -> JobPosting {
        JobPosting {
            required_skills: required.map(strings),
            preferred_skills: preferred.map(strings),
            ..JobPosting::new("Engineer", SourceTag::Ddg)
        }
    }

    #[test]
    fn test_role_exact_match_is_full_score() {
        let role = score_role(&LevenshteinSimilarity, "Data Engineer", "data engineer").unwrap();
        assert_eq!(role.score, 3.0);
        assert_eq!(role.similarity, 1.0);
    }

    #[test]
    fn test_role_token_substring_floors_score() {
        let role = score_role(&LevenshteinSimilarity, "SRE", "Staff SRE, Payments Infrastructure Platform")
            .unwrap();
        assert!(role.score >= ROLE_SUBSTRING_FLOOR, "score was {}", role.score);
    }

    #[test]
    fn test_role_empty_inputs_score_zero() {
        assert_eq!(score_role(&LevenshteinSimilarity, "", "Engineer").unwrap().score, 0.0);
        assert_eq!(score_role(&LevenshteinSimilarity, "Engineer", "  ").unwrap().score, 0.0);
    }

    #[test]
    fn test_skills_two_of_three_matched() {
        let posting = posting_with_skills(Some(&["Kubernetes", "AWS"]), Some(&["Terraform"]));
        let skills = score_skills(&strings(&["Kubernetes", "Terraform", "Go"]), &posting);
        assert_eq!(skills.score, 2.0);
        assert_eq!(skills.matched_skills, strings(&["kubernetes", "terraform"]));
        assert!(skills.job_skills_known);
    }

    #[test]
    fn test_skills_substring_match_either_direction() {
        let posting = posting_with_skills(Some(&["AWS Lambda", "k8s"]), None);
        let skills = score_skills(&strings(&["aws", "k8s operators"]), &posting);
        assert_eq!(skills.matched_skills, strings(&["aws lambda", "k8s"]));
        assert_eq!(skills.score, 3.0);
    }

    #[test]
    fn test_skills_denominator_capped_and_floored() {
        let many = posting_with_skills(Some(&["a1", "b2", "c3", "d4", "e5", "f6"]), None);
        assert_eq!(score_skills(&strings(&["a1"]), &many).score, 1.0);

        let unknown = posting_with_skills(None, None);
        let skills = score_skills(&strings(&["a1"]), &unknown);
        assert_eq!(skills.score, 0.0);
        assert!(!skills.job_skills_known);

        let empty = posting_with_skills(Some(&[]), None);
        let skills = score_skills(&strings(&["a1"]), &empty);
        assert_eq!(skills.score, 0.0);
        assert!(skills.job_skills_known);
    }

    #[test]
    fn test_skills_same_job_skill_not_counted_twice() {
        let posting = posting_with_skills(Some(&["python"]), None);
        let skills = score_skills(&strings(&["py", "python"]), &posting);
        assert_eq!(skills.matched_skills, strings(&["python"]));
        assert_eq!(skills.score, 3.0);
    }

    #[test]
    fn test_experience_proportional_below_requirement() {
        let exp = score_experience(2.0, Some("5+ years")).unwrap();
        assert!((exp.score - 1.2).abs() < 1e-9, "score was {}", exp.score);
        assert_eq!(exp.required_years, Some(5.0));
    }

    #[test]
    fn test_experience_uses_largest_number() {
        let exp = score_experience(4.0, Some("3-5 years")).unwrap();
        assert_eq!(exp.required_years, Some(5.0));
        assert!((exp.score - 2.4).abs() < 1e-9);
        assert_eq!(score_experience(6.0, Some("3-5 years")).unwrap().score, 3.0);
    }

    #[test]
    fn test_experience_without_numbers_depends_on_candidate_only() {
        assert_eq!(score_experience(3.0, Some("Senior level")).unwrap().score, 1.0);
        assert_eq!(score_experience(0.5, Some("Senior level")).unwrap().score, 0.0);
        assert_eq!(score_experience(3.0, None).unwrap().score, 1.0);
        assert_eq!(score_experience(0.0, None).unwrap().score, 0.0);
    }

    #[test]
    fn test_experience_zero_requirement_scores_zero() {
        assert_eq!(score_experience(3.0, Some("0 years")).unwrap().score, 0.0);
    }

    #[test]
    fn test_experience_non_finite_is_error() {
        assert!(score_experience(f64::NAN, Some("2 years")).is_err());
    }

    #[test]
    fn test_extract_numbers() {
        assert_eq!(extract_numbers("2.5 - 4 yrs"), vec![2.5, 4.0]);
        assert!(extract_numbers("several years").is_empty());
    }

    fn located(location: Option<&str>, remote: Option<&str>) -> JobPosting {
        JobPosting {
            location_area: location.map(str::to_string),
            remote_type: remote.map(str::to_string),
            ..JobPosting::new("Engineer", SourceTag::Ddg)
        }
    }

    #[test]
    fn test_location_exact_match() {
        let loc = score_location(&strings(&["Pune"]), RemotePreference::Onsite, &located(Some(" PUNE "), None));
        assert_eq!(loc.score, 3.0);
        assert_eq!(loc.reason, LocationReason::ExactMatch);
    }

    #[test]
    fn test_location_exact_match_on_any_candidate_location() {
        let loc = score_location(
            &strings(&["Pune, India", "Austin"]),
            RemotePreference::Onsite,
            &located(Some("austin"), None),
        );
        assert_eq!(loc.reason, LocationReason::ExactMatch);
    }

    #[test]
    fn test_location_token_overlap() {
        let loc = score_location(
            &strings(&["Bengaluru, Karnataka"]),
            RemotePreference::Onsite,
            &located(Some("Bengaluru Area"), None),
        );
        assert_eq!(loc.score, 2.0);
        assert_eq!(loc.reason, LocationReason::TokenOverlap);
    }

    #[test]
    fn test_location_remote_compatible() {
        let loc = score_location(&strings(&["Pune"]), RemotePreference::Hybrid, &located(Some("Austin"), Some("Hybrid")));
        assert_eq!(loc.score, 2.0);
        assert_eq!(loc.reason, LocationReason::RemoteCompatible);
    }

    #[test]
    fn test_location_remote_job_flexible_candidate() {
        let loc = score_location(&strings(&["Pune"]), RemotePreference::Any, &located(None, Some("remote")));
        assert_eq!(loc.score, 1.5);
        assert_eq!(loc.reason, LocationReason::JobRemoteUserFlexible);

        let onsite = score_location(&strings(&["Pune"]), RemotePreference::Onsite, &located(None, Some("remote")));
        assert_eq!(onsite.score, 0.0);
        assert_eq!(onsite.reason, LocationReason::NoMatch);
    }

    #[test]
    fn test_salary_neutral_without_target() {
        let s = score_salary(None, Some(10.0), Some(20.0)).unwrap();
        assert_eq!(s.score, 1.0);
        assert_eq!(s.reason, SalaryReason::NoExpectation);
    }

    #[test]
    fn test_salary_neutral_without_posting_salary() {
        let s = score_salary(Some(100.0), None, None).unwrap();
        assert_eq!(s.score, 1.0);
        assert_eq!(s.reason, SalaryReason::SalaryUnknown);
    }

    #[test]
    fn test_salary_bands() {
        let meets = score_salary(Some(100.0), Some(90.0), Some(130.0)).unwrap();
        assert_eq!(meets.score, 3.0);
        assert_eq!(meets.reason, SalaryReason::MeetsExpectation);

        let near = score_salary(Some(100.0), Some(85.0), None).unwrap();
        assert_eq!(near.reason, SalaryReason::Near);
        assert!((near.score - 2.55).abs() < 1e-9);

        let below = score_salary(Some(100.0), None, Some(60.0)).unwrap();
        assert_eq!(below.reason, SalaryReason::Below);

        let far = score_salary(Some(100.0), Some(20.0), Some(40.0)).unwrap();
        assert_eq!(far.reason, SalaryReason::FarBelow);
        assert!((far.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_salary_non_finite_is_error() {
        assert!(score_salary(Some(100.0), Some(f64::INFINITY), None).is_err());
    }
}

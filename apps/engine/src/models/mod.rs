pub mod posting;
pub mod profile;
pub mod result;
pub mod scored;

pub use posting::{JobPosting, SourceTag};
pub use profile::{CandidateProfile, IntakeRecord, RemotePreference, ResumeRecord};
pub use result::{AggregationOutcome, AggregationResult, FitSummary, SourceReport};
pub use scored::{Dimension, DimensionScores, FitLevel, KeyGap, ScoredJobPosting};

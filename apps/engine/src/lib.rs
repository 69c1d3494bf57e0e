//! Job posting aggregation, deduplication and fit scoring.
//!
//! Raw records from several sources are normalized into `JobPosting`s,
//! collapsed to one posting per real listing, scored against a
//! `CandidateProfile` and cut down to a ranked shortlist.

pub mod aggregation;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod persistence;
pub mod ranking;
pub mod scoring;
pub mod sources;

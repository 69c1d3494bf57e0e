// Aggregation Orchestrator
// Concurrent source fan-out with per-source timeout and fallback, followed by
// the synchronous normalize → dedup → score → rank pipeline.

pub mod orchestrator;

pub use orchestrator::Aggregator;

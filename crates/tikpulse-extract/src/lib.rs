//! Best-effort statistics extraction from public TikTok pages.
//!
//! Everything in this crate is synchronous and allocation-local: callers hand
//! in an HTML string they fetched elsewhere and get back a fully-shaped
//! result. No operation returns an error or panics on hostile input; missing
//! data is represented by zero values.
//!
//! The video pipeline is a fixed-priority waterfall (see [`cascade`]):
//! embedded page state, JSON-LD, regex brute force, DOM selectors, then a
//! social-preview metadata backfill.

pub mod cascade;
pub mod count;
pub mod hashtags;
pub mod niche;
pub mod profile;
pub mod rates;
pub mod state;
pub mod types;

mod strategies;

pub use cascade::{
    extract, extract_with_trace, Cascade, CascadePolicy, ExtractionTrace, Strategy, StrategyReport,
};
pub use count::{parse_count, parse_count_value};
pub use hashtags::extract_hashtags;
pub use niche::{benchmark_for, infer_niche, infer_niche_or_default, Niche, NicheBenchmark};
pub use profile::{
    derive_account_metrics, parse_profile, AccountMetrics, ProfileSnapshot, ProfileStats,
    ProfileUser, VideoSummary, DEFAULT_SAMPLE_SIZE,
};
pub use rates::{
    derive_rates, estimated_completion_rate, percent_of, round2, PerformanceLevel,
    PerformanceThresholds, RateSet,
};
pub use state::{locate_embedded_state, STATE_CONTAINER_IDS};
pub use types::{Counts, ExtractionResult, Hashtags};

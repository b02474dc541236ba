//! Persistence for analyses: a small Redis-like key-value layer and the
//! analysis indexes, counters and niche patterns built on top of it.

pub mod analysis;
pub mod error;
pub mod kv;
pub mod playbook;
pub mod record;

pub use analysis::{compute_patterns, recommendations_for, AnalysisStore, PATTERN_MIN_ANALYSES};
pub use error::StoreError;
pub use kv::{FileKv, KvStore, MemoryKv, RestKv};
pub use playbook::playbook_for;
pub use record::{
    AggregateStats, AnalysisKind, AnalysisRecord, HashtagCount, NicheInsights, NichePatterns,
    NichePlaybook, Priority, Recommendation, RecordMetrics, TopPerformer,
};

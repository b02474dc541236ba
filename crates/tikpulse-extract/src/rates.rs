//! Engagement-rate derivation and performance classification.

use serde::{Deserialize, Serialize};

use crate::types::Counts;

/// Rates as percentages of views, rounded to two decimals. All zero when
/// `views == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSet {
    pub engagement_rate: f64,
    pub like_rate: f64,
    pub comment_rate: f64,
    pub share_rate: f64,
    pub save_rate: f64,
    pub total_interactions: u64,
    /// Rough heuristic, not a measured value: see [`estimated_completion_rate`].
    pub estimated_completion_rate: f64,
}

/// Derive [`RateSet`] from raw counters.
///
/// `duration_seconds` only feeds the completion estimate; pass 0 when it is
/// unknown.
#[must_use]
pub fn derive_rates(counts: &Counts, duration_seconds: u64) -> RateSet {
    let total_interactions = counts.total_interactions();
    let pct = |metric: u64| percent_of(metric, counts.views);

    RateSet {
        engagement_rate: pct(total_interactions),
        like_rate: pct(counts.likes),
        comment_rate: pct(counts.comments),
        share_rate: pct(counts.shares),
        save_rate: pct(counts.saves),
        total_interactions,
        estimated_completion_rate: estimated_completion_rate(counts, duration_seconds),
    }
}

/// Estimated watch-completion percentage.
///
/// This is a heuristic with no measured basis: `interactions / views`
/// scaled by the video duration and a factor of 2, clamped to `[0, 100]`
/// and rounded to two decimals. It is 0 when views or duration are unknown.
#[must_use]
pub fn estimated_completion_rate(counts: &Counts, duration_seconds: u64) -> f64 {
    const SCALE: f64 = 2.0;
    if counts.views == 0 || duration_seconds == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = counts.total_interactions() as f64 / counts.views as f64
        * duration_seconds as f64
        * SCALE;
    round2(raw.clamp(0.0, 100.0))
}

/// `round2(100 * metric / views)`, or 0 when `views == 0`.
#[must_use]
pub fn percent_of(metric: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = metric as f64 * 100.0 / views as f64;
    round2(pct)
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Coarse engagement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Viral,
    Excellent,
    VeryGood,
    Good,
    Average,
    Low,
}

impl PerformanceLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceLevel::Viral => "viral",
            PerformanceLevel::Excellent => "excellent",
            PerformanceLevel::VeryGood => "very_good",
            PerformanceLevel::Good => "good",
            PerformanceLevel::Average => "average",
            PerformanceLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict lower bounds (engagement rate, percent) for each level. A rate must
/// be strictly greater than a bound to reach that level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceThresholds {
    pub viral: f64,
    pub excellent: f64,
    pub very_good: f64,
    pub good: f64,
    pub average: f64,
}

impl PerformanceThresholds {
    pub const DEFAULT_VIRAL: f64 = 10.0;
    pub const DEFAULT_EXCELLENT: f64 = 5.0;
    pub const DEFAULT_VERY_GOOD: f64 = 3.0;
    pub const DEFAULT_GOOD: f64 = 1.0;
    pub const DEFAULT_AVERAGE: f64 = 0.5;

    #[must_use]
    pub fn classify(&self, engagement_rate: f64) -> PerformanceLevel {
        if engagement_rate > self.viral {
            PerformanceLevel::Viral
        } else if engagement_rate > self.excellent {
            PerformanceLevel::Excellent
        } else if engagement_rate > self.very_good {
            PerformanceLevel::VeryGood
        } else if engagement_rate > self.good {
            PerformanceLevel::Good
        } else if engagement_rate > self.average {
            PerformanceLevel::Average
        } else {
            PerformanceLevel::Low
        }
    }
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            viral: Self::DEFAULT_VIRAL,
            excellent: Self::DEFAULT_EXCELLENT,
            very_good: Self::DEFAULT_VERY_GOOD,
            good: Self::DEFAULT_GOOD,
            average: Self::DEFAULT_AVERAGE,
        }
    }
}

impl RateSet {
    /// Classify with the default thresholds.
    #[must_use]
    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceThresholds::default().classify(self.engagement_rate)
    }
}

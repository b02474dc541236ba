//! The video extraction cascade.
//!
//! Strategies run in a fixed priority order over one parsed [`Page`]. Each
//! result is merged into an accumulator with first-non-empty-wins semantics:
//! a later strategy may fill fields an earlier one left empty but never
//! overwrites a populated field. Once the accumulator satisfies the
//! [`CascadePolicy`], the remaining numeric strategies are skipped. The
//! metadata backfill always runs last.

use serde::Serialize;

use crate::strategies::{
    backfill_metadata, extract_dom_selectors, extract_linked_data, extract_regex_scan,
    extract_structured_state, Page,
};
use crate::types::ExtractionResult;

/// One stage of the cascade, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    StructuredState,
    LinkedData,
    RegexScan,
    DomSelectors,
    Metadata,
}

impl Strategy {
    /// Numeric strategies, highest priority first. `Metadata` is not one of
    /// them; it always runs after these.
    pub const NUMERIC: [Strategy; 4] = [
        Strategy::StructuredState,
        Strategy::LinkedData,
        Strategy::RegexScan,
        Strategy::DomSelectors,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::StructuredState => "structured_state",
            Strategy::LinkedData => "linked_data",
            Strategy::RegexScan => "regex_scan",
            Strategy::DomSelectors => "dom_selectors",
            Strategy::Metadata => "metadata",
        }
    }

    fn run(self, page: &Page<'_>) -> ExtractionResult {
        match self {
            Strategy::StructuredState => extract_structured_state(page),
            Strategy::LinkedData => extract_linked_data(page),
            Strategy::RegexScan => extract_regex_scan(page),
            Strategy::DomSelectors => extract_dom_selectors(page),
            Strategy::Metadata => {
                let mut acc = ExtractionResult::default();
                backfill_metadata(page, &mut acc);
                acc
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the accumulated result is good enough to stop running numeric
/// strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CascadePolicy {
    /// Stop once views, description and thumbnail are all present.
    #[default]
    RequireComplete,
    /// Stop as soon as a view count is present.
    ViewsOnly,
}

impl CascadePolicy {
    #[must_use]
    pub fn is_satisfied(self, result: &ExtractionResult) -> bool {
        match self {
            CascadePolicy::ViewsOnly => result.counts.views > 0,
            CascadePolicy::RequireComplete => {
                result.counts.views > 0
                    && !result.description.is_empty()
                    && !result.thumbnail.is_empty()
            }
        }
    }
}

/// Which fields one strategy contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub filled: Vec<&'static str>,
}

/// Ordered record of what each executed strategy contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionTrace {
    pub steps: Vec<StrategyReport>,
    /// The numeric strategy after which the policy was satisfied, if any.
    pub short_circuited_after: Option<Strategy>,
}

impl ExtractionTrace {
    /// Strategies that filled at least one field, in execution order.
    #[must_use]
    pub fn contributors(&self) -> Vec<Strategy> {
        self.steps
            .iter()
            .filter(|s| !s.filled.is_empty())
            .map(|s| s.strategy)
            .collect()
    }
}

/// A configured extraction cascade.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cascade {
    policy: CascadePolicy,
}

impl Cascade {
    #[must_use]
    pub fn new(policy: CascadePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    #[must_use]
    pub fn extract(&self, html: &str) -> ExtractionResult {
        self.extract_with_trace(html).0
    }

    /// Run the cascade and report which strategy filled which field.
    #[must_use]
    pub fn extract_with_trace(&self, html: &str) -> (ExtractionResult, ExtractionTrace) {
        let page = Page::new(html);
        let mut acc = ExtractionResult::default();
        let mut trace = ExtractionTrace::default();

        for strategy in Strategy::NUMERIC {
            let found = strategy.run(&page);
            let filled = acc.fill_missing(found);
            if !filled.is_empty() {
                tracing::debug!(strategy = %strategy, ?filled, "strategy contributed");
            }
            trace.steps.push(StrategyReport { strategy, filled });

            if self.policy.is_satisfied(&acc) {
                tracing::debug!(strategy = %strategy, policy = ?self.policy, "cascade satisfied");
                trace.short_circuited_after = Some(strategy);
                break;
            }
        }

        let filled = backfill_metadata(&page, &mut acc);
        if !filled.is_empty() {
            tracing::debug!(strategy = %Strategy::Metadata, ?filled, "strategy contributed");
        }
        trace.steps.push(StrategyReport {
            strategy: Strategy::Metadata,
            filled,
        });

        if acc.has_no_views() {
            tracing::debug!("no strategy recovered a view count");
        }

        (acc, trace)
    }
}

/// Extract with the default [`CascadePolicy::RequireComplete`] policy.
#[must_use]
pub fn extract(html: &str) -> ExtractionResult {
    Cascade::default().extract(html)
}

/// [`extract`] plus the per-strategy trace.
#[must_use]
pub fn extract_with_trace(html: &str) -> (ExtractionResult, ExtractionTrace) {
    Cascade::default().extract_with_trace(html)
}

#[cfg(test)]
#[path = "cascade_test.rs"]
mod tests;

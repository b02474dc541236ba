//! Extraction strategy implementations for the video cascade.
//!
//! Every strategy reads a [`Page`] and returns whatever it recovered as an
//! [`ExtractionResult`](crate::types::ExtractionResult). None of them fail:
//! a parse error inside a strategy just means it contributes nothing.

mod dom;
mod jsonld;
mod metadata;
mod regex_scan;
mod structured_state;

pub(crate) use dom::extract_dom_selectors;
pub(crate) use jsonld::extract_linked_data;
pub(crate) use metadata::backfill_metadata;
pub(crate) use regex_scan::extract_regex_scan;
pub(crate) use structured_state::{
    extract_structured_state, item_counts, item_description, item_hashtags,
};

use scraper::Html;

use crate::types::Counts;

/// One input document, parsed once and shared by every strategy.
pub(crate) struct Page<'a> {
    pub raw: &'a str,
    pub doc: Html,
}

impl<'a> Page<'a> {
    pub(crate) fn new(raw: &'a str) -> Self {
        Self {
            raw,
            doc: Html::parse_document(raw),
        }
    }
}

/// The five engagement counters, for strategies that are table-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountField {
    Views,
    Likes,
    Comments,
    Shares,
    Saves,
}

impl CountField {
    pub(crate) fn slot(self, counts: &mut Counts) -> &mut u64 {
        match self {
            CountField::Views => &mut counts.views,
            CountField::Likes => &mut counts.likes,
            CountField::Comments => &mut counts.comments,
            CountField::Shares => &mut counts.shares,
            CountField::Saves => &mut counts.saves,
        }
    }
}

//! Narrative section extraction from a downloaded XBRL bundle.
//!
//! Extraction runs in two passes. The first collects every `TextBlock` element of the
//! bundle's instance documents (see [`crate::parsing::textblock`]). The second resolves
//! each of the six sections by trying an ordered list of [`SectionStrategy`] values:
//!
//! 1. [`ExactTagStrategy`]: the section's own tag names
//! 2. [`SubsectionSliceStrategy`]: heading phrases inside a combined discussion block
//! 3. [`TitlePhraseStrategy`]: the section title near the start of any block
//!
//! Whatever produced the text, it is re-anchored to begin with the canonical title.
//! Sections nothing resolves stay empty strings.
//!
//! ```rust,no_run
//! use edinetkit::{SectionId, extract_sections};
//! use std::path::Path;
//!
//! let sections = extract_sections(Path::new("cache/edinet/S100TOYO_xbrl"));
//! println!("{}", sections.get(SectionId::BusinessRisks));
//! ```

mod strategy;
mod taxonomy;

pub use strategy::{
    ExactTagStrategy, SectionStrategy, SubsectionSliceStrategy, TitlePhraseStrategy,
};
use strategy::reanchor;
pub use taxonomy::{SectionDefinition, SectionId, SectionTaxonomy, SliceRule};

use crate::parsing::textblock::{TextBlockCollection, collect_text_blocks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Text of all six sections. Every id is always present; unresolved ones are `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionMap(BTreeMap<SectionId, String>);

impl Default for SectionMap {
    fn default() -> Self {
        Self(
            SectionId::ALL
                .iter()
                .map(|id| (*id, String::new()))
                .collect(),
        )
    }
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SectionId) -> &str {
        self.0.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, id: SectionId, text: String) {
        self.0.insert(id, text);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &str)> {
        self.0.iter().map(|(id, text)| (*id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no section was resolved.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }
}

/// Resolves sections with a taxonomy and an ordered strategy list.
pub struct SectionExtractor {
    taxonomy: SectionTaxonomy,
    strategies: Vec<Box<dyn SectionStrategy>>,
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::with_taxonomy(SectionTaxonomy::default())
    }
}

impl SectionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `taxonomy` with the standard three strategies.
    pub fn with_taxonomy(taxonomy: SectionTaxonomy) -> Self {
        let strategies: Vec<Box<dyn SectionStrategy>> = vec![
            Box::new(ExactTagStrategy),
            Box::new(SubsectionSliceStrategy::new(
                taxonomy.discussion_tags().to_vec(),
            )),
            Box::new(TitlePhraseStrategy::default()),
        ];
        Self {
            taxonomy,
            strategies,
        }
    }

    /// Replaces the strategy list.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn SectionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn taxonomy(&self) -> &SectionTaxonomy {
        &self.taxonomy
    }

    /// Extracts all sections from the bundle under `bundle_dir`.
    pub fn extract(&self, bundle_dir: &Path) -> SectionMap {
        let blocks = collect_text_blocks(bundle_dir);
        self.extract_from_blocks(&blocks)
    }

    /// Extracts all sections from an already collected set of blocks.
    pub fn extract_from_blocks(&self, blocks: &TextBlockCollection) -> SectionMap {
        let mut map = SectionMap::new();

        for section in self.taxonomy.sections() {
            let resolved = self.strategies.iter().find_map(|strategy| {
                strategy
                    .try_extract(blocks, section)
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| (strategy.name(), text))
            });

            match resolved {
                Some((tier, text)) => {
                    tracing::debug!(
                        "Section {} ({}) resolved by {} ({} chars)",
                        section.id.letter(),
                        section.title,
                        tier,
                        text.chars().count()
                    );
                    map.set(section.id, reanchor(&text, &section.title));
                }
                None => {
                    tracing::debug!("Section {} ({}) not found", section.id.letter(), section.title);
                }
            }
        }

        map
    }
}

/// Extracts the six sections with the default taxonomy.
pub fn extract_sections(bundle_dir: &Path) -> SectionMap {
    SectionExtractor::default().extract(bundle_dir)
}

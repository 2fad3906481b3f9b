//! # EdinetKit - filing discovery and analysis for Japanese EDINET disclosures
//!
//! EdinetKit finds a listed company's annual or semiannual securities report on
//! EDINET (the FSA's Electronic Disclosure for Investors' NETwork), downloads it,
//! pulls the narrative sections out of its XBRL bundle, and turns supplied
//! financial facts into multi-year ratios and growth figures.
//!
//! ## Features
//!
//! - **Rate-limited HTTP client** - Token bucket plus retry with jittered backoff
//! - **Filing discovery** (`discovery`) - Date-window search over the daily document
//!   listing, with annual/semiannual classification and deterministic tie-breaking
//! - **Downloads** (`discovery`) - Cached XBRL bundles (unzipped) and PDF renditions
//! - **Section extraction** (`sections`) - Six narrative sections resolved by tag,
//!   subsection slicing, or title phrase
//! - **Metrics** - Per-year FCF, ROE, PER, PBR and payout ratio with YoY/CAGR growth,
//!   plus sign-pattern labels for profitability and valuation
//!
//! ## Requirements
//!
//! Network operations are async and need a runtime; [tokio](https://tokio.rs) is
//! what the crate is tested with. Every EDINET request needs an API key, read from
//! `EDINET_API_KEY` by [`Edinet::from_env`].
//!
//! ## Basic Usage
//!
//! ```ignore
//! use edinetkit::{AnnualFact, Analyzer, Edinet, SectionId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let edinet = Edinet::from_env()?;
//!     let facts: Vec<AnnualFact> = serde_json::from_str(&std::fs::read_to_string("7203.json")?)?;
//!
//!     let report = Analyzer::for_edinet(edinet)
//!         .analyze("7203", &facts, None)
//!         .await;
//!
//!     println!("ROE growth: {:?}", report.metrics.growth.roe);
//!     if let Some(filing) = report.filing {
//!         println!("{}", filing.sections.get(SectionId::BusinessRisks));
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
pub mod parsing;
mod traits;

#[cfg(feature = "discovery")]
mod discovery;
#[cfg(feature = "discovery")]
mod documents;
#[cfg(feature = "discovery")]
mod download;
mod metrics;
#[cfg(feature = "sections")]
mod sections;

#[cfg(all(feature = "discovery", feature = "sections"))]
mod analysis;

// Core client (always available)
pub use config::{DEFAULT_BASE_URL, EdinetConfig};
pub use core::Edinet;
pub use error::{EdinetError, Result};

pub use traits::{PriceLookup, Summarizer};
#[cfg(feature = "discovery")]
pub use traits::{DocumentIndex, DocumentStore};

#[cfg(feature = "discovery")]
pub use discovery::{
    DiscoveryConfig, DocumentType, DocumentTypeRules, FilingFinder, FilingRecord,
    fiscal_year_of, prior_fact_for_year, search_dates, security_code_matches,
};
#[cfg(feature = "discovery")]
pub use documents::{FilingCandidate, parse_document_list};
#[cfg(feature = "discovery")]
pub use download::{DocumentKind, extract_bundle};

pub use metrics::{
    AnnualFact, DataAvailability, GrowthFigures, MetricsConfig, MetricsResult, PatternEvaluation,
    PatternFamily, PatternPair, PatternSet, SignPattern, YearMetric, annual_facts, cagr,
    compute_metrics, growth_rate, yoy_growth,
};

#[cfg(feature = "sections")]
pub use sections::{
    ExactTagStrategy, SectionDefinition, SectionExtractor, SectionId, SectionMap,
    SectionStrategy, SectionTaxonomy, SliceRule, SubsectionSliceStrategy, TitlePhraseStrategy,
    extract_sections,
};

#[cfg(all(feature = "discovery", feature = "sections"))]
pub use analysis::{Analyzer, CompanyReport, FilingReport};

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

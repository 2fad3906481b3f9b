//! Trait definitions at the seams of the pipeline.
//!
//! The remote side (the daily document listing and the download endpoint) is expressed
//! as traits that the `Edinet` client implements, so discovery can be driven by an
//! in-memory index in tests. The price source and the narrative summarizer are external
//! collaborators: the crate only calls them, and the caller supplies the implementation.

use super::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[cfg(feature = "discovery")]
use super::documents::FilingCandidate;
#[cfg(feature = "discovery")]
use super::download::DocumentKind;
#[cfg(feature = "discovery")]
use std::path::{Path, PathBuf};

/// Access to the EDINET daily document listing.
///
/// EDINET has no company-keyed endpoint; the only way to find a filing is to ask what
/// was submitted on a given day and filter the answer.
#[cfg(feature = "discovery")]
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Lists every document submitted on `date`. A day without a listing is an empty vec.
    async fn documents_on(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>>;
}

#[cfg(feature = "discovery")]
#[async_trait]
impl<T: DocumentIndex + ?Sized> DocumentIndex for &T {
    async fn documents_on(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>> {
        (**self).documents_on(date).await
    }
}

/// Retrieval of filing documents onto local disk.
#[cfg(feature = "discovery")]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Downloads `doc_id` in the requested form under `dir` and returns the local path.
    /// A path that already exists is returned without touching the network.
    async fn download(&self, doc_id: &str, kind: DocumentKind, dir: &Path) -> Result<PathBuf>;
}

/// Source of share prices used for the valuation ratios.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Closing price of `code` on or near `date`, if known.
    async fn price_at(&self, code: &str, date: NaiveDate) -> Option<f64>;
}

/// Produces a short narrative summary of one extracted section.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, label: &str) -> Result<String>;
}

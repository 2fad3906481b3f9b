//! Filing discovery: from a security code and candidate fiscal years to one filing.
//!
//! EDINET has no company-keyed lookup, so discovery walks submission dates. For each
//! candidate year (newest first) it builds a date window, fetches the daily listing for
//! every date in bounded concurrent batches, deduplicates rows by document id, and keeps
//! the rows that look like this company's periodic report for that year. The first year
//! with any accepted row wins; older years are not searched.
//!
//! ```rust,no_run
//! # use edinetkit::{Edinet, FilingFinder};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let edinet = Edinet::from_env()?;
//! let finder = FilingFinder::new(edinet);
//!
//! if let Some(record) = finder.find_filing("7203", &[2024, 2023], None).await {
//!     println!("{} submitted {:?}", record.doc_id, record.submit_date());
//! }
//! # Ok(())
//! # }
//! ```

mod matching;
mod window;

pub use matching::{DocumentType, DocumentTypeRules, security_code_matches};
pub use window::{fiscal_year_of, prior_fact_for_year, search_dates};

use crate::documents::FilingCandidate;
use crate::error::{EdinetError, Result};
use crate::metrics::AnnualFact;
use crate::traits::DocumentIndex;
use crate::Edinet;
use chrono::{NaiveDate, NaiveDateTime};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Tuning for the date windows and the per-date fan-out.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub rules: DocumentTypeRules,
    /// Listing requests in flight at once within one year.
    pub concurrency: usize,
    pub days_before_disclosure: i64,
    pub days_after_disclosure: i64,
    pub days_after_period_end: i64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            rules: DocumentTypeRules::default(),
            concurrency: 4,
            days_before_disclosure: 7,
            days_after_disclosure: 60,
            days_after_period_end: 90,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_rules(mut self, rules: DocumentTypeRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// The filing chosen for one company and fiscal year.
///
/// Built once by discovery. Download paths are attached by consuming the record and
/// returning a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub doc_id: String,
    pub submitted_at: Option<NaiveDateTime>,
    pub doc_type: DocumentType,
    pub filer_name: String,
    /// Security code as it appears in the listing.
    pub sec_code: String,
    pub fiscal_year: i32,
    pub period_end: Option<NaiveDate>,
    /// `false` when the listing gave no period end and the year was assumed.
    pub period_confirmed: bool,
    pub bundle_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
}

impl FilingRecord {
    fn from_candidate(candidate: &FilingCandidate, doc_type: DocumentType, year: i32) -> Self {
        Self {
            doc_id: candidate.doc_id.clone(),
            submitted_at: candidate.submit_date_time,
            doc_type,
            filer_name: candidate.filer_name.clone().unwrap_or_default(),
            sec_code: candidate.security_code().unwrap_or_default().to_string(),
            fiscal_year: year,
            period_end: candidate.period_end,
            period_confirmed: candidate.period_end.is_some(),
            bundle_path: None,
            pdf_path: None,
        }
    }

    pub fn submit_date(&self) -> Option<NaiveDate> {
        self.submitted_at.map(|dt| dt.date())
    }

    pub fn with_bundle(self, path: PathBuf) -> Self {
        Self {
            bundle_path: Some(path),
            ..self
        }
    }

    pub fn with_pdf(self, path: PathBuf) -> Self {
        Self {
            pdf_path: Some(path),
            ..self
        }
    }
}

/// An accepted row plus what the filters learned about it.
#[derive(Debug, Clone)]
struct Accepted {
    candidate: FilingCandidate,
    doc_type: DocumentType,
    confirmed: bool,
}

/// Confirmed period, then annual over semiannual, then latest submission, then the
/// greatest document id.
fn preference(a: &Accepted, b: &Accepted) -> std::cmp::Ordering {
    b.confirmed
        .cmp(&a.confirmed)
        .then_with(|| b.doc_type.rank().cmp(&a.doc_type.rank()))
        .then_with(|| b.candidate.submit_date_time.cmp(&a.candidate.submit_date_time))
        .then_with(|| b.candidate.doc_id.cmp(&a.candidate.doc_id))
}

/// Searches a [`DocumentIndex`] for a company's periodic report.
#[derive(Debug, Clone)]
pub struct FilingFinder<I> {
    index: I,
    config: DiscoveryConfig,
    today: Option<NaiveDate>,
}

impl<I: DocumentIndex> FilingFinder<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            config: DiscoveryConfig::default(),
            today: None,
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Pins "today" so windows are reproducible.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Finds the filing for `code`, trying `candidate_years` in the given order.
    ///
    /// Returns `None` when no year matches, when the client has no credential, or when
    /// every listing request failed. Failures are logged, never returned.
    pub async fn find_filing(
        &self,
        code: &str,
        candidate_years: &[i32],
        prior_facts: Option<&[AnnualFact]>,
    ) -> Option<FilingRecord> {
        for &year in candidate_years {
            let prior = prior_facts.and_then(|facts| prior_fact_for_year(facts, year));

            match self.search_year(code, year, prior).await {
                Ok(records) => {
                    if let Some(best) = records.into_iter().next() {
                        tracing::info!(
                            "Found filing {} for {} FY{} ({:?}, {})",
                            best.doc_id,
                            code,
                            year,
                            best.doc_type,
                            best.filer_name
                        );
                        return Some(best);
                    }
                    tracing::info!("No filing found for {} FY{}", code, year);
                }
                Err(EdinetError::MissingCredential) => {
                    tracing::warn!("Filing discovery unavailable: EDINET API key is not configured");
                    return None;
                }
                Err(e) => {
                    tracing::warn!("Filing search failed for {} FY{}: {}", code, year, e);
                }
            }
        }

        None
    }

    /// Every accepted filing for one year, most preferred first.
    ///
    /// Per-date failures are logged and skipped; only a missing credential aborts.
    pub async fn search_year(
        &self,
        code: &str,
        year: i32,
        prior_fact: Option<&AnnualFact>,
    ) -> Result<Vec<FilingRecord>> {
        let dates = self.config.search_dates(year, prior_fact, self.today());
        tracing::info!(
            "Searching {} FY{} across {} dates ({} to {})",
            code,
            year,
            dates.len(),
            dates.first().map(|d| d.to_string()).unwrap_or_default(),
            dates.last().map(|d| d.to_string()).unwrap_or_default()
        );

        let listing = self.collect_listing(&dates).await?;

        let mut accepted: Vec<Accepted> = listing
            .into_iter()
            .filter_map(|candidate| self.accept(code, year, candidate))
            .collect();
        accepted.sort_by(preference);

        Ok(accepted
            .into_iter()
            .map(|a| FilingRecord::from_candidate(&a.candidate, a.doc_type, year))
            .collect())
    }

    /// Fetches all dates in batches of `concurrency`, keeping date order, and drops
    /// repeated document ids (first sighting wins).
    async fn collect_listing(&self, dates: &[NaiveDate]) -> Result<Vec<FilingCandidate>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        for batch in dates.chunks(self.config.concurrency.max(1)) {
            let futures = batch.iter().map(|date| self.index.documents_on(*date));
            let results = join_all(futures).await;

            for (date, result) in batch.iter().zip(results) {
                match result {
                    Ok(rows) => {
                        tracing::debug!("{} listed {} documents", date, rows.len());
                        for row in rows {
                            if seen.insert(row.doc_id.clone()) {
                                unique.push(row);
                            }
                        }
                    }
                    Err(EdinetError::MissingCredential) => {
                        return Err(EdinetError::MissingCredential);
                    }
                    Err(e) => tracing::warn!("Listing for {} failed: {}", date, e),
                }
            }
        }

        Ok(unique)
    }

    fn accept(&self, code: &str, year: i32, candidate: FilingCandidate) -> Option<Accepted> {
        let listed = candidate.security_code()?;
        if !security_code_matches(code, listed) {
            return None;
        }

        let doc_type = self.config.rules.accept(&candidate)?;

        let confirmed = match candidate.period_end {
            Some(period_end) if fiscal_year_of(period_end) != year => {
                tracing::debug!(
                    "Skipping {}: period end {} is FY{}, not FY{}",
                    candidate.doc_id,
                    period_end,
                    fiscal_year_of(period_end),
                    year
                );
                return None;
            }
            Some(_) => true,
            None => {
                tracing::debug!(
                    "Tentatively accepting {} without a period end",
                    candidate.doc_id
                );
                false
            }
        };

        Some(Accepted {
            candidate,
            doc_type,
            confirmed,
        })
    }
}

impl Edinet {
    /// Runs discovery against this client with the configured fan-out width.
    pub async fn find_filing(
        &self,
        code: &str,
        candidate_years: &[i32],
        prior_facts: Option<&[AnnualFact]>,
    ) -> Option<FilingRecord> {
        FilingFinder::new(self)
            .with_config(DiscoveryConfig::default().with_concurrency(self.concurrency))
            .find_filing(code, candidate_years, prior_facts)
            .await
    }
}

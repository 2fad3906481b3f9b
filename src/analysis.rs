//! Per-company analysis workflow.
//!
//! [`Analyzer`] composes the three core pieces for one company: metrics from the
//! supplied annual facts, discovery of the latest periodic report, and section
//! extraction from its bundle. Every step that can fail degrades instead: a missing
//! filing, download or section leaves that part of the [`CompanyReport`] empty, and the
//! reason is logged.

use crate::discovery::{DiscoveryConfig, FilingFinder, FilingRecord, fiscal_year_of};
use crate::download::DocumentKind;
use crate::metrics::{AnnualFact, MetricsConfig, MetricsResult, PatternSet, annual_facts};
use crate::sections::{SectionExtractor, SectionId, SectionMap};
use crate::traits::{DocumentIndex, DocumentStore, PriceLookup, Summarizer};
use crate::Edinet;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// The filing half of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingReport {
    pub record: FilingRecord,
    pub sections: SectionMap,
    /// Summaries of the non-empty sections, when a summarizer is attached.
    pub summaries: BTreeMap<SectionId, String>,
}

/// Everything produced for one company. Parts that could not be built are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub code: String,
    pub metrics: MetricsResult,
    #[serde(default)]
    pub patterns: PatternSet,
    pub filing: Option<FilingReport>,
}

pub struct Analyzer<C> {
    client: C,
    download_dir: PathBuf,
    discovery: DiscoveryConfig,
    metrics: MetricsConfig,
    extractor: SectionExtractor,
    prices: Option<Arc<dyn PriceLookup>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    analysis_years: Option<usize>,
    fetch_pdf: bool,
    today: Option<NaiveDate>,
}

impl Analyzer<Edinet> {
    /// Analyzer over the EDINET client, downloading into its configured directory.
    pub fn for_edinet(edinet: Edinet) -> Self {
        let dir = edinet.download_dir().to_path_buf();
        let concurrency = edinet.concurrency;
        Analyzer::new(edinet, dir)
            .with_discovery_config(DiscoveryConfig::default().with_concurrency(concurrency))
    }
}

impl<C> Analyzer<C>
where
    C: DocumentIndex + DocumentStore,
{
    pub fn new(client: C, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
            discovery: DiscoveryConfig::default(),
            metrics: MetricsConfig::default(),
            extractor: SectionExtractor::default(),
            prices: None,
            summarizer: None,
            analysis_years: None,
            fetch_pdf: false,
            today: None,
        }
    }

    pub fn with_discovery_config(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    pub fn with_metrics_config(mut self, config: MetricsConfig) -> Self {
        self.metrics = config;
        self
    }

    pub fn with_extractor(mut self, extractor: SectionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_price_lookup(mut self, prices: Arc<dyn PriceLookup>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_analysis_years(mut self, years: usize) -> Self {
        self.analysis_years = Some(years);
        self
    }

    /// Also download the PDF rendition of the discovered filing.
    pub fn with_pdf(mut self, fetch_pdf: bool) -> Self {
        self.fetch_pdf = fetch_pdf;
        self
    }

    /// Pins "today" for both discovery windows and the future-period filter.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self.metrics.today = Some(today);
        self
    }

    async fn collect_prices(&self, code: &str, facts: &[AnnualFact]) -> Option<HashMap<String, f64>> {
        let lookup = self.prices.as_ref()?;
        let mut prices = HashMap::new();
        for period_end in facts.iter().filter_map(|f| f.period_end) {
            let key = period_end.format("%Y-%m-%d").to_string();
            if prices.contains_key(&key) {
                continue;
            }
            match lookup.price_at(code, period_end).await {
                Some(price) => {
                    prices.insert(key, price);
                }
                None => tracing::debug!("No price for {} at {}", code, period_end),
            }
        }
        Some(prices)
    }

    /// Fiscal years to search, newest first, derived from the facts' period ends.
    fn default_years(&self, facts: &[AnnualFact]) -> Vec<i32> {
        let mut years: Vec<i32> = Vec::new();
        for year in facts.iter().filter_map(|f| f.period_end).map(fiscal_year_of) {
            if !years.contains(&year) {
                years.push(year);
            }
        }
        if years.is_empty() {
            let current = self
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive())
                .year();
            years = vec![current - 1, current - 2];
        }
        years
    }

    async fn summarize(&self, sections: &SectionMap) -> BTreeMap<SectionId, String> {
        let mut summaries = BTreeMap::new();
        let Some(summarizer) = &self.summarizer else {
            return summaries;
        };

        for (id, text) in sections.iter().filter(|(_, text)| !text.is_empty()) {
            let label = self
                .extractor
                .taxonomy()
                .get(id)
                .map(|def| def.title.as_str())
                .unwrap_or_default();
            match summarizer.summarize(text, label).await {
                Ok(summary) => {
                    summaries.insert(id, summary);
                }
                Err(e) => tracing::warn!("Summary for section {} failed: {}", id.letter(), e),
            }
        }
        summaries
    }

    async fn filing_report(&self, code: &str, years: &[i32], facts: &[AnnualFact]) -> Option<FilingReport> {
        let mut finder = FilingFinder::new(&self.client).with_config(self.discovery.clone());
        if let Some(today) = self.today {
            finder = finder.with_today(today);
        }

        let mut record = finder.find_filing(code, years, Some(facts)).await?;

        let sections = match self
            .client
            .download(&record.doc_id, DocumentKind::Bundle, &self.download_dir)
            .await
        {
            Ok(bundle) => {
                let sections = self.extractor.extract(&bundle);
                record = record.with_bundle(bundle);
                sections
            }
            Err(e) => {
                tracing::warn!("Bundle download for {} failed: {}", record.doc_id, e);
                SectionMap::new()
            }
        };

        if self.fetch_pdf {
            match self
                .client
                .download(&record.doc_id, DocumentKind::Pdf, &self.download_dir)
                .await
            {
                Ok(pdf) => record = record.with_pdf(pdf),
                Err(e) => tracing::warn!("PDF download for {} failed: {}", record.doc_id, e),
            }
        }

        let summaries = self.summarize(&sections).await;

        Some(FilingReport {
            record,
            sections,
            summaries,
        })
    }

    /// Builds the report for `code`.
    ///
    /// `facts` may be a raw statement feed: [`annual_facts`] narrows it to one full-year
    /// row per period end first. `candidate_years` defaults to the fiscal years of the
    /// selected rows' period ends.
    pub async fn analyze(
        &self,
        code: &str,
        facts: &[AnnualFact],
        candidate_years: Option<&[i32]>,
    ) -> CompanyReport {
        let facts = annual_facts(facts.iter().cloned());
        let facts = facts.as_slice();

        let prices = self.collect_prices(code, facts).await;
        let metrics = self
            .metrics
            .compute(facts, prices.as_ref(), self.analysis_years);
        let patterns = PatternSet::from_metrics(&metrics);
        tracing::info!(
            "Metrics for {}: {} years ({:?})",
            code,
            metrics.analysis_years,
            metrics.availability
        );

        let years = match candidate_years {
            Some(years) => years.to_vec(),
            None => self.default_years(facts),
        };
        let filing = self.filing_report(code, &years, facts).await;

        CompanyReport {
            code: code.to_string(),
            metrics,
            patterns,
            filing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::FilingCandidate;
    use crate::error::{EdinetError, Result};
    use async_trait::async_trait;
    use std::path::Path;

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:jpcrp_cor="http://example.test/jpcrp_cor">
  <jpcrp_cor:BusinessRisksTextBlock contextRef="FilingDateInstant">&lt;h3&gt;３【事業等のリスク】&lt;/h3&gt;&lt;p&gt;当社グループの経営成績及び財政状態に影響を及ぼす可能性のある主なリスクは、為替相場の変動と原材料価格の高騰です。&lt;/p&gt;</jpcrp_cor:BusinessRisksTextBlock>
</xbrli:xbrl>"#;

    struct FakeEdinet {
        listing: Vec<FilingCandidate>,
        fail_download: bool,
    }

    #[async_trait]
    impl DocumentIndex for FakeEdinet {
        async fn documents_on(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>> {
            if date == NaiveDate::from_ymd_opt(2024, 6, 15).unwrap() {
                Ok(self.listing.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FakeEdinet {
        async fn download(&self, doc_id: &str, kind: DocumentKind, dir: &Path) -> Result<PathBuf> {
            if self.fail_download {
                return Err(EdinetError::NotFound);
            }
            let target = kind.target_path(dir, doc_id);
            match kind {
                DocumentKind::Bundle => {
                    std::fs::create_dir_all(target.join("XBRL/PublicDoc"))?;
                    std::fs::write(target.join("XBRL/PublicDoc/instance.xbrl"), INSTANCE)?;
                }
                DocumentKind::Pdf => std::fs::write(&target, b"%PDF-1.7")?,
            }
            Ok(target)
        }
    }

    struct FixedPrice;

    #[async_trait]
    impl PriceLookup for FixedPrice {
        async fn price_at(&self, _code: &str, _date: NaiveDate) -> Option<f64> {
            Some(1000.0)
        }
    }

    struct FirstLine;

    #[async_trait]
    impl Summarizer for FirstLine {
        async fn summarize(&self, text: &str, label: &str) -> Result<String> {
            Ok(format!("{}: {}", label, text.lines().nth(1).unwrap_or_default()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listing() -> Vec<FilingCandidate> {
        vec![FilingCandidate {
            doc_id: "S100TOYO".to_string(),
            edinet_code: Some("E02144".to_string()),
            sec_code: Some("72030".to_string()),
            filer_name: Some("トヨタ自動車株式会社".to_string()),
            ordinance_code: Some("010".to_string()),
            form_code: Some("030000".to_string()),
            doc_type_code: Some("120".to_string()),
            doc_description: Some("有価証券報告書－第120期".to_string()),
            period_end: Some(date(2024, 3, 31)),
            submit_date_time: None,
        }]
    }

    fn facts() -> Vec<AnnualFact> {
        vec![
            AnnualFact {
                period_end: Some(date(2024, 3, 31)),
                net_profit: Some(100.0),
                equity: Some(1000.0),
                eps: Some(50.0),
                ..Default::default()
            },
            AnnualFact {
                period_end: Some(date(2023, 3, 31)),
                net_profit: Some(80.0),
                equity: Some(1000.0),
                eps: Some(40.0),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn test_full_report() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeEdinet {
            listing: listing(),
            fail_download: false,
        };
        let analyzer = Analyzer::new(client, dir.path())
            .with_today(date(2025, 1, 1))
            .with_price_lookup(Arc::new(FixedPrice))
            .with_summarizer(Arc::new(FirstLine))
            .with_pdf(true);

        let report = analyzer.analyze("7203", &facts(), None).await;

        assert_eq!(report.metrics.analysis_years, 2);
        assert_eq!(report.metrics.years[0].per, Some(20.0));
        assert_eq!(report.patterns.period.profitability.basis, "N/A");
        assert_eq!(report.patterns.latest.valuation.number, 0);

        let filing = report.filing.unwrap();
        assert_eq!(filing.record.doc_id, "S100TOYO");
        assert!(filing.record.bundle_path.is_some());
        assert!(filing.record.pdf_path.is_some());
        assert!(
            filing
                .sections
                .get(SectionId::BusinessRisks)
                .starts_with("事業等のリスク\n当社グループ")
        );
        assert_eq!(filing.summaries.len(), 1);
        assert!(filing.summaries[&SectionId::BusinessRisks].starts_with("事業等のリスク: 当社"));
    }

    #[tokio::test]
    async fn test_failed_download_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeEdinet {
            listing: listing(),
            fail_download: true,
        };
        let analyzer = Analyzer::new(client, dir.path()).with_today(date(2025, 1, 1));

        let report = analyzer.analyze("7203", &facts(), None).await;
        let filing = report.filing.unwrap();
        assert!(filing.record.bundle_path.is_none());
        assert!(filing.sections.is_empty());
        assert_eq!(filing.sections.len(), 6);
    }

    #[tokio::test]
    async fn test_no_filing_still_reports_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeEdinet {
            listing: Vec::new(),
            fail_download: false,
        };
        let analyzer = Analyzer::new(client, dir.path()).with_today(date(2025, 1, 1));

        let report = analyzer.analyze("7203", &facts(), Some(&[2023])).await;
        assert!(report.filing.is_none());
        assert!((report.metrics.growth.roe.unwrap() - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feed_rows_are_narrowed_to_annual() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeEdinet {
            listing: Vec::new(),
            fail_download: false,
        };
        let analyzer = Analyzer::new(client, dir.path())
            .with_today(date(2025, 1, 1))
            .with_price_lookup(Arc::new(FixedPrice));

        let fy = |end: NaiveDate, disclosed: Option<NaiveDate>, net: f64, eps: f64, bps: f64| AnnualFact {
            period_end: Some(end),
            period_type: Some("FY".to_string()),
            disclosure_date: disclosed,
            net_profit: Some(net),
            equity: Some(1000.0),
            eps: Some(eps),
            bps: Some(bps),
            ..Default::default()
        };
        let feed = vec![
            AnnualFact {
                period_end: Some(date(2024, 12, 31)),
                period_type: Some("3Q".to_string()),
                net_profit: Some(90.0),
                equity: Some(1100.0),
                ..Default::default()
            },
            fy(date(2024, 3, 31), Some(date(2024, 5, 8)), 100.0, 50.0, 500.0),
            fy(date(2023, 3, 31), None, 80.0, 40.0, 450.0),
            fy(date(2023, 3, 31), Some(date(2023, 5, 10)), 70.0, 35.0, 400.0),
        ];

        let report = analyzer.analyze("7203", &feed, Some(&[2023])).await;
        assert_eq!(report.metrics.analysis_years, 2);
        assert_eq!(report.metrics.latest_period_end, Some(date(2024, 3, 31)));
        assert_eq!(report.metrics.years[1].net_profit, Some(70.0));

        assert_eq!(report.patterns.latest.profitability.number, 1);
        assert_eq!(report.patterns.latest.valuation.basis, "PER:-, ROE:+, PBR:-");
        assert_eq!(report.patterns.period.valuation.number, 6);
        assert_eq!(report.patterns.period.valuation.name, "成長＋割安");
    }
}

mod common;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{date, read_fixture};
use edinetkit::{
    AnnualFact, DocumentIndex, DocumentType, FilingCandidate, FilingFinder, Result,
    parse_document_list,
};
use std::sync::Mutex;

/// Serves the recorded 2024-06-18 listing; every other day is empty.
struct RecordedIndex {
    listing: Vec<FilingCandidate>,
    queried: Mutex<Vec<NaiveDate>>,
}

impl RecordedIndex {
    fn new() -> Self {
        let content = read_fixture("documents/2024-06-18.json");
        Self {
            listing: parse_document_list(&content).unwrap(),
            queried: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentIndex for RecordedIndex {
    async fn documents_on(&self, day: NaiveDate) -> Result<Vec<FilingCandidate>> {
        self.queried.lock().unwrap().push(day);
        if day == date(2024, 6, 18) {
            Ok(self.listing.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

fn facts() -> Vec<AnnualFact> {
    serde_json::from_str(&read_fixture("facts/annual.json")).unwrap()
}

#[tokio::test]
async fn find_annual_report_in_disclosure_window() {
    let index = RecordedIndex::new();
    let facts = facts();
    let finder = FilingFinder::new(&index).with_today(date(2025, 1, 1));

    let record = finder
        .find_filing("7203", &[2023], Some(&facts))
        .await
        .unwrap();

    assert_eq!(record.doc_id, "S100TR7I");
    assert_eq!(record.doc_type, DocumentType::Annual);
    assert_eq!(record.fiscal_year, 2023);
    assert_eq!(record.sec_code, "72030");
    assert_eq!(record.filer_name, "トヨタ自動車株式会社");
    assert!(record.period_confirmed);
    assert_eq!(record.submit_date(), Some(date(2024, 6, 18)));

    let queried = index.queried.lock().unwrap();
    assert_eq!(queried.first(), Some(&date(2024, 5, 1)));
    assert_eq!(queried.last(), Some(&date(2024, 6, 29)));
}

#[tokio::test]
async fn five_digit_code_and_semiannual_report() {
    let index = RecordedIndex::new();
    let facts = vec![AnnualFact {
        period_end: Some(date(2024, 3, 31)),
        disclosure_date: Some(date(2024, 6, 10)),
        revenue: Some(1.0),
        ..Default::default()
    }];
    let finder = FilingFinder::new(&index).with_today(date(2025, 1, 1));

    let record = finder
        .find_filing("12340", &[2023], Some(&facts))
        .await
        .unwrap();

    assert_eq!(record.doc_id, "S100TS02");
    assert_eq!(record.doc_type, DocumentType::Semiannual);
}

#[tokio::test]
async fn amendment_is_not_a_candidate() {
    let index = RecordedIndex::new();
    let facts = facts();
    let finder = FilingFinder::new(&index).with_today(date(2025, 1, 1));

    let records = finder
        .search_year("7203", 2023, facts.first())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doc_id, "S100TR7I");
}

#[tokio::test]
async fn newer_year_without_dates_falls_through() {
    let index = RecordedIndex::new();
    let facts = facts();
    let finder = FilingFinder::new(&index).with_today(date(2025, 1, 1));

    // every FY2024 date is still in the future
    let record = finder
        .find_filing("7203", &[2024, 2023], Some(&facts))
        .await
        .unwrap();
    assert_eq!(record.fiscal_year, 2023);
    assert!(
        index
            .queried
            .lock()
            .unwrap()
            .iter()
            .all(|d| *d <= date(2025, 1, 1))
    );
}

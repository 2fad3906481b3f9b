//! EDINET daily document listing.
//!
//! `GET /documents.json?date=YYYY-MM-DD&type=2` returns every document submitted on one
//! day together with a metadata header. A day without submissions comes back either as a
//! 404 or as a body with `metadata` and no `results`; both are an empty listing here.

use super::Edinet;
use super::error::{EdinetError, Result};
use super::parsing::utils::{deserialize_optional_date, deserialize_optional_datetime};
use super::traits::DocumentIndex;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the daily listing.
///
/// Only the columns the discovery pipeline reads are kept. Every column except the
/// document id can be `null` in the listing (withdrawn documents keep their row with
/// most fields blanked), so they are all optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingCandidate {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "edinetCode", default)]
    pub edinet_code: Option<String>,
    /// Listed security code. EDINET pads the 4-digit code with a trailing check digit.
    #[serde(rename = "secCode", default)]
    pub sec_code: Option<String>,
    #[serde(rename = "filerName", default)]
    pub filer_name: Option<String>,
    #[serde(rename = "ordinanceCode", default)]
    pub ordinance_code: Option<String>,
    #[serde(rename = "formCode", default)]
    pub form_code: Option<String>,
    #[serde(rename = "docTypeCode", default)]
    pub doc_type_code: Option<String>,
    #[serde(rename = "docDescription", default)]
    pub doc_description: Option<String>,
    #[serde(
        rename = "periodEnd",
        default,
        deserialize_with = "deserialize_optional_date"
    )]
    pub period_end: Option<NaiveDate>,
    #[serde(
        rename = "submitDateTime",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub submit_date_time: Option<NaiveDateTime>,
}

impl FilingCandidate {
    /// The security code, if present and not blank.
    pub fn security_code(&self) -> Option<&str> {
        self.sec_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    pub fn description(&self) -> &str {
        self.doc_description.as_deref().unwrap_or("")
    }
}

/// Top-level shape of a `documents.json` body.
#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    results: Option<Vec<Value>>,
    #[serde(rename = "statusCode", alias = "StatusCode", default)]
    status_code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses a listing body into candidates.
///
/// Rows that do not deserialize are skipped with a debug log so one odd row cannot hide
/// the rest of the day. An EDINET error envelope (`statusCode` at the top level) is
/// reported as `InvalidResponse`.
pub fn parse_document_list(body: &str) -> Result<Vec<FilingCandidate>> {
    let response: DocumentListResponse = serde_json::from_str(body)?;

    if let Some(status) = response.status_code {
        return Err(EdinetError::InvalidResponse(format!(
            "EDINET error envelope: statusCode={} message={}",
            status,
            response.message.unwrap_or_default()
        )));
    }

    let Some(rows) = response.results else {
        if let Some(metadata) = &response.metadata {
            tracing::debug!("Listing carried metadata only: {}", metadata);
        }
        return Ok(Vec::new());
    };

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<FilingCandidate>(row) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => tracing::debug!("Skipping malformed listing row: {}", e),
        }
    }

    Ok(candidates)
}

impl Edinet {
    fn documents_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/documents.json?date={}&type=2",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }
}

#[async_trait]
impl DocumentIndex for Edinet {
    /// Lists the documents submitted on `date`.
    ///
    /// # Errors
    ///
    /// * `EdinetError::MissingCredential` - No subscription key configured
    /// * `EdinetError::RateLimitExceeded` - 429 persisted through every retry
    /// * `EdinetError::InvalidResponse` - Error envelope or unexpected status
    /// * `EdinetError::JsonError` - Body is not a listing
    async fn documents_on(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>> {
        let url = self.documents_url(date);
        match self.get(&url).await {
            Ok(body) => parse_document_list(&body),
            Err(EdinetError::NotFound) => {
                tracing::debug!("No listing for {}", date);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

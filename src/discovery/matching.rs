//! Candidate classification and security-code matching.

use crate::documents::FilingCandidate;
use serde::{Deserialize, Serialize};

/// Normalized kind of a discovered filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Annual,
    Semiannual,
    Unknown,
}

impl DocumentType {
    /// Preference order used when several candidates match one year.
    pub(crate) fn rank(self) -> u8 {
        match self {
            DocumentType::Annual => 2,
            DocumentType::Semiannual => 1,
            DocumentType::Unknown => 0,
        }
    }
}

/// Which listing rows count as a periodic report.
///
/// A row is accepted when its ordinance code is listed, its type can be told from the
/// document type code, the form code prefix or the description, its description
/// carries no amendment marker, and it has a security code. Each code list is only
/// compared with its own column: the two EDINET code spaces overlap (document type
/// `030` is a registration statement, form code `030000` an annual report).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTypeRules {
    /// Cabinet-office ordinance codes: "010" domestic, "020" foreign companies.
    pub ordinance_codes: Vec<String>,
    /// `docTypeCode` values, compared on the first three characters.
    pub annual_doc_types: Vec<String>,
    pub semiannual_doc_types: Vec<String>,
    /// `formCode` prefixes, compared on the first three characters.
    pub annual_form_prefixes: Vec<String>,
    pub semiannual_form_prefixes: Vec<String>,
    pub annual_phrases: Vec<String>,
    pub semiannual_phrases: Vec<String>,
    /// Descriptions containing any of these are never a periodic report, whatever
    /// their codes say.
    pub excluded_phrases: Vec<String>,
    pub amendment_markers: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DocumentTypeRules {
    fn default() -> Self {
        Self {
            ordinance_codes: owned(&["010", "020"]),
            annual_doc_types: owned(&["120"]),
            semiannual_doc_types: owned(&["160"]),
            annual_form_prefixes: owned(&["030"]),
            semiannual_form_prefixes: owned(&["050"]),
            annual_phrases: owned(&["有価証券報告書"]),
            semiannual_phrases: owned(&["半期報告書"]),
            // "四半期報告書" contains "半期報告書"; registration statements and
            // withdrawal requests share code values with periodic reports
            excluded_phrases: owned(&["四半期報告書", "届出書", "取下げ"]),
            amendment_markers: owned(&["訂正"]),
        }
    }
}

fn prefix3(code: Option<&str>) -> Option<&str> {
    let code = code?.trim();
    code.get(..3)
}

impl DocumentTypeRules {
    /// Classifies a row by document type code, then form code, then description.
    pub fn classify(&self, candidate: &FilingCandidate) -> DocumentType {
        let description = candidate.description();
        if self
            .excluded_phrases
            .iter()
            .any(|p| description.contains(p.as_str()))
        {
            return DocumentType::Unknown;
        }

        let columns = [
            (
                prefix3(candidate.doc_type_code.as_deref()),
                &self.annual_doc_types,
                &self.semiannual_doc_types,
            ),
            (
                prefix3(candidate.form_code.as_deref()),
                &self.annual_form_prefixes,
                &self.semiannual_form_prefixes,
            ),
        ];
        for (prefix, annual, semiannual) in columns {
            let Some(prefix) = prefix else { continue };
            if annual.iter().any(|p| p == prefix) {
                return DocumentType::Annual;
            }
            if semiannual.iter().any(|p| p == prefix) {
                return DocumentType::Semiannual;
            }
        }

        if self.annual_phrases.iter().any(|p| description.contains(p.as_str())) {
            DocumentType::Annual
        } else if self
            .semiannual_phrases
            .iter()
            .any(|p| description.contains(p.as_str()))
        {
            DocumentType::Semiannual
        } else {
            DocumentType::Unknown
        }
    }

    pub fn is_amendment(&self, candidate: &FilingCandidate) -> bool {
        let description = candidate.description();
        self.amendment_markers
            .iter()
            .any(|m| description.contains(m.as_str()))
    }

    /// Returns the normalized type when the row passes every filter.
    pub fn accept(&self, candidate: &FilingCandidate) -> Option<DocumentType> {
        candidate.security_code()?;

        let ordinance = candidate.ordinance_code.as_deref().map(str::trim)?;
        if !self.ordinance_codes.iter().any(|c| c == ordinance) {
            return None;
        }
        if self.is_amendment(candidate) {
            return None;
        }

        match self.classify(candidate) {
            DocumentType::Unknown => None,
            kind => Some(kind),
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Compares a user-supplied security code with the code in the listing.
///
/// Matches on exact equality, on a 4-character input against the 5-character listed
/// code that extends it with a check digit, and on the reverse of that.
pub fn security_code_matches(input: &str, listed: &str) -> bool {
    let input = normalize_code(input);
    let listed = normalize_code(listed);
    if input.is_empty() || listed.is_empty() {
        return false;
    }
    if input == listed {
        return true;
    }
    match (input.len(), listed.len()) {
        (4, 5) => listed.starts_with(&input),
        (5, 4) => input.starts_with(&listed),
        _ => false,
    }
}

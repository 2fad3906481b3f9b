use serde::{Deserialize, Serialize};

/// The six narrative sections of an annual securities report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    /// A: 事業の内容
    BusinessDescription,
    /// B: 経営方針、経営環境及び対処すべき課題等
    ManagementPolicy,
    /// C: 事業等のリスク
    BusinessRisks,
    /// D: 経営者による財政状態、経営成績及びキャッシュ・フローの状況の分析
    Mdna,
    /// E: 経営上の重要な契約等
    MaterialContracts,
    /// F: 設備投資等の概要
    CapitalInvestment,
}

impl SectionId {
    pub const ALL: [SectionId; 6] = [
        SectionId::BusinessDescription,
        SectionId::ManagementPolicy,
        SectionId::BusinessRisks,
        SectionId::Mdna,
        SectionId::MaterialContracts,
        SectionId::CapitalInvestment,
    ];

    pub fn letter(self) -> char {
        match self {
            SectionId::BusinessDescription => 'A',
            SectionId::ManagementPolicy => 'B',
            SectionId::BusinessRisks => 'C',
            SectionId::Mdna => 'D',
            SectionId::MaterialContracts => 'E',
            SectionId::CapitalInvestment => 'F',
        }
    }
}

/// Start and end heading phrases for cutting a section out of a combined block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceRule {
    pub start: String,
    /// Any of these ends the slice; the line containing it is excluded.
    pub ends: Vec<String>,
}

/// How one section is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDefinition {
    pub id: SectionId,
    /// Canonical heading every extracted text starts with.
    pub title: String,
    /// Tag names tried in order, matched by suffix and then by substring.
    pub tags: Vec<String>,
    pub slicing: Option<SliceRule>,
}

/// Immutable table of section definitions handed to the extractor.
///
/// New filer taxonomy variants are additions to this table (another tag name, another
/// end phrase) rather than code changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTaxonomy {
    sections: Vec<SectionDefinition>,
    /// Combined discussion blocks that slicing rules cut from.
    discussion_tags: Vec<String>,
}

fn def(id: SectionId, title: &str, tags: &[&str], slicing: Option<(&str, &[&str])>) -> SectionDefinition {
    SectionDefinition {
        id,
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        slicing: slicing.map(|(start, ends)| SliceRule {
            start: start.to_string(),
            ends: ends.iter().map(|e| e.to_string()).collect(),
        }),
    }
}

impl Default for SectionTaxonomy {
    fn default() -> Self {
        Self {
            sections: vec![
                def(
                    SectionId::BusinessDescription,
                    "事業の内容",
                    &["DescriptionOfBusinessTextBlock"],
                    None,
                ),
                def(
                    SectionId::ManagementPolicy,
                    "経営方針、経営環境及び対処すべき課題等",
                    &[
                        "BusinessPolicyBusinessEnvironmentIssuesToAddressEtcTextBlock",
                        "BusinessPolicyTextBlock",
                    ],
                    Some(("経営方針", &["事業等のリスク"])),
                ),
                def(
                    SectionId::BusinessRisks,
                    "事業等のリスク",
                    &["BusinessRisksTextBlock"],
                    None,
                ),
                def(
                    SectionId::Mdna,
                    "経営者による財政状態、経営成績及びキャッシュ・フローの状況の分析",
                    &["ManagementAnalysisOfFinancialPositionOperatingResultsAndCashFlowsTextBlock"],
                    Some(("経営者による財政状態", &["経営上の重要な契約等", "研究開発活動"])),
                ),
                def(
                    SectionId::MaterialContracts,
                    "経営上の重要な契約等",
                    &["CriticalContractsForOperationTextBlock"],
                    None,
                ),
                def(
                    SectionId::CapitalInvestment,
                    "設備投資等の概要",
                    &["OverviewOfCapitalExpendituresEtcTextBlock"],
                    None,
                ),
            ],
            discussion_tags: vec![
                "BusinessResultsOfOperationsTextBlock".to_string(),
                "OverviewOfBusinessResultsTextBlock".to_string(),
            ],
        }
    }
}

impl SectionTaxonomy {
    /// Builds a taxonomy from explicit definitions. Ids missing from `sections` simply
    /// stay empty in every extraction.
    pub fn new(sections: Vec<SectionDefinition>, discussion_tags: Vec<String>) -> Self {
        Self {
            sections,
            discussion_tags,
        }
    }

    pub fn sections(&self) -> &[SectionDefinition] {
        &self.sections
    }

    pub fn discussion_tags(&self) -> &[String] {
        &self.discussion_tags
    }

    pub fn get(&self, id: SectionId) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Returns a copy with an extra tag name for `id`, tried after the existing ones.
    pub fn with_extra_tag(mut self, id: SectionId, tag: impl Into<String>) -> Self {
        if let Some(section) = self.sections.iter_mut().find(|s| s.id == id) {
            section.tags.push(tag.into());
        }
        self
    }
}

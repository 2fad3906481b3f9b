//! Resolution strategies, tried in order until one yields text.

use super::taxonomy::SectionDefinition;
use crate::parsing::textblock::TextBlockCollection;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[（(][0-9０-９]+[）)]").expect("valid regex"));
static BRACKETED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"【[^】]+】").expect("valid regex"));

/// One way of finding a section's text among the collected blocks.
pub trait SectionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn try_extract(&self, blocks: &TextBlockCollection, section: &SectionDefinition)
    -> Option<String>;
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Looks the section's tag names up directly.
#[derive(Debug, Default, Clone)]
pub struct ExactTagStrategy;

impl SectionStrategy for ExactTagStrategy {
    fn name(&self) -> &'static str {
        "exact-tag"
    }

    fn try_extract(
        &self,
        blocks: &TextBlockCollection,
        section: &SectionDefinition,
    ) -> Option<String> {
        section.tags.iter().find_map(|tag| {
            blocks
                .find_by_suffix(tag)
                .or_else(|| blocks.find_containing(tag))
                .and_then(|block| non_empty(&block.text))
        })
    }
}

/// Cuts a section out of a combined discussion block by heading phrases.
#[derive(Debug, Clone)]
pub struct SubsectionSliceStrategy {
    discussion_tags: Vec<String>,
    /// Lines taken from the start heading when no end heading follows.
    pub max_lines: usize,
}

impl SubsectionSliceStrategy {
    pub fn new(discussion_tags: Vec<String>) -> Self {
        Self {
            discussion_tags,
            max_lines: 1000,
        }
    }
}

/// Puts every parenthesized numeral and bracketed heading on its own line start.
pub fn split_headings(text: &str) -> String {
    let text = NUMBERED_HEADING.replace_all(text, "\n$0");
    BRACKETED_HEADING.replace_all(&text, "\n$0").into_owned()
}

/// Lines from the first one containing `start` up to, not including, the first later
/// line containing any of `ends`.
pub fn slice_between(text: &str, start: &str, ends: &[String], max_lines: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let begin = lines.iter().position(|line| line.contains(start))?;

    let end = lines[begin + 1..]
        .iter()
        .position(|line| ends.iter().any(|e| line.contains(e.as_str())))
        .map(|offset| begin + 1 + offset)
        .unwrap_or_else(|| (begin + max_lines).min(lines.len()));

    non_empty(&lines[begin..end].join("\n"))
}

impl SectionStrategy for SubsectionSliceStrategy {
    fn name(&self) -> &'static str {
        "subsection-slice"
    }

    fn try_extract(
        &self,
        blocks: &TextBlockCollection,
        section: &SectionDefinition,
    ) -> Option<String> {
        let rule = section.slicing.as_ref()?;

        self.discussion_tags.iter().find_map(|tag| {
            let block = blocks.find_by_suffix(tag)?;
            let normalized = split_headings(&block.text);
            slice_between(&normalized, &rule.start, &rule.ends, self.max_lines)
        })
    }
}

/// Returns the first block whose opening mentions the section title.
#[derive(Debug, Clone)]
pub struct TitlePhraseStrategy {
    /// Characters from the start of each block that are searched.
    pub window: usize,
}

impl Default for TitlePhraseStrategy {
    fn default() -> Self {
        Self { window: 500 }
    }
}

impl SectionStrategy for TitlePhraseStrategy {
    fn name(&self) -> &'static str {
        "title-phrase"
    }

    fn try_extract(
        &self,
        blocks: &TextBlockCollection,
        section: &SectionDefinition,
    ) -> Option<String> {
        let bracketed = format!("【{}】", section.title);
        blocks.iter().find_map(|block| {
            let head: String = block.text.chars().take(self.window).collect();
            if head.contains(&bracketed) || head.contains(&section.title) {
                non_empty(&block.text)
            } else {
                None
            }
        })
    }
}

/// Numbering and an opening bracket that may sit in front of a heading title.
static TITLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*第?[(（]?[0-9０-９一二三四五六七八九十]*[)）]?[.．、]?\s*[【「(（]?")
        .expect("valid regex")
});

/// Makes `text` start with `title`.
///
/// A title that opens the text, possibly behind numbering and an opening bracket,
/// is kept in place with that prefix and a closing bracket after it dropped. Any
/// other text is left intact with the title put on its own line in front.
pub fn reanchor(text: &str, title: &str) -> String {
    let prefix = TITLE_PREFIX.find(text).map_or(0, |m| m.end());
    if let Some(rest) = text[prefix..].strip_prefix(title) {
        let rest = rest.strip_prefix(['】', '」']).unwrap_or(rest);
        return format!("{}{}", title, rest);
    }
    format!("{}\n{}", title, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::textblock::TextBlock;
    use crate::sections::taxonomy::{SectionId, SectionTaxonomy};

    fn collection(blocks: &[(&str, &str)]) -> TextBlockCollection {
        let mut c = TextBlockCollection::default();
        for (name, text) in blocks {
            c.insert(TextBlock {
                name: name.to_string(),
                text: text.to_string(),
            });
        }
        c
    }

    #[test]
    fn test_split_headings() {
        let text = "概要(1) 経営方針 本文（２）経営環境【事業等のリスク】続き";
        assert_eq!(
            split_headings(text),
            "概要\n(1) 経営方針 本文\n（２）経営環境\n【事業等のリスク】続き"
        );
    }

    #[test]
    fn test_slice_between() {
        let text = "前文\n(1) 経営方針\n方針本文\n【事業等のリスク】\nリスク本文";
        let sliced = slice_between(text, "経営方針", &["事業等のリスク".to_string()], 1000);
        assert_eq!(sliced.as_deref(), Some("(1) 経営方針\n方針本文"));

        let open_ended = slice_between("a\nstart\nb\nc", "start", &["zzz".to_string()], 2);
        assert_eq!(open_ended.as_deref(), Some("start\nb"));

        assert!(slice_between("nothing here", "start", &[], 10).is_none());
    }

    #[test]
    fn test_exact_tag_prefers_listed_order() {
        let taxonomy = SectionTaxonomy::default();
        let section = taxonomy.get(SectionId::ManagementPolicy).unwrap();
        let blocks = collection(&[
            ("jpcrp_cor:BusinessPolicyTextBlock", "old style"),
            (
                "jpcrp_cor:BusinessPolicyBusinessEnvironmentIssuesToAddressEtcTextBlock",
                "new style",
            ),
        ]);
        assert_eq!(
            ExactTagStrategy.try_extract(&blocks, section).as_deref(),
            Some("new style")
        );
    }

    #[test]
    fn test_slice_only_for_configured_sections() {
        let taxonomy = SectionTaxonomy::default();
        let strategy = SubsectionSliceStrategy::new(taxonomy.discussion_tags().to_vec());
        let blocks = collection(&[(
            "jpcrp_cor:BusinessResultsOfOperationsTextBlock",
            "(1) 経営成績 本文(2) 経営者による財政状態の分析 分析本文【研究開発活動】研究",
        )]);

        let mdna = strategy.try_extract(&blocks, taxonomy.get(SectionId::Mdna).unwrap());
        assert_eq!(mdna.as_deref(), Some("(2) 経営者による財政状態の分析 分析本文"));

        let risks = strategy.try_extract(&blocks, taxonomy.get(SectionId::BusinessRisks).unwrap());
        assert!(risks.is_none());
    }

    #[test]
    fn test_title_phrase_window() {
        let taxonomy = SectionTaxonomy::default();
        let section = taxonomy.get(SectionId::CapitalInvestment).unwrap();
        let late = format!("{}設備投資等の概要", "あ".repeat(600));
        let blocks = collection(&[
            ("x:LateTextBlock", late.as_str()),
            ("x:OtherTextBlock", "１【設備投資等の概要】当連結会計年度の設備投資"),
        ]);
        assert_eq!(
            TitlePhraseStrategy::default()
                .try_extract(&blocks, section)
                .as_deref(),
            Some("１【設備投資等の概要】当連結会計年度の設備投資")
        );
    }

    #[test]
    fn test_reanchor() {
        assert_eq!(
            reanchor("３【事業等のリスク】\n本文", "事業等のリスク"),
            "事業等のリスク\n本文"
        );
        assert_eq!(reanchor("本文のみ", "事業等のリスク"), "事業等のリスク\n本文のみ");
        assert_eq!(
            reanchor("事業等のリスク\n本文", "事業等のリスク"),
            "事業等のリスク\n本文"
        );
        assert_eq!(
            reanchor("（２）【経営者による分析】\n営業利益", "経営者による分析"),
            "経営者による分析\n営業利益"
        );
        assert_eq!(
            reanchor("(2) 経営者による分析\n営業利益", "経営者による分析"),
            "経営者による分析\n営業利益"
        );
    }

    #[test]
    fn test_reanchor_keeps_prose_around_title() {
        let text = "当社グループは自動車の製造販売を主な事業の内容としております。";
        assert_eq!(
            reanchor(text, "事業の内容"),
            format!("事業の内容\n{}", text)
        );
        assert_eq!(
            reanchor("概要\n１【事業の内容】本文", "事業の内容"),
            "事業の内容\n概要\n１【事業の内容】本文"
        );
    }
}

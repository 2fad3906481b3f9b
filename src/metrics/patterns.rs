//! Sign-pattern classification of growth figures.
//!
//! Each family looks at the direction of three metrics and maps the eight sign
//! combinations to a fixed label. Profitability reads ROE, EPS and BPS; valuation
//! reads PER, ROE and PBR. Directions come either from the change between the two
//! newest years or from the growth figure over the whole analysed period.

use super::{MetricsResult, YearMetric};
use serde::{Deserialize, Serialize};

/// Direction of three metrics, or a gap in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignPattern {
    /// `true` means the metric went up.
    Classified([bool; 3]),
    InsufficientData,
}

impl SignPattern {
    pub fn from_signs(signs: [Option<bool>; 3]) -> Self {
        match signs {
            [Some(a), Some(b), Some(c)] => SignPattern::Classified([a, b, c]),
            _ => SignPattern::InsufficientData,
        }
    }

    /// 1 for (+,+,+) through 8 for (-,-,-); 0 when data is missing.
    pub fn number(&self) -> u8 {
        match self {
            SignPattern::Classified([a, b, c]) => {
                1 + u8::from(!*a) * 4 + u8::from(!*b) * 2 + u8::from(!*c)
            }
            SignPattern::InsufficientData => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    /// ROE, EPS, BPS.
    Profitability,
    /// PER, ROE, PBR.
    Valuation,
}

struct Label {
    name: &'static str,
    evaluation: &'static str,
    note: &'static str,
    summary: &'static str,
}

const fn label(
    name: &'static str,
    evaluation: &'static str,
    note: &'static str,
    summary: &'static str,
) -> Label {
    Label {
        name,
        evaluation,
        note,
        summary,
    }
}

const PROFITABILITY: [Label; 8] = [
    label("王道成長", "最良", "効率も規模も拡大", "全期間で安定成長"),
    label("異常", "データ疑え", "数式矛盾（要確認）", "データの整合性を確認"),
    label("効率改善", "良好", "効率↑×規模維持", "効率重視の経営"),
    label("効率改善", "要注意", "効率↑×規模縮小", "規模縮小傾向"),
    label("規模拡大", "良好", "効率↓×規模拡大", "効率悪化しながら拡大"),
    label("異常", "データ疑え", "数式矛盾（要確認）", "データの整合性を確認"),
    label("規模維持", "要注意", "効率↓×規模維持", "リストラ局面"),
    label("全面悪化", "最悪", "効率も規模も縮小", "全面的な業績悪化"),
];

const VALUATION: [Label; 8] = [
    label("成長＋再評価", "初期良、後半注意", "実力↑×期待↑", "全期間で期待先行"),
    label("成長＋期待先行", "要注意", "実力↑×期待過大", "期待が先行しすぎ"),
    label("期待先行", "要注意", "実力↓×期待↑", "実力と期待の乖離"),
    label("期待先行", "最悪", "実力↓×期待過大", "実力不足で期待先行"),
    label("成長＋割安", "最良", "実力↑×期待↓", "実力向上で割安"),
    label("成長＋割安", "良好", "実力↑×期待適正", "実力向上で適正評価"),
    label("割安", "要注意", "実力↓×期待↓", "実力低下で割安"),
    label("全面悪化", "最悪", "実力↓×期待↓", "全面的な評価下落"),
];

const INSUFFICIENT: Label = label("不明", "評価不可", "データ不足", "CAGRを計算できませんでした");

impl PatternFamily {
    pub fn metric_names(&self) -> [&'static str; 3] {
        match self {
            PatternFamily::Profitability => ["ROE", "EPS", "BPS"],
            PatternFamily::Valuation => ["PER", "ROE", "PBR"],
        }
    }

    fn pick(&self, metric: &YearMetric) -> [Option<f64>; 3] {
        match self {
            PatternFamily::Profitability => [metric.roe, metric.eps, metric.bps],
            PatternFamily::Valuation => [metric.per, metric.roe, metric.pbr],
        }
    }

    fn label(&self, pattern: SignPattern) -> &'static Label {
        let table = match self {
            PatternFamily::Profitability => &PROFITABILITY,
            PatternFamily::Valuation => &VALUATION,
        };
        match pattern.number() {
            0 => &INSUFFICIENT,
            n => &table[usize::from(n) - 1],
        }
    }
}

/// A classified pattern with its display labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvaluation {
    pub family: PatternFamily,
    pub pattern: SignPattern,
    pub number: u8,
    pub name: String,
    pub evaluation: String,
    pub note: String,
    /// Whole-period wording; only set on period evaluations.
    pub summary: Option<String>,
    /// Signs that produced the pattern, e.g. `ROE:+, EPS:+, BPS:-`.
    pub basis: String,
}

impl PatternEvaluation {
    pub fn evaluate(family: PatternFamily, signs: [Option<bool>; 3], with_summary: bool) -> Self {
        let pattern = SignPattern::from_signs(signs);
        let label = family.label(pattern);
        let basis = match pattern {
            SignPattern::Classified(signs) => family
                .metric_names()
                .iter()
                .zip(signs)
                .map(|(name, up)| format!("{}:{}", name, if up { '+' } else { '-' }))
                .collect::<Vec<_>>()
                .join(", "),
            SignPattern::InsufficientData => "N/A".to_string(),
        };

        Self {
            family,
            pattern,
            number: pattern.number(),
            name: label.name.to_string(),
            evaluation: label.evaluation.to_string(),
            note: label.note.to_string(),
            summary: with_summary.then(|| label.summary.to_string()),
            basis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPair {
    pub profitability: PatternEvaluation,
    pub valuation: PatternEvaluation,
}

/// Patterns for the latest year-over-year move and for the whole period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub latest: PatternPair,
    pub period: PatternPair,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::from_metrics(&MetricsResult::default())
    }
}

impl PatternSet {
    /// Latest signs compare the two newest years (up means a positive change).
    /// Period signs are the sign of each growth figure.
    pub fn from_metrics(metrics: &MetricsResult) -> Self {
        let latest = |family: PatternFamily| {
            let signs = match metrics.years.as_slice() {
                [newest, older, ..] => {
                    let (newest, older) = (family.pick(newest), family.pick(older));
                    std::array::from_fn(|i| match (newest[i], older[i]) {
                        (Some(n), Some(o)) => Some(n - o > 0.0),
                        _ => None,
                    })
                }
                _ => [None; 3],
            };
            PatternEvaluation::evaluate(family, signs, false)
        };

        let growth = &metrics.growth;
        let period = |family: PatternFamily| {
            let values = match family {
                PatternFamily::Profitability => [growth.roe, growth.eps, growth.bps],
                PatternFamily::Valuation => [growth.per, growth.roe, growth.pbr],
            };
            PatternEvaluation::evaluate(family, values.map(|g| g.map(|g| g > 0.0)), true)
        };

        Self {
            latest: PatternPair {
                profitability: latest(PatternFamily::Profitability),
                valuation: latest(PatternFamily::Valuation),
            },
            period: PatternPair {
                profitability: period(PatternFamily::Profitability),
                valuation: period(PatternFamily::Valuation),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::GrowthFigures;

    #[test]
    fn test_pattern_numbers() {
        let cases = [
            ([true, true, true], 1),
            ([true, true, false], 2),
            ([true, false, true], 3),
            ([true, false, false], 4),
            ([false, true, true], 5),
            ([false, true, false], 6),
            ([false, false, true], 7),
            ([false, false, false], 8),
        ];
        for (signs, expected) in cases {
            assert_eq!(SignPattern::Classified(signs).number(), expected, "{:?}", signs);
        }
        assert_eq!(
            SignPattern::from_signs([Some(true), None, Some(false)]),
            SignPattern::InsufficientData
        );
        assert_eq!(SignPattern::InsufficientData.number(), 0);
    }

    #[test]
    fn test_family_labels() {
        let cases = [
            (PatternFamily::Profitability, [true, true, true], "王道成長", "最良"),
            (PatternFamily::Profitability, [true, true, false], "異常", "データ疑え"),
            (PatternFamily::Profitability, [false, false, true], "規模維持", "要注意"),
            (PatternFamily::Profitability, [false, false, false], "全面悪化", "最悪"),
            (PatternFamily::Valuation, [true, true, true], "成長＋再評価", "初期良、後半注意"),
            (PatternFamily::Valuation, [false, true, true], "成長＋割安", "最良"),
            (PatternFamily::Valuation, [true, false, false], "期待先行", "最悪"),
            (PatternFamily::Valuation, [false, false, true], "割安", "要注意"),
        ];
        for (family, signs, name, evaluation) in cases {
            let e = PatternEvaluation::evaluate(family, signs.map(Some), true);
            assert_eq!(e.name, name, "{:?} {:?}", family, signs);
            assert_eq!(e.evaluation, evaluation, "{:?} {:?}", family, signs);
        }
    }

    #[test]
    fn test_basis_and_summary() {
        let e = PatternEvaluation::evaluate(
            PatternFamily::Profitability,
            [Some(true), Some(false), Some(true)],
            true,
        );
        assert_eq!(e.number, 3);
        assert_eq!(e.basis, "ROE:+, EPS:-, BPS:+");
        assert_eq!(e.summary.as_deref(), Some("効率重視の経営"));

        let latest = PatternEvaluation::evaluate(
            PatternFamily::Valuation,
            [Some(false), Some(false), Some(false)],
            false,
        );
        assert_eq!(latest.basis, "PER:-, ROE:-, PBR:-");
        assert_eq!(latest.summary, None);

        let missing = PatternEvaluation::evaluate(PatternFamily::Valuation, [None; 3], true);
        assert_eq!(missing.pattern, SignPattern::InsufficientData);
        assert_eq!(missing.name, "不明");
        assert_eq!(missing.basis, "N/A");
        assert_eq!(missing.summary.as_deref(), Some("CAGRを計算できませんでした"));
    }

    fn year(roe: f64, eps: f64, bps: f64, per: f64, pbr: f64) -> YearMetric {
        YearMetric {
            roe: Some(roe),
            eps: Some(eps),
            bps: Some(bps),
            per: Some(per),
            pbr: Some(pbr),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_metrics() {
        let metrics = MetricsResult {
            years: vec![
                year(10.0, 120.0, 1100.0, 12.0, 1.2),
                year(9.0, 100.0, 1000.0, 15.0, 1.3),
                year(8.0, 90.0, 1200.0, 14.0, 1.1),
            ],
            growth: GrowthFigures {
                roe: Some(11.8),
                eps: Some(15.5),
                bps: Some(-4.3),
                per: Some(-7.4),
                pbr: Some(4.4),
                ..Default::default()
            },
            ..Default::default()
        };

        let set = PatternSet::from_metrics(&metrics);
        assert_eq!(set.latest.profitability.number, 1);
        assert_eq!(set.latest.valuation.basis, "PER:-, ROE:+, PBR:-");
        assert_eq!(set.latest.valuation.number, 6);
        assert_eq!(set.period.profitability.number, 2);
        assert_eq!(set.period.valuation.number, 5);
        assert_eq!(set.period.valuation.name, "成長＋割安");
    }

    #[test]
    fn test_single_year_is_insufficient() {
        let metrics = MetricsResult {
            years: vec![year(10.0, 120.0, 1100.0, 12.0, 1.2)],
            ..Default::default()
        };
        let set = PatternSet::from_metrics(&metrics);
        assert_eq!(set.latest.profitability.pattern, SignPattern::InsufficientData);
        assert_eq!(set.period.valuation.number, 0);
        assert_eq!(set, PatternSet::default());
    }
}

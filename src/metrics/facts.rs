use crate::parsing::utils::{deserialize_lenient_f64, deserialize_optional_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One fiscal year of reported figures.
///
/// Field aliases accept the column names of the usual statement feeds (`CurFYEn`,
/// `DiscDate`, `Sales`, `OP`, ...). Numbers may arrive as JSON numbers or strings;
/// anything that does not parse is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualFact {
    #[serde(default, alias = "Code")]
    pub code: Option<String>,
    #[serde(default, alias = "CurFYEn", deserialize_with = "deserialize_optional_date")]
    pub period_end: Option<NaiveDate>,
    #[serde(
        default,
        alias = "DiscDate",
        alias = "DisclosedDate",
        deserialize_with = "deserialize_optional_date"
    )]
    pub disclosure_date: Option<NaiveDate>,
    /// Reporting period of the row: `FY` for a full year, `1Q`..`3Q` or similar for
    /// interim rows. `None` means the row is already known to be annual.
    #[serde(default, alias = "CurPerType")]
    pub period_type: Option<String>,
    #[serde(default, alias = "Sales", deserialize_with = "deserialize_lenient_f64")]
    pub revenue: Option<f64>,
    #[serde(default, alias = "OP", deserialize_with = "deserialize_lenient_f64")]
    pub operating_profit: Option<f64>,
    #[serde(default, alias = "NP", deserialize_with = "deserialize_lenient_f64")]
    pub net_profit: Option<f64>,
    #[serde(default, alias = "Eq", deserialize_with = "deserialize_lenient_f64")]
    pub equity: Option<f64>,
    #[serde(default, alias = "CFO", deserialize_with = "deserialize_lenient_f64")]
    pub operating_cf: Option<f64>,
    #[serde(default, alias = "CFI", deserialize_with = "deserialize_lenient_f64")]
    pub investing_cf: Option<f64>,
    #[serde(default, alias = "EPS", deserialize_with = "deserialize_lenient_f64")]
    pub eps: Option<f64>,
    #[serde(default, alias = "BPS", deserialize_with = "deserialize_lenient_f64")]
    pub bps: Option<f64>,
    /// Payout ratio as a fraction (0.3 means 30%).
    #[serde(
        default,
        alias = "PayoutRatioAnn",
        deserialize_with = "deserialize_lenient_f64"
    )]
    pub payout_ratio: Option<f64>,
}

/// A value usable as a headline figure: present, a number, and not zero.
pub(crate) fn is_meaningful(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan() && v != 0.0)
}

pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl AnnualFact {
    /// `false` when revenue, operating profit, net profit and equity are all unusable.
    pub fn has_headline_figures(&self) -> bool {
        [
            self.revenue,
            self.operating_profit,
            self.net_profit,
            self.equity,
        ]
        .into_iter()
        .any(is_meaningful)
    }

    /// `true` for full-year rows and rows without a period type.
    pub fn is_full_year(&self) -> bool {
        self.period_type
            .as_deref()
            .is_none_or(|t| t.trim().eq_ignore_ascii_case("FY"))
    }
}

/// Selects the annual series out of a raw statement feed.
///
/// Keeps full-year rows that have a period end and at least one headline figure, sorts
/// them newest first, and collapses repeated period ends to one row: a row with revenue
/// beats one without, otherwise the latest disclosure wins.
pub fn annual_facts(records: impl IntoIterator<Item = AnnualFact>) -> Vec<AnnualFact> {
    let mut rows: Vec<AnnualFact> = records
        .into_iter()
        .filter(|r| r.is_full_year() && r.period_end.is_some())
        .filter(|r| {
            let keep = r.has_headline_figures();
            if !keep {
                tracing::warn!(
                    "Dropping {:?}: revenue, operating profit, net profit and equity are all missing",
                    r.period_end
                );
            }
            keep
        })
        .collect();

    rows.sort_by(|a, b| {
        (b.period_end, b.disclosure_date).cmp(&(a.period_end, a.disclosure_date))
    });

    let mut position: HashMap<NaiveDate, usize> = HashMap::new();
    let mut unique: Vec<AnnualFact> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(period_end) = row.period_end else {
            continue;
        };
        match position.get(&period_end) {
            None => {
                position.insert(period_end, unique.len());
                unique.push(row);
            }
            Some(&i) => {
                let existing = &unique[i];
                let replace = match (row.revenue.is_some(), existing.revenue.is_some()) {
                    (true, false) => true,
                    (a, b) if a == b => row.disclosure_date > existing.disclosure_date,
                    _ => false,
                };
                if replace {
                    unique[i] = row;
                }
            }
        }
    }

    tracing::debug!("Selected {} annual rows", unique.len());
    unique
}

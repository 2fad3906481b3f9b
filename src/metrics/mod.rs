//! Multi-year ratios and adaptive growth figures.
//!
//! [`compute_metrics`] takes newest-first [`AnnualFact`] records, filters out unusable
//! years, derives per-year ratios and one growth figure per metric. How a growth figure
//! was computed depends only on how many valid values fed it (see [`growth_rate`]), so
//! a two-year history and a ten-year history go through the same code path.

mod facts;
mod growth;
mod patterns;

pub use facts::{AnnualFact, annual_facts};
pub use growth::{GrowthFigures, cagr, growth_rate, yoy_growth};
pub use patterns::{PatternEvaluation, PatternFamily, PatternPair, PatternSet, SignPattern};

use chrono::NaiveDate;
use facts::finite;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How much history backs the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataAvailability {
    /// Three or more usable years.
    Full,
    /// Exactly two usable years; growth figures are year-over-year.
    Limited,
    #[default]
    Insufficient,
}

impl DataAvailability {
    pub fn from_years(years: usize) -> Self {
        match years {
            0 | 1 => DataAvailability::Insufficient,
            2 => DataAvailability::Limited,
            _ => DataAvailability::Full,
        }
    }
}

/// Derived figures for one fiscal year, alongside the inputs they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearMetric {
    pub period_end: Option<NaiveDate>,
    pub revenue: Option<f64>,
    pub operating_profit: Option<f64>,
    pub net_profit: Option<f64>,
    pub equity: Option<f64>,
    pub operating_cf: Option<f64>,
    pub investing_cf: Option<f64>,
    pub fcf: Option<f64>,
    pub roe: Option<f64>,
    pub eps: Option<f64>,
    pub bps: Option<f64>,
    pub price: Option<f64>,
    pub per: Option<f64>,
    pub pbr: Option<f64>,
    /// Payout ratio in percent.
    pub payout_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub code: Option<String>,
    pub latest_period_end: Option<NaiveDate>,
    /// Number of years actually used.
    pub analysis_years: usize,
    /// Newest first, one entry per distinct period end.
    pub years: Vec<YearMetric>,
    pub growth: GrowthFigures,
    pub availability: DataAvailability,
}

impl MetricsResult {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn latest(&self) -> Option<&YearMetric> {
        self.years.first()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Cap applied when the caller does not ask for a specific number of years.
    pub max_analysis_years: usize,
    /// Reference date for dropping future periods. `None` means the local date.
    pub today: Option<NaiveDate>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_analysis_years: 10,
            today: None,
        }
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => finite(Some(n / d)),
        _ => None,
    }
}

fn price_for(prices: &HashMap<String, f64>, period_end: NaiveDate) -> Option<f64> {
    let dashed = period_end.format("%Y-%m-%d").to_string();
    prices
        .get(&dashed)
        .or_else(|| prices.get(&dashed.replace('-', "")))
        .copied()
}

fn year_metric(fact: &AnnualFact, prices: Option<&HashMap<String, f64>>) -> YearMetric {
    let revenue = finite(fact.revenue);
    let operating_profit = finite(fact.operating_profit);
    let net_profit = finite(fact.net_profit);
    let equity = finite(fact.equity);
    let operating_cf = finite(fact.operating_cf);
    let investing_cf = finite(fact.investing_cf);
    let eps = finite(fact.eps);
    let bps = finite(fact.bps);

    let fcf = match (operating_cf, investing_cf) {
        (Some(op), Some(inv)) => Some(op + inv),
        _ => None,
    };
    let roe = ratio(net_profit, equity).map(|r| r * 100.0);

    let price = prices
        .zip(fact.period_end)
        .and_then(|(prices, period_end)| finite(price_for(prices, period_end)));
    let positive_price = price.filter(|p| *p > 0.0);

    YearMetric {
        period_end: fact.period_end,
        revenue,
        operating_profit,
        net_profit,
        equity,
        operating_cf,
        investing_cf,
        fcf,
        roe,
        eps,
        bps,
        price,
        per: ratio(positive_price, eps),
        pbr: ratio(positive_price, bps),
        payout_ratio: finite(fact.payout_ratio).map(|p| p * 100.0),
    }
}

impl MetricsConfig {
    pub fn with_max_analysis_years(mut self, years: usize) -> Self {
        self.max_analysis_years = years;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Computes per-year metrics and growth figures.
    ///
    /// `facts` must be newest first; it is filtered, never reordered. Records without a
    /// period end, with a period end after today, or without any headline figure are
    /// dropped, then repeated period ends keep their first occurrence. `analysis_years`
    /// limits how many survivors are used; without it, up to `max_analysis_years`.
    pub fn compute(
        &self,
        facts: &[AnnualFact],
        prices: Option<&HashMap<String, f64>>,
        analysis_years: Option<usize>,
    ) -> MetricsResult {
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let limit = analysis_years.unwrap_or(self.max_analysis_years);

        let mut seen = HashSet::new();
        let mut selected: Vec<&AnnualFact> = Vec::new();
        for fact in facts {
            if selected.len() >= limit {
                break;
            }
            let Some(period_end) = fact.period_end else {
                continue;
            };
            if period_end > today {
                tracing::debug!("Skipping future period {}", period_end);
                continue;
            }
            if !fact.has_headline_figures() {
                tracing::warn!(
                    "Skipping period {}: revenue, operating profit, net profit and equity are all missing",
                    period_end
                );
                continue;
            }
            if seen.insert(period_end) {
                selected.push(fact);
            }
        }

        tracing::debug!(
            "Using {} of {} annual records (limit {})",
            selected.len(),
            facts.len(),
            limit
        );

        if selected.is_empty() {
            return MetricsResult::default();
        }

        let years: Vec<YearMetric> = selected
            .iter()
            .map(|fact| year_metric(fact, prices))
            .collect();

        let series = |pick: fn(&YearMetric) -> Option<f64>| -> Option<f64> {
            growth_rate(&years.iter().map(pick).collect::<Vec<_>>())
        };
        let growth = GrowthFigures {
            fcf: series(|y| y.fcf),
            roe: series(|y| y.roe),
            eps: series(|y| y.eps),
            bps: series(|y| y.bps),
            revenue: series(|y| y.revenue),
            per: series(|y| y.per),
            pbr: series(|y| y.pbr),
            payout_ratio: series(|y| y.payout_ratio),
        };

        MetricsResult {
            code: selected[0].code.clone(),
            latest_period_end: selected[0].period_end,
            analysis_years: years.len(),
            availability: DataAvailability::from_years(years.len()),
            years,
            growth,
        }
    }
}

/// [`MetricsConfig::compute`] with the default configuration.
pub fn compute_metrics(
    facts: &[AnnualFact],
    prices: Option<&HashMap<String, f64>>,
    analysis_years: Option<usize>,
) -> MetricsResult {
    MetricsConfig::default().compute(facts, prices, analysis_years)
}

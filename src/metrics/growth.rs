use serde::{Deserialize, Serialize};

/// Percent change from `oldest` to `newest`. Both must be strictly positive.
pub fn yoy_growth(newest: f64, oldest: f64) -> Option<f64> {
    if newest <= 0.0 || oldest <= 0.0 {
        return None;
    }
    finite((newest / oldest - 1.0) * 100.0)
}

/// Compound annual growth over `periods` periods, in percent.
pub fn cagr(newest: f64, oldest: f64, periods: usize) -> Option<f64> {
    if newest <= 0.0 || oldest <= 0.0 || periods == 0 {
        return None;
    }
    finite(((newest / oldest).powf(1.0 / periods as f64) - 1.0) * 100.0)
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Growth across a newest-first series.
///
/// Missing values are dropped first. Two remaining values give a year-over-year
/// change, three or more a CAGR over `n - 1` periods, fewer than two give `None`.
/// Only the endpoints are gated on sign; intermediate values may be anything.
pub fn growth_rate(values: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();

    match valid.as_slice() {
        [] | [_] => None,
        [newest, oldest] => yoy_growth(*newest, *oldest),
        [newest, .., oldest] => cagr(*newest, *oldest, valid.len() - 1),
    }
}

/// One growth figure per growth-bearing metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthFigures {
    pub fcf: Option<f64>,
    pub roe: Option<f64>,
    pub eps: Option<f64>,
    pub bps: Option<f64>,
    pub revenue: Option<f64>,
    pub per: Option<f64>,
    pub pbr: Option<f64>,
    pub payout_ratio: Option<f64>,
}

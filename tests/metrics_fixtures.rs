mod common;

use common::{date, read_fixture};
use edinetkit::{AnnualFact, DataAvailability, MetricsConfig, annual_facts, compute_metrics};
use std::collections::HashMap;

fn facts() -> Vec<AnnualFact> {
    serde_json::from_str(&read_fixture("facts/annual.json")).unwrap()
}

#[test]
fn parse_statement_feed_columns() {
    let facts = facts();
    assert_eq!(facts.len(), 6);

    let latest = &facts[0];
    assert_eq!(latest.code.as_deref(), Some("72030"));
    assert_eq!(latest.period_end, Some(date(2024, 3, 31)));
    assert_eq!(latest.disclosure_date, Some(date(2024, 5, 8)));
    assert_eq!(latest.revenue, Some(45_095_325_000_000.0));
    assert_eq!(latest.investing_cf, Some(-4_998_751_000_000.0));
    assert_eq!(latest.payout_ratio, Some(0.205));

    assert!(facts[4].period_end.is_none());
    assert!(!facts[5].has_headline_figures());
}

#[test]
fn three_usable_years_use_cagr() {
    let facts = facts();
    let result = compute_metrics(&facts, None, None);

    assert_eq!(result.analysis_years, 3);
    assert_eq!(result.availability, DataAvailability::Full);
    assert_eq!(result.latest_period_end, Some(date(2024, 3, 31)));
    assert_eq!(result.code.as_deref(), Some("72030"));

    let periods: Vec<_> = result.years.iter().map(|y| y.period_end).collect();
    assert_eq!(
        periods,
        vec![
            Some(date(2024, 3, 31)),
            Some(date(2023, 3, 31)),
            Some(date(2022, 3, 31)),
        ]
    );

    let expected = ((45_095_325.0f64 / 31_379_507.0).sqrt() - 1.0) * 100.0;
    assert!((result.growth.revenue.unwrap() - expected).abs() < 1e-6);

    let latest = result.latest().unwrap();
    assert_eq!(latest.fcf, Some(4_206_373_000_000.0 - 4_998_751_000_000.0));
    assert!((latest.payout_ratio.unwrap() - 20.5).abs() < 1e-9);
    assert!(latest.per.is_none());
}

#[test]
fn two_years_use_yoy() {
    let result = compute_metrics(&facts(), None, Some(2));

    assert_eq!(result.analysis_years, 2);
    assert_eq!(result.availability, DataAvailability::Limited);

    let expected = (365.94 - 179.47) / 179.47 * 100.0;
    assert!((result.growth.eps.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn prices_feed_valuation_ratios() {
    let mut prices = HashMap::new();
    prices.insert("2024-03-31".to_string(), 3_659.4);
    prices.insert("20230331".to_string(), 1_794.7);

    let result = compute_metrics(&facts(), Some(&prices), None);

    assert!((result.years[0].per.unwrap() - 10.0).abs() < 1e-9);
    assert!((result.years[1].per.unwrap() - 10.0).abs() < 1e-9);
    assert!(result.years[2].per.is_none());
    assert!((result.growth.per.unwrap()).abs() < 1e-9);
}

#[test]
fn periods_after_today_are_ignored() {
    let result = MetricsConfig::default()
        .with_today(date(2023, 12, 31))
        .compute(&facts(), None, None);

    assert_eq!(result.analysis_years, 2);
    assert_eq!(result.latest_period_end, Some(date(2023, 3, 31)));
}

#[test]
fn statement_feed_is_narrowed_to_annual_rows() {
    let feed: Vec<AnnualFact> = serde_json::from_str(&read_fixture("facts/feed.json")).unwrap();
    assert_eq!(feed.len(), 6);
    assert_eq!(feed[0].period_type.as_deref(), Some("3Q"));
    assert_eq!(feed[0].disclosure_date, Some(date(2025, 2, 5)));
    assert!(!feed[0].is_full_year());

    let annual = annual_facts(feed);
    let picked: Vec<_> = annual
        .iter()
        .map(|f| (f.period_end, f.disclosure_date))
        .collect();
    assert_eq!(
        picked,
        vec![
            (Some(date(2024, 3, 31)), Some(date(2024, 5, 8))),
            (Some(date(2023, 3, 31)), Some(date(2023, 7, 3))),
        ]
    );
    assert_eq!(annual[0].revenue, Some(45_095_325_000_000.0));
    assert_eq!(annual[1].net_profit, Some(2_451_000_000_000.0));

    let result = compute_metrics(&annual, None, None);
    assert_eq!(result.availability, DataAvailability::Limited);
    assert_eq!(result.latest_period_end, Some(date(2024, 3, 31)));
}

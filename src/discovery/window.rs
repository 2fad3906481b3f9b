//! Submission-date windows.
//!
//! The listing is keyed by submission date, so finding a year's report means guessing
//! which days it could have been filed on. A known disclosure date from the previous
//! facts narrows that to a tight window; otherwise the statutory three-month deadline
//! after a March year end is sampled.

use super::DiscoveryConfig;
use crate::metrics::AnnualFact;
use chrono::{Datelike, Duration, NaiveDate};

/// Fiscal year a period end belongs to. Periods closing in March are attributed to the
/// previous calendar year (April to March fiscal years).
pub fn fiscal_year_of(period_end: NaiveDate) -> i32 {
    if period_end.month() == 3 {
        period_end.year() - 1
    } else {
        period_end.year()
    }
}

/// The fact for `year` that can anchor a window: it must carry a disclosure date.
pub fn prior_fact_for_year(facts: &[AnnualFact], year: i32) -> Option<&AnnualFact> {
    facts.iter().find(|fact| {
        fact.disclosure_date.is_some()
            && fact.period_end.map(fiscal_year_of) == Some(year)
    })
}

/// Dates to query for `year` with the default window settings.
pub fn search_dates(year: i32, prior_fact: Option<&AnnualFact>, today: NaiveDate) -> Vec<NaiveDate> {
    DiscoveryConfig::default().search_dates(year, prior_fact, today)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

impl DiscoveryConfig {
    /// Dates to query for `year`, ascending, never after `today`.
    ///
    /// With a disclosure date the window is every day in
    /// `[max(disc - before, period_end), min(disc + after, period_end + horizon, today)]`.
    /// Without one, or when that window is empty, the 1st, 15th and last day of
    /// April to June of `year + 1` are used.
    pub fn search_dates(
        &self,
        year: i32,
        prior_fact: Option<&AnnualFact>,
        today: NaiveDate,
    ) -> Vec<NaiveDate> {
        if let Some(dates) = prior_fact.and_then(|fact| self.disclosure_window(fact, today)) {
            return dates;
        }
        self.fallback_dates(year, today)
    }

    fn disclosure_window(&self, fact: &AnnualFact, today: NaiveDate) -> Option<Vec<NaiveDate>> {
        let disclosed = fact.disclosure_date?;

        let mut start = disclosed - Duration::days(self.days_before_disclosure);
        let mut end = (disclosed + Duration::days(self.days_after_disclosure)).min(today);
        if let Some(period_end) = fact.period_end {
            start = start.max(period_end);
            end = end.min(period_end + Duration::days(self.days_after_period_end));
        }

        if start > end {
            tracing::debug!(
                "Empty disclosure window {}..{}, falling back to deadline dates",
                start,
                end
            );
            return None;
        }

        Some(start.iter_days().take_while(|d| *d <= end).collect())
    }

    fn fallback_dates(&self, year: i32, today: NaiveDate) -> Vec<NaiveDate> {
        let filing_year = year + 1;
        let mut dates = Vec::new();
        for month in 4..=6 {
            let days = [
                NaiveDate::from_ymd_opt(filing_year, month, 1),
                NaiveDate::from_ymd_opt(filing_year, month, 15),
                last_day_of_month(filing_year, month),
            ];
            dates.extend(days.into_iter().flatten().filter(|d| *d <= today));
        }
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fact(period_end: Option<NaiveDate>, disclosed: Option<NaiveDate>) -> AnnualFact {
        AnnualFact {
            period_end,
            disclosure_date: disclosed,
            ..Default::default()
        }
    }

    #[test]
    fn test_march_period_end_is_prior_year() {
        assert_eq!(fiscal_year_of(date(2024, 3, 31)), 2023);
        assert_eq!(fiscal_year_of(date(2024, 12, 31)), 2024);
        assert_eq!(fiscal_year_of(date(2024, 2, 29)), 2024);
    }

    #[test]
    fn test_fallback_dates() {
        let dates = search_dates(2023, None, date(2030, 1, 1));
        assert_eq!(
            dates,
            vec![
                date(2024, 4, 1),
                date(2024, 4, 15),
                date(2024, 4, 30),
                date(2024, 5, 1),
                date(2024, 5, 15),
                date(2024, 5, 31),
                date(2024, 6, 1),
                date(2024, 6, 15),
                date(2024, 6, 30),
            ]
        );
    }

    #[test]
    fn test_fallback_never_queries_future() {
        let dates = search_dates(2023, None, date(2024, 5, 10));
        assert_eq!(dates.last(), Some(&date(2024, 5, 1)));
        assert_eq!(dates.len(), 4);
    }

    #[test]
    fn test_disclosure_window_bounds() {
        let prior = fact(Some(date(2024, 3, 31)), Some(date(2024, 5, 8)));
        let dates = search_dates(2023, Some(&prior), date(2030, 1, 1));

        // max(May 1, Mar 31) .. min(Jul 7, Jun 29)
        assert_eq!(dates.first(), Some(&date(2024, 5, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 6, 29)));
        assert_eq!(dates.len(), 60);
    }

    #[test]
    fn test_disclosure_window_capped_by_today() {
        let prior = fact(Some(date(2024, 3, 31)), Some(date(2024, 5, 8)));
        let dates = search_dates(2023, Some(&prior), date(2024, 5, 10));
        assert_eq!(dates.last(), Some(&date(2024, 5, 10)));
    }

    #[test]
    fn test_empty_window_falls_back() {
        // disclosure in the future relative to "today" empties the window
        let prior = fact(Some(date(2024, 3, 31)), Some(date(2024, 8, 1)));
        let dates = search_dates(2023, Some(&prior), date(2024, 4, 20));
        assert_eq!(dates, vec![date(2024, 4, 1), date(2024, 4, 15)]);
    }

    #[test]
    fn test_prior_fact_selection() {
        let facts = vec![
            fact(Some(date(2025, 3, 31)), Some(date(2025, 5, 9))),
            fact(Some(date(2024, 3, 31)), None),
            fact(Some(date(2024, 3, 31)), Some(date(2024, 5, 8))),
        ];
        let found = prior_fact_for_year(&facts, 2023).unwrap();
        assert_eq!(found.disclosure_date, Some(date(2024, 5, 8)));
        assert!(prior_fact_for_year(&facts, 2020).is_none());
    }
}

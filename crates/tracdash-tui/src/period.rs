//! Report periods offered by the trip filter, resolved to local-day
//! boundaries.

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPeriod {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    PreviousWeek,
    ThisMonth,
    PreviousMonth,
    /// From/To typed in by hand.
    Custom,
}

impl ReportPeriod {
    pub const ALL: [Self; 7] = [
        Self::Today,
        Self::Yesterday,
        Self::ThisWeek,
        Self::PreviousWeek,
        Self::ThisMonth,
        Self::PreviousMonth,
        Self::Custom,
    ];

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Today => "reportToday",
            Self::Yesterday => "reportYesterday",
            Self::ThisWeek => "reportThisWeek",
            Self::PreviousWeek => "reportPreviousWeek",
            Self::ThisMonth => "reportThisMonth",
            Self::PreviousMonth => "reportPreviousMonth",
            Self::Custom => "reportCustom",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// `[from, to)` in UTC for the period containing `now`, using the
    /// timezone of `now` for day boundaries. Weeks start on Monday.
    /// `None` for [`Custom`](Self::Custom).
    pub fn range<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let since_monday = Days::new(today.weekday().num_days_from_monday().into());
        let monday = today.checked_sub_days(since_monday)?;
        let first = today.with_day(1)?;

        let (start, end) = match self {
            Self::Today => (today, today.checked_add_days(Days::new(1))?),
            Self::Yesterday => (today.checked_sub_days(Days::new(1))?, today),
            Self::ThisWeek => (monday, monday.checked_add_days(Days::new(7))?),
            Self::PreviousWeek => (monday.checked_sub_days(Days::new(7))?, monday),
            Self::ThisMonth => (first, first.checked_add_months(Months::new(1))?),
            Self::PreviousMonth => (first.checked_sub_months(Months::new(1))?, first),
            Self::Custom => return None,
        };

        let tz = now.timezone();
        Some((midnight(&tz, start)?, midnight(&tz, end)?))
    }
}

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// RFC 3339, or `YYYY-MM-DD` as local midnight.
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    midnight(&Local, date)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn thursday_afternoon() -> DateTime<FixedOffset> {
        // 2024-03-14 is a Thursday.
        DateTime::parse_from_rfc3339("2024-03-14T15:00:00+02:00").unwrap()
    }

    #[test]
    fn day_periods_use_local_midnight() {
        let now = thursday_afternoon();
        assert_eq!(
            ReportPeriod::Today.range(&now),
            Some((utc("2024-03-13T22:00:00Z"), utc("2024-03-14T22:00:00Z")))
        );
        assert_eq!(
            ReportPeriod::Yesterday.range(&now),
            Some((utc("2024-03-12T22:00:00Z"), utc("2024-03-13T22:00:00Z")))
        );
    }

    #[test]
    fn weeks_start_on_monday() {
        let now = thursday_afternoon();
        assert_eq!(
            ReportPeriod::ThisWeek.range(&now),
            Some((utc("2024-03-10T22:00:00Z"), utc("2024-03-17T22:00:00Z")))
        );
        assert_eq!(
            ReportPeriod::PreviousWeek.range(&now),
            Some((utc("2024-03-03T22:00:00Z"), utc("2024-03-10T22:00:00Z")))
        );
    }

    #[test]
    fn previous_month_handles_leap_february() {
        let now = thursday_afternoon();
        assert_eq!(
            ReportPeriod::PreviousMonth.range(&now),
            Some((utc("2024-01-31T22:00:00Z"), utc("2024-02-29T22:00:00Z")))
        );
        assert_eq!(ReportPeriod::Custom.range(&now), None);
    }

    #[test]
    fn period_cycles_through_all() {
        assert_eq!(ReportPeriod::Custom.next(), ReportPeriod::Today);
        assert_eq!(ReportPeriod::Today.prev(), ReportPeriod::Custom);
    }

    #[test]
    fn parses_rfc3339_and_rejects_garbage() {
        assert_eq!(parse_time("2024-01-01T00:00:00Z"), Some(utc("2024-01-01T00:00:00Z")));
        assert!(parse_time("2024-01-01").is_some());
        assert_eq!(parse_time("yesterday-ish"), None);
    }
}

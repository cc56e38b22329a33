use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Oldest point any range may reach back to, in months before today.
const MAX_LOOKBACK_MONTHS: u32 = 100 * 12;

/// Named date ranges offered by the dashboard picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    #[default]
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    All,
    Custom,
}

impl DatePreset {
    pub const ALL: [DatePreset; 10] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::ThisWeek,
        DatePreset::LastWeek,
        DatePreset::ThisMonth,
        DatePreset::LastMonth,
        DatePreset::ThisYear,
        DatePreset::LastYear,
        DatePreset::All,
        DatePreset::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::ThisWeek => "this-week",
            DatePreset::LastWeek => "last-week",
            DatePreset::ThisMonth => "this-month",
            DatePreset::LastMonth => "last-month",
            DatePreset::ThisYear => "this-year",
            DatePreset::LastYear => "last-year",
            DatePreset::All => "all",
            DatePreset::Custom => "custom",
        }
    }
}

impl FromStr for DatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DatePreset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown date preset '{}'", s))
    }
}

/// Inclusive range of instants, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.from <= ts && ts <= self.to
    }

    /// Length of the range in days, rounded up. A single full day is 1.
    pub fn span_days(&self) -> i64 {
        const DAY_MS: i64 = 86_400_000;
        let ms = (self.to - self.from).num_milliseconds().max(0);
        (ms + DAY_MS - 1) / DAY_MS
    }

    fn days(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange {
            from: midnight(from),
            to: end_of_day(to),
        }
    }
}

pub(crate) fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of `day`.
pub(crate) fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| midnight(day))
}

fn lookback_floor(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MAX_LOOKBACK_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

pub(crate) fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

/// Last day of `day`'s month: the day before the first of the following month.
pub(crate) fn last_of_month(day: NaiveDate) -> NaiveDate {
    first_of_month(first_of_month(day) + Duration::days(31)) - Duration::days(1)
}

fn first_of_year(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.ordinal0()))
}

fn last_of_year(day: NaiveDate) -> NaiveDate {
    first_of_year(first_of_year(day) + Duration::days(366)) - Duration::days(1)
}

/// Resolve a named preset against `now`.
///
/// `history_start` is the lower bound of `all`. `Custom` has no intrinsic
/// range and yields `None`; use [`custom_range`] or [`exact_range`].
pub fn preset_to_range(preset: DatePreset, now: NaiveDateTime, history_start: NaiveDate) -> Option<DateRange> {
    let today = now.date();
    let range = match preset {
        DatePreset::Today => DateRange::days(today, today),
        DatePreset::Yesterday => {
            let day = today - Duration::days(1);
            DateRange::days(day, day)
        }
        DatePreset::ThisWeek => DateRange::days(week_start(today), today),
        DatePreset::LastWeek => {
            let start = week_start(today) - Duration::days(7);
            DateRange::days(start, start + Duration::days(6))
        }
        DatePreset::ThisMonth => DateRange::days(first_of_month(today), last_of_month(today)),
        DatePreset::LastMonth => {
            let prev = first_of_month(today) - Duration::days(1);
            DateRange::days(first_of_month(prev), prev)
        }
        DatePreset::ThisYear => DateRange::days(first_of_year(today), last_of_year(today)),
        DatePreset::LastYear => {
            let prev = first_of_year(today) - Duration::days(1);
            DateRange::days(first_of_year(prev), prev)
        }
        DatePreset::All => {
            let start = history_start.max(lookback_floor(today)).min(today);
            DateRange::days(start, today)
        }
        DatePreset::Custom => return None,
    };
    Some(range)
}

/// Monday of the week containing `day`.
fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Picker range normalised to whole days. `from == to` still covers the full day.
pub fn custom_range(from: NaiveDate, to: NaiveDate, now: NaiveDateTime) -> DateRange {
    clamp(midnight(from), end_of_day(to.min(now.date())), now)
}

/// Caller-supplied instants, only clamped. Equal instants widen to the end of
/// that day, like a single-day picker selection.
pub fn exact_range(from: NaiveDateTime, to: NaiveDateTime, now: NaiveDateTime) -> DateRange {
    let to = if from == to { end_of_day(to.date()) } else { to };
    clamp(from, to, now)
}

/// `to` never passes `now` and `from` never precedes the lookback floor.
/// An inverted range collapses to the start of `to`'s day.
fn clamp(from: NaiveDateTime, to: NaiveDateTime, now: NaiveDateTime) -> DateRange {
    let to = to.min(now);
    let from = from.max(midnight(lookback_floor(now.date())));
    let from = if from > to { midnight(to.date()) } else { from };
    DateRange { from, to }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_milli_opt(h, min, s, ms).unwrap()
    }

    fn resolve(preset: DatePreset, now: NaiveDateTime) -> DateRange {
        preset_to_range(preset, now, date(2024, 1, 1)).unwrap()
    }

    #[test]
    fn last_month_in_a_leap_year_ends_on_the_29th() {
        let range = resolve(DatePreset::LastMonth, at(2024, 3, 10, 15, 0, 0, 0));
        assert_eq!(range.from, at(2024, 2, 1, 0, 0, 0, 0));
        assert_eq!(range.to, at(2024, 2, 29, 23, 59, 59, 999));
    }

    #[test]
    fn today_and_yesterday_cover_whole_days() {
        let now = at(2024, 3, 10, 15, 42, 7, 0);
        let today = resolve(DatePreset::Today, now);
        assert_eq!(today.from, at(2024, 3, 10, 0, 0, 0, 0));
        assert_eq!(today.to, at(2024, 3, 10, 23, 59, 59, 999));
        assert_eq!(today.span_days(), 1);

        let yesterday = resolve(DatePreset::Yesterday, now);
        assert_eq!(yesterday.from, at(2024, 3, 9, 0, 0, 0, 0));
        assert_eq!(yesterday.to, at(2024, 3, 9, 23, 59, 59, 999));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-03-10 is a Sunday
        let sunday = at(2024, 3, 10, 9, 0, 0, 0);
        let this_week = resolve(DatePreset::ThisWeek, sunday);
        assert_eq!(this_week.from, at(2024, 3, 4, 0, 0, 0, 0));
        assert_eq!(this_week.to, at(2024, 3, 10, 23, 59, 59, 999));

        let last_week = resolve(DatePreset::LastWeek, sunday);
        assert_eq!(last_week.from, at(2024, 2, 26, 0, 0, 0, 0));
        assert_eq!(last_week.to, at(2024, 3, 3, 23, 59, 59, 999));

        let monday = at(2024, 3, 11, 9, 0, 0, 0);
        assert_eq!(resolve(DatePreset::ThisWeek, monday).from, at(2024, 3, 11, 0, 0, 0, 0));
    }

    #[test]
    fn month_and_year_boundaries() {
        let now = at(2024, 1, 15, 8, 0, 0, 0);
        let this_month = resolve(DatePreset::ThisMonth, now);
        assert_eq!(this_month.to, at(2024, 1, 31, 23, 59, 59, 999));

        let last_month = resolve(DatePreset::LastMonth, now);
        assert_eq!(last_month.from, at(2023, 12, 1, 0, 0, 0, 0));
        assert_eq!(last_month.to, at(2023, 12, 31, 23, 59, 59, 999));

        let this_year = resolve(DatePreset::ThisYear, now);
        assert_eq!(this_year.from, at(2024, 1, 1, 0, 0, 0, 0));
        assert_eq!(this_year.to, at(2024, 12, 31, 23, 59, 59, 999));

        let last_year = resolve(DatePreset::LastYear, now);
        assert_eq!(last_year.from, at(2023, 1, 1, 0, 0, 0, 0));
        assert_eq!(last_year.to, at(2023, 12, 31, 23, 59, 59, 999));

        assert_eq!(last_of_month(date(2023, 2, 14)), date(2023, 2, 28));
        assert_eq!(last_of_month(date(2024, 4, 30)), date(2024, 4, 30));
    }

    #[test]
    fn all_runs_from_history_start() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let range = preset_to_range(DatePreset::All, now, date(2023, 7, 4)).unwrap();
        assert_eq!(range.from, at(2023, 7, 4, 0, 0, 0, 0));
        assert_eq!(range.to, at(2024, 3, 10, 23, 59, 59, 999));
    }

    #[test]
    fn custom_has_no_intrinsic_range() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        assert_eq!(preset_to_range(DatePreset::Custom, now, date(2024, 1, 1)), None);
    }

    #[test]
    fn presets_are_deterministic_and_ordered() {
        let now = at(2024, 2, 29, 23, 59, 0, 0);
        for preset in DatePreset::ALL {
            let first = preset_to_range(preset, now, date(2024, 1, 1));
            let second = preset_to_range(preset, now, date(2024, 1, 1));
            assert_eq!(first, second, "{}", preset.as_str());
            if let Some(range) = first {
                assert!(range.from <= range.to, "{}", preset.as_str());
            }
        }
    }

    #[test]
    fn custom_single_day_gets_end_of_day() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let range = custom_range(date(2024, 3, 1), date(2024, 3, 1), now);
        assert_eq!(range.from, at(2024, 3, 1, 0, 0, 0, 0));
        assert_eq!(range.to, at(2024, 3, 1, 23, 59, 59, 999));
    }

    #[test]
    fn custom_end_is_clamped_to_now() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let range = custom_range(date(2024, 3, 1), date(2024, 4, 1), now);
        assert_eq!(range.to, now);

        let future = custom_range(date(2024, 5, 1), date(2024, 5, 2), now);
        assert_eq!(future.from, at(2024, 3, 10, 0, 0, 0, 0));
        assert_eq!(future.to, now);
    }

    #[test]
    fn exact_range_keeps_instants() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let from = at(2024, 3, 2, 9, 30, 0, 0);
        let to = at(2024, 3, 2, 17, 0, 0, 0);
        assert_eq!(exact_range(from, to, now), DateRange { from, to });
    }

    #[test]
    fn exact_range_with_equal_instants_covers_the_day() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let instant = at(2024, 2, 1, 0, 0, 0, 0);
        let range = exact_range(instant, instant, now);
        assert_eq!(range.from, instant);
        assert_eq!(range.to, at(2024, 2, 1, 23, 59, 59, 999));

        let today = at(2024, 3, 10, 9, 0, 0, 0);
        assert_eq!(exact_range(today, today, now).to, now);
    }

    #[test]
    fn extreme_dates_are_clamped_not_overflowed() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let range = custom_range(date(2024, 1, 1), NaiveDate::MAX, now);
        assert_eq!(range.to, now);

        let range = custom_range(NaiveDate::MIN, date(2024, 1, 31), now);
        assert_eq!(range.from, at(1924, 3, 10, 0, 0, 0, 0));
        assert!(range.span_days() <= 100 * 366);

        let range = exact_range(NaiveDateTime::MIN, NaiveDateTime::MAX, now);
        assert_eq!(range.from, at(1924, 3, 10, 0, 0, 0, 0));
        assert_eq!(range.to, now);

        let last = NaiveDate::MAX;
        assert_eq!(end_of_day(last), last.and_hms_milli_opt(23, 59, 59, 999).unwrap());
    }

    #[test]
    fn all_is_bounded_by_the_lookback_floor() {
        let now = at(2024, 3, 10, 15, 0, 0, 0);
        let range = preset_to_range(DatePreset::All, now, NaiveDate::MIN).unwrap();
        assert_eq!(range.from, at(1924, 3, 10, 0, 0, 0, 0));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("last-month".parse::<DatePreset>(), Ok(DatePreset::LastMonth));
        assert_eq!("ALL".parse::<DatePreset>(), Ok(DatePreset::All));
        assert!("fortnight".parse::<DatePreset>().is_err());
    }
}

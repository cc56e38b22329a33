use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::range::{first_of_month, last_of_month, DateRange};
use super::{Snapshot, Timestamped};

/// Ranges longer than this many days are charted per month.
pub const MONTHLY_THRESHOLD_DAYS: i64 = 62;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn for_range(range: &DateRange) -> Self {
        if range.span_days() > MONTHLY_THRESHOLD_DAYS {
            Granularity::Monthly
        } else {
            Granularity::Daily
        }
    }

    fn key(self, day: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => day,
            Granularity::Monthly => first_of_month(day),
        }
    }

    fn next(self, key: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => key + Duration::days(1),
            Granularity::Monthly => last_of_month(key) + Duration::days(1),
        }
    }

    fn label(self, key: NaiveDate) -> String {
        match self {
            Granularity::Daily => key.format("%b %-d").to_string(),
            Granularity::Monthly => key.format("%b %Y").to_string(),
        }
    }
}

/// One chart bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataPoint {
    /// First day of the bucket.
    pub date: NaiveDate,
    pub label: String,
    pub contacts: u32,
    pub consultations: u32,
    pub cta_inquiries: u32,
    pub comments: u32,
    pub subscribers: u32,
}

impl ChartDataPoint {
    fn empty(date: NaiveDate, label: String) -> Self {
        ChartDataPoint {
            date,
            label,
            contacts: 0,
            consultations: 0,
            cta_inquiries: 0,
            comments: 0,
            subscribers: 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.contacts + self.consultations + self.cta_inquiries + self.comments + self.subscribers
    }
}

/// Count records per bucket across `range`, ascending.
///
/// Every bucket in the range is present even when it stays at zero. Records
/// outside the range or without a timestamp are not counted.
pub fn bucket(range: &DateRange, snapshot: &Snapshot) -> Vec<ChartDataPoint> {
    let granularity = Granularity::for_range(range);

    let mut buckets = BTreeMap::new();
    let last = granularity.key(range.to.date());
    let mut key = granularity.key(range.from.date());
    while key <= last {
        buckets.insert(key, ChartDataPoint::empty(key, granularity.label(key)));
        key = granularity.next(key);
    }

    tally(&mut buckets, range, granularity, &snapshot.contacts, |p| &mut p.contacts);
    tally(&mut buckets, range, granularity, &snapshot.consultations, |p| &mut p.consultations);
    tally(&mut buckets, range, granularity, &snapshot.cta_inquiries, |p| &mut p.cta_inquiries);
    tally(&mut buckets, range, granularity, &snapshot.comments, |p| &mut p.comments);
    tally(&mut buckets, range, granularity, &snapshot.subscribers, |p| &mut p.subscribers);

    buckets.into_values().collect()
}

fn tally<T, F>(
    buckets: &mut BTreeMap<NaiveDate, ChartDataPoint>,
    range: &DateRange,
    granularity: Granularity,
    items: &[T],
    counter: F,
) where
    T: Timestamped,
    F: Fn(&mut ChartDataPoint) -> &mut u32,
{
    for ts in items.iter().filter_map(Timestamped::timestamp) {
        if !range.contains(ts) {
            continue;
        }
        if let Some(point) = buckets.get_mut(&granularity.key(ts.date())) {
            *counter(point) += 1;
        }
    }
}

/// False when every bucket is zero; the chart shows "no data" instead.
pub fn has_activity(points: &[ChartDataPoint]) -> bool {
    points.iter().any(|p| p.total() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::*;
    use crate::dashboard::range::{custom_range, preset_to_range, DatePreset};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> DateRange {
        custom_range(date(2024, 1, 1), date(2024, 1, 31), at(2024, 3, 1, 0, 0))
    }

    #[test]
    fn january_daily_buckets() {
        let mut snapshot = Snapshot::default();
        snapshot.consultations = vec![
            consultation(1, "Ana", Some(at(2024, 1, 2, 9, 0)), false),
            consultation(2, "Ben", Some(at(2024, 1, 2, 17, 30)), false),
            consultation(3, "Cal", Some(at(2024, 2, 15, 10, 0)), false),
        ];

        let points = bucket(&january(), &snapshot);
        assert_eq!(points.len(), 31);
        assert_eq!(points[0].label, "Jan 1");
        assert_eq!(points[1].date, date(2024, 1, 2));
        assert_eq!(points[1].label, "Jan 2");
        assert_eq!(points[1].consultations, 2);
        assert_eq!(points.iter().map(|p| p.consultations).sum::<u32>(), 2);
        assert!(points.iter().filter(|p| p.date != date(2024, 1, 2)).all(|p| p.total() == 0));
    }

    #[test]
    fn every_day_is_present_and_ascending() {
        let range = custom_range(date(2024, 2, 20), date(2024, 3, 5), at(2024, 3, 10, 0, 0));
        let points = bucket(&range, &Snapshot::default());
        assert_eq!(points.len(), 15);
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        assert!(points.iter().any(|p| p.date == date(2024, 2, 29)));
        assert!(!has_activity(&points));
    }

    #[test]
    fn long_ranges_bucket_by_month() {
        let now = at(2024, 6, 15, 12, 0);
        let range = preset_to_range(DatePreset::ThisYear, now, date(2024, 1, 1)).unwrap();
        assert_eq!(Granularity::for_range(&range), Granularity::Monthly);

        let mut snapshot = Snapshot::default();
        snapshot.subscribers = vec![
            subscriber(1, "a@x.io", Some(at(2024, 3, 1, 0, 0))),
            subscriber(2, "b@x.io", Some(at(2024, 3, 31, 23, 59))),
        ];
        snapshot.comments = vec![comment(1, "Dee", Some(at(2024, 12, 31, 8, 0)), true)];

        let points = bucket(&range, &snapshot);
        assert_eq!(points.len(), 12);
        assert_eq!(points[0].label, "Jan 2024");
        assert_eq!(points[2].subscribers, 2);
        assert_eq!(points[11].comments, 1);
    }

    #[test]
    fn sixty_two_days_stays_daily() {
        let range = custom_range(date(2024, 1, 1), date(2024, 3, 2), at(2024, 6, 1, 0, 0));
        assert_eq!(range.span_days(), 62);
        assert_eq!(Granularity::for_range(&range), Granularity::Daily);

        let wider = custom_range(date(2024, 1, 1), date(2024, 3, 3), at(2024, 6, 1, 0, 0));
        assert_eq!(Granularity::for_range(&wider), Granularity::Monthly);
    }

    #[test]
    fn counts_match_records_in_range() {
        let range = january();
        let mut snapshot = Snapshot::default();
        snapshot.contacts = vec![
            contact(1, "Ann", Some(at(2024, 1, 1, 0, 0)), false),
            contact(2, "Bob", Some(at(2024, 1, 31, 23, 59)), true),
            contact(3, "Cy", Some(at(2023, 12, 31, 23, 59)), false),
            contact(4, "Di", None, false),
        ];
        snapshot.cta_inquiries = vec![cta(1, "Ed", Some(at(2024, 1, 15, 12, 0)), false)];
        snapshot.subscribers = vec![subscriber(1, "f@x.io", Some(at(2024, 1, 20, 6, 0)))];

        let points = bucket(&range, &snapshot);
        let in_range = snapshot
            .contacts
            .iter()
            .filter_map(|c| c.created_at)
            .chain(snapshot.cta_inquiries.iter().filter_map(|c| c.created_at))
            .chain(snapshot.subscribers.iter().filter_map(|s| s.subscribed_at))
            .filter(|ts| range.contains(*ts))
            .count() as u32;
        assert_eq!(points.iter().map(ChartDataPoint::total).sum::<u32>(), in_range);
        assert_eq!(in_range, 4);
        assert!(has_activity(&points));
    }
}

//! Admin dashboard derivations.
//!
//! Everything here is a pure function of a [`Snapshot`]: the route layer loads
//! the collections once per request and the submodules derive ranges, chart
//! series, unread counts and the search index from that owned copy.

pub mod activity;
pub mod range;
pub mod search;
pub mod unread;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::comment::Comment;
use crate::models::consultation::Consultation;
use crate::models::contact::Contact;
use crate::models::cta_inquiry::CtaInquiry;
use crate::models::post::BlogPost;
use crate::models::subscriber::Subscriber;

use activity::{ChartDataPoint, Granularity};
use range::DateRange;
use unread::{RecentItem, UnreadCounts};

/// Dashboard tab a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Overview,
    Contacts,
    Consultations,
    CtaInquiries,
    Blogs,
    Comments,
    Subscribers,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Overview,
        Tab::Contacts,
        Tab::Consultations,
        Tab::CtaInquiries,
        Tab::Blogs,
        Tab::Comments,
        Tab::Subscribers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Contacts => "contacts",
            Tab::Consultations => "consultations",
            Tab::CtaInquiries => "cta-inquiries",
            Tab::Blogs => "blogs",
            Tab::Comments => "comments",
            Tab::Subscribers => "subscribers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Tab::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Contacts => "Contacts",
            Tab::Consultations => "Consultations",
            Tab::CtaInquiries => "CTA Inquiries",
            Tab::Blogs => "Blog Posts",
            Tab::Comments => "Comments",
            Tab::Subscribers => "Subscribers",
        }
    }

    /// Accent colour used for badges and chart series.
    pub fn color(self) -> &'static str {
        match self {
            Tab::Overview => "slate",
            Tab::Contacts => "blue",
            Tab::Consultations => "emerald",
            Tab::CtaInquiries => "amber",
            Tab::Blogs => "violet",
            Tab::Comments => "rose",
            Tab::Subscribers => "cyan",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tab::Overview => "layout-dashboard",
            Tab::Contacts => "mail",
            Tab::Consultations => "calendar-check",
            Tab::CtaInquiries => "megaphone",
            Tab::Blogs => "file-text",
            Tab::Comments => "message-square",
            Tab::Subscribers => "users",
        }
    }
}

/// Records that can be placed on the activity timeline.
pub trait Timestamped {
    fn timestamp(&self) -> Option<NaiveDateTime>;
}

impl Timestamped for Contact {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Timestamped for Consultation {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Timestamped for CtaInquiry {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Timestamped for Comment {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Timestamped for Subscriber {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.subscribed_at
    }
}

/// One owned copy of every collection the dashboard reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub contacts: Vec<Contact>,
    pub consultations: Vec<Consultation>,
    pub cta_inquiries: Vec<CtaInquiry>,
    pub comments: Vec<Comment>,
    pub subscribers: Vec<Subscriber>,
    pub posts: Vec<BlogPost>,
}

impl Snapshot {
    /// Load every collection. A collection that fails to load is empty.
    pub fn load(pool: &DbPool) -> Self {
        Snapshot {
            contacts: Contact::list(pool),
            consultations: Consultation::list(pool),
            cta_inquiries: CtaInquiry::list(pool),
            comments: Comment::list(pool),
            subscribers: Subscriber::list(pool),
            posts: BlogPost::list(pool),
        }
    }

    /// Earliest timestamp across the timestamped collections.
    pub fn earliest_timestamp(&self) -> Option<NaiveDateTime> {
        fn min_of<T: Timestamped>(items: &[T]) -> Option<NaiveDateTime> {
            items.iter().filter_map(Timestamped::timestamp).min()
        }
        [
            min_of(&self.contacts),
            min_of(&self.consultations),
            min_of(&self.cta_inquiries),
            min_of(&self.comments),
            min_of(&self.subscribers),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Start of history for the "all" preset: the first recorded day, else `fallback`.
    pub fn history_start(&self, fallback: NaiveDate) -> NaiveDate {
        self.earliest_timestamp()
            .map(|ts| ts.date())
            .unwrap_or(fallback)
    }
}

/// Everything the overview tab renders for one range.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub range: DateRange,
    pub granularity: Granularity,
    pub activity: Vec<ChartDataPoint>,
    pub has_activity: bool,
    pub unread: UnreadCounts,
    pub recent: Vec<RecentItem>,
}

impl Overview {
    pub fn build(snapshot: &Snapshot, range: DateRange) -> Self {
        let activity = activity::bucket(&range, snapshot);
        Overview {
            granularity: Granularity::for_range(&range),
            has_activity: activity::has_activity(&activity),
            unread: unread::unread_counts(snapshot),
            recent: unread::recent_items(snapshot, unread::FEED_LIMIT),
            activity,
            range,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn tab_round_trips_through_its_wire_name() {
        for tab in Tab::ALL {
            assert_eq!(Tab::parse(tab.as_str()), Some(tab));
        }
        assert_eq!(Tab::parse("orders"), None);
        assert_eq!(
            serde_json::to_string(&Tab::CtaInquiries).unwrap(),
            "\"cta-inquiries\""
        );
    }

    #[test]
    fn history_start_prefers_earliest_record() {
        let fallback = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut snapshot = Snapshot::default();
        assert_eq!(snapshot.history_start(fallback), fallback);

        snapshot.contacts.push(contact(1, "Ann", Some(at(2023, 6, 3, 12, 0)), false));
        snapshot.subscribers.push(subscriber(1, "a@b.c", Some(at(2023, 5, 20, 8, 0))));
        snapshot.comments.push(comment(1, "Bo", None, false));
        assert_eq!(
            snapshot.history_start(fallback),
            NaiveDate::from_ymd_opt(2023, 5, 20).unwrap()
        );
    }

    #[test]
    fn overview_flags_empty_ranges() {
        let snapshot = Snapshot::default();
        let now = at(2024, 3, 10, 12, 0);
        let range = range::preset_to_range(range::DatePreset::Today, now, now.date()).unwrap();
        let overview = Overview::build(&snapshot, range);
        assert!(!overview.has_activity);
        assert_eq!(overview.activity.len(), 1);
        assert_eq!(overview.unread.total, 0);
        assert!(overview.recent.is_empty());
    }
}

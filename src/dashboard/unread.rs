use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;

use super::{Snapshot, Tab};

/// Entries shown in the overview's recent-activity feed.
pub const FEED_LIMIT: usize = 8;
/// Entries shown in the notification popover.
pub const NOTIFICATION_LIMIT: usize = 6;

/// Unread records per tab. Subscribers and posts have no read state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UnreadCounts {
    pub contacts: u32,
    pub consultations: u32,
    pub cta_inquiries: u32,
    pub comments: u32,
    pub total: u32,
}

impl UnreadCounts {
    /// Badge count for a tab; zero for tabs without read state.
    pub fn for_tab(&self, tab: Tab) -> u32 {
        match tab {
            Tab::Overview => self.total,
            Tab::Contacts => self.contacts,
            Tab::Consultations => self.consultations,
            Tab::CtaInquiries => self.cta_inquiries,
            Tab::Comments => self.comments,
            Tab::Blogs | Tab::Subscribers => 0,
        }
    }
}

/// Sidebar badge for one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabBadge {
    pub tab: Tab,
    pub label: &'static str,
    pub unread: u32,
}

/// One badge per tab, in sidebar order.
pub fn tab_badges(counts: &UnreadCounts) -> Vec<TabBadge> {
    Tab::ALL
        .into_iter()
        .map(|tab| TabBadge {
            tab,
            label: tab.label(),
            unread: counts.for_tab(tab),
        })
        .collect()
}

pub fn unread_counts(snapshot: &Snapshot) -> UnreadCounts {
    fn unread<T>(items: &[T], is_read: impl Fn(&T) -> bool) -> u32 {
        items.iter().filter(|item| !is_read(item)).count() as u32
    }

    let contacts = unread(&snapshot.contacts, |c| c.is_read);
    let consultations = unread(&snapshot.consultations, |c| c.is_read);
    let cta_inquiries = unread(&snapshot.cta_inquiries, |c| c.is_read);
    let comments = unread(&snapshot.comments, |c| c.is_read);
    UnreadCounts {
        contacts,
        consultations,
        cta_inquiries,
        comments,
        total: contacts + consultations + cta_inquiries + comments,
    }
}

/// A record as it appears in the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: i64,
    pub name: String,
    pub date: Option<NaiveDateTime>,
    pub is_read: bool,
    pub tab: Tab,
}

/// Newest first, undated records last, at most `limit` entries.
///
/// Records sharing a timestamp keep the order contacts, consultations,
/// comments, CTA inquiries. Callers should not rely on that tie order.
pub fn recent_items(snapshot: &Snapshot, limit: usize) -> Vec<RecentItem> {
    let mut items = feed(snapshot);
    items.truncate(limit);
    items
}

/// Unread entries of the feed, capped at [`NOTIFICATION_LIMIT`].
pub fn notifications(snapshot: &Snapshot) -> Vec<RecentItem> {
    feed(snapshot)
        .into_iter()
        .filter(|item| !item.is_read)
        .take(NOTIFICATION_LIMIT)
        .collect()
}

fn feed(snapshot: &Snapshot) -> Vec<RecentItem> {
    let contacts = snapshot.contacts.iter().map(|c| RecentItem {
        kind: "contact",
        id: c.id,
        name: c.name.clone(),
        date: c.created_at,
        is_read: c.is_read,
        tab: Tab::Contacts,
    });
    let consultations = snapshot.consultations.iter().map(|c| RecentItem {
        kind: "consultation",
        id: c.id,
        name: c.name.clone(),
        date: c.created_at,
        is_read: c.is_read,
        tab: Tab::Consultations,
    });
    let comments = snapshot.comments.iter().map(|c| RecentItem {
        kind: "comment",
        id: c.id,
        name: c.author_name.clone(),
        date: c.created_at,
        is_read: c.is_read,
        tab: Tab::Comments,
    });
    let cta_inquiries = snapshot.cta_inquiries.iter().map(|c| RecentItem {
        kind: "cta-inquiry",
        id: c.id,
        name: c.name.clone(),
        date: c.created_at,
        is_read: c.is_read,
        tab: Tab::CtaInquiries,
    });

    let mut items: Vec<RecentItem> = contacts
        .chain(consultations)
        .chain(comments)
        .chain(cta_inquiries)
        .collect();
    // sort_by is stable
    items.sort_by(|a, b| newest_first(a.date, b.date));
    items
}

fn newest_first(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::*;

    fn inbox() -> Snapshot {
        Snapshot {
            contacts: vec![
                contact(1, "Ann", Some(at(2024, 3, 1, 9, 0)), false),
                contact(2, "Bob", Some(at(2024, 3, 2, 9, 0)), false),
                contact(3, "Cy", Some(at(2024, 3, 3, 9, 0)), false),
            ],
            consultations: vec![
                consultation(1, "Dee", Some(at(2024, 3, 4, 9, 0)), false),
                consultation(2, "Eve", Some(at(2024, 2, 1, 9, 0)), true),
            ],
            subscribers: vec![subscriber(1, "s@x.io", Some(at(2024, 3, 5, 9, 0)))],
            posts: vec![post(1, "Clean claims")],
            ..Snapshot::default()
        }
    }

    #[test]
    fn marking_a_contact_read_lowers_counts_by_one() {
        let mut snapshot = inbox();
        let before = unread_counts(&snapshot);
        assert_eq!(before.contacts, 3);
        assert_eq!(before.consultations, 1);
        assert_eq!(before.total, 4);

        snapshot.contacts[0].is_read = true;
        let after = unread_counts(&snapshot);
        assert_eq!(after.contacts, 2);
        assert_eq!(after.consultations, 1);
        assert_eq!(after.total, before.total - 1);
    }

    #[test]
    fn new_unread_record_raises_total_by_one() {
        let mut snapshot = inbox();
        let before = unread_counts(&snapshot).total;
        snapshot.comments.push(comment(9, "Fay", Some(at(2024, 3, 6, 9, 0)), false));
        assert_eq!(unread_counts(&snapshot).total, before + 1);
        snapshot.subscribers.push(subscriber(2, "t@x.io", None));
        assert_eq!(unread_counts(&snapshot).total, before + 1);
    }

    #[test]
    fn badges_per_tab() {
        let counts = unread_counts(&inbox());
        assert_eq!(counts.for_tab(Tab::Contacts), 3);
        assert_eq!(counts.for_tab(Tab::Overview), 4);
        assert_eq!(counts.for_tab(Tab::Subscribers), 0);
        assert_eq!(counts.for_tab(Tab::Blogs), 0);

        let badges = tab_badges(&counts);
        assert_eq!(badges.len(), Tab::ALL.len());
        assert_eq!(badges[0].unread, counts.total);
        assert_eq!(badges[3].label, "CTA Inquiries");
    }

    #[test]
    fn feed_is_newest_first_with_undated_last() {
        let mut snapshot = inbox();
        snapshot.comments.push(comment(1, "Gus", None, false));
        snapshot.cta_inquiries.push(cta(1, "Hal", Some(at(2024, 3, 3, 12, 0)), true));

        let feed = recent_items(&snapshot, 10);
        let names: Vec<&str> = feed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Dee", "Hal", "Cy", "Bob", "Ann", "Eve", "Gus"]);
        assert_eq!(feed[1].tab, Tab::CtaInquiries);
        assert_eq!(recent_items(&snapshot, FEED_LIMIT).len(), 7);
        assert_eq!(recent_items(&snapshot, 2).len(), 2);
    }

    #[test]
    fn ties_keep_concatenation_order() {
        let ts = Some(at(2024, 3, 1, 9, 0));
        let snapshot = Snapshot {
            contacts: vec![contact(1, "Ann", ts, false)],
            consultations: vec![consultation(1, "Dee", ts, false)],
            comments: vec![comment(1, "Gus", ts, false)],
            cta_inquiries: vec![cta(1, "Hal", ts, false)],
            ..Snapshot::default()
        };
        let kinds: Vec<&str> = recent_items(&snapshot, FEED_LIMIT).iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec!["contact", "consultation", "comment", "cta-inquiry"]);
    }

    #[test]
    fn notifications_are_the_unread_feed() {
        let mut snapshot = inbox();
        for id in 10..20 {
            snapshot.comments.push(comment(id, "Ivy", Some(at(2024, 1, 1, 0, 0)), false));
        }
        let notes = notifications(&snapshot);
        assert_eq!(notes.len(), NOTIFICATION_LIMIT);
        assert!(notes.iter().all(|n| !n.is_read));
        assert_eq!(notes[0].name, "Dee");
    }

    #[test]
    fn feed_serializes_kind_as_type() {
        let feed = recent_items(&inbox(), 1);
        let json = serde_json::to_value(&feed[0]).unwrap();
        assert_eq!(json["type"], "consultation");
        assert_eq!(json["tab"], "consultations");
    }
}

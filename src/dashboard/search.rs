use serde::{Deserialize, Serialize};

use super::{Snapshot, Tab};

/// Most results returned for one query.
pub const SEARCH_LIMIT: usize = 8;

const COMMENT_EXCERPT_CHARS: usize = 60;

/// A record flattened for cross-collection search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub id: i64,
    pub name: String,
    pub detail: String,
    pub tab: Tab,
    pub tab_label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

impl SearchEntry {
    fn new(tab: Tab, id: i64, name: &str, parts: &[&str]) -> Self {
        SearchEntry {
            id,
            name: name.to_string(),
            detail: parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" • "),
            tab,
            tab_label: tab.label(),
            color: tab.color(),
            icon: tab.icon(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.detail.to_lowercase().contains(needle)
            || self.tab_label.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    /// Index every collection in tab order: contacts, consultations, CTA
    /// inquiries, blogs, comments, subscribers.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut entries = Vec::new();
        for c in &snapshot.contacts {
            entries.push(SearchEntry::new(Tab::Contacts, c.id, &c.name, &[&c.email, &c.subject]));
        }
        for c in &snapshot.consultations {
            entries.push(SearchEntry::new(
                Tab::Consultations,
                c.id,
                &c.name,
                &[&c.practice_name, &c.specialty],
            ));
        }
        for c in &snapshot.cta_inquiries {
            entries.push(SearchEntry::new(
                Tab::CtaInquiries,
                c.id,
                &c.name,
                &[&c.practice_name, &c.monthly_collection],
            ));
        }
        for p in &snapshot.posts {
            entries.push(SearchEntry::new(Tab::Blogs, p.id, &p.title, &[&p.category, &p.author_name]));
        }
        for c in &snapshot.comments {
            let excerpt = excerpt(&c.comment, COMMENT_EXCERPT_CHARS);
            entries.push(SearchEntry::new(Tab::Comments, c.id, &c.author_name, &[&c.post_slug, &excerpt]));
        }
        for s in &snapshot.subscribers {
            let state = if s.is_active { "Active" } else { "Inactive" };
            entries.push(SearchEntry::new(Tab::Subscribers, s.id, &s.email, &[state]));
        }
        SearchIndex { entries }
    }

    /// Case-insensitive substring search. A blank query matches nothing.
    /// Surrounding whitespace is part of the needle.
    pub fn search(&self, query: &str) -> Vec<&SearchEntry> {
        if query.trim().is_empty() {
            return vec![];
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.matches(&needle))
            .take(SEARCH_LIMIT)
            .collect()
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// Which tab is open and which record in it is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub active_tab: Tab,
    pub expanded_id: Option<i64>,
}

impl ViewState {
    /// Jump to a search result: open its tab with the record expanded.
    pub fn select(&mut self, entry: &SearchEntry) {
        self.active_tab = entry.tab;
        self.expanded_id = Some(entry.id);
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.expanded_id = None;
        }
    }

    pub fn toggle_expanded(&mut self, id: i64) {
        self.expanded_id = if self.expanded_id == Some(id) { None } else { Some(id) };
    }

    pub fn apply(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::SwitchTab { tab } => self.switch_tab(tab),
            ViewCommand::ToggleExpanded { id } => self.toggle_expanded(id),
        }
    }
}

/// Navigation action from the admin client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ViewCommand {
    SwitchTab { tab: Tab },
    ToggleExpanded { id: i64 },
}

/// A search result plus the view that opening it produces.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub entry: SearchEntry,
    pub view: ViewState,
}

impl SearchHit {
    pub fn new(entry: &SearchEntry) -> Self {
        let mut view = ViewState::default();
        view.select(entry);
        SearchHit { entry: entry.clone(), view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::*;

    fn snapshot() -> Snapshot {
        let mut inactive = subscriber(2, "old@clinic.test", None);
        inactive.is_active = false;
        Snapshot {
            contacts: vec![contact(1, "Ann", None, false), contact(2, "Bob", None, true)],
            consultations: vec![consultation(1, "Dee", None, false)],
            cta_inquiries: vec![cta(1, "Hal", None, false)],
            comments: vec![comment(1, "Gus", None, false)],
            subscribers: vec![subscriber(1, "new@clinic.test", None), inactive],
            posts: vec![post(1, "Cutting Denials in Cardiology")],
        }
    }

    #[test]
    fn index_follows_tab_order() {
        let index = SearchIndex::build(&snapshot());
        let tabs: Vec<Tab> = index.entries.iter().map(|e| e.tab).collect();
        assert_eq!(
            tabs,
            vec![
                Tab::Contacts,
                Tab::Contacts,
                Tab::Consultations,
                Tab::CtaInquiries,
                Tab::Blogs,
                Tab::Comments,
                Tab::Subscribers,
                Tab::Subscribers,
            ]
        );
        assert_eq!(index.entries[0].detail, "ann@example.com • Billing question");
        assert_eq!(index.entries[2].detail, "Dee Family Practice • Cardiology");
        assert_eq!(index.entries[4].detail, "Revenue Cycle • Dana Reyes");
        assert_eq!(index.entries[7].detail, "Inactive");
    }

    #[test]
    fn every_result_contains_the_query() {
        let index = SearchIndex::build(&snapshot());
        for query in ["cardio", "CLINIC", "inquir", "a", "denial", "active"] {
            let results = index.search(query);
            assert!(results.len() <= SEARCH_LIMIT);
            let needle = query.to_lowercase();
            for r in results {
                assert!(
                    r.name.to_lowercase().contains(&needle)
                        || r.detail.to_lowercase().contains(&needle)
                        || r.tab_label.to_lowercase().contains(&needle),
                    "{} did not contain {}",
                    r.name,
                    query
                );
            }
        }
    }

    #[test]
    fn blank_query_returns_nothing() {
        let index = SearchIndex::build(&snapshot());
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn matches_on_tab_label_and_caps_results() {
        let mut s = snapshot();
        s.contacts = (1..=20).map(|id| contact(id, "Zed", None, false)).collect();
        let index = SearchIndex::build(&s);
        let results = index.search("contacts");
        assert_eq!(results.len(), SEARCH_LIMIT);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[7].id, 8);
        assert_eq!(index.search("cardiology")[0].tab, Tab::Consultations);
    }

    #[test]
    fn surrounding_whitespace_is_part_of_the_query() {
        let index = SearchIndex::build(&snapshot());
        // "Dee Family Practice" contains " family" but no entry contains " dee"
        assert!(index.search(" dee").is_empty());
        assert_eq!(index.search("Dee").len(), 1);
        for r in index.search(" family") {
            assert!(r.detail.to_lowercase().contains(" family"));
        }
        assert_eq!(index.search(" family").len(), 1);
    }

    #[test]
    fn long_comments_are_excerpted() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdefghijkl", 5), "abcde…");
    }

    #[test]
    fn selecting_a_result_opens_its_record() {
        let index = SearchIndex::build(&snapshot());
        let hit = index.search("Hal")[0].clone();

        let mut view = ViewState::default();
        view.select(&hit);
        assert_eq!(view.active_tab, Tab::CtaInquiries);
        assert_eq!(view.expanded_id, Some(1));

        view.toggle_expanded(1);
        assert_eq!(view.expanded_id, None);
        view.toggle_expanded(4);
        view.switch_tab(Tab::Comments);
        assert_eq!(view.expanded_id, None);
    }

    #[test]
    fn hits_carry_the_view_they_open() {
        let index = SearchIndex::build(&snapshot());
        let hit = SearchHit::new(index.search("Gus")[0]);
        assert_eq!(hit.view, ViewState { active_tab: Tab::Comments, expanded_id: Some(1) });
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["name"], "Gus");
        assert_eq!(json["view"]["active_tab"], "comments");
    }

    #[test]
    fn view_commands_from_json() {
        let mut view = ViewState { active_tab: Tab::Contacts, expanded_id: Some(2) };
        let cmd: ViewCommand = serde_json::from_str(r#"{"op":"toggle_expanded","id":2}"#).unwrap();
        view.apply(cmd);
        assert_eq!(view.expanded_id, None);
        view.apply(ViewCommand::ToggleExpanded { id: 3 });
        let cmd: ViewCommand =
            serde_json::from_str(r#"{"op":"switch_tab","tab":"cta-inquiries"}"#).unwrap();
        view.apply(cmd);
        assert_eq!(view, ViewState { active_tab: Tab::CtaInquiries, expanded_id: None });
    }
}

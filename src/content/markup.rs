//! The `**text**` highlight convention used inside block text.
//!
//! [`render_inline`] is the only routine that turns block text into inline
//! HTML. The public article renderer and the editor preview both go through
//! it, so a highlighted span looks the same in both places.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const MARKER: &str = "**";

fn highlight_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Non-greedy and single-line: `**a** b **c**` is two runs.
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("static highlight pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Highlight(&'a str),
}

/// Split text into plain and highlighted runs. Unpaired markers stay in the
/// plain text.
pub fn parse(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in highlight_regex().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Plain(&text[last..whole.start()]));
        }
        segments.push(Segment::Highlight(inner.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }
    segments
}

pub fn render_inline(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + 16);
    for segment in parse(text) {
        match segment {
            Segment::Plain(s) => html.push_str(&escape(s)),
            Segment::Highlight(s) => {
                html.push_str("<strong class=\"highlight\">");
                html.push_str(&escape(s));
                html.push_str("</strong>");
            }
        }
    }
    html
}

pub(crate) fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Byte offsets of a text selection. `start == end` is a bare cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Selection { start, end }
    }

    pub fn cursor(at: usize) -> Self {
        Selection { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Editor toolbar action: wrap the selection in `**`, or unwrap it when it is
/// already wrapped. A bare cursor inserts `****` and lands between the markers.
///
/// Returns the new text and the selection to restore. Offsets that are out of
/// range or not on a char boundary leave the text unchanged.
pub fn toggle_highlight(text: &str, selection: Selection) -> (String, Selection) {
    let (start, end) = if selection.start <= selection.end {
        (selection.start, selection.end)
    } else {
        (selection.end, selection.start)
    };
    if end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return (text.to_string(), selection);
    }

    if start == end {
        let mut out = String::with_capacity(text.len() + 4);
        out.push_str(&text[..start]);
        out.push_str(MARKER);
        out.push_str(MARKER);
        out.push_str(&text[start..]);
        return (out, Selection::cursor(start + MARKER.len()));
    }

    // Unwrap only when the selection is exactly one run, with or without
    // its markers. `**x** y **z**` with ` y ` selected wraps instead.
    if let Some((run_start, run_end, inner)) = run_at(text, start, end) {
        let out = format!("{}{}{}", &text[..run_start], inner, &text[run_end..]);
        return (out, Selection::new(run_start, run_start + inner.len()));
    }

    let selected = &text[start..end];
    let out = format!("{}{}{}{}{}", &text[..start], MARKER, selected, MARKER, &text[end..]);
    (out, Selection::new(start, end + 2 * MARKER.len()))
}

/// The highlighted run whose inner text or full `**...**` extent is exactly
/// `start..end`, as (run start, run end, inner text).
fn run_at(text: &str, start: usize, end: usize) -> Option<(usize, usize, &str)> {
    highlight_regex().captures_iter(text).find_map(|caps| {
        let (whole, inner) = (caps.get(0)?, caps.get(1)?);
        let exact = (whole.start() == start && whole.end() == end)
            || (inner.start() == start && inner.end() == end);
        exact.then(|| (whole.start(), whole.end(), inner.as_str()))
    })
}

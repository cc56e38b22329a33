use chrono::{DateTime, NaiveDateTime, Utc};

use crate::db::DbPool;
use crate::models::post::BlogPost;
use crate::models::settings::Setting;

/// Generate the RSS 2.0 feed of published blog posts.
pub fn generate_feed(pool: &DbPool) -> String {
    let site_name = Setting::get_or(pool, "site_name", "ClaimDesk");
    let site_url = Setting::get_or(pool, "site_url", "http://localhost:8000");
    let description = Setting::get_or(pool, "site_description", "");
    let feed_count = Setting::get_i64_or(pool, "rss_feed_count", 25).clamp(1, 100);

    let posts = BlogPost::published(pool, feed_count);
    render_feed(&site_name, site_url.trim_end_matches('/'), &description, &posts)
}

pub fn render_feed(site_name: &str, site_url: &str, description: &str, posts: &[BlogPost]) -> String {
    let last_build = posts
        .iter()
        .filter_map(|p| p.updated_at.or(p.created_at))
        .max()
        .map(|d| format!("    <lastBuildDate>{}</lastBuildDate>\n", rfc2822(d)))
        .unwrap_or_default();

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
    <title>{title}</title>
    <link>{url}</link>
    <description>{desc}</description>
    <atom:link href="{url}/feed" rel="self" type="application/rss+xml"/>
    <language>en</language>
{last_build}"#,
        title = xml_escape(site_name),
        url = xml_escape(site_url),
        desc = xml_escape(description),
        last_build = last_build,
    );

    for post in posts {
        let pub_date = post
            .created_at
            .map(|d| format!("        <pubDate>{}</pubDate>\n", rfc2822(d)))
            .unwrap_or_default();
        let category = if post.category.is_empty() {
            String::new()
        } else {
            format!("        <category>{}</category>\n", xml_escape(&post.category))
        };

        xml.push_str(&format!(
            r#"    <item>
        <title>{title}</title>
        <link>{url}/blog/{slug}</link>
        <guid isPermaLink="true">{url}/blog/{slug}</guid>
{pub_date}{category}        <description>{desc}</description>
    </item>
"#,
            title = xml_escape(&post.title),
            url = xml_escape(site_url),
            slug = xml_escape(&post.slug),
            pub_date = pub_date,
            category = category,
            desc = xml_escape(&post.excerpt),
        ));
    }

    xml.push_str("</channel>\n</rss>");
    xml
}

fn rfc2822(ndt: NaiveDateTime) -> String {
    let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(ndt, Utc);
    utc.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::{at, post};

    #[test]
    fn items_link_to_article_pages() {
        let mut p = post(1, "Denials & Appeals");
        p.excerpt = "Why <b>claims</b> bounce".to_string();
        p.created_at = Some(at(2024, 3, 5, 10, 0));

        let xml = render_feed("ClaimDesk", "https://claimdesk.test", "", &[p]);
        assert!(xml.contains("<title>Denials &amp; Appeals</title>"));
        assert!(xml.contains("<link>https://claimdesk.test/blog/denials-appeals</link>"));
        assert!(xml.contains("<pubDate>Tue, 05 Mar 2024 10:00:00 +0000</pubDate>"));
        assert!(xml.contains("<category>Revenue Cycle</category>"));
        assert!(xml.contains("Why &lt;b&gt;claims&lt;/b&gt; bounce"));
        assert!(xml.ends_with("</rss>"));
    }

    #[test]
    fn empty_feed_is_still_valid() {
        let xml = render_feed("ClaimDesk", "http://localhost:8000", "Billing", &[]);
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
        assert!(!xml.contains("lastBuildDate"));
    }
}

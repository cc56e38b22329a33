use rocket::http::ContentType;
use rocket::response::content::RawHtml;
use rocket::State;

use crate::content::markup::escape;
use crate::content::render;
use crate::db::DbPool;
use crate::models::comment::Comment;
use crate::models::post::BlogPost;
use crate::models::settings::Setting;
use crate::rss;

/// Standalone article page. Drafts are not served.
#[get("/blog/<slug>")]
pub fn blog_single(pool: &State<DbPool>, slug: &str) -> Option<RawHtml<String>> {
    let post = BlogPost::find_published(pool, slug)?;
    let site_name = Setting::get_or(pool, "site_name", "ClaimDesk");
    let comment_count = Comment::for_post(pool, &post.slug).len();
    Some(RawHtml(article_page(&site_name, &post, comment_count)))
}

pub fn article_page(site_name: &str, post: &BlogPost, comment_count: usize) -> String {
    let mut meta = vec![escape(&post.date), escape(&post.read_time)];
    if !post.author_name.is_empty() {
        meta.insert(0, format!("By {}", escape(&post.author_name)));
    }
    meta.retain(|m| !m.is_empty());

    let hero = if post.featured_image.is_empty() {
        String::new()
    } else {
        format!(
            "<img class=\"hero\" src=\"{}\" alt=\"{}\">\n",
            escape(&post.featured_image),
            escape(&post.title)
        )
    };

    let tags = if post.tags.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = post
            .tags
            .iter()
            .map(|t| format!("<li>{}</li>", escape(t)))
            .collect();
        format!("<ul class=\"tags\">{}</ul>\n", items.join(""))
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
<meta name="description" content="{excerpt}">
<link rel="alternate" type="application/rss+xml" href="/feed">
</head>
<body>
<article class="post" data-slug="{slug}">
<p class="category">{category}</p>
<h1>{title}</h1>
<p class="meta">{meta}</p>
{hero}<div class="content">
{body}</div>
{tags}<p class="comments">{comments} comment(s)</p>
</article>
</body>
</html>
"#,
        title = escape(&post.title),
        site = escape(site_name),
        excerpt = escape(&post.excerpt),
        slug = escape(&post.slug),
        category = escape(&post.category),
        meta = meta.join(" · "),
        hero = hero,
        body = render::article_html(&post.content),
        tags = tags,
        comments = comment_count,
    )
}

#[get("/feed")]
pub fn feed(pool: &State<DbPool>) -> (ContentType, String) {
    (
        ContentType::new("application", "rss+xml"),
        rss::generate_feed(pool),
    )
}

pub fn routes() -> Vec<rocket::Route> {
    routes![blog_single, feed]
}

use super::block::ContentBlock;
use super::markup::{escape, render_inline};

/// HTML for the public article page.
pub fn article_html(blocks: &[ContentBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            ContentBlock::Paragraph { content } => {
                html.push_str(&format!("<p>{}</p>\n", render_inline(content)));
            }
            ContentBlock::Heading { content, level } => {
                let tag = level.tag();
                html.push_str(&format!("<{tag}>{}</{tag}>\n", render_inline(content)));
            }
            ContentBlock::List { items } => {
                html.push_str("<ul>\n");
                for item in items.iter().filter(|i| !i.trim().is_empty()) {
                    html.push_str(&format!("  <li>{}</li>\n", render_inline(item)));
                }
                html.push_str("</ul>\n");
            }
            ContentBlock::Quote { content } => {
                html.push_str(&format!(
                    "<blockquote>{}</blockquote>\n",
                    render_inline(content)
                ));
            }
            ContentBlock::Image { src, alt, caption } => {
                if src.is_empty() {
                    continue;
                }
                html.push_str(&format!(
                    "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                    escape(src),
                    escape(alt)
                ));
                if !caption.is_empty() {
                    html.push_str(&format!("<figcaption>{}</figcaption>", escape(caption)));
                }
                html.push_str("</figure>\n");
            }
            ContentBlock::Callout { content, variant } => {
                html.push_str(&format!(
                    "<aside class=\"callout callout-{}\">{}</aside>\n",
                    variant.as_str(),
                    render_inline(content)
                ));
            }
        }
    }
    html
}

/// HTML for the editor's live preview pane. Each block is wrapped with its
/// index so the client can scroll to the block being edited; empty blocks
/// show a placeholder instead of disappearing.
pub fn preview_html(blocks: &[ContentBlock]) -> String {
    let mut html = String::from("<div class=\"editor-preview\">\n");
    for (index, block) in blocks.iter().enumerate() {
        html.push_str(&format!(
            "<div class=\"preview-block preview-{:?}\" data-index=\"{}\">",
            block.kind(),
            index
        ));
        html.push_str(&preview_block(block));
        html.push_str("</div>\n");
    }
    html.push_str("</div>");
    html
}

fn preview_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Paragraph { content } => {
            format!("<p>{}</p>", inline_or_placeholder(content, "Empty paragraph"))
        }
        ContentBlock::Heading { content, level } => {
            let tag = level.tag();
            format!("<{tag}>{}</{tag}>", inline_or_placeholder(content, "Empty heading"))
        }
        ContentBlock::List { items } => {
            let rows: String = items
                .iter()
                .map(|i| format!("<li>{}</li>", inline_or_placeholder(i, "Empty item")))
                .collect();
            format!("<ul>{}</ul>", rows)
        }
        ContentBlock::Quote { content } => format!(
            "<blockquote>{}</blockquote>",
            inline_or_placeholder(content, "Empty quote")
        ),
        ContentBlock::Image { src, alt, caption } => {
            if src.is_empty() {
                return "<div class=\"placeholder\">No image selected</div>".to_string();
            }
            let mut out = format!(
                "<figure><img src=\"{}\" alt=\"{}\">",
                escape(src),
                escape(alt)
            );
            if !caption.is_empty() {
                out.push_str(&format!("<figcaption>{}</figcaption>", escape(caption)));
            }
            out.push_str("</figure>");
            out
        }
        ContentBlock::Callout { content, variant } => format!(
            "<aside class=\"callout callout-{}\">{}</aside>",
            variant.as_str(),
            inline_or_placeholder(content, "Empty callout")
        ),
    }
}

fn inline_or_placeholder(text: &str, placeholder: &str) -> String {
    if text.trim().is_empty() {
        format!("<span class=\"placeholder\">{}</span>", placeholder)
    } else {
        render_inline(text)
    }
}

//! Structured article content: typed blocks, the `**highlight**` markup,
//! the block list editor and the two HTML renderers.

pub mod block;
pub mod editor;
pub mod markup;
pub mod render;

use block::ContentBlock;

const WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time, e.g. "4 min read". Never less than one minute.
pub fn reading_time(blocks: &[ContentBlock]) -> String {
    let words: usize = blocks
        .iter()
        .map(|b| b.plain_text().split_whitespace().count())
        .sum();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{} min read", minutes)
}
